// Error taxonomy for lead operations.
//
// Callers branch on these to pick a response: rejected input goes back to the
// form with a message, NotFound turns into a 404, anything else is a 500.

use thiserror::Error;

use crate::db::DbError;
use crate::types::LeadStatus;

#[derive(Debug, Error)]
pub enum LeadError {
    /// The request was malformed or violated a field rule. Nothing changed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The requested status change is not allowed from the lead's current
    /// status. Covers unknown target names as well; `to` is the raw request.
    #[error("Invalid status transition from {from} to '{to}'")]
    InvalidTransition { from: LeadStatus, to: String },

    /// No lead with the given id.
    #[error("Lead not found: {0}")]
    NotFound(String),

    /// Configuration could not be loaded or failed validation.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl LeadError {
    /// True when the caller's request was rejected before any state changed.
    pub fn is_rejected_input(&self) -> bool {
        matches!(
            self,
            LeadError::InvalidInput(_) | LeadError::InvalidTransition { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LeadError::NotFound(_))
    }
}
