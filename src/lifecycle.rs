// Lead lifecycle rules: follow-up cadence, status transitions, quote checks.
//
// Everything here is pure. Persistence and clock access stay in the service
// layer so these rules test without a database.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::LeadError;
use crate::types::{LeadStatus, Temperature};

/// How long a lead of the given temperature can sit before the next touch.
pub fn followup_offset(temperature: Temperature) -> Duration {
    match temperature {
        Temperature::Hot => Duration::hours(3),
        Temperature::Warm => Duration::hours(24),
        Temperature::Cold => Duration::hours(72),
    }
}

/// Next follow-up due date, anchored at the moment of creation or contact.
pub fn next_followup_at(anchor: DateTime<Utc>, temperature: Temperature) -> DateTime<Utc> {
    anchor + followup_offset(temperature)
}

/// Checks whether a lead may move from `current` to `requested`.
///
/// Repeating the current status is a no-op and always allowed. Terminal
/// statuses never change again.
pub fn check_transition(current: LeadStatus, requested: LeadStatus) -> Result<(), LeadError> {
    if current == requested {
        return Ok(());
    }
    if current.is_terminal() {
        return Err(LeadError::InvalidTransition {
            from: current,
            to: requested.to_string(),
        });
    }
    Ok(())
}

/// Quoted prices must be real, non-negative amounts.
pub fn validate_quote_price(price: f64) -> Result<(), LeadError> {
    if !price.is_finite() {
        return Err(LeadError::InvalidInput(format!(
            "quoted price must be a finite amount, got {price}"
        )));
    }
    if price < 0.0 {
        return Err(LeadError::InvalidInput(format!(
            "quoted price must not be negative, got {price}"
        )));
    }
    Ok(())
}

/// Mints a lead id: `LEAD-` plus the UTC creation second plus a short random
/// suffix so two intakes in the same second stay distinct.
pub fn generate_lead_id(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("LEAD-{}-{}", now.format("%Y%m%d%H%M%S"), &suffix[..4])
}
