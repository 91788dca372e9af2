//! Lead management core for insurance agents.
//!
//! `leadbook` owns the working store for sales leads: intake, Hot/Warm/Cold
//! follow-up scheduling, quote tracking, pipeline outcomes, and close-ratio
//! reporting. The web layer stays thin; every rule about when a lead is due,
//! which status changes are legal, and how ratios are computed lives here.
//!
//! Leads persist in SQLite at `~/.leadbook/leadbook.db`, or wherever
//! `DATABASE_URL` points. Timestamps are UTC, stored as RFC 3339 text.

pub mod config;
pub mod db;
pub mod error;
pub mod lifecycle;
mod migrations;
pub mod services;
pub mod types;

pub use error::LeadError;
pub use types::{
    DailyReport, Lead, LeadCounts, LeadDraft, LeadStatus, QuoteStatus, SourceCloseRatio,
    Temperature,
};
