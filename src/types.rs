// Shared domain types for leadbook.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LeadError;

/// Lead sources the reporting views break out by name. Intake accepts any
/// string; this list only drives form dropdowns and report ordering.
pub const KNOWN_SOURCES: &[&str] = &[
    "Smart Financial",
    "Media Alpha",
    "Website",
    "Referral",
    "Social Media",
    "Email",
    "Phone",
    "Other",
];

/// How hot a lead is. Drives the follow-up cadence: Hot leads get a call in
/// hours, Cold leads can wait days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Temperature {
    Hot,
    Warm,
    Cold,
}

impl Temperature {
    pub fn as_str(&self) -> &'static str {
        match self {
            Temperature::Hot => "Hot",
            Temperature::Warm => "Warm",
            Temperature::Cold => "Cold",
        }
    }
}

impl Default for Temperature {
    fn default() -> Self {
        Temperature::Warm
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Temperature {
    type Err = LeadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Hot" => Ok(Temperature::Hot),
            "Warm" => Ok(Temperature::Warm),
            "Cold" => Ok(Temperature::Cold),
            other => Err(LeadError::InvalidInput(format!(
                "unknown temperature '{other}'"
            ))),
        }
    }
}

/// Pipeline outcome of a lead. `Closed` and `Lost` are terminal; a lead that
/// leaves `Active` never comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadStatus {
    Active,
    Closed,
    Lost,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::Active => "Active",
            LeadStatus::Closed => "Closed",
            LeadStatus::Lost => "Lost",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LeadStatus::Closed | LeadStatus::Lost)
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadStatus {
    type Err = LeadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Active" => Ok(LeadStatus::Active),
            "Closed" => Ok(LeadStatus::Closed),
            "Lost" => Ok(LeadStatus::Lost),
            other => Err(LeadError::InvalidInput(format!(
                "unknown lead status '{other}'"
            ))),
        }
    }
}

/// Where the quote conversation stands. Independent of [`LeadStatus`]: a lead
/// can be Lost while a quote was still out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuoteStatus {
    Requested,
    Sent,
    Negotiating,
    Accepted,
    Declined,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::Requested => "Requested",
            QuoteStatus::Sent => "Sent",
            QuoteStatus::Negotiating => "Negotiating",
            QuoteStatus::Accepted => "Accepted",
            QuoteStatus::Declined => "Declined",
        }
    }

    /// True once a concrete quote has gone out. `quoted_price` is only
    /// meaningful past this point.
    pub fn is_quoted(&self) -> bool {
        !matches!(self, QuoteStatus::Requested)
    }
}

impl Default for QuoteStatus {
    fn default() -> Self {
        QuoteStatus::Requested
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuoteStatus {
    type Err = LeadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Requested" => Ok(QuoteStatus::Requested),
            "Sent" => Ok(QuoteStatus::Sent),
            "Negotiating" => Ok(QuoteStatus::Negotiating),
            "Accepted" => Ok(QuoteStatus::Accepted),
            "Declined" => Ok(QuoteStatus::Declined),
            other => Err(LeadError::InvalidInput(format!(
                "unknown quote status '{other}'"
            ))),
        }
    }
}

/// A sales lead as stored and served.
///
/// `temperature` persists in the `lead_status` column; the table predates the
/// rename and carries both it and the pipeline `status` column.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    pub name: String,
    pub source: String,
    pub contact_method: String,
    pub quote_status: QuoteStatus,
    pub temperature: Temperature,
    pub quoted_price: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub next_followup: DateTime<Utc>,
    pub status: LeadStatus,
}

/// Intake payload for a new lead. Identity, timestamps, and the follow-up
/// schedule are assigned at creation, not supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadDraft {
    pub name: String,
    pub source: String,
    pub contact_method: String,
    #[serde(default)]
    pub temperature: Temperature,
    #[serde(default)]
    pub quote_status: QuoteStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quoted_price: Option<f64>,
}

/// Close performance for one lead source.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceCloseRatio {
    pub source: String,
    pub total: i64,
    pub closed: i64,
    /// Fraction in `0.0..=1.0`. Groups always have at least one lead.
    pub ratio: f64,
}

/// Intake volume for the dashboard, relative to a reference day.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadCounts {
    pub today: i64,
    pub yesterday: i64,
    pub by_status: HashMap<String, i64>,
    pub by_temperature: HashMap<String, i64>,
}

/// The morning summary covering the previous day.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReport {
    pub report_date: NaiveDate,
    pub new_leads: i64,
    /// Overall close ratio as a fraction, `None` while the book is empty.
    pub close_ratio: Option<f64>,
}

impl DailyReport {
    pub fn render(&self) -> String {
        let ratio = match self.close_ratio {
            Some(ratio) => format!("{:.2}%", ratio * 100.0),
            None => "n/a".to_string(),
        };
        format!(
            "Daily Report - {}\nNew Leads: {}\nClose Ratio: {}",
            self.report_date.format("%Y-%m-%d"),
            self.new_leads,
            ratio
        )
    }
}
