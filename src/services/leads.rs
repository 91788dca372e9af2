// Lead service: intake, follow-up scheduling, quotes, and status changes.
//
// Every read-modify-write runs inside `with_transaction` so a concurrent
// writer cannot slip between the read and the update. The `_at` variants take
// the clock as a parameter; the plain variants use now.

use chrono::{DateTime, Utc};

use crate::db::LeadStore;
use crate::error::LeadError;
use crate::lifecycle;
use crate::types::{Lead, LeadDraft, LeadStatus, QuoteStatus, Temperature};

/// Creates a lead from an intake form. Assigns the id, stamps `created_at`,
/// and schedules the first follow-up from the lead's temperature.
pub fn create_lead(store: &LeadStore, draft: LeadDraft) -> Result<Lead, LeadError> {
    create_lead_at(store, draft, Utc::now())
}

pub fn create_lead_at(
    store: &LeadStore,
    draft: LeadDraft,
    now: DateTime<Utc>,
) -> Result<Lead, LeadError> {
    let name = required_field(&draft.name, "name")?;
    let source = required_field(&draft.source, "source")?;
    let contact_method = required_field(&draft.contact_method, "contact method")?;
    if let Some(price) = draft.quoted_price {
        lifecycle::validate_quote_price(price)?;
        if !draft.quote_status.is_quoted() {
            return Err(LeadError::InvalidInput(
                "a quoted price requires a quote status past Requested".to_string(),
            ));
        }
    }

    let lead = Lead {
        id: lifecycle::generate_lead_id(now),
        name,
        source,
        contact_method,
        quote_status: draft.quote_status,
        temperature: draft.temperature,
        quoted_price: draft.quoted_price,
        created_at: now,
        next_followup: lifecycle::next_followup_at(now, draft.temperature),
        status: LeadStatus::Active,
    };
    store.insert_lead(&lead)?;
    log::info!(
        "Created lead {} from {} ({})",
        lead.id,
        lead.source,
        lead.temperature
    );
    Ok(lead)
}

/// Records that the agent just touched the lead: the next follow-up moves to
/// contact time plus the temperature's offset.
pub fn record_contact(store: &LeadStore, lead_id: &str) -> Result<Lead, LeadError> {
    record_contact_at(store, lead_id, Utc::now())
}

pub fn record_contact_at(
    store: &LeadStore,
    lead_id: &str,
    now: DateTime<Utc>,
) -> Result<Lead, LeadError> {
    store.with_transaction(|tx| {
        let mut lead = require_lead(tx, lead_id)?;
        // A follow-up never lands before the lead existed.
        let anchor = now.max(lead.created_at);
        let next_followup = lifecycle::next_followup_at(anchor, lead.temperature);
        tx.reschedule_followup(lead_id, lead.temperature, next_followup)?;
        lead.next_followup = next_followup;
        Ok(lead)
    })
}

/// Reclassifies the lead and reschedules the follow-up under the new cadence,
/// anchored at the moment of the change.
pub fn set_temperature(
    store: &LeadStore,
    lead_id: &str,
    temperature: Temperature,
) -> Result<Lead, LeadError> {
    set_temperature_at(store, lead_id, temperature, Utc::now())
}

pub fn set_temperature_at(
    store: &LeadStore,
    lead_id: &str,
    temperature: Temperature,
    now: DateTime<Utc>,
) -> Result<Lead, LeadError> {
    store.with_transaction(|tx| {
        let mut lead = require_lead(tx, lead_id)?;
        let anchor = now.max(lead.created_at);
        let next_followup = lifecycle::next_followup_at(anchor, temperature);
        tx.reschedule_followup(lead_id, temperature, next_followup)?;
        if lead.temperature != temperature {
            log::info!(
                "Lead {} reclassified {} -> {}",
                lead_id,
                lead.temperature,
                temperature
            );
        }
        lead.temperature = temperature;
        lead.next_followup = next_followup;
        Ok(lead)
    })
}

/// Moves a lead through the pipeline. `requested` is the raw status name from
/// the caller; anything outside Active/Closed/Lost is rejected. Repeating the
/// current status is a no-op. Closed and Lost never change again.
pub fn transition_status(
    store: &LeadStore,
    lead_id: &str,
    requested: &str,
) -> Result<Lead, LeadError> {
    store.with_transaction(|tx| {
        let mut lead = require_lead(tx, lead_id)?;
        let target = match requested.trim().parse::<LeadStatus>() {
            Ok(target) => target,
            Err(_) => {
                return Err(LeadError::InvalidTransition {
                    from: lead.status,
                    to: requested.trim().to_string(),
                })
            }
        };
        lifecycle::check_transition(lead.status, target)?;
        if lead.status != target {
            tx.update_status(lead_id, target)?;
            log::info!("Lead {} moved {} -> {}", lead_id, lead.status, target);
            lead.status = target;
        }
        Ok(lead)
    })
}

/// Records a quoted price. The first quote advances `Requested` to `Sent`;
/// later quotes keep whatever stage the conversation already reached.
pub fn record_quote(store: &LeadStore, lead_id: &str, price: f64) -> Result<Lead, LeadError> {
    lifecycle::validate_quote_price(price)?;
    store.with_transaction(|tx| {
        let mut lead = require_lead(tx, lead_id)?;
        let quote_status = if lead.quote_status.is_quoted() {
            lead.quote_status
        } else {
            QuoteStatus::Sent
        };
        tx.set_quote(lead_id, price, quote_status)?;
        log::info!("Recorded quote of {price:.2} for lead {lead_id}");
        lead.quoted_price = Some(price);
        lead.quote_status = quote_status;
        Ok(lead)
    })
}

/// Edits the contact fields without touching schedule or pipeline state.
pub fn update_details(
    store: &LeadStore,
    lead_id: &str,
    name: &str,
    source: &str,
    contact_method: &str,
) -> Result<Lead, LeadError> {
    let name = required_field(name, "name")?;
    let source = required_field(source, "source")?;
    let contact_method = required_field(contact_method, "contact method")?;
    store.with_transaction(|tx| {
        let mut lead = require_lead(tx, lead_id)?;
        tx.update_contact_details(lead_id, &name, &source, &contact_method)?;
        lead.name = name;
        lead.source = source;
        lead.contact_method = contact_method;
        Ok(lead)
    })
}

fn require_lead(store: &LeadStore, lead_id: &str) -> Result<Lead, LeadError> {
    store
        .get_lead(lead_id)?
        .ok_or_else(|| LeadError::NotFound(lead_id.to_string()))
}

fn required_field(value: &str, field: &str) -> Result<String, LeadError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LeadError::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}
