// Reporting service: the morning summary and follow-up reminders.
//
// Output mirrors what agents already read in the log: yesterday's intake, the
// book-wide close ratio, and the list of leads due for a touch.

use chrono::{DateTime, NaiveDate, Utc};

use crate::db::LeadStore;
use crate::error::LeadError;
use crate::types::{DailyReport, Lead};

pub fn daily_report(store: &LeadStore) -> Result<DailyReport, LeadError> {
    daily_report_for(store, Utc::now().date_naive())
}

/// Summary covering the day before `today`.
pub fn daily_report_for(store: &LeadStore, today: NaiveDate) -> Result<DailyReport, LeadError> {
    let counts = store.lead_counts(today)?;
    let close_ratio = store.close_ratio(None)?;
    let report = DailyReport {
        report_date: today.pred_opt().unwrap_or(today),
        new_leads: counts.yesterday,
        close_ratio,
    };
    log::info!("{}", report.render());
    Ok(report)
}

pub fn followup_reminders(store: &LeadStore) -> Result<Vec<Lead>, LeadError> {
    followup_reminders_at(store, Utc::now())
}

/// Active leads due at or before `now`, logged in reminder form.
pub fn followup_reminders_at(
    store: &LeadStore,
    now: DateTime<Utc>,
) -> Result<Vec<Lead>, LeadError> {
    let due = store.get_due_followups(now)?;
    if due.is_empty() {
        log::info!("No leads need follow-up at this time.");
        return Ok(due);
    }
    let mut message = String::from("Reminder: Follow up with these leads:\n");
    for lead in &due {
        message.push_str(&format!(
            "- {} ({}): Follow up due at {}\n",
            lead.name,
            lead.temperature,
            lead.next_followup.to_rfc3339()
        ));
    }
    log::info!("{}", message.trim_end());
    Ok(due)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::test_db;
    use crate::services::leads::{create_lead_at, transition_status};
    use crate::types::{LeadDraft, QuoteStatus, Temperature};
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn draft(name: &str) -> LeadDraft {
        LeadDraft {
            name: name.to_string(),
            source: "Website".to_string(),
            contact_method: "Email".to_string(),
            temperature: Temperature::Warm,
            quote_status: QuoteStatus::Requested,
            quoted_price: None,
        }
    }

    #[test]
    fn daily_report_counts_yesterday_and_renders() {
        let store = test_db();
        for hour in [8, 10, 13, 16] {
            create_lead_at(&store, draft("Yesterday Lead"), at(2024, 1, 1, hour, 0, 0)).unwrap();
        }
        let today_lead =
            create_lead_at(&store, draft("Today Lead"), at(2024, 1, 2, 7, 0, 0)).unwrap();
        transition_status(&store, &today_lead.id, "Closed").unwrap();

        let report =
            daily_report_for(&store, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()).unwrap();
        assert_eq!(
            report.report_date,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
        assert_eq!(report.new_leads, 4);
        assert_eq!(report.close_ratio, Some(0.2));
        assert_eq!(
            report.render(),
            "Daily Report - 2024-01-01\nNew Leads: 4\nClose Ratio: 20.00%"
        );
    }

    #[test]
    fn daily_report_on_an_empty_book_has_no_ratio() {
        let store = test_db();
        let report =
            daily_report_for(&store, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()).unwrap();
        assert_eq!(report.new_leads, 0);
        assert_eq!(report.close_ratio, None);
        assert!(report.render().ends_with("Close Ratio: n/a"));
    }

    #[test]
    fn reminders_return_only_due_active_leads() {
        let store = test_db();
        let mut hot = draft("Due Lead");
        hot.temperature = Temperature::Hot;
        let due_lead = create_lead_at(&store, hot, at(2024, 1, 1, 9, 0, 0)).unwrap();
        create_lead_at(&store, draft("Fresh Lead"), at(2024, 1, 1, 11, 0, 0)).unwrap();

        let due = followup_reminders_at(&store, at(2024, 1, 1, 12, 0, 0)).unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, due_lead.id);
    }

    #[test]
    fn reminders_are_empty_when_nothing_is_due() {
        let store = test_db();
        create_lead_at(&store, draft("Fresh Lead"), at(2024, 1, 1, 11, 0, 0)).unwrap();
        let due = followup_reminders_at(&store, at(2024, 1, 1, 11, 30, 0)).unwrap();
        assert!(due.is_empty());
    }
}
