// Lead row storage and retrieval.

use super::*;
use crate::error::LeadError;
use crate::types::{Lead, LeadStatus, QuoteStatus, Temperature};

const SELECT_LEAD: &str = "SELECT id, name, source, contact_method, quote_status, lead_status,
            quoted_price, created_at, next_followup, status
     FROM leads";

impl LeadStore {
    // ========================================================================
    // Writes
    // ========================================================================

    pub fn insert_lead(&self, lead: &Lead) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO leads (id, name, source, contact_method, quote_status, lead_status,
                                quoted_price, created_at, next_followup, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                lead.id,
                lead.name,
                lead.source,
                lead.contact_method,
                lead.quote_status.as_str(),
                lead.temperature.as_str(),
                lead.quoted_price,
                lead.created_at.to_rfc3339(),
                lead.next_followup.to_rfc3339(),
                lead.status.as_str(),
            ],
        )?;
        Ok(())
    }

    pub fn update_status(&self, id: &str, status: LeadStatus) -> Result<bool, DbError> {
        let rows = self.conn.execute(
            "UPDATE leads SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )?;
        Ok(rows > 0)
    }

    pub fn set_quote(
        &self,
        id: &str,
        price: f64,
        quote_status: QuoteStatus,
    ) -> Result<bool, DbError> {
        let rows = self.conn.execute(
            "UPDATE leads SET quoted_price = ?1, quote_status = ?2 WHERE id = ?3",
            params![price, quote_status.as_str(), id],
        )?;
        Ok(rows > 0)
    }

    pub fn reschedule_followup(
        &self,
        id: &str,
        temperature: Temperature,
        next_followup: DateTime<Utc>,
    ) -> Result<bool, DbError> {
        let rows = self.conn.execute(
            "UPDATE leads SET lead_status = ?1, next_followup = ?2 WHERE id = ?3",
            params![temperature.as_str(), next_followup.to_rfc3339(), id],
        )?;
        Ok(rows > 0)
    }

    pub fn update_contact_details(
        &self,
        id: &str,
        name: &str,
        source: &str,
        contact_method: &str,
    ) -> Result<bool, DbError> {
        let rows = self.conn.execute(
            "UPDATE leads SET name = ?1, source = ?2, contact_method = ?3 WHERE id = ?4",
            params![name, source, contact_method, id],
        )?;
        Ok(rows > 0)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn get_lead(&self, id: &str) -> Result<Option<Lead>, DbError> {
        let mut stmt = self.conn.prepare(&format!("{SELECT_LEAD} WHERE id = ?1"))?;
        let mut rows = stmt.query_map(params![id], Self::map_lead_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    pub fn get_all_leads(&self) -> Result<Vec<Lead>, DbError> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_LEAD} ORDER BY created_at DESC"))?;
        let rows = stmt.query_map([], Self::map_lead_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn get_active_leads(&self) -> Result<Vec<Lead>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "{SELECT_LEAD} WHERE status = 'Active' ORDER BY next_followup ASC"
        ))?;
        let rows = stmt.query_map([], Self::map_lead_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Active leads whose follow-up is due at or before `now`, soonest first.
    pub fn get_due_followups(&self, now: DateTime<Utc>) -> Result<Vec<Lead>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "{SELECT_LEAD} WHERE status = 'Active' AND next_followup <= ?1
             ORDER BY next_followup ASC"
        ))?;
        let rows = stmt.query_map(params![now.to_rfc3339()], Self::map_lead_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn count_leads(&self) -> Result<i64, DbError> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM leads", [], |row| row.get(0))?)
    }

    // ========================================================================
    // Row mapping
    // ========================================================================

    /// Maps a `SELECT_LEAD` row. Unknown temperature or quote status values
    /// degrade to defaults with a warning; a corrupt pipeline status is an
    /// error because the transition rules depend on it.
    pub(crate) fn map_lead_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Lead> {
        let id: String = row.get(0)?;

        let quote_raw: String = row.get(4)?;
        let quote_status = quote_raw.parse().unwrap_or_else(|_| {
            log::warn!("lead {id}: unknown quote status '{quote_raw}', treating as Requested");
            QuoteStatus::Requested
        });

        let temperature_raw: String = row.get(5)?;
        let temperature = temperature_raw.parse().unwrap_or_else(|_| {
            log::warn!("lead {id}: unknown temperature '{temperature_raw}', treating as Warm");
            Temperature::Warm
        });

        let status_raw: String = row.get(9)?;
        let status = status_raw
            .parse::<LeadStatus>()
            .map_err(|e| column_error(9, e))?;

        Ok(Lead {
            id,
            name: row.get(1)?,
            source: row.get(2)?,
            contact_method: row.get(3)?,
            quote_status,
            temperature,
            quoted_price: row.get(6)?,
            created_at: timestamp_column(row, 7)?,
            next_followup: timestamp_column(row, 8)?,
            status,
        })
    }
}

fn column_error(index: usize, err: LeadError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(err))
}

fn timestamp_column(row: &rusqlite::Row<'_>, index: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(index)?;
    parse_db_timestamp(&raw).ok_or_else(|| {
        column_error(
            index,
            LeadError::InvalidInput(format!("unparseable timestamp '{raw}'")),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::test_db;
    use crate::lifecycle;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn lead_at(id: &str, created: DateTime<Utc>, temperature: Temperature) -> Lead {
        Lead {
            id: id.to_string(),
            name: "Dana Voss".to_string(),
            source: "Website".to_string(),
            contact_method: "Email".to_string(),
            quote_status: QuoteStatus::Requested,
            temperature,
            quoted_price: None,
            created_at: created,
            next_followup: lifecycle::next_followup_at(created, temperature),
            status: LeadStatus::Active,
        }
    }

    #[test]
    fn insert_and_get_round_trip() {
        let store = test_db();
        let mut lead = lead_at("LEAD-20240101090000-ab12", at(2024, 1, 1, 9, 0, 0), Temperature::Hot);
        lead.quote_status = QuoteStatus::Sent;
        lead.quoted_price = Some(250.0);
        store.insert_lead(&lead).unwrap();

        let loaded = store.get_lead(&lead.id).unwrap().expect("lead present");
        assert_eq!(loaded.name, "Dana Voss");
        assert_eq!(loaded.source, "Website");
        assert_eq!(loaded.contact_method, "Email");
        assert_eq!(loaded.quote_status, QuoteStatus::Sent);
        assert_eq!(loaded.temperature, Temperature::Hot);
        assert_eq!(loaded.quoted_price, Some(250.0));
        assert_eq!(loaded.created_at, lead.created_at);
        assert_eq!(loaded.next_followup, at(2024, 1, 1, 12, 0, 0));
        assert_eq!(loaded.status, LeadStatus::Active);
    }

    #[test]
    fn get_lead_returns_none_for_missing_id() {
        let store = test_db();
        assert!(store.get_lead("LEAD-20240101000000-none").unwrap().is_none());
    }

    #[test]
    fn all_leads_come_back_newest_first() {
        let store = test_db();
        store
            .insert_lead(&lead_at("LEAD-a", at(2024, 1, 1, 8, 0, 0), Temperature::Warm))
            .unwrap();
        store
            .insert_lead(&lead_at("LEAD-b", at(2024, 1, 2, 8, 0, 0), Temperature::Warm))
            .unwrap();

        let all = store.get_all_leads().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, "LEAD-b");
        assert_eq!(all[1].id, "LEAD-a");
    }

    #[test]
    fn active_listing_excludes_terminal_leads() {
        let store = test_db();
        store
            .insert_lead(&lead_at("LEAD-a", at(2024, 1, 1, 8, 0, 0), Temperature::Warm))
            .unwrap();
        store
            .insert_lead(&lead_at("LEAD-b", at(2024, 1, 1, 9, 0, 0), Temperature::Warm))
            .unwrap();
        assert!(store.update_status("LEAD-b", LeadStatus::Closed).unwrap());

        let active = store.get_active_leads().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "LEAD-a");
    }

    #[test]
    fn due_scan_includes_the_boundary_and_skips_terminal_leads() {
        let store = test_db();
        // Hot lead created 09:00, due 12:00.
        store
            .insert_lead(&lead_at("LEAD-due", at(2024, 1, 1, 9, 0, 0), Temperature::Hot))
            .unwrap();
        // Warm lead created 11:00, due tomorrow.
        store
            .insert_lead(&lead_at("LEAD-later", at(2024, 1, 1, 11, 0, 0), Temperature::Warm))
            .unwrap();
        // Hot lead already closed; never due.
        store
            .insert_lead(&lead_at("LEAD-closed", at(2024, 1, 1, 8, 0, 0), Temperature::Hot))
            .unwrap();
        store.update_status("LEAD-closed", LeadStatus::Closed).unwrap();

        let due = store.get_due_followups(at(2024, 1, 1, 12, 0, 0)).unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, "LEAD-due");

        let none_due = store.get_due_followups(at(2024, 1, 1, 11, 59, 59)).unwrap();
        assert!(none_due.is_empty());
    }

    #[test]
    fn due_scan_orders_soonest_first() {
        let store = test_db();
        store
            .insert_lead(&lead_at("LEAD-second", at(2024, 1, 1, 10, 0, 0), Temperature::Hot))
            .unwrap();
        store
            .insert_lead(&lead_at("LEAD-first", at(2024, 1, 1, 9, 0, 0), Temperature::Hot))
            .unwrap();

        let due = store.get_due_followups(at(2024, 1, 2, 0, 0, 0)).unwrap();
        let ids: Vec<&str> = due.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["LEAD-first", "LEAD-second"]);
    }

    #[test]
    fn updates_report_whether_a_row_matched() {
        let store = test_db();
        store
            .insert_lead(&lead_at("LEAD-a", at(2024, 1, 1, 8, 0, 0), Temperature::Warm))
            .unwrap();

        assert!(store.update_status("LEAD-a", LeadStatus::Lost).unwrap());
        assert!(!store.update_status("LEAD-missing", LeadStatus::Lost).unwrap());
        assert_eq!(
            store.get_lead("LEAD-a").unwrap().unwrap().status,
            LeadStatus::Lost
        );
    }

    #[test]
    fn set_quote_persists_price_and_status() {
        let store = test_db();
        store
            .insert_lead(&lead_at("LEAD-a", at(2024, 1, 1, 8, 0, 0), Temperature::Warm))
            .unwrap();

        assert!(store.set_quote("LEAD-a", 312.5, QuoteStatus::Sent).unwrap());
        let lead = store.get_lead("LEAD-a").unwrap().unwrap();
        assert_eq!(lead.quoted_price, Some(312.5));
        assert_eq!(lead.quote_status, QuoteStatus::Sent);
    }

    #[test]
    fn reschedule_updates_temperature_and_due_date() {
        let store = test_db();
        store
            .insert_lead(&lead_at("LEAD-a", at(2024, 1, 1, 8, 0, 0), Temperature::Warm))
            .unwrap();

        let due = at(2024, 1, 3, 8, 0, 0);
        assert!(store
            .reschedule_followup("LEAD-a", Temperature::Cold, due)
            .unwrap());
        let lead = store.get_lead("LEAD-a").unwrap().unwrap();
        assert_eq!(lead.temperature, Temperature::Cold);
        assert_eq!(lead.next_followup, due);
    }

    #[test]
    fn contact_details_update_in_place() {
        let store = test_db();
        store
            .insert_lead(&lead_at("LEAD-a", at(2024, 1, 1, 8, 0, 0), Temperature::Warm))
            .unwrap();

        assert!(store
            .update_contact_details("LEAD-a", "Dana Voss-Hart", "Referral", "Phone")
            .unwrap());
        let lead = store.get_lead("LEAD-a").unwrap().unwrap();
        assert_eq!(lead.name, "Dana Voss-Hart");
        assert_eq!(lead.source, "Referral");
        assert_eq!(lead.contact_method, "Phone");
    }

    #[test]
    fn unknown_temperature_and_quote_status_degrade_to_defaults() {
        let store = test_db();
        store
            .conn_ref()
            .execute(
                "INSERT INTO leads (id, name, source, contact_method, quote_status,
                                    lead_status, created_at, next_followup, status)
                 VALUES ('LEAD-legacy', 'Riley Poe', 'Other', 'Email', 'Pending',
                         'Lukewarm', '2024-01-01T00:00:00+00:00',
                         '2024-01-02T00:00:00+00:00', 'Active')",
                [],
            )
            .unwrap();

        let lead = store.get_lead("LEAD-legacy").unwrap().unwrap();
        assert_eq!(lead.temperature, Temperature::Warm);
        assert_eq!(lead.quote_status, QuoteStatus::Requested);
    }

    #[test]
    fn corrupt_pipeline_status_is_an_error() {
        let store = test_db();
        store
            .conn_ref()
            .execute(
                "INSERT INTO leads (id, name, source, contact_method, quote_status,
                                    lead_status, created_at, next_followup, status)
                 VALUES ('LEAD-corrupt', 'Riley Poe', 'Other', 'Email', 'Requested',
                         'Warm', '2024-01-01T00:00:00+00:00',
                         '2024-01-02T00:00:00+00:00', 'Paused')",
                [],
            )
            .unwrap();

        assert!(store.get_lead("LEAD-corrupt").is_err());
    }
}
