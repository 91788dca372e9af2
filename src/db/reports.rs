// Aggregation queries behind the dashboard and the daily report.
//
// Counting happens in SQL. Ratios divide in Rust so an empty book can come
// back as `None` instead of a made-up zero.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate, NaiveTime};

use super::*;
use crate::types::{LeadCounts, SourceCloseRatio};

impl LeadStore {
    /// Fraction of leads marked `Closed`, optionally restricted to one
    /// source. `None` when no leads match, which keeps "no data yet" distinct
    /// from "closing nothing".
    pub fn close_ratio(&self, source: Option<&str>) -> Result<Option<f64>, DbError> {
        let (total, closed): (i64, i64) = match source {
            Some(source) => self.conn.query_row(
                "SELECT COUNT(*),
                        COALESCE(SUM(CASE WHEN status = 'Closed' THEN 1 ELSE 0 END), 0)
                 FROM leads WHERE source = ?1",
                params![source],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?,
            None => self.conn.query_row(
                "SELECT COUNT(*),
                        COALESCE(SUM(CASE WHEN status = 'Closed' THEN 1 ELSE 0 END), 0)
                 FROM leads",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?,
        };
        if total == 0 {
            return Ok(None);
        }
        Ok(Some(closed as f64 / total as f64))
    }

    /// Close performance per source in one pass, busiest sources first.
    pub fn close_ratios_by_source(&self) -> Result<Vec<SourceCloseRatio>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT source, COUNT(*) AS total,
                    SUM(CASE WHEN status = 'Closed' THEN 1 ELSE 0 END) AS closed
             FROM leads
             GROUP BY source
             ORDER BY total DESC, source ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            let total: i64 = row.get(1)?;
            let closed: i64 = row.get(2)?;
            Ok(SourceCloseRatio {
                source: row.get(0)?,
                total,
                closed,
                ratio: closed as f64 / total as f64,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Intake counts for `day` and the day before, plus breakdowns of the
    /// whole book by pipeline status and temperature.
    pub fn lead_counts(&self, day: NaiveDate) -> Result<LeadCounts, DbError> {
        let day_start = day.and_time(NaiveTime::MIN).and_utc();
        let next_day = day_start + Duration::hours(24);
        let prev_day = day_start - Duration::hours(24);
        Ok(LeadCounts {
            today: self.count_created_between(day_start, next_day)?,
            yesterday: self.count_created_between(prev_day, day_start)?,
            by_status: self
                .counts_by_key("SELECT status, COUNT(*) FROM leads GROUP BY status")?,
            by_temperature: self
                .counts_by_key("SELECT lead_status, COUNT(*) FROM leads GROUP BY lead_status")?,
        })
    }

    /// Leads created in the half-open window `[start, end)`.
    pub fn count_created_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<i64, DbError> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM leads WHERE created_at >= ?1 AND created_at < ?2",
            params![start.to_rfc3339(), end.to_rfc3339()],
            |row| row.get(0),
        )?)
    }

    fn counts_by_key(&self, sql: &str) -> Result<HashMap<String, i64>, DbError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        let mut map = HashMap::new();
        for row in rows {
            let (key, count) = row?;
            map.insert(key, count);
        }
        Ok(map)
    }
}
