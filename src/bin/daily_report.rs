//! Prints the daily lead report and any pending follow-up reminders.
//!
//! Reads the same configuration surface as the web layer: `DATABASE_URL` and
//! `SESSION_SECRET` from the environment, `~/.leadbook/config.json` as the
//! fallback. Meant for a morning cron entry or a manual run.

use leadbook::config::Config;
use leadbook::db::LeadStore;
use leadbook::services::reports;
use leadbook::LeadError;

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("daily report failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), LeadError> {
    let config = Config::load()?;
    let store = LeadStore::open_from_config(&config)?;

    let report = reports::daily_report(&store)?;
    println!("{}", report.render());
    println!();

    let due = reports::followup_reminders(&store)?;
    if due.is_empty() {
        println!("No leads need follow-up at this time.");
    } else {
        println!("Reminder: Follow up with these leads:");
        for lead in &due {
            println!(
                "- {} ({}): Follow up due at {}",
                lead.name,
                lead.temperature,
                lead.next_followup.to_rfc3339()
            );
        }
    }
    Ok(())
}
