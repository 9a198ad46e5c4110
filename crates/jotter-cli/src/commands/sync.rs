use jotter_core::{LoadOutcome, NoteQuery, SyncReport};

use crate::commands::common::{connect, Client};
use crate::error::CliError;

pub async fn run_sync(client: &Client) -> Result<(), CliError> {
    let outcome = connect(client, &NoteQuery::default()).await?;
    let pending = client.store().snapshot().pending_operations_count;

    match outcome {
        LoadOutcome::Cached { .. } => {
            println!("Backend unreachable; {pending} changes still pending");
        }
        LoadOutcome::Remote { synced, .. } => {
            let report = synced.unwrap_or_default();
            println!("{}", format_sync_report(&report, pending));
        }
    }
    Ok(())
}

pub fn format_sync_report(report: &SyncReport, pending: usize) -> String {
    if !report.ran() {
        return "Nothing to sync".to_string();
    }

    let mut summary = format!(
        "Sync completed: {} replayed, {} retried, {} dropped",
        report.replayed, report.retried, report.dropped
    );
    if report.deferred > 0 {
        summary.push_str(&format!(", {} waiting on unsynced notes", report.deferred));
    }
    if report.halted_on_auth {
        summary.push_str(" (stopped: session rejected)");
    }
    summary.push_str(&format!("; {pending} pending"));
    summary
}
