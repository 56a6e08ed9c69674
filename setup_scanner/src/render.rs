//! Operator-facing output for a [`ScanReport`].

use std::io::{self, Write};

use prettytable::{Table, format, row};

use crate::scan::{ScanReport, SetupResult};

pub const TITLE: &str = "Real-Time Trade Setup Scanner";

/// The one-line status banner shown under the results.
pub fn status_message(report: &ScanReport) -> String {
    match report.setup_count() {
        0 => "No setups found at this moment.".to_string(),
        n => format!("Found {n} setups."),
    }
}

/// `Ticker | Setups` table, one row per result, labels joined by ", ".
pub fn setup_table(results: &[SetupResult]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BOX_CHARS);
    table.set_titles(row![b => "Ticker", "Setups"]);

    for result in results {
        let labels = result
            .setups
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(row![result.ticker, labels]);
    }
    table
}

pub fn render_table<W: Write>(report: &ScanReport, out: &mut W) -> io::Result<()> {
    writeln!(out, "{TITLE}")?;
    writeln!(out)?;
    if !report.results.is_empty() {
        setup_table(&report.results).print(out)?;
    }
    writeln!(out, "{}", status_message(report))?;
    if report.stats.failures() > 0 {
        writeln!(
            out,
            "({} of {} tickers skipped, see log)",
            report.stats.failures(),
            report.stats.scanned
        )?;
    }
    Ok(())
}

pub fn render_json<W: Write>(report: &ScanReport, out: &mut W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)
}
