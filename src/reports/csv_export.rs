//! CSV rendering for ledger exports and monthly summaries.

use crate::ledger::repo_types::{DailyTotal, LedgerEntry};

/// `id,date,description,amount` followed by one row per entry.
pub fn entries_csv(entries: &[LedgerEntry]) -> anyhow::Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(["id", "date", "description", "amount"])?;
    for entry in entries {
        writer.serialize((entry.id, &entry.date, &entry.description, entry.amount))?;
    }
    finish(writer)
}

/// `date,total` followed by one row per active day.
pub fn daily_totals_csv(days: &[DailyTotal]) -> anyhow::Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(["date", "total"])?;
    for day in days {
        writer.serialize((&day.date, day.total))?;
    }
    finish(writer)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> anyhow::Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flush csv: {}", e.error()))?;
    Ok(String::from_utf8(bytes)?)
}
