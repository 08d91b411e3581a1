use crate::commands::{markdown_table, Out, OutputFormat};
use crate::error::{ErrorType, IntoResult, Res};
use crate::ledger::HistoryRow;
use crate::model::{Category, DATE_FORMAT, TIME_FORMAT};
use crate::session::Session;
use crate::{Config, Result};
use anyhow::{anyhow, Context};
use serde::Serialize;

const HEADERS: [&str; 6] = ["#", "Date", "Time", "Description", "Amount", "Category"];

/// Handles the `fintrack history` command: the signed-in user's transactions newest first,
/// numbered from 1, rendered as `format`.
pub async fn history(config: &Config, format: OutputFormat) -> Result<Out<Vec<HistoryRow>>> {
    let session = Session::resume(config).await?;
    let rows = session.history();
    let report = render(&rows, format).pub_result(ErrorType::Io)?;
    let message = match rows.len() {
        0 => "No transactions yet".to_string(),
        1 => "1 transaction".to_string(),
        n => format!("{n} transactions"),
    };
    Ok(Out::new(message, rows).with_report(report))
}

/// A flat history row for CSV, which cannot represent nested structures.
#[derive(Serialize)]
struct CsvRow<'a> {
    number: usize,
    id: &'a str,
    date: String,
    time: String,
    description: &'a str,
    amount: String,
    category: Category,
}

impl<'a> From<&'a HistoryRow> for CsvRow<'a> {
    fn from(row: &'a HistoryRow) -> Self {
        let t = &row.entry.transaction;
        Self {
            number: row.number,
            id: row.entry.id.as_str(),
            date: t.date().format(DATE_FORMAT).to_string(),
            time: t
                .time()
                .map(|time| time.format(TIME_FORMAT).to_string())
                .unwrap_or_default(),
            description: t.description(),
            amount: t.amount().plain(),
            category: t.category(),
        }
    }
}

fn render(rows: &[HistoryRow], format: OutputFormat) -> Res<String> {
    match format {
        OutputFormat::Table => Ok(table(rows)),
        OutputFormat::Csv => csv(rows),
        OutputFormat::Json => {
            serde_json::to_string_pretty(rows).context("Unable to serialize history as JSON")
        }
    }
}

fn table(rows: &[HistoryRow]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            let t = &row.entry.transaction;
            vec![
                row.number.to_string(),
                t.date().format(DATE_FORMAT).to_string(),
                t.time()
                    .map(|time| time.format("%H:%M").to_string())
                    .unwrap_or_default(),
                t.description().to_string(),
                t.amount().to_string(),
                t.category().to_string(),
            ]
        })
        .collect();
    markdown_table(&HEADERS, &cells)
}

fn csv(rows: &[HistoryRow]) -> Res<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer
            .serialize(CsvRow::from(row))
            .context("Unable to write CSV row")?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("Unable to finish CSV output: {e}"))?;
    String::from_utf8(bytes).context("CSV output was not UTF-8")
}
