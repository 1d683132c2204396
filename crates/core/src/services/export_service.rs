use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::errors::JournalError;
use crate::models::entry::Entry;

/// Header for simple journal entries.
pub const SIMPLE_HEADER: [&str; 4] = ["Date", "Description", "Profit/Loss", "Image"];

/// Header used when any exported entry carries trade details.
pub const TRADE_HEADER: [&str; 10] = [
    "Date",
    "Time",
    "Symbol",
    "Type",
    "Quantity",
    "Entry Price",
    "Exit Price",
    "Profit/Loss",
    "Strategy",
    "Notes",
];

/// Writes projections as CSV text.
pub struct ExportService;

impl ExportService {
    pub fn new() -> Self {
        Self
    }

    /// One header row plus one row per entry, in the order given.
    ///
    /// Text fields are always quoted with embedded quotes doubled, even when
    /// they look like numbers; numeric fields are written bare.
    pub fn export_csv(&self, entries: &[&Entry]) -> Result<String, JournalError> {
        let trade_layout = entries.iter().any(|e| e.trade.is_some());

        let mut header = WriterBuilder::new()
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(Vec::new());
        if trade_layout {
            header.write_record(TRADE_HEADER)?;
        } else {
            header.write_record(SIMPLE_HEADER)?;
        }
        let buf = header
            .into_inner()
            .map_err(|e| JournalError::Export(e.to_string()))?;
        let mut out = String::from_utf8(buf).map_err(|e| JournalError::Export(e.to_string()))?;

        for entry in entries {
            let date = Cell::Text(entry.date.format("%Y-%m-%d").to_string());
            let amount = Cell::Number(format!("{:.2}", entry.amount));
            let row = if trade_layout {
                let time = Cell::Text(
                    entry
                        .time
                        .map(|t| t.format("%H:%M").to_string())
                        .unwrap_or_default(),
                );
                let notes = Cell::Text(entry.description.clone());
                match &entry.trade {
                    Some(t) => vec![
                        date,
                        time,
                        Cell::Text(t.symbol.clone()),
                        Cell::Text(t.side.to_string()),
                        Cell::Number(t.quantity.to_string()),
                        Cell::Number(t.entry_price.to_string()),
                        Cell::Number(t.exit_price.to_string()),
                        amount,
                        Cell::Text(t.strategy.clone()),
                        notes,
                    ],
                    None => vec![
                        date,
                        time,
                        Cell::Text(String::new()),
                        Cell::Text(String::new()),
                        Cell::Number(String::new()),
                        Cell::Number(String::new()),
                        Cell::Number(String::new()),
                        amount,
                        Cell::Text(String::new()),
                        notes,
                    ],
                }
            } else {
                vec![
                    date,
                    Cell::Text(entry.description.clone()),
                    amount,
                    Cell::Text(entry.primary_image().unwrap_or_default().to_string()),
                ]
            };
            write_row(&mut out, &row)?;
        }

        Ok(out)
    }
}

/// A CSV cell and how it is quoted.
enum Cell {
    Text(String),
    /// Formatted by us, never holds a delimiter or quote
    Number(String),
}

fn write_row(out: &mut String, cells: &[Cell]) -> Result<(), JournalError> {
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        match cell {
            Cell::Number(n) => out.push_str(n),
            Cell::Text(t) => out.push_str(&quote_text(t)?),
        }
    }
    out.push('\n');
    Ok(())
}

/// A single field written with `QuoteStyle::Always`.
fn quote_text(text: &str) -> Result<String, JournalError> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record([text])?;
    let mut bytes = writer
        .into_inner()
        .map_err(|e| JournalError::Export(e.to_string()))?;
    bytes.pop();
    String::from_utf8(bytes).map_err(|e| JournalError::Export(e.to_string()))
}

impl Default for ExportService {
    fn default() -> Self {
        Self::new()
    }
}
