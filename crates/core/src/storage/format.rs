use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::JournalError;
use crate::models::entry::{Entry, EntryId, TradeDetails, TradeSide};

/// Current document format version.
pub const CURRENT_VERSION: u32 = 1;

/// Versioned envelope written under the storage key.
///
/// Layout:
/// ```text
/// { "version": 1, "entries": [ Entry, ... ] }
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct Document {
    pub version: u32,
    pub entries: Vec<Entry>,
}

/// Result of decoding a stored payload.
#[derive(Debug)]
pub struct Decoded {
    pub entries: Vec<Entry>,
    /// `true` when the payload was a pre-envelope bare array
    pub upgraded: bool,
    /// Legacy records dropped because they could not be read
    pub skipped: usize,
}

/// Serialize the full collection into a versioned document.
pub fn write_document(entries: &[Entry]) -> Result<String, JournalError> {
    #[derive(Serialize)]
    struct DocumentRef<'a> {
        version: u32,
        entries: &'a [Entry],
    }

    serde_json::to_string(&DocumentRef {
        version: CURRENT_VERSION,
        entries,
    })
    .map_err(|e| JournalError::Serialization(format!("Failed to serialize entries: {e}")))
}

/// Parse a stored payload.
///
/// Accepts the versioned envelope, or a bare JSON array written by the older
/// simple-journal and trade-journal pages (those records get fresh ids).
pub fn read_document(raw: &str) -> Result<Decoded, JournalError> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| JournalError::Deserialization(format!("Stored payload is not JSON: {e}")))?;

    match value {
        serde_json::Value::Array(records) => Ok(read_legacy(records)),
        serde_json::Value::Object(ref map) => {
            let version = map
                .get("version")
                .and_then(serde_json::Value::as_u64)
                .ok_or_else(|| {
                    JournalError::Deserialization("Document has no numeric 'version'".into())
                })?;
            let version = u32::try_from(version)
                .map_err(|_| JournalError::UnsupportedVersion(u32::MAX))?;
            if version == 0 || version > CURRENT_VERSION {
                return Err(JournalError::UnsupportedVersion(version));
            }

            let doc: Document = serde_json::from_value(value).map_err(|e| {
                JournalError::Deserialization(format!("Failed to read entries: {e}"))
            })?;
            Ok(Decoded {
                entries: doc.entries,
                upgraded: false,
                skipped: 0,
            })
        }
        _ => Err(JournalError::Deserialization(
            "Stored payload is neither an array nor a document".into(),
        )),
    }
}

// ── Legacy records ──────────────────────────────────────────────────

/// Superset of the two historical record shapes:
/// `{date, desc, amount, image}` and
/// `{date, time, symbol, type, quantity, entryPrice, exitPrice, strategy, notes, pnl, images}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyRecord {
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    time: Option<String>,
    #[serde(default, alias = "pnl")]
    amount: Option<f64>,
    #[serde(default, alias = "desc", alias = "notes")]
    description: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default, rename = "type")]
    trade_type: Option<String>,
    #[serde(default)]
    quantity: Option<f64>,
    #[serde(default)]
    entry_price: Option<f64>,
    #[serde(default)]
    exit_price: Option<f64>,
    #[serde(default)]
    strategy: Option<String>,
}

fn read_legacy(records: Vec<serde_json::Value>) -> Decoded {
    let total = records.len();
    let entries: Vec<Entry> = records
        .into_iter()
        .filter_map(|v| serde_json::from_value::<LegacyRecord>(v).ok())
        .filter_map(upgrade_record)
        .collect();
    let skipped = total - entries.len();
    Decoded {
        entries,
        upgraded: true,
        skipped,
    }
}

fn upgrade_record(record: LegacyRecord) -> Option<Entry> {
    let raw_date = record.date?;
    let (date, mut time) = parse_legacy_date(&raw_date)?;
    if let Some(t) = record.time.as_deref() {
        time = parse_time(t).or(time);
    }

    let mut images = record.images;
    if let Some(image) = record.image.filter(|i| !i.is_empty()) {
        images.insert(0, image);
    }

    let trade = match (
        record.symbol,
        record.trade_type.and_then(|t| t.parse::<TradeSide>().ok()),
        record.quantity,
        record.entry_price,
        record.exit_price,
        record.strategy,
    ) {
        (Some(symbol), Some(side), Some(quantity), Some(entry_price), Some(exit_price), Some(strategy)) => {
            Some(TradeDetails {
                symbol: symbol.trim().to_uppercase(),
                side,
                quantity,
                entry_price,
                exit_price,
                strategy,
            })
        }
        _ => None,
    };

    let now = Utc::now();
    Some(Entry {
        id: EntryId::generate(),
        date,
        time,
        amount: record.amount.filter(|a| a.is_finite()).unwrap_or(0.0),
        description: record.description.unwrap_or_default(),
        images,
        trade,
        created_at: now,
        updated_at: now,
    })
}

fn parse_legacy_date(raw: &str) -> Option<(NaiveDate, Option<NaiveTime>)> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some((date, None));
    }
    ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| (dt.date(), Some(dt.time())))
}

/// Parse `HH:MM` or `HH:MM:SS`.
pub(crate) fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}
