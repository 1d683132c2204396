use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque, immutable identifier of a journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    /// Generate a fresh timestamp-ordered id (UUIDv7).
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntryId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Direction of a trade in the full trade variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Long,
    Short,
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeSide::Long => write!(f, "long"),
            TradeSide::Short => write!(f, "short"),
        }
    }
}

impl std::str::FromStr for TradeSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "long" | "buy" => Ok(TradeSide::Long),
            "short" | "sell" => Ok(TradeSide::Short),
            other => Err(format!("unknown trade type '{other}' (expected long or short)")),
        }
    }
}

/// Extended fields carried only by full trade entries. All members are
/// required together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeDetails {
    /// Instrument symbol, stored uppercase (e.g., "AAPL", "EURUSD")
    pub symbol: String,
    pub side: TradeSide,
    pub quantity: f64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub strategy: String,
}

/// Whether an entry counts as a profit or a loss for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Profit,
    Loss,
}

/// A single journal record as persisted in the backing store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Assigned once at creation, never reused
    pub id: EntryId,

    /// Trade date (calendar date only, format-checked)
    pub date: NaiveDate,

    /// Optional time of day
    #[serde(default)]
    pub time: Option<NaiveTime>,

    /// Signed profit/loss
    pub amount: f64,

    /// Free text, escaped before display
    pub description: String,

    /// Attached screenshots as `data:` URIs
    #[serde(default)]
    pub images: Vec<String>,

    /// Present only for full trade entries
    #[serde(default)]
    pub trade: Option<TradeDetails>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entry {
    /// Build a stored entry from a validated draft.
    pub(crate) fn from_draft(id: EntryId, draft: EntryDraft) -> Self {
        let now = Utc::now();
        Self {
            id,
            date: draft.date,
            time: draft.time,
            amount: draft.amount,
            description: draft.description,
            images: draft.images,
            trade: draft.trade,
            created_at: now,
            updated_at: now,
        }
    }

    /// Amount ≥ 0 displays as profit.
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        if self.amount >= 0.0 {
            Outcome::Profit
        } else {
            Outcome::Loss
        }
    }

    /// Signed amount with two decimals, e.g. `+10.00` or `-42.50`.
    #[must_use]
    pub fn display_amount(&self) -> String {
        match self.outcome() {
            Outcome::Profit => format!("+{:.2}", self.amount),
            Outcome::Loss => format!("{:.2}", self.amount),
        }
    }

    /// The description, safe to inject into HTML markup.
    #[must_use]
    pub fn description_html(&self) -> String {
        escape_html(&self.description)
    }

    /// First attached image, if any.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// Validated field values destined to become (or replace) an [`Entry`].
#[derive(Debug, Clone, PartialEq)]
pub struct EntryDraft {
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub amount: f64,
    pub description: String,
    /// Empty means "no image submitted"; on update the previous images are kept.
    pub images: Vec<String>,
    pub trade: Option<TradeDetails>,
}

impl EntryDraft {
    /// Minimal draft for the simple journal form.
    pub fn new(date: NaiveDate, amount: f64, description: impl Into<String>) -> Self {
        Self {
            date,
            time: None,
            amount,
            description: description.into(),
            images: Vec::new(),
            trade: None,
        }
    }

    pub fn with_image(mut self, data_uri: impl Into<String>) -> Self {
        self.images.push(data_uri.into());
        self
    }

    pub fn with_trade(mut self, trade: TradeDetails) -> Self {
        self.trade = Some(trade);
        self
    }

    pub fn with_time(mut self, time: NaiveTime) -> Self {
        self.time = Some(time);
        self
    }
}

/// Escape the five HTML-significant characters.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
