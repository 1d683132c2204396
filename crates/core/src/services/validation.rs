use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::{FieldError, JournalError};
use crate::images::traits::ImageSource;
use crate::models::entry::{Entry, EntryDraft, TradeDetails, TradeSide};
use crate::storage::format::parse_time;

/// Which form the presentation layer shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormVariant {
    /// Date, amount, description, one optional image
    #[default]
    Simple,
    /// Simple fields plus the full trade group, several images
    Trade,
}

/// Raw form values exactly as typed. Empty strings mean "not filled in".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormFields {
    pub date: String,
    pub time: String,
    pub amount: String,
    pub description: String,
    pub symbol: String,
    pub trade_type: String,
    pub quantity: String,
    pub entry_price: String,
    pub exit_price: String,
    pub strategy: String,
    pub images: Vec<ImageSource>,
}

impl FormFields {
    /// Simple-form values.
    pub fn simple(
        date: impl Into<String>,
        amount: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            amount: amount.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn with_image(mut self, image: ImageSource) -> Self {
        self.images.push(image);
        self
    }

    /// Prefill a form from a stored entry. Images are left out: an edit
    /// keeps them unless new ones are attached.
    pub fn from_entry(entry: &Entry) -> Self {
        let mut fields = Self {
            date: entry.date.format("%Y-%m-%d").to_string(),
            time: entry
                .time
                .map(|t| t.format("%H:%M").to_string())
                .unwrap_or_default(),
            amount: entry.amount.to_string(),
            description: entry.description.clone(),
            ..Self::default()
        };
        if let Some(trade) = &entry.trade {
            fields.symbol = trade.symbol.clone();
            fields.trade_type = trade.side.to_string();
            fields.quantity = trade.quantity.to_string();
            fields.entry_price = trade.entry_price.to_string();
            fields.exit_price = trade.exit_price.to_string();
            fields.strategy = trade.strategy.clone();
        }
        fields
    }

    fn has_trade_fields(&self) -> bool {
        [
            &self.symbol,
            &self.trade_type,
            &self.quantity,
            &self.entry_price,
            &self.exit_price,
            &self.strategy,
        ]
        .iter()
        .any(|v| !v.trim().is_empty())
    }
}

/// Validate `fields` into a draft with no images yet.
///
/// Collects every problem instead of stopping at the first one. The trade
/// group is required in the trade variant and all-or-nothing otherwise.
pub fn validate(fields: &FormFields, variant: FormVariant) -> Result<EntryDraft, JournalError> {
    let mut errors = Vec::new();

    let date = match fields.date.trim() {
        "" => {
            errors.push(FieldError::new("date", "Date is required"));
            None
        }
        raw => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(d) => Some(d),
            Err(_) => {
                errors.push(FieldError::new("date", format!("'{raw}' is not a YYYY-MM-DD date")));
                None
            }
        },
    };

    let time = match fields.time.trim() {
        "" => None,
        raw => {
            let parsed = parse_time(raw);
            if parsed.is_none() {
                errors.push(FieldError::new("time", format!("'{raw}' is not a HH:MM time")));
            }
            parsed
        }
    };

    let amount = parse_number("amount", &fields.amount, &mut errors);

    let description = fields.description.trim();
    if description.is_empty() {
        errors.push(FieldError::new("description", "Description is required"));
    }

    if variant == FormVariant::Simple && fields.images.len() > 1 {
        errors.push(FieldError::new("images", "Only one image can be attached"));
    }

    let trade = if variant == FormVariant::Trade || fields.has_trade_fields() {
        validate_trade(fields, &mut errors)
    } else {
        None
    };

    if !errors.is_empty() {
        return Err(JournalError::Validation(errors));
    }

    match (date, amount) {
        (Some(date), Some(amount)) => Ok(EntryDraft {
            date,
            time,
            amount,
            description: description.to_string(),
            images: Vec::new(),
            trade,
        }),
        // Unreachable: a missing value always records an error above.
        _ => Err(JournalError::Validation(Vec::new())),
    }
}

fn validate_trade(fields: &FormFields, errors: &mut Vec<FieldError>) -> Option<TradeDetails> {
    let symbol = fields.symbol.trim().to_uppercase();
    if symbol.is_empty() {
        errors.push(FieldError::new("symbol", "Symbol is required"));
    }

    let side = match fields.trade_type.trim() {
        "" => {
            errors.push(FieldError::new("trade_type", "Trade type is required"));
            None
        }
        raw => match raw.parse::<TradeSide>() {
            Ok(side) => Some(side),
            Err(msg) => {
                errors.push(FieldError::new("trade_type", msg));
                None
            }
        },
    };

    let quantity = parse_number("quantity", &fields.quantity, errors);
    if quantity.is_some_and(|q| q <= 0.0) {
        errors.push(FieldError::new("quantity", "Quantity must be positive"));
    }
    let entry_price = parse_number("entry_price", &fields.entry_price, errors);
    let exit_price = parse_number("exit_price", &fields.exit_price, errors);

    let strategy = fields.strategy.trim();
    if strategy.is_empty() {
        errors.push(FieldError::new("strategy", "Strategy is required"));
    }

    Some(TradeDetails {
        symbol,
        side: side?,
        quantity: quantity?,
        entry_price: entry_price?,
        exit_price: exit_price?,
        strategy: strategy.to_string(),
    })
}

/// Parse a required finite number; a leading `+` is allowed.
fn parse_number(field: &'static str, raw: &str, errors: &mut Vec<FieldError>) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        errors.push(FieldError::new(field, format!("{field} is required")));
        return None;
    }
    // `f64::from_str` takes one optional sign, so "+-5" and "++5" fail.
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            errors.push(FieldError::new(field, format!("'{trimmed}' is not a number")));
            None
        }
    }
}
