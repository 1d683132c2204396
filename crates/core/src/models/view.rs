use serde::{Deserialize, Serialize};

use super::entry::{EntryId, Outcome};
use super::filter::{EntryFilter, SortKey};
use super::stats::Stats;

/// One ready-to-render card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryCard {
    pub id: EntryId,
    pub date: String,
    /// Signed, two decimals (`+10.00`, `-42.50`)
    pub amount: String,
    pub outcome: Outcome,
    /// Already HTML-escaped
    pub description_html: String,
    pub symbol: Option<String>,
    pub images: Vec<String>,
}

/// State of the entry form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "id", rename_all = "snake_case")]
pub enum EditState {
    #[default]
    Idle,
    Editing(EntryId),
}

impl EditState {
    #[must_use]
    pub fn editing_id(&self) -> Option<&EntryId> {
        match self {
            EditState::Idle => None,
            EditState::Editing(id) => Some(id),
        }
    }
}

/// Everything the presentation layer needs to draw the journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalView {
    pub filter: EntryFilter,
    pub sort: SortKey,
    pub cards: Vec<EntryCard>,
    pub stats: Stats,
    pub edit_state: EditState,
    /// Entry awaiting delete confirmation, if any
    pub pending_delete: Option<EntryId>,
    /// Submit control disabled while an image encode is in flight
    pub submit_enabled: bool,
}
