pub mod config;
pub mod controller;
pub mod errors;
pub mod images;
pub mod models;
pub mod services;
pub mod storage;

pub use config::JournalConfig;
pub use controller::{Dispatched, Intent, Response, SubmitOutcome, SubmitTarget, ViewController};
pub use errors::{FieldError, JournalError};
pub use images::data_uri::DataUriEncoder;
pub use images::traits::{ImageEncoder, ImageSource};
pub use models::entry::{Entry, EntryDraft, EntryId, Outcome, TradeDetails, TradeSide};
pub use models::filter::{EntryFilter, SortKey};
pub use models::stats::Stats;
pub use models::view::{EditState, EntryCard, JournalView};
pub use services::validation::{FormFields, FormVariant};
pub use storage::backend::{KeyValueBackend, MemoryBackend};
pub use storage::store::{Committed, EntryStore, DEFAULT_STORAGE_KEY};

#[cfg(not(target_arch = "wasm32"))]
pub use storage::backend::FileBackend;

/// Open the journal described by `config`: file-backed store, loaded,
/// wrapped in a controller with the configured form and view defaults.
#[cfg(not(target_arch = "wasm32"))]
pub fn open_journal(config: &JournalConfig) -> Result<ViewController<FileBackend>, JournalError> {
    config.validate()?;
    let backend = FileBackend::new(&config.data_dir)?;
    let store = EntryStore::open(backend, config.storage_key.clone());
    tracing::debug!(
        data_dir = %config.data_dir.display(),
        key = %config.storage_key,
        entries = store.len(),
        "journal opened"
    );
    Ok(
        ViewController::new(store, DataUriEncoder::new(config.max_image_bytes))
            .with_variant(config.form_variant)
            .with_view(config.filter()?, config.sort()?),
    )
}
