use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::errors::JournalError;
use crate::images::data_uri::DataUriEncoder;
use crate::images::traits::{ImageEncoder, ImageSource};
use crate::models::entry::{Entry, EntryDraft, EntryId};
use crate::models::filter::{EntryFilter, SortKey};
use crate::models::stats::Stats;
use crate::models::view::{EditState, EntryCard, JournalView};
use crate::services::export_service::ExportService;
use crate::services::projection_service::ProjectionService;
use crate::services::stats_service::StatsService;
use crate::services::validation::{self, FormFields, FormVariant};
use crate::storage::backend::KeyValueBackend;
use crate::storage::store::{Committed, EntryStore};

/// User intents emitted by the presentation layer.
#[derive(Debug, Clone)]
pub enum Intent {
    /// Submit the form: creates, or updates the entry being edited.
    Submit(FormFields),
    BeginEdit(EntryId),
    CancelEdit,
    RequestDelete(EntryId),
    ConfirmDelete,
    CancelDelete,
    SetFilter(EntryFilter),
    SetSort(SortKey),
    /// CSV of the current projection
    Export,
}

/// What an intent produced, besides the refreshed view.
#[derive(Debug)]
pub enum Response {
    Saved(SubmitOutcome),
    /// Prefilled form for the entry now being edited
    EditForm(FormFields),
    Deleted {
        removed: bool,
        warning: Option<String>,
    },
    Csv(String),
    /// State changed, nothing else to report
    Updated,
}

/// Result of [`ViewController::dispatch`]: the response plus a fresh render.
#[derive(Debug)]
pub struct Dispatched {
    pub response: Response,
    pub view: JournalView,
}

/// Where a submission lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitTarget {
    New,
    Edit(EntryId),
}

/// The form lock. Dropping it re-enables submit, so an abandoned
/// submission never leaves the form disabled.
#[derive(Debug)]
struct SubmitLock(Arc<AtomicBool>);

impl SubmitLock {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for SubmitLock {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A validated submission whose images are not encoded yet.
///
/// While one is outstanding the controller refuses further submissions.
/// Dropping it releases the form.
#[derive(Debug)]
#[must_use]
pub struct PendingSubmission {
    target: SubmitTarget,
    draft: EntryDraft,
    images: Vec<ImageSource>,
    lock: SubmitLock,
}

impl PendingSubmission {
    pub fn target(&self) -> &SubmitTarget {
        &self.target
    }

    /// Encode every attached image. Failed images are dropped and reported,
    /// the rest of the submission goes ahead.
    pub async fn encode<E: ImageEncoder + ?Sized>(self, encoder: &E) -> ReadySubmission {
        let mut draft = self.draft;
        let mut image_failures = Vec::new();
        for source in &self.images {
            match encoder.encode(source).await {
                Ok(uri) => draft.images.push(uri),
                Err(e) => {
                    warn!(
                        encoder = encoder.name(),
                        file = %source.file_name(),
                        error = %e,
                        "image encode failed, saving without it"
                    );
                    image_failures.push(e.to_string());
                }
            }
        }
        ReadySubmission {
            target: self.target,
            draft,
            image_failures,
            lock: self.lock,
        }
    }
}

/// A submission ready to hit the store.
#[derive(Debug)]
#[must_use]
pub struct ReadySubmission {
    target: SubmitTarget,
    draft: EntryDraft,
    image_failures: Vec<String>,
    lock: SubmitLock,
}

/// Result of a successful create or update.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub entry: Entry,
    /// Images that could not be encoded and were left off
    pub image_failures: Vec<String>,
    /// Set when the entry is saved in memory but the write to the backing
    /// store failed
    pub persist_warning: Option<String>,
}

/// Translates user intents into store calls and store state into views.
pub struct ViewController<B: KeyValueBackend, E: ImageEncoder = DataUriEncoder> {
    store: EntryStore<B>,
    encoder: Arc<E>,
    variant: FormVariant,
    filter: EntryFilter,
    sort: SortKey,
    edit_state: EditState,
    pending_delete: Option<EntryId>,
    submitting: Arc<AtomicBool>,
    projection_service: ProjectionService,
    stats_service: StatsService,
    export_service: ExportService,
}

impl<B: KeyValueBackend, E: ImageEncoder> std::fmt::Debug for ViewController<B, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewController")
            .field("store", &self.store)
            .field("encoder", &self.encoder.name())
            .field("variant", &self.variant)
            .field("filter", &self.filter)
            .field("sort", &self.sort)
            .field("edit_state", &self.edit_state)
            .field("submitting", &self.is_submitting())
            .finish()
    }
}

impl<B: KeyValueBackend> ViewController<B, DataUriEncoder> {
    /// Controller with the default data-URI encoder.
    pub fn with_store(store: EntryStore<B>) -> Self {
        Self::new(store, DataUriEncoder::default())
    }
}

impl<B: KeyValueBackend, E: ImageEncoder> ViewController<B, E> {
    /// Wrap an already loaded store.
    pub fn new(store: EntryStore<B>, encoder: E) -> Self {
        Self {
            store,
            encoder: Arc::new(encoder),
            variant: FormVariant::default(),
            filter: EntryFilter::default(),
            sort: SortKey::default(),
            edit_state: EditState::Idle,
            pending_delete: None,
            submitting: Arc::new(AtomicBool::new(false)),
            projection_service: ProjectionService::new(),
            stats_service: StatsService::new(),
            export_service: ExportService::new(),
        }
    }

    pub fn with_variant(mut self, variant: FormVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn with_view(mut self, filter: EntryFilter, sort: SortKey) -> Self {
        self.filter = filter;
        self.sort = sort;
        self
    }

    pub fn store(&self) -> &EntryStore<B> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut EntryStore<B> {
        &mut self.store
    }

    /// Shared handle on the image encoder.
    pub fn encoder(&self) -> Arc<E> {
        Arc::clone(&self.encoder)
    }

    #[must_use]
    pub fn edit_state(&self) -> &EditState {
        &self.edit_state
    }

    #[must_use]
    pub fn pending_delete(&self) -> Option<&EntryId> {
        self.pending_delete.as_ref()
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn filter(&self) -> EntryFilter {
        self.filter
    }

    #[must_use]
    pub fn sort(&self) -> SortKey {
        self.sort
    }

    pub fn set_filter(&mut self, filter: EntryFilter) {
        self.filter = filter;
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.sort = sort;
    }

    // ── Submit ──────────────────────────────────────────────────────

    /// Validate and save a new entry.
    pub async fn submit_new(&mut self, fields: FormFields) -> Result<SubmitOutcome, JournalError> {
        self.submit_to(SubmitTarget::New, fields).await
    }

    /// Validate and apply an edit to entry `id`.
    pub async fn submit_edit(
        &mut self,
        id: &EntryId,
        fields: FormFields,
    ) -> Result<SubmitOutcome, JournalError> {
        self.submit_to(SubmitTarget::Edit(id.clone()), fields).await
    }

    /// Save the form against whatever the edit state points at.
    pub async fn submit(&mut self, fields: FormFields) -> Result<SubmitOutcome, JournalError> {
        let target = match &self.edit_state {
            EditState::Idle => SubmitTarget::New,
            EditState::Editing(id) => SubmitTarget::Edit(id.clone()),
        };
        self.submit_to(target, fields).await
    }

    async fn submit_to(
        &mut self,
        target: SubmitTarget,
        fields: FormFields,
    ) -> Result<SubmitOutcome, JournalError> {
        let pending = self.prepare_submission(target, fields)?;
        let encoder = self.encoder();
        let ready = pending.encode(encoder.as_ref()).await;
        self.finish_submission(ready)
    }

    /// Validate `fields` and lock the form until the submission is finished
    /// or cancelled. Nothing is written on validation failure.
    pub fn prepare_submission(
        &mut self,
        target: SubmitTarget,
        fields: FormFields,
    ) -> Result<PendingSubmission, JournalError> {
        if self.is_submitting() {
            return Err(JournalError::SubmitInFlight);
        }
        let draft = validation::validate(&fields, self.variant)?;
        let lock = SubmitLock::acquire(&self.submitting).ok_or(JournalError::SubmitInFlight)?;
        debug!(?target, images = fields.images.len(), "submission prepared");
        Ok(PendingSubmission {
            target,
            draft,
            images: fields.images,
            lock,
        })
    }

    /// Release the form lock without saving.
    pub fn cancel_submission(&mut self, pending: PendingSubmission) {
        debug!(target = ?pending.target, "submission cancelled");
        drop(pending);
    }

    /// Write an encoded submission to the store and unlock the form.
    pub fn finish_submission(&mut self, ready: ReadySubmission) -> Result<SubmitOutcome, JournalError> {
        let ReadySubmission {
            target,
            draft,
            image_failures,
            lock,
        } = ready;
        drop(lock);

        let committed = match &target {
            SubmitTarget::New => self.store.create(draft),
            SubmitTarget::Edit(id) => {
                let result = self.store.update(id, draft);
                // Saved or gone, the edit context is over either way.
                if self.edit_state.editing_id() == Some(id) {
                    self.edit_state = EditState::Idle;
                }
                result?
            }
        };

        let Committed { value, warning } = committed;
        Ok(SubmitOutcome {
            entry: value,
            image_failures,
            persist_warning: warning.map(|w| w.to_string()),
        })
    }

    // ── Edit flow ───────────────────────────────────────────────────

    /// Enter `Editing(id)` and return the prefilled form. Any edit already
    /// open is discarded unsaved.
    pub fn begin_edit(&mut self, id: &EntryId) -> Result<FormFields, JournalError> {
        let entry = self
            .store
            .get(id)
            .ok_or_else(|| JournalError::EntryNotFound(id.to_string()))?;
        let fields = FormFields::from_entry(entry);
        if let Some(previous) = self.edit_state.editing_id() {
            if previous != id {
                debug!(previous = %previous, "discarding open edit");
            }
        }
        self.edit_state = EditState::Editing(id.clone());
        Ok(fields)
    }

    pub fn cancel_edit(&mut self) {
        self.edit_state = EditState::Idle;
    }

    // ── Delete flow ─────────────────────────────────────────────────

    /// Arm a delete of `id`. Nothing is removed until
    /// [`confirm_delete`](Self::confirm_delete).
    pub fn request_delete(&mut self, id: &EntryId) -> Result<(), JournalError> {
        if self.store.get(id).is_none() {
            return Err(JournalError::EntryNotFound(id.to_string()));
        }
        self.pending_delete = Some(id.clone());
        Ok(())
    }

    /// Carry out the armed delete.
    pub fn confirm_delete(&mut self) -> Result<Committed<bool>, JournalError> {
        let id = self.pending_delete.take().ok_or(JournalError::NoPendingDelete)?;
        if self.edit_state.editing_id() == Some(&id) {
            self.edit_state = EditState::Idle;
        }
        Ok(self.store.delete(&id))
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    // ── Projection ──────────────────────────────────────────────────

    /// Filtered, sorted view of the canonical collection.
    pub fn project(&self, filter: &EntryFilter, sort: SortKey) -> Vec<&Entry> {
        self.project_as_of(filter, sort, today())
    }

    /// [`project`](Self::project) with an explicit "today" for date presets.
    pub fn project_as_of(&self, filter: &EntryFilter, sort: SortKey, today: NaiveDate) -> Vec<&Entry> {
        self.projection_service
            .project(self.store.entries(), filter, sort, today)
    }

    /// Projection under the active filter and sort.
    pub fn current_projection(&self) -> Vec<&Entry> {
        self.project(&self.filter, self.sort)
    }

    /// Matches within the active filter, in the active sort order.
    pub fn search(&self, query: &str) -> Vec<&Entry> {
        self.projection_service
            .search(self.current_projection(), query)
    }

    #[must_use]
    pub fn stats(&self, entries: &[&Entry]) -> Stats {
        self.stats_service.compute(entries.iter().copied())
    }

    /// CSV of `entries` in the order given.
    pub fn export_csv(&self, entries: &[&Entry]) -> Result<String, JournalError> {
        self.export_service.export_csv(entries)
    }

    /// CSV of the active projection.
    pub fn export_current_csv(&self) -> Result<String, JournalError> {
        self.export_csv(&self.current_projection())
    }

    // ── Render ──────────────────────────────────────────────────────

    pub fn render(&self) -> JournalView {
        self.render_as_of(today())
    }

    pub fn render_as_of(&self, today: NaiveDate) -> JournalView {
        let projected = self.project_as_of(&self.filter, self.sort, today);
        let stats = self.stats(&projected);
        let cards = projected.into_iter().map(card_for).collect();
        JournalView {
            filter: self.filter,
            sort: self.sort,
            cards,
            stats,
            edit_state: self.edit_state.clone(),
            pending_delete: self.pending_delete.clone(),
            submit_enabled: !self.is_submitting(),
        }
    }

    // ── Dispatch ────────────────────────────────────────────────────

    /// Handle one intent, then re-render.
    pub async fn dispatch(&mut self, intent: Intent) -> Result<Dispatched, JournalError> {
        let response = match intent {
            Intent::Submit(fields) => Response::Saved(self.submit(fields).await?),
            Intent::BeginEdit(id) => Response::EditForm(self.begin_edit(&id)?),
            Intent::CancelEdit => {
                self.cancel_edit();
                Response::Updated
            }
            Intent::RequestDelete(id) => {
                self.request_delete(&id)?;
                Response::Updated
            }
            Intent::ConfirmDelete => {
                let committed = self.confirm_delete()?;
                Response::Deleted {
                    removed: committed.value,
                    warning: committed.warning.map(|w| w.to_string()),
                }
            }
            Intent::CancelDelete => {
                self.cancel_delete();
                Response::Updated
            }
            Intent::SetFilter(filter) => {
                self.set_filter(filter);
                Response::Updated
            }
            Intent::SetSort(sort) => {
                self.set_sort(sort);
                Response::Updated
            }
            Intent::Export => Response::Csv(self.export_current_csv()?),
        };
        Ok(Dispatched {
            response,
            view: self.render(),
        })
    }
}

fn card_for(entry: &Entry) -> EntryCard {
    EntryCard {
        id: entry.id.clone(),
        date: entry.date.format("%Y-%m-%d").to_string(),
        amount: entry.display_amount(),
        outcome: entry.outcome(),
        description_html: entry.description_html(),
        symbol: entry.trade.as_ref().map(|t| t.symbol.clone()),
        images: entry.images.clone(),
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
