use std::collections::HashSet;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::errors::JournalError;
use crate::models::entry::{Entry, EntryDraft, EntryId};

use super::backend::KeyValueBackend;
use super::format;

/// Storage key used by the simple journal page.
pub const DEFAULT_STORAGE_KEY: &str = "journalEntries";

/// Outcome of a mutation that has been applied in memory.
///
/// `warning` is set when writing the collection to the backing store
/// failed. The mutation still stands for the rest of the session.
#[derive(Debug)]
#[must_use]
pub struct Committed<T> {
    pub value: T,
    pub warning: Option<JournalError>,
}

impl<T> Committed<T> {
    fn new(value: T, persisted: Result<(), JournalError>) -> Self {
        Self {
            value,
            warning: persisted.err(),
        }
    }

    /// `true` if the mutation reached the backing store.
    #[must_use]
    pub fn is_durable(&self) -> bool {
        self.warning.is_none()
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

/// Single source of truth for the entry collection.
///
/// Every mutation rewrites the whole collection under one key before
/// returning, so the backing store holds either the state before or after
/// a mutation, never a mix.
pub struct EntryStore<B: KeyValueBackend> {
    backend: B,
    key: String,
    entries: Vec<Entry>,
    /// Every id handed out or loaded this session, including deleted ones.
    issued: HashSet<EntryId>,
}

impl<B: KeyValueBackend> std::fmt::Debug for EntryStore<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryStore")
            .field("backend", &self.backend.name())
            .field("key", &self.key)
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl<B: KeyValueBackend> EntryStore<B> {
    /// Create an empty store over `backend`. Call [`load`](Self::load) to
    /// read existing entries.
    pub fn new(backend: B, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
            entries: Vec::new(),
            issued: HashSet::new(),
        }
    }

    /// Construct and load in one step.
    pub fn open(backend: B, key: impl Into<String>) -> Self {
        let mut store = Self::new(backend, key);
        store.load();
        store
    }

    /// Read the collection from the backing store, replacing the in-memory
    /// copy. A missing key or unreadable payload yields an empty collection.
    /// Upgraded legacy payloads and reassigned duplicate ids are written back
    /// immediately; payloads that fail to decode are left untouched.
    pub fn load(&mut self) -> &[Entry] {
        let raw = match self.backend.get(&self.key) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %self.key, error = %e, "backing store read failed, starting empty");
                None
            }
        };

        let mut rewrite = false;
        self.entries = match raw {
            None => {
                debug!(key = %self.key, "no stored entries");
                Vec::new()
            }
            Some(raw) => match format::read_document(&raw) {
                Ok(decoded) => {
                    if decoded.upgraded {
                        info!(
                            key = %self.key,
                            entries = decoded.entries.len(),
                            skipped = decoded.skipped,
                            "upgraded legacy entry array"
                        );
                        rewrite = true;
                    }
                    decoded.entries
                }
                Err(e) => {
                    warn!(key = %self.key, error = %e, "stored entries unreadable, starting empty");
                    Vec::new()
                }
            },
        };

        // Duplicate ids in a hand-edited payload get replaced.
        let mut seen = HashSet::with_capacity(self.entries.len());
        for i in 0..self.entries.len() {
            if !seen.insert(self.entries[i].id.clone()) {
                let fresh = self.fresh_id_excluding(&seen);
                warn!(old = %self.entries[i].id, new = %fresh, "duplicate entry id reassigned");
                seen.insert(fresh.clone());
                self.entries[i].id = fresh;
                rewrite = true;
            }
        }
        self.issued.extend(seen);

        // Ids minted while reading must survive the next open.
        if rewrite {
            let _ = self.persist();
        }

        debug!(key = %self.key, entries = self.entries.len(), "entries loaded");
        &self.entries
    }

    /// Write the whole in-memory collection to the backing store.
    pub fn persist(&mut self) -> Result<(), JournalError> {
        let payload = format::write_document(&self.entries)?;
        match self.backend.set(&self.key, &payload) {
            Ok(()) => {
                debug!(key = %self.key, bytes = payload.len(), "entries persisted");
                Ok(())
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "persist failed, keeping in-memory entries");
                Err(e)
            }
        }
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// Canonical collection in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    #[must_use]
    pub fn get(&self, id: &EntryId) -> Option<&Entry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    // ── Mutations ───────────────────────────────────────────────────

    /// Append a new entry with a freshly assigned id.
    pub fn create(&mut self, draft: EntryDraft) -> Committed<Entry> {
        let id = self.fresh_id();
        let entry = Entry::from_draft(id, draft);
        self.entries.push(entry.clone());
        info!(id = %entry.id, amount = entry.amount, "entry created");
        let persisted = self.persist();
        Committed::new(entry, persisted)
    }

    /// Replace every mutable field of the entry with `id`.
    ///
    /// The id and creation time never change. An empty `draft.images` keeps
    /// the images already attached.
    pub fn update(&mut self, id: &EntryId, draft: EntryDraft) -> Result<Committed<Entry>, JournalError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| &e.id == id)
            .ok_or_else(|| JournalError::EntryNotFound(id.to_string()))?;

        let images = if draft.images.is_empty() {
            std::mem::take(&mut entry.images)
        } else {
            draft.images
        };

        *entry = Entry {
            id: entry.id.clone(),
            date: draft.date,
            time: draft.time,
            amount: draft.amount,
            description: draft.description,
            images,
            trade: draft.trade,
            created_at: entry.created_at,
            updated_at: Utc::now(),
        };
        let updated = entry.clone();
        info!(id = %updated.id, "entry updated");

        let persisted = self.persist();
        Ok(Committed::new(updated, persisted))
    }

    /// Remove the entry with `id`. Returns whether anything was removed;
    /// deleting an absent id is a no-op.
    pub fn delete(&mut self, id: &EntryId) -> Committed<bool> {
        let Some(idx) = self.entries.iter().position(|e| &e.id == id) else {
            debug!(id = %id, "delete of absent entry ignored");
            return Committed::new(false, Ok(()));
        };
        self.entries.remove(idx);
        info!(id = %id, "entry deleted");
        let persisted = self.persist();
        Committed::new(true, persisted)
    }

    /// Remove every entry. Returns how many were removed.
    pub fn clear(&mut self) -> Committed<usize> {
        let removed = self.entries.len();
        self.entries.clear();
        info!(removed, "entries cleared");
        let persisted = self.persist();
        Committed::new(removed, persisted)
    }

    // ── Export / Import ─────────────────────────────────────────────

    /// Pretty-printed versioned document of the whole collection.
    pub fn export_json(&self) -> Result<String, JournalError> {
        serde_json::to_string_pretty(&format::Document {
            version: format::CURRENT_VERSION,
            entries: self.entries.clone(),
        })
        .map_err(|e| JournalError::Serialization(format!("Failed to serialize entries to JSON: {e}")))
    }

    /// Append entries from an exported document (or a legacy array).
    /// Either every entry is imported or none is. Imported entries get
    /// fresh ids. Returns the new ids.
    pub fn import_json(&mut self, json: &str) -> Result<Committed<Vec<EntryId>>, JournalError> {
        let decoded = format::read_document(json)?;
        if decoded.skipped > 0 {
            return Err(JournalError::Deserialization(format!(
                "{} record(s) in the import are unreadable, nothing imported",
                decoded.skipped
            )));
        }
        let mut ids = Vec::with_capacity(decoded.entries.len());
        let mut incoming = decoded.entries;
        for entry in &mut incoming {
            entry.id = self.fresh_id();
            ids.push(entry.id.clone());
        }
        self.entries.extend(incoming);
        info!(imported = ids.len(), skipped = decoded.skipped, "entries imported");
        let persisted = self.persist();
        Ok(Committed::new(ids, persisted))
    }

    // ── Internal ────────────────────────────────────────────────────

    fn fresh_id(&mut self) -> EntryId {
        let id = self.fresh_id_excluding(&HashSet::new());
        self.issued.insert(id.clone());
        id
    }

    fn fresh_id_excluding(&self, also: &HashSet<EntryId>) -> EntryId {
        loop {
            let id = EntryId::generate();
            if !self.issued.contains(&id) && !also.contains(&id) {
                return id;
            }
        }
    }
}
