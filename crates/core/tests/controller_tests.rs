// ═══════════════════════════════════════════════════════════════════
// Controller Tests — submit/edit/delete flows, projections, dispatch
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;
use chrono::NaiveDate;

use trading_journal_core::controller::{Intent, Response, SubmitTarget, ViewController};
use trading_journal_core::errors::JournalError;
use trading_journal_core::images::data_uri::DataUriEncoder;
use trading_journal_core::images::traits::{ImageEncoder, ImageSource};
use trading_journal_core::models::entry::{EntryId, Outcome};
use trading_journal_core::models::filter::{EntryFilter, SortKey};
use trading_journal_core::models::view::EditState;
use trading_journal_core::services::validation::{FormFields, FormVariant};
use trading_journal_core::storage::backend::{KeyValueBackend, MemoryBackend};
use trading_journal_core::storage::store::{EntryStore, DEFAULT_STORAGE_KEY};

// ═══════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════

/// Encoder that always fails, to exercise the "save without image" path.
struct FailingEncoder;

#[async_trait]
impl ImageEncoder for FailingEncoder {
    fn name(&self) -> &str {
        "failing"
    }

    async fn encode(&self, _source: &ImageSource) -> Result<String, JournalError> {
        Err(JournalError::ImageEncoding("reader exploded".into()))
    }
}

/// Encoder that never completes, standing in for a hung file read.
struct StallingEncoder;

#[async_trait]
impl ImageEncoder for StallingEncoder {
    fn name(&self) -> &str {
        "stalling"
    }

    async fn encode(&self, _source: &ImageSource) -> Result<String, JournalError> {
        std::future::pending().await
    }
}

fn controller() -> ViewController<MemoryBackend> {
    ViewController::with_store(EntryStore::open(MemoryBackend::new(), DEFAULT_STORAGE_KEY))
}

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn png() -> ImageSource {
    ImageSource::from_bytes("chart.png", vec![0x89, b'P', b'N', b'G'])
}

async fn add(c: &mut ViewController<MemoryBackend>, date: &str, amount: &str, desc: &str) -> EntryId {
    c.submit_new(FormFields::simple(date, amount, desc)).await.unwrap().entry.id
}

// ═══════════════════════════════════════════════════════════════════
// Submit
// ═══════════════════════════════════════════════════════════════════

mod submit {
    use super::*;

    #[tokio::test]
    async fn end_to_end_new_loss_entry() {
        let mut c = controller();
        let outcome = c
            .submit_new(FormFields::simple("2024-01-05", "-42.50", "Bad trade"))
            .await
            .unwrap();
        assert!(outcome.persist_warning.is_none());

        let entries = c.store().entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].date, d("2024-01-05"));
        assert_eq!(entries[0].amount, -42.5);
        assert_eq!(entries[0].description, "Bad trade");
        assert_eq!(entries[0].id, outcome.entry.id);

        let projected = c.project(&EntryFilter::All, SortKey::DateDesc);
        let stats = c.stats(&projected);
        assert_eq!(stats.total_loss, 42.5);
        assert_eq!(stats.total_trades, 1);
    }

    #[tokio::test]
    async fn validation_failure_mutates_nothing() {
        let mut c = controller();
        let err = c
            .submit_new(FormFields::simple("", "abc", ""))
            .await
            .unwrap_err();
        assert_eq!(err.field_errors().len(), 3);
        assert!(c.store().is_empty());
        assert!(!c.is_submitting());
        assert_eq!(c.store().backend().get(DEFAULT_STORAGE_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn image_is_encoded_before_create() {
        let mut c = controller();
        let outcome = c
            .submit_new(FormFields::simple("2024-01-05", "10", "with chart").with_image(png()))
            .await
            .unwrap();
        assert!(outcome.image_failures.is_empty());
        assert_eq!(outcome.entry.images, vec!["data:image/png;base64,iVBORw==".to_string()]);
        assert_eq!(c.store().entries()[0].images, outcome.entry.images);
    }

    #[tokio::test]
    async fn failed_encode_saves_entry_without_image() {
        let store = EntryStore::open(MemoryBackend::new(), DEFAULT_STORAGE_KEY);
        let mut c = ViewController::new(store, FailingEncoder);
        let outcome = c
            .submit_new(FormFields::simple("2024-01-05", "10", "x").with_image(png()))
            .await
            .unwrap();
        assert!(outcome.entry.images.is_empty());
        assert_eq!(outcome.image_failures.len(), 1);
        assert!(outcome.image_failures[0].contains("reader exploded"));
        assert_eq!(c.store().len(), 1);
    }

    #[tokio::test]
    async fn oversized_image_is_dropped() {
        let store = EntryStore::open(MemoryBackend::new(), DEFAULT_STORAGE_KEY);
        let mut c = ViewController::new(store, DataUriEncoder::new(2));
        let outcome = c
            .submit_new(FormFields::simple("2024-01-05", "10", "x").with_image(png()))
            .await
            .unwrap();
        assert!(outcome.entry.images.is_empty());
        assert_eq!(outcome.image_failures.len(), 1);
    }

    #[tokio::test]
    async fn second_submit_is_refused_while_encoding() {
        let mut c = controller();
        let pending = c
            .prepare_submission(SubmitTarget::New, FormFields::simple("2024-01-05", "1", "first").with_image(png()))
            .unwrap();
        assert!(c.is_submitting());
        assert!(!c.render().submit_enabled);

        let err = c
            .prepare_submission(SubmitTarget::New, FormFields::simple("2024-01-05", "1", "again"))
            .unwrap_err();
        assert!(matches!(err, JournalError::SubmitInFlight));

        let encoder = DataUriEncoder::default();
        let ready = pending.encode(&encoder).await;
        c.finish_submission(ready).unwrap();
        assert!(!c.is_submitting());
        assert_eq!(c.store().len(), 1);
    }

    #[tokio::test]
    async fn cancelled_submission_unlocks_form() {
        let mut c = controller();
        let pending = c
            .prepare_submission(SubmitTarget::New, FormFields::simple("2024-01-05", "1", "x"))
            .unwrap();
        c.cancel_submission(pending);
        assert!(!c.is_submitting());
        assert!(c.store().is_empty());
        add(&mut c, "2024-01-05", "1", "ok").await;
    }

    #[tokio::test]
    async fn abandoned_submit_releases_form() {
        let store = EntryStore::open(MemoryBackend::new(), DEFAULT_STORAGE_KEY);
        let mut c = ViewController::new(store, StallingEncoder);

        let timed_out = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            c.submit_new(FormFields::simple("2024-01-05", "1", "stuck").with_image(png())),
        )
        .await;
        assert!(timed_out.is_err());

        assert!(!c.is_submitting());
        assert!(c.render().submit_enabled);
        assert!(c.store().is_empty());

        let outcome = c
            .submit_new(FormFields::simple("2024-01-05", "2", "retry without image"))
            .await
            .unwrap();
        assert_eq!(outcome.entry.description, "retry without image");
    }

    #[tokio::test]
    async fn dropped_pending_submission_releases_form() {
        let mut c = controller();
        let pending = c
            .prepare_submission(SubmitTarget::New, FormFields::simple("2024-01-05", "1", "x"))
            .unwrap();
        assert!(c.is_submitting());
        drop(pending);
        assert!(!c.is_submitting());
        add(&mut c, "2024-01-05", "1", "ok").await;
    }

    #[tokio::test]
    async fn persist_failure_is_reported_but_entry_kept() {
        let store = EntryStore::open(MemoryBackend::with_quota(32), DEFAULT_STORAGE_KEY);
        let mut c = ViewController::with_store(store);
        let outcome = c
            .submit_new(FormFields::simple("2024-01-05", "5", "too big for quota"))
            .await
            .unwrap();
        assert!(outcome.persist_warning.unwrap().contains("quota"));
        assert_eq!(c.render().cards.len(), 1);
    }

    #[tokio::test]
    async fn trade_variant_requires_trade_fields() {
        let store = EntryStore::open(MemoryBackend::new(), DEFAULT_STORAGE_KEY);
        let mut c = ViewController::with_store(store).with_variant(FormVariant::Trade);
        let err = c
            .submit_new(FormFields::simple("2024-01-05", "5", "no trade data"))
            .await
            .unwrap_err();
        let fields: Vec<&str> = err.field_errors().iter().map(|f| f.field).collect();
        assert_eq!(fields, vec!["symbol", "trade_type", "quantity", "entry_price", "exit_price", "strategy"]);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Edit flow
// ═══════════════════════════════════════════════════════════════════

mod edit_flow {
    use super::*;

    #[tokio::test]
    async fn begin_edit_prefills_and_enters_editing() {
        let mut c = controller();
        let id = add(&mut c, "2024-01-05", "-42.50", "Bad trade").await;
        let form = c.begin_edit(&id).unwrap();
        assert_eq!(form.date, "2024-01-05");
        assert_eq!(form.amount, "-42.5");
        assert_eq!(form.description, "Bad trade");
        assert_eq!(c.edit_state(), &EditState::Editing(id));
    }

    #[tokio::test]
    async fn submit_while_editing_updates_and_returns_to_idle() {
        let mut c = controller();
        let id = add(&mut c, "2024-01-05", "10", "before").await;
        c.begin_edit(&id).unwrap();
        let outcome = c.submit(FormFields::simple("2024-01-06", "15", "after")).await.unwrap();
        assert_eq!(outcome.entry.id, id);
        assert_eq!(c.edit_state(), &EditState::Idle);
        assert_eq!(c.store().len(), 1);
        assert_eq!(c.store().get(&id).unwrap().description, "after");
    }

    #[tokio::test]
    async fn edit_without_new_image_keeps_old_one() {
        let mut c = controller();
        let outcome = c
            .submit_new(FormFields::simple("2024-01-05", "10", "x").with_image(png()))
            .await
            .unwrap();
        let id = outcome.entry.id;
        let edited = c.submit_edit(&id, FormFields::simple("2024-01-05", "11", "y")).await.unwrap();
        assert_eq!(edited.entry.images, outcome.entry.images);
    }

    #[tokio::test]
    async fn opening_second_edit_discards_first() {
        let mut c = controller();
        let a = add(&mut c, "2024-01-05", "1", "a").await;
        let b = add(&mut c, "2024-01-06", "2", "b").await;
        c.begin_edit(&a).unwrap();
        c.begin_edit(&b).unwrap();
        assert_eq!(c.edit_state(), &EditState::Editing(b.clone()));
        c.submit(FormFields::simple("2024-01-06", "3", "b2")).await.unwrap();
        assert_eq!(c.store().get(&a).unwrap().description, "a");
        assert_eq!(c.store().get(&b).unwrap().description, "b2");
    }

    #[tokio::test]
    async fn cancel_edit_returns_to_idle_without_saving() {
        let mut c = controller();
        let id = add(&mut c, "2024-01-05", "1", "a").await;
        c.begin_edit(&id).unwrap();
        c.cancel_edit();
        assert_eq!(c.edit_state(), &EditState::Idle);
        c.submit(FormFields::simple("2024-01-06", "2", "new")).await.unwrap();
        assert_eq!(c.store().len(), 2);
    }

    #[tokio::test]
    async fn edit_of_vanished_entry_is_not_found() {
        let mut c = controller();
        let id = add(&mut c, "2024-01-05", "1", "a").await;
        c.begin_edit(&id).unwrap();
        let _ = c.store_mut().delete(&id);
        let err = c.submit(FormFields::simple("2024-01-05", "1", "b")).await.unwrap_err();
        assert!(matches!(err, JournalError::EntryNotFound(_)));
        assert_eq!(c.edit_state(), &EditState::Idle);
        assert!(c.store().is_empty());
    }

    #[tokio::test]
    async fn begin_edit_unknown_id_fails() {
        let mut c = controller();
        assert!(matches!(c.begin_edit(&EntryId::from("nope")), Err(JournalError::EntryNotFound(_))));
        assert_eq!(c.edit_state(), &EditState::Idle);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Delete flow
// ═══════════════════════════════════════════════════════════════════

mod delete_flow {
    use super::*;

    #[tokio::test]
    async fn request_alone_deletes_nothing() {
        let mut c = controller();
        let id = add(&mut c, "2024-01-05", "1", "a").await;
        c.request_delete(&id).unwrap();
        assert_eq!(c.pending_delete(), Some(&id));
        assert_eq!(c.store().len(), 1);
        c.cancel_delete();
        assert_eq!(c.pending_delete(), None);
        assert_eq!(c.store().len(), 1);
    }

    #[tokio::test]
    async fn confirm_removes_entry() {
        let mut c = controller();
        let id = add(&mut c, "2024-01-05", "1", "a").await;
        c.request_delete(&id).unwrap();
        let committed = c.confirm_delete().unwrap();
        assert!(committed.value);
        assert!(c.store().is_empty());
        assert!(matches!(c.confirm_delete(), Err(JournalError::NoPendingDelete)));
    }

    #[tokio::test]
    async fn deleting_entry_under_edit_ends_edit() {
        let mut c = controller();
        let id = add(&mut c, "2024-01-05", "1", "a").await;
        c.begin_edit(&id).unwrap();
        c.request_delete(&id).unwrap();
        let _ = c.confirm_delete().unwrap();
        assert_eq!(c.edit_state(), &EditState::Idle);
    }

    #[tokio::test]
    async fn request_for_unknown_id_fails() {
        let mut c = controller();
        assert!(matches!(c.request_delete(&EntryId::from("ghost")), Err(JournalError::EntryNotFound(_))));
        assert_eq!(c.pending_delete(), None);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Projection, render, export
// ═══════════════════════════════════════════════════════════════════

mod projection {
    use super::*;

    #[tokio::test]
    async fn render_builds_cards_with_escaped_text() {
        let mut c = controller();
        add(&mut c, "2024-01-05", "-42.50", "<b>Bad</b> & sad").await;
        add(&mut c, "2024-01-06", "0", "flat").await;
        let view = c.render_as_of(d("2024-01-06"));
        assert_eq!(view.cards.len(), 2);
        assert_eq!(view.cards[0].amount, "+0.00");
        assert_eq!(view.cards[0].outcome, Outcome::Profit);
        assert_eq!(view.cards[1].amount, "-42.50");
        assert_eq!(view.cards[1].outcome, Outcome::Loss);
        assert_eq!(view.cards[1].description_html, "&lt;b&gt;Bad&lt;/b&gt; &amp; sad");
        assert_eq!(c.store().entries()[0].description, "<b>Bad</b> & sad");
    }

    #[tokio::test]
    async fn export_follows_active_filter_and_sort() {
        let mut c = controller();
        add(&mut c, "2024-01-01", "5", "small win").await;
        add(&mut c, "2024-01-02", "-3", "loss").await;
        add(&mut c, "2024-01-03", "50", "big win").await;
        c.set_filter(EntryFilter::Profit);
        c.set_sort(SortKey::AmountDesc);
        let csv = c.export_current_csv().unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("big win"));
        assert!(lines[2].contains("small win"));
        assert!(!csv.contains("\"loss\""));
    }

    #[tokio::test]
    async fn view_stats_cover_projection_only() {
        let mut c = controller();
        add(&mut c, "2024-01-01", "5", "a").await;
        add(&mut c, "2024-01-02", "-3", "b").await;
        c.set_filter(EntryFilter::Loss);
        let view = c.render();
        assert_eq!(view.stats.total_trades, 1);
        assert_eq!(view.stats.total_loss, 3.0);
        assert_eq!(view.stats.total_profit, 0.0);
    }

    #[tokio::test]
    async fn search_uses_active_sort() {
        let mut c = controller();
        add(&mut c, "2024-01-01", "5", "breakout long").await;
        add(&mut c, "2024-01-02", "9", "breakout short").await;
        add(&mut c, "2024-01-03", "1", "range").await;
        c.set_sort(SortKey::DateAsc);
        let found: Vec<&str> = c.search("BREAKOUT").iter().map(|e| e.description.as_str()).collect();
        assert_eq!(found, vec!["breakout long", "breakout short"]);
    }

    #[tokio::test]
    async fn search_respects_active_filter() {
        let mut c = controller();
        add(&mut c, "2024-01-01", "5", "breakout winner").await;
        add(&mut c, "2024-01-02", "-4", "breakout loser").await;
        add(&mut c, "2024-01-03", "-1", "range loser").await;
        c.set_filter(EntryFilter::Loss);
        let found: Vec<&str> = c.search("breakout").iter().map(|e| e.description.as_str()).collect();
        assert_eq!(found, vec!["breakout loser"]);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Dispatch
// ═══════════════════════════════════════════════════════════════════

mod dispatch {
    use super::*;

    #[tokio::test]
    async fn full_intent_cycle() {
        let mut c = controller();

        let saved = c
            .dispatch(Intent::Submit(FormFields::simple("2024-01-05", "10", "first")))
            .await
            .unwrap();
        let id = match saved.response {
            Response::Saved(outcome) => outcome.entry.id,
            other => panic!("unexpected response {other:?}"),
        };
        assert_eq!(saved.view.cards.len(), 1);

        let editing = c.dispatch(Intent::BeginEdit(id.clone())).await.unwrap();
        assert!(matches!(editing.response, Response::EditForm(ref f) if f.description == "first"));
        assert_eq!(editing.view.edit_state, EditState::Editing(id.clone()));

        let updated = c
            .dispatch(Intent::Submit(FormFields::simple("2024-01-05", "12", "first, edited")))
            .await
            .unwrap();
        assert_eq!(updated.view.edit_state, EditState::Idle);
        assert_eq!(updated.view.cards[0].amount, "+12.00");

        let armed = c.dispatch(Intent::RequestDelete(id.clone())).await.unwrap();
        assert_eq!(armed.view.pending_delete, Some(id.clone()));
        assert_eq!(armed.view.cards.len(), 1);

        let deleted = c.dispatch(Intent::ConfirmDelete).await.unwrap();
        assert!(matches!(deleted.response, Response::Deleted { removed: true, warning: None }));
        assert!(deleted.view.cards.is_empty());
    }

    #[tokio::test]
    async fn filter_sort_and_export_intents() {
        let mut c = controller();
        add(&mut c, "2024-01-01", "-1", "a").await;
        add(&mut c, "2024-01-02", "2", "b").await;

        let filtered = c.dispatch(Intent::SetFilter(EntryFilter::Loss)).await.unwrap();
        assert_eq!(filtered.view.filter, EntryFilter::Loss);
        assert_eq!(filtered.view.cards.len(), 1);

        let sorted = c.dispatch(Intent::SetSort(SortKey::AmountAsc)).await.unwrap();
        assert_eq!(sorted.view.sort, SortKey::AmountAsc);

        let exported = c.dispatch(Intent::Export).await.unwrap();
        match exported.response {
            Response::Csv(csv) => assert_eq!(csv.lines().count(), 2),
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancel_intents() {
        let mut c = controller();
        let id = add(&mut c, "2024-01-01", "1", "a").await;
        c.dispatch(Intent::BeginEdit(id.clone())).await.unwrap();
        c.dispatch(Intent::RequestDelete(id)).await.unwrap();
        let after = c.dispatch(Intent::CancelEdit).await.unwrap();
        assert_eq!(after.view.edit_state, EditState::Idle);
        let after = c.dispatch(Intent::CancelDelete).await.unwrap();
        assert_eq!(after.view.pending_delete, None);
        assert_eq!(after.view.cards.len(), 1);
    }
}
