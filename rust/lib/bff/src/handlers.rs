//! Flux wiring: each request path is routed to a handler that drives the
//! controllers and republishes their snapshots.
//!
//! Controllers live behind `std::sync::Mutex`. A lock is only ever held
//! inside [`LoteContext::with_list`] / [`LoteContext::with_form`], never
//! across a network call.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use agromark_client::LoteApi;
use agromark_flux::{Flux, StateStore};
use tracing::{debug, info, warn};

use crate::form::LoteForm;
use crate::list::{DeleteOutcome, LoteList, RefreshPolicy};
use crate::request::*;
use crate::state::*;

/// Everything the handlers share: the remote API and the two controllers.
pub struct LoteContext {
    api: Arc<dyn LoteApi>,
    list: Mutex<LoteList>,
    form: Mutex<LoteForm>,
    /// Creation signals emitted so far. Sole source of `LoteCreated.count`.
    created: AtomicU64,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl LoteContext {
    pub fn new(api: Arc<dyn LoteApi>, policy: RefreshPolicy) -> Self {
        Self {
            api,
            list: Mutex::new(LoteList::with_policy(policy)),
            form: Mutex::new(LoteForm::new()),
            created: AtomicU64::new(0),
        }
    }

    /// Run `f` on the list, then publish the list and scanner snapshots.
    pub fn with_list<R>(&self, store: &StateStore, f: impl FnOnce(&mut LoteList) -> R) -> R {
        let (out, lotes, scanner) = {
            let mut list = lock(&self.list);
            let out = f(&mut list);
            (out, list.state(), list.scanner_state())
        };
        store.set(LotesState::PATH, lotes);
        store.set(ScannerState::PATH, scanner);
        out
    }

    /// Run `f` on the form, then publish the form snapshot.
    pub fn with_form<R>(&self, store: &StateStore, f: impl FnOnce(&mut LoteForm) -> R) -> R {
        let (out, state) = {
            let mut form = lock(&self.form);
            let out = f(&mut form);
            (out, form.state())
        };
        store.set(LoteFormState::PATH, state);
        out
    }
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn handle_initialize(ctx: &LoteContext, store: &StateStore) {
    ctx.with_form(store, |_| ());
    if !store.contains(LoteCreated::PATH) {
        store.set(LoteCreated::PATH, LoteCreated::default());
    }
    show_list(ctx, store).await;
}

/// Route to the list and refetch, as the list screen does whenever it
/// comes into view.
pub async fn show_list(ctx: &LoteContext, store: &StateStore) {
    store.set(AppRoute::PATH, AppRoute::list());
    handle_refresh(ctx, store).await;
}

pub async fn handle_refresh(ctx: &LoteContext, store: &StateStore) {
    let ticket = ctx.with_list(store, |list| list.begin_refresh());
    let result = ctx.api.list().await;
    // Failures are recorded on the list and published with it.
    let _ = ctx.with_list(store, |list| list.finish_refresh(ticket, result));
}

pub fn handle_search(ctx: &LoteContext, store: &StateStore, req: &SearchReq) {
    ctx.with_list(store, |list| list.set_query(req.query.as_str()));
}

pub fn handle_scan(ctx: &LoteContext, store: &StateStore, req: &ScanReq) {
    ctx.with_list(store, |list| {
        if !list.scanner().is_active() {
            debug!("scan received while scanner inactive");
        }
        list.on_scan_detected(req.payload.as_str());
    });
}

pub fn handle_scanner_toggle(ctx: &LoteContext, store: &StateStore) {
    let toggled = ctx.with_list(store, |list| list.scanner_mut().toggle());
    if !toggled {
        warn!("scanner not opened: camera permission not granted");
    }
}

pub fn handle_camera_permission(ctx: &LoteContext, store: &StateStore, req: &CameraPermissionReq) {
    ctx.with_list(store, |list| list.scanner_mut().set_permission(req.granted));
}

pub async fn handle_delete(ctx: &LoteContext, store: &StateStore, req: &DeleteReq) {
    let codigo = req.codigo.clone();
    let send = ctx.with_list(store, |list| list.begin_delete(&codigo, req.confirmation));
    if !send {
        store.set(
            LoteDeleted::PATH,
            LoteDeleted {
                codigo,
                outcome: DeleteOutcome::Cancelled,
                error: None,
            },
        );
        return;
    }

    let result = ctx.api.delete(&codigo).await;
    match ctx.with_list(store, |list| list.finish_delete(&codigo, result)) {
        Ok(()) => {
            store.set(
                LoteDeleted::PATH,
                LoteDeleted {
                    codigo,
                    outcome: DeleteOutcome::Deleted,
                    error: None,
                },
            );
            // A failed refetch lands on `lotes/state`, not on the delete.
            handle_refresh(ctx, store).await;
        }
        Err(e) => store.set(
            LoteDeleted::PATH,
            LoteDeleted {
                codigo,
                outcome: DeleteOutcome::Failed,
                error: Some(e.to_string()),
            },
        ),
    }
}

pub fn handle_open_form(ctx: &LoteContext, store: &StateStore) {
    ctx.with_form(store, |form| *form = LoteForm::new());
    store.set(AppRoute::PATH, AppRoute::new_lote());
}

pub fn handle_set_nome(ctx: &LoteContext, store: &StateStore, req: &SetNomeReq) {
    ctx.with_form(store, |form| form.set_nome(req.nome.as_str()));
}

pub fn handle_set_validade(ctx: &LoteContext, store: &StateStore, req: &SetValidadeReq) {
    ctx.with_form(store, |form| form.set_validade(req.validade));
}

pub async fn handle_submit(ctx: &LoteContext, store: &StateStore) {
    let Some(new) = ctx.with_form(store, |form| form.begin_submit()) else {
        warn!("submit ignored: previous submit still in flight");
        return;
    };
    let result = ctx.api.create(&new).await;
    let outcome = ctx.with_form(store, |form| form.finish_submit(result));

    if let Ok(lote) = outcome {
        let count = ctx.created.fetch_add(1, Ordering::SeqCst) + 1;
        info!(count, "creation complete");
        store.set(LoteCreated::PATH, LoteCreated { count, lote });
        show_list(ctx, store).await;
    }
}

// ── Registration ────────────────────────────────────────────────────

fn bad_payload(path: &str) {
    warn!("{}: unexpected payload type", path);
}

/// Route every request path to its handler.
pub fn register_handlers(flux: &Flux, ctx: Arc<LoteContext>) {
    // app/initialize
    {
        let ctx = ctx.clone();
        flux.on(InitializeReq::PATH, move |_, _, store: Arc<StateStore>| {
            let ctx = ctx.clone();
            async move {
                handle_initialize(&ctx, &store).await;
            }
        });
    }

    // app/back
    {
        let ctx = ctx.clone();
        flux.on(BackReq::PATH, move |_, _, store: Arc<StateStore>| {
            let ctx = ctx.clone();
            async move {
                show_list(&ctx, &store).await;
            }
        });
    }

    // lotes/refresh
    {
        let ctx = ctx.clone();
        flux.on(RefreshReq::PATH, move |_, _, store: Arc<StateStore>| {
            let ctx = ctx.clone();
            async move {
                handle_refresh(&ctx, &store).await;
            }
        });
    }

    // lotes/search
    {
        let ctx = ctx.clone();
        flux.on(SearchReq::PATH, move |path, payload, store: Arc<StateStore>| {
            let ctx = ctx.clone();
            async move {
                match payload.downcast_ref::<SearchReq>() {
                    Some(req) => handle_search(&ctx, &store, req),
                    None => bad_payload(&path),
                }
            }
        });
    }

    // lotes/scan
    {
        let ctx = ctx.clone();
        flux.on(ScanReq::PATH, move |path, payload, store: Arc<StateStore>| {
            let ctx = ctx.clone();
            async move {
                match payload.downcast_ref::<ScanReq>() {
                    Some(req) => handle_scan(&ctx, &store, req),
                    None => bad_payload(&path),
                }
            }
        });
    }

    // lotes/delete
    {
        let ctx = ctx.clone();
        flux.on(DeleteReq::PATH, move |path, payload, store: Arc<StateStore>| {
            let ctx = ctx.clone();
            async move {
                match payload.downcast_ref::<DeleteReq>() {
                    Some(req) => handle_delete(&ctx, &store, req).await,
                    None => bad_payload(&path),
                }
            }
        });
    }

    // scanner/toggle
    {
        let ctx = ctx.clone();
        flux.on(ScannerToggleReq::PATH, move |_, _, store: Arc<StateStore>| {
            let ctx = ctx.clone();
            async move {
                handle_scanner_toggle(&ctx, &store);
            }
        });
    }

    // scanner/permission
    {
        let ctx = ctx.clone();
        flux.on(CameraPermissionReq::PATH, move |path, payload, store: Arc<StateStore>| {
            let ctx = ctx.clone();
            async move {
                match payload.downcast_ref::<CameraPermissionReq>() {
                    Some(req) => handle_camera_permission(&ctx, &store, req),
                    None => bad_payload(&path),
                }
            }
        });
    }

    // lote-form/open
    {
        let ctx = ctx.clone();
        flux.on(OpenFormReq::PATH, move |_, _, store: Arc<StateStore>| {
            let ctx = ctx.clone();
            async move {
                handle_open_form(&ctx, &store);
            }
        });
    }

    // lote-form/set-nome
    {
        let ctx = ctx.clone();
        flux.on(SetNomeReq::PATH, move |path, payload, store: Arc<StateStore>| {
            let ctx = ctx.clone();
            async move {
                match payload.downcast_ref::<SetNomeReq>() {
                    Some(req) => handle_set_nome(&ctx, &store, req),
                    None => bad_payload(&path),
                }
            }
        });
    }

    // lote-form/set-validade
    {
        let ctx = ctx.clone();
        flux.on(SetValidadeReq::PATH, move |path, payload, store: Arc<StateStore>| {
            let ctx = ctx.clone();
            async move {
                match payload.downcast_ref::<SetValidadeReq>() {
                    Some(req) => handle_set_validade(&ctx, &store, req),
                    None => bad_payload(&path),
                }
            }
        });
    }

    // lote-form/submit
    flux.on(SubmitReq::PATH, move |_, _, store: Arc<StateStore>| {
        let ctx = ctx.clone();
        async move {
            handle_submit(&ctx, &store).await;
        }
    });
}

#[cfg(test)]
mod tests {
    use agromark_types::{Codigo, Validade};

    use super::*;
    use crate::list::Confirmation;
    use crate::scanner::CameraPermission;
    use crate::testing::{lote, MemoryApi};

    fn app_with(api: Arc<MemoryApi>) -> Flux {
        let flux = Flux::new();
        register_handlers(&flux, Arc::new(LoteContext::new(api, RefreshPolicy::Reset)));
        flux
    }

    fn seeded_api() -> Arc<MemoryApi> {
        Arc::new(MemoryApi::with(vec![
            lote("A1", "X", "2024-01-01"),
            lote("B2", "Y", "2024-02-02"),
        ]))
    }

    fn lotes(flux: &Flux) -> LotesState {
        flux.get_as::<LotesState>(LotesState::PATH).unwrap()
    }

    fn deleted(flux: &Flux) -> LoteDeleted {
        flux.get_as::<LoteDeleted>(LoteDeleted::PATH).unwrap()
    }

    async fn delete(flux: &Flux, codigo: &str, confirmation: Confirmation) {
        flux.emit(
            DeleteReq::PATH,
            DeleteReq {
                codigo: Codigo::new(codigo),
                confirmation,
            },
        )
        .await;
    }

    fn codes(state: &LotesState) -> Vec<String> {
        state.items.iter().map(|l| l.codigo.to_string()).collect()
    }

    #[tokio::test]
    async fn initialize_publishes_and_fetches() {
        let flux = app_with(seeded_api());
        flux.emit(InitializeReq::PATH, InitializeReq).await;

        assert_eq!(flux.get_as::<AppRoute>(AppRoute::PATH), Some(AppRoute::list()));
        let state = lotes(&flux);
        assert_eq!(codes(&state), vec!["A1", "B2"]);
        assert!(!state.refreshing);
        assert_eq!(flux.get_as::<LoteCreated>(LoteCreated::PATH), Some(LoteCreated::default()));
        assert!(flux.get_as::<LoteFormState>(LoteFormState::PATH).is_some());
    }

    #[tokio::test]
    async fn search_then_scan() {
        let flux = app_with(seeded_api());
        flux.emit(InitializeReq::PATH, InitializeReq).await;

        flux.emit(SearchReq::PATH, SearchReq { query: "a1".into() }).await;
        assert_eq!(codes(&lotes(&flux)), vec!["A1"]);

        flux.emit(CameraPermissionReq::PATH, CameraPermissionReq { granted: true }).await;
        flux.emit(ScannerToggleReq::PATH, ScannerToggleReq).await;
        let scanner = flux.get_as::<ScannerState>(ScannerState::PATH).unwrap();
        assert!(scanner.active);

        flux.emit(ScanReq::PATH, ScanReq { payload: "B2".into() }).await;
        let state = lotes(&flux);
        assert_eq!(state.query, "B2");
        assert_eq!(codes(&state), vec!["B2"]);
        let scanner = flux.get_as::<ScannerState>(ScannerState::PATH).unwrap();
        assert!(!scanner.open);
        assert_eq!(scanner.permission, CameraPermission::Granted);
    }

    #[tokio::test]
    async fn toggle_without_permission_stays_closed() {
        let flux = app_with(seeded_api());
        flux.emit(ScannerToggleReq::PATH, ScannerToggleReq).await;
        let scanner = flux.get_as::<ScannerState>(ScannerState::PATH).unwrap();
        assert!(!scanner.open);
        assert_eq!(scanner.permission, CameraPermission::Unknown);
    }

    #[tokio::test]
    async fn delete_confirmed_resyncs() {
        let api = seeded_api();
        let flux = app_with(api.clone());
        flux.emit(InitializeReq::PATH, InitializeReq).await;

        delete(&flux, "A1", Confirmation::Destructive).await;

        let state = lotes(&flux);
        assert_eq!(codes(&state), vec!["B2"]);
        assert_eq!(state.total, 1);
        assert_eq!(api.list_calls(), 2);
        assert_eq!(deleted(&flux).outcome, DeleteOutcome::Deleted);
    }

    #[tokio::test]
    async fn delete_failure_is_published() {
        let api = seeded_api();
        let flux = app_with(api.clone());
        flux.emit(InitializeReq::PATH, InitializeReq).await;

        delete(&flux, "nope", Confirmation::Destructive).await;

        let state = lotes(&flux);
        assert_eq!(codes(&state), vec!["A1", "B2"]);
        assert!(state.error.unwrap().contains("404"));
        assert_eq!(api.list_calls(), 1);

        let result = deleted(&flux);
        assert_eq!(result.codigo.as_str(), "nope");
        assert_eq!(result.outcome, DeleteOutcome::Failed);
        assert!(result.error.unwrap().contains("404"));
    }

    #[tokio::test]
    async fn delete_stands_when_refetch_fails() {
        let api = seeded_api();
        let flux = app_with(api.clone());
        flux.emit(InitializeReq::PATH, InitializeReq).await;

        api.fail_list(true);
        delete(&flux, "A1", Confirmation::Destructive).await;

        let result = deleted(&flux);
        assert_eq!(result.outcome, DeleteOutcome::Deleted);
        assert!(result.error.is_none());

        // The stale rows stay until a refetch succeeds; the failure is the list's.
        let state = lotes(&flux);
        assert_eq!(codes(&state), vec!["A1", "B2"]);
        assert!(state.error.unwrap().contains("503"));
    }

    #[tokio::test]
    async fn delete_cancelled_sends_nothing() {
        let api = seeded_api();
        let flux = app_with(api.clone());

        delete(&flux, "A1", Confirmation::Cancel).await;

        assert_eq!(api.delete_calls(), 0);
        assert_eq!(deleted(&flux).outcome, DeleteOutcome::Cancelled);
    }

    #[tokio::test]
    async fn refresh_failure_keeps_list() {
        let api = seeded_api();
        let flux = app_with(api.clone());
        flux.emit(InitializeReq::PATH, InitializeReq).await;
        flux.emit(SearchReq::PATH, SearchReq { query: "b".into() }).await;

        api.fail_list(true);
        flux.emit(RefreshReq::PATH, RefreshReq).await;

        let state = lotes(&flux);
        assert_eq!(state.query, "b");
        assert_eq!(codes(&state), vec!["B2"]);
        assert!(!state.refreshing);
        assert!(state.error.is_some());
    }

    #[tokio::test]
    async fn create_flow_signals_once_and_returns_to_list() {
        let api = seeded_api();
        let flux = app_with(api.clone());
        flux.emit(InitializeReq::PATH, InitializeReq).await;

        let signals = Arc::new(AtomicU64::new(0));
        let s = signals.clone();
        flux.subscribe(LoteCreated::PATH, move |_, _| {
            s.fetch_add(1, Ordering::SeqCst);
        });

        flux.emit(OpenFormReq::PATH, OpenFormReq).await;
        assert_eq!(flux.get_as::<AppRoute>(AppRoute::PATH), Some(AppRoute::new_lote()));

        flux.emit(SetNomeReq::PATH, SetNomeReq { nome: "Lote X".into() }).await;
        flux.emit(
            SetValidadeReq::PATH,
            SetValidadeReq {
                validade: Validade::from_ymd(2024, 5, 20).unwrap(),
            },
        )
        .await;
        flux.emit(SubmitReq::PATH, SubmitReq).await;

        assert_eq!(signals.load(Ordering::SeqCst), 1);
        let created = flux.get_as::<LoteCreated>(LoteCreated::PATH).unwrap();
        assert_eq!(created.count, 1);
        assert_eq!(created.lote.unwrap().nome, "Lote X");
        assert_eq!(api.created()[0].validade.to_string(), "2024-05-20");

        assert_eq!(flux.get_as::<AppRoute>(AppRoute::PATH), Some(AppRoute::list()));
        assert_eq!(codes(&lotes(&flux)), vec!["A1", "B2", "NEW1"]);
    }

    #[tokio::test]
    async fn created_count_survives_reinitialize_and_new_form() {
        let flux = app_with(seeded_api());
        flux.emit(InitializeReq::PATH, InitializeReq).await;

        for expected in 1..=2 {
            flux.emit(OpenFormReq::PATH, OpenFormReq).await;
            flux.emit(SetNomeReq::PATH, SetNomeReq { nome: "L".into() }).await;
            flux.emit(SubmitReq::PATH, SubmitReq).await;
            let created = flux.get_as::<LoteCreated>(LoteCreated::PATH).unwrap();
            assert_eq!(created.count, expected);
        }

        flux.emit(InitializeReq::PATH, InitializeReq).await;
        assert_eq!(flux.get_as::<LoteCreated>(LoteCreated::PATH).unwrap().count, 2);
    }

    #[tokio::test]
    async fn create_failure_stays_on_form() {
        let api = seeded_api();
        api.fail_create(true);
        let flux = app_with(api.clone());
        flux.emit(OpenFormReq::PATH, OpenFormReq).await;
        flux.emit(SetNomeReq::PATH, SetNomeReq { nome: "Lote X".into() }).await;
        flux.emit(SubmitReq::PATH, SubmitReq).await;

        let form = flux.get_as::<LoteFormState>(LoteFormState::PATH).unwrap();
        assert_eq!(form.nome, "Lote X");
        assert!(!form.submitting);
        assert!(form.error.is_some());
        assert!(flux.get_as::<LoteCreated>(LoteCreated::PATH).is_none());
        assert_eq!(flux.get_as::<AppRoute>(AppRoute::PATH), Some(AppRoute::new_lote()));
    }

    #[tokio::test]
    async fn wrong_payload_type_is_ignored() {
        let flux = app_with(seeded_api());
        flux.emit(SearchReq::PATH, "not a SearchReq").await;
        assert!(flux.get(LotesState::PATH).is_none());
    }
}
