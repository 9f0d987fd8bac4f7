//! State snapshots published for the UI, one per path.

use agromark_types::{Codigo, Lote, Validade};
use serde::Serialize;

use crate::list::DeleteOutcome;
use crate::scanner::CameraPermission;

/// Current screen: stored at `app/route`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppRoute(pub String);

impl AppRoute {
    pub const PATH: &'static str = "app/route";
    pub const LIST: &'static str = "/";
    pub const NEW_LOTE: &'static str = "/lotes/new";

    pub fn list() -> Self {
        Self(Self::LIST.to_string())
    }

    pub fn new_lote() -> Self {
        Self(Self::NEW_LOTE.to_string())
    }
}

/// Batch list screen: stored at `lotes/state`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LotesState {
    /// Text in the search field.
    pub query: String,
    /// Rows to render: the fetched batches matching `query`.
    pub items: Vec<Lote>,
    /// Size of the unfiltered collection.
    pub total: usize,
    pub refreshing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LotesState {
    pub const PATH: &'static str = "lotes/state";
}

/// Barcode scanner surface: stored at `lotes/scanner`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannerState {
    pub open: bool,
    pub permission: CameraPermission,
    /// Camera view visible: open and permitted.
    pub active: bool,
}

impl ScannerState {
    pub const PATH: &'static str = "lotes/scanner";
}

/// Result of the last delete request: stored at `lotes/deleted`.
///
/// Kept apart from [`LotesState::error`], which the refetch after a delete
/// may overwrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoteDeleted {
    pub codigo: Codigo,
    pub outcome: DeleteOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LoteDeleted {
    pub const PATH: &'static str = "lotes/deleted";
}

/// Creation form: stored at `lote-form/state`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoteFormState {
    pub nome: String,
    pub validade: Validade,
    /// Date picker button text, e.g. "Mon May 20 2024".
    pub validade_label: String,
    pub submitting: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LoteFormState {
    pub const PATH: &'static str = "lote-form/state";
}

/// "Creation complete" signal: stored at `lote-form/created`.
///
/// `count` goes up by one per successful submit; a subscriber reacts to
/// each change exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoteCreated {
    pub count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lote: Option<Lote>,
}

impl LoteCreated {
    pub const PATH: &'static str = "lote-form/created";
}
