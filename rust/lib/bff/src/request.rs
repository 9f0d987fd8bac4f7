//! Requests the UI sends, one type per path.

use agromark_types::{Codigo, Validade};

use crate::list::Confirmation;

/// Boot: publish initial snapshots and show the list.
pub struct InitializeReq;

impl InitializeReq {
    pub const PATH: &'static str = "app/initialize";
}

/// Return to the list screen. The list refetches on display.
pub struct BackReq;

impl BackReq {
    pub const PATH: &'static str = "app/back";
}

/// Pull-to-refresh.
pub struct RefreshReq;

impl RefreshReq {
    pub const PATH: &'static str = "lotes/refresh";
}

/// Keystroke in the search field.
pub struct SearchReq {
    pub query: String,
}

impl SearchReq {
    pub const PATH: &'static str = "lotes/search";
}

/// Trash button, after the confirmation dialog was answered.
pub struct DeleteReq {
    pub codigo: Codigo,
    pub confirmation: Confirmation,
}

impl DeleteReq {
    pub const PATH: &'static str = "lotes/delete";
}

/// Barcode decoded by the camera.
pub struct ScanReq {
    pub payload: String,
}

impl ScanReq {
    pub const PATH: &'static str = "lotes/scan";
}

/// Barcode button next to the search field.
pub struct ScannerToggleReq;

impl ScannerToggleReq {
    pub const PATH: &'static str = "scanner/toggle";
}

/// Answer of the platform camera permission prompt.
pub struct CameraPermissionReq {
    pub granted: bool,
}

impl CameraPermissionReq {
    pub const PATH: &'static str = "scanner/permission";
}

/// "Novo Lote" button: fresh form, form screen.
pub struct OpenFormReq;

impl OpenFormReq {
    pub const PATH: &'static str = "lote-form/open";
}

pub struct SetNomeReq {
    pub nome: String,
}

impl SetNomeReq {
    pub const PATH: &'static str = "lote-form/set-nome";
}

/// Date picker result.
pub struct SetValidadeReq {
    pub validade: Validade,
}

impl SetValidadeReq {
    pub const PATH: &'static str = "lote-form/set-validade";
}

/// "Salvar Lote" button.
pub struct SubmitReq;

impl SubmitReq {
    pub const PATH: &'static str = "lote-form/submit";
}
