//! Agro Mark BFF: the state and logic behind the batch screens.
//!
//! - [`list::LoteList`]: fetched batches, search by code, delete, scan
//! - [`form::LoteForm`]: the "Criar Lote" scratch buffer and submit
//! - [`handlers`]: registers both on a [`Flux`] instance
//!
//! The platform only renders the snapshots in [`state`] and emits the
//! requests in [`request`]:
//!
//! ```ignore
//! let client = Arc::new(LoteClient::new("http://192.168.31.2:6933")?);
//! let flux = agromark_bff::build(client, RefreshPolicy::Reset);
//!
//! flux.emit(InitializeReq::PATH, InitializeReq).await;
//! flux.emit(SearchReq::PATH, SearchReq { query: "a1".into() }).await;
//! let lotes = flux.get_as::<LotesState>(LotesState::PATH);
//! ```

pub mod form;
pub mod handlers;
pub mod list;
pub mod request;
pub mod scanner;
pub mod state;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use agromark_client::LoteApi;
use agromark_flux::Flux;

pub use form::LoteForm;
pub use handlers::{register_handlers, LoteContext};
pub use list::{filter_by_codigo, Confirmation, DeleteOutcome, LoteList, RefreshOutcome, RefreshPolicy};
pub use scanner::{CameraPermission, Scanner};

/// A [`Flux`] with every batch handler registered against `api`.
pub fn build(api: Arc<dyn LoteApi>, policy: RefreshPolicy) -> Flux {
    let flux = Flux::new();
    register_handlers(&flux, Arc::new(LoteContext::new(api, policy)));
    flux
}
