//! Flux: the state engine behind the Agro Mark screens.
//!
//! Rust owns the state and the logic; the platform (mobile UI, terminal)
//! renders snapshots and sends requests.
//!
//! - `get(path)`: read the snapshot stored at a path
//! - `emit(path, payload)`: send a request to the matching handler(s)
//! - `subscribe(pattern)`: get called whenever a matching path changes
//!
//! Paths are `/`-separated (`lotes/state`, `lote-form/state`). Handler and
//! subscription patterns may use `+` (one level) and `#` (the rest).

pub mod app;
pub mod pattern;
pub mod router;
pub mod store;

pub use app::Flux;
pub use pattern::{Pattern, PatternTable};
pub use router::{BoxFuture, Payload, Router};
pub use store::{ChangeHandler, StateStore, StateValue, SubscriptionId};
