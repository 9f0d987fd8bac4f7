//! Batch list controller.
//!
//! Owns the last fetched collection (`original`), the search text
//! (`query`), and the view derived from both (`filtered`). Every mutation
//! goes through a method that recomputes `filtered`, so at any point
//! between calls:
//!
//! ```text
//! filtered == [l in original | lower(query) is a substring of lower(l.codigo)]
//! ```
//!
//! Network calls are split into a `begin_*` / `finish_*` pair so a caller
//! that shares the controller behind a lock can release it while waiting
//! on the server.

use agromark_client::TransportError;
use agromark_types::{Codigo, Lote};
use serde::{Deserialize, Serialize};

use crate::scanner::Scanner;
use crate::state::{LotesState, ScannerState};

/// What a successful refresh does to an active search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshPolicy {
    /// Clear the query and show every batch.
    #[default]
    Reset,
    /// Keep the query and filter the fresh collection with it.
    Reapply,
}

/// Answer of the delete confirmation dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confirmation {
    Cancel,
    Destructive,
}

/// How a delete request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteOutcome {
    /// Dialog was cancelled; nothing was sent.
    Cancelled,
    /// Server confirmed the delete.
    Deleted,
    /// Server refused or was unreachable. The row stays.
    Failed,
}

/// Sequence number of one in-flight refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Fresh collection applied; holds its length.
    Applied(usize),
    /// A newer refresh was started meanwhile; this result was dropped.
    Stale,
}

/// Batches whose code contains `query`, ignoring case, in input order.
pub fn filter_by_codigo(lotes: &[Lote], query: &str) -> Vec<Lote> {
    let needle = query.to_lowercase();
    lotes
        .iter()
        .filter(|l| l.codigo.contains_lowercase(&needle))
        .cloned()
        .collect()
}

#[derive(Debug, Default)]
pub struct LoteList {
    original: Vec<Lote>,
    filtered: Vec<Lote>,
    query: String,
    refreshing: bool,
    policy: RefreshPolicy,
    /// Last ticket handed out by `begin_refresh`.
    issued: u64,
    error: Option<String>,
    scanner: Scanner,
}

impl LoteList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: RefreshPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn original(&self) -> &[Lote] {
        &self.original
    }

    pub fn filtered(&self) -> &[Lote] {
        &self.filtered
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    pub fn policy(&self) -> RefreshPolicy {
        self.policy
    }

    /// Message of the last failed network operation, cleared by the next
    /// successful one.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn scanner(&self) -> &Scanner {
        &self.scanner
    }

    pub fn scanner_mut(&mut self) -> &mut Scanner {
        &mut self.scanner
    }

    // ── Search ──────────────────────────────────────────────────────

    pub fn set_query(&mut self, text: impl Into<String>) {
        self.query = text.into();
        self.filtered = filter_by_codigo(&self.original, &self.query);
    }

    /// A decoded barcode is typed into the search field verbatim.
    pub fn on_scan_detected(&mut self, payload: impl Into<String>) {
        self.scanner.close();
        self.set_query(payload);
    }

    // ── Refresh ─────────────────────────────────────────────────────

    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.issued += 1;
        self.refreshing = true;
        RefreshTicket(self.issued)
    }

    /// Apply the result of the fetch started with `ticket`.
    ///
    /// Results of superseded tickets are dropped, success or failure. On
    /// failure the collection, query and view are left exactly as they were.
    pub fn finish_refresh(
        &mut self,
        ticket: RefreshTicket,
        result: Result<Vec<Lote>, TransportError>,
    ) -> Result<RefreshOutcome, TransportError> {
        if ticket.0 != self.issued {
            tracing::debug!(ticket = ticket.0, latest = self.issued, "dropping stale refresh");
            return Ok(RefreshOutcome::Stale);
        }
        self.refreshing = false;

        match result {
            Ok(lotes) => {
                let count = lotes.len();
                self.original = lotes;
                match self.policy {
                    RefreshPolicy::Reset => self.set_query(String::new()),
                    RefreshPolicy::Reapply => {
                        self.filtered = filter_by_codigo(&self.original, &self.query)
                    }
                }
                self.error = None;
                tracing::info!(count, "lotes refreshed");
                Ok(RefreshOutcome::Applied(count))
            }
            Err(e) => {
                self.report("refresh", &e);
                Err(e)
            }
        }
    }

    // ── Delete ──────────────────────────────────────────────────────

    /// Gate a delete on the dialog answer. `false` means nothing is sent.
    pub fn begin_delete(&self, codigo: &Codigo, confirmation: Confirmation) -> bool {
        if confirmation == Confirmation::Cancel {
            tracing::debug!(codigo = %codigo, "delete cancelled");
            return false;
        }
        true
    }

    /// Record the server's answer to a delete. No row is removed locally;
    /// the caller refetches on success.
    pub fn finish_delete(
        &mut self,
        codigo: &Codigo,
        result: Result<(), TransportError>,
    ) -> Result<(), TransportError> {
        match result {
            Ok(()) => {
                tracing::info!(codigo = %codigo, "lote deleted");
                Ok(())
            }
            Err(e) => {
                self.report("delete", &e);
                Err(e)
            }
        }
    }

    /// Record a failed network operation. Collection state is not touched.
    pub fn report(&mut self, operation: &str, err: &TransportError) {
        tracing::error!("lotes {} failed: {}", operation, err);
        self.error = Some(err.to_string());
    }

    /// Snapshot for the list screen.
    pub fn state(&self) -> LotesState {
        LotesState {
            query: self.query.clone(),
            items: self.filtered.clone(),
            total: self.original.len(),
            refreshing: self.refreshing,
            error: self.error.clone(),
        }
    }

    pub fn scanner_state(&self) -> ScannerState {
        ScannerState {
            open: self.scanner.is_open(),
            permission: self.scanner.permission(),
            active: self.scanner.is_active(),
        }
    }
}
