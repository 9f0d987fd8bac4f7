//! Batch creation form.
//!
//! Holds what the user typed until it is submitted. Nothing is validated
//! here; an empty name or a past date goes to the server as is.

use agromark_client::TransportError;
use agromark_types::{Lote, NewLote, Validade};

use crate::state::LoteFormState;

#[derive(Debug, Clone)]
pub struct LoteForm {
    nome: String,
    validade: Validade,
    submitting: bool,
    error: Option<String>,
}

impl LoteForm {
    /// Empty name, expiry today.
    pub fn new() -> Self {
        Self::with_validade(Validade::today())
    }

    pub fn with_validade(validade: Validade) -> Self {
        Self {
            nome: String::new(),
            validade,
            submitting: false,
            error: None,
        }
    }

    pub fn nome(&self) -> &str {
        &self.nome
    }

    pub fn validade(&self) -> Validade {
        self.validade
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_nome(&mut self, nome: impl Into<String>) {
        self.nome = nome.into();
    }

    pub fn set_validade(&mut self, validade: Validade) {
        self.validade = validade;
    }

    /// Enter the submitting phase and hand out the payload to send.
    /// `None` while a previous submit has not finished.
    pub fn begin_submit(&mut self) -> Option<NewLote> {
        if self.submitting {
            return None;
        }
        self.submitting = true;
        self.error = None;
        Some(NewLote::new(self.nome.clone(), self.validade))
    }

    /// Leave the submitting phase. On success yields the batch the server
    /// echoed, if any. Typed data survives a failure so the user can retry
    /// as is.
    pub fn finish_submit(
        &mut self,
        result: Result<Option<Lote>, TransportError>,
    ) -> Result<Option<Lote>, TransportError> {
        self.submitting = false;
        match result {
            Ok(created) => {
                tracing::info!(nome = %self.nome, validade = %self.validade, "lote created");
                Ok(created)
            }
            Err(e) => {
                tracing::error!("lote create failed: {}", e);
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Snapshot for the form screen.
    pub fn state(&self) -> LoteFormState {
        LoteFormState {
            nome: self.nome.clone(),
            validade: self.validade,
            validade_label: self.validade.to_long(),
            submitting: self.submitting,
            error: self.error.clone(),
        }
    }
}

impl Default for LoteForm {
    fn default() -> Self {
        Self::new()
    }
}
