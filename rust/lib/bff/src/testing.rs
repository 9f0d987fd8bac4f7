//! In-memory `LoteApi` with failure switches, for controller tests.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use agromark_client::{LoteApi, TransportError};
use agromark_types::{Codigo, Lote, NewLote};

pub fn lote(codigo: &str, nome: &str, validade: &str) -> Lote {
    Lote {
        codigo: Codigo::new(codigo),
        nome: nome.to_string(),
        validade: validade.parse().unwrap(),
    }
}

fn unavailable() -> TransportError {
    TransportError::Status {
        status: 503,
        message: "unavailable".into(),
    }
}

#[derive(Default)]
pub struct MemoryApi {
    lotes: Mutex<Vec<Lote>>,
    created: Mutex<Vec<NewLote>>,
    next_code: AtomicU64,
    list_calls: AtomicU64,
    delete_calls: AtomicU64,
    fail_list: AtomicBool,
    fail_create: AtomicBool,
}

impl MemoryApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(lotes: Vec<Lote>) -> Self {
        let api = Self::default();
        *api.lotes.lock().unwrap() = lotes;
        api
    }

    pub fn fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    /// Bodies received by `create`, in order.
    pub fn created(&self) -> Vec<NewLote> {
        self.created.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> u64 {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> u64 {
        self.delete_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl LoteApi for MemoryApi {
    async fn list(&self) -> Result<Vec<Lote>, TransportError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(self.lotes.lock().unwrap().clone())
    }

    async fn create(&self, lote: &NewLote) -> Result<Option<Lote>, TransportError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.created.lock().unwrap().push(lote.clone());
        let n = self.next_code.fetch_add(1, Ordering::SeqCst) + 1;
        let stored = Lote {
            codigo: Codigo::new(format!("NEW{}", n)),
            nome: lote.nome.clone(),
            validade: lote.validade,
        };
        self.lotes.lock().unwrap().push(stored.clone());
        Ok(Some(stored))
    }

    async fn delete(&self, codigo: &Codigo) -> Result<(), TransportError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        let mut lotes = self.lotes.lock().unwrap();
        let before = lotes.len();
        lotes.retain(|l| &l.codigo != codigo);
        if lotes.len() == before {
            return Err(TransportError::Status {
                status: 404,
                message: format!("lote {} not found", codigo),
            });
        }
        Ok(())
    }
}
