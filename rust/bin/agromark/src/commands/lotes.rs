//! Batch commands: `agromark list`, `create`, `delete`, `scan`.
//!
//! Each command plays the part of the mobile screens: it emits the same
//! requests a tap would and prints the snapshots the screens would render.

use std::sync::Arc;

use anyhow::Result;

use agromark_bff::request::*;
use agromark_bff::state::*;
use agromark_bff::{Confirmation, DeleteOutcome};
use agromark_client::LoteClient;
use agromark_flux::Flux;
use agromark_types::{Codigo, Lote, Validade};

use crate::config::ClientConfig;

/// Build the client and the state engine for `server`.
pub fn connect(config: &ClientConfig, server: &str) -> Result<Flux> {
    let client = LoteClient::with_timeout(server, config.timeout())
        .map_err(|e| anyhow::anyhow!("cannot use server {}: {}", server, e))?;
    tracing::debug!(server = %client.base_url(), "connecting");
    Ok(agromark_bff::build(Arc::new(client), config.refresh_policy))
}

fn lotes_state(flux: &Flux) -> Result<LotesState> {
    flux.get_as::<LotesState>(LotesState::PATH)
        .ok_or_else(|| anyhow::anyhow!("lote list was never loaded"))
}

/// Fail with the published error, if any.
fn ensure_ok(state: &LotesState) -> Result<()> {
    match &state.error {
        Some(error) => anyhow::bail!("Erro ao buscar lotes: {}", error),
        None => Ok(()),
    }
}

/// LIST: fetch, optionally search by code, print.
pub async fn list(flux: &Flux, busca: Option<&str>, json: bool) -> Result<()> {
    flux.emit(InitializeReq::PATH, InitializeReq).await;
    if let Some(query) = busca {
        flux.emit(SearchReq::PATH, SearchReq { query: query.to_string() }).await;
    }
    let state = lotes_state(flux)?;
    ensure_ok(&state)?;
    print_lotes(&state, json)
}

/// SCAN: deliver a barcode payload to the list and print the matches.
pub async fn scan(flux: &Flux, payload: &str, json: bool) -> Result<()> {
    flux.emit(InitializeReq::PATH, InitializeReq).await;
    // A terminal has no camera prompt; the scan is the user's own input.
    flux.emit(CameraPermissionReq::PATH, CameraPermissionReq { granted: true }).await;
    flux.emit(ScannerToggleReq::PATH, ScannerToggleReq).await;
    flux.emit(ScanReq::PATH, ScanReq { payload: payload.to_string() }).await;

    let state = lotes_state(flux)?;
    ensure_ok(&state)?;
    print_lotes(&state, json)
}

/// CREATE: fill the form and submit it once.
pub async fn create(flux: &Flux, nome: &str, validade: Option<Validade>, json: bool) -> Result<()> {
    flux.emit(OpenFormReq::PATH, OpenFormReq).await;
    flux.emit(SetNomeReq::PATH, SetNomeReq { nome: nome.to_string() }).await;
    if let Some(validade) = validade {
        flux.emit(SetValidadeReq::PATH, SetValidadeReq { validade }).await;
    }
    flux.emit(SubmitReq::PATH, SubmitReq).await;

    let Some(created) = flux.get_as::<LoteCreated>(LoteCreated::PATH) else {
        let error = flux
            .get_as::<LoteFormState>(LoteFormState::PATH)
            .and_then(|f| f.error)
            .unwrap_or_else(|| "unknown error".to_string());
        anyhow::bail!("Erro ao salvar lote: {}", error);
    };

    match (&created.lote, json) {
        (Some(lote), true) => println!("{}", serde_json::to_string_pretty(lote)?),
        (Some(lote), false) => println!("Lote {} criado.", lote.codigo),
        (None, _) => println!("Lote criado."),
    }
    Ok(())
}

/// DELETE: answer the confirmation dialog and delete.
///
/// Success is decided by the delete itself. A refetch that fails afterwards
/// is only a warning: the batch is gone either way.
pub async fn delete(flux: &Flux, codigo: &str, confirmation: Confirmation) -> Result<()> {
    flux.emit(
        DeleteReq::PATH,
        DeleteReq {
            codigo: Codigo::new(codigo),
            confirmation,
        },
    )
    .await;

    let result = flux
        .get_as::<LoteDeleted>(LoteDeleted::PATH)
        .ok_or_else(|| anyhow::anyhow!("delete of {} was not handled", codigo))?;

    match result.outcome {
        DeleteOutcome::Cancelled => println!("Cancelado."),
        DeleteOutcome::Failed => anyhow::bail!(
            "Erro ao excluir lote: {}",
            result.error.unwrap_or_else(|| "unknown error".to_string())
        ),
        DeleteOutcome::Deleted => {
            println!("Lote {} excluído.", codigo);
            if let Some(error) = lotes_state(flux).ok().and_then(|s| s.error) {
                eprintln!("Aviso: a lista não pôde ser atualizada: {}", error);
            }
        }
    }
    Ok(())
}

fn print_lotes(state: &LotesState, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&state.items)?);
        return Ok(());
    }
    print!("{}", render_table(&state.items));
    if state.query.is_empty() {
        println!("{} lote(s)", state.total);
    } else {
        println!("{} de {} lote(s) com código contendo \"{}\"", state.items.len(), state.total, state.query);
    }
    Ok(())
}

/// Plain text table: code, name, expiry in `DD/MM/YYYY`.
pub fn render_table(lotes: &[Lote]) -> String {
    let header = ["CÓDIGO", "NOME", "VALIDADE"];
    let rows: Vec<[String; 3]> = lotes
        .iter()
        .map(|l| [l.codigo.to_string(), l.nome.clone(), l.validade.to_pt_br()])
        .collect();

    let mut widths = header.map(|h| h.chars().count());
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |cells: [&str; 3]| {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths)
            .map(|(c, w)| format!("{}{}", c, " ".repeat(w - c.chars().count())))
            .collect();
        format!("{}\n", padded.join("  ").trim_end())
    };

    let mut out = line(header);
    for row in &rows {
        out.push_str(&line([&row[0], &row[1], &row[2]]));
    }
    out
}
