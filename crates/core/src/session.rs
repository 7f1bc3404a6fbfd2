//! Intake session: the form plus everything that talks to the backend on its behalf.
//!
//! One session owns one form. Searches take `&self` so that several can be in flight at
//! once; their responses are sequenced so that only the latest is shown. Everything that
//! mutates the form takes `&mut self` and only touches the form once the backend call it
//! depends on has succeeded.

use crate::backend::KardexBackend;
use crate::config::CoreConfig;
use crate::fields::FieldId;
use crate::form::PatientForm;
use crate::hydration::{hydrate_ficha, FichaSummary};
use crate::lookup::{candidate_option, LookupKind, RequestSequencer, RutScan, SearchOutcome};
use crate::record::{FichaRecord, ReceptionRecord};
use crate::rules::{self, FieldState};
use crate::submission::{MarkReceivedRequest, MarkReceivedResponse, SubmitOutcome};
use crate::validation::check_before_submit;
use crate::{KardexError, KardexResult};
use kardex_types::NonEmptyText;
use serde_json::Value;
use std::sync::Arc;

pub struct IntakeSession<B> {
    backend: B,
    cfg: Arc<CoreConfig>,
    form: PatientForm,
    search_sequencer: RequestSequencer,
    reception_sequencer: RequestSequencer,
    rut_scan: RutScan,
    current: Option<FichaSummary>,
    reception: Option<ReceptionRecord>,
}

impl<B: KardexBackend> IntakeSession<B> {
    /// Start a session with an empty form in its initial rule state.
    pub fn new(backend: B, cfg: Arc<CoreConfig>) -> Self {
        let form = PatientForm::initialised(cfg.registry().clone());
        Self {
            backend,
            cfg,
            form,
            search_sequencer: RequestSequencer::new(),
            reception_sequencer: RequestSequencer::new(),
            rut_scan: RutScan::new(),
            current: None,
            reception: None,
        }
    }

    pub fn form(&self) -> &PatientForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut PatientForm {
        &mut self.form
    }

    /// The record currently loaded into the form, if any.
    pub fn current(&self) -> Option<&FichaSummary> {
        self.current.as_ref()
    }

    /// The movement currently selected for reception, if any.
    pub fn reception(&self) -> Option<&ReceptionRecord> {
        self.reception.as_ref()
    }

    /// Search records for the dropdown.
    ///
    /// A blank term issues no request but still supersedes searches in flight. Failed
    /// lookups are logged and returned; the form is never touched.
    pub async fn search(&self, kind: LookupKind, term: &str) -> KardexResult<SearchOutcome> {
        let ticket = self.search_sequencer.issue();
        let Ok(term) = NonEmptyText::new(term) else {
            return Ok(SearchOutcome::Current(Vec::new()));
        };

        let result = self.backend.lookup(kind, &term).await;
        if !self.search_sequencer.is_latest(ticket) {
            tracing::debug!(
                ticket = ticket.sequence(),
                "discarding superseded search response"
            );
            return Ok(SearchOutcome::Superseded);
        }

        let hits = result.inspect_err(|err| {
            tracing::warn!(%kind, %term, "record lookup failed: {err}");
        })?;
        let path = self.cfg.patient_path();
        let options = hits
            .iter()
            .filter_map(|hit| candidate_option(kind, hit, path))
            .collect();
        Ok(SearchOutcome::Current(options))
    }

    /// Fetch a record and hydrate the form from it.
    ///
    /// If the fetch fails or the response cannot be decoded the form is left exactly as
    /// it was.
    pub async fn select(&mut self, ficha_id: i64) -> KardexResult<FichaSummary> {
        let value = self.backend.fetch_ficha(ficha_id).await.inspect_err(|err| {
            tracing::warn!(ficha_id, "record fetch failed: {err}");
        })?;
        let ficha = FichaRecord::from_value(&value, self.cfg.patient_path())?;

        let summary = hydrate_ficha(&ficha, &mut self.form);
        tracing::info!(
            ficha_id,
            written = summary.report.written.len(),
            "record loaded into form"
        );
        self.current = Some(summary.clone());
        Ok(summary)
    }

    /// Search by `kind` and load the first hit into the form, as a page preloaded with a
    /// RUT or patient code does.
    ///
    /// # Errors
    ///
    /// Returns [`KardexError::InvalidInput`] for a blank term, [`KardexError::NotFound`]
    /// if nothing matches, or the backend error if the lookup or fetch fails. The form is
    /// unchanged in every error case.
    pub async fn load_first(&mut self, kind: LookupKind, term: &str) -> KardexResult<FichaSummary> {
        let term = NonEmptyText::new(term)
            .map_err(|err| KardexError::InvalidInput(format!("{kind} search: {err}")))?;
        tracing::info!(%kind, %term, "loading first match");

        let hits = self.backend.lookup(kind, &term).await.inspect_err(|err| {
            tracing::warn!(%kind, %term, "record lookup failed: {err}");
        })?;
        let Some(ficha_id) = hits.first().and_then(|hit| hit.get("id")).and_then(Value::as_i64)
        else {
            tracing::info!(%kind, %term, "no record found");
            return Err(KardexError::NotFound {
                kind: kind.to_string(),
                term: term.to_string(),
            });
        };

        self.select(ficha_id).await
    }

    /// Handle a scanned or typed RUT: look it up and load the first matching record.
    ///
    /// Returns `Ok(None)` when the value is blank or repeats the previous scan. Any
    /// failure forgets the scan so the same RUT can be retried.
    ///
    /// # Errors
    ///
    /// See [`IntakeSession::load_first`].
    pub async fn scan_rut(&mut self, raw: &str) -> KardexResult<Option<FichaSummary>> {
        let Some(rut) = self.rut_scan.accept(raw) else {
            return Ok(None);
        };
        match self.load_first(LookupKind::Rut, rut.as_str()).await {
            Ok(summary) => Ok(Some(summary)),
            Err(err) => {
                self.rut_scan.reset();
                Err(err)
            }
        }
    }

    /// Toggle a status flag checkbox and re-apply the field rules.
    pub fn set_flag(&mut self, flag: FieldId, checked: bool) -> KardexResult<FieldState> {
        if !flag.is_flag() {
            return Err(KardexError::InvalidInput(format!(
                "'{flag}' is not a patient status flag"
            )));
        }
        self.form.set_checked(flag, checked);
        Ok(rules::apply_rules(&mut self.form))
    }

    /// Validate and submit the form to `action`.
    ///
    /// Client-side checks run first; a failure focuses the offending control and returns
    /// [`KardexError::Submission`] without contacting the backend. Server-side field errors
    /// are attached to their controls.
    pub async fn submit(&mut self, action: &str, csrf_token: &str) -> KardexResult<SubmitOutcome> {
        check_before_submit(&mut self.form)?;

        let data = self.form.form_data(csrf_token);
        tracing::info!(action, fields = data.len(), "submitting intake form");
        let response = self.backend.submit_form(action, &data).await?;

        let outcome = response.resolve(&mut self.form);
        if let SubmitOutcome::Rejected { message, .. } = &outcome {
            tracing::info!(?message, "intake form rejected by server");
        }
        Ok(outcome)
    }

    /// Search movements awaiting reception.
    pub async fn search_receptions(&self, term: &str) -> KardexResult<SearchOutcome> {
        let ticket = self.reception_sequencer.issue();
        let Ok(term) = NonEmptyText::new(term) else {
            return Ok(SearchOutcome::Current(Vec::new()));
        };

        let result = self.backend.search_receptions(&term).await;
        if !self.reception_sequencer.is_latest(ticket) {
            return Ok(SearchOutcome::Superseded);
        }
        let options = result.inspect_err(|err| {
            tracing::warn!(%term, "reception search failed: {err}");
        })?;
        Ok(SearchOutcome::Current(options))
    }

    /// Select a movement for reception.
    pub async fn select_reception(&mut self, movement_id: i64) -> KardexResult<ReceptionRecord> {
        let value = self.backend.fetch_reception(movement_id).await?;
        let record = ReceptionRecord::from_value(&value)?;
        self.reception = Some(record.clone());
        Ok(record)
    }

    /// Mark the selected movement as received.
    ///
    /// # Errors
    ///
    /// Returns [`KardexError::NoMovementSelected`] if no movement was selected and
    /// [`KardexError::Rejected`] if the backend answers `ok: false`.
    pub async fn receive(
        &mut self,
        request: &MarkReceivedRequest,
        csrf_token: &str,
    ) -> KardexResult<MarkReceivedResponse> {
        let movement_id = self
            .reception
            .as_ref()
            .map(|r| r.movement_id)
            .ok_or(KardexError::NoMovementSelected)?;

        let response = self
            .backend
            .mark_received(movement_id, request, csrf_token)
            .await?;
        if !response.ok {
            let message = response
                .error
                .clone()
                .unwrap_or_else(|| "could not register the reception".to_string());
            return Err(KardexError::Rejected(message));
        }

        tracing::info!(movement_id, "movement marked as received");
        self.reception = None;
        Ok(response)
    }
}
