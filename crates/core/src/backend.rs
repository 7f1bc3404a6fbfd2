//! Seam between the intake session and the Kardex REST backend.
//!
//! The HTTP implementation lives in the `kardex-api-client` crate; tests use in-memory
//! implementations.

use crate::lookup::LookupKind;
use crate::record::SelectOption;
use crate::submission::{FormResponse, MarkReceivedRequest, MarkReceivedResponse};
use crate::KardexResult;
use async_trait::async_trait;
use kardex_types::NonEmptyText;
use serde_json::Value;

#[async_trait]
pub trait KardexBackend: Send + Sync {
    /// Free-text record search. Returns the raw hits, with either list envelope flattened.
    async fn lookup(&self, kind: LookupKind, term: &NonEmptyText) -> KardexResult<Vec<Value>>;

    /// Fetch one record with its intake and patient.
    async fn fetch_ficha(&self, ficha_id: i64) -> KardexResult<Value>;

    /// Search movements awaiting reception. The backend already formats the options.
    async fn search_receptions(&self, term: &NonEmptyText) -> KardexResult<Vec<SelectOption>>;

    /// Fetch one movement awaiting reception.
    async fn fetch_reception(&self, movement_id: i64) -> KardexResult<Value>;

    /// Mark a movement as received.
    async fn mark_received(
        &self,
        movement_id: i64,
        request: &MarkReceivedRequest,
        csrf_token: &str,
    ) -> KardexResult<MarkReceivedResponse>;

    /// POST form data (already carrying the CSRF token) to `action`.
    async fn submit_form(&self, action: &str, data: &[(String, String)])
        -> KardexResult<FormResponse>;
}
