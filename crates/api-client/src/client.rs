//! [`KardexBackend`] over HTTP.
//!
//! Every request carries `X-Requested-With: XMLHttpRequest` so the backend answers with
//! JSON envelopes instead of redirects. POST bodies are form-encoded with the CSRF token
//! as the first field, matching what a browser form submission sends.

use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use kardex_core::constants::{
    CSRF_FIELD_NAME, FICHA_ENDPOINT, MARK_RECEIVED_ACTION, RECEPTION_ENDPOINT,
    REQUESTED_WITH_HEADER, REQUESTED_WITH_VALUE,
};
use kardex_core::record::LookupResponse;
use kardex_core::{
    CoreConfig, FormResponse, KardexBackend, KardexError, KardexResult, LookupKind,
    MarkReceivedRequest, MarkReceivedResponse, SelectOption,
};
use kardex_types::NonEmptyText;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: Client,
    cfg: Arc<CoreConfig>,
}

impl HttpBackend {
    /// Build a backend with its own connection pool.
    pub fn new(cfg: Arc<CoreConfig>) -> ClientResult<Self> {
        let client = Client::builder().build().map_err(ClientError::Build)?;
        Ok(Self::with_client(client, cfg))
    }

    pub fn with_client(client: Client, cfg: Arc<CoreConfig>) -> Self {
        Self { client, cfg }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    fn get(&self, url: &str) -> RequestBuilder {
        tracing::debug!(url, "GET");
        self.client
            .get(url)
            .header(REQUESTED_WITH_HEADER, REQUESTED_WITH_VALUE)
    }

    fn post(&self, url: &str) -> RequestBuilder {
        tracing::debug!(url, "POST");
        self.client
            .post(url)
            .header(REQUESTED_WITH_HEADER, REQUESTED_WITH_VALUE)
    }

    fn lookup_request(&self, kind: LookupKind, term: &NonEmptyText) -> RequestBuilder {
        self.get(&self.cfg.api_url(FICHA_ENDPOINT))
            .query(&[("search", term.as_str()), ("tipo", kind.as_query_value())])
    }

    fn ficha_url(&self, ficha_id: i64) -> String {
        self.cfg.api_url(&format!("{FICHA_ENDPOINT}{ficha_id}/"))
    }

    fn reception_search_request(&self, term: &NonEmptyText) -> RequestBuilder {
        self.get(&self.cfg.api_url(RECEPTION_ENDPOINT))
            .query(&[("search", term.as_str())])
    }

    fn reception_url(&self, movement_id: i64) -> String {
        self.cfg
            .api_url(&format!("{RECEPTION_ENDPOINT}{movement_id}/"))
    }

    fn mark_received_request(
        &self,
        movement_id: i64,
        request: &MarkReceivedRequest,
        csrf_token: &str,
    ) -> RequestBuilder {
        let url = self.cfg.api_url(&format!(
            "{RECEPTION_ENDPOINT}{movement_id}/{MARK_RECEIVED_ACTION}"
        ));
        let mut pairs = vec![(CSRF_FIELD_NAME, csrf_token.to_string())];
        pairs.extend(request.form_pairs());
        self.post(&url).form(&pairs)
    }

    /// Form actions are usually site-relative (`/kardex/...`); absolute URLs are used as is.
    fn action_url(&self, action: &str) -> String {
        if action.starts_with("http://") || action.starts_with("https://") {
            action.to_string()
        } else {
            self.cfg.api_url(action)
        }
    }
}

/// Decode a successful JSON response. 404 is reported separately so callers can tell a
/// missing record from a failing backend.
async fn read_json<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let status = response.status();
    let url = response.url().to_string();
    if status == StatusCode::NOT_FOUND {
        return Err(ClientError::NotFound { url });
    }
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ClientError::status(status.as_u16(), url, &body));
    }
    serde_json::from_str(&body).map_err(|source| ClientError::Decode { url, source })
}

/// Decode a JSON envelope whatever the status; form views answer validation failures with
/// 400 and a normal envelope. Only an undecodable error response is a transport error.
async fn read_envelope<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let status = response.status();
    let url = response.url().to_string();
    let body = response.text().await?;
    match serde_json::from_str(&body) {
        Ok(envelope) => Ok(envelope),
        Err(_) if !status.is_success() => Err(ClientError::status(status.as_u16(), url, &body)),
        Err(source) => Err(ClientError::Decode { url, source }),
    }
}

#[async_trait]
impl KardexBackend for HttpBackend {
    async fn lookup(&self, kind: LookupKind, term: &NonEmptyText) -> KardexResult<Vec<Value>> {
        let response = self.lookup_request(kind, term).send().await.map_err(ClientError::from)?;
        let hits: LookupResponse<Value> = read_json(response).await?;
        Ok(hits.into_items())
    }

    async fn fetch_ficha(&self, ficha_id: i64) -> KardexResult<Value> {
        let response = self
            .get(&self.ficha_url(ficha_id))
            .send()
            .await
            .map_err(ClientError::from)?;
        match read_json(response).await {
            Err(ClientError::NotFound { .. }) => Err(KardexError::NotFound {
                kind: LookupKind::Ficha.to_string(),
                term: ficha_id.to_string(),
            }),
            other => Ok(other?),
        }
    }

    async fn search_receptions(&self, term: &NonEmptyText) -> KardexResult<Vec<SelectOption>> {
        let response = self
            .reception_search_request(term)
            .send()
            .await
            .map_err(ClientError::from)?;
        let options: LookupResponse<SelectOption> = read_json(response).await?;
        Ok(options.into_items())
    }

    async fn fetch_reception(&self, movement_id: i64) -> KardexResult<Value> {
        let response = self
            .get(&self.reception_url(movement_id))
            .send()
            .await
            .map_err(ClientError::from)?;
        match read_json(response).await {
            Err(ClientError::NotFound { .. }) => Err(KardexError::NotFound {
                kind: "movement".to_string(),
                term: movement_id.to_string(),
            }),
            other => Ok(other?),
        }
    }

    async fn mark_received(
        &self,
        movement_id: i64,
        request: &MarkReceivedRequest,
        csrf_token: &str,
    ) -> KardexResult<MarkReceivedResponse> {
        let response = self
            .mark_received_request(movement_id, request, csrf_token)
            .send()
            .await
            .map_err(ClientError::from)?;
        Ok(read_envelope(response).await?)
    }

    async fn submit_form(
        &self,
        action: &str,
        data: &[(String, String)],
    ) -> KardexResult<FormResponse> {
        let response = self
            .post(&self.action_url(action))
            .form(data)
            .send()
            .await
            .map_err(ClientError::from)?;
        Ok(read_envelope(response).await?)
    }
}
