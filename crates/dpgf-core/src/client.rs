//! Typed DPGF API client
//!
//! The client turns [`Endpoint`]s into requests, hands them to a
//! [`Transport`], decodes the answers and keeps an optional shared
//! [`QueryCache`] coherent: reads are served from fresh entries and stored
//! after fetching, successful mutations invalidate what they affect.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use dpgf_types::{
    Client, DocumentSummary, DpgfStructure, ElementRow, ElementWithSection,
    HistoricalPriceAnalysis, LotRow, NewClient, NewDocument, SectionRow,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::accessor;
use crate::cache::{Lookup, QueryCache, QueryKey};
use crate::config::AppConfig;
use crate::endpoint::{ApiRequest, ApiResponse, Body, Endpoint, Page, UPLOAD_FIELD};
use crate::error::{DpgfError, Result};
use crate::normalize::{normalize_all, RawSearchHit};
use crate::query::RetryPolicy;
use crate::search::{SearchOutput, SearchRequest};

/// Something that can carry an [`ApiRequest`] to the backend
///
/// The browser implementation uses `fetch`; tests use an in-memory fake.
/// Futures are not required to be `Send`, the front-end is single-threaded.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse>;

    /// Wait before a retry
    async fn delay(&self, duration: Duration);
}

/// Writes the client can perform and the cache keys they invalidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    CreateClient,
    CreateDocument,
    Upload,
}

impl Mutation {
    pub fn invalidates(&self) -> QueryKey {
        match self {
            Mutation::CreateClient => QueryKey::clients(),
            Mutation::CreateDocument | Mutation::Upload => QueryKey::documents(),
        }
    }

    fn endpoint(&self) -> Endpoint {
        match self {
            Mutation::CreateClient => Endpoint::CreateClient,
            Mutation::CreateDocument => Endpoint::CreateDocument,
            Mutation::Upload => Endpoint::Upload,
        }
    }
}

/// Outcome of the connectivity probe
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProbeStatus {
    Success { data: Value },
    Error { error: String },
}

/// Reject anything but an `.xlsx` file name before touching the network
pub fn validate_upload_name(file_name: &str) -> Result<()> {
    let is_xlsx = file_name
        .rsplit_once('.')
        .map(|(stem, ext)| !stem.is_empty() && ext.eq_ignore_ascii_case("xlsx"))
        .unwrap_or(false);
    if is_xlsx {
        Ok(())
    } else {
        Err(DpgfError::UnsupportedFile(file_name.to_string()))
    }
}

pub struct DpgfClient<T> {
    transport: T,
    base_url: String,
    read_policy: RetryPolicy,
    page_size: u32,
    cache: Option<Rc<RefCell<QueryCache>>>,
}

impl<T: Transport> DpgfClient<T> {
    pub fn new(transport: T, config: &AppConfig) -> Self {
        Self {
            transport,
            base_url: config.api.base_url.clone(),
            read_policy: config.retry.read_policy(),
            page_size: config.pagination.page_size,
            cache: None,
        }
    }

    /// Share `cache` between this client and its callers
    pub fn with_cache(mut self, cache: Rc<RefCell<QueryCache>>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // ---- reads ----

    pub async fn probe(&self) -> ProbeStatus {
        match self.fetch_with(&Endpoint::Probe, self.read_policy).await {
            Ok(response) => ProbeStatus::Success {
                data: serde_json::from_str(&response.body)
                    .unwrap_or(Value::String(response.body)),
            },
            Err(err) => ProbeStatus::Error {
                error: err.to_string(),
            },
        }
    }

    pub async fn clients(&self) -> Result<Arc<Vec<Client>>> {
        self.load(&Endpoint::ListClients).await
    }

    pub async fn documents(&self, page: Page) -> Result<Arc<Vec<DocumentSummary>>> {
        self.load(&Endpoint::ListDocuments(page)).await
    }

    /// Every document, fetched page by page until a short page
    pub async fn fetch_all_documents(&self) -> Result<Vec<DocumentSummary>> {
        let mut page = Page::first(self.page_size);
        let mut all = Vec::new();
        loop {
            let batch = self.documents(page).await?;
            all.extend(batch.iter().cloned());
            if batch.len() < page.limit as usize {
                break;
            }
            page = page.next();
        }
        debug!(count = all.len(), "fetched all documents");
        Ok(all)
    }

    pub async fn document(&self, id: i64) -> Result<Arc<DocumentSummary>> {
        self.load(&Endpoint::Document(id)).await
    }

    pub async fn structure(&self, id: i64) -> Result<Arc<DpgfStructure>> {
        self.load(&Endpoint::DocumentStructure(id)).await
    }

    pub async fn elements(&self, limit: u32) -> Result<Arc<Vec<ElementRow>>> {
        self.load(&Endpoint::ListElements { limit }).await
    }

    pub async fn lots_of(&self, dpgf_id: i64) -> Result<Arc<Vec<LotRow>>> {
        self.load(&Endpoint::LotsOf(dpgf_id)).await
    }

    pub async fn sections_of(&self, lot_id: i64) -> Result<Arc<Vec<SectionRow>>> {
        self.load(&Endpoint::SectionsOf(lot_id)).await
    }

    pub async fn elements_of(&self, section_id: i64) -> Result<Arc<Vec<ElementRow>>> {
        self.load(&Endpoint::ElementsOf(section_id)).await
    }

    pub async fn elements_with_sections(
        &self,
        dpgf_id: Option<i64>,
        section_id: Option<i64>,
    ) -> Result<Arc<Vec<ElementWithSection>>> {
        self.load(&Endpoint::ElementsWithSections {
            dpgf_id,
            section_id,
        })
        .await
    }

    pub async fn units(&self) -> Result<Arc<Vec<String>>> {
        self.load(&Endpoint::Units).await
    }

    /// Run a search and normalize its rows
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchOutput> {
        let key = request.query_key();
        if let Some(hit) = self.cached::<SearchOutput>(&key) {
            return Ok((*hit).clone());
        }

        let response = self.fetch_with(&request.endpoint(), self.read_policy).await?;
        let output = match request.source_kind() {
            Some(kind) => {
                let rows: Vec<Value> = decode_or_empty(&response.body)?;
                let hits = rows
                    .into_iter()
                    .map(|row| RawSearchHit::from_value(kind, row))
                    .collect::<serde_json::Result<Vec<_>>>()?;
                SearchOutput::Results {
                    results: normalize_all(hits),
                }
            }
            None => {
                let analysis: Option<HistoricalPriceAnalysis> = decode_or_empty(&response.body)?;
                SearchOutput::Analysis {
                    analysis: Box::new(analysis.unwrap_or_default()),
                }
            }
        };

        self.store(key, Arc::new(output.clone()));
        Ok(output)
    }

    // ---- mutations ----

    pub async fn create_client(&self, client: &NewClient) -> Result<Client> {
        self.mutate(Mutation::CreateClient, Body::Json(serde_json::to_value(client)?))
            .await
    }

    pub async fn create_document(&self, document: &NewDocument) -> Result<DocumentSummary> {
        self.mutate(Mutation::CreateDocument, Body::Json(serde_json::to_value(document)?))
            .await
    }

    /// Upload a spreadsheet; the backend answers with the created document
    pub async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<Value> {
        validate_upload_name(file_name)?;
        self.mutate(
            Mutation::Upload,
            Body::Multipart {
                field: UPLOAD_FIELD,
                file_name: file_name.to_string(),
                bytes,
            },
        )
        .await
    }

    async fn mutate<R: DeserializeOwned>(&self, mutation: Mutation, body: Body) -> Result<R> {
        let request = ApiRequest::new(&self.base_url, &mutation.endpoint(), body);
        let response = self.send_checked(&request).await?;
        let created = serde_json::from_str(&response.body)?;

        let key = mutation.invalidates();
        info!(?mutation, invalidates = %key, "mutation succeeded");
        if let Some(cache) = &self.cache {
            cache.borrow_mut().invalidate(&key);
        }
        Ok(created)
    }

    // ---- plumbing ----

    /// Fresh cache entry or a fetch that refreshes it
    async fn load<R>(&self, endpoint: &Endpoint) -> Result<Arc<R>>
    where
        R: DeserializeOwned + Send + Sync + 'static,
    {
        let key = endpoint.query_key();
        if let Some(hit) = key.as_ref().and_then(|k| self.cached::<R>(k)) {
            return Ok(hit);
        }

        let response = self.fetch_with(endpoint, self.read_policy).await?;
        let value: Arc<R> = Arc::new(serde_json::from_str(&response.body)?);
        if let Some(key) = key {
            self.store(key, Arc::clone(&value));
        }
        Ok(value)
    }

    fn cached<R: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Arc<R>> {
        let cache = self.cache.as_ref()?;
        match cache.borrow().get::<R>(key) {
            Lookup::Fresh(value) => {
                debug!(%key, "cache hit");
                Some(value)
            }
            _ => None,
        }
    }

    fn store<R: Send + Sync + 'static>(&self, key: QueryKey, value: Arc<R>) {
        if let Some(cache) = &self.cache {
            cache.borrow_mut().set(key, value);
        }
    }

    async fn fetch_with(&self, endpoint: &Endpoint, policy: RetryPolicy) -> Result<ApiResponse> {
        let request = ApiRequest::new(&self.base_url, endpoint, Body::Empty);
        let mut attempt = 0;
        loop {
            match self.send_checked(&request).await {
                Ok(response) => return Ok(response),
                Err(err) if policy.should_retry(attempt, &err) => {
                    warn!(url = %request.url, attempt, error = %err, "request failed, retrying");
                    self.transport.delay(policy.delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn send_checked(&self, request: &ApiRequest) -> Result<ApiResponse> {
        debug!(method = request.method.as_str(), url = %request.url, "sending request");
        let response = self.transport.send(request).await?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(DpgfError::Status {
                status: response.status,
                message: error_message(&response.body),
            })
        }
    }
}

/// Human-readable message out of an error body (`{"detail": ...}` or raw text)
fn error_message(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(json) => {
            let missing = Value::Null;
            match accessor::get(&json, "detail", &missing) {
                Value::String(s) => s.clone(),
                Value::Null => body.trim().to_string(),
                other => other.to_string(),
            }
        }
        Err(_) => body.trim().to_string(),
    }
}

/// Decode a body where an empty answer or `null` means "nothing"
fn decode_or_empty<R: DeserializeOwned + Default>(body: &str) -> Result<R> {
    if body.trim().is_empty() {
        return Ok(R::default());
    }
    let value: Value = serde_json::from_str(body)?;
    if value.is_null() {
        return Ok(R::default());
    }
    Ok(serde_json::from_value(value)?)
}
