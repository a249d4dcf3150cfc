//! WASM front-end for DPGF cost documents
//!
//! All state lives in Rust: the query cache, the open document and its
//! derived views, and the debounced search sessions. The page shell only
//! mounts markup from the JSON view models and forwards DOM events.
//!
//! Pages arrive as `{"kind": "view", "view": ...}`, or as
//! `{"kind": "fallback", "fallback": ...}` when a view could not be built.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { DpgfApp } from './pkg/dpgf_wasm.js';
//!
//! await init();
//! const app = new DpgfApp(configToml);
//!
//! const page = JSON.parse(await app.loadDocument(42));
//! const table = JSON.parse(app.documentView("table")).view;
//!
//! app.subscribe("dpgfs", () => refreshDashboard());
//! app.upload(file.name, new Uint8Array(await file.arrayBuffer()), (err, doc) => { ... });
//!
//! const search = app.searchSession("fuzzy");
//! search.setListener(json => render(JSON.parse(json)));
//! input.oninput = e => search.input(e.target.value);
//! ```

pub mod boundary;
pub mod console;
pub mod dashboard;
pub mod document_view;
pub mod element_card;
pub mod format;
pub mod search_panel;
pub mod timer;
pub mod transport;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use dpgf_core::cache::SubscriptionId;
use dpgf_core::{
    AppConfig, DpgfClient, DpgfError, Page, ProbeStatus, QueryCache, QueryKey, QueryState,
    Route, SearchVariant,
};
use dpgf_types::DocumentSummary;
use js_sys::Promise;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use crate::document_view::Applied;

pub use dashboard::{ClientForm, Dashboard, DocumentForm};
pub use document_view::{DocumentPage, DocumentSlot, DocumentView, ViewMode};
pub use search_panel::{SearchPanel, SearchSession, SearchView};
pub use transport::FetchTransport;

/// Initialize the WASM module
/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Get the library version
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Resolve a location path to the page to show
#[wasm_bindgen(js_name = resolveRoute)]
pub fn resolve_route(location: &str) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&Route::parse(location))
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

struct AppState {
    config: AppConfig,
    cache: Rc<RefCell<QueryCache>>,
    client: Rc<DpgfClient<FetchTransport>>,
    document: RefCell<DocumentSlot>,
    mode: RefCell<ViewMode>,
    subscriptions: RefCell<HashMap<u32, SubscriptionId>>,
    next_subscription: RefCell<u32>,
}

/// Entry point of the front-end
#[wasm_bindgen]
pub struct DpgfApp {
    state: Rc<AppState>,
}

#[wasm_bindgen]
impl DpgfApp {
    /// Create the app from an optional TOML configuration
    #[wasm_bindgen(constructor)]
    pub fn new(config_toml: Option<String>) -> Result<DpgfApp, JsValue> {
        let config = match config_toml.as_deref().map(str::trim) {
            Some(toml) if !toml.is_empty() => {
                AppConfig::from_str(toml).map_err(|e| JsValue::from_str(&format!("{:#}", e)))?
            }
            _ => AppConfig::default(),
        };
        console::log(&format!("DPGF front-end using API at {}", config.api.base_url));

        let cache = Rc::new(RefCell::new(QueryCache::new()));
        let client =
            DpgfClient::new(FetchTransport::new(), &config).with_cache(Rc::clone(&cache));

        Ok(DpgfApp {
            state: Rc::new(AppState {
                config,
                cache,
                client: Rc::new(client),
                document: RefCell::new(DocumentSlot::new()),
                mode: RefCell::new(ViewMode::default()),
                subscriptions: RefCell::new(HashMap::new()),
                next_subscription: RefCell::new(0),
            }),
        })
    }

    #[wasm_bindgen(getter, js_name = baseUrl)]
    pub fn base_url(&self) -> String {
        self.state.client.base_url().to_string()
    }

    // ---- dashboard ----

    /// First page of documents as a `QueryState<Dashboard>` JSON
    #[wasm_bindgen(js_name = loadDashboard)]
    pub fn load_dashboard(&self) -> Promise {
        let state = Rc::clone(&self.state);
        future_to_promise(async move {
            let page = Page::first(state.config.pagination.page_size);
            let result = state.client.documents(page).await;

            let query = QueryState::from_result(result, |docs| docs.is_empty(), "Aucun DPGF")
                .map(|docs: Arc<Vec<DocumentSummary>>| Dashboard::new(&docs));
            Ok(JsValue::from_str(&boundary::view_json(&query)))
        })
    }

    /// Client picker options as JSON
    #[wasm_bindgen(js_name = loadClients)]
    pub fn load_clients(&self) -> Promise {
        let state = Rc::clone(&self.state);
        future_to_promise(async move {
            let clients = state.client.clients().await.map_err(to_js)?;
            Ok(JsValue::from_str(&to_json(&dashboard::client_options(&clients))))
        })
    }

    /// Create a client; `callback(error, client)` runs once the server answers
    #[wasm_bindgen(js_name = createClient)]
    pub fn create_client(&self, name: &str, callback: js_sys::Function) -> Result<(), JsValue> {
        let new_client = ClientForm {
            name: name.to_string(),
        }
        .validate()
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let client = Rc::clone(&self.state.client);
        wasm_bindgen_futures::spawn_local(async move {
            let result = client.create_client(&new_client).await;
            complete(&callback, result);
        });
        Ok(())
    }

    /// Create an empty document; `callback(error, document)` runs on completion
    #[wasm_bindgen(js_name = createDocument)]
    pub fn create_document(
        &self,
        project_name: &str,
        date: &str,
        client_id: &str,
        callback: js_sys::Function,
    ) -> Result<(), JsValue> {
        let document = DocumentForm {
            project_name: project_name.to_string(),
            date: date.to_string(),
            client_id: client_id.to_string(),
        }
        .validate()
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let client = Rc::clone(&self.state.client);
        wasm_bindgen_futures::spawn_local(async move {
            let result = client.create_document(&document).await;
            complete(&callback, result);
        });
        Ok(())
    }

    /// Upload an `.xlsx` file; rejected synchronously for any other name
    pub fn upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        callback: js_sys::Function,
    ) -> Result<(), JsValue> {
        dpgf_core::client::validate_upload_name(file_name).map_err(to_js)?;

        let client = Rc::clone(&self.state.client);
        let file_name = file_name.to_string();
        wasm_bindgen_futures::spawn_local(async move {
            let result = client.upload(&file_name, bytes).await;
            complete(&callback, result);
        });
        Ok(())
    }

    // ---- document ----

    /// Fetch a document structure and return its page JSON in the current mode
    ///
    /// Only the most recent load updates the open document. A superseded
    /// load resolves with the page of whatever is current by then.
    #[wasm_bindgen(js_name = loadDocument)]
    pub fn load_document(&self, id: i64) -> Promise {
        let state = Rc::clone(&self.state);
        let ticket = state.document.borrow_mut().begin(id);
        future_to_promise(async move {
            let outcome = state.client.structure(id).await;
            let applied = state.document.borrow_mut().resolve(&ticket, outcome);
            let page = match applied {
                Applied::Opened | Applied::Stale => render_document(&state),
                Applied::Failed(err) => {
                    console::error(&format!("Erreur lors du chargement du DPGF {}: {}", id, err));
                    boundary::view_json(&DocumentPage::from_error(&err))
                }
            };
            Ok(JsValue::from_str(&page))
        })
    }

    /// Switch between `"hierarchy"` and `"table"` and return the page JSON
    #[wasm_bindgen(js_name = documentView)]
    pub fn document_view(&self, mode: &str) -> Result<String, JsValue> {
        let mode = ViewMode::parse(mode)
            .ok_or_else(|| JsValue::from_str(&format!("Mode d'affichage inconnu: {}", mode)))?;
        *self.state.mode.borrow_mut() = mode;
        Ok(render_document(&self.state))
    }

    /// Drop the open document and its derived views
    #[wasm_bindgen(js_name = closeDocument)]
    pub fn close_document(&self) {
        self.state.document.borrow_mut().close();
    }

    // ---- cache ----

    /// Call `callback(event)` whenever a query under `key` changes
    ///
    /// `key` is a `/`-separated query key such as `dpgfs` or
    /// `dpgf_structure/42`. Returns a handle for `unsubscribe`.
    pub fn subscribe(&self, key: &str, callback: js_sys::Function) -> u32 {
        let key = QueryKey::new(key.split('/').filter(|part| !part.is_empty()));
        let id = self.state.cache.borrow_mut().subscribe(key, move |event| {
            let payload = JsValue::from_str(&event.key().to_string());
            let callback = callback.clone();
            // deliver after the current mutation releases the cache
            wasm_bindgen_futures::spawn_local(async move {
                if let Err(e) = callback.call1(&JsValue::NULL, &payload) {
                    console::error(&format!("cache subscriber failed: {:?}", e));
                }
            });
        });

        let mut next = self.state.next_subscription.borrow_mut();
        *next += 1;
        self.state.subscriptions.borrow_mut().insert(*next, id);
        *next
    }

    pub fn unsubscribe(&self, handle: u32) -> bool {
        match self.state.subscriptions.borrow_mut().remove(&handle) {
            Some(id) => self.state.cache.borrow_mut().unsubscribe(id),
            None => false,
        }
    }

    /// Mark every cached query under `key` stale
    pub fn invalidate(&self, key: &str) -> usize {
        let key = QueryKey::new(key.split('/').filter(|part| !part.is_empty()));
        self.state.cache.borrow_mut().invalidate(&key)
    }

    // ---- search ----

    /// Start a search box: `"fuzzy"`, `"analysis"`, `"price"` or `"simple"`
    #[wasm_bindgen(js_name = searchSession)]
    pub fn search_session(&self, kind: &str, unit: Option<String>) -> Result<SearchSession, JsValue> {
        let settings = self.state.config.search.clone();
        let variant = match kind {
            "fuzzy" => SearchVariant::fuzzy(&settings),
            "analysis" => SearchVariant::PriceAnalysis,
            "price" => SearchVariant::similar_price(
                &settings,
                unit.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()),
            ),
            "simple" => SearchVariant::plain(&settings),
            other => {
                return Err(JsValue::from_str(&format!("Type de recherche inconnu: {}", other)))
            }
        };
        Ok(SearchSession::new(variant, settings, Rc::clone(&self.state.client)))
    }

    /// Known units for the price search filter
    #[wasm_bindgen(js_name = loadUnits)]
    pub fn load_units(&self) -> Promise {
        let state = Rc::clone(&self.state);
        future_to_promise(async move {
            let units = state.client.units().await.map_err(to_js)?;
            Ok(JsValue::from_str(&to_json(&*units)))
        })
    }

    // ---- diagnostics ----

    /// Connectivity probe for the diagnostics page
    pub fn probe(&self) -> Promise {
        let state = Rc::clone(&self.state);
        future_to_promise(async move {
            let status = state.client.probe().await;
            let report = ProbeReport {
                title: search_panel::DIAGNOSTICS_TITLE,
                message: search_panel::probe_message(&status),
                status: &status,
            };
            Ok(JsValue::from_str(&boundary::view_json(&report)))
        })
    }
}

#[derive(Serialize)]
struct ProbeReport<'a> {
    title: &'a str,
    message: String,
    #[serde(flatten)]
    status: &'a ProbeStatus,
}

fn render_document(state: &AppState) -> String {
    let mode = *state.mode.borrow();
    let mut slot = state.document.borrow_mut();
    match slot.view_mut() {
        Some(view) => boundary::render_json("DocumentView", || view.page(mode)),
        None => boundary::view_json(&DocumentPage::loading()),
    }
}

fn complete<T: Serialize>(callback: &js_sys::Function, result: dpgf_core::Result<T>) {
    let (error, value) = match result {
        Ok(value) => match serde_wasm_bindgen::to_value(&value) {
            Ok(value) => (JsValue::NULL, value),
            Err(e) => (JsValue::from_str(&e.to_string()), JsValue::NULL),
        },
        Err(err) => {
            console::error(&err.to_string());
            (to_js(err), JsValue::NULL)
        }
    };
    if let Err(e) = callback.call2(&JsValue::NULL, &error, &value) {
        console::error(&format!("completion callback failed: {:?}", e));
    }
}

fn to_js(err: DpgfError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Plain data (not a page); a serialization error still yields a fallback
fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        console::error(&format!("Sérialisation impossible: {}", e));
        boundary::fallback_json(&e.to_string())
    })
}
