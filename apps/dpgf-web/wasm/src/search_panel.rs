//! Search dialog: live session and its display model
//!
//! `SearchSession` wires the core search state machine to the browser. Each
//! keystroke restarts a `setTimeout`; when it fires, the machine hands out
//! the request, the query runs on the microtask queue, and the outcome is fed
//! back with its ticket so an older answer never replaces a newer one. The
//! page shell gets a fresh `SearchView` (as JSON) through its listener after
//! every transition. Picking a result pins it in a "selected element" panel
//! that survives later searches until the session is reset.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use dpgf_core::config::SearchSettings;
use dpgf_core::money::{format_price, format_price_tolerant};
use dpgf_core::normalize::{normalize, RawSearchHit};
use dpgf_core::search::parse_price;
use dpgf_core::{DpgfClient, ProbeStatus, SearchMachine, SearchOutput, SearchPhase, SearchVariant};
use dpgf_types::{HistoricalPriceAnalysis, SearchResult, Trend};
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::boundary::{self, ViewError};
use crate::console;
use crate::element_card::{CardOptions, ElementCard};
use crate::format::format_quantity;
use crate::timer::DebounceTimer;
use crate::transport::FetchTransport;

pub const SIMPLE_PLACEHOLDER: &str = "Tapez au moins 3 caractères pour commencer la recherche...";
pub const TEXT_PLACEHOLDER: &str = "Ex: béton armé, carrelage, enduit...";
pub const PRICE_PLACEHOLDER: &str = "Ex: 100.50";
pub const SELECTED_TITLE: &str = "✅ Élément sélectionné";

// ============================================================================
// Display model
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SearchView {
    Idle {
        placeholder: String,
        hint: Option<String>,
    },
    /// Waiting for the input to settle
    Typing,
    Loading {
        message: String,
    },
    Results {
        heading: String,
        cards: Vec<ElementCard>,
    },
    Analysis {
        analysis: AnalysisView,
    },
    Empty {
        message: String,
    },
    Failed {
        message: String,
        retryable: bool,
    },
}

impl SearchView {
    pub fn build(machine: &SearchMachine, settings: &SearchSettings) -> Result<Self, ViewError> {
        let variant = machine.variant();
        let query = machine.text().trim();

        Ok(match machine.phase() {
            SearchPhase::Idle => SearchView::Idle {
                placeholder: placeholder(variant).to_string(),
                hint: short_query_hint(variant, query, settings.min_query_len),
            },
            SearchPhase::Debouncing { .. } => SearchView::Typing,
            SearchPhase::Querying => SearchView::Loading {
                message: loading_message(variant).to_string(),
            },
            SearchPhase::Success { output } => match output {
                SearchOutput::Results { results } => SearchView::Results {
                    heading: results_heading(variant, query, results.len()),
                    cards: results
                        .iter()
                        .map(|r| ElementCard::from_result(r, card_options(variant)))
                        .collect::<Result<_, _>>()?,
                },
                SearchOutput::Analysis { analysis } => SearchView::Analysis {
                    analysis: AnalysisView::new(analysis)?,
                },
            },
            SearchPhase::Empty => SearchView::Empty {
                message: empty_message(variant, query),
            },
            SearchPhase::Failed { message, retryable } => SearchView::Failed {
                message: format!("{}: {}", error_prefix(variant), message),
                retryable: *retryable,
            },
        })
    }
}

fn placeholder(variant: &SearchVariant) -> &'static str {
    match variant {
        SearchVariant::Plain { .. } => SIMPLE_PLACEHOLDER,
        SearchVariant::SimilarPrice { .. } => PRICE_PLACEHOLDER,
        SearchVariant::Fuzzy { .. } | SearchVariant::PriceAnalysis => TEXT_PLACEHOLDER,
    }
}

fn short_query_hint(variant: &SearchVariant, query: &str, min_len: usize) -> Option<String> {
    if !matches!(
        variant,
        SearchVariant::Plain { .. } | SearchVariant::PriceAnalysis
    ) {
        return None;
    }
    let typed = query.chars().count();
    (typed > 0 && typed < min_len).then(|| format!("Tapez encore {} caractère(s)", min_len - typed))
}

fn loading_message(variant: &SearchVariant) -> &'static str {
    match variant {
        SearchVariant::SimilarPrice { .. } => "Recherche par prix en cours...",
        SearchVariant::PriceAnalysis => "Analyse en cours...",
        SearchVariant::Fuzzy { .. } | SearchVariant::Plain { .. } => "Recherche en cours...",
    }
}

fn error_prefix(variant: &SearchVariant) -> &'static str {
    match variant {
        SearchVariant::SimilarPrice { .. } => "Erreur lors de la recherche par prix",
        SearchVariant::PriceAnalysis => "Erreur lors de l'analyse",
        SearchVariant::Fuzzy { .. } | SearchVariant::Plain { .. } => "Erreur lors de la recherche",
    }
}

fn results_heading(variant: &SearchVariant, query: &str, count: usize) -> String {
    match variant {
        SearchVariant::SimilarPrice {
            tolerance_percent, ..
        } => format!(
            "Éléments avec prix similaire à {} (±{}%)",
            target_label(query),
            tolerance_percent
        ),
        SearchVariant::Plain { .. } => format!("{} résultat(s) trouvé(s)", count),
        SearchVariant::Fuzzy { .. } | SearchVariant::PriceAnalysis => {
            format!("Résultats de recherche ({})", count)
        }
    }
}

fn empty_message(variant: &SearchVariant, query: &str) -> String {
    match variant {
        SearchVariant::SimilarPrice { .. } => format!(
            "Aucun élément trouvé avec un prix similaire à {}",
            target_label(query)
        ),
        SearchVariant::PriceAnalysis => {
            format!("Aucune donnée d'analyse trouvée pour \"{}\"", query)
        }
        SearchVariant::Fuzzy { .. } | SearchVariant::Plain { .. } => {
            format!("Aucun résultat trouvé pour \"{}\"", query)
        }
    }
}

fn target_label(query: &str) -> String {
    format_price(parse_price(query).unwrap_or(0.0))
}

fn card_options(variant: &SearchVariant) -> CardOptions {
    CardOptions {
        show_similarity: matches!(variant, SearchVariant::Fuzzy { .. }),
        show_price_difference: matches!(variant, SearchVariant::SimilarPrice { .. }),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisView {
    pub title: String,
    pub trend_icon: String,
    pub found: u32,
    pub average: String,
    /// `min - max`
    pub range: String,
    pub unit: String,
    pub years: Vec<YearSummary>,
    pub elements: Vec<ElementCard>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearSummary {
    pub year: i32,
    pub average: String,
    /// `1 élément`, `4 éléments`
    pub count: String,
}

impl AnalysisView {
    pub fn new(analysis: &HistoricalPriceAnalysis) -> Result<Self, ViewError> {
        Ok(Self {
            title: format!("Analyse pour \"{}\"", analysis.designation),
            trend_icon: trend_icon(analysis.trend).to_string(),
            found: analysis.total_elements,
            average: format_price(analysis.average_price),
            range: format!(
                "{} - {}",
                format_price(analysis.min_price),
                format_price(analysis.max_price)
            ),
            unit: analysis.most_common_unit.clone().unwrap_or_default(),
            years: analysis
                .yearly_averages
                .iter()
                .map(|year| YearSummary {
                    year: year.year,
                    average: format_price(year.average_price),
                    count: format!(
                        "{} élément{}",
                        year.count,
                        if year.count > 1 { "s" } else { "" }
                    ),
                })
                .collect(),
            elements: analysis
                .elements
                .iter()
                .map(|hit| {
                    ElementCard::from_result(
                        &normalize(RawSearchHit::Fuzzy(hit.clone())),
                        CardOptions::default(),
                    )
                })
                .collect::<Result<_, _>>()?,
        })
    }
}

pub fn trend_icon(trend: Trend) -> &'static str {
    match trend {
        Trend::Hausse => "📈",
        Trend::Baisse => "📉",
        Trend::Stable => "➡️",
        Trend::Unknown => "📊",
    }
}

// ============================================================================
// Selection
// ============================================================================

/// The element the user picked from a result list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedElement {
    pub title: String,
    pub card: ElementCard,
    /// `Quantité: 12`, hidden when the row has no quantity
    pub quantity: Option<String>,
    /// `Prix total: 1 234,50 €`
    pub total: String,
    pub similarity: Option<String>,
}

impl SelectedElement {
    pub fn new(result: &SearchResult) -> Result<Self, ViewError> {
        let quantity = format_quantity(result.quantite);
        Ok(Self {
            title: SELECTED_TITLE.to_string(),
            card: ElementCard::from_result(result, CardOptions::default())?,
            quantity: (!quantity.is_empty()).then(|| format!("Quantité: {}", quantity)),
            total: format!("Prix total: {}", format_price_tolerant(result.prix_total_ht)),
            similarity: result
                .similarity_score
                .filter(|score| *score != 0.0)
                .map(|score| format!("Score de similarité: {}%", format_quantity(Some(score)))),
        })
    }
}

/// Row `index` of whatever list the machine currently shows
pub fn result_at(machine: &SearchMachine, index: usize) -> Option<SearchResult> {
    match machine.phase() {
        SearchPhase::Success {
            output: SearchOutput::Results { results },
        } => results.get(index).cloned(),
        SearchPhase::Success {
            output: SearchOutput::Analysis { analysis },
        } => analysis
            .elements
            .get(index)
            .map(|hit| normalize(RawSearchHit::Fuzzy(hit.clone()))),
        _ => None,
    }
}

/// What the listener receives: the search box and the pinned selection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPanel {
    pub search: SearchView,
    pub selected: Option<SelectedElement>,
}

// ============================================================================
// Diagnostics
// ============================================================================

pub const DIAGNOSTICS_TITLE: &str = "Test de Recherche - Diagnostic";

/// One line summarizing the connectivity probe
pub fn probe_message(status: &ProbeStatus) -> String {
    match status {
        ProbeStatus::Success { .. } => "Connexion API réussie".to_string(),
        ProbeStatus::Error { error } => format!("Erreur de connexion: {}", error),
    }
}

/// One line summarizing a diagnostic search
pub fn diagnostic_summary(view: &SearchView) -> Option<String> {
    match view {
        SearchView::Results { cards, .. } => Some(format!(
            "Recherche réussie - {} élément(s) trouvé(s)",
            cards.len()
        )),
        SearchView::Empty { .. } => Some("Recherche réussie - 0 élément(s) trouvé(s)".to_string()),
        SearchView::Failed { message, .. } => Some(message.clone()),
        _ => None,
    }
}

// ============================================================================
// Live session
// ============================================================================

struct SessionState {
    machine: SearchMachine,
    settings: SearchSettings,
    timer: DebounceTimer,
    selected: Option<SelectedElement>,
    listener: Option<js_sys::Function>,
}

impl SessionState {
    fn view(&self) -> Result<SearchPanel, ViewError> {
        Ok(SearchPanel {
            search: SearchView::build(&self.machine, &self.settings)?,
            selected: self.selected.clone(),
        })
    }

    fn to_json(&self) -> String {
        boundary::render_json("SearchView", || self.view())
    }
}

/// A search box bound to the backend
#[wasm_bindgen]
pub struct SearchSession {
    state: Rc<RefCell<SessionState>>,
    client: Rc<DpgfClient<FetchTransport>>,
}

impl SearchSession {
    pub fn new(
        variant: SearchVariant,
        settings: SearchSettings,
        client: Rc<DpgfClient<FetchTransport>>,
    ) -> Self {
        Self {
            state: Rc::new(RefCell::new(SessionState {
                machine: SearchMachine::new(variant, &settings),
                settings,
                timer: DebounceTimer::new(),
                selected: None,
                listener: None,
            })),
            client,
        }
    }

    fn schedule(&self) -> Result<(), JsValue> {
        let now = now_ms();
        let mut state = self.state.borrow_mut();
        let Some(deadline) = state.machine.deadline() else {
            state.timer.cancel();
            return Ok(());
        };

        let weak = Rc::downgrade(&self.state);
        let client = Rc::clone(&self.client);
        state
            .timer
            .schedule(deadline.saturating_sub(now), move || fire(&weak, &client))
    }
}

#[wasm_bindgen]
impl SearchSession {
    /// Record a keystroke
    pub fn input(&self, text: &str) -> Result<(), JsValue> {
        self.state.borrow_mut().machine.input(text, now_ms());
        self.schedule()?;
        notify(&self.state);
        Ok(())
    }

    /// Narrow similar-price results to one unit (empty for all units)
    #[wasm_bindgen(js_name = setUnit)]
    pub fn set_unit(&self, unit: &str) -> Result<(), JsValue> {
        {
            let mut state = self.state.borrow_mut();
            let SearchVariant::SimilarPrice { .. } = state.machine.variant() else {
                return Err(JsValue::from_str("Filtre d'unité réservé à la recherche par prix"));
            };
            let unit = Some(unit.trim().to_string()).filter(|u| !u.is_empty());
            let variant = SearchVariant::similar_price(&state.settings, unit);
            state.machine.set_variant(variant, now_ms());
        }
        self.schedule()?;
        notify(&self.state);
        Ok(())
    }

    /// Re-send the last query after a failure
    pub fn retry(&self) {
        let issued = self.state.borrow_mut().machine.retry();
        if let Some((ticket, request)) = issued {
            notify(&self.state);
            dispatch(Rc::downgrade(&self.state), Rc::clone(&self.client), ticket, request);
        }
    }

    pub fn reset(&self) {
        {
            let mut state = self.state.borrow_mut();
            state.machine.reset();
            state.timer.cancel();
            state.selected = None;
        }
        notify(&self.state);
    }

    /// Pin row `index` of the current results as the selected element
    #[wasm_bindgen(js_name = selectResult)]
    pub fn select_result(&self, index: usize) -> Result<(), JsValue> {
        {
            let mut state = self.state.borrow_mut();
            let result = result_at(&state.machine, index).ok_or_else(|| {
                JsValue::from_str(&format!("Aucun résultat à la position {}", index))
            })?;
            let selected =
                SelectedElement::new(&result).map_err(|e| JsValue::from_str(&e.to_string()))?;
            state.selected = Some(selected);
        }
        notify(&self.state);
        Ok(())
    }

    #[wasm_bindgen(js_name = clearSelection)]
    pub fn clear_selection(&self) {
        self.state.borrow_mut().selected = None;
        notify(&self.state);
    }

    /// Called with the view JSON after every state change
    #[wasm_bindgen(js_name = setListener)]
    pub fn set_listener(&self, listener: js_sys::Function) {
        self.state.borrow_mut().listener = Some(listener);
    }

    #[wasm_bindgen(js_name = toJson)]
    pub fn to_json(&self) -> String {
        self.state.borrow().to_json()
    }

    #[wasm_bindgen(getter)]
    pub fn text(&self) -> String {
        self.state.borrow().machine.text().to_string()
    }
}

fn fire(weak: &Weak<RefCell<SessionState>>, client: &Rc<DpgfClient<FetchTransport>>) {
    let Some(state) = weak.upgrade() else {
        return;
    };
    let issued = {
        let mut state = state.borrow_mut();
        // only the latest schedule survives, so its quiet period is over
        let now = state
            .machine
            .deadline()
            .map_or(now_ms(), |deadline| now_ms().max(deadline));
        state.machine.poll(now)
    };
    notify(&state);

    if let Some((ticket, request)) = issued {
        dispatch(Rc::downgrade(&state), Rc::clone(client), ticket, request);
    }
}

fn dispatch(
    weak: Weak<RefCell<SessionState>>,
    client: Rc<DpgfClient<FetchTransport>>,
    ticket: dpgf_core::Ticket<dpgf_core::QueryKey>,
    request: dpgf_core::SearchRequest,
) {
    wasm_bindgen_futures::spawn_local(async move {
        let outcome = client.search(&request).await;
        let Some(state) = weak.upgrade() else {
            return;
        };
        let applied = state.borrow_mut().machine.resolve(&ticket, outcome);
        if applied {
            notify(&state);
        }
    });
}

fn notify(state: &Rc<RefCell<SessionState>>) {
    // release the borrow before calling out, the listener may call back in
    let (listener, json) = {
        let state = state.borrow();
        (state.listener.clone(), state.to_json())
    };
    if let Some(listener) = listener {
        if let Err(e) = listener.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
            console::error(&format!("search listener failed: {:?}", e));
        }
    }
}

fn now_ms() -> u64 {
    js_sys::Date::now() as u64
}
