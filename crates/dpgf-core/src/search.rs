//! Debounced search workflow
//!
//! ```text
//! Idle ──input──▶ Debouncing ──quiet period──▶ Querying ──▶ Success | Empty | Failed
//!                  ▲   │ input restarts the timer             │
//!                  │   └─ text does not qualify ──▶ Idle      │
//!                  └────────────── input ─────────────────────┘
//! ```
//!
//! The machine never performs I/O. [`SearchMachine::poll`] hands out the
//! request to send together with a ticket; the host sends it and feeds the
//! outcome back through [`SearchMachine::resolve`]. Only the most recently
//! issued ticket can change the state.

use dpgf_types::{HistoricalPriceAnalysis, SearchResult};
use serde::Serialize;
use tracing::debug;

use crate::cache::QueryKey;
use crate::config::SearchSettings;
use crate::debounce::Debouncer;
use crate::endpoint::Endpoint;
use crate::error::DpgfError;
use crate::normalize::SourceKind;
use crate::stale::{StaleGuard, Ticket};

/// Which search the input box drives, with its fixed parameters
#[derive(Debug, Clone, PartialEq)]
pub enum SearchVariant {
    Fuzzy {
        min_similarity: u32,
        limit: u32,
    },
    PriceAnalysis,
    /// The input text is the target unit price
    SimilarPrice {
        tolerance_percent: f64,
        unit: Option<String>,
        limit: u32,
    },
    Plain {
        limit: u32,
    },
}

impl SearchVariant {
    pub fn fuzzy(settings: &SearchSettings) -> Self {
        SearchVariant::Fuzzy {
            min_similarity: settings.fuzzy_min_similarity,
            limit: settings.fuzzy_limit,
        }
    }

    pub fn similar_price(settings: &SearchSettings, unit: Option<String>) -> Self {
        SearchVariant::SimilarPrice {
            tolerance_percent: settings.similar_price_tolerance,
            unit,
            limit: settings.similar_price_limit,
        }
    }

    pub fn plain(settings: &SearchSettings) -> Self {
        SearchVariant::Plain {
            limit: settings.plain_limit,
        }
    }

    /// Build the request for `text`, or `None` when the text does not qualify
    ///
    /// Fuzzy only needs non-blank text, price analysis and plain listing need
    /// `min_len` characters after trimming, and similar-price needs a positive
    /// number (comma or dot decimal separator).
    pub fn request(&self, text: &str, min_len: usize) -> Option<SearchRequest> {
        let trimmed = text.trim();
        let long_enough = trimmed.chars().count() >= min_len;

        match self {
            SearchVariant::Fuzzy {
                min_similarity,
                limit,
            } if !trimmed.is_empty() => Some(SearchRequest::Fuzzy {
                designation: trimmed.to_string(),
                min_similarity: *min_similarity,
                limit: *limit,
            }),
            SearchVariant::PriceAnalysis if !trimmed.is_empty() && long_enough => {
                Some(SearchRequest::PriceAnalysis {
                    designation: trimmed.to_string(),
                })
            }
            SearchVariant::SimilarPrice {
                tolerance_percent,
                unit,
                limit,
            } => parse_price(trimmed).map(|target_price| SearchRequest::SimilarPrice {
                target_price,
                tolerance_percent: *tolerance_percent,
                unit: unit.clone(),
                limit: *limit,
            }),
            SearchVariant::Plain { limit } if !trimmed.is_empty() && long_enough => {
                Some(SearchRequest::Plain {
                    designation: trimmed.to_string(),
                    limit: *limit,
                })
            }
            _ => None,
        }
    }
}

/// A positive, finite price typed by a French-speaking user
pub fn parse_price(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .trim_end_matches('€')
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite() && *price > 0.0)
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchRequest {
    Fuzzy {
        designation: String,
        min_similarity: u32,
        limit: u32,
    },
    PriceAnalysis {
        designation: String,
    },
    SimilarPrice {
        target_price: f64,
        tolerance_percent: f64,
        unit: Option<String>,
        limit: u32,
    },
    /// Recent line items; the designation only scopes the cache key
    Plain {
        designation: String,
        limit: u32,
    },
}

impl SearchRequest {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            SearchRequest::Fuzzy {
                designation,
                min_similarity,
                limit,
            } => Endpoint::FuzzySearch {
                designation: designation.clone(),
                min_similarity: *min_similarity,
                limit: *limit,
            },
            SearchRequest::PriceAnalysis { designation } => Endpoint::PriceAnalysis {
                designation: designation.clone(),
            },
            SearchRequest::SimilarPrice {
                target_price,
                tolerance_percent,
                unit,
                limit,
            } => Endpoint::SimilarPrice {
                target_price: *target_price,
                tolerance_percent: *tolerance_percent,
                unit: unit.clone(),
                limit: *limit,
            },
            SearchRequest::Plain { limit, .. } => Endpoint::ListElements { limit: *limit },
        }
    }

    pub fn query_key(&self) -> QueryKey {
        match self {
            SearchRequest::Plain { designation, limit } => QueryKey::new(["plain_search"])
                .with(designation)
                .with(limit),
            other => other
                .endpoint()
                .query_key()
                .unwrap_or_else(|| QueryKey::new(["search"])),
        }
    }

    /// Row shape of the response; `None` for the aggregate price analysis
    pub fn source_kind(&self) -> Option<SourceKind> {
        match self {
            SearchRequest::Fuzzy { .. } => Some(SourceKind::Fuzzy),
            SearchRequest::PriceAnalysis { .. } => None,
            SearchRequest::SimilarPrice { .. } => Some(SourceKind::PriceProximity),
            SearchRequest::Plain { .. } => Some(SourceKind::PlainList),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchOutput {
    Results { results: Vec<SearchResult> },
    Analysis { analysis: Box<HistoricalPriceAnalysis> },
}

impl SearchOutput {
    pub fn is_empty(&self) -> bool {
        match self {
            SearchOutput::Results { results } => results.is_empty(),
            SearchOutput::Analysis { analysis } => {
                analysis.total_elements == 0 && analysis.elements.is_empty()
            }
        }
    }

    pub fn results(&self) -> &[SearchResult] {
        match self {
            SearchOutput::Results { results } => results,
            SearchOutput::Analysis { .. } => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum SearchPhase {
    Idle,
    Debouncing { deadline: u64 },
    Querying,
    Success { output: SearchOutput },
    Empty,
    /// `retryable` is false when re-sending cannot help, e.g. an undecodable body
    Failed { message: String, retryable: bool },
}

#[derive(Debug)]
pub struct SearchMachine {
    variant: SearchVariant,
    min_query_len: usize,
    text: String,
    debouncer: Debouncer<String>,
    guard: StaleGuard,
    phase: SearchPhase,
    last_request: Option<SearchRequest>,
}

impl SearchMachine {
    pub fn new(variant: SearchVariant, settings: &SearchSettings) -> Self {
        Self {
            variant,
            min_query_len: settings.min_query_len,
            text: String::new(),
            debouncer: Debouncer::new(settings.debounce_ms),
            guard: StaleGuard::new(),
            phase: SearchPhase::Idle,
            last_request: None,
        }
    }

    pub fn phase(&self) -> &SearchPhase {
        &self.phase
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn variant(&self) -> &SearchVariant {
        &self.variant
    }

    /// When the host should call [`poll`](Self::poll) next
    pub fn deadline(&self) -> Option<u64> {
        self.debouncer.deadline()
    }

    /// Record a keystroke; restarts the quiet period from any state
    pub fn input(&mut self, text: impl Into<String>, now: u64) {
        self.text = text.into();
        self.debouncer.push(self.text.clone(), now);
        // results of queries for older text must not replace the new timer
        self.guard.supersede();
        self.phase = SearchPhase::Debouncing {
            deadline: self.debouncer.deadline().unwrap_or(now),
        };
    }

    /// Switch variant and re-run the current text through the debouncer
    pub fn set_variant(&mut self, variant: SearchVariant, now: u64) {
        self.variant = variant;
        let text = self.text.clone();
        self.input(text, now);
    }

    /// Fire the pending query if the quiet period is over
    pub fn poll(&mut self, now: u64) -> Option<(Ticket<QueryKey>, SearchRequest)> {
        let text = self.debouncer.poll(now)?;
        match self.variant.request(&text, self.min_query_len) {
            Some(request) => Some(self.issue(request)),
            None => {
                debug!(text = %text, "search input does not qualify");
                self.phase = SearchPhase::Idle;
                None
            }
        }
    }

    /// Re-send the last request after a retryable failure
    pub fn retry(&mut self) -> Option<(Ticket<QueryKey>, SearchRequest)> {
        if !matches!(self.phase, SearchPhase::Failed { retryable: true, .. }) {
            return None;
        }
        let request = self.last_request.clone()?;
        Some(self.issue(request))
    }

    /// Apply a finished query; returns false when the ticket was stale
    pub fn resolve(
        &mut self,
        ticket: &Ticket<QueryKey>,
        outcome: Result<SearchOutput, DpgfError>,
    ) -> bool {
        let Some(outcome) = self.guard.accept(ticket, outcome) else {
            return false;
        };
        self.phase = match outcome {
            Ok(output) if output.is_empty() => SearchPhase::Empty,
            Ok(output) => SearchPhase::Success { output },
            Err(err) => SearchPhase::Failed {
                message: err.to_string(),
                retryable: err.is_retryable(),
            },
        };
        debug!(key = %ticket.key(), phase = ?self.phase, "search resolved");
        true
    }

    /// Back to idle, dropping any pending input and outstanding tickets
    pub fn reset(&mut self) {
        self.text.clear();
        self.debouncer.cancel();
        self.guard.supersede();
        self.phase = SearchPhase::Idle;
        self.last_request = None;
    }

    fn issue(&mut self, request: SearchRequest) -> (Ticket<QueryKey>, SearchRequest) {
        let ticket = self.guard.issue(request.query_key());
        debug!(key = %ticket.key(), generation = ticket.generation(), "search issued");
        self.phase = SearchPhase::Querying;
        self.last_request = Some(request.clone());
        (ticket, request)
    }
}
