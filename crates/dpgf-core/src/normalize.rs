//! Conversion of search-endpoint rows into the common display shape
//!
//! `RawSearchHit` tags every row with the endpoint it came from. Normalizing
//! is the only way to obtain a `SearchResult`, so untagged "maybe has this
//! field" objects never reach the display code.

use dpgf_types::{FuzzyHit, PlainElement, SearchResult, SimilarPriceHit};
use serde::{Deserialize, Serialize};

/// Which endpoint a row came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Fuzzy,
    PriceProximity,
    PlainList,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawSearchHit {
    Fuzzy(FuzzyHit),
    PriceProximity(SimilarPriceHit),
    PlainList(PlainElement),
}

impl RawSearchHit {
    pub fn kind(&self) -> SourceKind {
        match self {
            RawSearchHit::Fuzzy(_) => SourceKind::Fuzzy,
            RawSearchHit::PriceProximity(_) => SourceKind::PriceProximity,
            RawSearchHit::PlainList(_) => SourceKind::PlainList,
        }
    }

    /// Decode one JSON row as the given kind
    pub fn from_value(kind: SourceKind, value: serde_json::Value) -> serde_json::Result<Self> {
        Ok(match kind {
            SourceKind::Fuzzy => RawSearchHit::Fuzzy(serde_json::from_value(value)?),
            SourceKind::PriceProximity => {
                RawSearchHit::PriceProximity(serde_json::from_value(value)?)
            }
            SourceKind::PlainList => RawSearchHit::PlainList(serde_json::from_value(value)?),
        })
    }
}

/// Similarity synthesized for a price-proximity row
///
/// Not clamped: a difference above 100% yields a negative score.
pub fn similarity_from_price_difference(price_difference_percent: f64) -> f64 {
    100.0 - price_difference_percent.abs()
}

pub fn normalize(raw: RawSearchHit) -> SearchResult {
    match raw {
        RawSearchHit::Fuzzy(hit) => SearchResult {
            id_element: hit.id_element,
            designation_exacte: hit.designation_exacte,
            unite: hit.unite,
            prix_unitaire_ht: hit.prix_unitaire_ht,
            quantite: hit.quantite,
            prix_total_ht: hit.prix_total_ht,
            similarity_score: hit.similarity_score,
            price_difference_percent: None,
            section_info: hit.section_info,
            lot_info: hit.lot_info,
            dpgf_info: hit.dpgf_info,
        },
        RawSearchHit::PriceProximity(hit) => SearchResult {
            id_element: hit.id_element,
            designation_exacte: hit.designation_exacte,
            unite: hit.unite,
            prix_unitaire_ht: hit.prix_unitaire_ht,
            quantite: Some(1.0),
            prix_total_ht: hit.prix_unitaire_ht,
            // no delta, no similarity
            similarity_score: hit
                .price_difference_percent
                .map(similarity_from_price_difference),
            price_difference_percent: hit.price_difference_percent,
            section_info: hit.section_info,
            lot_info: hit.lot_info,
            dpgf_info: hit.dpgf_info,
        },
        RawSearchHit::PlainList(element) => SearchResult {
            id_element: element.id_element,
            designation_exacte: element.designation_exacte,
            unite: element.unite,
            prix_unitaire_ht: element.prix_unitaire_ht,
            quantite: element.quantite,
            prix_total_ht: element.prix_total_ht,
            similarity_score: None,
            price_difference_percent: None,
            section_info: element.section_info,
            lot_info: element.lot_info,
            dpgf_info: element.dpgf_info,
        },
    }
}

/// Normalize a batch of rows of one kind
pub fn normalize_all<I>(raw: I) -> Vec<SearchResult>
where
    I: IntoIterator<Item = RawSearchHit>,
{
    raw.into_iter().map(normalize).collect()
}
