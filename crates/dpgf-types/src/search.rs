//! Search endpoint payloads
//!
//! The three search endpoints return structurally different rows. Each shape
//! has its own type here; `SearchResult` is the single display shape they are
//! normalized into. Optional fields stay `None` when the server omits them and
//! are skipped on serialization, so absence survives a round trip through
//! `serde_json::Value`.

use serde::{Deserialize, Serialize};

use crate::de::null_default;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_section: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numero_section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub titre_section: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LotInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_lot: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numero_lot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nom_lot: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DpgfInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_dpgf: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nom_projet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_dpgf: Option<String>,
}

/// Row of `GET /element_ouvrages/search/fuzzy`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FuzzyHit {
    #[serde(default, deserialize_with = "null_default")]
    pub id_element: i64,
    #[serde(default)]
    pub designation_exacte: Option<String>,
    #[serde(default)]
    pub unite: Option<String>,
    #[serde(default)]
    pub prix_unitaire_ht: Option<f64>,
    #[serde(default)]
    pub quantite: Option<f64>,
    #[serde(default)]
    pub prix_total_ht: Option<f64>,
    #[serde(default)]
    pub similarity_score: Option<f64>,
    #[serde(default)]
    pub section_info: Option<SectionInfo>,
    #[serde(default)]
    pub lot_info: Option<LotInfo>,
    #[serde(default)]
    pub dpgf_info: Option<DpgfInfo>,
}

/// Row of `GET /element_ouvrages/search/similar-price`
///
/// Carries no quantity, total or similarity score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilarPriceHit {
    #[serde(default, deserialize_with = "null_default")]
    pub id_element: i64,
    #[serde(default)]
    pub designation_exacte: Option<String>,
    #[serde(default)]
    pub unite: Option<String>,
    #[serde(default)]
    pub prix_unitaire_ht: Option<f64>,
    #[serde(default)]
    pub price_difference_percent: Option<f64>,
    #[serde(default)]
    pub section_info: Option<SectionInfo>,
    #[serde(default)]
    pub lot_info: Option<LotInfo>,
    #[serde(default)]
    pub dpgf_info: Option<DpgfInfo>,
}

/// Row of the plain `GET /element_ouvrages/` listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlainElement {
    #[serde(default, deserialize_with = "null_default")]
    pub id_element: i64,
    #[serde(default)]
    pub designation_exacte: Option<String>,
    #[serde(default)]
    pub unite: Option<String>,
    #[serde(default)]
    pub prix_unitaire_ht: Option<f64>,
    #[serde(default)]
    pub quantite: Option<f64>,
    #[serde(default)]
    pub prix_total_ht: Option<f64>,
    #[serde(default)]
    pub section_info: Option<SectionInfo>,
    #[serde(default)]
    pub lot_info: Option<LotInfo>,
    #[serde(default)]
    pub dpgf_info: Option<DpgfInfo>,
}

/// Common display shape for every search variant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default, deserialize_with = "null_default")]
    pub id_element: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designation_exacte: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unite: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prix_unitaire_ht: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantite: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prix_total_ht: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_difference_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_info: Option<SectionInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lot_info: Option<LotInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dpgf_info: Option<DpgfInfo>,
}

/// Price direction reported by the analysis endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Hausse,
    Baisse,
    Stable,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyAverage {
    pub year: i32,
    #[serde(default, deserialize_with = "null_default")]
    pub average_price: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    #[serde(default, deserialize_with = "null_default")]
    pub min: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub max: f64,
}

/// Response of `GET /element_ouvrages/search/price-analysis`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPriceAnalysis {
    #[serde(default, deserialize_with = "null_default")]
    pub designation: String,
    #[serde(default, deserialize_with = "null_default")]
    pub total_elements: u32,
    #[serde(default, deserialize_with = "null_default")]
    pub average_price: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub min_price: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub max_price: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub std_deviation: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub yearly_averages: Vec<YearlyAverage>,
    #[serde(default, deserialize_with = "null_default")]
    pub trend: Trend,
    #[serde(default, deserialize_with = "null_default")]
    pub price_range: PriceRange,
    #[serde(default)]
    pub most_common_unit: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub elements: Vec<FuzzyHit>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_similar_price_hit_without_references() {
        let hit: SimilarPriceHit = serde_json::from_str(
            r#"{"id_element": 1, "designation_exacte": "X", "prix_unitaire_ht": 100, "price_difference_percent": 10}"#,
        )
        .unwrap();
        assert_eq!(hit.prix_unitaire_ht, Some(100.0));
        assert_eq!(hit.price_difference_percent, Some(10.0));
        assert!(hit.lot_info.is_none());
    }

    #[test]
    fn test_search_result_skips_absent_fields() {
        let result = SearchResult {
            id_element: 5,
            designation_exacte: Some("Peinture".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&result).unwrap();
        let object = value.as_object().unwrap();
        assert!(object.contains_key("designation_exacte"));
        assert!(!object.contains_key("similarity_score"));
        assert!(!object.contains_key("dpgf_info"));
    }

    #[test]
    fn test_unknown_trend_is_tolerated() {
        let analysis: HistoricalPriceAnalysis = serde_json::from_str(
            r#"{"designation": "Carrelage", "trend": "volatile", "yearly_averages": null}"#,
        )
        .unwrap();
        assert_eq!(analysis.trend, Trend::Unknown);
        assert!(analysis.yearly_averages.is_empty());
        assert!(analysis.elements.is_empty());
    }

    #[test]
    fn test_trend_names() {
        let trend: Trend = serde_json::from_str(r#""hausse""#).unwrap();
        assert_eq!(trend, Trend::Hausse);
    }
}
