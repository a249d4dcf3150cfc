//! Display model of a single line item in search results
//!
//! Cards are built from the JSON form of a normalized result and read every
//! field through the tolerant accessor, so a row missing its project, lot or
//! section still renders with placeholders. Only a row that is not an object
//! at all is refused.

use dpgf_core::accessor::{get_f64, get_i64, get_opt_f64, get_str};
use dpgf_core::money::{format_percent_delta, format_price};
use dpgf_types::SearchResult;
use serde::Serialize;
use serde_json::Value;

use crate::boundary::ViewError;
use crate::format::{format_date, format_quantity};

pub const NO_DESIGNATION: &str = "Désignation non spécifiée";
pub const NO_PROJECT: &str = "Projet non spécifié";
pub const NO_LOT: &str = "Lot non spécifié";
pub const NO_SECTION: &str = "Section non spécifiée";
pub const NO_DATE: &str = "Date non spécifiée";
pub const DEFAULT_UNIT: &str = "U";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementCard {
    pub id: i64,
    pub designation: String,
    pub project: String,
    pub lot: String,
    pub section: String,
    /// `None` when the date is unknown; the card hides the line
    pub date: Option<String>,
    pub unit: String,
    pub unit_price: f64,
    /// e.g. `45,50 € / m²`
    pub price_label: String,
    pub similarity: Option<String>,
    pub price_difference: Option<PriceDifference>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceDifference {
    pub label: String,
    /// More expensive than the target
    pub above: bool,
}

/// Which optional badges a list shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CardOptions {
    pub show_similarity: bool,
    pub show_price_difference: bool,
}

impl ElementCard {
    pub fn from_result(result: &SearchResult, options: CardOptions) -> Result<Self, ViewError> {
        let value = serde_json::to_value(result)?;
        Self::from_value(&value, options)
    }

    pub fn from_value(element: &Value, options: CardOptions) -> Result<Self, ViewError> {
        if !element.is_object() {
            return Err(ViewError::malformed(
                "élément",
                format!("objet attendu, reçu {}", element),
            ));
        }

        let designation = non_empty(get_str(element, "designation_exacte", ""), NO_DESIGNATION);
        let unit = non_empty(get_str(element, "unite", ""), DEFAULT_UNIT);
        let unit_price = get_f64(element, "prix_unitaire_ht", 0.0);
        let raw_date = get_str(element, "dpgf_info.date_dpgf", "");

        let similarity = get_opt_f64(element, "similarity_score")
            .filter(|_| options.show_similarity)
            .map(|score| format!("Similarité: {}%", format_quantity(Some(score))));
        let price_difference = get_opt_f64(element, "price_difference_percent")
            .filter(|_| options.show_price_difference)
            .map(|percent| PriceDifference {
                label: format_percent_delta(percent),
                above: percent > 0.0,
            });

        Ok(Self {
            id: get_i64(element, "id_element", 0),
            price_label: format!("{} / {}", format_price(unit_price), unit),
            designation,
            project: non_empty(get_str(element, "dpgf_info.nom_projet", ""), NO_PROJECT),
            lot: non_empty(get_str(element, "lot_info.nom_lot", ""), NO_LOT),
            section: non_empty(get_str(element, "section_info.titre_section", ""), NO_SECTION),
            date: (!raw_date.trim().is_empty()).then(|| format_date(raw_date)),
            unit,
            unit_price,
            similarity,
            price_difference,
        })
    }

    /// `Projet - Lot` subtitle line
    pub fn subtitle(&self) -> String {
        format!("{} - {}", self.project, self.lot)
    }
}

fn non_empty(value: &str, placeholder: &str) -> String {
    if value.trim().is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    }
}
