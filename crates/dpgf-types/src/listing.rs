//! Flat structural listings (`/lots/`, `/sections/`, `/element_ouvrages/`)

use serde::{Deserialize, Serialize};

use crate::de::null_default;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LotRow {
    pub id_lot: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub numero_lot: String,
    #[serde(default, deserialize_with = "null_default")]
    pub nom_lot: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionRow {
    pub id_section: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub numero_section: String,
    #[serde(default, deserialize_with = "null_default")]
    pub titre_section: String,
    #[serde(default)]
    pub id_lot: Option<i64>,
    #[serde(default)]
    pub niveau: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementRow {
    pub id_element: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub designation_exacte: String,
    #[serde(default, deserialize_with = "null_default")]
    pub unite: String,
    #[serde(default)]
    pub quantite: Option<f64>,
    #[serde(default)]
    pub prix_unitaire_ht: Option<f64>,
    #[serde(default)]
    pub prix_total_ht: Option<f64>,
    #[serde(default)]
    pub id_section: Option<i64>,
}

/// Row of `GET /element_ouvrages/with_sections`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementWithSection {
    #[serde(flatten)]
    pub element: ElementRow,
    pub section: SectionRow,
    #[serde(default)]
    pub lot: Option<LotRow>,
}
