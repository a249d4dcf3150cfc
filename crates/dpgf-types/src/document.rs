//! Cost documents and their nested lots, sections and line items

use serde::{Deserialize, Serialize};

use crate::de::null_default;

/// Owning client as embedded in a document structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRef {
    pub id_client: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub nom_client: String,
}

/// Full nested document returned by `GET /dpgf/{id}/structure`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DpgfStructure {
    #[serde(default, deserialize_with = "null_default")]
    pub id_dpgf: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub nom_projet: String,
    #[serde(default, deserialize_with = "null_default")]
    pub date_dpgf: String,
    #[serde(default)]
    pub statut_offre: Option<String>,
    #[serde(default)]
    pub client: Option<ClientRef>,
    #[serde(default, deserialize_with = "null_default")]
    pub lots: Vec<Lot>,
}

/// A trade package inside a document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lot {
    #[serde(default, deserialize_with = "null_default")]
    pub id_lot: i64,
    /// Display label, not necessarily numeric ("02", "2bis", ...)
    #[serde(default, deserialize_with = "null_default")]
    pub numero_lot: String,
    #[serde(default, deserialize_with = "null_default")]
    pub nom_lot: String,
    #[serde(default, deserialize_with = "null_default")]
    pub sections: Vec<Section>,
}

/// A grouping of line items within a lot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default, deserialize_with = "null_default")]
    pub id_section: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub numero_section: String,
    #[serde(default, deserialize_with = "null_default")]
    pub titre_section: String,
    /// Display depth, 1 is top-level. Trusted from the server.
    #[serde(default = "top_level", deserialize_with = "level")]
    pub niveau_hierarchique: i32,
    #[serde(default, deserialize_with = "null_default")]
    pub elements: Vec<LineItem>,
}

fn top_level() -> i32 {
    1
}

fn level<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<i32>::deserialize(deserializer)?.unwrap_or(1))
}

/// Leaf unit of pricing (élément d'ouvrage)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default, deserialize_with = "null_default")]
    pub id_element: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub designation_exacte: String,
    #[serde(default, deserialize_with = "null_default")]
    pub unite: String,
    #[serde(default)]
    pub quantite: Option<f64>,
    #[serde(default)]
    pub prix_unitaire_ht: Option<f64>,
    /// Server-computed total; never recomputed from quantity × unit price
    #[serde(default)]
    pub prix_total_ht: Option<f64>,
    #[serde(default, deserialize_with = "null_default")]
    pub offre_acceptee: bool,
}

impl LineItem {
    /// Total price with a missing value counted as zero
    pub fn total(&self) -> f64 {
        self.prix_total_ht.filter(|v| !v.is_nan()).unwrap_or(0.0)
    }
}

/// Document row returned by `GET /dpgf/` and `GET /dpgf/{id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id_dpgf: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub nom_projet: String,
    #[serde(default, deserialize_with = "null_default")]
    pub date_dpgf: String,
    #[serde(default)]
    pub statut_offre: Option<String>,
    #[serde(default)]
    pub id_client: Option<i64>,
}

/// Body of `POST /dpgf/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDocument {
    pub nom_projet: String,
    pub date_dpgf: String,
    pub id_client: i64,
}
