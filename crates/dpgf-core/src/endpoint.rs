//! REST endpoints of the DPGF backend and the requests built from them
//!
//! Nothing here performs I/O. An [`ApiRequest`] is a fully resolved method,
//! URL and body that a [`crate::client::Transport`] sends.

use serde::{Deserialize, Serialize};

use crate::cache::QueryKey;

/// Default page size for document listings
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Multipart field name the upload endpoint reads the spreadsheet from
pub const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Page {
    pub fn first(limit: u32) -> Self {
        Self { limit, offset: 0 }
    }

    pub fn next(self) -> Self {
        Self {
            limit: self.limit,
            offset: self.offset.saturating_add(self.limit),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::first(DEFAULT_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Endpoint {
    /// `GET /`, used by the diagnostics page
    Probe,
    ListClients,
    CreateClient,
    ListDocuments(Page),
    CreateDocument,
    Document(i64),
    DocumentStructure(i64),
    Upload,
    ListElements {
        limit: u32,
    },
    FuzzySearch {
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
    Units,
    LotsOf(i64),
    SectionsOf(i64),
    ElementsOf(i64),
    ElementsWithSections {
        dpgf_id: Option<i64>,
        section_id: Option<i64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl Endpoint {
    pub fn method(&self) -> Method {
        match self {
            Endpoint::CreateClient | Endpoint::CreateDocument | Endpoint::Upload => Method::Post,
            _ => Method::Get,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Endpoint::Probe => "/".to_string(),
            Endpoint::ListClients | Endpoint::CreateClient => "/clients/".to_string(),
            Endpoint::ListDocuments(_) | Endpoint::CreateDocument => "/dpgf/".to_string(),
            Endpoint::Document(id) => format!("/dpgf/{}", id),
            Endpoint::DocumentStructure(id) => format!("/dpgf/{}/structure", id),
            Endpoint::Upload => "/dpgf/upload/".to_string(),
            Endpoint::ListElements { .. } | Endpoint::ElementsOf(_) => {
                "/element_ouvrages/".to_string()
            }
            Endpoint::FuzzySearch { .. } => "/element_ouvrages/search/fuzzy".to_string(),
            Endpoint::PriceAnalysis { .. } => "/element_ouvrages/search/price-analysis".to_string(),
            Endpoint::SimilarPrice { .. } => "/element_ouvrages/search/similar-price".to_string(),
            Endpoint::Units => "/element_ouvrages/units".to_string(),
            Endpoint::LotsOf(_) => "/lots/".to_string(),
            Endpoint::SectionsOf(_) => "/sections/".to_string(),
            Endpoint::ElementsWithSections { .. } => "/element_ouvrages/with_sections".to_string(),
        }
    }

    /// Query parameters in the order they are sent, unencoded
    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            Endpoint::ListDocuments(page) => vec![
                ("limit", page.limit.to_string()),
                ("offset", page.offset.to_string()),
            ],
            Endpoint::ListElements { limit } => vec![("limit", limit.to_string())],
            Endpoint::FuzzySearch {
                designation,
                min_similarity,
                limit,
            } => vec![
                ("designation", designation.trim().to_string()),
                ("min_similarity", min_similarity.to_string()),
                ("limit", limit.to_string()),
            ],
            Endpoint::PriceAnalysis { designation } => {
                vec![("designation", designation.trim().to_string())]
            }
            Endpoint::SimilarPrice {
                target_price,
                tolerance_percent,
                unit,
                limit,
            } => {
                let mut params = vec![
                    ("target_price", target_price.to_string()),
                    ("tolerance_percent", tolerance_percent.to_string()),
                    ("limit", limit.to_string()),
                ];
                if let Some(unit) = unit.as_deref().filter(|u| !u.is_empty()) {
                    params.push(("unit", unit.to_string()));
                }
                params
            }
            Endpoint::LotsOf(id) => vec![("id_dpgf", id.to_string())],
            Endpoint::SectionsOf(id) => vec![("id_lot", id.to_string())],
            Endpoint::ElementsOf(id) => vec![("id_section", id.to_string())],
            Endpoint::ElementsWithSections {
                dpgf_id,
                section_id,
            } => {
                let mut params = Vec::new();
                if let Some(id) = dpgf_id {
                    params.push(("dpgf_id", id.to_string()));
                }
                if let Some(id) = section_id {
                    params.push(("section_id", id.to_string()));
                }
                params
            }
            _ => Vec::new(),
        }
    }

    /// Path plus percent-encoded query string
    pub fn path_and_query(&self) -> String {
        let mut url = self.path();
        let query = self.query();
        if !query.is_empty() {
            let encoded: Vec<String> = query
                .iter()
                .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
                .collect();
            url.push('?');
            url.push_str(&encoded.join("&"));
        }
        url
    }

    /// Absolute URL against `base_url`, tolerating a trailing slash on the base
    pub fn url(&self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.path_and_query())
    }

    /// Cache key of a read; mutations have none
    pub fn query_key(&self) -> Option<QueryKey> {
        let key = match self {
            Endpoint::CreateClient | Endpoint::CreateDocument | Endpoint::Upload => return None,
            Endpoint::Probe => QueryKey::new(["api_probe"]),
            Endpoint::ListClients => QueryKey::clients(),
            Endpoint::ListDocuments(page) => {
                QueryKey::documents().with(page.limit).with(page.offset)
            }
            Endpoint::Document(id) => QueryKey::document(*id),
            Endpoint::DocumentStructure(id) => QueryKey::structure(*id),
            Endpoint::ListElements { limit } => QueryKey::new(["elements", "all"]).with(limit),
            Endpoint::FuzzySearch {
                designation,
                min_similarity,
                limit,
            } => QueryKey::new(["fuzzy_search"])
                .with(designation.trim())
                .with(min_similarity)
                .with(limit),
            Endpoint::PriceAnalysis { designation } => {
                QueryKey::new(["price_analysis"]).with(designation.trim())
            }
            Endpoint::SimilarPrice {
                target_price,
                tolerance_percent,
                unit,
                limit,
            } => QueryKey::new(["similar_price"])
                .with(target_price)
                .with(tolerance_percent)
                .with(unit.as_deref().unwrap_or(""))
                .with(limit),
            Endpoint::Units => QueryKey::new(["units"]),
            Endpoint::LotsOf(id) => QueryKey::new(["lots"]).with(id),
            Endpoint::SectionsOf(id) => QueryKey::new(["sections"]).with(id),
            Endpoint::ElementsOf(id) => QueryKey::new(["elements"]).with(id),
            Endpoint::ElementsWithSections {
                dpgf_id,
                section_id,
            } => QueryKey::new(["elements_with_sections"])
                .with(dpgf_id.map(|id| id.to_string()).unwrap_or_default())
                .with(section_id.map(|id| id.to_string()).unwrap_or_default()),
        };
        Some(key)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Json(serde_json::Value),
    Multipart {
        field: &'static str,
        file_name: String,
        bytes: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub body: Body,
}

impl ApiRequest {
    pub fn new(base_url: &str, endpoint: &Endpoint, body: Body) -> Self {
        Self {
            method: endpoint.method(),
            url: endpoint.url(base_url),
            body,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_and_methods() {
        assert_eq!(Endpoint::Document(7).path(), "/dpgf/7");
        assert_eq!(Endpoint::DocumentStructure(7).path(), "/dpgf/7/structure");
        assert_eq!(Endpoint::Upload.method(), Method::Post);
        assert_eq!(Endpoint::ListClients.method(), Method::Get);
        assert_eq!(Endpoint::CreateClient.path(), "/clients/");
    }

    #[test]
    fn test_fuzzy_query_is_encoded_and_trimmed() {
        let endpoint = Endpoint::FuzzySearch {
            designation: "  béton armé & co ".to_string(),
            min_similarity: 70,
            limit: 50,
        };
        assert_eq!(
            endpoint.path_and_query(),
            "/element_ouvrages/search/fuzzy?designation=b%C3%A9ton%20arm%C3%A9%20%26%20co&min_similarity=70&limit=50"
        );
    }

    #[test]
    fn test_similar_price_unit_is_optional() {
        let mut endpoint = Endpoint::SimilarPrice {
            target_price: 45.5,
            tolerance_percent: 20.0,
            unit: None,
            limit: 20,
        };
        assert_eq!(
            endpoint.path_and_query(),
            "/element_ouvrages/search/similar-price?target_price=45.5&tolerance_percent=20&limit=20"
        );

        if let Endpoint::SimilarPrice { unit, .. } = &mut endpoint {
            *unit = Some("m²".to_string());
        }
        assert!(endpoint.path_and_query().ends_with("&unit=m%C2%B2"));
    }

    #[test]
    fn test_url_joins_base() {
        let url = Endpoint::ListDocuments(Page::default()).url("http://localhost:8000/");
        assert_eq!(url, "http://localhost:8000/dpgf/?limit=100&offset=0");
    }

    #[test]
    fn test_elements_with_sections_omits_absent_filters() {
        let endpoint = Endpoint::ElementsWithSections {
            dpgf_id: Some(3),
            section_id: None,
        };
        assert_eq!(endpoint.path_and_query(), "/element_ouvrages/with_sections?dpgf_id=3");
    }

    #[test]
    fn test_query_keys() {
        assert_eq!(Endpoint::CreateClient.query_key(), None);
        let key = Endpoint::ListDocuments(Page::first(10)).query_key().unwrap();
        assert!(key.starts_with(&QueryKey::documents()));
        assert_eq!(Endpoint::DocumentStructure(4).query_key(), Some(QueryKey::structure(4)));
    }

    #[test]
    fn test_page_next() {
        let page = Page::first(100).next().next();
        assert_eq!(page, Page { limit: 100, offset: 200 });
    }
}
