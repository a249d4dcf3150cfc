use serde::{Deserialize, Serialize};

use crate::de::null_default;

/// A customer owning cost documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id_client: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub nom_client: String,
}

/// Body of `POST /clients/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewClient {
    pub nom_client: String,
}

impl NewClient {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            nom_client: name.into(),
        }
    }
}
