//! Fallback for views that fail to build
//!
//! A view builder returns `Result`; the boundary turns an error into a
//! fallback model the page shell renders instead, with the error text tucked
//! behind a details toggle and a reload button.
//!
//! Every page leaves through the same envelope: `{"kind": "view", "view": ...}`
//! or `{"kind": "fallback", "fallback": ...}`.

use serde::Serialize;
use thiserror::Error;

use crate::console;

pub const FALLBACK_TITLE: &str = "Oops! Une erreur s'est produite";
pub const FALLBACK_SUBTITLE: &str = "Quelque chose ne s'est pas passé comme prévu.";

/// Why a view model could not be built from the data at hand
#[derive(Debug, Error)]
pub enum ViewError {
    #[error("Données invalides ({what}): {detail}")]
    Malformed { what: &'static str, detail: String },

    #[error("Sérialisation impossible: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ViewError {
    pub fn malformed(what: &'static str, detail: impl Into<String>) -> Self {
        ViewError::Malformed {
            what,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackAction {
    /// Reload the page
    Reload,
    /// Navigate back to the dashboard
    Home,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fallback {
    pub title: String,
    pub subtitle: String,
    pub detail: String,
    pub actions: Vec<FallbackAction>,
}

impl Fallback {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            title: FALLBACK_TITLE.to_string(),
            subtitle: FALLBACK_SUBTITLE.to_string(),
            detail: detail.into(),
            actions: vec![FallbackAction::Reload, FallbackAction::Home],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rendered<V> {
    View { view: V },
    Fallback { fallback: Fallback },
}

/// Build a view, substituting the fallback on error
pub fn render<V, E, F>(name: &str, build: F) -> Rendered<V>
where
    E: std::fmt::Display,
    F: FnOnce() -> Result<V, E>,
{
    match build() {
        Ok(view) => Rendered::View { view },
        Err(err) => {
            console::error(&format!("Error Boundary caught an error in {}: {}", name, err));
            Rendered::Fallback {
                fallback: Fallback::new(err.to_string()),
            }
        }
    }
}

/// Build a view and serialize the outcome for the page shell
pub fn render_json<V, F>(name: &str, build: F) -> String
where
    V: Serialize,
    F: FnOnce() -> Result<V, ViewError>,
{
    to_json(&render(name, build))
}

/// Envelope a view that has nothing left to fail on
pub fn view_json<V: Serialize>(view: &V) -> String {
    to_json(&Rendered::View { view })
}

/// Serialize a rendered view for the page shell
pub fn to_json<V: Serialize>(rendered: &Rendered<V>) -> String {
    serde_json::to_string(rendered).unwrap_or_else(|e| {
        console::error(&format!("Error Boundary could not serialize a view: {}", e));
        fallback_json(&e.to_string())
    })
}

/// Fallback envelope assembled without going through `Serialize`
pub fn fallback_json(detail: &str) -> String {
    serde_json::json!({
        "kind": "fallback",
        "fallback": {
            "title": FALLBACK_TITLE,
            "subtitle": FALLBACK_SUBTITLE,
            "detail": detail,
            "actions": ["reload", "home"],
        }
    })
    .to_string()
}
