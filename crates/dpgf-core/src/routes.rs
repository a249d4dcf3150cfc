//! Client-side routes
//!
//! | Path          | Route                 |
//! |---------------|-----------------------|
//! | `/`           | [`Route::Dashboard`]  |
//! | `/dpgf/:id`   | [`Route::Document`]   |
//! | `/search`     | [`Route::Search`]     |
//! | `/search-test`| [`Route::Diagnostics`]|
//! | anything else | [`Route::NotFound`]   |

use serde::Serialize;

use crate::error::{DpgfError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum Route {
    Dashboard,
    Document { id: i64 },
    Search,
    Diagnostics,
    NotFound { path: String },
}

impl Route {
    /// Resolve a location path; query string and fragment are ignored
    pub fn parse(location: &str) -> Self {
        let path = location
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_end_matches('/');
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Route::Dashboard,
            ["dpgf", id] => match id.parse::<i64>() {
                Ok(id) => Route::Document { id },
                Err(_) => Route::NotFound {
                    path: location.to_string(),
                },
            },
            ["search"] => Route::Search,
            ["search-test"] => Route::Diagnostics,
            _ => Route::NotFound {
                path: location.to_string(),
            },
        }
    }

    /// Like [`parse`](Self::parse) but unknown paths are an error
    pub fn resolve(location: &str) -> Result<Self> {
        match Self::parse(location) {
            Route::NotFound { path } => Err(DpgfError::InvalidRoute(path)),
            route => Ok(route),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Dashboard => "/".to_string(),
            Route::Document { id } => format!("/dpgf/{}", id),
            Route::Search => "/search".to_string(),
            Route::Diagnostics => "/search-test".to_string(),
            Route::NotFound { path } => path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_routes() {
        assert_eq!(Route::parse("/"), Route::Dashboard);
        assert_eq!(Route::parse(""), Route::Dashboard);
        assert_eq!(Route::parse("/dpgf/42"), Route::Document { id: 42 });
        assert_eq!(Route::parse("/dpgf/42/?tab=table"), Route::Document { id: 42 });
        assert_eq!(Route::parse("/search#top"), Route::Search);
        assert_eq!(Route::parse("/search-test"), Route::Diagnostics);
    }

    #[test]
    fn test_unknown_paths_are_not_found() {
        assert_eq!(
            Route::parse("/dpgf/abc"),
            Route::NotFound {
                path: "/dpgf/abc".to_string()
            }
        );
        assert!(matches!(Route::parse("/clients"), Route::NotFound { .. }));
        assert!(matches!(
            Route::resolve("/dpgf"),
            Err(DpgfError::InvalidRoute(_))
        ));
    }

    #[test]
    fn test_path_round_trips() {
        for route in [Route::Dashboard, Route::Document { id: 7 }, Route::Search, Route::Diagnostics] {
            assert_eq!(Route::parse(&route.path()), route);
        }
    }
}
