//! Client-side engine of the DPGF front-end
//!
//! Everything the browser app needs that does not touch the DOM:
//! - `money` / `accessor`: display formatting and tolerant JSON access
//! - `rollup` / `flatten` / `memo`: derived views of a fetched document
//! - `normalize` / `search` / `debounce` / `stale`: the search workflow
//! - `endpoint` / `client` / `cache` / `query`: talking to the backend
//! - `routes` / `config` / `error`: app plumbing

pub mod accessor;
pub mod cache;
pub mod client;
pub mod config;
pub mod debounce;
pub mod endpoint;
pub mod error;
pub mod flatten;
pub mod memo;
pub mod money;
pub mod normalize;
pub mod query;
pub mod rollup;
pub mod routes;
pub mod search;
pub mod stale;

pub use cache::{CacheEvent, Lookup, QueryCache, QueryKey};
pub use client::{DpgfClient, Mutation, ProbeStatus, Transport};
pub use config::AppConfig;
pub use debounce::Debouncer;
pub use endpoint::{ApiRequest, ApiResponse, Body, Endpoint, Method, Page};
pub use error::{DpgfError, Result};
pub use flatten::{flatten, grand_total, FlatRow};
pub use memo::Memo;
pub use money::{format_price, format_price_tolerant};
pub use normalize::{normalize, RawSearchHit, SourceKind};
pub use query::{QueryState, RetryPolicy};
pub use rollup::{document_total, lot_total, section_total, Rollup};
pub use routes::Route;
pub use search::{SearchMachine, SearchOutput, SearchPhase, SearchRequest, SearchVariant};
pub use stale::{StaleGuard, Ticket};
