//! Wire model for the DPGF backend
//!
//! Every type here mirrors a JSON payload of the REST API. Field names are the
//! backend's (French) names so the structs deserialize without renaming, and
//! anything the server may omit or send as `null` deserializes to an empty or
//! `None` value instead of failing.

mod de;

pub mod client;
pub mod document;
pub mod listing;
pub mod search;

pub use client::{Client, NewClient};
pub use document::{ClientRef, DocumentSummary, DpgfStructure, LineItem, Lot, NewDocument, Section};
pub use listing::{ElementRow, ElementWithSection, LotRow, SectionRow};
pub use search::{
    DpgfInfo, FuzzyHit, HistoricalPriceAnalysis, LotInfo, PlainElement, PriceRange,
    SearchResult, SectionInfo, SimilarPriceHit, Trend, YearlyAverage,
};
