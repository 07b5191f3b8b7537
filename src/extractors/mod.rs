//! Markup-to-record extraction
//!
//! Turns a scraped node-list page into normalized [`Record`]s. The HTTP
//! layer only sees the [`RecordSource`] trait, so the parsing strategy can
//! be swapped without touching the routes.

mod table_extractor;

pub use table_extractor::*;

use serde::{Deserialize, Serialize};

/// Status tag attached to every record of the keyed view.
pub const KEYED_STATUS: &str = "keyed";

/// One normalized node row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Upstream node identifier, kept as text.
    pub id: String,
    /// Callsign or tag; empty when the row has no second cell.
    pub label: String,
    pub location: String,
    pub description: String,
    /// Only set in [`ViewMode::Keyed`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Which page the markup came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// Currently keyed nodes; records carry [`KEYED_STATUS`].
    Keyed,
    /// Node-list search results; records carry no status.
    Search,
}

/// What a lookup does when no row carries a matching `data-node` attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LookupFallback {
    /// Report the node as missing.
    #[default]
    NotFound,
    /// Take the second row of the table, whatever node it describes.
    SecondRow,
}

/// Source of records for a fetched page.
pub trait RecordSource: Send + Sync {
    /// All data rows of the page, in document order.
    fn records(&self, markup: &str, mode: ViewMode) -> Vec<Record>;

    /// The row describing `id`, if one can be located.
    fn lookup(&self, markup: &str, id: &str, fallback: LookupFallback) -> Option<Record>;
}
