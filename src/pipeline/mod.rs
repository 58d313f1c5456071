//! Text-to-archive pipeline: plan parsing, block extraction, endpoint
//! scanning, and archive assembly.

pub mod archive;
pub mod blocks;
pub mod endpoints;
pub mod plan;

use serde::{Deserialize, Serialize};

pub use archive::{build_archive, read_archive};
pub use blocks::extract_files;
pub use endpoints::{build_endpoint_map, EndpointRecord};
pub use plan::{extract_plan, FileManifestEntry, PlanAccumulator};

/// One extracted file: a relative path and its full content.
///
/// Path uniqueness is not enforced here; when duplicates reach the archive
/// the last write wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    /// Relative forward-slash path as emitted by the model, trimmed.
    pub path: String,
    /// File content, trimmed of surrounding whitespace.
    pub content: String,
}
