//! Filesystem listing helpers.
//!
//! # Data Flow
//! ```text
//! directory path
//!     → entries.rs (read_dir + metadata → EntryInfo)
//!     → sorting.rs (directories first, then by name / date / size)
//!     → caller renders the listing
//! ```

pub mod entries;
pub mod mime;
pub mod sorting;

pub use crate::base::paths::canonical_path;
pub use entries::{extract_names, read_entries, EntryInfo};
pub use mime::mime_type;
pub use sorting::{sort_entries, ParseSortError, SortBy, SortDirection};
