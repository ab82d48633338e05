//! Two-tier search: fuzzy filename matching and regex content matching
//! over a sandboxed directory tree.

mod cancel;
mod config;
mod content;
mod filename;

pub use cancel::Cancellation;
pub use config::{default_skip_dirs, default_text_extensions, SearchConfig};
pub use content::{search_content, ContentSearchError, ContentSearchOptions, SearchMatch};
pub use filename::{search_filenames, FileMatch};
