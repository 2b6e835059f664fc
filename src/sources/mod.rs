//! Module sources.
//!
//! Sources are responsible for getting bytes from a remote location onto
//! the local disk. Release assets are addressed by convention; the fetcher
//! itself knows nothing about modules.

pub mod fetcher;
pub mod http;
pub mod release;

pub use fetcher::{FetchError, Fetcher};
pub use http::HttpFetcher;
pub use release::{ReleaseLayout, COMPANION_ARCHIVE_URL, RELEASE_HOST, RELEASE_ORG};
