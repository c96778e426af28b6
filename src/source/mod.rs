pub mod http;
pub mod memory;

use futures::future::BoxFuture;
use thiserror::Error;

use crate::model::Page;

pub use http::{BuildError, HttpOptions, HttpRecordSource};
pub use memory::MemorySource;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request for page {page} failed: {source}")]
    Request {
        page: usize,
        #[source]
        source: reqwest::Error,
    },

    #[error("page {page} returned HTTP {status}")]
    Status { page: usize, status: u16 },

    #[error("failed to decode page {page}: {source}")]
    Decode {
        page: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("page {page} unavailable: {message}")]
    Unavailable { page: usize, message: String },
}

impl FetchError {
    pub fn page(&self) -> usize {
        match self {
            FetchError::Request { page, .. }
            | FetchError::Status { page, .. }
            | FetchError::Decode { page, .. }
            | FetchError::Unavailable { page, .. } => *page,
        }
    }
}

/// Anything that can produce one page of the position-ordered collection.
///
/// `index` is zero-based. Implementations return a complete [`Page`] or an
/// error, never a mix of fresh items and a stale total. The returned future
/// is `Send` so loads can be spawned onto the runtime.
pub trait RecordSource: Send + Sync {
    fn load_page(&self, index: usize, page_size: usize) -> BoxFuture<'_, Result<Page, FetchError>>;
}
