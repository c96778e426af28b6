use std::num::NonZeroU32;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use thiserror::Error;

use super::{FetchError, RecordSource};
use crate::model::{Page, RecordsResponse};

pub const DEFAULT_BASE_URL: &str = "https://api.artic.edu/api/v1/artworks";

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

const RECORD_FIELDS: &str =
    "id,title,place_of_origin,artist_display,inscriptions,date_start,date_end";

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid base URL: {url}")]
    InvalidBaseUrl { url: String },

    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Clone, Debug)]
pub struct HttpOptions {
    pub base_url: String,
    pub timeout_seconds: usize,
    pub proxy: Option<String>,
    pub user_agent: String,
    // requests per second, 0 disables the limiter
    pub rate: u32,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: 10,
            proxy: None,
            user_agent: format!("artpick/{}", env!("CARGO_PKG_VERSION")),
            rate: 0,
        }
    }
}

/// Loads pages from the artworks endpoint, `GET <base>?page=<1-based>&limit=<size>`.
pub struct HttpRecordSource {
    client: reqwest::Client,
    base_url: reqwest::Url,
    limiter: Option<DirectLimiter>,
}

impl HttpRecordSource {
    pub fn new(options: &HttpOptions) -> Result<Self, BuildError> {
        let base_url = reqwest::Url::parse(options.base_url.trim()).map_err(|_| {
            BuildError::InvalidBaseUrl {
                url: options.base_url.clone(),
            }
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(BuildError::InvalidBaseUrl {
                url: options.base_url.clone(),
            });
        }
        let client = build_client(options)?;
        let limiter = NonZeroU32::new(options.rate)
            .map(|rate| RateLimiter::direct(Quota::per_second(rate)));
        Ok(Self {
            client,
            base_url,
            limiter,
        })
    }

    pub fn base_url(&self) -> &reqwest::Url {
        &self.base_url
    }

    pub fn page_url(&self, index: usize, page_size: usize) -> reqwest::Url {
        page_url(&self.base_url, index, page_size)
    }

    async fn fetch(&self, index: usize, page_size: usize) -> Result<Page, FetchError> {
        if let Some(lim) = self.limiter.as_ref() {
            lim.until_ready().await;
        }
        let url = self.page_url(index, page_size);
        log::debug!("GET {url}");

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Request {
                page: index,
                source: e,
            })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                page: index,
                status: status.as_u16(),
            });
        }
        let body = resp.bytes().await.map_err(|e| FetchError::Request {
            page: index,
            source: e,
        })?;
        decode_page(&body, index, page_size)
    }
}

impl RecordSource for HttpRecordSource {
    fn load_page(&self, index: usize, page_size: usize) -> BoxFuture<'_, Result<Page, FetchError>> {
        self.fetch(index, page_size).boxed()
    }
}

pub(crate) fn page_url(base: &reqwest::Url, index: usize, page_size: usize) -> reqwest::Url {
    let mut url = base.clone();
    url.query_pairs_mut()
        .append_pair("page", &(index + 1).to_string())
        .append_pair("limit", &page_size.to_string())
        .append_pair("fields", RECORD_FIELDS);
    url
}

pub(crate) fn decode_page(body: &[u8], index: usize, page_size: usize) -> Result<Page, FetchError> {
    let resp: RecordsResponse = serde_json::from_slice(body).map_err(|e| FetchError::Decode {
        page: index,
        source: e,
    })?;
    Ok(resp.into_page(index, page_size))
}

fn build_client(options: &HttpOptions) -> Result<reqwest::Client, BuildError> {
    let mut headers = reqwest::header::HeaderMap::new();
    if let Ok(value) = reqwest::header::HeaderValue::from_str(options.user_agent.trim()) {
        headers.insert(reqwest::header::USER_AGENT, value);
    }
    headers.insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static("application/json"),
    );

    let timeout = Duration::from_secs(options.timeout_seconds.try_into().unwrap_or(10));
    let mut builder = reqwest::Client::builder()
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(10))
        .timeout(timeout);

    if let Some(proxy) = options.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
        let proxy = reqwest::Proxy::all(proxy).map_err(|e| BuildError::ProxySetup {
            proxy: proxy.to_string(),
            source: e,
        })?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| BuildError::ClientBuild { source: e })
}
