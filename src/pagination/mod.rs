use crate::cache::PageCache;
use crate::model::{page_count, Page, DEFAULT_PAGE_SIZE};
use crate::source::{FetchError, RecordSource};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading { page: usize },
    Errored { page: usize, message: String },
}

/// Handle for one page request. Only the most recently issued ticket is
/// allowed to write its response into the cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageTicket {
    page: usize,
    generation: u64,
}

impl PageTicket {
    pub fn page(&self) -> usize {
        self.page
    }
}

#[derive(Debug)]
pub enum Completion {
    Applied,
    Stale,
    Failed(FetchError),
}

impl Completion {
    pub fn is_applied(&self) -> bool {
        matches!(self, Completion::Applied)
    }
}

/// Owns the [`PageCache`] and the loading/error state.
#[derive(Debug)]
pub struct PaginationController {
    cache: PageCache,
    state: LoadState,
    page_size: usize,
    generation: u64,
    pending: Option<PageTicket>,
    last_total: Option<usize>,
}

impl Default for PaginationController {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl PaginationController {
    /// `page_size` must be at least one, zero is bumped to one.
    pub fn new(page_size: usize) -> Self {
        Self {
            cache: PageCache::new(),
            state: LoadState::Idle,
            page_size: page_size.max(1),
            generation: 0,
            pending: None,
            last_total: None,
        }
    }

    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    pub(crate) fn cache_mut(&mut self) -> &mut PageCache {
        &mut self.cache
    }

    pub fn page(&self) -> &Page {
        self.cache.page()
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_count(&self) -> usize {
        self.cache.page_count(self.page_size)
    }

    /// Total record count, if the cache holds a successfully loaded page.
    pub fn known_total(&self) -> Option<usize> {
        self.cache.is_loaded().then(|| self.cache.total_count())
    }

    pub fn pending(&self) -> Option<PageTicket> {
        self.pending
    }

    /// The page the table is heading to: the one still loading, else the
    /// one on screen.
    pub fn target_page(&self) -> usize {
        self.pending.map_or(self.cache.index(), |t| t.page)
    }

    /// Total from the most recent successful load. Survives a failed load,
    /// which clears the cache.
    pub fn last_known_total(&self) -> Option<usize> {
        self.last_total
    }

    /// Pages implied by [`PaginationController::last_known_total`].
    pub fn last_known_page_count(&self) -> Option<usize> {
        self.last_total.map(|total| page_count(total, self.page_size))
    }

    /// Starts a load of `page`, superseding any load still in flight.
    pub fn request(&mut self, page: usize) -> PageTicket {
        self.generation += 1;
        let ticket = PageTicket {
            page,
            generation: self.generation,
        };
        if let Some(prev) = self.pending.replace(ticket) {
            log::debug!("page {} request superseded by page {}", prev.page, page);
        }
        self.state = LoadState::Loading { page };
        self.cache.set_loading(true);
        ticket
    }

    /// Applies the response for `ticket` unless a newer request was issued.
    ///
    /// A failed load clears the cache to an empty page at the requested
    /// index with a zero total, so the table never shows rows that do not
    /// belong to the page it claims to be on.
    pub fn complete(&mut self, ticket: PageTicket, result: Result<Page, FetchError>) -> Completion {
        if self.pending != Some(ticket) {
            log::debug!("discarding stale response for page {}", ticket.page);
            return Completion::Stale;
        }
        self.pending = None;
        self.cache.set_loading(false);
        match result {
            Ok(mut page) => {
                page.index = ticket.page;
                page.items.truncate(self.page_size);
                log::debug!(
                    "page {} loaded: {} records of {}",
                    ticket.page,
                    page.items.len(),
                    page.total_count
                );
                self.last_total = Some(page.total_count);
                self.cache.replace(page);
                self.state = LoadState::Idle;
                Completion::Applied
            }
            Err(e) => {
                log::warn!("failed to load page {}: {}", ticket.page, e);
                self.cache.clear(ticket.page);
                self.state = LoadState::Errored {
                    page: ticket.page,
                    message: e.to_string(),
                };
                Completion::Failed(e)
            }
        }
    }

    /// Requests, fetches and applies `page` in one step.
    pub async fn navigate(&mut self, source: &dyn RecordSource, page: usize) -> Completion {
        let ticket = self.request(page);
        let result = source.load_page(page, self.page_size).await;
        self.complete(ticket, result)
    }
}
