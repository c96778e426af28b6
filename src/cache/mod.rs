use crate::model::{self, Page};

/// The one page of records currently materialized, plus the loading flag.
///
/// Writes are crate-private: the pagination controller and the bulk walk
/// are the only writers, and every write swaps in a whole [`Page`].
#[derive(Clone, Debug, Default)]
pub struct PageCache {
    page: Page,
    loading: bool,
    loaded: bool,
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn index(&self) -> usize {
        self.page.index
    }

    pub fn total_count(&self) -> usize {
        self.page.total_count
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    /// Whether the held page came from a successful load.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn page_count(&self, page_size: usize) -> usize {
        model::page_count(self.page.total_count, page_size)
    }

    pub(crate) fn replace(&mut self, page: Page) -> Page {
        self.loaded = true;
        std::mem::replace(&mut self.page, page)
    }

    pub(crate) fn clear(&mut self, index: usize) {
        self.loaded = false;
        self.page = Page::empty(index);
    }

    pub(crate) fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub(crate) fn snapshot(&self) -> CacheSnapshot {
        CacheSnapshot {
            page: self.page.clone(),
            loading: self.loading,
            loaded: self.loaded,
        }
    }

    pub(crate) fn restore(&mut self, snapshot: CacheSnapshot) {
        self.page = snapshot.page;
        self.loading = snapshot.loading;
        self.loaded = snapshot.loaded;
    }
}

#[derive(Clone, Debug)]
pub(crate) struct CacheSnapshot {
    page: Page,
    loading: bool,
    loaded: bool,
}

impl CacheSnapshot {
    pub(crate) fn page(&self) -> &Page {
        &self.page
    }

    pub(crate) fn loaded(&self) -> bool {
        self.loaded
    }
}
