use futures::stream::{self, Stream, StreamExt};
use thiserror::Error;

use crate::cache::{CacheSnapshot, PageCache};
use crate::model::{Page, Record};
use crate::pagination::PaginationController;
use crate::selection::SelectionStore;
use crate::source::{FetchError, RecordSource};

#[derive(Debug, Error)]
pub enum BulkError {
    #[error("bulk selection aborted, page {page} failed to load: {source}")]
    Walk {
        page: usize,
        #[source]
        source: FetchError,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    pub requested: usize,
    pub selected: usize,
    pub pages_fetched: usize,
}

/// Selects the first N records of the whole collection by position.
#[derive(Clone, Debug)]
pub struct BulkSelector {
    reuse_cached: bool,
}

impl Default for BulkSelector {
    fn default() -> Self {
        Self { reuse_cached: true }
    }
}

impl BulkSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set (the default), the walk uses the page already held in the
    /// cache instead of fetching that index again.
    pub fn reuse_cached(mut self, reuse: bool) -> Self {
        self.reuse_cached = reuse;
        self
    }

    /// Replaces the selection with the records at global positions `0..n`.
    ///
    /// `n` is clamped to the collection size. Pages are fetched one at a time
    /// from page 0 until `n` records are known or the collection runs out.
    /// The cache is handed back exactly as it was before the call, whether
    /// the walk succeeds, fails, or is dropped halfway. On failure the
    /// selection is not touched.
    pub async fn select_first_n(
        &self,
        n: usize,
        controller: &mut PaginationController,
        selection: &mut SelectionStore,
        source: &dyn RecordSource,
    ) -> Result<BulkOutcome, BulkError> {
        let page_size = controller.page_size();
        let mut target = match controller.known_total() {
            Some(total) => n.min(total),
            None => n,
        };
        if target == 0 {
            selection.clear();
            log::info!("bulk selection of {n} cleared the selection");
            return Ok(BulkOutcome {
                requested: n,
                ..Default::default()
            });
        }

        let snapshot = controller.cache().snapshot();
        let cached = (self.reuse_cached && snapshot.loaded()).then(|| snapshot.page().clone());
        let guard = RestoreGuard::new(controller.cache_mut(), snapshot);
        guard.cache.set_loading(true);

        let walk = page_walk(source, page_size, cached);
        futures::pin_mut!(walk);

        let mut picked: Vec<Record> = Vec::with_capacity(target.min(page_size.saturating_mul(64)));
        let mut pages_fetched = 0;
        while picked.len() < target {
            let Some(step) = walk.next().await else {
                break;
            };
            let walked = step.map_err(|e| BulkError::Walk {
                page: e.page(),
                source: e,
            })?;
            if walked.fetched {
                pages_fetched += 1;
            }
            target = target.min(walked.page.total_count);
            picked.extend(walked.page.items.iter().cloned());
            guard.cache.replace(walked.page);
        }
        drop(guard);

        picked.truncate(target);
        let selected = picked.len();
        selection.set_selection(picked);
        log::info!(
            "bulk selected {selected} of {n} requested records ({pages_fetched} pages fetched)"
        );
        Ok(BulkOutcome {
            requested: n,
            selected,
            pages_fetched,
        })
    }
}

// puts the cache back when the walk ends, however it ends
struct RestoreGuard<'a> {
    cache: &'a mut PageCache,
    snapshot: Option<CacheSnapshot>,
}

impl<'a> RestoreGuard<'a> {
    fn new(cache: &'a mut PageCache, snapshot: CacheSnapshot) -> Self {
        Self {
            cache,
            snapshot: Some(snapshot),
        }
    }
}

impl Drop for RestoreGuard<'_> {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.cache.restore(snapshot);
        }
    }
}

struct WalkedPage {
    page: Page,
    fetched: bool,
}

struct WalkState<'a> {
    source: &'a dyn RecordSource,
    page_size: usize,
    next: usize,
    total: Option<usize>,
    done: bool,
    cached: Option<Page>,
}

// lazy sequence of pages 0, 1, 2, ... ending on a short page, on the
// reported total, or after the first error. nothing is fetched until polled.
fn page_walk<'a>(
    source: &'a dyn RecordSource,
    page_size: usize,
    cached: Option<Page>,
) -> impl Stream<Item = Result<WalkedPage, FetchError>> + 'a {
    let state = WalkState {
        source,
        page_size,
        next: 0,
        total: None,
        done: false,
        cached,
    };
    stream::unfold(state, |mut st| async move {
        if st.done {
            return None;
        }
        if let Some(total) = st.total {
            if st.next.saturating_mul(st.page_size) >= total {
                return None;
            }
        }
        let index = st.next;
        let reused = match st.cached.take() {
            Some(page) if page.index == index => Some(page),
            other => {
                st.cached = other;
                None
            }
        };
        let step = match reused {
            Some(page) => Ok(WalkedPage {
                page,
                fetched: false,
            }),
            None => {
                log::debug!("bulk walk fetching page {index}");
                st.source
                    .load_page(index, st.page_size)
                    .await
                    .map(|mut page| {
                        page.index = index;
                        page.items.truncate(st.page_size);
                        WalkedPage {
                            page,
                            fetched: true,
                        }
                    })
            }
        };
        match &step {
            Ok(walked) => {
                st.total = Some(walked.page.total_count);
                if walked.page.items.len() < st.page_size {
                    st.done = true;
                }
                st.next += 1;
            }
            Err(_) => st.done = true,
        }
        Some((step, st))
    })
}
