use std::future::Future;
use std::sync::Arc;

use thiserror::Error;

use crate::bulk::{BulkError, BulkOutcome, BulkSelector};
use crate::model::{Page, Record, DEFAULT_PAGE_SIZE};
use crate::pagination::{Completion, LoadState, PageTicket, PaginationController};
use crate::selection::{SelectionDelta, SelectionStore};
use crate::source::{
    BuildError, FetchError, HttpOptions, HttpRecordSource, MemorySource, RecordSource,
};
use crate::utils;

#[derive(Clone, Debug)]
pub enum SourceKind {
    Http(HttpOptions),
    Demo(usize),
}

#[derive(Clone, Debug)]
pub struct Options {
    pub source: SourceKind,
    pub page_size: usize,
    pub start_page: usize,
    pub reuse_cached_page: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            source: SourceKind::Http(HttpOptions::default()),
            page_size: DEFAULT_PAGE_SIZE,
            start_page: 0,
            reuse_cached_page: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid page_size {value}, expected positive integer")]
    InvalidPageSize { value: usize },

    #[error(transparent)]
    Source(#[from] BuildError),
}

/// What the table view renders.
#[derive(Clone, Debug)]
pub struct TableView<'a> {
    pub page: &'a Page,
    pub loading: bool,
    pub state: &'a LoadState,
    pub page_size: usize,
    pub page_count: usize,
    pub checked: Vec<&'a Record>,
    pub selection: Vec<&'a Record>,
}

/// All state behind one table: the page being shown, the selection that
/// spans pages, and the record source both are filled from.
pub struct Session {
    source: Arc<dyn RecordSource>,
    controller: PaginationController,
    selection: SelectionStore,
    bulk: BulkSelector,
    start_page: usize,
}

impl Session {
    pub fn new(options: Options) -> Result<Self, SessionError> {
        let source: Arc<dyn RecordSource> = match &options.source {
            SourceKind::Http(http) => Arc::new(HttpRecordSource::new(http)?),
            SourceKind::Demo(count) => Arc::new(MemorySource::demo(*count)),
        };
        Self::with_source(source, &options)
    }

    pub fn with_source(
        source: Arc<dyn RecordSource>,
        options: &Options,
    ) -> Result<Self, SessionError> {
        if options.page_size == 0 {
            return Err(SessionError::InvalidPageSize {
                value: options.page_size,
            });
        }
        Ok(Self {
            source,
            controller: PaginationController::new(options.page_size),
            selection: SelectionStore::new(),
            bulk: BulkSelector::new().reuse_cached(options.reuse_cached_page),
            start_page: options.start_page,
        })
    }

    pub fn controller(&self) -> &PaginationController {
        &self.controller
    }

    pub fn selection(&self) -> &SelectionStore {
        &self.selection
    }

    pub fn page(&self) -> &Page {
        self.controller.page()
    }

    pub fn loading(&self) -> bool {
        self.controller.cache().loading()
    }

    pub fn start_page(&self) -> usize {
        self.start_page
    }

    pub fn view(&self) -> TableView<'_> {
        TableView {
            page: self.controller.page(),
            loading: self.loading(),
            state: self.controller.state(),
            page_size: self.controller.page_size(),
            page_count: self
                .controller
                .last_known_page_count()
                .unwrap_or_else(|| self.controller.page_count()),
            checked: self.selection.checked_on(self.controller.page()),
            selection: self.selection.list(),
        }
    }

    /// Registers navigation to `page` and returns the ticket its response
    /// must be completed with.
    pub fn on_page_change(&mut self, page: usize) -> PageTicket {
        self.controller.request(page)
    }

    /// The fetch for `ticket`, detached from the session so it can run
    /// while the user keeps navigating.
    pub fn load_for(
        &self,
        ticket: PageTicket,
    ) -> impl Future<Output = (PageTicket, Result<Page, FetchError>)> + Send + 'static {
        let source = Arc::clone(&self.source);
        let page_size = self.controller.page_size();
        async move {
            let result = source.load_page(ticket.page(), page_size).await;
            (ticket, result)
        }
    }

    pub fn on_page_loaded(
        &mut self,
        ticket: PageTicket,
        result: Result<Page, FetchError>,
    ) -> Completion {
        self.controller.complete(ticket, result)
    }

    pub async fn go_to(&mut self, page: usize) -> Completion {
        self.controller.navigate(self.source.as_ref(), page).await
    }

    /// Page after the one being loaded or shown. Bounded by the last total
    /// the source reported; unbounded until one is known.
    pub fn next_page(&self) -> Option<usize> {
        let next = self.controller.target_page() + 1;
        match self.controller.last_known_page_count() {
            Some(count) => (next < count).then_some(next),
            None => Some(next),
        }
    }

    pub fn prev_page(&self) -> Option<usize> {
        self.controller.target_page().checked_sub(1)
    }

    /// Checkbox report from the table: `checked` is every checked row of
    /// the visible page. Selections on other pages are kept.
    pub fn on_selection_change(&mut self, checked: &[Record]) -> SelectionDelta {
        self.selection.apply_visible(self.controller.page(), checked)
    }

    /// Same as [`Session::on_selection_change`] with rows given by id. Ids
    /// not on the visible page are ignored.
    pub fn check_visible(&mut self, ids: &[u64]) -> SelectionDelta {
        let checked: Vec<Record> = self
            .controller
            .page()
            .items
            .iter()
            .filter(|r| ids.contains(&r.id))
            .cloned()
            .collect();
        self.on_selection_change(&checked)
    }

    /// Flips one visible row. Returns `None` if `id` is not on screen.
    pub fn toggle(&mut self, id: u64) -> Option<bool> {
        let record = self.controller.page().get(id)?;
        Some(self.selection.toggle(record))
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub async fn select_first_n(&mut self, n: usize) -> Result<BulkOutcome, BulkError> {
        self.bulk
            .select_first_n(
                n,
                &mut self.controller,
                &mut self.selection,
                self.source.as_ref(),
            )
            .await
    }

    /// Handles the raw text of the count box. Input with no digits is
    /// rejected without touching the selection.
    pub async fn submit_count(&mut self, raw: &str) -> Result<Option<BulkOutcome>, BulkError> {
        match utils::parse_count(raw) {
            Some(n) => self.select_first_n(n).await.map(Some),
            None => {
                log::debug!("ignoring empty count input");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_page_size_is_rejected() {
        let opts = Options {
            source: SourceKind::Demo(10),
            page_size: 0,
            ..Options::default()
        };
        assert!(matches!(
            Session::new(opts),
            Err(SessionError::InvalidPageSize { value: 0 })
        ));
    }

    #[tokio::test]
    async fn next_and_prev_respect_bounds() {
        let opts = Options {
            source: SourceKind::Demo(25),
            ..Options::default()
        };
        let mut session = Session::new(opts).unwrap();
        assert!(session.go_to(0).await.is_applied());
        assert_eq!(session.prev_page(), None);
        assert_eq!(session.next_page(), Some(1));
        assert!(session.go_to(2).await.is_applied());
        assert_eq!(session.next_page(), None);
        assert_eq!(session.prev_page(), Some(1));
    }

    #[tokio::test]
    async fn next_follows_the_page_still_loading() {
        let opts = Options {
            source: SourceKind::Demo(25),
            ..Options::default()
        };
        let mut session = Session::new(opts).unwrap();
        assert!(session.go_to(0).await.is_applied());

        let first = session.next_page().unwrap();
        let t1 = session.on_page_change(first);
        assert_eq!(first, 1);
        assert_eq!(session.next_page(), Some(2));
        let t2 = session.on_page_change(2);
        assert_eq!(session.prev_page(), Some(1));
        assert_eq!(session.next_page(), None);

        let (t1, r1) = session.load_for(t1).await;
        assert!(matches!(session.on_page_loaded(t1, r1), Completion::Stale));
        let (t2, r2) = session.load_for(t2).await;
        assert!(session.on_page_loaded(t2, r2).is_applied());
        assert_eq!(session.page().index, 2);
    }

    #[test]
    fn next_is_open_before_anything_loads() {
        let opts = Options {
            source: SourceKind::Demo(25),
            ..Options::default()
        };
        let session = Session::new(opts).unwrap();
        assert_eq!(session.next_page(), Some(1));
        assert_eq!(session.prev_page(), None);
    }

    #[tokio::test]
    async fn detached_load_completes_through_ticket() {
        let opts = Options {
            source: SourceKind::Demo(25),
            ..Options::default()
        };
        let mut session = Session::new(opts).unwrap();
        let ticket = session.on_page_change(1);
        let (ticket, result) = tokio::spawn(session.load_for(ticket)).await.unwrap();
        assert!(session.on_page_loaded(ticket, result).is_applied());
        let view = session.view();
        assert_eq!(view.page.index, 1);
        assert_eq!(view.page_count, 3);
        assert!(!view.loading);
    }

    #[tokio::test]
    async fn toggle_only_addresses_visible_rows() {
        let opts = Options {
            source: SourceKind::Demo(25),
            ..Options::default()
        };
        let mut session = Session::new(opts).unwrap();
        session.go_to(0).await;
        assert_eq!(session.toggle(3), Some(true));
        assert_eq!(session.toggle(15), None);
        assert_eq!(session.view().checked.len(), 1);
        assert_eq!(session.toggle(3), Some(false));
        assert!(session.selection().is_empty());
    }
}
