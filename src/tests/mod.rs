use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::{self, BoxFuture};
use futures::FutureExt;

use crate::bulk::BulkError;
use crate::model::Page;
use crate::pagination::{Completion, LoadState};
use crate::session::{Options, Session, SourceKind};
use crate::source::{FetchError, MemorySource, RecordSource};

struct ScriptedSource {
    inner: MemorySource,
    fetches: Mutex<Vec<usize>>,
    fail_on: HashSet<usize>,
    hang_on: Option<usize>,
}

impl ScriptedSource {
    fn new(count: usize) -> Self {
        Self {
            inner: MemorySource::demo(count),
            fetches: Mutex::new(Vec::new()),
            fail_on: HashSet::new(),
            hang_on: None,
        }
    }

    fn failing_on(mut self, page: usize) -> Self {
        self.fail_on.insert(page);
        self
    }

    fn hanging_on(mut self, page: usize) -> Self {
        self.hang_on = Some(page);
        self
    }

    fn fetches(&self) -> Vec<usize> {
        self.fetches.lock().unwrap().clone()
    }

    fn reset(&self) {
        self.fetches.lock().unwrap().clear();
    }
}

impl RecordSource for ScriptedSource {
    fn load_page(&self, index: usize, page_size: usize) -> BoxFuture<'_, Result<Page, FetchError>> {
        self.fetches.lock().unwrap().push(index);
        if self.hang_on == Some(index) {
            return future::pending().boxed();
        }
        if self.fail_on.contains(&index) {
            return future::ready(Err(FetchError::Unavailable {
                page: index,
                message: "injected failure".to_string(),
            }))
            .boxed();
        }
        self.inner.load_page(index, page_size)
    }
}

fn session_over(src: &Arc<ScriptedSource>, reuse_cached_page: bool) -> Session {
    let opts = Options {
        source: SourceKind::Demo(0),
        page_size: 10,
        start_page: 0,
        reuse_cached_page,
    };
    let source: Arc<dyn RecordSource> = src.clone();
    Session::with_source(source, &opts).unwrap()
}

fn selected_ids(session: &Session) -> Vec<u64> {
    session.selection().ids().to_vec()
}

#[tokio::test]
async fn navigating_away_and_back_restores_page() {
    let src = Arc::new(ScriptedSource::new(95));
    let mut session = session_over(&src, true);

    assert!(session.go_to(4).await.is_applied());
    let total = session.page().total_count;
    let items = session.page().items.clone();
    for p in [0, 9, 2] {
        assert!(session.go_to(p).await.is_applied());
        assert!(session.go_to(4).await.is_applied());
        assert_eq!(session.page().index, 4);
        assert_eq!(session.page().total_count, total);
        assert_eq!(session.page().items, items);
    }
}

#[tokio::test]
async fn checkbox_selection_survives_navigation() {
    let src = Arc::new(ScriptedSource::new(40));
    let mut session = session_over(&src, true);

    session.go_to(0).await;
    let delta = session.check_visible(&[3, 7]);
    assert_eq!(delta.added, vec![3, 7]);

    session.go_to(1).await;
    // the table reports an empty checked list for a page with nothing selected
    assert!(session.on_selection_change(&[]).is_empty());
    session.check_visible(&[12]);
    session.go_to(0).await;

    assert_eq!(selected_ids(&session), vec![3, 7, 12]);
    let checked: Vec<u64> = session.view().checked.iter().map(|r| r.id).collect();
    assert_eq!(checked, vec![3, 7]);

    // unchecking 7 on page 0 leaves the page 1 pick alone
    session.check_visible(&[3]);
    assert_eq!(selected_ids(&session), vec![3, 12]);
}

#[tokio::test]
async fn select_zero_clears_without_fetching() {
    let src = Arc::new(ScriptedSource::new(40));
    let mut session = session_over(&src, true);
    session.go_to(0).await;
    session.check_visible(&[1, 2]);
    src.reset();

    let out = session.select_first_n(0).await.unwrap();
    assert_eq!(out.selected, 0);
    assert!(session.selection().is_empty());
    assert!(src.fetches().is_empty());
}

#[tokio::test]
async fn select_first_25_walks_three_pages_and_returns() {
    let src = Arc::new(ScriptedSource::new(40));
    let mut session = session_over(&src, true);
    session.go_to(3).await;
    let before = session.page().clone();
    src.reset();

    let out = session.select_first_n(25).await.unwrap();
    assert_eq!(out.requested, 25);
    assert_eq!(out.selected, 25);
    assert_eq!(out.pages_fetched, 3);
    assert_eq!(src.fetches(), vec![0, 1, 2]);
    assert_eq!(selected_ids(&session), (1..=25).collect::<Vec<u64>>());

    assert_eq!(session.page(), &before);
    assert!(!session.loading());
    assert_eq!(session.controller().state(), &LoadState::Idle);
}

#[tokio::test]
async fn select_reuses_the_visible_page_unless_disabled() {
    let src = Arc::new(ScriptedSource::new(40));
    let mut session = session_over(&src, true);
    session.go_to(1).await;
    src.reset();
    let out = session.select_first_n(25).await.unwrap();
    assert_eq!(out.pages_fetched, 2);
    assert_eq!(src.fetches(), vec![0, 2]);

    let src = Arc::new(ScriptedSource::new(40));
    let mut session = session_over(&src, false);
    session.go_to(1).await;
    src.reset();
    session.select_first_n(25).await.unwrap();
    assert_eq!(src.fetches(), vec![0, 1, 2]);
}

#[tokio::test]
async fn select_more_than_total_clamps() {
    let src = Arc::new(ScriptedSource::new(23));
    let mut session = session_over(&src, true);
    session.go_to(0).await;

    let out = session.select_first_n(1_000).await.unwrap();
    assert_eq!(out.selected, 23);
    assert_eq!(session.selection().count(), 23);
    assert_eq!(session.page().index, 0);
}

#[tokio::test]
async fn bulk_selection_replaces_previous_selection() {
    let src = Arc::new(ScriptedSource::new(40));
    let mut session = session_over(&src, true);
    session.go_to(3).await;
    session.check_visible(&[35, 36]);

    session.select_first_n(5).await.unwrap();
    assert_eq!(selected_ids(&session), vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn failed_walk_leaves_selection_and_page_untouched() {
    let src = Arc::new(ScriptedSource::new(40).failing_on(1));
    let mut session = session_over(&src, false);
    session.go_to(3).await;
    session.check_visible(&[31, 33]);
    let before = session.page().clone();
    src.reset();

    let err = session.select_first_n(25).await.unwrap_err();
    let BulkError::Walk { page, .. } = &err;
    assert_eq!(*page, 1);
    assert!(err.to_string().contains("injected failure"));
    assert_eq!(src.fetches(), vec![0, 1]);

    assert_eq!(selected_ids(&session), vec![31, 33]);
    assert_eq!(session.page(), &before);
    assert!(!session.loading());
    assert!(session.controller().cache().is_loaded());
}

#[tokio::test]
async fn dropped_walk_still_restores_page() {
    let src = Arc::new(ScriptedSource::new(40).hanging_on(1));
    let mut session = session_over(&src, false);
    session.go_to(2).await;
    session.check_visible(&[21]);
    let before = session.page().clone();

    let timed_out = tokio::time::timeout(Duration::from_millis(50), session.select_first_n(25))
        .await
        .is_err();
    assert!(timed_out);
    assert_eq!(session.page(), &before);
    assert!(!session.loading());
    assert_eq!(selected_ids(&session), vec![21]);
}

#[tokio::test]
async fn rapid_navigation_keeps_only_the_last_page() {
    let src = Arc::new(ScriptedSource::new(40));
    let mut session = session_over(&src, true);

    let t0 = session.on_page_change(0);
    let l0 = tokio::spawn(session.load_for(t0));
    let t1 = session.on_page_change(1);
    let l1 = tokio::spawn(session.load_for(t1));
    let t2 = session.on_page_change(2);
    let l2 = tokio::spawn(session.load_for(t2));

    let (t0, r0) = l0.await.unwrap();
    assert!(matches!(session.on_page_loaded(t0, r0), Completion::Stale));
    assert!(session.page().is_empty());
    assert!(session.loading());

    let (t2, r2) = l2.await.unwrap();
    assert!(session.on_page_loaded(t2, r2).is_applied());
    let (t1, r1) = l1.await.unwrap();
    assert!(matches!(session.on_page_loaded(t1, r1), Completion::Stale));

    assert_eq!(session.page().index, 2);
    assert_eq!(session.page().items[0].id, 21);
    assert!(!session.loading());
}

#[tokio::test]
async fn failed_navigation_clears_page_but_not_selection() {
    let src = Arc::new(ScriptedSource::new(40).failing_on(2));
    let mut session = session_over(&src, true);
    session.go_to(0).await;
    session.check_visible(&[4]);

    let res = session.go_to(2).await;
    assert!(matches!(res, Completion::Failed(FetchError::Unavailable { page: 2, .. })));
    assert_eq!(session.page(), &Page::empty(2));
    assert!(matches!(
        session.controller().state(),
        LoadState::Errored { page: 2, .. }
    ));
    assert_eq!(selected_ids(&session), vec![4]);

    assert!(session.go_to(1).await.is_applied());
    assert_eq!(session.controller().state(), &LoadState::Idle);
}

#[tokio::test]
async fn paging_continues_past_a_failed_page() {
    let src = Arc::new(ScriptedSource::new(40).failing_on(1));
    let mut session = session_over(&src, true);
    session.go_to(0).await;

    let next = session.next_page().unwrap();
    assert!(matches!(session.go_to(next).await, Completion::Failed(_)));
    assert_eq!(session.controller().page_count(), 0);
    assert_eq!(session.prev_page(), Some(0));
    assert_eq!(session.next_page(), Some(2));

    assert!(session.go_to(2).await.is_applied());
    assert_eq!(session.page().items[0].id, 21);
    assert_eq!(session.next_page(), Some(3));
    session.go_to(3).await;
    assert_eq!(session.next_page(), None);
}

#[tokio::test]
async fn count_box_input_is_filtered() {
    let src = Arc::new(ScriptedSource::new(40));
    let mut session = session_over(&src, true);
    session.go_to(0).await;
    session.check_visible(&[9]);
    src.reset();

    assert!(session.submit_count("").await.unwrap().is_none());
    assert!(session.submit_count("abc").await.unwrap().is_none());
    assert_eq!(selected_ids(&session), vec![9]);
    assert!(src.fetches().is_empty());

    let out = session.submit_count("1x2").await.unwrap().unwrap();
    assert_eq!(out.selected, 12);
    assert_eq!(src.fetches(), vec![1]);
}
