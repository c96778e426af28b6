use futures::future::{self, BoxFuture};
use futures::FutureExt;

use super::{FetchError, RecordSource};
use crate::model::{Page, Record};

/// An offline collection held entirely in memory, paged on demand.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    records: Vec<Record>,
}

impl MemorySource {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// A synthetic collection of `count` artworks with ids `1..=count`.
    pub fn demo(count: usize) -> Self {
        let origins = ["France", "Japan", "United States", "Netherlands", "Italy"];
        let records = (1..=count as u64)
            .map(|id| {
                let year = 1800 + (id % 200) as i32;
                Record {
                    id,
                    title: format!("Untitled No. {id}"),
                    origin: origins[(id as usize) % origins.len()].to_string(),
                    attribution: format!("Artist {}", id % 37),
                    inscription: String::new(),
                    start_year: Some(year),
                    end_year: Some(year + (id % 3) as i32),
                }
            })
            .collect();
        Self { records }
    }

    pub fn page(&self, index: usize, page_size: usize) -> Page {
        let start = index.saturating_mul(page_size).min(self.records.len());
        let end = start.saturating_add(page_size).min(self.records.len());
        Page {
            index,
            items: self.records[start..end].to_vec(),
            total_count: self.records.len(),
        }
    }
}

impl RecordSource for MemorySource {
    fn load_page(&self, index: usize, page_size: usize) -> BoxFuture<'_, Result<Page, FetchError>> {
        future::ready(Ok(self.page(index, page_size))).boxed()
    }
}
