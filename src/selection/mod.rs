use std::collections::{HashMap, HashSet};

use crate::model::{Page, Record};

/// Ids added to and removed from the selection by one visible-page update.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionDelta {
    pub added: Vec<u64>,
    pub removed: Vec<u64>,
}

impl SelectionDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// The page-independent set of selected records, keyed by id.
///
/// Membership is the only source of truth for whether a row is checked.
/// Records are listed in the order they were first selected.
#[derive(Clone, Debug, Default)]
pub struct SelectionStore {
    order: Vec<u64>,
    records: HashMap<u64, Record>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole selection with exactly `records`.
    pub fn set_selection<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = Record>,
    {
        self.order.clear();
        self.records.clear();
        for record in records {
            self.insert(record);
        }
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.records.contains_key(&id)
    }

    pub fn get(&self, id: u64) -> Option<&Record> {
        self.records.get(&id)
    }

    pub fn list(&self) -> Vec<&Record> {
        self.order
            .iter()
            .filter_map(|id| self.records.get(id))
            .collect()
    }

    pub fn ids(&self) -> &[u64] {
        &self.order
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.records.clear();
    }

    /// Rows of `page` that are currently selected, in page order.
    pub fn checked_on<'a>(&self, page: &'a Page) -> Vec<&'a Record> {
        page.items
            .iter()
            .filter(|r| self.records.contains_key(&r.id))
            .collect()
    }

    /// Flips one record and returns whether it is now selected.
    pub fn toggle(&mut self, record: &Record) -> bool {
        if self.remove(record.id) {
            false
        } else {
            self.insert(record.clone());
            true
        }
    }

    /// Merges a checkbox report for the visible page into the selection.
    ///
    /// `checked` is the full list of rows the table reports as checked on
    /// `visible`. Only visible ids are affected: an id that is visible and
    /// checked is added, one that is visible and unchecked is removed, and
    /// selections on other pages are left alone. Reported rows that are not
    /// part of `visible` are ignored.
    pub fn apply_visible(&mut self, visible: &Page, checked: &[Record]) -> SelectionDelta {
        let visible_ids: HashSet<u64> = visible.ids().collect();
        let previous: HashSet<u64> = visible
            .ids()
            .filter(|id| self.records.contains_key(id))
            .collect();
        let reported: HashSet<u64> = checked
            .iter()
            .map(|r| r.id)
            .filter(|id| visible_ids.contains(id))
            .collect();

        let mut delta = SelectionDelta::default();
        for record in checked {
            if reported.contains(&record.id)
                && !previous.contains(&record.id)
                && !delta.added.contains(&record.id)
            {
                delta.added.push(record.id);
                self.insert(record.clone());
            }
        }
        for id in visible.ids() {
            if previous.contains(&id) && !reported.contains(&id) {
                self.remove(id);
                delta.removed.push(id);
            }
        }
        delta
    }

    fn insert(&mut self, record: Record) {
        if self.records.insert(record.id, record.clone()).is_none() {
            self.order.push(record.id);
        }
    }

    fn remove(&mut self, id: u64) -> bool {
        if self.records.remove(&id).is_some() {
            self.order.retain(|x| *x != id);
            true
        } else {
            false
        }
    }
}
