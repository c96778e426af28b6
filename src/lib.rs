//! Cross-page selection over a remotely paginated record collection.
//!
//! Only one page of records is held in memory at a time ([`cache::PageCache`]),
//! while the selection ([`selection::SelectionStore`]) spans the whole
//! collection. [`session::Session`] ties the pieces together for a view.

pub mod app;
pub mod bulk;
pub mod cache;
pub mod cli;
pub mod config;
pub mod model;
pub mod output;
pub mod pagination;
pub mod selection;
pub mod session;
pub mod source;
pub mod utils;

#[cfg(test)]
mod tests;
