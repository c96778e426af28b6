use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 10;

// the Record struct is one artwork as returned by the collection API.
// identity is `id`, everything else is display payload.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Record {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(
        default,
        rename = "place_of_origin",
        deserialize_with = "null_as_default"
    )]
    pub origin: String,
    #[serde(default, rename = "artist_display", deserialize_with = "null_as_default")]
    pub attribution: String,
    #[serde(default, rename = "inscriptions", deserialize_with = "null_as_default")]
    pub inscription: String,
    #[serde(default, rename = "date_start")]
    pub start_year: Option<i32>,
    #[serde(default, rename = "date_end")]
    pub end_year: Option<i32>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Record {
    pub fn new(id: u64, title: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            origin: String::new(),
            attribution: String::new(),
            inscription: String::new(),
            start_year: None,
            end_year: None,
        }
    }

    /// Year span as shown in the table, `1890-1892`, `1890`, or empty.
    pub fn years(&self) -> String {
        match (self.start_year, self.end_year) {
            (Some(start), Some(end)) if start != end => format!("{start}-{end}"),
            (Some(year), _) | (None, Some(year)) => year.to_string(),
            (None, None) => String::new(),
        }
    }
}

/// One bounded window of the remote collection.
///
/// A page is always built from a single response: `items` and `total_count`
/// never come from different loads.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Page {
    pub index: usize,
    pub items: Vec<Record>,
    pub total_count: usize,
}

impl Page {
    pub fn empty(index: usize) -> Self {
        Self {
            index,
            items: Vec::new(),
            total_count: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.items.iter().map(|r| r.id)
    }

    pub fn get(&self, id: u64) -> Option<&Record> {
        self.items.iter().find(|r| r.id == id)
    }

    /// Global position of the first item of this page.
    pub fn first_position(&self, page_size: usize) -> usize {
        self.index.saturating_mul(page_size)
    }
}

/// Number of pages needed to show `total` records.
pub fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct PaginationInfo {
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
    #[serde(default)]
    pub total_pages: Option<usize>,
    #[serde(default)]
    pub current_page: Option<usize>,
}

// the RecordsResponse struct mirrors the JSON body of `GET artworks?page=N`
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RecordsResponse {
    #[serde(default)]
    pub data: Vec<Record>,
    #[serde(default)]
    pub pagination: PaginationInfo,
}

impl RecordsResponse {
    /// Builds the page for `index`, truncating any surplus beyond `page_size`.
    pub fn into_page(self, index: usize, page_size: usize) -> Page {
        let mut items = self.data;
        if items.len() > page_size {
            log::warn!(
                "page {} returned {} records, keeping the first {}",
                index,
                items.len(),
                page_size
            );
            items.truncate(page_size);
        }
        Page {
            index,
            items,
            total_count: self.pagination.total,
        }
    }
}
