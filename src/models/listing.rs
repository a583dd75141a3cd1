//! Raw listings as returned by the Finding API.
//!
//! The JSON flavour of the Finding API wraps every scalar in a one-element
//! array (`"title": ["..."]`). The helpers here unwrap that shape and default
//! missing fields to empty strings.

use serde::{Deserialize, Deserializer};

/// One search result, immutable once received.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ListingRecord {
    #[serde(default, deserialize_with = "first_string")]
    pub title: String,

    #[serde(default, deserialize_with = "first_string")]
    pub item_id: String,

    #[serde(default, rename = "viewItemURL", deserialize_with = "first_string")]
    pub item_url: String,

    #[serde(default, rename = "galleryURL", deserialize_with = "first_string")]
    pub gallery_url: String,
}

/// One page of listings.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub listings: Vec<ListingRecord>,

    /// Last page number the upstream reports for this query, if any.
    pub total_pages: Option<u32>,
}

impl SearchPage {
    pub fn new(listings: Vec<ListingRecord>) -> Self {
        Self {
            listings,
            total_pages: None,
        }
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

// --- Finding API envelope ---

#[derive(Debug, Deserialize)]
pub(crate) struct FindingEnvelope {
    #[serde(rename = "findItemsByKeywordsResponse", default)]
    pub response: Vec<FindingResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FindingResponse {
    #[serde(default, deserialize_with = "first_string")]
    pub ack: String,

    #[serde(default)]
    pub error_message: Vec<ErrorMessage>,

    #[serde(default)]
    pub search_result: Vec<SearchResult>,

    #[serde(default)]
    pub pagination_output: Vec<PaginationOutput>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResult {
    #[serde(default)]
    pub item: Vec<ListingRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PaginationOutput {
    #[serde(default, deserialize_with = "first_string")]
    pub total_pages: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorMessage {
    #[serde(default)]
    pub error: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ErrorDetail {
    #[serde(default, deserialize_with = "first_string")]
    pub error_id: String,

    #[serde(default, deserialize_with = "first_string")]
    pub message: String,
}

impl FindingResponse {
    /// Listings of the first search result block, empty when absent.
    pub fn into_page(self) -> SearchPage {
        let total_pages = self
            .pagination_output
            .first()
            .and_then(|p| p.total_pages.parse().ok());
        let listings = self
            .search_result
            .into_iter()
            .next()
            .map(|r| r.item)
            .unwrap_or_default();
        SearchPage {
            listings,
            total_pages,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.ack.eq_ignore_ascii_case("failure")
    }

    pub fn errors(&self) -> impl Iterator<Item = &ErrorDetail> {
        self.error_message.iter().flat_map(|m| m.error.iter())
    }
}

fn first_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wrapped {
        List(Vec<String>),
        Single(String),
    }

    Ok(match Option::<Wrapped>::deserialize(deserializer)? {
        Some(Wrapped::List(values)) => values.into_iter().next().unwrap_or_default(),
        Some(Wrapped::Single(value)) => value,
        None => String::new(),
    })
}
