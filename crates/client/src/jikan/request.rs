//! Jikan search request types and validation.

use serde::Serialize;

/// Search parameters for the Jikan `/anime` endpoint.
///
/// Mirrors the catalog's search form: free-text query plus optional
/// genre, year, and media-type filters.
#[derive(Debug, Clone, Serialize, Default)]
pub struct SearchRequest {
    /// Free-text search query.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub q: String,

    /// Comma-separated genre ids.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genres: Option<String>,

    /// Release year filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,

    /// Media type filter: tv|movie|ova|special|ona|music.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Number of results (1-25, default 10).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u8>,
}

impl SearchRequest {
    /// Build a plain text search.
    pub fn query(q: impl Into<String>) -> Self {
        Self { q: q.into(), ..Default::default() }
    }

    /// Validate the search request parameters.
    ///
    /// A request must carry a query or at least one filter, matching the
    /// search form's behavior of not firing on a completely empty form.
    pub fn validate(&self) -> Result<(), crate::jikan::JikanError> {
        use crate::jikan::JikanError;

        if self.q.is_empty() && self.genres.is_none() && self.year.is_none() && self.kind.is_none() {
            return Err(JikanError::InvalidQuery(
                "query and filters are all empty".to_string(),
            ));
        }

        if self.q.len() > 400 {
            return Err(JikanError::InvalidQuery(format!(
                "query too long: {} chars (max 400)",
                self.q.len()
            )));
        }

        if let Some(limit) = self.limit
            && !(1..=25).contains(&limit)
        {
            return Err(JikanError::InvalidLimit);
        }

        Ok(())
    }

    /// Get the effective result limit (default 10).
    pub fn get_limit(&self) -> u8 {
        self.limit.unwrap_or(10)
    }
}
