//! Wire-level vocabulary: HTTP methods, mime types and preferences.

use serde::Deserialize;
use std::fmt;

pub const JSON_MIMETYPE: &str = "application/json";
pub const XML_MIMETYPE: &str = "text/xml";
pub const OCTET_STREAM_MIMETYPE: &str = "application/octet-stream";
pub const CSV_MIMETYPE: &str = "text/csv";

/// Accept value asking PostgREST to unwrap a one-row result into an object.
pub const SINGLE_OBJECT_MIMETYPE: &str = "application/vnd.pgrst.object+json";

/// The HTTP method of a compiled request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    /// Reads go through `Accept-Profile`, everything else through `Content-Profile`.
    pub fn is_read(&self) -> bool {
        matches!(self, Method::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Strategy PostgREST uses to count the rows behind a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountPreference {
    /// Total size of the table or view, as needed to render a last-page link.
    /// The larger the table the slower this runs; the server responds with
    /// the selected range and the total.
    Exact,
    /// Count taken from PostgreSQL statistics: fast and fairly accurate, as
    /// long as the statistics tables are up to date (see `ANALYZE`).
    Planned,
    /// Exact count up to `db-max-rows`, planned count beyond it. Keeps the
    /// relative error small for small row counts.
    Estimated,
}

impl CountPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            CountPreference::Exact => "exact",
            CountPreference::Planned => "planned",
            CountPreference::Estimated => "estimated",
        }
    }

    /// The `Prefer` token for this strategy.
    pub fn directive(&self) -> String {
        format!("count={}", self.as_str())
    }
}

impl fmt::Display for CountPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction for the `order` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}
