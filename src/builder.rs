//! The request compiler.
//!
//! A [`QueryBuilder`] accumulates the intent of one PostgREST call through
//! chained `self -> Self` methods and renders it exactly once with
//! [`QueryBuilder::build`].
//!
//! ```
//! use pgrest::prelude::*;
//!
//! let client = PostgrestClient::new("http://localhost:3000")?.schema("public");
//! let request = client
//!     .from("users")
//!     .select_columns("id,name")
//!     .raw_param("age=gt.21")
//!     .limit(10)
//!     .build()?;
//!
//! assert_eq!(request.method(), Method::Get);
//! assert_eq!(
//!     request.uri(),
//!     "http://localhost:3000/users?select=id,name&limit=10&age=gt.21"
//! );
//! assert_eq!(request.header("Accept-Profile"), Some("public"));
//! # Ok::<(), pgrest::error::PostgrestError>(())
//! ```

use crate::body::Body;
use crate::error::{PostgrestError, PostgrestResult};
use crate::filter::Filter;
use crate::headers::{
    ACCEPT, ACCEPT_PROFILE, CONTENT_PROFILE, CONTENT_TYPE, HeaderMap, PREFER,
};
use crate::request::{Credentials, PostgrestRequest};
use crate::transport::{RawResponse, Transport};
use crate::types::*;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

/// Characters escaped in parameter names and values. PostgREST syntax
/// (`,` `.` `(` `)` `:` `*` `!`) is left readable.
const QUERY_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Per-request compilation state.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    base_uri: String,
    credentials: Credentials,
    schema: Option<String>,
    path: Option<String>,
    method: Option<Method>,
    params: Vec<(String, String)>,
    raw_params: Vec<String>,
    headers: HeaderMap,
    body: Option<Body>,
    single_result: bool,
    return_representation: bool,
    count: Option<CountPreference>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl QueryBuilder {
    /// A builder with no target. Use [`from`](Self::from) or one of the RPC
    /// methods to set the path.
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
            credentials: Credentials::default(),
            schema: None,
            path: None,
            method: None,
            params: Vec::new(),
            raw_params: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            single_result: false,
            return_representation: false,
            count: None,
            limit: None,
            offset: None,
        }
    }

    pub(crate) fn seeded(
        base_uri: &str,
        credentials: &Credentials,
        schema: Option<&str>,
        path: String,
        method: Option<Method>,
    ) -> Self {
        let mut qb = Self::new(base_uri);
        qb.credentials = credentials.clone();
        qb.schema = schema.map(str::to_string);
        qb.path = Some(path);
        qb.method = method;
        qb
    }

    // ------------------------------------------------------------------
    // Target
    // ------------------------------------------------------------------

    pub fn from(mut self, table: &str) -> Self {
        self.path = Some(format!("/{}", table));
        self
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    fn target_rpc(mut self, name: &str) -> Self {
        self.path = Some(format!("/rpc/{}", name));
        self.method = Some(Method::Post);
        self
    }

    fn set_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    // ------------------------------------------------------------------
    // Reads and writes
    // ------------------------------------------------------------------

    pub fn select(self) -> Self {
        self.set_method(Method::Get)
    }

    pub fn select_columns(self, columns: &str) -> Self {
        self.set_method(Method::Get).param("select", columns)
    }

    /// Columns to return from a write, without changing the method.
    pub fn returned_columns(self, columns: &str) -> Self {
        self.param("select", columns)
    }

    pub fn insert(self, body: impl Into<Body>) -> Self {
        self.set_method(Method::Post).body(body)
    }

    /// Insert only `columns` from the payload and return the created rows.
    pub fn insert_columns(self, columns: &str, body: impl Into<Body>) -> Self {
        self.insert(body)
            .param("columns", columns)
            .return_representation()
    }

    pub fn update(self, body: impl Into<Body>) -> Self {
        self.set_method(Method::Patch)
            .body(body)
            .return_representation()
    }

    pub fn update_where(self, raw_filter: &str, body: impl Into<Body>) -> Self {
        self.update(body).raw_param(raw_filter)
    }

    /// Conflict target used by [`upsert`](Self::upsert).
    pub fn on_conflict(self, columns: &str) -> Self {
        self.param("on_conflict", columns)
    }

    /// `PUT` upsert. The conflict target comes from an earlier
    /// [`on_conflict`](Self::on_conflict) call, if any.
    pub fn upsert(self, body: impl Into<Body>) -> Self {
        self.set_method(Method::Put).body(body)
    }

    pub fn upsert_on_conflict(self, body: impl Into<Body>, columns: &str) -> Self {
        self.upsert(body).on_conflict(columns)
    }

    /// `POST` upsert resolving duplicates by merging or ignoring them.
    pub fn upsert_with(self, body: impl Into<Body>, merge_duplicates: bool) -> Self {
        let resolution = if merge_duplicates {
            "resolution=merge-duplicates"
        } else {
            "resolution=ignore-duplicates"
        };
        self.set_method(Method::Post).body(body).prefer(resolution)
    }

    pub fn delete(self) -> Self {
        self.set_method(Method::Delete)
    }

    pub fn delete_where<I, S>(self, filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        filters
            .into_iter()
            .fold(self, |qb, f| qb.raw_param(f))
            .delete()
    }

    // ------------------------------------------------------------------
    // Stored procedures
    // ------------------------------------------------------------------

    pub fn rpc(self, name: &str, body: impl Into<Body>) -> Self {
        self.target_rpc(name).body(body).json()
    }

    /// Call with a single JSON object argument (`params=single-object`).
    pub fn rpc_single_object(self, name: &str, body: impl Into<Body>, single_object: bool) -> Self {
        let qb = self.rpc(name, body);
        if single_object {
            qb.prefer("params=single-object")
        } else {
            qb
        }
    }

    /// Invoke once per CSV row (`params=multiple-objects`).
    pub fn bulk_rpc(self, name: &str, csv: impl Into<String>) -> Self {
        self.rpc(name, Body::Text(csv.into()))
            .csv()
            .prefer("params=multiple-objects")
    }

    pub fn read_only_rpc(self, name: &str) -> Self {
        self.target_rpc(name).set_method(Method::Get)
    }

    pub fn read_only_rpc_where<I, S>(self, name: &str, filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        filters
            .into_iter()
            .fold(self.read_only_rpc(name), |qb, f| qb.raw_param(f))
    }

    // ------------------------------------------------------------------
    // Query string
    // ------------------------------------------------------------------

    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set one query parameter, replacing an earlier value in place.
    pub fn param(mut self, name: &str, value: &str) -> Self {
        set_param(&mut self.params, name, value.to_string());
        self
    }

    /// Append a filter expression verbatim. Repeats are kept once.
    pub fn raw_param(mut self, filter: impl Into<String>) -> Self {
        let filter = filter.into();
        if !self.raw_params.contains(&filter) {
            self.raw_params.push(filter);
        }
        self
    }

    pub fn filter(self, filter: Filter) -> Self {
        self.raw_param(filter.to_string())
    }

    pub fn order(self, column: &str, direction: SortOrder) -> Self {
        self.param("order", &format!("{}.{}", column, direction.as_str()))
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    // ------------------------------------------------------------------
    // Headers and preferences
    // ------------------------------------------------------------------

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(key, value);
        self
    }

    pub fn content_type(self, mime: &str) -> Self {
        self.header(CONTENT_TYPE, mime)
    }

    pub fn json(self) -> Self {
        self.content_type(JSON_MIMETYPE)
    }

    pub fn xml(self) -> Self {
        self.content_type(XML_MIMETYPE)
    }

    pub fn csv(self) -> Self {
        self.content_type(CSV_MIMETYPE)
    }

    pub fn octet_stream(self) -> Self {
        self.content_type(OCTET_STREAM_MIMETYPE)
    }

    pub fn accept(self, mime: &str) -> Self {
        self.header(ACCEPT, mime)
    }

    /// Add a directive to the cumulative `Prefer` header.
    pub fn prefer(self, token: &str) -> Self {
        self.header(PREFER, token)
    }

    pub fn count(mut self, pref: CountPreference) -> Self {
        self.count = Some(pref);
        self
    }

    /// Unwrap a one-row result into a bare object.
    pub fn single_result(mut self) -> Self {
        self.single_result = true;
        self
    }

    /// Return the affected rows in the response.
    pub fn return_representation(mut self) -> Self {
        self.return_representation = true;
        self
    }

    // ------------------------------------------------------------------
    // Render
    // ------------------------------------------------------------------

    /// Compile the accumulated state into one request.
    ///
    /// Fails with [`PostgrestError::MissingField`] if the schema, path or
    /// method was never set.
    pub fn build(self) -> PostgrestResult<PostgrestRequest> {
        let schema = self.schema.ok_or(PostgrestError::MissingField("schema"))?;
        let path = self.path.ok_or(PostgrestError::MissingField("path"))?;
        let method = self.method.ok_or(PostgrestError::MissingField("method"))?;

        let mut headers = HeaderMap::new();
        let profile = if method.is_read() {
            ACCEPT_PROFILE
        } else {
            CONTENT_PROFILE
        };
        headers.append(profile, schema);

        // The profile header follows schema and method only.
        let mut caller_headers = self.headers;
        caller_headers.remove(ACCEPT_PROFILE);
        caller_headers.remove(CONTENT_PROFILE);
        headers.merge(caller_headers);

        if self.single_result {
            headers.append(ACCEPT, SINGLE_OBJECT_MIMETYPE);
        }
        if self.return_representation {
            headers.append(PREFER, "return=representation");
        }
        if let Some(count) = self.count {
            headers.append(PREFER, count.directive());
        }

        let mut params = self.params;
        if let Some(limit) = self.limit {
            set_param(&mut params, "limit", limit.to_string());
        }
        if let Some(offset) = self.offset {
            set_param(&mut params, "offset", offset.to_string());
        }

        let query: Vec<String> = params
            .iter()
            .map(|(name, value)| {
                format!(
                    "{}={}",
                    utf8_percent_encode(name, QUERY_ENCODE_SET),
                    utf8_percent_encode(value, QUERY_ENCODE_SET)
                )
            })
            .chain(self.raw_params)
            .collect();

        let mut uri = format!("{}{}", self.base_uri, path);
        if !query.is_empty() {
            uri.push('?');
            uri.push_str(&query.join("&"));
        }

        tracing::debug!("Compiled {} {}", method, uri);

        Ok(PostgrestRequest {
            method,
            uri,
            headers: headers.render(),
            body: self.body,
            credentials: self.credentials,
        })
    }

    /// Build and hand the request to `transport`.
    pub async fn send<T: Transport>(self, transport: &T) -> PostgrestResult<RawResponse> {
        let request = self.build()?;
        transport.send(&request).await
    }
}

fn set_param(params: &mut Vec<(String, String)>, name: &str, value: String) {
    match params.iter_mut().find(|(n, _)| n == name) {
        Some((_, v)) => *v = value,
        None => params.push((name.to_string(), value)),
    }
}
