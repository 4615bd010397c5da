//! # pgrest — PostgREST request compiler
//!
//! > **Chain your intent. Get one wire-exact request.**
//!
//! pgrest accumulates query intent (target, filters, pagination,
//! preferences, body) on a fluent builder and compiles it, in a single
//! terminal step, into one HTTP request that follows the PostgREST protocol.
//!
//! ## Quick Example
//!
//! ```rust
//! use pgrest::prelude::*;
//! use serde_json::json;
//!
//! let client = PostgrestClient::new("http://localhost:3000")?.schema("public");
//!
//! let request = client
//!     .from("todos")
//!     .update(json!({ "done": true }))
//!     .filter(Filter::eq("id", 4))
//!     .single_result()
//!     .build()?;
//!
//! assert_eq!(request.method(), Method::Patch);
//! assert_eq!(request.uri(), "http://localhost:3000/todos?id=eq.4");
//! assert_eq!(request.header("Prefer"), Some("return=representation"));
//! # Ok::<(), pgrest::error::PostgrestError>(())
//! ```
//!
//! ## Wire Mapping
//!
//! | Builder call              | PostgREST wire effect                          |
//! |---------------------------|------------------------------------------------|
//! | `from("t")`               | path `/t`                                      |
//! | `rpc("f")`                | path `/rpc/f`, `POST`                          |
//! | `select_columns("a,b")`   | `GET`, `select=a,b`                            |
//! | `raw_param("age=gt.21")`  | filter appended verbatim                       |
//! | `prefer(..)` / `count(..)`| merged into one `Prefer` header                |
//! | `single_result()`         | `Accept: application/vnd.pgrst.object+json`    |
//! | schema on a read / write  | `Accept-Profile` / `Content-Profile`           |

pub mod body;
pub mod builder;
pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod headers;
pub mod request;
pub mod transport;
pub mod types;

pub mod prelude {
    pub use crate::body::Body;
    pub use crate::builder::QueryBuilder;
    pub use crate::client::PostgrestClient;
    pub use crate::config::{ClientConfig, ConfigOverrides};
    pub use crate::error::*;
    pub use crate::filter::{Filter, Operator};
    pub use crate::request::{Credentials, PostgrestRequest};
    pub use crate::transport::{HttpTransport, RawResponse, Transport};
    pub use crate::types::{CountPreference, Method, SortOrder};
}
