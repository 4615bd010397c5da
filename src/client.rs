//! Entry point: seeds a [`QueryBuilder`] per request.

use crate::builder::QueryBuilder;
use crate::config::ClientConfig;
use crate::error::PostgrestResult;
use crate::request::Credentials;
use crate::types::Method;

/// Holds the base URI, default schema and credentials. No per-request state.
#[derive(Debug, Clone)]
pub struct PostgrestClient {
    base_uri: String,
    schema: Option<String>,
    credentials: Credentials,
}

impl PostgrestClient {
    /// Create a client for the PostgREST server at `base_uri`.
    ///
    /// The URI must parse as an absolute URL. A trailing `/` is dropped so
    /// paths join cleanly.
    pub fn new(base_uri: &str) -> PostgrestResult<Self> {
        url::Url::parse(base_uri)?;
        Ok(Self {
            base_uri: base_uri.strip_suffix('/').unwrap_or(base_uri).to_string(),
            schema: None,
            credentials: Credentials::default(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> PostgrestResult<Self> {
        let mut client = Self::new(&config.base_url)?;
        client.schema = config.schema.clone();
        client.credentials = Credentials {
            user: config.user.clone(),
            password: config.password.clone(),
            token: config.token.clone(),
        };
        Ok(client)
    }

    /// Query a table or view: path `/{table}`, method unset.
    pub fn from(&self, table: &str) -> QueryBuilder {
        self.seed(format!("/{}", table), None)
    }

    /// Call a stored procedure: path `/rpc/{fn_name}`, method `POST`.
    pub fn rpc(&self, fn_name: &str) -> QueryBuilder {
        self.seed(format!("/rpc/{}", fn_name), Some(Method::Post))
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.credentials.user = Some(user.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.credentials.password = Some(password.into());
        self
    }

    /// Bearer token sent instead of basic auth.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.credentials.token = Some(token.into());
        self
    }

    /// Schema seeded into every builder.
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    fn seed(&self, path: String, method: Option<Method>) -> QueryBuilder {
        QueryBuilder::seeded(
            &self.base_uri,
            &self.credentials,
            self.schema.as_deref(),
            path,
            method,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PostgrestError;

    #[test]
    fn test_from_seeds_path_only() {
        let client = PostgrestClient::new("http://localhost:3000/").unwrap();
        assert_eq!(client.base_uri(), "http://localhost:3000");

        let err = client.from("users").schema("public").build().unwrap_err();
        assert!(matches!(err, PostgrestError::MissingField("method")));
    }

    #[test]
    fn test_rpc_seeds_post() {
        let client = PostgrestClient::new("http://localhost:3000")
            .unwrap()
            .schema("public");
        let req = client.rpc("refresh").build().unwrap();
        assert_eq!(req.method(), Method::Post);
        assert_eq!(req.uri(), "http://localhost:3000/rpc/refresh");
    }

    #[test]
    fn test_credentials_flow_to_request() {
        let client = PostgrestClient::new("http://localhost:3000")
            .unwrap()
            .schema("public")
            .user("web")
            .password("pw");
        let req = client.from("t").select().build().unwrap();
        assert_eq!(req.credentials().user.as_deref(), Some("web"));
        assert_eq!(req.credentials().password.as_deref(), Some("pw"));
    }

    #[test]
    fn test_invalid_base_uri() {
        let err = PostgrestClient::new("not a url").unwrap_err();
        assert!(matches!(err, PostgrestError::InvalidUri(_)));
    }

    #[test]
    fn test_from_config() {
        let config = ClientConfig::builder()
            .base_url("http://db:3000")
            .schema("api")
            .token("jwt")
            .build();
        let client = PostgrestClient::from_config(&config).unwrap();
        let req = client.from("t").delete().build().unwrap();
        assert_eq!(req.uri(), "http://db:3000/t");
        assert_eq!(req.header("Content-Profile"), Some("api"));
        assert_eq!(req.credentials().token.as_deref(), Some("jwt"));
    }
}
