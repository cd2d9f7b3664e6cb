//! GraphQL client for the project registry.
//!
//! # Responsibilities
//! - Log in with the API key and hold the issued token pair
//! - Refresh the access token
//! - Send authenticated queries and mutations
//! - Resolve a project's registrar, RPC URL and chain id

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::error::{UnisonError, UnisonResult};
use crate::observability::metrics;
use crate::server::types::{
    GraphQlRequest, GraphQlResponse, Project, ProjectId, ProjectPayload, RefreshPayload,
    RefreshedTokens, TokenPair,
};

/// Session state of a [`ServerClient`].
#[derive(Debug, Clone)]
enum SessionState {
    Disconnected,
    Connected {
        project_id: ProjectId,
        tokens: TokenPair,
    },
}

/// GraphQL operation kind, used for the request envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Query,
    Mutation,
}

impl Operation {
    fn keyword(self) -> &'static str {
        match self {
            Operation::Query => "query",
            Operation::Mutation => "mutation",
        }
    }
}

fn envelope(operation: Operation, body: &str) -> String {
    format!("{} {{\n{}\n}}", operation.keyword(), body)
}

/// Client for the project registry's GraphQL endpoint.
pub struct ServerClient {
    http: Client,
    endpoint: Url,
    api_key: String,
    state: SessionState,
}

impl ServerClient {
    /// Create a disconnected client.
    pub fn new(endpoint: &str, api_key: impl Into<String>) -> UnisonResult<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            UnisonError::InvalidArgument(format!("Invalid GraphQL endpoint '{}': {}", endpoint, e))
        })?;

        Ok(Self {
            http: Client::new(),
            endpoint,
            api_key: api_key.into(),
            state: SessionState::Disconnected,
        })
    }

    /// Log in for `project_id`. No-op if a token is already held.
    pub async fn connect(&mut self, project_id: ProjectId) -> UnisonResult<()> {
        if self.is_connected() {
            return Ok(());
        }

        let login = format!(
            "login(apiKey: {}, id: {}) {{\n    token\n    refresh\n}}",
            graphql_string(&self.api_key),
            project_id
        );
        let response = self
            .send("login", &envelope(Operation::Mutation, &login), None)
            .await?;

        let tokens = match response.field("login") {
            Some(value) => TokenPair::deserialize(value).map_err(|e| {
                UnisonError::NotAuthorized(format!("Malformed login response: {}", e))
            })?,
            None => {
                return Err(UnisonError::NotAuthorized(
                    response.first_error().unwrap_or("Login failed").to_string(),
                ))
            }
        };

        tracing::info!(project_id = %project_id, endpoint = %self.endpoint, "Logged in to project registry");
        self.state = SessionState::Connected { project_id, tokens };
        Ok(())
    }

    /// Refresh the access token.
    ///
    /// Returns `true` when a new token was stored. Failures never propagate:
    /// they are logged and the current token is kept.
    pub async fn refresh(&mut self) -> bool {
        let project_id = match &self.state {
            SessionState::Connected { project_id, .. } => *project_id,
            SessionState::Disconnected => return false,
        };

        match self.request_refresh(project_id).await {
            Ok(refreshed) => {
                if let SessionState::Connected { tokens, .. } = &mut self.state {
                    tokens.token = refreshed.token;
                    if let Some(refresh) = refreshed.refresh {
                        tokens.refresh = refresh;
                    }
                }
                tracing::debug!(project_id = %project_id, "Access token refreshed");
                true
            }
            Err(e) => {
                tracing::warn!(project_id = %project_id, error = %e, "Token refresh failed, keeping current token");
                false
            }
        }
    }

    async fn request_refresh(
        &self,
        project_id: ProjectId,
    ) -> UnisonResult<RefreshedTokens> {
        let body = format!(
            "refreshToken(id: {}) {{\n    success\n    message\n    data {{\n        token\n        refresh\n    }}\n}}",
            project_id
        );
        let response = self.authenticated("refreshToken", Operation::Query, &body).await?;
        let payload: RefreshPayload = response.decode_field("refreshToken", "refreshToken failed")?;

        if !payload.success {
            return Err(UnisonError::Remote(
                payload.message.unwrap_or_else(|| "refreshToken failed".to_string()),
            ));
        }
        payload
            .data
            .ok_or_else(|| UnisonError::Remote("refreshToken returned no token".into()))
    }

    /// Run an authenticated query and return its `data` payload.
    pub async fn query(&self, query: &str) -> UnisonResult<Value> {
        let response = self.authenticated("query", Operation::Query, query).await?;
        into_data(response)
    }

    /// Run an authenticated mutation and return its `data` payload.
    pub async fn mutate(&self, mutation: &str) -> UnisonResult<Value> {
        let response = self.authenticated("mutate", Operation::Mutation, mutation).await?;
        into_data(response)
    }

    /// Look up a project's registrar, RPC URL and chain id.
    pub async fn get_project(&self, project_id: ProjectId) -> UnisonResult<Project> {
        let body = format!(
            "getProject(id: {}) {{\n    success\n    message\n    contract {{\n        registrar\n    }}\n    network {{\n        rpc\n        chainId\n    }}\n}}",
            project_id
        );
        let response = self.authenticated("getProject", Operation::Query, &body).await?;
        let payload: ProjectPayload = response.decode_field("getProject", "getProject failed")?;
        let project = payload.into_project(project_id)?;

        tracing::info!(
            project_id = %project_id,
            chain_id = project.chain_id.0,
            rpc_url = %project.rpc_url,
            "Project resolved"
        );
        Ok(project)
    }

    /// Drop the held token pair.
    pub fn disconnect(&mut self) {
        self.state = SessionState::Disconnected;
    }

    /// Replace the API key. Does not re-authenticate.
    pub fn set_api_key(&mut self, api_key: impl Into<String>) {
        self.api_key = api_key.into();
    }

    pub fn token(&self) -> Option<&str> {
        match &self.state {
            SessionState::Connected { tokens, .. } => Some(&tokens.token),
            SessionState::Disconnected => None,
        }
    }

    pub fn refresh_token(&self) -> Option<&str> {
        match &self.state {
            SessionState::Connected { tokens, .. } => Some(&tokens.refresh),
            SessionState::Disconnected => None,
        }
    }

    /// Project the held token was issued for.
    pub fn project_id(&self) -> Option<ProjectId> {
        match &self.state {
            SessionState::Connected { project_id, .. } => Some(*project_id),
            SessionState::Disconnected => None,
        }
    }

    /// True only after a successful login.
    pub fn is_connected(&self) -> bool {
        matches!(self.state, SessionState::Connected { .. })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn authenticated(
        &self,
        operation_name: &'static str,
        operation: Operation,
        body: &str,
    ) -> UnisonResult<GraphQlResponse> {
        let token = self
            .token()
            .ok_or_else(|| UnisonError::NotAuthorized("No token, connect first".into()))?;

        if body.trim().is_empty() {
            let what = match operation {
                Operation::Query => "No query provided",
                Operation::Mutation => "No mutation provided",
            };
            return Err(UnisonError::InvalidArgument(what.into()));
        }

        self.send(operation_name, &envelope(operation, body), Some(token))
            .await
    }

    async fn send(
        &self,
        operation_name: &'static str,
        document: &str,
        token: Option<&str>,
    ) -> UnisonResult<GraphQlResponse> {
        tracing::debug!(operation = operation_name, "Sending GraphQL request");

        let mut request = self
            .http
            .post(self.endpoint.clone())
            .json(&GraphQlRequest { query: document });
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let result = async {
            let resp = request.send().await?;
            let status = resp.status();
            let text = resp.text().await?;

            decode_response(status, &text)
        }
        .await;

        metrics::record_graphql_request(operation_name, metrics::outcome(&result));
        result
    }
}

impl std::fmt::Debug for ServerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("connected", &self.is_connected())
            .field("project_id", &self.project_id())
            .finish()
    }
}

/// Decode a GraphQL body, keeping the HTTP status when the body says nothing.
fn decode_response(status: StatusCode, text: &str) -> UnisonResult<GraphQlResponse> {
    let status_error = || {
        UnisonError::Remote(format!("GraphQL endpoint returned status {}: {}", status, text))
    };

    match serde_json::from_str::<GraphQlResponse>(text) {
        Ok(parsed) if !status.is_success() && parsed.data.is_none() && parsed.errors.is_empty() => {
            Err(status_error())
        }
        Ok(parsed) => Ok(parsed),
        Err(_) if !status.is_success() => Err(status_error()),
        Err(e) => Err(UnisonError::Remote(format!("Malformed GraphQL response: {}", e))),
    }
}

fn into_data(response: GraphQlResponse) -> UnisonResult<Value> {
    match response.data {
        Some(data) if !data.is_null() => Ok(data),
        _ => Err(UnisonError::Remote(
            response
                .first_error()
                .unwrap_or("Empty GraphQL response")
                .to_string(),
        )),
    }
}

/// Quote a value as a GraphQL string literal.
fn graphql_string(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope() {
        assert_eq!(envelope(Operation::Query, "a"), "query {\na\n}");
        assert_eq!(envelope(Operation::Mutation, "b"), "mutation {\nb\n}");
    }

    #[test]
    fn test_graphql_string_escapes() {
        assert_eq!(graphql_string("key"), "\"key\"");
        assert_eq!(graphql_string("a\"b"), "\"a\\\"b\"");
    }

    #[test]
    fn test_error_status_without_graphql_payload_keeps_status() {
        let err = decode_response(StatusCode::UNAUTHORIZED, r#"{"error":"bad key"}"#).unwrap_err();
        assert!(matches!(err, UnisonError::Remote(_)));
        assert!(err.message().contains("401"), "{}", err);

        let err = decode_response(StatusCode::BAD_GATEWAY, "<html>").unwrap_err();
        assert!(err.message().contains("502"), "{}", err);
    }

    #[test]
    fn test_error_status_with_graphql_errors_is_decoded() {
        let body = r#"{"data":null,"errors":[{"message":"Invalid API key"}]}"#;
        let parsed = decode_response(StatusCode::BAD_REQUEST, body).unwrap();
        assert_eq!(parsed.first_error(), Some("Invalid API key"));
    }

    #[test]
    fn test_success_with_malformed_body() {
        let err = decode_response(StatusCode::OK, "not json").unwrap_err();
        assert!(err.message().starts_with("Malformed GraphQL response"));
    }

    #[test]
    fn test_new_rejects_bad_endpoint() {
        assert!(ServerClient::new("not a url", "key").is_err());
    }

    #[tokio::test]
    async fn test_query_requires_token() {
        let client = ServerClient::new("http://127.0.0.1:9/graphql", "key").unwrap();
        assert!(!client.is_connected());
        let err = client.query("me { id }").await.unwrap_err();
        assert!(matches!(err, UnisonError::NotAuthorized(ref m) if m.contains("No token")));
        let err = client.mutate("touch").await.unwrap_err();
        assert!(matches!(err, UnisonError::NotAuthorized(_)));
    }

    #[tokio::test]
    async fn test_refresh_without_token_is_noop() {
        let mut client = ServerClient::new("http://127.0.0.1:9/graphql", "key").unwrap();
        assert!(!client.refresh().await);
        assert!(client.token().is_none());
    }
}
