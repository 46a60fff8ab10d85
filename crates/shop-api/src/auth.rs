//! # Session Authentication
//!
//! Bearer-token sessions resolved against a static table loaded from
//! config. Tokens map to user IDs; the `CurrentUser` extractor rejects
//! requests without a valid token.

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use std::collections::HashMap;

use crate::state::AppState;

/// Token-to-user lookup table
#[derive(Debug, Default)]
pub struct SessionTable {
    tokens: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct SessionFile {
    #[serde(default)]
    sessions: Vec<SessionEntry>,
}

#[derive(Debug, Deserialize)]
struct SessionEntry {
    token: String,
    user_id: String,
}

impl SessionTable {
    /// Load sessions from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let file: SessionFile = toml::from_str(toml_str)?;
        let tokens = file
            .sessions
            .into_iter()
            .map(|s| (s.token, s.user_id))
            .collect();
        Ok(Self { tokens })
    }

    /// Build from explicit (token, user_id) pairs
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            tokens: pairs.into_iter().collect(),
        }
    }

    /// Resolve a bearer token to a user ID
    pub fn resolve(&self, token: &str) -> Option<&str> {
        self.tokens.get(token).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// The authenticated user, pulled from the `Authorization: Bearer` header
#[derive(Debug, Clone)]
pub struct CurrentUser(pub String);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthRejection)?;

        let token = header.strip_prefix("Bearer ").ok_or(AuthRejection)?;

        state
            .sessions
            .resolve(token)
            .map(|user_id| CurrentUser(user_id.to_string()))
            .ok_or(AuthRejection)
    }
}

/// 401 response for missing or unknown tokens
#[derive(Debug)]
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": "Missing or invalid session token",
            "code": "UNAUTHENTICATED",
        });
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_table_from_toml() {
        let toml_str = r#"
            [[sessions]]
            token = "tok-alice"
            user_id = "alice"

            [[sessions]]
            token = "tok-bob"
            user_id = "bob"
        "#;

        let table = SessionTable::from_toml(toml_str).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.resolve("tok-alice"), Some("alice"));
        assert_eq!(table.resolve("tok-bob"), Some("bob"));
        assert_eq!(table.resolve("tok-mallory"), None);
    }

    #[test]
    fn test_empty_table_resolves_nothing() {
        let table = SessionTable::default();
        assert!(table.is_empty());
        assert_eq!(table.resolve("anything"), None);
    }
}
