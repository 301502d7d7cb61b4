//! Replayable request description.
//!
//! The refresh protocol may need to re-issue a request with a new credential,
//! so requests are described as plain data instead of one-shot builder state.
//! The `retried` marker travels with the request and is checked before the
//! refresh path can be entered a second time.

use reqwest::Method;
use serde_json::Value;

/// A pending API request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) body: Option<Value>,
    /// Caller-set bearer credential; preserved verbatim by decoration. The
    /// refresh call uses this to authenticate with the refresh token.
    pub(crate) bearer_override: Option<String>,
    /// Set once the request has been replayed after a refresh.
    pub(crate) retried: bool,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            bearer_override: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PUT, path).with_body(body)
    }

    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PATCH, path).with_body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Attach an explicit bearer credential, bypassing session decoration.
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer_override = Some(token.into());
        self
    }

    /// Credential endpoints must not carry a stale access token and must not
    /// trigger recursive refresh.
    pub(crate) fn is_credential_endpoint(&self) -> bool {
        matches!(
            self.path.as_str(),
            "/auth/login" | "/auth/register" | "/auth/refresh"
        )
    }

    /// Whether a 401 on this request may enter the refresh path.
    pub(crate) fn is_refreshable(&self) -> bool {
        !self.path.starts_with("/auth/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_endpoints_are_exempt() {
        assert!(ApiRequest::post("/auth/login", Value::Null).is_credential_endpoint());
        assert!(ApiRequest::post("/auth/refresh", Value::Null).is_credential_endpoint());
        assert!(!ApiRequest::post("/auth/logout", Value::Null).is_credential_endpoint());
        assert!(!ApiRequest::get("/task").is_credential_endpoint());
    }

    #[test]
    fn auth_paths_never_enter_the_refresh_path() {
        assert!(!ApiRequest::post("/auth/login", Value::Null).is_refreshable());
        assert!(!ApiRequest::post("/auth/logout", Value::Null).is_refreshable());
        assert!(ApiRequest::get("/task").is_refreshable());
    }
}
