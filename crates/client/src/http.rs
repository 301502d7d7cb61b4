//! Authenticated HTTP client core.
//!
//! Wraps outgoing requests with credential decoration and recovers 401s
//! through a single-flight token refresh: the first request to observe a 401
//! performs the refresh, every concurrent observer queues behind it, and all
//! queued continuations settle in FIFO order once the outcome is known. At
//! most one refresh call is ever in flight process-wide.

use std::collections::VecDeque;
use std::sync::Arc;

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{Mutex, oneshot};
use uuid::Uuid;

use bluemine_session::SessionStore;

use crate::auth_api::AuthPayload;
use crate::config::ClientConfig;
use crate::error::{ApiError, extract_error_message};
use crate::request::ApiRequest;

/// Outcome delivered to queued continuations: the new access token, or `None`
/// when the refresh terminated the session.
type RefreshOutcome = Option<String>;

/// Continuation queue for requests suspended behind an in-flight refresh.
///
/// Owned exclusively by the client core; nothing else observes or mutates it.
#[derive(Debug, Default)]
struct RefreshQueue {
    refreshing: bool,
    waiters: VecDeque<oneshot::Sender<RefreshOutcome>>,
}

impl RefreshQueue {
    /// Register a continuation behind the in-flight refresh.
    fn enqueue(&mut self) -> oneshot::Receiver<RefreshOutcome> {
        let (tx, rx) = oneshot::channel();
        self.waiters.push_back(tx);
        rx
    }

    /// Settle every waiter with the refresh outcome, in enqueue order.
    fn drain(&mut self, outcome: RefreshOutcome) {
        while let Some(waiter) = self.waiters.pop_front() {
            // A waiter may have been dropped (caller went away); that is fine.
            let _ = waiter.send(outcome.clone());
        }
    }
}

/// Authenticated API client.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
#[derive(Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
    session: Arc<SessionStore>,
    refresh: Mutex<RefreshQueue>,
}

impl ApiClient {
    pub fn new(config: ClientConfig, session: Arc<SessionStore>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            config,
            session,
            refresh: Mutex::new(RefreshQueue::default()),
        })
    }

    /// Client configured from the environment.
    pub fn from_env(session: Arc<SessionStore>) -> Result<Self, ApiError> {
        Self::new(ClientConfig::from_env(), session)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Issue a request with credential decoration and 401 recovery.
    pub async fn request(&self, req: ApiRequest) -> Result<Response, ApiError> {
        let response = self.dispatch(&req, None).await?;

        if response.status() == StatusCode::UNAUTHORIZED && req.is_refreshable() {
            return self.recover_unauthorized(req).await;
        }

        Ok(response)
    }

    /// `request` + status check + JSON body.
    pub(crate) async fn expect_json<T: DeserializeOwned>(
        &self,
        req: ApiRequest,
    ) -> Result<T, ApiError> {
        let response = check_status(self.request(req).await?).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// `request` + status check, body discarded.
    pub(crate) async fn expect_ok(&self, req: ApiRequest) -> Result<(), ApiError> {
        check_status(self.request(req).await?).await.map(|_| ())
    }

    /// Build and send one request. Decoration rules, in order:
    /// an explicit bearer wins; credential endpoints go out bare; everything
    /// else gets the session's access token — or no authorization header at
    /// all, so a stale default can never leak.
    async fn dispatch(
        &self,
        req: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<Response, ApiError> {
        let url = self.config.endpoint(&req.path);
        let mut builder = self.http.request(req.method.clone(), url);

        if !req.query.is_empty() {
            builder = builder.query(&req.query);
        }
        if let Some(body) = &req.body {
            builder = builder.json(body);
        }

        let token = bearer
            .map(str::to_owned)
            .or_else(|| req.bearer_override.clone());
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        } else if !req.is_credential_endpoint() {
            if let Some(token) = self.session.bearer_token().await {
                builder = builder.bearer_auth(token);
            }
        }

        let request_id = Uuid::now_v7();
        builder = builder.header("x-request-id", request_id.to_string());

        tracing::debug!(
            %request_id,
            method = %req.method,
            path = %req.path,
            retried = req.retried,
            "dispatching api request"
        );

        Ok(builder.send().await?)
    }

    /// 401 recovery. Exactly one refresh per failure storm; everyone else
    /// suspends on the queue and resumes with that refresh's outcome.
    async fn recover_unauthorized(&self, mut req: ApiRequest) -> Result<Response, ApiError> {
        {
            let mut queue = self.refresh.lock().await;

            if queue.refreshing {
                let waiter = queue.enqueue();
                drop(queue);

                return match waiter.await {
                    Ok(Some(token)) => {
                        req.retried = true;
                        self.dispatch(&req, Some(&token)).await
                    }
                    Ok(None) | Err(_) => Err(ApiError::SessionExpired),
                };
            }

            if req.retried {
                // This call already consumed a refresh; a second 401 means the
                // new token is not good enough either.
                return Err(ApiError::Unauthorized);
            }

            req.retried = true;
            queue.refreshing = true;
        }

        match self.run_refresh().await {
            Ok(token) => {
                {
                    let mut queue = self.refresh.lock().await;
                    queue.refreshing = false;
                    queue.drain(Some(token.clone()));
                }
                self.dispatch(&req, Some(&token)).await
            }
            Err(err) => {
                {
                    let mut queue = self.refresh.lock().await;
                    queue.refreshing = false;
                    queue.drain(None);
                }
                Err(err)
            }
        }
    }

    /// Perform the refresh call, authenticating with the refresh token.
    ///
    /// Any failure here is terminal for the session: the store is cleared and
    /// the caller (plus every queued continuation) is rejected.
    async fn run_refresh(&self) -> Result<String, ApiError> {
        let Some(refresh_token) = self.session.refresh_token().await else {
            tracing::warn!("401 with no refresh token; terminating session");
            self.session.logout().await;
            return Err(ApiError::SessionExpired);
        };

        let req = ApiRequest::post("/auth/refresh", Value::Object(Default::default()))
            .with_bearer(refresh_token);

        let response = match self.dispatch(&req, None).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!("token refresh request failed: {err}");
                self.session.logout().await;
                return Err(err);
            }
        };

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "token refresh rejected; terminating session");
            self.session.logout().await;
            return Err(ApiError::SessionExpired);
        }

        let payload: AuthPayload = match response.json().await {
            Ok(payload) => payload,
            Err(err) => {
                self.session.logout().await;
                return Err(ApiError::Decode(err.to_string()));
            }
        };

        let auth = payload.into_session_auth();
        let token = auth.access_token.clone();
        self.session.set_auth(auth).await;

        tracing::debug!("token refresh succeeded");
        Ok(token)
    }

    /// Multipart requests are not replayable, so they bypass the refresh
    /// machinery; only the registration endpoint uses this, and it is exempt
    /// from decoration anyway. No content-type is set by hand — reqwest
    /// computes it so the boundary parameter is correct.
    pub(crate) async fn send_multipart(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<Response, ApiError> {
        let url = self.config.endpoint(path);
        let response = self.http.post(url).multipart(form).send().await?;
        check_status(response).await
    }
}

/// Map a non-2xx response into `ApiError::Http`, extracting the
/// server-supplied message where the body allows it.
pub(crate) async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .text()
        .await
        .ok()
        .and_then(|text| {
            serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|body| extract_error_message(&body))
                .or_else(|| {
                    let trimmed = text.trim();
                    (!trimmed.is_empty()).then(|| trimmed.to_string())
                })
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

    Err(ApiError::Http {
        status: status.as_u16(),
        message,
    })
}
