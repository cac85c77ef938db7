//! Authenticated request gateway.
//!
//! Every REST call goes through [`ApiGateway::send`], which attaches the
//! stored bearer credential and resolves authorization failures as low as
//! possible: one refresh cycle, one replay of the original request, and a
//! terminal session-clear + entry-path navigation when that budget is
//! spent. Callers never see a raw 401.

use std::sync::Arc;

use reqwest::{Method, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use invita_common::feed::{FeedPost, ReactionMap};
use invita_common::id::{prefix, prefixed_ulid};
use invita_common::ReactionKind;

use crate::config::Config;
use crate::error::ClientError;
use crate::nav::Navigator;
use crate::store::SessionStore;

/// HTTP gateway with transparent credential refresh.
///
/// Cloneable — clones share the underlying connection pool, cookie jar, and
/// refresh lock.
#[derive(Clone)]
pub struct ApiGateway {
    http: reqwest::Client,
    base_url: String,
    entry_path: String,
    store: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
    /// Serializes refresh cycles so concurrent 401s coalesce into a single
    /// network refresh instead of a storm.
    refresh_lock: Arc<Mutex<()>>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    #[serde(rename = "accessToken")]
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FeedResponse {
    #[serde(rename = "feedData", default)]
    feed_data: Vec<FeedPost>,
}

#[derive(Debug, Deserialize)]
struct InvitationsResponse {
    #[serde(default)]
    invitations: Vec<FeedPost>,
}

#[derive(Debug, Deserialize)]
struct ReactionResponse {
    invitation: ReactionInvitation,
}

#[derive(Debug, Deserialize)]
struct ReactionInvitation {
    #[serde(default)]
    reactions: ReactionMap,
}

impl ApiGateway {
    pub fn new(
        config: &Config,
        store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ClientError> {
        // The cookie jar carries the refresh cookie set by the auth
        // provider — the out-of-band artifact `/auth/refresh` relies on.
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(ClientError::Transport)?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            entry_path: config.entry_path.clone(),
            store,
            navigator,
            refresh_lock: Arc::new(Mutex::new(())),
        })
    }

    /// URL of the external login initiation endpoint, for the login
    /// affordance rendered when a gate blocks a protected view.
    pub fn login_url(&self) -> String {
        format!("{}/auth/google", self.base_url)
    }

    // -----------------------------------------------------------------------
    // Request pipeline
    // -----------------------------------------------------------------------

    /// Dispatch a request, resolving at most one authorization failure.
    ///
    /// The retry budget is an explicit counter: a request triggers at most
    /// one refresh cycle and one replayed dispatch, then fails terminally
    /// with [`ClientError::SessionExpired`].
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Response, ClientError> {
        let req_id = prefixed_ulid(prefix::REQUEST);
        let mut attempt: u8 = 0;

        loop {
            // Re-read the store on every attempt; a credential cached across
            // an await could already be stale.
            let token = self.store.access_token();

            let mut builder = self
                .http
                .request(method.clone(), format!("{}{}", self.base_url, path));
            if !query.is_empty() {
                builder = builder.query(query);
            }
            if let Some(token) = token.as_deref() {
                builder = builder.bearer_auth(token);
            }
            if let Some(body) = body {
                builder = builder.json(body);
            }

            tracing::debug!(%req_id, %method, %path, attempt, "dispatching request");
            let resp = builder.send().await.map_err(ClientError::Transport)?;

            if resp.status() != StatusCode::UNAUTHORIZED {
                return Ok(resp);
            }

            if attempt >= 1 {
                tracing::warn!(%req_id, %path, "still unauthorized after refresh");
                return Err(self.expire_session());
            }
            attempt += 1;

            self.refresh(token.as_deref()).await?;
        }
    }

    /// Run one refresh cycle against `POST /auth/refresh`.
    ///
    /// `stale` is the credential the failed attempt used; if another request
    /// already rotated it while we waited on the lock, the network call is
    /// skipped and the caller just replays with the fresh credential.
    async fn refresh(&self, stale: Option<&str>) -> Result<(), ClientError> {
        let _guard = self.refresh_lock.lock().await;

        if self.store.access_token().as_deref() != stale {
            tracing::debug!("credential already rotated by a concurrent request");
            return Ok(());
        }

        // Deliberately no bearer header: the refresh endpoint authenticates
        // via the cookie jar.
        let resp = self
            .http
            .post(format!("{}/auth/refresh", self.base_url))
            .send()
            .await;

        let refreshed = match resp {
            Ok(r) if r.status().is_success() => r.json::<RefreshResponse>().await.ok(),
            Ok(r) => {
                tracing::debug!(status = %r.status(), "refresh rejected");
                None
            }
            Err(e) => {
                tracing::debug!(?e, "refresh transport failure");
                None
            }
        };

        match refreshed {
            Some(body) => {
                self.store.set_access_token(body.access_token);
                tracing::info!("bearer credential refreshed");
                Ok(())
            }
            None => Err(self.expire_session()),
        }
    }

    /// Terminal failure action: clear the session and force a full
    /// navigation to the unauthenticated entry point.
    fn expire_session(&self) -> ClientError {
        self.store.clear_session();
        self.navigator.assign(&self.entry_path);
        ClientError::SessionExpired
    }

    /// Map a non-success response into a classified error, extracting the
    /// backend's `{ "message": … }` body when present.
    async fn expect_success(resp: Response) -> Result<Response, ClientError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let message = resp
            .json::<ApiErrorBody>()
            .await
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_else(|| status.to_string());
        Err(ClientError::api(status.as_u16(), message))
    }

    // -----------------------------------------------------------------------
    // Typed endpoints
    // -----------------------------------------------------------------------

    /// `GET /invitations/feed/data[?userEmail=…]` — the public feed, with
    /// per-user reaction attribution when an identity is supplied.
    pub async fn fetch_feed(&self, user_email: Option<&str>) -> Result<Vec<FeedPost>, ClientError> {
        let query: Vec<(&str, &str)> = match user_email {
            Some(email) => vec![("userEmail", email)],
            None => Vec::new(),
        };
        let resp = self
            .send(Method::GET, "/invitations/feed/data", &query, None)
            .await?;
        let body: FeedResponse = Self::expect_success(resp).await?.json().await?;
        Ok(body.feed_data)
    }

    /// `GET /invitations/all` — every public invitation, newest event first.
    pub async fn fetch_all_invitations(&self) -> Result<Vec<FeedPost>, ClientError> {
        let resp = self.send(Method::GET, "/invitations/all", &[], None).await?;
        let body: InvitationsResponse = Self::expect_success(resp).await?.json().await?;
        let mut invitations = body.invitations;
        invitations.sort_by(|a, b| b.date_time.cmp(&a.date_time));
        Ok(invitations)
    }

    /// `GET /invitations/{id}` — a single invitation.
    pub async fn fetch_invitation(&self, invitation_id: &str) -> Result<FeedPost, ClientError> {
        let path = format!("/invitations/{invitation_id}");
        let resp = self.send(Method::GET, &path, &[], None).await?;
        Ok(Self::expect_success(resp).await?.json().await?)
    }

    /// `GET /invitations/private/{email}` — invitations addressed to the
    /// signed-in identity.
    pub async fn fetch_private_invitations(&self) -> Result<Vec<FeedPost>, ClientError> {
        let session = self.store.session().ok_or(ClientError::SignInRequired)?;
        let path = format!("/invitations/private/{}", session.email);
        let resp = self.send(Method::GET, &path, &[], None).await?;
        let body: InvitationsResponse = Self::expect_success(resp).await?.json().await?;
        Ok(body.invitations)
    }

    /// `POST /invitations/{id}/reaction` — record a reaction. Returns the
    /// server's post-update aggregate map for the invitation.
    pub async fn send_reaction(
        &self,
        invitation_id: &str,
        kind: ReactionKind,
    ) -> Result<ReactionMap, ClientError> {
        let session = self.store.session().ok_or(ClientError::SignInRequired)?;
        let path = format!("/invitations/{invitation_id}/reaction");
        let body = json!({
            "reactionType": kind,
            "userEmail": session.email,
        });
        let resp = self.send(Method::POST, &path, &[], Some(&body)).await?;
        let body: ReactionResponse = Self::expect_success(resp).await?.json().await?;
        Ok(body.invitation.reactions)
    }

    /// `POST /auth/logout1` — invalidate the refresh cookie, then clear the
    /// local session and return to the entry path regardless of the
    /// server's answer.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let result = self
            .http
            .post(format!("{}/auth/logout1", self.base_url))
            .send()
            .await;
        if let Err(e) = result {
            tracing::warn!(?e, "logout request failed; clearing local session anyway");
        }
        self.store.clear_session();
        self.navigator.assign(&self.entry_path);
        Ok(())
    }
}
