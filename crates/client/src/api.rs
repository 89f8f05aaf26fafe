//! REST client for the BugBoard HTTP endpoints.
//!
//! Wraps every backend endpoint the client consumes using [`reqwest`].
//! The bearer token of the current session is attached to each request.

use std::sync::Arc;

use bugboard_core::account::{LoginRequest, PasswordChange, RegisterRequest};
use bugboard_core::bug::{Bug, BugUpdate, NewBug, Tag};
use bugboard_core::comment::{Comment, CommentUpdate, NewComment};
use bugboard_core::error::CoreError;
use bugboard_core::moderation::BanRequest;
use bugboard_core::types::DbId;
use bugboard_core::user::{Session, User};
use bugboard_core::vote::{BugVote, CommentVote};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ClientConfig;
use crate::error::{extract_message, ApiError, ApiResult};
use crate::session::SessionStore;

/// HTTP client for a single BugBoard backend.
pub struct BugBoardApi {
    client: reqwest::Client,
    api_url: Url,
    session: Arc<SessionStore>,
}

impl BugBoardApi {
    /// Create a client from configuration, with its own connection pool.
    pub fn new(config: &ClientConfig, session: Arc<SessionStore>) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        let api_url = Url::parse(&config.api_url)
            .map_err(|e| CoreError::Validation(format!("Invalid API URL '{}': {e}", config.api_url)))?;
        if api_url.cannot_be_a_base() {
            return Err(CoreError::Validation(format!("Invalid API URL '{}'", config.api_url)).into());
        }
        Ok(Self {
            client,
            api_url,
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// The signed-in user, if any.
    pub fn current_user(&self) -> Option<User> {
        self.session.user()
    }

    // ---- auth & account ----

    /// Authenticate and store the resulting session.
    ///
    /// Sends `POST /auth/login`. The backend answers either
    /// `{ token, user: {..} }` or the user fields flat with an optional
    /// `token`; both shapes are accepted.
    pub async fn login(&self, request: &LoginRequest) -> ApiResult<Session> {
        let body: serde_json::Value = self
            .send_json(self.request(Method::POST, &["auth", "login"]), Some(request))
            .await?;
        let session = parse_login_response(body)?;
        self.session.set(session.clone())?;
        tracing::info!(user_id = %session.user.id, role = %session.user.role, "Logged in");
        Ok(session)
    }

    /// Create an account. Does not sign in.
    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<User> {
        self.send_json(self.request(Method::POST, &["api", "users", "register"]), Some(request))
            .await
    }

    /// Forget the local session. The backend keeps no server-side session.
    pub fn logout(&self) -> ApiResult<()> {
        self.session.clear()?;
        tracing::info!("Logged out");
        Ok(())
    }

    /// Sends `PUT /api/users/update/{id}` with the new password.
    pub async fn change_password(&self, user_id: &str, change: &PasswordChange) -> ApiResult<()> {
        self.send_unit(
            self.request(Method::PUT, &["api", "users", "update", user_id]),
            Some(change),
        )
        .await
    }

    /// Sends `DELETE /auth/account`, then clears the local session.
    pub async fn delete_account(&self) -> ApiResult<()> {
        self.send_unit::<()>(self.request(Method::DELETE, &["auth", "account"]), None)
            .await?;
        self.session.clear()?;
        Ok(())
    }

    pub async fn get_user(&self, user_id: &str) -> ApiResult<User> {
        self.send_json::<(), _>(self.request(Method::GET, &["api", "users", "details", user_id]), None)
            .await
    }

    // ---- bugs ----

    pub async fn list_bugs(&self) -> ApiResult<Vec<Bug>> {
        self.send_json::<(), _>(self.request(Method::GET, &["api", "bugs", "list"]), None)
            .await
    }

    pub async fn list_user_bugs(&self, user_id: &str) -> ApiResult<Vec<Bug>> {
        self.send_json::<(), _>(self.request(Method::GET, &["api", "bugs", "user", user_id]), None)
            .await
    }

    pub async fn get_bug(&self, bug_id: DbId) -> ApiResult<Bug> {
        let id = bug_id.to_string();
        self.send_json::<(), _>(self.request(Method::GET, &["api", "bugs", "details", &id]), None)
            .await
    }

    pub async fn report_bug(&self, bug: &NewBug) -> ApiResult<Bug> {
        self.send_json(self.request(Method::POST, &["api", "bugs", "report"]), Some(bug))
            .await
    }

    /// Sends `PUT /api/bugs/update/{id}?userId=` as the bug's author (or a
    /// moderator editing through the regular form).
    pub async fn update_bug(&self, bug_id: DbId, user_id: &str, update: &BugUpdate) -> ApiResult<()> {
        let id = bug_id.to_string();
        let request = self
            .request(Method::PUT, &["api", "bugs", "update", &id])
            .query(&[("userId", user_id)]);
        self.send_unit(request, Some(update)).await
    }

    /// Sends `PATCH /api/moderation/bugs/{id}/mods/{modId}`.
    pub async fn moderate_bug(&self, bug_id: DbId, moderator_id: &str, update: &BugUpdate) -> ApiResult<()> {
        let id = bug_id.to_string();
        self.send_unit(
            self.request(Method::PATCH, &["api", "moderation", "bugs", &id, "mods", moderator_id]),
            Some(update),
        )
        .await
    }

    pub async fn delete_bug(&self, bug_id: DbId, user_id: &str) -> ApiResult<()> {
        let id = bug_id.to_string();
        let request = self
            .request(Method::DELETE, &["api", "bugs", "remove", &id])
            .query(&[("userId", user_id)]);
        self.send_unit::<()>(request, None).await
    }

    /// Sends `POST /api/bugs/{bugId}/accept/{commentId}` with `{ userId }`.
    pub async fn accept_comment(&self, bug_id: DbId, comment_id: DbId, user_id: &str) -> ApiResult<()> {
        let (bug, comment) = (bug_id.to_string(), comment_id.to_string());
        let body = serde_json::json!({ "userId": user_id });
        self.send_unit(
            self.request(Method::POST, &["api", "bugs", &bug, "accept", &comment]),
            Some(&body),
        )
        .await
    }

    // ---- comments ----

    pub async fn list_comments(&self, bug_id: DbId) -> ApiResult<Vec<Comment>> {
        let id = bug_id.to_string();
        self.send_json::<(), _>(self.request(Method::GET, &["api", "comments", "bug", &id]), None)
            .await
    }

    pub async fn create_comment(&self, comment: &NewComment) -> ApiResult<Comment> {
        self.send_json(self.request(Method::POST, &["api", "comments", "create"]), Some(comment))
            .await
    }

    pub async fn update_comment(&self, comment_id: DbId, update: &CommentUpdate) -> ApiResult<()> {
        let id = comment_id.to_string();
        self.send_unit(
            self.request(Method::PUT, &["api", "comments", "update", &id]),
            Some(update),
        )
        .await
    }

    pub async fn delete_comment(&self, comment_id: DbId, author_id: &str) -> ApiResult<()> {
        let id = comment_id.to_string();
        let request = self
            .request(Method::DELETE, &["api", "comments", "delete", &id])
            .query(&[("authorId", author_id)]);
        self.send_unit::<()>(request, None).await
    }

    // ---- votes ----

    pub async fn vote_bug(&self, bug_id: DbId, vote: &BugVote) -> ApiResult<()> {
        let id = bug_id.to_string();
        self.send_unit(self.request(Method::POST, &["api", "votes", "bug", &id]), Some(vote))
            .await
    }

    pub async fn vote_comment(&self, vote: &CommentVote) -> ApiResult<()> {
        self.send_unit(self.request(Method::POST, &["api", "votes", "create"]), Some(vote))
            .await
    }

    // ---- moderation ----

    pub async fn ban_user(&self, user_id: &str, moderator_id: &str, ban: &BanRequest) -> ApiResult<()> {
        self.send_unit(
            self.request(
                Method::POST,
                &["api", "moderation", "users", user_id, "ban", "mods", moderator_id],
            ),
            Some(ban),
        )
        .await
    }

    pub async fn unban_user(&self, user_id: &str, moderator_id: &str) -> ApiResult<()> {
        self.send_unit::<()>(
            self.request(
                Method::POST,
                &["api", "moderation", "users", user_id, "unban", "mods", moderator_id],
            ),
            None,
        )
        .await
    }

    // ---- tags ----

    pub async fn list_tags(&self) -> ApiResult<Vec<Tag>> {
        self.send_json::<(), _>(self.request(Method::GET, &["api", "tags", "list"]), None)
            .await
    }

    pub async fn create_tag(&self, name: &str) -> ApiResult<Tag> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation("Tag name is required".into()).into());
        }
        let body = serde_json::json!({ "name": name });
        self.send_json(self.request(Method::POST, &["api", "tags", "create"]), Some(&body))
            .await
    }

    // ---- private helpers ----

    /// Resolve path segments against the base URL. Each segment is
    /// percent-encoded by [`Url`], so opaque user ids are safe to pass.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> reqwest::RequestBuilder {
        let url = self.endpoint(segments);
        tracing::debug!(%method, path = url.path(), "API request");
        let builder = self.client.request(method, url);
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        mut builder: reqwest::RequestBuilder,
        body: Option<&B>,
    ) -> ApiResult<reqwest::Response> {
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = builder.send().await?;
        Self::ensure_success(response).await
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
        body: Option<&B>,
    ) -> ApiResult<T> {
        let response = self.send(builder, body).await?;
        Ok(response.json::<T>().await?)
    }

    async fn send_unit<B: Serialize + ?Sized>(
        &self,
        builder: reqwest::RequestBuilder,
        body: Option<&B>,
    ) -> ApiResult<()> {
        self.send(builder, body).await?;
        Ok(())
    }

    /// Ensure the response has a success status code. On failure, returns
    /// [`ApiError::Api`] carrying the server's message if it sent one.
    async fn ensure_success(response: reqwest::Response) -> ApiResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = extract_message(&body);
        tracing::debug!(status = status.as_u16(), message = ?message, "API error response");
        Err(ApiError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Accept both login response shapes and build a [`Session`].
fn parse_login_response(mut body: serde_json::Value) -> ApiResult<Session> {
    let token = ["token", "accessToken", "access_token"]
        .iter()
        .find_map(|key| body.get(*key).and_then(|v| v.as_str()))
        .unwrap_or_default()
        .to_string();
    let nested = body
        .get_mut("user")
        .filter(|user| user.is_object())
        .map(serde_json::Value::take);
    let user_json = nested.unwrap_or(body);
    let user: User = serde_json::from_value(user_json).map_err(|e| {
        CoreError::Internal(format!("Unexpected login response: {e}"))
    })?;
    Ok(Session::new(token, user))
}
