//! In-process fake BugBoard backend for client integration tests.
//!
//! Serves the same routes as the real server from an in-memory store on an
//! ephemeral port, and enforces the server-side rules the client relies on:
//! no self-votes, a single accepted comment per bug, accept only by the bug
//! author while the bug is open, no comments on solved bugs, banned accounts
//! refused at login.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{delete, get, patch, post, put};
use axum::{Json, Router};
use bugboard_client::{BugBoardApi, ClientConfig, SessionStore};
use bugboard_core::bug::{Bug, BugStatus, BugTag, Tag};
use bugboard_core::comment::Comment;
use bugboard_core::roles::Role;
use bugboard_core::types::{DbId, Timestamp};
use bugboard_core::user::{AuthorRef, User};
use bugboard_core::vote::VoteDirection;
use bugboard_events::EventBus;
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

pub const MODERATOR_ID: &str = "1";
pub const USER15_ID: &str = "15";
pub const USER16_ID: &str = "16";
pub const BANNED_ID: &str = "17";

/// Seeded bug by user16, status `Received`, with one comment by user15.
pub const OPEN_BUG_ID: DbId = 100;
/// Seeded bug by the moderator, status `Solved`, with an accepted answer.
pub const SOLVED_BUG_ID: DbId = 101;
pub const USER15_COMMENT_ID: DbId = 500;

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

struct Account {
    user: User,
    password: String,
}

#[derive(Default)]
struct Store {
    accounts: Vec<Account>,
    bugs: Vec<Bug>,
    comments: HashMap<DbId, Vec<Comment>>,
    bug_votes: HashMap<(DbId, String), VoteDirection>,
    comment_votes: HashMap<(DbId, String), VoteDirection>,
    tags: Vec<Tag>,
    next_id: DbId,
    clock: Option<Timestamp>,
}

impl Store {
    fn seeded() -> Self {
        let mut store = Store {
            next_id: 1_000,
            ..Store::default()
        };
        store.add_account(MODERATOR_ID, "moderator", "modpass", Role::Moderator, false);
        store.add_account(USER15_ID, "user15", "password15", Role::User, false);
        store.add_account(USER16_ID, "user16", "password16", Role::User, false);
        store.add_account(BANNED_ID, "spammer", "password17", Role::User, true);
        store.tags = vec![
            Tag { id: 1, name: "ui".into() },
            Tag { id: 2, name: "backend".into() },
        ];

        let open = Bug {
            id: OPEN_BUG_ID,
            title: "Login page crashes".into(),
            description: "Pressing enter twice crashes the login page".into(),
            status: BugStatus::Received,
            created_at: at(2026, 1, 1),
            author: store.author(USER16_ID),
            image: None,
            vote_count: 0,
            bug_tags: vec![BugTag { id: Some(1), tag: store.tags[0].clone() }],
        };
        let solved = Bug {
            id: SOLVED_BUG_ID,
            title: "Typo in footer".into(),
            description: "Copyrihgt".into(),
            status: BugStatus::Solved,
            created_at: at(2026, 1, 2),
            author: store.author(MODERATOR_ID),
            image: None,
            vote_count: 0,
            bug_tags: Vec::new(),
        };
        store.comments.insert(
            OPEN_BUG_ID,
            vec![Comment {
                id: USER15_COMMENT_ID,
                text: "Same here on Firefox".into(),
                image: None,
                created_at: at(2026, 1, 3),
                author: store.author(USER15_ID),
                accepted: false,
                vote_count: 0,
            }],
        );
        store.comments.insert(
            SOLVED_BUG_ID,
            vec![Comment {
                id: 501,
                text: "Fixed in the template".into(),
                image: None,
                created_at: at(2026, 1, 3),
                author: store.author(USER16_ID),
                accepted: true,
                vote_count: 0,
            }],
        );
        store.bugs = vec![open, solved];
        store
    }

    fn add_account(&mut self, id: &str, username: &str, password: &str, role: Role, banned: bool) {
        self.accounts.push(Account {
            user: User {
                id: id.into(),
                username: username.into(),
                email: format!("{username}@test.com"),
                role,
                score: 0.0,
                avatar: None,
                banned,
            },
            password: password.into(),
        });
    }

    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }

    /// Strictly increasing creation times.
    fn now(&mut self) -> Timestamp {
        let now = Utc::now();
        let next = match self.clock {
            Some(last) if last >= now => last + chrono::Duration::milliseconds(1),
            _ => now,
        };
        self.clock = Some(next);
        next
    }

    fn user(&self, id: &str) -> Option<&User> {
        self.accounts.iter().map(|a| &a.user).find(|u| u.id == id)
    }

    fn author(&self, id: &str) -> AuthorRef {
        let user = self.user(id);
        AuthorRef {
            id: id.into(),
            username: user.map(|u| u.username.clone()).unwrap_or_default(),
            score: user.map(|u| u.score).unwrap_or_default(),
        }
    }

    fn is_moderator(&self, id: &str) -> bool {
        self.user(id).is_some_and(User::is_moderator)
    }

    fn bug_mut(&mut self, id: DbId) -> Result<&mut Bug, Failure> {
        self.bugs
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| fail(StatusCode::NOT_FOUND, "Bug not found"))
    }

    fn comment_location(&self, comment_id: DbId) -> Option<(DbId, usize)> {
        self.comments.iter().find_map(|(bug_id, list)| {
            list.iter()
                .position(|c| c.id == comment_id)
                .map(|i| (*bug_id, i))
        })
    }

    fn recount_bug(&mut self, bug_id: DbId) {
        let count = tally(self.bug_votes.iter().filter(|((id, _), _)| *id == bug_id));
        if let Ok(bug) = self.bug_mut(bug_id) {
            bug.vote_count = count;
        }
    }

    fn recount_comment(&mut self, comment_id: DbId) {
        let count = tally(self.comment_votes.iter().filter(|((id, _), _)| *id == comment_id));
        if let Some((bug_id, i)) = self.comment_location(comment_id) {
            if let Some(list) = self.comments.get_mut(&bug_id) {
                list[i].vote_count = count;
            }
        }
    }
}

fn tally<'a>(votes: impl Iterator<Item = (&'a (DbId, String), &'a VoteDirection)>) -> i64 {
    votes
        .map(|(_, d)| match d {
            VoteDirection::Upvote => 1,
            VoteDirection::Downvote => -1,
        })
        .sum()
}

fn at(year: i32, month: u32, day: u32) -> Timestamp {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0)
        .single()
        .expect("valid seed date")
}

// ---------------------------------------------------------------------------
// Backend handle
// ---------------------------------------------------------------------------

/// Shared state of a running fake backend. Tests inspect it directly.
pub struct FakeBackend {
    store: Mutex<Store>,
    requests: Mutex<Vec<String>>,
    vote_writes: AtomicU64,
    vote_delay: Mutex<Duration>,
    fail_votes: Mutex<Option<(StatusCode, String)>>,
}

impl FakeBackend {
    fn new() -> Self {
        Self {
            store: Mutex::new(Store::seeded()),
            requests: Mutex::new(Vec::new()),
            vote_writes: AtomicU64::new(0),
            vote_delay: Mutex::new(Duration::ZERO),
            fail_votes: Mutex::new(None),
        }
    }

    /// `"METHOD /path"` of every request received, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }

    pub fn vote_writes(&self) -> u64 {
        self.vote_writes.load(Ordering::SeqCst)
    }

    /// Hold every vote write for `delay` before applying it.
    pub fn set_vote_delay(&self, delay: Duration) {
        *self.vote_delay.lock().unwrap() = delay;
    }

    /// Make every vote write fail with `status` and `message`.
    pub fn fail_votes(&self, status: StatusCode, message: &str) {
        *self.fail_votes.lock().unwrap() = Some((status, message.to_string()));
    }

    pub fn bug(&self, id: DbId) -> Option<Bug> {
        self.store.lock().unwrap().bugs.iter().find(|b| b.id == id).cloned()
    }

    pub fn comments(&self, bug_id: DbId) -> Vec<Comment> {
        self.store
            .lock()
            .unwrap()
            .comments
            .get(&bug_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn user(&self, id: &str) -> Option<User> {
        self.store.lock().unwrap().user(id).cloned()
    }

    pub fn bug_ids(&self) -> Vec<DbId> {
        self.store.lock().unwrap().bugs.iter().map(|b| b.id).collect()
    }

    /// Force a second accepted comment onto a bug, bypassing the rules.
    pub fn corrupt_accepted(&self, bug_id: DbId) {
        let mut store = self.store.lock().unwrap();
        if let Some(list) = store.comments.get_mut(&bug_id) {
            for c in list.iter_mut() {
                c.accepted = true;
            }
        }
    }

    /// Set a bug's status directly.
    pub fn set_status(&self, bug_id: DbId, status: BugStatus) {
        if let Ok(bug) = self.store.lock().unwrap().bug_mut(bug_id) {
            bug.status = status;
        }
    }
}

/// A running backend and its base URL.
pub struct TestServer {
    pub url: String,
    pub backend: Arc<FakeBackend>,
}

impl TestServer {
    /// A fresh client session against this server, with its own event bus.
    pub fn client(&self) -> (Arc<BugBoardApi>, Arc<EventBus>) {
        let config = ClientConfig {
            api_url: self.url.clone(),
            timeout_secs: 5,
            ..ClientConfig::default()
        };
        let api = BugBoardApi::new(&config, Arc::new(SessionStore::in_memory()))
            .expect("client should build");
        (Arc::new(api), Arc::new(EventBus::default()))
    }

    /// A client already signed in as `username`.
    pub async fn client_as(&self, username: &str, password: &str) -> (Arc<BugBoardApi>, Arc<EventBus>) {
        let (api, bus) = self.client();
        let request = bugboard_core::account::LoginRequest::new(username, password).unwrap();
        api.login(&request).await.expect("login should succeed");
        (api, bus)
    }
}

/// Start a seeded fake backend on an ephemeral port.
pub async fn spawn() -> TestServer {
    let backend = Arc::new(FakeBackend::new());
    let app = router(backend.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake backend");
    });
    TestServer {
        url: format!("http://{addr}"),
        backend,
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

type Shared = Arc<FakeBackend>;
type Failure = (StatusCode, Json<Value>);
type Reply = Result<Json<Value>, Failure>;

fn fail(status: StatusCode, message: &str) -> Failure {
    (status, Json(json!({ "error": message })))
}

fn ok(value: impl serde::Serialize) -> Reply {
    serde_json::to_value(value)
        .map(Json)
        .map_err(|e| fail(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()))
}

fn router(backend: Shared) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/account", delete(delete_account))
        .route("/api/users/register", post(register))
        .route("/api/users/update/{id}", put(change_password))
        .route("/api/users/details/{id}", get(user_details))
        .route("/api/bugs/list", get(list_bugs))
        .route("/api/bugs/user/{user_id}", get(user_bugs))
        .route("/api/bugs/details/{id}", get(bug_details))
        .route("/api/bugs/report", post(report_bug))
        .route("/api/bugs/update/{id}", put(update_bug))
        .route("/api/bugs/remove/{id}", delete(remove_bug))
        .route("/api/bugs/{bug_id}/accept/{comment_id}", post(accept))
        .route("/api/comments/bug/{bug_id}", get(list_comments))
        .route("/api/comments/create", post(create_comment))
        .route("/api/comments/update/{id}", put(update_comment))
        .route("/api/comments/delete/{id}", delete(delete_comment))
        .route("/api/votes/bug/{bug_id}", post(vote_bug))
        .route("/api/votes/create", post(vote_comment))
        .route("/api/moderation/bugs/{id}/mods/{mod_id}", patch(moderate_bug))
        .route("/api/moderation/users/{id}/ban/mods/{mod_id}", post(ban))
        .route("/api/moderation/users/{id}/unban/mods/{mod_id}", post(unban))
        .route("/api/tags/list", get(list_tags))
        .route("/api/tags/create", post(create_tag))
        .layer(middleware::from_fn_with_state(backend.clone(), record))
        .with_state(backend)
}

/// Log each request, and refuse writes without a bearer token.
async fn record(State(backend): State<Shared>, request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    backend
        .requests
        .lock()
        .unwrap()
        .push(format!("{method} {path}"));

    let public = matches!(path.as_str(), "/auth/login" | "/api/users/register");
    if method != Method::GET && !public && bearer(request.headers()).is_none() {
        let body = Json(json!({ "error": "Authentication required" }));
        return axum::response::IntoResponse::into_response((StatusCode::UNAUTHORIZED, body));
    }
    next.run(request).await
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer token-")
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// Handlers: auth & users
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

async fn login(State(backend): State<Shared>, Json(body): Json<LoginBody>) -> Reply {
    let store = backend.store.lock().unwrap();
    let account = store
        .accounts
        .iter()
        .find(|a| a.user.username == body.username && a.password == body.password)
        .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "Invalid username or password"))?;
    if account.user.banned {
        return Err(fail(StatusCode::FORBIDDEN, "Your account has been banned"));
    }
    ok(json!({ "token": format!("token-{}", account.user.id), "user": account.user }))
}

#[derive(Deserialize)]
struct RegisterBody {
    username: String,
    email: String,
    password: String,
    role: Role,
}

async fn register(State(backend): State<Shared>, Json(body): Json<RegisterBody>) -> Reply {
    let mut store = backend.store.lock().unwrap();
    if store.accounts.iter().any(|a| a.user.username == body.username) {
        return Err(fail(StatusCode::CONFLICT, "Username already taken"));
    }
    let id = store.next_id().to_string();
    store.add_account(&id, &body.username, &body.password, body.role, false);
    if let Some(account) = store.accounts.last_mut() {
        account.user.email = body.email;
    }
    ok(store.user(&id))
}

#[derive(Deserialize)]
struct PasswordBody {
    password: String,
}

async fn change_password(
    State(backend): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<PasswordBody>,
) -> Reply {
    if bearer(&headers).as_deref() != Some(id.as_str()) {
        return Err(fail(StatusCode::FORBIDDEN, "Cannot change another user's password"));
    }
    let mut store = backend.store.lock().unwrap();
    let account = store
        .accounts
        .iter_mut()
        .find(|a| a.user.id == id)
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "User not found"))?;
    account.password = body.password;
    ok(json!({ "message": "Password updated" }))
}

async fn delete_account(State(backend): State<Shared>, headers: HeaderMap) -> Reply {
    let id = bearer(&headers).ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "Authentication required"))?;
    let mut store = backend.store.lock().unwrap();
    store.accounts.retain(|a| a.user.id != id);
    ok(json!({ "message": "Account deleted" }))
}

async fn user_details(State(backend): State<Shared>, Path(id): Path<String>) -> Reply {
    let store = backend.store.lock().unwrap();
    let user = store
        .user(&id)
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "User not found"))?;
    ok(user)
}

// ---------------------------------------------------------------------------
// Handlers: bugs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActingUser {
    user_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportBody {
    author_id: String,
    title: String,
    description: String,
    image: Option<String>,
    #[serde(default)]
    tag_ids: Vec<DbId>,
}

#[derive(Deserialize)]
struct BugBody {
    title: String,
    description: String,
    /// Absent keeps the current image, `null` clears it.
    #[serde(default, deserialize_with = "present")]
    image: Option<Option<String>>,
    status: BugStatus,
}

fn present<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<Option<Option<String>>, D::Error> {
    Option::<String>::deserialize(deserializer).map(Some)
}

async fn list_bugs(State(backend): State<Shared>) -> Reply {
    let store = backend.store.lock().unwrap();
    ok(&store.bugs)
}

async fn user_bugs(State(backend): State<Shared>, Path(user_id): Path<String>) -> Reply {
    let store = backend.store.lock().unwrap();
    let bugs: Vec<&Bug> = store.bugs.iter().filter(|b| b.author.id == user_id).collect();
    ok(bugs)
}

async fn bug_details(State(backend): State<Shared>, Path(id): Path<DbId>) -> Reply {
    let mut store = backend.store.lock().unwrap();
    let bug = store.bug_mut(id)?.clone();
    ok(bug)
}

async fn report_bug(State(backend): State<Shared>, Json(body): Json<ReportBody>) -> Reply {
    let mut store = backend.store.lock().unwrap();
    if body.title.trim().is_empty() {
        return Err(fail(StatusCode::BAD_REQUEST, "Title is required"));
    }
    let id = store.next_id();
    let created_at = store.now();
    let bug_tags = store
        .tags
        .iter()
        .filter(|t| body.tag_ids.contains(&t.id))
        .map(|t| BugTag { id: None, tag: t.clone() })
        .collect();
    let bug = Bug {
        id,
        title: body.title,
        description: body.description,
        status: BugStatus::Received,
        created_at,
        author: store.author(&body.author_id),
        image: body.image,
        vote_count: 0,
        bug_tags,
    };
    store.bugs.push(bug.clone());
    store.comments.insert(id, Vec::new());
    ok(bug)
}

fn apply_bug_edit(store: &mut Store, id: DbId, body: BugBody) -> Reply {
    let bug = store.bug_mut(id)?;
    bug.title = body.title;
    bug.description = body.description;
    if let Some(image) = body.image {
        bug.image = image;
    }
    bug.status = body.status;
    ok(json!({ "message": "Bug updated" }))
}

async fn update_bug(
    State(backend): State<Shared>,
    Path(id): Path<DbId>,
    Query(acting): Query<ActingUser>,
    Json(body): Json<BugBody>,
) -> Reply {
    let mut store = backend.store.lock().unwrap();
    let author = store.bug_mut(id)?.author.id.clone();
    if author != acting.user_id && !store.is_moderator(&acting.user_id) {
        return Err(fail(StatusCode::FORBIDDEN, "Only the author can edit this bug"));
    }
    apply_bug_edit(&mut store, id, body)
}

async fn moderate_bug(
    State(backend): State<Shared>,
    Path((id, mod_id)): Path<(DbId, String)>,
    Json(body): Json<BugBody>,
) -> Reply {
    let mut store = backend.store.lock().unwrap();
    if !store.is_moderator(&mod_id) {
        return Err(fail(StatusCode::FORBIDDEN, "Moderator rights required"));
    }
    apply_bug_edit(&mut store, id, body)
}

async fn remove_bug(
    State(backend): State<Shared>,
    Path(id): Path<DbId>,
    Query(acting): Query<ActingUser>,
) -> Reply {
    let mut store = backend.store.lock().unwrap();
    let author = store.bug_mut(id)?.author.id.clone();
    if author != acting.user_id && !store.is_moderator(&acting.user_id) {
        return Err(fail(StatusCode::FORBIDDEN, "Only the author can delete this bug"));
    }
    store.bugs.retain(|b| b.id != id);
    store.comments.remove(&id);
    ok(json!({ "message": "Bug deleted" }))
}

async fn accept(
    State(backend): State<Shared>,
    Path((bug_id, comment_id)): Path<(DbId, DbId)>,
    Json(acting): Json<ActingUser>,
) -> Reply {
    let mut store = backend.store.lock().unwrap();
    let bug = store.bug_mut(bug_id)?;
    if bug.author.id != acting.user_id {
        return Err(fail(StatusCode::FORBIDDEN, "Only the bug creator can accept a comment"));
    }
    if bug.status.is_solved() {
        return Err(fail(StatusCode::BAD_REQUEST, "Bug is already solved"));
    }
    let list = store
        .comments
        .get_mut(&bug_id)
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "Comment not found"))?;
    if !list.iter().any(|c| c.id == comment_id) {
        return Err(fail(StatusCode::NOT_FOUND, "Comment not found"));
    }
    for c in list.iter_mut() {
        c.accepted = c.id == comment_id;
    }
    ok(json!({ "message": "Comment accepted" }))
}

// ---------------------------------------------------------------------------
// Handlers: comments
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentBody {
    bug_id: DbId,
    author_id: String,
    text: String,
    image: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentEditBody {
    author_id: String,
    text: String,
    image: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentAuthor {
    author_id: String,
}

async fn list_comments(State(backend): State<Shared>, Path(bug_id): Path<DbId>) -> Reply {
    let mut store = backend.store.lock().unwrap();
    store.bug_mut(bug_id)?;
    let comments = store.comments.get(&bug_id).cloned().unwrap_or_default();
    ok(comments)
}

async fn create_comment(State(backend): State<Shared>, Json(body): Json<CommentBody>) -> Reply {
    let mut store = backend.store.lock().unwrap();
    if store.bug_mut(body.bug_id)?.status.is_solved() {
        return Err(fail(StatusCode::BAD_REQUEST, "Cannot comment on a solved bug"));
    }
    let id = store.next_id();
    let comment = Comment {
        id,
        text: body.text,
        image: body.image,
        created_at: store.now(),
        author: store.author(&body.author_id),
        accepted: false,
        vote_count: 0,
    };
    store
        .comments
        .entry(body.bug_id)
        .or_default()
        .push(comment.clone());
    ok(comment)
}

async fn update_comment(
    State(backend): State<Shared>,
    Path(id): Path<DbId>,
    Json(body): Json<CommentEditBody>,
) -> Reply {
    let mut store = backend.store.lock().unwrap();
    let moderator = store.is_moderator(&body.author_id);
    let (bug_id, i) = store
        .comment_location(id)
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "Comment not found"))?;
    let list = store.comments.get_mut(&bug_id).expect("located comment");
    let comment = &mut list[i];
    if comment.author.id != body.author_id && !moderator {
        return Err(fail(StatusCode::FORBIDDEN, "Only the author can edit this comment"));
    }
    comment.text = body.text;
    comment.image = body.image;
    ok(json!({ "message": "Comment updated" }))
}

async fn delete_comment(
    State(backend): State<Shared>,
    Path(id): Path<DbId>,
    Query(acting): Query<CommentAuthor>,
) -> Reply {
    let mut store = backend.store.lock().unwrap();
    let moderator = store.is_moderator(&acting.author_id);
    let (bug_id, i) = store
        .comment_location(id)
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "Comment not found"))?;
    let list = store.comments.get_mut(&bug_id).expect("located comment");
    if list[i].author.id != acting.author_id && !moderator {
        return Err(fail(StatusCode::FORBIDDEN, "Only the author can delete this comment"));
    }
    list.remove(i);
    ok(json!({ "message": "Comment deleted" }))
}

// ---------------------------------------------------------------------------
// Handlers: votes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BugVoteBody {
    user_id: String,
    vote_type: VoteDirection,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentVoteBody {
    user_id: String,
    comment_id: DbId,
    vote_type: VoteDirection,
}

/// Count the write, apply the configured delay, and return the injected
/// failure if one is set.
async fn before_vote(backend: &FakeBackend) -> Result<(), Failure> {
    backend.vote_writes.fetch_add(1, Ordering::SeqCst);
    let delay = *backend.vote_delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    let injected = backend.fail_votes.lock().unwrap().clone();
    match injected {
        Some((status, message)) => Err(fail(status, &message)),
        None => Ok(()),
    }
}

async fn vote_bug(
    State(backend): State<Shared>,
    Path(bug_id): Path<DbId>,
    Json(body): Json<BugVoteBody>,
) -> Reply {
    before_vote(&backend).await?;
    let mut store = backend.store.lock().unwrap();
    if store.bug_mut(bug_id)?.author.id == body.user_id {
        return Err(fail(StatusCode::BAD_REQUEST, "Users cannot vote on their own bugs"));
    }
    store.bug_votes.insert((bug_id, body.user_id), body.vote_type);
    store.recount_bug(bug_id);
    ok(json!({ "message": "Vote recorded" }))
}

async fn vote_comment(State(backend): State<Shared>, Json(body): Json<CommentVoteBody>) -> Reply {
    before_vote(&backend).await?;
    let mut store = backend.store.lock().unwrap();
    let (bug_id, i) = store
        .comment_location(body.comment_id)
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "Comment not found"))?;
    if store.comments[&bug_id][i].author.id == body.user_id {
        return Err(fail(StatusCode::BAD_REQUEST, "Users cannot vote on their own comments"));
    }
    store
        .comment_votes
        .insert((body.comment_id, body.user_id), body.vote_type);
    store.recount_comment(body.comment_id);
    ok(json!({ "message": "Vote recorded" }))
}

// ---------------------------------------------------------------------------
// Handlers: moderation & tags
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct BanBody {
    reason: String,
}

fn set_banned(backend: &FakeBackend, id: &str, mod_id: &str, banned: bool) -> Reply {
    let mut store = backend.store.lock().unwrap();
    if !store.is_moderator(mod_id) {
        return Err(fail(StatusCode::FORBIDDEN, "Moderator rights required"));
    }
    let account = store
        .accounts
        .iter_mut()
        .find(|a| a.user.id == id)
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "User not found"))?;
    account.user.banned = banned;
    let message = if banned { "User banned" } else { "User unbanned" };
    ok(json!({ "message": message }))
}

async fn ban(
    State(backend): State<Shared>,
    Path((id, mod_id)): Path<(String, String)>,
    Json(body): Json<BanBody>,
) -> Reply {
    if body.reason.trim().is_empty() {
        return Err(fail(StatusCode::BAD_REQUEST, "A ban reason is required"));
    }
    set_banned(&backend, &id, &mod_id, true)
}

async fn unban(State(backend): State<Shared>, Path((id, mod_id)): Path<(String, String)>) -> Reply {
    set_banned(&backend, &id, &mod_id, false)
}

#[derive(Deserialize)]
struct TagBody {
    name: String,
}

async fn list_tags(State(backend): State<Shared>) -> Reply {
    let store = backend.store.lock().unwrap();
    ok(&store.tags)
}

async fn create_tag(State(backend): State<Shared>, Json(body): Json<TagBody>) -> Reply {
    let mut store = backend.store.lock().unwrap();
    if store.tags.iter().any(|t| t.name.eq_ignore_ascii_case(&body.name)) {
        return Err(fail(StatusCode::CONFLICT, "Tag already exists"));
    }
    let tag = Tag {
        id: store.next_id(),
        name: body.name,
    };
    store.tags.push(tag.clone());
    ok(tag)
}
