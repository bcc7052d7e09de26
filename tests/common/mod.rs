#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::task::JoinHandle;

use sitedesk::config::Config;
use sitedesk::identity::{Role, Session, SessionStore, User, UserStore};
use sitedesk::server::{router, AppState};
use sitedesk::storage::MemoryStore;

pub struct TestServer {
    pub base: String,
    pub state: AppState,
    handle: JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) { self.handle.abort(); }
}

impl TestServer {
    pub fn url(&self, path: &str) -> String { format!("{}{}", self.base, path) }
}

// Serve the router on an ephemeral localhost port.
pub async fn start(state: AppState) -> TestServer {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.expect("bind 127.0.0.1:0");
    let addr = listener.local_addr().unwrap();
    let app = router(state.clone());
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("test server error: {e:?}");
        }
    });
    TestServer { base: format!("http://{}", addr), state, handle }
}

pub async fn start_in_memory() -> (TestServer, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let server = start(AppState::in_memory(store.clone(), &Config::default())).await;
    (server, store)
}

// Redirects are asserted on, never followed.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("reqwest client")
}

pub fn cookie(token: &str) -> String { format!("session_token={}", token) }

pub async fn seed_user(store: &MemoryStore, email: &str, role: Role) -> User {
    let user = User::new(email, email, role, String::new());
    store.insert_user(&user).await.expect("insert user");
    user
}

pub async fn seed_session(store: &MemoryStore, token: &str, user_id: &str, expires_in: Duration) {
    let now = Utc::now();
    store.insert_session(&Session {
        token: token.to_string(),
        user_id: user_id.to_string(),
        expires_at: now + expires_in,
        created_at: now,
    }).await.expect("insert session");
}

pub fn set_cookie_headers(resp: &reqwest::Response) -> Vec<String> {
    resp.headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok().map(|s| s.to_string()))
        .collect()
}

pub fn clears_session_cookie(resp: &reqwest::Response) -> bool {
    set_cookie_headers(resp).iter().any(|c| c.starts_with("session_token=;") && c.contains("Max-Age=0"))
}
