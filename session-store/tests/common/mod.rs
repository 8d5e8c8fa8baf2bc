#![allow(dead_code)]

use serde_json::{json, Value};
use session_store::config::{AuthServiceSettings, SessionOptions};
use session_store::models::User;
use session_store::services::{
    AuthClient, DurableStorage, FileStorage, RecordingNavigator, TOKEN_KEY, USER_KEY,
};
use session_store::SessionStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const DEMO_EMAIL: &str = "demo@h1bconnect.com";
pub const DEMO_PASSWORD: &str = "validpass";
pub const DEMO_TOKEN: &str = "abc123";
pub const DEMO_USER_JSON: &str =
    r#"{"id":"1","email":"demo@h1bconnect.com","firstName":"John","lastName":"Doe","role":"user"}"#;

pub fn john() -> User {
    User {
        id: "1".to_string(),
        email: DEMO_EMAIL.to_string(),
        first_name: "John".to_string(),
        last_name: "Doe".to_string(),
        role: "user".to_string(),
    }
}

pub fn login_success_body() -> Value {
    json!({
        "token": DEMO_TOKEN,
        "user": {
            "id": "1",
            "email": DEMO_EMAIL,
            "firstName": "John",
            "lastName": "Doe",
            "role": "user"
        }
    })
}

/// A session store wired to a wiremock auth backend and a file in a
/// temporary directory.
pub struct TestSession {
    pub server: MockServer,
    pub store: SessionStore,
    pub storage: Arc<FileStorage>,
    pub navigator: Arc<RecordingNavigator>,
    pub options: SessionOptions,
    storage_path: PathBuf,
    _dir: TempDir,
}

impl TestSession {
    pub async fn spawn() -> Self {
        Self::spawn_with(SessionOptions::default()).await
    }

    pub async fn spawn_with(options: SessionOptions) -> Self {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let storage_path = dir.path().join("session.json");

        let storage = Arc::new(FileStorage::open(&storage_path));
        let navigator = Arc::new(RecordingNavigator::new());
        let store = build_store(&server.uri(), storage.clone(), navigator.clone(), &options);

        Self {
            server,
            store,
            storage,
            navigator,
            options,
            storage_path,
            _dir: dir,
        }
    }

    /// A brand new store over the same storage file, as after a restart.
    pub fn reopen(&self) -> SessionStore {
        self.reopen_with(self.options.clone())
    }

    pub fn reopen_with(&self, options: SessionOptions) -> SessionStore {
        build_store(
            &self.server.uri(),
            Arc::new(FileStorage::open(&self.storage_path)),
            Arc::new(RecordingNavigator::new()),
            &options,
        )
    }

    pub fn stored_token(&self) -> Option<String> {
        self.storage.get(TOKEN_KEY).expect("Failed to read token key")
    }

    pub fn stored_user(&self) -> Option<String> {
        self.storage.get(USER_KEY).expect("Failed to read user key")
    }

    pub fn seed(&self, token: Option<&str>, user: Option<&str>) {
        if let Some(token) = token {
            self.storage.set(TOKEN_KEY, token).unwrap();
        }
        if let Some(user) = user {
            self.storage.set(USER_KEY, user).unwrap();
        }
    }

    pub async fn mount_login(&self, email: &str, password: &str, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_json(json!({ "email": email, "password": password })))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    pub async fn mount_demo_login(&self) {
        self.mount_login(
            DEMO_EMAIL,
            DEMO_PASSWORD,
            ResponseTemplate::new(200).set_body_json(login_success_body()),
        )
        .await;
    }

    pub async fn mount_slow_login(&self, email: &str, password: &str, token: &str, delay: Duration) {
        let mut body = login_success_body();
        body["token"] = json!(token);
        body["user"]["email"] = json!(email);

        self.mount_login(
            email,
            password,
            ResponseTemplate::new(200)
                .set_body_json(body)
                .set_delay(delay),
        )
        .await;
    }
}

fn build_store(
    url: &str,
    storage: Arc<FileStorage>,
    navigator: Arc<RecordingNavigator>,
    options: &SessionOptions,
) -> SessionStore {
    let backend = AuthClient::new(AuthServiceSettings {
        url: url.to_string(),
        timeout_secs: 5,
    })
    .expect("Failed to build auth client");

    SessionStore::new(Arc::new(backend), storage, navigator, options.clone())
}

pub fn demo_options() -> SessionOptions {
    SessionOptions {
        demo_mode: true,
        ..SessionOptions::default()
    }
}
