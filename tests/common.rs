use rehearsal_backend::{
    api::router::create_router,
    state::AppState,
    config::Config,
    infra::factory::sqlite_state,
};
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions}, Pool, Sqlite};
use std::sync::Arc;
use uuid::Uuid;
use axum::{
    body::Body,
    http::{Request, header},
    response::Response,
    Router,
};
use std::str::FromStr;
use tower::ServiceExt;
use serde_json::{json, Value};

pub const PASSWORD: &str = "Str0ng!Pass";

/// A registered user with the credentials the API expects.
#[derive(Clone)]
pub struct TestUser {
    pub id: String,
    pub email: String,
    pub access_token: String,
    pub csrf_token: String,
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
}

#[allow(dead_code)]
pub async fn parse_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}

fn access_token_from(response: &Response) -> String {
    let cookies: Vec<String> = response.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|h| h.to_str().unwrap().to_string())
        .collect();

    let access_token_cookie = cookies.iter()
        .find(|c| c.starts_with("access_token="))
        .expect("No access_token cookie returned");

    let start = "access_token=".len();
    let end = access_token_cookie.find(';').unwrap_or(access_token_cookie.len());
    access_token_cookie[start..end].to_string()
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let priv_key_pem = include_str!("../tests/keys/test_private.pem");
        let pub_key_pem = include_str!("../tests/keys/test_public.pem");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            jwt_secret_key: priv_key_pem.to_string(),
            jwt_public_key: pub_key_pem.to_string(),
            auth_issuer: "test-issuer".to_string(),
            client_url: "http://localhost:5173".to_string(),
            reminder_lead_hours: 24,
            reminder_poll_secs: 60,
        };

        let state = Arc::new(sqlite_state(pool.clone(), &config).expect("Failed to build test state"));
        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
        }
    }

    /// Sends a request, attaching cookie and CSRF header when `user` is given.
    pub async fn request(&self, method: &str, uri: &str, user: Option<&TestUser>, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(user) = user {
            builder = builder
                .header(header::COOKIE, format!("access_token={}", user.access_token))
                .header("X-CSRF-Token", &user.csrf_token);
        }

        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
    }

    pub async fn register(&self, name: &str) -> TestUser {
        self.register_in_timezone(name, "UTC").await
    }

    pub async fn register_in_timezone(&self, name: &str, timezone: &str) -> TestUser {
        let email = format!("{}-{}@example.com", name, Uuid::new_v4());
        let payload = json!({
            "email": email,
            "password": PASSWORD,
            "first_name": name,
            "last_name": "Tester",
            "timezone": timezone
        });

        let response = self.request("POST", "/api/v1/auth/register", None, Some(payload)).await;
        if !response.status().is_success() {
            panic!("Register failed in test helper: status {}", response.status());
        }

        let access_token = access_token_from(&response);
        let body_json = parse_body(response).await;

        TestUser {
            id: body_json["user"]["id"].as_str().expect("No user id in body").to_string(),
            email: email.to_lowercase(),
            access_token,
            csrf_token: body_json["csrf_token"].as_str().expect("No csrf_token in body").to_string(),
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Response {
        self.request("POST", "/api/v1/auth/login", None, Some(json!({ "email": email, "password": password }))).await
    }

    /// Creates a band owned by `owner` and adds `members` to it.
    pub async fn create_band(&self, owner: &TestUser, members: &[&TestUser]) -> String {
        let response = self.request("POST", "/api/v1/bands", Some(owner), Some(json!({ "name": "The Testers" }))).await;
        assert_eq!(response.status().as_u16(), 201, "band creation failed");
        let band_id = parse_body(response).await["id"].as_str().unwrap().to_string();

        for member in members {
            let response = self.request(
                "POST",
                &format!("/api/v1/bands/{}/members", band_id),
                Some(owner),
                Some(json!({ "email": member.email, "instrument": "bass" })),
            ).await;
            assert_eq!(response.status().as_u16(), 201, "adding member failed");
        }

        band_id
    }

    pub async fn add_recurring(&self, user: &TestUser, day: i32, start: &str, end: &str) {
        let response = self.request(
            "POST",
            "/api/v1/availability/recurring",
            Some(user),
            Some(json!({ "day_of_week": day, "start_time": start, "end_time": end })),
        ).await;
        assert_eq!(response.status().as_u16(), 201, "recurring rule rejected");
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}
