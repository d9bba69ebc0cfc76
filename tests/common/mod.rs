#![allow(dead_code)]

use agri_server::{app::app, entities::farmer, migrator::Migrator};
use axum::http::{header, HeaderValue};
use axum_test::TestServer;
use chrono::NaiveDateTime;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, Set,
};
use sea_orm_migration::MigratorTrait;
use serde_json::{json, Value};
use tower_cookies::Key;

pub const PASSWORD: &str = "password123";

pub struct TestApp {
    pub server: TestServer,
    pub db: DatabaseConnection,
}

/// Fresh in-memory database, migrated, behind the full router.
pub async fn spawn() -> TestApp {
    // A single pooled connection keeps the in-memory database alive.
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();

    let router = app(
        db.clone(),
        Key::generate(),
        HeaderValue::from_static("http://localhost:3000"),
    )
    .unwrap();
    let server = TestServer::new(router).unwrap();
    TestApp { server, db }
}

impl TestApp {
    pub async fn register(&self, username: &str, extra: Value) -> Value {
        let mut body = json!({
            "username": username,
            "email": format!("{username}@test.com"),
            "password": PASSWORD,
        });
        if let (Some(body), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
            body.extend(extra.clone());
        }
        let response = self.server.post("/api/farmers/").json(&body).await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json::<Value>()
    }

    pub async fn token(&self, login: &str) -> String {
        let response = self
            .server
            .post("/api-token-auth/")
            .json(&json!({"username": login, "password": PASSWORD}))
            .await;
        response.assert_status_ok();
        response.json::<Value>()["token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    /// Registers `username` and returns an `Authorization` header value for it.
    pub async fn farmer(&self, username: &str) -> HeaderValue {
        self.register(username, json!({})).await;
        let token = self.token(username).await;
        HeaderValue::from_str(&format!("Token {token}")).unwrap()
    }

    pub async fn get(&self, auth: &HeaderValue, path: &str) -> axum_test::TestResponse {
        self.server
            .get(path)
            .add_header(header::AUTHORIZATION, auth.clone())
            .await
    }

    pub async fn post(&self, auth: &HeaderValue, path: &str, body: Value) -> axum_test::TestResponse {
        self.server
            .post(path)
            .add_header(header::AUTHORIZATION, auth.clone())
            .json(&body)
            .await
    }

    pub async fn patch(&self, auth: &HeaderValue, path: &str, body: Value) -> axum_test::TestResponse {
        self.server
            .patch(path)
            .add_header(header::AUTHORIZATION, auth.clone())
            .json(&body)
            .await
    }

    pub async fn put(&self, auth: &HeaderValue, path: &str, body: Value) -> axum_test::TestResponse {
        self.server
            .put(path)
            .add_header(header::AUTHORIZATION, auth.clone())
            .json(&body)
            .await
    }

    pub async fn create_field(&self, auth: &HeaderValue, name: &str) -> i64 {
        let response = self
            .post(
                auth,
                "/api/fields/",
                json!({"name": name, "location": "North", "size_in_hectares": 10.5, "soil_type": "Loam"}),
            )
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json::<Value>()["id"].as_i64().unwrap()
    }

    pub async fn set_date_joined(&self, username: &str, date_joined: NaiveDateTime) {
        let found = farmer::Entity::find()
            .filter(farmer::Column::Username.eq(username))
            .one(&self.db)
            .await
            .unwrap()
            .unwrap();
        let mut active = found.into_active_model();
        active.date_joined = Set(date_joined);
        active.update(&self.db).await.unwrap();
    }
}

impl TestApp {
    /// Signs in through the login form; later requests carry the session cookie.
    pub async fn login_page_session(&self, login: &str) {
        let response = self
            .server
            .post("/accounts/login/")
            .form(&[("username", login), ("password", PASSWORD)])
            .save_cookies()
            .await;
        response.assert_status(axum::http::StatusCode::SEE_OTHER);
    }
}
