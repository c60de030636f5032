use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use shinomontaj_server::{
    config::Config,
    db,
    handlers::{self, AppState},
};

/// Router over a fresh in-memory database, with one manager and one worker account
pub struct TestApp {
    router: Router,
    pub manager_token: String,
    pub worker_token: String,
    pub worker_id: i64,
}

impl TestApp {
    pub async fn new() -> Self {
        let config = Config {
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "test-secret".to_string(),
            jwt_expiration_hours: 1,
            max_pool_size: 1,
            request_timeout_secs: 30,
        };
        let pool = db::memory_pool().await.expect("in-memory database");
        let state = AppState::new(pool, &config);
        let router = handlers::router(state, Duration::from_secs(config.request_timeout_secs));

        let mut app = Self {
            router,
            manager_token: String::new(),
            worker_token: String::new(),
            worker_id: 0,
        };

        let (status, body) = app
            .call(
                Method::POST,
                "/api/auth/register",
                Some(json!({
                    "name": "Main Manager",
                    "email": "manager@shop.test",
                    "password": "secret-pass",
                    "role": "manager"
                })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        app.manager_token = body["token"].as_str().expect("token").to_string();

        let (status, body) = app
            .call(
                Method::POST,
                "/api/auth/register",
                Some(json!({
                    "name": "Shop Worker",
                    "email": "worker@shop.test",
                    "password": "secret-pass",
                    "role": "worker"
                })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        app.worker_token = body["token"].as_str().expect("token").to_string();
        app.worker_id = body["user"]["worker_id"].as_i64().expect("worker id");

        app
    }

    /// Send a request and decode the body as JSON (`Value::Null` when empty)
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }

        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&json).expect("serialize request body"))
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).expect("build request"))
            .await
            .expect("router error during test request");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read response body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, value)
    }

    pub async fn manager(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.call(method, uri, body, Some(&self.manager_token)).await
    }

    pub async fn worker(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.call(method, uri, body, Some(&self.worker_token)).await
    }

    /// Create a contract and return its id
    pub async fn contract(&self, number: &str, client_type: &str) -> i64 {
        let (status, body) = self
            .manager(
                Method::POST,
                "/api/manager/contracts",
                Some(json!({ "number": number, "client_type": client_type })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().expect("contract id")
    }

    /// Create a service and return its id
    pub async fn service(&self, name: &str, price: i64, contract_id: i64) -> i64 {
        let (status, body) = self
            .manager(
                Method::POST,
                "/api/manager/services",
                Some(json!({ "name": name, "price": price, "contract_id": contract_id })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().expect("service id")
    }

    /// Create a client and return its id
    pub async fn client(&self, name: &str, client_type: &str, contract_id: i64) -> i64 {
        let (status, body) = self
            .manager(
                Method::POST,
                "/api/manager/clients",
                Some(json!({
                    "name": name,
                    "client_type": client_type,
                    "contract_id": contract_id
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().expect("client id")
    }

    /// Create a worker record and return its id
    pub async fn worker_record(&self, body: Value) -> i64 {
        let (status, body) = self
            .manager(Method::POST, "/api/manager/workers", Some(body))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().expect("worker id")
    }
}
