use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use eventdesk_api::app::{build_app, services::AppServices};
use eventdesk_auth::{JwtClaims, Role};
use eventdesk_core::UserId;
use eventdesk_infra::AppConfig;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod over the in-memory store, bound to an ephemeral port.
        let config = AppConfig::new(JWT_SECRET).with_bcrypt_cost(4);
        let app = build_app(Arc::new(AppServices::in_memory(&config)));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
                .await
                .unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, path: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut req = self.client.post(self.url(path)).json(&body);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        read(req.send().await.unwrap()).await
    }

    async fn get(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut req = self.client.get(self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        read(req.send().await.unwrap()).await
    }

    async fn put(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        let res = self
            .client
            .put(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap();
        read(res).await
    }

    async fn delete(&self, path: &str, token: &str) -> (StatusCode, Value) {
        let res = self.client.delete(self.url(path)).bearer_auth(token).send().await.unwrap();
        read(res).await
    }

    /// Register and log in; returns (user id, token).
    async fn signup(&self, name: &str, role: &str) -> (String, String) {
        let email = format!("{}@example.com", name.to_lowercase());
        let (status, body) = self
            .post(
                "/api/auth/register",
                None,
                json!({ "name": name, "email": email, "password": "secret1", "role": role }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "register failed: {body}");
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = self
            .post("/api/auth/login", None, json!({ "email": email, "password": "secret1" }))
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        let token = body["data"]["token"].as_str().unwrap().to_string();

        (id, token)
    }

    async fn create_event(&self, token: &str) -> String {
        let (status, body) = self
            .post(
                "/api/event",
                Some(token),
                json!({
                    "title": "RustConf",
                    "description": "Talks and hallway track",
                    "date": "2025-09-02",
                    "time": "09:00"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create failed: {body}");
        body["data"]["id"].as_str().unwrap().to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn read(res: reqwest::Response) -> (StatusCode, Value) {
    let status = res.status();
    let body = res.json().await.unwrap_or(Value::Null);
    (status, body)
}

fn mint_jwt(sub: UserId, role: Role, issued_at: chrono::DateTime<Utc>, ttl: ChronoDuration) -> String {
    let claims = JwtClaims::new(sub, role, issued_at, ttl).unwrap();
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn ids(list: &Value) -> Vec<&str> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|u| u["id"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;

    let (status, body) = srv.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "message": "OK" }));
}

#[tokio::test]
async fn attendee_registers_for_organizers_event() {
    let srv = TestServer::spawn().await;

    let (alice_id, alice) = srv.signup("Alice", "organizer").await;
    let event_id = srv.create_event(&alice).await;
    let (bob_id, bob) = srv.signup("Bob", "attendee").await;

    let (status, body) = srv
        .post(&format!("/api/event/{event_id}/register"), Some(&bob), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Successfully registered for the event");

    let (status, body) = srv.get(&format!("/api/event/{event_id}"), Some(&bob)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Event details retrieved successfully");

    let event = &body["data"];
    assert_eq!(event["organizer"]["id"], alice_id);
    assert_eq!(event["organizer"]["email"], "alice@example.com");
    assert!(event["organizer"].get("password_hash").is_none());
    assert_eq!(ids(&event["participants"]), vec![bob_id.as_str()]);
    assert!(!ids(&event["participants"]).contains(&alice_id.as_str()));

    let (status, body) = srv.get("/api/event", Some(&alice)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Events retrieved successfully");
    assert_eq!(ids(&body["data"]), vec![event_id.as_str()]);
}

#[tokio::test]
async fn registration_and_login_failures() {
    let srv = TestServer::spawn().await;
    srv.signup("Carol", "attendee").await;

    let (status, body) = srv
        .post(
            "/api/auth/register",
            None,
            json!({ "name": "Carol", "email": "CAROL@example.com", "password": "secret1" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "success": false, "message": "User already exists" }));

    let (status, wrong_password) = srv
        .post("/api/auth/login", None, json!({ "email": "carol@example.com", "password": "secret2" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, unknown_email) = srv
        .post("/api/auth/login", None, json!({ "email": "nobody@example.com", "password": "secret1" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password, unknown_email);
    assert_eq!(wrong_password["message"], "Invalid email or password");
}

#[tokio::test]
async fn request_bodies_are_validated() {
    let srv = TestServer::spawn().await;

    let cases = [
        (json!({ "name": "", "email": "a@b.io", "password": "secret1" }), "Name cannot be empty."),
        (json!({ "name": "Ann", "email": "nope", "password": "secret1" }), "Please provide a valid email address."),
        (json!({ "name": "Ann", "email": "a@b.io", "password": "123" }), "Password must be at least 6 characters long."),
        (
            json!({ "name": "Ann", "email": "a@b.io", "password": "secret1", "role": "admin" }),
            "Role must be either 'attendee' or 'organizer'.",
        ),
    ];
    for (body, message) in cases {
        let (status, res) = srv.post("/api/auth/register", None, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(res["message"], message);
    }

    let res = srv
        .client
        .post(srv.url("/api/auth/login"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let (_, organizer) = srv.signup("Olga", "organizer").await;
    let (status, res) = srv
        .post(
            "/api/event",
            Some(&organizer),
            json!({ "title": "T", "description": "D", "date": "someday", "time": "10:00" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(res["message"], "date must be a valid date");
}

#[tokio::test]
async fn tokens_are_required_and_checked() {
    let srv = TestServer::spawn().await;
    let (alice_id, _) = srv.signup("Alice", "organizer").await;

    let (status, body) = srv.get("/api/event", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Access token is required");

    let (status, body) = srv.get("/api/event", Some("not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid or expired token");

    let alice: UserId = alice_id.parse().unwrap();
    let expired = mint_jwt(alice, Role::Organizer, Utc::now() - ChronoDuration::hours(2), ChronoDuration::hours(1));
    let (status, body) = srv.get("/api/event", Some(&expired)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid or expired token");

    let ghost = mint_jwt(UserId::new(), Role::Organizer, Utc::now(), ChronoDuration::hours(1));
    let (status, _) = srv.get("/api/event", Some(&ghost)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let fresh = mint_jwt(alice, Role::Organizer, Utc::now(), ChronoDuration::hours(1));
    let (status, _) = srv.get("/api/event", Some(&fresh)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn only_organizers_create_and_only_owners_modify() {
    let srv = TestServer::spawn().await;
    let (_, alice) = srv.signup("Alice", "organizer").await;
    let (_, mallory) = srv.signup("Mallory", "organizer").await;
    let (_, bob) = srv.signup("Bob", "attendee").await;

    let (status, body) = srv
        .post(
            "/api/event",
            Some(&bob),
            json!({ "title": "T", "description": "D", "date": "2025-01-01", "time": "10:00" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Access denied. Insufficient permissions");

    let event_id = srv.create_event(&alice).await;
    let path = format!("/api/event/{event_id}");

    let (status, _) = srv.put(&path, &bob, json!({ "title": "Mine now" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = srv.put(&path, &mallory, json!({ "title": "Mine now" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You are not authorized to update this event");

    let (status, body) = srv.delete(&path, &mallory).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You are not authorized to delete this event");

    let (_, body) = srv.get(&path, Some(&alice)).await;
    assert_eq!(body["data"]["title"], "RustConf");
}

#[tokio::test]
async fn owner_updates_and_deletes() {
    let srv = TestServer::spawn().await;
    let (alice_id, alice) = srv.signup("Alice", "organizer").await;
    let (mallory_id, _) = srv.signup("Mallory", "organizer").await;

    let event_id = srv.create_event(&alice).await;
    let path = format!("/api/event/{event_id}");

    let (status, body) = srv
        .put(&path, &alice, json!({ "time": "10:30", "organizer": mallory_id }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Event updated successfully");
    assert_eq!(body["data"]["time"], "10:30");
    assert_eq!(body["data"]["title"], "RustConf");
    assert_eq!(body["data"]["organizer"]["id"], alice_id);

    let (status, body) = srv.delete(&path, &alice).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Event deleted successfully");
    assert_eq!(body["data"]["id"], event_id);

    let (status, body) = srv.get(&path, Some(&alice)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Event not found");
}

#[tokio::test]
async fn registration_rules_are_enforced() {
    let srv = TestServer::spawn().await;
    let (_, alice) = srv.signup("Alice", "organizer").await;
    let (_, bob) = srv.signup("Bob", "attendee").await;
    let event_id = srv.create_event(&alice).await;
    let path = format!("/api/event/{event_id}/register");

    let (status, body) = srv.post(&path, Some(&alice), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Organizers cannot register as participants in their own events");

    let (status, _) = srv.post(&path, Some(&bob), json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = srv.post(&path, Some(&bob), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User already registered for this event");
}

#[tokio::test]
async fn unknown_and_malformed_event_ids() {
    let srv = TestServer::spawn().await;
    let (_, alice) = srv.signup("Alice", "organizer").await;

    let missing = UserId::new().to_string();
    let (status, body) = srv.get(&format!("/api/event/{missing}"), Some(&alice)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "success": false, "message": "Event not found" }));

    let (status, body) = srv
        .post(&format!("/api/event/{missing}/register"), Some(&alice), json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Event not found");

    let (status, body) = srv.get("/api/event/not-a-uuid", Some(&alice)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid event id");
}

#[tokio::test]
async fn unknown_routes_and_methods_get_json_errors() {
    let srv = TestServer::spawn().await;
    let (_, alice) = srv.signup("Alice", "organizer").await;
    let not_found = json!({ "success": false, "message": "Not found" });

    for path in ["/nope", "/api/auth/nope", "/api/event/a/b/c"] {
        let (status, body) = srv.get(path, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{path}");
        assert_eq!(body, not_found, "{path}");
    }

    let (status, body) = srv.get("/api/auth/login", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({ "success": false, "message": "Method not allowed" }));

    let event_id = srv.create_event(&alice).await;
    let res = srv
        .client
        .patch(srv.url(&format!("/api/event/{event_id}")))
        .bearer_auth(&alice)
        .json(&json!({ "title": "x" }))
        .send()
        .await
        .unwrap();
    let (status, body) = read(res).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["message"], "Method not allowed");
}

#[tokio::test]
async fn bearer_scheme_is_case_insensitive() {
    let srv = TestServer::spawn().await;
    let (_, alice) = srv.signup("Alice", "organizer").await;

    for scheme in ["bearer", "BEARER"] {
        let res = srv
            .client
            .get(srv.url("/api/event"))
            .header("authorization", format!("{scheme} {alice}"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK, "{scheme}");
    }
}

#[tokio::test]
async fn malformed_email_addresses_are_rejected() {
    let srv = TestServer::spawn().await;

    for email in ["a@b..com", "a@-b.com", "a@b_c.com", "a..b@x.com", ".a@x.com"] {
        let (status, body) = srv
            .post(
                "/api/auth/register",
                None,
                json!({ "name": "Ann", "email": email, "password": "secret1" }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{email}");
        assert_eq!(body["message"], "Please provide a valid email address.", "{email}");
    }
}
