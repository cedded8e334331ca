use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use prediction_api::config::ApiConfig;
use prediction_auth::{JwtClaims, PrincipalId};
use reqwest::StatusCode;
use serde_json::{Value, json};

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod (in-memory store), bound to an ephemeral port.
        let app = prediction_api::app::build_app(&ApiConfig::new(JWT_SECRET))
            .await
            .expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn encode(secret: &str, claims: &JwtClaims) -> String {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn mint_jwt(secret: &str) -> String {
    let now = Utc::now();
    encode(
        secret,
        &JwtClaims {
            sub: PrincipalId::new(),
            username: Some("tester".to_string()),
            issued_at: now,
            expires_at: now + ChronoDuration::minutes(10),
        },
    )
}

fn mint_expired_jwt(secret: &str) -> String {
    let now = Utc::now();
    encode(
        secret,
        &JwtClaims {
            sub: PrincipalId::new(),
            username: None,
            issued_at: now - ChronoDuration::minutes(20),
            expires_at: now - ChronoDuration::minutes(10),
        },
    )
}

async fn create(client: &reqwest::Client, url: String, token: &str, body: Value) -> Value {
    let res = client
        .post(url)
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .unwrap();
    if res.status() != StatusCode::CREATED {
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        panic!("create failed: status={status} body={body}");
    }
    res.json().await.unwrap()
}

#[tokio::test]
async fn model_endpoints_answer_true_without_auth() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for path in ["/train_model/", "/predict/"] {
        let res = client.get(srv.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK, "{path}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body, json!(true), "{path}");
    }
}

#[tokio::test]
async fn model_endpoints_ignore_body_and_query() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for path in ["/train_model/", "/predict/"] {
        let res = client
            .get(format!("{}?x=1&model=latest", srv.url(path)))
            .bearer_auth("not-a-token")
            .json(&json!({ "features": [1, 2, 3] }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK, "{path}");
        assert_eq!(res.text().await.unwrap(), "true");
    }
}

#[tokio::test]
async fn api_root_lists_collections_and_health_is_up() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "users": "/users/", "groups": "/groups/" }));

    let res = client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.text().await.unwrap().is_empty());
}

#[tokio::test]
async fn auth_required_for_account_endpoints() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for path in ["/users/", "/groups/"] {
        let res = client.get(srv.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{path}");
        assert_eq!(res.headers()["www-authenticate"], "Bearer");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], "unauthorized");

        let res = client
            .post(srv.url(path))
            .json(&json!({ "name": "x", "username": "x" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{path}");
    }
}

#[tokio::test]
async fn expired_or_foreign_tokens_are_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for token in [mint_expired_jwt(JWT_SECRET), mint_jwt("some-other-secret")] {
        let res = client
            .get(srv.url("/users/"))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    let res = client
        .get(srv.url("/users/"))
        .header("authorization", format!("Basic {}", mint_jwt(JWT_SECRET)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn group_create_then_retrieve_round_trips_name() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(JWT_SECRET);
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/groups/"))
        .bearer_auth(&token)
        .json(&json!({ "name": "analysts" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let location = res.headers()["location"].to_str().unwrap().to_string();
    let created: Value = res.json().await.unwrap();
    assert_eq!(created["url"], location);

    let res = client
        .get(srv.url(&location))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let fetched: Value = res.json().await.unwrap();
    assert_eq!(fetched, json!({ "url": location, "name": "analysts" }));
}

#[tokio::test]
async fn users_are_listed_newest_first() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(JWT_SECRET);
    let client = reqwest::Client::new();

    for name in ["first", "second", "third"] {
        create(&client, srv.url("/users/"), &token, json!({ "username": name })).await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let res = client
        .get(srv.url("/users/"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let users: Vec<Value> = res.json().await.unwrap();
    let names: Vec<_> = users.iter().map(|u| u["username"].as_str().unwrap()).collect();
    assert_eq!(names, ["third", "second", "first"]);
}

#[tokio::test]
async fn duplicate_username_is_a_field_error() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(JWT_SECRET);
    let client = reqwest::Client::new();

    create(&client, srv.url("/users/"), &token, json!({ "username": "alice" })).await;

    let res = client
        .post(srv.url("/users/"))
        .bearer_auth(&token)
        .json(&json!({ "username": "alice", "email": "alice@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
    assert_eq!(
        body["fields"]["username"],
        json!(["A user with that username already exists."])
    );
}

#[tokio::test]
async fn user_validation_reports_each_field() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(JWT_SECRET);
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/users/"))
        .bearer_auth(&token)
        .json(&json!({ "email": "not-an-email", "groups": ["/nowhere/"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert!(body["fields"]["groups"].is_array());

    let res = client
        .post(srv.url("/users/"))
        .bearer_auth(&token)
        .json(&json!({ "email": "not-an-email" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert!(body["fields"]["username"].is_array());
    assert!(body["fields"]["email"].is_array());
}

#[tokio::test]
async fn deleting_a_group_drops_it_from_members() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(JWT_SECRET);
    let client = reqwest::Client::new();

    let staff = create(&client, srv.url("/groups/"), &token, json!({ "name": "staff" })).await;
    let ops = create(&client, srv.url("/groups/"), &token, json!({ "name": "ops" })).await;
    let user = create(
        &client,
        srv.url("/users/"),
        &token,
        json!({ "username": "bob", "groups": [staff["url"], ops["url"]] }),
    )
    .await;
    assert_eq!(user["groups"], json!([staff["url"], ops["url"]]));

    let res = client
        .delete(srv.url(staff["url"].as_str().unwrap()))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(srv.url(user["url"].as_str().unwrap()))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let user: Value = res.json().await.unwrap();
    assert_eq!(user["groups"], json!([ops["url"]]));
}

#[tokio::test]
async fn user_update_and_delete_lifecycle() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(JWT_SECRET);
    let client = reqwest::Client::new();

    let user = create(
        &client,
        srv.url("/users/"),
        &token,
        json!({ "username": "carol", "email": "carol@example.com" }),
    )
    .await;
    let url = srv.url(user["url"].as_str().unwrap());

    // PUT without username is rejected.
    let res = client
        .put(&url)
        .bearer_auth(&token)
        .json(&json!({ "email": "c@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .patch(&url)
        .bearer_auth(&token)
        .json(&json!({ "email": "c@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let patched: Value = res.json().await.unwrap();
    assert_eq!(patched["username"], "carol");
    assert_eq!(patched["email"], "c@example.com");

    let res = client
        .put(&url)
        .bearer_auth(&token)
        .json(&json!({ "username": "caroline" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let replaced: Value = res.json().await.unwrap();
    assert_eq!(replaced["username"], "caroline");

    let res = client.delete(&url).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert!(res.text().await.unwrap().is_empty());

    let res = client.get(&url).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_requests_are_client_errors() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(JWT_SECRET);
    let client = reqwest::Client::new();

    let res = client
        .get(srv.url("/groups/not-an-id/"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .post(srv.url("/groups/"))
        .bearer_auth(&token)
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_body");
}

#[tokio::test]
async fn auth_required_for_every_method_on_detail_endpoints() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(JWT_SECRET);
    let client = reqwest::Client::new();

    let group = create(&client, srv.url("/groups/"), &token, json!({ "name": "guarded" })).await;
    let user = create(&client, srv.url("/users/"), &token, json!({ "username": "guarded" })).await;

    let paths = [
        user["url"].as_str().unwrap().to_string(),
        group["url"].as_str().unwrap().to_string(),
        "/users/bad/".to_string(),
        "/groups/bad/".to_string(),
    ];
    let methods = [
        reqwest::Method::GET,
        reqwest::Method::PUT,
        reqwest::Method::PATCH,
        reqwest::Method::DELETE,
    ];

    for path in &paths {
        for method in &methods {
            let res = client
                .request(method.clone(), srv.url(path))
                .json(&json!({ "name": "x", "username": "x" }))
                .send()
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{method} {path}");
        }
    }

    // Nothing above went through.
    let res = client
        .get(srv.url(group["url"].as_str().unwrap()))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let fetched: Value = res.json().await.unwrap();
    assert_eq!(fetched["name"], "guarded");
}

#[tokio::test]
async fn unrouted_paths_are_not_found_with_or_without_token() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(JWT_SECRET);
    let client = reqwest::Client::new();

    for path in ["/nope", "/predict", "/train_model", "/users/x/y/"] {
        let res = client.get(srv.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "anonymous {path}");
        assert!(res.headers().get("www-authenticate").is_none(), "{path}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], "not_found");

        let res = client.get(srv.url(path)).bearer_auth(&token).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "authenticated {path}");
    }
}

#[tokio::test]
async fn group_update_list_and_delete_lifecycle() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(JWT_SECRET);
    let client = reqwest::Client::new();

    let ops = create(&client, srv.url("/groups/"), &token, json!({ "name": "ops" })).await;
    let dev = create(&client, srv.url("/groups/"), &token, json!({ "name": "dev" })).await;
    let url = srv.url(dev["url"].as_str().unwrap());

    let res = client.get(srv.url("/groups/")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let groups: Vec<Value> = res.json().await.unwrap();
    assert_eq!(groups, vec![ops.clone(), dev.clone()]);

    // PUT needs a name; PATCH with nothing changes nothing.
    let res = client.put(&url).bearer_auth(&token).json(&json!({})).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["fields"]["name"], json!(["This field is required."]));

    let res = client.patch(&url).bearer_auth(&token).json(&json!({})).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let unchanged: Value = res.json().await.unwrap();
    assert_eq!(unchanged["name"], "dev");

    let res = client
        .patch(&url)
        .bearer_auth(&token)
        .json(&json!({ "name": "ops" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["fields"]["name"], json!(["group with this name already exists."]));

    let res = client
        .put(&url)
        .bearer_auth(&token)
        .json(&json!({ "name": "platform" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let renamed: Value = res.json().await.unwrap();
    assert_eq!(renamed, json!({ "url": dev["url"], "name": "platform" }));

    let res = client.delete(&url).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client.get(&url).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client.get(srv.url("/groups/")).bearer_auth(&token).send().await.unwrap();
    let groups: Vec<Value> = res.json().await.unwrap();
    assert_eq!(groups, vec![ops]);
}
