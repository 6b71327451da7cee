use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use freelance_api::{create_server, AppState, Config};
use freelance_core::storage::MemoryObjectStore;
use freelance_core::{Database, Market};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    let db = Database::open_in_memory().unwrap();
    db.run_migrations().unwrap();
    let market = Market::new(db, Arc::new(MemoryObjectStore::new()), "test-bucket");
    create_server(AppState::new(market, Config::default()))
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

async fn call(app: &Router, method: Method, uri: &str, login: Option<&str>, body: Option<Value>) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(login) = login {
        builder = builder.header("X-Auth-Login", login);
        if login == "admin" {
            builder = builder.header("X-Auth-Roles", "ROLE_USER,ROLE_ADMIN");
        }
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    read(app.clone().oneshot(request).await.unwrap()).await
}

async fn read(response: axum::response::Response) -> Reply {
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    Reply { status, headers, body }
}

fn multipart(part: &str, filename: &str, content_type: &str, bytes: &[u8]) -> (String, Vec<u8>) {
    let boundary = "freelance-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{part}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}

async fn create_profile(app: &Router, login: &str, first: &str, last: &str) -> i64 {
    let reply = call(
        app,
        Method::POST,
        "/api/profiles",
        Some(login),
        Some(json!({ "firstName": first, "lastName": last, "profileType": "FREELANCER" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
    reply.body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn health_and_metrics_endpoints_respond() {
    let app = app();
    let health = call(&app, Method::GET, "/health", None, None).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body["status"], "healthy");

    let response = app
        .clone()
        .oneshot(Request::get("/management/prometheus").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn entity_crud_follows_rest_conventions() {
    let app = app();

    let created = call(&app, Method::POST, "/api/tags", Some("ada"), Some(json!({ "name": "rust" }))).await;
    assert_eq!(created.status, StatusCode::CREATED);
    let id = created.body["id"].as_i64().unwrap();
    assert_eq!(created.headers[header::LOCATION], format!("/api/tags/{id}").as_str());
    assert_eq!(created.headers["x-freelanceapp-alert"], "freelanceApp.tag.created");
    assert_eq!(created.headers["x-freelanceapp-params"], id.to_string().as_str());
    assert_eq!(created.body["createdBy"], "ada");

    call(&app, Method::POST, "/api/tags", Some("ada"), Some(json!({ "name": "go" }))).await;

    let list = call(&app, Method::GET, "/api/tags?sort=name,asc&size=1", None, None).await;
    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(list.headers["x-total-count"], "2");
    assert!(list.headers[header::LINK].to_str().unwrap().contains("rel=\"next\""));
    assert_eq!(list.body[0]["name"], "go");

    let count = call(&app, Method::GET, "/api/tags/count?name.contains=us", None, None).await;
    assert_eq!(count.body, json!(1));

    let mismatch = call(
        &app,
        Method::PUT,
        &format!("/api/tags/{id}"),
        Some("ada"),
        Some(json!({ "id": id + 1, "name": "rust" })),
    )
    .await;
    assert_eq!(mismatch.status, StatusCode::BAD_REQUEST);
    assert_eq!(mismatch.body["errorKey"], "idinvalid");

    let patched = call(
        &app,
        Method::PATCH,
        &format!("/api/tags/{id}"),
        Some("bob"),
        Some(json!({ "id": id, "name": "rustlang" })),
    )
    .await;
    assert_eq!(patched.status, StatusCode::OK);
    assert_eq!(patched.body["name"], "rustlang");
    assert_eq!(patched.body["createdBy"], "ada");
    assert_eq!(patched.body["lastModifiedBy"], "bob");

    let deleted = call(&app, Method::DELETE, &format!("/api/tags/{id}"), Some("ada"), None).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert_eq!(deleted.headers["x-freelanceapp-alert"], "freelanceApp.tag.deleted");

    let missing = call(&app, Method::GET, &format!("/api/tags/{id}"), None, None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.headers[header::CONTENT_TYPE], "application/problem+json");
    assert_eq!(missing.body["message"], "error.idnotfound");
}

#[tokio::test]
async fn rejects_anonymous_writes_bad_filters_and_invalid_bodies() {
    let app = app();

    let anonymous = call(&app, Method::POST, "/api/tags", None, Some(json!({ "name": "x" }))).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let bad_filter = call(&app, Method::GET, "/api/tags?id.greaterThan=abc", None, None).await;
    assert_eq!(bad_filter.status, StatusCode::BAD_REQUEST);

    let bad_sort = call(&app, Method::GET, "/api/tags?sort=nope", None, None).await;
    assert_eq!(bad_sort.status, StatusCode::BAD_REQUEST);

    let too_long = call(
        &app,
        Method::POST,
        "/api/tags",
        Some("ada"),
        Some(json!({ "name": "x".repeat(65) })),
    )
    .await;
    assert_eq!(too_long.status, StatusCode::BAD_REQUEST);
    assert_eq!(too_long.body["fieldErrors"][0]["field"], "name");

    let request = Request::post("/api/tags")
        .header("X-Auth-Login", "ada")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let malformed = read(app.clone().oneshot(request).await.unwrap()).await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
    assert_eq!(malformed.body["errorKey"], "invalidJson");
}

#[tokio::test]
async fn profile_and_offer_workflow() {
    let app = app();
    create_profile(&app, "ada", "Ada", "Lovelace").await;
    create_profile(&app, "bob", "Bob", "Builder").await;

    let me = call(&app, Method::GET, "/api/profiles/me", Some("ada"), None).await;
    assert_eq!(me.body["userLogin"], "ada");
    assert_eq!(me.body["verified"], false);

    let duplicate = call(
        &app,
        Method::POST,
        "/api/profiles",
        Some("ada"),
        Some(json!({ "firstName": "Ada", "lastName": "Again" })),
    )
    .await;
    assert_eq!(duplicate.body["errorKey"], "profileexists");

    let offer = call(
        &app,
        Method::POST,
        "/api/offers",
        Some("ada"),
        Some(json!({ "name": "Logo design", "description": "Vector logos" })),
    )
    .await;
    assert_eq!(offer.status, StatusCode::CREATED);
    assert_eq!(offer.body["status"], "ACTIVE");
    let offer_id = offer.body["id"].as_i64().unwrap();

    let foreign = call(
        &app,
        Method::PATCH,
        &format!("/api/offers/{offer_id}"),
        Some("bob"),
        Some(json!({ "name": "Mine now" })),
    )
    .await;
    assert_eq!(foreign.status, StatusCode::FORBIDDEN);
    assert_eq!(foreign.headers["x-freelanceapp-error"], "error.notOfferOwner");

    let list = call(&app, Method::GET, "/api/offers", None, None).await;
    assert_eq!(list.body[0]["name"], "Logo design");
    assert_eq!(list.body[0]["owner"]["firstName"], "Ada");

    let review = call(
        &app,
        Method::POST,
        &format!("/api/offers/{offer_id}/reviews"),
        Some("bob"),
        Some(json!({ "rating": 4, "text": "Great" })),
    )
    .await;
    assert_eq!(review.status, StatusCode::CREATED);
    let reloaded = call(&app, Method::GET, &format!("/api/offers/{offer_id}"), None, None).await;
    assert_eq!(reloaded.body["rating"], 4.0);

    let favorite = call(
        &app,
        Method::POST,
        &format!("/api/favorite-offers/offer/{offer_id}"),
        Some("bob"),
        None,
    )
    .await;
    assert_eq!(favorite.status, StatusCode::CREATED);
    let mine = call(&app, Method::GET, "/api/favorite-offers/my", Some("bob"), None).await;
    assert_eq!(mine.body[0]["offerName"], "Logo design");
    assert_eq!(mine.body[0]["profileName"], "Builder Bob");
}

#[tokio::test]
async fn orders_are_priced_from_packages() {
    let app = app();
    create_profile(&app, "ada", "Ada", "Lovelace").await;
    create_profile(&app, "bob", "Bob", "Builder").await;
    let offer = call(
        &app,
        Method::POST,
        "/api/offers",
        Some("ada"),
        Some(json!({ "name": "Website", "description": "Static site" })),
    )
    .await;
    let package = call(
        &app,
        Method::POST,
        "/api/offer-packages",
        Some("ada"),
        Some(json!({
            "name": "Basic",
            "description": "One page",
            "price": 99.0,
            "currency": "USD",
            "deliveryDays": 5,
            "packageTier": "BASIC",
            "active": true,
            "offerId": offer.body["id"],
        })),
    )
    .await;
    assert_eq!(package.status, StatusCode::CREATED, "{}", package.body);
    let package_id = package.body["id"].as_i64().unwrap();

    let order = call(&app, Method::POST, &format!("/api/orders/{package_id}"), Some("bob"), None).await;
    assert_eq!(order.status, StatusCode::CREATED);
    assert_eq!(order.body["totalAmount"], 99.0);
    assert_eq!(order.body["status"], "PENDING");
    let order_id = order.body["id"].as_i64().unwrap();

    let by_buyer = call(
        &app,
        Method::PATCH,
        &format!("/api/orders/{order_id}/status/ACTIVE"),
        Some("bob"),
        None,
    )
    .await;
    assert_eq!(by_buyer.status, StatusCode::FORBIDDEN);

    let bad_status = call(
        &app,
        Method::PATCH,
        &format!("/api/orders/{order_id}/status/LOST"),
        Some("ada"),
        None,
    )
    .await;
    assert_eq!(bad_status.status, StatusCode::BAD_REQUEST);

    let by_seller = call(
        &app,
        Method::PATCH,
        &format!("/api/orders/{order_id}/status/ACTIVE"),
        Some("ada"),
        None,
    )
    .await;
    assert_eq!(by_seller.body["status"], "ACTIVE");
}

#[tokio::test]
async fn file_upload_and_content_round_trip() {
    let app = app();
    let (content_type, body) = multipart("file", "notes.txt", "text/plain", b"hello files");
    let request = Request::post("/api/file-objects/upload")
        .header("X-Auth-Login", "ada")
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap();
    let uploaded = read(app.clone().oneshot(request).await.unwrap()).await;
    assert_eq!(uploaded.status, StatusCode::CREATED);
    assert_eq!(uploaded.body["fileSize"], 11);
    let id = uploaded.body["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::get(format!("/api/file-objects/{id}/content"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"hello files");
}

#[tokio::test]
async fn verification_is_requested_and_completed_by_admin() {
    let app = app();
    let profile_id = create_profile(&app, "ada", "Ada", "Lovelace").await;

    let (content_type, body) = multipart("verification-photo", "me.jpg", "image/jpeg", b"jpeg-bytes");
    let request = Request::post("/api/profiles/request-verification")
        .header("X-Auth-Login", "ada")
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap();
    let requested = read(app.clone().oneshot(request).await.unwrap()).await;
    assert_eq!(requested.status, StatusCode::CREATED);
    assert_eq!(requested.body["status"], "PENDING");
    let id = requested.body["id"].as_i64().unwrap();

    let by_user = call(
        &app,
        Method::PATCH,
        &format!("/api/verification-requests/update-status/{id}/COMPLETED"),
        Some("ada"),
        None,
    )
    .await;
    assert_eq!(by_user.status, StatusCode::FORBIDDEN);

    let completed = call(
        &app,
        Method::PATCH,
        &format!("/api/verification-requests/update-status/{id}/COMPLETED"),
        Some("admin"),
        None,
    )
    .await;
    assert_eq!(completed.body["status"], "COMPLETED");

    let profile = call(&app, Method::GET, &format!("/api/profiles/{profile_id}"), None, None).await;
    assert_eq!(profile.body["verified"], true);

    let mine = call(&app, Method::GET, "/api/verification-requests/my", Some("ada"), None).await;
    assert_eq!(mine.headers["x-total-count"], "1");
}

#[tokio::test]
async fn messages_are_sent_and_listed() {
    let app = app();
    create_profile(&app, "ada", "Ada", "Lovelace").await;
    let bob = create_profile(&app, "bob", "Bob", "Builder").await;

    let sent = call(
        &app,
        Method::POST,
        "/api/messages/send",
        Some("ada"),
        Some(json!({ "receiverId": bob, "body": "Hi Bob", "clientMsgId": "m-1" })),
    )
    .await;
    assert_eq!(sent.status, StatusCode::CREATED);
    let conversation_id = sent.body["conversationId"].as_i64().unwrap();

    let blank = call(
        &app,
        Method::POST,
        "/api/messages/send",
        Some("ada"),
        Some(json!({ "receiverId": bob, "body": "   " })),
    )
    .await;
    assert_eq!(blank.status, StatusCode::NO_CONTENT);

    let conversations = call(&app, Method::GET, "/api/conversations/my", Some("bob"), None).await;
    assert_eq!(conversations.body[0]["otherParticipantName"], "Ada Lovelace");
    assert_eq!(conversations.body[0]["lastMessage"]["body"], "Hi Bob");

    let thread = call(
        &app,
        Method::GET,
        &format!("/api/conversations/{conversation_id}/messages"),
        Some("bob"),
        None,
    )
    .await;
    assert_eq!(thread.body.as_array().unwrap().len(), 1);

    let message_id = sent.body["id"].as_i64().unwrap();
    let edit = call(
        &app,
        Method::PATCH,
        &format!("/api/messages/{message_id}/edit"),
        Some("bob"),
        Some(json!({ "body": "hijack" })),
    )
    .await;
    assert_eq!(edit.status, StatusCode::FORBIDDEN);
}
