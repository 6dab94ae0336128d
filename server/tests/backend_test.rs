//! Backend client tests against a mocked service.

use serde_json::{json, Value};
use std::time::Duration;
use storefront_engine::{Fields, RemoteTable, SortOrder};
use storefront_server::backend::{with_access_token, BackendClient, SupabaseAuth, SupabaseTable};
use storefront_server::config::BackendConfig;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ANON_KEY: &str = "anon-key";

fn client(server: &MockServer) -> BackendClient {
    let config = BackendConfig {
        url: server.uri(),
        anon_key: ANON_KEY.into(),
    };
    BackendClient::new(&config, Duration::from_secs(5)).unwrap()
}

fn fields(value: Value) -> Fields {
    value.as_object().cloned().unwrap()
}

// --- Tables ---

#[tokio::test]
async fn select_sends_order_limit_and_keys() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/vip_customers"))
        .and(query_param("select", "*"))
        .and(query_param("order", "created_at.asc"))
        .and(query_param("limit", "500"))
        .and(header("apikey", ANON_KEY))
        .and(header("authorization", "Bearer anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "Ann", "email": "ann@x.com"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let table = SupabaseTable::new(client(&server), "vip_customers");
    let rows = table
        .select(&SortOrder::ascending("created_at"), 500)
        .await
        .unwrap();
    assert_eq!(rows, vec![json!({"id": 1, "name": "Ann", "email": "ann@x.com"})]);
}

#[tokio::test]
async fn insert_returns_the_stored_row() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/orders"))
        .and(header("prefer", "return=representation"))
        .and(body_json(json!({"customer_id": 3, "total": 25.5})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            {"orders_id": 42, "customer_id": 3, "total": 25.5}
        ])))
        .mount(&server)
        .await;

    let table = SupabaseTable::new(client(&server), "orders");
    let row = table
        .insert(&fields(json!({"customer_id": 3, "total": 25.5})))
        .await
        .unwrap();
    assert_eq!(row["orders_id"], json!(42));
}

#[tokio::test]
async fn insert_without_returned_row_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/products"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .mount(&server)
        .await;

    let table = SupabaseTable::new(client(&server), "products");
    let err = table
        .insert(&fields(json!({"desc": "Mug", "price": 9.5})))
        .await
        .unwrap_err();
    assert_eq!(err.message, "unexpected response: no row returned");
}

#[tokio::test]
async fn service_message_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/orders"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23503",
            "message": "insert or update on table \"orders\" violates foreign key constraint"
        })))
        .mount(&server)
        .await;

    let table = SupabaseTable::new(client(&server), "orders");
    let err = table
        .insert(&fields(json!({"customer_id": 999, "total": 1})))
        .await
        .unwrap_err();
    assert_eq!(
        err.message,
        "409: insert or update on table \"orders\" violates foreign key constraint"
    );
}

#[tokio::test]
async fn update_and_delete_filter_by_id_column() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/orders"))
        .and(query_param("orders_id", "eq.7"))
        .and(body_json(json!({"total": 999})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"orders_id": 7, "customer_id": 1, "total": 999}
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/orders"))
        .and(query_param("orders_id", "eq.7"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let table = SupabaseTable::new(client(&server), "orders");
    let row = table
        .update("orders_id", 7, &fields(json!({"total": 999})))
        .await
        .unwrap();
    assert_eq!(row["total"], json!(999));
    table.delete("orders_id", 7).await.unwrap();
}

#[tokio::test]
async fn access_token_in_scope_replaces_anon_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/customers"))
        .and(header("apikey", ANON_KEY))
        .and(header("authorization", "Bearer user-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let table = SupabaseTable::new(client(&server), "customers");
    let rows = with_access_token(
        Some("user-token".into()),
        table.select(&SortOrder::descending("id"), 100),
    )
    .await
    .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn unreachable_service_is_an_error() {
    let config = BackendConfig {
        url: "http://127.0.0.1:1".into(),
        anon_key: ANON_KEY.into(),
    };
    let client = BackendClient::new(&config, Duration::from_secs(1)).unwrap();
    let table = SupabaseTable::new(client, "vendors");
    assert!(table
        .select(&SortOrder::descending("id"), 100)
        .await
        .is_err());
}

// --- Auth ---

#[tokio::test]
async fn user_for_valid_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("authorization", "Bearer good"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "5b7c", "email": "owner@shop.test", "aud": "authenticated"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("authorization", "Bearer expired"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "msg": "invalid JWT"
        })))
        .mount(&server)
        .await;

    let auth = SupabaseAuth::new(client(&server));

    let user = auth.user("good").await.unwrap().unwrap();
    assert_eq!(user.id, "5b7c");
    assert_eq!(user.email.as_deref(), Some("owner@shop.test"));

    assert_eq!(auth.user("expired").await.unwrap(), None);
}

#[tokio::test]
async fn sign_up_sends_profile_and_redirect() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .and(query_param("redirect_to", "https://shop.test/welcome"))
        .and(body_json(json!({
            "email": "jane.doe@shop.test",
            "password": "secret123",
            "data": {"username": "jane.doe", "full_name": "jane.doe"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "u-9", "email": "jane.doe@shop.test", "confirmation_sent_at": "2024-05-01T00:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let auth = SupabaseAuth::new(client(&server));
    let sign_up = auth
        .sign_up("jane.doe@shop.test", "secret123", Some("https://shop.test/welcome"))
        .await
        .unwrap();

    assert_eq!(sign_up.user.id, "u-9");
    assert!(!sign_up.confirmed);
}

#[tokio::test]
async fn sign_up_with_session_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "at",
            "user": {"id": "u-1", "email": "a@x.com", "email_confirmed_at": "2024-05-01T00:00:00Z"}
        })))
        .mount(&server)
        .await;

    let auth = SupabaseAuth::new(client(&server));
    let sign_up = auth.sign_up("a@x.com", "secret123", None).await.unwrap();
    assert!(sign_up.confirmed);
    assert_eq!(sign_up.user.email.as_deref(), Some("a@x.com"));
}
