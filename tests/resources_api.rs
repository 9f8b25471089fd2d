use northwind_api::{build_router, AppState, MemoryStore};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

/// Spin up the HTTP server on an OS-assigned port over a fresh memory store, returning the base URL.
async fn spawn_test_server() -> String {
    let app = build_router(AppState::new(MemoryStore::new()), 1024 * 1024);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{}", port)
}

async fn create(client: &Client, base: &str, path: &str, body: Value) -> Value {
    let resp = client
        .post(format!("{}/{}", base, path))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED, "creating under {}", path);
    let body: Value = resp.json().await.unwrap();
    body["data"].clone()
}

async fn get(client: &Client, url: String) -> (StatusCode, Value) {
    let resp = client.get(url).send().await.unwrap();
    let status = resp.status();
    (status, resp.json().await.unwrap())
}

async fn put(client: &Client, url: String, body: &Value) -> (StatusCode, Option<Value>) {
    let resp = client.put(url).json(body).send().await.unwrap();
    let status = resp.status();
    let text = resp.text().await.unwrap();
    (status, serde_json::from_str(&text).ok())
}

fn error_code(body: &Option<Value>) -> Option<&str> {
    body.as_ref()?["error"]["code"].as_str()
}

#[tokio::test]
async fn supplier_lifecycle() {
    let base = spawn_test_server().await;
    let client = Client::new();

    let resp = client
        .post(format!("{}/Suppliers", base))
        .json(&json!({ "CompanyName": "Exotic Liquids", "ContactName": "Charlotte Cooper", "City": "London" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(resp.headers()["location"], "/Suppliers/1");
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["SupplierId"], 1);
    assert_eq!(body["data"]["RowVersion"], 1);

    let (status, body) = get(&client, format!("{}/Suppliers/1", base)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["CompanyName"], "Exotic Liquids");
    assert_eq!(body["data"]["ContactName"], "Charlotte Cooper");

    let resp = client.delete(format!("{}/Suppliers/1", base)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let (status, body) = get(&client, format!("{}/Suppliers/1", base)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn every_family_round_trips() {
    let base = spawn_test_server().await;
    let client = Client::new();

    let families = [
        ("Categories", "CategoryId", json!({ "CategoryName": "Beverages", "Description": "Soft drinks, coffees, teas" })),
        ("Customers", "CustomerId", json!({ "CustomerId": "ALFKI", "CompanyName": "Alfreds Futterkiste", "Country": "Germany" })),
        ("Shippers", "ShipperId", json!({ "CompanyName": "Speedy Express", "Phone": "(503) 555-9831" })),
        ("Suppliers", "SupplierId", json!({ "CompanyName": "Tokyo Traders", "City": "Tokyo" })),
        ("Orders", "OrderId", json!({ "CustomerId": "ALFKI", "ShipVia": 1, "OrderDate": "1996-07-04T00:00:00", "Freight": 32.38 })),
        ("OrderDetails", "OrderDetailId", json!({ "OrderId": 1, "ProductId": 11, "UnitPrice": 14.0, "Quantity": 12, "Discount": 0.0 })),
    ];

    for (path, key_field, body) in families {
        let created = create(&client, &base, path, body.clone()).await;
        let key = match &created[key_field] {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };

        let (status, fetched) = get(&client, format!("{}/{}/{}", base, path, key)).await;
        assert_eq!(status, StatusCode::OK, "{}", path);
        assert_eq!(fetched["data"], created, "{}", path);
        for (field, value) in body.as_object().unwrap() {
            assert_eq!(&fetched["data"][field], value, "{}.{}", path, field);
        }

        let (status, listed) = get(&client, format!("{}/{}", base, path)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed["meta"]["count"], 1, "{}", path);
    }
}

#[tokio::test]
async fn delete_of_absent_key_is_not_found_every_time() {
    let base = spawn_test_server().await;
    let client = Client::new();
    for _ in 0..2 {
        let resp = client.delete(format!("{}/Shippers/99", base)).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn key_mismatch_is_rejected_and_changes_nothing() {
    let base = spawn_test_server().await;
    let client = Client::new();
    let first = create(&client, &base, "Shippers", json!({ "CompanyName": "Speedy Express" })).await;
    let second = create(&client, &base, "Shippers", json!({ "CompanyName": "United Package" })).await;

    let mut moved = second.clone();
    moved["CompanyName"] = json!("Federal Shipping");
    let (status, body) = put(&client, format!("{}/Shippers/1", base), &moved).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), Some("bad_request"));

    let (_, one) = get(&client, format!("{}/Shippers/1", base)).await;
    let (_, two) = get(&client, format!("{}/Shippers/2", base)).await;
    assert_eq!(one["data"], first);
    assert_eq!(two["data"], second);
}

#[tokio::test]
async fn replace_bumps_the_row_version() {
    let base = spawn_test_server().await;
    let client = Client::new();
    let mut shipper = create(&client, &base, "Shippers", json!({ "CompanyName": "Speedy Express" })).await;

    shipper["Phone"] = json!("(503) 555-9831");
    let (status, _) = put(&client, format!("{}/Shippers/1", base), &shipper).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = get(&client, format!("{}/Shippers/1", base)).await;
    assert_eq!(body["data"]["Phone"], "(503) 555-9831");
    assert_eq!(body["data"]["RowVersion"], 2);
}

#[tokio::test]
async fn lost_update_is_detected() {
    let base = spawn_test_server().await;
    let client = Client::new();
    let read = create(&client, &base, "Customers", json!({ "CustomerId": "BONAP", "CompanyName": "Bon app'" })).await;

    let mut winner = read.clone();
    winner["City"] = json!("Marseille");
    let (status, _) = put(&client, format!("{}/Customers/BONAP", base), &winner).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let mut loser = read.clone();
    loser["City"] = json!("Paris");
    let (status, body) = put(&client, format!("{}/Customers/BONAP", base), &loser).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_code(&body), Some("concurrency_conflict"));

    let (_, current) = get(&client, format!("{}/Customers/BONAP", base)).await;
    assert_eq!(current["data"]["City"], "Marseille");
}

#[tokio::test]
async fn replace_after_concurrent_delete_is_not_found() {
    let base = spawn_test_server().await;
    let client = Client::new();
    let read = create(&client, &base, "Categories", json!({ "CategoryName": "Condiments" })).await;

    let resp = client.delete(format!("{}/Categories/1", base)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let (status, body) = put(&client, format!("{}/Categories/1", base), &read).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), Some("not_found"));
}

#[tokio::test]
async fn duplicate_business_key_keeps_the_first_record() {
    let base = spawn_test_server().await;
    let client = Client::new();
    create(&client, &base, "Customers", json!({ "CustomerId": "ANATR", "CompanyName": "Ana Trujillo" })).await;

    let resp = client
        .post(format!("{}/Customers", base))
        .json(&json!({ "CustomerId": "ANATR", "CompanyName": "Someone Else" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["message"], "error creating the customer: duplicate key");

    let (_, current) = get(&client, format!("{}/Customers/ANATR", base)).await;
    assert_eq!(current["data"]["CompanyName"], "Ana Trujillo");
}

#[tokio::test]
async fn deleting_a_referenced_shipper_is_rejected() {
    let base = spawn_test_server().await;
    let client = Client::new();
    create(&client, &base, "Shippers", json!({ "CompanyName": "Federal Shipping" })).await;
    create(&client, &base, "Orders", json!({ "ShipVia": 1, "Freight": 11.61 })).await;

    let resp = client.delete(format!("{}/Shippers/1", base)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");

    let (status, _) = get(&client, format!("{}/Shippers/1", base)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn malformed_requests_are_client_errors() {
    let base = spawn_test_server().await;
    let client = Client::new();

    let (status, body) = get(&client, format!("{}/Suppliers/abc", base)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");

    let resp = client
        .post(format!("{}/Customers", base))
        .json(&json!({ "CustomerId": "TOOLONG", "CompanyName": "Too Long Ltd" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "validation_error");

    let resp = client
        .post(format!("{}/Categories", base))
        .json(&json!({ "Description": "no name" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let (_, listed) = get(&client, format!("{}/Customers", base)).await;
    assert_eq!(listed["meta"]["count"], 0);
}

#[tokio::test]
async fn health_and_version_endpoints() {
    let base = spawn_test_server().await;
    let client = Client::new();

    let (status, body) = get(&client, format!("{}/health", base)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = get(&client, format!("{}/ready", base)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["store"], "ok");

    let (status, body) = get(&client, format!("{}/version", base)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "northwind-api");
}

#[tokio::test]
async fn replace_with_dangling_reference_is_a_server_error() {
    let base = spawn_test_server().await;
    let client = Client::new();
    create(&client, &base, "Shippers", json!({ "CompanyName": "Speedy Express" })).await;
    let mut order = create(&client, &base, "Orders", json!({ "ShipVia": 1 })).await;

    order["ShipVia"] = json!(999);
    let (status, body) = put(&client, format!("{}/Orders/1", base), &order).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_code(&body), Some("internal_error"));

    let (_, current) = get(&client, format!("{}/Orders/1", base)).await;
    assert_eq!(current["data"]["ShipVia"], 1);
    assert_eq!(current["data"]["RowVersion"], 1);
}

#[tokio::test]
async fn replace_without_row_version_never_overwrites() {
    let base = spawn_test_server().await;
    let client = Client::new();
    create(&client, &base, "Shippers", json!({ "CompanyName": "Original" })).await;

    let (status, _) = put(
        &client,
        format!("{}/Shippers/1", base),
        &json!({ "ShipperId": 1, "CompanyName": "Writer2", "RowVersion": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = put(
        &client,
        format!("{}/Shippers/1", base),
        &json!({ "ShipperId": 1, "CompanyName": "NoVersion" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), Some("bad_request"));

    let (_, current) = get(&client, format!("{}/Shippers/1", base)).await;
    assert_eq!(current["data"]["CompanyName"], "Writer2");
    assert_eq!(current["data"]["RowVersion"], 2);
}

#[tokio::test]
async fn created_key_with_control_character_gets_an_encoded_location() {
    let base = spawn_test_server().await;
    let client = Client::new();

    let resp = client
        .post(format!("{}/Customers", base))
        .json(&json!({ "CustomerId": "A\u{1}", "CompanyName": "Odd Key Ltd" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(resp.headers()["location"], "/Customers/A%01");

    let (status, body) = get(&client, format!("{}/Customers/A%01", base)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["CompanyName"], "Odd Key Ltd");
}

#[tokio::test]
async fn unreadable_bodies_use_the_error_envelope() {
    let base = spawn_test_server().await;
    let client = Client::new();

    let resp = client
        .post(format!("{}/Shippers", base))
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");

    let resp = client
        .put(format!("{}/Shippers/1", base))
        .body(r#"{"ShipperId":1,"CompanyName":"x","RowVersion":1}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");

    let (_, listed) = get(&client, format!("{}/Shippers", base)).await;
    assert_eq!(listed["meta"]["count"], 0);
}
