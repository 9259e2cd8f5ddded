//! Router-level tests against the in-memory store

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use bson::{doc, DateTime};
use serde_json::{json, Value};
use tower::ServiceExt;

use toyland_server::store::{MemoryToyStore, ToyStore};
use toyland_server::{build_router, AppState, ToyLandApp};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("toyland_server=debug")
        .with_test_writer()
        .try_init();
}

fn app() -> (ToyLandApp, Arc<MemoryToyStore>) {
    init_tracing();
    let store = Arc::new(MemoryToyStore::new());
    (build_router(AppState::new(store.clone())), store)
}

async fn send(app: &ToyLandApp, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn get(app: &ToyLandApp, uri: &str) -> Value {
    let (status, body) = send(app, "GET", uri, None).await;
    assert_eq!(status, StatusCode::OK, "GET {uri}");
    body
}

async fn add_toy(app: &ToyLandApp, toy: Value) -> String {
    let (status, ack) = send(app, "POST", "/add-toy", Some(toy)).await;
    assert_eq!(status, StatusCode::OK);
    ack["insertedId"].as_str().unwrap().to_string()
}

fn names(toys: &Value) -> Vec<&str> {
    toys.as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn create_then_fetch_returns_fields_and_created_at() {
    let (app, _) = app();
    let started = chrono::Utc::now().timestamp_millis();

    let (status, ack) = send(
        &app,
        "POST",
        "/add-toy",
        Some(json!({ "name": "Teddy", "subcategory": "plush", "sellerEmail": "a@b.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["acknowledged"], true);
    let id = ack["insertedId"].as_str().unwrap();
    assert_eq!(id.len(), 24);

    let toy = get(&app, &format!("/toy/{id}")).await;
    assert_eq!(toy["_id"], id);
    assert_eq!(toy["name"], "Teddy");
    assert_eq!(toy["subcategory"], "plush");
    assert_eq!(toy["sellerEmail"], "a@b.com");

    let created_at = chrono::DateTime::parse_from_rfc3339(toy["createdAt"].as_str().unwrap())
        .unwrap()
        .timestamp_millis();
    assert!(created_at >= started);
}

#[tokio::test]
async fn create_keeps_arbitrary_fields() {
    let (app, _) = app();
    let id = add_toy(
        &app,
        json!({ "name": "Kite", "price": 12.5, "rating": 4, "tags": ["outdoor"], "seller": { "name": "Ann" } }),
    )
    .await;

    let toy = get(&app, &format!("/toy/{id}")).await;
    assert_eq!(toy["price"], 12.5);
    assert_eq!(toy["rating"], 4);
    assert_eq!(toy["tags"], json!(["outdoor"]));
    assert_eq!(toy["seller"]["name"], "Ann");
}

#[tokio::test]
async fn create_without_json_body_stores_only_created_at() {
    let (app, store) = app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/add-toy")
                .body(Body::from("name=Teddy"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let toys = store
        .find(toyland_server::store::ToyQuery::new(
            toyland_server::store::ToyFilter::All,
        ))
        .await
        .unwrap();
    assert_eq!(toys.len(), 1);
    assert_eq!(
        toys[0].keys().map(String::as_str).collect::<Vec<_>>(),
        ["_id", "createdAt"]
    );
}

#[tokio::test]
async fn unknown_id_is_null() {
    let (app, _) = app();
    let toy = get(&app, "/toy/65f0c2a1b3e4d5f6a7b8c9d0").await;
    assert!(toy.is_null());
}

#[tokio::test]
async fn malformed_id_is_bare_server_error() {
    let (app, _) = app();

    for (method, uri, body) in [
        ("GET", "/toy/not-an-id", None),
        ("PATCH", "/update-toy/not-an-id", Some(json!({ "name": "x" }))),
        ("DELETE", "/delete-toy/not-an-id", None),
    ] {
        let (status, body) = send(&app, method, uri, body).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{method} {uri}");
        assert!(body.is_null());
    }
}

#[tokio::test]
async fn recent_listing_is_capped_and_newest_first() {
    let (app, store) = app();

    // Shuffled creation times
    for i in 0..25_i64 {
        let millis = (i * 7 % 25) * 1_000;
        store
            .insert_one(doc! { "name": format!("toy-{i}"), "createdAt": DateTime::from_millis(millis) })
            .await
            .unwrap();
    }

    let toys = get(&app, "/all-toys").await;
    let toys = toys.as_array().unwrap();
    assert_eq!(toys.len(), 20);

    let stamps: Vec<&str> = toys.iter().map(|t| t["createdAt"].as_str().unwrap()).collect();
    assert!(stamps.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(stamps[0], "1970-01-01T00:00:24.000Z");
}

#[tokio::test]
async fn recent_listing_via_api_is_ordered() {
    let (app, _) = app();
    for i in 0..3 {
        add_toy(&app, json!({ "name": format!("toy-{i}") })).await;
    }

    let toys = get(&app, "/all-toys").await;
    let stamps: Vec<&str> = toys
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["createdAt"].as_str().unwrap())
        .collect();
    assert_eq!(stamps.len(), 3);
    assert!(stamps.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn subcategory_filter_is_exact() {
    let (app, _) = app();
    add_toy(&app, json!({ "name": "Racecar", "subcategory": "cars" })).await;
    add_toy(&app, json!({ "name": "Truck", "subcategory": "Cars" })).await;
    add_toy(&app, json!({ "name": "Doll", "subcategory": "dolls" })).await;

    let toys = get(&app, "/toys-by-subCategory/cars").await;
    assert_eq!(names(&toys), ["Racecar"]);

    let toys = get(&app, "/toys-by-subCategory/trains").await;
    assert_eq!(toys, json!([]));
}

#[tokio::test]
async fn pagination_pages_are_disjoint_windows() {
    let (app, _) = app();
    for i in 0..10 {
        add_toy(&app, json!({ "name": format!("car-{i}"), "subcategory": "cars" })).await;
    }
    add_toy(&app, json!({ "name": "Doll", "subcategory": "dolls" })).await;

    let all = get(&app, "/toys-by-subCategory/cars").await;
    let all = names(&all);

    let page1 = get(&app, "/pagination-by-subCategory/cars/1").await;
    let page2 = get(&app, "/pagination-by-subCategory/cars/2").await;
    let page3 = get(&app, "/pagination-by-subCategory/cars/3").await;
    let page4 = get(&app, "/pagination-by-subCategory/cars/4").await;

    assert_eq!(names(&page1), all[0..4]);
    assert_eq!(names(&page2), all[4..8]);
    assert_eq!(names(&page3), all[8..10]);
    assert_eq!(page4, json!([]));

    let joined: Vec<&str> = [&page1, &page2, &page3]
        .into_iter()
        .flat_map(|page| names(page))
        .collect();
    assert_eq!(joined, all);
}

#[tokio::test]
async fn unparseable_or_zero_page_is_first_page() {
    let (app, _) = app();
    for i in 0..6 {
        add_toy(&app, json!({ "name": format!("car-{i}"), "subcategory": "cars" })).await;
    }

    let first = get(&app, "/pagination-by-subCategory/cars/1").await;
    assert_eq!(get(&app, "/pagination-by-subCategory/cars/0").await, first);
    assert_eq!(get(&app, "/pagination-by-subCategory/cars/abc").await, first);
    assert_eq!(
        names(&get(&app, "/pagination-by-subCategory/cars/2nd").await),
        ["car-4", "car-5"]
    );
}

#[tokio::test]
async fn negative_page_skip_reaches_the_store() {
    let (app, _) = app();
    add_toy(&app, json!({ "name": "Racecar", "subcategory": "cars" })).await;

    let (status, body) = send(&app, "GET", "/pagination-by-subCategory/cars/-1", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.is_null());
}

#[tokio::test]
async fn name_search_is_case_insensitive_substring() {
    let (app, _) = app();
    add_toy(&app, json!({ "name": "Racecar" })).await;
    add_toy(&app, json!({ "name": "Doll" })).await;

    assert_eq!(names(&get(&app, "/toysByName/car").await), ["Racecar"]);
    assert_eq!(names(&get(&app, "/toysByName/CAR").await), ["Racecar"]);
    assert_eq!(get(&app, "/toysByName/train").await, json!([]));
}

#[tokio::test]
async fn name_search_is_capped_at_twenty() {
    let (app, store) = app();
    for i in 0..25 {
        store
            .insert_one(doc! { "name": format!("Robot {i}") })
            .await
            .unwrap();
    }

    let toys = get(&app, "/toysByName/robot").await;
    assert_eq!(toys.as_array().unwrap().len(), 20);
}

// Search text is not escaped: metacharacters act as regex syntax.
#[tokio::test]
async fn name_search_interprets_regex_metacharacters() {
    let (app, _) = app();
    add_toy(&app, json!({ "name": "Racecar" })).await;
    add_toy(&app, json!({ "name": "Doll" })).await;

    assert_eq!(names(&get(&app, "/toysByName/r.c").await), ["Racecar"]);
    assert_eq!(
        names(&get(&app, "/toysByName/%5Ed").await),
        ["Doll"]
    );

    let (status, _) = send(&app, "GET", "/toysByName/(", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn my_toys_by_seller_email() {
    let (app, _) = app();
    add_toy(&app, json!({ "name": "Teddy", "sellerEmail": "a@b.com" })).await;
    add_toy(&app, json!({ "name": "Kite", "sellerEmail": "c@d.com" })).await;
    add_toy(&app, json!({ "name": "Orphan" })).await;

    assert_eq!(names(&get(&app, "/my-toy?email=a@b.com").await), ["Teddy"]);
    assert_eq!(get(&app, "/my-toy?email=nobody@b.com").await, json!([]));

    // Missing email filters on a null seller
    assert_eq!(names(&get(&app, "/my-toy").await), ["Orphan"]);
}

#[tokio::test]
async fn update_changes_only_given_fields() {
    let (app, _) = app();
    let id = add_toy(
        &app,
        json!({ "name": "Racecar", "subcategory": "cars", "sellerEmail": "a@b.com", "price": 20 }),
    )
    .await;
    let before = get(&app, &format!("/toy/{id}")).await;

    let (status, ack) = send(
        &app,
        "PATCH",
        &format!("/update-toy/{id}"),
        Some(json!({ "subcategory": "trucks" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["matchedCount"], 1);
    assert_eq!(ack["modifiedCount"], 1);
    assert_eq!(ack["upsertedCount"], 0);
    assert!(ack["upsertedId"].is_null());

    let after = get(&app, &format!("/toy/{id}")).await;
    assert_eq!(after["subcategory"], "trucks");

    let mut expected = before.clone();
    expected["subcategory"] = json!("trucks");
    assert_eq!(
        serde_json::to_string(&after).unwrap(),
        serde_json::to_string(&expected).unwrap()
    );
}

#[tokio::test]
async fn update_with_dotted_path_sets_nested_field() {
    let (app, _) = app();
    let id = add_toy(
        &app,
        json!({ "name": "Kite", "seller": { "name": "Ann", "city": "Oslo" } }),
    )
    .await;

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/update-toy/{id}"),
        Some(json!({ "seller.name": "Bob" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let toy = get(&app, &format!("/toy/{id}")).await;
    assert_eq!(toy["seller"], json!({ "name": "Bob", "city": "Oslo" }));
    assert!(toy.get("seller.name").is_none());
}

#[tokio::test]
async fn whole_numbers_come_back_as_integers() {
    let (app, _) = app();
    let id = add_toy(&app, json!({ "name": "Kite", "price": 20.0, "n": 10, "weight": 0.5 })).await;

    let toy = get(&app, &format!("/toy/{id}")).await;
    assert_eq!(toy["price"].to_string(), "20");
    assert_eq!(toy["n"].to_string(), "10");
    assert_eq!(toy["weight"].to_string(), "0.5");
}

#[tokio::test]
async fn route_names_ignore_case_and_trailing_slash() {
    let (app, _) = app();
    add_toy(&app, json!({ "name": "Red Car" })).await;

    assert_eq!(get(&app, "/all-toys/").await.as_array().unwrap().len(), 1);
    assert_eq!(get(&app, "/toysbyname/CAR").await.as_array().unwrap().len(), 1);
    assert_eq!(get(&app, "/TOTALTOYS").await, json!({ "totalToys": 1 }));
}

#[tokio::test]
async fn update_may_overwrite_created_at() {
    let (app, _) = app();
    let id = add_toy(&app, json!({ "name": "Racecar" })).await;

    send(
        &app,
        "PATCH",
        &format!("/update-toy/{id}"),
        Some(json!({ "createdAt": "long ago" })),
    )
    .await;

    let toy = get(&app, &format!("/toy/{id}")).await;
    assert_eq!(toy["createdAt"], "long ago");
}

#[tokio::test]
async fn update_of_missing_toy_still_succeeds() {
    let (app, _) = app();

    let (status, ack) = send(
        &app,
        "PATCH",
        "/update-toy/65f0c2a1b3e4d5f6a7b8c9d0",
        Some(json!({ "name": "ghost" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["matchedCount"], 0);
    assert_eq!(ack["modifiedCount"], 0);
}

#[tokio::test]
async fn delete_then_fetch_and_delete_again() {
    let (app, _) = app();
    let id = add_toy(&app, json!({ "name": "Teddy" })).await;

    let (status, ack) = send(&app, "DELETE", &format!("/delete-toy/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack, json!({ "acknowledged": true, "deletedCount": 1 }));

    assert!(get(&app, &format!("/toy/{id}")).await.is_null());

    let (_, ack) = send(&app, "DELETE", &format!("/delete-toy/{id}"), None).await;
    assert_eq!(ack["deletedCount"], 0);
}

#[tokio::test]
async fn total_tracks_inserts_and_deletes() {
    let (app, _) = app();
    let before = get(&app, "/totalToys").await["totalToys"].as_u64().unwrap();

    let mut ids = Vec::new();
    for i in 0..5 {
        ids.push(add_toy(&app, json!({ "name": format!("toy-{i}") })).await);
    }
    for id in &ids[..2] {
        send(&app, "DELETE", &format!("/delete-toy/{id}"), None).await;
    }

    let total = get(&app, "/totalToys").await;
    assert_eq!(total, json!({ "totalToys": before + 3 }));
}

#[tokio::test]
async fn malformed_json_body_is_bad_request() {
    let (app, _) = app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/add-toy")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
