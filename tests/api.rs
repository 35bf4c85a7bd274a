use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use doctor_rank::{
    api::create_router,
    app_state::AppState,
    config::Config,
    infrastructure::{ReviewStore, SqliteReviewStore},
};

async fn test_app() -> Router {
    let store: Arc<dyn ReviewStore> = Arc::new(SqliteReviewStore::new_in_memory().await.unwrap());
    create_router(AppState::with_store(Config::default(), store))
}

async fn send(app: &Router, method: &str, uri: &str, user: Option<i64>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user.to_string());
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

/// Creates one profession, one hospital and three doctors owned by users 100..=102
async fn seed_directory(app: &Router) -> Vec<i64> {
    let (status, profession) = send(app, "POST", "/professions", Some(1), Some(json!({"name": "Cardiology"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, hospital) = send(app, "POST", "/hospitals", Some(1), Some(json!({"name": "City Hospital", "img": "city.png"}))).await;

    let mut doctors = Vec::new();
    for (user, first, last) in [(100, "Amina", "Bello"), (101, "Chidi", "Eze"), (102, "Grace", "Hart")] {
        let (status, body) = send(
            app,
            "PUT",
            "/doctors",
            Some(user),
            Some(json!({
                "title": "Dr.",
                "first_name": first,
                "last_name": last,
                "profession_id": profession["data"]["id"],
                "hospital_id": hospital["data"]["id"],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        assert_eq!(body["data"]["created"], true);
        doctors.push(body["data"]["id"].as_i64().unwrap());
    }
    doctors
}

async fn review(app: &Router, author: i64, doctor_id: i64, rating: f64) -> i64 {
    let (status, body) = send(
        app,
        "PUT",
        "/comments",
        Some(author),
        Some(json!({"doctor_id": doctor_id, "rating": rating, "text": "visited"})),
    )
    .await;
    assert!(status.is_success(), "{}", body);
    body["data"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = test_app().await;
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "success");
    assert_eq!(body["data"], "healthy");
}

#[tokio::test]
async fn test_ranking_blends_with_global_average() {
    let app = test_app().await;
    let doctors = seed_directory(&app).await;
    let (a, b, c) = (doctors[0], doctors[1], doctors[2]);

    review(&app, 200, a, 5.0).await;
    review(&app, 201, a, 5.0).await;
    review(&app, 200, b, 3.0).await;

    // global 13/3: a = 23/5, c (unreviewed) = 13/3, b = 16/4
    let (status, body) = send(&app, "GET", "/doctors", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let ranked = body["data"].as_array().unwrap();
    let order: Vec<i64> = ranked.iter().map(|d| d["id"].as_i64().unwrap()).collect();
    assert_eq!(order, vec![a, c, b]);
    assert!((ranked[0]["rank"].as_f64().unwrap() - 4.6).abs() < 1e-9);
    assert_eq!(ranked[1]["rating"]["count"], 0);

    let (_, body) = send(&app, "GET", "/doctors?term=EZE&limit=5", None, None).await;
    let names: Vec<&str> = body["data"].as_array().unwrap().iter().map(|d| d["full_name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Chidi Eze"]);

    let (_, body) = send(&app, "GET", "/doctors?skip=1&limit=1", None, None).await;
    assert_eq!(body["data"][0]["id"].as_i64(), Some(c));
}

#[tokio::test]
async fn test_doctor_detail_reports_rating() {
    let app = test_app().await;
    let doctors = seed_directory(&app).await;
    review(&app, 200, doctors[0], 4.0).await;
    review(&app, 201, doctors[0], 3.0).await;

    let (status, body) = send(&app, "GET", &format!("/doctors/{}", doctors[0]), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["rate"], 3.5);
    assert_eq!(body["data"]["reviews"], 2);
    assert_eq!(body["data"]["hospital"]["name"], "City Hospital");

    let (_, body) = send(&app, "GET", &format!("/doctors/{}", doctors[1]), None, None).await;
    assert_eq!(body["data"]["rate"], -1.0);
    assert_eq!(body["data"]["reviews"], 0);

    let (status, body) = send(&app, "GET", "/doctors/12345", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "error");
}

#[tokio::test]
async fn test_own_profile_requires_identity() {
    let app = test_app().await;
    let doctors = seed_directory(&app).await;

    let (status, body) = send(&app, "GET", "/doctors/self", Some(101), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"].as_i64(), Some(doctors[1]));

    let (status, _) = send(&app, "GET", "/doctors/self", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_review_resubmission_and_listing() {
    let app = test_app().await;
    let doctors = seed_directory(&app).await;

    let first = review(&app, 300, doctors[0], 2.0).await;
    let (status, body) = send(
        &app,
        "PUT",
        "/comments",
        Some(300),
        Some(json!({"doctor_id": doctors[0], "rating": 4.0, "text": "second visit"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["created"], false);
    assert_eq!(body["data"]["id"].as_i64(), Some(first));

    let (_, body) = send(&app, "GET", &format!("/comments?doctor_id={}", doctors[0]), None, None).await;
    let comments = body["data"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["text"], "second visit");

    let (status, _) = send(
        &app,
        "PUT",
        "/comments",
        Some(300),
        Some(json!({"doctor_id": doctors[0], "rating": 6, "text": "too good"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "PUT",
        "/comments",
        None,
        Some(json!({"doctor_id": doctors[0], "rating": 4, "text": "anon"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_vote_transitions_over_http() {
    let app = test_app().await;
    let doctors = seed_directory(&app).await;
    let comment = review(&app, 300, doctors[0], 4.0).await;
    let vote_uri = format!("/comments/{}/vote", comment);

    let (status, body) = send(&app, "PUT", &vote_uri, Some(7), Some(json!({"intent": "positive"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["transition"]["kind"], "inserted");
    assert_eq!(body["data"]["vote_count"], 1);

    let (_, body) = send(&app, "PUT", &vote_uri, Some(7), Some(json!({"intent": "positive"}))).await;
    assert_eq!(body["data"]["transition"]["kind"], "unchanged");

    let (_, body) = send(&app, "PUT", &vote_uri, Some(7), Some(json!({"intent": "negative"}))).await;
    assert_eq!(body["data"]["transition"]["kind"], "flipped");

    send(&app, "PUT", &vote_uri, Some(8), Some(json!({"intent": "positive"}))).await;

    let (_, body) = send(&app, "GET", &format!("/comments/{}/votes", comment), None, None).await;
    assert_eq!(body["data"]["likes"], 1);
    assert_eq!(body["data"]["dislikes"], 1);

    let (_, body) = send(&app, "GET", &vote_uri, Some(7), None).await;
    assert_eq!(body["data"], json!({"voter_id": 7, "is_positive": false}));

    let (_, body) = send(&app, "PUT", &vote_uri, Some(7), Some(json!({"intent": "clear"}))).await;
    assert_eq!(body["data"]["transition"]["kind"], "removed");
    assert_eq!(body["data"]["vote_count"], 1);

    let (status, _) = send(&app, "PUT", &vote_uri, None, Some(json!({"intent": "positive"}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "PUT", "/comments/1/vote", Some(7), Some(json!({"intent": "positive"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reference_data() {
    let app = test_app().await;
    for name in ["Cardiology", "Dermatology", "Surgery"] {
        let (status, _) = send(&app, "POST", "/professions", Some(1), Some(json!({"name": name}))).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, "POST", "/professions", Some(1), Some(json!({"name": "Surgery"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], 409);

    let (_, body) = send(&app, "GET", "/professions?term=ology", None, None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = send(&app, "GET", "/hospitals", None, None).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_requests_use_error_envelope() {
    let app = test_app().await;
    let doctors = seed_directory(&app).await;
    let comment = review(&app, 300, doctors[0], 4.0).await;

    let cases = vec![
        ("GET", "/doctors?skip=abc".to_string(), None),
        ("GET", "/doctors/abc".to_string(), None),
        ("GET", "/comments".to_string(), None),
        (
            "PUT",
            "/comments".to_string(),
            Some(json!({"doctor_id": doctors[0], "rating": "five", "text": "great"})),
        ),
        (
            "PUT",
            format!("/comments/{}/vote", comment),
            Some(json!({"intent": "maybe"})),
        ),
        ("PUT", "/doctors".to_string(), Some(json!({"title": "Dr."}))),
    ];

    for (method, uri, body) in cases {
        let (status, response) = send(&app, method, &uri, Some(300), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{} {}", method, uri);
        assert_eq!(response["status"], 400, "{} {}", method, uri);
        assert_eq!(response["message"], "error", "{} {}", method, uri);
        assert!(response["data"].is_string(), "{} {}", method, uri);
    }

    // the rejected vote left nothing behind
    let (_, body) = send(&app, "GET", &format!("/comments/{}/votes", comment), None, None).await;
    assert_eq!(body["data"]["votes"], json!([]));
}
