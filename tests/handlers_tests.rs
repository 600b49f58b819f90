/// View service tests
/// Drives the router with tower's `oneshot` against a wiremock places store
use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use neighborfit::config::Config;
use neighborfit::handlers::{self, AppState};
use neighborfit::places_client::PlacesClient;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{any, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_test_config(api_url: String) -> Config {
    Config {
        api_url,
        port: 3000,
        success_notice_secs: 3,
        handoff_ttl_secs: 60,
        request_timeout_secs: 5,
    }
}

fn app(server: &MockServer) -> Router {
    app_for(server.uri())
}

fn app_for(api_url: String) -> Router {
    let config = create_test_config(api_url);
    let places = PlacesClient::new(&config.api_url, Duration::from_secs(5)).unwrap();
    let state = Arc::new(AppState::new(config, places));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(handlers::api_routes())
        .with_state(state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let mock_server = MockServer::start().await;
    let (status, body) = send(&app(&mock_server), get_request("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "neighborfit");
}

#[tokio::test]
async fn test_search_then_open_detail_without_refetch() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/places/Greater%20Noida"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "Greater Noida",
            "societies": [{
                "name": "Alpha 1",
                "description": "Near the metro",
                "costOfLiving": 150000,
                "safetyRating": 4,
                "greenSpaces": 5,
                "nightlife": 2,
                "publicTransport": 3
            }]
        })))
        // Only the search itself reaches the store
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = app(&mock_server);
    let (status, body) = send(&app, get_request("/api/search?place=%20Greater%20Noida%20")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["place"], "Greater Noida");
    let row = &body["societies"][0];
    assert_eq!(row["name"], "Alpha 1");
    assert_eq!(row["costOfLiving"], "Rs. 1,50,000");
    assert_eq!(row["costOfLivingLabel"], "avg. Rs. 1,50,000");
    assert_eq!(row["highestRated"], "Green Spaces");
    assert!(body.get("message").is_none());

    let token = row["detailToken"].as_str().unwrap();
    let (status, detail) = send(&app, get_request(&format!("/api/societies/{}", token))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["name"], "Alpha 1");
    assert_eq!(detail["placeName"], "Greater Noida");
    assert_eq!(detail["costOfLiving"], "Rs. 1,50,000");
    assert_eq!(detail["ratings"][0]["label"], "Safety");
    assert_eq!(detail["ratings"][0]["value"], "4 / 5");
    assert_eq!(detail["description"], "Near the metro");
    assert_eq!(detail["position"], 1);
}

#[tokio::test]
async fn test_search_empty_place_lists_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/places/Empty"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"name": "Empty", "societies": []})),
        )
        .mount(&mock_server)
        .await;

    let (status, body) = send(&app(&mock_server), get_request("/api/search?place=Empty")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["societies"].as_array().unwrap().len(), 0);
    assert_eq!(body["message"], "No societies found for this place.");
}

#[tokio::test]
async fn test_search_status_mapping() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/places/Broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let app = app(&mock_server);

    let (status, body) = send(&app, get_request("/api/search?place=Nowhere")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No societies found for this place.");

    let (status, body) = send(&app, get_request("/api/search?place=Broken")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Error fetching data.");

    let (status, body) = send(&app, get_request("/api/search?place=%20%20")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please enter a place name.");
}

#[tokio::test]
async fn test_detail_without_handoff_is_terminal() {
    let mock_server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (status, body) = send(
        &app(&mock_server),
        get_request("/api/societies/00000000-0000-0000-0000-000000000000"),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No society data found.");
}

#[tokio::test]
async fn test_empty_draft() {
    let mock_server = MockServer::start().await;
    let (status, body) = send(&app(&mock_server), get_request("/api/submissions/draft")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["placeName"], "");
    assert_eq!(body["societies"].as_array().unwrap().len(), 1);
    assert_eq!(body["societies"][0]["costOfLiving"], "");
}

#[tokio::test]
async fn test_submission_success_resets_form() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/places/Sector62"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/places"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    let draft = serde_json::json!({
        "placeName": "Sector62",
        "societies": [{
            "name": "Alpha",
            "description": "",
            "costOfLiving": "12000",
            "safetyRating": "4",
            "greenSpaces": "4",
            "nightlife": "3",
            "publicTransport": "5"
        }]
    });

    let (status, body) = send(&app(&mock_server), post_json("/api/submissions", draft)).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["outcome"]["path"], "created");
    assert_eq!(body["notice"]["message"], "Place added successfully!");
    assert!(body["notice"]["expiresAt"].is_string());
    assert_eq!(body["form"]["placeName"], "");
    assert_eq!(body["form"]["societies"][0]["name"], "");
}

#[tokio::test]
async fn test_submission_validation_echoes_form() {
    let mock_server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let draft = serde_json::json!({
        "placeName": "Sector62",
        "societies": [{
            "name": "Alpha",
            "costOfLiving": "12000",
            "safetyRating": "6",
            "greenSpaces": "4",
            "nightlife": "3",
            "publicTransport": "5"
        }]
    });

    let (status, body) = send(&app(&mock_server), post_json("/api/submissions", draft)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["error"],
        "Please fill all fields correctly (ratings should be 1-5)"
    );
    assert_eq!(body["details"][0]["kind"], "ratingOutOfRange");
    assert_eq!(body["details"][0]["field"], "safety");
    assert_eq!(body["form"]["placeName"], "Sector62");
    assert_eq!(body["form"]["societies"][0]["safetyRating"], "6");
}

#[tokio::test]
async fn test_concurrent_submission_for_same_place_is_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/places/Slow"))
        .respond_with(ResponseTemplate::new(404).set_delay(Duration::from_millis(500)))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/places"))
        .respond_with(ResponseTemplate::new(201))
        // First and third submissions; the second never gets this far
        .expect(2)
        .mount(&mock_server)
        .await;

    let draft = serde_json::json!({
        "placeName": "Slow",
        "societies": [{
            "name": "Alpha",
            "costOfLiving": "100",
            "safetyRating": "1",
            "greenSpaces": "1",
            "nightlife": "1",
            "publicTransport": "1"
        }]
    });

    let app = app(&mock_server);
    let first = tokio::spawn({
        let app = app.clone();
        let draft = draft.clone();
        async move { send(&app, post_json("/api/submissions", draft)).await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    let (second_status, second_body) = send(&app, post_json("/api/submissions", draft.clone())).await;
    let (first_status, _) = first.await.unwrap();

    assert_eq!(first_status, StatusCode::CREATED);
    assert_eq!(second_status, StatusCode::CONFLICT);
    assert_eq!(
        second_body["error"],
        "A submission for this place is already in progress."
    );

    // Guard is released once the first one finishes
    let (third_status, _) = send(&app, post_json("/api/submissions", draft)).await;
    assert_ne!(third_status, StatusCode::CONFLICT);
}

fn slow_draft() -> serde_json::Value {
    serde_json::json!({
        "placeName": "Slow",
        "societies": [{
            "name": "Alpha",
            "costOfLiving": "100",
            "safetyRating": "1",
            "greenSpaces": "1",
            "nightlife": "1",
            "publicTransport": "1"
        }]
    })
}

async fn mount_slow_new_place(server: &MockServer, creates: u64) {
    Mock::given(method("GET"))
        .and(path("/api/places/Slow"))
        .respond_with(ResponseTemplate::new(404).set_delay(Duration::from_millis(500)))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/places"))
        .respond_with(ResponseTemplate::new(201))
        .expect(creates)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_abandoned_submission_still_releases_place() {
    let mock_server = MockServer::start().await;
    // The abandoned submission still completes, then the retry creates again
    mount_slow_new_place(&mock_server, 2).await;

    let app = app(&mock_server);
    let first = tokio::spawn({
        let app = app.clone();
        async move { send(&app, post_json("/api/submissions", slow_draft())).await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    first.abort();
    assert!(first.await.unwrap_err().is_cancelled());

    tokio::time::sleep(Duration::from_millis(1000)).await;
    let (status, body) = send(&app, post_json("/api/submissions", slow_draft())).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["outcome"]["path"], "created");
}

#[tokio::test]
async fn test_in_flight_view_tracks_running_submission() {
    let mock_server = MockServer::start().await;
    mount_slow_new_place(&mock_server, 1).await;

    let app = app(&mock_server);
    let (_, idle) = send(&app, get_request("/api/submissions/in-flight?place=Slow")).await;
    assert_eq!(idle["loading"], false);

    let first = tokio::spawn({
        let app = app.clone();
        async move { send(&app, post_json("/api/submissions", slow_draft())).await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let (status, running) = send(&app, get_request("/api/submissions/in-flight?place=Slow")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(running["place"], "Slow");
    assert_eq!(running["loading"], true);
    assert!(running["startedAt"].is_i64());

    // Exact name only
    let (_, other) = send(&app, get_request("/api/submissions/in-flight?place=Slow%20")).await;
    assert_eq!(other["loading"], false);

    let (first_status, _) = first.await.unwrap();
    assert_eq!(first_status, StatusCode::CREATED);

    let (_, done) = send(&app, get_request("/api/submissions/in-flight?place=Slow")).await;
    assert_eq!(done["loading"], false);
}

#[tokio::test]
async fn test_unreachable_store_maps_to_service_unavailable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let api_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    let app = app_for(api_url);

    let (status, body) = send(&app, get_request("/api/search?place=Noida")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Network error.");

    let (status, body) = send(&app, post_json("/api/submissions", slow_draft())).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        body["error"],
        "Error occurred. Please check your connection and try again."
    );
    assert_eq!(body["stage"]["step"], "existenceCheck");
    assert_eq!(body["form"]["placeName"], "Slow");
}
