use super::*;

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use shared::error::ErrorCode;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct ServerState {
    evaluate_bodies: Arc<Mutex<Vec<EvaluateRequest>>>,
    history_limits: Arc<Mutex<Vec<usize>>>,
    fetched_ids: Arc<Mutex<Vec<String>>>,
}

#[derive(Debug, Deserialize)]
struct LimitQuery {
    limit: usize,
}

fn evaluation_body(id: &str, tabs: Value) -> Value {
    json!({
        "evaluation_id": id,
        "total_questions": 6,
        "incorrect_count": tabs.as_array().map(Vec::len).unwrap_or(0),
        "tabs": tabs,
    })
}

fn two_tabs() -> Value {
    json!([
        {
            "tab_id": "tab_3",
            "question": "Solve $2x + 1 = 7$",
            "error_summary": "Arithmetic slip",
            "error_explanation": "Subtracted 1 from one side only",
            "correct_solution": "$x = 3$",
            "final_answer": "$3$",
            "title": "Question 3"
        },
        {
            "tab_id": "tab_5",
            "question": "Factor x^2 - 9",
            "error_summary": "Wrong sign",
            "error_explanation": "Used (x-3)^2",
            "correct_solution": "(x-3)(x+3)",
            "final_answer": "(x-3)(x+3)"
        }
    ])
}

async fn handle_evaluate(
    State(state): State<ServerState>,
    Json(body): Json<EvaluateRequest>,
) -> Json<Value> {
    state.evaluate_bodies.lock().await.push(body);
    Json(evaluation_body("ev-new", two_tabs()))
}

async fn handle_history(
    State(state): State<ServerState>,
    Query(query): Query<LimitQuery>,
) -> Json<Value> {
    state.history_limits.lock().await.push(query.limit);
    Json(json!({
        "evaluations": [
            {"evaluation_id": "ev-b", "created_at": "2025-03-02T08:00:00Z", "total_questions": 4, "incorrect_count": 2},
            {"evaluation_id": "ev-a", "created_at": "2025-03-01T08:00:00Z", "total_questions": 3, "incorrect_count": 0}
        ]
    }))
}

async fn handle_fetch(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    state.fetched_ids.lock().await.push(id.clone());
    if id == "missing" {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(evaluation_body(&id, json!([]))).into_response()
}

async fn spawn_server(app: Router) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

async fn spawn_evaluation_server() -> (String, ServerState) {
    let state = ServerState::default();
    let app = Router::new()
        .route("/api/evaluate", post(handle_evaluate))
        .route("/api/evaluations", get(handle_history))
        .route("/api/evaluations/:id", get(handle_fetch))
        .with_state(state.clone());
    (spawn_server(app).await, state)
}

#[tokio::test]
async fn submit_posts_both_images_and_maps_tabs() {
    let (base_url, state) = spawn_evaluation_server().await;
    let client = HttpEvaluationClient::new(format!("{base_url}/"));

    let result = client.submit("cXVlc3Rpb24=", "YW5zd2Vy").await.expect("submit");

    let bodies = state.evaluate_bodies.lock().await;
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0].question_image, "cXVlc3Rpb24=");
    assert_eq!(bodies[0].answer_image, "YW5zd2Vy");

    assert_eq!(result.evaluation_id.as_str(), "ev-new");
    assert_eq!(result.summary.total_questions, 6);
    assert_eq!(result.summary.incorrect_questions, 2);
    let first = &result.incorrect_questions[0];
    assert_eq!(first.question_id.as_str(), "tab_3");
    assert_eq!(first.question_number.as_deref(), Some("Question 3"));
    assert_eq!(first.final_answer, "$3$");
    assert_eq!(result.incorrect_questions[1].question_number, None);
}

#[tokio::test]
async fn submit_with_missing_image_never_hits_network() {
    let (base_url, state) = spawn_evaluation_server().await;
    let client = HttpEvaluationClient::new(base_url);

    let err = client.submit("", "YW5zd2Vy").await.expect_err("must fail");

    assert!(matches!(err, EvaluationError::Validation(_)));
    assert!(state.evaluate_bodies.lock().await.is_empty());
}

#[tokio::test]
async fn history_passes_limit_and_keeps_server_order() {
    let (base_url, state) = spawn_evaluation_server().await;
    let client = HttpEvaluationClient::new(base_url);

    let items = client.list_history(5).await.expect("history");

    let ids: Vec<&str> = items.iter().map(|i| i.evaluation_id.as_str()).collect();
    assert_eq!(ids, ["ev-b", "ev-a"]);
    assert_eq!(items[0].incorrect_count, 2);
    assert_eq!(*state.history_limits.lock().await, vec![5]);
}

#[tokio::test]
async fn fetch_by_id_maps_response_and_escapes_id() {
    let (base_url, state) = spawn_evaluation_server().await;
    let client = HttpEvaluationClient::new(base_url);

    let result = client
        .fetch_by_id(&EvaluationId::from("ev 42"))
        .await
        .expect("fetch");

    assert_eq!(result.evaluation_id.as_str(), "ev 42");
    assert!(result.is_all_correct());
    assert_eq!(*state.fetched_ids.lock().await, vec!["ev 42".to_string()]);
}

#[tokio::test]
async fn not_found_is_a_remote_error_with_status_message() {
    let (base_url, _state) = spawn_evaluation_server().await;
    let client = HttpEvaluationClient::new(base_url);

    let err = client
        .fetch_by_id(&EvaluationId::from("missing"))
        .await
        .expect_err("must fail");

    assert!(err.is_not_found());
    assert_eq!(err.user_message(), "API error: 404");
}

#[tokio::test]
async fn server_error_message_is_carried_through() {
    let app = Router::new().route(
        "/api/evaluate",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "model overloaded"})),
            )
        }),
    );
    let client = HttpEvaluationClient::new(spawn_server(app).await);

    let err = client.submit("cQ==", "YQ==").await.expect_err("must fail");

    match err {
        EvaluationError::Remote {
            status,
            code,
            message,
        } => {
            assert_eq!(status, 500);
            assert_eq!(code, ErrorCode::Internal);
            assert_eq!(message, "model overloaded");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn non_json_error_body_falls_back_to_status() {
    let app = Router::new().route(
        "/api/evaluations",
        get(|| async { (StatusCode::BAD_GATEWAY, "upstream timeout") }),
    );
    let client = HttpEvaluationClient::new(spawn_server(app).await);

    let err = client.list_history(10).await.expect_err("must fail");

    assert_eq!(err.user_message(), "API error: 502");
}

#[tokio::test]
async fn malformed_success_body_is_a_transport_error() {
    let app = Router::new().route(
        "/api/evaluations/:id",
        get(|| async { Json(json!({"unexpected": true})) }),
    );
    let client = HttpEvaluationClient::new(spawn_server(app).await);

    let err = client
        .fetch_by_id(&EvaluationId::from("ev-1"))
        .await
        .expect_err("must fail");

    assert!(matches!(err, EvaluationError::Transport(_)));
    assert!(err.user_message().starts_with("Network error:"));
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let client = HttpEvaluationClient::new(format!("http://{addr}"));

    let err = client.list_history(DEFAULT_HISTORY_LIMIT).await.expect_err("must fail");

    assert!(matches!(err, EvaluationError::Transport(_)));
}

#[tokio::test]
async fn invalid_base_url_fails_without_request() {
    let client = HttpEvaluationClient::new("not a url");

    let err = client.list_history(1).await.expect_err("must fail");

    assert!(matches!(err, EvaluationError::Transport(ref m) if m.contains("invalid base url")));
}
