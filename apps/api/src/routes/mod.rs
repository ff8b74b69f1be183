pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::dialogue::handlers::{handle_dialogue, handle_end_dialogue};
use crate::search::handlers::handle_search;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/search", post(handle_search))
        .route(
            "/api/v1/dialogue/:chat_id",
            post(handle_dialogue).delete(handle_end_dialogue),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::dialogue::DialogueOptions;
    use crate::search::tests::{fake, PanickingSource};

    fn router(sources: Vec<std::sync::Arc<dyn crate::sources::ResumeSource>>) -> Router {
        build_router(AppState::new(
            Config::test_defaults(),
            sources,
            DialogueOptions::default(),
        ))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_lists_sources() {
        let app = router(vec![fake("work.ua", Ok(vec![]))]);
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["sources"], json!(["work.ua"]));
    }

    #[tokio::test]
    async fn test_search_ranks_and_reports_failures() {
        let app = router(vec![
            fake("work.ua", Ok(vec![20, 75, 50])),
            fake("robota.ua", Err(())),
        ]);
        let response = app
            .oneshot(post_json(
                "/api/v1/search",
                json!({"keywords": "rust developer", "region": "Kyiv", "top_n": 2}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["total_found"], 3);
        assert_eq!(body["resumes"].as_array().unwrap().len(), 2);
        assert_eq!(body["resumes"][0]["filling_percentage"], 75);
        assert_eq!(body["failures"][0]["source"], "robota.ua");
    }

    #[tokio::test]
    async fn test_search_blank_keywords_is_bad_request() {
        let app = router(vec![fake("work.ua", Ok(vec![10]))]);
        let response = app
            .oneshot(post_json("/api/v1/search", json!({"keywords": "   "})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_search_all_sources_failed_is_bad_gateway() {
        let app = router(vec![fake("work.ua", Err(())), fake("robota.ua", Err(()))]);
        let response = app
            .oneshot(post_json("/api/v1/search", json!({"keywords": "rust"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "ALL_SOURCES_FAILED");
    }

    #[tokio::test]
    async fn test_search_task_panic_is_internal_error() {
        let app = router(vec![
            fake("work.ua", Ok(vec![50])),
            std::sync::Arc::new(PanickingSource),
        ]);
        let response = app
            .oneshot(post_json("/api/v1/search", json!({"keywords": "rust"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
    }

    #[tokio::test]
    async fn test_dialogue_runs_search_on_command() {
        let app = router(vec![fake("work.ua", Ok(vec![40, 90]))]);

        for text in ["/start", "/keywords", "rust developer"] {
            let response = app
                .clone()
                .oneshot(post_json("/api/v1/dialogue/7", json!({"text": text})))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app
            .clone()
            .oneshot(post_json("/api/v1/dialogue/7", json!({"text": "/search"})))
            .await
            .unwrap();
        let body = json_body(response).await;
        let message = body["message"].as_str().unwrap();
        assert!(message.starts_with("Found 2 resumes\nYou can see top 2 below:\nResume: https://work.ua/1"));
        assert_eq!(body["state"], "idle");
    }

    #[tokio::test]
    async fn test_end_dialogue() {
        let app = router(Vec::new());

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/v1/dialogue/9")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        app.clone()
            .oneshot(post_json("/api/v1/dialogue/9", json!({"text": "/start"})))
            .await
            .unwrap();
        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/v1/dialogue/9")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}
