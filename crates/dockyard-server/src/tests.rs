use crate::{create_app, AppState, ServerConfig};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use dockyard_common::DockyardError;
use dockyard_engine::test_utils::{MockEngine, Operation};
use dockyard_engine::ContainerService;
use std::sync::Arc;
use tower::ServiceExt;

const FORM: &str = "application/x-www-form-urlencoded";

fn create_test_app(engine: Arc<MockEngine>) -> Router {
    let service = ContainerService::new(engine, "ombansod");
    create_app(AppState::new(service), &ServerConfig::default())
}

fn form_request(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, FORM)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[cfg(test)]
mod gateway_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_container() {
        let engine = Arc::new(MockEngine::new());
        let app = create_test_app(engine.clone());

        let response = app
            .oneshot(form_request("POST", "/containers", "ram=268435456&cpu=2&hostPort=8081"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        let json = json_body(response).await;
        assert!(!json["container_id"].as_str().unwrap().is_empty());
        assert_eq!(json["ip_address"], "172.17.0.11");
        assert_eq!(engine.call_count(Operation::Start).await, 1);
    }

    #[tokio::test]
    async fn test_create_duplicate_port() {
        let engine = Arc::new(MockEngine::new());
        engine.add_container("stopped", &["/stopped"], &[8081], false).await;
        let app = create_test_app(engine.clone());

        let response = app
            .oneshot(form_request("POST", "/containers", "ram=1024&cpu=1&hostPort=8081"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json, serde_json::json!({"message": "Port is already allocated"}));
        // Found through the stopped container's bindings, not the list output
        assert_eq!(engine.call_count(Operation::Inspect).await, 1);
        assert_eq!(engine.call_count(Operation::Create).await, 0);
    }

    #[tokio::test]
    async fn test_create_invalid_input_makes_no_engine_calls() {
        let engine = Arc::new(MockEngine::new());
        let app = create_test_app(engine.clone());

        let cases = [
            ("ram=abc&cpu=1&hostPort=8081", "Invalid input for RAM"),
            ("ram=1024&cpu=x&hostPort=8081", "Invalid input for CPU"),
            ("ram=1024&cpu=1&hostPort=port", "Invalid input for host port"),
            ("ram=1024&cpu=1", "Invalid input for host port"),
        ];

        for (body, expected) in cases {
            let response = app
                .clone()
                .oneshot(form_request("POST", "/containers", body))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
            assert_eq!(json_body(response).await["message"], expected);
        }

        assert!(engine.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_without_form_content_type() {
        let engine = Arc::new(MockEngine::new());
        let app = create_test_app(engine.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/containers")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"ram":1}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["message"].is_string());
        assert!(engine.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_engine_failure() {
        let engine = Arc::new(MockEngine::new());
        engine
            .fail_on(
                Operation::Create,
                DockyardError::Engine("No such image: ombansod:latest".to_string()),
            )
            .await;
        let app = create_test_app(engine.clone());

        let response = app
            .oneshot(form_request("POST", "/containers", "ram=1024&cpu=1&hostPort=8081"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await["message"],
            "No such image: ombansod:latest"
        );
    }

    #[tokio::test]
    async fn test_engine_unreachable_is_server_error() {
        let engine = Arc::new(MockEngine::new());
        engine
            .fail_on(
                Operation::List,
                DockyardError::Connection("error trying to connect: No such file or directory".to_string()),
            )
            .await;
        let app = create_test_app(engine);

        let response = app.oneshot(get("/containers")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert!(json["message"].as_str().unwrap().contains("error trying to connect"));
    }

    #[tokio::test]
    async fn test_list_containers() {
        let engine = Arc::new(MockEngine::new());
        engine.add_container("c1", &["/web"], &[8080], true).await;
        engine.add_container("c2", &["/db", "/db-alias"], &[], false).await;
        let app = create_test_app(engine);

        let first = json_body(app.clone().oneshot(get("/containers")).await.unwrap()).await;
        let second = json_body(app.oneshot(get("/containers")).await.unwrap()).await;

        assert_eq!(
            first,
            serde_json::json!([
                {"ID": "c1", "Names": ["/web"]},
                {"ID": "c2", "Names": ["/db", "/db-alias"]}
            ])
        );
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_list_empty_is_array() {
        let app = create_test_app(Arc::new(MockEngine::new()));

        let response = app.oneshot(get("/containers")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_resources_round_trip() {
        let engine = Arc::new(MockEngine::new());
        let app = create_test_app(engine);

        let created = json_body(
            app.clone()
                .oneshot(form_request("POST", "/containers", "ram=536870912&cpu=3&hostPort=9000"))
                .await
                .unwrap(),
        )
        .await;
        let id = created["container_id"].as_str().unwrap();

        let response = app
            .oneshot(get(&format!("/containers/{id}/resources")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({"cpu": 3, "ram": 536870912})
        );
    }

    #[tokio::test]
    async fn test_resources_unknown_container() {
        let app = create_test_app(Arc::new(MockEngine::new()));

        let response = app.oneshot(get("/containers/nope/resources")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert!(json["message"].as_str().unwrap().contains("No such container: nope"));
    }

    #[tokio::test]
    async fn test_update_resources() {
        let engine = Arc::new(MockEngine::new());
        engine.add_container("c1", &["/web"], &[8080], true).await;
        let app = create_test_app(engine.clone());

        let response = app
            .oneshot(form_request("PUT", "/containers/c1/resources", "ram=2048&cpu=4"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, serde_json::json!({"cpu": 4, "ram": 2048}));

        let operations: Vec<Operation> = engine.calls().await.into_iter().map(|c| c.operation).collect();
        assert_eq!(operations, vec![Operation::Update, Operation::Inspect]);
    }

    #[tokio::test]
    async fn test_update_resources_invalid_and_unknown() {
        let engine = Arc::new(MockEngine::new());
        let app = create_test_app(engine.clone());

        let response = app
            .clone()
            .oneshot(form_request("PUT", "/containers/c1/resources", "ram=-5&cpu=1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["message"], "Invalid input for RAM");
        assert!(engine.calls().await.is_empty());

        let response = app
            .oneshot(form_request("PUT", "/containers/ghost/resources", "ram=1024&cpu=1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert!(json["message"].as_str().unwrap().contains("No such container: ghost"));
    }

    #[tokio::test]
    async fn test_stop_container_twice() {
        let engine = Arc::new(MockEngine::new());
        engine.add_container("c1", &["/web"], &[8080], true).await;
        let app = create_test_app(engine.clone());

        let response = app
            .clone()
            .oneshot(form_request("POST", "/containers/stop", "containerID=c1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({"message": "Container stopped successfully"})
        );

        // The mock engine, like the Docker CLI, accepts a second stop
        let response = app
            .oneshot(form_request("POST", "/containers/stop", "containerID=c1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(engine.call_count(Operation::Stop).await, 2);
    }

    #[tokio::test]
    async fn test_stop_errors() {
        let engine = Arc::new(MockEngine::new());
        let app = create_test_app(engine.clone());

        let response = app
            .clone()
            .oneshot(form_request("POST", "/containers/stop", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(engine.calls().await.is_empty());

        let response = app
            .oneshot(form_request("POST", "/containers/stop", "containerID=missing"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert!(json["message"].as_str().unwrap().contains("No such container: missing"));
    }

    #[tokio::test]
    async fn test_static_assets() {
        let dir = tempfile::tempdir().unwrap();
        let index = dir.path().join("index.html");
        std::fs::write(&index, "<h1>Dockyard</h1>").unwrap();
        let static_dir = dir.path().join("static");
        std::fs::create_dir(&static_dir).unwrap();
        std::fs::write(static_dir.join("app.js"), "console.log('ok');").unwrap();

        let config = ServerConfig {
            static_dir,
            index_file: index,
            ..ServerConfig::default()
        };
        let service = ContainerService::new(Arc::new(MockEngine::new()), "ombansod");
        let app = create_app(AppState::new(service), &config);

        let response = app.clone().oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"<h1>Dockyard</h1>");

        let response = app.clone().oneshot(get("/static/app.js")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(get("/static/missing.css")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
