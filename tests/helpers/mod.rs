//! Shared fixtures for router-level tests

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use plant_id_relay::config::Config;
use plant_id_relay::plantnet::{PlantNetClient, PROBE_IMAGE_BASE64};
use plant_id_relay::{build_router, AppState};
use serde_json::Value;
use tower::ServiceExt;

pub const TEST_API_KEY: &str = "test-plantnet-key-123";
pub const IDENTIFY_PATH: &str = "/v2/identify/all";
const BOUNDARY: &str = "----plantrelaytestboundary";

pub fn app_with_endpoint(endpoint: String, api_key: Option<&str>, timeout: Duration) -> Router {
    let config = Config::new(api_key.map(String::from), 3000);
    let client = PlantNetClient::with_endpoint(endpoint, timeout).expect("client builds");
    build_router(AppState::new(config, client))
}

pub fn app_for_server(server: &mockito::ServerGuard, api_key: Option<&str>) -> Router {
    app_with_endpoint(
        format!("{}{}", server.url(), IDENTIFY_PATH),
        api_key,
        Duration::from_secs(5),
    )
}

/// Address that refuses connections.
pub async fn closed_address() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Address that accepts connections and never answers.
pub async fn silent_address() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}

pub fn probe_png() -> Vec<u8> {
    STANDARD.decode(PROBE_IMAGE_BASE64).unwrap()
}

pub fn multipart_body(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(data.len() + 256);
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn identify_request(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/identify")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(field, filename, content_type, data)))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    into_json(response).await
}

async fn into_json<B>(response: Response<B>) -> (StatusCode, Value)
where
    B: axum::body::HttpBody,
    B::Error: std::fmt::Debug,
{
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or_else(|_| {
        panic!(
            "response body is not JSON: {}",
            String::from_utf8_lossy(&bytes)
        )
    });
    (status, json)
}

pub fn plantnet_body(scientific_name: &str, score: f64) -> String {
    serde_json::json!({
        "query": {"project": "all", "organs": ["auto"]},
        "language": "en",
        "bestMatch": scientific_name,
        "results": [
            {
                "score": score,
                "species": {
                    "scientificNameWithoutAuthor": scientific_name,
                    "scientificName": format!("{scientific_name} L."),
                    "commonNames": ["Common sunflower", "Sunflower"]
                },
                "images": [
                    {"url": {"o": "https://bs.plantnet.org/o.jpg", "m": "https://bs.plantnet.org/m.jpg", "s": "https://bs.plantnet.org/s.jpg"}}
                ]
            },
            {
                "score": 0.01,
                "species": {"scientificNameWithoutAuthor": "Helianthus tuberosus", "commonNames": []},
                "images": []
            }
        ],
        "remainingIdentificationRequests": 499
    })
    .to_string()
}
