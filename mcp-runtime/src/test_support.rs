//! In-process stand-in for the Pixela API.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use pixela_core::{ClientConfig, PixelaClient};
use serde_json::{Value, json};

#[derive(Default)]
struct MockState {
    calls: usize,
    /// (graphID, date) -> pixel body
    pixels: BTreeMap<(String, String), Value>,
    delay: Option<Duration>,
    reject_with: Option<String>,
}

#[derive(Clone)]
pub(crate) struct MockPixela {
    addr: SocketAddr,
    state: Arc<Mutex<MockState>>,
}

impl MockPixela {
    pub(crate) async fn spawn() -> Self {
        let state = Arc::new(Mutex::new(MockState::default()));
        let app = Router::new().fallback(remote).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { addr, state }
    }

    pub(crate) fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub(crate) fn client(&self) -> PixelaClient {
        PixelaClient::new(&ClientConfig::with_base_url(self.base_url())).unwrap()
    }

    pub(crate) fn client_with_timeout(&self, timeout: Duration) -> PixelaClient {
        let config = ClientConfig {
            timeout,
            ..ClientConfig::with_base_url(self.base_url())
        };
        PixelaClient::new(&config).unwrap()
    }

    pub(crate) fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    pub(crate) fn has_pixel(&self, graph_id: &str, date: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .pixels
            .contains_key(&(graph_id.to_string(), date.to_string()))
    }

    pub(crate) fn delay_responses(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }

    /// Every write answers `isSuccess: false` with this message.
    pub(crate) fn reject_writes(&self, message: &str) {
        self.state.lock().unwrap().reject_with = Some(message.to_string());
    }
}

fn ok(message: &str) -> Response {
    json_reply(json!({ "message": message, "isSuccess": true }))
}

fn json_reply(value: Value) -> Response {
    axum::Json(value).into_response()
}

async fn remote(
    State(state): State<Arc<Mutex<MockState>>>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let delay = {
        let mut guard = state.lock().unwrap();
        guard.calls += 1;
        guard.delay
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let mut guard = state.lock().unwrap();
    let segments: Vec<&str> = uri.path().trim_matches('/').split('/').collect();
    let query = uri.query().unwrap_or_default();
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    if method != Method::GET {
        if let Some(message) = &guard.reject_with {
            return (
                StatusCode::BAD_REQUEST,
                axum::Json(json!({ "message": message, "isSuccess": false })),
            )
                .into_response();
        }
    }

    match (method.as_str(), segments.as_slice()) {
        ("PUT", [profile]) if profile.starts_with('@') => ok("Success."),
        ("POST", ["v1", "users"]) => ok("Success."),
        ("PUT" | "DELETE", ["v1", "users", _]) => ok("Success."),
        ("GET", ["v1", "users", _, "graphs"]) => json_reply(json!({
            "graphs": [{
                "id": "g1",
                "name": "Run",
                "unit": "km",
                "type": "float",
                "color": "sora",
                "timezone": "Asia/Tokyo",
                "isSecret": "true"
            }]
        })),
        ("POST", ["v1", "users", _, "graphs"]) => ok("Success."),
        ("GET", ["v1", "users", _, "graphs", _]) => (
            [("content-type", "image/svg+xml")],
            "<svg xmlns=\"http://www.w3.org/2000/svg\"></svg>",
        )
            .into_response(),
        ("POST", ["v1", "users", _, "graphs", graph]) => {
            store_pixel(&mut guard, graph, &body);
            ok("Success.")
        }
        ("PUT" | "DELETE", ["v1", "users", _, "graphs", _]) => ok("Success."),
        ("GET", ["v1", "users", _, "graphs", _, "graph-def"]) => json_reply(json!({
            "id": "g1",
            "name": "Run",
            "unit": "km",
            "type": "float",
            "color": "sora",
            "timezone": "Asia/Tokyo",
            "selfSufficient": "none",
            "isSecret": "true",
            "publishOptionalData": false
        })),
        ("POST", ["v1", "users", _, "graphs", graph, "pixels"]) => {
            for pixel in body.as_array().cloned().unwrap_or_default() {
                store_pixel(&mut guard, graph, &pixel);
            }
            ok("Success.")
        }
        ("GET", ["v1", "users", _, "graphs", graph, "pixels"]) => {
            let stored = guard
                .pixels
                .iter()
                .filter(|((g, _), _)| g.as_str() == *graph)
                .map(|(_, pixel)| pixel.clone());
            if query.contains("withBody=true") {
                json_reply(json!({ "pixels": stored.collect::<Vec<_>>() }))
            } else {
                let dates: Vec<Value> = stored.map(|pixel| pixel["date"].clone()).collect();
                json_reply(json!({ "pixels": dates }))
            }
        }
        ("GET", ["v1", "users", _, "graphs", _, "stats"]) => json_reply(json!({
            "totalPixelsCount": 3,
            "maxQuantity": 7,
            "minQuantity": 1,
            "maxDate": "20250102",
            "minDate": "20250101",
            "totalQuantity": 12,
            "avgQuantity": 4,
            "todaysQuantity": 0,
            "yesterdayQuantity": 7
        })),
        ("GET", ["v1", "users", _, "graphs", _, "latest"]) => {
            json_reply(json!({ "date": "20250102", "quantity": "7" }))
        }
        ("GET", ["v1", "users", _, "graphs", _, "today"]) => json_reply(json!({ "quantity": "0" })),
        ("PUT", ["v1", "users", _, "graphs", _, "increment" | "decrement" | "add" | "subtract"]) => {
            ok("Success.")
        }
        ("POST", ["v1", "users", _, "graphs", _, "stopwatch"]) => ok("Stopwatch started."),
        ("GET", ["v1", "users", _, "graphs", graph, date]) => {
            match guard.pixels.get(&(graph.to_string(), date.to_string())) {
                Some(pixel) => {
                    let mut pixel = pixel.clone();
                    if let Some(map) = pixel.as_object_mut() {
                        map.remove("date");
                    }
                    json_reply(pixel)
                }
                None => (StatusCode::NOT_FOUND, "Specified pixel not found.").into_response(),
            }
        }
        ("PUT", ["v1", "users", _, "graphs", graph, date]) => {
            let mut pixel = body.clone();
            pixel["date"] = json!(date);
            guard.pixels.insert((graph.to_string(), date.to_string()), pixel);
            ok("Success.")
        }
        ("DELETE", ["v1", "users", _, "graphs", graph, date]) => {
            guard.pixels.remove(&(graph.to_string(), date.to_string()));
            ok("Success.")
        }
        ("POST", ["v1", "users", _, "webhooks"]) => json_reply(json!({
            "message": "Success.",
            "webhookHash": "h-1",
            "isSuccess": true
        })),
        ("GET", ["v1", "users", _, "webhooks"]) => json_reply(json!({
            "webhooks": [{
                "webhookHash": "h-1",
                "graphID": "g1",
                "type": "increment"
            }]
        })),
        ("POST" | "DELETE", ["v1", "users", _, "webhooks", _]) => ok("Success."),
        _ => (StatusCode::NOT_FOUND, "no such route").into_response(),
    }
}

fn store_pixel(state: &mut MockState, graph: &str, pixel: &Value) {
    let Some(date) = pixel.get("date").and_then(Value::as_str) else {
        return;
    };
    state
        .pixels
        .insert((graph.to_string(), date.to_string()), pixel.clone());
}
