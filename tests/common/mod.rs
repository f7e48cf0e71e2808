#![allow(dead_code)]

use hotspot_pay::domain::package::Package;
use rust_decimal_macros::dec;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::IntoResponse;
use std::collections::VecDeque;
use std::net::{SocketAddr, TcpListener};
use std::sync::{Arc, Mutex};
use std::thread;

pub const VALID_PHONE: &str = "+254712345678";

pub fn catalog() -> Vec<Package> {
    vec![
        Package {
            id: 1,
            name: "Quick Surf".to_string(),
            price: dec!(10),
            download_bandwidth: dec!(3),
            upload_bandwidth: dec!(1),
            duration_minutes: Some(30),
            duration_hours: None,
            duration_days: None,
        },
        Package {
            id: 2,
            name: "Daily".to_string(),
            price: dec!(50),
            download_bandwidth: dec!(5),
            upload_bandwidth: dec!(2),
            duration_minutes: None,
            duration_hours: None,
            duration_days: Some(1),
        },
    ]
}

/// A request captured by [`CannedServer`].
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub target: String,
    pub content_type: Option<String>,
    pub body: String,
}

struct Route {
    method: String,
    path: String,
    responses: VecDeque<(u16, String)>,
}

/// A throwaway axum server answering with queued canned JSON bodies.
///
/// Each route hands out its responses in order and repeats the last one once
/// the queue is down to a single entry. Unknown routes get a 404. The server
/// runs on its own thread and runtime, so sync tests and both tokio test
/// flavours can use it.
#[derive(Clone)]
pub struct CannedServer {
    addr: SocketAddr,
    routes: Arc<Mutex<Vec<Route>>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl CannedServer {
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let server = Self {
            addr: listener.local_addr().unwrap(),
            routes: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        };

        let app = Router::new()
            .fallback(answer)
            .with_state(server.clone());
        thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).unwrap();
                axum::serve(listener, app).await.unwrap();
            });
        });
        server
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn route(&self, method: &str, path: &str, status: u16, body: &str) -> &Self {
        let mut routes = self.routes.lock().unwrap();
        match routes
            .iter_mut()
            .find(|r| r.method == method && r.path == path)
        {
            Some(route) => route.responses.push_back((status, body.to_string())),
            None => routes.push(Route {
                method: method.to_string(),
                path: path.to_string(),
                responses: VecDeque::from([(status, body.to_string())]),
            }),
        }
        self
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, method: &str, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.target.split('?').next() == Some(path))
            .collect()
    }

    fn next_response(&self, method: &str, path: &str) -> (u16, String) {
        let mut routes = self.routes.lock().unwrap();
        match routes
            .iter_mut()
            .find(|r| r.method == method && r.path == path)
        {
            Some(route) if route.responses.len() > 1 => route.responses.pop_front().unwrap(),
            Some(route) => route.responses.front().cloned().unwrap(),
            None => (404, r#"{"detail": "Not found."}"#.to_string()),
        }
    }
}

async fn answer(
    State(server): State<CannedServer>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    let (status, reply) = server.next_response(method.as_str(), uri.path());
    server.requests.lock().unwrap().push(Recorded {
        method: method.to_string(),
        target: uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string()),
        content_type: headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
        body,
    });

    (
        StatusCode::from_u16(status).unwrap(),
        [(header::CONTENT_TYPE, "application/json")],
        reply,
    )
}
