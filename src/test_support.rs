//! Shared fixtures for tests: a stub GitHub API server and record builders.

use crate::issue::IssueRecord;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use tiny_http::{Header, Response, Server};

/// A request received by [`StubServer`].
#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub url: String,
    pub authorization: Option<String>,
    pub api_version: Option<String>,
    pub accept: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone)]
struct StubRoute {
    path: String,
    status: u16,
    body: String,
}

/// Minimal HTTP server standing in for the GitHub REST API.
///
/// Routes match on the request path (query string ignored). Unrouted paths
/// answer 404. The server thread stops when the stub is dropped.
pub(crate) struct StubServer {
    base_url: String,
    server: Arc<Server>,
    routes: Arc<Mutex<Vec<StubRoute>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: Option<JoinHandle<()>>,
}

impl StubServer {
    pub(crate) fn start() -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").expect("failed to bind stub server"));
        let addr = server
            .server_addr()
            .to_ip()
            .expect("stub server is not listening on an IP address");
        let base_url = format!("http://{}", addr);

        let routes: Arc<Mutex<Vec<StubRoute>>> = Arc::new(Mutex::new(Vec::new()));
        let requests: Arc<Mutex<Vec<RecordedRequest>>> = Arc::new(Mutex::new(Vec::new()));

        let handle = {
            let server = Arc::clone(&server);
            let routes = Arc::clone(&routes);
            let requests = Arc::clone(&requests);
            std::thread::spawn(move || {
                for request in server.incoming_requests() {
                    let header = |name: &'static str| {
                        request
                            .headers()
                            .iter()
                            .find(|h| h.field.equiv(name))
                            .map(|h| h.value.as_str().to_string())
                    };
                    requests.lock().unwrap().push(RecordedRequest {
                        url: request.url().to_string(),
                        authorization: header("Authorization"),
                        api_version: header("X-GitHub-Api-Version"),
                        accept: header("Accept"),
                        user_agent: header("User-Agent"),
                    });

                    let path = request.url().split('?').next().unwrap_or("").to_string();
                    let route = routes
                        .lock()
                        .unwrap()
                        .iter()
                        .rev()
                        .find(|r| r.path == path)
                        .cloned();
                    let (status, body) = match route {
                        Some(r) => (r.status, r.body),
                        None => (404, r#"{"message":"Not Found"}"#.to_string()),
                    };

                    let content_type =
                        Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                            .unwrap();
                    let response = Response::from_string(body)
                        .with_status_code(status)
                        .with_header(content_type);
                    let _ = request.respond(response);
                }
            })
        };

        Self {
            base_url,
            server,
            routes,
            requests,
            handle: Some(handle),
        }
    }

    /// Base URL, e.g. `http://127.0.0.1:54321`.
    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for `path` on this server.
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Answer requests for `path` with `status` and a JSON `body`.
    pub(crate) fn route(&self, path: &str, status: u16, body: impl Into<String>) {
        self.routes.lock().unwrap().push(StubRoute {
            path: path.to_string(),
            status,
            body: body.into(),
        });
    }

    /// Requests received so far, in arrival order.
    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// JSON for one issue-list entry whose comments live on `stub`.
pub(crate) fn issue_json(
    stub: &StubServer,
    repo: &str,
    number: u64,
    title: &str,
    body: &str,
    labels: &[&str],
) -> serde_json::Value {
    serde_json::json!({
        "number": number,
        "title": title,
        "body": body,
        "state": "open",
        "labels": labels.iter().map(|l| serde_json::json!({"name": l})).collect::<Vec<_>>(),
        "comments_url": stub.url(&comments_path(repo, number)),
    })
}

/// Path of the comments endpoint for issue `number`.
pub(crate) fn comments_path(repo: &str, number: u64) -> String {
    format!("/repos/{}/issues/{}/comments", repo, number)
}

/// Build a record with the given number and title and simple defaults.
pub(crate) fn record(number: u64, title: &str) -> IssueRecord {
    IssueRecord {
        issue_number: number,
        title: title.to_string(),
        body: format!("body of {}", number),
        labels: vec!["bug".to_string()],
        comments: format!("first comment on {}\nsecond comment", number),
    }
}
