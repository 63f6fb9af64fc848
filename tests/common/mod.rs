#![allow(dead_code)]

//! In-process stand-in for the GitHub commits API, plus a helper that serves
//! the real application against it.
//!
//! Repositories under `octo/`:
//! - `widgets`: `main` → c1 c2 c3, `feature` → c4 c2, anything else → 404
//! - `slow`: same as `widgets`, answered after 150ms
//! - `private`: listing only with `Authorization: token secret`; anonymous → 404, other token → 401
//! - `forbidden` → 403, `limited` → 429 (Retry-After: 60), `flaky` → 502, `teapot` → 418
//! - `garbage` → 200 with a non-JSON body
//! - `paged` → `per_page` commits (30 when absent)
//! - anything else → 404

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;

use revdiff::diff::{BatchOrchestrator, BatchPolicy};
use revdiff::github::GithubFetcher;
use revdiff::{AppState, build_app};

#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub repository: String,
    pub sha: String,
    pub per_page: Option<u8>,
    pub authorization: Option<String>,
    pub user_agent: Option<String>,
    pub accept: Option<String>,
}

pub struct FakeGithub {
    pub url: String,
    pub seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl FakeGithub {
    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[derive(Debug, Deserialize)]
struct CommitsQuery {
    sha: String,
    per_page: Option<u8>,
}

type Seen = Arc<Mutex<Vec<SeenRequest>>>;

fn listing(shas: &[&str]) -> Response {
    let body: Vec<_> = shas
        .iter()
        .map(|sha| json!({ "sha": sha, "commit": { "message": format!("commit {sha}") }, "parents": [] }))
        .collect();
    Json(body).into_response()
}

fn widgets(sha: &str) -> Response {
    match sha {
        "main" => listing(&["c1", "c2", "c3"]),
        "feature" => listing(&["c4", "c2"]),
        _ => not_found(),
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "message": "Not Found" }))).into_response()
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn commits(
    State(seen): State<Seen>,
    Path((owner, name)): Path<(String, String)>,
    Query(query): Query<CommitsQuery>,
    headers: HeaderMap,
) -> Response {
    let authorization = header_value(&headers, header::AUTHORIZATION);
    seen.lock().unwrap().push(SeenRequest {
        repository: format!("{owner}/{name}"),
        sha: query.sha.clone(),
        per_page: query.per_page,
        authorization: authorization.clone(),
        user_agent: header_value(&headers, header::USER_AGENT),
        accept: header_value(&headers, header::ACCEPT),
    });

    if owner != "octo" {
        return not_found();
    }

    match name.as_str() {
        "widgets" => widgets(&query.sha),
        "slow" => {
            tokio::time::sleep(Duration::from_millis(150)).await;
            widgets(&query.sha)
        }
        "private" => match authorization.as_deref() {
            Some("token secret") => widgets(&query.sha),
            Some(_) => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "Bad credentials" })),
            )
                .into_response(),
            None => not_found(),
        },
        "forbidden" => (
            StatusCode::FORBIDDEN,
            Json(json!({ "message": "Resource not accessible by integration" })),
        )
            .into_response(),
        "limited" => (
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, "60")],
            Json(json!({ "message": "API rate limit exceeded" })),
        )
            .into_response(),
        "flaky" => (StatusCode::BAD_GATEWAY, "upstream hiccup").into_response(),
        "teapot" => StatusCode::IM_A_TEAPOT.into_response(),
        "garbage" => (StatusCode::OK, "<html>not json</html>").into_response(),
        "paged" => {
            let count = query.per_page.unwrap_or(30);
            let shas: Vec<String> = (0..count).map(|i| format!("p{i}")).collect();
            let refs: Vec<&str> = shas.iter().map(String::as_str).collect();
            listing(&refs)
        }
        _ => not_found(),
    }
}

pub async fn spawn_fake_github() -> FakeGithub {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .route("/repos/{owner}/{name}/commits", get(commits))
        .with_state(seen.clone());

    FakeGithub {
        url: serve(app).await,
        seen,
    }
}

/// Serves the real application against `upstream`, returning its base URL.
pub async fn spawn_service(upstream: &str, policy: BatchPolicy) -> String {
    let fetcher = GithubFetcher::new(upstream).expect("http client");
    let orchestrator = BatchOrchestrator::new(Arc::new(fetcher));
    serve(build_app(AppState::new(orchestrator, policy, upstream))).await
}

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{addr}")
}
