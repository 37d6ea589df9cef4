//! Local stand-in for the Supabase REST and auth APIs, served by axum on a
//! loopback port so clients run their real HTTP code paths in tests.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::auth::token::{sign_token, TokenClaims};
use crate::config::{test_config, Config};
use crate::util::time::unix_secs;

/// Password the stub accepts for any email
pub const PASSWORD: &str = "hunter2";
/// Subject of every token the stub signs
pub const OPERATOR_ID: &str = "0b8f5c7e-1111-4222-8333-444455556666";

#[derive(Default)]
struct StubState {
    rows: Mutex<Vec<Value>>,
    numeric_ids: AtomicBool,
    next_id: AtomicU64,
    sign_ins: AtomicUsize,
    sign_outs: AtomicUsize,
    write_bearers: Mutex<Vec<String>>,
    secret: String,
}

pub struct StubSupabase {
    addr: SocketAddr,
    state: Arc<StubState>,
}

impl StubSupabase {
    pub async fn spawn() -> Self {
        let state = Arc::new(StubState {
            secret: test_config().supabase_jwt_secret,
            ..StubState::default()
        });

        let router = Router::new()
            .route(
                "/rest/v1/:table",
                get(select_rows)
                    .post(insert_row)
                    .patch(update_rows)
                    .delete(delete_rows),
            )
            .route("/auth/v1/token", post(sign_in))
            .route("/auth/v1/logout", post(sign_out))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { addr, state }
    }

    /// Configuration pointing every Supabase call at this stub
    pub fn config(&self) -> Config {
        Config {
            supabase_url: format!("http://{}", self.addr),
            ..test_config()
        }
    }

    /// Behave like a bigint id column: ids are numbers and text filters fail
    pub fn numeric_ids(&self) {
        self.state.numeric_ids.store(true, Ordering::SeqCst);
    }

    pub fn push_row(&self, row: Value) {
        self.state.rows.lock().push(row);
    }

    pub fn rows(&self) -> Vec<Value> {
        self.state.rows.lock().clone()
    }

    pub fn sign_ins(&self) -> usize {
        self.state.sign_ins.load(Ordering::SeqCst)
    }

    pub fn sign_outs(&self) -> usize {
        self.state.sign_outs.load(Ordering::SeqCst)
    }

    /// Bearer tokens seen on insert, update and delete
    pub fn write_bearers(&self) -> Vec<String> {
        self.state.write_bearers.lock().clone()
    }
}

fn id_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Resolve an `id=eq.X` filter, failing the way PostgreSQL does for bigint
fn id_filter(state: &StubState, params: &HashMap<String, String>) -> Result<Option<String>, Response> {
    let Some(id) = params.get("id").and_then(|f| f.strip_prefix("eq.")) else {
        return Ok(None);
    };
    if state.numeric_ids.load(Ordering::SeqCst) && id.parse::<i64>().is_err() {
        let body = json!({
            "code": "22P02",
            "details": null,
            "hint": null,
            "message": format!("invalid input syntax for type bigint: \"{}\"", id),
        });
        return Err((StatusCode::BAD_REQUEST, Json(body)).into_response());
    }
    Ok(Some(id.to_string()))
}

fn row_matches(row: &Value, id: &Option<String>) -> bool {
    match id {
        Some(id) => row.get("id").map(id_text).as_deref() == Some(id.as_str()),
        None => true,
    }
}

fn record_bearer(state: &StubState, headers: &HeaderMap) {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or_default()
        .to_string();
    state.write_bearers.lock().push(bearer);
}

async fn select_rows(
    State(state): State<Arc<StubState>>,
    Path(_table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let id = match id_filter(&state, &params) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let rows: Vec<Value> = state
        .rows
        .lock()
        .iter()
        .filter(|row| row_matches(row, &id))
        .cloned()
        .collect();
    Json(rows).into_response()
}

async fn insert_row(
    State(state): State<Arc<StubState>>,
    Path(_table): Path<String>,
    headers: HeaderMap,
    Json(mut row): Json<Value>,
) -> Response {
    record_bearer(&state, &headers);
    let n = state.next_id.fetch_add(1, Ordering::SeqCst) + 1;
    row["id"] = if state.numeric_ids.load(Ordering::SeqCst) {
        json!(n)
    } else {
        json!(format!("row-{}", n))
    };
    state.rows.lock().push(row.clone());
    (StatusCode::CREATED, Json(vec![row])).into_response()
}

async fn update_rows(
    State(state): State<Arc<StubState>>,
    Path(_table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(patch): Json<Value>,
) -> Response {
    record_bearer(&state, &headers);
    let id = match id_filter(&state, &params) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let mut touched = Vec::new();
    for row in state.rows.lock().iter_mut().filter(|row| row_matches(row, &id)) {
        if let (Some(row), Some(patch)) = (row.as_object_mut(), patch.as_object()) {
            for (key, value) in patch {
                row.insert(key.clone(), value.clone());
            }
        }
        touched.push(row.clone());
    }
    Json(touched).into_response()
}

async fn delete_rows(
    State(state): State<Arc<StubState>>,
    Path(_table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    record_bearer(&state, &headers);
    let id = match id_filter(&state, &params) {
        Ok(id) => id,
        Err(response) => return response,
    };
    state.rows.lock().retain(|row| !row_matches(row, &id));
    StatusCode::NO_CONTENT.into_response()
}

#[derive(Deserialize)]
struct PasswordGrant {
    email: String,
    password: String,
}

async fn sign_in(State(state): State<Arc<StubState>>, Json(grant): Json<PasswordGrant>) -> Response {
    if grant.password != PASSWORD {
        let body = json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials",
        });
        return (StatusCode::BAD_REQUEST, Json(body)).into_response();
    }
    state.sign_ins.fetch_add(1, Ordering::SeqCst);
    let claims = TokenClaims {
        sub: OPERATOR_ID.to_string(),
        exp: unix_secs() + 3600,
        email: Some(grant.email),
        role: Some("authenticated".to_string()),
    };
    let body = json!({
        "access_token": sign_token(&claims, &state.secret),
        "token_type": "bearer",
        "expires_in": 3600,
    });
    Json(body).into_response()
}

async fn sign_out(State(state): State<Arc<StubState>>) -> StatusCode {
    state.sign_outs.fetch_add(1, Ordering::SeqCst);
    StatusCode::NO_CONTENT
}
