//! HTTP route definitions

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing::{debug, error, warn};

use crate::app::AppState;
use crate::dashboard::Confirmed;
use crate::http::middleware::{current_operator, require_operator, Operator};
use crate::http::pages::{
    render, ConfirmDeletePage, DashboardPage, DeleteForm, EditPage, LoginForm, LoginPage,
    NotFoundPage, ProfilePage, StoreForm, StoreRow,
};
use crate::http::sessions::{expired_session_cookie, session_cookie, Flash};
use crate::profile::{direct_link, ProfileView};
use crate::store::{StoreError, StoreRepository};
use crate::util::time::uptime_secs;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    // Public routes (no session required)
    let public_routes = Router::new()
        .route("/", get(|| async { Redirect::to("/admin") }))
        .route("/health", get(health_handler))
        .route("/store/:id", get(profile_handler))
        .route("/admin", get(admin_handler))
        .route("/admin/login", post(login_handler))
        .route("/admin/logout", post(logout_handler));

    // Operator routes (signed-in session required)
    let protected_routes = Router::new()
        .route("/admin/stores", post(create_handler))
        .route("/admin/stores/:id", post(update_handler))
        .route("/admin/stores/:id/edit", get(edit_handler))
        .route(
            "/admin/stores/:id/delete",
            get(confirm_delete_handler).post(delete_handler),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_operator));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    operator_sessions: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        operator_sessions: state.sessions.len(),
    })
}

// ============================================================================
// Public profile
// ============================================================================

async fn profile_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    profile_response(&state.stores, &id).await
}

/// Profile page for `id`, or the not-found page when it does not resolve
pub async fn profile_response<R: StoreRepository>(
    repo: &R,
    id: &str,
) -> Result<Response, AppError> {
    match repo.get(id).await? {
        Some(record) => {
            let page = ProfilePage {
                store: ProfileView::from(&record),
            };
            Ok(render(&page)?.into_response())
        }
        None => Ok((StatusCode::NOT_FOUND, render(&NotFoundPage)?).into_response()),
    }
}

// ============================================================================
// Session endpoints
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct AdminQuery {
    #[serde(default)]
    add: Option<String>,
}

async fn admin_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<AdminQuery>,
) -> Result<Response, AppError> {
    let Some(operator) = current_operator(&state, &jar) else {
        let page = LoginPage {
            email: String::new(),
            error: None,
        };
        return Ok(render(&page)?.into_response());
    };

    render_dashboard(
        &state,
        &operator,
        query.add.is_some(),
        StoreForm::default(),
        None,
    )
    .await
}

async fn render_dashboard(
    state: &AppState,
    operator: &Operator,
    show_add_form: bool,
    form: StoreForm,
    mut error: Option<String>,
) -> Result<Response, AppError> {
    let session = &operator.session;

    let mut new_store_link = None;
    match session.take_flash() {
        Some(Flash::Error(message)) => error = error.or(Some(message)),
        Some(Flash::Created { link }) => new_store_link = Some(link),
        None => {}
    }

    if session.dashboard.is_stale() {
        if let Err(e) = session
            .dashboard
            .refresh(&operator.stores(&state.stores))
            .await
        {
            if error.is_none() {
                error = Some(e.to_string());
            }
        }
    }

    let stores = session
        .dashboard
        .snapshot()
        .records()
        .iter()
        .map(|record| StoreRow::new(record, &state.config.public_base_url))
        .collect();

    let subject = &operator.subject;
    let page = DashboardPage {
        operator: subject
            .email
            .clone()
            .unwrap_or_else(|| subject.user_id.clone()),
        show_add_form,
        form,
        error,
        new_store_link,
        stores,
    };
    Ok(render(&page)?.into_response())
}

async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    // Every sign-in gets a new session id; a cookie sent with the form is never adopted
    let previous = state.sessions.from_jar(&jar);
    let session = state.sessions.open();

    match session
        .gate
        .begin(&state.auth, &form.email, &form.password)
        .await
    {
        Ok(()) => {
            state.sessions.insert(session.clone());
            if let Some(previous) = previous {
                debug!(previous = %previous.id, session = %session.id, "Replacing operator session");
                state.sessions.remove(&previous.id);
            }
            // The next render reads the gate; nothing here assumes the outcome
            let jar = jar.add(session_cookie(session.id, state.config.secure_cookies));
            Ok((jar, Redirect::to("/admin")).into_response())
        }
        Err(e) => {
            warn!(email = %form.email, error = %e, "Sign-in failed");
            let page = LoginPage {
                email: form.email,
                error: Some(e.to_string()),
            };
            Ok(render(&page)?.into_response())
        }
    }
}

async fn logout_handler(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    if let Some(session) = state.sessions.from_jar(&jar) {
        session.gate.end(&state.auth).await;
        state.sessions.remove(&session.id);
    }
    (jar.remove(expired_session_cookie()), Redirect::to("/admin"))
}

// ============================================================================
// Store management endpoints
// ============================================================================

async fn create_handler(
    State(state): State<AppState>,
    Extension(operator): Extension<Operator>,
    Form(form): Form<StoreForm>,
) -> Result<Response, AppError> {
    let fields = match form.clone().into_fields() {
        Ok(fields) => fields,
        Err(e) => return render_dashboard(&state, &operator, true, form, Some(e.to_string())).await,
    };

    let created = operator
        .session
        .dashboard
        .create(&operator.stores(&state.stores), fields)
        .await;

    match created {
        Ok(record) => {
            operator.session.set_flash(Flash::Created {
                link: direct_link(&state.config.public_base_url, &record.id),
            });
            Ok(Redirect::to("/admin").into_response())
        }
        Err(e) => render_dashboard(&state, &operator, true, form, Some(e.to_string())).await,
    }
}

async fn edit_handler(
    State(state): State<AppState>,
    Extension(operator): Extension<Operator>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let record = match operator.session.dashboard.get(&id) {
        Some(record) => record,
        None => operator
            .stores(&state.stores)
            .get(&id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("store {}", id)))?,
    };

    let page = EditPage {
        id,
        form: StoreForm::from(&record.fields),
        error: None,
    };
    Ok(render(&page)?.into_response())
}

async fn update_handler(
    State(state): State<AppState>,
    Extension(operator): Extension<Operator>,
    Path(id): Path<String>,
    Form(form): Form<StoreForm>,
) -> Result<Response, AppError> {
    let result = match form.clone().into_fields() {
        Ok(fields) => operator
            .session
            .dashboard
            .update(&operator.stores(&state.stores), &id, fields)
            .await
            .map(|_| ()),
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => Ok(Redirect::to("/admin").into_response()),
        Err(e) => {
            let page = EditPage {
                id,
                form,
                error: Some(e.to_string()),
            };
            Ok(render(&page)?.into_response())
        }
    }
}

async fn confirm_delete_handler(
    Extension(operator): Extension<Operator>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let name = operator
        .session
        .dashboard
        .get(&id)
        .map(|record| record.fields.name)
        .unwrap_or_else(|| id.clone());

    Ok(render(&ConfirmDeletePage { id, name })?.into_response())
}

async fn delete_handler(
    State(state): State<AppState>,
    Extension(operator): Extension<Operator>,
    Path(id): Path<String>,
    Form(form): Form<DeleteForm>,
) -> Redirect {
    let Some(confirmed) = Confirmed::from_answer(&form.confirm) else {
        return Redirect::to("/admin");
    };

    if let Err(e) = operator
        .session
        .dashboard
        .delete(&operator.stores(&state.stores), &id, confirmed)
        .await
    {
        operator.session.set_flash(Flash::Error(e.to_string()));
    }
    Redirect::to("/admin")
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) | AppError::Store(StoreError::NotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            AppError::Store(StoreError::Validation(_)) => StatusCode::BAD_REQUEST,
            AppError::Store(StoreError::PermissionDenied(_)) => StatusCode::FORBIDDEN,
            AppError::Store(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        (status, self.to_string()).into_response()
    }
}
