//! Session gate middleware for operator-only routes

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use crate::app::AppState;
use crate::auth::AuthSubject;
use crate::http::sessions::OperatorSession;
use crate::store::StoreDirectory;
use crate::util::time::unix_secs;

/// Signed-in operator, inserted into request extensions by [`require_operator`]
#[derive(Clone)]
pub struct Operator {
    pub session: Arc<OperatorSession>,
    pub subject: AuthSubject,
}

impl Operator {
    /// Store directory that writes with this operator's access token
    pub fn stores(&self, directory: &StoreDirectory) -> StoreDirectory {
        directory.as_operator(&self.subject.access_token)
    }
}

/// Resolve the signed-in operator for a request, if any.
/// A registered session whose subject is gone leaves the registry here.
pub fn current_operator(state: &AppState, jar: &CookieJar) -> Option<Operator> {
    let session = state.sessions.from_jar(jar)?;
    match session.gate.active_subject(unix_secs()) {
        Some(subject) => Some(Operator { session, subject }),
        None => {
            debug!(session = %session.id, "Dropping signed-out session");
            state.sessions.remove(&session.id);
            None
        }
    }
}

/// Middleware to require a signed-in operator; everyone else goes back to
/// the dashboard route, which shows the login form.
pub async fn require_operator(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    match current_operator(&state, &jar) {
        Some(operator) => {
            request.extensions_mut().insert(operator);
            next.run(request).await
        }
        None => {
            debug!(path = %request.uri().path(), "No signed-in operator, redirecting");
            Redirect::to("/admin").into_response()
        }
    }
}
