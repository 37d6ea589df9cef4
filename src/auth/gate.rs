//! Session gate: the single source of truth for an operator's sign-in state
//!
//! State only changes through [`SessionGate::notify`]. `begin` and `end` talk
//! to the provider and then deliver the resulting notification; callers read
//! [`SessionGate::current`] afterwards instead of trusting the call's return.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tracing::{info, warn};

use super::provider::{AuthError, AuthProvider};
use super::token::verify_token;

/// The signed-in operator as seen by the auth provider
#[derive(Clone, PartialEq, Eq)]
pub struct AuthSubject {
    pub user_id: String,
    pub email: Option<String>,
    pub access_token: String,
    /// Token expiry, Unix seconds
    pub expires_at: u64,
}

impl fmt::Debug for AuthSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSubject")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    SignedOut,
    SignedIn(AuthSubject),
}

impl SessionState {
    pub fn subject(&self) -> Option<&AuthSubject> {
        match self {
            SessionState::SignedIn(subject) => Some(subject),
            SessionState::SignedOut => None,
        }
    }
}

type Listener = Arc<dyn Fn(&SessionState) + Send + Sync>;
type Listeners = Mutex<Vec<(u64, Listener)>>;

pub struct SessionGate {
    state: RwLock<SessionState>,
    listeners: Arc<Listeners>,
    next_listener: AtomicU64,
    jwt_secret: String,
}

impl SessionGate {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            state: RwLock::new(SessionState::SignedOut),
            listeners: Arc::new(Mutex::new(Vec::new())),
            next_listener: AtomicU64::new(0),
            jwt_secret: jwt_secret.into(),
        }
    }

    pub fn current(&self) -> SessionState {
        self.state.read().clone()
    }

    /// Current subject, if its token has not expired at `now` (Unix seconds).
    /// An expired subject is signed out on the spot.
    pub fn active_subject(&self, now: u64) -> Option<AuthSubject> {
        let subject = self.state.read().subject().cloned()?;
        if subject.expires_at < now {
            info!(user_id = %subject.user_id, "Access token expired, signing out");
            self.notify(SessionState::SignedOut);
            return None;
        }
        Some(subject)
    }

    /// Register a callback for every state notification.
    /// The callback stays registered until the returned guard is dropped.
    pub fn on_change<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&SessionState) + Send + Sync + 'static,
    {
        let id = self.next_listener.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().push((id, Arc::new(callback)));
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    #[cfg(test)]
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Deliver a state notification to the gate and every subscriber
    pub fn notify(&self, state: SessionState) {
        *self.state.write() = state.clone();
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(&state);
        }
    }

    /// Sign in with email and password
    pub async fn begin<P: AuthProvider>(
        &self,
        provider: &P,
        email: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        let session = provider.sign_in(email, password).await?;
        let claims = verify_token(&session.access_token, &self.jwt_secret)?;

        info!(
            user_id = %claims.sub,
            expires_in = ?session.expires_in,
            "Operator signed in"
        );
        self.notify(SessionState::SignedIn(AuthSubject {
            user_id: claims.sub,
            email: claims.email.or_else(|| Some(email.to_string())),
            access_token: session.access_token,
            expires_at: claims.exp,
        }));
        Ok(())
    }

    /// Sign out. The provider is asked to revoke the token; the local session
    /// ends regardless of its answer.
    pub async fn end<P: AuthProvider>(&self, provider: &P) {
        let Some(subject) = self.current().subject().cloned() else {
            return;
        };
        if let Err(e) = provider.sign_out(&subject.access_token).await {
            warn!(user_id = %subject.user_id, error = %e, "Provider sign-out failed");
        }
        info!(user_id = %subject.user_id, "Operator signed out");
        self.notify(SessionState::SignedOut);
    }
}

/// Guard for a registered [`SessionGate::on_change`] callback
pub struct Subscription {
    id: u64,
    listeners: Weak<Listeners>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.lock().retain(|(id, _)| *id != self.id);
        }
    }
}
