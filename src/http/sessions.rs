//! Operator browser sessions, keyed by the session cookie

use std::sync::Arc;
use std::time::Duration;

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;
use uuid::Uuid;

use crate::auth::{SessionGate, SessionState, Subscription};
use crate::dashboard::Dashboard;
use crate::util::time::unix_secs;

pub const SESSION_COOKIE: &str = "storelink_sid";

/// How often signed-out and expired sessions are dropped from the registry
pub const SWEEP_PERIOD: Duration = Duration::from_secs(60);

/// One-shot message carried to the next dashboard render
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flash {
    Error(String),
    Created { link: String },
}

/// Sign-in state and store mirror of a single operator browser session
pub struct OperatorSession {
    pub id: Uuid,
    pub gate: SessionGate,
    pub dashboard: Arc<Dashboard>,
    flash: Mutex<Option<Flash>>,
    _subscription: Subscription,
}

impl OperatorSession {
    pub fn new(jwt_secret: &str) -> Self {
        Self::with_dashboard(jwt_secret, Dashboard::new())
    }

    pub fn with_dashboard(jwt_secret: &str, dashboard: Dashboard) -> Self {
        let gate = SessionGate::new(jwt_secret);
        let dashboard = Arc::new(dashboard);

        // Sign-out must never leave the previous operator's list behind
        let mirror = dashboard.clone();
        let subscription = gate.on_change(move |state| match state {
            SessionState::SignedOut => mirror.clear(),
            SessionState::SignedIn(_) => mirror.mark_stale(),
        });

        Self {
            id: Uuid::new_v4(),
            gate,
            dashboard,
            flash: Mutex::new(None),
            _subscription: subscription,
        }
    }

    pub fn set_flash(&self, flash: Flash) {
        *self.flash.lock() = Some(flash);
    }

    pub fn take_flash(&self) -> Option<Flash> {
        self.flash.lock().take()
    }
}

#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<Uuid, Arc<OperatorSession>>>,
    jwt_secret: Arc<str>,
}

impl SessionRegistry {
    pub fn new(jwt_secret: &str) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            jwt_secret: Arc::from(jwt_secret),
        }
    }

    /// A fresh, unregistered session
    pub fn open(&self) -> Arc<OperatorSession> {
        Arc::new(OperatorSession::new(&self.jwt_secret))
    }

    pub fn insert(&self, session: Arc<OperatorSession>) {
        self.sessions.insert(session.id, session);
    }

    pub fn get(&self, id: &Uuid) -> Option<Arc<OperatorSession>> {
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    /// Session named by the request's cookie, if it is still registered
    pub fn from_jar(&self, jar: &CookieJar) -> Option<Arc<OperatorSession>> {
        let id = jar
            .get(SESSION_COOKIE)
            .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())?;
        self.get(&id)
    }

    pub fn remove(&self, id: &Uuid) -> Option<Arc<OperatorSession>> {
        self.sessions.remove(id).map(|(_, session)| session)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Drop every session, tearing down their gate subscriptions
    pub fn clear(&self) {
        self.sessions.clear();
    }

    /// Drop every session without an active subject at `now`
    pub fn sweep(&self, now: u64) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| session.gate.active_subject(now).is_some());
        before.saturating_sub(self.sessions.len())
    }

    /// Sweep on a fixed period; runs until the runtime stops
    pub async fn run_sweeper(self, period: Duration) {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let removed = self.sweep(unix_secs());
            if removed > 0 {
                debug!(removed, remaining = self.len(), "Swept operator sessions");
            }
        }
    }
}

pub fn session_cookie(id: Uuid, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::gate::tests::subject;
    use crate::store::memory::MemoryStores;
    use crate::store::{StoreFields, StoreRepository};

    #[tokio::test]
    async fn test_sign_out_clears_mirror() {
        let session = OperatorSession::new("secret");
        let repo = MemoryStores::default();
        repo.create(&StoreFields::named("Joe's Cafe"), 1).await.unwrap();

        session.gate.notify(SessionState::SignedIn(subject(u64::MAX)));
        session.dashboard.refresh(&repo).await.unwrap();
        assert_eq!(session.dashboard.snapshot().len(), 1);

        session.gate.notify(SessionState::SignedOut);

        assert!(session.dashboard.snapshot().is_empty());
        assert!(session.dashboard.is_stale());
    }

    #[tokio::test]
    async fn test_sign_in_marks_mirror_stale() {
        let session = OperatorSession::new("secret");
        session.dashboard.refresh(&MemoryStores::default()).await.unwrap();
        assert!(!session.dashboard.is_stale());

        session.gate.notify(SessionState::SignedIn(subject(u64::MAX)));

        assert!(session.dashboard.is_stale());
    }

    #[test]
    fn test_flash_is_taken_once() {
        let session = OperatorSession::new("secret");
        session.set_flash(Flash::Error("boom".to_string()));
        assert_eq!(session.take_flash(), Some(Flash::Error("boom".to_string())));
        assert_eq!(session.take_flash(), None);
    }

    #[test]
    fn test_registry_resolves_cookie() {
        let registry = SessionRegistry::new("secret");
        let session = registry.open();
        let id = session.id;
        registry.insert(session);

        let jar = CookieJar::new().add(session_cookie(id, false));
        assert_eq!(registry.from_jar(&jar).map(|s| s.id), Some(id));

        let stranger = CookieJar::new().add(Cookie::new(SESSION_COOKIE, "not-a-uuid"));
        assert!(registry.from_jar(&stranger).is_none());

        registry.clear();
        assert_eq!(registry.len(), 0);
        assert!(registry.from_jar(&jar).is_none());
    }

    #[test]
    fn test_sweep_drops_expired_and_signed_out_sessions() {
        let registry = SessionRegistry::new("secret");

        let live = registry.open();
        live.gate.notify(SessionState::SignedIn(subject(2_000)));
        let expired = registry.open();
        expired.gate.notify(SessionState::SignedIn(subject(1_000)));
        let signed_out = registry.open();

        for session in [&live, &expired, &signed_out] {
            registry.insert(session.clone());
        }

        assert_eq!(registry.sweep(1_500), 2);
        assert_eq!(registry.len(), 1);
        assert!(registry.get(&live.id).is_some());
        assert_eq!(expired.gate.current(), SessionState::SignedOut);
    }

    #[tokio::test]
    async fn test_sweeper_runs_in_background() {
        let registry = SessionRegistry::new("secret");
        let stale = registry.open();
        stale.gate.notify(SessionState::SignedIn(subject(1)));
        registry.insert(stale);

        tokio::spawn(registry.clone().run_sweeper(Duration::from_millis(10)));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_cookie_attributes() {
        let cookie = session_cookie(Uuid::nil(), true);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
    }
}
