//! Operator authentication: provider client, token checks and the session gate

pub mod gate;
pub mod provider;
pub mod token;

pub use gate::{AuthSubject, SessionGate, SessionState, Subscription};
pub use provider::SupabaseAuth;
