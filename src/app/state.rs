//! Application state shared across routes

use std::sync::Arc;

use crate::auth::SupabaseAuth;
use crate::config::Config;
use crate::http::sessions::SessionRegistry;
use crate::store::{StoreDirectory, SupabaseClient};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Public (anon key) view of the store directory
    pub stores: StoreDirectory,
    pub auth: SupabaseAuth,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);

        // Initialize Supabase client
        let supabase = SupabaseClient::new(&config);

        let stores = StoreDirectory::new(supabase.clone(), config.stores_table.clone());
        let auth = SupabaseAuth::new(supabase);
        let sessions = SessionRegistry::new(&config.supabase_jwt_secret);

        Self {
            config,
            stores,
            auth,
            sessions,
        }
    }
}
