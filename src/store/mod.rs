//! Data store modules for Supabase integration

pub mod directory;
#[cfg(test)]
pub mod memory;
pub mod records;
pub mod repository;
#[cfg(test)]
pub mod stub;
pub mod supabase;

pub use directory::StoreDirectory;
pub use records::{StoreFields, StoreRecord};
pub use repository::{StoreError, StoreRepository};
pub use supabase::SupabaseClient;
