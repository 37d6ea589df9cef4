//! HTTP surface: router, session middleware, pages

pub mod middleware;
pub mod pages;
pub mod routes;
pub mod sessions;

pub use routes::build_router;
