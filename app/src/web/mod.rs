// noskem/src/web/mod.rs

pub mod auth;
pub mod guest_likes;
pub mod handlers;
pub mod pagination;
pub mod routes;

pub use routes::configure_app_routes;
