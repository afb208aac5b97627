//! HTTP API: routes, handlers, request/response types and error mapping.
pub mod error;
pub mod handlers;
pub mod routes;
pub mod types;

pub use handlers::AppState;
pub use routes::create_router;
