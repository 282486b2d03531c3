//! HTTP boundary of qrlink.
//!
//! Public redirects live under `/q/{code}` and `/r/{slug}`; the owner API
//! under `/api/qrcodes` trusts the `x-user-id` header set by the
//! authenticating proxy and guards unsafe methods with a double-submit
//! CSRF token.

pub mod app;
pub mod csrf;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod model;
pub mod state;

pub use app::App;
pub use error::AppError;
pub use state::AppState;
