//! HTTP handlers for the Pings check-in backend.
//!
//! Every handler follows the same path: validate the payload, build the
//! record, write it through the store gateway, optionally publish through the
//! notifier gateway, and shape the JSON response.

pub mod checkin;
pub mod error;
pub mod extract;
pub mod family;
pub mod medications;
pub mod middleware;
pub mod notifications;
pub mod photos;
pub mod records;
pub mod routes;
pub mod state;
pub mod users;
pub mod validate;

#[cfg(test)]
mod test_support;

pub use routes::router;
pub use state::{ApiConfig, AppState, AppStateInner};
