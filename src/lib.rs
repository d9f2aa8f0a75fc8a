//! Client core for the Trenova transportation back office.
//!
//! A [`session::Session`] wires together the pieces every screen uses:
//!
//! - [`http`]: REST client with retry, timeouts and upload progress
//! - [`api`]: typed entity records, validation and the generic resource client
//! - [`cache`]: query cache with stale times and request de-duplication
//! - [`table`]: pagination/filter/selection state for entity tables
//! - [`notifications`]: WebSocket notification feed with reconnect
//!
//! Permission checks live in the `permissions` crate and are re-exported here.

pub mod api;
pub mod cache;
pub(crate) mod config;
pub mod error;
pub mod http;
pub mod notifications;
pub mod session;
pub mod table;

pub use error::ErrorCode;
pub use permissions;
pub use session::{Session, SessionConfig};
