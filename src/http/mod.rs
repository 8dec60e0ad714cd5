//! Request and response types
//!
//! One explicit response shape is used for network responses, cached
//! snapshots and synthetic fallbacks, so strategy code never has to
//! inspect where a response came from.

mod headers;
mod request;
mod response;

pub use headers::Headers;
pub use request::{Method, Request};
pub use response::{Response, ResponseType, OFFLINE_STATUS};
