//! JSON-over-HTTP transport for the chat backend.
//!
//! All request and response field names on the wire are snake_case DTOs in
//! `wire`; nothing outside this module sees them.

mod api;
mod client;
mod wire;


pub use client::{HttpTransport, TransportConfig};
