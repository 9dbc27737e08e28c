//! Upstream passthrough
//!
//! Relays requests to an upstream HTTP server and streams the answer back
//! with chunked transfer-encoding and content trailers.

pub mod upstream;

pub use upstream::Upstream;
