//! HTTP/1.1 protocol implementation.
//!
//! Requests are parsed and responses written directly over byte streams,
//! one request per connection.
//!
//! # Architecture
//!
//! - **`error`**: Closed set of parse, write and transport errors
//! - **`headers`**: Case-insensitive, insertion-ordered field collection
//! - **`request`**: Request representation and parse states
//! - **`parser`**: Resumable request parser (`step` / `parse`)
//! - **`response`**: Status codes and default response headers
//! - **`writer`**: Phase-checked response writer with chunked bodies and trailers
//! - **`connection`**: Per-connection driver and the `Handler` contract
//!
//! # Request Parser State Machine
//!
//! ```text
//!        ┌─────────────────┐
//!        │   Initialized   │ ← Waiting for a CRLF-terminated request line
//!        └────────┬────────┘
//!                 │ request line parsed
//!                 ▼
//!        ┌─────────────────┐
//!        │ ParsingHeaders  │ ← One field line per step
//!        └────────┬────────┘
//!                 │ blank line
//!                 ▼
//!        ┌─────────────────┐
//!        │   ParsingBody   │ ← Accumulate up to Content-Length bytes
//!        └────────┬────────┘
//!                 │ length reached (or no Content-Length)
//!                 ▼
//!        ┌─────────────────┐
//!        │      Done       │
//!        └─────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use httpwire::http::connection::{Connection, Handler};
//! use tokio::net::TcpListener;
//!
//! let listener = TcpListener::bind("127.0.0.1:42069").await?;
//! let handler = std::sync::Arc::new(my_handler);
//!
//! loop {
//!     let (socket, _addr) = listener.accept().await?;
//!     let conn = Connection::new(socket, handler.clone(), 1024);
//!     tokio::spawn(async move {
//!         if let Err(e) = conn.run().await {
//!             eprintln!("Connection error: {}", e);
//!         }
//!     });
//! }
//! ```

pub mod connection;
pub mod error;
pub mod headers;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;

pub use error::{Error, Result};
pub use headers::Headers;
pub use request::{ParseState, Request, RequestLine};
pub use response::StatusCode;
pub use writer::{ResponseWriter, WriterState};
