//! httpwire - HTTP/1.1 over raw TCP
//!
//! Incremental request parsing and phased response writing, with a small
//! tokio server around them.

pub mod app;
pub mod config;
pub mod http;
pub mod proxy;
pub mod server;
