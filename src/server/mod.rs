//! TCP accept loop and shutdown signalling.

pub mod listener;
pub mod shutdown;

pub use listener::{Server, serve};
pub use shutdown::Shutdown;
