//! Browser lifecycle, DevTools connection, and event routing.
//!
//! This crate owns everything between "we need a browser" and "a typed
//! command came back": locating and launching the executable, the
//! WebSocket transport, and the correlation layer that matches responses
//! to commands and routes session-scoped events. Higher-level page
//! semantics live in `vouch-rs`.

mod connection;
mod error;
mod launcher;
mod transport;

pub use connection::Connection;
pub use error::{Error, Result};
pub use launcher::{LaunchConfig, LaunchedBrowser, find_browser_executable, launch};
pub use transport::{MessageSender, WsTransport};
