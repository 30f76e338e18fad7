//! WanderWise chat widget
//!
//! A small chat client: it renders user and assistant message bubbles and
//! forwards user text to a backend `/chat` endpoint, displaying the JSON
//! reply.
//!
//! # Architecture
//!
//! - **Widget**: controller bound to an injected message list, text input and
//!   send button
//! - **Transport**: single-method seam to the backend, with an HTTP
//!   implementation
//! - **Terminal**: host that drives the widget from stdin and echoes the
//!   message list to stdout
//!
//! # Modules
//!
//! - [`widget`]: bubbles, message list, input, send button and the controller
//! - [`transport`]: `ChatTransport` trait and `HttpChatTransport`
//! - [`protocol`]: wire types for `/chat`
//! - [`config`]: layered settings
//! - [`telemetry`]: tracing setup
//! - [`terminal`]: stdin/stdout host

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]

pub mod config;
pub mod error;
pub mod protocol;
pub mod telemetry;
pub mod terminal;
pub mod transport;
pub mod widget;

pub use error::ChatError;
pub use transport::{ChatTransport, HttpChatTransport};
pub use widget::ChatWidget;
