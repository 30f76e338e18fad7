//! The chat widget and the surface it draws on.
//!
//! The widget is bound to three collaborators supplied by its host:
//!
//! - [`ChatContainer`]: the ordered message list
//! - [`TextInput`]: the text the user is composing
//! - [`SendButton`] / [`ClickStream`]: the send control
//!
//! # Example
//!
//! ```rust
//! use wanderwise_chat::widget::{BubbleKind, ChatContainer, Role};
//!
//! let container = ChatContainer::new();
//! container.append(Role::User, BubbleKind::Message, "Hello");
//! assert_eq!(container.len(), 1);
//! assert!(container.last().unwrap().is_user());
//! ```

mod bubble;
mod container;
mod controller;
mod input;

pub use bubble::{Bubble, BubbleId, BubbleKind, Role};
pub use container::{ChatContainer, ContainerEvent};
pub use controller::{
    ChatWidget, DEFAULT_ERROR_TEXT, DEFAULT_PLACEHOLDER_TEXT, FailurePolicy, PendingExchange,
    RunSummary, WidgetOptions,
};
pub use input::{Click, ClickStream, SendButton, TextInput};
