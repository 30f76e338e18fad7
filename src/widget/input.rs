//! Text input and send button handles.

use std::pin::Pin;
use std::sync::{Arc, PoisonError, RwLock};
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Shared handle to the text input's current value.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    value: Arc<RwLock<String>>,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> String {
        self.value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_value(&self, value: impl Into<String>) {
        *self.value.write().unwrap_or_else(PoisonError::into_inner) = value.into();
    }

    pub fn clear(&self) {
        self.value
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// A single press of the send control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Click;

/// The send control. Each [`click`](Self::click) is delivered to the paired
/// [`ClickStream`].
#[derive(Debug, Clone)]
pub struct SendButton {
    tx: mpsc::UnboundedSender<Click>,
}

impl SendButton {
    /// Create a button and the stream its clicks arrive on.
    pub fn new() -> (Self, ClickStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self { tx },
            ClickStream {
                inner: UnboundedReceiverStream::new(rx),
            },
        )
    }

    /// Press the button.
    ///
    /// Returns `false` once the widget stopped listening.
    pub fn click(&self) -> bool {
        self.tx.send(Click).is_ok()
    }
}

/// Stream of clicks from a [`SendButton`]. Ends when every button handle is
/// dropped.
#[derive(Debug)]
pub struct ClickStream {
    inner: UnboundedReceiverStream<Click>,
}

impl Stream for ClickStream {
    type Item = Click;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Click>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
