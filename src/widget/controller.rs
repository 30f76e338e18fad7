//! The chat widget controller.

use std::collections::HashSet;

use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, Stream, StreamExt};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::bubble::{BubbleId, BubbleKind, Role};
use super::container::ChatContainer;
use super::input::{Click, TextInput};
use crate::error::{ChatError, Result};
use crate::protocol::ChatRequest;
use crate::transport::ChatTransport;

/// Default text of the "working" placeholder.
pub const DEFAULT_PLACEHOLDER_TEXT: &str = "Planning...";
/// Default text of the bubble shown when a send fails.
pub const DEFAULT_ERROR_TEXT: &str = "Sorry, something went wrong. Please try again.";

/// What the message list shows when a send fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Replace the placeholder with an error bubble.
    #[default]
    ErrorBubble,
    /// Leave the placeholder on screen.
    KeepPlaceholder,
}

/// Display settings for the widget.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WidgetOptions {
    pub placeholder_text: String,
    pub error_text: String,
    pub on_failure: FailurePolicy,
}

impl Default for WidgetOptions {
    fn default() -> Self {
        Self {
            placeholder_text: DEFAULT_PLACEHOLDER_TEXT.to_string(),
            error_text: DEFAULT_ERROR_TEXT.to_string(),
            on_failure: FailurePolicy::default(),
        }
    }
}

/// A submitted message whose reply has not arrived yet.
///
/// Produced by [`ChatWidget::submit`] and consumed by
/// [`ChatWidget::complete`]. It owns its placeholder, so the reply always
/// lands where this message's placeholder was, even when several sends
/// overlap.
#[derive(Debug)]
pub struct PendingExchange {
    id: Uuid,
    request: ChatRequest,
    user_bubble: BubbleId,
    placeholder: BubbleId,
}

impl PendingExchange {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn message(&self) -> &str {
        &self.request.message
    }

    pub fn user_bubble(&self) -> BubbleId {
        self.user_bubble
    }

    pub fn placeholder(&self) -> BubbleId {
        self.placeholder
    }
}

/// Counts of how the sends of one [`ChatWidget::run`] ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Clicks with blank input.
    pub ignored: usize,
    /// Sends that displayed a reply.
    pub replied: usize,
    /// Sends whose transport call failed.
    pub failed: usize,
    /// Sends still waiting when shutdown fired.
    pub cancelled: usize,
}

/// Chat widget bound to a message list, a text input and a transport.
///
/// # Example
///
/// ```rust,no_run
/// use wanderwise_chat::transport::HttpChatTransport;
/// use wanderwise_chat::widget::{ChatContainer, ChatWidget, TextInput};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let container = ChatContainer::new();
/// let input = TextInput::new();
/// let widget = ChatWidget::new(
///     container.clone(),
///     input.clone(),
///     HttpChatTransport::new("http://127.0.0.1:5001")?,
/// );
///
/// input.set_value("Somewhere warm in March?");
/// widget.send_current_message().await?;
/// println!("{}", container.to_html());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ChatWidget<T> {
    container: ChatContainer,
    input: TextInput,
    transport: T,
    options: WidgetOptions,
}

impl<T: ChatTransport> ChatWidget<T> {
    pub fn new(container: ChatContainer, input: TextInput, transport: T) -> Self {
        Self {
            container,
            input,
            transport,
            options: WidgetOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: WidgetOptions) -> Self {
        self.options = options;
        self
    }

    pub fn container(&self) -> &ChatContainer {
        &self.container
    }

    pub fn input(&self) -> &TextInput {
        &self.input
    }

    pub fn options(&self) -> &WidgetOptions {
        &self.options
    }

    /// Append a message bubble styled for its origin and scroll it into view.
    pub fn append_bubble(&self, text: impl Into<String>, is_user: bool) -> BubbleId {
        let role = if is_user { Role::User } else { Role::Assistant };
        self.container.append(role, BubbleKind::Message, text)
    }

    /// Synchronous half of a send.
    ///
    /// Trims the input; if nothing is left, returns `None` and touches
    /// nothing. Otherwise shows the user bubble, clears the input and shows
    /// a placeholder.
    pub fn submit(&self) -> Option<PendingExchange> {
        let Some(request) = ChatRequest::from_input(&self.input.value()) else {
            debug!(name: "chat.send.ignored", "Blank input, nothing to send");
            return None;
        };

        let user_bubble = self.append_bubble(request.message.clone(), true);
        self.input.clear();
        let placeholder = self.container.append(
            Role::Assistant,
            BubbleKind::Placeholder,
            self.options.placeholder_text.clone(),
        );

        let exchange = PendingExchange {
            id: Uuid::new_v4(),
            request,
            user_bubble,
            placeholder,
        };
        info!(
            name: "chat.send.started",
            exchange = %exchange.id,
            chars = exchange.request.message.chars().count(),
            "Message submitted"
        );
        Some(exchange)
    }

    /// Asynchronous half of a send: call the backend and settle the
    /// exchange's placeholder.
    #[instrument(skip_all, fields(exchange = %exchange.id))]
    pub async fn complete(&self, exchange: PendingExchange) -> Result<BubbleId> {
        match self.transport.send(&exchange.request).await {
            Ok(response) => {
                let reply =
                    self.settle(exchange.placeholder, BubbleKind::Message, response.reply);
                info!(name: "chat.send.completed", bubble = %reply, "Reply displayed");
                Ok(reply)
            }
            Err(err) => {
                self.fail(exchange.placeholder, &err);
                Err(err)
            }
        }
    }

    /// Send whatever the input holds and display the reply.
    ///
    /// Returns `Ok(None)` for blank input, otherwise the reply bubble's id.
    pub async fn send_current_message(&self) -> Result<Option<BubbleId>> {
        let Some(exchange) = self.submit() else {
            return Ok(None);
        };
        self.complete(exchange).await.map(Some)
    }

    /// Drive the widget from a click stream until it ends or `shutdown`
    /// fires.
    ///
    /// Each click submits immediately; replies are awaited concurrently.
    /// When the stream ends, sends in flight are allowed to finish. On
    /// shutdown they are dropped and settled under the failure policy as
    /// [`ChatError::Cancelled`].
    pub async fn run<S>(&self, mut clicks: S, shutdown: CancellationToken) -> RunSummary
    where
        S: Stream<Item = Click> + Unpin,
    {
        let mut summary = RunSummary::default();
        let mut waiting = HashSet::new();
        let mut in_flight: FuturesUnordered<BoxFuture<'_, (BubbleId, Result<BubbleId>)>> =
            FuturesUnordered::new();
        let mut clicks_done = false;
        let mut cancelled = false;

        loop {
            tokio::select! {
                biased;

                () = shutdown.cancelled() => {
                    cancelled = true;
                    break;
                }
                Some((placeholder, result)) = in_flight.next(), if !in_flight.is_empty() => {
                    waiting.remove(&placeholder);
                    match result {
                        Ok(_) => summary.replied += 1,
                        Err(_) => summary.failed += 1,
                    }
                }
                click = clicks.next(), if !clicks_done => match click {
                    Some(Click) => match self.submit() {
                        Some(exchange) => {
                            let placeholder = exchange.placeholder();
                            waiting.insert(placeholder);
                            in_flight.push(
                                async move { (placeholder, self.complete(exchange).await) }
                                    .boxed(),
                            );
                        }
                        None => summary.ignored += 1,
                    },
                    None => clicks_done = true,
                },
            }

            if clicks_done && in_flight.is_empty() {
                break;
            }
        }

        drop(in_flight);
        if cancelled {
            let err = ChatError::Cancelled;
            for placeholder in waiting {
                self.fail(placeholder, &err);
                summary.cancelled += 1;
            }
        }

        info!(
            name: "chat.run.finished",
            replied = summary.replied,
            failed = summary.failed,
            ignored = summary.ignored,
            cancelled = summary.cancelled,
            "Chat loop finished"
        );
        summary
    }

    /// Swap `placeholder` for a settled assistant bubble. If the placeholder
    /// has been removed meanwhile, the bubble is appended instead.
    fn settle(&self, placeholder: BubbleId, kind: BubbleKind, text: String) -> BubbleId {
        self.container
            .replace(placeholder, Role::Assistant, kind, text.clone())
            .unwrap_or_else(|| {
                debug!(
                    name: "chat.placeholder.missing",
                    placeholder = %placeholder,
                    "Placeholder gone, appending reply"
                );
                self.container.append(Role::Assistant, kind, text)
            })
    }

    fn fail(&self, placeholder: BubbleId, err: &ChatError) {
        warn!(name: "chat.send.failed", error = %err, "Chat request failed");
        match self.options.on_failure {
            FailurePolicy::ErrorBubble => {
                self.settle(placeholder, BubbleKind::Error, self.options.error_text.clone());
            }
            FailurePolicy::KeepPlaceholder => {}
        }
    }
}
