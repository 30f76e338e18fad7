//! Terminal host: binds the widget to stdin and stdout.
//!
//! Every line read sets the input and presses send. Container changes are
//! echoed as they happen, so a placeholder shows up as its own line and the
//! reply follows once it arrives.

use futures::Stream;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::widget::{Bubble, BubbleKind, Click, ContainerEvent, Role, TextInput};

const USER_LABEL: &str = "you";
const ASSISTANT_LABEL: &str = "wanderwise";

/// One bubble as a terminal line. Continuation lines are indented under the
/// label.
pub fn format_bubble(bubble: &Bubble) -> String {
    let (label, marker) = match (bubble.role, bubble.kind) {
        (Role::User, _) => (USER_LABEL, '›'),
        (Role::Assistant, BubbleKind::Message) => (ASSISTANT_LABEL, '›'),
        (Role::Assistant, BubbleKind::Placeholder) => (ASSISTANT_LABEL, '…'),
        (Role::Assistant, BubbleKind::Error) => (ASSISTANT_LABEL, '!'),
    };
    let separator = format!("\n{}", " ".repeat(label.chars().count() + 3));
    let body = bubble.text.lines().collect::<Vec<_>>().join(separator.as_str());
    format!("{label} {marker} {body}")
}

/// Terminal rendering of a container change, if it shows anything.
pub fn format_event(event: &ContainerEvent) -> Option<String> {
    match event {
        ContainerEvent::Appended(bubble) | ContainerEvent::Replaced { new: bubble, .. } => {
            Some(format_bubble(bubble))
        }
        ContainerEvent::Removed(_) => None,
    }
}

/// Turn each line of `reader` into a click, loading the line into `input`
/// first. The stream ends at EOF or on a read error.
pub fn line_clicks<R>(reader: R, input: TextInput) -> impl Stream<Item = Click> + Unpin
where
    R: AsyncBufRead + Unpin,
{
    Box::pin(futures::stream::unfold(
        (reader.lines(), input),
        |(mut lines, input)| async move {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    input.set_value(line);
                    Some((Click, (lines, input)))
                }
                Ok(None) => None,
                Err(err) => {
                    warn!(name: "terminal.read.failed", error = %err, "Failed to read input");
                    None
                }
            }
        },
    ))
}

/// Write container changes to `out` until `stop` fires, then flush whatever
/// is still queued.
pub async fn echo_events<W>(
    mut events: broadcast::Receiver<ContainerEvent>,
    mut out: W,
    stop: CancellationToken,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    loop {
        tokio::select! {
            biased;

            event = events.recv() => match event {
                Ok(event) => write_event(&mut out, &event).await?,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(name: "terminal.events.lagged", skipped, "Dropped chat updates");
                }
                Err(RecvError::Closed) => break,
            },
            () = stop.cancelled() => {
                while let Ok(event) = events.try_recv() {
                    write_event(&mut out, &event).await?;
                }
                break;
            }
        }
    }
    out.flush().await
}

async fn write_event<W>(out: &mut W, event: &ContainerEvent) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    if let Some(line) = format_event(event) {
        out.write_all(line.as_bytes()).await?;
        out.write_all(b"\n").await?;
        out.flush().await?;
    }
    Ok(())
}
