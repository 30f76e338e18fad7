//! WanderWise chat terminal
//!
//! Entry point: binds the chat widget to stdin/stdout and a `/chat` backend.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use anyhow::Context;
use dotenvy::dotenv;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use wanderwise_chat::config::AppConfig;
use wanderwise_chat::telemetry;
use wanderwise_chat::terminal::{echo_events, line_clicks};
use wanderwise_chat::transport::HttpChatTransport;
use wanderwise_chat::widget::{ChatContainer, ChatWidget, TextInput};

/// Exit code used when the session is interrupted.
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present)
    let _ = dotenv();

    let config = AppConfig::load().context("Configuration error")?;
    telemetry::init(&config.logging).context("Failed to initialise logging")?;

    let transport = HttpChatTransport::from_config(&config.endpoint)
        .context("Invalid chat endpoint")?;

    info!(
        name: "chat.config.loaded",
        endpoint = %transport.endpoint(),
        timeout_secs = config.endpoint.timeout_secs,
        "Chat configuration loaded"
    );

    let container = ChatContainer::new();
    let input = TextInput::new();
    let widget = ChatWidget::new(container.clone(), input.clone(), transport)
        .with_options(config.widget.clone());

    println!(
        "Chatting with {}. Type a message and press Enter; Ctrl-D to quit.",
        config.endpoint.base_url
    );

    let shutdown = CancellationToken::new();
    let stop_echo = CancellationToken::new();
    let echo = tokio::spawn(echo_events(
        container.subscribe(),
        tokio::io::stdout(),
        stop_echo.clone(),
    ));

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!(name: "chat.interrupted", "Interrupt received, shutting down");
                shutdown.cancel();
            }
        }
    });

    let clicks = line_clicks(BufReader::new(tokio::io::stdin()), input);
    let summary = widget.run(clicks, shutdown.clone()).await;

    stop_echo.cancel();
    match echo.await {
        Ok(Err(err)) => warn!(name: "terminal.write.failed", error = %err, "Failed to write output"),
        Err(err) => warn!(name: "terminal.echo.panicked", error = %err, "Output task failed"),
        Ok(Ok(())) => {}
    }

    info!(
        name: "chat.session.ended",
        replied = summary.replied,
        failed = summary.failed,
        "Chat session ended"
    );

    if shutdown.is_cancelled() {
        // Blocking stdin reads would otherwise hold the runtime open.
        std::process::exit(INTERRUPTED_EXIT_CODE);
    }
    Ok(())
}
