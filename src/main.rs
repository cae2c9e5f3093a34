//! Todo Bot - Telegram to-do list backed by Google Sheets
//!
//! Each user's todos live as rows in the `Todos` sheet. Conversations are
//! driven by a small per-user state machine over inline-keyboard buttons
//! and follow-up text messages.

mod bot;
mod config;
mod runtime;
mod session;
mod sheets;
mod store;
mod telegram;
mod ui;

#[cfg(test)]
mod testing;

use bot::Dispatcher;
use config::Config;
use runtime::BotRuntime;
use session::InMemorySessions;
use sheets::{A1Range, SheetsClient, TokenProvider};
use std::sync::Arc;
use store::SheetTodoStore;
use telegram::TelegramClient;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const TODO_SHEET: &str = "Todos";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_bot=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = Config::from_env()?;
    let auth = TokenProvider::new(config.load_credentials()?)?;
    let service_account = config
        .service_account_email
        .clone()
        .unwrap_or_else(|| auth.client_email().to_string());

    let client = Arc::new(SheetsClient::new(&config.spreadsheet_id, auth)?);
    let range = A1Range::new(TODO_SHEET);

    tracing::info!(spreadsheet_id = %config.spreadsheet_id, "Checking spreadsheet");
    if let Err(e) =
        sheets::initialize(&client, &config.spreadsheet_id, &range, &service_account).await
    {
        tracing::error!(error = %e, "Spreadsheet setup failed");
        eprintln!("\n{e}\n");
        std::process::exit(1);
    }

    let store = SheetTodoStore::new(client, range);
    let dispatcher = Dispatcher::new(store, InMemorySessions::new());
    let transport = TelegramClient::new(&config.bot_token, &config.telegram_api_base)?;
    let runtime = BotRuntime::new(transport, dispatcher);

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                return;
            }
            tracing::info!("Shutting down");
            cancel.cancel();
        }
    });

    tracing::info!("Bot is running");
    runtime.run(cancel).await;
    Ok(())
}
