#![deny(clippy::implicit_return)]
#![allow(clippy::needless_return)]

mod application;
mod configuration;
mod domain;
mod infrastructure;

use std::env;
use std::process;

use anyhow::bail;
use anyhow::Error;
use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task;
use yansi::Paint;

use crate::application::cli;
use crate::application::login;
use crate::application::ui;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Action;
use crate::domain::models::AssistantApi;
use crate::domain::models::Event;
use crate::domain::models::SessionContext;
use crate::domain::services::actions::ActionsService;
use crate::domain::services::AuthGate;
use crate::domain::services::ConversationDriver;
use crate::infrastructure::assistants::openai::OpenAIAssistant;

fn handle_error(err: Error) {
    eprintln!(
            "{}",
            Paint::red(format!(
                "Oh no! Muesli has failed with the following app version and error.\n\nVersion: {}\nCommit: {}\nError: {}",
                env!("CARGO_PKG_VERSION"),
                env!("VERGEN_GIT_DESCRIBE"),
                err
            ))
        );

    let backtrace = err.backtrace();
    if backtrace.to_string() == "disabled backtrace" {
        let args = env::args().collect::<Vec<String>>().join(" ");
        eprintln!("\nRunning the following can help explain further what the issue is:");
        eprintln!("\nRUST_BACKTRACE=1 {args}");
    } else {
        eprintln!("\n{}", backtrace);
    }

    process::exit(1);
}

/// Builds the driver and logs the user in. The health check outcome is
/// returned as a notice for the chat screen instead of failing startup.
async fn prepare() -> Result<(SessionContext, ConversationDriver, Option<String>)> {
    let credentials = Config::credentials();
    if credentials.is_empty() {
        bail!(format!(
            "No credentials are configured, nobody could log in. Add a [credentials] table to {}",
            Config::get(ConfigKey::ConfigFile)
        ));
    }
    tracing::debug!(users = credentials.len(), "Credentials loaded");
    if Config::get(ConfigKey::ApiKey).is_empty() {
        bail!("api-key is not set. Pass --api-key, set MUESLI_API_KEY or add it to the config file.");
    }
    if Config::get(ConfigKey::AssistantID).is_empty() {
        bail!("assistant-id is not set. Pass --assistant-id, set MUESLI_ASSISTANT_ID or add it to the config file.");
    }

    let assistant = OpenAIAssistant::from_config()?;
    let mut notice = None;
    if let Err(err) = assistant.health_check().await {
        tracing::warn!(error = %err, "Assistant service health check failed");
        notice = Some(format!(
            "Hey, it looks like the assistant service at {} isn't reachable. Messages may fail until it is.\n\nError: {err}",
            Config::get(ConfigKey::ApiURL)
        ));
    }

    let driver = ConversationDriver::from_config(Box::new(assistant))?;

    let mut session = SessionContext::new(&Config::get(ConfigKey::Greeting));
    login::start(&AuthGate::new(credentials), &mut session)?;

    return Ok((session, driver, notice));
}

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        ui::destruct_terminal_for_panic();
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    let debug_log_dir = env::var("MUESLI_LOG_DIR").unwrap_or_else(|_| {
        return cli::log_path()
            .parent()
            .map(|dir| return dir.to_string_lossy().to_string())
            .unwrap_or_default();
    });

    let file_appender = tracing_appender::rolling::never(debug_log_dir, "debug.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    if env::var("RUST_LOG")
        .unwrap_or_else(|_| return "".to_string())
        .contains("muesli")
    {
        tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(writer)
            .init();
    }

    match cli::parse().await {
        Ok(true) => {}
        Ok(false) => process::exit(0),
        Err(err) => {
            handle_error(err);
            return;
        }
    }

    let (session, driver, notice) = match prepare().await {
        Ok(res) => res,
        Err(err) => {
            handle_error(err);
            return;
        }
    };

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();

    let mut background_futures = task::JoinSet::new();
    background_futures.spawn(async move {
        return ActionsService::start(driver, event_tx, &mut action_rx).await;
    });

    let ui_future = ui::start(session, notice, action_tx, event_rx);

    let res = tokio::select!(
        res = background_futures.join_next() => match res {
            Some(Ok(res)) => res,
            Some(Err(err)) => Err(err.into()),
            None => Ok(()),
        },
        res = ui_future => res,
    );

    if let Err(err) = res {
        ui::destruct_terminal_for_panic();
        handle_error(err);
    }

    process::exit(0);
}
