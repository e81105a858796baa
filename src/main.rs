use std::time::Duration;

use dotenvy::dotenv;
use quizbot::{
    commands::Command,
    config::Settings,
    dispatcher::Dispatcher,
    error::ConfigError,
    gateway::TelegramGateway,
    question::JsonFileStore,
};
use teloxide::{prelude::Requester, utils::command::BotCommands, Bot};
use tracing_subscriber::EnvFilter;

/// Headroom over the long-poll timeout before the HTTP client gives up.
const CLIENT_TIMEOUT_MARGIN: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() {
    dotenv().ok();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    init_tracing(&settings);

    let bot = match build_bot(&settings) {
        Ok(bot) => bot,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };
    tracing::info!("Starting bot...");

    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        tracing::warn!("Failed to register bot commands: {}", e);
    }
    let bot_name = match bot.get_me().await {
        Ok(me) => me.username().to_owned(),
        Err(e) => {
            tracing::warn!("Failed to fetch bot identity: {}", e);
            String::new()
        }
    };

    let store = JsonFileStore::new(settings.questions_path.clone());
    tracing::info!("Questions are read from {:?}", store.path());
    let gateway = TelegramGateway::new(bot, settings.poll_timeout);
    let mut dispatcher = Dispatcher::new(gateway, store, &settings).with_bot_name(bot_name);

    tokio::select! {
        _ = dispatcher.run() => {}
        _ = tokio::signal::ctrl_c() => tracing::info!("Received Ctrl-C, shutting down"),
    }
}

fn init_tracing(settings: &Settings) {
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("Failed to bridge log records: {e}");
    }
    // RUST_LOG, when set, refines LOG_LEVEL.
    let filter = EnvFilter::builder()
        .with_default_directive(settings.log_level.into())
        .from_env_lossy();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_line_number(true)
        .with_target(false)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install tracing subscriber: {e}");
    }
}

fn build_bot(settings: &Settings) -> Result<Bot, ConfigError> {
    let client = teloxide::net::default_reqwest_settings()
        .timeout(Duration::from_secs(settings.poll_timeout.into()) + CLIENT_TIMEOUT_MARGIN)
        .build()
        .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

    let bot = Bot::with_client(settings.token.clone(), client);
    Ok(match settings.api_url.clone() {
        Some(url) => bot.set_api_url(url),
        None => bot,
    })
}
