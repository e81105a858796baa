use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::{
    commands::Command,
    config::Settings,
    gateway::{Gateway, Update, UpdateKind},
    question::LoadQuestions,
    runner,
    session::SessionRegistry,
};

/// Owns the polling cursor and every session; handles one update at a time.
pub struct Dispatcher<G, S> {
    gateway: G,
    store: S,
    registry: SessionRegistry,
    cursor: Option<i32>,
    bot_name: String,
    stale_after: chrono::Duration,
    poll_interval: Duration,
}

impl<G: Gateway, S: LoadQuestions> Dispatcher<G, S> {
    pub fn new(gateway: G, store: S, settings: &Settings) -> Self {
        Self {
            gateway,
            store,
            registry: SessionRegistry::new(),
            cursor: None,
            bot_name: String::new(),
            stale_after: settings.stale_after,
            poll_interval: settings.poll_interval,
        }
    }

    /// Username used to accept `/quiz@name` style commands.
    pub fn with_bot_name(mut self, bot_name: impl Into<String>) -> Self {
        self.bot_name = bot_name.into();
        self
    }

    pub fn cursor(&self) -> Option<i32> {
        self.cursor
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Polls forever. Transport trouble only ever costs one cycle.
    pub async fn run(&mut self) {
        tracing::info!("Polling for updates...");
        loop {
            let handled = self.poll_once(Utc::now()).await;
            if handled > 0 {
                tracing::debug!("handled {} updates, cursor at {:?}", handled, self.cursor);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Fetches one batch and handles it in arrival order. Returns the batch size.
    pub async fn poll_once(&mut self, now: DateTime<Utc>) -> usize {
        let updates = self.gateway.fetch_updates(self.cursor).await;
        let count = updates.len();
        for update in updates {
            self.cursor = Some(next_offset(update.id));
            self.handle_update(update, now).await;
        }
        count
    }

    #[instrument(level = "debug", skip(self, update, now), fields(update_id = update.id))]
    pub async fn handle_update(&mut self, update: Update, now: DateTime<Utc>) {
        match update.kind {
            UpdateKind::Message {
                chat_id,
                date,
                text,
            } => {
                let cutoff = now.checked_sub_signed(self.stale_after);
                if cutoff.is_some_and(|cutoff| date < cutoff) {
                    tracing::debug!("{}: skipping stale message from {}", chat_id, date);
                    return;
                }
                let Some(text) = text else {
                    return;
                };

                match Command::from_text(&text, &self.bot_name) {
                    Some(Command::Start) => runner::greet(&self.gateway, chat_id).await,
                    Some(Command::Quiz) => {
                        runner::start_quiz(&self.gateway, &self.store, &mut self.registry, chat_id)
                            .await
                    }
                    None => tracing::debug!("{}: ignoring '{}'", chat_id, text),
                }
            }
            UpdateKind::Callback { id, chat_id, data } => {
                runner::take_answer(
                    &self.gateway,
                    &mut self.registry,
                    chat_id,
                    &id,
                    data.as_deref(),
                )
                .await
            }
            UpdateKind::Other => tracing::debug!("ignoring unsupported update"),
        }
    }
}

fn next_offset(update_id: u32) -> i32 {
    i32::try_from(update_id).map_or(i32::MAX, |id| id.saturating_add(1))
}
