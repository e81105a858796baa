use chrono::{DateTime, Utc};
use teloxide::{
    payloads::{GetUpdatesSetters, SendMessageSetters},
    prelude::Requester,
    types::{self as tg, ChatId, InlineKeyboardMarkup},
    Bot,
};
use tracing::instrument;

use crate::error::TransportError;

/// One event from the platform, reduced to what the quiz cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub id: u32,
    pub kind: UpdateKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateKind {
    Message {
        chat_id: ChatId,
        date: DateTime<Utc>,
        text: Option<String>,
    },
    Callback {
        id: String,
        chat_id: ChatId,
        data: Option<String>,
    },
    Other,
}

impl From<tg::Update> for Update {
    fn from(update: tg::Update) -> Self {
        let kind = match update.kind {
            tg::UpdateKind::Message(msg) => UpdateKind::Message {
                chat_id: msg.chat.id,
                date: msg.date,
                text: msg.text().map(ToOwned::to_owned),
            },
            // Replies go to the user who pressed the button.
            tg::UpdateKind::CallbackQuery(q) => UpdateKind::Callback {
                id: q.id,
                chat_id: q.from.id.into(),
                data: q.data,
            },
            _ => UpdateKind::Other,
        };

        Self {
            id: update.id.0,
            kind,
        }
    }
}

/// Everything the bot needs from the messaging platform.
#[allow(async_fn_in_trait)]
pub trait Gateway {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), TransportError>;

    async fn acknowledge_callback(&self, callback_id: &str) -> Result<(), TransportError>;

    /// Updates with ids at or after `cursor`. Failures come back as an empty batch.
    async fn fetch_updates(&self, cursor: Option<i32>) -> Vec<Update>;
}

pub struct TelegramGateway {
    bot: Bot,
    poll_timeout: u32,
}

impl TelegramGateway {
    pub fn new(bot: Bot, poll_timeout: u32) -> Self {
        Self { bot, poll_timeout }
    }
}

impl Gateway for TelegramGateway {
    #[instrument(level = "debug", skip(self, keyboard))]
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), TransportError> {
        let request = self.bot.send_message(chat_id, text);
        match keyboard {
            Some(markup) => request.reply_markup(markup).await?,
            None => request.await?,
        };
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    async fn acknowledge_callback(&self, callback_id: &str) -> Result<(), TransportError> {
        self.bot.answer_callback_query(callback_id).await?;
        Ok(())
    }

    async fn fetch_updates(&self, cursor: Option<i32>) -> Vec<Update> {
        let mut request = self.bot.get_updates().timeout(self.poll_timeout);
        if let Some(offset) = cursor {
            request = request.offset(offset);
        }

        match request.await {
            Ok(updates) => updates.into_iter().map(Update::from).collect(),
            Err(e) => {
                tracing::error!("Failed to fetch updates: {}", e);
                Vec::new()
            }
        }
    }
}
