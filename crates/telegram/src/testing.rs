//! Shared doubles for handler tests.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crewdesk_db::{
    InMemoryAdminRepository, InMemoryPersonnelRepository, InMemoryReferenceRepository,
};

use crate::api::{ApiError, BotApi, OutgoingMessage};
use crate::events::{
    BotEvent, CallbackEvent, CommandEvent, TextEvent, UpdateEnvelope,
};
use crate::handlers::BotContext;
use crate::keyboards::ReplyMarkup;

#[derive(Default)]
struct RecordingState {
    sent: Vec<OutgoingMessage>,
    edited: Vec<String>,
    answered: Vec<String>,
    next_message_id: i64,
}

/// Captures every outgoing Bot API call.
#[derive(Default)]
pub struct RecordingBotApi {
    state: Mutex<RecordingState>,
}

impl RecordingBotApi {
    pub async fn sent_texts(&self) -> Vec<String> {
        self.state.lock().await.sent.iter().map(|message| message.text.clone()).collect()
    }

    pub async fn edited_texts(&self) -> Vec<String> {
        self.state.lock().await.edited.clone()
    }

    pub async fn answered(&self) -> Vec<String> {
        self.state.lock().await.answered.clone()
    }
}

#[async_trait]
impl BotApi for RecordingBotApi {
    async fn send_message(&self, message: OutgoingMessage) -> Result<i64, ApiError> {
        let mut state = self.state.lock().await;
        state.next_message_id += 1;
        state.sent.push(message);
        Ok(state.next_message_id)
    }

    async fn edit_message_text(
        &self,
        _chat_id: i64,
        _message_id: i64,
        text: &str,
        _reply_markup: Option<ReplyMarkup>,
    ) -> Result<(), ApiError> {
        self.state.lock().await.edited.push(text.to_owned());
        Ok(())
    }

    async fn delete_message(&self, _chat_id: i64, _message_id: i64) -> Result<(), ApiError> {
        Ok(())
    }

    async fn answer_callback(&self, callback_query_id: &str) -> Result<(), ApiError> {
        self.state.lock().await.answered.push(callback_query_id.to_owned());
        Ok(())
    }
}

pub struct TestContext {
    pub ctx: Arc<BotContext>,
    pub api: Arc<RecordingBotApi>,
    pub reference: Arc<InMemoryReferenceRepository>,
}

pub async fn test_context(root_admin_id: i64) -> TestContext {
    let api = Arc::new(RecordingBotApi::default());
    let reference = Arc::new(InMemoryReferenceRepository::default());
    let ctx = BotContext::new(
        api.clone(),
        Arc::new(InMemoryPersonnelRepository::default()),
        Arc::new(InMemoryAdminRepository::default()),
        reference.clone(),
        root_admin_id,
    );
    TestContext { ctx, api, reference }
}

pub fn command_envelope(chat_id: i64, user_id: i64, command: &str, args: &str) -> UpdateEnvelope {
    UpdateEnvelope {
        update_id: 1,
        event: BotEvent::Command(CommandEvent {
            chat_id,
            user_id,
            username: None,
            command: command.to_owned(),
            args: args.to_owned(),
        }),
    }
}

pub fn text_envelope(chat_id: i64, user_id: i64, text: &str) -> UpdateEnvelope {
    UpdateEnvelope {
        update_id: 1,
        event: BotEvent::Text(TextEvent {
            chat_id,
            user_id,
            username: None,
            text: text.to_owned(),
        }),
    }
}

pub fn callback_envelope(chat_id: i64, user_id: i64, data: &str) -> UpdateEnvelope {
    UpdateEnvelope {
        update_id: 1,
        event: BotEvent::Callback(CallbackEvent {
            chat_id,
            user_id,
            callback_id: "cb-1".to_owned(),
            message_id: 50,
            data: data.to_owned(),
        }),
    }
}
