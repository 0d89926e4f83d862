use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Raw `getUpdates` item, trimmed to the parts the bot consumes.
#[derive(Clone, Debug, Deserialize)]
pub struct WireUpdate {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<WireMessage>,
    #[serde(default)]
    pub callback_query: Option<WireCallbackQuery>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WireMessage {
    pub message_id: i64,
    pub chat: WireChat,
    #[serde(default)]
    pub from: Option<WireUser>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WireChat {
    pub id: i64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WireUser {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WireCallbackQuery {
    pub id: String,
    pub from: WireUser,
    #[serde(default)]
    pub message: Option<WireMessage>,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateEnvelope {
    pub update_id: i64,
    pub event: BotEvent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BotEvent {
    Command(CommandEvent),
    Text(TextEvent),
    Callback(CallbackEvent),
    Unsupported { kind: String },
}

impl BotEvent {
    pub fn event_type(&self) -> BotEventType {
        match self {
            Self::Command(_) => BotEventType::Command,
            Self::Text(_) => BotEventType::Text,
            Self::Callback(_) => BotEventType::Callback,
            Self::Unsupported { .. } => BotEventType::Unsupported,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum BotEventType {
    Command,
    Text,
    Callback,
    Unsupported,
}

/// `/command args` message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandEvent {
    pub chat_id: i64,
    pub user_id: i64,
    pub username: Option<String>,
    pub command: String,
    pub args: String,
}

/// Plain dialogue text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextEvent {
    pub chat_id: i64,
    pub user_id: i64,
    pub username: Option<String>,
    pub text: String,
}

/// Inline-button press.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallbackEvent {
    pub chat_id: i64,
    pub user_id: i64,
    pub callback_id: String,
    pub message_id: i64,
    pub data: String,
}

/// Map a wire update onto a typed event. Anything the bot does not consume
/// becomes `Unsupported` and is acknowledged without handling.
pub fn envelope_from_wire(update: WireUpdate) -> UpdateEnvelope {
    let event = if let Some(callback) = update.callback_query {
        match (callback.message, callback.data) {
            (Some(message), Some(data)) => BotEvent::Callback(CallbackEvent {
                chat_id: message.chat.id,
                user_id: callback.from.id,
                callback_id: callback.id,
                message_id: message.message_id,
                data,
            }),
            _ => BotEvent::Unsupported { kind: "callback_query_without_payload".to_owned() },
        }
    } else if let Some(message) = update.message {
        match (message.from, message.text) {
            (Some(from), Some(text)) => {
                if let Some(stripped) = text.strip_prefix('/') {
                    let mut parts = stripped.splitn(2, char::is_whitespace);
                    let command = parts
                        .next()
                        .unwrap_or_default()
                        .split('@')
                        .next()
                        .unwrap_or_default()
                        .to_owned();
                    let args = parts.next().unwrap_or_default().trim().to_owned();
                    BotEvent::Command(CommandEvent {
                        chat_id: message.chat.id,
                        user_id: from.id,
                        username: from.username,
                        command,
                        args,
                    })
                } else {
                    BotEvent::Text(TextEvent {
                        chat_id: message.chat.id,
                        user_id: from.id,
                        username: from.username,
                        text,
                    })
                }
            }
            _ => BotEvent::Unsupported { kind: "message_without_text".to_owned() },
        }
    } else {
        BotEvent::Unsupported { kind: "unknown_update".to_owned() }
    };

    UpdateEnvelope { update_id: update.update_id, event }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Processed,
    Ignored,
}

#[derive(Debug, Error)]
pub enum EventHandlerError {
    #[error("bot api failure: {0}")]
    Api(#[from] crate::api::ApiError),
    #[error("store failure: {0}")]
    Store(#[from] crewdesk_db::RepositoryError),
    #[error("handler failure: {0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> BotEventType;
    async fn handle(
        &self,
        envelope: &UpdateEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<BotEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        envelope: &UpdateEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let Some(handler) = self.handlers.get(&envelope.event.event_type()) else {
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(envelope, ctx).await.map_err(DispatchError::from)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::{envelope_from_wire, BotEvent, WireChat, WireMessage, WireUpdate, WireUser};

    fn text_update(text: &str) -> WireUpdate {
        WireUpdate {
            update_id: 10,
            message: Some(WireMessage {
                message_id: 5,
                chat: WireChat { id: 77 },
                from: Some(WireUser { id: 77, username: Some("pilot".to_owned()) }),
                text: Some(text.to_owned()),
            }),
            callback_query: None,
        }
    }

    #[test]
    fn slash_messages_become_commands() {
        let envelope = envelope_from_wire(text_update("/start"));
        let BotEvent::Command(command) = envelope.event else {
            panic!("expected command event");
        };
        assert_eq!(command.command, "start");
        assert_eq!(command.args, "");
    }

    #[test]
    fn bot_suffix_and_args_are_split_off() {
        let envelope = envelope_from_wire(text_update("/user@crewdesk_bot 12345"));
        let BotEvent::Command(command) = envelope.event else {
            panic!("expected command event");
        };
        assert_eq!(command.command, "user");
        assert_eq!(command.args, "12345");
    }

    #[test]
    fn plain_text_stays_text() {
        let envelope = envelope_from_wire(text_update("Иванов Иван"));
        assert!(matches!(envelope.event, BotEvent::Text(_)));
    }

    #[test]
    fn updates_without_payload_are_unsupported() {
        let envelope = envelope_from_wire(WireUpdate {
            update_id: 1,
            message: None,
            callback_query: None,
        });
        assert!(matches!(envelope.event, BotEvent::Unsupported { .. }));
    }
}
