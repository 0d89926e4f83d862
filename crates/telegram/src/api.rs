use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::keyboards::ReplyMarkup;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bot api request failed: {0}")]
    Http(String),
    #[error("bot api rejected the call: {0}")]
    Rejected(String),
}

/// One outgoing chat message. HTML parse mode throughout, matching the
/// formatting the renderers produce.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OutgoingMessage {
    pub chat_id: i64,
    pub text: String,
    pub parse_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
}

impl OutgoingMessage {
    pub fn new(chat_id: i64, text: impl Into<String>) -> Self {
        Self { chat_id, text: text.into(), parse_mode: "HTML", reply_markup: None }
    }

    pub fn with_markup(mut self, markup: ReplyMarkup) -> Self {
        self.reply_markup = Some(markup);
        self
    }
}

/// Outgoing side of the Bot API. Handlers depend on this seam; tests swap in
/// a recording double, the server wires [`HttpBotApi`].
#[async_trait]
pub trait BotApi: Send + Sync {
    /// Returns the id of the sent message (used for menu cleanup).
    async fn send_message(&self, message: OutgoingMessage) -> Result<i64, ApiError>;

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        reply_markup: Option<ReplyMarkup>,
    ) -> Result<(), ApiError>;

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), ApiError>;

    async fn answer_callback(&self, callback_query_id: &str) -> Result<(), ApiError>;
}

/// Discards every call. Keeps the runner wirable without credentials.
#[derive(Default)]
pub struct NoopBotApi;

#[async_trait]
impl BotApi for NoopBotApi {
    async fn send_message(&self, _message: OutgoingMessage) -> Result<i64, ApiError> {
        Ok(0)
    }

    async fn edit_message_text(
        &self,
        _chat_id: i64,
        _message_id: i64,
        _text: &str,
        _reply_markup: Option<ReplyMarkup>,
    ) -> Result<(), ApiError> {
        Ok(())
    }

    async fn delete_message(&self, _chat_id: i64, _message_id: i64) -> Result<(), ApiError> {
        Ok(())
    }

    async fn answer_callback(&self, _callback_query_id: &str) -> Result<(), ApiError> {
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
}

#[derive(Debug, Serialize)]
struct EditMessagePayload<'a> {
    chat_id: i64,
    message_id: i64,
    text: &'a str,
    parse_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<ReplyMarkup>,
}

#[derive(Debug, Serialize)]
struct DeleteMessagePayload {
    chat_id: i64,
    message_id: i64,
}

#[derive(Debug, Serialize)]
struct AnswerCallbackPayload<'a> {
    callback_query_id: &'a str,
}

/// Bot API client over HTTPS.
pub struct HttpBotApi {
    client: reqwest::Client,
    base_url: String,
    bot_token: SecretString,
}

impl HttpBotApi {
    pub fn new(base_url: impl Into<String>, bot_token: SecretString) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.into(), bot_token }
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{method}",
            self.base_url.trim_end_matches('/'),
            self.bot_token.expose_secret()
        )
    }

    async fn call<P, T>(&self, method: &str, payload: &P) -> Result<T, ApiError>
    where
        P: Serialize + Sync,
        T: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(self.method_url(method))
            .json(payload)
            .send()
            .await
            .map_err(|error| ApiError::Http(error.to_string()))?;

        let body: ApiResponse<T> =
            response.json().await.map_err(|error| ApiError::Http(error.to_string()))?;

        if !body.ok {
            return Err(ApiError::Rejected(
                body.description.unwrap_or_else(|| format!("{method} failed")),
            ));
        }
        body.result.ok_or_else(|| ApiError::Rejected(format!("{method} returned no result")))
    }
}

#[async_trait]
impl BotApi for HttpBotApi {
    async fn send_message(&self, message: OutgoingMessage) -> Result<i64, ApiError> {
        let sent: SentMessage = self.call("sendMessage", &message).await?;
        Ok(sent.message_id)
    }

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        reply_markup: Option<ReplyMarkup>,
    ) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .call(
                "editMessageText",
                &EditMessagePayload { chat_id, message_id, text, parse_mode: "HTML", reply_markup },
            )
            .await?;
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), ApiError> {
        let _: serde_json::Value =
            self.call("deleteMessage", &DeleteMessagePayload { chat_id, message_id }).await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_query_id: &str) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .call("answerCallbackQuery", &AnswerCallbackPayload { callback_query_id })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use crate::keyboards::{persistent_menu, ReplyMarkup};

    use super::{HttpBotApi, OutgoingMessage};

    #[test]
    fn method_url_embeds_token_and_method() {
        let api =
            HttpBotApi::new("https://api.telegram.org/", SecretString::from("42:secret".to_owned()));
        assert_eq!(api.method_url("sendMessage"), "https://api.telegram.org/bot42:secret/sendMessage");
    }

    #[test]
    fn outgoing_message_serializes_without_empty_markup() {
        let bare = serde_json::to_value(OutgoingMessage::new(1, "привет")).expect("serialize");
        assert!(bare.get("reply_markup").is_none());
        assert_eq!(bare["parse_mode"], "HTML");

        let with_menu = serde_json::to_value(
            OutgoingMessage::new(1, "меню").with_markup(ReplyMarkup::Reply(persistent_menu(false))),
        )
        .expect("serialize");
        assert!(with_menu["reply_markup"]["keyboard"].is_array());
    }
}
