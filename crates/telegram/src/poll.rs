use std::{sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::events::{
    envelope_from_wire, DispatchError, EventContext, EventDispatcher, UpdateEnvelope, WireUpdate,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport request failed: {0}")]
    Request(String),
    #[error("transport response decode failed: {0}")]
    Decode(String),
    #[error("bot api rejected getUpdates: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum PollError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { max_retries: 5, base_delay_ms: 250, max_delay_ms: 5_000 }
    }
}

impl ReconnectPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

/// Incoming side of the Bot API. `fetch` long-polls starting at `offset`;
/// `Ok(None)` signals an orderly end of the stream (test doubles use it, the
/// HTTP transport never does).
#[async_trait]
pub trait UpdateTransport: Send + Sync {
    async fn fetch(&self, offset: i64) -> Result<Option<Vec<UpdateEnvelope>>, TransportError>;
}

#[derive(Default)]
pub struct NoopUpdateTransport;

#[async_trait]
impl UpdateTransport for NoopUpdateTransport {
    async fn fetch(&self, _offset: i64) -> Result<Option<Vec<UpdateEnvelope>>, TransportError> {
        Ok(None)
    }
}

#[derive(Debug, Serialize)]
struct GetUpdatesPayload {
    offset: i64,
    timeout: u64,
    allowed_updates: &'static [&'static str],
}

#[derive(Debug, Deserialize)]
struct GetUpdatesResponse {
    ok: bool,
    #[serde(default)]
    result: Vec<WireUpdate>,
    #[serde(default)]
    description: Option<String>,
}

/// Long-polling `getUpdates` transport.
pub struct HttpUpdateTransport {
    client: reqwest::Client,
    base_url: String,
    bot_token: SecretString,
    poll_timeout_secs: u64,
}

impl HttpUpdateTransport {
    pub fn new(
        base_url: impl Into<String>,
        bot_token: SecretString,
        poll_timeout_secs: u64,
    ) -> Self {
        let client = reqwest::Client::builder()
            // The HTTP timeout must outlive the long-poll hold time.
            .timeout(Duration::from_secs(poll_timeout_secs + 10))
            .build()
            .unwrap_or_default();
        Self { client, base_url: base_url.into(), bot_token, poll_timeout_secs }
    }
}

#[async_trait]
impl UpdateTransport for HttpUpdateTransport {
    async fn fetch(&self, offset: i64) -> Result<Option<Vec<UpdateEnvelope>>, TransportError> {
        let url = format!(
            "{}/bot{}/getUpdates",
            self.base_url.trim_end_matches('/'),
            self.bot_token.expose_secret()
        );

        let response = self
            .client
            .post(url)
            .json(&GetUpdatesPayload {
                offset,
                timeout: self.poll_timeout_secs,
                allowed_updates: &["message", "callback_query"],
            })
            .send()
            .await
            .map_err(|error| TransportError::Request(error.to_string()))?;

        let body: GetUpdatesResponse =
            response.json().await.map_err(|error| TransportError::Decode(error.to_string()))?;

        if !body.ok {
            return Err(TransportError::Rejected(
                body.description.unwrap_or_else(|| "getUpdates failed".to_owned()),
            ));
        }

        Ok(Some(body.result.into_iter().map(envelope_from_wire).collect()))
    }
}

/// Drives the long-poll loop: fetch a batch, dispatch each update, advance
/// the offset. Handler failures are logged and skipped; transport failures
/// reconnect with exponential backoff.
pub struct LongPollRunner {
    transport: Arc<dyn UpdateTransport>,
    dispatcher: EventDispatcher,
    reconnect_policy: ReconnectPolicy,
}

impl Default for LongPollRunner {
    fn default() -> Self {
        Self {
            transport: Arc::new(NoopUpdateTransport),
            dispatcher: EventDispatcher::default(),
            reconnect_policy: ReconnectPolicy::default(),
        }
    }
}

impl LongPollRunner {
    pub fn new(
        transport: Arc<dyn UpdateTransport>,
        dispatcher: EventDispatcher,
        reconnect_policy: ReconnectPolicy,
    ) -> Self {
        Self { transport, dispatcher, reconnect_policy }
    }

    pub async fn start(&self) -> Result<()> {
        let mut offset = 0_i64;

        for attempt in 0..=self.reconnect_policy.max_retries {
            match self.poll_loop(attempt, &mut offset).await {
                Ok(()) => return Ok(()),
                Err(transport_error) => {
                    warn!(
                        attempt,
                        max_retries = self.reconnect_policy.max_retries,
                        error = %transport_error,
                        "long poll transport failed"
                    );

                    if attempt >= self.reconnect_policy.max_retries {
                        warn!(
                            max_retries = self.reconnect_policy.max_retries,
                            "long poll retries exhausted; continuing process without crash"
                        );
                        return Ok(());
                    }

                    let delay = self.reconnect_policy.backoff(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Ok(())
    }

    async fn poll_loop(&self, attempt: u32, offset: &mut i64) -> Result<(), TransportError> {
        info!(attempt, offset = *offset, "starting long poll loop");

        loop {
            let Some(batch) = self.transport.fetch(*offset).await? else {
                info!(attempt, "update stream closed");
                return Ok(());
            };

            for envelope in batch {
                *offset = (*offset).max(envelope.update_id + 1);

                debug!(
                    event_name = "ingress.telegram.update_received",
                    update_id = envelope.update_id,
                    event_type = ?envelope.event.event_type(),
                    correlation_id = %envelope.update_id,
                    "received telegram update"
                );

                let context = EventContext { correlation_id: envelope.update_id.to_string() };
                if let Err(error) = self.dispatcher.dispatch(&envelope, &context).await {
                    warn!(
                        update_id = envelope.update_id,
                        correlation_id = %envelope.update_id,
                        error = %error,
                        "update dispatch failed; continuing poll loop"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use crate::events::{BotEvent, EventDispatcher, UpdateEnvelope};

    use super::{LongPollRunner, ReconnectPolicy, TransportError, UpdateTransport};

    #[derive(Default)]
    struct ScriptedTransport {
        state: Mutex<ScriptedState>,
    }

    #[derive(Default)]
    struct ScriptedState {
        batches: VecDeque<Result<Option<Vec<UpdateEnvelope>>, TransportError>>,
        offsets_seen: Vec<i64>,
    }

    impl ScriptedTransport {
        fn with_script(
            batches: Vec<Result<Option<Vec<UpdateEnvelope>>, TransportError>>,
        ) -> Self {
            Self {
                state: Mutex::new(ScriptedState { batches: batches.into(), offsets_seen: Vec::new() }),
            }
        }

        async fn offsets_seen(&self) -> Vec<i64> {
            self.state.lock().await.offsets_seen.clone()
        }
    }

    #[async_trait]
    impl UpdateTransport for ScriptedTransport {
        async fn fetch(
            &self,
            offset: i64,
        ) -> Result<Option<Vec<UpdateEnvelope>>, TransportError> {
            let mut state = self.state.lock().await;
            state.offsets_seen.push(offset);
            state.batches.pop_front().unwrap_or(Ok(None))
        }
    }

    fn envelope(update_id: i64) -> UpdateEnvelope {
        UpdateEnvelope { update_id, event: BotEvent::Unsupported { kind: "test".to_owned() } }
    }

    #[tokio::test]
    async fn offset_advances_past_every_processed_update() {
        let transport = Arc::new(ScriptedTransport::with_script(vec![
            Ok(Some(vec![envelope(7), envelope(8)])),
            Ok(Some(vec![envelope(9)])),
            Ok(None),
        ]));

        let runner = LongPollRunner::new(
            transport.clone(),
            EventDispatcher::default(),
            ReconnectPolicy { max_retries: 0, base_delay_ms: 0, max_delay_ms: 0 },
        );

        runner.start().await.expect("runner should not fail");
        assert_eq!(transport.offsets_seen().await, vec![0, 9, 10]);
    }

    #[tokio::test]
    async fn reconnects_after_transport_failure_keeping_the_offset() {
        let transport = Arc::new(ScriptedTransport::with_script(vec![
            Ok(Some(vec![envelope(3)])),
            Err(TransportError::Request("network down".to_owned())),
            Ok(Some(vec![envelope(4)])),
            Ok(None),
        ]));

        let runner = LongPollRunner::new(
            transport.clone(),
            EventDispatcher::default(),
            ReconnectPolicy { max_retries: 2, base_delay_ms: 0, max_delay_ms: 0 },
        );

        runner.start().await.expect("runner should not fail");
        // The retry resumes at offset 4, so update 3 is never re-fetched.
        assert_eq!(transport.offsets_seen().await, vec![0, 4, 4, 5]);
    }

    #[tokio::test]
    async fn exhausts_retries_without_crashing() {
        let transport = Arc::new(ScriptedTransport::with_script(vec![
            Err(TransportError::Request("fail-1".to_owned())),
            Err(TransportError::Request("fail-2".to_owned())),
            Err(TransportError::Request("fail-3".to_owned())),
        ]));

        let runner = LongPollRunner::new(
            transport.clone(),
            EventDispatcher::default(),
            ReconnectPolicy { max_retries: 2, base_delay_ms: 0, max_delay_ms: 0 },
        );

        runner.start().await.expect("runner should degrade gracefully");
        assert_eq!(transport.offsets_seen().await.len(), 3);
    }
}
