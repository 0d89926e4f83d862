use std::collections::HashMap;

use tokio::sync::RwLock;

use crewdesk_core::domain::fields::FieldId;
use crewdesk_core::flows::OnboardingStep;

/// What the bot is currently waiting for in one chat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatState {
    Onboarding(OnboardingStep),
    EditingField(FieldId),
    AwaitingSearchQuery,
    AwaitingAdminGrant,
    AwaitingAdminRevoke,
    AwaitingNoteAdd,
    AwaitingNoteRemove,
}

#[derive(Clone, Debug, Default)]
struct DialogueSession {
    state: Option<ChatState>,
    last_bot_message_id: Option<i64>,
}

/// Per-chat conversation state, keyed by chat id. State lives here and
/// nowhere else, so concurrent dialogues never observe each other.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<i64, DialogueSession>>,
}

impl SessionStore {
    pub async fn state(&self, chat_id: i64) -> Option<ChatState> {
        self.sessions.read().await.get(&chat_id).and_then(|session| session.state)
    }

    pub async fn set_state(&self, chat_id: i64, state: ChatState) {
        self.sessions.write().await.entry(chat_id).or_default().state = Some(state);
    }

    pub async fn clear_state(&self, chat_id: i64) {
        if let Some(session) = self.sessions.write().await.get_mut(&chat_id) {
            session.state = None;
        }
    }

    /// Remember the id of the last menu-bearing bot message so the next
    /// interaction can delete it and keep the chat tidy.
    pub async fn set_last_message(&self, chat_id: i64, message_id: i64) {
        self.sessions.write().await.entry(chat_id).or_default().last_bot_message_id =
            Some(message_id);
    }

    /// Take (and forget) the previously tracked bot message id.
    pub async fn take_last_message(&self, chat_id: i64) -> Option<i64> {
        self.sessions
            .write()
            .await
            .get_mut(&chat_id)
            .and_then(|session| session.last_bot_message_id.take())
    }
}

#[cfg(test)]
mod tests {
    use crewdesk_core::flows::OnboardingStep;

    use super::{ChatState, SessionStore};

    #[tokio::test]
    async fn state_is_isolated_per_chat() {
        let store = SessionStore::default();
        store.set_state(1, ChatState::Onboarding(OnboardingStep::FullName)).await;
        store.set_state(2, ChatState::AwaitingSearchQuery).await;

        assert_eq!(store.state(1).await, Some(ChatState::Onboarding(OnboardingStep::FullName)));
        assert_eq!(store.state(2).await, Some(ChatState::AwaitingSearchQuery));
        assert_eq!(store.state(3).await, None);

        store.clear_state(1).await;
        assert_eq!(store.state(1).await, None);
        assert_eq!(store.state(2).await, Some(ChatState::AwaitingSearchQuery));
    }

    #[tokio::test]
    async fn last_message_is_taken_once() {
        let store = SessionStore::default();
        store.set_last_message(9, 1234).await;
        assert_eq!(store.take_last_message(9).await, Some(1234));
        assert_eq!(store.take_last_message(9).await, None);
    }
}
