use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crewdesk_core::domain::fields::FieldId;
use crewdesk_core::domain::person::PersonId;

use crate::api::OutgoingMessage;
use crate::dialogue::ChatState;
use crate::events::{
    BotEvent, BotEventType, CallbackEvent, EventContext, EventHandler, EventHandlerError,
    HandlerResult, UpdateEnvelope,
};
use crate::keyboards::{
    admin_manage_menu, edit_menu, persistent_menu, InlineKeyboardButton, InlineKeyboardMarkup,
    ReplyMarkup, CB_ADMIN_ADD, CB_ADMIN_BACK, CB_ADMIN_INFO_ADD, CB_ADMIN_INFO_REMOVE,
    CB_ADMIN_LIST, CB_ADMIN_LIST_ALL, CB_ADMIN_MANAGE, CB_ADMIN_REMOVE, CB_ADMIN_STATS,
    CB_BACK_TO_PROFILE, CB_EDIT_PREFIX, CB_EDIT_START,
};

use super::BotContext;

pub struct CallbackHandler {
    ctx: Arc<BotContext>,
}

impl CallbackHandler {
    pub fn new(ctx: Arc<BotContext>) -> Self {
        Self { ctx }
    }

    async fn open_edit_menu(&self, event: &CallbackEvent) -> Result<(), EventHandlerError> {
        self.ctx
            .api
            .edit_message_text(
                event.chat_id,
                event.message_id,
                "✏️ Выберите параметр:",
                Some(ReplyMarkup::Inline(edit_menu())),
            )
            .await?;
        Ok(())
    }

    async fn choose_field(
        &self,
        event: &CallbackEvent,
        key: &str,
    ) -> Result<(), EventHandlerError> {
        let ctx = &self.ctx;
        let field = match FieldId::from_key(key) {
            Ok(field) => field,
            Err(error) => {
                // Unknown key in a stale keyboard; refuse rather than guess.
                warn!(key, error = %error, "rejected edit callback");
                return Ok(());
            }
        };

        ctx.sessions.set_state(event.chat_id, ChatState::EditingField(field)).await;

        let cancel = InlineKeyboardMarkup {
            inline_keyboard: vec![vec![InlineKeyboardButton::new("❌ Отмена", CB_BACK_TO_PROFILE)]],
        };
        ctx.api
            .edit_message_text(
                event.chat_id,
                event.message_id,
                &format!(
                    "✏️ Введите значение для: <b>{}</b>\nФормат: {}",
                    field.label(),
                    field.input_hint()
                ),
                Some(ReplyMarkup::Inline(cancel)),
            )
            .await?;
        Ok(())
    }

    async fn back_to_profile(&self, event: &CallbackEvent) -> Result<(), EventHandlerError> {
        self.ctx.sessions.clear_state(event.chat_id).await;
        self.ctx.show_profile(event.chat_id, PersonId(event.user_id)).await
    }

    async fn admin_stats(&self, event: &CallbackEvent) -> Result<(), EventHandlerError> {
        let ctx = &self.ctx;
        let all = ctx.personnel.list_all().await?;
        let onboarded = all.iter().filter(|record| record.onboarded).count();
        ctx.send_plain(
            event.chat_id,
            format!(
                "📊 <b>Статистика:</b>\n\n👥 Всего пользователей: {}\n✅ Завершили регистрацию: {onboarded}",
                all.len()
            ),
        )
        .await
    }

    async fn admin_list_all(&self, event: &CallbackEvent) -> Result<(), EventHandlerError> {
        let ctx = &self.ctx;
        let mut text = String::from("🛡 <b>Список администраторов:</b>\n\n");
        text.push_str(&format!("1. 👑 <code>{}</code>\n", ctx.root_admin_id));
        for (index, admin) in ctx.admins.list().await?.iter().enumerate() {
            text.push_str(&format!("{}. 🛡 <code>{admin}</code>\n", index + 2));
        }
        ctx.send_plain(event.chat_id, text).await
    }

    async fn handle_admin_callback(
        &self,
        event: &CallbackEvent,
    ) -> Result<(), EventHandlerError> {
        let ctx = &self.ctx;
        if !ctx.is_admin(event.user_id).await {
            return Ok(());
        }

        match event.data.as_str() {
            CB_ADMIN_LIST => ctx.send_roster(event.chat_id).await,
            CB_ADMIN_STATS => self.admin_stats(event).await,
            CB_ADMIN_MANAGE => {
                ctx.api
                    .edit_message_text(
                        event.chat_id,
                        event.message_id,
                        "👥 <b>Управление администраторами</b>\n\nВыберите действие:",
                        Some(ReplyMarkup::Inline(admin_manage_menu())),
                    )
                    .await?;
                Ok(())
            }
            CB_ADMIN_ADD => {
                ctx.sessions.set_state(event.chat_id, ChatState::AwaitingAdminGrant).await;
                ctx.send_plain(event.chat_id, "➕ Введите <b>User ID</b> для добавления в админы:")
                    .await
            }
            CB_ADMIN_REMOVE => {
                ctx.sessions.set_state(event.chat_id, ChatState::AwaitingAdminRevoke).await;
                ctx.send_plain(event.chat_id, "➖ Введите <b>User ID</b> для удаления из админов:")
                    .await
            }
            CB_ADMIN_LIST_ALL => self.admin_list_all(event).await,
            CB_ADMIN_INFO_ADD => {
                ctx.sessions.set_state(event.chat_id, ChatState::AwaitingNoteAdd).await;
                ctx.send_plain(
                    event.chat_id,
                    "📚 Введите запись в формате: <b>ключевое слово | текст</b>",
                )
                .await
            }
            CB_ADMIN_INFO_REMOVE => {
                ctx.sessions.set_state(event.chat_id, ChatState::AwaitingNoteRemove).await;
                ctx.send_plain(event.chat_id, "🗑 Введите <b>ID</b> записи для удаления:").await
            }
            CB_ADMIN_BACK => {
                ctx.send_tracked(
                    OutgoingMessage::new(event.chat_id, "Выберите действие:")
                        .with_markup(ReplyMarkup::Reply(persistent_menu(true))),
                )
                .await
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl EventHandler for CallbackHandler {
    fn event_type(&self) -> BotEventType {
        BotEventType::Callback
    }

    async fn handle(
        &self,
        envelope: &UpdateEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let BotEvent::Callback(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        info!(
            event_name = "ingress.telegram.callback",
            data = %event.data,
            user_id = event.user_id,
            correlation_id = %ctx.correlation_id,
            "handling callback"
        );

        // Always answer the callback so the client stops its spinner, even
        // when the payload turns out to be stale or unauthorized.
        self.ctx.api.answer_callback(&event.callback_id).await?;

        match event.data.as_str() {
            CB_EDIT_START => self.open_edit_menu(event).await?,
            CB_BACK_TO_PROFILE => self.back_to_profile(event).await?,
            data if data.starts_with("admin_") => self.handle_admin_callback(event).await?,
            data if data.starts_with(CB_EDIT_PREFIX) => {
                let key = &data[CB_EDIT_PREFIX.len()..];
                self.choose_field(event, key).await?;
            }
            _ => return Ok(HandlerResult::Ignored),
        }

        Ok(HandlerResult::Processed)
    }
}

#[cfg(test)]
mod tests {
    use crewdesk_core::domain::fields::FieldId;
    use crewdesk_core::domain::person::PersonId;
    use crewdesk_db::PersonnelRepository;

    use crate::dialogue::ChatState;
    use crate::events::EventContext;
    use crate::keyboards::{CB_ADMIN_ADD, CB_ADMIN_STATS, CB_EDIT_START};
    use crate::testing::{callback_envelope, test_context, text_envelope, TestContext};

    use super::super::build_dispatcher;

    #[tokio::test]
    async fn edit_callback_sets_the_editing_state() {
        let TestContext { ctx, api, .. } = test_context(1000).await;
        let dispatcher = build_dispatcher(ctx.clone());
        let events = EventContext::default();

        dispatcher
            .dispatch(&callback_envelope(3, 3, CB_EDIT_START), &events)
            .await
            .expect("open menu");
        assert!(api.edited_texts().await.iter().any(|text| text.contains("Выберите параметр")));

        dispatcher
            .dispatch(&callback_envelope(3, 3, "edit_medical_date"), &events)
            .await
            .expect("choose field");
        assert_eq!(ctx.sessions.state(3).await, Some(ChatState::EditingField(FieldId::Medical)));
        assert_eq!(api.answered().await.len(), 2);
    }

    #[tokio::test]
    async fn unknown_edit_key_is_rejected_without_state_change() {
        let TestContext { ctx, .. } = test_context(1000).await;
        let dispatcher = build_dispatcher(ctx.clone());

        dispatcher
            .dispatch(&callback_envelope(3, 3, "edit_vlk; DROP TABLE"), &EventContext::default())
            .await
            .expect("dispatch");
        assert_eq!(ctx.sessions.state(3).await, None);
    }

    #[tokio::test]
    async fn edit_flow_updates_the_field_end_to_end() {
        let TestContext { ctx, api, .. } = test_context(1000).await;
        ctx.personnel.upsert_contact(PersonId(3), None).await.expect("upsert");
        ctx.personnel.set_onboarded(PersonId(3)).await.expect("flag");

        let dispatcher = build_dispatcher(ctx.clone());
        let events = EventContext::default();
        dispatcher
            .dispatch(&callback_envelope(3, 3, "edit_rank"), &events)
            .await
            .expect("choose field");
        dispatcher.dispatch(&text_envelope(3, 3, "майор"), &events).await.expect("new value");

        let record = ctx.personnel.find(PersonId(3)).await.expect("find").expect("exists");
        assert_eq!(record.rank.as_deref(), Some("майор"));
        assert!(api.sent_texts().await.iter().any(|text| text.contains("Обновлено")));
    }

    #[tokio::test]
    async fn admin_callbacks_are_ignored_for_regular_users() {
        let TestContext { ctx, api, .. } = test_context(1000).await;
        let dispatcher = build_dispatcher(ctx.clone());

        dispatcher
            .dispatch(&callback_envelope(4, 4, CB_ADMIN_STATS), &EventContext::default())
            .await
            .expect("dispatch");
        assert!(api.sent_texts().await.is_empty());
        // The spinner is still dismissed.
        assert_eq!(api.answered().await.len(), 1);
    }

    #[tokio::test]
    async fn admin_add_callback_arms_the_grant_state() {
        let TestContext { ctx, api, .. } = test_context(1000).await;
        let dispatcher = build_dispatcher(ctx.clone());

        dispatcher
            .dispatch(&callback_envelope(1000, 1000, CB_ADMIN_ADD), &EventContext::default())
            .await
            .expect("dispatch");
        assert_eq!(ctx.sessions.state(1000).await, Some(ChatState::AwaitingAdminGrant));
        assert!(api.sent_texts().await.iter().any(|text| text.contains("User ID")));
    }
}
