use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crewdesk_core::domain::fields::FieldId;
use crewdesk_core::domain::person::PersonId;
use crewdesk_core::flows::OnboardingStep;

use crate::airfields;
use crate::api::OutgoingMessage;
use crate::dialogue::ChatState;
use crate::events::{
    BotEvent, BotEventType, EventContext, EventHandler, EventHandlerError, HandlerResult,
    TextEvent, UpdateEnvelope,
};
use crate::keyboards::{admin_menu, persistent_menu, ReplyMarkup, BTN_ADMIN, BTN_INFO, BTN_PROFILE};
use crate::render;

use super::BotContext;

pub struct TextHandler {
    ctx: Arc<BotContext>,
}

impl TextHandler {
    pub fn new(ctx: Arc<BotContext>) -> Self {
        Self { ctx }
    }

    async fn handle_onboarding_step(
        &self,
        event: &TextEvent,
        step: OnboardingStep,
    ) -> Result<(), EventHandlerError> {
        let ctx = &self.ctx;
        let person_id = PersonId(event.user_id);

        let outcome = match ctx.flow.apply(step, &event.text) {
            Ok(outcome) => outcome,
            Err(error) => {
                // Re-prompt on the same step.
                return ctx.send_plain(event.chat_id, format!("❌ {error}")).await;
            }
        };

        for write in &outcome.writes {
            ctx.personnel.update_field(person_id, write.field, &write.value).await?;
        }

        match outcome.next {
            Some(next) => {
                ctx.sessions.set_state(event.chat_id, ChatState::Onboarding(next)).await;
                ctx.send_plain(event.chat_id, ctx.flow.prompt(next)).await
            }
            None => {
                let is_admin = ctx.is_admin(event.user_id).await;
                ctx.finish_onboarding(event.chat_id, person_id, is_admin).await
            }
        }
    }

    async fn handle_field_edit(
        &self,
        event: &TextEvent,
        field: FieldId,
    ) -> Result<(), EventHandlerError> {
        let ctx = &self.ctx;
        ctx.personnel.update_field(PersonId(event.user_id), field, &event.text).await?;
        ctx.sessions.clear_state(event.chat_id).await;
        ctx.send_plain(event.chat_id, "✅ Обновлено!").await?;
        ctx.show_profile(event.chat_id, PersonId(event.user_id)).await
    }

    async fn handle_search_query(&self, event: &TextEvent) -> Result<(), EventHandlerError> {
        let ctx = &self.ctx;
        ctx.sessions.clear_state(event.chat_id).await;

        let query = event.text.trim();
        if query.to_lowercase() == "отмена" || query == "❌ Отмена" {
            let is_admin = ctx.is_admin(event.user_id).await;
            return ctx
                .send_tracked(
                    OutgoingMessage::new(event.chat_id, "❌ Поиск отменен")
                        .with_markup(ReplyMarkup::Reply(persistent_menu(is_admin))),
                )
                .await;
        }

        let notes = ctx.reference.search(query).await?;
        if notes.is_empty() {
            return ctx.send_plain(event.chat_id, "❌ Информация не найдена, извините.").await;
        }

        let mut text = format!("🔍 <b>Вот что удалось найти по запросу: {query}</b>\n\n");
        if let Some(header) = airfields::airfield_info(query) {
            text.push_str(&header);
            text.push_str("\n\n");
        }
        for note in notes {
            text.push_str(&note.content);
            text.push('\n');
        }
        ctx.send_plain(event.chat_id, text).await
    }

    async fn handle_admin_grant(
        &self,
        event: &TextEvent,
        revoke: bool,
    ) -> Result<(), EventHandlerError> {
        let ctx = &self.ctx;
        ctx.sessions.clear_state(event.chat_id).await;

        if !ctx.is_admin(event.user_id).await {
            return Ok(());
        }

        let Ok(target) = event.text.trim().parse::<i64>() else {
            return ctx.send_plain(event.chat_id, "❌ Неверный формат! Введите числовой ID.").await;
        };

        let reply = if revoke {
            if target == ctx.root_admin_id {
                "❌ Главного администратора удалить нельзя.".to_owned()
            } else if ctx.admins.remove(target).await? {
                format!("✅ Администратор <code>{target}</code> удалён.")
            } else {
                format!("❌ <code>{target}</code> не является администратором.")
            }
        } else {
            ctx.admins.add(target, event.user_id).await?;
            format!("✅ Администратор <code>{target}</code> добавлен.")
        };

        ctx.send_plain(event.chat_id, reply).await
    }

    async fn handle_note_add(&self, event: &TextEvent) -> Result<(), EventHandlerError> {
        let ctx = &self.ctx;
        ctx.sessions.clear_state(event.chat_id).await;
        if !ctx.is_admin(event.user_id).await {
            return Ok(());
        }

        let Some((keyword, content)) = event.text.split_once('|') else {
            return ctx
                .send_plain(event.chat_id, "❌ Формат: <b>ключевое слово | текст</b>")
                .await;
        };
        let (keyword, content) = (keyword.trim(), content.trim());
        if keyword.is_empty() || content.is_empty() {
            return ctx
                .send_plain(event.chat_id, "❌ Формат: <b>ключевое слово | текст</b>")
                .await;
        }

        let id = ctx.reference.add_note(keyword, content).await?;
        ctx.send_plain(event.chat_id, format!("✅ Запись <code>{id}</code> добавлена."))
            .await
    }

    async fn handle_note_remove(&self, event: &TextEvent) -> Result<(), EventHandlerError> {
        let ctx = &self.ctx;
        ctx.sessions.clear_state(event.chat_id).await;
        if !ctx.is_admin(event.user_id).await {
            return Ok(());
        }

        let Ok(id) = event.text.trim().parse::<i64>() else {
            return ctx.send_plain(event.chat_id, "❌ Неверный формат! Введите числовой ID.").await;
        };

        let reply = if ctx.reference.remove_note(id).await? {
            format!("✅ Запись <code>{id}</code> удалена.")
        } else {
            format!("❌ Запись <code>{id}</code> не найдена.")
        };
        ctx.send_plain(event.chat_id, reply).await
    }

    /// No active dialogue: menu buttons, or the admin's free-text personnel
    /// search, or a nudge back to the menu.
    async fn handle_menu_text(&self, event: &TextEvent) -> Result<(), EventHandlerError> {
        let ctx = &self.ctx;
        let is_admin = ctx.is_admin(event.user_id).await;

        match event.text.as_str() {
            BTN_PROFILE => ctx.show_profile(event.chat_id, PersonId(event.user_id)).await,
            BTN_INFO => {
                ctx.sessions.set_state(event.chat_id, ChatState::AwaitingSearchQuery).await;
                ctx.send_plain(
                    event.chat_id,
                    "🔍 Напишите город или аэродром, информация по которому вас интересует:",
                )
                .await
            }
            BTN_ADMIN => {
                if !is_admin {
                    return ctx.send_plain(event.chat_id, "❌ Доступ запрещен.").await;
                }
                ctx.send_tracked(
                    OutgoingMessage::new(
                        event.chat_id,
                        "🛡 <b>Панель администратора</b>\n\nВыберите действие:",
                    )
                    .with_markup(ReplyMarkup::Inline(admin_menu())),
                )
                .await
            }
            _ if is_admin => self.search_personnel_by_name(event).await,
            _ => {
                ctx.send_tracked(
                    OutgoingMessage::new(event.chat_id, "Выберите действие:")
                        .with_markup(ReplyMarkup::Reply(persistent_menu(is_admin))),
                )
                .await
            }
        }
    }

    /// Admin free text doubles as a surname search over the roster.
    async fn search_personnel_by_name(&self, event: &TextEvent) -> Result<(), EventHandlerError> {
        let ctx = &self.ctx;
        let found = ctx.personnel.search_by_name(&event.text).await?;
        if found.is_empty() {
            // Stay quiet, matching the original bot's behavior for stray chat.
            return Ok(());
        }

        for record in found {
            let evaluation = ctx.evaluate(&record);
            let mut text = render::profile_text(&evaluation);
            if let Some(bans) = render::ban_block(&evaluation) {
                text.push('\n');
                text.push_str(&bans);
            }
            ctx.send_plain(event.chat_id, text).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl EventHandler for TextHandler {
    fn event_type(&self) -> BotEventType {
        BotEventType::Text
    }

    async fn handle(
        &self,
        envelope: &UpdateEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let BotEvent::Text(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        info!(
            event_name = "ingress.telegram.text",
            user_id = event.user_id,
            correlation_id = %ctx.correlation_id,
            "handling dialogue text"
        );

        match self.ctx.sessions.state(event.chat_id).await {
            Some(ChatState::Onboarding(step)) => self.handle_onboarding_step(event, step).await?,
            Some(ChatState::EditingField(field)) => self.handle_field_edit(event, field).await?,
            Some(ChatState::AwaitingSearchQuery) => self.handle_search_query(event).await?,
            Some(ChatState::AwaitingAdminGrant) => self.handle_admin_grant(event, false).await?,
            Some(ChatState::AwaitingAdminRevoke) => self.handle_admin_grant(event, true).await?,
            Some(ChatState::AwaitingNoteAdd) => self.handle_note_add(event).await?,
            Some(ChatState::AwaitingNoteRemove) => self.handle_note_remove(event).await?,
            None => self.handle_menu_text(event).await?,
        }

        Ok(HandlerResult::Processed)
    }
}
