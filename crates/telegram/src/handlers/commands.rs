use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crewdesk_core::domain::person::PersonId;

use crate::api::OutgoingMessage;
use crate::events::{
    BotEvent, BotEventType, CommandEvent, EventContext, EventHandler, EventHandlerError,
    HandlerResult, UpdateEnvelope,
};
use crate::keyboards::{admin_menu, persistent_menu, InlineKeyboardButton, InlineKeyboardMarkup, ReplyMarkup, CB_ADMIN_LIST};
use crate::render;

use super::BotContext;

pub struct CommandHandler {
    ctx: Arc<BotContext>,
}

impl CommandHandler {
    pub fn new(ctx: Arc<BotContext>) -> Self {
        Self { ctx }
    }

    async fn handle_start(&self, event: &CommandEvent) -> Result<(), EventHandlerError> {
        let ctx = &self.ctx;
        let person_id = PersonId(event.user_id);
        ctx.personnel.upsert_contact(person_id, event.username.as_deref()).await?;

        let record = ctx.personnel.find(person_id).await?;
        let is_admin = ctx.is_admin(event.user_id).await;

        if record.is_some_and(|record| record.onboarded) {
            ctx.send_tracked(
                OutgoingMessage::new(event.chat_id, "Добро пожаловать обратно! Выберите действие:")
                    .with_markup(ReplyMarkup::Reply(persistent_menu(is_admin))),
            )
            .await?;
        } else {
            ctx.send_tracked(
                OutgoingMessage::new(
                    event.chat_id,
                    "👋 Приветствую! Для доступа к функциям необходимо пройти регистрацию.",
                )
                .with_markup(ReplyMarkup::Reply(persistent_menu(is_admin))),
            )
            .await?;
            ctx.begin_onboarding(event.chat_id).await?;
        }
        Ok(())
    }

    async fn handle_list(&self, event: &CommandEvent) -> Result<(), EventHandlerError> {
        if !self.ctx.is_admin(event.user_id).await {
            return Ok(());
        }
        self.ctx.send_roster(event.chat_id).await
    }

    /// `/user<id>` - full profile of one person, admin only.
    async fn handle_user(
        &self,
        event: &CommandEvent,
        id_text: &str,
    ) -> Result<(), EventHandlerError> {
        let ctx = &self.ctx;
        if !ctx.is_admin(event.user_id).await {
            return Ok(());
        }

        let Ok(target) = id_text.trim().parse::<i64>() else {
            return ctx.send_plain(event.chat_id, "❌ Неверный формат! /user&lt;id&gt;").await;
        };

        let Some(record) = ctx.personnel.find(PersonId(target)).await? else {
            return ctx.send_plain(event.chat_id, "❌ Пользователь не найден").await;
        };

        let evaluation = ctx.evaluate(&record);
        let mut text = format!("👤 <b>ПОЛНАЯ АНКЕТА</b>\n\n{}", render::profile_text(&evaluation));
        if let Some(bans) = render::ban_block(&evaluation) {
            text.push('\n');
            text.push_str(&bans);
        }

        let back = InlineKeyboardMarkup {
            inline_keyboard: vec![vec![InlineKeyboardButton::new(
                "🔙 Назад к списку",
                CB_ADMIN_LIST,
            )]],
        };
        ctx.send_tracked(
            OutgoingMessage::new(event.chat_id, text).with_markup(ReplyMarkup::Inline(back)),
        )
        .await
    }

    async fn handle_admin(&self, event: &CommandEvent) -> Result<(), EventHandlerError> {
        let ctx = &self.ctx;
        if !ctx.is_admin(event.user_id).await {
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
}

#[async_trait]
impl EventHandler for CommandHandler {
    fn event_type(&self) -> BotEventType {
        BotEventType::Command
    }

    async fn handle(
        &self,
        envelope: &UpdateEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let BotEvent::Command(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        info!(
            event_name = "ingress.telegram.command",
            command = %event.command,
            user_id = event.user_id,
            correlation_id = %ctx.correlation_id,
            "handling command"
        );

        match event.command.as_str() {
            "start" => self.handle_start(event).await?,
            "list" => self.handle_list(event).await?,
            "admin" => self.handle_admin(event).await?,
            command if command.starts_with("user") => {
                let inline_id = &command["user".len()..];
                let id_text = if inline_id.is_empty() { event.args.as_str() } else { inline_id };
                self.handle_user(event, id_text).await?;
            }
            _ => return Ok(HandlerResult::Ignored),
        }

        Ok(HandlerResult::Processed)
    }
}
