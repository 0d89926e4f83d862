use std::sync::Arc;

use chrono::NaiveDate;
use tracing::warn;

use crewdesk_core::domain::person::{PersonId, PersonRecord};
use crewdesk_core::eligibility::report::Evaluation;
use crewdesk_core::flows::OnboardingFlow;
use crewdesk_db::{AdminRepository, PersonnelRepository, ReferenceRepository};

use crate::api::{BotApi, OutgoingMessage};
use crate::dialogue::{ChatState, SessionStore};
use crate::events::{EventDispatcher, EventHandlerError};
use crate::keyboards::{persistent_menu, profile_actions, ReplyMarkup};
use crate::render;

pub mod callbacks;
pub mod commands;
pub mod text;

pub use callbacks::CallbackHandler;
pub use commands::CommandHandler;
pub use text::TextHandler;

/// Shared state every handler operates on.
pub struct BotContext {
    pub api: Arc<dyn BotApi>,
    pub personnel: Arc<dyn PersonnelRepository>,
    pub admins: Arc<dyn AdminRepository>,
    pub reference: Arc<dyn ReferenceRepository>,
    pub sessions: SessionStore,
    pub flow: OnboardingFlow,
    pub root_admin_id: i64,
}

impl BotContext {
    pub fn new(
        api: Arc<dyn BotApi>,
        personnel: Arc<dyn PersonnelRepository>,
        admins: Arc<dyn AdminRepository>,
        reference: Arc<dyn ReferenceRepository>,
        root_admin_id: i64,
    ) -> Arc<Self> {
        Arc::new(Self {
            api,
            personnel,
            admins,
            reference,
            sessions: SessionStore::default(),
            flow: OnboardingFlow,
            root_admin_id,
        })
    }

    /// Capture "today" once per interaction; every evaluation within the
    /// interaction reuses it.
    pub fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }

    pub async fn is_admin(&self, user_id: i64) -> bool {
        if user_id == self.root_admin_id {
            return true;
        }
        match self.admins.is_admin(user_id).await {
            Ok(is_admin) => is_admin,
            Err(error) => {
                warn!(user_id, error = %error, "admin lookup failed; denying");
                false
            }
        }
    }

    /// Send a message, deleting the previously tracked menu message of the
    /// chat first. Cleanup failures are expected (the message may already be
    /// gone) and only logged.
    pub async fn send_tracked(&self, message: OutgoingMessage) -> Result<(), EventHandlerError> {
        let chat_id = message.chat_id;
        if let Some(previous) = self.sessions.take_last_message(chat_id).await {
            if let Err(error) = self.api.delete_message(chat_id, previous).await {
                warn!(chat_id, message_id = previous, error = %error, "stale menu cleanup failed");
            }
        }

        let sent_id = self.api.send_message(message).await?;
        self.sessions.set_last_message(chat_id, sent_id).await;
        Ok(())
    }

    pub async fn send_plain(
        &self,
        chat_id: i64,
        text: impl Into<String>,
    ) -> Result<(), EventHandlerError> {
        self.send_tracked(OutgoingMessage::new(chat_id, text)).await
    }

    /// Render and send a person's own profile, or nudge towards onboarding.
    pub async fn show_profile(
        &self,
        chat_id: i64,
        person_id: PersonId,
    ) -> Result<(), EventHandlerError> {
        let Some(record) = self.personnel.find(person_id).await? else {
            return self.send_plain(chat_id, "Сначала пройдите регистрацию (/start)").await;
        };
        if !record.onboarded {
            return self.send_plain(chat_id, "Сначала пройдите регистрацию (/start)").await;
        }

        let evaluation = Evaluation::evaluate(&record, self.today());
        let mut text = render::profile_text(&evaluation);
        if let Some(bans) = render::ban_block(&evaluation) {
            text.push('\n');
            text.push_str(&bans);
        }

        self.send_tracked(
            OutgoingMessage::new(chat_id, text)
                .with_markup(ReplyMarkup::Inline(profile_actions())),
        )
        .await
    }

    /// Kick off the onboarding dialogue from the first step.
    pub async fn begin_onboarding(&self, chat_id: i64) -> Result<(), EventHandlerError> {
        let first = self.flow.first_step();
        self.sessions.set_state(chat_id, ChatState::Onboarding(first)).await;
        self.send_plain(chat_id, self.flow.prompt(first)).await
    }

    /// Final onboarding step completed: flip the one-way flag, evaluate the
    /// fresh record, and report bans immediately.
    pub async fn finish_onboarding(
        &self,
        chat_id: i64,
        person_id: PersonId,
        is_admin: bool,
    ) -> Result<(), EventHandlerError> {
        self.personnel.set_onboarded(person_id).await?;
        self.sessions.clear_state(chat_id).await;

        let record = self.personnel.find(person_id).await?;
        let bans = record
            .as_ref()
            .map(|record| Evaluation::evaluate(record, self.today()).ban_reasons())
            .unwrap_or_default();

        let text = if bans.is_empty() {
            "✅ Регистрация успешно завершена!".to_owned()
        } else {
            format!("⚠️ ВНИМАНИЕ!\n{}", bans.join("\n"))
        };

        self.send_tracked(
            OutgoingMessage::new(chat_id, text)
                .with_markup(ReplyMarkup::Reply(persistent_menu(is_admin))),
        )
        .await
    }

    /// Admin roster listing with a problems suffix per entry.
    pub async fn send_roster(&self, chat_id: i64) -> Result<(), EventHandlerError> {
        let records = self.personnel.list_onboarded().await?;
        if records.is_empty() {
            return self.send_plain(chat_id, "Список пуст.").await;
        }

        let today = self.today();
        let mut output = String::from("📋 <b>Список личного состава:</b>\n\n");
        for record in &records {
            let evaluation = Evaluation::evaluate(record, today);
            output.push_str(&render::roster_entry(record, &evaluation));
            output.push('\n');
        }

        // Telegram caps messages at 4096 chars; long rosters are truncated
        // rather than split.
        let truncated: String = output.chars().take(4000).collect();
        self.send_plain(chat_id, truncated).await
    }

    pub fn evaluate(&self, record: &PersonRecord) -> Evaluation {
        Evaluation::evaluate(record, self.today())
    }
}

/// Wire the three event handlers onto a dispatcher.
pub fn build_dispatcher(ctx: Arc<BotContext>) -> EventDispatcher {
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(CommandHandler::new(ctx.clone()));
    dispatcher.register(TextHandler::new(ctx.clone()));
    dispatcher.register(CallbackHandler::new(ctx));
    dispatcher
}
