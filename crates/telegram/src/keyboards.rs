use serde::Serialize;

use crewdesk_core::domain::fields::FieldId;

pub const BTN_PROFILE: &str = "👤 Мой профиль";
pub const BTN_INFO: &str = "📚 Полезная информация";
pub const BTN_ADMIN: &str = "🛡 Функции админа";

pub const CB_EDIT_START: &str = "edit_start";
pub const CB_EDIT_PREFIX: &str = "edit_";
pub const CB_BACK_TO_PROFILE: &str = "back_to_profile";
pub const CB_ADMIN_LIST: &str = "admin_list";
pub const CB_ADMIN_STATS: &str = "admin_stats";
pub const CB_ADMIN_MANAGE: &str = "admin_manage";
pub const CB_ADMIN_ADD: &str = "admin_add";
pub const CB_ADMIN_REMOVE: &str = "admin_remove";
pub const CB_ADMIN_LIST_ALL: &str = "admin_list_all";
pub const CB_ADMIN_INFO_ADD: &str = "admin_info_add";
pub const CB_ADMIN_INFO_REMOVE: &str = "admin_info_remove";
pub const CB_ADMIN_BACK: &str = "admin_back";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KeyboardButton {
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReplyKeyboardMarkup {
    pub keyboard: Vec<Vec<KeyboardButton>>,
    pub resize_keyboard: bool,
    pub is_persistent: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineKeyboardButton {
    pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self { text: text.into(), callback_data: callback_data.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ReplyMarkup {
    Inline(InlineKeyboardMarkup),
    Reply(ReplyKeyboardMarkup),
}

fn reply_row(labels: &[&str]) -> Vec<KeyboardButton> {
    labels.iter().map(|label| KeyboardButton { text: (*label).to_owned() }).collect()
}

/// Persistent bottom menu; the admin row only shows for admins.
pub fn persistent_menu(is_admin: bool) -> ReplyKeyboardMarkup {
    let mut keyboard = vec![reply_row(&[BTN_PROFILE, BTN_INFO])];
    if is_admin {
        keyboard.push(reply_row(&[BTN_ADMIN]));
    }
    ReplyKeyboardMarkup { keyboard, resize_keyboard: true, is_persistent: true }
}

/// Inline field picker shown when editing the profile, one button per
/// editable field plus a cancel row.
pub fn edit_menu() -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = FieldId::ALL
        .chunks(2)
        .map(|pair| {
            pair.iter()
                .map(|field| {
                    InlineKeyboardButton::new(
                        field.label(),
                        format!("{CB_EDIT_PREFIX}{}", field.as_key()),
                    )
                })
                .collect()
        })
        .collect();
    rows.push(vec![InlineKeyboardButton::new("❌ Отмена", CB_BACK_TO_PROFILE)]);
    InlineKeyboardMarkup { inline_keyboard: rows }
}

pub fn profile_actions() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![vec![InlineKeyboardButton::new("✏️ Редактировать", CB_EDIT_START)]],
    }
}

pub fn admin_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![
            vec![InlineKeyboardButton::new("📋 Список личного состава", CB_ADMIN_LIST)],
            vec![InlineKeyboardButton::new("📊 Статистика", CB_ADMIN_STATS)],
            vec![InlineKeyboardButton::new("👥 Управление админами", CB_ADMIN_MANAGE)],
            vec![
                InlineKeyboardButton::new("📚 Добавить информацию", CB_ADMIN_INFO_ADD),
                InlineKeyboardButton::new("🗑 Удалить информацию", CB_ADMIN_INFO_REMOVE),
            ],
            vec![InlineKeyboardButton::new("🔙 Назад", CB_ADMIN_BACK)],
        ],
    }
}

pub fn admin_manage_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![
            vec![
                InlineKeyboardButton::new("➕ Добавить", CB_ADMIN_ADD),
                InlineKeyboardButton::new("➖ Удалить", CB_ADMIN_REMOVE),
            ],
            vec![InlineKeyboardButton::new("🛡 Список админов", CB_ADMIN_LIST_ALL)],
            vec![InlineKeyboardButton::new("🔙 Назад", CB_ADMIN_BACK)],
        ],
    }
}

#[cfg(test)]
mod tests {
    use crewdesk_core::domain::fields::FieldId;

    use super::{admin_menu, edit_menu, persistent_menu, ReplyMarkup};

    #[test]
    fn admin_row_is_gated() {
        assert_eq!(persistent_menu(false).keyboard.len(), 1);
        assert_eq!(persistent_menu(true).keyboard.len(), 2);
    }

    #[test]
    fn edit_menu_covers_every_field_plus_cancel() {
        let buttons: usize = edit_menu().inline_keyboard.iter().map(Vec::len).sum();
        assert_eq!(buttons, FieldId::ALL.len() + 1);
    }

    #[test]
    fn markup_serializes_to_bot_api_shape() {
        let json = serde_json::to_value(ReplyMarkup::Inline(admin_menu())).expect("serialize");
        assert!(json["inline_keyboard"][0][0]["callback_data"].is_string());

        let json =
            serde_json::to_value(ReplyMarkup::Reply(persistent_menu(true))).expect("serialize");
        assert_eq!(json["resize_keyboard"], true);
        assert_eq!(json["keyboard"][1][0]["text"], super::BTN_ADMIN);
    }
}
