//! Telegram integration - long-polling bot interface
//!
//! This crate provides the Telegram interface for crewdesk:
//! - **Bot API client** (`api`) - outgoing calls (`sendMessage`, `deleteMessage`, ...)
//! - **Long polling** (`poll`) - `getUpdates` loop with reconnection logic
//! - **Events** (`events`) - commands, dialogue text, inline-button callbacks
//! - **Keyboards** (`keyboards`) - reply/inline keyboard builders and fixed menus
//! - **Dialogue** (`dialogue`) - per-chat conversation state
//! - **Handlers** (`handlers`) - onboarding, profile, admin panel, reference search
//!
//! # Getting Started
//!
//! 1. Create a bot with @BotFather and copy its token
//! 2. Set `CREWDESK_BOT_TOKEN` and `CREWDESK_ROOT_ADMIN_ID`
//! 3. Run `crewdesk-server`
//!
//! # Architecture
//!
//! ```text
//! getUpdates → LongPollRunner → EventDispatcher → Handlers → Eligibility Engine
//!                                       ↓
//!                                 Bot API client ← Keyboards
//! ```

pub mod airfields;
pub mod api;
pub mod dialogue;
pub mod events;
pub mod handlers;
pub mod keyboards;
pub mod poll;
pub mod render;

#[cfg(test)]
pub(crate) mod testing;
