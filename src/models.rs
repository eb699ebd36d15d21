use anyhow::{Context, Result};
use dashmap::DashMap;
use url::Url;

use crate::config::EnvConfig;
use crate::print::PrintClient;
use crate::replies::{PendingReplies, ReplyLinks};

/// Общее состояние бота, раздаётся хендлерам через dptree::deps.
/// Все изменяемые таблицы — DashMap, хендлеры работают из нескольких тасков.
pub struct AppConfig {
    pub staff_chat_id: i64,
    pub menu_url: Url,
    pub manager_contact: String,
    pub print: PrintClient,
    pub reply_links: ReplyLinks,
    pub pending_replies: PendingReplies,
    /// Кому главная клавиатура уже показана в этом запуске.
    pub keyboard_shown: DashMap<u64, ()>,
}

impl AppConfig {
    pub fn new(env: EnvConfig) -> Result<Self> {
        let menu_url = Url::parse(&env.menu_url)
            .with_context(|| format!("MENU_URL is not a valid URL: {}", env.menu_url))?;

        Ok(Self {
            staff_chat_id: env.staff_chat_id,
            menu_url,
            manager_contact: env.manager_contact,
            print: PrintClient::new(env.print_url),
            reply_links: ReplyLinks::load(env.state_file),
            pending_replies: PendingReplies::new(),
            keyboard_shown: DashMap::new(),
        })
    }
}
