pub mod handlers;
pub mod keyboards;
pub mod utils;

use std::sync::Arc;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;

use crate::models::AppConfig;
use handlers::Command;

pub fn init(token: String) -> Bot {
    Bot::new(token)
}

/// Дерево обработчиков. Порядок веток существенный: команды раньше
/// свободного текста, иначе /cancel уедет клиенту как "ответ персонала".
pub fn schema() -> UpdateHandler<anyhow::Error> {
    let messages = Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(handlers::handle_command),
        )
        .branch(
            dptree::filter(|msg: Message| msg.web_app_data().is_some())
                .endpoint(handlers::handle_order),
        )
        .branch(
            dptree::filter(|msg: Message, config: Arc<AppConfig>| {
                msg.chat.id.0 == config.staff_chat_id && msg.text().is_some()
            })
            .endpoint(handlers::handle_staff_text),
        )
        .branch(
            dptree::filter(|msg: Message, config: Arc<AppConfig>| {
                msg.chat.is_private()
                    && msg.text().is_some()
                    && msg
                        .from
                        .as_ref()
                        .is_some_and(|u| !config.keyboard_shown.contains_key(&u.id.0))
            })
            .endpoint(handlers::handle_keyboard_show),
        );

    dptree::entry()
        .branch(messages)
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .endpoint(|update: Update| async move {
            log::debug!("Необработанный апдейт: {:?}", update.id);
            Ok::<(), anyhow::Error>(())
        })
}
