use anyhow::{Context, Result};
use std::sync::Arc;

use chrono::Utc;
use log::{debug, error, info, warn};
use teloxide::macros::BotCommands;
use teloxide::prelude::*;
use teloxide::RequestError;

use crate::bot::{keyboards, utils};
use crate::dispatch;
use crate::models::AppConfig;
use crate::order::{self, BKK_TZ};
use crate::replies::OperatorState;

#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "Доступные команды:")]
pub enum Command {
    #[command(description = "Показать меню")]
    Start,
    #[command(description = "Отменить ответ клиенту")]
    Cancel,
    #[command(description = "Показать идентификаторы")]
    Myid,
}

pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    config: Arc<AppConfig>,
) -> Result<()> {
    let user = msg.from.as_ref().context("User missing")?;
    let chat_id = msg.chat.id;

    debug!("Команда {:?} от {}", cmd, user.id);

    match cmd {
        Command::Start => {
            let mut welcome = String::from(
                "Добро пожаловать в Smoke Factory BBQ!\nНажмите кнопку ниже, чтобы открыть меню.",
            );
            if !config.manager_contact.is_empty() {
                welcome.push_str(&format!("\n\nВопросы — {}", config.manager_contact));
            }

            bot.send_message(chat_id, welcome)
                .reply_markup(keyboards::main_menu(&config.menu_url))
                .await?;
            config.keyboard_shown.insert(user.id.0, ());
            info!("Пользователь {} начал работу с ботом.", user.id);
        }
        Command::Cancel => {
            let text = if config.pending_replies.cancel(user.id.0) {
                "✅ Ответ клиенту отменён."
            } else {
                "Нечего отменять: ответ клиенту не ожидается."
            };
            bot.send_message(chat_id, text).await?;
        }
        Command::Myid => {
            bot.send_message(
                chat_id,
                format!("🆔 Ваш ID: {}\nID этого чата: {}", user.id, chat_id),
            )
            .await?;
        }
    }

    Ok(())
}

/// Заказ из Web App: единственная точка, где сырой payload превращается
/// в Order и уходит в конвейер доставки.
pub async fn handle_order(bot: Bot, msg: Message, config: Arc<AppConfig>) -> Result<()> {
    let user = msg.from.as_ref().context("User missing")?;
    let raw = &msg.web_app_data().context("web_app_data missing")?.data;

    info!("===== Получен заказ из Web App от {} =====", user.id);
    debug!("Сырой payload: {}", raw);

    let now = Utc::now().with_timezone(&*BKK_TZ);
    match order::parse_order(raw, msg.chat.id.0, utils::customer_label(user), now) {
        Ok(order) => dispatch::dispatch_order(&bot, &config, &order).await,
        Err(e) => {
            // Единственная ошибка нормализации — битый JSON целиком.
            error!("Payload заказа не декодируется: {}", e);
            bot.send_message(
                msg.chat.id,
                "⚠️ Произошла ошибка при оформлении заказа. Попробуйте ещё раз.",
            )
            .await?;
        }
    }

    Ok(())
}

/// Нажатия inline-кнопок. Сейчас их одна — "Ответить" под карточкой заказа.
pub async fn handle_callback(bot: Bot, q: CallbackQuery, config: Arc<AppConfig>) -> Result<()> {
    let operator = q.from.id.0;
    bot.answer_callback_query(q.id).await?;

    let data = q.data.as_ref().context("No callback data")?;
    let Some(customer_id) = utils::parse_reply_callback(data) else {
        warn!("Неизвестный callback от {}: {}", operator, data);
        return Ok(());
    };

    if let OperatorState::AwaitingText { customer_id: prev } = config.pending_replies.state(operator)
    {
        debug!("Оператор {} сменил адресата ответа с {} на {}", operator, prev, customer_id);
    }
    config.pending_replies.begin(operator, customer_id);

    let chat_id = match q.message.as_ref() {
        Some(msg) => msg.chat().id,
        None => ChatId(config.staff_chat_id),
    };
    bot.send_message(
        chat_id,
        format!(
            "✍️ Напишите ответ для клиента {} следующим сообщением (или /cancel).",
            customer_id
        ),
    )
    .await?;

    Ok(())
}

/// Свободный текст в чате персонала: либо реплай на карточку заказа,
/// либо ранее запрошенный через кнопку ответ. Остальное игнорируется.
pub async fn handle_staff_text(bot: Bot, msg: Message, config: Arc<AppConfig>) -> Result<()> {
    let user = msg.from.as_ref().context("User missing")?;
    let text = msg.text().context("Text missing")?;

    // Неизвестные команды клиенту не ретранслируем.
    if text.starts_with('/') {
        return Ok(());
    }

    if let Some(replied) = msg.reply_to_message() {
        match config.reply_links.get(replied.id.0) {
            Some(customer_id) => {
                return relay_to_customer(&bot, msg.chat.id, customer_id, text).await;
            }
            None => debug!("Реплай на сообщение {} без связки, пропускаем", replied.id),
        }
    }

    if let Some(customer_id) = config.pending_replies.take(user.id.0) {
        return relay_to_customer(&bot, msg.chat.id, customer_id, text).await;
    }

    Ok(())
}

/// Клиент пишет текстом, а клавиатуру с меню ещё не видел — показываем.
pub async fn handle_keyboard_show(bot: Bot, msg: Message, config: Arc<AppConfig>) -> Result<()> {
    let user = msg.from.as_ref().context("User missing")?;

    bot.send_message(msg.chat.id, "Нажмите кнопку ниже, чтобы открыть меню 👇")
        .reply_markup(keyboards::main_menu(&config.menu_url))
        .await?;
    config.keyboard_shown.insert(user.id.0, ());

    Ok(())
}

async fn relay_to_customer(
    bot: &Bot,
    operator_chat: ChatId,
    customer_id: i64,
    text: &str,
) -> Result<()> {
    match bot.send_message(ChatId(customer_id), text).await {
        Ok(_) => {
            bot.send_message(operator_chat, "✅ Ответ отправлен клиенту.")
                .await?;
        }
        Err(e) if is_delivery_blocked(&e) => {
            // Отличимый отказ: до клиента не достучаться в принципе.
            bot.send_message(
                operator_chat,
                "🚫 Не доставлено: клиент заблокировал бота или ещё не открывал с ним чат.",
            )
            .await?;
        }
        Err(e) => {
            error!("Ответ клиенту {} не доставлен: {}", customer_id, e);
            bot.send_message(operator_chat, "⚠️ Не удалось отправить сообщение клиенту.")
                .await?;
        }
    }

    Ok(())
}

/// Telegram не даёт писать первым и не пишет заблокированным — оба
/// случая для оператора означают одно: канал к клиенту закрыт.
fn is_delivery_blocked(err: &RequestError) -> bool {
    let text = err.to_string();
    text.contains("bot was blocked")
        || text.contains("chat not found")
        || text.contains("can't initiate conversation")
}
