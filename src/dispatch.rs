use std::future::Future;

use chrono::Utc;
use log::{error, info, warn};
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, MessageId, ParseMode};
use teloxide::RequestError;

use crate::bot::keyboards;
use crate::models::AppConfig;
use crate::order::{self, Order, BKK_TZ};
use crate::replies::ReplyLinks;

/// Три стока одного заказа. Шов нужен конвейеру: изоляция этапов
/// проверяется тестами без живого бота.
trait OrderSinks {
    async fn confirm_customer(&self, order: &Order) -> Result<(), RequestError>;
    async fn notify_staff(&self, order: &Order) -> Result<MessageId, RequestError>;
    async fn print_receipt(&self, order: &Order) -> anyhow::Result<()>;
    /// Просьба распечатать вручную. Сама best-effort, ошибки глотает.
    async fn alert_print_failure(&self, order: &Order);
}

/// Три независимые доставки одного заказа: подтверждение клиенту,
/// уведомление персоналу, чек на печать.
///
/// Порядок фиксированный — клиент получает подтверждение первым, даже
/// если дальше всё сломается. Сбой любого этапа логируется и не
/// останавливает остальные.
pub async fn dispatch_order(bot: &Bot, config: &AppConfig, order: &Order) {
    let sinks = TelegramSinks { bot, config };
    run_pipeline(&sinks, &config.reply_links, order).await;
}

async fn run_pipeline<S: OrderSinks>(sinks: &S, links: &ReplyLinks, order: &Order) {
    // 1. Подтверждение клиенту.
    if let Err(e) = sinks.confirm_customer(order).await {
        error!(
            "Подтверждение клиенту {} не доставлено: {}",
            order.customer_id, e
        );
    }

    // 2. Персонал. На успехе запоминаем связку "сообщение → клиент",
    // чтобы ответ реплаем на это сообщение ушёл нужному клиенту.
    match sinks.notify_staff(order).await {
        Ok(msg_id) => {
            links.insert(msg_id.0, order.customer_id);
            if let Err(e) = links.persist() {
                error!("Таблица связок не сохранилась: {:#}", e);
            }
            info!("Заказ от {} отправлен персоналу.", order.customer_label);
        }
        Err(e) => error!(
            "Заказ от {} не доставлен в чат персонала: {}",
            order.customer_label, e
        ),
    }

    // 3. Чек.
    match sinks.print_receipt(order).await {
        Ok(()) => info!("✅ Чек отправлен в чековую программу."),
        Err(e) => {
            error!("❌ Чек не отправлен в чековую программу: {:#}", e);
            sinks.alert_print_failure(order).await;
        }
    }
}

struct TelegramSinks<'a> {
    bot: &'a Bot,
    config: &'a AppConfig,
}

impl OrderSinks for TelegramSinks<'_> {
    async fn confirm_customer(&self, order: &Order) -> Result<(), RequestError> {
        self.bot
            .send_message(ChatId(order.customer_id), order::customer_text(order))
            .await?;
        Ok(())
    }

    async fn notify_staff(&self, order: &Order) -> Result<MessageId, RequestError> {
        let staff = ChatId(self.config.staff_chat_id);
        let text = order::staff_text(order);

        let send = |kb: InlineKeyboardMarkup| {
            let bot = self.bot.clone();
            let text = text.clone();
            async move {
                bot.send_message(staff, text)
                    .parse_mode(ParseMode::Html)
                    .reply_markup(kb)
                    .await
            }
        };

        let sent = send_with_fallback(
            send,
            keyboards::staff_controls(order.customer_id),
            keyboards::staff_controls_reduced(order.customer_id),
        )
        .await?;

        Ok(sent.id)
    }

    async fn print_receipt(&self, order: &Order) -> anyhow::Result<()> {
        let payload = order::print_payload(order, Utc::now().with_timezone(&*BKK_TZ));
        self.config.print.send_receipt(&payload).await
    }

    async fn alert_print_failure(&self, order: &Order) {
        let notice = format!(
            "⚠️ Чек по заказу от {} не ушёл на печать, распечатайте вручную.",
            order.customer_label
        );
        let _ = self
            .bot
            .send_message(ChatId(self.config.staff_chat_id), notice)
            .await;
    }
}

/// Отправка с полным набором кнопок; на отказе платформы из-за
/// приватности профиля — один повтор с урезанным набором.
/// Любая другая ошибка уходит наверх без повтора.
async fn send_with_fallback<T, F, Fut>(
    mut send: F,
    full: InlineKeyboardMarkup,
    reduced: InlineKeyboardMarkup,
) -> Result<T, RequestError>
where
    F: FnMut(InlineKeyboardMarkup) -> Fut,
    Fut: Future<Output = Result<T, RequestError>>,
{
    match send(full).await {
        Err(e) if is_capability_rejection(&e) => {
            warn!(
                "Кнопка профиля отклонена платформой, повтор без неё: {}",
                e
            );
            send(reduced).await
        }
        other => other,
    }
}

/// Именованный отказ Telegram: кнопку-ссылку на профиль нельзя
/// прикрепить из-за настроек приватности получателя.
fn is_capability_rejection(err: &RequestError) -> bool {
    matches!(err, RequestError::Api(_)) && err.to_string().contains("BUTTON_USER_PRIVACY_RESTRICTED")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use teloxide::ApiError;

    fn privacy_rejection() -> RequestError {
        RequestError::Api(ApiError::Unknown(
            "Bad Request: BUTTON_USER_PRIVACY_RESTRICTED".to_string(),
        ))
    }

    fn generic_api_error() -> RequestError {
        RequestError::Api(ApiError::Unknown("Bad Request: chat not found".to_string()))
    }

    fn sample_order() -> Order {
        use crate::order::parse_order;
        let now = Utc::now().with_timezone(&*BKK_TZ);
        parse_order(
            r#"{"items":{"Ribs":{"qty":2,"price":100}},"total":200,"delivery":0}"#,
            42,
            "@tester".into(),
            now,
        )
        .unwrap()
    }

    /// Стоки с управляемыми отказами: каждый этап отмечает, что его звали.
    #[derive(Default)]
    struct RecordingSinks {
        fail_confirm: bool,
        fail_notify: bool,
        fail_print: bool,
        confirmed: Cell<bool>,
        notified: Cell<bool>,
        printed: Cell<bool>,
        alerted: Cell<bool>,
    }

    impl OrderSinks for RecordingSinks {
        async fn confirm_customer(&self, _order: &Order) -> Result<(), RequestError> {
            self.confirmed.set(true);
            if self.fail_confirm {
                return Err(generic_api_error());
            }
            Ok(())
        }

        async fn notify_staff(&self, _order: &Order) -> Result<MessageId, RequestError> {
            self.notified.set(true);
            if self.fail_notify {
                return Err(generic_api_error());
            }
            Ok(MessageId(777))
        }

        async fn print_receipt(&self, _order: &Order) -> anyhow::Result<()> {
            self.printed.set(true);
            if self.fail_print {
                anyhow::bail!("Failed to reach print service: operation timed out");
            }
            Ok(())
        }

        async fn alert_print_failure(&self, _order: &Order) {
            self.alerted.set(true);
        }
    }

    #[test]
    fn capability_rejection_is_detected_precisely() {
        assert!(is_capability_rejection(&privacy_rejection()));
        assert!(!is_capability_rejection(&generic_api_error()));
    }

    #[tokio::test]
    async fn print_timeout_does_not_suppress_other_sinks() {
        let sinks = RecordingSinks { fail_print: true, ..Default::default() };
        let links = ReplyLinks::load(None);

        run_pipeline(&sinks, &links, &sample_order()).await;

        // Клиент и персонал уже получили свои сообщения, связка записана.
        assert!(sinks.confirmed.get());
        assert!(sinks.notified.get());
        assert_eq!(links.get(777), Some(42));
        assert!(sinks.alerted.get());
    }

    #[tokio::test]
    async fn customer_failure_does_not_block_staff_and_print() {
        let sinks = RecordingSinks { fail_confirm: true, ..Default::default() };
        let links = ReplyLinks::load(None);

        run_pipeline(&sinks, &links, &sample_order()).await;

        assert!(sinks.notified.get());
        assert!(sinks.printed.get());
        assert_eq!(links.get(777), Some(42));
    }

    #[tokio::test]
    async fn staff_failure_still_confirms_and_prints() {
        let sinks = RecordingSinks { fail_notify: true, ..Default::default() };
        let links = ReplyLinks::load(None);

        run_pipeline(&sinks, &links, &sample_order()).await;

        assert!(sinks.confirmed.get());
        assert!(sinks.printed.get());
        // Уведомление не ушло, значит и связки быть не должно.
        assert_eq!(links.get(777), None);
        assert!(!sinks.alerted.get());
    }

    #[tokio::test]
    async fn fallback_retries_once_with_reduced_controls() {
        let calls = Cell::new(0u32);

        let result = send_with_fallback(
            |_kb| {
                let attempt = calls.get() + 1;
                calls.set(attempt);
                async move {
                    if attempt == 1 {
                        Err(privacy_rejection())
                    } else {
                        Ok(777)
                    }
                }
            },
            keyboards::staff_controls(42),
            keyboards::staff_controls_reduced(42),
        )
        .await;

        // Результат именно повторной отправки — его id и пойдёт в ReplyLinks.
        assert_eq!(result.unwrap(), 777);
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test]
    async fn non_capability_errors_are_not_retried() {
        let calls = Cell::new(0u32);

        let result: Result<i32, _> = send_with_fallback(
            |_kb| {
                calls.set(calls.get() + 1);
                async { Err(generic_api_error()) }
            },
            keyboards::staff_controls(42),
            keyboards::staff_controls_reduced(42),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn successful_send_keeps_full_controls() {
        let calls = Cell::new(0u32);

        let result = send_with_fallback(
            |_kb| {
                calls.set(calls.get() + 1);
                async { Ok::<_, RequestError>(1) }
            },
            keyboards::staff_controls(42),
            keyboards::staff_controls_reduced(42),
        )
        .await;

        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls.get(), 1);
    }
}
