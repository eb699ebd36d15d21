use chrono::{DateTime, FixedOffset};
use serde_json::{json, Value};
use teloxide::utils::html;

use super::Order;

const CURRENCY: &str = "฿";

/// Сообщение в чат персонала. HTML-разметка, весь пользовательский
/// текст экранируется — свободные поля заказа не должны ломать вёрстку.
pub fn staff_text(order: &Order) -> String {
    let mut text = format!(
        "✅ <b>Новый заказ</b>\n\
         • <i>Пользователь:</i> {}\n\
         • <i>ID:</i> {}\n\
         • <i>Телефон:</i> {}\n\
         • <i>Адрес:</i> {}\n\
         • <i>Доставка:</i> {} {CURRENCY}\n\
         • <i>Оплата:</i> {}\n",
        html::escape(&order.customer_label),
        order.customer_id,
        html::escape(&order.phone),
        html::escape(&order.address),
        order.delivery_fee,
        html::escape(&order.payment_method),
    );

    if !order.requested_when.is_empty() {
        text.push_str(&format!(
            "• <i>Время заказа:</i> {}\n",
            html::escape(&order.requested_when)
        ));
    }
    if !order.comment.is_empty() {
        text.push_str(&format!(
            "• <i>Комментарий:</i> {}\n",
            html::escape(&order.comment)
        ));
    }

    text.push_str(&format!(
        "\n🍽 <b>Состав заказа:</b>\n{}\n\n💰 <b>Итого (с доставкой):</b> {} {CURRENCY}",
        items_block(order, true),
        order.total,
    ));

    text
}

/// Подтверждение клиенту. Обычный текст, без экранирования.
pub fn customer_text(order: &Order) -> String {
    let mut text = format!(
        "📦 Ваш заказ успешно принят!\n\n\
         Имя: {}\n\
         Телефон: {}\n\
         Адрес: {}\n\
         Оплата: {}\n\
         Доставка: {} {CURRENCY}\n",
        order.customer_label, order.phone, order.address, order.payment_method, order.delivery_fee,
    );

    if !order.requested_when.is_empty() {
        text.push_str(&format!("Время заказа: {}\n", order.requested_when));
    }
    if !order.comment.is_empty() {
        text.push_str(&format!("Комментарий: {}\n", order.comment));
    }

    text.push_str(&format!(
        "\n🧾 Состав заказа:\n{}\n\n💰 Итого: {} {CURRENCY}\n\n\
         Мы скоро свяжемся с вами для подтверждения!",
        items_block(order, false),
        order.total,
    ));

    text
}

/// Плоский JSON для чековой программы.
///
/// Комментарий дублируется под всеми историческими ключами: разные
/// версии печатного сервиса читают разные.
pub fn print_payload(order: &Order, now: DateTime<FixedOffset>) -> Value {
    json!({
        "name": order.customer_label,
        "user_id": order.customer_id,
        "phone": order.phone,
        "address": order.address,
        "delivery": order.delivery_fee,
        "payment": order.payment_method,
        "items": order.items,
        "total": order.total,
        "date": now.format("%Y-%m-%d %H:%M:%S").to_string(),
        "order_time": order.requested_when,
        "comment": order.comment,
        "comments": order.comment,
        "comment_text": order.comment,
        "note": order.comment,
        "notes": order.comment,
    })
}

fn items_block(order: &Order, escape: bool) -> String {
    order
        .items
        .iter()
        .map(|i| {
            let name = if escape { html::escape(&i.name) } else { i.name.clone() };
            format!("- {} ×{} = {} {CURRENCY}", name, i.qty, i.line_total())
        })
        .collect::<Vec<_>>()
        .join("\n")
}
