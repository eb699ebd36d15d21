use chrono::{DateTime, FixedOffset, NaiveDate};
use serde_json::Value;

use super::{Order, OrderItem};

pub(crate) const NOT_PROVIDED: &str = "не указан";
pub(crate) const NOT_CHOSEN: &str = "не выбран";

/// Старые версии формы присылали комментарий под разными ключами.
/// Порядок важен: берём первый непустой.
const COMMENT_ALIASES: [&str; 5] = ["comment", "comments", "comment_text", "note", "notes"];

/// Разбирает сырую строку из Web App в нормализованный заказ.
///
/// Наружу выходит только ошибка декодирования JSON верхнего уровня.
/// Любое структурное безобразие внутри (не те типы, пропуски, мусорные
/// позиции) гасится дефолтами и никогда не роняет обработку заказа.
pub fn parse_order(
    raw: &str,
    customer_id: i64,
    customer_label: String,
    now: DateTime<FixedOffset>,
) -> Result<Order, serde_json::Error> {
    let data: Value = serde_json::from_str(raw)?;

    Ok(Order {
        customer_id,
        customer_label,
        payment_method: coerce_str(data.get("payMethod"), NOT_CHOSEN),
        phone: coerce_str(data.get("phone"), NOT_PROVIDED),
        address: coerce_str(data.get("address"), NOT_PROVIDED),
        comment: resolve_comment(&data),
        delivery_fee: coerce_int(data.get("delivery")),
        total: coerce_int(data.get("total")),
        items: collect_items(&data),
        requested_when: resolve_requested_when(&data, now),
    })
}

/// Строковое поле: отсутствие, null и не-строка дают плейсхолдер.
fn coerce_str(value: Option<&Value>, placeholder: &str) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        _ => placeholder.to_string(),
    }
}

/// Числовое поле: целое как есть, дробное усекается, числовая строка
/// парсится, всё остальное — 0. Отрицательные значения прижимаются к 0.
fn coerce_int(value: Option<&Value>) -> i64 {
    let n = match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
                .unwrap_or(0)
        }
        _ => 0,
    };
    n.max(0)
}

fn resolve_comment(data: &Value) -> String {
    for key in COMMENT_ALIASES {
        if let Some(Value::String(s)) = data.get(key) {
            // Ведущие ';' — артефакт склейки строк в старой версии формы.
            let cleaned = s.trim_start_matches(';').trim();
            if !cleaned.is_empty() {
                return cleaned.to_string();
            }
        }
    }
    String::new()
}

/// Позиции заказа: значение каждой записи обязано быть объектом,
/// остальные молча пропускаются.
fn collect_items(data: &Value) -> Vec<OrderItem> {
    let Some(items) = data.get("items").and_then(Value::as_object) else {
        return Vec::new();
    };

    items
        .iter()
        .filter(|(_, info)| info.is_object())
        .map(|(name, info)| OrderItem {
            name: name.clone(),
            qty: coerce_int(info.get("qty")),
            price: coerce_int(info.get("price")),
        })
        .collect()
}

/// Желаемое время заказа.
///
/// "soonest" — дата из формы, иначе сегодняшняя в банкокском поясе.
/// Пара дата+время рендерится как "DD.MM в HH:MM"; если дата не
/// разобралась — сырые строки через пробел. Любой сбой даёт пустую
/// строку, но не ошибку.
fn resolve_requested_when(data: &Value, now: DateTime<FixedOffset>) -> String {
    let order_date = data.get("orderDate").and_then(Value::as_str);
    let order_time = data.get("orderTime").and_then(Value::as_str);

    if data.get("orderWhen").and_then(Value::as_str) == Some("soonest") {
        let date = order_date
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            .unwrap_or_else(|| now.date_naive());
        return format!("{}, ближайшее", date.format("%d.%m"));
    }

    match (order_date, order_time) {
        (Some(date), Some(time)) => match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
            Ok(d) => format!("{} в {}", d.format("%d.%m"), time),
            Err(_) => format!("{} {}", date, time),
        },
        _ => String::new(),
    }
}
