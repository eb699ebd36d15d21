mod format;
mod normalize;

pub use format::{customer_text, print_payload, staff_text};
pub use normalize::parse_order;

use chrono::FixedOffset;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Часовой пояс ресторана (Бангкок, UTC+7).
/// Все даты заказов и чеков считаются в нём, а не в системном поясе сервера.
pub static BKK_TZ: Lazy<FixedOffset> = Lazy::new(|| FixedOffset::east_opt(7 * 3600).unwrap());

/// Нормализованный заказ из Web App. Неизменяем после сборки.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub customer_id: i64,
    pub customer_label: String,
    pub payment_method: String,
    pub phone: String,
    pub address: String,
    /// Пустая строка, если клиент ничего не написал.
    pub comment: String,
    pub delivery_fee: i64,
    pub total: i64,
    pub items: Vec<OrderItem>,
    /// Пустая строка = "как можно скорее" / не указано.
    pub requested_when: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub qty: i64,
    pub price: i64,
}

impl OrderItem {
    /// Сумма позиции. Насыщение вместо переполнения: qty и price приходят
    /// из недоверенного payload и могут быть сколь угодно большими.
    pub fn line_total(&self) -> i64 {
        self.qty.saturating_mul(self.price)
    }
}
