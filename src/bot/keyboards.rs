use teloxide::types::{
    ButtonRequest, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup,
    WebAppInfo,
};
use url::Url;

/// Главная клавиатура клиента: одна кнопка, открывающая меню как Web App.
pub fn main_menu(menu_url: &Url) -> KeyboardMarkup {
    let menu_btn = KeyboardButton::new("📋 Открыть меню")
        .request(ButtonRequest::WebApp(WebAppInfo { url: menu_url.clone() }));

    KeyboardMarkup::new(vec![vec![menu_btn]]).resize_keyboard()
}

/// Полный набор кнопок под заказом в чате персонала:
/// профиль клиента + запуск ответа.
pub fn staff_controls(customer_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::url("👤 Профиль", profile_url(customer_id)),
        reply_button(customer_id),
    ]])
}

/// Урезанный набор для повтора после BUTTON_USER_PRIVACY_RESTRICTED:
/// приватность клиента запрещает кнопку профиля, остаётся только ответ.
pub fn staff_controls_reduced(customer_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![reply_button(customer_id)]])
}

fn reply_button(customer_id: i64) -> InlineKeyboardButton {
    InlineKeyboardButton::callback("✉️ Ответить", format!("reply:{customer_id}"))
}

fn profile_url(customer_id: i64) -> Url {
    Url::parse(&format!("tg://user?id={customer_id}")).expect("tg profile url is always valid")
}
