use teloxide::types::User;

/// Подпись клиента: ник, иначе имя из профиля, иначе заглушка.
pub fn customer_label(user: &User) -> String {
    match &user.username {
        Some(username) => format!("@{}", username),
        None => {
            let name = user.full_name();
            if name.is_empty() {
                "Без имени".to_string()
            } else {
                name
            }
        }
    }
}

/// Данные callback-кнопки "Ответить": `reply:<customer_id>`.
pub fn parse_reply_callback(data: &str) -> Option<i64> {
    data.strip_prefix("reply:")?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::UserId;

    fn user(username: Option<&str>, first: &str, last: Option<&str>) -> User {
        User {
            id: UserId(1),
            is_bot: false,
            first_name: first.to_string(),
            last_name: last.map(str::to_string),
            username: username.map(str::to_string),
            language_code: None,
            is_premium: false,
            added_to_attachment_menu: false,
        }
    }

    #[test]
    fn username_wins_over_full_name() {
        assert_eq!(customer_label(&user(Some("bbq_fan"), "Иван", None)), "@bbq_fan");
    }

    #[test]
    fn full_name_used_without_username() {
        assert_eq!(customer_label(&user(None, "Иван", Some("Петров"))), "Иван Петров");
    }

    #[test]
    fn placeholder_when_profile_is_empty() {
        assert_eq!(customer_label(&user(None, "", None)), "Без имени");
    }

    #[test]
    fn reply_callback_parsing() {
        assert_eq!(parse_reply_callback("reply:12345"), Some(12345));
        assert_eq!(parse_reply_callback("reply:-100"), Some(-100));
        assert_eq!(parse_reply_callback("reply:abc"), None);
        assert_eq!(parse_reply_callback("noop"), None);
    }
}
