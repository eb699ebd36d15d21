use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use dashmap::DashMap;
use log::{info, warn};

/// Соответствие "сообщение в чате персонала → клиент".
///
/// За один запуск записи только добавляются. При заданном файле таблица
/// переживает перезапуск: на каждом обновлении файл переписывается целиком.
pub struct ReplyLinks {
    inner: DashMap<i32, i64>,
    path: Option<PathBuf>,
}

impl ReplyLinks {
    /// Поднимает таблицу из файла, если он задан и читается.
    /// Битый или отсутствующий файл — не ошибка, стартуем с пустой.
    pub fn load(path: Option<PathBuf>) -> Self {
        let inner = DashMap::new();

        if let Some(p) = &path {
            match fs::read_to_string(p) {
                Ok(raw) => match serde_json::from_str::<BTreeMap<String, i64>>(&raw) {
                    Ok(saved) => {
                        for (msg_id, customer_id) in saved {
                            if let Ok(id) = msg_id.parse::<i32>() {
                                inner.insert(id, customer_id);
                            }
                        }
                        info!("💾 Загружено {} связок ответов из {:?}", inner.len(), p);
                    }
                    Err(e) => warn!("⚠️ Файл состояния {:?} не разобрался: {}", p, e),
                },
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("⚠️ Файл состояния {:?} не читается: {}", p, e),
            }
        }

        Self { inner, path }
    }

    pub fn insert(&self, staff_msg_id: i32, customer_id: i64) {
        self.inner.insert(staff_msg_id, customer_id);
    }

    pub fn get(&self, staff_msg_id: i32) -> Option<i64> {
        self.inner.get(&staff_msg_id).map(|r| *r.value())
    }

    /// Полная перезапись файла состояния. Без файла — no-op.
    pub fn persist(&self) -> Result<()> {
        let Some(p) = &self.path else {
            return Ok(());
        };

        let snapshot: BTreeMap<String, i64> = self
            .inner
            .iter()
            .map(|r| (r.key().to_string(), *r.value()))
            .collect();

        let raw = serde_json::to_string(&snapshot).context("serialize reply links")?;
        fs::write(p, raw).with_context(|| format!("write reply links to {:?}", p))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

/// Состояние оператора в ручном режиме ответа клиенту.
#[derive(Debug, Clone, PartialEq)]
pub enum OperatorState {
    Idle,
    AwaitingText { customer_id: i64 },
}

/// Ожидающие ответы персонала: оператор → клиент.
/// У оператора не больше одного ожидающего ответа, новый затирает старый.
#[derive(Default)]
pub struct PendingReplies {
    inner: DashMap<u64, i64>,
}

impl PendingReplies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, operator: u64) -> OperatorState {
        match self.inner.get(&operator) {
            Some(r) => OperatorState::AwaitingText { customer_id: *r.value() },
            None => OperatorState::Idle,
        }
    }

    /// Idle | AwaitingText → AwaitingText{customer_id}.
    pub fn begin(&self, operator: u64, customer_id: i64) {
        self.inner.insert(operator, customer_id);
    }

    /// AwaitingText → Idle, отдаёт адресата. В Idle возвращает None.
    pub fn take(&self, operator: u64) -> Option<i64> {
        self.inner.remove(&operator).map(|(_, customer_id)| customer_id)
    }

    /// AwaitingText → Idle по /cancel. true, если было что отменять.
    pub fn cancel(&self, operator: u64) -> bool {
        self.inner.remove(&operator).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_reply_transitions() {
        let pending = PendingReplies::new();
        assert_eq!(pending.state(1), OperatorState::Idle);

        pending.begin(1, 100);
        assert_eq!(pending.state(1), OperatorState::AwaitingText { customer_id: 100 });

        // Новый запрос затирает старый.
        pending.begin(1, 200);
        assert_eq!(pending.state(1), OperatorState::AwaitingText { customer_id: 200 });

        assert_eq!(pending.take(1), Some(200));
        assert_eq!(pending.state(1), OperatorState::Idle);
        assert_eq!(pending.take(1), None);
    }

    #[test]
    fn cancel_only_reports_true_when_pending() {
        let pending = PendingReplies::new();
        assert!(!pending.cancel(7));

        pending.begin(7, 300);
        assert!(pending.cancel(7));
        assert_eq!(pending.state(7), OperatorState::Idle);
    }

    #[test]
    fn operators_do_not_interfere() {
        let pending = PendingReplies::new();
        pending.begin(1, 100);
        pending.begin(2, 200);

        assert_eq!(pending.take(1), Some(100));
        assert_eq!(pending.state(2), OperatorState::AwaitingText { customer_id: 200 });
    }

    #[test]
    fn reply_links_survive_persist_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("links.json");

        let links = ReplyLinks::load(Some(path.clone()));
        links.insert(10, 111);
        links.insert(11, 222);
        links.persist().unwrap();

        let restored = ReplyLinks::load(Some(path));
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.get(10), Some(111));
        assert_eq!(restored.get(11), Some(222));
        assert_eq!(restored.get(12), None);
    }

    #[test]
    fn corrupt_state_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("links.json");
        std::fs::write(&path, "{{{not json").unwrap();

        let links = ReplyLinks::load(Some(path));
        assert_eq!(links.len(), 0);
    }

    #[test]
    fn no_path_means_no_op_persist() {
        let links = ReplyLinks::load(None);
        links.insert(1, 2);
        assert!(links.persist().is_ok());
    }
}
