use std::collections::HashMap;
use std::sync::Arc;
use teloxide::types::ChatId;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

use crate::core::config;

/// Rate limiter для ограничения частоты поисковых запросов.
///
/// Хранит для каждого чата момент, до которого новый поиск запрещён.
#[derive(Clone)]
pub struct RateLimiter {
    /// Момент снятия ограничения для каждого чата
    limits: Arc<Mutex<HashMap<ChatId, Instant>>>,
    /// Минимальный интервал между запросами
    cooldown: Duration,
}

impl RateLimiter {
    /// Создает rate limiter с интервалом из конфигурации (2 секунды).
    pub fn new() -> Self {
        Self::with_cooldown(config::rate_limit::duration())
    }

    /// Создает rate limiter с заданным интервалом.
    pub fn with_cooldown(cooldown: Duration) -> Self {
        Self {
            limits: Arc::new(Mutex::new(HashMap::new())),
            cooldown,
        }
    }

    /// Проверяет чат и, если ограничения нет, сразу фиксирует новый запрос.
    ///
    /// # Returns
    ///
    /// `Some(remaining)` если чат ещё ограничен, иначе `None`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use teloxide::types::ChatId;
    /// use gostbot::core::rate_limiter::RateLimiter;
    ///
    /// # async fn example() {
    /// let limiter = RateLimiter::new();
    /// if let Some(remaining) = limiter.check(ChatId(123456789)).await {
    ///     println!("Осталось ждать: {:?}", remaining);
    /// }
    /// # }
    /// ```
    pub async fn check(&self, chat_id: ChatId) -> Option<Duration> {
        let mut limits = self.limits.lock().await;
        let now = Instant::now();
        if let Some(&until) = limits.get(&chat_id) {
            if now < until {
                return Some(until - now);
            }
        }
        limits.insert(chat_id, now + self.cooldown);
        None
    }

    /// Удаляет ограничение для указанного чата.
    pub async fn reset(&self, chat_id: ChatId) {
        let mut limits = self.limits.lock().await;
        limits.remove(&chat_id);
    }

    /// Удаляет все истёкшие записи. Возвращает количество удалённых.
    pub async fn cleanup_expired(&self) -> usize {
        let mut limits = self.limits.lock().await;
        let now = Instant::now();
        let before = limits.len();
        limits.retain(|_, until| *until > now);
        before - limits.len()
    }

    /// Запускает фоновую очистку истёкших записей.
    pub fn spawn_cleanup_task(self: Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let removed = self.cleanup_expired().await;
                if removed > 0 {
                    log::debug!("Rate limiter cleanup removed {} entries", removed);
                }
            }
        })
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_request_passes_second_is_limited() {
        let limiter = RateLimiter::with_cooldown(Duration::from_secs(60));
        let chat = ChatId(1);

        assert!(limiter.check(chat).await.is_none());
        let remaining = limiter.check(chat).await.unwrap();
        assert!(remaining <= Duration::from_secs(60));

        // Other chats are independent
        assert!(limiter.check(ChatId(2)).await.is_none());
    }

    #[tokio::test]
    async fn test_reset_lifts_limit() {
        let limiter = RateLimiter::with_cooldown(Duration::from_secs(60));
        let chat = ChatId(7);

        limiter.check(chat).await;
        limiter.reset(chat).await;
        assert!(limiter.check(chat).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_removes_expired_entries() {
        let limiter = RateLimiter::with_cooldown(Duration::from_millis(100));
        limiter.check(ChatId(1)).await;
        limiter.check(ChatId(2)).await;

        tokio::time::advance(Duration::from_millis(150)).await;

        assert_eq!(limiter.cleanup_expired().await, 2);
        assert!(limiter.check(ChatId(1)).await.is_none());
    }
}
