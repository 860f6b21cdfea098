use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use attestra_core::{ActorId, AppResult};
use attestra_domain::{ThrottleConfig, ThrottleLimits, WindowCheck, WindowEntry, check_window};

use super::ports::{WindowSnapshot, WindowStore};
use super::service::ThrottleService;

struct FakeClock {
    millis: AtomicI64,
}

impl FakeClock {
    fn new() -> Self {
        Self {
            millis: AtomicI64::new(0),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + Duration::milliseconds(self.millis.load(Ordering::SeqCst))
    }

    fn advance(&self, millis: i64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }
}

struct FakeWindowStore {
    clock: Arc<FakeClock>,
    entries: Mutex<HashMap<String, WindowEntry>>,
}

impl FakeWindowStore {
    fn new(clock: Arc<FakeClock>) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl WindowStore for FakeWindowStore {
    async fn check(&self, key: &str, limits: ThrottleLimits) -> AppResult<WindowCheck> {
        let mut entries = self.entries.lock().await;
        let (entry, check) = check_window(entries.get(key).copied(), limits, self.clock.now());
        entries.insert(key.to_owned(), entry);
        Ok(check)
    }

    async fn peek(&self, key: &str) -> AppResult<Option<WindowSnapshot>> {
        let now = self.clock.now();
        Ok(self
            .entries
            .lock()
            .await
            .get(key)
            .filter(|entry| now < entry.window_end)
            .map(|entry| WindowSnapshot {
                count: entry.count,
                window_end: entry.window_end,
            }))
    }

    async fn remove_prefix(&self, prefix: &str) -> AppResult<u64> {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok((before - entries.len()) as u64)
    }

    async fn clear(&self) -> AppResult<()> {
        self.entries.lock().await.clear();
        Ok(())
    }

    async fn sweep_expired(&self) -> AppResult<u64> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| now < entry.window_end);
        Ok((before - entries.len()) as u64)
    }
}

fn service_with(entries: &[(&str, u32, i64)]) -> (ThrottleService, Arc<FakeClock>) {
    let clock = Arc::new(FakeClock::new());
    let store = Arc::new(FakeWindowStore::new(clock.clone()));
    let config = ThrottleConfig {
        policies: entries
            .iter()
            .map(|(operation, max_requests, window_millis)| {
                (
                    (*operation).to_owned(),
                    ThrottleLimits {
                        max_requests: *max_requests,
                        window_millis: *window_millis,
                    },
                )
            })
            .collect(),
    };

    (ThrottleService::new(store, config), clock)
}

fn actor(value: &str) -> ActorId {
    ActorId::new(value).unwrap_or_else(|_| unreachable!())
}

#[tokio::test]
async fn three_requests_count_down_then_fourth_is_limited() {
    let (service, _clock) = service_with(&[("create", 3, 300_000)]);
    let user = actor("U1");

    let mut remaining_seen = Vec::new();
    for _ in 0..3 {
        let check = service.check_operation(&user, "create").await;
        assert!(check.is_ok());
        let check = check.unwrap_or_else(|_| unreachable!());
        assert!(!check.limited);
        remaining_seen.push(check.remaining);
    }
    assert_eq!(remaining_seen, vec![2, 1, 0]);

    let fourth = service.check_operation(&user, "create").await;
    assert!(fourth.is_ok());
    let fourth = fourth.unwrap_or_else(|_| unreachable!());
    assert!(fourth.limited);
    assert_eq!(fourth.remaining, 0);
}

#[tokio::test]
async fn exhausted_counter_recovers_after_the_window() {
    let (service, clock) = service_with(&[("create", 3, 300_000)]);
    let user = actor("U1");

    for _ in 0..4 {
        let check = service.check_operation(&user, "create").await;
        assert!(check.is_ok());
    }

    clock.advance(300_000);

    let check = service.check_operation(&user, "create").await;
    assert!(check.is_ok());
    let check = check.unwrap_or_else(|_| unreachable!());
    assert!(!check.limited);
    assert_eq!(check.remaining, 2);
}

#[tokio::test]
async fn info_never_mutates_the_counter() {
    let (service, _clock) = service_with(&[("create", 3, 300_000)]);
    let user = actor("U1");

    let first = service.check_operation(&user, "create").await;
    assert!(first.is_ok());

    for _ in 0..5 {
        let status = service.info(&user, "create").await;
        assert!(status.is_ok());
        let status = status.unwrap_or_else(|_| unreachable!());
        assert_eq!(status.count, 1);
        assert_eq!(status.remaining, 2);
        assert!(!status.limited);
        assert!(status.reset_at.is_some());
    }

    let second = service.check_operation(&user, "create").await;
    assert!(second.is_ok());
    assert_eq!(second.unwrap_or_else(|_| unreachable!()).remaining, 1);
}

#[tokio::test]
async fn info_reports_fresh_state_for_an_unused_counter() {
    let (service, _clock) = service_with(&[("create", 3, 300_000)]);

    let status = service.info(&actor("U1"), "create").await;
    assert!(status.is_ok());
    let status = status.unwrap_or_else(|_| unreachable!());
    assert_eq!(status.count, 0);
    assert_eq!(status.remaining, 3);
    assert!(status.reset_at.is_none());
    assert!(!status.limited);
}

#[tokio::test]
async fn reset_clears_one_actor_and_leaves_others_limited() {
    let (service, _clock) = service_with(&[("create", 1, 300_000)]);
    let left = actor("U1");
    let right = actor("U2");

    for user in [&left, &right] {
        let check = service.check_operation(user, "create").await;
        assert!(check.is_ok());
    }

    let removed = service.reset(&left).await;
    assert!(removed.is_ok());
    assert_eq!(removed.unwrap_or_default(), 1);

    let left_check = service.check_operation(&left, "create").await;
    assert!(left_check.is_ok());
    assert!(!left_check.unwrap_or_else(|_| unreachable!()).limited);

    let right_check = service.check_operation(&right, "create").await;
    assert!(right_check.is_ok());
    assert!(right_check.unwrap_or_else(|_| unreachable!()).limited);
}

#[tokio::test]
async fn clear_all_restores_fresh_limiter_behavior() {
    let (service, _clock) = service_with(&[("create", 3, 300_000)]);
    let user = actor("U1");

    for _ in 0..4 {
        let check = service.check_operation(&user, "create").await;
        assert!(check.is_ok());
    }

    assert!(service.clear_all().await.is_ok());

    let check = service.check_operation(&user, "create").await;
    assert!(check.is_ok());
    let check = check.unwrap_or_else(|_| unreachable!());
    assert!(!check.limited);
    assert_eq!(check.remaining, 2);
}

#[tokio::test]
async fn unconfigured_operation_falls_back_to_default_then_hardcoded() {
    let (service, _clock) = service_with(&[("default", 1, 300_000)]);
    let user = actor("U1");

    let first = service.check_operation(&user, "rename").await;
    assert!(first.is_ok());
    assert_eq!(first.unwrap_or_else(|_| unreachable!()).remaining, 0);

    let second = service.check_operation(&user, "rename").await;
    assert!(second.is_ok());
    assert!(second.unwrap_or_else(|_| unreachable!()).limited);

    // No table at all: the hardcoded 5-per-5-minutes fallback applies.
    let (bare, _clock) = service_with(&[]);
    let check = bare.check_operation(&user, "rename").await;
    assert!(check.is_ok());
    assert_eq!(check.unwrap_or_else(|_| unreachable!()).remaining, 4);
}
