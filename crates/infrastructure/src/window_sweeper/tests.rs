use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};

use attestra_application::{Clock, WindowStore};
use attestra_domain::ThrottleLimits;

use crate::InMemoryWindowStore;

use super::WindowSweeper;

struct FakeClock {
    millis: AtomicI64,
}

impl FakeClock {
    fn new() -> Self {
        Self {
            millis: AtomicI64::new(0),
        }
    }

    fn advance(&self, millis: i64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + Duration::milliseconds(self.millis.load(Ordering::SeqCst))
    }
}

#[tokio::test]
async fn sweeps_dead_entries_and_stops_without_touching_live_ones() {
    let clock = Arc::new(FakeClock::new());
    let store = Arc::new(InMemoryWindowStore::new(clock.clone()));

    let short = ThrottleLimits {
        max_requests: 3,
        window_millis: 1_000,
    };
    let long = ThrottleLimits {
        max_requests: 3,
        window_millis: 3_600_000,
    };

    for key in ["U1:create", "U2:create"] {
        let check = store.check(key, short).await;
        assert!(check.is_ok());
    }
    let check = store.check("U3:create", long).await;
    assert!(check.is_ok());

    clock.advance(5_000);

    let sweeper = WindowSweeper::start(store.clone(), StdDuration::from_millis(5));
    tokio::time::sleep(StdDuration::from_millis(50)).await;
    sweeper.stop().await;

    // The background task already removed the two dead entries.
    let swept = store.sweep_expired().await;
    assert!(swept.is_ok());
    assert_eq!(swept.unwrap_or_default(), 0);

    let survivor = store.peek("U3:create").await;
    assert!(survivor.is_ok());
    assert!(survivor.unwrap_or_default().is_some());
}
