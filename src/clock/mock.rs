use crate::Clock;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// A clock that only moves when told to.
#[derive(Clone)]
pub struct MockClock {
    inner: Arc<Mutex<Instant>>,
}

impl MockClock {
    pub fn new(start: Instant) -> Self {
        MockClock {
            inner: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, d: Duration) {
        *self.inner.lock().unwrap() += d;
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        *self.inner.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance() {
        let start = Instant::now();
        let clock = MockClock::new(start);
        let shared = clock.clone();

        shared.advance(Duration::from_millis(250));
        assert_eq!(clock.now() - start, Duration::from_millis(250));
    }
}
