#[cfg(test)]
pub mod mock;
mod system;

#[cfg(test)]
pub use self::mock::MockClock;

pub use self::system::SystemClock;

/// Source of time for retransmission timers.
pub trait Clock: Send + Sync {
    fn now(&self) -> std::time::Instant;
}
