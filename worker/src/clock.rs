use time::OffsetDateTime;

/// Source of game ids and creation timestamps.
pub trait Clock {
    /// Current time in unix milliseconds.
    fn now_millis(&self) -> i64;
}

#[derive(Copy, Clone, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
    }
}

/// Clock advancing one millisecond per reading.
#[cfg(test)]
#[derive(Debug)]
pub(crate) struct StepClock(std::sync::atomic::AtomicI64);

#[cfg(test)]
impl StepClock {
    pub(crate) fn starting_at(millis: i64) -> Self {
        Self(std::sync::atomic::AtomicI64::new(millis))
    }
}

#[cfg(test)]
impl Clock for StepClock {
    fn now_millis(&self) -> i64 {
        self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed)
    }
}

/// Clock frozen at one instant.
#[cfg(test)]
#[derive(Debug)]
pub(crate) struct FrozenClock(pub(crate) i64);

#[cfg(test)]
impl Clock for FrozenClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}
