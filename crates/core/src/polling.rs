use std::time::Duration;

/// Delay before the first poll of a freshly created teaching job.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(15);
/// Spacing between polls once the initial delay has passed.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);
/// Total time a job may stay pending before the session gives up.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(5 * 60);

/// Timing rules for polling a teaching job.
///
/// All durations are measured from the first observation of the job (the
/// moment its id was received), never from wall-clock ticks, so a slow poll
/// response pushes the next poll back instead of stacking requests.
///
/// # Examples
///
/// ```
/// # use learn_core::polling::PollPolicy;
/// # use std::time::Duration;
/// let policy = PollPolicy::default();
/// assert_eq!(policy.next_poll_delay(Duration::ZERO), Duration::from_secs(15));
/// assert_eq!(policy.next_poll_delay(Duration::from_secs(10)), Duration::from_secs(5));
/// assert_eq!(policy.next_poll_delay(Duration::from_secs(16)), Duration::from_secs(2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    initial_delay: Duration,
    interval: Duration,
    max_wait: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_delay: DEFAULT_INITIAL_DELAY,
            interval: DEFAULT_INTERVAL,
            max_wait: Some(DEFAULT_MAX_WAIT),
        }
    }
}

impl PollPolicy {
    #[must_use]
    pub fn new(initial_delay: Duration, interval: Duration) -> Self {
        Self {
            initial_delay,
            interval,
            max_wait: Some(DEFAULT_MAX_WAIT),
        }
    }

    /// Replace the pending-job ceiling. `None` polls until a result arrives.
    #[must_use]
    pub fn with_max_wait(mut self, max_wait: Option<Duration>) -> Self {
        self.max_wait = max_wait;
        self
    }

    #[must_use]
    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[must_use]
    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait
    }

    /// How long to wait before the next poll, given the time elapsed since
    /// the job was first observed.
    #[must_use]
    pub fn next_poll_delay(&self, elapsed_since_first_observation: Duration) -> Duration {
        if elapsed_since_first_observation < self.initial_delay {
            self.initial_delay - elapsed_since_first_observation
        } else {
            self.interval
        }
    }

    /// Whether a job pending for `elapsed` has exceeded the ceiling.
    #[must_use]
    pub fn has_expired(&self, elapsed: Duration) -> bool {
        self.max_wait.is_some_and(|max| elapsed >= max)
    }
}
