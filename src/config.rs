//! Billing configuration
//!
//! Defaults match the production constants; every value can be overridden
//! through the fluent `with_*` methods (the binary wires them to CLI flags and
//! environment variables).

use std::time::Duration;

use crate::scheduler::Schedule;

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const DEFAULT_QUEUE_CAPACITY: usize = 50;
pub const DEFAULT_MAX_IN_FLIGHT: usize = 50;
pub const DEFAULT_RETRY_BASE: Duration = Duration::from_millis(10);
pub const DEFAULT_RETRY_MAX: Duration = Duration::from_secs(10);
pub const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 8;
pub const DEFAULT_BOOT_DELAY: Duration = Duration::from_secs(20);

/// Backoff for transient payment failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    pub base: Duration,
    pub max: Duration,
    /// Total charge attempts per invoice; `None` retries until a
    /// non-transient outcome is observed
    pub max_attempts: Option<u32>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base: DEFAULT_RETRY_BASE,
            max: DEFAULT_RETRY_MAX,
            max_attempts: Some(DEFAULT_RETRY_MAX_ATTEMPTS),
        }
    }
}

/// When the scheduler triggers runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub run_on_boot: bool,
    pub boot_delay: Duration,
    pub schedule: Schedule,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            run_on_boot: true,
            boot_delay: DEFAULT_BOOT_DELAY,
            schedule: Schedule::Monthly,
        }
    }
}

/// Settings for one orchestrator instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingConfig {
    /// Customers fetched per page
    pub page_size: usize,
    /// Capacity of the bounded customer queue between paging and workers
    pub queue_capacity: usize,
    /// Customer workers allowed to run at the same time
    pub max_in_flight: usize,
    pub retry: RetryConfig,
    pub schedule: ScheduleConfig,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            retry: RetryConfig::default(),
            schedule: ScheduleConfig::default(),
        }
    }
}

impl BillingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = size.max(1);
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    pub fn with_max_in_flight(mut self, workers: usize) -> Self {
        self.max_in_flight = workers.max(1);
        self
    }

    /// Set the backoff bounds; `max` is raised to `base` if smaller
    pub fn with_retry_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.retry.base = base;
        self.retry.max = max.max(base);
        self
    }

    /// Cap total charge attempts per invoice (`None` for no ceiling)
    pub fn with_max_attempts(mut self, attempts: Option<u32>) -> Self {
        self.retry.max_attempts = attempts.map(|n| n.max(1));
        self
    }

    pub fn with_schedule(mut self, schedule: ScheduleConfig) -> Self {
        self.schedule = schedule;
        self
    }
}
