//! 时钟抽象
//!
//! Token 的签发时间和过期校验都依赖"当前时间"。生产环境使用 [`SystemClock`]，
//! 测试或需要确定性结果的场景使用 [`FixedClock`]。
//!
//! ```rust
//! use passwordless::clock::{Clock, FixedClock};
//!
//! let clock = FixedClock::at_timestamp(1_700_000_000);
//! assert_eq!(clock.timestamp(), 1_700_000_000);
//!
//! clock.advance_secs(60);
//! assert_eq!(clock.timestamp(), 1_700_000_060);
//! ```

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// 当前时间来源
pub trait Clock: Send + Sync {
    /// 当前 UTC 时间
    fn now(&self) -> DateTime<Utc>;

    /// 当前 Unix 时间戳（秒）
    fn timestamp(&self) -> i64 {
        self.now().timestamp()
    }
}

/// 系统时钟
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 固定时钟
///
/// 精度为秒，可通过 [`set`](FixedClock::set) / [`advance_secs`](FixedClock::advance_secs)
/// 手动拨动，多线程共享时无需加锁。
#[derive(Debug, Default)]
pub struct FixedClock {
    seconds: AtomicI64,
}

impl FixedClock {
    /// 固定在指定时间（秒以下部分被截断）
    pub fn new(at: DateTime<Utc>) -> Self {
        Self::at_timestamp(at.timestamp())
    }

    /// 固定在指定 Unix 时间戳
    pub fn at_timestamp(seconds: i64) -> Self {
        Self {
            seconds: AtomicI64::new(seconds),
        }
    }

    /// 重新设置时间
    pub fn set(&self, seconds: i64) {
        self.seconds.store(seconds, Ordering::SeqCst);
    }

    /// 向前拨动时间
    pub fn advance_secs(&self, seconds: i64) {
        self.seconds.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.timestamp(), 0).unwrap_or_default()
    }

    fn timestamp(&self) -> i64 {
        self.seconds.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_current() {
        let before = Utc::now().timestamp();
        let now = SystemClock.timestamp();
        let after = Utc::now().timestamp();
        assert!(now >= before && now <= after);
    }

    #[test]
    fn test_fixed_clock_set_and_advance() {
        let clock = FixedClock::at_timestamp(1_000);
        assert_eq!(clock.timestamp(), 1_000);

        clock.advance_secs(3601);
        assert_eq!(clock.timestamp(), 4_601);

        clock.set(42);
        assert_eq!(clock.timestamp(), 42);
        assert_eq!(clock.now().timestamp(), 42);
    }

    #[test]
    fn test_fixed_clock_truncates_subseconds() {
        let at = DateTime::from_timestamp(1_700_000_000, 999_000_000).unwrap();
        let clock = FixedClock::new(at);
        assert_eq!(clock.now().timestamp_subsec_nanos(), 0);
        assert_eq!(clock.timestamp(), 1_700_000_000);
    }
}
