use crate::constants::retry as retry_constants;
use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use std::time::Duration;

static LEADING_INTEGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d+").expect("leading integer regex"));

/// RFC 850 and asctime forms; RFC 1123 goes through `parse_from_rfc2822`.
const OBSOLETE_HTTP_DATES: &[&str] = &["%A, %d-%b-%y %H:%M:%S GMT", "%a %b %e %H:%M:%S %Y"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub status_codes: Vec<u16>,
    pub respect_retry_after: bool,
    pub retry_on_transport_error: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: retry_constants::MAX_RETRIES,
            base_delay_ms: retry_constants::BASE_DELAY_MS,
            status_codes: retry_constants::STATUS_CODES.to_vec(),
            respect_retry_after: true,
            retry_on_transport_error: true,
        }
    }
}

impl RetryPolicy {
    pub fn should_retry_status(&self, status: u16) -> bool {
        self.status_codes.contains(&status)
    }

    /// `base * 2^(retry-1)` for the 1-based retry number, without jitter.
    pub fn backoff_floor(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(32);
        let factor = 1u64 << exponent;
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
    }

    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let jitter = if self.base_delay_ms > 0 {
            rand::thread_rng().gen_range(0..self.base_delay_ms)
        } else {
            0
        };
        self.backoff_floor(retry) + Duration::from_millis(jitter)
    }

    /// Delay before the given retry. A usable `Retry-After` value replaces the
    /// computed backoff when the policy honors it.
    pub fn delay_for(
        &self,
        retry: u32,
        retry_after: Option<&str>,
        now: DateTime<Utc>,
    ) -> Duration {
        if self.respect_retry_after {
            if let Some(delay) = retry_after.and_then(|value| retry_after_delay(value, now)) {
                return delay;
            }
        }
        self.backoff_delay(retry)
    }
}

/// Parses `Retry-After` as delta-seconds or as an HTTP date. Only the leading
/// integer of a numeric value counts (`1.5` waits one second). Negative
/// values and dates in the past yield zero.
pub fn retry_after_delay(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(prefix) = LEADING_INTEGER.find(trimmed) {
        let seconds = prefix.as_str().parse::<i64>().ok()?;
        return Some(Duration::from_secs(seconds.max(0) as u64));
    }
    let date = parse_http_date(trimmed)?;
    let millis = (date - now).num_milliseconds().max(0);
    Some(Duration::from_millis(millis as u64))
}

fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date.with_timezone(&Utc));
    }
    OBSOLETE_HTTP_DATES.iter().find_map(|format| {
        NaiveDateTime::parse_from_str(value, format)
            .ok()
            .map(|naive| naive.and_utc())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn backoff_floor_doubles() {
        let policy = RetryPolicy {
            base_delay_ms: 100,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.backoff_floor(1), Duration::from_millis(100));
        assert_eq!(policy.backoff_floor(2), Duration::from_millis(200));
        assert_eq!(policy.backoff_floor(3), Duration::from_millis(400));
    }

    #[test]
    fn jitter_stays_below_base() {
        let policy = RetryPolicy {
            base_delay_ms: 50,
            ..RetryPolicy::default()
        };
        for _ in 0..50 {
            let delay = policy.backoff_delay(2);
            assert!(delay >= Duration::from_millis(100));
            assert!(delay < Duration::from_millis(150));
        }
        let zero = RetryPolicy {
            base_delay_ms: 0,
            ..RetryPolicy::default()
        };
        assert_eq!(zero.backoff_delay(3), Duration::ZERO);
    }

    #[test]
    fn retry_after_seconds_and_dates() {
        let now = Utc.with_ymd_and_hms(2015, 10, 21, 7, 28, 0).unwrap();
        assert_eq!(retry_after_delay("2", now), Some(Duration::from_secs(2)));
        assert_eq!(
            retry_after_delay("Wed, 21 Oct 2015 07:28:05 GMT", now),
            Some(Duration::from_secs(5))
        );
        assert_eq!(
            retry_after_delay("Wed, 21 Oct 2015 07:27:00 GMT", now),
            Some(Duration::ZERO)
        );
        assert_eq!(retry_after_delay("soon", now), None);
    }

    #[test]
    fn retry_after_uses_the_leading_integer() {
        let now = Utc.with_ymd_and_hms(2015, 10, 21, 7, 28, 0).unwrap();
        assert_eq!(retry_after_delay("1.5", now), Some(Duration::from_secs(1)));
        assert_eq!(retry_after_delay("-1", now), Some(Duration::ZERO));
        assert_eq!(retry_after_delay(" 3 ", now), Some(Duration::from_secs(3)));
    }

    #[test]
    fn retry_after_accepts_obsolete_date_forms() {
        let now = Utc.with_ymd_and_hms(2015, 10, 21, 7, 28, 0).unwrap();
        assert_eq!(
            retry_after_delay("Wednesday, 21-Oct-15 07:28:05 GMT", now),
            Some(Duration::from_secs(5))
        );
        assert_eq!(
            retry_after_delay("Wed Oct 21 07:28:07 2015", now),
            Some(Duration::from_secs(7))
        );
    }

    #[test]
    fn retry_after_is_ignored_when_disabled() {
        let policy = RetryPolicy {
            base_delay_ms: 10,
            respect_retry_after: false,
            ..RetryPolicy::default()
        };
        let delay = policy.delay_for(1, Some("30"), Utc::now());
        assert!(delay < Duration::from_millis(20));
    }

    #[test]
    fn default_statuses() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry_status(429));
        assert!(policy.should_retry_status(503));
        assert!(!policy.should_retry_status(500));
        assert_eq!(policy.max_retries, 2);
    }
}
