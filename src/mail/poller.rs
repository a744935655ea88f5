use anyhow::Result;
use log::{debug, info, warn};
use std::thread;
use std::time::{Duration, Instant};

use crate::domain::email::MessageId;

/// Timing of a bounded search loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Wait before the first attempt, giving the provider time to index new mail.
    pub poll_delay: Duration,
    pub poll_interval: Duration,
    /// Overall budget, measured from the start of the call.
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            poll_delay: Duration::from_secs(10),
            poll_interval: Duration::from_secs(5),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Run `search` until it returns at least one id or `policy.timeout` runs out.
///
/// Running out of time is not an error: the caller gets an empty list. A failed
/// attempt is logged and counts as "nothing yet".
pub fn poll_messages<F>(query: &str, mut search: F, policy: &PollPolicy) -> Vec<MessageId>
where
    F: FnMut(&str) -> Result<Vec<MessageId>>,
{
    let started = Instant::now();
    // None: the timeout is too large to represent, so there is no deadline.
    let deadline = started.checked_add(policy.timeout);

    thread::sleep(policy.poll_delay.min(policy.timeout));

    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match search(query) {
            Ok(ids) if !ids.is_empty() => {
                info!(
                    "'{query}' matched {} message(s) on attempt {attempt} after {:?}",
                    ids.len(),
                    started.elapsed()
                );
                return ids;
            }
            Ok(_) => debug!("attempt {attempt}: nothing for '{query}' yet"),
            Err(e) => warn!("attempt {attempt}: querying for '{query}' failed: {e:#}"),
        }

        let wait = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                policy.poll_interval.min(deadline - now)
            }
            None => policy.poll_interval,
        };
        thread::sleep(wait);
    }

    warn!(
        "no messages found for '{query}' within {:?} ({attempt} attempts)",
        policy.timeout
    );
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn fast(interval_ms: u64, timeout_ms: u64) -> PollPolicy {
        PollPolicy {
            poll_delay: Duration::ZERO,
            poll_interval: Duration::from_millis(interval_ms),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    #[test]
    fn default_policy_matches_documented_values() {
        let p = PollPolicy::default();
        assert_eq!(p.poll_delay, Duration::from_secs(10));
        assert_eq!(p.poll_interval, Duration::from_secs(5));
        assert_eq!(p.timeout, Duration::from_secs(120));
    }

    #[test]
    fn returns_on_first_non_empty_attempt() {
        let mut calls = 0;
        let ids = poll_messages(
            "subject:reset",
            |_| {
                calls += 1;
                Ok(if calls < 4 { vec![] } else { vec!["m1".to_string()] })
            },
            &fast(1, 5_000),
        );
        assert_eq!(ids, vec!["m1".to_string()]);
        assert_eq!(calls, 4);
    }

    #[test]
    fn passes_query_through() {
        let mut seen = Vec::new();
        poll_messages(
            "from:shop@x.test",
            |q| {
                seen.push(q.to_string());
                Ok(vec!["1".to_string()])
            },
            &fast(1, 100),
        );
        assert_eq!(seen, vec!["from:shop@x.test".to_string()]);
    }

    #[test]
    fn times_out_with_empty_result() {
        let mut calls = 0;
        let started = Instant::now();
        let ids = poll_messages(
            "q",
            |_| {
                calls += 1;
                Ok(vec![])
            },
            &fast(5, 40),
        );
        assert!(ids.is_empty());
        assert!(calls >= 2, "only {calls} attempts");
        assert!(started.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    fn zero_timeout_makes_a_single_attempt() {
        let mut calls = 0;
        let ids = poll_messages(
            "q",
            |_| {
                calls += 1;
                Ok(vec![])
            },
            &fast(0, 0),
        );
        assert!(ids.is_empty());
        assert_eq!(calls, 1);
    }

    #[test]
    fn errors_count_as_no_result() {
        let mut calls = 0;
        let ids = poll_messages(
            "q",
            |_| {
                calls += 1;
                if calls < 3 {
                    Err(anyhow!("connection reset"))
                } else {
                    Ok(vec!["7".to_string(), "9".to_string()])
                }
            },
            &fast(1, 5_000),
        );
        assert_eq!(ids, vec!["7".to_string(), "9".to_string()]);
        assert_eq!(calls, 3);
    }

    #[test]
    fn persistent_errors_end_empty() {
        let ids = poll_messages("q", |_| Err(anyhow!("offline")), &fast(2, 20));
        assert!(ids.is_empty());
    }

    #[test]
    fn unrepresentable_timeout_still_polls() {
        let mut calls = 0;
        let ids = poll_messages(
            "q",
            |_| {
                calls += 1;
                Ok(if calls < 3 { vec![] } else { vec!["1".to_string()] })
            },
            &PollPolicy {
                poll_delay: Duration::ZERO,
                poll_interval: Duration::ZERO,
                timeout: Duration::MAX,
            },
        );
        assert_eq!(ids, vec!["1".to_string()]);
        assert_eq!(calls, 3);
    }

    #[test]
    fn delay_is_waited_before_first_attempt() {
        let started = Instant::now();
        let mut first_at = None;
        poll_messages(
            "q",
            |_| {
                first_at.get_or_insert_with(|| started.elapsed());
                Ok(vec!["1".to_string()])
            },
            &PollPolicy {
                poll_delay: Duration::from_millis(30),
                poll_interval: Duration::from_millis(1),
                timeout: Duration::from_secs(5),
            },
        );
        assert!(first_at.unwrap() >= Duration::from_millis(30));
    }
}
