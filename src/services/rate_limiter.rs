//! Login rate limiter
//!
//! Sliding windows kept in memory:
//! - failed logins per e-mail: 5 per 15 minutes
//! - login requests per IP: 10 per minute

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::net::IpAddr;
use tokio::sync::RwLock;

use crate::services::user::normalize_email;

const EMAIL_LIMIT: usize = 5;
const IP_LIMIT: usize = 10;

fn email_window() -> Duration {
    Duration::minutes(15)
}

fn ip_window() -> Duration {
    Duration::minutes(1)
}

#[derive(Default)]
pub struct LoginRateLimiter {
    email_failures: RwLock<HashMap<String, Vec<DateTime<Utc>>>>,
    ip_requests: RwLock<HashMap<IpAddr, Vec<DateTime<Utc>>>>,
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the e-mail has 5 failures inside the window
    pub async fn is_email_limited(&self, email: &str) -> bool {
        let cutoff = Utc::now() - email_window();
        let mut map = self.email_failures.write().await;
        match map.get_mut(&normalize_email(email)) {
            Some(times) => {
                times.retain(|t| *t > cutoff);
                times.len() >= EMAIL_LIMIT
            }
            None => false,
        }
    }

    pub async fn record_failure(&self, email: &str) {
        self.email_failures
            .write()
            .await
            .entry(normalize_email(email))
            .or_default()
            .push(Utc::now());
    }

    /// Called after a successful login
    pub async fn clear_email(&self, email: &str) {
        self.email_failures.write().await.remove(&normalize_email(email));
    }

    /// Count this request against the IP and report whether it is over the limit
    pub async fn check_ip(&self, ip: IpAddr) -> bool {
        let now = Utc::now();
        let cutoff = now - ip_window();
        let mut map = self.ip_requests.write().await;
        let times = map.entry(ip).or_default();
        times.retain(|t| *t > cutoff);
        if times.len() >= IP_LIMIT {
            return true;
        }
        times.push(now);
        false
    }

    /// Drop expired entries; run from the background task
    pub async fn cleanup(&self) {
        let now = Utc::now();
        let email_cutoff = now - email_window();
        let ip_cutoff = now - ip_window();

        self.email_failures.write().await.retain(|_, times| {
            times.retain(|t| *t > email_cutoff);
            !times.is_empty()
        });
        self.ip_requests.write().await.retain(|_, times| {
            times.retain(|t| *t > ip_cutoff);
            !times.is_empty()
        });
    }

    #[cfg(test)]
    async fn tracked_emails(&self) -> usize {
        self.email_failures.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_email_limit_after_five_failures() {
        let limiter = LoginRateLimiter::new();
        for _ in 0..4 {
            limiter.record_failure("a@example.org").await;
        }
        assert!(!limiter.is_email_limited("a@example.org").await);

        limiter.record_failure("  A@Example.org ").await;
        assert!(limiter.is_email_limited("a@example.org").await);
        assert!(limiter.is_email_limited(" a@example.org").await);

        limiter.clear_email("a@example.org").await;
        assert!(!limiter.is_email_limited("a@example.org").await);
    }

    #[tokio::test]
    async fn test_ip_limit() {
        let limiter = LoginRateLimiter::new();
        let ip = IpAddr::from_str("10.0.0.1").unwrap();
        for _ in 0..10 {
            assert!(!limiter.check_ip(ip).await);
        }
        assert!(limiter.check_ip(ip).await);

        let other = IpAddr::from_str("10.0.0.2").unwrap();
        assert!(!limiter.check_ip(other).await);
    }

    #[tokio::test]
    async fn test_cleanup_keeps_recent_entries() {
        let limiter = LoginRateLimiter::new();
        limiter.record_failure("b@example.org").await;
        limiter.cleanup().await;
        assert_eq!(limiter.tracked_emails().await, 1);
    }
}
