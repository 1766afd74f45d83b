use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use scraper::{Html, Selector};
use tracing::{debug, info, warn};

use crate::alert::Alert;
use crate::config::CaptchaConfig;
use crate::parser::dom::compile_all;
use crate::session::{snapshot, Session};

/// UTC, millisecond precision.
const TIMESTAMP: &str = "%F %T%.3f";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptchaState {
    Clear,
    Challenged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Block until a human clears the challenge.
    UntilCleared,
    /// Give up after this many waits and report `Challenged`.
    Attempts(u32),
}

impl From<Option<u32>> for RetryPolicy {
    fn from(max: Option<u32>) -> Self {
        max.map_or(Self::UntilCleared, Self::Attempts)
    }
}

/// Blocking gate in front of extraction: returns once the current page is not
/// a challenge page, alerting and waiting in between.
pub struct CaptchaGuard {
    markers: Vec<Selector>,
    wait: Duration,
    policy: RetryPolicy,
    alert: Box<dyn Alert>,
}

impl CaptchaGuard {
    pub fn new(config: &CaptchaConfig, alert: Box<dyn Alert>) -> Result<Self> {
        Ok(Self {
            markers: compile_all(&config.markers)?,
            wait: Duration::from_secs(config.wait_secs),
            policy: config.max_attempts.into(),
            alert,
        })
    }

    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn is_challenge(&self, doc: &Html) -> bool {
        self.markers.iter().any(|m| doc.select(m).next().is_some())
    }

    /// Re-reads the page and waits out any challenge. Never errors: a page
    /// that cannot be fetched counts as marker-free.
    pub fn check(&self, session: &mut dyn Session) -> CaptchaState {
        let mut waits = 0u32;
        loop {
            info!("Captcha check at {}", Utc::now().format(TIMESTAMP));
            let challenged = match snapshot(session) {
                Ok(doc) => self.is_challenge(&doc),
                Err(e) => {
                    warn!("Captcha check could not read the page: {}", e);
                    false
                }
            };
            if !challenged {
                return CaptchaState::Clear;
            }

            if let RetryPolicy::Attempts(max) = self.policy {
                if waits >= max {
                    warn!("Captcha still present after {} waits, giving up", waits);
                    return CaptchaState::Challenged;
                }
            }

            warn!(
                "Captcha detected at {}, waiting {}s for it to be solved",
                Utc::now().format(TIMESTAMP),
                self.wait.as_secs()
            );
            if let Err(e) = self.alert.play() {
                debug!("Alert failed: {:#}", e);
            }
            std::thread::sleep(self.wait);
            waits += 1;
        }
    }
}
