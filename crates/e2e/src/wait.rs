//! Polling lookups for elements that may not be rendered yet

use std::time::Duration;
use tokio::time::{sleep, timeout_at, Instant};
use tracing::{debug, trace};

use mobile_e2e_webdriver::{ElementRef, Locator, WebDriverResult};

use crate::driver::Driver;
use crate::error::{E2eError, E2eResult};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

/// How long and how often to poll for an element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            interval: DEFAULT_INTERVAL,
        }
    }
}

impl WaitOptions {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    /// Same interval, different timeout
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }
}

/// Poll until `locator` resolves to an element or `options.timeout` elapses.
///
/// One lookup is always made. "No such element" and stale-element answers
/// are retried after `options.interval`; any other error is returned at
/// once. A present element is returned without waiting. Sleeps and every
/// lookup after the first are cut short at the deadline.
pub async fn wait_for_element<D>(
    driver: &D,
    locator: &Locator,
    options: &WaitOptions,
) -> E2eResult<ElementRef>
where
    D: Driver + ?Sized,
{
    let deadline = Instant::now() + options.timeout;
    let mut attempts = 0;

    loop {
        attempts += 1;
        match lookup(driver, locator, deadline, attempts == 1).await {
            Some(Ok(element)) => {
                debug!("Found {} after {} attempt(s)", locator, attempts);
                return Ok(element);
            }
            Some(Err(e)) if e.is_not_found() => {
                trace!("Attempt {} for {}: {}", attempts, locator, e);
            }
            Some(Err(e)) => return Err(e.into()),
            None => {
                trace!("Attempt {} for {} cut off at the deadline", attempts, locator);
                break;
            }
        }

        if !pause(deadline, options.interval).await {
            break;
        }
    }

    Err(E2eError::ElementNotFound {
        locator: locator.to_string(),
        attempts,
        timeout_ms: options.timeout.as_millis() as u64,
    })
}

/// Poll until `locator` no longer resolves, or fail once `options.timeout`
/// elapses with the element still on screen.
pub async fn wait_for_absence<D>(driver: &D, locator: &Locator, options: &WaitOptions) -> E2eResult<()>
where
    D: Driver + ?Sized,
{
    let deadline = Instant::now() + options.timeout;
    let mut first = true;

    loop {
        match lookup(driver, locator, deadline, first).await {
            Some(Ok(_)) => trace!("{} still present", locator),
            Some(Err(e)) if e.is_not_found() => return Ok(()),
            Some(Err(e)) => return Err(e.into()),
            None => break,
        }
        first = false;

        if !pause(deadline, options.interval).await {
            break;
        }
    }

    Err(E2eError::ElementStillPresent {
        locator: locator.to_string(),
        timeout_ms: options.timeout.as_millis() as u64,
    })
}

/// One lookup. Only the first one may outlive the deadline; `None` means a
/// later lookup was still pending when the deadline passed.
async fn lookup<D>(
    driver: &D,
    locator: &Locator,
    deadline: Instant,
    first: bool,
) -> Option<WebDriverResult<ElementRef>>
where
    D: Driver + ?Sized,
{
    if first {
        return Some(driver.find_element(locator).await);
    }
    timeout_at(deadline, driver.find_element(locator)).await.ok()
}

/// Sleep one interval, capped at the deadline. Returns whether time is left
/// for another attempt.
async fn pause(deadline: Instant, interval: Duration) -> bool {
    let now = Instant::now();
    if now >= deadline {
        return false;
    }
    sleep(interval.min(deadline - now)).await;
    Instant::now() < deadline
}
