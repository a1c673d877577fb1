//! HTTP access for release metadata and assets

use crate::error::{CsError, CsResult};
use std::io::{self, Read, Write};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Network capability used by the updater
pub trait Fetcher {
    /// GET `url` and return the body as text
    fn get_text(&self, url: &str) -> CsResult<String>;

    /// GET `url` and stream the body into `dest`, returning bytes written
    fn download(&self, url: &str, dest: &mut dyn Write) -> CsResult<u64>;
}

/// Fetcher backed by a `ureq` agent
pub struct UreqFetcher {
    agent: ureq::Agent,
    user_agent: String,
    token: Option<String>,
}

impl UreqFetcher {
    /// Create a fetcher, optionally authenticating with a bearer token
    pub fn new(token: Option<String>) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_connect(Some(Duration::from_secs(10)))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            user_agent: format!("cs/{}", env!("CARGO_PKG_VERSION")),
            token,
        }
    }

    /// Create a fetcher using `GITHUB_TOKEN` or `GH_TOKEN` when set
    pub fn from_env() -> Self {
        let token = ["GITHUB_TOKEN", "GH_TOKEN"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| !value.is_empty());
        Self::new(token)
    }

    fn get(
        &self,
        url: &str,
        accept: &str,
    ) -> CsResult<ureq::http::Response<ureq::Body>> {
        debug!("GET {}", url);

        let mut request = self
            .agent
            .get(url)
            .header("User-Agent", self.user_agent.as_str())
            .header("Accept", accept);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        request.call().map_err(|e| http_error(url, e))
    }
}

impl Fetcher for UreqFetcher {
    fn get_text(&self, url: &str) -> CsResult<String> {
        let mut response = self.get(url, "application/vnd.github+json")?;
        response
            .body_mut()
            .read_to_string()
            .map_err(|e| http_error(url, e))
    }

    fn download(&self, url: &str, dest: &mut dyn Write) -> CsResult<u64> {
        let response = self.get(url, "application/octet-stream")?;
        let mut reader = response.into_body().into_reader();
        copy_body(url, &mut reader, dest)
    }
}

/// Stream a response body into `dest`.
///
/// Read failures are network errors; write failures are local I/O errors.
fn copy_body(url: &str, body: &mut dyn Read, dest: &mut dyn Write) -> CsResult<u64> {
    let mut buffer = [0u8; 8192];
    let mut written = 0u64;
    loop {
        let n = match body.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(CsError::Http {
                    url: url.to_string(),
                    status: None,
                    reason: e.to_string(),
                })
            }
        };
        dest.write_all(&buffer[..n])
            .map_err(|e| CsError::io("writing download", e))?;
        written += n as u64;
    }
    Ok(written)
}

fn http_error(url: &str, err: ureq::Error) -> CsError {
    let status = match &err {
        ureq::Error::StatusCode(code) => Some(*code),
        _ => None,
    };
    CsError::Http {
        url: url.to_string(),
        status,
        reason: err.to_string(),
    }
}

/// Retry schedule for server errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay added per attempt
    pub step: Duration,
    /// Upper bound on a single delay
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// `max_attempts` tries, waiting 3s, 6s, 9s... capped at 15s
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            step: Duration::from_secs(3),
            max_delay: Duration::from_secs(15),
        }
    }

    /// Delay after the given (1-based) failed attempt
    pub fn delay(&self, attempt: u32) -> Duration {
        self.step.saturating_mul(attempt).min(self.max_delay)
    }
}

/// GET text, retrying only on 5xx responses
pub fn get_text_with_retry(
    fetcher: &dyn Fetcher,
    url: &str,
    policy: RetryPolicy,
) -> CsResult<String> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match fetcher.get_text(url) {
            Ok(text) => return Ok(text),
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let delay = policy.delay(attempt);
                warn!(
                    "{}. Retrying in {}s (attempt {}/{})",
                    e,
                    delay.as_secs(),
                    attempt,
                    max_attempts
                );
                thread::sleep(delay);
            }
            Err(e) => return Err(e),
        }
    }
}
