//! Public address resolution with unbounded retry
//!
//! The resolver turns a flaky [`AddressSource`] into a lookup that only
//! fails for non-network reasons:
//!
//! | source error            | reaction                               |
//! |-------------------------|----------------------------------------|
//! | [`Error::Timeout`]      | retry immediately                      |
//! | [`Error::Network`]      | sleep `backoff`, then retry            |
//! | anything else           | return the error                       |
//!
//! There is no attempt limit and no backoff growth.

use std::io::Write;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::Result;
use crate::traits::{AddressFamily, AddressSource};

/// Resolves the caller's public address through an [`AddressSource`]
pub struct AddressResolver {
    /// One-shot lookup implementation
    source: Box<dyn AddressSource>,

    /// Sleep after a non-timeout network error
    backoff: Duration,

    /// Print the `Get <url> ...` progress line on stdout
    progress: bool,
}

impl AddressResolver {
    /// Create a resolver
    ///
    /// # Parameters
    ///
    /// - `source`: Address source implementation
    /// - `backoff`: Delay before retrying after a network error, normally the request timeout
    pub fn new(source: Box<dyn AddressSource>, backoff: Duration) -> Self {
        Self {
            source,
            backoff,
            progress: false,
        }
    }

    /// Enable or disable the stdout progress line
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Delay applied after a network error
    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Resolve the current public address for `family`
    ///
    /// Returns the trimmed response body. The body is not validated, so a
    /// malformed answer is handed to the provider as-is.
    pub async fn resolve(&self, family: AddressFamily) -> Result<String> {
        let endpoint = self.source.endpoint(family);
        let mut progress = Progress::start(self.progress, endpoint);
        let mut attempt: u64 = 0;

        loop {
            attempt += 1;
            progress.tick();

            match self.source.fetch(family).await {
                Ok(body) => {
                    progress.finish();
                    debug!(%family, endpoint, attempt, "Address lookup succeeded");
                    return Ok(body.trim().to_string());
                }
                Err(e) if e.is_timeout() => {
                    debug!(%family, endpoint, attempt, "Address lookup timed out, retrying: {}", e);
                }
                Err(e) if e.is_network() => {
                    debug!(
                        %family, endpoint, attempt,
                        "Address lookup failed, retrying in {:?}: {}", self.backoff, e
                    );
                    tokio::time::sleep(self.backoff).await;
                }
                Err(e) => {
                    progress.finish();
                    warn!(%family, endpoint, attempt, "Address lookup failed: {}", e);
                    return Err(e);
                }
            }
        }
    }
}

/// Stdout progress line: `2024/05/01 12:00:00 Get https://... ...`
///
/// One dot per attempt, terminated by a newline once the lookup settles.
struct Progress {
    enabled: bool,
    open: bool,
}

impl Progress {
    fn start(enabled: bool, endpoint: &str) -> Self {
        if enabled {
            let now = chrono::Local::now().format("%Y/%m/%d %H:%M:%S");
            emit(&format!("{now} Get {endpoint} "));
        }

        Self {
            enabled,
            open: enabled,
        }
    }

    fn tick(&self) {
        if self.enabled {
            emit(".");
        }
    }

    fn finish(&mut self) {
        if self.open {
            emit("\n");
            self.open = false;
        }
    }
}

fn emit(text: &str) {
    let mut stdout = std::io::stdout().lock();
    // write errors on stdout are ignored
    if stdout.write_all(text.as_bytes()).is_ok() {
        let _ = stdout.flush();
    }
}
