///! Run controller
///!
///! One run is: prepare a post (select, format, fetch), then publish it.
///! Any transient failure abandons the attempt and starts over from
///! selection, up to `max_attempts` times. Load and config errors stop the
///! run immediately since another attempt cannot fix them.

use planetary_common::{BotError, BotResult, Caption, Platform, PostReceipt, PostSource};
use std::time::Duration;

use crate::frontend::Publisher;

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub max_attempts: u32,
    /// Wait `retry_delay * n` before attempt `n + 1`
    pub retry_delay: Duration,
    /// Print the caption instead of publishing
    pub dry_run: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            retry_delay: Duration::ZERO,
            dry_run: false,
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Posted { attempts: u32, receipt: PostReceipt },
    DryRun { attempts: u32, caption: Caption },
    /// Every attempt failed with a retryable error; nothing was posted
    Exhausted { attempts: u32, last_error: Option<BotError> },
}

impl RunOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            RunOutcome::Posted { attempts, .. }
            | RunOutcome::DryRun { attempts, .. }
            | RunOutcome::Exhausted { attempts, .. } => *attempts,
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, RunOutcome::Exhausted { .. })
    }
}

/// Delay before `attempt`: none for the first, then `retry_delay * (attempt - 1)`,
/// saturating at `Duration::MAX`
fn backoff(retry_delay: Duration, attempt: u32) -> Duration {
    retry_delay.saturating_mul(attempt.saturating_sub(1))
}

/// Process exit status for a finished run.
///
/// 0 when a post went out or a test run completed; 1 when every attempt
/// failed or a fatal error stopped the run.
pub fn exit_status(result: &BotResult<RunOutcome>) -> u8 {
    match result {
        Ok(RunOutcome::Posted { attempts, receipt }) => {
            tracing::info!(
                "Posted {} to {} after {} attempt(s)",
                receipt.post_id,
                receipt.platform,
                attempts
            );
            0
        }
        Ok(RunOutcome::DryRun { attempts, .. }) => {
            tracing::info!("Test run finished after {} attempt(s)", attempts);
            0
        }
        Ok(RunOutcome::Exhausted { attempts, last_error }) => {
            tracing::error!(
                "No post after {} attempts; last error: {}",
                attempts,
                last_error.as_ref().map(|e| e.to_string()).unwrap_or_default()
            );
            1
        }
        Err(e) => {
            tracing::error!(kind = e.kind(), "Run aborted: {}", e);
            1
        }
    }
}

pub struct Runner<S> {
    source: S,
    publisher: Option<Box<dyn Publisher + Send + Sync>>,
    config: RunnerConfig,
}

impl<S: PostSource> Runner<S> {
    /// `publisher` may be None only for dry runs
    pub fn new(
        source: S,
        publisher: Option<Box<dyn Publisher + Send + Sync>>,
        config: RunnerConfig,
    ) -> Self {
        Self {
            source,
            publisher,
            config,
        }
    }

    pub async fn run(&mut self) -> BotResult<RunOutcome> {
        if self.config.max_attempts == 0 {
            return Err(BotError::Config("max_attempts must be at least 1".to_string()));
        }
        if !self.config.dry_run && self.publisher.is_none() {
            return Err(BotError::Config(
                "No publisher configured; run in test mode or provide credentials".to_string(),
            ));
        }

        let max_attempts = self.config.max_attempts;
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            let delay = backoff(self.config.retry_delay, attempt);
            if !delay.is_zero() {
                tracing::debug!("Retrying after {:?} (attempt {}/{})", delay, attempt, max_attempts);
                tokio::time::sleep(delay).await;
            }

            match self.attempt(attempt).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) if e.is_retryable() => {
                    tracing::warn!(
                        kind = e.kind(),
                        "Attempt {}/{} failed: {}",
                        attempt,
                        max_attempts,
                        e
                    );
                    last_error = Some(e);
                }
                Err(e) => {
                    tracing::error!(kind = e.kind(), "Aborting run: {}", e);
                    return Err(e);
                }
            }
        }

        tracing::error!("Giving up after {} attempts; nothing was posted", max_attempts);
        Ok(RunOutcome::Exhausted {
            attempts: max_attempts,
            last_error,
        })
    }

    /// Selecting → Formatting → Fetching → Publishing. The preview image is
    /// dropped, and its temp file deleted, when this returns.
    async fn attempt(&mut self, attempt: u32) -> BotResult<RunOutcome> {
        let post = self.source.prepare().await?;

        if self.config.dry_run {
            let platform = self
                .publisher
                .as_ref()
                .map(|p| p.platform())
                .unwrap_or(Platform::Twitter);
            println!("{}", post.caption);
            println!(
                "Running in test mode -- not posting to {}.",
                platform.display_name()
            );
            return Ok(RunOutcome::DryRun {
                attempts: attempt,
                caption: post.caption,
            });
        }

        let publisher = self
            .publisher
            .as_ref()
            .ok_or_else(|| BotError::Config("No publisher configured".to_string()))?;
        let receipt = publisher.publish(&post.caption, post.image.path()).await?;

        Ok(RunOutcome::Posted {
            attempts: attempt,
            receipt,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use planetary_common::{PreparedPost, PreviewImage};
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    fn caption(n: u32) -> Caption {
        Caption {
            target: "Rings of Saturn".to_string(),
            mission: "Cassini".to_string(),
            time: "2017-03-29 12:00:00".to_string(),
            permalink: format!("http://pds-rings-tools.seti.org/opus#/view=detail&detail=co-{}", n),
        }
    }

    /// Fails with `error` for the first `failures` calls
    struct ScriptedSource {
        failures: u32,
        error: BotError,
        calls: Arc<AtomicU32>,
        images: Arc<Mutex<Vec<PathBuf>>>,
    }

    impl ScriptedSource {
        fn new(failures: u32, error: BotError) -> Self {
            Self {
                failures,
                error,
                calls: Arc::new(AtomicU32::new(0)),
                images: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl PostSource for ScriptedSource {
        async fn prepare(&mut self) -> BotResult<PreparedPost> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.failures {
                return Err(self.error.clone());
            }
            let file = tempfile::NamedTempFile::new().unwrap();
            self.images.lock().unwrap().push(file.path().to_path_buf());
            Ok(PreparedPost {
                caption: caption(n),
                image: PreviewImage::new(file, "http://example.org/x.jpg"),
            })
        }
    }

    struct CountingPublisher {
        failures: u32,
        calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl Publisher for CountingPublisher {
        fn platform(&self) -> Platform {
            Platform::Twitter
        }

        async fn publish(&self, caption: &Caption, image_path: &Path) -> BotResult<PostReceipt> {
            assert!(image_path.exists(), "image must exist while publishing");
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.failures {
                return Err(BotError::Publish("503 Service Unavailable".to_string()));
            }
            Ok(PostReceipt {
                platform: Platform::Twitter,
                post_id: format!("post-{}", n),
                text: caption.text(),
            })
        }
    }

    fn publisher(failures: u32) -> (Box<dyn Publisher + Send + Sync>, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let publisher = CountingPublisher {
            failures,
            calls: calls.clone(),
        };
        (Box::new(publisher), calls)
    }

    fn live() -> RunnerConfig {
        RunnerConfig::default()
    }

    #[tokio::test]
    async fn test_succeeds_on_fifth_attempt() {
        let source = ScriptedSource::new(4, BotError::Network("timeout".to_string()));
        let prepares = source.calls.clone();
        let (publisher, publishes) = publisher(0);

        let outcome = Runner::new(source, Some(publisher), live()).run().await.unwrap();

        assert_eq!(outcome.attempts(), 5);
        assert!(matches!(outcome, RunOutcome::Posted { ref receipt, .. } if receipt.post_id == "post-1"));
        assert_eq!(prepares.load(Ordering::SeqCst), 5);
        assert_eq!(publishes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhausts_after_five_failures() {
        let source = ScriptedSource::new(u32::MAX, BotError::Format("bad time".to_string()));
        let prepares = source.calls.clone();
        let (publisher, publishes) = publisher(0);

        let outcome = Runner::new(source, Some(publisher), live()).run().await.unwrap();

        assert_eq!(
            outcome,
            RunOutcome::Exhausted {
                attempts: 5,
                last_error: Some(BotError::Format("bad time".to_string())),
            }
        );
        assert!(!outcome.is_success());
        assert_eq!(prepares.load(Ordering::SeqCst), 5);
        assert_eq!(publishes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_publish_failures_restart_from_selection() {
        let source = ScriptedSource::new(0, BotError::Network("unused".to_string()));
        let prepares = source.calls.clone();
        let images = source.images.clone();
        let (publisher, publishes) = publisher(4);

        let outcome = Runner::new(source, Some(publisher), live()).run().await.unwrap();

        assert!(matches!(outcome, RunOutcome::Posted { attempts: 5, .. }));
        assert_eq!(prepares.load(Ordering::SeqCst), 5);
        assert_eq!(publishes.load(Ordering::SeqCst), 5);

        // Every attempt's temp image is gone, including the successful one
        let images = images.lock().unwrap();
        assert_eq!(images.len(), 5);
        assert!(images.iter().all(|p| !p.exists()));
    }

    #[tokio::test]
    async fn test_fatal_error_aborts_without_retry() {
        let source = ScriptedSource::new(u32::MAX, BotError::Config("no missions".to_string()));
        let prepares = source.calls.clone();
        let (publisher, publishes) = publisher(0);

        let err = Runner::new(source, Some(publisher), live()).run().await.unwrap_err();

        assert_eq!(err, BotError::Config("no missions".to_string()));
        assert_eq!(prepares.load(Ordering::SeqCst), 1);
        assert_eq!(publishes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dry_run_never_publishes() {
        let source = ScriptedSource::new(2, BotError::Network("timeout".to_string()));
        let images = source.images.clone();
        let (publisher, publishes) = publisher(0);
        let config = RunnerConfig {
            dry_run: true,
            ..Default::default()
        };

        let outcome = Runner::new(source, Some(publisher), config).run().await.unwrap();

        assert_eq!(
            outcome,
            RunOutcome::DryRun {
                attempts: 3,
                caption: caption(3),
            }
        );
        assert_eq!(publishes.load(Ordering::SeqCst), 0);
        assert!(images.lock().unwrap().iter().all(|p| !p.exists()));
    }

    #[tokio::test]
    async fn test_dry_run_without_publisher() {
        let source = ScriptedSource::new(0, BotError::Network("unused".to_string()));
        let config = RunnerConfig {
            dry_run: true,
            ..Default::default()
        };

        let outcome = Runner::new(source, None, config).run().await.unwrap();
        assert!(matches!(outcome, RunOutcome::DryRun { attempts: 1, .. }));
    }

    #[tokio::test]
    async fn test_live_run_requires_publisher() {
        let source = ScriptedSource::new(0, BotError::Network("unused".to_string()));
        let prepares = source.calls.clone();

        let err = Runner::new(source, None, live()).run().await.unwrap_err();
        assert!(matches!(err, BotError::Config(_)));
        assert_eq!(prepares.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_custom_attempt_limit() {
        let source = ScriptedSource::new(u32::MAX, BotError::Network("timeout".to_string()));
        let prepares = source.calls.clone();
        let (publisher, _) = publisher(0);
        let config = RunnerConfig {
            max_attempts: 2,
            retry_delay: Duration::from_millis(1),
            dry_run: false,
        };

        let outcome = Runner::new(source, Some(publisher), config).run().await.unwrap();
        assert!(matches!(outcome, RunOutcome::Exhausted { attempts: 2, .. }));
        assert_eq!(prepares.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_backoff_is_linear_and_saturates() {
        let delay = Duration::from_secs(2);
        assert_eq!(backoff(delay, 1), Duration::ZERO);
        assert_eq!(backoff(delay, 2), Duration::from_secs(2));
        assert_eq!(backoff(delay, 4), Duration::from_secs(6));
        assert_eq!(backoff(Duration::from_secs(u64::MAX), 3), Duration::MAX);
    }

    #[test]
    fn test_exit_status_per_outcome() {
        let posted = Ok(RunOutcome::Posted {
            attempts: 2,
            receipt: PostReceipt {
                platform: Platform::Twitter,
                post_id: "post-1".to_string(),
                text: caption(1).text(),
            },
        });
        let dry_run = Ok(RunOutcome::DryRun {
            attempts: 1,
            caption: caption(1),
        });
        // Running out of attempts is a failure even though run() returns Ok
        let exhausted = Ok(RunOutcome::Exhausted {
            attempts: 5,
            last_error: Some(BotError::Network("timeout".to_string())),
        });
        let fatal = Err(BotError::Load("opus-images.csv: not found".to_string()));

        assert_eq!(exit_status(&posted), 0);
        assert_eq!(exit_status(&dry_run), 0);
        assert_eq!(exit_status(&exhausted), 1);
        assert_eq!(exit_status(&fatal), 1);
    }

    #[tokio::test]
    async fn test_zero_attempts_is_config_error() {
        let source = ScriptedSource::new(0, BotError::Network("unused".to_string()));
        let config = RunnerConfig {
            max_attempts: 0,
            ..Default::default()
        };

        let err = Runner::new(source, None, config).run().await.unwrap_err();
        assert!(matches!(err, BotError::Config(_)));
    }
}
