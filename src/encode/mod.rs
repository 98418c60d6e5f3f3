use crate::cue::models::Track;
use crate::encode::backend::{Encoder, TrackTags};
use crate::encode::error::{EncodeError, EncodeResult};
use indicatif::ProgressBar;
use log::debug;
use std::future::Future;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub mod backend;
pub mod error;

/// One encoder run over one sliced track.
#[derive(Debug, Clone)]
pub struct EncodeJob {
    pub encoder: Encoder,
    pub input: PathBuf,
    pub output: PathBuf,
    pub tags: TrackTags,
}

impl EncodeJob {
    pub fn new(encoder: Encoder, input: impl AsRef<Path>, track: &Track) -> Self {
        let input = input.as_ref().to_path_buf();
        Self {
            encoder,
            output: encoder.output_path(&input),
            input,
            tags: TrackTags::from(track),
        }
    }

    pub fn label(&self) -> String {
        format!("{} <- {:?}", self.encoder.program(), self.input)
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(self.encoder.program());
        cmd.args(self.encoder.args(&self.input, &self.output, &self.tags))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    pub async fn run(self) -> EncodeResult<()> {
        let output = self.command().output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EncodeError::ExitStatus {
                program: self.encoder.program(),
                status: output.status,
                stderr: stderr.lines().last().unwrap_or_default().to_string(),
            });
        }

        if !tokio::fs::try_exists(&self.output).await? {
            return Err(EncodeError::MissingOutput(self.output));
        }

        debug!("Encoded {:?}", self.output);
        Ok(())
    }
}

#[derive(Debug)]
pub struct EncodeFailure {
    pub label: String,
    pub error: EncodeError,
}

#[derive(Debug, Default)]
pub struct EncodeReport {
    pub succeeded: usize,
    pub failures: Vec<EncodeFailure>,
}

struct EncodeOutcome {
    label: String,
    result: EncodeResult<()>,
}

/// Runs encode jobs concurrently, never more than `capacity` at a time.
pub struct EncodeDispatcher {
    permits: Arc<Semaphore>,
    timeout: Option<Duration>,
    tasks: JoinSet<EncodeOutcome>,
    progress: Option<ProgressBar>,
}

impl EncodeDispatcher {
    pub fn new(capacity: usize, timeout: Option<Duration>) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(capacity.max(1))),
            timeout,
            tasks: JoinSet::new(),
            progress: None,
        }
    }

    pub fn default_capacity() -> usize {
        std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1)
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Waits for free capacity, then starts `job` in the background.
    pub async fn submit(&mut self, job: EncodeJob) -> EncodeResult<()> {
        let label = job.label();
        self.spawn(label, job.run()).await
    }

    pub async fn spawn<F>(&mut self, label: String, job: F) -> EncodeResult<()>
    where
        F: Future<Output = EncodeResult<()>> + Send + 'static,
    {
        let permit = self.permits.clone().acquire_owned().await?;
        let timeout = self.timeout;
        let progress = self.progress.clone();
        if let Some(progress) = &progress {
            progress.inc_length(1);
        }

        debug!("Starting {label}");
        self.tasks.spawn(async move {
            let result = match timeout {
                Some(limit) => tokio::time::timeout(limit, job)
                    .await
                    .unwrap_or_else(|_| Err(EncodeError::TimedOut(limit))),
                None => job.await,
            };
            drop(permit);

            if let Some(progress) = progress {
                progress.inc(1);
            }
            EncodeOutcome { label, result }
        });

        Ok(())
    }

    /// Waits for every started job and collects their results.
    pub async fn join(mut self) -> EncodeReport {
        let mut report = EncodeReport::default();

        while let Some(joined) = self.tasks.join_next().await {
            let outcome = joined.unwrap_or_else(|err| EncodeOutcome {
                label: "encode task".to_string(),
                result: Err(err.into()),
            });

            match outcome.result {
                Ok(()) => report.succeeded += 1,
                Err(error) => report.failures.push(EncodeFailure {
                    label: outcome.label,
                    error,
                }),
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn never_exceeds_capacity() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut dispatcher = EncodeDispatcher::new(3, None);

        for i in 0..20 {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            dispatcher
                .spawn(format!("job {i}"), async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                })
                .await
                .unwrap();
            assert!(dispatcher.available() <= 3);
        }

        let report = dispatcher.join().await;
        assert_eq!(report.succeeded, 20);
        assert!(report.failures.is_empty());
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert!(peak.load(Ordering::SeqCst) >= 1);
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn capacity_is_released_after_failures() {
        let mut dispatcher = EncodeDispatcher::new(1, None);

        for i in 0..3 {
            dispatcher
                .spawn(format!("job {i}"), async move {
                    Err(EncodeError::MissingOutput(PathBuf::from(format!("{i}.mp3"))))
                })
                .await
                .unwrap();
        }

        let report = dispatcher.join().await;
        assert_eq!(report.succeeded, 0);
        assert_eq!(report.failures.len(), 3);
        assert!(
            report
                .failures
                .iter()
                .all(|f| matches!(f.error, EncodeError::MissingOutput(_)))
        );
    }

    #[tokio::test]
    async fn stalled_job_times_out() {
        let mut dispatcher = EncodeDispatcher::new(1, Some(Duration::from_millis(20)));

        dispatcher
            .spawn("stalled".to_string(), async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            })
            .await
            .unwrap();
        dispatcher
            .spawn("quick".to_string(), async { Ok(()) })
            .await
            .unwrap();

        let report = dispatcher.join().await;
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].label, "stalled");
        assert!(matches!(report.failures[0].error, EncodeError::TimedOut(_)));
    }

    #[test]
    fn job_targets_stem_with_codec_extension() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("01 - Intro.wav");
        let track = Track {
            number: 1,
            title: "Intro".to_string(),
            ..Default::default()
        };

        let job = EncodeJob::new(Encoder::Opus, &input, &track);
        assert_eq!(job.output, dir.path().join("01 - Intro.opus"));
        assert_eq!(job.tags.number, "01");
        assert!(job.label().starts_with("opusenc"));
    }

    #[tokio::test]
    async fn spawn_failure_is_reported() {
        let mut dispatcher = EncodeDispatcher::new(2, None);
        dispatcher
            .spawn("missing".to_string(), async {
                Command::new("cuesplit-test-no-such-encoder")
                    .status()
                    .await?;
                Ok::<(), EncodeError>(())
            })
            .await
            .unwrap();

        let report = dispatcher.join().await;
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(report.failures[0].error, EncodeError::IoError(_)));
    }
}
