//! Secondary producer: a user-configured external command.
//!
//! The command receives the source text on stdin and leaves its artifacts on
//! disk; the engine only cares about completion, which re-triggers a local
//! render. The command runs on a worker thread feeding an mpsc channel so
//! `poll` never blocks the driver loop.

use crate::model::{JobError, RenderOutcome, RenderRequest, RoundContext};
use crate::producer::{ewma, RenderProducer};
use std::io::Write as _;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::warn;

/// How much trailing stderr to carry into a [`JobError::CommandFailed`].
const STDERR_TAIL: usize = 240;

struct PendingJob {
    ctx: RoundContext,
    started: Instant,
    rx: Receiver<Result<(), JobError>>,
    handle: JoinHandle<()>,
}

/// External-command render producer.
pub struct CommandProducer {
    command: String,
    avg: Option<Duration>,
    job: Option<PendingJob>,
}

impl CommandProducer {
    /// Create a producer running `command` through the platform shell.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            avg: None,
            job: None,
        }
    }

    /// The configured command line.
    pub fn command(&self) -> &str {
        &self.command
    }
}

impl RenderProducer for CommandProducer {
    fn begin(&mut self, request: RenderRequest) -> Result<(), JobError> {
        if self.job.is_some() {
            return Err(JobError::Busy);
        }
        let (tx, rx) = mpsc::channel();
        let command = self.command.clone();
        let source = request.source;
        let handle = std::thread::spawn(move || {
            let result = run_command(&command, &source);
            // The receiver may be gone if the session ended mid-run.
            let _ = tx.send(result);
        });
        self.job = Some(PendingJob {
            ctx: request.ctx,
            started: Instant::now(),
            rx,
            handle,
        });
        Ok(())
    }

    fn poll(&mut self) -> Option<Result<RenderOutcome, JobError>> {
        let received = match self.job.as_ref() {
            None => return None,
            Some(job) => job.rx.try_recv(),
        };
        match received {
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                warn!(command = %self.command, "secondary worker disconnected");
                self.job = None;
                Some(Err(JobError::WorkerGone))
            }
            Ok(result) => {
                let Some(job) = self.job.take() else {
                    return None;
                };
                let _ = job.handle.join();
                self.avg = Some(ewma(self.avg, job.started.elapsed()));
                Some(result.map(|()| {
                    RenderOutcome::context_only(job.ctx, self.avg.unwrap_or_default())
                }))
            }
        }
    }
}

fn run_command(command: &str, source: &str) -> Result<(), JobError> {
    let spawn_err = |e: std::io::Error| JobError::Spawn {
        command: command.to_string(),
        message: e.to_string(),
    };

    let mut child = shell_command(command)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(spawn_err)?;

    if let Some(mut stdin) = child.stdin.take() {
        // A command that ignores stdin may close it early; that is fine.
        let _ = stdin.write_all(source.as_bytes());
    }

    let output = child.wait_with_output().map_err(spawn_err)?;
    if output.status.success() {
        return Ok(());
    }

    let status = match output.status.code() {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    };
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    let tail_start = stderr.len().saturating_sub(STDERR_TAIL);
    let tail = stderr
        .char_indices()
        .map(|(i, _)| i)
        .find(|&i| i >= tail_start)
        .map(|i| &stderr[i..])
        .unwrap_or("");
    Err(JobError::CommandFailed {
        command: command.to_string(),
        status,
        stderr: tail.to_string(),
    })
}

#[cfg(unix)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Round;
    use std::sync::Arc;

    fn request() -> RenderRequest {
        RenderRequest {
            source: Arc::from("source body\n"),
            ctx: RoundContext::new("doc.md", Round::new(1)),
        }
    }

    /// Drive poll until the pending job resolves.
    fn wait(producer: &mut CommandProducer) -> Result<RenderOutcome, JobError> {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            if let Some(result) = producer.poll() {
                return result;
            }
            assert!(Instant::now() < deadline, "command did not complete");
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    #[cfg(unix)]
    fn successful_command_completes_with_context_only() {
        let mut producer = CommandProducer::new("cat > /dev/null");
        producer.begin(request()).unwrap();
        let outcome = wait(&mut producer).unwrap();
        assert!(outcome.content.is_none());
        assert_eq!(outcome.ctx.round, Round::new(1));
        assert!(producer.poll().is_none(), "completion is delivered once");
    }

    #[test]
    #[cfg(unix)]
    fn failing_command_reports_status_and_stderr() {
        let mut producer = CommandProducer::new("echo boom >&2; exit 3");
        producer.begin(request()).unwrap();
        let err = wait(&mut producer).unwrap_err();
        match err {
            JobError::CommandFailed { status, stderr, .. } => {
                assert_eq!(status, "exit code 3");
                assert_eq!(stderr, "boom");
            }
            other => panic!("expected CommandFailed, got {other:?}"),
        }
    }

    #[test]
    #[cfg(unix)]
    fn begin_while_running_is_busy() {
        let mut producer = CommandProducer::new("sleep 2");
        producer.begin(request()).unwrap();
        assert!(matches!(producer.begin(request()), Err(JobError::Busy)));
        // Let it finish so the worker thread does not outlive the test runner.
        let _ = wait(&mut producer);
    }

    #[test]
    #[cfg(unix)]
    fn command_reading_stdin_sees_the_source() {
        // Succeeds only if stdin matches the request source.
        let mut producer = CommandProducer::new("grep -q 'source body'");
        producer.begin(request()).unwrap();
        assert!(wait(&mut producer).is_ok());
    }
}
