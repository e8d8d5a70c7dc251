use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::core::{domain::TestOutcome, traits::executor::Executor};

const READ_CHUNK_SIZE: usize = 4096;

/// Runs the test command as a plain child process of this one.
#[derive(Clone, Debug, Default)]
pub struct NativeExecutor;

impl NativeExecutor {
    pub fn new() -> Self {
        NativeExecutor
    }
}

#[async_trait::async_trait]
impl Executor for NativeExecutor {
    #[tracing::instrument(skip(self))]
    async fn run(&self, executable: &str, script: &str, time_limit: Duration) -> TestOutcome {
        // The timer rounds up to the next tick, so a fast child could still win.
        if time_limit.is_zero() {
            tracing::warn!("Time limit is zero, not starting {}", executable);
            return TestOutcome::TimedOut;
        }

        let start = Instant::now();

        let child = match Command::new(executable)
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                return TestOutcome::ExecutionError {
                    message: format!("failed to launch {executable}: {e}"),
                };
            }
        };
        tracing::debug!("Spawned test process: pid={:?}", child.id());

        let (cancel_tx, cancel_rx) = oneshot::channel();
        let mut supervisor = tokio::spawn(supervise(child, cancel_rx));

        tokio::select! {
            biased;

            _ = tokio::time::sleep(time_limit) => {
                tracing::warn!("Time limit of {:?} exceeded, terminating test process", time_limit);
                let _ = cancel_tx.send(());
                if let Err(e) = supervisor.await {
                    tracing::error!("Supervisor task failed while terminating: {}", e);
                }
                TestOutcome::TimedOut
            }
            joined = &mut supervisor => {
                let elapsed = start.elapsed();
                tracing::debug!("Test process finished after {:?}", elapsed);

                match joined {
                    Ok(Some(Ok((status, output)))) if status.success() => {
                        TestOutcome::Completed { output, elapsed }
                    }
                    Ok(Some(Ok((status, _)))) => TestOutcome::ExecutionError {
                        message: status.to_string(),
                    },
                    Ok(Some(Err(e))) => TestOutcome::ExecutionError {
                        message: format!("failed to collect output: {e}"),
                    },
                    Ok(None) => TestOutcome::ExecutionError {
                        message: "test process was cancelled".to_string(),
                    },
                    Err(e) => TestOutcome::ExecutionError {
                        message: format!("supervisor task failed: {e}"),
                    },
                }
            }
        }
    }
}

/// Owns the child until it exits or `cancel` fires. On cancellation the
/// child is killed and reaped and `None` is returned.
async fn supervise(
    mut child: Child,
    cancel: oneshot::Receiver<()>,
) -> Option<io::Result<(ExitStatus, Vec<u8>)>> {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    tokio::select! {
        finished = async {
            let output = collect_combined(stdout, stderr).await?;
            let status = child.wait().await?;
            Ok::<_, io::Error>((status, output))
        } => Some(finished),
        _ = cancel => {
            if let Err(e) = child.kill().await {
                tracing::error!("Failed to kill test process: {}", e);
            }
            None
        }
    }
}

/// Interleaves both pipes into one buffer in arrival order.
async fn collect_combined<O, E>(mut stdout: Option<O>, mut stderr: Option<E>) -> io::Result<Vec<u8>>
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    let mut combined = Vec::new();
    let mut out_buf = [0u8; READ_CHUNK_SIZE];
    let mut err_buf = [0u8; READ_CHUNK_SIZE];

    while stdout.is_some() || stderr.is_some() {
        tokio::select! {
            read = read_chunk(&mut stdout, &mut out_buf), if stdout.is_some() => match read? {
                0 => stdout = None,
                n => combined.extend_from_slice(&out_buf[..n]),
            },
            read = read_chunk(&mut stderr, &mut err_buf), if stderr.is_some() => match read? {
                0 => stderr = None,
                n => combined.extend_from_slice(&err_buf[..n]),
            },
        }
    }

    Ok(combined)
}

async fn read_chunk<R: AsyncRead + Unpin>(pipe: &mut Option<R>, buf: &mut [u8]) -> io::Result<usize> {
    match pipe {
        Some(pipe) => pipe.read(buf).await,
        None => Ok(0),
    }
}
