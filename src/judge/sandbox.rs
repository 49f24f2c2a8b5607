use super::language::{CommandTuple, Language};
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Instant;
use tempfile::TempDir;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::{Duration, timeout};
use tracing::debug;

/// Wall-clock ceiling for a compiler invocation. A submission's own limits
/// apply only to test execution.
const COMPILE_TIMEOUT_MS: u64 = 30_000;

#[derive(Error, Debug)]
pub enum SandboxError {
    #[error("sandbox i/o failure")]
    Io(#[from] std::io::Error),
}

#[derive(Clone, Copy, Debug)]
pub struct ExecLimits {
    pub time_limit_ms: i32,
    pub memory_limit_mb: i32,
}

/// Outcome of compiling a submission: an executable artifact, or the
/// program's own fault (which is a verdict, not a sandbox error).
pub enum Compiled<A> {
    Ok(A),
    Error { stderr: String },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RunStatus {
    Ok,
    TimeLimitExceeded,
    MemoryLimitExceeded,
    RuntimeError,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub stdout: String,
    pub time_ms: i32,
}

/// Seam between the verdict state machine and actual program execution.
/// Production uses [`ProcessSandbox`]; tests drive the state machine with a
/// scripted implementation.
#[async_trait]
pub trait Sandbox: Send + Sync + 'static {
    type Artifact: Send + Sync + 'static;

    async fn compile(
        &self,
        language: Language,
        code: &str,
    ) -> Result<Compiled<Self::Artifact>, SandboxError>;

    async fn run(
        &self,
        artifact: &Self::Artifact,
        input: &str,
        limits: ExecLimits,
    ) -> Result<RunOutcome, SandboxError>;
}

/// Executes submissions as local processes in a scratch directory, with a
/// wall-clock timeout and an address-space rlimit standing in for a full
/// container sandbox.
#[derive(Clone, Default, Debug)]
pub struct ProcessSandbox;

pub struct ProcessArtifact {
    dir: Arc<TempDir>,
    language: Language,
}

#[async_trait]
impl Sandbox for ProcessSandbox {
    type Artifact = ProcessArtifact;

    async fn compile(
        &self,
        language: Language,
        code: &str,
    ) -> Result<Compiled<ProcessArtifact>, SandboxError> {
        let dir = TempDir::new()?;
        tokio::fs::write(dir.path().join(language.source_file()), code).await?;

        if let Some(command) = language.compile_command(dir.path()) {
            debug!(?command, "compiling submission");
            let output = timeout(
                Duration::from_millis(COMPILE_TIMEOUT_MS),
                Command::new(&command.binary_path)
                    .args(&command.args)
                    .current_dir(dir.path())
                    .stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::piped())
                    .output(),
            )
            .await;

            match output {
                Err(_elapsed) => {
                    return Ok(Compiled::Error {
                        stderr: "compilation timed out".to_string(),
                    });
                }
                Ok(result) => {
                    let result = result?;
                    if !result.status.success() {
                        return Ok(Compiled::Error {
                            stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
                        });
                    }
                }
            }
        }

        Ok(Compiled::Ok(ProcessArtifact {
            dir: Arc::new(dir),
            language,
        }))
    }

    async fn run(
        &self,
        artifact: &ProcessArtifact,
        input: &str,
        limits: ExecLimits,
    ) -> Result<RunOutcome, SandboxError> {
        let command = artifact.language.run_command(artifact.dir.path());
        let mut cmd = Command::new(&command.binary_path);
        cmd.args(&command.args)
            .current_dir(artifact.dir.path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        apply_memory_limit(&mut cmd, limits.memory_limit_mb);

        let started = Instant::now();
        let mut child = cmd.spawn()?;

        // Fed concurrently with the wait below. An input larger than the
        // pipe buffer handed to a program that is slow to read it must not
        // stall the clock: the wall budget covers the whole run, write
        // included. A program that never reads its input closes the pipe
        // early; that is its own business, not a judge failure.
        let stdin = child.stdin.take();
        let payload = input.as_bytes().to_vec();
        let feeder = tokio::spawn(async move {
            if let Some(mut stdin) = stdin {
                let _ = stdin.write_all(&payload).await;
            }
        });

        let wall_budget = Duration::from_millis(limits.time_limit_ms as u64 + 50);
        let output = match timeout(wall_budget, child.wait_with_output()).await {
            Err(_elapsed) => {
                feeder.abort();
                return Ok(RunOutcome {
                    status: RunStatus::TimeLimitExceeded,
                    stdout: String::new(),
                    time_ms: limits.time_limit_ms,
                });
            }
            Ok(output) => output?,
        };

        let time_ms = started.elapsed().as_millis().min(i32::MAX as u128) as i32;

        if output.status.success() {
            return Ok(RunOutcome {
                status: RunStatus::Ok,
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                time_ms,
            });
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let status = if looks_like_oom(&stderr) {
            RunStatus::MemoryLimitExceeded
        } else {
            RunStatus::RuntimeError
        };

        Ok(RunOutcome {
            status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            time_ms,
        })
    }
}

/// Death under the address-space rlimit surfaces differently per language:
/// C++ aborts on `bad_alloc`, Python raises `MemoryError`, the allocator may
/// print its own message.
fn looks_like_oom(stderr: &str) -> bool {
    stderr.contains("bad_alloc") || stderr.contains("MemoryError") || stderr.contains("out of memory")
}

#[cfg(unix)]
fn apply_memory_limit(cmd: &mut Command, memory_limit_mb: i32) {
    let bytes = (memory_limit_mb.max(1) as u64).saturating_mul(1024 * 1024);
    unsafe {
        cmd.pre_exec(move || {
            let limit = libc::rlimit {
                rlim_cur: bytes,
                rlim_max: bytes,
            };
            if libc::setrlimit(libc::RLIMIT_AS, &limit) != 0 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        });
    }
}

#[cfg(not(unix))]
fn apply_memory_limit(_cmd: &mut Command, _memory_limit_mb: i32) {}
