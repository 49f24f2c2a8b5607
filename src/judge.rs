pub mod language;
pub mod sandbox;

use crate::errors::AppError;
use crate::schema::{problems, submissions, testcases};
use deadpool_diesel::InteractError;
use deadpool_diesel::sqlite::{Pool, PoolError};
use diesel::prelude::*;
use language::Language;
use sandbox::{Compiled, ExecLimits, RunStatus, Sandbox, SandboxError};
use thiserror::Error;
use tracing::{error, info, warn};

/// Infra-level retry bound per submission. Exhaustion resolves the submission
/// to `runtime_error` so no client is left polling a zombie.
const MAX_JUDGE_ATTEMPTS: u32 = 3;

/// Judging outcome states of a submission. Transitions only move forward:
/// `pending` → `running` → exactly one terminal verdict.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Verdict {
    Pending,
    Running,
    Accepted,
    WrongAnswer,
    TimeLimitExceeded,
    MemoryLimitExceeded,
    RuntimeError,
    CompileError,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Pending => "pending",
            Verdict::Running => "running",
            Verdict::Accepted => "accepted",
            Verdict::WrongAnswer => "wrong_answer",
            Verdict::TimeLimitExceeded => "time_limit_exceeded",
            Verdict::MemoryLimitExceeded => "memory_limit_exceeded",
            Verdict::RuntimeError => "runtime_error",
            Verdict::CompileError => "compile_error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Verdict::Pending | Verdict::Running)
    }
}

#[derive(Debug, Clone)]
pub struct JudgeJob {
    pub submission_id: i32,
}

/// Handle through which intake enqueues work for the judge workers.
#[derive(Clone)]
pub struct JudgeQueue {
    sender: async_channel::Sender<JudgeJob>,
}

impl JudgeQueue {
    pub fn enqueue(&self, job: JudgeJob) -> Result<(), AppError> {
        self.sender
            .try_send(job)
            .map_err(|e| AppError::InternalServerError(anyhow::anyhow!("judge queue closed: {}", e)))
    }
}

pub fn queue() -> (JudgeQueue, async_channel::Receiver<JudgeJob>) {
    let (sender, receiver) = async_channel::unbounded();
    (JudgeQueue { sender }, receiver)
}

/// Re-enqueues submissions stranded in a non-terminal state by a previous
/// process: the job channel lives in memory, so a restart (or a crash between
/// intake's insert and its enqueue) would otherwise leave them unjudged
/// forever. `running` rows are reset to `pending` first so the claim guard
/// accepts them again. Returns how many submissions were queued.
pub async fn recover_stranded(pool: &Pool, queue: &JudgeQueue) -> Result<usize, AppError> {
    let conn = pool.get().await?;
    let ids = conn
        .interact(|conn| {
            diesel::update(
                submissions::table.filter(submissions::status.eq(Verdict::Running.as_str())),
            )
            .set(submissions::status.eq(Verdict::Pending.as_str()))
            .execute(conn)?;

            submissions::table
                .filter(submissions::status.eq(Verdict::Pending.as_str()))
                .order(submissions::id.asc())
                .select(submissions::id)
                .load::<i32>(conn)
        })
        .await??;

    let count = ids.len();
    for submission_id in ids {
        queue.enqueue(JudgeJob { submission_id })?;
    }
    if count > 0 {
        info!(count, "re-enqueued stranded submissions");
    }
    Ok(count)
}

/// Spawns `count` worker tasks consuming the shared job channel. Each
/// submission is judged by exactly one worker; nothing is shared between
/// concurrently judged submissions but the pool.
pub fn spawn_workers<S>(
    pool: Pool,
    receiver: async_channel::Receiver<JudgeJob>,
    sandbox: S,
    count: usize,
) where
    S: Sandbox + Clone,
{
    for worker_id in 0..count {
        tokio::spawn(worker_loop(
            worker_id,
            pool.clone(),
            receiver.clone(),
            sandbox.clone(),
        ));
    }
}

async fn worker_loop<S: Sandbox>(
    worker_id: usize,
    pool: Pool,
    receiver: async_channel::Receiver<JudgeJob>,
    sandbox: S,
) {
    info!(worker_id, "judge worker started");
    while let Ok(job) = receiver.recv().await {
        process_job(&pool, &sandbox, job.submission_id).await;
    }
    info!(worker_id, "judge queue closed, worker stopping");
}

#[derive(Error, Debug)]
enum JudgeError {
    #[error("pool error: {0}")]
    Pool(#[from] PoolError),
    #[error("interact error: {0}")]
    Interact(#[from] InteractError),
    #[error("database error: {0}")]
    Db(#[from] diesel::result::Error),
    #[error("sandbox error: {0}")]
    Sandbox(#[from] SandboxError),
}

#[derive(Debug, PartialEq, Eq)]
struct JudgeOutcome {
    verdict: Verdict,
    score: i32,
    runtime_ms: i32,
}

/// Drives one submission from `pending` to a terminal verdict, retrying the
/// whole pass on infra failures up to [`MAX_JUDGE_ATTEMPTS`].
async fn process_job<S: Sandbox>(pool: &Pool, sandbox: &S, submission_id: i32) {
    match claim(pool, submission_id).await {
        Ok(true) => {}
        Ok(false) => {
            // Already claimed or already terminal; verdicts are immutable.
            info!(submission_id, "submission not pending, skipping");
            return;
        }
        Err(e) => {
            error!(submission_id, error = %e, "failed to claim submission");
            return;
        }
    }

    for attempt in 1..=MAX_JUDGE_ATTEMPTS {
        match judge_once(pool, sandbox, submission_id).await {
            Ok(outcome) => {
                info!(
                    submission_id,
                    verdict = outcome.verdict.as_str(),
                    runtime_ms = outcome.runtime_ms,
                    "submission judged"
                );
                finalize(pool, submission_id, outcome).await;
                return;
            }
            Err(e) => {
                warn!(submission_id, attempt, error = %e, "judge pass failed, retrying");
            }
        }
    }

    warn!(submission_id, "judge retries exhausted, resolving to runtime_error");
    finalize(
        pool,
        submission_id,
        JudgeOutcome {
            verdict: Verdict::RuntimeError,
            score: 0,
            runtime_ms: 0,
        },
    )
    .await;
}

/// One full judge pass: compile, then run every hidden testcase in id order,
/// stopping at the first non-accepted case.
async fn judge_once<S: Sandbox>(
    pool: &Pool,
    sandbox: &S,
    submission_id: i32,
) -> Result<JudgeOutcome, JudgeError> {
    let (language_key, code, limits, cases) = load_job_data(pool, submission_id).await?;

    let Some(language) = Language::from_key(&language_key) else {
        // Intake rejects unknown languages; a row like this predates a
        // language being removed from the registry.
        warn!(submission_id, language = %language_key, "unknown language on judged submission");
        return Ok(JudgeOutcome {
            verdict: Verdict::CompileError,
            score: 0,
            runtime_ms: 0,
        });
    };

    let artifact = match sandbox.compile(language, &code).await? {
        Compiled::Ok(artifact) => artifact,
        Compiled::Error { stderr } => {
            info!(submission_id, "compilation failed: {}", stderr.lines().next().unwrap_or(""));
            return Ok(JudgeOutcome {
                verdict: Verdict::CompileError,
                score: 0,
                runtime_ms: 0,
            });
        }
    };

    let mut worst_time_ms = 0;
    for (input, expected_output) in &cases {
        let outcome = sandbox.run(&artifact, input, limits).await?;
        worst_time_ms = worst_time_ms.max(outcome.time_ms);

        let verdict = match outcome.status {
            RunStatus::TimeLimitExceeded => Verdict::TimeLimitExceeded,
            RunStatus::MemoryLimitExceeded => Verdict::MemoryLimitExceeded,
            RunStatus::RuntimeError => Verdict::RuntimeError,
            RunStatus::Ok => {
                if normalize_output(&outcome.stdout) == normalize_output(expected_output) {
                    continue;
                }
                Verdict::WrongAnswer
            }
        };

        return Ok(JudgeOutcome {
            verdict,
            score: 0,
            runtime_ms: worst_time_ms,
        });
    }

    Ok(JudgeOutcome {
        verdict: Verdict::Accepted,
        score: 100,
        runtime_ms: worst_time_ms,
    })
}

type JobData = (String, String, ExecLimits, Vec<(String, String)>);

async fn load_job_data(pool: &Pool, submission_id: i32) -> Result<JobData, JudgeError> {
    let conn = pool.get().await?;
    let data = conn
        .interact(move |conn| {
            let (language, code, problem_id) = submissions::table
                .find(submission_id)
                .select((submissions::language, submissions::code, submissions::problem_id))
                .first::<(String, String, i32)>(conn)?;

            let (time_limit_ms, memory_limit_mb) = problems::table
                .find(problem_id)
                .select((problems::time_limit, problems::memory_limit))
                .first::<(i32, i32)>(conn)?;

            let cases = testcases::table
                .filter(
                    testcases::problem_id
                        .eq(problem_id)
                        .and(testcases::is_sample.eq(false)),
                )
                .order(testcases::id.asc())
                .select((testcases::input, testcases::expected_output))
                .load::<(String, String)>(conn)?;

            Ok::<_, diesel::result::Error>((language, code, time_limit_ms, memory_limit_mb, cases))
        })
        .await??;

    let (language, code, time_limit_ms, memory_limit_mb, cases) = data;
    Ok((
        language,
        code,
        ExecLimits {
            time_limit_ms,
            memory_limit_mb,
        },
        cases,
    ))
}

/// `pending` → `running`, guarded on the current status. Returns false when
/// the submission was not pending (duplicate job, or already terminal).
async fn claim(pool: &Pool, submission_id: i32) -> Result<bool, JudgeError> {
    let conn = pool.get().await?;
    let updated = conn
        .interact(move |conn| {
            diesel::update(
                submissions::table.filter(
                    submissions::id
                        .eq(submission_id)
                        .and(submissions::status.eq(Verdict::Pending.as_str())),
                ),
            )
            .set(submissions::status.eq(Verdict::Running.as_str()))
            .execute(conn)
        })
        .await??;
    Ok(updated == 1)
}

/// Writes the terminal verdict, guarded on `running` so a finished submission
/// can never be overwritten.
async fn finalize(pool: &Pool, submission_id: i32, outcome: JudgeOutcome) {
    let result: Result<usize, JudgeError> = async {
        let conn = pool.get().await?;
        let updated = conn
            .interact(move |conn| {
                diesel::update(
                    submissions::table.filter(
                        submissions::id
                            .eq(submission_id)
                            .and(submissions::status.eq(Verdict::Running.as_str())),
                    ),
                )
                .set((
                    submissions::status.eq(outcome.verdict.as_str()),
                    submissions::score.eq(outcome.score),
                    submissions::runtime.eq(outcome.runtime_ms),
                ))
                .execute(conn)
            })
            .await??;
        Ok(updated)
    }
    .await;

    match result {
        Ok(1) => {}
        Ok(n) => warn!(submission_id, rows = n, "terminal verdict write matched no running row"),
        Err(e) => error!(submission_id, error = %e, "failed to write terminal verdict"),
    }
}

/// Output comparison ignores line-ending style and blank lines, so a
/// trailing newline or CRLF output never costs a verdict.
pub fn normalize_output(text: &str) -> String {
    text.split(['\n', '\r'])
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
