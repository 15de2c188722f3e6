use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::protocol::{PantographRequest, PantographResponse};
use crate::types::{Goal, LeanConfig, LeanError, ProofState, TacticResult};

/// A single Pantograph child process.
///
/// Communicates via JSON lines over stdin/stdout, one request at a time.
/// After a timeout the process is killed and every later request fails
/// with [`LeanError::ProcessDied`].
pub struct LeanWorker {
    child: Child,
    stdin: BufWriter<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    requests_handled: u64,
    alive: bool,
    config: LeanConfig,
}

impl LeanWorker {
    /// Spawn a new Pantograph child process.
    ///
    /// Launches via `lake exe repl <imports>` from the Lean project directory
    /// when `pantograph_path` is `lake`, otherwise runs the binary directly.
    /// Consumes the initial "ready." line.
    pub async fn spawn(config: &LeanConfig) -> Result<Self, LeanError> {
        let (child, stdin, stdout) = Self::spawn_process(config)?;

        let mut worker = Self {
            child,
            stdin,
            stdout,
            requests_handled: 0,
            alive: true,
            config: config.clone(),
        };

        if let Err(e) = worker.consume_ready_line().await {
            worker.shutdown().await;
            return Err(e);
        }

        tracing::debug!(
            pantograph_path = %config.pantograph_path.display(),
            lean_env_path = %config.lean_env_path.display(),
            "Spawned Lean worker"
        );

        Ok(worker)
    }

    fn spawn_process(
        config: &LeanConfig,
    ) -> Result<(Child, BufWriter<ChildStdin>, BufReader<ChildStdout>), LeanError> {
        let mut cmd = Command::new(&config.pantograph_path);

        let is_lake = config
            .pantograph_path
            .file_name()
            .is_some_and(|name| name == "lake");
        if is_lake {
            cmd.arg("exe").arg("repl");
        }
        for import in &config.imports {
            cmd.arg(import);
        }

        cmd.current_dir(&config.lean_env_path);

        let mut child = cmd
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = BufWriter::new(
            child
                .stdin
                .take()
                .ok_or_else(|| LeanError::Protocol("Failed to capture stdin".into()))?,
        );
        let stdout = BufReader::new(
            child
                .stdout
                .take()
                .ok_or_else(|| LeanError::Protocol("Failed to capture stdout".into()))?,
        );

        Ok((child, stdin, stdout))
    }

    async fn consume_ready_line(&mut self) -> Result<(), LeanError> {
        let mut line = String::new();
        let timeout_secs = self.config.startup_timeout_secs;
        let timeout = Duration::from_secs(timeout_secs);

        match tokio::time::timeout(timeout, self.stdout.read_line(&mut line)).await {
            Ok(Ok(0)) => Err(LeanError::ProcessDied),
            Ok(Ok(_)) => {
                let trimmed = line.trim();
                if trimmed != "ready." {
                    tracing::warn!(line = trimmed, "Unexpected first line from Pantograph");
                }
                Ok(())
            }
            Ok(Err(e)) => Err(LeanError::Io(e)),
            Err(_) => Err(LeanError::Timeout(timeout_secs)),
        }
    }

    /// Whether the process is still usable.
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Number of requests answered since spawn.
    pub fn requests_handled(&self) -> u64 {
        self.requests_handled
    }

    /// Send one JSON line and read one response line.
    ///
    /// Pantograph blocks until it sees the trailing `\n`.
    async fn send_line_timeout(
        &mut self,
        json: &str,
        timeout_secs: u64,
    ) -> Result<String, LeanError> {
        if !self.alive {
            return Err(LeanError::ProcessDied);
        }

        let write = async {
            self.stdin.write_all(json.as_bytes()).await?;
            self.stdin.write_all(b"\n").await?;
            self.stdin.flush().await
        };
        if let Err(e) = write.await {
            self.alive = false;
            return Err(if e.kind() == std::io::ErrorKind::BrokenPipe {
                LeanError::ProcessDied
            } else {
                LeanError::Io(e)
            });
        }

        let mut response_line = String::new();
        let timeout = Duration::from_secs(timeout_secs);
        let read_result =
            tokio::time::timeout(timeout, self.stdout.read_line(&mut response_line)).await;

        match read_result {
            Ok(Ok(0)) => {
                self.alive = false;
                Err(LeanError::ProcessDied)
            }
            Ok(Ok(_)) => {
                self.requests_handled += 1;
                Ok(response_line)
            }
            Ok(Err(e)) => Err(LeanError::Io(e)),
            Err(_) => {
                tracing::warn!(timeout_secs, "Lean request timed out, killing process");
                self.shutdown().await;
                Err(LeanError::Timeout(timeout_secs))
            }
        }
    }

    async fn goal_start(&mut self, request: PantographRequest) -> Result<ProofState, LeanError> {
        let json = request
            .to_json()
            .map_err(|e| LeanError::Protocol(format!("Serialization error: {e}")))?;

        // Elaborating the statement can take much longer than one tactic.
        let timeout = self
            .config
            .tactic_timeout_secs
            .max(self.config.startup_timeout_secs);
        let response_line = self.send_line_timeout(&json, timeout).await?;

        match PantographResponse::parse_goal_start(response_line.trim())? {
            PantographResponse::GoalStarted(result) => Ok(ProofState {
                state_id: result.state_id,
                goals: Vec::new(),
            }),
            PantographResponse::Error(e) => Err(LeanError::LeanMessage(e.desc)),
            PantographResponse::TacticResult(_) => Err(LeanError::Protocol(
                "Unexpected TacticResult from goal.start".into(),
            )),
        }
    }

    /// Start a new proof for the given expression.
    pub async fn start_proof(&mut self, expr: &str) -> Result<ProofState, LeanError> {
        self.goal_start(PantographRequest::start_expr(expr)).await
    }

    /// Start a new proof from a theorem already in the environment
    /// (Pantograph's `copyFrom`).
    pub async fn start_proof_by_name(&mut self, name: &str) -> Result<ProofState, LeanError> {
        self.goal_start(PantographRequest::start_copy_from(name)).await
    }

    /// Apply a tactic to a goal within a proof state.
    ///
    /// If `goal_id` is `None`, acts on the first goal. Lean-level failures
    /// come back as [`TacticResult::Failed`]; `Err` is reserved for the
    /// transport.
    pub async fn apply_tactic(
        &mut self,
        state_id: u64,
        goal_id: Option<u64>,
        tactic: &str,
    ) -> Result<TacticResult, LeanError> {
        let json = PantographRequest::tactic(state_id, goal_id, tactic)
            .to_json()
            .map_err(|e| LeanError::Protocol(format!("Serialization error: {e}")))?;

        let timeout = self.config.tactic_timeout_secs;
        let response_line = self.send_line_timeout(&json, timeout).await?;

        match PantographResponse::parse_goal_tactic(response_line.trim())? {
            PantographResponse::TacticResult(result) => {
                if let Some(message) = result.failure_message() {
                    return Ok(TacticResult::Failed { message });
                }
                match (result.next_state_id, result.goals) {
                    (Some(next_id), Some(goals)) if !goals.is_empty() => {
                        let goals: Vec<Goal> = goals
                            .iter()
                            .enumerate()
                            .map(|(i, g)| Goal::from_pantograph(i, g))
                            .collect();
                        Ok(TacticResult::Success {
                            state_id: next_id,
                            goals,
                        })
                    }
                    (Some(next_id), _) => Ok(TacticResult::ProofComplete { state_id: next_id }),
                    (None, _) => Ok(TacticResult::Failed {
                        message: "Tactic failed (no next state)".into(),
                    }),
                }
            }
            PantographResponse::Error(e) => Ok(TacticResult::Failed { message: e.desc }),
            PantographResponse::GoalStarted(_) => Err(LeanError::Protocol(
                "Unexpected GoalStarted from goal.tactic".into(),
            )),
        }
    }

    /// Kill the child process. Later requests fail with `ProcessDied`.
    pub async fn shutdown(&mut self) {
        self.alive = false;
        let _ = self.child.kill().await;
        let _ = self.child.wait().await;
        tracing::debug!("Lean worker shut down");
    }
}
