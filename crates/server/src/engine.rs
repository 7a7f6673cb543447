//! Stockfish engine wrapper using UCI protocol (async I/O), plus the
//! shared handle that serializes access and absorbs engine faults.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use annotator_core::eval::RawScore;

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct EngineError(String);

/// Result of a single position evaluation. A default value (no score,
/// empty PV) is the neutral stand-in for a failed or timed-out search.
#[derive(Debug, Clone, Default)]
pub struct EngineEval {
    /// Score from the side to move, when the engine reported one.
    pub score: Option<RawScore>,
    /// Principal variation in UCI notation.
    pub pv: Vec<String>,
}

impl EngineEval {
    pub fn best_uci(&self) -> Option<&str> {
        self.pv.first().map(String::as_str)
    }
}

/// Stockfish engine instance
pub struct StockfishEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl StockfishEngine {
    /// Spawn a new Stockfish process and initialize UCI
    pub async fn new(path: &str) -> Result<Self, EngineError> {
        let mut process = Command::new(path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| EngineError(format!("Failed to spawn Stockfish: {e}")))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| EngineError("Stockfish stdin not captured".to_string()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| EngineError("Stockfish stdout not captured".to_string()))?;

        let mut engine = Self {
            process,
            stdin,
            stdout: BufReader::new(stdout),
        };

        // Initialize UCI
        engine.send("uci").await?;
        engine.wait_for("uciok").await?;

        // Configure for analysis
        engine.send("setoption name Threads value 1").await?;
        engine.send("setoption name Hash value 256").await?;
        engine.send("setoption name UCI_AnalyseMode value true").await?;
        engine.send("isready").await?;
        engine.wait_for("readyok").await?;

        Ok(engine)
    }

    /// Send a command to Stockfish
    async fn send(&mut self, cmd: &str) -> Result<(), EngineError> {
        debug!(cmd, "SF <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| EngineError(format!("Failed to write to Stockfish: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| EngineError(format!("Failed to flush stdin: {e}")))?;
        Ok(())
    }

    /// Wait for a specific response line
    async fn wait_for(&mut self, expected: &str) -> Result<(), EngineError> {
        let mut line = String::new();
        loop {
            line.clear();
            let n = self
                .stdout
                .read_line(&mut line)
                .await
                .map_err(|e| EngineError(format!("Failed to read from Stockfish: {e}")))?;
            if n == 0 {
                return Err(EngineError("Stockfish closed its stdout".to_string()));
            }
            let trimmed = line.trim();
            debug!(line = trimmed, "SF >");
            if trimmed.starts_with(expected) {
                return Ok(());
            }
        }
    }

    /// Evaluate a position to a fixed depth. The score and PV come from
    /// the last full info line before `bestmove`.
    pub async fn evaluate(&mut self, fen: &str, depth: u32) -> Result<EngineEval, EngineError> {
        self.send(&format!("position fen {fen}")).await?;
        self.send(&format!("go depth {depth}")).await?;

        let mut result = EngineEval::default();

        let mut line = String::new();
        loop {
            line.clear();
            let n = self
                .stdout
                .read_line(&mut line)
                .await
                .map_err(|e| EngineError(format!("Failed to read from Stockfish: {e}")))?;
            if n == 0 {
                return Err(EngineError("Stockfish closed its stdout".to_string()));
            }
            let trimmed = line.trim();

            if trimmed.starts_with("info") && trimmed.contains(" pv ") {
                if let Some(score) = parse_score(trimmed) {
                    result.score = Some(score);
                }
                result.pv = parse_pv(trimmed);
            } else if trimmed.starts_with("bestmove") {
                // Terminal positions report "bestmove (none)" and no PV.
                let parts: Vec<&str> = trimmed.split_whitespace().collect();
                if result.pv.is_empty() {
                    if let Some(best) = parts.get(1).filter(|m| **m != "(none)") {
                        result.pv.push((*best).to_string());
                    }
                }
                break;
            }
        }

        Ok(result)
    }

    /// Stop a search that outlived its caller and drain its output, so
    /// the next evaluate does not read this search's `bestmove`.
    pub async fn abort_search(&mut self) {
        if self.send("stop").await.is_err() {
            return;
        }
        let _ = tokio::time::timeout(Duration::from_secs(2), self.wait_for("bestmove")).await;
    }

    /// Send quit command and wait for process to exit
    pub async fn quit(&mut self) {
        let _ = self.send("quit").await;
        let _ = self.process.wait().await;
    }
}

impl Drop for StockfishEngine {
    fn drop(&mut self) {
        // Best-effort synchronous kill in drop
        let _ = self.process.start_kill();
    }
}

/// Cloneable handle over the single engine process. All callers funnel
/// through one mutex; a fault or timeout yields a neutral eval instead
/// of an error, so one slow search cannot fail a request.
#[derive(Clone)]
pub struct EngineHandle {
    inner: Arc<Mutex<StockfishEngine>>,
    timeout: Duration,
}

impl EngineHandle {
    pub fn new(engine: StockfishEngine, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
            timeout,
        }
    }

    pub async fn evaluate(&self, fen: &str, depth: u32) -> EngineEval {
        let inner = Arc::clone(&self.inner);
        let timeout = self.timeout;
        let fen = fen.to_string();
        // The search runs on its own task: a handler dropped by a client
        // disconnect must not release the mutex while Stockfish is still
        // printing, or the next caller reads this search's output as its
        // own.
        run_detached(async move {
            let mut engine = inner.lock().await;
            match tokio::time::timeout(timeout, engine.evaluate(&fen, depth)).await {
                Ok(Ok(eval)) => eval,
                Ok(Err(e)) => {
                    warn!(fen, depth, error = %e, "engine fault, scoring position as neutral");
                    EngineEval::default()
                }
                Err(_) => {
                    warn!(fen, depth, "engine timed out, scoring position as neutral");
                    engine.abort_search().await;
                    EngineEval::default()
                }
            }
        })
        .await
        .unwrap_or_default()
    }
}

/// Run a future on its own task so it finishes even if the caller is
/// cancelled. Returns None only if the task panicked.
async fn run_detached<F, T>(fut: F) -> Option<T>
where
    F: std::future::Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::spawn(fut).await {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(error = %e, "detached engine task failed");
            None
        }
    }
}

/// Parse a cp or mate score from an info line.
fn parse_score(line: &str) -> Option<RawScore> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    for (i, part) in parts.iter().enumerate() {
        match *part {
            "cp" => {
                if let Some(cp) = parts.get(i + 1).and_then(|v| v.parse().ok()) {
                    return Some(RawScore::Centipawns(cp));
                }
            }
            "mate" => {
                if let Some(n) = parts.get(i + 1).and_then(|v| v.parse().ok()) {
                    return Some(RawScore::MateIn(n));
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse PV moves from info line
fn parse_pv(line: &str) -> Vec<String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let mut in_pv = false;
    let mut moves = Vec::new();

    for part in parts {
        if part == "pv" {
            in_pv = true;
            continue;
        }
        if in_pv {
            // PV ends at next keyword or end of line
            if part.starts_with("bmc") || part == "string" {
                break;
            }
            moves.push(part.to_string());
        }
    }

    moves
}
