//! Line-oriented conversation with a UCI engine subprocess.

use super::EngineError;
use regex::Regex;
use std::process::Stdio;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info, instrument, trace, warn};

fn bestmove_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^bestmove\b\s*(\S*)").expect("bestmove pattern is valid"))
}

/// The move token of a `bestmove` line, or `None` for any other line.
/// A bare `bestmove` yields an empty token; `(none)` is returned as-is.
pub fn parse_bestmove(line: &str) -> Option<&str> {
    bestmove_pattern()
        .captures(line.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

pub struct UciProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl UciProcess {
    /// Spawn the engine and complete the `uci` / `uciok` handshake
    #[instrument(skip(args))]
    pub async fn spawn(program: &str, args: &[String], timeout: Duration) -> Result<Self, EngineError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EngineError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or(EngineError::Closed)?;
        let stdout = child.stdout.take().ok_or(EngineError::Closed)?;

        let mut process = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
        };

        process.send("uci").await?;
        process
            .read_until(timeout, |line| line.trim() == "uciok")
            .await?;
        info!("Engine {} ready", program);
        Ok(process)
    }

    pub async fn send(&mut self, command: &str) -> Result<(), EngineError> {
        trace!(command, "-> engine");
        self.stdin.write_all(command.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;
        Ok(())
    }

    async fn read_line(&mut self) -> Result<String, EngineError> {
        let line = self.stdout.next_line().await?.ok_or(EngineError::Closed)?;
        trace!(line = %line, "<- engine");
        Ok(line)
    }

    /// Read lines until one satisfies `done`, returning that line
    async fn read_until(
        &mut self,
        timeout: Duration,
        mut done: impl FnMut(&str) -> bool,
    ) -> Result<String, EngineError> {
        let wait = async {
            loop {
                let line = self.read_line().await?;
                if done(&line) {
                    return Ok::<String, EngineError>(line);
                }
            }
        };
        tokio::time::timeout(timeout, wait)
            .await
            .map_err(|_| EngineError::Timeout(timeout))?
    }

    pub async fn set_skill_level(&mut self, level: u8) -> Result<(), EngineError> {
        self.send(&format!("setoption name Skill Level value {}", level))
            .await
    }

    /// Search the position to a fixed depth. `Ok(None)` means the engine
    /// reported that it has no move.
    #[instrument(level = "debug", skip(self))]
    pub async fn search(
        &mut self,
        position: &str,
        depth: u8,
        timeout: Duration,
    ) -> Result<Option<String>, EngineError> {
        self.send(&format!("position fen {}", position)).await?;
        self.send(&format!("go depth {}", depth)).await?;

        let line = self
            .read_until(timeout, |line| parse_bestmove(line).is_some())
            .await?;
        let token = parse_bestmove(&line).unwrap_or_default();
        debug!(token, "Engine answered");

        if token.is_empty() || token == "(none)" {
            Ok(None)
        } else {
            Ok(Some(token.to_string()))
        }
    }

    /// Ask the engine to exit, killing it if it does not within `timeout`
    pub async fn quit(mut self, timeout: Duration) {
        if let Err(e) = self.send("quit").await {
            debug!("Engine did not accept quit: {}", e);
        }
        match tokio::time::timeout(timeout, self.child.wait()).await {
            Ok(Ok(status)) => debug!(?status, "Engine exited"),
            Ok(Err(e)) => warn!("Failed waiting for engine exit: {}", e),
            Err(_) => {
                warn!("Engine did not exit within {:?}, killing it", timeout);
                if let Err(e) = self.child.kill().await {
                    warn!("Failed to kill engine: {}", e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bestmove_lines() {
        assert_eq!(parse_bestmove("bestmove e7e5 ponder g1f3"), Some("e7e5"));
        assert_eq!(parse_bestmove("bestmove e7e8q"), Some("e7e8q"));
        assert_eq!(parse_bestmove("bestmove (none)"), Some("(none)"));
        assert_eq!(parse_bestmove("info depth 10 score cp 20"), None);
        assert_eq!(parse_bestmove("readyok"), None);
    }

    #[test]
    fn test_parse_bare_bestmove() {
        assert_eq!(parse_bestmove("bestmove"), Some(""));
        assert_eq!(parse_bestmove("bestmove  \r"), Some(""));
        assert_eq!(parse_bestmove("bestmoves e2e4"), None);
    }
}
