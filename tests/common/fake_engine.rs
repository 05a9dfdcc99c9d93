use chess3d::engine::EngineConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Shell stand-in for a UCI engine. Every command it receives is appended to
/// the log file given as `$1`; searches answer with the `bestmove` line in `$2`.
const SCRIPT: &str = r#"
while IFS= read -r line; do
  printf '%s\n' "$line" >> "$1"
  case "$line" in
    uci) echo "id name scripted"; echo "uciok" ;;
    go*) echo "info depth 1 score cp 13"; echo "$2" ;;
    quit) exit 0 ;;
  esac
done
"#;

pub struct FakeEngine {
    _dir: tempfile::TempDir,
    pub log: PathBuf,
}

impl FakeEngine {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("commands.log");
        Self { _dir: dir, log }
    }

    /// Engine configuration that runs the script answering `bestmove_line`
    pub fn config(&self, bestmove_line: &str) -> EngineConfig {
        EngineConfig {
            program: "sh".to_string(),
            args: vec![
                "-c".to_string(),
                SCRIPT.to_string(),
                "fake-engine".to_string(),
                self.log.display().to_string(),
                bestmove_line.to_string(),
            ],
            min_latency: Duration::ZERO,
            response_timeout: Duration::from_secs(5),
            ..EngineConfig::default()
        }
    }

    pub fn commands(&self) -> Vec<String> {
        read_lines(&self.log)
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(|l| l.to_string())
        .collect()
}

/// Configuration whose program does not exist
pub fn missing_engine_config() -> EngineConfig {
    EngineConfig {
        program: "/nonexistent/engine-binary".to_string(),
        min_latency: Duration::ZERO,
        response_timeout: Duration::from_secs(2),
        ..EngineConfig::default()
    }
}
