use super::remote::RemoteEngine;
use super::uci::UciProcess;
use super::{EngineConfig, MAX_SKILL_LEVEL};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

const QUIT_TIMEOUT: Duration = Duration::from_secs(2);

/// Opponent move source: a local UCI engine process, optionally preceded by
/// a hosted engine, with replies padded to a minimum latency.
pub struct EngineClient {
    config: EngineConfig,
    process: Option<UciProcess>,
    remote: Option<RemoteEngine>,
}

fn clamp_skill(level: u8) -> u8 {
    if level > MAX_SKILL_LEVEL {
        warn!(
            "Skill level {} out of range, clamping to {}",
            level, MAX_SKILL_LEVEL
        );
        MAX_SKILL_LEVEL
    } else {
        level
    }
}

fn clamp_depth(depth: u8) -> u8 {
    if depth == 0 {
        warn!("Search depth 0 is not searchable, using 1");
        1
    } else {
        depth
    }
}

impl EngineClient {
    /// Start the engine. Failures are logged and leave a client whose
    /// requests answer `None` unless the remote engine can serve them.
    #[instrument(skip(config), fields(program = %config.program))]
    pub async fn start(mut config: EngineConfig) -> Self {
        config.skill_level = clamp_skill(config.skill_level);
        config.search_depth = clamp_depth(config.search_depth);

        let process = match UciProcess::spawn(&config.program, &config.args, config.response_timeout).await
        {
            Ok(mut process) => match process.set_skill_level(config.skill_level).await {
                Ok(()) => Some(process),
                Err(e) => {
                    error!("Failed to configure engine: {}", e);
                    None
                }
            },
            Err(e) => {
                error!("Failed to start engine: {}", e);
                None
            }
        };

        let remote = match RemoteEngine::new(&config.remote_url, config.response_timeout) {
            Ok(remote) => Some(remote),
            Err(e) => {
                warn!("Remote engine unavailable: {}", e);
                None
            }
        };

        Self {
            config,
            process,
            remote,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Whether a local engine process is running
    pub fn has_local_engine(&self) -> bool {
        self.process.is_some()
    }

    pub async fn configure(&mut self, search_depth: u8, skill_level: u8, use_remote: bool) {
        self.config.search_depth = clamp_depth(search_depth);
        self.config.use_remote = use_remote;

        let skill_level = clamp_skill(skill_level);
        if skill_level != self.config.skill_level {
            self.config.skill_level = skill_level;
            if let Some(process) = self.process.as_mut() {
                if let Err(e) = process.set_skill_level(skill_level).await {
                    error!("Failed to update skill level: {}", e);
                    self.process = None;
                }
            }
        }
        info!(
            depth = self.config.search_depth,
            skill = self.config.skill_level,
            remote = self.config.use_remote,
            "Engine configured"
        );
    }

    /// Best move for `position`, or `None` when no engine could answer or the
    /// side to move has no move. Never returns before `min_latency` elapses.
    #[instrument(level = "debug", skip(self))]
    pub async fn request_move(&mut self, position: &str) -> Option<String> {
        let started = Instant::now();
        let best = self.search(position).await;

        let elapsed = started.elapsed();
        if elapsed < self.config.min_latency {
            tokio::time::sleep(self.config.min_latency - elapsed).await;
        }
        debug!(?best, elapsed = ?started.elapsed(), "Engine request finished");
        best
    }

    async fn search(&mut self, position: &str) -> Option<String> {
        let depth = self.config.search_depth;

        if self.config.use_remote {
            if let Some(remote) = &self.remote {
                match remote.best_move(position, depth).await {
                    Ok(best) => return best,
                    Err(e) => warn!("Remote engine failed, falling back to local engine: {}", e),
                }
            }
        }

        let Some(process) = self.process.as_mut() else {
            warn!("No local engine available");
            return None;
        };

        match process.search(position, depth, self.config.response_timeout).await {
            Ok(best) => best,
            Err(e) => {
                // The process is either gone or mid-search; neither is reusable
                error!("Local engine failed: {}", e);
                self.process = None;
                None
            }
        }
    }

    pub async fn shutdown(&mut self) {
        if let Some(process) = self.process.take() {
            info!("Stopping engine");
            process.quit(QUIT_TIMEOUT).await;
        }
    }
}
