use super::EngineError;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

/// Length of the `"bestmove "` prefix in the service's answer
const BESTMOVE_PREFIX_LEN: usize = 9;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    bestmove: Option<String>,
    #[serde(default)]
    data: Option<String>,
}

/// Hosted engine reached over HTTP GET with `fen` and `depth` query parameters
pub struct RemoteEngine {
    http: reqwest::Client,
    url: String,
}

impl RemoteEngine {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, EngineError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.to_string(),
        })
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn best_move(&self, position: &str, depth: u8) -> Result<Option<String>, EngineError> {
        let response = self
            .http
            .get(&self.url)
            .query(&[("fen", position.to_string()), ("depth", depth.to_string())])
            .send()
            .await?
            .error_for_status()?;

        let text = response.text().await?;
        let body: SearchResponse = serde_json::from_str(&text)
            .map_err(|e| EngineError::MalformedResponse(format!("{}: {}", e, text)))?;
        if body.success == Some(false) {
            return Err(EngineError::MalformedResponse(
                body.data.unwrap_or_else(|| "search reported failure".to_string()),
            ));
        }

        let line = body
            .bestmove
            .ok_or_else(|| EngineError::MalformedResponse("missing bestmove field".to_string()))?;
        debug!(line = %line, "Remote engine answered");
        remote_token(&line)
    }
}

/// Extract the move from a `"bestmove <move> ponder <move>"` answer
pub fn remote_token(line: &str) -> Result<Option<String>, EngineError> {
    if !line.starts_with("bestmove") {
        return Err(EngineError::MalformedResponse(format!(
            "unexpected bestmove value {:?}",
            line
        )));
    }
    let token = line
        .get(BESTMOVE_PREFIX_LEN..)
        .and_then(|rest| rest.split_whitespace().next())
        .unwrap_or("");

    if token.is_empty() || token == "(none)" {
        Ok(None)
    } else {
        Ok(Some(token.to_string()))
    }
}
