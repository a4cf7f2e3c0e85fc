//! HTTP rewards gateway.
//!
//! POSTs the completion report as JSON and reads back the service's
//! `{ success, data, error }` envelope.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{CompletionReport, RewardSummary, RewardsGateway};
use crate::error::{ConfigError, RewardsError};
use crate::storage::config::RewardsConfig;

/// Environment variable holding an optional bearer token for the service.
pub const TOKEN_ENV: &str = "LIFTOFF_REWARDS_TOKEN";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RewardsRequest<'a> {
    workout_id: &'a str,
    completed_sets: u32,
    total_exercises: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RewardsData {
    points_gained: u32,
    new_level: u32,
    #[serde(default)]
    new_achievements: Vec<String>,
    #[serde(default)]
    new_badges: Vec<String>,
}

#[derive(Deserialize)]
struct RewardsEnvelope {
    success: bool,
    #[serde(default)]
    data: Option<RewardsData>,
    #[serde(default)]
    error: Option<String>,
}

pub struct HttpRewardsGateway {
    client: Client,
    endpoint: Url,
    token: Option<String>,
    timeout: Duration,
}

impl HttpRewardsGateway {
    /// # Errors
    /// Returns an error if `endpoint` is not an http(s) URL or the client
    /// cannot be built.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: "rewards.endpoint".into(),
            message,
        };
        let endpoint = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", endpoint.scheme())));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| invalid(e.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            token: None,
            timeout,
        })
    }

    /// Build from configuration, picking up the token from [`TOKEN_ENV`].
    ///
    /// # Errors
    /// Returns an error if no endpoint is configured or it is invalid.
    pub fn from_config(config: &RewardsConfig) -> Result<Self, ConfigError> {
        let endpoint = config
            .endpoint
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingKey("rewards.endpoint".into()))?;
        let gateway = Self::new(endpoint, Duration::from_secs(config.timeout_secs))?;
        Ok(match std::env::var(TOKEN_ENV) {
            Ok(token) if !token.is_empty() => gateway.with_token(token),
            _ => gateway,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn transport_error(&self, err: reqwest::Error) -> RewardsError {
        if err.is_timeout() {
            RewardsError::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            RewardsError::Http(err)
        }
    }
}

impl RewardsGateway for HttpRewardsGateway {
    async fn submit(&self, report: &CompletionReport) -> Result<RewardSummary, RewardsError> {
        let body = RewardsRequest {
            workout_id: &report.reference_id,
            completed_sets: report.total_completed_sets,
            total_exercises: report.total_exercises,
        };
        let mut request = self.client.post(self.endpoint.clone()).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        tracing::debug!(endpoint = %self.endpoint, workout_id = %report.reference_id, "submitting rewards");
        let resp = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = resp.status();
        let text = resp.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(RewardsError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let envelope: RewardsEnvelope =
            serde_json::from_str(&text).map_err(|e| RewardsError::Malformed(e.to_string()))?;
        if !envelope.success {
            return Err(RewardsError::Rejected(
                envelope.error.unwrap_or_else(|| "no reason given".into()),
            ));
        }
        let data = envelope
            .data
            .ok_or_else(|| RewardsError::Malformed("missing data".into()))?;
        if data.new_level == 0 {
            return Err(RewardsError::Malformed("level must be positive".into()));
        }

        Ok(RewardSummary {
            points_gained: data.points_gained,
            new_level: data.new_level,
            new_achievements: data.new_achievements,
            new_badges: data.new_badges,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_http_endpoint() {
        let err = HttpRewardsGateway::new("ftp://example.com/rewards", Duration::from_secs(1));
        assert!(matches!(err, Err(ConfigError::InvalidValue { .. })));
        assert!(HttpRewardsGateway::new("not a url", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn from_config_requires_endpoint() {
        let config = RewardsConfig::default();
        assert!(matches!(
            HttpRewardsGateway::from_config(&config),
            Err(ConfigError::MissingKey(key)) if key == "rewards.endpoint"
        ));
    }

    #[test]
    fn request_uses_camel_case_wire_names() {
        let body = RewardsRequest {
            workout_id: "w-1",
            completed_sets: 6,
            total_exercises: 3,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({ "workoutId": "w-1", "completedSets": 6, "totalExercises": 3 })
        );
    }
}
