use super::{endpoint, ensure_success, ClientError, Result};
use crate::model::ValueOf;
use reqwest::{StatusCode, Url};
use serde::Serialize;

const ADMIN_USER: &str = "admin";

/// Reply to a control command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlOutcome {
    Accepted(String),
    /// HTTP 409; the body is the server's explanation.
    Rejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BanDuration {
    pub days: u32,
    pub hours: u32,
}

/// Authenticated control and moderation calls. Every request carries HTTP
/// Basic credentials for the `admin` user.
pub struct AdminClient {
    client: reqwest::Client,
    base_url: String,
    ban_enforcer_url: Option<String>,
    password: String,
}

impl AdminClient {
    pub fn new(
        base_url: impl Into<String>,
        ban_enforcer_url: Option<String>,
        password: Option<String>,
    ) -> Result<Self> {
        let password = password
            .filter(|p| !p.is_empty())
            .ok_or(ClientError::MissingPassword)?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            ban_enforcer_url,
            password,
        })
    }

    fn control_request(&self, verb: &str) -> Result<reqwest::Request> {
        Ok(self
            .client
            .post(endpoint(&self.base_url, &["control", verb])?)
            .basic_auth(ADMIN_USER, Some(&self.password))
            .build()?)
    }

    /// Run a control command such as `advance` or `reset`.
    pub async fn control(&self, verb: &str) -> Result<ControlOutcome> {
        tracing::info!(verb, "Sending control command");
        let resp = self.client.execute(self.control_request(verb)?).await?;
        if resp.status() == StatusCode::CONFLICT {
            let text = resp.text().await.unwrap_or_default();
            tracing::warn!(verb, reason = %text, "Control command rejected");
            return Ok(ControlOutcome::Rejected(text));
        }
        let resp = ensure_success(resp).await?;
        let reply: ValueOf<serde_json::Value> = super::decode(resp.bytes().await?.to_vec())?;
        let text = match reply.value {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        Ok(ControlOutcome::Accepted(text))
    }

    /// Ban route: the ban enforcer's `/bans/{guid}` when one is configured,
    /// else the campaign server's `/admin/{guid}/ban`.
    fn ban_url(&self, guid: &str) -> Result<Url> {
        match &self.ban_enforcer_url {
            Some(enforcer) => endpoint(enforcer, &["bans", guid]),
            None => endpoint(&self.base_url, &["admin", guid, "ban"]),
        }
    }

    pub async fn ban(&self, guid: &str, duration: BanDuration) -> Result<()> {
        tracing::info!(guid, days = duration.days, hours = duration.hours, "Banning player");
        let resp = self
            .client
            .post(self.ban_url(guid)?)
            .basic_auth(ADMIN_USER, Some(&self.password))
            .json(&duration)
            .send()
            .await?;
        ensure_success(resp).await?;
        Ok(())
    }

    pub async fn unban(&self, guid: &str) -> Result<()> {
        tracing::info!(guid, "Lifting ban");
        let resp = self
            .client
            .delete(self.ban_url(guid)?)
            .basic_auth(ADMIN_USER, Some(&self.password))
            .send()
            .await?;
        ensure_success(resp).await?;
        Ok(())
    }
}
