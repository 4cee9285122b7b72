//! OAuth2 device-authorization grant against Google's endpoints.
//!
//! The flow: ask for a device/user code pair, have the user approve it at the
//! verification URL, poll the token endpoint until tokens arrive, then keep
//! the access token fresh by exchanging the refresh token shortly before
//! expiry. Tokens live in an injected [`TokenStore`].

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    store::TokenStore,
};

pub const DEVICE_CODE_URL: &str = "https://oauth2.googleapis.com/device/code";
pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

const SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";
const DEVICE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Refresh this far ahead of expiry so a token does not die mid request.
const EXPIRY_MARGIN_MILLIS: i64 = 5 * 60 * 1000;

/// Response of `POST /device/code`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceCodeResponse {
    pub device_code: String,
    /// Short code the user types in at `verification_url`.
    pub user_code: String,
    pub verification_url: String,
    /// Lifetime of `device_code` in seconds.
    pub expires_in: i64,
    /// Poll interval in seconds dictated by the server.
    pub interval: i64,
}

/// Response of `POST /token`, for both the device and the refresh grant.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: i64,
}

#[derive(Debug, Clone, Deserialize)]
struct OAuthErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Persisted token state; `expires_at` is epoch millis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: i64,
}

impl StoredToken {
    /// Whether the access token is within the refresh margin of its expiry.
    pub fn needs_refresh(&self, now_millis: i64) -> bool {
        now_millis >= self.expires_at - EXPIRY_MARGIN_MILLIS
    }

    /// Fold a token endpoint response into stored state. Google only hands
    /// out a refresh token on the initial authorization, so a refresh
    /// response without one keeps the token already on file.
    pub fn updated(
        prev_refresh: Option<String>,
        response: TokenResponse,
        now_millis: i64,
    ) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token.or(prev_refresh),
            expires_at: now_millis + response.expires_in * 1000,
        }
    }
}

/// Outcome of one poll of the token endpoint during the device flow.
enum PollOutcome {
    Authorized(TokenResponse),
    Pending,
    SlowDown,
    Denied(String),
}

fn classify_poll_body(status_ok: bool, body: &str) -> PollOutcome {
    if status_ok {
        if let Ok(token) = serde_json::from_str::<TokenResponse>(body) {
            return PollOutcome::Authorized(token);
        }
    }

    match serde_json::from_str::<OAuthErrorResponse>(body) {
        Ok(err) => match err.error.as_str() {
            "authorization_pending" => PollOutcome::Pending,
            "slow_down" => PollOutcome::SlowDown,
            _ => PollOutcome::Denied(err.error_description.unwrap_or(err.error)),
        },
        Err(_) => PollOutcome::Denied(body.to_string()),
    }
}

/// Obtains, refreshes and persists the OAuth session for one client ID.
pub struct TokenManager {
    http: reqwest::Client,
    client_id: String,
    store: Arc<dyn TokenStore>,
}

impl TokenManager {
    pub fn new(client_id: String, store: Arc<dyn TokenStore>) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id,
            store,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self.store.load(), Ok(Some(_)))
    }

    /// Ask Google for a device/user code pair to start a login. Showing
    /// `user_code` and `verification_url` to the user is the caller's job.
    pub async fn request_device_code(&self) -> Result<DeviceCodeResponse> {
        if self.client_id.is_empty() {
            return Err(Error::MissingClientId);
        }

        let response = self
            .http
            .post(DEVICE_CODE_URL)
            .form(&[("client_id", self.client_id.as_str()), ("scope", SCOPE)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Error::RequestFailed(response.status()));
        }

        Ok(response.json().await?)
    }

    /// Poll the token endpoint until the user approves the device, the code
    /// expires, or the server reports a terminal error. On success the tokens
    /// are persisted before returning. Dropping the future cancels the wait.
    pub async fn wait_for_authorization(&self, device: &DeviceCodeResponse) -> Result<StoredToken> {
        let deadline = Utc::now().timestamp_millis() + device.expires_in * 1000;
        let mut interval = device.interval.max(1) as u64;

        loop {
            tokio::time::sleep(Duration::from_secs(interval)).await;
            if Utc::now().timestamp_millis() >= deadline {
                return Err(Error::CodeExpired);
            }

            let response = self
                .http
                .post(TOKEN_URL)
                .form(&[
                    ("client_id", self.client_id.as_str()),
                    ("device_code", device.device_code.as_str()),
                    ("grant_type", DEVICE_GRANT_TYPE),
                ])
                .send()
                .await?;
            let status_ok = response.status().is_success();
            let body = response.text().await?;

            match classify_poll_body(status_ok, &body) {
                PollOutcome::Authorized(token) => {
                    let stored = StoredToken::updated(None, token, Utc::now().timestamp_millis());
                    self.store.save(&stored)?;
                    info!("device authorization complete");
                    return Ok(stored);
                }
                PollOutcome::Pending => {}
                PollOutcome::SlowDown => {
                    interval += 5;
                    debug!("token endpoint asked to slow down, now polling every {interval}s");
                }
                PollOutcome::Denied(reason) => {
                    warn!("device authorization denied: {reason}");
                    return Err(Error::Authorization(reason));
                }
            }
        }
    }

    /// A valid bearer token, refreshed first when it is about to expire.
    /// Reads the store fresh on every call.
    pub async fn access_token(&self) -> Result<String> {
        let stored = self.store.load()?.ok_or(Error::NotLoggedIn)?;
        if !stored.needs_refresh(Utc::now().timestamp_millis()) {
            return Ok(stored.access_token);
        }

        let refreshed = self.refresh(stored).await?;
        Ok(refreshed.access_token)
    }

    async fn refresh(&self, stored: StoredToken) -> Result<StoredToken> {
        let Some(refresh_token) = stored.refresh_token.clone() else {
            self.store.clear()?;
            return Err(Error::SessionExpired);
        };

        debug!("access token about to expire, refreshing");

        let response = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("refresh_token", refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            // A rejected refresh token cannot recover, drop the session.
            warn!("token refresh failed with status {}", response.status());
            self.store.clear()?;
            return Err(Error::SessionExpired);
        }

        let token: TokenResponse = response.json().await?;
        let updated = StoredToken::updated(
            stored.refresh_token,
            token,
            Utc::now().timestamp_millis(),
        );
        self.store.save(&updated)?;
        Ok(updated)
    }

    /// Forget the stored session.
    pub fn logout(&self) -> Result<()> {
        self.store.clear()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryTokenStore;

    fn token(expires_at: i64, refresh: Option<&str>) -> StoredToken {
        StoredToken {
            access_token: "access".to_string(),
            refresh_token: refresh.map(|r| r.to_string()),
            expires_at,
        }
    }

    #[test]
    fn test_needs_refresh_inside_margin() {
        let now = 1_000_000_000;
        assert!(token(now + EXPIRY_MARGIN_MILLIS, None).needs_refresh(now));
        assert!(token(now - 1, None).needs_refresh(now));
    }

    #[test]
    fn test_needs_refresh_outside_margin() {
        let now = 1_000_000_000;
        assert!(!token(now + EXPIRY_MARGIN_MILLIS + 1, None).needs_refresh(now));
    }

    #[test]
    fn test_updated_keeps_previous_refresh_token() {
        let response = TokenResponse {
            access_token: "new-access".to_string(),
            refresh_token: None,
            expires_in: 3600,
        };

        let stored = StoredToken::updated(Some("old-refresh".to_string()), response, 1_000);
        assert_eq!(stored.access_token, "new-access");
        assert_eq!(stored.refresh_token.as_deref(), Some("old-refresh"));
        assert_eq!(stored.expires_at, 1_000 + 3600 * 1000);
    }

    #[test]
    fn test_updated_prefers_new_refresh_token() {
        let response = TokenResponse {
            access_token: "new-access".to_string(),
            refresh_token: Some("new-refresh".to_string()),
            expires_in: 60,
        };

        let stored = StoredToken::updated(Some("old-refresh".to_string()), response, 0);
        assert_eq!(stored.refresh_token.as_deref(), Some("new-refresh"));
    }

    #[test]
    fn test_classify_authorized() {
        let body = r#"{"access_token": "a", "refresh_token": "r", "expires_in": 3599, "token_type": "Bearer"}"#;
        assert!(matches!(
            classify_poll_body(true, body),
            PollOutcome::Authorized(_)
        ));
    }

    #[test]
    fn test_classify_pending_and_slow_down() {
        assert!(matches!(
            classify_poll_body(false, r#"{"error": "authorization_pending"}"#),
            PollOutcome::Pending
        ));
        assert!(matches!(
            classify_poll_body(false, r#"{"error": "slow_down"}"#),
            PollOutcome::SlowDown
        ));
    }

    #[test]
    fn test_classify_terminal_error_uses_description() {
        let body = r#"{"error": "access_denied", "error_description": "user said no"}"#;
        match classify_poll_body(false, body) {
            PollOutcome::Denied(reason) => assert_eq!(reason, "user said no"),
            _ => panic!("expected denial"),
        }
    }

    #[test]
    fn test_classify_garbage_body_is_denied() {
        assert!(matches!(
            classify_poll_body(false, "<html>gateway error</html>"),
            PollOutcome::Denied(_)
        ));
    }

    #[tokio::test]
    async fn test_access_token_requires_login() {
        let manager = TokenManager::new(
            "client".to_string(),
            Arc::new(MemoryTokenStore::default()),
        );

        assert!(matches!(
            manager.access_token().await,
            Err(Error::NotLoggedIn)
        ));
    }

    #[tokio::test]
    async fn test_access_token_returns_fresh_token_without_refresh() {
        let store = Arc::new(MemoryTokenStore::default());
        let far_future = Utc::now().timestamp_millis() + 60 * 60 * 1000;
        store.save(&token(far_future, Some("r"))).unwrap();

        let manager = TokenManager::new("client".to_string(), store);
        assert_eq!(manager.access_token().await.unwrap(), "access");
    }

    #[tokio::test]
    async fn test_expired_token_without_refresh_token_clears_session() {
        let store = Arc::new(MemoryTokenStore::default());
        store.save(&token(0, None)).unwrap();

        let manager = TokenManager::new("client".to_string(), store.clone());
        assert!(matches!(
            manager.access_token().await,
            Err(Error::SessionExpired)
        ));
        assert!(store.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_request_device_code_requires_client_id() {
        let manager =
            TokenManager::new(String::new(), Arc::new(MemoryTokenStore::default()));

        assert!(matches!(
            manager.request_device_code().await,
            Err(Error::MissingClientId)
        ));
    }

    #[test]
    fn test_logout_clears_store() {
        let store = Arc::new(MemoryTokenStore::default());
        store.save(&token(0, Some("r"))).unwrap();

        let manager = TokenManager::new("client".to_string(), store.clone());
        manager.logout().unwrap();
        assert!(!manager.is_logged_in());
    }
}
