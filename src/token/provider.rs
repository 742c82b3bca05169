//! Token 提供者
//!
//! 缓存语音服务的访问凭据，失效前自动向签发端点刷新。
//! 刷新是幂等操作，允许有限次重试；其余远程调用一律不重试。

use std::fmt;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::Mutex;

use crate::config::settings::TokenConfig;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("API error: {0}")]
    Api(String),
}

/// 语音服务访问凭据
#[derive(Clone)]
pub struct Credential {
    pub token: String,
    pub region: String,
    pub expires_at: Instant,
}

impl Credential {
    /// 是否已失效（进入刷新余量窗口即视为失效）
    pub fn is_stale(&self, margin: Duration) -> bool {
        Instant::now() + margin >= self.expires_at
    }
}

// token 本体不落日志
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("region", &self.region)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(rename = "authToken")]
    auth_token: String,
    region: String,
}

/// Token 提供者
pub struct TokenProvider {
    config: TokenConfig,
    endpoint: String,
    key: String,
    client: reqwest::Client,
    cache: Mutex<Option<Credential>>,
}

impl TokenProvider {
    pub fn new(config: TokenConfig) -> Result<Self, TokenError> {
        let key = config
            .resolved_key()
            .ok_or_else(|| TokenError::Config("Speech key 未配置，请设置 SPEECH_KEY".to_string()))?;
        let endpoint = config.resolved_endpoint().ok_or_else(|| {
            TokenError::Config("Token 端点未配置，请设置 SPEECH_REGION 或 endpoint".to_string())
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| TokenError::Network(e.to_string()))?;

        Ok(Self {
            config,
            endpoint,
            key,
            client,
            cache: Mutex::new(None),
        })
    }

    /// 创建一个持有固定凭据的提供者，不发起任何网络请求
    ///
    /// 供 Mock 服务商与测试使用。
    pub fn fixed(token: impl Into<String>, region: impl Into<String>) -> Self {
        let credential = Credential {
            token: token.into(),
            region: region.into(),
            expires_at: Instant::now() + Duration::from_secs(86_400 * 365),
        };
        Self {
            config: TokenConfig::default(),
            endpoint: String::new(),
            key: String::new(),
            client: reqwest::Client::new(),
            cache: Mutex::new(Some(credential)),
        }
    }

    /// 获取凭据：缓存有效直接返回，否则刷新一次并更新缓存
    pub async fn get_credential(&self) -> Result<Credential, TokenError> {
        let margin = Duration::from_secs(self.config.refresh_margin_secs);

        let mut cache = self.cache.lock().await;
        if let Some(credential) = cache.as_ref() {
            if !credential.is_stale(margin) {
                return Ok(credential.clone());
            }
            tracing::debug!("Cached credential is stale, refreshing");
        }

        let credential = self.refresh().await?;
        *cache = Some(credential.clone());
        Ok(credential)
    }

    /// 刷新凭据，按配置做有限次线性退避重试
    async fn refresh(&self) -> Result<Credential, TokenError> {
        let backoff = Duration::from_millis(self.config.retry_backoff_ms);
        let mut last_error = TokenError::Api("token refresh failed".to_string());

        for attempt in 0..=self.config.retry_attempts {
            if attempt > 0 {
                tokio::time::sleep(backoff * attempt).await;
            }
            match self.fetch_once().await {
                Ok(credential) => {
                    tracing::info!(region = %credential.region, "Token refreshed");
                    return Ok(credential);
                }
                Err(e) => {
                    tracing::warn!(
                        "Token refresh attempt {}/{} failed: {}",
                        attempt + 1,
                        self.config.retry_attempts + 1,
                        e
                    );
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }

    async fn fetch_once(&self) -> Result<Credential, TokenError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TokenError::Network(format!(
                        "Token 请求超时（{}ms）",
                        self.config.request_timeout_ms
                    ))
                } else {
                    TokenError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TokenError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(TokenError::Api(format!("HTTP {}: {}", status, body)));
        }

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| TokenError::Api(format!("无法解析 token 响应: {}", e)))?;

        Ok(Credential {
            token: parsed.auth_token,
            region: parsed.region,
            expires_at: Instant::now() + Duration::from_secs(self.config.ttl_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN_BODY: &str = r#"{"authToken": "test-jwt", "region": "westus"}"#;

    fn test_config(endpoint: String) -> TokenConfig {
        TokenConfig {
            endpoint: Some(endpoint),
            key: Some("test-key".to_string()),
            region: Some("westus".to_string()),
            ttl_secs: 600,
            refresh_margin_secs: 60,
            request_timeout_ms: 5_000,
            retry_attempts: 0,
            retry_backoff_ms: 10,
        }
    }

    #[tokio::test]
    async fn valid_cache_triggers_zero_refreshes() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .match_header("Ocp-Apim-Subscription-Key", "test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(TOKEN_BODY)
            .expect(1)
            .create_async()
            .await;

        let provider =
            TokenProvider::new(test_config(format!("{}/token", server.url()))).unwrap();

        // 两次获取只允许一次网络请求
        let first = provider.get_credential().await.unwrap();
        let second = provider.get_credential().await.unwrap();

        mock.assert_async().await;
        assert_eq!(first.token, "test-jwt");
        assert_eq!(second.region, "westus");
    }

    #[tokio::test]
    async fn stale_cache_triggers_exactly_one_refresh_per_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .with_status(200)
            .with_body(TOKEN_BODY)
            .expect(2)
            .create_async()
            .await;

        let mut config = test_config(format!("{}/token", server.url()));
        // TTL 为零，凭据一签发即失效
        config.ttl_secs = 0;
        config.refresh_margin_secs = 0;
        let provider = TokenProvider::new(config).unwrap();

        provider.get_credential().await.unwrap();
        provider.get_credential().await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn refresh_is_retried_with_bounded_attempts() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .with_status(503)
            .with_body("unavailable")
            .expect(3)
            .create_async()
            .await;

        let mut config = test_config(format!("{}/token", server.url()));
        config.retry_attempts = 2;
        let provider = TokenProvider::new(config).unwrap();

        let result = provider.get_credential().await;
        mock.assert_async().await;
        assert!(matches!(result, Err(TokenError::Api(_))));
    }

    #[tokio::test]
    async fn malformed_response_is_an_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/token")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let provider =
            TokenProvider::new(test_config(format!("{}/token", server.url()))).unwrap();
        assert!(matches!(
            provider.get_credential().await,
            Err(TokenError::Api(_))
        ));
    }

    #[test]
    fn missing_key_is_a_config_error() {
        let _guard = crate::config::settings::test_env_lock();
        std::env::remove_var("SPEECH_KEY");
        let config = TokenConfig {
            endpoint: Some("http://localhost/token".to_string()),
            key: None,
            ..TokenConfig::default()
        };
        assert!(matches!(
            TokenProvider::new(config),
            Err(TokenError::Config(_))
        ));
    }

    #[test]
    fn missing_endpoint_and_region_is_a_config_error() {
        let _guard = crate::config::settings::test_env_lock();
        std::env::remove_var("SPEECH_REGION");
        let config = TokenConfig {
            key: Some("k".to_string()),
            endpoint: None,
            region: None,
            ..TokenConfig::default()
        };
        assert!(matches!(
            TokenProvider::new(config),
            Err(TokenError::Config(_))
        ));
    }

    #[tokio::test]
    async fn fixed_provider_never_hits_the_network() {
        let provider = TokenProvider::fixed("fixed-token", "local");
        let credential = provider.get_credential().await.unwrap();
        assert_eq!(credential.token, "fixed-token");
        assert_eq!(credential.region, "local");
    }

    #[test]
    fn debug_does_not_leak_token() {
        let credential = Credential {
            token: "secret-jwt".to_string(),
            region: "westus".to_string(),
            expires_at: Instant::now(),
        };
        let printed = format!("{:?}", credential);
        assert!(!printed.contains("secret-jwt"));
        assert!(printed.contains("westus"));
    }
}
