use serde::{Deserialize, Serialize};

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub token: TokenConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            speech: SpeechConfig::default(),
            token: TokenConfig::default(),
        }
    }
}

/// 语音会话配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    /// 声纹档案使用的区域设置
    #[serde(default = "default_locale")]
    pub profile_locale: String,
    /// 识别的源语言
    #[serde(default = "default_source_language")]
    pub source_language: String,
    /// 翻译目标语言列表
    #[serde(default = "default_target_languages")]
    pub target_languages: Vec<String>,
    /// 单次远程调用的超时时间（毫秒）
    #[serde(default = "default_remote_timeout_ms")]
    pub remote_timeout_ms: u64,
}

fn default_provider() -> String {
    "Mock".to_string()
}

fn default_locale() -> String {
    "en-US".to_string()
}

fn default_source_language() -> String {
    "en-US".to_string()
}

fn default_target_languages() -> Vec<String> {
    vec![
        "tr".to_string(),
        "es".to_string(),
        "pt-pt".to_string(),
        "ro".to_string(),
        "tlh-Latn".to_string(),
    ]
}

fn default_remote_timeout_ms() -> u64 {
    30_000
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            profile_locale: default_locale(),
            source_language: default_source_language(),
            target_languages: default_target_languages(),
            remote_timeout_ms: default_remote_timeout_ms(),
        }
    }
}

/// Token 服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Token 签发端点，缺省时根据 region 推导
    #[serde(default)]
    pub endpoint: Option<String>,
    /// 订阅密钥，缺省时读取环境变量 SPEECH_KEY
    #[serde(default)]
    pub key: Option<String>,
    /// 服务区域，缺省时读取环境变量 SPEECH_REGION
    #[serde(default)]
    pub region: Option<String>,
    /// Token 有效期（秒）
    #[serde(default = "default_token_ttl_secs")]
    pub ttl_secs: u64,
    /// 距离过期多久视为失效并提前刷新（秒）
    #[serde(default = "default_refresh_margin_secs")]
    pub refresh_margin_secs: u64,
    /// 请求超时（毫秒）
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// 刷新失败后的重试次数
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// 重试间隔基数（毫秒），按次数线性退避
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_token_ttl_secs() -> u64 {
    600
}

fn default_refresh_margin_secs() -> u64 {
    60
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_retry_attempts() -> u32 {
    1
}

fn default_retry_backoff_ms() -> u64 {
    500
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            key: None,
            region: None,
            ttl_secs: default_token_ttl_secs(),
            refresh_margin_secs: default_refresh_margin_secs(),
            request_timeout_ms: default_request_timeout_ms(),
            retry_attempts: default_retry_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl TokenConfig {
    /// 解析订阅密钥：配置优先，其次环境变量
    pub fn resolved_key(&self) -> Option<String> {
        self.key
            .clone()
            .or_else(|| std::env::var("SPEECH_KEY").ok())
            .filter(|s| !s.is_empty())
    }

    /// 解析服务区域：配置优先，其次环境变量
    pub fn resolved_region(&self) -> Option<String> {
        self.region
            .clone()
            .or_else(|| std::env::var("SPEECH_REGION").ok())
            .filter(|s| !s.is_empty())
    }

    /// 解析端点地址：显式配置优先，否则根据区域推导
    pub fn resolved_endpoint(&self) -> Option<String> {
        self.endpoint.clone().or_else(|| {
            self.resolved_region().map(|region| {
                format!(
                    "https://{}.api.cognitive.microsoft.com/sts/v1.0/issueToken",
                    region
                )
            })
        })
    }
}

/// 环境变量在测试间共享，串行化读写避免互相干扰
#[cfg(test)]
pub(crate) fn test_env_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    match LOCK.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_complete() {
        let config = AppConfig::default();
        assert_eq!(config.speech.provider, "Mock");
        assert_eq!(config.speech.source_language, "en-US");
        assert_eq!(config.speech.target_languages.len(), 5);
        assert_eq!(config.token.ttl_secs, 600);
        assert_eq!(config.token.refresh_margin_secs, 60);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{"speech": {"provider": "Mock", "source_language": "de-DE"}}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.speech.source_language, "de-DE");
        // 未给出的字段回落到默认值
        assert_eq!(config.speech.profile_locale, "en-US");
        assert_eq!(config.token.retry_attempts, 1);
    }

    #[test]
    fn endpoint_derived_from_region() {
        let config = TokenConfig {
            region: Some("westus".to_string()),
            ..TokenConfig::default()
        };
        assert_eq!(
            config.resolved_endpoint().unwrap(),
            "https://westus.api.cognitive.microsoft.com/sts/v1.0/issueToken"
        );
    }

    #[test]
    fn explicit_endpoint_wins_over_region() {
        let config = TokenConfig {
            endpoint: Some("http://localhost:9000/token".to_string()),
            region: Some("westus".to_string()),
            ..TokenConfig::default()
        };
        assert_eq!(
            config.resolved_endpoint().unwrap(),
            "http://localhost:9000/token"
        );
    }

    #[test]
    fn key_falls_back_to_environment() {
        let _guard = test_env_lock();
        let config = TokenConfig::default();
        std::env::remove_var("SPEECH_KEY");
        assert!(config.resolved_key().is_none());

        std::env::set_var("SPEECH_KEY", "env-key");
        assert_eq!(config.resolved_key().unwrap(), "env-key");
        std::env::remove_var("SPEECH_KEY");

        let config = TokenConfig {
            key: Some("file-key".to_string()),
            ..TokenConfig::default()
        };
        assert_eq!(config.resolved_key().unwrap(), "file-key");
    }
}
