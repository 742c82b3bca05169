#[cfg(feature = "mock")]
mod mock;
mod traits;
mod types;

#[cfg(feature = "mock")]
pub use mock::{MockSpeechService, MockUtterance, RecordedCall};
pub use traits::{
    RecognitionEvent, SessionControl, SpeechError, SpeechService, TranslationSessionConfig,
};
pub use types::{
    CancellationDetail, EnrollResult, EnrollmentProgress, ProfileKind, RecognitionResult,
    ResultReason, SpeakerMatch, VoiceProfile, TICKS_PER_SECOND,
};

use crate::config::settings::SpeechConfig;

/// 根据配置创建语音服务
pub fn create_speech_service(config: &SpeechConfig) -> Result<Box<dyn SpeechService>, SpeechError> {
    match config.provider.as_str() {
        #[cfg(feature = "mock")]
        "Mock" => Ok(Box::new(MockSpeechService::new())),
        other => Err(SpeechError::Config(format!(
            "未知的语音服务商: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_resolves_mock_provider() {
        let config = SpeechConfig::default();
        assert!(create_speech_service(&config).is_ok());
    }

    #[test]
    fn factory_rejects_unknown_provider() {
        let config = SpeechConfig {
            provider: "AzureSdk".to_string(),
            ..SpeechConfig::default()
        };
        assert!(matches!(
            create_speech_service(&config),
            Err(SpeechError::Config(_))
        ));
    }
}
