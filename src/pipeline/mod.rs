mod live;
mod speaker;
mod transcribe;

pub use live::{LiveSession, OutputStatus, TranscriptState};
pub use speaker::{SpeakerReport, WorkflowState};
pub use transcribe::FileTranscript;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::audio::AudioError;
use crate::config::settings::SpeechConfig;
use crate::speech::{CancellationDetail, SpeechError, SpeechService};
use crate::token::{TokenError, TokenProvider};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),
    #[error("Auth error: {0}")]
    Auth(#[from] TokenError),
    #[error("Speech error: {0}")]
    Speech(#[from] SpeechError),
    #[error("Remote canceled: {0}")]
    RemoteCanceled(CancellationDetail),
    #[error("Remote call timed out after {0:?}")]
    Timeout(Duration),
    #[error("Pipeline error: {0}")]
    Other(String),
}

/// 语音会话编排器
///
/// 四个工作流相互独立，除共享的凭据缓存外不保留任何跨调用状态。
pub struct SpeechPipeline {
    config: SpeechConfig,
    tokens: Arc<TokenProvider>,
    speech: Arc<dyn SpeechService>,
}

impl SpeechPipeline {
    pub fn new(
        config: SpeechConfig,
        tokens: Arc<TokenProvider>,
        speech: Arc<dyn SpeechService>,
    ) -> Self {
        Self {
            config,
            tokens,
            speech,
        }
    }

    pub fn config(&self) -> &SpeechConfig {
        &self.config
    }

    fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.config.remote_timeout_ms)
    }

    /// 给单次远程调用加上限定时长
    async fn bounded<T, F>(&self, fut: F) -> Result<T, PipelineError>
    where
        F: Future<Output = Result<T, SpeechError>>,
    {
        match tokio::time::timeout(self.remote_timeout(), fut).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => Err(PipelineError::Timeout(self.remote_timeout())),
        }
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use std::path::Path;
    use std::sync::Arc;

    use crate::config::settings::SpeechConfig;
    use crate::speech::MockSpeechService;
    use crate::token::TokenProvider;

    use super::SpeechPipeline;

    pub fn pipeline_with(mock: Arc<MockSpeechService>) -> SpeechPipeline {
        let tokens = Arc::new(TokenProvider::fixed("test-token", "local"));
        SpeechPipeline::new(SpeechConfig::default(), tokens, mock)
    }

    pub fn pipeline_with_timeout(mock: Arc<MockSpeechService>, timeout_ms: u64) -> SpeechPipeline {
        let tokens = Arc::new(TokenProvider::fixed("test-token", "local"));
        let config = SpeechConfig {
            remote_timeout_ms: timeout_ms,
            ..SpeechConfig::default()
        };
        SpeechPipeline::new(config, tokens, mock)
    }

    /// 写一个一秒长的单声道 16kHz PCM WAV
    pub fn write_wav(path: &Path) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..16000u32 {
            let t = i as f32 / 16000.0;
            let sample = ((t * 440.0 * std::f32::consts::TAU).sin() * 3000.0) as i16;
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();
    }
}
