use std::path::Path;

use crate::audio::AudioSource;
use crate::speech::ResultReason;

use super::{OutputStatus, PipelineError, SpeechPipeline};

/// 单文件识别的结果
#[derive(Debug, Clone)]
pub struct FileTranscript {
    pub status: OutputStatus,
    pub text: Option<String>,
}

impl SpeechPipeline {
    /// 识别单个 WAV 文件
    ///
    /// 一次性调用，收到第一个结果即返回。文件必须是单声道 PCM WAV。
    /// 没有可识别语音时返回 `NoMatch` 状态而不是错误。
    pub async fn transcribe_file(&self, path: &Path) -> Result<FileTranscript, PipelineError> {
        let source = AudioSource::from_wav_file(path)?;
        let credential = self.tokens.get_credential().await?;

        let result = self
            .bounded(
                self.speech
                    .recognize_once(&credential, &self.config.source_language, &source),
            )
            .await?;

        match result.reason {
            ResultReason::Recognized => {
                tracing::info!("Recognized {} chars from {:?}", result.text.len(), path);
                Ok(FileTranscript {
                    status: OutputStatus::Recognized,
                    text: Some(result.text),
                })
            }
            ResultReason::NoMatch => {
                tracing::warn!("No recognizable speech in {:?}", path);
                Ok(FileTranscript {
                    status: OutputStatus::NoMatch,
                    text: None,
                })
            }
            ResultReason::Canceled => {
                let detail = result.cancellation.unwrap_or_default();
                tracing::error!("Recognition canceled: {}", detail);
                Err(PipelineError::RemoteCanceled(detail))
            }
        }
    }
}
