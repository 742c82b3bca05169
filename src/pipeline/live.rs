//! 连续识别+翻译
//!
//! 会话由外部语音服务驱动，事件经通道送回；`LiveSession` 持有
//! 停止句柄，`TranscriptState` 负责把事件折叠成界面输出模型。

use std::collections::HashMap;

use tokio::sync::mpsc;

use crate::speech::{
    RecognitionEvent, ResultReason, SessionControl, TranslationSessionConfig,
};

use super::{PipelineError, SpeechPipeline};

/// 输出状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStatus {
    /// 会话已开启，等待语音
    Listening,
    /// 收到中间结果
    Interim,
    /// 收到最终结果
    Recognized,
    /// 没有可识别的语音
    NoMatch,
}

/// 连续识别的输出模型
///
/// 译文按语言标签建键，每个目标语言恰有一个条目。
#[derive(Debug, Clone)]
pub struct TranscriptState {
    pub status: OutputStatus,
    pub text: String,
    pub translations: HashMap<String, String>,
}

impl TranscriptState {
    pub fn new(target_languages: &[String]) -> Self {
        Self {
            status: OutputStatus::Listening,
            text: String::new(),
            translations: target_languages
                .iter()
                .map(|language| (language.clone(), String::new()))
                .collect(),
        }
    }

    /// 应用一条会话事件，一次完整的读-改-写
    pub fn apply(&mut self, event: &RecognitionEvent) {
        match event {
            RecognitionEvent::Interim(result) => match result.reason {
                ResultReason::Recognized => {
                    self.status = OutputStatus::Interim;
                    self.text = result.text.clone();
                    self.merge_translations(&result.translations);
                }
                ResultReason::NoMatch => {
                    self.status = OutputStatus::NoMatch;
                }
                ResultReason::Canceled => {}
            },
            RecognitionEvent::Final(result) => match result.reason {
                ResultReason::Recognized => {
                    self.status = OutputStatus::Recognized;
                    self.text = result.text.clone();
                    self.merge_translations(&result.translations);
                }
                ResultReason::NoMatch => {
                    self.status = OutputStatus::NoMatch;
                }
                ResultReason::Canceled => {}
            },
            RecognitionEvent::Error(message) => {
                tracing::error!("Live session error: {}", message);
            }
        }
    }

    fn merge_translations(&mut self, translations: &HashMap<String, String>) {
        for (language, text) in translations {
            self.translations.insert(language.clone(), text.clone());
        }
    }
}

/// 运行中的连续识别会话
pub struct LiveSession {
    events: mpsc::Receiver<RecognitionEvent>,
    control: mpsc::Sender<SessionControl>,
    target_languages: Vec<String>,
}

impl LiveSession {
    /// 接收下一条事件，会话结束返回 `None`
    pub async fn next_event(&mut self) -> Option<RecognitionEvent> {
        self.events.recv().await
    }

    /// 停止会话
    pub async fn stop(&self) {
        if self.control.send(SessionControl::Stop).await.is_err() {
            tracing::debug!("Live session already closed");
        }
    }

    /// 创建与本会话目标语言匹配的输出模型
    pub fn new_transcript(&self) -> TranscriptState {
        TranscriptState::new(&self.target_languages)
    }
}

impl SpeechPipeline {
    /// 开启连续识别+翻译会话（默认麦克风输入）
    ///
    /// 会话持续运行，直到调用 [`LiveSession::stop`] 或服务端结束。
    pub async fn start_live(&self) -> Result<LiveSession, PipelineError> {
        let credential = self.tokens.get_credential().await?;

        let session_config = TranslationSessionConfig {
            source_language: self.config.source_language.clone(),
            target_languages: self.config.target_languages.clone(),
        };
        tracing::info!(
            "Starting live session: {} -> {:?}",
            session_config.source_language,
            session_config.target_languages
        );

        let (control, events) = self
            .bounded(self.speech.start_translation(&credential, session_config))
            .await?;

        Ok(LiveSession {
            events,
            control,
            target_languages: self.config.target_languages.clone(),
        })
    }
}
