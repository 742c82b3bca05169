use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::audio::AudioSource;
use crate::token::Credential;

use super::types::{
    EnrollResult, ProfileKind, RecognitionResult, SpeakerMatch, VoiceProfile,
};

#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("API error: {0}")]
    Api(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Session error: {0}")]
    Session(String),
}

/// 连续会话控制命令
#[derive(Debug)]
pub enum SessionControl {
    /// 停止会话并关闭事件通道
    Stop,
}

/// 连续识别会话事件
#[derive(Debug, Clone)]
pub enum RecognitionEvent {
    /// 中间结果，同一句话内会反复触发
    Interim(RecognitionResult),
    /// 最终结果，每句话恰好一次，且在该句所有中间结果之后
    Final(RecognitionResult),
    /// 错误
    Error(String),
}

/// 连续识别+翻译会话配置
#[derive(Debug, Clone)]
pub struct TranslationSessionConfig {
    pub source_language: String,
    pub target_languages: Vec<String>,
}

/// 语音服务 trait，外部 SDK 的全部能力调用都经由此接口
///
/// 实现方负责音频采集、编解码与到云端的传输。
#[async_trait]
pub trait SpeechService: Send + Sync {
    /// 一次性识别，收到第一个结果即结束
    async fn recognize_once(
        &self,
        credential: &Credential,
        language: &str,
        source: &AudioSource,
    ) -> Result<RecognitionResult, SpeechError>;

    /// 开启连续识别+翻译会话
    ///
    /// 返回:
    /// - 控制发送器：发送 [`SessionControl::Stop`] 停止会话
    /// - 事件接收器：接收 [`RecognitionEvent`]，通道关闭即会话结束
    async fn start_translation(
        &self,
        credential: &Credential,
        config: TranslationSessionConfig,
    ) -> Result<
        (
            mpsc::Sender<SessionControl>,
            mpsc::Receiver<RecognitionEvent>,
        ),
        SpeechError,
    >;

    /// 创建声纹档案
    async fn create_profile(
        &self,
        credential: &Credential,
        kind: ProfileKind,
        locale: &str,
    ) -> Result<VoiceProfile, SpeechError>;

    /// 提交一段注册音频
    ///
    /// 注册在服务端是累积过程，调用方必须串行提交。
    async fn enroll_profile(
        &self,
        credential: &Credential,
        profile: &VoiceProfile,
        source: &AudioSource,
    ) -> Result<EnrollResult, SpeechError>;

    /// 删除声纹档案
    async fn delete_profile(
        &self,
        credential: &Credential,
        profile: &VoiceProfile,
    ) -> Result<(), SpeechError>;

    /// 1:1 验证
    async fn verify_speaker(
        &self,
        credential: &Credential,
        profile: &VoiceProfile,
        source: &AudioSource,
    ) -> Result<SpeakerMatch, SpeechError>;

    /// 1:N 辨认，返回最相似的档案
    async fn identify_speaker(
        &self,
        credential: &Credential,
        profiles: &[VoiceProfile],
        source: &AudioSource,
    ) -> Result<SpeakerMatch, SpeechError>;
}
