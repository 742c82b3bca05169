use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// 服务端以 100ns tick 为单位上报剩余注册时长
pub const TICKS_PER_SECOND: u64 = 10_000_000;

/// 声纹档案类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileKind {
    /// 固定口令验证，需要多次重复同一口令
    TextDependentVerification,
    /// 自由内容验证，需要一段较长的样本
    TextIndependentVerification,
    /// 自由内容辨认（1:N）
    TextIndependentIdentification,
}

impl ProfileKind {
    pub fn is_verification(self) -> bool {
        matches!(
            self,
            ProfileKind::TextDependentVerification | ProfileKind::TextIndependentVerification
        )
    }
}

/// 声纹档案，服务端资源，创建后必须删除
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceProfile {
    pub id: String,
    pub kind: ProfileKind,
    pub locale: String,
}

/// 识别结果的结论
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultReason {
    Recognized,
    NoMatch,
    Canceled,
}

/// 服务端取消时附带的详情
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CancellationDetail {
    pub reason: String,
    pub error_details: String,
}

impl fmt::Display for CancellationDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Reason={}, ErrorDetails={}",
            self.reason, self.error_details
        )
    }
}

/// 一次识别的结果
#[derive(Debug, Clone)]
pub struct RecognitionResult {
    pub reason: ResultReason,
    pub text: String,
    /// 目标语言标签到译文的映射
    pub translations: HashMap<String, String>,
    pub cancellation: Option<CancellationDetail>,
}

impl RecognitionResult {
    pub fn recognized(text: impl Into<String>) -> Self {
        Self {
            reason: ResultReason::Recognized,
            text: text.into(),
            translations: HashMap::new(),
            cancellation: None,
        }
    }

    pub fn no_match() -> Self {
        Self {
            reason: ResultReason::NoMatch,
            text: String::new(),
            translations: HashMap::new(),
            cancellation: None,
        }
    }

    pub fn canceled(detail: CancellationDetail) -> Self {
        Self {
            reason: ResultReason::Canceled,
            text: String::new(),
            translations: HashMap::new(),
            cancellation: Some(detail),
        }
    }

    pub fn with_translations(mut self, translations: HashMap<String, String>) -> Self {
        self.translations = translations;
        self
    }
}

/// 一次注册提交后服务端上报的进度
#[derive(Debug, Clone, Copy, Default)]
pub struct EnrollmentProgress {
    /// 还需要的注册次数（口令类档案）
    pub remaining_enrollments: Option<u32>,
    /// 还需要的语音时长，100ns tick（自由内容档案）
    pub remaining_speech_ticks: Option<u64>,
}

impl EnrollmentProgress {
    pub fn remaining_speech_secs(&self) -> Option<f64> {
        self.remaining_speech_ticks
            .map(|ticks| ticks as f64 / TICKS_PER_SECOND as f64)
    }
}

/// 一次注册提交的结果
#[derive(Debug, Clone)]
pub enum EnrollResult {
    Accepted(EnrollmentProgress),
    Canceled(CancellationDetail),
}

/// 说话人比对结果：验证与辨认共用
#[derive(Debug, Clone, PartialEq)]
pub struct SpeakerMatch {
    pub profile_id: String,
    /// 相似度评分，[0, 1]
    pub score: f64,
}
