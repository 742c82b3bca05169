//! 脚本化的模拟语音服务
//!
//! 不访问任何真实服务，按预设脚本返回结果并记录每次调用，
//! 供测试断言调用顺序与资源清理，也用于演示程序。

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::audio::AudioSource;
use crate::token::Credential;

use super::traits::{
    RecognitionEvent, SessionControl, SpeechError, SpeechService, TranslationSessionConfig,
};
use super::types::{
    EnrollResult, EnrollmentProgress, ProfileKind, RecognitionResult, SpeakerMatch, VoiceProfile,
};

/// 事件推送节奏
const EVENT_PACE: Duration = Duration::from_millis(5);

const DEFAULT_TRANSCRIPT: &str = "the quick brown fox jumps over the lazy dog";

/// 记录下来的能力调用
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    RecognizeOnce,
    StartTranslation,
    CreateProfile(ProfileKind),
    Enroll {
        profile_id: String,
        source: AudioSource,
    },
    DeleteProfile {
        profile_id: String,
    },
    Verify {
        profile_id: String,
    },
    Identify {
        profile_ids: Vec<String>,
    },
}

/// 脚本化的一句话：若干中间结果加一个最终结果
#[derive(Debug, Clone)]
pub struct MockUtterance {
    pub interim: Vec<String>,
    pub text: String,
    pub translations: HashMap<String, String>,
}

impl MockUtterance {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            interim: Vec::new(),
            text: text.into(),
            translations: HashMap::new(),
        }
    }

    pub fn with_interims<I, S>(mut self, interims: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interim = interims.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_translation(
        mut self,
        language: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        self.translations.insert(language.into(), text.into());
        self
    }
}

enum MatchScript {
    Score(f64),
    Fail(String),
}

#[derive(Default)]
struct Script {
    recognize: VecDeque<RecognitionResult>,
    enroll: VecDeque<EnrollResult>,
    verify: VecDeque<MatchScript>,
    identify: VecDeque<MatchScript>,
    utterances: Vec<MockUtterance>,
    enroll_delay: Option<Duration>,
    delete_failure: Option<String>,
}

/// 模拟语音服务
pub struct MockSpeechService {
    script: Mutex<Script>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockSpeechService {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(Script::default()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// 预设下一次一次性识别的结果
    pub fn script_recognition(&self, result: RecognitionResult) {
        self.lock_script().recognize.push_back(result);
    }

    /// 预设下一次注册提交的结果
    pub fn script_enrollment(&self, result: EnrollResult) {
        self.lock_script().enroll.push_back(result);
    }

    /// 预设下一次验证的评分
    pub fn script_verification_score(&self, score: f64) {
        self.lock_script().verify.push_back(MatchScript::Score(score));
    }

    /// 预设下一次验证失败
    pub fn script_verification_failure(&self, message: impl Into<String>) {
        self.lock_script()
            .verify
            .push_back(MatchScript::Fail(message.into()));
    }

    /// 预设下一次辨认的评分
    pub fn script_identification_score(&self, score: f64) {
        self.lock_script()
            .identify
            .push_back(MatchScript::Score(score));
    }

    /// 预设连续会话要推送的句子
    pub fn script_utterance(&self, utterance: MockUtterance) {
        self.lock_script().utterances.push(utterance);
    }

    /// 让每次注册提交延迟指定时长
    pub fn set_enroll_delay(&self, delay: Duration) {
        self.lock_script().enroll_delay = Some(delay);
    }

    /// 让档案删除失败
    pub fn set_delete_failure(&self, message: impl Into<String>) {
        self.lock_script().delete_failure = Some(message.into());
    }

    /// 全部已记录的调用
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// 档案删除调用次数
    pub fn deletion_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, RecordedCall::DeleteProfile { .. }))
            .count()
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, Script> {
        match self.script.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn record(&self, call: RecordedCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn default_utterance(config: &TranslationSessionConfig) -> MockUtterance {
        let mut utterance = MockUtterance::new(DEFAULT_TRANSCRIPT).with_interims([
            "the quick",
            "the quick brown fox",
            "the quick brown fox jumps over",
        ]);
        for language in &config.target_languages {
            utterance
                .translations
                .insert(language.clone(), format!("[{}] {}", language, DEFAULT_TRANSCRIPT));
        }
        utterance
    }
}

impl Default for MockSpeechService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechService for MockSpeechService {
    async fn recognize_once(
        &self,
        _credential: &Credential,
        _language: &str,
        _source: &AudioSource,
    ) -> Result<RecognitionResult, SpeechError> {
        self.record(RecordedCall::RecognizeOnce);
        let result = self.lock_script().recognize.pop_front();
        Ok(result.unwrap_or_else(|| RecognitionResult::recognized(DEFAULT_TRANSCRIPT)))
    }

    async fn start_translation(
        &self,
        _credential: &Credential,
        config: TranslationSessionConfig,
    ) -> Result<
        (
            mpsc::Sender<SessionControl>,
            mpsc::Receiver<RecognitionEvent>,
        ),
        SpeechError,
    > {
        self.record(RecordedCall::StartTranslation);

        let mut utterances = self.lock_script().utterances.clone();
        if utterances.is_empty() {
            utterances.push(Self::default_utterance(&config));
        }

        let (control_tx, mut control_rx) = mpsc::channel::<SessionControl>(8);
        let (event_tx, event_rx) = mpsc::channel::<RecognitionEvent>(32);

        tokio::spawn(async move {
            'outer: for utterance in utterances {
                let mut events = Vec::new();
                for partial in &utterance.interim {
                    events.push(RecognitionEvent::Interim(
                        RecognitionResult::recognized(partial.clone())
                            .with_translations(utterance.translations.clone()),
                    ));
                }
                events.push(RecognitionEvent::Final(
                    RecognitionResult::recognized(utterance.text.clone())
                        .with_translations(utterance.translations.clone()),
                ));

                for event in events {
                    if let Ok(SessionControl::Stop) = control_rx.try_recv() {
                        tracing::debug!("Mock translation session stopped");
                        break 'outer;
                    }
                    tokio::time::sleep(EVENT_PACE).await;
                    if event_tx.send(event).await.is_err() {
                        break 'outer;
                    }
                }
            }
            // 任务结束即关闭事件通道
        });

        Ok((control_tx, event_rx))
    }

    async fn create_profile(
        &self,
        _credential: &Credential,
        kind: ProfileKind,
        locale: &str,
    ) -> Result<VoiceProfile, SpeechError> {
        self.record(RecordedCall::CreateProfile(kind));
        Ok(VoiceProfile {
            id: Uuid::new_v4().to_string(),
            kind,
            locale: locale.to_string(),
        })
    }

    async fn enroll_profile(
        &self,
        _credential: &Credential,
        profile: &VoiceProfile,
        source: &AudioSource,
    ) -> Result<EnrollResult, SpeechError> {
        self.record(RecordedCall::Enroll {
            profile_id: profile.id.clone(),
            source: source.clone(),
        });

        let (result, delay) = {
            let mut script = self.lock_script();
            (script.enroll.pop_front(), script.enroll_delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        Ok(result.unwrap_or(EnrollResult::Accepted(EnrollmentProgress {
            remaining_enrollments: Some(0),
            remaining_speech_ticks: Some(0),
        })))
    }

    async fn delete_profile(
        &self,
        _credential: &Credential,
        profile: &VoiceProfile,
    ) -> Result<(), SpeechError> {
        self.record(RecordedCall::DeleteProfile {
            profile_id: profile.id.clone(),
        });

        if let Some(message) = self.lock_script().delete_failure.clone() {
            return Err(SpeechError::Api(message));
        }
        Ok(())
    }

    async fn verify_speaker(
        &self,
        _credential: &Credential,
        profile: &VoiceProfile,
        _source: &AudioSource,
    ) -> Result<SpeakerMatch, SpeechError> {
        self.record(RecordedCall::Verify {
            profile_id: profile.id.clone(),
        });

        match self.lock_script().verify.pop_front() {
            Some(MatchScript::Score(score)) => Ok(SpeakerMatch {
                profile_id: profile.id.clone(),
                score,
            }),
            Some(MatchScript::Fail(message)) => Err(SpeechError::Api(message)),
            None => Ok(SpeakerMatch {
                profile_id: profile.id.clone(),
                score: 0.91,
            }),
        }
    }

    async fn identify_speaker(
        &self,
        _credential: &Credential,
        profiles: &[VoiceProfile],
        _source: &AudioSource,
    ) -> Result<SpeakerMatch, SpeechError> {
        self.record(RecordedCall::Identify {
            profile_ids: profiles.iter().map(|p| p.id.clone()).collect(),
        });

        let best = profiles
            .first()
            .ok_or_else(|| SpeechError::Api("辨认需要至少一个档案".to_string()))?;

        match self.lock_script().identify.pop_front() {
            Some(MatchScript::Score(score)) => Ok(SpeakerMatch {
                profile_id: best.id.clone(),
                score,
            }),
            Some(MatchScript::Fail(message)) => Err(SpeechError::Api(message)),
            None => Ok(SpeakerMatch {
                profile_id: best.id.clone(),
                score: 0.88,
            }),
        }
    }
}
