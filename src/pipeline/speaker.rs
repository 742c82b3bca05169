//! 说话人注册与比对工作流
//!
//! 状态机：Created -> Enrolling(i/N) -> Verifying | Identifying
//! -> Completed | Failed。声纹档案是服务端资源，无论走到哪个
//! 状态，退出前都恰好删除一次。

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::audio::AudioSource;
use crate::speech::{EnrollResult, ProfileKind, SpeakerMatch, VoiceProfile};
use crate::token::Credential;

use super::{PipelineError, SpeechPipeline};

/// 工作流状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Created,
    Enrolling { done: usize, total: usize },
    Verifying,
    Identifying,
    Completed,
    Failed,
}

/// 说话人工作流的最终报告
#[derive(Debug, Clone)]
pub struct SpeakerReport {
    pub workflow_id: Uuid,
    pub profile_id: String,
    pub state: WorkflowState,
    pub result: SpeakerMatch,
}

impl SpeechPipeline {
    /// 注册 + 验证工作流
    ///
    /// 口令验证（TextDependent）需要同一口令的多段录音，
    /// 自由内容验证（TextIndependent）需要一段较长的样本。
    pub async fn verify_speaker(
        &self,
        kind: ProfileKind,
        enrollment_files: &[PathBuf],
        probe_file: &Path,
    ) -> Result<SpeakerReport, PipelineError> {
        if !kind.is_verification() {
            return Err(PipelineError::Other(
                "验证工作流需要 Verification 类型的档案".to_string(),
            ));
        }
        self.run_speaker_workflow(kind, enrollment_files, probe_file)
            .await
    }

    /// 注册 + 辨认工作流
    pub async fn identify_speaker(
        &self,
        enrollment_files: &[PathBuf],
        probe_file: &Path,
    ) -> Result<SpeakerReport, PipelineError> {
        self.run_speaker_workflow(
            ProfileKind::TextIndependentIdentification,
            enrollment_files,
            probe_file,
        )
        .await
    }

    async fn run_speaker_workflow(
        &self,
        kind: ProfileKind,
        enrollment_files: &[PathBuf],
        probe_file: &Path,
    ) -> Result<SpeakerReport, PipelineError> {
        let workflow_id = Uuid::new_v4();
        tracing::debug!(workflow = %workflow_id, state = ?WorkflowState::Created, ?kind);

        // 先校验全部输入，避免创建之后才发现无事可做的远端档案
        if enrollment_files.is_empty() {
            return Err(PipelineError::Other(
                "至少需要一段注册音频".to_string(),
            ));
        }
        let enrollment_sources = enrollment_files
            .iter()
            .map(|path| AudioSource::from_wav_file(path))
            .collect::<Result<Vec<_>, _>>()?;
        let probe_source = AudioSource::from_wav_file(probe_file)?;

        let credential = self.tokens.get_credential().await?;
        let profile = self
            .bounded(
                self.speech
                    .create_profile(&credential, kind, &self.config.profile_locale),
            )
            .await?;
        tracing::info!(workflow = %workflow_id, "Created profile ID: {}", profile.id);

        // 注册与比对可能在任何一步失败，档案删除必须无条件执行
        let outcome = self
            .enroll_and_match(
                workflow_id,
                &credential,
                &profile,
                &enrollment_sources,
                &probe_source,
            )
            .await;

        tracing::info!(workflow = %workflow_id, "Deleting profile ID: {}", profile.id);
        if let Err(e) = self
            .bounded(self.speech.delete_profile(&credential, &profile))
            .await
        {
            tracing::warn!("Failed to delete profile {}: {}", profile.id, e);
        }

        match outcome {
            Ok(result) => {
                tracing::debug!(workflow = %workflow_id, state = ?WorkflowState::Completed);
                Ok(SpeakerReport {
                    workflow_id,
                    profile_id: profile.id,
                    state: WorkflowState::Completed,
                    result,
                })
            }
            Err(e) => {
                tracing::debug!(workflow = %workflow_id, state = ?WorkflowState::Failed);
                Err(e)
            }
        }
    }

    async fn enroll_and_match(
        &self,
        workflow_id: Uuid,
        credential: &Credential,
        profile: &VoiceProfile,
        enrollment_sources: &[AudioSource],
        probe_source: &AudioSource,
    ) -> Result<SpeakerMatch, PipelineError> {
        let total = enrollment_sources.len();

        // 注册在服务端是累积过程，必须逐个等待，不并发也不重试
        for (index, source) in enrollment_sources.iter().enumerate() {
            tracing::debug!(
                workflow = %workflow_id,
                state = ?WorkflowState::Enrolling { done: index, total },
            );
            tracing::info!(
                "Adding enrollment {}/{} to profile {}",
                index + 1,
                total,
                profile.id
            );

            let result = self
                .bounded(self.speech.enroll_profile(credential, profile, source))
                .await?;

            match result {
                EnrollResult::Accepted(progress) => {
                    if let Some(remaining) = progress.remaining_enrollments {
                        tracing::info!("Remaining enrollments needed: {}", remaining);
                    }
                    if let Some(seconds) = progress.remaining_speech_secs() {
                        tracing::info!("Remaining audio time needed: {:.1} seconds", seconds);
                    }
                }
                EnrollResult::Canceled(detail) => {
                    tracing::error!(
                        "Enrollment canceled at step {}/{}: {}",
                        index + 1,
                        total,
                        detail
                    );
                    return Err(PipelineError::RemoteCanceled(detail));
                }
            }
        }
        tracing::info!("Enrollment completed");

        let matched = if profile.kind == ProfileKind::TextIndependentIdentification {
            tracing::debug!(workflow = %workflow_id, state = ?WorkflowState::Identifying);
            self.bounded(self.speech.identify_speaker(
                credential,
                std::slice::from_ref(profile),
                probe_source,
            ))
            .await?
        } else {
            tracing::debug!(workflow = %workflow_id, state = ?WorkflowState::Verifying);
            self.bounded(
                self.speech
                    .verify_speaker(credential, profile, probe_source),
            )
            .await?
        };

        tracing::info!(
            "Matched profile {} with score {:.3}",
            matched.profile_id,
            matched.score
        );
        Ok(matched)
    }
}
