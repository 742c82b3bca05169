pub mod audio;
pub mod config;
pub mod pipeline;
pub mod speech;
pub mod token;

pub use audio::{probe_wav, AudioError, AudioSource, WavInfo};
pub use config::{load_config, save_config, AppConfig, ConfigError, SpeechConfig, TokenConfig};
pub use pipeline::{
    FileTranscript, LiveSession, OutputStatus, PipelineError, SpeakerReport, SpeechPipeline,
    TranscriptState, WorkflowState,
};
#[cfg(feature = "mock")]
pub use speech::{MockSpeechService, MockUtterance, RecordedCall};
pub use speech::{
    create_speech_service, CancellationDetail, EnrollResult, EnrollmentProgress, ProfileKind,
    RecognitionEvent, RecognitionResult, ResultReason, SessionControl, SpeakerMatch, SpeechError,
    SpeechService, TranslationSessionConfig, VoiceProfile,
};
pub use token::{Credential, TokenError, TokenProvider};
