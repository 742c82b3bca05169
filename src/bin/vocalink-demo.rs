//! Vocalink 演示程序
//!
//! 用命令行驱动四个语音会话工作流。默认使用 Mock 服务商，
//! 不需要任何云端凭据即可体验完整流程。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use vocalink::{
    create_speech_service, load_config, AppConfig, OutputStatus, ProfileKind, SpeechPipeline,
    TokenProvider,
};

#[derive(Parser)]
#[command(name = "vocalink-demo")]
#[command(about = "Cloud Speech Session Demo")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 连续识别+翻译（默认麦克风，Ctrl-C 停止）
    Live,
    /// 识别单个 WAV 文件
    Transcribe {
        /// 单声道 PCM WAV 文件
        file: PathBuf,
    },
    /// 声纹注册 + 验证
    Verify {
        /// 注册音频，口令验证传同一口令的三段录音
        #[arg(required = true)]
        enrollment: Vec<PathBuf>,
        /// 用于验证的音频
        #[arg(long)]
        probe: PathBuf,
        /// 使用固定口令（文本相关）验证
        #[arg(long)]
        text_dependent: bool,
    },
    /// 声纹注册 + 辨认
    Identify {
        /// 注册音频
        enrollment: PathBuf,
        /// 用于辨认的音频
        #[arg(long)]
        probe: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_tracing();

    let args = Args::parse();
    let config = load_config()?;
    let pipeline = build_pipeline(&config)?;

    match args.command {
        Command::Live => run_live(&pipeline).await?,
        Command::Transcribe { file } => run_transcribe(&pipeline, &file).await?,
        Command::Verify {
            enrollment,
            probe,
            text_dependent,
        } => {
            let kind = if text_dependent {
                ProfileKind::TextDependentVerification
            } else {
                ProfileKind::TextIndependentVerification
            };
            run_verify(&pipeline, kind, &enrollment, &probe).await?;
        }
        Command::Identify { enrollment, probe } => {
            run_identify(&pipeline, &enrollment, &probe).await?;
        }
    }

    Ok(())
}

fn build_pipeline(config: &AppConfig) -> Result<SpeechPipeline> {
    // Mock 服务商不访问云端，给一个固定凭据即可
    let tokens = if config.speech.provider == "Mock" {
        Arc::new(TokenProvider::fixed("mock-token", "local"))
    } else {
        Arc::new(TokenProvider::new(config.token.clone())?)
    };
    let speech = Arc::from(create_speech_service(&config.speech)?);
    Ok(SpeechPipeline::new(config.speech.clone(), tokens, speech))
}

async fn run_live(pipeline: &SpeechPipeline) -> Result<()> {
    println!("speak into your microphone...");

    let mut session = pipeline.start_live().await?;
    let mut transcript = session.new_transcript();

    loop {
        tokio::select! {
            event = session.next_event() => match event {
                Some(event) => {
                    transcript.apply(&event);
                    match transcript.status {
                        OutputStatus::Interim => println!("... {}", transcript.text),
                        OutputStatus::Recognized => {
                            println!("RECOGNIZED: {}", transcript.text);
                            for (language, text) in &transcript.translations {
                                if !text.is_empty() {
                                    println!("  {}: {}", language, text);
                                }
                            }
                        }
                        OutputStatus::NoMatch => {
                            println!("NOMATCH: speech could not be recognized");
                        }
                        OutputStatus::Listening => {}
                    }
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping live session");
                session.stop().await;
            }
        }
    }

    Ok(())
}

async fn run_transcribe(pipeline: &SpeechPipeline, file: &Path) -> Result<()> {
    let transcript = pipeline.transcribe_file(file).await?;
    match transcript.status {
        OutputStatus::Recognized => {
            println!("RECOGNIZED: {}", transcript.text.unwrap_or_default());
        }
        _ => {
            println!("ERROR: speech could not be recognized from {:?}", file);
        }
    }
    Ok(())
}

async fn run_verify(
    pipeline: &SpeechPipeline,
    kind: ProfileKind,
    enrollment: &[PathBuf],
    probe: &Path,
) -> Result<()> {
    let report = pipeline.verify_speaker(kind, enrollment, probe).await?;
    println!(
        "Verified voice profile {}. Score is {:.3}.",
        report.result.profile_id, report.result.score
    );
    Ok(())
}

async fn run_identify(
    pipeline: &SpeechPipeline,
    enrollment: &PathBuf,
    probe: &Path,
) -> Result<()> {
    let report = pipeline
        .identify_speaker(std::slice::from_ref(enrollment), probe)
        .await?;
    println!(
        "The most similar voice profile is {} with similarity score {:.3}.",
        report.result.profile_id, report.result.score
    );
    Ok(())
}

fn setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
