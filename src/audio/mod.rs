use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("Audio file not found: {0}")]
    NotFound(PathBuf),
    #[error("Wav error: {0}")]
    Wav(String),
    #[error("Unsupported format: {0}")]
    Unsupported(String),
}

/// 音频输入来源
///
/// 实际采集与解码由外部语音服务完成，这里只描述来源。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    /// 默认麦克风输入
    Microphone,
    /// 本地 WAV 文件
    File(PathBuf),
}

impl AudioSource {
    /// 校验并包装一个 WAV 文件来源
    pub fn from_wav_file(path: &Path) -> Result<Self, AudioError> {
        probe_wav(path)?;
        Ok(AudioSource::File(path.to_path_buf()))
    }
}

/// WAV 文件规格
#[derive(Debug, Clone, Copy)]
pub struct WavInfo {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub duration_secs: f32,
}

/// 校验文件为单声道 PCM WAV 并返回规格
pub fn probe_wav(path: &Path) -> Result<WavInfo, AudioError> {
    let reader = match hound::WavReader::open(path) {
        Ok(reader) => reader,
        Err(hound::Error::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AudioError::NotFound(path.to_path_buf()));
        }
        Err(e) => return Err(AudioError::Wav(e.to_string())),
    };

    let spec = reader.spec();

    if spec.sample_format != hound::SampleFormat::Int {
        return Err(AudioError::Unsupported(
            "仅支持 16-bit PCM 采样格式".to_string(),
        ));
    }

    if spec.channels != 1 {
        return Err(AudioError::Unsupported(format!(
            "需要单声道音频，实际为 {} 声道",
            spec.channels
        )));
    }

    let duration_secs = reader.duration() as f32 / spec.sample_rate as f32;

    Ok(WavInfo {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        duration_secs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_wav(path: &Path, channels: u16, samples: u32) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..samples * channels as u32 {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn mono_pcm_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        write_wav(&path, 1, 16000);

        let info = probe_wav(&path).unwrap();
        assert_eq!(info.channels, 1);
        assert_eq!(info.sample_rate, 16000);
        assert!((info.duration_secs - 1.0).abs() < 0.01);

        let source = AudioSource::from_wav_file(&path).unwrap();
        assert_eq!(source, AudioSource::File(path));
    }

    #[test]
    fn stereo_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav(&path, 2, 8000);

        assert!(matches!(
            probe_wav(&path),
            Err(AudioError::Unsupported(_))
        ));
    }

    #[test]
    fn float_samples_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("float.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        writer.write_sample(0.0f32).unwrap();
        writer.finalize().unwrap();

        assert!(matches!(
            probe_wav(&path),
            Err(AudioError::Unsupported(_))
        ));
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.wav");
        assert!(matches!(probe_wav(&path), Err(AudioError::NotFound(_))));
    }

    #[test]
    fn garbage_bytes_are_a_wav_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.wav");
        fs::write(&path, b"definitely not a wav").unwrap();
        assert!(matches!(probe_wav(&path), Err(AudioError::Wav(_))));
    }
}
