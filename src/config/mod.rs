pub mod settings;
pub mod storage;

pub use settings::{AppConfig, SpeechConfig, TokenConfig};
pub use storage::{load_config, save_config, ConfigError};
