/// Pipeline configuration loaded from TOML
#[allow(clippy::module_inception)]
mod config;

pub use config::{AnalysisConfig, Config, ExtractorConfig, StatesConfig};
