//! 工具模块集合
//!
//! 包含CLI、轨迹文件加载、数据集配置、报告格式化等工具模块，支持main.rs的流程控制。

pub mod batch_state;
pub mod cli;
pub mod constants;
pub mod dataset;
pub mod formatter;
pub mod loader;
pub mod logging;
pub mod processor;
pub mod scanner;
pub mod utils;

// 重新导出主要的公共接口
pub use batch_state::{BatchStatsSnapshot, ParallelBatchStats, SerialBatchStats};
pub use cli::{
    AppConfig, OutputFormat, parse_args, parse_args_from, show_completion_info,
    show_startup_info,
};
pub use dataset::{AnalysisConfig, Calibration, DatasetSpec, ParticleOverride};
pub use formatter::{AnalysisReport, DatasetSummary, render_report, write_output};
pub use loader::{LoadReport, SkippedFile, load_files, load_track_file, load_tracks};
pub use logging::init_logging;
pub use processor::run_analysis;
pub use scanner::{scan_pattern, scan_track_files};
pub use utils::path;
