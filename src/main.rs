//! Millikan Charge Tool - 主程序入口
//!
//! 纯流程控制器，负责协调各个工具模块完成电荷分析任务。

use millikan_charge_tool::{
    error::{ErrorCategory, MillikanError},
    tools::{self, AnalysisConfig, AppConfig},
};
use std::process;

/// 错误退出码定义
mod exit_codes {
    /// 通用错误
    pub const GENERAL_ERROR: i32 = 1;
    /// 格式/输入错误
    pub const FORMAT_ERROR: i32 = 2;
    /// 数据不足
    pub const SAMPLES_ERROR: i32 = 3;
    /// 计算错误
    pub const CALCULATION_ERROR: i32 = 4;
    /// 资源/并发错误
    pub const RESOURCE_ERROR: i32 = 5;
}

/// 获取错误建议文本
fn get_error_suggestion(error: &MillikanError) -> &'static str {
    match error {
        MillikanError::InvalidInput(_) => {
            "检查配置文件中的标定参数与转折时刻（必须严格递增），使用 --help 查看完整用法 / Check calibration and turning points in the config (must be strictly increasing), use --help to see full usage"
        }
        MillikanError::ResourceError(_) => {
            "资源不可用，请重试；若持续失败请使用 --serial 或降低并发度 / Resource unavailable, retry; if it continues to fail, use --serial or reduce parallelism"
        }
        _ => match ErrorCategory::from_error(error) {
            ErrorCategory::Io => {
                "检查配置文件与 --data-root 路径是否存在且可读 / Check that the config file and --data-root exist and are readable"
            }
            ErrorCategory::Format => {
                "确保配置为合法JSON，轨迹文件为含 frame/x/y/particle 列的制表符分隔文件 / Ensure the config is valid JSON and track files are tab-separated with frame/x/y/particle columns"
            }
            ErrorCategory::Samples => {
                "相位片段太短，请检查转折时刻与帧率 / Phase segments are too short, check turning points and frame rate"
            }
            ErrorCategory::Calculation => {
                "计算过程出现异常，请检查物理常量与速度数据 / Calculation error occurred, check physical constants and velocity data"
            }
            ErrorCategory::Other => {
                "请检查输入文件和参数设置 / Please check input files and parameter settings"
            }
        },
    }
}

/// 错误处理和建议
fn handle_error(error: MillikanError) -> ! {
    eprintln!("[ERROR] 错误 / Error: {error}");
    eprintln!("[INFO] 建议 / Suggestion: {}", get_error_suggestion(&error));

    let exit_code = match &error {
        MillikanError::InvalidInput(_) => exit_codes::FORMAT_ERROR,
        MillikanError::ResourceError(_) => exit_codes::RESOURCE_ERROR,
        _ => match ErrorCategory::from_error(&error) {
            ErrorCategory::Format => exit_codes::FORMAT_ERROR,
            ErrorCategory::Samples => exit_codes::SAMPLES_ERROR,
            ErrorCategory::Calculation => exit_codes::CALCULATION_ERROR,
            ErrorCategory::Io | ErrorCategory::Other => exit_codes::GENERAL_ERROR,
        },
    };

    process::exit(exit_code);
}

/// 应用程序主逻辑
fn run(config: &AppConfig) -> Result<(), MillikanError> {
    tools::show_startup_info(config);

    let analysis_config = AnalysisConfig::load(&config.config_path)?;
    tracing::info!(
        "加载配置 {}: {} 个数据集",
        config.config_path.display(),
        analysis_config.datasets.len()
    );

    let report = tools::run_analysis(&analysis_config, &config.data_root, config.parallel)?;
    let output = tools::render_report(&report, config.format)?;
    tools::write_output(&output, config)?;

    tools::show_completion_info(config);
    Ok(())
}

fn main() {
    let config = tools::parse_args();
    tools::init_logging(config.verbose);

    if let Err(error) = run(&config) {
        handle_error(error);
    }
}
