//! 命令行接口模块
//!
//! 负责命令行参数解析、配置管理和程序信息展示。

use super::constants::{defaults, parallel_limits};
use super::utils;
use clap::{Arg, ArgAction, Command, value_parser};
use std::path::PathBuf;

/// 应用程序版本信息
const VERSION: &str = env!("CARGO_PKG_VERSION");
const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// 报告输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// 文本表格
    #[default]
    Text,
    /// JSON
    Json,
}

/// 应用程序配置
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// 数据集配置文件（JSON）
    pub config_path: PathBuf,

    /// 数据集模式的解析根目录（默认为配置文件所在目录）
    pub data_root: PathBuf,

    /// 输出文件路径（None 时输出到标准输出）
    pub output_path: Option<PathBuf>,

    /// 报告格式
    pub format: OutputFormat,

    /// 粒子级并行并发度（None 表示串行）
    pub parallel: Option<usize>,

    /// 是否显示详细信息
    pub verbose: bool,
}

impl AppConfig {
    /// 以默认设置创建（并行度4、文本输出），数据根目录取配置文件所在目录
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        let config_path = config_path.into();
        let data_root = utils::get_parent_dir(&config_path).to_path_buf();
        Self {
            config_path,
            data_root,
            output_path: None,
            format: OutputFormat::default(),
            parallel: Some(defaults::PARALLEL_DEGREE),
            verbose: false,
        }
    }
}

fn build_command() -> Command {
    Command::new("millikan-charge")
        .version(VERSION)
        .about(DESCRIPTION)
        .author("Millikan Lab Team")
        .arg(
            Arg::new("CONFIG")
                .help("数据集配置文件（JSON：标定参数、物理常量、各数据集转折时刻）")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("data-root")
                .long("data-root")
                .help("数据集文件模式的根目录（默认为配置文件所在目录）")
                .value_name("DIR"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .help("输出结果到文件")
                .value_name("FILE"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .help("报告格式")
                .value_parser(["text", "json"])
                .default_value("text"),
        )
        .arg(
            Arg::new("parallel")
                .long("parallel")
                .help(format!(
                    "粒子级并行并发度（{}-{}，默认{}）",
                    parallel_limits::MIN_PARALLEL_DEGREE,
                    parallel_limits::MAX_PARALLEL_DEGREE,
                    defaults::PARALLEL_DEGREE
                ))
                .value_name("N")
                .value_parser(value_parser!(usize))
                .conflicts_with("serial"),
        )
        .arg(
            Arg::new("serial")
                .long("serial")
                .help("串行处理（禁用并行）")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("显示详细处理信息（debug级日志）")
                .action(ArgAction::SetTrue),
        )
}

/// 从给定参数解析配置（便于测试）
pub fn parse_args_from<I, T>(args: I) -> Result<AppConfig, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = build_command().try_get_matches_from(args)?;

    let config_path = matches
        .get_one::<String>("CONFIG")
        .map(PathBuf::from)
        .unwrap_or_default();
    let mut config = AppConfig::new(config_path);

    if let Some(root) = matches.get_one::<String>("data-root") {
        config.data_root = PathBuf::from(root);
    }
    config.output_path = matches.get_one::<String>("output").map(PathBuf::from);
    config.format = match matches.get_one::<String>("format").map(String::as_str) {
        Some("json") => OutputFormat::Json,
        _ => OutputFormat::Text,
    };
    config.parallel = if matches.get_flag("serial") {
        None
    } else {
        let requested = matches
            .get_one::<usize>("parallel")
            .copied()
            .unwrap_or(defaults::PARALLEL_DEGREE);
        Some(utils::effective_parallel_degree(requested, None))
    };
    config.verbose = matches.get_flag("verbose");

    Ok(config)
}

/// 解析命令行参数并创建配置（参数错误时由clap打印用法并退出）
pub fn parse_args() -> AppConfig {
    parse_args_from(std::env::args_os()).unwrap_or_else(|e| e.exit())
}

/// 显示程序启动信息（stderr，stdout 保留给报告）
pub fn show_startup_info(config: &AppConfig) {
    eprintln!("🚀 Millikan Charge Tool v{VERSION} 启动");
    eprintln!("📝 {DESCRIPTION}");
    if config.verbose {
        eprintln!("📁 配置文件: {}", config.config_path.display());
        eprintln!("📂 数据根目录: {}", config.data_root.display());
        match config.parallel {
            Some(degree) => eprintln!("⚡ 并发度: {degree}"),
            None => eprintln!("🐢 串行模式"),
        }
    }
    eprintln!();
}

/// 显示程序完成信息
pub fn show_completion_info(config: &AppConfig) {
    if config.verbose {
        eprintln!("✅ 所有任务处理完成！");
    }
}
