//! 统一错误处理框架
//!
//! 定义分析流水线的错误类型与批量统计所用的错误分类。
//! 单个粒子或相位对的失败只会被记录并跳过，不会中断整个批处理。

use std::fmt;
use std::io;
use std::path::PathBuf;

/// 电荷分析相关的统一错误类型
#[derive(Debug)]
pub enum MillikanError {
    /// 输入验证错误（配置、转折点、标定参数）
    InvalidInput(String),

    /// 文件I/O错误
    IoError(io::Error),

    /// 数据格式错误（TSV列缺失、JSON解析失败等）
    FormatError(String),

    /// 裁切后没有可用的速度样本
    InsufficientSamples {
        /// 片段中的位置样本数
        available: usize,
        /// 裁切后至少保留一个速度样本所需的位置样本数
        required: usize,
    },

    /// 切片后为空的相位片段（静默跳过）
    EmptySegment,

    /// 无法读取的轨迹文件（记录日志后跳过）
    UnreadableFile { path: PathBuf, reason: String },

    /// 计算异常（零时间间隔、负根号项等）
    CalculationError(String),

    /// 资源访问错误（线程池创建失败等）
    ResourceError(String),
}

impl fmt::Display for MillikanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MillikanError::InvalidInput(msg) => write!(f, "输入验证失败: {msg}"),
            MillikanError::IoError(err) => write!(f, "文件I/O错误: {err}"),
            MillikanError::FormatError(msg) => write!(f, "数据格式错误: {msg}"),
            MillikanError::InsufficientSamples {
                available,
                required,
            } => write!(
                f,
                "样本不足: 片段仅有{available}个样本，裁切后至少需要{required}个"
            ),
            MillikanError::EmptySegment => write!(f, "相位片段为空"),
            MillikanError::UnreadableFile { path, reason } => {
                write!(f, "无法读取轨迹文件 {}: {reason}", path.display())
            }
            MillikanError::CalculationError(msg) => write!(f, "计算异常: {msg}"),
            MillikanError::ResourceError(msg) => write!(f, "资源访问错误: {msg}"),
        }
    }
}

impl std::error::Error for MillikanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MillikanError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for MillikanError {
    fn from(err: io::Error) -> Self {
        MillikanError::IoError(err)
    }
}

impl From<csv::Error> for MillikanError {
    fn from(err: csv::Error) -> Self {
        MillikanError::FormatError(format!("TSV解析错误: {err}"))
    }
}

impl From<serde_json::Error> for MillikanError {
    fn from(err: serde_json::Error) -> Self {
        MillikanError::FormatError(format!("JSON解析错误: {err}"))
    }
}

/// 分析操作的标准Result类型
pub type MillikanResult<T> = Result<T, MillikanError>;

// ==================== 错误转换Helper函数 ====================

/// 创建格式错误的helper函数
#[inline]
pub fn format_error<E: fmt::Display>(context: &str, err: E) -> MillikanError {
    MillikanError::FormatError(format!("{context}: {err}"))
}

/// 创建计算错误的helper函数
#[inline]
pub fn calculation_error<E: fmt::Display>(context: &str, err: E) -> MillikanError {
    MillikanError::CalculationError(format!("{context}: {err}"))
}

// ==================== 错误分类系统 ====================
// 用于批量处理中的跳过统计

/// 错误类别枚举（用于批量处理统计）
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, serde::Serialize)]
pub enum ErrorCategory {
    /// 样本不足（片段太短，裁切后无剩余速度）
    Samples,
    /// 数据格式相关错误
    Format,
    /// I/O相关错误（文件不存在、不可读等）
    Io,
    /// 计算相关错误
    Calculation,
    /// 其他未分类错误
    Other,
}

impl ErrorCategory {
    /// 从MillikanError提取错误类别
    pub fn from_error(e: &MillikanError) -> Self {
        match e {
            MillikanError::InsufficientSamples { .. } | MillikanError::EmptySegment => {
                Self::Samples
            }
            MillikanError::FormatError(_) => Self::Format,
            MillikanError::IoError(_) | MillikanError::UnreadableFile { .. } => Self::Io,
            MillikanError::CalculationError(_) => Self::Calculation,
            MillikanError::InvalidInput(_) | MillikanError::ResourceError(_) => Self::Other,
        }
    }

    /// 获取错误类别的显示名称
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Samples => "样本不足",
            Self::Format => "格式错误",
            Self::Io => "I/O错误",
            Self::Calculation => "计算错误",
            Self::Other => "其他错误",
        }
    }
}
