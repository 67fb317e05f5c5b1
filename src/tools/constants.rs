//! 常量和默认配置集中管理
//!
//! 将所有重要常量集中定义，避免"默认值漂移"和重复定义

/// 物理常量与单位换算
pub mod physics {
    /// 元电荷（C），用于把结果换算为元电荷倍数
    pub const ELEMENTARY_CHARGE: f64 = 1.602_176_634e-19;

    /// 英寸 → 米
    pub const METERS_PER_INCH: f64 = 2.54 / 100.0;
}

/// 默认配置值
pub mod defaults {
    /// 默认视频帧率
    pub const FRAMES_PER_SECOND: f64 = 30.0;

    /// 默认容差比例
    ///
    /// 上升速度落在下落速度 ±20% 内时视为单电荷下落观测
    pub const TOLERANCE: f64 = 0.2;

    /// 单个像素坐标的不确定度（像素）
    ///
    /// 粒子定位误差的经验值
    pub const PIXEL_UNCERTAINTY: f64 = 2.0;

    /// 轨迹文件默认匹配模式
    pub const TRACK_FILE_PATTERN: &str = "track*.csv";

    /// 默认粒子级并行并发度
    ///
    /// 4并发度在多数场景下提供良好的性能/资源平衡
    pub const PARALLEL_DEGREE: usize = 4;
}

/// 并发度限制常量
pub mod parallel_limits {
    /// 最小并发度
    pub const MIN_PARALLEL_DEGREE: usize = 1;

    /// 最大并发度
    ///
    /// 限制最大并发度为16，避免过度并发导致的上下文切换开销
    pub const MAX_PARALLEL_DEGREE: usize = 16;
}
