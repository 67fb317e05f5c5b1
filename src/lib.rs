//! Millikan Charge Tool
//!
//! 密立根油滴实验轨迹数据的电荷分析：把逐帧像素位置转换为带不确定度的终端速度，
//! 在交替的下落/上升相位之间配对，并用闭式受力平衡模型求出油滴半径、质量与电荷。
//!
//! ## 核心流程
//! - 按转折时刻（`round(t * fps)`）把粒子轨迹切为无缝、无重叠的相位片段
//! - 片段两两配对，奇数尾片段丢弃
//! - 速度估计：像素 → 米，逐帧速度，首尾各裁半秒，算术平均
//! - 电荷推断：Stokes 阻力 + Cunningham 滑移修正，E = U/d
//! - 一阶误差传递（`Measurement`）

pub mod core;
pub mod error;
pub mod processing;
pub mod tools;

// 重新导出核心类型
pub use core::{
    ChargeEngine, ChargeResult, Measurement, ParticleTrack, PhysicalConstants, TrackSample,
    TurningPoints, VelocityEstimator,
};
pub use error::{ErrorCategory, MillikanError, MillikanResult};
pub use processing::{ChargeObservation, ParticleAnalysis, ParticleAnalyzer};
