//! 批量分析模块
//!
//! 把核心算法组合成按粒子进行的分析流程，并提供串行/并行批处理。

pub mod analysis;
pub mod batch;

// 重新导出公共接口
pub use analysis::{ChargeObservation, ParticleAnalysis, ParticleAnalyzer, SkippedPair};
pub use batch::{BatchOutcome, ParticleJob, process_batch, process_parallel, process_serial};
