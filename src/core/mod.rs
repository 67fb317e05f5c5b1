//! 核心算法模块
//!
//! 包含不确定度运算、轨迹切分、速度估计和电荷推断的核心实现。

pub mod charge;
pub mod measurement;
pub mod segmenter;
pub mod track;
pub mod velocity;

// 重新导出公共接口
pub use charge::{ChargeBranch, ChargeEngine, ChargeResult, DropletEstimate, PhysicalConstants};
pub use measurement::Measurement;
pub use segmenter::{
    PhasePair, PhasePairBuilder, PhaseSegment, SegmentOptions, Segmentation, TurningPoints,
    pair_segments, segment_track,
};
pub use track::{ParticleTrack, TrackSample};
pub use velocity::VelocityEstimator;
