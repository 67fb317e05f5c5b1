//! 单个粒子的电荷分析
//!
//! 切分 → 配对 → 速度估计 → 电荷推断。单个相位对失败时记录原因并继续，
//! 不影响同一粒子的其他相位对。

use crate::core::{
    ChargeEngine, ChargeResult, ParticleTrack, PhasePair, PhasePairBuilder, SegmentOptions,
    TurningPoints, VelocityEstimator, segment_track,
};
use crate::error::ErrorCategory;
use crate::tools::utils;
use crate::{MillikanError, MillikanResult};
use serde::Serialize;

/// 一个相位对的电荷观测
#[derive(Debug, Clone, Serialize)]
pub struct ChargeObservation {
    pub dataset: String,
    pub file: String,
    pub particle: i64,
    /// 粒子内的相位对序号
    pub pair_index: usize,
    /// 组成该相位对的两个片段在切分中的位置
    pub segments: (usize, usize),
    pub result: ChargeResult,
}

/// 被跳过的相位对
#[derive(Debug, Clone, Serialize)]
pub struct SkippedPair {
    pub dataset: String,
    pub file: String,
    pub particle: i64,
    pub pair_index: usize,
    pub category: ErrorCategory,
    pub reason: String,
}

impl SkippedPair {
    /// 用于统计的简短标签
    pub fn label(&self) -> String {
        format!(
            "{}/{}#{} pair {}",
            self.dataset, self.file, self.particle, self.pair_index
        )
    }
}

/// 单个粒子的分析结果
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParticleAnalysis {
    pub dataset: String,
    pub file: String,
    pub particle: i64,
    /// 参与配对的片段数
    pub segments: usize,
    /// 被丢弃的空片段数
    pub empty_segments: usize,
    /// 奇数个片段时被丢弃的尾片段位置
    pub dropped_tail: Option<usize>,
    pub observations: Vec<ChargeObservation>,
    pub skipped: Vec<SkippedPair>,
}

/// 粒子分析器（标定与引擎在整个批次内共享）
#[derive(Debug, Clone, Copy)]
pub struct ParticleAnalyzer {
    estimator: VelocityEstimator,
    engine: ChargeEngine,
}

impl ParticleAnalyzer {
    pub fn new(estimator: VelocityEstimator, engine: ChargeEngine) -> Self {
        Self { estimator, engine }
    }

    #[inline]
    pub fn estimator(&self) -> &VelocityEstimator {
        &self.estimator
    }

    #[inline]
    pub fn engine(&self) -> &ChargeEngine {
        &self.engine
    }

    /// 分析一个相位对：两段速度估计后推断电荷
    ///
    /// 第一段作为下落速度、第二段作为上升速度送入引擎，方向由引擎按符号纠正。
    pub fn analyze_pair(&self, pair: &PhasePair<'_>) -> MillikanResult<ChargeResult> {
        if pair.first.is_empty() || pair.second.is_empty() {
            return Err(MillikanError::EmptySegment);
        }
        let v_first = self.estimator.estimate(pair.first.samples)?;
        let v_second = self.estimator.estimate(pair.second.samples)?;
        self.engine.infer(v_first, v_second)
    }

    /// 分析一个粒子的全部相位对
    pub fn analyze(
        &self,
        dataset: &str,
        track: &ParticleTrack,
        turning: &TurningPoints,
        options: SegmentOptions,
    ) -> ParticleAnalysis {
        let file = utils::extract_filename_lossy(&track.source);
        let segmentation = segment_track(track.samples(), turning);
        let segments = segmentation.analysis_segments(options);

        let mut analysis = ParticleAnalysis {
            dataset: dataset.to_string(),
            file,
            particle: track.particle_id,
            segments: segments.len(),
            empty_segments: segmentation.empty_segments,
            ..Default::default()
        };

        let mut builder = PhasePairBuilder::new();
        for segment in segments {
            let Some(pair) = builder.push(segment) else {
                continue;
            };

            match self.analyze_pair(&pair) {
                Ok(result) => {
                    tracing::debug!(
                        "{}#{} pair {}: v_fall={} v_rise={} q={} ({:.2} e, {})",
                        analysis.file,
                        analysis.particle,
                        pair.index,
                        result.v_fall,
                        result.v_rise,
                        result.charge,
                        result.elementary_multiple(),
                        result.branch.label()
                    );
                    analysis.observations.push(ChargeObservation {
                        dataset: analysis.dataset.clone(),
                        file: analysis.file.clone(),
                        particle: analysis.particle,
                        pair_index: pair.index,
                        segments: (pair.first.index, pair.second.index),
                        result,
                    });
                }
                // 空片段静默跳过
                Err(MillikanError::EmptySegment) => {}
                Err(e) => {
                    let skipped = SkippedPair {
                        dataset: analysis.dataset.clone(),
                        file: analysis.file.clone(),
                        particle: analysis.particle,
                        pair_index: pair.index,
                        category: ErrorCategory::from_error(&e),
                        reason: e.to_string(),
                    };
                    tracing::warn!("跳过 {}: {e}", skipped.label());
                    analysis.skipped.push(skipped);
                }
            }
        }

        analysis.dropped_tail = builder.finish().map(|s| s.index);
        if let Some(index) = analysis.dropped_tail {
            tracing::debug!(
                "{}#{}: 奇数个片段，丢弃尾片段 {index}",
                analysis.file,
                analysis.particle
            );
        }

        analysis
    }
}
