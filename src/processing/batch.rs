//! 批量粒子处理器
//!
//! 粒子之间相互独立，可串行处理，也可在rayon线程池中并行处理。
//! 并行结果带原始索引收集后排序，输出顺序与串行模式完全一致。

use super::analysis::{ParticleAnalysis, ParticleAnalyzer};
use crate::core::{ParticleTrack, SegmentOptions, TurningPoints};
use crate::tools::batch_state::{BatchStatsSnapshot, ParallelBatchStats, SerialBatchStats};
use crate::tools::utils;
use crate::{MillikanError, MillikanResult};
use rayon::prelude::*;

/// 单个粒子的处理任务
#[derive(Debug, Clone)]
pub struct ParticleJob {
    pub dataset: String,
    pub track: ParticleTrack,
    pub turning: TurningPoints,
    pub options: SegmentOptions,
}

impl ParticleJob {
    fn run(&self, analyzer: &ParticleAnalyzer) -> ParticleAnalysis {
        analyzer.analyze(&self.dataset, &self.track, &self.turning, self.options)
    }
}

/// 批处理结果（按任务顺序）
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub analyses: Vec<ParticleAnalysis>,
    pub stats: BatchStatsSnapshot,
}

/// 有序结果容器（保证输出顺序）
struct OrderedResult {
    /// 原始任务索引（用于排序）
    index: usize,
    analysis: ParticleAnalysis,
}

/// 串行处理所有粒子
pub fn process_serial(jobs: &[ParticleJob], analyzer: &ParticleAnalyzer) -> BatchOutcome {
    let mut stats = SerialBatchStats::new();
    let mut analyses = Vec::with_capacity(jobs.len());

    for (index, job) in jobs.iter().enumerate() {
        tracing::debug!(
            "[{}/{}] {} {}#{}",
            index + 1,
            jobs.len(),
            job.dataset,
            utils::extract_filename_lossy(&job.track.source),
            job.track.particle_id
        );

        let analysis = job.run(analyzer);
        stats.inc_particles();
        for obs in &analysis.observations {
            stats.inc_observations(obs.result.is_valid);
        }
        for skipped in &analysis.skipped {
            stats.inc_skipped(skipped.category, skipped.label());
        }
        analyses.push(analysis);
    }

    BatchOutcome {
        analyses,
        stats: stats.snapshot(),
    }
}

/// 在指定并发度的线程池中并行处理所有粒子
///
/// 线程池创建失败时返回 `ResourceError`。
pub fn process_parallel(
    jobs: &[ParticleJob],
    analyzer: &ParticleAnalyzer,
    parallel_degree: usize,
) -> MillikanResult<BatchOutcome> {
    tracing::info!("⚡ 启用粒子级并行处理：{parallel_degree} 并发度");

    let stats = ParallelBatchStats::new();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(parallel_degree)
        .thread_name(|i| format!("millikan-worker-{i}"))
        .build()
        .map_err(|e| MillikanError::ResourceError(format!("线程池创建失败: {e}")))?;

    let mut results: Vec<OrderedResult> = pool.install(|| {
        jobs.par_iter()
            .enumerate()
            .map(|(index, job)| {
                let analysis = job.run(analyzer);

                let count = stats.inc_particles();
                for obs in &analysis.observations {
                    stats.inc_observations(obs.result.is_valid);
                }
                for skipped in &analysis.skipped {
                    stats.inc_skipped(skipped.category, skipped.label());
                }
                tracing::debug!(
                    "✅ [{count}/{}] {}#{}",
                    jobs.len(),
                    analysis.file,
                    analysis.particle
                );

                OrderedResult { index, analysis }
            })
            .collect()
    });

    // 按原始顺序排序
    results.sort_by_key(|r| r.index);

    Ok(BatchOutcome {
        analyses: results.into_iter().map(|r| r.analysis).collect(),
        stats: stats.snapshot(),
    })
}

/// 按配置的并发度处理（`None` 表示串行）
///
/// 实际并发度为1时直接走串行；并行失败时降级为串行。
pub fn process_batch(
    jobs: &[ParticleJob],
    analyzer: &ParticleAnalyzer,
    parallel: Option<usize>,
) -> BatchOutcome {
    let Some(degree) = parallel else {
        return process_serial(jobs, analyzer);
    };

    let actual_degree = utils::effective_parallel_degree(degree, Some(jobs.len()));
    if actual_degree == 1 {
        tracing::debug!("并发度为1，使用串行模式 / Parallelism=1, using serial mode");
        return process_serial(jobs, analyzer);
    }

    process_parallel(jobs, analyzer, actual_degree).unwrap_or_else(|e| {
        tracing::warn!(
            "并行处理失败 / Parallel processing failed: {e}，回退到串行模式 / fallback to serial"
        );
        process_serial(jobs, analyzer)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ChargeEngine, TrackSample, VelocityEstimator};

    fn job(particle: i64, fall: f64, rise: f64) -> ParticleJob {
        let mut y = 0.0;
        let mut samples = Vec::new();
        for f in 0..360i64 {
            samples.push(TrackSample::new(f, 0.0, y, particle));
            y += if (f / 90) % 2 == 0 { fall } else { rise };
        }
        ParticleJob {
            dataset: "df".to_string(),
            track: ParticleTrack::new("track0.csv", particle, particle as usize, samples),
            turning: TurningPoints::from_frames(vec![0, 90, 180, 270, 360]).unwrap(),
            options: SegmentOptions::default(),
        }
    }

    fn analyzer() -> ParticleAnalyzer {
        ParticleAnalyzer::new(
            VelocityEstimator::new(100.0, 30.0).unwrap(),
            ChargeEngine::default(),
        )
    }

    #[test]
    fn test_parallel_matches_serial_order() {
        let jobs: Vec<ParticleJob> = (0..12)
            .map(|p| job(p, 0.1 + p as f64 * 0.01, -0.05))
            .collect();
        let analyzer = analyzer();

        let serial = process_serial(&jobs, &analyzer);
        let parallel = process_parallel(&jobs, &analyzer, 4).unwrap();

        let ids = |o: &BatchOutcome| o.analyses.iter().map(|a| a.particle).collect::<Vec<_>>();
        assert_eq!(ids(&serial), ids(&parallel));
        assert_eq!(serial.stats, parallel.stats);
        assert_eq!(serial.stats.particles, 12);
        assert_eq!(serial.stats.observations, 24);

        for (a, b) in serial.analyses.iter().zip(&parallel.analyses) {
            let qa: Vec<f64> = a.observations.iter().map(|o| o.result.charge.value).collect();
            let qb: Vec<f64> = b.observations.iter().map(|o| o.result.charge.value).collect();
            assert_eq!(qa, qb);
        }
    }

    #[test]
    fn test_process_batch_modes() {
        let jobs = vec![job(0, 0.1, -0.05), job(1, 0.1, -0.05)];
        let analyzer = analyzer();

        assert_eq!(process_batch(&jobs, &analyzer, None).stats.particles, 2);
        assert_eq!(process_batch(&jobs, &analyzer, Some(1)).stats.particles, 2);
        assert_eq!(process_batch(&jobs, &analyzer, Some(8)).stats.particles, 2);
        assert!(process_batch(&[], &analyzer, Some(4)).analyses.is_empty());
    }
}
