//! 数据集处理流程
//!
//! 加载每个数据集的轨迹文件 → 为每个粒子确定转折点 → 批量分析 → 汇总为报告。

use super::dataset::AnalysisConfig;
use super::formatter::{AnalysisReport, DatasetSummary};
use super::loader::SkippedFile;
use super::scanner;
use crate::MillikanResult;
use crate::error::ErrorCategory;
use crate::processing::{ParticleAnalyzer, ParticleJob, process_batch};
use std::path::Path;

/// 为所有数据集构建粒子任务，同时记录加载概况
///
/// 数据集目录缺失或无法遍历时记录为跳过并继续处理其余数据集。
fn collect_jobs(
    config: &AnalysisConfig,
    data_root: &Path,
    report: &mut AnalysisReport,
) -> MillikanResult<Vec<ParticleJob>> {
    let mut jobs = Vec::new();

    for dataset in &config.datasets {
        let (dir, _) = scanner::split_pattern(data_root, &dataset.pattern)?;
        let loaded = match super::loader::load_tracks(data_root, &dataset.pattern) {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::warn!("⚠️  数据集 {} 无法加载，已跳过: {e}", dataset.name);
                report.datasets.push(DatasetSummary {
                    name: dataset.name.clone(),
                    files: 0,
                    particles: 0,
                });
                report.skipped_files.push(SkippedFile {
                    path: dir,
                    reason: e.to_string(),
                    category: ErrorCategory::from_error(&e),
                });
                continue;
            }
        };
        tracing::info!(
            "📁 数据集 {}: {} 个文件，{} 个粒子，跳过 {} 个文件",
            dataset.name,
            loaded.files.len(),
            loaded.tracks.len(),
            loaded.skipped.len()
        );

        report.datasets.push(DatasetSummary {
            name: dataset.name.clone(),
            files: loaded.files.len(),
            particles: loaded.tracks.len(),
        });
        report.skipped_files.extend(loaded.skipped);

        let options = dataset.segment_options();
        for track in loaded.tracks {
            let turning = config.turning_points_for(dataset, &track)?;
            jobs.push(ParticleJob {
                dataset: dataset.name.clone(),
                track,
                turning,
                options,
            });
        }
    }

    Ok(jobs)
}

/// 执行完整分析
///
/// 只有配置错误会返回错误；无法访问的数据集目录、单个文件或相位对的失败都记录在报告中。
pub fn run_analysis(
    config: &AnalysisConfig,
    data_root: &Path,
    parallel: Option<usize>,
) -> MillikanResult<AnalysisReport> {
    let analyzer = ParticleAnalyzer::new(config.velocity_estimator()?, config.charge_engine()?);

    let mut report = AnalysisReport::new(data_root.to_path_buf(), config.calibration);
    let jobs = collect_jobs(config, data_root, &mut report)?;

    let outcome = process_batch(&jobs, &analyzer, parallel);
    for analysis in outcome.analyses {
        report.observations.extend(analysis.observations);
        report.skipped_pairs.extend(analysis.skipped);
    }
    report.stats = outcome.stats;

    tracing::info!(
        "📊 {} 个粒子，{} 个电荷观测（有效 {}），跳过 {} 个相位对",
        report.stats.particles,
        report.stats.observations,
        report.stats.valid,
        report.stats.skipped
    );

    Ok(report)
}
