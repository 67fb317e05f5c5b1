//! 轨迹文件加载模块
//!
//! 读取制表符分隔的检测结果文件（表头含 `frame`、`x`、`y`、`particle` 列），
//! 按粒子编号拆分为按帧排序的轨迹。无法读取的文件记录警告后跳过。

use super::scanner;
use super::utils;
use crate::core::{ParticleTrack, TrackSample};
use crate::error::{ErrorCategory, format_error};
use crate::{MillikanError, MillikanResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// 文件中的一行（数值列允许写成浮点形式，如 `12.0`）
#[derive(Debug, Deserialize)]
struct TrackRow {
    frame: f64,
    x: f64,
    y: f64,
    particle: f64,
}

impl TrackRow {
    fn into_sample(self, line: u64) -> MillikanResult<TrackSample> {
        let values = [self.frame, self.x, self.y, self.particle];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(MillikanError::FormatError(format!(
                "第{line}行含有非有限数值"
            )));
        }
        Ok(TrackSample::new(
            self.frame.round() as i64,
            self.x,
            self.y,
            self.particle.round() as i64,
        ))
    }
}

/// 被跳过的文件
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
    pub category: ErrorCategory,
}

/// 一次加载的结果
#[derive(Debug, Default)]
pub struct LoadReport {
    /// 成功读取的文件
    pub files: Vec<PathBuf>,
    /// 所有粒子轨迹（文件顺序，文件内按首次出现顺序）
    pub tracks: Vec<ParticleTrack>,
    /// 被跳过的文件
    pub skipped: Vec<SkippedFile>,
}

/// 读取单个轨迹文件
///
/// 返回文件中每个粒子的轨迹，按粒子首次出现的顺序排列。
pub fn load_track_file(path: &Path) -> MillikanResult<Vec<ParticleTrack>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut order: Vec<i64> = Vec::new();
    let mut grouped: HashMap<i64, Vec<TrackSample>> = HashMap::new();

    for (i, row) in reader.deserialize::<TrackRow>().enumerate() {
        // 表头占第1行
        let line = i as u64 + 2;
        let sample = row
            .map_err(|e| format_error(&format!("第{line}行解析失败"), e))?
            .into_sample(line)?;

        grouped
            .entry(sample.particle)
            .or_insert_with(|| {
                order.push(sample.particle);
                Vec::new()
            })
            .push(sample);
    }

    let tracks = order
        .into_iter()
        .enumerate()
        .filter_map(|(ordinal, particle)| {
            grouped
                .remove(&particle)
                .map(|samples| ParticleTrack::new(path, particle, ordinal, samples))
        })
        .collect();

    Ok(tracks)
}

/// 加载一组文件，无法读取的文件记录后跳过
pub fn load_files(paths: &[PathBuf]) -> LoadReport {
    let mut report = LoadReport::default();

    for path in paths {
        match load_track_file(path) {
            Ok(tracks) => {
                tracing::debug!(
                    "读取 {}: {} 个粒子",
                    utils::extract_filename(path),
                    tracks.len()
                );
                report.files.push(path.clone());
                report.tracks.extend(tracks);
            }
            Err(e) => {
                let skipped = MillikanError::UnreadableFile {
                    path: path.clone(),
                    reason: e.to_string(),
                };
                tracing::warn!("⚠️  {skipped}");
                report.skipped.push(SkippedFile {
                    path: path.clone(),
                    reason: e.to_string(),
                    category: ErrorCategory::from_error(&skipped),
                });
            }
        }
    }

    report
}

/// 按模式（相对 `root`）查找并加载轨迹文件
///
/// 只有模式本身无效或目录不可访问时返回错误；单个文件的读取失败记录在报告中。
pub fn load_tracks(root: &Path, pattern: &str) -> MillikanResult<LoadReport> {
    let paths = scanner::scan_pattern(root, pattern)?;
    if paths.is_empty() {
        tracing::warn!("模式 {pattern} 在 {} 下没有匹配的文件", root.display());
    }
    Ok(load_files(&paths))
}
