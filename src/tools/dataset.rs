//! 数据集配置表
//!
//! 标定参数、物理常量覆盖以及每个数据集的转折时刻全部来自外部 JSON 文件，
//! 不在代码中硬编码。

use super::constants::defaults;
use super::scanner;
use crate::core::{
    ChargeEngine, ParticleTrack, PhysicalConstants, SegmentOptions, TurningPoints,
    VelocityEstimator,
};
use crate::{MillikanError, MillikanResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

fn default_fps() -> f64 {
    defaults::FRAMES_PER_SECOND
}

fn default_tolerance() -> f64 {
    defaults::TOLERANCE
}

fn default_pixel_uncertainty() -> f64 {
    defaults::PIXEL_UNCERTAINTY
}

fn default_pattern() -> String {
    defaults::TRACK_FILE_PATTERN.to_string()
}

/// 实验标定参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Calibration {
    /// 每毫米像素数
    pub px_per_mm: f64,
    /// 视频帧率
    #[serde(default = "default_fps")]
    pub frames_per_second: f64,
    /// 容差比例
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// 单个像素坐标的不确定度
    #[serde(default = "default_pixel_uncertainty")]
    pub pixel_uncertainty: f64,
}

/// 单个粒子的转折时刻覆盖
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParticleOverride {
    /// 粒子编号
    pub particle: i64,
    /// 仅对该文件名生效（省略则对数据集内所有文件生效）
    #[serde(default)]
    pub file: Option<String>,
    /// 替换数据集默认值的转折时刻（秒）
    pub turning_points: Vec<f64>,
}

/// 数据集描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetSpec {
    pub name: String,
    /// 相对数据根目录的文件模式
    #[serde(default = "default_pattern")]
    pub pattern: String,
    /// 转折时刻（秒）
    pub turning_points: Vec<f64>,
    #[serde(default)]
    pub include_leading: bool,
    #[serde(default)]
    pub include_trailing: bool,
    #[serde(default)]
    pub particle_overrides: Vec<ParticleOverride>,
}

impl DatasetSpec {
    pub fn segment_options(&self) -> SegmentOptions {
        SegmentOptions {
            include_leading: self.include_leading,
            include_trailing: self.include_trailing,
        }
    }

    /// 查找适用于某条轨迹的转折时刻（文件级覆盖优先于数据集级覆盖）
    pub fn turning_times_for(&self, track: &ParticleTrack) -> &[f64] {
        let file_name = track.source.file_name().and_then(|n| n.to_str());

        let file_specific = self.particle_overrides.iter().find(|o| {
            o.particle == track.particle_id
                && o.file.is_some()
                && o.file.as_deref() == file_name
        });
        let dataset_wide = || {
            self.particle_overrides
                .iter()
                .find(|o| o.particle == track.particle_id && o.file.is_none())
        };

        file_specific
            .or_else(dataset_wide)
            .map(|o| o.turning_points.as_slice())
            .unwrap_or(self.turning_points.as_slice())
    }
}

/// 完整分析配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    pub calibration: Calibration,
    #[serde(default)]
    pub constants: PhysicalConstants,
    pub datasets: Vec<DatasetSpec>,
}

impl AnalysisConfig {
    /// 从 JSON 文本解析并校验
    pub fn from_json(text: &str) -> MillikanResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// 从文件读取并校验
    pub fn load(path: &Path) -> MillikanResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            MillikanError::IoError(std::io::Error::new(
                e.kind(),
                format!("无法读取配置文件 {}: {e}", path.display()),
            ))
        })?;
        Self::from_json(&text)
    }

    /// 校验标定、常量与所有转折时刻
    pub fn validate(&self) -> MillikanResult<()> {
        self.velocity_estimator()?;
        self.charge_engine()?;

        if self.datasets.is_empty() {
            return Err(MillikanError::InvalidInput(
                "配置中没有任何数据集".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for dataset in &self.datasets {
            if dataset.name.trim().is_empty() {
                return Err(MillikanError::InvalidInput("数据集名称不能为空".to_string()));
            }
            if !names.insert(dataset.name.as_str()) {
                return Err(MillikanError::InvalidInput(format!(
                    "数据集名称重复: {}",
                    dataset.name
                )));
            }

            scanner::split_pattern(Path::new("."), &dataset.pattern)
                .map_err(|e| dataset_error(&dataset.name, e))?;
            self.turning_points(&dataset.turning_points)
                .map_err(|e| dataset_error(&dataset.name, e))?;
            for o in &dataset.particle_overrides {
                self.turning_points(&o.turning_points)
                    .map_err(|e| dataset_error(&dataset.name, e))?;
            }
        }

        Ok(())
    }

    pub fn velocity_estimator(&self) -> MillikanResult<VelocityEstimator> {
        VelocityEstimator::with_pixel_uncertainty(
            self.calibration.px_per_mm,
            self.calibration.frames_per_second,
            self.calibration.pixel_uncertainty,
        )
    }

    pub fn charge_engine(&self) -> MillikanResult<ChargeEngine> {
        ChargeEngine::new(self.constants, self.calibration.tolerance)
    }

    /// 秒级转折时刻 → 帧号
    pub fn turning_points(&self, times: &[f64]) -> MillikanResult<TurningPoints> {
        TurningPoints::from_times(times, self.calibration.frames_per_second)
    }

    /// 某条轨迹实际使用的转折点
    pub fn turning_points_for(
        &self,
        dataset: &DatasetSpec,
        track: &ParticleTrack,
    ) -> MillikanResult<TurningPoints> {
        self.turning_points(dataset.turning_times_for(track))
    }
}

fn dataset_error(name: &str, e: MillikanError) -> MillikanError {
    match e {
        MillikanError::InvalidInput(msg) => {
            MillikanError::InvalidInput(format!("数据集 {name}: {msg}"))
        }
        other => other,
    }
}
