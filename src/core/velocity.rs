//! 终端速度估计
//!
//! 将一个相位片段的像素位置序列转换为单个带不确定度的终端速度（m/s）：
//!
//! 1. 垂直像素坐标 → 米：`(y ± σpx) / (px_per_mm * 1000)`
//! 2. 相邻样本的位移与时间间隔：`Δy`，`Δframe / fps`
//! 3. 瞬时速度 = 位移 / 时间间隔（误差传递）
//! 4. 首尾各裁掉 `fps/2` 个速度样本（半秒），排除换向瞬态
//! 5. 剩余速度样本求算术平均（样本数视为精确值）
//!
//! 速度符号保持原始垂直坐标方向，不做归一化；归一化在电荷推断中完成。

use super::measurement::Measurement;
use super::track::TrackSample;
use crate::error::{MillikanError, MillikanResult, calculation_error};
use crate::tools::constants::defaults;

/// 速度估计器（标定参数）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityEstimator {
    /// 每毫米像素数
    pub px_per_mm: f64,
    /// 采样帧率
    pub frames_per_second: f64,
    /// 单个像素坐标的不确定度（像素）
    pub pixel_uncertainty: f64,
}

impl VelocityEstimator {
    /// 创建估计器，像素不确定度使用默认值 ±2 像素
    pub fn new(px_per_mm: f64, frames_per_second: f64) -> MillikanResult<Self> {
        Self::with_pixel_uncertainty(px_per_mm, frames_per_second, defaults::PIXEL_UNCERTAINTY)
    }

    /// 创建估计器并指定像素不确定度
    pub fn with_pixel_uncertainty(
        px_per_mm: f64,
        frames_per_second: f64,
        pixel_uncertainty: f64,
    ) -> MillikanResult<Self> {
        if !(px_per_mm.is_finite() && px_per_mm > 0.0) {
            return Err(MillikanError::InvalidInput(format!(
                "像素标定必须为正数: {px_per_mm}"
            )));
        }
        if !(frames_per_second.is_finite() && frames_per_second > 0.0) {
            return Err(MillikanError::InvalidInput(format!(
                "帧率必须为正数: {frames_per_second}"
            )));
        }
        if !(pixel_uncertainty.is_finite() && pixel_uncertainty >= 0.0) {
            return Err(MillikanError::InvalidInput(format!(
                "像素不确定度必须为非负数: {pixel_uncertainty}"
            )));
        }

        Ok(Self {
            px_per_mm,
            frames_per_second,
            pixel_uncertainty,
        })
    }

    /// 首尾各裁切的速度样本数（半秒）
    #[inline]
    pub fn trim_count(&self) -> usize {
        (self.frames_per_second / 2.0) as usize
    }

    /// 保留至少一个速度样本所需的最少位置样本数
    #[inline]
    pub fn min_samples(&self) -> usize {
        2 * self.trim_count() + 2
    }

    /// 像素坐标 → 米
    #[inline]
    fn to_meters(&self, pixels: f64) -> Measurement {
        Measurement::new(pixels, self.pixel_uncertainty) / (self.px_per_mm * 1000.0)
    }

    /// 逐段瞬时速度（未裁切）
    pub fn instantaneous_velocities(
        &self,
        samples: &[TrackSample],
    ) -> MillikanResult<Vec<Measurement>> {
        samples
            .windows(2)
            .map(|w| {
                let elapsed_frames = w[1].frame - w[0].frame;
                if elapsed_frames <= 0 {
                    return Err(calculation_error(
                        "时间间隔非正",
                        format!("帧 {} → {}", w[0].frame, w[1].frame),
                    ));
                }
                let elapsed = elapsed_frames as f64 / self.frames_per_second;
                let displacement = self.to_meters(w[1].y) - self.to_meters(w[0].y);
                Ok(displacement / elapsed)
            })
            .collect()
    }

    /// 估计片段的终端速度
    ///
    /// # 错误
    ///
    /// 裁切后没有剩余速度样本时返回 `InsufficientSamples`，调用方应跳过该相位对。
    pub fn estimate(&self, samples: &[TrackSample]) -> MillikanResult<Measurement> {
        let insufficient = || MillikanError::InsufficientSamples {
            available: samples.len(),
            required: self.min_samples(),
        };

        if samples.len() < self.min_samples() {
            return Err(insufficient());
        }

        let velocities = self.instantaneous_velocities(samples)?;
        let trim = self.trim_count();
        let kept = velocities
            .get(trim..velocities.len() - trim)
            .filter(|kept| !kept.is_empty())
            .ok_or_else(insufficient)?;

        let total: Measurement = kept.iter().sum();
        Ok(total / kept.len() as f64)
    }
}
