//! 轨迹数据模型
//!
//! 一条轨迹是单个粒子按帧序排列的像素位置序列，加载后不可变。

use serde::Serialize;
use std::path::{Path, PathBuf};

/// 单帧检测样本
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrackSample {
    /// 帧序号（文件内）
    pub frame: i64,
    /// 水平像素坐标
    pub x: f64,
    /// 垂直像素坐标（向下为正，与视频坐标系一致）
    pub y: f64,
    /// 粒子编号（仅在同一文件内唯一）
    pub particle: i64,
}

impl TrackSample {
    pub fn new(frame: i64, x: f64, y: f64, particle: i64) -> Self {
        Self {
            frame,
            x,
            y,
            particle,
        }
    }
}

/// 单个粒子的完整轨迹
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleTrack {
    /// 来源文件
    pub source: PathBuf,
    /// 文件内粒子编号
    pub particle_id: i64,
    /// 该粒子在文件中的出现次序（首次出现顺序）
    pub ordinal: usize,
    /// 按帧序排列的样本
    samples: Vec<TrackSample>,
}

impl ParticleTrack {
    /// 创建轨迹，样本按帧序稳定排序
    pub fn new(
        source: impl Into<PathBuf>,
        particle_id: i64,
        ordinal: usize,
        mut samples: Vec<TrackSample>,
    ) -> Self {
        samples.sort_by_key(|s| s.frame);
        Self {
            source: source.into(),
            particle_id,
            ordinal,
            samples,
        }
    }

    #[inline]
    pub fn samples(&self) -> &[TrackSample] {
        &self.samples
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// 首尾帧号（空轨迹返回None）
    pub fn frame_range(&self) -> Option<(i64, i64)> {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => Some((first.frame, last.frame)),
            _ => None,
        }
    }

    #[inline]
    pub fn source(&self) -> &Path {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_sorted_by_frame() {
        let samples = vec![
            TrackSample::new(5, 0.0, 5.0, 1),
            TrackSample::new(1, 0.0, 1.0, 1),
            TrackSample::new(3, 0.0, 3.0, 1),
        ];
        let track = ParticleTrack::new("track0.csv", 1, 0, samples);

        let frames: Vec<i64> = track.samples().iter().map(|s| s.frame).collect();
        assert_eq!(frames, vec![1, 3, 5]);
        assert_eq!(track.frame_range(), Some((1, 5)));
        assert_eq!(track.len(), 3);
    }

    #[test]
    fn test_empty_track() {
        let track = ParticleTrack::new("track0.csv", 7, 0, Vec::new());
        assert!(track.is_empty());
        assert_eq!(track.frame_range(), None);
    }
}
