//! 轨迹相位切分与相位配对
//!
//! 根据操作员记录的电场换向时刻（转折点）把粒子轨迹切成交替的下落/上升片段：
//!
//! ```text
//! [-inf, t0) | [t0, t1) | [t1, t2) | ... | [tN, +inf)
//!  leading      phases (两端都有边界)        trailing
//! ```
//!
//! - 转折时刻换算为帧号：`frame = round(time * fps)`
//! - 片段按帧号左闭右开切分，片段之间无缝隙、无重叠
//! - 空片段直接丢弃，永远不会进入速度估计
//! - leading 默认视为"仅重力"段，不参与电荷分析；trailing 默认同样不参与
//!
//! 配对采用不重叠的两两成对：第2、4、6…个片段到达时各输出一对，
//! 奇数个片段时最后一个没有配对对象，被丢弃。

use super::track::TrackSample;
use crate::error::{MillikanError, MillikanResult};

/// 帧号形式的转折点序列（严格递增）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurningPoints {
    frames: Vec<i64>,
}

impl TurningPoints {
    /// 从秒级转折时刻创建
    ///
    /// # 参数
    ///
    /// * `times` - 转折时刻（秒），必须有限、非负、严格递增
    /// * `frames_per_second` - 采样帧率
    pub fn from_times(times: &[f64], frames_per_second: f64) -> MillikanResult<Self> {
        if !(frames_per_second.is_finite() && frames_per_second > 0.0) {
            return Err(MillikanError::InvalidInput(format!(
                "帧率必须为正数: {frames_per_second}"
            )));
        }

        for (i, &t) in times.iter().enumerate() {
            if !t.is_finite() || t < 0.0 {
                return Err(MillikanError::InvalidInput(format!(
                    "第{}个转折时刻无效: {t}",
                    i + 1
                )));
            }
        }

        if let Some(pos) = times.windows(2).position(|w| w[1] <= w[0]) {
            return Err(MillikanError::InvalidInput(format!(
                "转折时刻必须严格递增: {} 之后出现 {}",
                times[pos],
                times[pos + 1]
            )));
        }

        let frames = times
            .iter()
            .map(|&t| (t * frames_per_second).round() as i64)
            .collect();

        Ok(Self { frames })
    }

    /// 直接从帧号创建（必须严格递增）
    pub fn from_frames(frames: Vec<i64>) -> MillikanResult<Self> {
        if frames.windows(2).any(|w| w[1] <= w[0]) {
            return Err(MillikanError::InvalidInput(
                "转折帧号必须严格递增".to_string(),
            ));
        }
        Ok(Self { frames })
    }

    #[inline]
    pub fn frames(&self) -> &[i64] {
        &self.frames
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// 相位片段（借用原始轨迹的连续切片）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseSegment<'a> {
    /// 在完整切分中的位置：0 为 leading，N 为 trailing
    pub index: usize,
    /// 起始帧（含），None 表示 -inf
    pub start_frame: Option<i64>,
    /// 结束帧（不含），None 表示 +inf
    pub end_frame: Option<i64>,
    /// 片段内样本
    pub samples: &'a [TrackSample],
}

impl PhaseSegment<'_> {
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// 哪些开放端片段参与配对
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentOptions {
    /// 第一个转折点之前的片段是否参与配对
    pub include_leading: bool,
    /// 最后一个转折点之后的片段是否参与配对
    pub include_trailing: bool,
}

/// 一条轨迹的完整切分结果（已丢弃空片段）
#[derive(Debug, Clone, Default)]
pub struct Segmentation<'a> {
    /// 第一个转折点之前的片段
    pub leading: Option<PhaseSegment<'a>>,
    /// 两端都有转折点边界的片段（时间顺序）
    pub phases: Vec<PhaseSegment<'a>>,
    /// 最后一个转折点之后的片段
    pub trailing: Option<PhaseSegment<'a>>,
    /// 被丢弃的空片段数
    pub empty_segments: usize,
}

impl<'a> Segmentation<'a> {
    /// 所有非空片段（时间顺序，含 leading/trailing）
    pub fn all_segments(&self) -> impl Iterator<Item = &PhaseSegment<'a>> {
        self.leading
            .iter()
            .chain(self.phases.iter())
            .chain(self.trailing.iter())
    }

    /// 参与电荷分析的片段（时间顺序）
    pub fn analysis_segments(&self, options: SegmentOptions) -> Vec<PhaseSegment<'a>> {
        let mut segments = Vec::with_capacity(self.phases.len() + 2);
        if options.include_leading
            && let Some(leading) = self.leading
        {
            segments.push(leading);
        }
        segments.extend(self.phases.iter().copied());
        if options.include_trailing
            && let Some(trailing) = self.trailing
        {
            segments.push(trailing);
        }
        segments
    }
}

/// 按转折点切分一条（按帧序排列的）轨迹
pub fn segment_track<'a>(samples: &'a [TrackSample], turning: &TurningPoints) -> Segmentation<'a> {
    debug_assert!(
        samples.windows(2).all(|w| w[0].frame <= w[1].frame),
        "样本必须按帧序排列"
    );

    // 切分边界：第一个样本满足 frame >= boundary 的位置
    let cut = |boundary: i64| samples.partition_point(|s| s.frame < boundary);

    let frames = turning.frames();
    let mut segmentation = Segmentation::default();

    let mut keep = |segment: PhaseSegment<'a>| -> Option<PhaseSegment<'a>> {
        if segment.is_empty() {
            segmentation.empty_segments += 1;
            None
        } else {
            Some(segment)
        }
    };

    let Some((&first, _)) = frames.split_first() else {
        // 没有转折点：整条轨迹都是 leading
        let leading = keep(PhaseSegment {
            index: 0,
            start_frame: None,
            end_frame: None,
            samples,
        });
        segmentation.leading = leading;
        return segmentation;
    };

    let mut leading = None;
    let mut phases = Vec::with_capacity(frames.len().saturating_sub(1));

    let first_cut = cut(first);
    if let Some(seg) = keep(PhaseSegment {
        index: 0,
        start_frame: None,
        end_frame: Some(first),
        samples: &samples[..first_cut],
    }) {
        leading = Some(seg);
    }

    let mut start_cut = first_cut;
    for (i, w) in frames.windows(2).enumerate() {
        let end_cut = cut(w[1]);
        if let Some(seg) = keep(PhaseSegment {
            index: i + 1,
            start_frame: Some(w[0]),
            end_frame: Some(w[1]),
            samples: &samples[start_cut..end_cut],
        }) {
            phases.push(seg);
        }
        start_cut = end_cut;
    }

    let last = frames[frames.len() - 1];
    let trailing = keep(PhaseSegment {
        index: frames.len(),
        start_frame: Some(last),
        end_frame: None,
        samples: &samples[start_cut..],
    });

    segmentation.leading = leading;
    segmentation.phases = phases;
    segmentation.trailing = trailing;
    segmentation
}

/// 相位对（先后两个相邻片段，不预设哪个是下落段）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhasePair<'a> {
    /// 该粒子内的相位对序号
    pub index: usize,
    pub first: PhaseSegment<'a>,
    pub second: PhaseSegment<'a>,
}

/// 相位配对缓冲区
///
/// 最多持有一个待配对片段；第二个片段到达时输出一对并清空缓冲区。
/// 每个粒子使用独立的实例。
#[derive(Debug, Default)]
pub struct PhasePairBuilder<'a> {
    pending: Option<PhaseSegment<'a>>,
    emitted: usize,
}

impl<'a> PhasePairBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 送入一个片段，凑满两个时返回相位对
    pub fn push(&mut self, segment: PhaseSegment<'a>) -> Option<PhasePair<'a>> {
        match self.pending.take() {
            None => {
                self.pending = Some(segment);
                None
            }
            Some(first) => {
                let pair = PhasePair {
                    index: self.emitted,
                    first,
                    second: segment,
                };
                self.emitted += 1;
                Some(pair)
            }
        }
    }

    /// 当前待配对的片段
    #[inline]
    pub fn pending(&self) -> Option<&PhaseSegment<'a>> {
        self.pending.as_ref()
    }

    /// 结束当前粒子，返回被丢弃的奇数尾片段（如有）
    pub fn finish(self) -> Option<PhaseSegment<'a>> {
        self.pending
    }
}

/// 将一组片段按时间顺序两两配对
pub fn pair_segments<'a, I>(segments: I) -> Vec<PhasePair<'a>>
where
    I: IntoIterator<Item = PhaseSegment<'a>>,
{
    let mut builder = PhasePairBuilder::new();
    segments
        .into_iter()
        .filter_map(|segment| builder.push(segment))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_track(frames: std::ops::Range<i64>) -> Vec<TrackSample> {
        frames
            .map(|f| TrackSample::new(f, 10.0, f as f64, 0))
            .collect()
    }

    #[test]
    fn test_turning_points_rounding() {
        let tp = TurningPoints::from_times(&[3.0, 10.0, 60.5], 30.0).unwrap();
        assert_eq!(tp.frames(), &[90, 300, 1815]);

        // 0.51 * 30 = 15.3 → 15
        let tp = TurningPoints::from_times(&[0.51], 30.0).unwrap();
        assert_eq!(tp.frames(), &[15]);
    }

    #[test]
    fn test_turning_points_validation() {
        assert!(TurningPoints::from_times(&[5.0, 5.0], 30.0).is_err());
        assert!(TurningPoints::from_times(&[5.0, 3.0], 30.0).is_err());
        assert!(TurningPoints::from_times(&[-1.0], 30.0).is_err());
        assert!(TurningPoints::from_times(&[f64::NAN], 30.0).is_err());
        assert!(TurningPoints::from_times(&[1.0], 0.0).is_err());
        assert!(TurningPoints::from_frames(vec![10, 5]).is_err());
        assert!(TurningPoints::from_times(&[], 30.0).unwrap().is_empty());
    }

    #[test]
    fn test_segments_partition_track() {
        let samples = linear_track(0..100);
        let tp = TurningPoints::from_frames(vec![10, 40, 70]).unwrap();
        let seg = segment_track(&samples, &tp);

        let leading = seg.leading.unwrap();
        assert_eq!(leading.len(), 10);
        assert_eq!(seg.phases.len(), 2);
        assert_eq!(seg.phases[0].samples.first().unwrap().frame, 10);
        assert_eq!(seg.phases[0].samples.last().unwrap().frame, 39);
        assert_eq!(seg.phases[1].start_frame, Some(40));
        assert_eq!(seg.phases[1].end_frame, Some(70));
        assert_eq!(seg.trailing.unwrap().len(), 30);

        // 拼接所有片段恢复原轨迹
        let rebuilt: Vec<TrackSample> = seg
            .all_segments()
            .flat_map(|s| s.samples.iter().copied())
            .collect();
        assert_eq!(rebuilt, samples);
        assert_eq!(seg.empty_segments, 0);
    }

    #[test]
    fn test_empty_segments_are_dropped() {
        // 轨迹只覆盖 50..80，前面的片段都为空
        let samples = linear_track(50..80);
        let tp = TurningPoints::from_frames(vec![10, 20, 30, 60, 90]).unwrap();
        let seg = segment_track(&samples, &tp);

        assert!(seg.leading.is_none());
        assert!(seg.trailing.is_none());
        assert_eq!(seg.phases.len(), 2);
        assert!(seg.phases.iter().all(|s| !s.is_empty()));
        assert_eq!(seg.phases[0].index, 3);
        assert_eq!(seg.phases[1].index, 4);
        assert_eq!(seg.empty_segments, 4);
    }

    #[test]
    fn test_no_turning_points_yields_leading_only() {
        let samples = linear_track(0..5);
        let tp = TurningPoints::from_frames(Vec::new()).unwrap();
        let seg = segment_track(&samples, &tp);
        assert_eq!(seg.leading.unwrap().len(), 5);
        assert!(seg.phases.is_empty());
        assert!(seg.trailing.is_none());
    }

    #[test]
    fn test_frame_gaps_respected() {
        // 帧号不连续时按帧号而非行号切分
        let samples: Vec<TrackSample> = [0, 2, 4, 9, 11, 15]
            .iter()
            .map(|&f| TrackSample::new(f, 0.0, 0.0, 3))
            .collect();
        let tp = TurningPoints::from_frames(vec![4, 11]).unwrap();
        let seg = segment_track(&samples, &tp);

        assert_eq!(seg.leading.unwrap().len(), 2);
        let frames: Vec<i64> = seg.phases[0].samples.iter().map(|s| s.frame).collect();
        assert_eq!(frames, vec![4, 9]);
        assert_eq!(seg.trailing.unwrap().len(), 2);
    }

    #[test]
    fn test_analysis_segments_options() {
        let samples = linear_track(0..100);
        let tp = TurningPoints::from_frames(vec![10, 40, 70]).unwrap();
        let seg = segment_track(&samples, &tp);

        assert_eq!(seg.analysis_segments(SegmentOptions::default()).len(), 2);
        let all = seg.analysis_segments(SegmentOptions {
            include_leading: true,
            include_trailing: true,
        });
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].index, 0);
        assert_eq!(all[3].index, 3);
    }

    #[test]
    fn test_pair_builder_counts() {
        let samples = linear_track(0..100);
        for n in 0..7usize {
            let frames: Vec<i64> = (0..=n as i64).map(|i| i * 10).collect();
            let tp = TurningPoints::from_frames(frames).unwrap();
            let seg = segment_track(&samples, &tp);
            assert_eq!(seg.phases.len(), n);

            let pairs = pair_segments(seg.phases.iter().copied());
            assert_eq!(pairs.len(), n / 2, "{n}个片段应产生{}对", n / 2);
        }
    }

    #[test]
    fn test_pair_builder_is_disjoint_and_drops_odd_tail() {
        let samples = linear_track(0..50);
        let tp = TurningPoints::from_frames(vec![0, 10, 20, 30, 40]).unwrap();
        let seg = segment_track(&samples, &tp);

        let mut builder = PhasePairBuilder::new();
        let mut pairs = Vec::new();
        for s in seg.phases.iter().copied() {
            if let Some(pair) = builder.push(s) {
                pairs.push(pair);
            }
        }
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].index, 0);
        assert_eq!(pairs[0].first.index, 1);
        assert_eq!(pairs[0].second.index, 2);
        assert_eq!(pairs[1].index, 1);
        assert_eq!(pairs[1].first.index, 3);
        assert_eq!(pairs[1].second.index, 4);
        assert!(builder.pending().is_none());

        // 三个片段：最后一个被丢弃
        let mut builder = PhasePairBuilder::new();
        let phases = &seg.phases[..3];
        let emitted: Vec<_> = phases.iter().filter_map(|s| builder.push(*s)).collect();
        assert_eq!(emitted.len(), 1);
        assert_eq!(builder.finish().map(|s| s.index), Some(3));
    }
}
