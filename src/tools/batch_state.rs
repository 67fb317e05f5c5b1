//! 批处理状态管理模块
//!
//! 提供统一的批处理统计管理，支持串行和并行两种模式。
//! 统计单位：粒子（已分析数）与相位对（观测数、有效数、跳过数）。

use crate::error::ErrorCategory;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// 批处理统计快照
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchStatsSnapshot {
    /// 已分析的粒子数
    pub particles: usize,
    /// 得到电荷结果的相位对数
    pub observations: usize,
    /// 其中可用于量子化统计的数量
    pub valid: usize,
    /// 被跳过的相位对数
    pub skipped: usize,
    /// 错误分类统计（错误类型 -> 被跳过的相位对标签）
    pub error_stats: BTreeMap<ErrorCategory, Vec<String>>,
}

impl BatchStatsSnapshot {
    /// 被标记为无效（排除在量子化统计外）的观测数
    #[inline]
    pub fn invalid(&self) -> usize {
        self.observations - self.valid
    }
}

/// 串行批处理统计（单线程）
#[derive(Debug, Default)]
pub struct SerialBatchStats {
    snapshot: BatchStatsSnapshot,
}

impl SerialBatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// 增加已分析粒子计数
    #[inline]
    pub fn inc_particles(&mut self) -> usize {
        self.snapshot.particles += 1;
        self.snapshot.particles
    }

    /// 记录一个电荷观测
    #[inline]
    pub fn inc_observations(&mut self, is_valid: bool) -> usize {
        self.snapshot.observations += 1;
        if is_valid {
            self.snapshot.valid += 1;
        }
        self.snapshot.observations
    }

    /// 增加跳过计数并记录错误分类
    #[inline]
    pub fn inc_skipped(&mut self, category: ErrorCategory, label: String) -> usize {
        self.snapshot.skipped += 1;
        self.snapshot
            .error_stats
            .entry(category)
            .or_default()
            .push(label);
        self.snapshot.skipped
    }

    /// 获取统计快照
    pub fn snapshot(&self) -> BatchStatsSnapshot {
        self.snapshot.clone()
    }
}

/// 并行批处理统计（多线程安全）
///
/// 计数使用原子类型，错误分类表使用锁
#[derive(Debug, Clone, Default)]
pub struct ParallelBatchStats {
    particles: Arc<AtomicUsize>,
    observations: Arc<AtomicUsize>,
    valid: Arc<AtomicUsize>,
    skipped: Arc<AtomicUsize>,
    error_stats: Arc<Mutex<BTreeMap<ErrorCategory, Vec<String>>>>,
}

impl ParallelBatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// 增加已分析粒子计数（线程安全）
    #[inline]
    pub fn inc_particles(&self) -> usize {
        self.particles.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// 记录一个电荷观测（线程安全）
    #[inline]
    pub fn inc_observations(&self, is_valid: bool) -> usize {
        if is_valid {
            self.valid.fetch_add(1, Ordering::Relaxed);
        }
        self.observations.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// 增加跳过计数并记录错误分类（线程安全）
    pub fn inc_skipped(&self, category: ErrorCategory, label: String) -> usize {
        let count = self.skipped.fetch_add(1, Ordering::Relaxed) + 1;

        if let Ok(mut stats) = self.error_stats.lock() {
            stats.entry(category).or_default().push(label);
        }

        count
    }

    /// 获取统计快照（线程安全）
    ///
    /// 并行模式下标签的记录顺序取决于调度，快照中按字典序排列。
    pub fn snapshot(&self) -> BatchStatsSnapshot {
        let mut error_stats = self
            .error_stats
            .lock()
            .map(|stats| stats.clone())
            .unwrap_or_default();
        for labels in error_stats.values_mut() {
            labels.sort();
        }

        BatchStatsSnapshot {
            particles: self.particles.load(Ordering::Relaxed),
            observations: self.observations.load(Ordering::Relaxed),
            valid: self.valid.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            error_stats,
        }
    }
}
