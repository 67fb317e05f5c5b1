//! 轨迹测试固件生成器
//!
//! 在临时目录中生成合成的制表符分隔轨迹文件与数据集配置。

#![allow(dead_code)]

use std::fs::{self, create_dir_all};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// 轨迹文件表头
pub const HEADER: &str = "frame\tx\ty\tparticle";

/// 一行检测结果 (frame, x, y, particle)
pub type Row = (i64, f64, f64, i64);

/// 交替相位的合成轨迹
///
/// 从 `start_frame` 开始共 `phases` 个相位，每个相位 `phase_len` 帧；
/// 偶数相位每帧位移 `first_step` 像素，奇数相位 `second_step` 像素。
pub fn alternating_rows(
    particle: i64,
    start_frame: i64,
    phases: usize,
    phase_len: i64,
    first_step: f64,
    second_step: f64,
) -> Vec<Row> {
    let mut y = 200.0;
    let mut rows = Vec::new();
    for i in 0..(phases as i64 * phase_len) {
        rows.push((start_frame + i, 320.0, y, particle));
        y += if (i / phase_len) % 2 == 0 {
            first_step
        } else {
            second_step
        };
    }
    rows
}

/// 写入一个轨迹文件
pub fn write_track_file(path: &Path, rows: &[Row]) {
    if let Some(parent) = path.parent() {
        create_dir_all(parent).expect("无法创建固件目录");
    }
    let mut body = String::from(HEADER);
    body.push('\n');
    for (frame, x, y, particle) in rows {
        body.push_str(&format!("{frame}\t{x}\t{y}\t{particle}\n"));
    }
    fs::write(path, body).expect("无法写入轨迹文件");
}

/// 写入任意文本文件
pub fn write_raw(path: &Path, body: &str) {
    if let Some(parent) = path.parent() {
        create_dir_all(parent).expect("无法创建固件目录");
    }
    fs::write(path, body).expect("无法写入文件");
}

/// 标准实验目录
///
/// ```text
/// <tmp>/datasets.json
/// <tmp>/Trajectories/df14/track0.csv   粒子1（先下落）、粒子2（先上升）
/// <tmp>/Trajectories/df14/track1.csv   粒子3（有粒子级转折点覆盖）
/// <tmp>/Trajectories/df14/track2.csv   缺少列，应被跳过
/// ```
pub struct Experiment {
    pub dir: TempDir,
}

/// 下落：0.1 px/帧 → 3e-5 m/s（100 px/mm，30 fps）
pub const FALL_STEP: f64 = 0.1;
/// 上升：-0.05 px/帧 → -1.5e-5 m/s
pub const RISE_STEP: f64 = -0.05;

pub const CONFIG_JSON: &str = r#"{
    "calibration": { "px_per_mm": 100.0, "frames_per_second": 30.0 },
    "datasets": [
        {
            "name": "df14",
            "pattern": "Trajectories/df14/track*.csv",
            "turning_points": [0, 3, 6, 9, 12],
            "particle_overrides": [
                { "particle": 3, "file": "track1.csv", "turning_points": [0, 3, 6] }
            ]
        }
    ]
}"#;

impl Experiment {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("无法创建临时目录");
        let root = dir.path();

        let mut rows = alternating_rows(1, 0, 4, 90, FALL_STEP, RISE_STEP);
        rows.extend(alternating_rows(2, 0, 4, 90, RISE_STEP, FALL_STEP));
        write_track_file(&root.join("Trajectories/df14/track0.csv"), &rows);

        write_track_file(
            &root.join("Trajectories/df14/track1.csv"),
            &alternating_rows(3, 0, 4, 90, FALL_STEP, RISE_STEP),
        );

        write_raw(
            &root.join("Trajectories/df14/track2.csv"),
            "frame\tx\n0\t1.0\n",
        );

        write_raw(&root.join("datasets.json"), CONFIG_JSON);

        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.root().join("datasets.json")
    }
}
