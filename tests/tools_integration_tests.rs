//! 工具层集成测试
//!
//! 测试CLI、文件扫描、轨迹加载、报告输出等工具模块的集成功能。

mod track_test_fixtures;

use millikan_charge_tool::tools::{self, AppConfig, OutputFormat, constants::defaults};
use std::path::Path;
use track_test_fixtures::{Experiment, write_raw};

// ============================================================================
// CLI配置测试
// ============================================================================

/// 数据根目录默认取配置文件所在目录
#[test]
fn test_data_root_defaults_to_config_dir() {
    let config = tools::parse_args_from(["millikan-charge", "/srv/lab/datasets.json"]).unwrap();
    assert_eq!(config.data_root, Path::new("/srv/lab"));
    assert_eq!(config.parallel, Some(defaults::PARALLEL_DEGREE));
    println!("  ✓ 数据根目录默认取配置文件所在目录");
}

/// 并发度被限制在合法区间
#[test]
fn test_parallel_degree_is_clamped() {
    let config = tools::parse_args_from(["millikan-charge", "d.json", "--parallel", "0"]).unwrap();
    assert_eq!(config.parallel, Some(1));
    println!("  ✓ 并发度下限为1");
}

#[test]
fn test_app_config_new() {
    let config = AppConfig::new("datasets.json");
    assert_eq!(config.data_root, Path::new("."));
    assert_eq!(config.format, OutputFormat::Text);
    assert!(config.output_path.is_none());
}

// ============================================================================
// 扫描与加载测试
// ============================================================================

#[test]
fn test_scan_pattern_relative_to_root() {
    let experiment = Experiment::new();
    let files = tools::scan_pattern(experiment.root(), "Trajectories/df14/track*.csv").unwrap();
    let names: Vec<&str> = files
        .iter()
        .map(|p| tools::path::extract_filename(p))
        .collect();
    assert_eq!(names, vec!["track0.csv", "track1.csv", "track2.csv"]);
    println!("  ✓ 扫描结果按路径排序");
}

#[test]
fn test_load_tracks_reports_particles_per_file() {
    let experiment = Experiment::new();
    let report = tools::load_tracks(experiment.root(), "Trajectories/df14/track*.csv").unwrap();

    assert_eq!(report.files.len(), 2);
    assert_eq!(report.skipped.len(), 1);

    let ids: Vec<(String, i64, usize)> = report
        .tracks
        .iter()
        .map(|t| {
            (
                tools::path::extract_filename_lossy(&t.source),
                t.particle_id,
                t.ordinal,
            )
        })
        .collect();
    assert_eq!(
        ids,
        vec![
            ("track0.csv".to_string(), 1, 0),
            ("track0.csv".to_string(), 2, 1),
            ("track1.csv".to_string(), 3, 0),
        ]
    );
    assert!(report.tracks.iter().all(|t| t.len() == 360));
}

#[test]
fn test_empty_match_is_not_an_error() {
    let experiment = Experiment::new();
    let report = tools::load_tracks(experiment.root(), "Trajectories/df14/none*.csv").unwrap();
    assert!(report.tracks.is_empty());
    assert!(report.skipped.is_empty());
}

#[test]
fn test_float_formatted_columns() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("track0.csv");
    write_raw(
        &path,
        "frame\tx\ty\tparticle\n0.0\t1.5\t2.5\t3.0\n1.0\t1.5\t3.5\t3.0\n",
    );
    let tracks = tools::load_track_file(&path).unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].particle_id, 3);
    assert_eq!(tracks[0].frame_range(), Some((0, 1)));
}

// ============================================================================
// 输出测试
// ============================================================================

#[test]
fn test_write_output_to_file() {
    let experiment = Experiment::new();
    let analysis_config = tools::AnalysisConfig::load(&experiment.config_path()).unwrap();
    let report = tools::run_analysis(&analysis_config, experiment.root(), Some(2)).unwrap();
    let text = tools::render_report(&report, OutputFormat::Text).unwrap();

    let output_path = experiment.root().join("report.txt");
    let mut config = AppConfig::new(experiment.config_path());
    config.output_path = Some(output_path.clone());
    tools::write_output(&text, &config).unwrap();

    let written = std::fs::read_to_string(&output_path).unwrap();
    assert_eq!(written, text);
    assert!(written.contains("log date:"));
    println!("  ✓ 报告写入文件");
}

/// 随仓库提供的示例配置可以通过校验
#[test]
fn test_demo_config_is_valid() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/datasets.json");
    let config = tools::AnalysisConfig::load(&path).unwrap();
    assert_eq!(config.datasets.len(), 5);
    assert!(config.datasets.iter().all(|d| !d.turning_points.is_empty()));

    // 表中每个数据集的窗口首尾相接，可由单一转折点序列表示
    let df14 = config.datasets.iter().find(|d| d.name == "df14").unwrap();
    let frames = config.turning_points(&df14.turning_points).unwrap();
    assert_eq!(frames.frames(), &[90, 300, 600, 750, 1230, 1350, 1650, 1740]);
    assert!(!df14.include_leading && df14.include_trailing);
}
