//! track-inspect - 轨迹与相位切分检查工具
//!
//! 列出数据集中的粒子（帧范围、样本数），给定转折时刻时显示切分边界与配对数，
//! 便于操作员编写转折时刻表。

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::UTF8_FULL};
use millikan_charge_tool::core::{
    ParticleTrack, SegmentOptions, TurningPoints, VelocityEstimator, pair_segments, segment_track,
};
use millikan_charge_tool::tools::{self, AnalysisConfig, constants::defaults};

#[derive(Parser)]
#[command(name = "track-inspect")]
#[command(about = "轨迹与相位切分检查工具 / Track and phase segmentation inspector")]
#[command(version)]
struct Cli {
    /// 轨迹文件所在目录
    /// Directory containing track files
    #[arg(default_value = ".")]
    dir: PathBuf,

    /// 文件名模式
    /// File name pattern
    #[arg(long, short = 'p', default_value = defaults::TRACK_FILE_PATTERN)]
    pattern: String,

    /// 帧率
    /// Frames per second
    #[arg(long, default_value_t = defaults::FRAMES_PER_SECOND)]
    fps: f64,

    /// 转折时刻（秒，逗号分隔）
    /// Turning points in seconds, comma separated
    #[arg(long, short = 't', value_delimiter = ',')]
    turning_points: Vec<f64>,

    /// 第一个转折点之前的片段参与配对
    /// Pair the segment before the first turning point
    #[arg(long)]
    include_leading: bool,

    /// 最后一个转折点之后的片段参与配对
    /// Pair the segment after the last turning point
    #[arg(long)]
    include_trailing: bool,

    /// 像素标定；给出时显示每个片段的速度估计
    /// Pixel calibration; when given, per-segment velocities are shown
    #[arg(long)]
    px_per_mm: Option<f64>,

    /// 从配置文件读取数据集（与 --dataset 一起使用）
    /// Read the dataset from a config file (use with --dataset)
    #[arg(long, short = 'c', requires = "dataset")]
    config: Option<PathBuf>,

    /// 配置文件中的数据集名称
    /// Dataset name in the config file
    #[arg(long, short = 'd', requires = "config")]
    dataset: Option<String>,

    /// 显示每个片段的详情
    /// Show per-segment details
    #[arg(long, short = 's')]
    segments: bool,
}

/// 检查参数（命令行或配置文件）
struct Inspection {
    dir: PathBuf,
    pattern: String,
    fps: f64,
    turning_points: Vec<f64>,
    options: SegmentOptions,
    estimator: Option<VelocityEstimator>,
    config: Option<(AnalysisConfig, String)>,
}

impl Inspection {
    fn from_cli(cli: Cli) -> Result<Self> {
        let options = SegmentOptions {
            include_leading: cli.include_leading,
            include_trailing: cli.include_trailing,
        };

        let (Some(config_path), Some(name)) = (&cli.config, &cli.dataset) else {
            let estimator = cli
                .px_per_mm
                .map(|px| VelocityEstimator::new(px, cli.fps))
                .transpose()
                .context("Invalid calibration / 标定参数无效")?;
            return Ok(Self {
                dir: cli.dir,
                pattern: cli.pattern,
                fps: cli.fps,
                turning_points: cli.turning_points,
                options,
                estimator,
                config: None,
            });
        };

        let config = AnalysisConfig::load(config_path)
            .with_context(|| format!("Failed to load config / 无法加载配置: {}", config_path.display()))?;
        let Some(dataset) = config.datasets.iter().find(|d| &d.name == name).cloned() else {
            bail!("Dataset not found / 未找到数据集: {name}");
        };

        let estimator = Some(config.velocity_estimator()?);
        Ok(Self {
            dir: tools::path::get_parent_dir(config_path).to_path_buf(),
            pattern: dataset.pattern.clone(),
            fps: config.calibration.frames_per_second,
            turning_points: dataset.turning_points.clone(),
            options: dataset.segment_options(),
            estimator,
            config: Some((config, dataset.name)),
        })
    }

    /// 某条轨迹使用的转折点（配置文件中的粒子覆盖优先）
    fn turning_points_for(&self, track: &ParticleTrack) -> Result<TurningPoints> {
        if let Some((config, name)) = &self.config
            && let Some(dataset) = config.datasets.iter().find(|d| &d.name == name)
        {
            return Ok(config.turning_points_for(dataset, track)?);
        }
        Ok(TurningPoints::from_times(&self.turning_points, self.fps)?)
    }
}

fn particle_table(inspection: &Inspection, tracks: &[ParticleTrack]) -> Result<Table> {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let mut header = vec!["File", "Particle", "Samples", "First frame", "Last frame", "Duration (s)"];
    let with_segments = inspection.config.is_some() || !inspection.turning_points.is_empty();
    if with_segments {
        header.extend(["Segments", "Empty", "Pairs", "Dropped tail"]);
    }
    table.set_header(header);

    for track in tracks {
        let (first, last) = track.frame_range().unwrap_or((0, 0));
        let mut row = vec![
            Cell::new(tools::path::extract_filename(&track.source)),
            Cell::new(track.particle_id).set_alignment(CellAlignment::Right),
            Cell::new(track.len()).set_alignment(CellAlignment::Right),
            Cell::new(first).set_alignment(CellAlignment::Right),
            Cell::new(last).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.2}", (last - first) as f64 / inspection.fps))
                .set_alignment(CellAlignment::Right),
        ];

        if with_segments {
            let turning = inspection.turning_points_for(track)?;
            let segmentation = segment_track(track.samples(), &turning);
            let segments = segmentation.analysis_segments(inspection.options);
            let pairs = pair_segments(segments.iter().copied());
            let dropped = if segments.len() % 2 == 1 {
                segments.last().map(|s| s.index.to_string())
            } else {
                None
            };
            row.extend([
                Cell::new(segments.len()).set_alignment(CellAlignment::Right),
                Cell::new(segmentation.empty_segments).set_alignment(CellAlignment::Right),
                Cell::new(pairs.len()).set_alignment(CellAlignment::Right),
                Cell::new(dropped.unwrap_or_else(|| "-".to_string())),
            ]);
        }

        table.add_row(row);
    }

    Ok(table)
}

fn frame_bound(bound: Option<i64>, open: &str) -> String {
    bound.map_or_else(|| open.to_string(), |f| f.to_string())
}

fn segment_table(inspection: &Inspection, track: &ParticleTrack) -> Result<Table> {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Segment", "Start", "End", "Samples", "Velocity (m/s)", "Paired"]);

    let turning = inspection.turning_points_for(track)?;
    let segmentation = segment_track(track.samples(), &turning);
    let analysed: Vec<usize> = segmentation
        .analysis_segments(inspection.options)
        .iter()
        .map(|s| s.index)
        .collect();

    for segment in segmentation.all_segments() {
        let velocity = match &inspection.estimator {
            Some(estimator) => match estimator.estimate(segment.samples) {
                Ok(v) => format!("{v:.3}"),
                Err(e) => format!("({e})"),
            },
            None => "-".to_string(),
        };
        table.add_row(vec![
            Cell::new(segment.index).set_alignment(CellAlignment::Right),
            Cell::new(frame_bound(segment.start_frame, "-inf")).set_alignment(CellAlignment::Right),
            Cell::new(frame_bound(segment.end_frame, "+inf")).set_alignment(CellAlignment::Right),
            Cell::new(segment.len()).set_alignment(CellAlignment::Right),
            Cell::new(velocity).set_alignment(CellAlignment::Right),
            Cell::new(if analysed.contains(&segment.index) { "✓" } else { "" }),
        ]);
    }

    Ok(table)
}

fn inspect(inspection: &Inspection, show_segments: bool) -> Result<()> {
    let report = tools::load_tracks(&inspection.dir, &inspection.pattern).with_context(|| {
        format!(
            "Failed to scan / 扫描失败: {}",
            Path::new(&inspection.dir).join(&inspection.pattern).display()
        )
    })?;

    for skipped in &report.skipped {
        eprintln!("[WARNING] {} - {}", skipped.path.display(), skipped.reason);
    }
    if report.tracks.is_empty() {
        bail!("No particle tracks found / 未找到粒子轨迹");
    }

    println!(
        "📁 {} 个文件，{} 个粒子 / {} files, {} particles\n",
        report.files.len(),
        report.tracks.len(),
        report.files.len(),
        report.tracks.len()
    );
    println!("{}", particle_table(inspection, &report.tracks)?);

    if show_segments {
        for track in &report.tracks {
            println!(
                "\n{} #{}",
                tools::path::extract_filename(&track.source),
                track.particle_id
            );
            println!("{}", segment_table(inspection, track)?);
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tools::init_logging(false);

    let show_segments = cli.segments;
    let inspection = Inspection::from_cli(cli)?;
    inspect(&inspection, show_segments)
}
