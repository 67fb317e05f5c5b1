//! 输出格式化模块
//!
//! 负责电荷分析报告的生成：文本（表格）与 JSON 两种格式。

use super::batch_state::BatchStatsSnapshot;
use super::cli::{AppConfig, OutputFormat};
use super::dataset::Calibration;
use super::loader::SkippedFile;
use crate::processing::{ChargeObservation, SkippedPair};
use crate::{MillikanError, MillikanResult};
use chrono::{DateTime, Local};
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::UTF8_FULL};
use serde::Serialize;
use std::path::PathBuf;

/// 应用程序版本信息
const VERSION: &str = env!("CARGO_PKG_VERSION");

const SEPARATOR: &str =
    "--------------------------------------------------------------------------------\n";

/// 单个数据集的加载概况
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub name: String,
    pub files: usize,
    pub particles: usize,
}

/// 完整分析报告
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub tool_version: String,
    pub generated_at: DateTime<Local>,
    pub data_root: PathBuf,
    pub calibration: Calibration,
    pub datasets: Vec<DatasetSummary>,
    pub observations: Vec<ChargeObservation>,
    pub skipped_pairs: Vec<SkippedPair>,
    pub skipped_files: Vec<SkippedFile>,
    pub stats: BatchStatsSnapshot,
}

impl AnalysisReport {
    pub fn new(data_root: PathBuf, calibration: Calibration) -> Self {
        Self {
            tool_version: VERSION.to_string(),
            generated_at: Local::now(),
            data_root,
            calibration,
            datasets: Vec::new(),
            observations: Vec::new(),
            skipped_pairs: Vec::new(),
            skipped_files: Vec::new(),
            stats: BatchStatsSnapshot::default(),
        }
    }
}

/// 生成报告头部信息
pub fn create_output_header(report: &AnalysisReport) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Millikan Charge Tool v{} / Oil-drop charge analysis\n",
        report.tool_version
    ));
    let now = report.generated_at.format("%Y-%m-%d %H:%M:%S");
    output.push_str(&format!("log date: {now}\n\n"));

    output.push_str(SEPARATOR);
    output.push_str(&format!("Data root: {}\n", report.data_root.display()));

    let c = &report.calibration;
    output.push_str(&format!(
        "Calibration: {} px/mm, {} fps, tolerance {}, pixel σ {} px\n",
        c.px_per_mm, c.frames_per_second, c.tolerance, c.pixel_uncertainty
    ));
    for dataset in &report.datasets {
        output.push_str(&format!(
            "Dataset {}: {} files, {} particles\n",
            dataset.name, dataset.files, dataset.particles
        ));
    }
    output.push_str(SEPARATOR);
    output.push('\n');

    output
}

/// 电荷观测表格
pub fn format_observation_table(observations: &[ChargeObservation]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Dataset",
        "File",
        "Particle",
        "Pair",
        "v_fall (m/s)",
        "v_rise (m/s)",
        "Radius (m)",
        "Charge (C)",
        "q/e",
        "Valid",
    ]);

    for obs in observations {
        let r = &obs.result;
        table.add_row(vec![
            Cell::new(&obs.dataset),
            Cell::new(&obs.file),
            Cell::new(obs.particle).set_alignment(CellAlignment::Right),
            Cell::new(obs.pair_index).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.3}", r.v_fall)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.3}", r.v_rise)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.3}", r.droplet.radius)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.3}", r.charge)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.2}", r.elementary_multiple()))
                .set_alignment(CellAlignment::Right),
            Cell::new(if r.is_valid { "✓" } else { "✗" }),
        ]);
    }

    format!("{table}\n")
}

/// 跳过记录（文件与相位对）
pub fn format_skip_section(skipped_files: &[SkippedFile], skipped_pairs: &[SkippedPair]) -> String {
    let mut output = String::new();
    if skipped_files.is_empty() && skipped_pairs.is_empty() {
        return output;
    }

    output.push('\n');
    output.push_str("Skipped / 已跳过:\n");
    for file in skipped_files {
        output.push_str(&format!(
            "   [{}] {} - {}\n",
            file.category.display_name(),
            file.path.display(),
            file.reason
        ));
    }
    for pair in skipped_pairs {
        output.push_str(&format!(
            "   [{}] {} - {}\n",
            pair.category.display_name(),
            pair.label(),
            pair.reason
        ));
    }

    output
}

/// 批处理统计信息
pub fn create_output_footer(stats: &BatchStatsSnapshot) -> String {
    let mut output = String::new();

    output.push('\n');
    output.push_str("=====================================\n");
    output.push_str("批量处理统计:\n");
    output.push_str(&format!("   分析粒子数: {}\n", stats.particles));
    output.push_str(&format!("   电荷观测数: {}\n", stats.observations));
    output.push_str(&format!("   有效观测: {}\n", stats.valid));
    output.push_str(&format!("   排除观测: {}\n", stats.invalid()));
    output.push_str(&format!("   跳过相位对: {}\n", stats.skipped));
    if stats.observations > 0 {
        output.push_str(&format!(
            "   有效率: {:.1}%\n",
            stats.valid as f64 / stats.observations as f64 * 100.0
        ));
    }

    if !stats.error_stats.is_empty() {
        output.push_str("\n跳过原因分布:\n");
        for (category, labels) in &stats.error_stats {
            output.push_str(&format!(
                "   {}: {}\n",
                category.display_name(),
                labels.len()
            ));
        }
    }

    output.push('\n');
    output.push_str(&format!("生成工具: Millikan Charge Tool v{VERSION}\n"));

    output
}

/// 完整文本报告
pub fn format_text_report(report: &AnalysisReport) -> String {
    let mut output = create_output_header(report);
    if report.observations.is_empty() {
        output.push_str("(no charge observations / 无电荷观测)\n");
    } else {
        output.push_str(&format_observation_table(&report.observations));
    }
    output.push_str(&format_skip_section(
        &report.skipped_files,
        &report.skipped_pairs,
    ));
    output.push_str(&create_output_footer(&report.stats));
    output
}

/// JSON 报告
pub fn format_json_report(report: &AnalysisReport) -> MillikanResult<String> {
    let mut json = serde_json::to_string_pretty(report)?;
    json.push('\n');
    Ok(json)
}

/// 按格式渲染报告
pub fn render_report(report: &AnalysisReport, format: OutputFormat) -> MillikanResult<String> {
    match format {
        OutputFormat::Text => Ok(format_text_report(report)),
        OutputFormat::Json => format_json_report(report),
    }
}

/// 处理输出写入（文件或标准输出）
pub fn write_output(output: &str, config: &AppConfig) -> MillikanResult<()> {
    match &config.output_path {
        Some(output_path) => {
            std::fs::write(output_path, output).map_err(MillikanError::IoError)?;
            eprintln!("📄 结果已保存到: {}", output_path.display());
        }
        None => print!("{output}"),
    }
    Ok(())
}
