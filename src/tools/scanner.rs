//! 轨迹文件扫描模块
//!
//! 按 `目录/文件名通配` 形式的模式查找粒子轨迹文件（不递归子目录）。

use super::utils;
use crate::{MillikanError, MillikanResult};
use glob::Pattern;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 编译文件名模式（`*`、`?`、`[...]`）
fn compile_pattern(file_pattern: &str) -> MillikanResult<Pattern> {
    Pattern::new(file_pattern)
        .map_err(|e| MillikanError::InvalidInput(format!("无效的文件模式 {file_pattern}: {e}")))
}

/// 将模式拆分为（目录, 文件名模式），目录相对 `root` 解析
///
/// 通配符只允许出现在最后一级文件名中；文件名模式在此处完成语法校验。
pub fn split_pattern(root: &Path, pattern: &str) -> MillikanResult<(PathBuf, String)> {
    let pattern_path = Path::new(pattern);
    let file_pattern = pattern_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| MillikanError::InvalidInput(format!("无效的文件模式: {pattern}")))?
        .to_string();

    compile_pattern(&file_pattern)?;

    let dir_part = pattern_path.parent().unwrap_or_else(|| Path::new(""));
    if dir_part.to_string_lossy().contains(['*', '?', '[']) {
        return Err(MillikanError::InvalidInput(format!(
            "通配符只能出现在文件名中: {pattern}"
        )));
    }

    let dir = if dir_part.is_absolute() {
        dir_part.to_path_buf()
    } else {
        root.join(dir_part)
    };

    Ok((dir, file_pattern))
}

/// 扫描目录中匹配文件名模式的轨迹文件（按路径排序）
pub fn scan_track_files(dir_path: &Path, file_pattern: &str) -> MillikanResult<Vec<PathBuf>> {
    if !dir_path.exists() {
        return Err(MillikanError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("目录不存在: {}", dir_path.display()),
        )));
    }

    if !dir_path.is_dir() {
        return Err(MillikanError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotADirectory,
            format!("路径不是目录: {}", dir_path.display()),
        )));
    }

    let matcher = compile_pattern(file_pattern)?;
    let mut track_files = Vec::new();

    for entry in WalkDir::new(dir_path).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            MillikanError::IoError(std::io::Error::other(format!(
                "遍历目录失败 {}: {e}",
                dir_path.display()
            )))
        })?;

        // 只处理文件，跳过目录
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if matcher.matches(utils::extract_filename(path)) {
            track_files.push(path.to_path_buf());
        }
    }

    track_files.sort();
    Ok(track_files)
}

/// 按完整模式（相对 `root`）扫描轨迹文件
pub fn scan_pattern(root: &Path, pattern: &str) -> MillikanResult<Vec<PathBuf>> {
    let (dir, file_pattern) = split_pattern(root, pattern)?;
    scan_track_files(&dir, &file_pattern)
}
