// ==========================================
// 设备故障停机统计系统 - 统计报表合成导出
// ==========================================
// 职责: 按展示顺序把每个段落的表格、图表自上而下拼到一张白底位图上，写出 PNG
// 画布: 固定宽度（视口宽度），高度随内容
// 红线: 没有可导出的段落时不写文件，只记警告
// ==========================================

use crate::engine::statistics::StatisticsReport;
use crate::report::chart::{render_bar_chart, CHART_HEIGHT, CHART_WIDTH};
use crate::report::error::{ReportError, ReportResult};
use crate::report::table::{render_table, TABLE_WIDTH};
use image::{imageops, ImageFormat, Rgb, RgbImage};
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// 默认视口宽度
pub const DEFAULT_CANVAS_WIDTH: u32 = 1000;

/// 画布宽度范围
pub const MIN_CANVAS_WIDTH: u32 = 100;
pub const MAX_CANVAS_WIDTH: u32 = 10_000;

/// 部件之间的垂直间距
const PART_SPACING: u32 = 24;

/// 导出结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Written { path: PathBuf, width: u32, height: u32 },
    NothingToExport,
}

/// 渲染全部段落（表格在前，图表在后），按展示顺序返回
pub fn render_parts(report: &StatisticsReport) -> ReportResult<Vec<RgbImage>> {
    let mut parts = Vec::new();
    for section in &report.sections {
        parts.push(render_table(section, TABLE_WIDTH)?);
        if let Some(chart) = &section.chart {
            parts.push(render_bar_chart(chart, &section.rows, CHART_WIDTH, CHART_HEIGHT)?);
        }
    }
    Ok(parts)
}

/// 纵向拼接（水平居中，超出画布宽度的部分被裁掉）
pub fn stack_parts(parts: &[RgbImage], width: u32) -> RgbImage {
    let height = parts
        .iter()
        .map(|p| p.height())
        .fold(0u32, u32::saturating_add)
        .saturating_add(PART_SPACING.saturating_mul(parts.len() as u32 + 1));
    let mut canvas = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));

    let mut y = PART_SPACING;
    for part in parts {
        let x = width.saturating_sub(part.width()) / 2;
        imageops::replace(&mut canvas, part, x as i64, y as i64);
        y += part.height() + PART_SPACING;
    }
    canvas
}

/// 合成并写出 PNG
#[instrument(skip(report), fields(sections = report.sections.len()))]
pub fn export_png(report: &StatisticsReport, path: &Path, width: u32) -> ReportResult<ExportOutcome> {
    if !(MIN_CANVAS_WIDTH..=MAX_CANVAS_WIDTH).contains(&width) {
        return Err(ReportError::InvalidWidth {
            width,
            min: MIN_CANVAS_WIDTH,
            max: MAX_CANVAS_WIDTH,
        });
    }
    if report.is_empty() {
        warn!("没有可导出的统计内容");
        return Ok(ExportOutcome::NothingToExport);
    }

    let parts = render_parts(report)?;
    let canvas = stack_parts(&parts, width);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    canvas.save_with_format(path, ImageFormat::Png)?;

    info!(width = canvas.width(), height = canvas.height(), "统计报表已导出");
    Ok(ExportOutcome::Written {
        path: path.to_path_buf(),
        width: canvas.width(),
        height: canvas.height(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_parts_layout() {
        let red = RgbImage::from_pixel(10, 5, Rgb([255, 0, 0]));
        let blue = RgbImage::from_pixel(20, 7, Rgb([0, 0, 255]));
        let canvas = stack_parts(&[red, blue], 40);

        assert_eq!(canvas.width(), 40);
        assert_eq!(canvas.height(), 5 + 7 + PART_SPACING * 3);
        assert_eq!(canvas.get_pixel(15, PART_SPACING).0, [255, 0, 0]);
        assert_eq!(canvas.get_pixel(10, PART_SPACING * 2 + 5).0, [0, 0, 255]);
        assert_eq!(canvas.get_pixel(0, 0).0, [255, 255, 255]);
    }

    #[test]
    fn test_width_out_of_range_rejected() {
        let report = StatisticsReport {
            period: crate::domain::types::ReportPeriod::AllMonths,
            label: "Empty".to_string(),
            working_days: 0.0,
            event_count: 0,
            sections: Vec::new(),
        };
        let dir = std::env::temp_dir();
        for width in [0, MIN_CANVAS_WIDTH - 1, MAX_CANVAS_WIDTH + 1, u32::MAX] {
            let err = export_png(&report, &dir.join("never.png"), width).unwrap_err();
            assert!(matches!(err, ReportError::InvalidWidth { .. }));
        }
    }
}
