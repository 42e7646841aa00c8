// ==========================================
// 设备故障停机统计系统 - 统计表格渲染
// ==========================================
// 职责: MetricReport → 文本表格（命令行） / 位图表格（导出）
// 列: 分类 | 数值 | 目标（无目标的段落只有两列）
// ==========================================

use crate::engine::statistics::{format_target, MetricReport};
use crate::report::error::{white_buffer, ReportError, ReportResult};
use image::RgbImage;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

/// 表格位图宽度
pub const TABLE_WIDTH: u32 = 600;
/// 行高（含表头）
pub const ROW_HEIGHT: u32 = 32;

const HEADER_FILL: RGBColor = RGBColor(230, 230, 230);

/// 表格文本模型
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableText {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableText {
    pub fn from_report(report: &MetricReport) -> Self {
        let mut headers = vec![report.category_header.clone(), report.value_header.clone()];
        if let Some(target_header) = &report.target_header {
            headers.push(target_header.clone());
        }
        let rows = report
            .rows
            .iter()
            .map(|row| {
                let mut cells = vec![row.category.clone(), report.kind.format_value(row.value)];
                if report.target_header.is_some() {
                    cells.push(row.target.map(format_target).unwrap_or_default());
                }
                cells
            })
            .collect();
        Self { headers, rows }
    }

    /// 等宽对齐的纯文本表格
    pub fn to_plain(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
        let line = |cells: &[String]| -> String {
            cells
                .iter()
                .enumerate()
                .map(|(i, c)| format!("{:<width$}", c, width = widths[i]))
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_string()
        };

        let mut out = line(&self.headers);
        out.push('\n');
        out.push_str(
            &widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("-+-"),
        );
        out.push('\n');
        for row in &self.rows {
            out.push_str(&line(row));
            out.push('\n');
        }
        out
    }
}

/// 表格渲染为位图
pub fn render_table(report: &MetricReport, width: u32) -> ReportResult<RgbImage> {
    let text = TableText::from_report(report);
    let columns = text.headers.len().max(1) as i32;
    let height = ROW_HEIGHT * (text.rows.len() as u32 + 1);
    let mut buffer = white_buffer(width, height)?;

    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(ReportError::render)?;

        let col_width = width as i32 / columns;
        let row_height = ROW_HEIGHT as i32;
        let style = TextStyle::from(("sans-serif", 15).into_font())
            .pos(Pos::new(HPos::Center, VPos::Center));

        root.draw(&Rectangle::new(
            [(0, 0), (width as i32 - 1, row_height - 1)],
            HEADER_FILL.filled(),
        ))
        .map_err(ReportError::render)?;

        for (r, cells) in std::iter::once(&text.headers).chain(text.rows.iter()).enumerate() {
            let y = r as i32 * row_height;
            for (c, cell) in cells.iter().enumerate() {
                let x = c as i32 * col_width;
                root.draw(&Rectangle::new(
                    [(x, y), (x + col_width - 1, y + row_height - 1)],
                    BLACK.stroke_width(1),
                ))
                .map_err(ReportError::render)?;
                root.draw(&Text::new(
                    cell.clone(),
                    (x + col_width / 2, y + row_height / 2),
                    style.clone(),
                ))
                .map_err(ReportError::render)?;
            }
        }
        root.present().map_err(ReportError::render)?;
    }

    RgbImage::from_raw(width, height, buffer).ok_or(ReportError::BufferSize { width, height })
}
