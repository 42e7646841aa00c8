// ==========================================
// 设备故障停机统计系统 - 报表层
// ==========================================
// 职责: 统计结果的表格 / 柱状图渲染与 PNG 合成导出
// 工具: plotters (位图绘制) + image (拼接与编码)
// ==========================================

pub mod chart;
pub mod compose;
pub mod error;
pub mod table;

pub use chart::{render_bar_chart, CHART_HEIGHT, CHART_WIDTH};
pub use compose::{
    export_png, render_parts, stack_parts, ExportOutcome, DEFAULT_CANVAS_WIDTH,
    MAX_CANVAS_WIDTH, MIN_CANVAS_WIDTH,
};
pub use error::{ReportError, ReportResult};
pub use table::{render_table, TableText, ROW_HEIGHT, TABLE_WIDTH};
