// ==========================================
// 设备故障停机统计系统 - 引擎层
// ==========================================
// 职责: 分类级联、单元格校验、表格编辑、停机统计
// 红线: Engine 不拼 SQL，数据库访问只经由 repository
// ==========================================

pub mod cascade;
pub mod editor;
pub mod statistics;
pub mod validator;

// 重导出核心引擎
pub use cascade::{OrderedChildren, TaxonomyCascade};
pub use editor::{ClipboardAction, EditOutcome, EditorError, EventGrid, MAX_COPY_CELLS};
pub use statistics::{
    breakdown_percent, format_target, mtbf_days, mttr_minutes, ChartSpec, MetricKind,
    MetricReport, MetricRow, StatisticsEngine, StatisticsInput, StatisticsReport, OVERALL_PLANT,
};
pub use validator::{CellValidator, ValidationFailure};
