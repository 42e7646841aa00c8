// ==========================================
// 设备故障停机统计系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、列语义、基础类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod event;
pub mod taxonomy;
pub mod types;

// 重导出核心类型
pub use event::{
    standard_headers, ColumnRole, EventColumn, EventRecord, TextFormat, COLUMN_COUNT, DATE_FORMAT,
};
pub use taxonomy::{
    natural_line_key, Area, AreaLayout, CorrectiveAction, Line, LineLayout, Machine, PathDetails,
    PlantLayout, Problem, TaxonomyPath, TaxonomyTree, TreeNode,
};
pub use types::{Meridiem, ReportPeriod, TaxonomyLevel};
