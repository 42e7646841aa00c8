// ==========================================
// 设备故障停机统计系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + CSV / Excel
// 系统定位: 停机事件录入校验 + 故障率 / MTBF / MTTR 统计
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 分类库访问
pub mod repository;

// 引擎层 - 级联 / 校验 / 编辑 / 统计
pub mod engine;

// 导入层 - 事件表读写
pub mod importer;

// 配置层 - 统计目标值
pub mod config;

// 报表层 - 统计结果导出图片
pub mod report;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 分类维护接口
pub mod api;

// 应用层 - 会话
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{Meridiem, ReportPeriod, TaxonomyLevel};

// 领域实体
pub use domain::{EventColumn, EventRecord, PlantLayout, TaxonomyPath, TaxonomyTree};

// 引擎
pub use engine::{CellValidator, EventGrid, StatisticsEngine, StatisticsReport, TaxonomyCascade};

// API / 会话
pub use api::{TaxonomyApi, TaxonomyForm};
pub use app::{Session, UnsavedChangesDecision};

// 配置
pub use config::StatisticTargets;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "设备故障停机统计系统";
