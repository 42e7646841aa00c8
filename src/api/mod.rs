// ==========================================
// 设备故障停机统计系统 - API 层
// ==========================================
// 职责: 面向界面 / 命令行的业务接口，错误转换为用户可读提示
// 红线: API 不拼 SQL，只调用 repository 与 engine
// ==========================================

pub mod error;
pub mod taxonomy_api;

pub use error::{ApiError, ApiResult};
pub use taxonomy_api::{TaxonomyApi, TaxonomyChange, TaxonomyForm};
