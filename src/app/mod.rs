// ==========================================
// 设备故障停机统计系统 - 应用层
// ==========================================
// 职责: 会话对象，串联分类维护、表格编辑、文件操作与统计导出
// ==========================================

pub mod session;

// 重导出
pub use session::{Session, SessionError, SessionResult, UnsavedChangesDecision, UNTITLED_SHEET};
