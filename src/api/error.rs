// ==========================================
// 设备故障停机统计系统 - API层错误类型
// ==========================================
// 职责: 把仓储层错误转换为面向用户的分类编辑错误
// 用户提示: user_message() 走 i18n 文案
// ==========================================

use crate::i18n::{t, t_with_args};
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 分类维护表单的错误
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 表单错误
    // ==========================================
    #[error("表单内容无效: {0}")]
    InvalidInput(String),

    /// 上级尚不存在或表单跳级填写
    #[error("请逐级添加数据: {0}")]
    IncompleteForm(String),

    // ==========================================
    // 分类完整性错误
    // ==========================================
    #[error("分类项不存在: {0}")]
    NotFound(String),

    #[error("已存在: {0}")]
    AlreadyExists(String),

    #[error("存在下级 {child}，禁止删除: {name}")]
    HasChildren { name: String, child: String },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("分类库访问失败: {0}")]
    DatabaseError(String),

    #[error("分类库写入未生效: {0}")]
    DatabaseTransactionError(String),

    #[error("分类数据无效: {0}")]
    ValidationError(String),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { id, .. } => ApiError::NotFound(id),
            RepositoryError::Duplicate { name, .. } => ApiError::AlreadyExists(name),
            RepositoryError::NameConflict(msg) => ApiError::AlreadyExists(msg),
            RepositoryError::HasChildren { name, child, .. } => ApiError::HasChildren { name, child },
            RepositoryError::MissingParent(msg) => ApiError::IncompleteForm(msg),
            RepositoryError::Sqlite(msg) => ApiError::DatabaseError(msg),
            RepositoryError::WriteNotApplied(msg) => ApiError::DatabaseTransactionError(msg),
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
        }
    }
}

impl ApiError {
    /// 面向用户的提示文案
    pub fn user_message(&self) -> String {
        match self {
            ApiError::InvalidInput(msg) => t_with_args("api.invalid_input", &[("reason", msg)]),
            ApiError::IncompleteForm(_) => t("api.add_one_by_one"),
            ApiError::NotFound(name) => t_with_args("api.does_not_exist", &[("name", name)]),
            ApiError::AlreadyExists(name) => t_with_args("api.already_exists", &[("name", name)]),
            ApiError::HasChildren { child, .. } => {
                t_with_args("api.delete_children_first", &[("child", child)])
            }
            other => t_with_args("api.storage_error", &[("reason", &other.to_string())]),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
