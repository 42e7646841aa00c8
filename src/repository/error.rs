// ==========================================
// 设备故障停机统计系统 - 分类仓储错误
// ==========================================
// SQLite 约束失败按扩展错误码归类，
// 其余底层错误保留原始描述
// ==========================================

use rusqlite::ffi;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 路径上某一级不存在；id 为该级名称
    #[error("{entity} 不存在: {id}")]
    NotFound { entity: String, id: String },

    #[error("同一上级下已有{entity}: {name}")]
    Duplicate { entity: String, name: String },

    #[error("{entity} {name} 下仍挂有 {count} 个{child}")]
    HasChildren {
        entity: String,
        name: String,
        child: String,
        count: i64,
    },

    /// 库内唯一约束兜底（正常流程在写入前已查重）
    #[error("名称冲突: {0}")]
    NameConflict(String),

    /// 外键约束兜底：上级已被删除
    #[error("上级记录缺失: {0}")]
    MissingParent(String),

    #[error("写入未生效: {0}")]
    WriteNotApplied(String),

    #[error("SQLite: {0}")]
    Sqlite(String),

    #[error("分类数据无效: {0}")]
    ValidationError(String),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(code, ref msg) = err {
            let detail = msg.clone().unwrap_or_else(|| code.to_string());
            return match code.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    RepositoryError::NameConflict(detail)
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => RepositoryError::MissingParent(detail),
                _ => RepositoryError::Sqlite(detail),
            };
        }
        match err {
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "record".to_string(),
                id: String::new(),
            },
            other => RepositoryError::Sqlite(other.to_string()),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;
