// ==========================================
// 设备故障停机统计系统 - 表格导入导出错误类型
// ==========================================
// 表头问题整表拒绝，单元格问题带行号（从 1 起）
// 用户提示: user_message() 走 i18n 文案
// ==========================================

use crate::i18n::{t, t_with_args};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件 =====
    #[error("找不到表格文件: {0}")]
    FileNotFound(String),

    /// 扩展名（小写，不含点）
    #[error("不是表格文件 (.{0})，请使用 .xlsx / .xls / .csv")]
    UnsupportedFormat(String),

    #[error("读写表格文件出错: {0}")]
    Io(String),

    #[error("无法读取工作簿: {0}")]
    Workbook(String),

    #[error("无法读取 CSV: {0}")]
    Csv(String),

    #[error("无法写出表格: {0}")]
    WriteError(String),

    // ===== 表头 =====
    #[error("工作簿包含 {0} 个工作表，只允许 1 个")]
    MultipleSheets(usize),

    #[error("缺少必需列: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("列名重复: {}", .0.join(", "))]
    DuplicateColumns(Vec<String>),

    #[error("存在未知列: {}", .0.join(", "))]
    UnexpectedColumns(Vec<String>),

    // ===== 单元格 =====
    #[error("日期格式错误 (行 {row}): 期望 DD-MM-YYYY，实际 {value}")]
    DateFormatError { row: usize, value: String },

    #[error("月份无效 (行 {})", join_rows(.0))]
    InvalidMonth(Vec<usize>),

    #[error("月份与日期不一致 (行 {})", join_rows(.0))]
    MonthDateMismatch(Vec<usize>),

    #[error("表格为空，无需保存")]
    EmptyTable,
}

fn join_rows(rows: &[usize]) -> String {
    rows.iter().map(|r| r.to_string()).collect::<Vec<_>>().join(", ")
}

impl ImportError {
    /// 面向用户的提示文案
    pub fn user_message(&self) -> String {
        match self {
            ImportError::MultipleSheets(count) => {
                t_with_args("import.multiple_sheets", &[("count", &count.to_string())])
            }
            ImportError::MissingColumns(cols) => {
                t_with_args("import.missing_columns", &[("columns", &cols.join(", "))])
            }
            ImportError::DuplicateColumns(cols) => {
                t_with_args("import.duplicate_columns", &[("columns", &cols.join(", "))])
            }
            ImportError::UnexpectedColumns(cols) => {
                t_with_args("import.unexpected_columns", &[("columns", &cols.join(", "))])
            }
            ImportError::InvalidMonth(rows) => {
                t_with_args("import.invalid_month", &[("rows", &join_rows(rows))])
            }
            ImportError::MonthDateMismatch(rows) => {
                t_with_args("import.month_date_mismatch", &[("rows", &join_rows(rows))])
            }
            ImportError::DateFormatError { row, value } => t_with_args(
                "import.invalid_date",
                &[("row", &row.to_string()), ("value", value)],
            ),
            ImportError::EmptyTable => t("import.empty_table"),
            ImportError::UnsupportedFormat(ext) => {
                t_with_args("import.unsupported_format", &[("ext", ext)])
            }
            other => other.to_string(),
        }
    }
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::Io(err.to_string())
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::Csv(err.to_string())
    }
}

impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::Workbook(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for ImportError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        ImportError::WriteError(err.to_string())
    }
}

pub type ImportResult<T> = Result<T, ImportError>;
