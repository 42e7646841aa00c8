// ==========================================
// 设备故障停机统计系统 - 表格导入导出层
// ==========================================
// 职责: 事件表文件的加载、保存、新建
// 支持: Excel (.xlsx/.xls 读, .xlsx 写), CSV
// ==========================================

pub mod error;
pub mod event_sheet;
pub mod file_parser;

pub use error::{ImportError, ImportResult};
pub use event_sheet::{
    create_blank_sheet, load_event_sheet, normalize_sheet, parse_sheet_date, save_event_sheet,
    sheet_label,
};
pub use file_parser::{CsvParser, ExcelParser, RawSheet, SheetParser, UniversalFileParser};
