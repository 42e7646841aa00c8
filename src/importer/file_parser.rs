// ==========================================
// 设备故障停机统计系统 - 表格文件解析器
// ==========================================
// 支持: Excel (.xlsx/.xls) / CSV (.csv)
// 输出: RawSheet（保留原始列顺序与重复列名，单元格为去空白文本）
// 红线: Excel 工作簿只允许一个工作表
// ==========================================

use crate::domain::event::{format_number, DATE_FORMAT};
use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto, Data, DataType, Reader};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;

/// 原始表格: 表头 + 数据行（行长度与表头对齐）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

// ==========================================
// SheetParser Trait
// ==========================================
pub trait SheetParser {
    /// 解析文件为原始表格
    ///
    /// # 参数
    /// - file_path: 文件路径
    ///
    /// # 返回
    /// - Ok(RawSheet): 表头与数据行（完全空白的行已跳过）
    /// - Err: 文件不存在、格式错误、多工作表
    fn parse_sheet(&self, file_path: &Path) -> ImportResult<RawSheet>;
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

/// 行长度对齐到表头宽度
fn align_row(mut row: Vec<String>, width: usize) -> Vec<String> {
    row.resize(width, String::new());
    row
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl SheetParser for CsvParser {
    fn parse_sheet(&self, file_path: &Path) -> ImportResult<RawSheet> {
        ensure_exists(file_path)?;

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let row: Vec<String> = record.iter().map(|v| v.trim().to_string()).collect();

            // 跳过完全空白的行
            if row.iter().all(|v| v.is_empty()) {
                continue;
            }
            rows.push(align_row(row, headers.len()));
        }

        Ok(RawSheet { headers, rows })
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

/// Excel 单元格转文本
///
/// 整值浮点去掉小数部分（12.0 → "12"），日期统一为 DD-MM-YYYY
pub fn cell_to_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_number(*f),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_date()
            .map(|d| d.format(DATE_FORMAT).to_string())
            .unwrap_or_else(|| cell.to_string()),
        other => other.to_string().trim().to_string(),
    }
}

impl SheetParser for ExcelParser {
    fn parse_sheet(&self, file_path: &Path) -> ImportResult<RawSheet> {
        ensure_exists(file_path)?;

        let mut workbook = open_workbook_auto(file_path)?;
        let sheet_names = workbook.sheet_names();
        match sheet_names.len() {
            0 => return Err(ImportError::Workbook("Excel 文件无工作表".to_string())),
            1 => {}
            n => return Err(ImportError::MultipleSheets(n)),
        }

        let range = workbook.worksheet_range(&sheet_names[0])?;
        let mut rows_iter = range.rows();
        let header_row = rows_iter
            .next()
            .ok_or_else(|| ImportError::Workbook("Excel 文件无表头".to_string()))?;
        let headers: Vec<String> = header_row.iter().map(cell_to_text).collect();

        let mut rows = Vec::new();
        for data_row in rows_iter {
            let row: Vec<String> = data_row.iter().map(cell_to_text).collect();
            if row.iter().all(|v| v.is_empty()) {
                continue;
            }
            rows.push(align_row(row, headers.len()));
        }

        Ok(RawSheet { headers, rows })
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<RawSheet> {
        let path = file_path.as_ref();
        match file_extension(path).as_str() {
            "csv" => CsvParser.parse_sheet(path),
            "xlsx" | "xls" | "xlsm" => ExcelParser.parse_sheet(path),
            ext => Err(ImportError::UnsupportedFormat(ext.to_string())),
        }
    }
}

/// 小写扩展名（无扩展名为空串）
pub fn file_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}
