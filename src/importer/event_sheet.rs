// ==========================================
// 设备故障停机统计系统 - 事件表加载 / 保存 / 新建
// ==========================================
// 加载流程:
//   1. 解析文件（单工作表）
//   2. 表头规范化（去空白、大写；第二个 AM/PM 或 "AM/PM.1" 视为结束时间的 AM/PM）
//   3. 校验: 缺列 → 重复列 → 未知列
//   4. 按固定列顺序重排，逐行类型转换:
//      DATE → DD-MM-YYYY；TIME / CLOSING TIME → 数值（非法为 0）；
//      TOTAL TIME → 整数（缺失 / 非法为 0）
//   5. MONTH 必须为 1..=12 且与 DATE 的月份一致
// 红线: 任何一步失败都不产生表格，调用方保留原状态
// ==========================================

use crate::domain::event::{format_number, parse_minutes, standard_headers, EventColumn, COLUMN_COUNT, DATE_FORMAT};
use crate::engine::editor::EventGrid;
use crate::engine::validator::parse_month;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{file_extension, RawSheet, UniversalFileParser};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rust_xlsxwriter::Workbook;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, instrument, warn};

/// pandas 对重复列名的重命名形式
const SECOND_MERIDIEM_ALIAS: &str = "AM/PM.1";

/// 可接受的日期写法（统一转为 DD-MM-YYYY）
const ACCEPTED_DATE_FORMATS: &[&str] = &[DATE_FORMAT, "%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d.%m.%Y"];

/// 数值列（Excel 中按数字写出）
const NUMERIC_COLUMNS: [EventColumn; 4] = [
    EventColumn::Month,
    EventColumn::StartTime,
    EventColumn::EndTime,
    EventColumn::TotalTime,
];

// ==========================================
// 加载
// ==========================================

/// 加载事件表文件为表格
///
/// # 参数
/// - path: .xlsx / .xls / .csv 文件
///
/// # 返回
/// - Ok(EventGrid): 规范化后的表格（末尾带一行空行）
/// - Err(ImportError): 文件 / 表结构 / 数据错误
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_event_sheet<P: AsRef<Path>>(path: P) -> ImportResult<EventGrid> {
    let raw = UniversalFileParser.parse(path.as_ref())?;
    let rows = normalize_sheet(&raw)?;
    info!(rows = rows.len(), "事件表加载完成");
    Ok(EventGrid::from_rows(rows))
}

/// 原始表格 → 按固定列顺序排列并完成类型转换的行
pub fn normalize_sheet(raw: &RawSheet) -> ImportResult<Vec<Vec<String>>> {
    let mapping = map_headers(&raw.headers)?;

    let mut rows = Vec::with_capacity(raw.rows.len());
    let mut invalid_months = Vec::new();
    let mut mismatched = Vec::new();

    for (idx, raw_row) in raw.rows.iter().enumerate() {
        let row_no = idx + 1;
        let mut cells = vec![String::new(); COLUMN_COUNT];
        for (raw_idx, column) in mapping.iter().enumerate() {
            if let (Some(column), Some(value)) = (column, raw_row.get(raw_idx)) {
                cells[column.index()] = value.trim().to_string();
            }
        }
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }

        coerce_row(&mut cells, row_no)?;

        let month_text = &cells[EventColumn::Month.index()];
        if !month_text.is_empty() {
            match parse_month(month_text) {
                Some(month) => {
                    cells[EventColumn::Month.index()] = month.to_string();
                    let date = NaiveDate::parse_from_str(&cells[EventColumn::Date.index()], DATE_FORMAT).ok();
                    if date.is_some_and(|d| d.month() != month) {
                        mismatched.push(row_no);
                    }
                }
                None => invalid_months.push(row_no),
            }
        }
        rows.push(cells);
    }

    if !invalid_months.is_empty() {
        warn!(rows = ?invalid_months, "月份无效，加载中止");
        return Err(ImportError::InvalidMonth(invalid_months));
    }
    if !mismatched.is_empty() {
        warn!(rows = ?mismatched, "月份与日期不一致，加载中止");
        return Err(ImportError::MonthDateMismatch(mismatched));
    }
    Ok(rows)
}

/// 表头 → 每个原始列对应的事件列（空表头的列忽略）
fn map_headers(headers: &[String]) -> ImportResult<Vec<Option<EventColumn>>> {
    let mut mapping = Vec::with_capacity(headers.len());
    let mut seen: HashSet<EventColumn> = HashSet::new();
    let mut duplicates = Vec::new();
    let mut unexpected = Vec::new();

    for header in headers {
        let name = header.trim().to_uppercase();
        if name.is_empty() {
            mapping.push(None);
            continue;
        }

        let column = if name == EventColumn::StartMeridiem.header() {
            if seen.contains(&EventColumn::StartMeridiem) {
                Some(EventColumn::EndMeridiem)
            } else {
                Some(EventColumn::StartMeridiem)
            }
        } else if name == SECOND_MERIDIEM_ALIAS {
            Some(EventColumn::EndMeridiem)
        } else {
            EventColumn::ALL.iter().copied().find(|c| c.header() == name)
        };

        match column {
            Some(c) if !seen.insert(c) => {
                duplicates.push(name);
                mapping.push(None);
            }
            Some(c) => mapping.push(Some(c)),
            None => {
                unexpected.push(header.trim().to_string());
                mapping.push(None);
            }
        }
    }

    let mut missing: Vec<String> = Vec::new();
    for column in EventColumn::ALL {
        let header = column.header().to_string();
        if !seen.contains(&column) && !missing.contains(&header) {
            missing.push(header);
        }
    }

    if !missing.is_empty() {
        return Err(ImportError::MissingColumns(missing));
    }
    if !duplicates.is_empty() {
        return Err(ImportError::DuplicateColumns(duplicates));
    }
    if !unexpected.is_empty() {
        return Err(ImportError::UnexpectedColumns(unexpected));
    }
    Ok(mapping)
}

/// 单行类型转换
fn coerce_row(cells: &mut [String], row_no: usize) -> ImportResult<()> {
    let date_idx = EventColumn::Date.index();
    if !cells[date_idx].is_empty() {
        let date = parse_sheet_date(&cells[date_idx]).ok_or_else(|| ImportError::DateFormatError {
            row: row_no,
            value: cells[date_idx].clone(),
        })?;
        cells[date_idx] = date.format(DATE_FORMAT).to_string();
    }

    for column in [EventColumn::StartTime, EventColumn::EndTime] {
        let cell = &mut cells[column.index()];
        if !cell.is_empty() {
            *cell = match cell.parse::<f64>() {
                Ok(v) if v.is_finite() => format_number(v),
                _ => "0".to_string(),
            };
        }
    }

    let total = &mut cells[EventColumn::TotalTime.index()];
    *total = parse_minutes(total).to_string();
    Ok(())
}

/// 按可接受写法解析日期（允许带时间部分）
pub fn parse_sheet_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    ACCEPTED_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

// ==========================================
// 保存
// ==========================================

/// 保存表格（只写非空行）
///
/// # 返回
/// - Ok(usize): 写出的数据行数
/// - Err(EmptyTable): 表格没有任何内容
#[instrument(skip_all, fields(path = %path.display()))]
pub fn save_event_sheet(grid: &EventGrid, path: &Path) -> ImportResult<usize> {
    if grid.is_empty() {
        warn!("表格为空，取消保存");
        return Err(ImportError::EmptyTable);
    }
    let rows: Vec<&Vec<String>> = grid.data_rows().collect();
    write_rows(path, &rows)?;
    info!(rows = rows.len(), "事件表已保存");
    Ok(rows.len())
}

/// 新建空事件表文件（标准表头 + 一行空行），返回对应的空表格
#[instrument(skip_all, fields(path = %path.display()))]
pub fn create_blank_sheet(path: &Path) -> ImportResult<EventGrid> {
    let blank = vec![String::new(); COLUMN_COUNT];
    write_rows(path, &[&blank])?;
    info!("已新建空事件表");
    Ok(EventGrid::new())
}

fn write_rows(path: &Path, rows: &[&Vec<String>]) -> ImportResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    match file_extension(path).as_str() {
        "csv" => write_csv(path, rows),
        "xlsx" => write_xlsx(path, rows),
        ext => Err(ImportError::UnsupportedFormat(ext.to_string())),
    }
}

fn write_csv(path: &Path, rows: &[&Vec<String>]) -> ImportResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(standard_headers())?;
    for row in rows {
        writer.write_record(row.iter())?;
    }
    writer.flush()?;
    Ok(())
}

fn write_xlsx(path: &Path, rows: &[&Vec<String>]) -> ImportResult<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col, header) in standard_headers().into_iter().enumerate() {
        worksheet.write_string(0, col as u16, header)?;
    }
    for (r, row) in rows.iter().enumerate() {
        let excel_row = (r + 1) as u32;
        for column in EventColumn::ALL {
            let value = row.get(column.index()).map(String::as_str).unwrap_or("");
            if value.is_empty() {
                continue;
            }
            let col = column.index() as u16;
            match value.parse::<f64>() {
                Ok(n) if NUMERIC_COLUMNS.contains(&column) && n.is_finite() => {
                    worksheet.write_number(excel_row, col, n)?;
                }
                _ => {
                    worksheet.write_string(excel_row, col, value)?;
                }
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}

/// 事件表展示名（文件名去扩展名），用于统计表头
pub fn sheet_label(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}
