// ==========================================
// 设备故障停机统计系统 - 故障事件领域模型
// ==========================================
// 表格固定 14 列:
// MONTH, DATE, TIME, AM/PM, CLOSING TIME, AM/PM, TOTAL TIME, AREA,
// LINE, MACHINE, PROBLEM, STATUS, INCHARGE, CORRECTIVE ACTION
// ==========================================

use crate::domain::types::{Meridiem, TaxonomyLevel};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// 日期文本格式 DD-MM-YYYY
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// 状态列建议值
pub const STATUS_CHOICES: &[&str] = &["OK"];

// ==========================================
// EventColumn - 事件表列
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventColumn {
    Month,
    Date,
    StartTime,
    StartMeridiem,
    EndTime,
    EndMeridiem,
    TotalTime,
    Area,
    Line,
    Machine,
    Problem,
    Status,
    Incharge,
    CorrectiveAction,
}

/// 列数
pub const COLUMN_COUNT: usize = 14;

impl EventColumn {
    /// 固定列顺序
    pub const ALL: [EventColumn; COLUMN_COUNT] = [
        EventColumn::Month,
        EventColumn::Date,
        EventColumn::StartTime,
        EventColumn::StartMeridiem,
        EventColumn::EndTime,
        EventColumn::EndMeridiem,
        EventColumn::TotalTime,
        EventColumn::Area,
        EventColumn::Line,
        EventColumn::Machine,
        EventColumn::Problem,
        EventColumn::Status,
        EventColumn::Incharge,
        EventColumn::CorrectiveAction,
    ];

    /// 列下标
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }

    /// 表头文本（两个 AM/PM 列表头相同，按位置区分）
    pub fn header(&self) -> &'static str {
        match self {
            EventColumn::Month => "MONTH",
            EventColumn::Date => "DATE",
            EventColumn::StartTime => "TIME",
            EventColumn::StartMeridiem => "AM/PM",
            EventColumn::EndTime => "CLOSING TIME",
            EventColumn::EndMeridiem => "AM/PM",
            EventColumn::TotalTime => "TOTAL TIME",
            EventColumn::Area => "AREA",
            EventColumn::Line => "LINE",
            EventColumn::Machine => "MACHINE",
            EventColumn::Problem => "PROBLEM",
            EventColumn::Status => "STATUS",
            EventColumn::Incharge => "INCHARGE",
            EventColumn::CorrectiveAction => "CORRECTIVE ACTION",
        }
    }

    /// 列的语义角色
    pub fn role(&self) -> ColumnRole {
        match self {
            EventColumn::Month => ColumnRole::FreeText(TextFormat::Month),
            EventColumn::Date => ColumnRole::FreeText(TextFormat::Date),
            EventColumn::StartTime | EventColumn::EndTime => ColumnRole::FreeText(TextFormat::ClockTime),
            EventColumn::StartMeridiem | EventColumn::EndMeridiem => ColumnRole::Choice(Meridiem::CHOICES),
            EventColumn::TotalTime => ColumnRole::FreeText(TextFormat::Minutes),
            EventColumn::Area => ColumnRole::Cascade {
                level: TaxonomyLevel::Area,
                parent: None,
            },
            EventColumn::Line => ColumnRole::Cascade {
                level: TaxonomyLevel::Line,
                parent: Some(EventColumn::Area),
            },
            EventColumn::Machine => ColumnRole::Cascade {
                level: TaxonomyLevel::Machine,
                parent: Some(EventColumn::Line),
            },
            EventColumn::Problem => ColumnRole::Cascade {
                level: TaxonomyLevel::Problem,
                parent: Some(EventColumn::Machine),
            },
            EventColumn::Status => ColumnRole::Suggested(STATUS_CHOICES),
            EventColumn::Incharge => ColumnRole::FreeText(TextFormat::Alphabetic),
            EventColumn::CorrectiveAction => ColumnRole::Cascade {
                level: TaxonomyLevel::CorrectiveAction,
                parent: Some(EventColumn::Problem),
            },
        }
    }

    /// 级联子列：修改本列后必须清空的下一列
    pub fn cascade_child(&self) -> Option<EventColumn> {
        match self {
            EventColumn::Area => Some(EventColumn::Line),
            EventColumn::Line => Some(EventColumn::Machine),
            EventColumn::Machine => Some(EventColumn::Problem),
            EventColumn::Problem => Some(EventColumn::CorrectiveAction),
            _ => None,
        }
    }

    /// 级联后代（逐级传递）
    pub fn cascade_descendants(&self) -> Vec<EventColumn> {
        let mut out = Vec::new();
        let mut current = self.cascade_child();
        while let Some(col) = current {
            out.push(col);
            current = col.cascade_child();
        }
        out
    }
}

/// 标准表头列表
pub fn standard_headers() -> Vec<&'static str> {
    EventColumn::ALL.iter().map(|c| c.header()).collect()
}

// ==========================================
// ColumnRole - 列语义角色
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    /// 自由文本（按格式校验，建议值取本列已有值）
    FreeText(TextFormat),
    /// 枚举选择（必须取自列表）
    Choice(&'static [&'static str]),
    /// 自由文本，但给出固定建议值
    Suggested(&'static [&'static str]),
    /// 级联选择：取值范围由父列当前值决定
    Cascade {
        level: TaxonomyLevel,
        parent: Option<EventColumn>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    Month,
    Date,
    ClockTime,
    Minutes,
    Alphabetic,
}

// ==========================================
// EventRecord - 类型化的事件行
// ==========================================
/// 从表格行解析出的事件（统计引擎输入）
///
/// 无法解析的数值按 0 / None 处理，统计不因单行脏数据中断
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub month: Option<u32>,
    pub date: Option<NaiveDate>,
    pub start_time: Option<f64>,
    pub start_meridiem: Option<Meridiem>,
    pub end_time: Option<f64>,
    pub end_meridiem: Option<Meridiem>,
    pub total_minutes: i64,
    pub area: String,
    pub line: String,
    pub machine: String,
    pub problem: String,
    pub status: String,
    pub incharge: String,
    pub corrective_action: String,
}

impl EventRecord {
    /// 从按固定列顺序排列的单元格文本构造
    pub fn from_cells(cells: &[String]) -> Self {
        let get = |col: EventColumn| -> &str {
            cells.get(col.index()).map(|s| s.trim()).unwrap_or("")
        };

        let date = NaiveDate::parse_from_str(get(EventColumn::Date), DATE_FORMAT).ok();
        let month = get(EventColumn::Month)
            .parse::<u32>()
            .ok()
            .filter(|m| (1..=12).contains(m))
            .or_else(|| date.map(|d| d.month()));

        Self {
            month,
            date,
            start_time: get(EventColumn::StartTime).parse().ok(),
            start_meridiem: Meridiem::parse(get(EventColumn::StartMeridiem)),
            end_time: get(EventColumn::EndTime).parse().ok(),
            end_meridiem: Meridiem::parse(get(EventColumn::EndMeridiem)),
            total_minutes: parse_minutes(get(EventColumn::TotalTime)),
            area: get(EventColumn::Area).to_string(),
            line: get(EventColumn::Line).to_string(),
            machine: get(EventColumn::Machine).to_string(),
            problem: get(EventColumn::Problem).to_string(),
            status: get(EventColumn::Status).to_string(),
            incharge: get(EventColumn::Incharge).to_string(),
            corrective_action: get(EventColumn::CorrectiveAction).to_string(),
        }
    }

    /// 停机时长 > 0 才计为一次故障
    pub fn is_occurrence(&self) -> bool {
        self.total_minutes > 0
    }
}

/// 停机分钟上限（单条记录）
pub const MAX_MINUTES: i64 = u32::MAX as i64;

/// 解析停机分钟（整数或浮点取整；非法 → 0；截断到 0..=MAX_MINUTES）
pub fn parse_minutes(text: &str) -> i64 {
    let text = text.trim();
    let minutes = match text.parse::<i64>() {
        Ok(v) => v,
        Err(_) => match text.parse::<f64>() {
            Ok(v) if v.is_finite() => v.trunc().clamp(0.0, MAX_MINUTES as f64) as i64,
            _ => 0,
        },
    };
    minutes.clamp(0, MAX_MINUTES)
}

/// 数值转文本（整值不带小数）
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
