// ==========================================
// 设备故障停机统计系统 - 基础类型定义
// ==========================================
// 职责: 分类层级、上下午标记、统计期间等枚举
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// TaxonomyLevel - 分类层级
// ==========================================
// 顺序: 区域 → 产线 → 设备 → 故障 → 纠正措施
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaxonomyLevel {
    Area,
    Line,
    Machine,
    Problem,
    CorrectiveAction,
}

impl TaxonomyLevel {
    /// 父级（区域无父级）
    pub fn parent(&self) -> Option<TaxonomyLevel> {
        match self {
            TaxonomyLevel::Area => None,
            TaxonomyLevel::Line => Some(TaxonomyLevel::Area),
            TaxonomyLevel::Machine => Some(TaxonomyLevel::Line),
            TaxonomyLevel::Problem => Some(TaxonomyLevel::Machine),
            TaxonomyLevel::CorrectiveAction => Some(TaxonomyLevel::Problem),
        }
    }

    /// 直接子级（纠正措施无子级）
    pub fn child(&self) -> Option<TaxonomyLevel> {
        match self {
            TaxonomyLevel::Area => Some(TaxonomyLevel::Line),
            TaxonomyLevel::Line => Some(TaxonomyLevel::Machine),
            TaxonomyLevel::Machine => Some(TaxonomyLevel::Problem),
            TaxonomyLevel::Problem => Some(TaxonomyLevel::CorrectiveAction),
            TaxonomyLevel::CorrectiveAction => None,
        }
    }

    /// 数据库表名
    pub fn table_name(&self) -> &'static str {
        match self {
            TaxonomyLevel::Area => "AREA",
            TaxonomyLevel::Line => "LINE",
            TaxonomyLevel::Machine => "MACHINE",
            TaxonomyLevel::Problem => "PROBLEM",
            TaxonomyLevel::CorrectiveAction => "CACTION",
        }
    }

    /// 展示名称
    pub fn label(&self) -> &'static str {
        match self {
            TaxonomyLevel::Area => "Area",
            TaxonomyLevel::Line => "Line",
            TaxonomyLevel::Machine => "Machine",
            TaxonomyLevel::Problem => "Problem",
            TaxonomyLevel::CorrectiveAction => "Corrective action",
        }
    }
}

impl fmt::Display for TaxonomyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ==========================================
// Meridiem - 上午/下午
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Meridiem {
    AM,
    PM,
}

impl Meridiem {
    /// 可选值（用于下拉建议）
    pub const CHOICES: &'static [&'static str] = &["AM", "PM"];

    /// 宽松解析（忽略大小写和首尾空白）
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AM" => Some(Meridiem::AM),
            "PM" => Some(Meridiem::PM),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Meridiem::AM => "AM",
            Meridiem::PM => "PM",
        }
    }
}

// ==========================================
// ReportPeriod - 统计期间
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportPeriod {
    /// 单个自然月 (1..=12)
    Month(u32),
    /// 数据中出现的全部月份
    AllMonths,
}

impl ReportPeriod {
    /// 按月份名称或数字解析（"January" / "jan" / "1"）
    pub fn parse(s: &str) -> Option<Self> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Some(ReportPeriod::AllMonths);
        }
        if let Ok(n) = trimmed.parse::<u32>() {
            return (1..=12).contains(&n).then_some(ReportPeriod::Month(n));
        }
        let lower = trimmed.to_ascii_lowercase();
        MONTH_NAMES
            .iter()
            .position(|name| {
                let name = name.to_ascii_lowercase();
                name == lower || (lower.len() >= 3 && name.starts_with(&lower))
            })
            .map(|idx| ReportPeriod::Month(idx as u32 + 1))
    }

    /// 展示名称（用于表头 / 图表标题）
    pub fn label(&self) -> String {
        match self {
            ReportPeriod::Month(m) => month_name(*m).to_string(),
            ReportPeriod::AllMonths => "All Months".to_string(),
        }
    }
}

/// 月份英文名称
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// 月份名称（越界返回空串）
pub fn month_name(month: u32) -> &'static str {
    match month {
        1..=12 => MONTH_NAMES[month as usize - 1],
        _ => "",
    }
}
