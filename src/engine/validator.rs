// ==========================================
// 设备故障停机统计系统 - 单元格校验器
// ==========================================
// 职责: 按列语义校验单元格文本
// 规则:
//   MONTH      整数 1..=12，且与 DATE 的月份一致
//   DATE       DD-MM-YYYY，且与 MONTH 一致
//   TOTAL TIME 非负整数（纯数字串）
//   TIME       数值（允许小数）
//   INCHARGE   仅字母
//   级联列     必须属于父列当前值的下级
// 约束: 空文本一律视为合法
// ==========================================

use crate::domain::event::{format_number, parse_minutes, ColumnRole, EventColumn, TextFormat, DATE_FORMAT};
use crate::domain::types::TaxonomyLevel;
use crate::engine::cascade::TaxonomyCascade;
use crate::i18n::{t, t_with_args};
use chrono::{Datelike, NaiveDate};
use std::fmt;

// ==========================================
// ValidationFailure - 校验失败原因
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    InvalidMonth,
    InvalidDate,
    MonthDateMismatch { month: u32, date_month: u32 },
    InvalidTotalTime,
    InvalidClockTime,
    InvalidIncharge,
    NotAChoice { choices: Vec<String> },
    NotInTaxonomy {
        level: TaxonomyLevel,
        parent: Option<String>,
    },
}

impl ValidationFailure {
    /// 面向用户的提示文本（经 i18n）
    pub fn message(&self) -> String {
        match self {
            ValidationFailure::InvalidMonth => t("editor.invalid_month"),
            ValidationFailure::InvalidDate => t("editor.invalid_date"),
            ValidationFailure::MonthDateMismatch { month, date_month } => t_with_args(
                "editor.month_date_mismatch",
                &[
                    ("month", &month.to_string()),
                    ("date_month", &date_month.to_string()),
                ],
            ),
            ValidationFailure::InvalidTotalTime => t("editor.invalid_total_time"),
            ValidationFailure::InvalidClockTime => t("editor.invalid_time"),
            ValidationFailure::InvalidIncharge => t("editor.invalid_incharge"),
            ValidationFailure::NotAChoice { choices } => {
                t_with_args("editor.not_a_choice", &[("choices", &choices.join(", "))])
            }
            ValidationFailure::NotInTaxonomy { level, parent } => match parent {
                Some(parent) => t_with_args(
                    "editor.not_in_taxonomy",
                    &[("level", level.label()), ("parent", parent)],
                ),
                None => t_with_args("editor.not_in_taxonomy_root", &[("level", level.label())]),
            },
        }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationFailure {}

// ==========================================
// 基础格式校验
// ==========================================

/// 月份: 纯数字且在 1..=12
pub fn parse_month(text: &str) -> Option<u32> {
    let text = text.trim();
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse::<u32>().ok().filter(|m| (1..=12).contains(m))
}

/// 日期: DD-MM-YYYY
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).ok()
}

/// 停机时长: 纯数字串，且不超过 u32 范围
pub fn is_whole_number(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) && text.parse::<u32>().is_ok()
}

/// 时刻: 有限浮点数
pub fn is_clock_number(text: &str) -> bool {
    text.trim().parse::<f64>().map(f64::is_finite).unwrap_or(false)
}

/// 负责人: 全部为字母
pub fn is_alphabetic(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty() && text.chars().all(char::is_alphabetic)
}

fn check_format(format: TextFormat, text: &str) -> Result<(), ValidationFailure> {
    let ok = match format {
        TextFormat::Month => parse_month(text).is_some(),
        TextFormat::Date => parse_date(text).is_some(),
        TextFormat::ClockTime => is_clock_number(text),
        TextFormat::Minutes => is_whole_number(text),
        TextFormat::Alphabetic => is_alphabetic(text),
    };
    if ok {
        return Ok(());
    }
    Err(match format {
        TextFormat::Month => ValidationFailure::InvalidMonth,
        TextFormat::Date => ValidationFailure::InvalidDate,
        TextFormat::ClockTime => ValidationFailure::InvalidClockTime,
        TextFormat::Minutes => ValidationFailure::InvalidTotalTime,
        TextFormat::Alphabetic => ValidationFailure::InvalidIncharge,
    })
}

/// MONTH 与 DATE 的一致性（任一为空或无法解析时不判定）
pub fn check_month_date(month_text: &str, date_text: &str) -> Result<(), ValidationFailure> {
    match (parse_month(month_text), parse_date(date_text)) {
        (Some(month), Some(date)) if date.month() != month => Err(ValidationFailure::MonthDateMismatch {
            month,
            date_month: date.month(),
        }),
        _ => Ok(()),
    }
}

/// 已通过校验的文本 → 与加载结果一致的写法
///
/// MONTH "03" → "3"，DATE "5-3-2024" → "05-03-2024"，TIME "10.30" → "10.3"，
/// TOTAL TIME "007" → "7"，AM/PM 取列表中的写法
pub fn canonical_text(column: EventColumn, value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        return String::new();
    }
    match column.role() {
        ColumnRole::FreeText(TextFormat::Month) => parse_month(value).map(|m| m.to_string()),
        ColumnRole::FreeText(TextFormat::Date) => parse_date(value).map(|d| d.format(DATE_FORMAT).to_string()),
        ColumnRole::FreeText(TextFormat::ClockTime) => value.parse::<f64>().ok().map(format_number),
        ColumnRole::FreeText(TextFormat::Minutes) => Some(parse_minutes(value).to_string()),
        ColumnRole::Choice(choices) => choices
            .iter()
            .find(|c| c.eq_ignore_ascii_case(value))
            .map(|c| c.to_string()),
        _ => None,
    }
    .unwrap_or_else(|| value.to_string())
}

// ==========================================
// CellValidator - 单元格校验器
// ==========================================
pub struct CellValidator<'a> {
    cascade: &'a TaxonomyCascade,
}

impl<'a> CellValidator<'a> {
    pub fn new(cascade: &'a TaxonomyCascade) -> Self {
        Self { cascade }
    }

    /// 校验一行中某个单元格的新值
    ///
    /// # 参数
    /// - column: 被编辑的列
    /// - value: 新文本
    /// - row: 该行当前各列文本（按固定列顺序，用于取父列 / 关联列）
    pub fn validate(&self, column: EventColumn, value: &str, row: &[String]) -> Result<(), ValidationFailure> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(());
        }
        let cell = |col: EventColumn| row.get(col.index()).map(String::as_str).unwrap_or("");

        match column.role() {
            ColumnRole::FreeText(format) => {
                check_format(format, value)?;
                match column {
                    EventColumn::Month => check_month_date(value, cell(EventColumn::Date)),
                    EventColumn::Date => check_month_date(cell(EventColumn::Month), value),
                    _ => Ok(()),
                }
            }
            ColumnRole::Choice(choices) => {
                if choices.iter().any(|c| c.eq_ignore_ascii_case(value)) {
                    Ok(())
                } else {
                    Err(ValidationFailure::NotAChoice {
                        choices: choices.iter().map(|c| c.to_string()).collect(),
                    })
                }
            }
            ColumnRole::Suggested(_) => Ok(()),
            ColumnRole::Cascade { level, parent } => {
                let parent_value = parent.map(|p| cell(p).trim()).filter(|p| !p.is_empty());
                if self.cascade.contains(level, parent_value, value) {
                    Ok(())
                } else {
                    Err(ValidationFailure::NotInTaxonomy {
                        level,
                        parent: parent_value.map(String::from),
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::COLUMN_COUNT;
    use crate::repository::CascadeRow;

    fn cascade() -> TaxonomyCascade {
        TaxonomyCascade::from_rows(vec![CascadeRow {
            area: "A1".to_string(),
            line: Some("L1".to_string()),
            machine: Some("M1".to_string()),
            problem: None,
            action: None,
        }])
    }

    fn empty_row() -> Vec<String> {
        vec![String::new(); COLUMN_COUNT]
    }

    #[test]
    fn test_basic_formats() {
        assert_eq!(parse_month("12"), Some(12));
        assert_eq!(parse_month("13"), None);
        assert_eq!(parse_month("-1"), None);
        assert!(parse_date("31-01-2024").is_some());
        assert!(parse_date("2024-01-31").is_none());
        assert!(is_whole_number("120"));
        assert!(!is_whole_number("12.5"));
        assert!(!is_whole_number("-3"));
        assert!(!is_whole_number("99999999999999999999"));
        assert!(is_clock_number("10.30"));
        assert!(!is_clock_number("ten"));
        assert!(is_alphabetic("Ravi"));
        assert!(!is_alphabetic("Ravi K"));
    }

    #[test]
    fn test_canonical_text_matches_loaded_form() {
        assert_eq!(canonical_text(EventColumn::Month, "03"), "3");
        assert_eq!(canonical_text(EventColumn::Date, "5-3-2024"), "05-03-2024");
        assert_eq!(canonical_text(EventColumn::StartTime, "10.30"), "10.3");
        assert_eq!(canonical_text(EventColumn::EndTime, "11.0"), "11");
        assert_eq!(canonical_text(EventColumn::TotalTime, "007"), "7");
        assert_eq!(canonical_text(EventColumn::StartMeridiem, "pm"), "PM");
        assert_eq!(canonical_text(EventColumn::Incharge, " Ravi "), "Ravi");
    }

    #[test]
    fn test_oversized_total_time_rejected() {
        let validator_cascade = cascade();
        let validator = CellValidator::new(&validator_cascade);
        assert_eq!(
            validator.validate(EventColumn::TotalTime, "99999999999999999999", &empty_row()),
            Err(ValidationFailure::InvalidTotalTime)
        );
    }

    #[test]
    fn test_empty_value_always_valid() {
        let cascade = cascade();
        let validator = CellValidator::new(&cascade);
        for col in EventColumn::ALL {
            assert!(validator.validate(col, "  ", &empty_row()).is_ok());
        }
    }

    #[test]
    fn test_month_date_consistency() {
        let cascade = cascade();
        let validator = CellValidator::new(&cascade);
        let mut row = empty_row();
        row[EventColumn::Date.index()] = "15-03-2024".to_string();

        assert!(validator.validate(EventColumn::Month, "3", &row).is_ok());
        assert_eq!(
            validator.validate(EventColumn::Month, "4", &row),
            Err(ValidationFailure::MonthDateMismatch { month: 4, date_month: 3 })
        );

        row[EventColumn::Month.index()] = "5".to_string();
        assert!(validator.validate(EventColumn::Date, "01-06-2024", &row).is_err());
    }

    #[test]
    fn test_cascade_membership() {
        let cascade = cascade();
        let validator = CellValidator::new(&cascade);
        let mut row = empty_row();

        assert!(validator.validate(EventColumn::Area, "A1", &row).is_ok());
        assert!(validator.validate(EventColumn::Area, "A9", &row).is_err());

        row[EventColumn::Area.index()] = "A1".to_string();
        assert!(validator.validate(EventColumn::Line, "L1", &row).is_ok());
        assert!(matches!(
            validator.validate(EventColumn::Machine, "M1", &row),
            Err(ValidationFailure::NotInTaxonomy { level: TaxonomyLevel::Machine, parent: None })
        ));
    }

    #[test]
    fn test_meridiem_choice_and_status_free() {
        let cascade = cascade();
        let validator = CellValidator::new(&cascade);
        let row = empty_row();

        assert!(validator.validate(EventColumn::StartMeridiem, "pm", &row).is_ok());
        assert!(validator.validate(EventColumn::EndMeridiem, "noon", &row).is_err());
        assert!(validator.validate(EventColumn::Status, "PENDING", &row).is_ok());
    }
}
