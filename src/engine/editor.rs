// ==========================================
// 设备故障停机统计系统 - 事件表格编辑器
// ==========================================
// 职责: 维护可编辑的事件表格
// 编辑顺序（单次编辑事件）:
//   1. 写入文本  2. 校验（失败则清空单元格）
//   3. 级联清空下级列  4. 末行非空时追加一行空行
// 红线: 校验失败清空单元格，不回滚到旧值
// 红线: 表格始终以一行空行结尾
// ==========================================

use crate::domain::event::{ColumnRole, EventColumn, EventRecord, COLUMN_COUNT};
use crate::engine::cascade::TaxonomyCascade;
use crate::engine::validator::{canonical_text, CellValidator, ValidationFailure};
use crate::i18n::{t, t_with_args};
use thiserror::Error;
use tracing::{debug, warn};

/// 单次复制允许的最大单元格数
pub const MAX_COPY_CELLS: usize = 1000;

// ==========================================
// EditorError
// ==========================================
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    #[error("行号越界: row={row}, rows={rows}")]
    RowOutOfRange { row: usize, rows: usize },

    #[error("选区过大: {cells} 个单元格 (上限 {limit})")]
    SelectionTooLarge { cells: usize, limit: usize },

    #[error("不支持的剪贴板操作: {0}")]
    ClipboardRefused(ClipboardAction),
}

impl EditorError {
    /// 面向用户的提示文本
    pub fn user_message(&self) -> String {
        match self {
            EditorError::SelectionTooLarge { cells, .. } => {
                t_with_args("editor.copy_too_large", &[("cells", &cells.to_string())])
            }
            EditorError::ClipboardRefused(ClipboardAction::Paste) => {
                t("editor.paste_refused")
            }
            EditorError::ClipboardRefused(ClipboardAction::Undo) => {
                t("editor.undo_refused")
            }
            other => other.to_string(),
        }
    }
}

/// 被拦截的剪贴板 / 历史操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardAction {
    Paste,
    Undo,
}

impl std::fmt::Display for ClipboardAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClipboardAction::Paste => write!(f, "paste"),
            ClipboardAction::Undo => write!(f, "undo"),
        }
    }
}

// ==========================================
// EditOutcome - 单次编辑结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditOutcome {
    /// 校验失败原因（单元格已被清空）
    pub failure: Option<ValidationFailure>,
    /// 因级联被清空的下级列
    pub cleared: Vec<EventColumn>,
    /// 是否追加了新的空行
    pub row_appended: bool,
}

impl EditOutcome {
    pub fn accepted(&self) -> bool {
        self.failure.is_none()
    }
}

// ==========================================
// EventGrid - 事件表格
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventGrid {
    rows: Vec<Vec<String>>,
}

impl Default for EventGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl EventGrid {
    /// 仅含一行空行的新表格
    pub fn new() -> Self {
        Self {
            rows: vec![blank_row()],
        }
    }

    /// 由已加载的数据行构造（列数补齐到固定宽度，并保证末尾一行空行）
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        let mut rows: Vec<Vec<String>> = rows
            .into_iter()
            .map(|mut r| {
                r.resize(COLUMN_COUNT, String::new());
                r
            })
            .collect();
        if rows.last().map(|r| !is_blank(r)).unwrap_or(true) {
            rows.push(blank_row());
        }
        Self { rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn cell(&self, row: usize, column: EventColumn) -> Option<&str> {
        self.rows.get(row).map(|r| r[column.index()].as_str())
    }

    /// 表格是否没有任何非空单元格
    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|r| is_blank(r))
    }

    /// 非空行（保存 / 统计用）
    pub fn data_rows(&self) -> impl Iterator<Item = &Vec<String>> {
        self.rows.iter().filter(|r| !is_blank(r))
    }

    /// 非空行解析为事件记录
    pub fn records(&self) -> Vec<EventRecord> {
        self.data_rows().map(|r| EventRecord::from_cells(r)).collect()
    }

    /// 编辑单元格
    ///
    /// # 返回
    /// - Ok(EditOutcome): 校验结果、级联清空的列、是否追加空行
    /// - Err(RowOutOfRange): 行号越界
    pub fn edit_cell(
        &mut self,
        row: usize,
        column: EventColumn,
        value: &str,
        cascade: &TaxonomyCascade,
    ) -> Result<EditOutcome, EditorError> {
        let rows = self.rows.len();
        let cells = self.rows.get_mut(row).ok_or(EditorError::RowOutOfRange { row, rows })?;
        cells[column.index()] = value.trim().to_string();

        let mut outcome = EditOutcome::default();

        let validator = CellValidator::new(cascade);
        match validator.validate(column, value, cells) {
            // 存为加载后的同一写法，保存再加载文本不变
            Ok(()) => cells[column.index()] = canonical_text(column, value),
            Err(failure) => {
                debug!(row, column = column.header(), %failure, "单元格校验失败，已清空");
                cells[column.index()].clear();
                outcome.failure = Some(failure);
            }
        }

        for child in column.cascade_descendants() {
            cells[child.index()].clear();
            outcome.cleared.push(child);
        }

        if row == rows - 1 && !is_blank(&self.rows[row]) {
            self.rows.push(blank_row());
            outcome.row_appended = true;
        }

        Ok(outcome)
    }

    /// 某列已有的不同取值（保持首次出现顺序）
    pub fn distinct_values(&self, column: EventColumn) -> Vec<String> {
        let mut seen = Vec::new();
        for r in &self.rows {
            let v = r[column.index()].trim();
            if !v.is_empty() && !seen.iter().any(|s: &String| s == v) {
                seen.push(v.to_string());
            }
        }
        seen
    }

    /// 单元格输入建议
    ///
    /// - 枚举列 / 建议列: 固定列表
    /// - 级联列: 父列当前值的下级（区域列为全部区域）
    /// - 自由文本列: 本列已有的不同取值
    pub fn suggestions(&self, row: usize, column: EventColumn, cascade: &TaxonomyCascade) -> Vec<String> {
        match column.role() {
            ColumnRole::Choice(choices) | ColumnRole::Suggested(choices) => {
                choices.iter().map(|c| c.to_string()).collect()
            }
            ColumnRole::Cascade { level, parent } => {
                let parent_value = parent
                    .and_then(|p| self.cell(row, p))
                    .map(str::trim)
                    .filter(|p| !p.is_empty());
                cascade.options_for(level, parent_value).to_vec()
            }
            ColumnRole::FreeText(_) => self.distinct_values(column),
        }
    }

    /// 复制选中单元格为制表符分隔文本
    ///
    /// 单元格按 (行, 列) 排序；同行以 \t 连接，行间以 \n 连接
    pub fn copy_selection(&self, selection: &[(usize, EventColumn)]) -> Result<String, EditorError> {
        if selection.len() > MAX_COPY_CELLS {
            warn!(cells = selection.len(), limit = MAX_COPY_CELLS, "选区过大，拒绝复制");
            return Err(EditorError::SelectionTooLarge {
                cells: selection.len(),
                limit: MAX_COPY_CELLS,
            });
        }

        let mut cells: Vec<(usize, EventColumn)> = selection.to_vec();
        cells.sort();
        cells.dedup();

        let mut lines: Vec<Vec<&str>> = Vec::new();
        let mut current_row = None;
        for (row, column) in cells {
            let Some(text) = self.cell(row, column) else { continue };
            if current_row != Some(row) {
                lines.push(Vec::new());
                current_row = Some(row);
            }
            if let Some(line) = lines.last_mut() {
                line.push(text);
            }
        }

        Ok(lines
            .iter()
            .map(|l| l.join("\t"))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// 粘贴 / 撤销一律拒绝
    pub fn refuse(&self, action: ClipboardAction) -> EditorError {
        warn!(%action, "表格不支持该操作");
        EditorError::ClipboardRefused(action)
    }
}

fn blank_row() -> Vec<String> {
    vec![String::new(); COLUMN_COUNT]
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::CascadeRow;

    fn cascade() -> TaxonomyCascade {
        TaxonomyCascade::from_rows(vec![CascadeRow {
            area: "A1".to_string(),
            line: Some("L1".to_string()),
            machine: Some("M1".to_string()),
            problem: Some("P1".to_string()),
            action: Some("C1".to_string()),
        }])
    }

    #[test]
    fn test_new_grid_has_one_blank_row() {
        let grid = EventGrid::new();
        assert_eq!(grid.row_count(), 1);
        assert!(grid.is_empty());
    }

    #[test]
    fn test_from_rows_appends_trailing_blank() {
        let mut row = blank_row();
        row[0] = "1".to_string();
        let grid = EventGrid::from_rows(vec![row]);
        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.data_rows().count(), 1);
    }

    #[test]
    fn test_invalid_value_is_cleared() {
        let cascade = cascade();
        let mut grid = EventGrid::new();
        let outcome = grid
            .edit_cell(0, EventColumn::TotalTime, "12.5", &cascade)
            .expect("编辑失败");

        assert_eq!(outcome.failure, Some(ValidationFailure::InvalidTotalTime));
        assert_eq!(grid.cell(0, EventColumn::TotalTime), Some(""));
        assert!(!outcome.row_appended);
        assert_eq!(grid.row_count(), 1);
    }

    #[test]
    fn test_edit_line_clears_descendants() {
        let cascade = cascade();
        let mut grid = EventGrid::new();
        grid.edit_cell(0, EventColumn::Area, "A1", &cascade).expect("编辑失败");
        grid.edit_cell(0, EventColumn::Line, "L1", &cascade).expect("编辑失败");
        grid.edit_cell(0, EventColumn::Machine, "M1", &cascade).expect("编辑失败");
        grid.edit_cell(0, EventColumn::Problem, "P1", &cascade).expect("编辑失败");

        let outcome = grid.edit_cell(0, EventColumn::Line, "L1", &cascade).expect("编辑失败");
        assert_eq!(
            outcome.cleared,
            vec![EventColumn::Machine, EventColumn::Problem, EventColumn::CorrectiveAction]
        );
        assert_eq!(grid.cell(0, EventColumn::Machine), Some(""));
        assert_eq!(grid.cell(0, EventColumn::Line), Some("L1"));
    }

    #[test]
    fn test_suggestions_by_role() {
        let cascade = cascade();
        let mut grid = EventGrid::new();
        grid.edit_cell(0, EventColumn::Area, "A1", &cascade).expect("编辑失败");
        grid.edit_cell(0, EventColumn::Incharge, "Ravi", &cascade).expect("编辑失败");

        assert_eq!(grid.suggestions(0, EventColumn::StartMeridiem, &cascade), vec!["AM", "PM"]);
        assert_eq!(grid.suggestions(0, EventColumn::Status, &cascade), vec!["OK"]);
        assert_eq!(grid.suggestions(0, EventColumn::Line, &cascade), vec!["L1"]);
        assert!(grid.suggestions(0, EventColumn::Machine, &cascade).is_empty());
        assert_eq!(grid.suggestions(1, EventColumn::Incharge, &cascade), vec!["Ravi"]);
    }

    #[test]
    fn test_copy_selection() {
        let cascade = cascade();
        let mut grid = EventGrid::new();
        grid.edit_cell(0, EventColumn::Month, "3", &cascade).expect("编辑失败");
        grid.edit_cell(0, EventColumn::TotalTime, "45", &cascade).expect("编辑失败");
        grid.edit_cell(1, EventColumn::Month, "4", &cascade).expect("编辑失败");

        let text = grid
            .copy_selection(&[
                (1, EventColumn::Month),
                (0, EventColumn::TotalTime),
                (0, EventColumn::Month),
            ])
            .expect("复制失败");
        assert_eq!(text, "3\t45\n4");
    }

    #[test]
    fn test_copy_selection_limit() {
        let grid = EventGrid::new();
        let selection: Vec<(usize, EventColumn)> = (0..=MAX_COPY_CELLS).map(|r| (r, EventColumn::Month)).collect();
        assert!(matches!(
            grid.copy_selection(&selection),
            Err(EditorError::SelectionTooLarge { .. })
        ));
    }

    #[test]
    fn test_row_out_of_range() {
        let cascade = cascade();
        let mut grid = EventGrid::new();
        assert_eq!(
            grid.edit_cell(5, EventColumn::Month, "1", &cascade),
            Err(EditorError::RowOutOfRange { row: 5, rows: 1 })
        );
    }
}
