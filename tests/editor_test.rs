// ==========================================
// 表格编辑集成测试
// ==========================================
// 测试目标: 自动追加空行、级联清空、校验失败清空、建议列表、复制
// ==========================================


use plant_downtime::domain::EventColumn;
use plant_downtime::engine::{
    ClipboardAction, EditorError, EventGrid, TaxonomyCascade, ValidationFailure, MAX_COPY_CELLS,
};
use test_helpers::{create_test_db, downtime_row, seed_small_plant};

fn cascade() -> (tempfile::TempDir, TaxonomyCascade) {
    let (dir, db_path) = create_test_db();
    let repo = seed_small_plant(&db_path);
    let cascade = TaxonomyCascade::load(&repo).expect("构建级联失败");
    (dir, cascade)
}

#[test]
fn test_last_row_grows_by_exactly_one() {
    let (_dir, cascade) = cascade();
    let mut grid = EventGrid::new();

    let outcome = grid.edit_cell(0, EventColumn::Month, "3", &cascade).expect("编辑失败");
    assert!(outcome.accepted());
    assert!(outcome.row_appended);
    assert_eq!(grid.row_count(), 2);

    // 同一行继续编辑不再追加
    let outcome = grid.edit_cell(0, EventColumn::Date, "15-03-2024", &cascade).expect("编辑失败");
    assert!(!outcome.row_appended);
    assert_eq!(grid.row_count(), 2);

    // 编辑新的末行再追加一行
    grid.edit_cell(1, EventColumn::Month, "4", &cascade).expect("编辑失败");
    assert_eq!(grid.row_count(), 3);
}

#[test]
fn test_area_edit_clears_descendants() {
    let (_dir, cascade) = cascade();
    let mut grid = EventGrid::from_rows(vec![downtime_row(
        "3",
        "15-03-2024",
        "45",
        "A1",
        "L1",
        "Press",
        "Jam",
    )]);

    let outcome = grid.edit_cell(0, EventColumn::Area, "A2", &cascade).expect("编辑失败");
    assert!(outcome.accepted());
    assert_eq!(
        outcome.cleared,
        vec![
            EventColumn::Line,
            EventColumn::Machine,
            EventColumn::Problem,
            EventColumn::CorrectiveAction
        ]
    );
    assert_eq!(grid.cell(0, EventColumn::Area), Some("A2"));
    assert_eq!(grid.cell(0, EventColumn::Line), Some(""));
    assert_eq!(grid.cell(0, EventColumn::Machine), Some(""));
    assert_eq!(grid.cell(0, EventColumn::Problem), Some(""));
    // 非级联列保留
    assert_eq!(grid.cell(0, EventColumn::TotalTime), Some("45"));
}

#[test]
fn test_line_outside_area_rejected() {
    let (_dir, cascade) = cascade();
    let mut grid = EventGrid::new();
    grid.edit_cell(0, EventColumn::Area, "A2", &cascade).expect("编辑失败");

    let outcome = grid.edit_cell(0, EventColumn::Line, "L1", &cascade).expect("编辑失败");
    assert!(matches!(
        outcome.failure,
        Some(ValidationFailure::NotInTaxonomy { ref parent, .. }) if parent.as_deref() == Some("A2")
    ));
    assert_eq!(grid.cell(0, EventColumn::Line), Some(""));
}

#[test]
fn test_month_must_match_date() {
    let (_dir, cascade) = cascade();
    let mut grid = EventGrid::new();
    grid.edit_cell(0, EventColumn::Date, "15-03-2024", &cascade).expect("编辑失败");

    let outcome = grid.edit_cell(0, EventColumn::Month, "4", &cascade).expect("编辑失败");
    assert_eq!(
        outcome.failure,
        Some(ValidationFailure::MonthDateMismatch { month: 4, date_month: 3 })
    );
    assert_eq!(grid.cell(0, EventColumn::Month), Some(""));
}

#[test]
fn test_suggestions_follow_parent_cell() {
    let (_dir, cascade) = cascade();
    let mut grid = EventGrid::new();

    assert_eq!(grid.suggestions(0, EventColumn::StartMeridiem, &cascade), vec!["AM", "PM"]);
    assert_eq!(grid.suggestions(0, EventColumn::Status, &cascade), vec!["OK"]);
    assert!(grid.suggestions(0, EventColumn::Line, &cascade).is_empty());

    grid.edit_cell(0, EventColumn::Area, "A2", &cascade).expect("编辑失败");
    assert_eq!(grid.suggestions(0, EventColumn::Line, &cascade), vec!["L2", "L10"]);

    grid.edit_cell(0, EventColumn::Incharge, "Ravi", &cascade).expect("编辑失败");
    grid.edit_cell(1, EventColumn::Incharge, "Asha", &cascade).expect("编辑失败");
    assert_eq!(grid.suggestions(2, EventColumn::Incharge, &cascade), vec!["Ravi", "Asha"]);
}

#[test]
fn test_copy_selection_and_limits() {
    let grid = EventGrid::from_rows(vec![
        downtime_row("3", "15-03-2024", "45", "A1", "L1", "Press", "Jam"),
        downtime_row("3", "16-03-2024", "30", "A1", "L1", "Press", "Jam"),
    ]);

    let text = grid
        .copy_selection(&[
            (1, EventColumn::TotalTime),
            (0, EventColumn::Month),
            (0, EventColumn::TotalTime),
        ])
        .expect("复制失败");
    assert_eq!(text, "3\t45\n30");

    let too_many: Vec<(usize, EventColumn)> = (0..=MAX_COPY_CELLS).map(|r| (r, EventColumn::Month)).collect();
    assert!(matches!(
        grid.copy_selection(&too_many),
        Err(EditorError::SelectionTooLarge { .. })
    ));
}

#[test]
fn test_paste_and_undo_refused() {
    let grid = EventGrid::new();
    assert_eq!(
        grid.refuse(ClipboardAction::Paste),
        EditorError::ClipboardRefused(ClipboardAction::Paste)
    );
    assert!(matches!(grid.refuse(ClipboardAction::Undo), EditorError::ClipboardRefused(_)));
}

#[test]
fn test_row_out_of_range() {
    let (_dir, cascade) = cascade();
    let mut grid = EventGrid::new();
    let result = grid.edit_cell(5, EventColumn::Month, "3", &cascade);
    assert!(matches!(result, Err(EditorError::RowOutOfRange { row: 5, rows: 1 })));
}

#[test]
fn test_oversized_total_time_rejected() {
    let (_dir, cascade) = cascade();
    let mut grid = EventGrid::new();

    let outcome = grid
        .edit_cell(0, EventColumn::TotalTime, "99999999999999999999", &cascade)
        .expect("编辑失败");
    assert_eq!(outcome.failure, Some(ValidationFailure::InvalidTotalTime));
    assert_eq!(grid.cell(0, EventColumn::TotalTime), Some(""));

    grid.edit_cell(0, EventColumn::TotalTime, "4294967295", &cascade).expect("编辑失败");
    assert_eq!(grid.records()[0].total_minutes, 4_294_967_295);
}
