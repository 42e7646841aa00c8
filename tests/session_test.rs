// ==========================================
// 会话集成测试
// ==========================================
// 测试目标: 打开 / 保存 / 未保存修改处理、目标值读写、统计与过期标记
// ==========================================


use plant_downtime::app::{Session, SessionError, UnsavedChangesDecision, UNTITLED_SHEET};
use plant_downtime::config::{StatisticTargets, TARGETS_FILE_NAME};
use plant_downtime::domain::{EventColumn, ReportPeriod};
use plant_downtime::engine::ClipboardAction;
use plant_downtime::importer::ImportError;
use plant_downtime::report::ExportOutcome;
use test_helpers::{create_test_db, downtime_row, seed_small_plant, write_csv_sheet, write_csv_with_headers};

fn open_session() -> (tempfile::TempDir, Session) {
    let (dir, db_path) = create_test_db();
    seed_small_plant(&db_path);
    let session = Session::open(&db_path).expect("创建会话失败");
    (dir, session)
}

#[test]
fn test_new_session_defaults() {
    let (dir, session) = open_session();
    assert_eq!(session.sheet_label(), UNTITLED_SHEET);
    assert!(!session.is_edited());
    assert_eq!(session.grid().row_count(), 1);
    assert_eq!(session.targets_path(), dir.path().join(TARGETS_FILE_NAME));
    assert_eq!(session.cascade().areas().len(), 2);
}

#[test]
fn test_edit_then_save_clears_edited_flag() {
    let (dir, mut session) = open_session();
    let path = dir.path().join("March.csv");
    session
        .new_sheet(&path, UnsavedChangesDecision::Discard)
        .expect("新建失败");
    assert_eq!(session.sheet_label(), "March");

    session.edit_cell(0, EventColumn::Month, "3").expect("编辑失败");
    assert!(session.is_edited());

    let rows = session.save().expect("保存失败");
    assert_eq!(rows, 1);
    assert!(!session.is_edited());
}

#[test]
fn test_save_without_path() {
    let (_dir, mut session) = open_session();
    session.edit_cell(0, EventColumn::Month, "3").expect("编辑失败");

    let err = session.save().expect_err("没有路径应失败");
    assert!(matches!(err, SessionError::NoSavePath));
}

#[test]
fn test_cancel_keeps_current_sheet() {
    let (dir, mut session) = open_session();
    let other = write_csv_sheet(
        dir.path(),
        "April.csv",
        &[downtime_row("4", "02-04-2024", "10", "A1", "L1", "Press", "Jam")],
    );
    session.edit_cell(0, EventColumn::Month, "3").expect("编辑失败");

    let opened = session
        .open_sheet(&other, UnsavedChangesDecision::Cancel)
        .expect("取消不应报错");
    assert!(!opened);
    assert!(session.is_edited());
    assert_eq!(session.grid().cell(0, EventColumn::Month), Some("3"));

    let opened = session
        .open_sheet(&other, UnsavedChangesDecision::Discard)
        .expect("打开失败");
    assert!(opened);
    assert!(!session.is_edited());
    assert_eq!(session.grid().cell(0, EventColumn::Month), Some("4"));
}

#[test]
fn test_failed_load_keeps_current_grid() {
    let (dir, mut session) = open_session();
    let good = write_csv_sheet(
        dir.path(),
        "March.csv",
        &[downtime_row("3", "15-03-2024", "45", "A1", "L1", "Press", "Jam")],
    );
    session.open_sheet(&good, UnsavedChangesDecision::Discard).expect("打开失败");

    let bad = write_csv_with_headers(dir.path(), "bad.csv", &["MONTH", "DATE"], &[]);
    let err = session
        .open_sheet(&bad, UnsavedChangesDecision::Discard)
        .expect_err("缺列应失败");
    assert!(matches!(err, SessionError::Import(ImportError::MissingColumns(_))));

    assert_eq!(session.sheet_label(), "March");
    assert_eq!(session.grid().cell(0, EventColumn::TotalTime), Some("45"));
}

#[test]
fn test_targets_default_then_update() {
    let (_dir, mut session) = open_session();
    assert_eq!(session.targets().expect("读取目标值失败"), &StatisticTargets::default());

    let mut values = StatisticTargets::default().values().to_vec();
    values[0] = 22.0;
    let targets = StatisticTargets::from_values(values).expect("目标值应有效");
    session.update_targets(targets.clone()).expect("保存目标值失败");
    assert!(session.targets_path().exists());

    let reloaded = StatisticTargets::load(session.targets_path()).expect("重新读取失败");
    assert_eq!(reloaded, targets);
    assert_eq!(reloaded.working_days(1), 22.0);
}

#[test]
fn test_statistics_flagged_stale_after_edit() {
    let (dir, mut session) = open_session();
    let path = write_csv_sheet(
        dir.path(),
        "March.csv",
        &[
            downtime_row("3", "15-03-2024", "120", "A1", "L1", "Press", "Jam"),
            downtime_row("3", "16-03-2024", "80", "A1", "L1", "Press", "Jam"),
        ],
    );
    session.open_sheet(&path, UnsavedChangesDecision::Discard).expect("打开失败");

    let report = session.compute_statistics(ReportPeriod::Month(3)).expect("统计失败");
    assert_eq!(report.event_count, 2);
    assert_eq!(report.label, "March");
    assert!(!session.report_is_stale());

    session.edit_cell(2, EventColumn::Month, "3").expect("编辑失败");
    session.compute_statistics(ReportPeriod::Month(3)).expect("统计失败");
    assert!(session.report_is_stale());
}

#[test]
fn test_export_without_report_is_noop() {
    let (dir, session) = open_session();
    let out = dir.path().join("stats.png");

    let outcome = session.export_statistics(&out, 800).expect("导出不应报错");
    assert_eq!(outcome, ExportOutcome::NothingToExport);
    assert!(!out.exists());
}

#[test]
fn test_taxonomy_change_refreshes_cascade() {
    let (_dir, mut session) = open_session();
    let form = plant_downtime::api::TaxonomyForm {
        area: "A1".to_string(),
        line: "L1".to_string(),
        machine: "Drill".to_string(),
        ..Default::default()
    };
    session.add_taxonomy(&form).expect("新增失败");
    assert!(session
        .suggestions(0, EventColumn::Machine)
        .is_empty());

    session.edit_cell(0, EventColumn::Area, "A1").expect("编辑失败");
    session.edit_cell(0, EventColumn::Line, "L1").expect("编辑失败");
    assert_eq!(
        session.suggestions(0, EventColumn::Machine),
        vec!["Press", "Lathe", "Drill"]
    );

    session.remove_taxonomy(&form).expect("删除失败");
    assert_eq!(session.suggestions(0, EventColumn::Machine), vec!["Press", "Lathe"]);
}

#[test]
fn test_refused_actions_have_messages() {
    let (_dir, session) = open_session();
    let err = session.refuse(ClipboardAction::Paste);
    assert!(!err.user_message().is_empty());
}

#[test]
fn test_untitled_edit_saved_as_before_open() {
    let (dir, mut session) = open_session();
    let other = write_csv_sheet(
        dir.path(),
        "April.csv",
        &[downtime_row("4", "02-04-2024", "10", "A1", "L1", "Press", "Jam")],
    );
    session.edit_cell(0, EventColumn::Month, "3").expect("编辑失败");

    let err = session
        .open_sheet(&other, UnsavedChangesDecision::Save)
        .expect_err("未命名表格不能直接保存");
    assert!(matches!(err, SessionError::NoSavePath));
    assert!(session.is_edited());

    let target = dir.path().join("Draft.csv");
    let opened = session
        .open_sheet(&other, UnsavedChangesDecision::SaveAs(target.clone()))
        .expect("另存后打开失败");
    assert!(opened);
    assert!(target.exists());
    assert_eq!(session.sheet_label(), "April");
    assert_eq!(session.grid().cell(0, EventColumn::Month), Some("4"));
}

#[test]
fn test_blank_edited_grid_has_nothing_to_save() {
    let (dir, mut session) = open_session();
    let other = write_csv_sheet(
        dir.path(),
        "April.csv",
        &[downtime_row("4", "02-04-2024", "10", "A1", "L1", "Press", "Jam")],
    );
    session.edit_cell(0, EventColumn::Month, "3").expect("编辑失败");
    session.edit_cell(0, EventColumn::Month, "").expect("编辑失败");
    assert!(session.is_edited());

    let opened = session
        .open_sheet(&other, UnsavedChangesDecision::Save)
        .expect("空表格不应阻止打开");
    assert!(opened);
    assert_eq!(session.sheet_label(), "April");
}
