// ==========================================
// 统计报表导出集成测试
// ==========================================
// 测试目标: 统计结果合成 PNG、空结果不写文件、纯文本表格
// ==========================================


use plant_downtime::app::{Session, SessionError, UnsavedChangesDecision};
use plant_downtime::domain::ReportPeriod;
use plant_downtime::engine::StatisticsReport;
use image::GenericImageView;
use plant_downtime::report::{export_png, render_parts, ExportOutcome, ReportError, TableText};
use test_helpers::{create_test_db, downtime_row, seed_small_plant, write_csv_sheet};

fn session_with_events() -> (tempfile::TempDir, Session) {
    let (dir, db_path) = create_test_db();
    seed_small_plant(&db_path);
    let mut session = Session::open(&db_path).expect("创建会话失败");

    let path = write_csv_sheet(
        dir.path(),
        "March.csv",
        &[
            downtime_row("3", "15-03-2024", "120", "A1", "L1", "Press", "Jam"),
            downtime_row("3", "16-03-2024", "80", "A2", "L2", "", "Leak"),
        ],
    );
    session
        .open_sheet(&path, UnsavedChangesDecision::Discard)
        .expect("打开失败");
    (dir, session)
}

#[test]
fn test_export_png_written() {
    let (dir, mut session) = session_with_events();
    session
        .compute_statistics(ReportPeriod::Month(3))
        .expect("统计失败");

    let out = dir.path().join("out").join("march.png");
    let outcome = session.export_statistics(&out, 1000).expect("导出失败");

    let ExportOutcome::Written { path, width, height } = outcome else {
        panic!("应写出文件");
    };
    assert_eq!(path, out);
    assert_eq!(width, 1000);

    let image = image::open(&out).expect("读取 PNG 失败");
    assert_eq!(image.width(), 1000);
    assert_eq!(image.height(), height);
}

#[test]
fn test_parts_follow_section_order() {
    let (_dir, mut session) = session_with_events();
    let report = session
        .compute_statistics(ReportPeriod::Month(3))
        .expect("统计失败")
        .clone();

    let parts = render_parts(&report).expect("渲染失败");
    let charts = report.sections.iter().filter(|s| s.chart.is_some()).count();
    assert_eq!(parts.len(), report.sections.len() + charts);
}

#[test]
fn test_empty_report_not_written() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let report = StatisticsReport {
        period: ReportPeriod::AllMonths,
        label: "Empty".to_string(),
        working_days: 0.0,
        event_count: 0,
        sections: Vec::new(),
    };

    let out = dir.path().join("empty.png");
    let outcome = export_png(&report, &out, 800).expect("导出不应报错");
    assert_eq!(outcome, ExportOutcome::NothingToExport);
    assert!(!out.exists());
}

#[test]
fn test_plain_table_text() {
    let (_dir, mut session) = session_with_events();
    let report = session
        .compute_statistics(ReportPeriod::Month(3))
        .expect("统计失败");

    let section = report.section("MTTR in Mins - March").expect("段落应存在");
    let text = TableText::from_report(section).to_plain();
    let first_line = text.lines().next().expect("应有表头");
    assert!(first_line.contains("Location"));
    assert!(first_line.contains("Target in Min's"));
    assert!(text.contains("Overall Plant"));
    assert!(text.contains("100.00"));
}

#[test]
fn test_export_width_out_of_range() {
    let (dir, mut session) = session_with_events();
    session
        .compute_statistics(ReportPeriod::Month(3))
        .expect("统计失败");

    let out = dir.path().join("zero.png");
    let err = session.export_statistics(&out, 0).expect_err("宽度为 0 应失败");
    assert!(matches!(err, SessionError::Report(ReportError::InvalidWidth { .. })));
    assert!(!out.exists());
}
