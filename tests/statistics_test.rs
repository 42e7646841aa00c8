// ==========================================
// 统计引擎集成测试
// ==========================================
// 测试目标: 停机率 / 故障次数 / MTBF / MTTR、月份筛选、分组段落
// ==========================================

use plant_downtime::config::StatisticTargets;
use plant_downtime::domain::{AreaLayout, EventRecord, LineLayout, PlantLayout, ReportPeriod};
use plant_downtime::engine::{StatisticsEngine, StatisticsInput, StatisticsReport, OVERALL_PLANT};

const LABEL: &str = "Plant2024";

fn layout() -> PlantLayout {
    PlantLayout {
        areas: vec![
            AreaLayout {
                code: "A1".to_string(),
                display_name: "Area One".to_string(),
                lines: vec![LineLayout {
                    code: "L1".to_string(),
                    display_name: "Line One".to_string(),
                    available_minutes: 1000,
                    machines: vec!["Press".to_string()],
                }],
            },
            AreaLayout {
                code: "A2".to_string(),
                display_name: "Area Two".to_string(),
                lines: vec![LineLayout {
                    code: "L2".to_string(),
                    display_name: "Line Two".to_string(),
                    available_minutes: 500,
                    machines: Vec::new(),
                }],
            },
        ],
    }
}

/// 3 月 20 个工作日，4 月 10 个工作日，其余取默认
fn targets() -> StatisticTargets {
    let mut values = StatisticTargets::default().values().to_vec();
    values[2] = 20.0;
    values[3] = 10.0;
    StatisticTargets::from_values(values).expect("目标值应有效")
}

fn record(month: u32, minutes: i64, line: &str, machine: &str, problem: &str) -> EventRecord {
    EventRecord {
        month: Some(month),
        total_minutes: minutes,
        line: line.to_string(),
        machine: machine.to_string(),
        problem: problem.to_string(),
        ..Default::default()
    }
}

fn compute(records: &[EventRecord], period: ReportPeriod) -> StatisticsReport {
    let layout = layout();
    let targets = targets();
    StatisticsEngine::new().compute(&StatisticsInput {
        records,
        layout: &layout,
        targets: &targets,
        period,
        label: LABEL,
    })
}

fn value(report: &StatisticsReport, title: &str, category: &str) -> f64 {
    report
        .section(title)
        .unwrap_or_else(|| panic!("缺少段落: {}", title))
        .row(category)
        .unwrap_or_else(|| panic!("缺少行: {} / {}", title, category))
        .value
}

#[test]
fn test_single_line_scenario() {
    let records = vec![
        record(3, 120, "L1", "Press", "Jam"),
        record(3, 80, "L1", "Press", "Jam"),
    ];
    let report = compute(&records, ReportPeriod::Month(3));

    assert_eq!(report.working_days, 20.0);
    assert_eq!(report.event_count, 2);

    let percent = value(&report, "% of B/D in Plant2024", "Area One");
    assert!((percent - 1.0).abs() < 1e-9);

    let occurrences = value(&report, "No of Occurrence in Plant2024", "Area One");
    assert_eq!(occurrences, 2.0);

    let mtbf = value(&report, "MTBF in Days - Plant2024", "Area One");
    assert!((mtbf - 6.875).abs() < 1e-9);

    let mttr = value(&report, "MTTR in Mins - Plant2024", "Area One");
    assert!((mttr - 100.0).abs() < 1e-9);
}

#[test]
fn test_overall_plant_first_and_summed() {
    let records = vec![
        record(3, 200, "L1", "Press", "Jam"),
        record(3, 100, "L2", "", "Leak"),
    ];
    let report = compute(&records, ReportPeriod::Month(3));

    let section = report.section("% of B/D in Plant2024").expect("段落应存在");
    assert_eq!(section.rows[0].category, OVERALL_PLANT);
    assert_eq!(section.rows[1].category, "Area One");
    assert_eq!(section.rows[2].category, "Area Two");

    // 300 / (1500 × 20) × 100
    assert!((section.rows[0].value - 1.0).abs() < 1e-9);
    assert_eq!(value(&report, "No of Occurrence in Plant2024", OVERALL_PLANT), 2.0);
}

#[test]
fn test_month_filter_excludes_other_months() {
    let records = vec![
        record(3, 200, "L1", "Press", "Jam"),
        record(4, 500, "L1", "Press", "Jam"),
    ];
    let report = compute(&records, ReportPeriod::Month(3));

    assert_eq!(report.event_count, 1);
    assert_eq!(value(&report, "No of Occurrence in Plant2024", "Area One"), 1.0);
    assert!(report.section("Monthly % of B/D - Plant2024").is_none());
}

#[test]
fn test_all_months_sums_working_days_and_adds_trend() {
    let records = vec![
        record(3, 200, "L1", "Press", "Jam"),
        record(4, 500, "L1", "Press", "Jam"),
    ];
    let report = compute(&records, ReportPeriod::AllMonths);

    assert_eq!(report.working_days, 30.0);
    // 700 / (1000 × 30) × 100
    let percent = value(&report, "% of B/D in Plant2024", "Area One");
    assert!((percent - 700.0 / 300.0).abs() < 1e-9);

    let trend = report.section("Monthly % of B/D - Plant2024").expect("月度趋势应存在");
    let months: Vec<&str> = trend.rows.iter().map(|r| r.category.as_str()).collect();
    assert_eq!(months, vec!["March", "April"]);
    // 4 月: 500 / (1500 × 10) × 100
    assert!((trend.rows[1].value - 500.0 / 150.0).abs() < 1e-9);
}

#[test]
fn test_zero_occurrence_area_reports_zero() {
    let records = vec![record(3, 200, "L1", "Press", "Jam")];
    let report = compute(&records, ReportPeriod::Month(3));

    assert_eq!(value(&report, "MTBF in Days - Plant2024", "Area Two"), 0.0);
    assert_eq!(value(&report, "MTTR in Mins - Plant2024", "Area Two"), 0.0);
    assert_eq!(value(&report, "% of B/D in Plant2024", "Area Two"), 0.0);
}

#[test]
fn test_line_and_machine_group_sections() {
    let records = vec![record(3, 200, "L1", "Press", "Jam")];
    let report = compute(&records, ReportPeriod::Month(3));

    let line_group = report.section("Area One - Plant2024").expect("产线分组应存在");
    assert_eq!(line_group.category_header, "Line");
    assert_eq!(line_group.rows[0].category, "Line One");
    assert!((line_group.rows[0].value - 1.0).abs() < 1e-9);

    let machine_group = report
        .sections
        .iter()
        .find(|s| s.category_header == "Machine")
        .expect("设备分组应存在");
    assert_eq!(machine_group.rows[0].category, "Press");
    assert!((machine_group.rows[0].value - 1.0).abs() < 1e-9);

    // Area Two 没有设备，不出现设备分组
    assert_eq!(
        report.sections.iter().filter(|s| s.category_header == "Machine").count(),
        1
    );
}

#[test]
fn test_problem_occurrence_sections() {
    let records = vec![
        record(3, 30, "L1", "Press", "Jam"),
        record(3, 40, "L1", "Press", "Noise"),
        record(3, 50, "L1", "Press", "Jam"),
        record(3, 0, "L1", "Press", "Noise"),
    ];
    let report = compute(&records, ReportPeriod::Month(3));

    let section = report
        .section("No of Occurrence per Problem - Area One")
        .expect("故障段落应存在");
    let rows: Vec<(&str, f64)> = section.rows.iter().map(|r| (r.category.as_str(), r.value)).collect();
    assert_eq!(rows, vec![("Jam", 2.0), ("Noise", 1.0)]);

    assert!(report.section("No of Occurrence per Problem - Area Two").is_none());
}

#[test]
fn test_unknown_line_is_ignored() {
    let records = vec![
        record(3, 200, "L1", "Press", "Jam"),
        record(3, 999, "L1-OLD", "Press", "Jam"),
    ];
    let report = compute(&records, ReportPeriod::Month(3));

    assert_eq!(value(&report, "No of Occurrence in Plant2024", OVERALL_PLANT), 1.0);
}

#[test]
fn test_chart_limits() {
    let records = vec![
        record(3, 120, "L1", "Press", "Jam"),
        record(3, 80, "L1", "Press", "Jam"),
    ];
    let report = compute(&records, ReportPeriod::Month(3));
    let targets = targets();

    let mttr = report.section("MTTR in Mins - Plant2024").expect("段落应存在");
    let chart = mttr.chart.as_ref().expect("MTTR 应有图表");
    assert_eq!(chart.y_max, (100.0 + targets.location_minutes() + 5.0).floor());

    let occurrences = report.section("No of Occurrence in Plant2024").expect("段落应存在");
    assert!(occurrences.chart.is_none());
}

#[test]
fn test_huge_downtime_saturates() {
    let records = vec![
        record(3, i64::MAX, "L1", "Press", "Jam"),
        record(3, i64::MAX, "L1", "Press", "Jam"),
        record(3, 5, "L1", "Press", "Jam"),
    ];
    let report = compute(&records, ReportPeriod::Month(3));

    assert_eq!(value(&report, "No of Occurrence in Plant2024", OVERALL_PLANT), 3.0);
    let mttr = value(&report, "MTTR in Mins - Plant2024", OVERALL_PLANT);
    assert!(mttr.is_finite() && mttr > 0.0);
    let percent = value(&report, "% of B/D in Plant2024", OVERALL_PLANT);
    assert!(percent.is_finite());
}
