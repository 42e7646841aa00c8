// ==========================================
// 设备故障停机统计系统 - 停机统计引擎
// ==========================================
// 职责: 按区域 / 产线 / 设备汇总停机记录，计算停机率、故障次数、MTBF、MTTR
// 输入: 事件记录 + 工厂布局快照 + 统计目标值 + 统计期间
// 输出: StatisticsReport（按展示顺序排列的表格 + 图表描述）
// 红线: 分母为 0 时结果为 0，不得出现除零；
//       唯一例外是设备停机率在可用时间为 0 时为 NaN（展示为 "N/A"）
// 红线: 产线匹配为精确匹配，"LINE-1" 不得命中 "LINE-10"
// ==========================================

use crate::config::{StatisticTargets, GROUP_SLOTS};
use crate::domain::event::EventRecord;
use crate::domain::taxonomy::{AreaLayout, PlantLayout};
use crate::domain::types::{month_name, ReportPeriod};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, instrument};

/// 全厂汇总行名称
pub const OVERALL_PLANT: &str = "Overall Plant";

const MINUTES_PER_DAY: f64 = 24.0 * 60.0;

// ==========================================
// 公式
// ==========================================

/// 停机率 (%) = 停机分钟 / (每日可用分钟 × 工作天数) × 100
///
/// 可用时间为 0 时返回 0
pub fn breakdown_percent(downtime_minutes: i64, available_minutes: i64, working_days: f64) -> f64 {
    let capacity = available_minutes as f64 * working_days;
    if capacity == 0.0 {
        return 0.0;
    }
    downtime_minutes as f64 / capacity * 100.0
}

/// MTBF (天) = ((每日可用分钟 × 工作天数) − 停机分钟) / 故障次数 / 1440
///
/// 故障次数为 0 时返回 0
pub fn mtbf_days(
    downtime_minutes: i64,
    available_minutes: i64,
    working_days: f64,
    occurrences: usize,
) -> f64 {
    if occurrences == 0 {
        return 0.0;
    }
    let uptime = available_minutes as f64 * working_days - downtime_minutes as f64;
    uptime / occurrences as f64 / MINUTES_PER_DAY
}

/// MTTR (分钟) = 停机分钟 / 故障次数
///
/// 故障次数为 0 时返回 0
pub fn mttr_minutes(downtime_minutes: i64, occurrences: usize) -> f64 {
    if occurrences == 0 {
        return 0.0;
    }
    downtime_minutes as f64 / occurrences as f64
}

// ==========================================
// 报表结构
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MetricKind {
    BreakdownPercent,
    Occurrences,
    Mtbf,
    Mttr,
}

impl MetricKind {
    /// 数值展示: 计数为整数，其余保留两位小数，NaN 展示为 "N/A"
    pub fn format_value(&self, value: f64) -> String {
        if value.is_nan() {
            return "N/A".to_string();
        }
        match self {
            MetricKind::Occurrences => format!("{}", value as i64),
            _ => format!("{:.2}", value),
        }
    }
}

/// 目标值展示（整值不带小数）
pub fn format_target(target: f64) -> String {
    if target.fract() == 0.0 {
        format!("{}", target as i64)
    } else {
        format!("{}", target)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRow {
    pub category: String,
    pub value: f64,
    pub target: Option<f64>,
}

/// 柱状图描述: 每行一根柱，目标值处画水平参考线
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub target: f64,
    pub y_max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricReport {
    pub title: String,
    pub kind: MetricKind,
    pub category_header: String,
    pub value_header: String,
    pub target_header: Option<String>,
    pub rows: Vec<MetricRow>,
    pub chart: Option<ChartSpec>,
}

impl MetricReport {
    /// 有限数值中的最大值（无有限值时为 0）
    pub fn max_value(&self) -> f64 {
        self.rows
            .iter()
            .map(|r| r.value)
            .filter(|v| v.is_finite())
            .fold(0.0, f64::max)
    }

    pub fn row(&self, category: &str) -> Option<&MetricRow> {
        self.rows.iter().find(|r| r.category == category)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsReport {
    pub period: ReportPeriod,
    pub label: String,
    pub working_days: f64,
    pub event_count: usize,
    pub sections: Vec<MetricReport>,
}

impl StatisticsReport {
    pub fn section(&self, title: &str) -> Option<&MetricReport> {
        self.sections.iter().find(|s| s.title == title)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

// ==========================================
// 图表纵轴上限
// ==========================================

fn percent_scale(max: f64, target: f64) -> f64 {
    max + target + 0.2
}

fn mtbf_scale(max: f64) -> f64 {
    (max + 30.0).floor()
}

fn mttr_scale(max: f64, target: f64) -> f64 {
    (max + target + 5.0).floor()
}

// ==========================================
// StatisticsInput
// ==========================================
pub struct StatisticsInput<'a> {
    pub records: &'a [EventRecord],
    pub layout: &'a PlantLayout,
    pub targets: &'a StatisticTargets,
    pub period: ReportPeriod,
    /// 表头 / 标题中使用的名称（通常为事件表文件名，不含扩展名）
    pub label: &'a str,
}

/// 单个分类的累计量
#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    downtime: i64,
    available: i64,
    occurrences: usize,
}

impl Tally {
    fn add(&mut self, other: Tally) {
        self.downtime = self.downtime.saturating_add(other.downtime);
        self.available = self.available.saturating_add(other.available);
        self.occurrences += other.occurrences;
    }
}

// ==========================================
// StatisticsEngine
// ==========================================
pub struct StatisticsEngine {}

impl Default for StatisticsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StatisticsEngine {
    pub fn new() -> Self {
        Self {}
    }

    /// 计算全部统计段落
    ///
    /// 顺序: 区域停机率 → 区域故障次数 → 区域 MTBF → 区域 MTTR →
    /// 产线分组停机率 → 设备分组停机率 → 各区域故障次数（按故障） → 月度趋势
    #[instrument(skip(self, input), fields(records = input.records.len(), period = ?input.period))]
    pub fn compute(&self, input: &StatisticsInput<'_>) -> StatisticsReport {
        let records = self.filter_period(input.records, input.period);
        let working_days = self.working_days(input.records, input.targets, input.period);
        debug!(filtered = records.len(), working_days, "统计输入已筛选");

        let mut sections = self.area_sections(&records, input, working_days);
        sections.extend(self.line_group_sections(&records, input, working_days));
        sections.extend(self.machine_group_sections(&records, input, working_days));
        sections.extend(self.problem_sections(&records, input));
        if let Some(trend) = self.monthly_trend(input) {
            sections.push(trend);
        }

        StatisticsReport {
            period: input.period,
            label: input.label.to_string(),
            working_days,
            event_count: records.len(),
            sections,
        }
    }

    /// 按期间筛选记录
    pub fn filter_period<'r>(&self, records: &'r [EventRecord], period: ReportPeriod) -> Vec<&'r EventRecord> {
        match period {
            ReportPeriod::Month(m) => records.iter().filter(|r| r.month == Some(m)).collect(),
            ReportPeriod::AllMonths => records.iter().collect(),
        }
    }

    /// 统计期间的工作天数
    ///
    /// 单月取该月目标值；全部月份为数据中出现过的各月工作天数之和
    pub fn working_days(
        &self,
        records: &[EventRecord],
        targets: &StatisticTargets,
        period: ReportPeriod,
    ) -> f64 {
        match period {
            ReportPeriod::Month(m) => targets.working_days(m),
            ReportPeriod::AllMonths => distinct_months(records)
                .into_iter()
                .map(|m| targets.working_days(m))
                .sum(),
        }
    }

    // ==========================================
    // 区域级
    // ==========================================

    fn area_sections(
        &self,
        records: &[&EventRecord],
        input: &StatisticsInput<'_>,
        working_days: f64,
    ) -> Vec<MetricReport> {
        let targets = input.targets;
        let name = input.label;

        let mut overall = Tally::default();
        let mut per_area = Vec::with_capacity(input.layout.areas.len());
        for area in &input.layout.areas {
            let tally = tally_area(records, area);
            overall.add(tally);
            per_area.push((area.display_name.clone(), tally));
        }
        let mut categories = vec![(OVERALL_PLANT.to_string(), overall)];
        categories.extend(per_area);

        let rows = |value: &dyn Fn(&Tally) -> f64, target: Option<f64>| -> Vec<MetricRow> {
            categories
                .iter()
                .map(|(category, tally)| MetricRow {
                    category: category.clone(),
                    value: value(tally),
                    target,
                })
                .collect()
        };

        let mut percent = MetricReport {
            title: format!("% of B/D in {}", name),
            kind: MetricKind::BreakdownPercent,
            category_header: "Location".to_string(),
            value_header: format!("% of B/D in {}", name),
            target_header: Some("Target in %".to_string()),
            rows: rows(
                &|t| breakdown_percent(t.downtime, t.available, working_days),
                Some(targets.location_percent()),
            ),
            chart: None,
        };
        percent.chart = Some(ChartSpec {
            title: percent.title.clone(),
            target: targets.location_percent(),
            y_max: percent_scale(percent.max_value(), targets.location_percent()),
        });

        let occurrences = MetricReport {
            title: format!("No of Occurrence in {}", name),
            kind: MetricKind::Occurrences,
            category_header: "Location".to_string(),
            value_header: format!("No of Occurrence in {}", name),
            target_header: None,
            rows: rows(&|t| t.occurrences as f64, None),
            chart: None,
        };

        let mut mtbf = MetricReport {
            title: format!("MTBF in Days - {}", name),
            kind: MetricKind::Mtbf,
            category_header: "Location".to_string(),
            value_header: format!("MTBF in {}", name),
            target_header: Some("Target in Day's".to_string()),
            rows: rows(
                &|t| mtbf_days(t.downtime, t.available, working_days, t.occurrences),
                Some(targets.location_days()),
            ),
            chart: None,
        };
        mtbf.chart = Some(ChartSpec {
            title: mtbf.title.clone(),
            target: targets.location_days(),
            y_max: mtbf_scale(mtbf.max_value()),
        });

        let mut mttr = MetricReport {
            title: format!("MTTR in Mins - {}", name),
            kind: MetricKind::Mttr,
            category_header: "Location".to_string(),
            value_header: format!("MTTR in {}", name),
            target_header: Some("Target in Min's".to_string()),
            rows: rows(
                &|t| mttr_minutes(t.downtime, t.occurrences),
                Some(targets.location_minutes()),
            ),
            chart: None,
        };
        mttr.chart = Some(ChartSpec {
            title: mttr.title.clone(),
            target: targets.location_minutes(),
            y_max: mttr_scale(mttr.max_value(), targets.location_minutes()),
        });

        vec![percent, occurrences, mtbf, mttr]
    }

    // ==========================================
    // 产线分组 / 设备分组
    // ==========================================

    fn line_group_sections(
        &self,
        records: &[&EventRecord],
        input: &StatisticsInput<'_>,
        working_days: f64,
    ) -> Vec<MetricReport> {
        group_areas(input.layout)
            .into_iter()
            .enumerate()
            .filter(|(_, areas)| areas.iter().any(|a| !a.lines.is_empty()))
            .map(|(slot, areas)| {
                let target = input.targets.line_group_percent(slot);
                let rows = areas
                    .iter()
                    .flat_map(|a| a.lines.iter())
                    .map(|line| {
                        let downtime = records
                            .iter()
                            .filter(|r| r.line == line.code)
                            .map(|r| r.total_minutes)
                            .fold(0, i64::saturating_add);
                        MetricRow {
                            category: line.display_name.clone(),
                            value: breakdown_percent(downtime, line.available_minutes, working_days),
                            target: Some(target),
                        }
                    })
                    .collect();
                group_report(group_title(&areas), "Line", rows, target, input.label)
            })
            .collect()
    }

    /// 设备按名称归并（同一分组内多条产线上的同名设备合并）；
    /// 可用时间为所在产线可用时间之和，为 0 时停机率为 NaN
    fn machine_group_sections(
        &self,
        records: &[&EventRecord],
        input: &StatisticsInput<'_>,
        working_days: f64,
    ) -> Vec<MetricReport> {
        group_areas(input.layout)
            .into_iter()
            .enumerate()
            .filter_map(|(slot, areas)| {
                let mut order: Vec<String> = Vec::new();
                let mut machine_lines: HashMap<String, Vec<(&str, i64)>> = HashMap::new();
                for line in areas.iter().flat_map(|a| a.lines.iter()) {
                    for machine in &line.machines {
                        let entry = machine_lines.entry(machine.clone()).or_insert_with(|| {
                            order.push(machine.clone());
                            Vec::new()
                        });
                        entry.push((line.code.as_str(), line.available_minutes));
                    }
                }
                if order.is_empty() {
                    return None;
                }

                let target = input.targets.machine_group_percent(slot);
                let rows = order
                    .iter()
                    .map(|machine| {
                        let lines = &machine_lines[machine];
                        let available = lines.iter().map(|(_, minutes)| *minutes).fold(0, i64::saturating_add);
                        let downtime: i64 = records
                            .iter()
                            .filter(|r| r.machine == *machine && lines.iter().any(|(code, _)| r.line == *code))
                            .map(|r| r.total_minutes)
                            .fold(0, i64::saturating_add);
                        let value = if available == 0 {
                            f64::NAN
                        } else {
                            breakdown_percent(downtime, available, working_days)
                        };
                        MetricRow {
                            category: machine.clone(),
                            value,
                            target: Some(target),
                        }
                    })
                    .collect();
                Some(group_report(group_title(&areas), "Machine", rows, target, input.label))
            })
            .collect()
    }

    // ==========================================
    // 故障次数（按故障描述）
    // ==========================================

    fn problem_sections(&self, records: &[&EventRecord], input: &StatisticsInput<'_>) -> Vec<MetricReport> {
        input
            .layout
            .areas
            .iter()
            .filter_map(|area| {
                let codes: HashSet<&str> = area.lines.iter().map(|l| l.code.as_str()).collect();
                let mut order: Vec<String> = Vec::new();
                let mut counts: HashMap<String, usize> = HashMap::new();
                for record in records
                    .iter()
                    .filter(|r| r.is_occurrence() && !r.problem.is_empty() && codes.contains(r.line.as_str()))
                {
                    let count = counts.entry(record.problem.clone()).or_insert_with(|| {
                        order.push(record.problem.clone());
                        0
                    });
                    *count += 1;
                }
                if order.is_empty() {
                    return None;
                }

                Some(MetricReport {
                    title: format!("No of Occurrence per Problem - {}", area.display_name),
                    kind: MetricKind::Occurrences,
                    category_header: "Problem".to_string(),
                    value_header: format!("No of Occurrence in {}", input.label),
                    target_header: None,
                    rows: order
                        .into_iter()
                        .map(|problem| MetricRow {
                            value: counts[&problem] as f64,
                            category: problem,
                            target: None,
                        })
                        .collect(),
                    chart: None,
                })
            })
            .collect()
    }

    // ==========================================
    // 月度趋势（仅全部月份）
    // ==========================================

    fn monthly_trend(&self, input: &StatisticsInput<'_>) -> Option<MetricReport> {
        if input.period != ReportPeriod::AllMonths {
            return None;
        }
        let months = distinct_months(input.records);
        if months.is_empty() {
            return None;
        }

        let codes: HashSet<&str> = input
            .layout
            .areas
            .iter()
            .flat_map(|a| a.lines.iter())
            .map(|l| l.code.as_str())
            .collect();
        let available = input.layout.available_minutes();
        let target = input.targets.location_percent();

        let rows = months
            .into_iter()
            .map(|month| {
                let downtime = input
                    .records
                    .iter()
                    .filter(|r| r.month == Some(month) && codes.contains(r.line.as_str()))
                    .map(|r| r.total_minutes)
                    .fold(0, i64::saturating_add);
                MetricRow {
                    category: month_name(month).to_string(),
                    value: breakdown_percent(downtime, available, input.targets.working_days(month)),
                    target: Some(target),
                }
            })
            .collect();

        let mut report = MetricReport {
            title: format!("Monthly % of B/D - {}", input.label),
            kind: MetricKind::BreakdownPercent,
            category_header: "Month".to_string(),
            value_header: "% of B/D".to_string(),
            target_header: Some("Target in %".to_string()),
            rows,
            chart: None,
        };
        report.chart = Some(ChartSpec {
            title: report.title.clone(),
            target,
            y_max: percent_scale(report.max_value(), target),
        });
        Some(report)
    }
}

// ==========================================
// 内部工具
// ==========================================

/// 数据中出现的月份（升序）
fn distinct_months(records: &[EventRecord]) -> BTreeSet<u32> {
    records.iter().filter_map(|r| r.month).collect()
}

/// 某区域的累计量（产线精确匹配）
fn tally_area(records: &[&EventRecord], area: &AreaLayout) -> Tally {
    let codes: HashSet<&str> = area.lines.iter().map(|l| l.code.as_str()).collect();
    let mut tally = Tally {
        available: area.available_minutes(),
        ..Default::default()
    };
    for record in records.iter().filter(|r| codes.contains(r.line.as_str())) {
        tally.downtime = tally.downtime.saturating_add(record.total_minutes);
        if record.is_occurrence() {
            tally.occurrences += 1;
        }
    }
    tally
}

/// 区域按布局顺序划入分组: 第 1 个 → 组 1，第 2 个 → 组 2，其余 → 组 3
fn group_areas(layout: &PlantLayout) -> Vec<Vec<&AreaLayout>> {
    let mut groups: Vec<Vec<&AreaLayout>> = vec![Vec::new(); GROUP_SLOTS];
    for (rank, area) in layout.areas.iter().enumerate() {
        groups[rank.min(GROUP_SLOTS - 1)].push(area);
    }
    groups
}

fn group_title(areas: &[&AreaLayout]) -> String {
    areas
        .iter()
        .map(|a| a.display_name.as_str())
        .collect::<Vec<_>>()
        .join(" & ")
}

fn group_report(title: String, category_header: &str, rows: Vec<MetricRow>, target: f64, label: &str) -> MetricReport {
    let mut report = MetricReport {
        title: format!("{} - {}", title, label),
        kind: MetricKind::BreakdownPercent,
        category_header: category_header.to_string(),
        value_header: format!("% of B/D in {}", label),
        target_header: Some("Target in %".to_string()),
        rows,
        chart: None,
    };
    report.chart = Some(ChartSpec {
        title: report.title.clone(),
        target,
        y_max: percent_scale(report.max_value(), target),
    });
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::taxonomy::LineLayout;

    fn layout() -> PlantLayout {
        PlantLayout {
            areas: vec![AreaLayout {
                code: "A1".to_string(),
                display_name: "Area One".to_string(),
                lines: vec![
                    LineLayout {
                        code: "L1".to_string(),
                        display_name: "Line One".to_string(),
                        available_minutes: 1000,
                        machines: vec!["M1".to_string()],
                    },
                    LineLayout {
                        code: "L10".to_string(),
                        display_name: "Line Ten".to_string(),
                        available_minutes: 0,
                        machines: vec!["M9".to_string()],
                    },
                ],
            }],
        }
    }

    fn event(month: u32, line: &str, machine: &str, minutes: i64) -> EventRecord {
        EventRecord {
            month: Some(month),
            line: line.to_string(),
            machine: machine.to_string(),
            problem: "Jam".to_string(),
            total_minutes: minutes,
            ..Default::default()
        }
    }

    #[test]
    fn test_formulas_guard_zero() {
        assert_eq!(breakdown_percent(100, 0, 20.0), 0.0);
        assert_eq!(mtbf_days(100, 1000, 20.0, 0), 0.0);
        assert_eq!(mttr_minutes(100, 0), 0.0);
        assert!((breakdown_percent(200, 1000, 20.0) - 1.0).abs() < 1e-9);
        assert!((mtbf_days(200, 1000, 20.0, 2) - 6.875).abs() < 1e-3);
        assert_eq!(mttr_minutes(200, 2), 100.0);
    }

    #[test]
    fn test_exact_line_match() {
        let records = vec![event(1, "L1", "M1", 100), event(1, "L10", "M9", 50)];
        let targets = StatisticTargets::default();
        let layout = layout();
        let input = StatisticsInput {
            records: &records,
            layout: &layout,
            targets: &targets,
            period: ReportPeriod::Month(1),
            label: "jan",
        };
        let report = StatisticsEngine::new().compute(&input);

        let lines = report.section("Area One - jan").expect("应有产线分组");
        assert_eq!(lines.rows.len(), 2);
        let l1 = lines.row("Line One").expect("应有 L1");
        assert!((l1.value - breakdown_percent(100, 1000, 26.0)).abs() < 1e-9);
        assert_eq!(lines.row("Line Ten").expect("应有 L10").value, 0.0);
    }

    #[test]
    fn test_machine_nan_when_unavailable() {
        let records = vec![event(1, "L10", "M9", 50)];
        let targets = StatisticTargets::default();
        let layout = layout();
        let input = StatisticsInput {
            records: &records,
            layout: &layout,
            targets: &targets,
            period: ReportPeriod::Month(1),
            label: "jan",
        };
        let report = StatisticsEngine::new().compute(&input);
        let machines = report
            .sections
            .iter()
            .find(|s| s.category_header == "Machine")
            .expect("应有设备分组");
        let m9 = machines.row("M9").expect("应有 M9");
        assert!(m9.value.is_nan());
        assert_eq!(MetricKind::BreakdownPercent.format_value(m9.value), "N/A");
    }

    #[test]
    fn test_all_months_sums_working_days() {
        let records = vec![event(1, "L1", "M1", 10), event(3, "L1", "M1", 10)];
        let mut values = StatisticTargets::default().values().to_vec();
        values[0] = 20.0;
        values[2] = 22.0;
        let targets = StatisticTargets::from_values(values).expect("构造失败");
        let engine = StatisticsEngine::new();
        assert_eq!(engine.working_days(&records, &targets, ReportPeriod::AllMonths), 42.0);
        assert_eq!(engine.working_days(&records, &targets, ReportPeriod::Month(3)), 22.0);
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!(format_target(1.0), "1");
        assert_eq!(format_target(1.5), "1.5");
        assert_eq!(MetricKind::Occurrences.format_value(3.0), "3");
        assert_eq!(MetricKind::Mttr.format_value(6.87456), "6.87");
    }
}
