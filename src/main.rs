// ==========================================
// 设备故障停机统计系统 - 命令行入口
// ==========================================
// 用法: plant-downtime [--db PATH] [--lang en|zh-CN] [--json-log] <命令> [参数...]
// 数据库路径优先级: --db > PLANT_DOWNTIME_DB > 系统数据目录
// ==========================================

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use plant_downtime::api::TaxonomyForm;
use plant_downtime::app::{Session, SessionError, UnsavedChangesDecision};
use plant_downtime::config::{StatisticTargets, TARGET_QUESTIONS};
use plant_downtime::db;
use plant_downtime::domain::{EventColumn, ReportPeriod, TaxonomyPath};
use plant_downtime::report::{
    ExportOutcome, TableText, DEFAULT_CANVAS_WIDTH, MAX_CANVAS_WIDTH, MIN_CANVAS_WIDTH,
};
use plant_downtime::logging::{self, LogFormat};
use plant_downtime::i18n;

const USAGE: &str = "\
用法: plant-downtime [--db PATH] [--lang en|zh-CN] [--json-log] <命令>

命令:
  init-db [--seed]                          建表（可选写入参考工厂）
  tree                                      输出分类树
  resolve <区域> [产线] [设备] [故障] [措施]    查看路径详情
  add --area A [--line L --line-name N --minutes M] [--machine M] [--problem P] [--action C]
  remove --area A [--line L] [--machine M] [--problem P] [--action C]
  new <事件表>                               新建空事件表
  check <事件表>                             加载并校验事件表
  edit <事件表> <行> <列> <值>                 编辑单元格并保存
  suggest <事件表> <行> <列>                   单元格输入建议
  stats <事件表> [--month M|all] [--targets FILE] [--out PNG] [--width W]
  targets show [--targets FILE]
  targets set <21 个数值> [--targets FILE]
";

fn main() {
    if let Err(err) = run() {
        let message = match err.downcast_ref::<SessionError>() {
            Some(session_err) => session_err.user_message(),
            None => format!("{:#}", err),
        };
        eprintln!("错误: {}", message);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let mut args = Args::new(std::env::args().skip(1).collect());

    logging::init(LogFormat::from_json_flag(args.flag("--json-log")));
    if let Some(lang) = args.option("--lang")? {
        if !i18n::set_locale(&lang) {
            eprintln!("不支持的语言 {}，可选: {}", lang, i18n::SUPPORTED_LOCALES.join(", "));
        }
    }

    let db_path = match args.option("--db")? {
        Some(path) => PathBuf::from(path),
        None => db::default_db_path(),
    };
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("无法创建数据库目录: {}", parent.display()))?;
    }
    let db_path = db_path.to_string_lossy().to_string();

    let Some(command) = args.next() else {
        print!("{}", USAGE);
        return Ok(());
    };

    tracing::debug!(command = %command, db = %db_path, "执行命令");

    match command.as_str() {
        "init-db" => cmd_init_db(&db_path, args.flag("--seed")),
        "tree" => cmd_tree(&db_path),
        "resolve" => cmd_resolve(&db_path, args),
        "add" => cmd_taxonomy(&db_path, args, true),
        "remove" => cmd_taxonomy(&db_path, args, false),
        "new" => cmd_new(&db_path, args),
        "check" => cmd_check(&db_path, args),
        "edit" => cmd_edit(&db_path, args),
        "suggest" => cmd_suggest(&db_path, args),
        "stats" => cmd_stats(&db_path, args),
        "targets" => cmd_targets(&db_path, args),
        "help" | "--help" | "-h" => {
            print!("{}", USAGE);
            Ok(())
        }
        other => bail!("未知命令: {}\n\n{}", other, USAGE),
    }
}

// ==========================================
// 参数解析
// ==========================================

/// 极简参数表: 选项可以出现在任意位置，其余按顺序作为位置参数
struct Args {
    items: Vec<String>,
}

impl Args {
    fn new(items: Vec<String>) -> Self {
        Self { items }
    }

    fn flag(&mut self, name: &str) -> bool {
        match self.items.iter().position(|a| a == name) {
            Some(idx) => {
                self.items.remove(idx);
                true
            }
            None => false,
        }
    }

    fn option(&mut self, name: &str) -> Result<Option<String>> {
        let Some(idx) = self.items.iter().position(|a| a == name) else {
            return Ok(None);
        };
        if idx + 1 >= self.items.len() {
            bail!("选项 {} 缺少取值", name);
        }
        let value = self.items.remove(idx + 1);
        self.items.remove(idx);
        Ok(Some(value))
    }

    fn next(&mut self) -> Option<String> {
        if self.items.is_empty() {
            None
        } else {
            Some(self.items.remove(0))
        }
    }

    fn required(&mut self, what: &str) -> Result<String> {
        self.next().ok_or_else(|| anyhow!("缺少参数: {}", what))
    }

    fn rest(self) -> Vec<String> {
        self.items
    }
}

/// 列参数: 1 起的列号，或表头文本（第二个 AM/PM 写作 AM/PM.1）
fn parse_column(text: &str) -> Result<EventColumn> {
    if let Ok(n) = text.parse::<usize>() {
        return n
            .checked_sub(1)
            .and_then(EventColumn::from_index)
            .ok_or_else(|| anyhow!("列号超出范围: {}", n));
    }
    let upper = text.trim().to_ascii_uppercase();
    if upper == "AM/PM.1" {
        return Ok(EventColumn::EndMeridiem);
    }
    EventColumn::ALL
        .iter()
        .copied()
        .find(|c| c.header() == upper)
        .ok_or_else(|| anyhow!("未知列: {}", text))
}

fn parse_row(text: &str) -> Result<usize> {
    let row: usize = text.parse().with_context(|| format!("行号无效: {}", text))?;
    row.checked_sub(1).ok_or_else(|| anyhow!("行号从 1 开始"))
}

fn open_session(db_path: &str, targets: Option<String>) -> Result<Session> {
    let session = Session::open(db_path)?;
    Ok(match targets {
        Some(path) => session.with_targets_path(path),
        None => session,
    })
}

fn open_sheet(session: &mut Session, path: &Path) -> Result<()> {
    session.open_sheet(path, UnsavedChangesDecision::Discard)?;
    Ok(())
}

// ==========================================
// 分类库
// ==========================================

fn cmd_init_db(db_path: &str, seed: bool) -> Result<()> {
    let mut conn = db::open_and_init(db_path).context("初始化数据库失败")?;
    println!("数据库已就绪: {}", db_path);
    if seed {
        if db::seed_reference_plant(&mut conn).context("写入参考工厂失败")? {
            println!("已写入参考工厂分类数据");
        } else {
            println!("区域表已有数据，跳过参考数据写入");
        }
    }
    Ok(())
}

fn cmd_tree(db_path: &str) -> Result<()> {
    let session = Session::open(db_path)?;
    let tree = session.taxonomy().tree().map_err(SessionError::from)?;
    print!("{}", tree.render_text());
    Ok(())
}

fn cmd_resolve(db_path: &str, args: Args) -> Result<()> {
    let parts = args.rest();
    let Some(area) = parts.first() else {
        bail!("缺少参数: 区域");
    };

    let mut path = TaxonomyPath::area(area.as_str());
    if let Some(line) = parts.get(1) {
        path = path.with_line(line.as_str());
    }
    if let Some(machine) = parts.get(2) {
        path = path.with_machine(machine.as_str());
    }
    if let Some(problem) = parts.get(3) {
        path = path.with_problem(problem.as_str());
    }
    if let Some(action) = parts.get(4) {
        path = path.with_action(action.as_str());
    }

    let session = Session::open(db_path)?;
    let details = session.taxonomy().resolve(&path).map_err(SessionError::from)?;
    println!("{}", serde_json::to_string_pretty(&details)?);
    Ok(())
}

fn cmd_taxonomy(db_path: &str, mut args: Args, add: bool) -> Result<()> {
    let mut field = |name: &str| -> Result<String> { Ok(args.option(name)?.unwrap_or_default()) };
    let form = TaxonomyForm {
        area: field("--area")?,
        line: field("--line")?,
        line_display_name: field("--line-name")?,
        available_minutes: field("--minutes")?,
        machine: field("--machine")?,
        problem: field("--problem")?,
        action: field("--action")?,
    };

    let mut session = Session::open(db_path)?;
    let change = if add {
        session.add_taxonomy(&form)?
    } else {
        session.remove_taxonomy(&form)?
    };
    println!("{}", change.message);
    Ok(())
}

// ==========================================
// 事件表
// ==========================================

fn cmd_new(db_path: &str, mut args: Args) -> Result<()> {
    let path = PathBuf::from(args.required("事件表路径")?);
    let mut session = Session::open(db_path)?;
    session.new_sheet(&path, UnsavedChangesDecision::Discard)?;
    println!("已新建事件表: {}", path.display());
    Ok(())
}

fn cmd_check(db_path: &str, mut args: Args) -> Result<()> {
    let path = PathBuf::from(args.required("事件表路径")?);
    let mut session = Session::open(db_path)?;
    open_sheet(&mut session, &path)?;

    let records = session.grid().records();
    let minutes: i64 = records.iter().map(|r| r.total_minutes).sum();
    println!(
        "{}: {} 条记录, 停机合计 {} 分钟",
        session.sheet_label(),
        records.len(),
        minutes
    );
    Ok(())
}

fn cmd_edit(db_path: &str, mut args: Args) -> Result<()> {
    let path = PathBuf::from(args.required("事件表路径")?);
    let row = parse_row(&args.required("行号")?)?;
    let column = parse_column(&args.required("列")?)?;
    let value = args.rest().join(" ");

    let mut session = Session::open(db_path)?;
    open_sheet(&mut session, &path)?;
    let outcome = session.edit_cell(row, column, &value)?;

    if let Some(failure) = &outcome.failure {
        println!("已拒绝: {}", failure.message());
    }
    if !outcome.cleared.is_empty() {
        let cleared: Vec<&str> = outcome.cleared.iter().map(EventColumn::header).collect();
        println!("已清空下级列: {}", cleared.join(", "));
    }
    let rows = session.save()?;
    println!("已保存 {} 行", rows);
    Ok(())
}

fn cmd_suggest(db_path: &str, mut args: Args) -> Result<()> {
    let path = PathBuf::from(args.required("事件表路径")?);
    let row = parse_row(&args.required("行号")?)?;
    let column = parse_column(&args.required("列")?)?;

    let mut session = Session::open(db_path)?;
    open_sheet(&mut session, &path)?;
    for item in session.suggestions(row, column) {
        println!("{}", item);
    }
    Ok(())
}

// ==========================================
// 统计
// ==========================================

fn cmd_stats(db_path: &str, mut args: Args) -> Result<()> {
    let month = args.option("--month")?;
    let targets = args.option("--targets")?;
    let out = args.option("--out")?;
    let width = match args.option("--width")? {
        Some(w) => w.parse::<u32>().with_context(|| format!("宽度无效: {}", w))?,
        None => DEFAULT_CANVAS_WIDTH,
    };
    if !(MIN_CANVAS_WIDTH..=MAX_CANVAS_WIDTH).contains(&width) {
        bail!("宽度应在 {}..={} 之间: {}", MIN_CANVAS_WIDTH, MAX_CANVAS_WIDTH, width);
    }
    let path = PathBuf::from(args.required("事件表路径")?);

    let period = match month {
        Some(m) => ReportPeriod::parse(&m).ok_or_else(|| anyhow!("月份无效: {}", m))?,
        None => ReportPeriod::AllMonths,
    };

    let mut session = open_session(db_path, targets)?;
    open_sheet(&mut session, &path)?;
    let report = session.compute_statistics(period)?;

    println!(
        "{} ({}) - {} 条记录, 工作日 {}",
        report.label,
        report.period.label(),
        report.event_count,
        report.working_days
    );
    for section in &report.sections {
        println!("\n{}", section.title);
        print!("{}", TableText::from_report(section).to_plain());
    }

    if let Some(out) = out {
        match session.export_statistics(Path::new(&out), width)? {
            ExportOutcome::Written { path, width, height } => {
                println!("\n已导出: {} ({}x{})", path.display(), width, height);
            }
            ExportOutcome::NothingToExport => println!("\n没有可导出的统计结果"),
        }
    }
    Ok(())
}

fn cmd_targets(db_path: &str, mut args: Args) -> Result<()> {
    let targets = args.option("--targets")?;
    let action = args.required("show | set")?;
    let mut session = open_session(db_path, targets)?;

    match action.as_str() {
        "show" => {
            let values = session.targets()?.values().to_vec();
            for (question, value) in TARGET_QUESTIONS.iter().zip(values) {
                println!("{:<60} {}", question, value);
            }
            Ok(())
        }
        "set" => {
            let targets = StatisticTargets::parse_inputs(&args.rest()).map_err(SessionError::from)?;
            session.update_targets(targets)?;
            println!("目标值已保存: {}", session.targets_path().display());
            Ok(())
        }
        other => bail!("未知子命令: targets {}", other),
    }
}
