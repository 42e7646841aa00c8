// ==========================================
// 设备故障停机统计系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键约束必须每个连接开启）
// - 统一 busy_timeout
// - 分类库 (AREA / LINE / MACHINE / PROBLEM / CACTION) 建表与参考数据
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::path::PathBuf;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "PLANT_DOWNTIME_DB";

/// 默认数据库文件名
pub const DEFAULT_DB_FILE: &str = "plant_downtime.db";

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 默认数据库路径
///
/// 优先级: 环境变量 PLANT_DOWNTIME_DB > 系统数据目录 > 当前目录
pub fn default_db_path() -> PathBuf {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    match dirs::data_dir() {
        Some(dir) => dir.join("plant-downtime").join(DEFAULT_DB_FILE),
        None => PathBuf::from(DEFAULT_DB_FILE),
    }
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 创建分类库表结构（幂等）
///
/// 每一级通过外键引用父级；名称列唯一。
/// 删除不级联：存在子项时由仓储层拒绝删除。
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS AREA (
            ANO INTEGER PRIMARY KEY,
            ANAME TEXT NOT NULL UNIQUE,
            AONAME TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS LINE (
            LNO INTEGER PRIMARY KEY,
            ANO INTEGER NOT NULL,
            LNAME TEXT NOT NULL UNIQUE,
            LONAME TEXT NOT NULL UNIQUE,
            TAVAIL INTEGER NOT NULL,
            FOREIGN KEY (ANO) REFERENCES AREA(ANO)
        );

        CREATE TABLE IF NOT EXISTS MACHINE (
            MNO INTEGER PRIMARY KEY,
            ANO INTEGER NOT NULL,
            LNO INTEGER NOT NULL,
            MNAME TEXT NOT NULL,
            FOREIGN KEY (ANO) REFERENCES AREA(ANO),
            FOREIGN KEY (LNO) REFERENCES LINE(LNO)
        );

        CREATE TABLE IF NOT EXISTS PROBLEM (
            PNO INTEGER PRIMARY KEY,
            ANO INTEGER NOT NULL,
            LNO INTEGER NOT NULL,
            MNO INTEGER NOT NULL,
            PDESC TEXT NOT NULL,
            FOREIGN KEY (ANO) REFERENCES AREA(ANO),
            FOREIGN KEY (LNO) REFERENCES LINE(LNO),
            FOREIGN KEY (MNO) REFERENCES MACHINE(MNO)
        );

        CREATE TABLE IF NOT EXISTS CACTION (
            CNO INTEGER PRIMARY KEY,
            ANO INTEGER NOT NULL,
            LNO INTEGER NOT NULL,
            MNO INTEGER NOT NULL,
            PNO INTEGER NOT NULL,
            ADESC TEXT NOT NULL,
            FOREIGN KEY (ANO) REFERENCES AREA(ANO),
            FOREIGN KEY (LNO) REFERENCES LINE(LNO),
            FOREIGN KEY (MNO) REFERENCES MACHINE(MNO),
            FOREIGN KEY (PNO) REFERENCES PROBLEM(PNO)
        );

        CREATE INDEX IF NOT EXISTS idx_line_area ON LINE(ANO);
        CREATE INDEX IF NOT EXISTS idx_machine_line ON MACHINE(LNO);
        CREATE INDEX IF NOT EXISTS idx_problem_machine ON PROBLEM(MNO);
        CREATE INDEX IF NOT EXISTS idx_caction_problem ON CACTION(PNO);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 参考工厂: (区域代码, 区域全称)
const REFERENCE_AREAS: &[(&str, &str)] = &[
    ("SHOX", "Shox DA & FA"),
    ("FFFA", "FF FA"),
    ("OT CELL", "OT Cell"),
    ("IT GRD", "IT GRD"),
];

/// 参考工厂: (区域序号, 产线代码, 产线全称, 每日可用分钟)
const REFERENCE_LINES: &[(i64, &str, &str, i64)] = &[
    (1, "DA-1", "DA-1", 880),
    (1, "DA-2", "DA-2", 1260),
    (1, "DA-3", "DA-3", 1260),
    (1, "DA-4", "DA-4", 1260),
    (1, "DA-5", "DA-5", 880),
    (1, "DA-7", "DA-7", 1260),
    (1, "DA-9", "DA-9", 880),
    (1, "DA-10", "DA-10", 880),
    (1, "DA-11", "DA-11", 1260),
    (1, "VALVE ASSLY", "Valve Assly", 880),
    (1, "SA-3", "SA-3", 1260),
    (1, "SA-5", "SA-5", 440),
    (1, "WELDING", "Welding", 1260),
    (2, "FA-1", "FA-1", 1260),
    (2, "FA-2", "FA-2", 1260),
    (2, "FA-3", "FA-3", 1260),
    (2, "FA-4", "FA-4", 1260),
    (2, "FA-5", "FA-5", 1260),
    (2, "FA-6", "FA-6", 880),
    (2, "FA-7", "FA-7", 440),
    (2, "TFF-1", "TFF-1", 1260),
    (2, "TFF-2", "TFF-2", 880),
    (3, "CELL-1", "Cell-1", 1260),
    (3, "CELL-2", "Cell-2", 1260),
    (3, "CELL-3", "Cell-3", 1260),
    (3, "CELL-4", "Cell-4", 1260),
    (3, "CELL-5", "Cell-5", 1260),
    (3, "CELL-6", "Cell-6", 1260),
    (3, "CELL-7", "Cell-7", 1260),
    (3, "CELL-8", "Cell-8", 1260),
    (3, "CELL-9", "Cell-9", 1260),
    (3, "CELL-10", "Cell-10", 1260),
    (3, "CELL-11", "Cell-11", 1260),
    (3, "CELL-12", "Cell-12", 1260),
    (4, "ITG-1", "ITG-1", 1260),
    (4, "ITG-2", "ITG-2", 880),
];

/// 写入参考工厂的区域与产线（仅在 AREA 表为空时执行）
///
/// # 返回
/// - Ok(true): 已写入
/// - Ok(false): 表中已有数据，跳过
pub fn seed_reference_plant(conn: &mut Connection) -> rusqlite::Result<bool> {
    let existing: i64 = conn.query_row("SELECT COUNT(*) FROM AREA", [], |row| row.get(0))?;
    if existing > 0 {
        return Ok(false);
    }

    let tx = conn.transaction()?;
    for (idx, (code, name)) in REFERENCE_AREAS.iter().enumerate() {
        tx.execute(
            "INSERT INTO AREA (ANO, ANAME, AONAME) VALUES (?1, ?2, ?3)",
            rusqlite::params![idx as i64 + 1, code, name],
        )?;
    }
    for (ano, code, name, tavail) in REFERENCE_LINES {
        tx.execute(
            "INSERT INTO LINE (ANO, LNAME, LONAME, TAVAIL) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![ano, code, name, tavail],
        )?;
    }
    tx.commit()?;

    tracing::info!(
        areas = REFERENCE_AREAS.len(),
        lines = REFERENCE_LINES.len(),
        "已写入参考工厂分类数据"
    );
    Ok(true)
}

/// 打开数据库并确保表结构存在
pub fn open_and_init(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = open_sqlite_connection(db_path)?;
    init_schema(&conn)?;

    match read_schema_version(&conn)? {
        Some(v) if v > CURRENT_SCHEMA_VERSION => {
            tracing::warn!(
                found = v,
                expected = CURRENT_SCHEMA_VERSION,
                "数据库 schema_version 高于当前程序版本"
            );
        }
        _ => {}
    }
    Ok(conn)
}
