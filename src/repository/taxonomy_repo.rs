// ==========================================
// 设备故障停机统计系统 - 分类仓储
// ==========================================
// 职责: 管理 AREA / LINE / MACHINE / PROBLEM / CACTION 五张表
// 约束: 每个操作独立打开连接；写操作在单个事务内完成
// 约束: 存在下级时禁止删除（不级联）
// ==========================================

use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::taxonomy::{
    natural_line_key, Area, AreaLayout, Line, LineLayout, PathDetails, PlantLayout, TaxonomyPath,
};
use crate::domain::types::TaxonomyLevel;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use tracing::{info, warn};

/// 级联查询的一行（LEFT JOIN 结果，缺失的下级为 None）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeRow {
    pub area: String,
    pub line: Option<String>,
    pub machine: Option<String>,
    pub problem: Option<String>,
    pub action: Option<String>,
}

/// 新增产线所需字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLine {
    pub code: String,
    pub display_name: String,
    pub available_minutes: i64,
}

/// 路径上各级的主键
#[derive(Debug, Clone, Copy, Default)]
struct PathIds {
    area: i64,
    line: Option<i64>,
    machine: Option<i64>,
    problem: Option<i64>,
    action: Option<i64>,
}

impl PathIds {
    fn leaf_id(&self) -> i64 {
        self.action
            .or(self.problem)
            .or(self.machine)
            .or(self.line)
            .unwrap_or(self.area)
    }
}

// ==========================================
// TaxonomyRepository
// ==========================================
pub struct TaxonomyRepository {
    db_path: String,
}

impl TaxonomyRepository {
    /// 创建仓储并确保表结构存在
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        init_schema(&conn)?;
        Ok(Self {
            db_path: db_path.to_string(),
        })
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    fn get_conn(&self) -> RepositoryResult<Connection> {
        Ok(open_sqlite_connection(&self.db_path)?)
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 列出全部区域（按 ANO 排序）
    pub fn list_areas(&self) -> RepositoryResult<Vec<Area>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT ANO, TRIM(ANAME), TRIM(AONAME) FROM AREA ORDER BY ANO ASC")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Area {
                    id: row.get(0)?,
                    code: row.get(1)?,
                    display_name: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 按区域代码查找
    pub fn find_area(&self, code: &str) -> RepositoryResult<Option<Area>> {
        let conn = self.get_conn()?;
        let area = conn
            .query_row(
                "SELECT ANO, TRIM(ANAME), TRIM(AONAME) FROM AREA WHERE TRIM(ANAME) = ?1",
                params![code.trim()],
                |row| {
                    Ok(Area {
                        id: row.get(0)?,
                        code: row.get(1)?,
                        display_name: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(area)
    }

    /// 列出区域下的产线（按自然键排序）
    pub fn list_lines(&self, area_id: i64) -> RepositoryResult<Vec<Line>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT LNO, ANO, TRIM(LNAME), TRIM(LONAME), TAVAIL
            FROM LINE
            WHERE ANO = ?1
            "#,
        )?;
        let mut rows = stmt
            .query_map(params![area_id], |row| {
                Ok(Line {
                    id: row.get(0)?,
                    area_id: row.get(1)?,
                    code: row.get(2)?,
                    display_name: row.get(3)?,
                    available_minutes: row.get(4)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        rows.sort_by_key(|l| natural_line_key(&l.code));
        Ok(rows)
    }

    /// 全层级 LEFT JOIN 查询（区域名排序，产线顺序由级联构建器处理）
    pub fn fetch_cascade_rows(&self) -> RepositoryResult<Vec<CascadeRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT TRIM(a.ANAME), TRIM(l.LNAME), TRIM(m.MNAME), TRIM(p.PDESC), TRIM(c.ADESC)
            FROM AREA a
                LEFT JOIN LINE l ON a.ANO = l.ANO
                LEFT JOIN MACHINE m ON l.LNO = m.LNO
                LEFT JOIN PROBLEM p ON m.MNO = p.MNO
                LEFT JOIN CACTION c ON p.PNO = c.PNO
            ORDER BY a.ANAME, l.LNO, m.MNO, p.PNO, c.CNO
            "#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(CascadeRow {
                    area: row.get(0)?,
                    line: row.get(1)?,
                    machine: row.get(2)?,
                    problem: row.get(3)?,
                    action: row.get(4)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 统计用布局快照: 区域 → 产线(可用分钟) → 设备
    pub fn load_plant_layout(&self) -> RepositoryResult<PlantLayout> {
        let conn = self.get_conn()?;

        let mut area_stmt =
            conn.prepare("SELECT ANO, TRIM(ANAME), TRIM(AONAME) FROM AREA ORDER BY ANO ASC")?;
        let areas = area_stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        let mut line_stmt =
            conn.prepare("SELECT LNO, TRIM(LNAME), TRIM(LONAME), TAVAIL FROM LINE WHERE ANO = ?1")?;
        let mut machine_stmt =
            conn.prepare("SELECT TRIM(MNAME) FROM MACHINE WHERE LNO = ?1 ORDER BY MNO ASC")?;

        let mut layout = PlantLayout::default();
        for (ano, code, display_name) in areas {
            let raw_lines = line_stmt
                .query_map(params![ano], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                })?
                .collect::<SqliteResult<Vec<_>>>()?;

            let mut lines = Vec::with_capacity(raw_lines.len());
            for (lno, line_code, line_display_name, available_minutes) in raw_lines {
                let machines = machine_stmt
                    .query_map(params![lno], |row| row.get::<_, String>(0))?
                    .collect::<SqliteResult<Vec<_>>>()?;
                lines.push(LineLayout {
                    code: line_code,
                    display_name: line_display_name,
                    available_minutes,
                    machines,
                });
            }
            lines.sort_by_key(|l| natural_line_key(&l.code));

            layout.areas.push(AreaLayout {
                code,
                display_name,
                lines,
            });
        }
        Ok(layout)
    }

    /// 解析分类路径，返回区域/产线的详细信息
    ///
    /// 路径中的每一级都必须存在；比路径更深的字段为空
    pub fn resolve_path(&self, path: &TaxonomyPath) -> RepositoryResult<PathDetails> {
        let conn = self.get_conn()?;
        let ids = resolve_ids(&conn, path)?;

        let (area_code, area_display_name): (String, String) = conn.query_row(
            "SELECT TRIM(ANAME), TRIM(AONAME) FROM AREA WHERE ANO = ?1",
            params![ids.area],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let line = match ids.line {
            Some(lno) => Some(conn.query_row(
                "SELECT TRIM(LNAME), TRIM(LONAME), TAVAIL FROM LINE WHERE LNO = ?1",
                params![lno],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )?),
            None => None,
        };

        Ok(PathDetails {
            area_code,
            area_display_name,
            line_code: line.as_ref().map(|l| l.0.clone()),
            line_display_name: line.as_ref().map(|l| l.1.clone()),
            available_minutes: line.as_ref().map(|l| l.2),
            machine: path.machine.clone(),
            problem: path.problem.clone(),
            action: path.action.clone(),
        })
    }

    // ==========================================
    // 写入
    // ==========================================

    /// 新增区域
    pub fn insert_area(&self, code: &str, display_name: &str) -> RepositoryResult<i64> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        if find_area_id(&tx, code)?.is_some() {
            return Err(duplicate(TaxonomyLevel::Area, code));
        }
        tx.execute(
            "INSERT INTO AREA (ANAME, AONAME) VALUES (?1, ?2)",
            params![code.trim(), display_name.trim()],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        info!(area = code, "区域已新增");
        Ok(id)
    }

    /// 新增产线
    pub fn insert_line(&self, area_code: &str, line: &NewLine) -> RepositoryResult<i64> {
        if line.available_minutes < 0 {
            return Err(RepositoryError::ValidationError(format!(
                "可用分钟不能为负数: {}",
                line.available_minutes
            )));
        }

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let ano = find_area_id(&tx, area_code)?.ok_or_else(|| not_found(TaxonomyLevel::Area, area_code))?;
        let exists: Option<i64> = tx
            .query_row(
                "SELECT LNO FROM LINE WHERE TRIM(LNAME) = ?1",
                params![line.code.trim()],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            return Err(duplicate(TaxonomyLevel::Line, &line.code));
        }

        tx.execute(
            "INSERT INTO LINE (ANO, LNAME, LONAME, TAVAIL) VALUES (?1, ?2, ?3, ?4)",
            params![
                ano,
                line.code.trim(),
                line.display_name.trim(),
                line.available_minutes
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        info!(area = area_code, line = %line.code, "产线已新增");
        Ok(id)
    }

    /// 新增设备 / 故障 / 纠正措施
    ///
    /// 路径最深一级为待新增项，其余各级必须已存在
    pub fn insert_child(&self, path: &TaxonomyPath) -> RepositoryResult<i64> {
        let level = path
            .level()
            .ok_or_else(|| RepositoryError::ValidationError("分类路径不连续".to_string()))?;
        let parent = match (level, path.parent()) {
            (TaxonomyLevel::Machine | TaxonomyLevel::Problem | TaxonomyLevel::CorrectiveAction, Some(p)) => p,
            _ => {
                return Err(RepositoryError::ValidationError(format!(
                    "{} 不能通过路径新增",
                    level
                )))
            }
        };
        let name = path.leaf_name().trim().to_string();
        if name.is_empty() {
            return Err(RepositoryError::ValidationError(format!("{} 名称为空", level)));
        }

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let ids = resolve_ids(&tx, &parent)?;
        if find_child_id(&tx, level, ids.leaf_id(), &name)?.is_some() {
            return Err(duplicate(level, &name));
        }

        let ano = ids.area;
        let lno = ids.line.unwrap_or_default();
        match level {
            TaxonomyLevel::Machine => tx.execute(
                "INSERT INTO MACHINE (ANO, LNO, MNAME) VALUES (?1, ?2, ?3)",
                params![ano, lno, name],
            )?,
            TaxonomyLevel::Problem => tx.execute(
                "INSERT INTO PROBLEM (ANO, LNO, MNO, PDESC) VALUES (?1, ?2, ?3, ?4)",
                params![ano, lno, ids.machine.unwrap_or_default(), name],
            )?,
            _ => tx.execute(
                "INSERT INTO CACTION (ANO, LNO, MNO, PNO, ADESC) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    ano,
                    lno,
                    ids.machine.unwrap_or_default(),
                    ids.problem.unwrap_or_default(),
                    name
                ],
            )?,
        };
        let id = tx.last_insert_rowid();
        tx.commit()?;

        info!(level = %level, name = %name, "分类项已新增");
        Ok(id)
    }

    /// 删除路径最深一级
    ///
    /// 存在下级时拒绝（HasChildren），不做级联删除
    pub fn delete(&self, path: &TaxonomyPath) -> RepositoryResult<()> {
        let level = path
            .level()
            .ok_or_else(|| RepositoryError::ValidationError("分类路径不连续".to_string()))?;

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let ids = resolve_ids(&tx, path)?;
        let id = ids.leaf_id();

        if let Some(child) = level.child() {
            let count = count_children(&tx, level, id)?;
            if count > 0 {
                warn!(level = %level, name = path.leaf_name(), count, "存在下级，拒绝删除");
                return Err(RepositoryError::HasChildren {
                    entity: level.label().to_string(),
                    name: path.leaf_name().to_string(),
                    child: child.label().to_string(),
                    count,
                });
            }
        }

        let sql = format!("DELETE FROM {} WHERE {} = ?1", level.table_name(), id_column(level));
        let affected = tx.execute(&sql, params![id])?;
        if affected != 1 {
            return Err(RepositoryError::WriteNotApplied(format!(
                "预期删除 1 行，实际 {} 行",
                affected
            )));
        }
        tx.commit()?;

        info!(level = %level, name = path.leaf_name(), "分类项已删除");
        Ok(())
    }
}

// ==========================================
// 事务内辅助函数
// ==========================================

fn id_column(level: TaxonomyLevel) -> &'static str {
    match level {
        TaxonomyLevel::Area => "ANO",
        TaxonomyLevel::Line => "LNO",
        TaxonomyLevel::Machine => "MNO",
        TaxonomyLevel::Problem => "PNO",
        TaxonomyLevel::CorrectiveAction => "CNO",
    }
}

fn not_found(level: TaxonomyLevel, name: &str) -> RepositoryError {
    RepositoryError::NotFound {
        entity: level.label().to_string(),
        id: name.trim().to_string(),
    }
}

fn duplicate(level: TaxonomyLevel, name: &str) -> RepositoryError {
    RepositoryError::Duplicate {
        entity: level.label().to_string(),
        name: name.trim().to_string(),
    }
}

fn find_area_id(conn: &Connection, code: &str) -> RepositoryResult<Option<i64>> {
    Ok(conn
        .query_row(
            "SELECT ANO FROM AREA WHERE TRIM(ANAME) = ?1",
            params![code.trim()],
            |row| row.get(0),
        )
        .optional()?)
}

/// 在父级下按名称查找子项主键
fn find_child_id(
    conn: &Connection,
    level: TaxonomyLevel,
    parent_id: i64,
    name: &str,
) -> RepositoryResult<Option<i64>> {
    let sql = match level {
        TaxonomyLevel::Area => return find_area_id(conn, name),
        TaxonomyLevel::Line => "SELECT LNO FROM LINE WHERE ANO = ?1 AND TRIM(LNAME) = ?2",
        TaxonomyLevel::Machine => "SELECT MNO FROM MACHINE WHERE LNO = ?1 AND TRIM(MNAME) = ?2",
        TaxonomyLevel::Problem => "SELECT PNO FROM PROBLEM WHERE MNO = ?1 AND TRIM(PDESC) = ?2",
        TaxonomyLevel::CorrectiveAction => {
            "SELECT CNO FROM CACTION WHERE PNO = ?1 AND TRIM(ADESC) = ?2"
        }
    };
    Ok(conn
        .query_row(sql, params![parent_id, name.trim()], |row| row.get(0))
        .optional()?)
}

/// 逐级解析路径主键，第一个缺失的层级返回 NotFound
fn resolve_ids(conn: &Connection, path: &TaxonomyPath) -> RepositoryResult<PathIds> {
    if path.level().is_none() {
        return Err(RepositoryError::ValidationError("分类路径不连续".to_string()));
    }

    let mut ids = PathIds {
        area: find_area_id(conn, &path.area)?.ok_or_else(|| not_found(TaxonomyLevel::Area, &path.area))?,
        ..Default::default()
    };

    let steps = [
        (TaxonomyLevel::Line, path.line.as_deref()),
        (TaxonomyLevel::Machine, path.machine.as_deref()),
        (TaxonomyLevel::Problem, path.problem.as_deref()),
        (TaxonomyLevel::CorrectiveAction, path.action.as_deref()),
    ];
    let mut parent_id = ids.area;
    for (level, name) in steps {
        let Some(name) = name else { break };
        let id = find_child_id(conn, level, parent_id, name)?.ok_or_else(|| not_found(level, name))?;
        match level {
            TaxonomyLevel::Line => ids.line = Some(id),
            TaxonomyLevel::Machine => ids.machine = Some(id),
            TaxonomyLevel::Problem => ids.problem = Some(id),
            _ => ids.action = Some(id),
        }
        parent_id = id;
    }
    Ok(ids)
}

fn count_children(conn: &Connection, level: TaxonomyLevel, id: i64) -> RepositoryResult<i64> {
    let Some(child) = level.child() else {
        return Ok(0);
    };
    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE {} = ?1",
        child.table_name(),
        id_column(level)
    );
    Ok(conn.query_row(&sql, params![id], |row| row.get(0))?)
}
