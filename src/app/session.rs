// ==========================================
// 设备故障停机统计系统 - 会话对象
// ==========================================
// 职责: 持有当前事件表、编辑标记、分类级联、统计目标值与最近一次统计结果
// 生命周期: 新建 / 打开事件表时重置；保存 / 导出时读取
// 红线: 加载失败不改变当前表格；未保存修改必须经 Save / Discard / Cancel 决定
// ==========================================

use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::api::{ApiError, TaxonomyApi, TaxonomyChange, TaxonomyForm};
use crate::config::{default_targets_path, ConfigError, StatisticTargets};
use crate::domain::event::EventColumn;
use crate::domain::types::ReportPeriod;
use crate::engine::cascade::TaxonomyCascade;
use crate::engine::editor::{ClipboardAction, EditOutcome, EditorError, EventGrid};
use crate::engine::statistics::{StatisticsEngine, StatisticsInput, StatisticsReport};
use crate::importer::{self, ImportError};
use crate::report::{self, ExportOutcome, ReportError};
use crate::repository::{RepositoryError, TaxonomyRepository};

/// 未命名事件表的展示名
pub const UNTITLED_SHEET: &str = "Untitled";

/// 未保存修改的处理决定
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsavedChangesDecision {
    /// 保存到当前路径（未命名表格需用 SaveAs）
    Save,
    /// 保存到指定路径
    SaveAs(PathBuf),
    Discard,
    Cancel,
}

// ==========================================
// SessionError
// ==========================================
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    Editor(#[from] EditorError),

    #[error("当前事件表尚未指定保存路径")]
    NoSavePath,
}

impl SessionError {
    /// 面向用户的提示文案
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Import(e) => e.user_message(),
            SessionError::Api(e) => e.user_message(),
            SessionError::Editor(e) => e.user_message(),
            SessionError::NoSavePath => crate::i18n::t("session.no_save_path"),
            other => other.to_string(),
        }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

// ==========================================
// Session
// ==========================================
pub struct Session {
    taxonomy_repo: Arc<TaxonomyRepository>,
    taxonomy_api: TaxonomyApi,
    cascade: TaxonomyCascade,
    grid: EventGrid,
    sheet_path: Option<PathBuf>,
    edited: bool,
    targets_path: PathBuf,
    targets: Option<StatisticTargets>,
    last_report: Option<StatisticsReport>,
    report_stale: bool,
}

impl Session {
    /// 打开数据库并创建空会话
    ///
    /// # 参数
    /// - db_path: 分类数据库文件路径
    ///
    /// # 说明
    /// 统计目标值文件默认位于数据库同目录，首次统计时才读取
    #[instrument]
    pub fn open(db_path: &str) -> SessionResult<Self> {
        let taxonomy_repo = Arc::new(TaxonomyRepository::new(db_path)?);
        let cascade = TaxonomyCascade::load(&taxonomy_repo)?;
        info!(areas = cascade.areas().len(), "会话已创建");

        Ok(Self {
            taxonomy_api: TaxonomyApi::new(taxonomy_repo.clone()),
            taxonomy_repo,
            cascade,
            grid: EventGrid::new(),
            sheet_path: None,
            edited: false,
            targets_path: default_targets_path(Path::new(db_path)),
            targets: None,
            last_report: None,
            report_stale: false,
        })
    }

    /// 指定统计目标值文件位置（已读取的目标值失效）
    pub fn with_targets_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.targets_path = path.into();
        self.targets = None;
        self
    }

    pub fn grid(&self) -> &EventGrid {
        &self.grid
    }

    pub fn cascade(&self) -> &TaxonomyCascade {
        &self.cascade
    }

    pub fn taxonomy(&self) -> &TaxonomyApi {
        &self.taxonomy_api
    }

    pub fn sheet_path(&self) -> Option<&Path> {
        self.sheet_path.as_deref()
    }

    pub fn targets_path(&self) -> &Path {
        &self.targets_path
    }

    /// 自上次加载 / 保存以来是否有修改
    pub fn is_edited(&self) -> bool {
        self.edited
    }

    /// 事件表展示名（文件名去扩展名）
    pub fn sheet_label(&self) -> String {
        self.sheet_path
            .as_deref()
            .map(importer::sheet_label)
            .unwrap_or_else(|| UNTITLED_SHEET.to_string())
    }

    // ==========================================
    // 分类维护
    // ==========================================

    /// 重新读取分类级联（分类修改后调用）
    pub fn refresh_cascade(&mut self) -> SessionResult<()> {
        self.cascade = TaxonomyCascade::load(&self.taxonomy_repo)?;
        Ok(())
    }

    pub fn add_taxonomy(&mut self, form: &TaxonomyForm) -> SessionResult<TaxonomyChange> {
        let change = self.taxonomy_api.add(form)?;
        self.refresh_cascade()?;
        Ok(change)
    }

    pub fn remove_taxonomy(&mut self, form: &TaxonomyForm) -> SessionResult<TaxonomyChange> {
        let change = self.taxonomy_api.remove(form)?;
        self.refresh_cascade()?;
        Ok(change)
    }

    // ==========================================
    // 表格编辑
    // ==========================================

    pub fn edit_cell(&mut self, row: usize, column: EventColumn, value: &str) -> SessionResult<EditOutcome> {
        let outcome = self.grid.edit_cell(row, column, value, &self.cascade)?;
        self.edited = true;
        Ok(outcome)
    }

    pub fn suggestions(&self, row: usize, column: EventColumn) -> Vec<String> {
        self.grid.suggestions(row, column, &self.cascade)
    }

    pub fn copy_selection(&self, selection: &[(usize, EventColumn)]) -> SessionResult<String> {
        Ok(self.grid.copy_selection(selection)?)
    }

    /// 粘贴 / 撤销一律拒绝
    pub fn refuse(&self, action: ClipboardAction) -> SessionError {
        SessionError::Editor(self.grid.refuse(action))
    }

    // ==========================================
    // 文件操作
    // ==========================================

    /// 处理未保存修改
    ///
    /// # 返回
    /// - Ok(true): 可以继续后续操作
    /// - Ok(false): 用户取消
    pub fn resolve_unsaved(&mut self, decision: UnsavedChangesDecision) -> SessionResult<bool> {
        if !self.edited {
            return Ok(true);
        }
        match decision {
            UnsavedChangesDecision::Save | UnsavedChangesDecision::SaveAs(_) if self.grid.is_empty() => {
                info!("表格无内容，无需保存");
                Ok(true)
            }
            UnsavedChangesDecision::Save => {
                self.save()?;
                Ok(true)
            }
            UnsavedChangesDecision::SaveAs(path) => {
                self.save_as(&path)?;
                Ok(true)
            }
            UnsavedChangesDecision::Discard => {
                info!("放弃未保存的修改");
                Ok(true)
            }
            UnsavedChangesDecision::Cancel => Ok(false),
        }
    }

    /// 打开事件表
    ///
    /// 加载失败时保留当前表格；返回 false 表示用户取消
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub fn open_sheet(&mut self, path: &Path, decision: UnsavedChangesDecision) -> SessionResult<bool> {
        if !self.resolve_unsaved(decision)? {
            return Ok(false);
        }
        let grid = importer::load_event_sheet(path)?;
        self.replace_sheet(grid, path);
        Ok(true)
    }

    /// 新建空事件表并载入
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub fn new_sheet(&mut self, path: &Path, decision: UnsavedChangesDecision) -> SessionResult<bool> {
        if !self.resolve_unsaved(decision)? {
            return Ok(false);
        }
        let grid = importer::create_blank_sheet(path)?;
        self.replace_sheet(grid, path);
        Ok(true)
    }

    fn replace_sheet(&mut self, grid: EventGrid, path: &Path) {
        self.grid = grid;
        self.sheet_path = Some(path.to_path_buf());
        self.edited = false;
        self.last_report = None;
        self.report_stale = false;
    }

    /// 保存到当前路径
    pub fn save(&mut self) -> SessionResult<usize> {
        let path = self.sheet_path.clone().ok_or(SessionError::NoSavePath)?;
        self.save_as(&path)
    }

    /// 另存为（成功后当前路径切换为新路径）
    pub fn save_as(&mut self, path: &Path) -> SessionResult<usize> {
        let rows = importer::save_event_sheet(&self.grid, path)?;
        self.sheet_path = Some(path.to_path_buf());
        self.edited = false;
        Ok(rows)
    }

    /// 关闭前处理未保存修改；返回 false 表示用户取消
    pub fn close(&mut self, decision: UnsavedChangesDecision) -> SessionResult<bool> {
        self.resolve_unsaved(decision)
    }

    // ==========================================
    // 统计
    // ==========================================

    /// 统计目标值（首次访问时读取，之后复用直到重新编辑）
    pub fn targets(&mut self) -> SessionResult<&StatisticTargets> {
        if self.targets.is_none() {
            let loaded = StatisticTargets::load_if_exists(&self.targets_path)?.unwrap_or_default();
            info!(path = %self.targets_path.display(), "统计目标值已读取");
            self.targets = Some(loaded);
        }
        Ok(self.targets.get_or_insert_with(StatisticTargets::default))
    }

    /// 保存新的目标值并替换当前值
    pub fn update_targets(&mut self, targets: StatisticTargets) -> SessionResult<()> {
        targets.save(&self.targets_path)?;
        self.targets = Some(targets);
        Ok(())
    }

    /// 计算统计结果并保留为最近一次结果
    #[instrument(skip(self), fields(period = ?period))]
    pub fn compute_statistics(&mut self, period: ReportPeriod) -> SessionResult<&StatisticsReport> {
        let layout = self.taxonomy_repo.load_plant_layout()?;
        let records = self.grid.records();
        let label = self.sheet_label();
        let targets = self.targets()?.clone();

        let report = StatisticsEngine::new().compute(&StatisticsInput {
            records: &records,
            layout: &layout,
            targets: &targets,
            period,
            label: &label,
        });

        self.report_stale = self.edited;
        if self.report_stale {
            warn!("事件表有未保存的修改，统计结果基于当前编辑内容");
        }
        Ok(self.last_report.insert(report))
    }

    pub fn last_report(&self) -> Option<&StatisticsReport> {
        self.last_report.as_ref()
    }

    /// 最近一次统计是否基于未保存的修改
    pub fn report_is_stale(&self) -> bool {
        self.report_stale
    }

    /// 导出最近一次统计结果为 PNG（没有统计结果时不写文件）
    pub fn export_statistics(&self, path: &Path, width: u32) -> SessionResult<ExportOutcome> {
        match &self.last_report {
            Some(report) => Ok(report::export_png(report, path, width)?),
            None => {
                warn!("尚未计算统计结果，跳过导出");
                Ok(ExportOutcome::NothingToExport)
            }
        }
    }
}
