// ==========================================
// 设备故障停机统计系统 - 分类维护 API
// ==========================================
// 职责: 分类树查询、路径解析、表单式新增 / 删除
// 表单规则:
//   - 区域必选
//   - 按已填写的最深字段决定操作层级（产线 / 设备 / 故障 / 纠正措施）
//   - 跳级填写或上级不存在时提示“逐级添加”
//   - 新增产线需同时给出全称与每日可用分钟
// ==========================================

use std::sync::Arc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::taxonomy::{Area, PathDetails, TaxonomyPath, TaxonomyTree};
use crate::domain::types::TaxonomyLevel;
use crate::engine::cascade::TaxonomyCascade;
use crate::engine::validator::is_whole_number;
use crate::i18n::t_with_args;
use crate::repository::error::RepositoryError;
use crate::repository::taxonomy_repo::{NewLine, TaxonomyRepository};

// ==========================================
// DTO 定义
// ==========================================

/// 分类编辑表单（未填写的字段为空串）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaxonomyForm {
    pub area: String,
    pub line: String,
    pub line_display_name: String,
    pub available_minutes: String,
    pub machine: String,
    pub problem: String,
    pub action: String,
}

impl TaxonomyForm {
    /// 表单对应的分类路径
    ///
    /// 区域为空 → InvalidInput；中间字段为空而更深字段已填 → IncompleteForm
    pub fn to_path(&self) -> ApiResult<TaxonomyPath> {
        let area = self.area.trim();
        if area.is_empty() {
            return Err(ApiError::InvalidInput("未选择区域".to_string()));
        }

        let fields = [
            self.line.trim(),
            self.machine.trim(),
            self.problem.trim(),
            self.action.trim(),
        ];
        let depth = fields.iter().take_while(|f| !f.is_empty()).count();
        if fields[depth..].iter().any(|f| !f.is_empty()) {
            return Err(ApiError::IncompleteForm("表单跳级填写".to_string()));
        }

        let mut path = TaxonomyPath::area(area);
        let filled = &fields[..depth];
        if let Some(line) = filled.first() {
            path = path.with_line(*line);
        }
        if let Some(machine) = filled.get(1) {
            path = path.with_machine(*machine);
        }
        if let Some(problem) = filled.get(2) {
            path = path.with_problem(*problem);
        }
        if let Some(action) = filled.get(3) {
            path = path.with_action(*action);
        }
        Ok(path)
    }
}

/// 新增 / 删除结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyChange {
    pub level: TaxonomyLevel,
    pub name: String,
    pub message: String,
}

// ==========================================
// TaxonomyApi
// ==========================================

/// 分类维护 API
///
/// 职责：
/// 1. 分类树 / 级联映射查询
/// 2. 路径解析（选中节点详情）
/// 3. 表单式新增与删除（存在下级时拒绝删除）
pub struct TaxonomyApi {
    taxonomy_repo: Arc<TaxonomyRepository>,
}

impl TaxonomyApi {
    pub fn new(taxonomy_repo: Arc<TaxonomyRepository>) -> Self {
        Self { taxonomy_repo }
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn list_areas(&self) -> ApiResult<Vec<Area>> {
        Ok(self.taxonomy_repo.list_areas()?)
    }

    pub fn load_cascade(&self) -> ApiResult<TaxonomyCascade> {
        Ok(TaxonomyCascade::load(&self.taxonomy_repo)?)
    }

    /// 分类树（区域 → 产线 → 设备 → 故障 → 纠正措施）
    pub fn tree(&self) -> ApiResult<TaxonomyTree> {
        Ok(self.load_cascade()?.to_tree())
    }

    /// 解析选中路径，返回区域 / 产线详情
    pub fn resolve(&self, path: &TaxonomyPath) -> ApiResult<PathDetails> {
        Ok(self.taxonomy_repo.resolve_path(path)?)
    }

    // ==========================================
    // 新增
    // ==========================================

    /// 按表单新增一项
    #[instrument(skip(self, form), fields(area = %form.area))]
    pub fn add(&self, form: &TaxonomyForm) -> ApiResult<TaxonomyChange> {
        let path = form.to_path()?;
        let level = path
            .level()
            .ok_or_else(|| ApiError::IncompleteForm("分类路径不连续".to_string()))?;

        let result = match level {
            TaxonomyLevel::Area => {
                return Err(ApiError::InvalidInput("没有可新增的内容".to_string()));
            }
            TaxonomyLevel::Line => {
                let new_line = parse_new_line(form)?;
                self.taxonomy_repo.insert_line(&path.area, &new_line)
            }
            _ => self.taxonomy_repo.insert_child(&path),
        };

        // 上级不存在 → 提示逐级添加
        result.map_err(|e| match e {
            RepositoryError::NotFound { id, .. } => ApiError::IncompleteForm(id),
            other => other.into(),
        })?;

        let name = path.leaf_name().to_string();
        info!(level = %level, name = %name, "分类项新增成功");
        Ok(TaxonomyChange {
            level,
            message: t_with_args("api.added", &[("level", level.label()), ("name", &name)]),
            name,
        })
    }

    // ==========================================
    // 删除
    // ==========================================

    /// 按表单删除最深一级（存在下级时拒绝）
    #[instrument(skip(self, form), fields(area = %form.area))]
    pub fn remove(&self, form: &TaxonomyForm) -> ApiResult<TaxonomyChange> {
        let path = form.to_path()?;
        let level = path
            .level()
            .ok_or_else(|| ApiError::IncompleteForm("分类路径不连续".to_string()))?;
        if level == TaxonomyLevel::Area {
            return Err(ApiError::InvalidInput("区域不允许通过表单删除".to_string()));
        }

        self.taxonomy_repo.delete(&path).map_err(|e| match e {
            RepositoryError::NotFound { .. } => ApiError::NotFound(path.leaf_name().to_string()),
            other => other.into(),
        })?;

        let name = path.leaf_name().to_string();
        info!(level = %level, name = %name, "分类项删除成功");
        Ok(TaxonomyChange {
            level,
            message: t_with_args("api.removed", &[("level", level.label()), ("name", &name)]),
            name,
        })
    }
}

/// 表单中的产线信息
fn parse_new_line(form: &TaxonomyForm) -> ApiResult<NewLine> {
    let display_name = form.line_display_name.trim();
    if display_name.is_empty() {
        return Err(ApiError::InvalidInput("产线全称为空".to_string()));
    }
    let minutes = form.available_minutes.trim();
    if !is_whole_number(minutes) {
        return Err(ApiError::InvalidInput(format!("每日可用分钟必须为整数: {}", minutes)));
    }
    let available_minutes = minutes
        .parse::<i64>()
        .map_err(|e| ApiError::InvalidInput(format!("每日可用分钟超出范围: {}", e)))?;

    Ok(NewLine {
        code: form.line.trim().to_string(),
        display_name: display_name.to_string(),
        available_minutes,
    })
}
