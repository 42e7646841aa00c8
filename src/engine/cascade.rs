// ==========================================
// 设备故障停机统计系统 - 分类级联构建器
// ==========================================
// 职责: 由全层级查询结果构建四张有序映射
//   区域→产线 / 产线→设备 / 设备→故障 / 故障→纠正措施
// 用途: 树形视图 + 表格单元格级联建议
// 红线: 无下级的父项也必须出现（空列表），不能省略
// ==========================================

use crate::domain::taxonomy::{natural_line_key, TaxonomyTree, TreeNode};
use crate::domain::types::TaxonomyLevel;
use crate::repository::{CascadeRow, RepositoryResult, TaxonomyRepository};
use std::collections::HashMap;
use tracing::{debug, instrument};

// ==========================================
// OrderedChildren - 保持插入顺序的父→子映射
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedChildren {
    keys: Vec<String>,
    children: HashMap<String, Vec<String>>,
}

impl OrderedChildren {
    /// 登记父项，并在子项非空且未出现过时追加
    fn record(&mut self, parent: &str, child: Option<&str>) {
        if !self.children.contains_key(parent) {
            self.keys.push(parent.to_string());
            self.children.insert(parent.to_string(), Vec::new());
        }
        let Some(child) = child else { return };
        if let Some(list) = self.children.get_mut(parent) {
            if !list.iter().any(|c| c == child) {
                list.push(child.to_string());
            }
        }
    }

    pub fn get(&self, parent: &str) -> Option<&[String]> {
        self.children.get(parent).map(Vec::as_slice)
    }

    /// 父项列表（插入顺序）
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.keys
            .iter()
            .map(move |k| (k.as_str(), self.get(k).unwrap_or(&[])))
    }
}

// ==========================================
// TaxonomyCascade - 四级级联映射
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaxonomyCascade {
    pub area_lines: OrderedChildren,
    pub line_machines: OrderedChildren,
    pub machine_problems: OrderedChildren,
    pub problem_actions: OrderedChildren,
}

impl TaxonomyCascade {
    /// 从数据库加载
    #[instrument(skip(repo))]
    pub fn load(repo: &TaxonomyRepository) -> RepositoryResult<Self> {
        let rows = repo.fetch_cascade_rows()?;
        let cascade = Self::from_rows(rows);
        debug!(
            areas = cascade.area_lines.len(),
            lines = cascade.line_machines.len(),
            "分类级联已构建"
        );
        Ok(cascade)
    }

    /// 一次遍历折叠查询结果
    ///
    /// 行先按 (区域名, 产线自然键) 稳定排序，同一产线内保持查询顺序
    pub fn from_rows(mut rows: Vec<CascadeRow>) -> Self {
        rows.sort_by(|a, b| {
            a.area.cmp(&b.area).then_with(|| {
                let ka = a.line.as_deref().map(natural_line_key);
                let kb = b.line.as_deref().map(natural_line_key);
                ka.cmp(&kb)
            })
        });

        let mut cascade = Self::default();
        for row in &rows {
            cascade.area_lines.record(&row.area, row.line.as_deref());
            if let Some(line) = row.line.as_deref() {
                cascade.line_machines.record(line, row.machine.as_deref());
            }
            if let Some(machine) = row.machine.as_deref() {
                cascade.machine_problems.record(machine, row.problem.as_deref());
            }
            if let Some(problem) = row.problem.as_deref() {
                cascade.problem_actions.record(problem, row.action.as_deref());
            }
        }
        cascade
    }

    /// 区域列表
    pub fn areas(&self) -> &[String] {
        self.area_lines.keys()
    }

    fn map_for(&self, parent_level: TaxonomyLevel) -> Option<&OrderedChildren> {
        match parent_level {
            TaxonomyLevel::Area => Some(&self.area_lines),
            TaxonomyLevel::Line => Some(&self.line_machines),
            TaxonomyLevel::Machine => Some(&self.machine_problems),
            TaxonomyLevel::Problem => Some(&self.problem_actions),
            TaxonomyLevel::CorrectiveAction => None,
        }
    }

    /// 指定父项的直接下级（未知父项返回空）
    pub fn children_of(&self, parent_level: TaxonomyLevel, parent: &str) -> &[String] {
        self.map_for(parent_level)
            .and_then(|m| m.get(parent.trim()))
            .unwrap_or(&[])
    }

    /// 某一层级的可选值
    ///
    /// 区域不依赖父项；其余层级取父项的直接下级
    pub fn options_for(&self, level: TaxonomyLevel, parent: Option<&str>) -> &[String] {
        match (level.parent(), parent) {
            (None, _) => self.areas(),
            (Some(parent_level), Some(parent)) => self.children_of(parent_level, parent),
            (Some(_), None) => &[],
        }
    }

    /// 取值是否属于该层级在父项下的可选值
    pub fn contains(&self, level: TaxonomyLevel, parent: Option<&str>, value: &str) -> bool {
        let value = value.trim();
        self.options_for(level, parent).iter().any(|v| v == value)
    }

    /// 构建树形视图模型
    pub fn to_tree(&self) -> TaxonomyTree {
        let mut tree = TaxonomyTree::default();
        for (area, lines) in self.area_lines.iter() {
            let mut area_node = TreeNode::new(TaxonomyLevel::Area, area);
            for line in lines {
                let mut line_node = TreeNode::new(TaxonomyLevel::Line, line);
                for machine in self.children_of(TaxonomyLevel::Line, line) {
                    let mut machine_node = TreeNode::new(TaxonomyLevel::Machine, machine);
                    for problem in self.children_of(TaxonomyLevel::Machine, machine) {
                        let mut problem_node = TreeNode::new(TaxonomyLevel::Problem, problem);
                        for action in self.children_of(TaxonomyLevel::Problem, problem) {
                            problem_node
                                .children
                                .push(TreeNode::new(TaxonomyLevel::CorrectiveAction, action));
                        }
                        machine_node.children.push(problem_node);
                    }
                    line_node.children.push(machine_node);
                }
                area_node.children.push(line_node);
            }
            tree.roots.push(area_node);
        }
        tree
    }
}
