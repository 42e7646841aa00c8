// ==========================================
// 设备故障停机统计系统 - 分类领域模型
// ==========================================
// 层级: 区域(AREA) → 产线(LINE) → 设备(MACHINE) → 故障(PROBLEM) → 纠正措施(CACTION)
// 约束: 每一级由父级独占；存在子项时禁止删除（不级联）
// ==========================================

use crate::domain::types::TaxonomyLevel;
use serde::{Deserialize, Serialize};

// ==========================================
// Area - 区域
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    pub id: i64,
    pub code: String,         // 区域代码 (ANAME, 唯一)
    pub display_name: String, // 区域全称 (AONAME, 唯一)
}

// ==========================================
// Line - 产线
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    pub id: i64,
    pub area_id: i64,
    pub code: String,           // 产线代码 (LNAME, 唯一)
    pub display_name: String,   // 产线全称 (LONAME, 唯一)
    pub available_minutes: i64, // 每日可用分钟 (TAVAIL)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    pub id: i64,
    pub line_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub id: i64,
    pub machine_id: i64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectiveAction {
    pub id: i64,
    pub problem_id: i64,
    pub description: String,
}

// ==========================================
// TaxonomyPath - 显式分类路径
// ==========================================
// 替代“从树控件逐级向上查找父节点”的做法：
// 路径直接由数据模型给出，深度即所选层级。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyPath {
    pub area: String,
    pub line: Option<String>,
    pub machine: Option<String>,
    pub problem: Option<String>,
    pub action: Option<String>,
}

impl TaxonomyPath {
    pub fn area(area: impl Into<String>) -> Self {
        Self {
            area: area.into(),
            ..Default::default()
        }
    }

    pub fn with_line(mut self, line: impl Into<String>) -> Self {
        self.line = Some(line.into());
        self
    }

    pub fn with_machine(mut self, machine: impl Into<String>) -> Self {
        self.machine = Some(machine.into());
        self
    }

    pub fn with_problem(mut self, problem: impl Into<String>) -> Self {
        self.problem = Some(problem.into());
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// 路径指向的最深层级
    ///
    /// 中间层缺失时（例如有设备但无产线）返回 None
    pub fn level(&self) -> Option<TaxonomyLevel> {
        let parts = [
            self.line.as_deref(),
            self.machine.as_deref(),
            self.problem.as_deref(),
            self.action.as_deref(),
        ];
        let depth = parts.iter().take_while(|p| p.is_some()).count();
        if parts[depth..].iter().any(|p| p.is_some()) {
            return None;
        }
        Some(match depth {
            0 => TaxonomyLevel::Area,
            1 => TaxonomyLevel::Line,
            2 => TaxonomyLevel::Machine,
            3 => TaxonomyLevel::Problem,
            _ => TaxonomyLevel::CorrectiveAction,
        })
    }

    /// 最深一级的名称
    pub fn leaf_name(&self) -> &str {
        self.action
            .as_deref()
            .or(self.problem.as_deref())
            .or(self.machine.as_deref())
            .or(self.line.as_deref())
            .unwrap_or(&self.area)
    }

    /// 去掉最深一级后的父路径（区域路径无父路径）
    pub fn parent(&self) -> Option<TaxonomyPath> {
        let mut parent = self.clone();
        if parent.action.take().is_some()
            || parent.problem.take().is_some()
            || parent.machine.take().is_some()
            || parent.line.take().is_some()
        {
            Some(parent)
        } else {
            None
        }
    }
}

/// 产线代码的自然排序键: "DA-2" 排在 "DA-10" 之前
///
/// 键为 (非数字前缀, 末尾数字)，无数字后缀时数字部分为 0
pub fn natural_line_key(code: &str) -> (String, u64) {
    let trimmed = code.trim();
    let digits_start = trimmed
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());
    let (prefix, digits) = trimmed.split_at(digits_start);
    (prefix.to_string(), digits.parse().unwrap_or(0))
}

// ==========================================
// PlantLayout - 统计用工厂布局快照
// ==========================================
// 区域按 ANO 顺序，产线按自然键顺序
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineLayout {
    pub code: String,
    pub display_name: String,
    pub available_minutes: i64,
    pub machines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaLayout {
    pub code: String,
    pub display_name: String,
    pub lines: Vec<LineLayout>,
}

impl AreaLayout {
    /// 区域内全部产线每日可用分钟之和
    pub fn available_minutes(&self) -> i64 {
        self.lines.iter().map(|l| l.available_minutes).fold(0, i64::saturating_add)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlantLayout {
    pub areas: Vec<AreaLayout>,
}

impl PlantLayout {
    pub fn find_area(&self, code: &str) -> Option<&AreaLayout> {
        self.areas.iter().find(|a| a.code == code)
    }

    pub fn find_line(&self, code: &str) -> Option<&LineLayout> {
        self.areas
            .iter()
            .flat_map(|a| a.lines.iter())
            .find(|l| l.code == code)
    }

    /// 全厂每日可用分钟之和
    pub fn available_minutes(&self) -> i64 {
        self.areas.iter().map(AreaLayout::available_minutes).fold(0, i64::saturating_add)
    }
}

// ==========================================
// PathDetails - 路径解析结果
// ==========================================
/// 选中某个分类节点后展示的详细信息
///
/// 比所选层级更深的字段一律为空（强制重新选择）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathDetails {
    pub area_code: String,
    pub area_display_name: String,
    pub line_code: Option<String>,
    pub line_display_name: Option<String>,
    pub available_minutes: Option<i64>,
    pub machine: Option<String>,
    pub problem: Option<String>,
    pub action: Option<String>,
}

// ==========================================
// TaxonomyTree - 树形视图模型
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub level: TaxonomyLevel,
    pub name: String,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(level: TaxonomyLevel, name: impl Into<String>) -> Self {
        Self {
            level,
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// 子树节点总数（含自身）
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::node_count).sum::<usize>()
    }

    pub fn find_child(&self, name: &str) -> Option<&TreeNode> {
        self.children.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyTree {
    pub roots: Vec<TreeNode>,
}

impl TaxonomyTree {
    pub fn find_area(&self, area: &str) -> Option<&TreeNode> {
        self.roots.iter().find(|r| r.name == area)
    }

    /// 以缩进文本形式输出（命令行查看用）
    pub fn render_text(&self) -> String {
        fn walk(node: &TreeNode, depth: usize, out: &mut String) {
            out.push_str(&"  ".repeat(depth));
            out.push_str(&node.name);
            out.push('\n');
            for child in &node.children {
                walk(child, depth + 1, out);
            }
        }

        let mut out = String::new();
        for root in &self.roots {
            walk(root, 0, &mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_level() {
        assert_eq!(TaxonomyPath::area("A1").level(), Some(TaxonomyLevel::Area));
        assert_eq!(
            TaxonomyPath::area("A1").with_line("L1").with_machine("M1").level(),
            Some(TaxonomyLevel::Machine)
        );

        let gap = TaxonomyPath {
            area: "A1".to_string(),
            line: None,
            machine: Some("M1".to_string()),
            problem: None,
            action: None,
        };
        assert_eq!(gap.level(), None);
    }

    #[test]
    fn test_path_parent_and_leaf() {
        let path = TaxonomyPath::area("A1").with_line("L1").with_machine("M1");
        assert_eq!(path.leaf_name(), "M1");

        let parent = path.parent().expect("应有父路径");
        assert_eq!(parent, TaxonomyPath::area("A1").with_line("L1"));
        assert_eq!(parent.leaf_name(), "L1");
        assert!(TaxonomyPath::area("A1").parent().is_none());
    }

    #[test]
    fn test_natural_line_key() {
        assert!(natural_line_key("LINE-2") < natural_line_key("LINE-10"));
        assert_eq!(natural_line_key("DA-12"), ("DA-".to_string(), 12));
        assert_eq!(natural_line_key("PACK"), ("PACK".to_string(), 0));
    }

    #[test]
    fn test_tree_render_text() {
        let mut area = TreeNode::new(TaxonomyLevel::Area, "A1");
        area.children.push(TreeNode::new(TaxonomyLevel::Line, "L1"));
        let tree = TaxonomyTree { roots: vec![area] };

        assert_eq!(tree.render_text(), "A1\n  L1\n");
        assert_eq!(tree.roots[0].node_count(), 2);
    }
}
