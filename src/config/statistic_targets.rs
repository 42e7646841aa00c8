// ==========================================
// 设备故障停机统计系统 - 统计目标值配置
// ==========================================
// 存储: JSON 文档 {"line_edits": [...]}，共 21 项，顺序固定:
//   0..=11  各月工作天数（1 月 ~ 12 月）
//   12      区域停机率目标 (%)
//   13      区域 MTBF 目标 (天)
//   14      区域 MTTR 目标 (分钟)
//   15..=17 三个产线分组的停机率目标 (%)
//   18..=20 三个设备分组的停机率目标 (%)
// 兼容: 数值可写成数字或数字字符串
// ==========================================

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// 目标值个数
pub const TARGET_COUNT: usize = 21;

/// 默认配置文件名
pub const TARGETS_FILE_NAME: &str = "statistic_values.json";

/// 分组数（产线分组 / 设备分组各 3 个）
pub const GROUP_SLOTS: usize = 3;

const LOCATION_PERCENT_INDEX: usize = 12;
const LOCATION_DAYS_INDEX: usize = 13;
const LOCATION_MINUTES_INDEX: usize = 14;
const LINE_GROUP_BASE: usize = 15;
const MACHINE_GROUP_BASE: usize = 18;

/// 各目标值的提示问题（顺序与存储顺序一致）
pub const TARGET_QUESTIONS: [&str; TARGET_COUNT] = [
    "Number of working days in January",
    "Number of working days in February",
    "Number of working days in March",
    "Number of working days in April",
    "Number of working days in May",
    "Number of working days in June",
    "Number of working days in July",
    "Number of working days in August",
    "Number of working days in September",
    "Number of working days in October",
    "Number of working days in November",
    "Number of working days in December",
    "Target in % for each location",
    "Target in days for each location",
    "Target in minutes for each location",
    "Target in % for each line in line group 1",
    "Target in % for each line in line group 2",
    "Target in % for each line in line group 3",
    "Target in % for each machine in machine group 1",
    "Target in % for each machine in machine group 2",
    "Target in % for each machine in machine group 3",
];

// ==========================================
// ConfigError
// ==========================================
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读写失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("配置文件 JSON 解析失败: {0}")]
    Json(#[from] serde_json::Error),

    #[error("目标值个数错误: 期望 {expected}, 实际 {actual}")]
    WrongLength { expected: usize, actual: usize },

    #[error("第 {index} 项目标值无效: {value}")]
    InvalidValue { index: usize, value: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// ==========================================
// JSON 文档格式
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum TargetValue {
    Number(f64),
    Text(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct TargetsDocument {
    line_edits: Vec<TargetValue>,
}

// ==========================================
// StatisticTargets
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticTargets {
    values: Vec<f64>,
}

impl Default for StatisticTargets {
    /// 默认: 每月 26 个工作日，区域 1% / 1 天 / 30 分钟，
    /// 产线与设备分组 1% / 1% / 1.5%
    fn default() -> Self {
        let mut values = vec![26.0; 12];
        values.extend([1.0, 1.0, 30.0]);
        values.extend([1.0, 1.0, 1.5]);
        values.extend([1.0, 1.0, 1.5]);
        Self { values }
    }
}

impl StatisticTargets {
    /// 从 21 个数值构造（工作天数必须为非负整数，其余必须为非负有限数）
    pub fn from_values(values: Vec<f64>) -> ConfigResult<Self> {
        if values.len() != TARGET_COUNT {
            return Err(ConfigError::WrongLength {
                expected: TARGET_COUNT,
                actual: values.len(),
            });
        }
        for (index, value) in values.iter().enumerate() {
            let whole_required = index < 12;
            if !value.is_finite() || *value < 0.0 || (whole_required && value.fract() != 0.0) {
                return Err(ConfigError::InvalidValue {
                    index,
                    value: value.to_string(),
                });
            }
        }
        Ok(Self { values })
    }

    /// 从用户输入文本构造（空值 / 非数字报错）
    pub fn parse_inputs<S: AsRef<str>>(inputs: &[S]) -> ConfigResult<Self> {
        if inputs.len() != TARGET_COUNT {
            return Err(ConfigError::WrongLength {
                expected: TARGET_COUNT,
                actual: inputs.len(),
            });
        }
        let values = inputs
            .iter()
            .enumerate()
            .map(|(index, text)| {
                let text = text.as_ref().trim();
                text.parse::<f64>().map_err(|_| ConfigError::InvalidValue {
                    index,
                    value: text.to_string(),
                })
            })
            .collect::<ConfigResult<Vec<_>>>()?;
        Self::from_values(values)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// 某月的工作天数（月份越界返回 0）
    pub fn working_days(&self, month: u32) -> f64 {
        match month {
            1..=12 => self.values[month as usize - 1],
            _ => 0.0,
        }
    }

    pub fn location_percent(&self) -> f64 {
        self.values[LOCATION_PERCENT_INDEX]
    }

    pub fn location_days(&self) -> f64 {
        self.values[LOCATION_DAYS_INDEX]
    }

    pub fn location_minutes(&self) -> f64 {
        self.values[LOCATION_MINUTES_INDEX]
    }

    /// 产线分组目标（slot 超出范围时取最后一组）
    pub fn line_group_percent(&self, slot: usize) -> f64 {
        self.values[LINE_GROUP_BASE + slot.min(GROUP_SLOTS - 1)]
    }

    /// 设备分组目标（slot 超出范围时取最后一组）
    pub fn machine_group_percent(&self, slot: usize) -> f64 {
        self.values[MACHINE_GROUP_BASE + slot.min(GROUP_SLOTS - 1)]
    }

    // ==========================================
    // 持久化
    // ==========================================

    /// 读取 JSON 文件
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = fs::read_to_string(path)?;
        let doc: TargetsDocument = serde_json::from_str(&text)?;
        let values = doc
            .line_edits
            .into_iter()
            .enumerate()
            .map(|(index, v)| match v {
                TargetValue::Number(n) => Ok(n),
                TargetValue::Text(s) => s.trim().parse::<f64>().map_err(|_| ConfigError::InvalidValue {
                    index,
                    value: s,
                }),
            })
            .collect::<ConfigResult<Vec<_>>>()?;
        Self::from_values(values)
    }

    /// 读取 JSON 文件；文件不存在时返回 None
    pub fn load_if_exists(path: &Path) -> ConfigResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }

    /// 写入 JSON 文件（数值写为数字）
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let doc = TargetsDocument {
            line_edits: self.values.iter().copied().map(TargetValue::Number).collect(),
        };
        fs::write(path, serde_json::to_string_pretty(&doc)?)?;
        info!(path = %path.display(), "统计目标值已保存");
        Ok(())
    }
}

/// 目标值文件的默认位置: 与数据库文件同目录
pub fn default_targets_path(db_path: &Path) -> PathBuf {
    match db_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(TARGETS_FILE_NAME),
        _ => PathBuf::from(TARGETS_FILE_NAME),
    }
}

/// 读取目标值；文件缺失或损坏时退回默认值
pub fn load_or_default(path: &Path) -> StatisticTargets {
    match StatisticTargets::load_if_exists(path) {
        Ok(Some(targets)) => targets,
        Ok(None) => StatisticTargets::default(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "统计目标值读取失败，使用默认值");
            StatisticTargets::default()
        }
    }
}
