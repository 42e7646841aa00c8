// ==========================================
// 设备故障停机统计系统 - 配置层
// ==========================================
// 职责: 统计目标值的加载、校验、保存
// 存储: statistic_values.json
// ==========================================

pub mod statistic_targets;

pub use statistic_targets::{
    default_targets_path, load_or_default, ConfigError, ConfigResult, StatisticTargets,
    GROUP_SLOTS, TARGETS_FILE_NAME, TARGET_COUNT, TARGET_QUESTIONS,
};
