// ==========================================
// 设备故障停机统计系统 - 日志初始化
// ==========================================
// tracing-subscriber: 文本 / JSON 两种输出，RUST_LOG 覆盖默认过滤器
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 未设置 RUST_LOG 时的过滤器：本库 info，依赖库只输出 warn 以上
const DEFAULT_FILTER: &str = "warn,plant_downtime=info";

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// 人读文本（命令行默认）
    Text,
    /// 每行一个 JSON 对象（批处理 / 归档）
    Json,
}

impl LogFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// 安装全局订阅者
///
/// # 环境变量
/// - RUST_LOG: 例如 RUST_LOG=debug 或 RUST_LOG=plant_downtime::engine=trace
///
/// # 示例
/// ```no_run
/// use plant_downtime::logging::{self, LogFormat};
/// logging::init(LogFormat::Text);
/// ```
pub fn init(format: LogFormat) {
    let builder = fmt().with_env_filter(env_filter()).with_target(true);
    match format {
        LogFormat::Text => builder.with_line_number(true).init(),
        LogFormat::Json => builder.json().with_current_span(true).init(),
    }
}

/// 测试用：debug 级别写入测试输出，可重复调用
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("plant_downtime=debug"))
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_flag() {
        assert_eq!(LogFormat::from_json_flag(true), LogFormat::Json);
        assert_eq!(LogFormat::from_json_flag(false), LogFormat::Text);
    }

    #[test]
    fn test_init_test_is_idempotent() {
        init_test();
        init_test();
        tracing::debug!("日志已初始化");
    }
}
