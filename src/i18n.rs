// ==========================================
// 设备故障停机统计系统 - 提示文案 (rust-i18n)
// ==========================================
// 文案目录: locales/en.yml、locales/zh-CN.yml，缺失时回退 en
// 占位符写法: %{name}
// 注意: rust_i18n::i18n! 宏在 lib.rs 中初始化
// ==========================================

/// 已提供文案的语言
pub const SUPPORTED_LOCALES: &[&str] = &["en", "zh-CN"];

/// 规范化语言代码（"zh" / "zh_cn" / "en-US" 等写法）
pub fn normalize_locale(input: &str) -> Option<&'static str> {
    let lower = input.trim().to_ascii_lowercase().replace('_', "-");
    match lower.split('-').next().unwrap_or("") {
        "en" => Some("en"),
        "zh" => Some("zh-CN"),
        _ => None,
    }
}

pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 切换语言；不支持的语言保持当前设置并返回 false
pub fn set_locale(locale: &str) -> bool {
    match normalize_locale(locale) {
        Some(code) => {
            rust_i18n::set_locale(code);
            true
        }
        None => {
            tracing::warn!(locale, "不支持的语言，保持当前设置");
            false
        }
    }
}

/// 取文案
///
/// ```no_run
/// use plant_downtime::i18n::t;
/// let msg = t("editor.invalid_date");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 取文案并替换占位符
///
/// ```no_run
/// use plant_downtime::i18n::t_with_args;
/// let msg = t_with_args("import.missing_columns", &[("columns", "INCHARGE")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    args.iter().fold(t(key), |text, (name, value)| {
        text.replace(&format!("%{{{}}}", name), value)
    })
}
