//! # 格式常量与文本规整
//!
//! 生成器与解析器共用的标记和辅助函数。
//!
//! 格式本身没有转义机制，生成时把会破坏行结构的字符替换掉。

/// 媒体行头部首字段
pub const MEDIA_TAG: &str = "MEDIA";
/// 媒体名缺失时的占位
pub const MEDIA_NAME_PLACEHOLDER: &str = "media";
/// 媒体 id 缺失时的占位
pub const MEDIA_ID_PLACEHOLDER: &str = "generated";
/// 无效果时的媒体内容段
pub const NO_EFFECT_PAYLOAD: &str = "media";
/// 语音行没有贡献 id 时的占位
pub const NO_AUDIO: &str = "no-audio";
/// 语音行没有名字时的默认名
pub const DEFAULT_VOICE_NAME: &str = "Narrator";
/// 语音名与媒体标记同名时追加的后缀
pub const VOICE_NAME_SUFFIX: &str = "(voice)";
/// 加载屏行前缀
pub const LOAD_SCREEN_TAG: &str = "[[LOAD SCREEN]]";

/// 加载屏默认值
pub mod load_screen_defaults {
    pub const MESSAGE: &str = "Loading...";
    pub const DURATION: f64 = 2.0;
    pub const ICON: &str = "default";
}

/// 块之间的分隔
pub const BLOCK_SEPARATOR: &str = "\n\n";

/// 数字格式：最短可还原形式（`3`、`1.5`）
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        // 避免输出 "-0"
        return "0".to_string();
    }
    format!("{}", value)
}

/// 把换行及连续空白压成单个空格
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 规整头部字段：去掉分隔符与换行
///
/// `|` → `/`，`[` → `(`，`]` → `)`。
pub fn sanitize_header_field(s: &str) -> String {
    let replaced: String = s
        .chars()
        .map(|c| match c {
            '|' => '/',
            '[' => '(',
            ']' => ')',
            other => other,
        })
        .collect();
    collapse_whitespace(&replaced)
}

/// 规整语音名
///
/// 在头部字段规整之外，与 `MEDIA` 同名（不区分大小写）的名字追加 `(voice)`，
/// 否则整行会被读成媒体行。
pub fn sanitize_voice_name(s: &str) -> String {
    let name = sanitize_header_field(s);
    if name.eq_ignore_ascii_case(MEDIA_TAG) {
        format!("{} {}", name, VOICE_NAME_SUFFIX)
    } else {
        name
    }
}

/// 规整内容段：单行
pub fn sanitize_payload(s: &str) -> String {
    collapse_whitespace(s)
}

/// 规整加载屏的字符串参数：双引号换成单引号
pub fn sanitize_quoted(s: &str) -> String {
    collapse_whitespace(&s.replace('"', "'"))
}
