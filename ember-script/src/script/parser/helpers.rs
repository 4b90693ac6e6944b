//! # 辅助解析函数
//!
//! 手写的字符串解析辅助函数，无正则依赖。

use crate::error::ParseError;
use crate::script::format::format_number;

/// 检查字符串是否以指定前缀开头（大小写不敏感）
pub fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len()
        && s.chars()
            .zip(prefix.chars())
            .all(|(a, b)| a.eq_ignore_ascii_case(&b))
}

/// 拆分 `[a | b | c] rest` 形式的行
///
/// 返回去除首尾空白的头部字段与 `]` 之后的剩余部分。
pub fn split_header(line: &str, line_number: usize) -> Result<(Vec<String>, &str), ParseError> {
    let inner = line
        .trim_start()
        .strip_prefix('[')
        .ok_or_else(|| ParseError::InvalidLine {
            line: line_number,
            message: "行必须以 '[' 开头".to_string(),
        })?;

    let end = inner
        .find(']')
        .ok_or(ParseError::UnterminatedHeader { line: line_number })?;

    let fields = inner[..end]
        .split('|')
        .map(|f| f.trim().to_string())
        .collect();

    Ok((fields, &inner[end + 1..]))
}

/// 提取 `<...>` 内容段
///
/// 内容从第一个 `<` 开始，到行尾的 `>` 结束，中间的 `<`/`>` 原样保留。
pub fn extract_payload(rest: &str, line_number: usize) -> Result<&str, ParseError> {
    let rest = rest.trim();
    let inner = rest
        .strip_prefix('<')
        .and_then(|r| r.strip_suffix('>'))
        .ok_or(ParseError::MissingPayload { line: line_number })?;
    Ok(inner.trim())
}

/// 参数值
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// 数字参数，如 `1.5`
    Number(f64),
    /// 字符串参数，如 `"Loading..."`
    String(String),
    /// 布尔参数，如 `true`
    Bool(bool),
}

impl ArgValue {
    /// 字符串形式（数字/布尔也可转成文本）
    pub fn to_text(&self) -> String {
        match self {
            Self::Number(n) => format_number(*n),
            Self::String(s) => s.clone(),
            Self::Bool(b) => b.to_string(),
        }
    }
}

/// 解析 `key=value,key="value"` 形式的参数列表
///
/// 引号内的逗号与等号不参与分割；重复的 key 报错。
pub fn parse_key_values(s: &str) -> Result<Vec<(String, ArgValue)>, String> {
    let mut args = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for raw in split_args(s) {
        if raw.is_empty() {
            continue;
        }
        let eq = find_unquoted(&raw, '=').ok_or_else(|| format!("参数缺少 '=': {}", raw))?;
        let key = raw[..eq].trim();
        if !is_valid_identifier(key) {
            return Err(format!("无效的参数名: '{}'", key));
        }
        if !seen.insert(key.to_string()) {
            return Err(format!("重复的参数: {}", key));
        }
        args.push((key.to_string(), parse_arg_value(&raw[eq + 1..])));
    }

    Ok(args)
}

/// 分割参数列表（考虑字符串内的逗号）
pub fn split_args(s: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let mut in_string = false;
    let mut string_char = '"';

    for ch in s.chars() {
        if in_string {
            current.push(ch);
            if ch == string_char {
                in_string = false;
            }
        } else if ch == '"' || ch == '\'' {
            in_string = true;
            string_char = ch;
            current.push(ch);
        } else if ch == ',' {
            result.push(current.trim().to_string());
            current.clear();
        } else {
            current.push(ch);
        }
    }

    // 最后一个参数
    let last = current.trim();
    if !last.is_empty() {
        result.push(last.to_string());
    }

    result
}

/// 查找第一个不在引号内的字符
fn find_unquoted(s: &str, target: char) -> Option<usize> {
    let mut in_string = false;
    let mut string_char = '"';

    for (i, ch) in s.char_indices() {
        if in_string {
            if ch == string_char {
                in_string = false;
            }
        } else if ch == '"' || ch == '\'' {
            in_string = true;
            string_char = ch;
        } else if ch == target {
            return Some(i);
        }
    }
    None
}

/// 检查是否是有效标识符
fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// 解析参数值（可能带引号的字符串、数字、布尔值）
pub fn parse_arg_value(s: &str) -> ArgValue {
    let s = s.trim();

    // 带引号的字符串
    if s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
    {
        return ArgValue::String(s[1..s.len() - 1].to_string());
    }

    if let Ok(n) = s.parse::<f64>() {
        return ArgValue::Number(n);
    }

    if s.eq_ignore_ascii_case("true") {
        return ArgValue::Bool(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return ArgValue::Bool(false);
    }

    ArgValue::String(s.to_string())
}

/// 解析数字参数（允许 `%` 后缀）
pub fn parse_number(value: &str) -> Option<f64> {
    let value = value.trim();
    let value = value.strip_suffix('%').unwrap_or(value).trim();
    value.parse::<f64>().ok().filter(|n| n.is_finite())
}
