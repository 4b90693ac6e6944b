//! # 阶段 1：行识别
//!
//! 将原始文本按空行分组，识别出每个块对应的逻辑行。
//!
//! 正常情况下一个块就是一行。手工编辑时内容段可能被折成多行：
//! 以 `[` 开头、尚未以 `>` 结束的行会吞并后续的非空行，用空格拼接。

use super::helpers::starts_with_ignore_case;
use crate::script::format::LOAD_SCREEN_TAG;

/// 逻辑行（阶段 1 输出）
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub text: String,
    /// 起始行号（从 1 开始）
    pub line_number: usize,
}

/// 识别文本中的逻辑行
pub fn recognize_lines(text: &str) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut open: Option<Line> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_number = idx + 1;
        let trimmed = raw.trim();

        // 空行：结束当前未闭合的行
        if trimmed.is_empty() {
            if let Some(line) = open.take() {
                lines.push(line);
            }
            continue;
        }

        // 续行
        if let Some(line) = open.as_mut()
            && !trimmed.starts_with('[')
        {
            line.text.push(' ');
            line.text.push_str(trimmed);
            if trimmed.ends_with('>') {
                lines.extend(open.take());
            }
            continue;
        }

        if let Some(line) = open.take() {
            lines.push(line);
        }

        let line = Line {
            text: trimmed.to_string(),
            line_number,
        };
        if needs_continuation(trimmed) {
            open = Some(line);
        } else {
            lines.push(line);
        }
    }

    if let Some(line) = open {
        lines.push(line);
    }

    lines
}

/// 带头部但内容段尚未闭合
fn needs_continuation(trimmed: &str) -> bool {
    trimmed.starts_with('[')
        && !starts_with_ignore_case(trimmed, LOAD_SCREEN_TAG)
        && trimmed.contains('<')
        && !trimmed.ends_with('>')
}
