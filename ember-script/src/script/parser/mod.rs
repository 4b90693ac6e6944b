//! # Parser 模块
//!
//! 两阶段脚本解析器实现（手写，无 regex 依赖）。
//!
//! ## 架构
//!
//! ```text
//! 原始文本 → [阶段1: 行识别] → Vec<Line> → [阶段2: 行解析] → ParsedScript
//! ```
//!
//! ## 设计原则
//!
//! - 结构错误（头部未闭合、缺少内容段、非法数字）直接返回带行号的 [`ParseError`]
//! - 可容忍的问题（未知效果、未知参数、无法识别的行）记录为警告并跳过
//! - 解析器按顺序分配块 id：`block-1`、`block-2`……
//!
//! ## 模块结构
//!
//! - `helpers`: 辅助解析函数
//! - `effect_spec`: 媒体内容段的效果描述
//! - `phase1`: 行识别
//! - `phase2`: 行解析

mod effect_spec;
mod helpers;
mod phase1;
mod phase2;

#[cfg(test)]
mod tests;

use crate::block::{Block, BlockId};
use crate::effect::EffectDefaults;
use crate::error::ParseError;
use crate::script::parsed::ParsedScript;

use phase2::Phase2Parser;

pub use effect_spec::{parse_effect_payload, parse_zoom_target, split_effect_tokens};
pub use helpers::{
    ArgValue, extract_payload, parse_arg_value, parse_key_values, split_header,
    starts_with_ignore_case,
};
pub use phase1::{Line, recognize_lines};
pub(crate) use phase2::ParsedLine;

/// 脚本解析器
pub struct Parser {
    /// 阶段2解析器
    phase2: Phase2Parser,
}

impl Parser {
    /// 创建新的解析器（使用默认效果参数）
    pub fn new() -> Self {
        Self::with_defaults(EffectDefaults::default())
    }

    /// 创建解析器，缺失的效果参数使用给定默认值
    pub fn with_defaults(defaults: EffectDefaults) -> Self {
        Self {
            phase2: Phase2Parser::new(defaults),
        }
    }

    /// 解析脚本文本
    pub fn parse(&mut self, text: &str) -> Result<ParsedScript, ParseError> {
        self.phase2.warnings.clear();

        let mut script = ParsedScript::default();
        for line in recognize_lines(text) {
            let Some(parsed) = self.phase2.parse_line(&line)? else {
                continue;
            };

            let id = BlockId::from_index(script.blocks.len() + 1);
            if let Some(effects) = parsed.effects {
                script.effects.push((id.clone(), effects));
            }
            script.blocks.push(Block::new(id, parsed.kind));
            script.source_map.push(line.line_number);
        }

        for warning in &self.phase2.warnings {
            tracing::warn!(warning = %warning, "脚本解析警告");
        }

        Ok(script)
    }

    /// 解析单个逻辑行
    pub(crate) fn parse_line(&mut self, line: &Line) -> Result<Option<ParsedLine>, ParseError> {
        self.phase2.parse_line(line)
    }

    /// 获取解析过程中的警告
    pub fn warnings(&self) -> &[String] {
        &self.phase2.warnings
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// 便捷函数：用默认参数解析
pub fn parse_script(text: &str) -> Result<ParsedScript, ParseError> {
    Parser::new().parse(text)
}
