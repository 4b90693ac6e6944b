//! # Error 模块
//!
//! 定义 ember-script 中使用的错误类型。
//!
//! 生成器与变换解析器按约定不会失败，只有脚本解析/重建会返回错误。

use thiserror::Error;

/// 解析错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// 无效的行格式
    #[error("第 {line} 行：无效的格式 - {message}")]
    InvalidLine { line: usize, message: String },

    /// 头部未闭合（缺少 `]`）
    #[error("第 {line} 行：头部缺少结束符 ']'")]
    UnterminatedHeader { line: usize },

    /// 头部字段数量不对
    #[error("第 {line} 行：头部应有 {expected} 个字段，实际 {actual} 个")]
    HeaderFieldCount {
        line: usize,
        expected: usize,
        actual: usize,
    },

    /// 缺少 `<...>` 内容段
    #[error("第 {line} 行：缺少 '<...>' 内容段")]
    MissingPayload { line: usize },

    /// 无效的效果描述
    #[error("第 {line} 行：无效的效果描述 '{token}' - {message}")]
    InvalidEffect {
        line: usize,
        token: String,
        message: String,
    },

    /// 无效的参数值
    #[error("第 {line} 行：参数 '{param}' 的值无效 - {message}")]
    InvalidParameter {
        line: usize,
        param: String,
        message: String,
    },

    /// 无效的加载屏参数
    #[error("第 {line} 行：无效的加载屏语法 - {message}")]
    InvalidLoadScreen { line: usize, message: String },
}

impl ParseError {
    /// 错误所在行号（从 1 开始）
    pub fn line(&self) -> usize {
        match self {
            Self::InvalidLine { line, .. }
            | Self::UnterminatedHeader { line }
            | Self::HeaderFieldCount { line, .. }
            | Self::MissingPayload { line }
            | Self::InvalidEffect { line, .. }
            | Self::InvalidParameter { line, .. }
            | Self::InvalidLoadScreen { line, .. } => *line,
        }
    }
}

/// 重建错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReconstructError {
    /// 原始脚本无法解析
    #[error("原始脚本解析失败: {0}")]
    Original(ParseError),

    /// 编辑后的文本无法解析
    #[error("编辑文本解析失败: {0}")]
    Edited(ParseError),
}

/// ember-script 统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScriptError {
    /// 解析错误
    #[error("解析错误: {0}")]
    Parse(#[from] ParseError),

    /// 重建错误
    #[error("重建错误: {0}")]
    Reconstruct(#[from] ReconstructError),
}

/// Result 类型别名
pub type ScriptResult<T> = Result<T, ScriptError>;
