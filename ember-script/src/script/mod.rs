//! # Script 模块
//!
//! story cut 脚本的文本格式：生成、解析、展示与重建。
//!
//! ## 模块结构
//!
//! - [`format`]：格式常量与文本规整
//! - [`generator`]：块 + 效果状态 → 脚本文本
//! - [`parser`]：两阶段解析器实现
//! - [`parsed`]：解析结果
//! - [`display`]：展示文本与重建

pub mod display;
pub mod format;
pub mod generator;
pub mod parsed;
pub mod parser;

pub use display::{format_for_display, reconstruct};
pub use generator::{AudioOverrides, effect_payload, generate_line, generate_script};
pub use parsed::ParsedScript;
pub use parser::{Parser, parse_script};
