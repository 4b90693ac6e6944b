//! # Ember Script
//!
//! story cut 的效果编码与变换管线。
//!
//! ## 架构概述
//!
//! `ember-script` 是纯逻辑核心，不做任何 IO。媒体、人物、图片尺寸等外部数据
//! 由宿主通过 [`context`] 中的 trait 注入。
//!
//! ```text
//! EffectStateStore ──generate_script──► full_script 文本
//!        ▲                                   │
//!        └──────────── parse_script ◄────────┘
//!
//! EffectSet ──resolve_transform──► StyleDescriptor
//! ```
//!
//! ## 核心类型
//!
//! - [`Block`]：story cut 中的一个时间线单元
//! - [`EffectSet`]：块上生效的 fade / pan / zoom
//! - [`EffectStateStore`]：按块保存的效果选择与参数
//! - [`ParsedScript`]：解析结果
//! - [`StyleDescriptor`]：CSS 等价的样式描述
//!
//! ## 使用示例
//!
//! ```ignore
//! use ember_script::{parse_script, generate_script, AudioOverrides, EffectDefaults};
//!
//! let parsed = parse_script(&full_script)?;
//! let store = parsed.to_store(EffectDefaults::default());
//! let regenerated = generate_script(&parsed.blocks, &store, &AudioOverrides::new());
//! ```
//!
//! ## 模块结构
//!
//! - [`block`]：块与音频偏好
//! - [`effect`]：效果类型与默认参数
//! - [`store`]：效果状态存储
//! - [`script`]：脚本生成、解析、展示与重建
//! - [`transform`]：效果 → 样式
//! - [`context`]：外部数据接口
//! - [`diagnostic`]：静态检查
//! - [`error`]：错误类型定义

pub mod block;
pub mod context;
pub mod diagnostic;
pub mod effect;
pub mod error;
pub mod script;
pub mod store;
pub mod transform;

// 重导出核心类型
pub use block::{AudioPreference, Block, BlockId, BlockKind};
pub use context::{
    EmberContext, ImageSize, MediaLookup, MediaRecord, Point, RenderedImage, StoryCutContext,
    TaggedPerson,
};
pub use diagnostic::{
    Diagnostic, DiagnosticLevel, DiagnosticResult, MediaReference, analyze_script,
    extract_media_references, resolve_media_urls,
};
pub use effect::{
    EffectDefaults, EffectKind, EffectSet, FadeDirection, FadeEffect, PanDirection, PanEffect,
    ZoomDirection, ZoomEffect, ZoomTarget,
};
pub use error::{ParseError, ReconstructError, ScriptError, ScriptResult};
pub use script::{
    AudioOverrides, ParsedScript, Parser, format_for_display, generate_line, generate_script,
    parse_script, reconstruct,
};
pub use store::{BlockEffectState, EffectSelection, EffectStateStore, StoreSnapshot};
pub use transform::{
    OriginError, ResolveContext, StyleDescriptor, resolve_origin, resolve_transform,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        let block = Block::media("b1", "m1", "beach.jpg");
        let mut store = EffectStateStore::default();
        store.set_selected(block.id.clone(), EffectKind::Zoom, true);

        let script = generate_script(&[block], &store, &AudioOverrides::new());
        assert_eq!(script, "[MEDIA | beach.jpg | m1] <ZOOM-IN:scale=1.5:duration=3.5>");

        let parsed = parse_script(&script).unwrap();
        let effects = parsed.effect_set(&parsed.blocks[0].id).unwrap();
        let style = resolve_transform(effects, &ResolveContext::default());
        assert_eq!(style.transform, "scale(1.5)");
    }
}
