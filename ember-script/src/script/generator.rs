//! # Script 生成器
//!
//! 把块列表与效果状态序列化为逐行文本格式，写入 story cut 的 `full_script` 字段。
//!
//! ```text
//! [MEDIA | beach.jpg | m1] <FADE-IN:duration=3,ZOOM-IN:scale=1.5:duration=3.5>
//!
//! [Sarah | personal | msg-42] <It was amazing!>
//!
//! [[LOAD SCREEN]] (message="Loading...",duration=2,icon="default")
//! ```
//!
//! 生成是纯函数：相同输入得到相同输出，缺失字段用默认值替代，不会失败。

use std::collections::HashMap;

use crate::block::{AudioPreference, Block, BlockId, BlockKind};
use crate::effect::{EffectSet, FadeEffect, PanEffect, ZoomEffect, ZoomTarget};
use crate::store::EffectStateStore;

use super::format::{
    BLOCK_SEPARATOR, DEFAULT_VOICE_NAME, LOAD_SCREEN_TAG, MEDIA_ID_PLACEHOLDER,
    MEDIA_NAME_PLACEHOLDER, MEDIA_TAG, NO_AUDIO, NO_EFFECT_PAYLOAD, format_number,
    sanitize_header_field, sanitize_payload, sanitize_quoted, sanitize_voice_name,
};

/// 按块覆盖的音频偏好
pub type AudioOverrides = HashMap<BlockId, AudioPreference>;

/// 生成整份脚本
///
/// 块按原顺序输出，之间以空行分隔；start/end 块不产生内容。
pub fn generate_script(
    blocks: &[Block],
    store: &EffectStateStore,
    overrides: &AudioOverrides,
) -> String {
    blocks
        .iter()
        .map(|block| generate_line(block, store, overrides))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}

/// 生成单个块对应的行（start/end 返回空串）
pub fn generate_line(block: &Block, store: &EffectStateStore, overrides: &AudioOverrides) -> String {
    match &block.kind {
        BlockKind::Media {
            media_id,
            media_name,
            ..
        } => {
            let effects = store.effect_object(&block.id);
            media_line(media_name.as_deref(), media_id.as_deref(), &effects)
        }
        BlockKind::Voice {
            contributor_name,
            voice_tag,
            content,
            audio_preference,
            contribution_id,
        } => {
            let name = contributor_name
                .as_deref()
                .or(voice_tag.as_deref())
                .unwrap_or(DEFAULT_VOICE_NAME);
            let preference = overrides.get(&block.id).unwrap_or(audio_preference);
            voice_line(name, preference, contribution_id.as_deref(), content)
        }
        BlockKind::LoadScreen {
            message,
            duration,
            icon,
        } => load_screen_line(message, *duration, icon),
        BlockKind::Start | BlockKind::End => String::new(),
    }
}

/// 媒体行
pub fn media_line(name: Option<&str>, id: Option<&str>, effects: &EffectSet) -> String {
    format!(
        "[{} | {} | {}] <{}>",
        MEDIA_TAG,
        header_or(name, MEDIA_NAME_PLACEHOLDER),
        header_or(id, MEDIA_ID_PLACEHOLDER),
        effect_payload(effects)
    )
}

/// 语音行
pub fn voice_line(
    name: &str,
    preference: &AudioPreference,
    contribution_id: Option<&str>,
    content: &str,
) -> String {
    let mut name = sanitize_voice_name(name);
    if name.is_empty() {
        name = DEFAULT_VOICE_NAME.to_string();
    }
    format!(
        "[{} | {} | {}] <{}>",
        name,
        header_or(Some(preference.as_str()), AudioPreference::Text.as_str()),
        header_or(contribution_id, NO_AUDIO),
        sanitize_payload(content)
    )
}

/// 加载屏行
pub fn load_screen_line(message: &str, duration: f64, icon: &str) -> String {
    let duration = if duration.is_finite() && duration >= 0.0 {
        duration
    } else {
        super::format::load_screen_defaults::DURATION
    };
    format!(
        "{} (message=\"{}\",duration={},icon=\"{}\")",
        LOAD_SCREEN_TAG,
        sanitize_quoted(message),
        format_number(duration),
        sanitize_quoted(icon)
    )
}

/// 媒体内容段：按 fade、pan、zoom 顺序逗号拼接；无效果时为 `media`
pub fn effect_payload(effects: &EffectSet) -> String {
    let mut specs = Vec::with_capacity(3);
    if let Some(fade) = &effects.fade {
        specs.push(fade_spec(fade));
    }
    if let Some(pan) = &effects.pan {
        specs.push(pan_spec(pan));
    }
    if let Some(zoom) = &effects.zoom {
        specs.push(zoom_spec(zoom));
    }

    if specs.is_empty() {
        NO_EFFECT_PAYLOAD.to_string()
    } else {
        specs.join(",")
    }
}

fn fade_spec(fade: &FadeEffect) -> String {
    format!(
        "FADE-{}:duration={}",
        fade.direction.as_str().to_uppercase(),
        format_number(fade.duration)
    )
}

fn pan_spec(pan: &PanEffect) -> String {
    format!(
        "PAN-{}:distance={}%:duration={}",
        pan.direction.as_str().to_uppercase(),
        format_number(pan.distance),
        format_number(pan.duration)
    )
}

fn zoom_spec(zoom: &ZoomEffect) -> String {
    let mut spec = format!(
        "ZOOM-{}:scale={}:duration={}",
        zoom.direction.as_str().to_uppercase(),
        format_number(zoom.scale),
        format_number(zoom.duration)
    );
    match &zoom.target {
        ZoomTarget::Center => {}
        ZoomTarget::Person { person_id } => {
            if is_writable_target_id(person_id) {
                spec.push_str(&format!(":target=person:{}", person_id));
            } else {
                tracing::warn!(person_id = %person_id, "人物 id 含有结构字符，zoom 锚点改为中心");
            }
        }
        ZoomTarget::Custom { x, y } => {
            spec.push_str(&format!(
                ":target=custom:{},{}",
                x.round() as i64,
                y.round() as i64
            ));
        }
    }
    spec
}

/// 人物 id 不能为空，也不能含有内容段的结构字符
fn is_writable_target_id(id: &str) -> bool {
    !id.is_empty()
        && !id
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, ',' | '<' | '>' | '|' | '[' | ']'))
}

fn header_or(value: Option<&str>, placeholder: &str) -> String {
    let value = value.map(sanitize_header_field).unwrap_or_default();
    if value.is_empty() {
        placeholder.to_string()
    } else {
        value
    }
}
