//! # 展示与重建
//!
//! 面向人工编辑的文本形式与持久化原始格式之间的双向转换。
//!
//! ```text
//! 原始:  [Sarah | personal | msg-42] <It was amazing!>
//! 展示:  [Sarah] <It was amazing!>
//!
//! 原始:  [MEDIA | media | m1] <ZOOM-IN:scale=1.5:duration=3.5>
//! 展示:  [MEDIA | Beach] <ZOOM-IN:scale=1.5:duration=3.5>
//! ```
//!
//! 展示形式隐藏贡献 id、音频偏好等不可编辑的元数据。
//! 重建时必须同时给出**原始脚本**，这些元数据从原始脚本中按说话者顺序取回；
//! 内容段始终以编辑后的文本为准。

use crate::block::{AudioPreference, Block, BlockId, BlockKind};
use crate::context::{EmberContext, MediaLookup, StoryCutContext};
use crate::effect::{EffectDefaults, EffectSet};
use crate::error::{ParseError, ReconstructError};
use crate::store::EffectStateStore;

use super::format::{
    BLOCK_SEPARATOR, MEDIA_NAME_PLACEHOLDER, MEDIA_TAG, NO_AUDIO, sanitize_header_field,
    sanitize_payload, sanitize_voice_name,
};
use super::generator::{AudioOverrides, effect_payload, generate_script, load_screen_line};
use super::parser::{
    Line, ParsedLine, Parser, extract_payload, parse_effect_payload, recognize_lines,
    split_header, starts_with_ignore_case,
};

/// 把原始脚本转换为展示文本
///
/// 无法解析的行原样保留并记录警告，不会失败。
pub fn format_for_display(raw: &str, ember: &EmberContext, story_cut: &StoryCutContext) -> String {
    let mut parser = Parser::new();
    let mut out = Vec::new();

    for line in recognize_lines(raw) {
        match parser.parse_line(&line) {
            Ok(Some(parsed)) => out.push(display_line(&parsed, ember, story_cut)),
            Ok(None) => out.push(line.text.clone()),
            Err(e) => {
                tracing::warn!(line = line.line_number, error = %e, "展示转换失败，保留原文");
                out.push(line.text.clone());
            }
        }
    }

    out.join(BLOCK_SEPARATOR)
}

fn display_line(parsed: &ParsedLine, ember: &EmberContext, story_cut: &StoryCutContext) -> String {
    match &parsed.kind {
        BlockKind::Media {
            media_id,
            media_name,
            ..
        } => {
            let name = media_name
                .clone()
                .or_else(|| {
                    media_id
                        .as_deref()
                        .and_then(|id| ember.media.media_by_id(id))
                        .and_then(|m| m.name().map(str::to_string))
                })
                .unwrap_or_else(|| MEDIA_NAME_PLACEHOLDER.to_string());
            let effects = parsed.effects.clone().unwrap_or_default();
            format!(
                "[{} | {}] <{}>",
                MEDIA_TAG,
                sanitize_header_field(&name),
                effect_payload(&effects)
            )
        }
        BlockKind::Voice {
            contributor_name,
            content,
            ..
        } => {
            let tag = contributor_name.as_deref().unwrap_or_default();
            format!(
                "[{}] <{}>",
                sanitize_voice_name(story_cut.display_name(tag)),
                sanitize_payload(content)
            )
        }
        BlockKind::LoadScreen {
            message,
            duration,
            icon,
        } => load_screen_line(message, *duration, icon),
        BlockKind::Start | BlockKind::End => String::new(),
    }
}

/// 原始脚本中的语音元数据
struct VoiceOrigin {
    /// 原始标签（写回头部）
    tag: String,
    /// 展示名（用于匹配）
    display: String,
    preference: AudioPreference,
    contribution_id: Option<String>,
    consumed: bool,
}

/// 原始脚本中的媒体元数据
struct MediaOrigin {
    name: Option<String>,
    id: Option<String>,
    consumed: bool,
}

/// 编辑后文本中的一行
enum EditedLine {
    Voice {
        name: String,
        content: String,
    },
    Media {
        name: Option<String>,
        effects: EffectSet,
    },
    /// 带完整元数据的行（原始格式或加载屏），直接采用
    Complete(ParsedLine),
}

/// 由编辑后的展示文本重建原始脚本
///
/// - 语音行：按说话者匹配原始脚本中下一个未使用的同名语音行，继承其音频偏好与贡献 id；
///   没有匹配时使用 story cut 为该贡献者指定的偏好，贡献 id 为 `no-audio`
/// - 媒体行：先按名称匹配，再按出现顺序匹配，继承媒体 id；都没有时为 `generated`
/// - 已经是完整原始格式的行原样采用
pub fn reconstruct(
    edited: &str,
    original_raw: &str,
    story_cut: &StoryCutContext,
) -> Result<String, ReconstructError> {
    let original = Parser::new()
        .parse(original_raw)
        .map_err(ReconstructError::Original)?;

    let mut voices = Vec::new();
    let mut media = Vec::new();
    for block in &original.blocks {
        match &block.kind {
            BlockKind::Voice {
                contributor_name,
                audio_preference,
                contribution_id,
                ..
            } => {
                let tag = contributor_name.clone().unwrap_or_default();
                voices.push(VoiceOrigin {
                    display: sanitize_voice_name(story_cut.display_name(&tag)),
                    tag,
                    preference: audio_preference.clone(),
                    contribution_id: contribution_id.clone(),
                    consumed: false,
                });
            }
            BlockKind::Media {
                media_id,
                media_name,
                ..
            } => media.push(MediaOrigin {
                name: media_name.clone(),
                id: media_id.clone(),
                consumed: false,
            }),
            _ => {}
        }
    }

    let mut parser = Parser::new();
    let mut blocks = Vec::new();
    let mut effect_sets = Vec::new();
    let mut media_index = 0usize;

    for line in recognize_lines(edited) {
        let Some(edited_line) = parse_edited_line(&mut parser, &line)? else {
            continue;
        };
        let id = BlockId::from_index(blocks.len() + 1);

        let kind = match edited_line {
            EditedLine::Voice { name, content } => {
                let origin = voices
                    .iter_mut()
                    .find(|v| !v.consumed && v.display == name);
                match origin {
                    Some(origin) => {
                        origin.consumed = true;
                        voice_kind(
                            origin.tag.clone(),
                            content,
                            origin.preference.clone(),
                            origin.contribution_id.clone(),
                        )
                    }
                    None => {
                        let tag = story_cut.tag_for(&name).to_string();
                        let preference = story_cut.preference_for(&tag);
                        voice_kind(tag, content, preference, None)
                    }
                }
            }
            EditedLine::Media { name, effects } => {
                let position = media_index;
                media_index += 1;

                let by_name = media
                    .iter()
                    .position(|m| !m.consumed && name.is_some() && m.name == name);
                let by_order = media.get(position).filter(|m| !m.consumed).map(|_| position);
                let media_id = by_name.or(by_order).and_then(|i| {
                    media[i].consumed = true;
                    media[i].id.clone()
                });

                effect_sets.push((id.clone(), effects));
                BlockKind::Media {
                    media_id,
                    media_name: name,
                    media_url: None,
                }
            }
            EditedLine::Complete(parsed) => {
                if let Some(effects) = parsed.effects {
                    effect_sets.push((id.clone(), effects));
                }
                parsed.kind
            }
        };

        blocks.push(Block::new(id, kind));
    }

    let store = EffectStateStore::from_effect_sets(
        EffectDefaults::default(),
        effect_sets.iter().map(|(id, set)| (id, set)),
    );
    Ok(generate_script(&blocks, &store, &AudioOverrides::new()))
}

fn voice_kind(
    tag: String,
    content: String,
    preference: AudioPreference,
    contribution_id: Option<String>,
) -> BlockKind {
    BlockKind::Voice {
        contributor_name: Some(tag),
        voice_tag: None,
        content,
        audio_preference: preference,
        contribution_id: contribution_id.filter(|id| id != NO_AUDIO),
    }
}

/// 解析展示文本中的一行
fn parse_edited_line(
    parser: &mut Parser,
    line: &Line,
) -> Result<Option<EditedLine>, ReconstructError> {
    let text = line.text.trim();
    let edited_err = ReconstructError::Edited;

    if starts_with_ignore_case(text, super::format::LOAD_SCREEN_TAG) {
        return parser
            .parse_line(line)
            .map(|p| p.map(EditedLine::Complete))
            .map_err(edited_err);
    }

    if !text.starts_with('[') {
        tracing::warn!(line = line.line_number, text = %text, "无法识别的编辑行，已跳过");
        return Ok(None);
    }

    let (fields, rest) = split_header(text, line.line_number).map_err(edited_err)?;

    // 三个字段：用户保留了完整头部
    if fields.len() == 3 {
        return parser
            .parse_line(line)
            .map(|p| p.map(EditedLine::Complete))
            .map_err(edited_err);
    }

    let payload = extract_payload(rest, line.line_number).map_err(edited_err)?;
    let is_media = fields
        .first()
        .is_some_and(|f| f.eq_ignore_ascii_case(MEDIA_TAG));

    match (is_media, fields.len()) {
        (true, 1 | 2) => {
            let name = fields
                .get(1)
                .filter(|n| !n.is_empty() && !n.eq_ignore_ascii_case(MEDIA_NAME_PLACEHOLDER))
                .cloned();
            let mut warnings = Vec::new();
            let effects = parse_effect_payload(
                payload,
                line.line_number,
                &EffectDefaults::default(),
                &mut warnings,
            )
            .map_err(edited_err)?;
            for warning in warnings {
                tracing::warn!(warning = %warning, "编辑文本解析警告");
            }
            Ok(Some(EditedLine::Media { name, effects }))
        }
        (false, 1) if !fields[0].is_empty() => Ok(Some(EditedLine::Voice {
            name: fields[0].clone(),
            content: payload.to_string(),
        })),
        (false, 1) => Err(ReconstructError::Edited(ParseError::InvalidLine {
            line: line.line_number,
            message: "语音行缺少说话者名称".to_string(),
        })),
        (_, actual) => Err(ReconstructError::Edited(ParseError::HeaderFieldCount {
            line: line.line_number,
            expected: if is_media { 2 } else { 1 },
            actual,
        })),
    }
}
