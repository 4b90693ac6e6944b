//! # 阶段 2：行解析
//!
//! 将逻辑行转换为块（以及媒体块上的效果）。

use crate::block::{AudioPreference, BlockKind};
use crate::effect::{EffectDefaults, EffectSet};
use crate::error::ParseError;
use crate::script::format::{
    LOAD_SCREEN_TAG, MEDIA_ID_PLACEHOLDER, MEDIA_NAME_PLACEHOLDER, MEDIA_TAG, NO_AUDIO,
    load_screen_defaults,
};

use super::effect_spec::parse_effect_payload;
use super::helpers::{
    ArgValue, extract_payload, parse_key_values, split_header, starts_with_ignore_case,
};
use super::phase1::Line;

/// 单行的解析结果
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLine {
    pub kind: BlockKind,
    /// 仅媒体块有
    pub effects: Option<EffectSet>,
}

/// 阶段 2 解析器
pub struct Phase2Parser {
    /// 解析警告（非致命错误）
    pub warnings: Vec<String>,
    defaults: EffectDefaults,
}

impl Phase2Parser {
    pub fn new(defaults: EffectDefaults) -> Self {
        Self {
            warnings: Vec::new(),
            defaults,
        }
    }

    /// 解析单个逻辑行
    pub fn parse_line(&mut self, line: &Line) -> Result<Option<ParsedLine>, ParseError> {
        let text = line.text.trim();
        let line_number = line.line_number;

        // 1. 加载屏
        if starts_with_ignore_case(text, LOAD_SCREEN_TAG) {
            return self.parse_load_screen(text, line_number).map(Some);
        }

        // 2. 其他行必须带头部
        if !text.starts_with('[') {
            self.warnings.push(format!(
                "第 {} 行：无法识别的内容，已跳过: {}",
                line_number, text
            ));
            return Ok(None);
        }

        let (fields, rest) = split_header(text, line_number)?;
        let payload = extract_payload(rest, line_number)?;

        // 3. 媒体 / 语音
        if fields
            .first()
            .is_some_and(|f| f.eq_ignore_ascii_case(MEDIA_TAG))
        {
            self.parse_media(&fields, payload, line_number).map(Some)
        } else {
            self.parse_voice(&fields, payload, line_number).map(Some)
        }
    }

    /// 解析媒体行
    ///
    /// 语法: `[MEDIA | name | id] <effects>`
    fn parse_media(
        &mut self,
        fields: &[String],
        payload: &str,
        line_number: usize,
    ) -> Result<ParsedLine, ParseError> {
        if fields.len() != 3 {
            return Err(ParseError::HeaderFieldCount {
                line: line_number,
                expected: 3,
                actual: fields.len(),
            });
        }

        let effects =
            parse_effect_payload(payload, line_number, &self.defaults, &mut self.warnings)?;

        Ok(ParsedLine {
            kind: BlockKind::Media {
                media_id: placeholder_to_none(&fields[2], MEDIA_ID_PLACEHOLDER),
                media_name: placeholder_to_none(&fields[1], MEDIA_NAME_PLACEHOLDER),
                media_url: None,
            },
            effects: Some(effects),
        })
    }

    /// 解析语音行
    ///
    /// 语法: `[name | preference | contributionId] <content>`
    fn parse_voice(
        &mut self,
        fields: &[String],
        payload: &str,
        line_number: usize,
    ) -> Result<ParsedLine, ParseError> {
        if fields.len() != 3 {
            return Err(ParseError::HeaderFieldCount {
                line: line_number,
                expected: 3,
                actual: fields.len(),
            });
        }

        let name = &fields[0];
        if name.is_empty() {
            return Err(ParseError::InvalidLine {
                line: line_number,
                message: "语音行缺少说话者名称".to_string(),
            });
        }

        let audio_preference = if fields[1].is_empty() {
            AudioPreference::default()
        } else {
            fields[1].parse().unwrap_or_default()
        };
        if let AudioPreference::Other(tag) = &audio_preference {
            self.warnings.push(format!(
                "第 {} 行：未知的音频偏好 '{}'，原样保留",
                line_number, tag
            ));
        }

        Ok(ParsedLine {
            kind: BlockKind::Voice {
                contributor_name: Some(name.clone()),
                voice_tag: None,
                content: payload.to_string(),
                audio_preference,
                contribution_id: placeholder_to_none(&fields[2], NO_AUDIO),
            },
            effects: None,
        })
    }

    /// 解析加载屏
    ///
    /// 语法: `[[LOAD SCREEN]] (message="...",duration=2,icon="...")`
    fn parse_load_screen(
        &mut self,
        text: &str,
        line_number: usize,
    ) -> Result<ParsedLine, ParseError> {
        let rest = text[LOAD_SCREEN_TAG.len()..].trim();

        let mut message = load_screen_defaults::MESSAGE.to_string();
        let mut duration = load_screen_defaults::DURATION;
        let mut icon = load_screen_defaults::ICON.to_string();

        if !rest.is_empty() {
            let args_str = rest
                .strip_prefix('(')
                .and_then(|r| r.strip_suffix(')'))
                .ok_or_else(|| ParseError::InvalidLoadScreen {
                    line: line_number,
                    message: "参数必须写在 '(...)' 中".to_string(),
                })?;

            let args = parse_key_values(args_str).map_err(|message| {
                ParseError::InvalidLoadScreen {
                    line: line_number,
                    message,
                }
            })?;

            for (key, value) in args {
                match key.as_str() {
                    "message" => message = value.to_text(),
                    "icon" => icon = value.to_text(),
                    "duration" => {
                        duration = match value {
                            ArgValue::Number(n) if n.is_finite() && n >= 0.0 => n,
                            other => {
                                return Err(ParseError::InvalidParameter {
                                    line: line_number,
                                    param: "duration".to_string(),
                                    message: format!("需要非负数字，实际 '{}'", other.to_text()),
                                });
                            }
                        }
                    }
                    other => self.warnings.push(format!(
                        "第 {} 行：加载屏的未知参数 '{}'，已忽略",
                        line_number, other
                    )),
                }
            }
        }

        Ok(ParsedLine {
            kind: BlockKind::LoadScreen {
                message,
                duration,
                icon,
            },
            effects: None,
        })
    }
}

fn placeholder_to_none(field: &str, placeholder: &str) -> Option<String> {
    if field.is_empty() || field.eq_ignore_ascii_case(placeholder) {
        None
    } else {
        Some(field.to_string())
    }
}
