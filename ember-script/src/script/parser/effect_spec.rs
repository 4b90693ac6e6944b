//! # 效果描述解析
//!
//! 解析媒体行内容段中的效果描述：
//!
//! ```text
//! FADE-IN:duration=3,PAN-LEFT:distance=25%:duration=4,ZOOM-OUT:scale=2:duration=3.5:target=custom:120,80
//! ```
//!
//! - 效果之间以逗号分隔，但只在逗号后紧跟字母时才分割（`custom:x,y` 中的逗号保留）
//! - 类型与方向不区分大小写
//! - 缺失参数使用默认值，未知参数产生警告

use crate::effect::{
    EffectDefaults, EffectKind, EffectSet, FadeDirection, FadeEffect, PanDirection, PanEffect,
    ZoomDirection, ZoomEffect, ZoomTarget,
};
use crate::error::ParseError;
use crate::script::format::NO_EFFECT_PAYLOAD;

use super::helpers::parse_number;

/// 解析媒体内容段
pub fn parse_effect_payload(
    payload: &str,
    line_number: usize,
    defaults: &EffectDefaults,
    warnings: &mut Vec<String>,
) -> Result<EffectSet, ParseError> {
    let payload = payload.trim();
    let mut set = EffectSet::default();

    if payload.is_empty() || payload.eq_ignore_ascii_case(NO_EFFECT_PAYLOAD) {
        return Ok(set);
    }

    for token in split_effect_tokens(payload) {
        let Some(kind) = token_kind(token) else {
            warnings.push(format!(
                "第 {} 行：未知效果 '{}'，已跳过",
                line_number, token
            ));
            continue;
        };

        if set.contains(kind) {
            warnings.push(format!(
                "第 {} 行：重复的 {} 效果，只保留第一个",
                line_number, kind
            ));
            continue;
        }

        match kind {
            EffectKind::Fade => {
                set.fade = Some(parse_fade(token, line_number, defaults, warnings)?);
            }
            EffectKind::Pan => {
                set.pan = Some(parse_pan(token, line_number, defaults, warnings)?);
            }
            EffectKind::Zoom => {
                set.zoom = Some(parse_zoom(token, line_number, defaults, warnings)?);
            }
        }
    }

    Ok(set)
}

/// 按效果切分内容段
///
/// 只在"逗号后第一个非空白字符是字母"时分割。
pub fn split_effect_tokens(payload: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;

    for (i, ch) in payload.char_indices() {
        if ch != ',' {
            continue;
        }
        let next = payload[i + 1..].trim_start().chars().next();
        if next.is_some_and(|c| c.is_ascii_alphabetic()) {
            tokens.push(payload[start..i].trim());
            start = i + 1;
        }
    }
    tokens.push(payload[start..].trim());

    tokens.into_iter().filter(|t| !t.is_empty()).collect()
}

fn token_kind(token: &str) -> Option<EffectKind> {
    let head = token.split(':').next().unwrap_or(token);
    let kind = head.split('-').next().unwrap_or(head);
    kind.trim().parse().ok()
}

/// 效果描述的结构：`KIND-DIR`、参数列表、可选的 target
struct SpecParts<'a> {
    direction: Option<&'a str>,
    params: Vec<(&'a str, &'a str)>,
    target: Option<&'a str>,
}

fn split_spec<'a>(token: &'a str, line_number: usize) -> Result<SpecParts<'a>, ParseError> {
    // target 的值中可能带 ':'，先整体切出
    let (body, target) = match find_ignore_case(token, ":target=") {
        Some(pos) => (&token[..pos], Some(token[pos + ":target=".len()..].trim())),
        None => (token, None),
    };

    let mut segments = body.split(':');
    let head = segments.next().unwrap_or_default().trim();
    let direction = head.split_once('-').map(|(_, dir)| dir.trim());

    let mut params = Vec::new();
    for segment in segments {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let (key, value) = segment
            .split_once('=')
            .ok_or_else(|| ParseError::InvalidEffect {
                line: line_number,
                token: token.to_string(),
                message: format!("参数缺少 '=': {}", segment),
            })?;
        params.push((key.trim(), value.trim()));
    }

    Ok(SpecParts {
        direction,
        params,
        target,
    })
}

fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack.to_ascii_lowercase().find(&needle.to_ascii_lowercase())
}

fn number_param(
    key: &str,
    value: &str,
    line_number: usize,
) -> Result<f64, ParseError> {
    parse_number(value).ok_or_else(|| ParseError::InvalidParameter {
        line: line_number,
        param: key.to_string(),
        message: format!("'{}' 不是有效数字", value),
    })
}

fn parse_direction<T: std::str::FromStr + Copy>(
    parts: &SpecParts<'_>,
    token: &str,
    fallback: T,
    line_number: usize,
    warnings: &mut Vec<String>,
) -> Result<T, ParseError> {
    match parts.direction {
        Some(dir) => dir.parse().map_err(|_| ParseError::InvalidEffect {
            line: line_number,
            token: token.to_string(),
            message: format!("无效的方向 '{}'", dir),
        }),
        None => {
            warnings.push(format!(
                "第 {} 行：效果 '{}' 未指定方向，使用默认值",
                line_number, token
            ));
            Ok(fallback)
        }
    }
}

fn warn_unknown_param(token: &str, key: &str, line_number: usize, warnings: &mut Vec<String>) {
    warnings.push(format!(
        "第 {} 行：效果 '{}' 的未知参数 '{}'，已忽略",
        line_number, token, key
    ));
}

fn parse_fade(
    token: &str,
    line_number: usize,
    defaults: &EffectDefaults,
    warnings: &mut Vec<String>,
) -> Result<FadeEffect, ParseError> {
    let parts = split_spec(token, line_number)?;
    let mut fade = defaults.fade();
    fade.direction = parse_direction::<FadeDirection>(
        &parts,
        token,
        defaults.fade_direction,
        line_number,
        warnings,
    )?;

    for (key, value) in &parts.params {
        match key.to_ascii_lowercase().as_str() {
            "duration" => fade.duration = number_param(key, value, line_number)?,
            _ => warn_unknown_param(token, key, line_number, warnings),
        }
    }
    if parts.target.is_some() {
        warn_unknown_param(token, "target", line_number, warnings);
    }

    Ok(fade)
}

fn parse_pan(
    token: &str,
    line_number: usize,
    defaults: &EffectDefaults,
    warnings: &mut Vec<String>,
) -> Result<PanEffect, ParseError> {
    let parts = split_spec(token, line_number)?;
    let mut pan = defaults.pan();
    pan.direction = parse_direction::<PanDirection>(
        &parts,
        token,
        defaults.pan_direction,
        line_number,
        warnings,
    )?;

    for (key, value) in &parts.params {
        match key.to_ascii_lowercase().as_str() {
            "distance" => pan.distance = number_param(key, value, line_number)?,
            "duration" => pan.duration = number_param(key, value, line_number)?,
            _ => warn_unknown_param(token, key, line_number, warnings),
        }
    }
    if parts.target.is_some() {
        warn_unknown_param(token, "target", line_number, warnings);
    }

    Ok(pan)
}

fn parse_zoom(
    token: &str,
    line_number: usize,
    defaults: &EffectDefaults,
    warnings: &mut Vec<String>,
) -> Result<ZoomEffect, ParseError> {
    let parts = split_spec(token, line_number)?;
    let mut zoom = defaults.zoom();
    zoom.direction = parse_direction::<ZoomDirection>(
        &parts,
        token,
        defaults.zoom_direction,
        line_number,
        warnings,
    )?;

    for (key, value) in &parts.params {
        match key.to_ascii_lowercase().as_str() {
            "scale" => zoom.scale = number_param(key, value, line_number)?,
            "duration" => zoom.duration = number_param(key, value, line_number)?,
            _ => warn_unknown_param(token, key, line_number, warnings),
        }
    }

    if let Some(target) = parts.target {
        zoom.target = parse_zoom_target(target, token, line_number)?;
    }

    Ok(zoom)
}

/// 解析 `person:<id>` / `custom:<x>,<y>` / `center`
pub fn parse_zoom_target(
    value: &str,
    token: &str,
    line_number: usize,
) -> Result<ZoomTarget, ParseError> {
    let invalid = |message: String| ParseError::InvalidEffect {
        line: line_number,
        token: token.to_string(),
        message,
    };

    let value = value.trim();
    if value.eq_ignore_ascii_case("center") {
        return Ok(ZoomTarget::Center);
    }

    let (kind, rest) = value
        .split_once(':')
        .ok_or_else(|| invalid(format!("无效的 target '{}'", value)))?;

    match kind.trim().to_ascii_lowercase().as_str() {
        "person" => {
            let id = rest.trim();
            if id.is_empty() {
                return Err(invalid("target=person 缺少人物 id".to_string()));
            }
            Ok(ZoomTarget::person(id))
        }
        "custom" => {
            let (x, y) = rest
                .split_once(',')
                .ok_or_else(|| invalid(format!("自定义坐标应为 'x,y'，实际 '{}'", rest)))?;
            let x = number_param("target.x", x, line_number)?;
            let y = number_param("target.y", y, line_number)?;
            Ok(ZoomTarget::Custom { x, y })
        }
        other => Err(invalid(format!("未知的 target 类型 '{}'", other))),
    }
}
