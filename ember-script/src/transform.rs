//! # Transform 模块
//!
//! 把块上的效果解析为 CSS 等价的样式描述。
//!
//! 这是 [`EffectSet`] → [`StyleDescriptor`] 的唯一转换入口，按约定不会失败：
//! 无法解析的输入退化为最近的安全默认值（单位变换、完全不透明、中心锚点）。
//!
//! ## 变换顺序
//!
//! | 效果 | 输出 |
//! |------|------|
//! | pan | `translateX(±distance%)`，left 为负 |
//! | zoom | `scale(s)`，out 且 scale > 1 时取 `1/scale` |
//! | fade | 不进入 transform，改为 `fadeIn` / `fadeOut` 动画 |
//!
//! transition 时长取 `max(pan, zoom, 0.5)`。

use serde::Serialize;
use thiserror::Error;

use crate::context::{RenderedImage, TaggedPerson};
use crate::effect::{
    EffectDefaults, EffectSet, FadeDirection, PanDirection, ZoomDirection, ZoomEffect, ZoomTarget,
};
use crate::script::format::format_number;

/// 单位变换
pub const IDENTITY_TRANSFORM: &str = "scale(1) translateX(0)";
/// 中心锚点
pub const CENTER_ORIGIN: &str = "center center";
/// transition 的最短时长（秒）
pub const MIN_TRANSITION: f64 = 0.5;

/// 样式描述
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleDescriptor {
    pub transform: String,
    pub transform_origin: String,
    /// 动画开始前的不透明度
    pub opacity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animation: Option<String>,
    pub transition: String,
}

impl Default for StyleDescriptor {
    fn default() -> Self {
        Self {
            transform: IDENTITY_TRANSFORM.to_string(),
            transform_origin: CENTER_ORIGIN.to_string(),
            opacity: 1.0,
            animation: None,
            transition: transition_for(MIN_TRANSITION),
        }
    }
}

/// 锚点解析所需的上下文
#[derive(Clone, Copy, Default)]
pub struct ResolveContext<'a> {
    pub tagged_people: &'a [TaggedPerson],
    /// 当前已渲染的图片；未加载完成时为 `None`
    pub image: Option<&'a dyn RenderedImage>,
    pub defaults: EffectDefaults,
}

impl<'a> ResolveContext<'a> {
    pub fn new(tagged_people: &'a [TaggedPerson]) -> Self {
        Self {
            tagged_people,
            image: None,
            defaults: EffectDefaults::default(),
        }
    }

    pub fn with_image(mut self, image: &'a dyn RenderedImage) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_defaults(mut self, defaults: EffectDefaults) -> Self {
        self.defaults = defaults;
        self
    }
}

/// 锚点无法解析的原因
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OriginError {
    #[error("找不到已标记人物 '{0}'")]
    PersonNotFound(String),

    #[error("人物 '{0}' 没有人脸坐标")]
    NoFaceCoordinates(String),

    #[error("图片尚未就绪")]
    ImageNotReady,

    #[error("坐标 ({x}, {y}) 超出图片范围 {width}x{height}")]
    OutOfBounds {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
}

/// 解析块上的效果
pub fn resolve_transform(effects: &EffectSet, ctx: &ResolveContext<'_>) -> StyleDescriptor {
    let effects = effects.sanitized(&ctx.defaults);

    let mut transforms = Vec::with_capacity(2);
    let mut transition = MIN_TRANSITION;
    let mut style = StyleDescriptor::default();

    if let Some(pan) = &effects.pan {
        let signed = match pan.direction {
            PanDirection::Left => -pan.distance,
            PanDirection::Right => pan.distance,
        };
        transforms.push(format!("translateX({}%)", format_number(signed)));
        transition = transition.max(pan.duration);
    }

    if let Some(zoom) = &effects.zoom {
        transforms.push(format!("scale({})", format_number(effective_scale(zoom))));
        transition = transition.max(zoom.duration);
        style.transform_origin = resolve_origin(&zoom.target, ctx);
    }

    if let Some(fade) = &effects.fade {
        let (name, opacity) = match fade.direction {
            FadeDirection::In => ("fadeIn", 0.0),
            FadeDirection::Out => ("fadeOut", 1.0),
        };
        style.animation = Some(format!(
            "{} {}s ease-in-out forwards",
            name,
            format_number(fade.duration)
        ));
        style.opacity = opacity;
    }

    if !transforms.is_empty() {
        style.transform = transforms.join(" ");
    }
    style.transition = transition_for(transition);
    style
}

/// out 方向且 scale > 1 时取倒数
pub fn effective_scale(zoom: &ZoomEffect) -> f64 {
    if zoom.direction == ZoomDirection::Out && zoom.scale > 1.0 {
        1.0 / zoom.scale
    } else {
        zoom.scale
    }
}

/// 解析 transform-origin，失败时回退到中心并记录警告
pub fn resolve_origin(target: &ZoomTarget, ctx: &ResolveContext<'_>) -> String {
    match try_resolve_origin(target, ctx) {
        Ok(origin) => origin,
        Err(e) => {
            tracing::warn!(zoom_target = ?target, error = %e, "zoom 锚点无法解析，回退到中心");
            CENTER_ORIGIN.to_string()
        }
    }
}

/// 解析 transform-origin
pub fn try_resolve_origin(
    target: &ZoomTarget,
    ctx: &ResolveContext<'_>,
) -> Result<String, OriginError> {
    let (x, y) = match target {
        ZoomTarget::Center => return Ok(CENTER_ORIGIN.to_string()),
        ZoomTarget::Person { person_id } => {
            let person = ctx
                .tagged_people
                .iter()
                .find(|p| &p.id == person_id)
                .ok_or_else(|| OriginError::PersonNotFound(person_id.clone()))?;
            let face = person
                .face_coordinates
                .ok_or_else(|| OriginError::NoFaceCoordinates(person_id.clone()))?;
            (face.x, face.y)
        }
        ZoomTarget::Custom { x, y } => (*x, *y),
    };

    let (width, height) = ctx
        .image
        .and_then(|image| image.natural_size())
        .ok_or(OriginError::ImageNotReady)?;

    let in_bounds = x.is_finite()
        && y.is_finite()
        && (0.0..=width).contains(&x)
        && (0.0..=height).contains(&y);
    if !in_bounds {
        return Err(OriginError::OutOfBounds {
            x,
            y,
            width,
            height,
        });
    }

    Ok(format!(
        "{}% {}%",
        format_number(x / width * 100.0),
        format_number(y / height * 100.0)
    ))
}

fn transition_for(duration: f64) -> String {
    format!("transform {}s ease-out", format_number(duration))
}
