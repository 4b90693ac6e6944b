//! # Effect 模块
//!
//! 媒体块上的视觉效果定义：淡入淡出（fade）、平移（pan）、缩放（zoom）。
//!
//! ## 语义说明
//!
//! - 每个块每种效果最多一个实例
//! - 三种效果相互独立，可叠加：pan/zoom 拼接 transform，fade 只影响透明度与动画
//! - 缺失参数一律由 [`EffectDefaults`] 补齐

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 默认参数
///
/// 这些常量是效果默认值的**唯一来源**。
pub mod defaults {
    /// fade 默认时长（秒）
    pub const FADE_DURATION: f64 = 3.0;
    /// pan 默认时长（秒）
    pub const PAN_DURATION: f64 = 4.0;
    /// pan 默认距离（百分比）
    pub const PAN_DISTANCE: f64 = 25.0;
    /// zoom 默认时长（秒）
    pub const ZOOM_DURATION: f64 = 3.5;
    /// zoom 默认倍率
    pub const ZOOM_SCALE: f64 = 1.5;
}

/// 效果类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    Fade,
    Pan,
    Zoom,
}

impl EffectKind {
    /// 固定输出顺序
    pub const ALL: [EffectKind; 3] = [EffectKind::Fade, EffectKind::Pan, EffectKind::Zoom];

    /// 脚本中的大写标记
    pub fn tag(self) -> &'static str {
        match self {
            Self::Fade => "FADE",
            Self::Pan => "PAN",
            Self::Zoom => "ZOOM",
        }
    }
}

impl FromStr for EffectKind {
    type Err = ();

    /// 不区分大小写
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fade" => Ok(Self::Fade),
            "pan" => Ok(Self::Pan),
            "zoom" => Ok(Self::Zoom),
            _ => Err(()),
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// fade 方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FadeDirection {
    #[default]
    In,
    Out,
}

/// pan 方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanDirection {
    #[default]
    Left,
    Right,
}

/// zoom 方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoomDirection {
    #[default]
    In,
    Out,
}

macro_rules! direction_text {
    ($ty:ty { $($variant:ident => $lower:literal),+ $(,)? }) => {
        impl $ty {
            /// 小写名称（store / JSON 中使用）
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $lower,)+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(
                    if s.eq_ignore_ascii_case($lower) {
                        return Ok(Self::$variant);
                    }
                )+
                Err(())
            }
        }
    };
}

direction_text!(FadeDirection { In => "in", Out => "out" });
direction_text!(PanDirection { Left => "left", Right => "right" });
direction_text!(ZoomDirection { In => "in", Out => "out" });

/// zoom 锚点
///
/// 坐标均为原图自然尺寸下的像素坐标。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ZoomTarget {
    /// 图片中心
    #[default]
    Center,
    /// 已标记人物的人脸位置
    Person { person_id: String },
    /// 自定义像素坐标
    Custom { x: f64, y: f64 },
}

impl ZoomTarget {
    pub fn person(id: impl Into<String>) -> Self {
        Self::Person {
            person_id: id.into(),
        }
    }

    pub fn is_center(&self) -> bool {
        matches!(self, Self::Center)
    }
}

/// fade 效果
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FadeEffect {
    pub direction: FadeDirection,
    pub duration: f64,
}

/// pan 效果
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanEffect {
    pub direction: PanDirection,
    /// 平移距离（百分比）
    pub distance: f64,
    pub duration: f64,
}

/// zoom 效果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoomEffect {
    pub direction: ZoomDirection,
    pub scale: f64,
    pub duration: f64,
    #[serde(default)]
    pub target: ZoomTarget,
}

/// 一个块上生效的全部效果
///
/// 只包含已选中的效果，参数已补齐。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EffectSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fade: Option<FadeEffect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pan: Option<PanEffect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<ZoomEffect>,
}

impl EffectSet {
    pub fn is_empty(&self) -> bool {
        self.fade.is_none() && self.pan.is_none() && self.zoom.is_none()
    }

    pub fn contains(&self, kind: EffectKind) -> bool {
        match kind {
            EffectKind::Fade => self.fade.is_some(),
            EffectKind::Pan => self.pan.is_some(),
            EffectKind::Zoom => self.zoom.is_some(),
        }
    }

    /// 已包含的效果类型（按固定顺序）
    pub fn kinds(&self) -> impl Iterator<Item = EffectKind> + '_ {
        EffectKind::ALL.into_iter().filter(|k| self.contains(*k))
    }
}

fn positive_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}

fn non_negative_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        fallback
    }
}

impl EffectSet {
    /// 把非法数值（NaN、无穷、非正时长/倍率、负距离）替换为默认值
    ///
    /// 非有限的自定义坐标退化为中心锚点。
    pub fn sanitized(&self, defaults: &EffectDefaults) -> EffectSet {
        EffectSet {
            fade: self.fade.map(|f| FadeEffect {
                direction: f.direction,
                duration: positive_or(f.duration, defaults.fade_duration),
            }),
            pan: self.pan.map(|p| PanEffect {
                direction: p.direction,
                distance: non_negative_or(p.distance, defaults.pan_distance),
                duration: positive_or(p.duration, defaults.pan_duration),
            }),
            zoom: self.zoom.as_ref().map(|z| ZoomEffect {
                direction: z.direction,
                scale: positive_or(z.scale, defaults.zoom_scale),
                duration: positive_or(z.duration, defaults.zoom_duration),
                target: match &z.target {
                    ZoomTarget::Custom { x, y } if !x.is_finite() || !y.is_finite() => {
                        ZoomTarget::Center
                    }
                    other => other.clone(),
                },
            }),
        }
    }
}

/// 可配置的默认参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectDefaults {
    pub fade_duration: f64,
    pub fade_direction: FadeDirection,
    pub pan_duration: f64,
    pub pan_distance: f64,
    pub pan_direction: PanDirection,
    pub zoom_duration: f64,
    pub zoom_scale: f64,
    pub zoom_direction: ZoomDirection,
}

impl Default for EffectDefaults {
    fn default() -> Self {
        Self {
            fade_duration: defaults::FADE_DURATION,
            fade_direction: FadeDirection::In,
            pan_duration: defaults::PAN_DURATION,
            pan_distance: defaults::PAN_DISTANCE,
            pan_direction: PanDirection::Left,
            zoom_duration: defaults::ZOOM_DURATION,
            zoom_scale: defaults::ZOOM_SCALE,
            zoom_direction: ZoomDirection::In,
        }
    }
}

impl EffectDefaults {
    /// 默认 fade
    pub fn fade(&self) -> FadeEffect {
        FadeEffect {
            direction: self.fade_direction,
            duration: self.fade_duration,
        }
    }

    /// 默认 pan
    pub fn pan(&self) -> PanEffect {
        PanEffect {
            direction: self.pan_direction,
            distance: self.pan_distance,
            duration: self.pan_duration,
        }
    }

    /// 默认 zoom（锚点为中心）
    pub fn zoom(&self) -> ZoomEffect {
        ZoomEffect {
            direction: self.zoom_direction,
            scale: self.zoom_scale,
            duration: self.zoom_duration,
            target: ZoomTarget::Center,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_parse_case_insensitive() {
        assert_eq!("IN".parse::<FadeDirection>(), Ok(FadeDirection::In));
        assert_eq!("Right".parse::<PanDirection>(), Ok(PanDirection::Right));
        assert_eq!("out".parse::<ZoomDirection>(), Ok(ZoomDirection::Out));
        assert!("up".parse::<PanDirection>().is_err());
    }

    #[test]
    fn test_effect_kind_order_and_tag() {
        let set = EffectSet {
            fade: None,
            pan: Some(EffectDefaults::default().pan()),
            zoom: Some(EffectDefaults::default().zoom()),
        };
        let kinds: Vec<_> = set.kinds().collect();
        assert_eq!(kinds, vec![EffectKind::Pan, EffectKind::Zoom]);
        assert_eq!(EffectKind::Zoom.tag(), "ZOOM");
        assert_eq!("zOoM".parse::<EffectKind>(), Ok(EffectKind::Zoom));
    }

    #[test]
    fn test_default_values() {
        let d = EffectDefaults::default();
        assert_eq!(d.fade_duration, 3.0);
        assert_eq!(d.pan_duration, 4.0);
        assert_eq!(d.pan_distance, 25.0);
        assert_eq!(d.pan_direction, PanDirection::Left);
        assert_eq!(d.zoom_duration, 3.5);
        assert_eq!(d.zoom_scale, 1.5);
        assert_eq!(d.zoom_direction, ZoomDirection::In);
    }

    #[test]
    fn test_effect_defaults_partial_json() {
        let d: EffectDefaults = serde_json::from_str(r#"{"zoom_scale": 2.0}"#).unwrap();
        assert_eq!(d.zoom_scale, 2.0);
        assert_eq!(d.fade_duration, defaults::FADE_DURATION);
    }

    #[test]
    fn test_zoom_target_serde() {
        let t = ZoomTarget::person("p1");
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, r#"{"type":"person","person_id":"p1"}"#);
        assert!(ZoomTarget::default().is_center());
    }

    #[test]
    fn test_sanitized_replaces_invalid_numbers() {
        let d = EffectDefaults::default();
        let set = EffectSet {
            fade: Some(FadeEffect {
                direction: FadeDirection::Out,
                duration: f64::NAN,
            }),
            pan: Some(PanEffect {
                direction: PanDirection::Right,
                distance: -3.0,
                duration: 0.0,
            }),
            zoom: Some(ZoomEffect {
                direction: ZoomDirection::Out,
                scale: f64::INFINITY,
                duration: 2.0,
                target: ZoomTarget::Custom {
                    x: f64::NAN,
                    y: 1.0,
                },
            }),
        };
        let clean = set.sanitized(&d);
        assert_eq!(clean.fade.unwrap().duration, 3.0);
        assert_eq!(clean.fade.unwrap().direction, FadeDirection::Out);
        let pan = clean.pan.unwrap();
        assert_eq!(pan.distance, 25.0);
        assert_eq!(pan.duration, 4.0);
        let zoom = clean.zoom.unwrap();
        assert_eq!(zoom.scale, 1.5);
        assert_eq!(zoom.duration, 2.0);
        assert!(zoom.target.is_center());
    }
}
