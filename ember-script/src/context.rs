//! # Context 模块
//!
//! 外部协作方的数据与查询接口：媒体记录、已标记人物、已渲染图片。
//!
//! 核心库不做任何 IO，调用方通过这里的 trait 注入数据。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::block::AudioPreference;

/// 像素坐标
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// 已标记的人物
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedPerson {
    pub id: String,
    pub person_name: String,
    /// 人脸位置（原图自然尺寸下的像素坐标）
    #[serde(default)]
    pub face_coordinates: Option<Point>,
}

/// 媒体记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRecord {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub storage_url: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub image_width: Option<u32>,
    #[serde(default)]
    pub image_height: Option<u32>,
}

impl MediaRecord {
    /// 展示名：优先 display_name，其次 file_name
    pub fn name(&self) -> Option<&str> {
        self.display_name.as_deref().or(self.file_name.as_deref())
    }

    /// 访问地址：优先 storage_url，其次 file_url
    pub fn url(&self) -> Option<&str> {
        self.storage_url.as_deref().or(self.file_url.as_deref())
    }
}

/// 媒体查询（限定在一个 ember 内）
pub trait MediaLookup {
    fn media_by_id(&self, id: &str) -> Option<&MediaRecord>;
    fn media_by_name(&self, name: &str) -> Option<&MediaRecord>;
}

impl MediaLookup for [MediaRecord] {
    fn media_by_id(&self, id: &str) -> Option<&MediaRecord> {
        self.iter().find(|m| m.id == id)
    }

    fn media_by_name(&self, name: &str) -> Option<&MediaRecord> {
        self.iter().find(|m| {
            m.display_name.as_deref() == Some(name) || m.file_name.as_deref() == Some(name)
        })
    }
}

impl MediaLookup for Vec<MediaRecord> {
    fn media_by_id(&self, id: &str) -> Option<&MediaRecord> {
        self.as_slice().media_by_id(id)
    }

    fn media_by_name(&self, name: &str) -> Option<&MediaRecord> {
        self.as_slice().media_by_name(name)
    }
}

/// 已渲染的图片元素
///
/// 只有图片加载完成后才有自然尺寸；未就绪时返回 `None`，调用方直接回退，不等待。
pub trait RenderedImage {
    fn natural_size(&self) -> Option<(f64, f64)>;
}

/// 固定尺寸的图片（测试与无界面宿主使用）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageSize {
    pub width: f64,
    pub height: f64,
}

impl ImageSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl RenderedImage for ImageSize {
    fn natural_size(&self) -> Option<(f64, f64)> {
        (self.width > 0.0 && self.height > 0.0).then_some((self.width, self.height))
    }
}

impl RenderedImage for MediaRecord {
    fn natural_size(&self) -> Option<(f64, f64)> {
        match (self.image_width, self.image_height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w as f64, h as f64)),
            _ => None,
        }
    }
}

/// ember 上下文：媒体与人物
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmberContext {
    #[serde(default)]
    pub media: Vec<MediaRecord>,
    #[serde(default)]
    pub tagged_people: Vec<TaggedPerson>,
}

impl EmberContext {
    pub fn person(&self, id: &str) -> Option<&TaggedPerson> {
        self.tagged_people.iter().find(|p| p.id == id)
    }
}

/// story cut 上下文：贡献者的默认音频偏好
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoryCutContext {
    #[serde(default)]
    pub title: Option<String>,
    /// 没有匹配到原始行时使用的偏好
    #[serde(default)]
    pub default_preference: AudioPreference,
    /// 按贡献者名指定的偏好
    #[serde(default)]
    pub contributor_preferences: HashMap<String, AudioPreference>,
    /// 声音标签的展示名（如 `"EMBER VOICE"` → `"Ember"`）
    #[serde(default)]
    pub voice_names: HashMap<String, String>,
}

impl StoryCutContext {
    pub fn preference_for(&self, contributor: &str) -> AudioPreference {
        self.contributor_preferences
            .get(contributor)
            .cloned()
            .unwrap_or_else(|| self.default_preference.clone())
    }

    /// 标签 → 展示名（没有映射时原样返回）
    pub fn display_name<'a>(&'a self, tag: &'a str) -> &'a str {
        self.voice_names.get(tag).map(String::as_str).unwrap_or(tag)
    }

    /// 展示名 → 标签（没有映射时原样返回）
    pub fn tag_for<'a>(&'a self, display_name: &'a str) -> &'a str {
        self.voice_names
            .iter()
            .find(|(_, name)| name.as_str() == display_name)
            .map(|(tag, _)| tag.as_str())
            .unwrap_or(display_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, display: Option<&str>, file: Option<&str>) -> MediaRecord {
        MediaRecord {
            id: id.to_string(),
            display_name: display.map(str::to_string),
            file_name: file.map(str::to_string),
            storage_url: None,
            file_url: Some(format!("https://cdn.example/{id}")),
            image_width: Some(800),
            image_height: Some(600),
        }
    }

    #[test]
    fn test_media_lookup() {
        let media = vec![
            record("m1", Some("Beach"), Some("beach.jpg")),
            record("m2", None, Some("dog.png")),
        ];
        assert_eq!(media.media_by_id("m2").and_then(|m| m.name()), Some("dog.png"));
        assert_eq!(media.media_by_name("beach.jpg").map(|m| m.id.as_str()), Some("m1"));
        assert_eq!(media.media_by_name("Beach").map(|m| m.id.as_str()), Some("m1"));
        assert!(media.media_by_id("m3").is_none());
        assert_eq!(media[0].url(), Some("https://cdn.example/m1"));
    }

    #[test]
    fn test_natural_size() {
        assert_eq!(ImageSize::new(0.0, 10.0).natural_size(), None);
        assert_eq!(ImageSize::new(4.0, 3.0).natural_size(), Some((4.0, 3.0)));
        let m = record("m1", None, None);
        assert_eq!(m.natural_size(), Some((800.0, 600.0)));
    }

    #[test]
    fn test_preference_for() {
        let mut ctx = StoryCutContext::default();
        ctx.contributor_preferences
            .insert("Sarah".to_string(), AudioPreference::Recorded);
        assert_eq!(ctx.preference_for("Sarah"), AudioPreference::Recorded);
        assert_eq!(ctx.preference_for("Tom"), AudioPreference::Text);
    }

    #[test]
    fn test_voice_name_mapping() {
        let mut ctx = StoryCutContext::default();
        ctx.voice_names
            .insert("EMBER VOICE".to_string(), "Ember".to_string());
        assert_eq!(ctx.display_name("EMBER VOICE"), "Ember");
        assert_eq!(ctx.display_name("Sarah"), "Sarah");
        assert_eq!(ctx.tag_for("Ember"), "EMBER VOICE");
        assert_eq!(ctx.tag_for("Sarah"), "Sarah");
    }
}
