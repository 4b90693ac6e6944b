//! # Block 模块
//!
//! 定义故事剪辑（story cut）时间线上的块。
//!
//! 块的顺序即播放顺序，`id` 在同一个 story cut 内唯一。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 块标识符
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// 按序号生成 id（解析器使用，从 1 开始）
    pub fn from_index(index: usize) -> Self {
        Self(format!("block-{}", index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for BlockId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// 语音块的音频来源偏好
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioPreference {
    /// 使用贡献者的原始录音
    Recorded,
    /// 使用贡献者的个人合成声音
    Personal,
    /// 纯文本（默认合成声音）
    #[default]
    Text,
    /// 其他工具写入的标记，原样保留
    #[serde(untagged)]
    Other(String),
}

impl AudioPreference {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Recorded => "recorded",
            Self::Personal => "personal",
            Self::Text => "text",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for AudioPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudioPreference {
    type Err = std::convert::Infallible;

    /// 不区分大小写；未知值保留为 `Other`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s.to_lowercase().as_str() {
            "recorded" => Self::Recorded,
            "personal" => Self::Personal,
            "text" => Self::Text,
            _ => Self::Other(s.to_string()),
        })
    }
}

/// 块类型及其数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BlockKind {
    /// 媒体（图片/视频）
    Media {
        media_id: Option<String>,
        media_name: Option<String>,
        /// 渲染用地址，不写入脚本，由媒体查询回填
        media_url: Option<String>,
    },

    /// 语音旁白
    Voice {
        contributor_name: Option<String>,
        /// 无贡献者时的声音标签（如 "Narrator"）
        voice_tag: Option<String>,
        content: String,
        audio_preference: AudioPreference,
        contribution_id: Option<String>,
    },

    /// 加载屏
    #[serde(rename = "loadscreen")]
    LoadScreen {
        message: String,
        duration: f64,
        icon: String,
    },

    /// 开始标记
    Start,

    /// 结束标记
    End,
}

/// 时间线上的一个块
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    #[serde(flatten)]
    pub kind: BlockKind,
}

impl Block {
    pub fn new(id: impl Into<BlockId>, kind: BlockKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    /// 创建媒体块
    pub fn media(
        id: impl Into<BlockId>,
        media_id: impl Into<String>,
        media_name: impl Into<String>,
    ) -> Self {
        Self::new(
            id,
            BlockKind::Media {
                media_id: Some(media_id.into()),
                media_name: Some(media_name.into()),
                media_url: None,
            },
        )
    }

    /// 创建语音块
    pub fn voice(
        id: impl Into<BlockId>,
        contributor_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::new(
            id,
            BlockKind::Voice {
                contributor_name: Some(contributor_name.into()),
                voice_tag: None,
                content: content.into(),
                audio_preference: AudioPreference::default(),
                contribution_id: None,
            },
        )
    }

    pub fn is_media(&self) -> bool {
        matches!(self.kind, BlockKind::Media { .. })
    }

    /// 块类型名（与持久化的 `type` 字段一致）
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            BlockKind::Media { .. } => "media",
            BlockKind::Voice { .. } => "voice",
            BlockKind::LoadScreen { .. } => "loadscreen",
            BlockKind::Start => "start",
            BlockKind::End => "end",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_preference_from_str() {
        assert_eq!("Recorded".parse(), Ok(AudioPreference::Recorded));
        assert_eq!(" personal ".parse(), Ok(AudioPreference::Personal));
        assert_eq!("text".parse(), Ok(AudioPreference::Text));
        assert_eq!(
            "synth".parse(),
            Ok(AudioPreference::Other("synth".to_string()))
        );
        assert_eq!(AudioPreference::Other("synth".into()).to_string(), "synth");
    }

    #[test]
    fn test_block_type_name() {
        assert_eq!(Block::media("b1", "m1", "beach.jpg").type_name(), "media");
        assert_eq!(Block::voice("b2", "Sarah", "hi").type_name(), "voice");
        assert_eq!(Block::new("s", BlockKind::Start).type_name(), "start");
    }

    #[test]
    fn test_block_serde_shape() {
        let block = Block::media("b1", "m1", "beach.jpg");
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["id"], "b1");
        assert_eq!(json["type"], "media");
        assert_eq!(json["media_id"], "m1");

        let back: Block = serde_json::from_value(json).unwrap();
        assert_eq!(back, block);
    }

    #[test]
    fn test_block_id_from_index() {
        assert_eq!(BlockId::from_index(3).as_str(), "block-3");
    }
}
