//! # Config 模块
//!
//! 命令行工具的配置管理。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件 (ember.json)
//! 3. 默认值（最低）

use ember_script::{AudioPreference, EffectDefaults, EmberContext, StoryCutContext};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 默认配置文件名
pub const DEFAULT_CONFIG_PATH: &str = "ember.json";

/// 应用配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// 效果参数的默认值
    #[serde(default)]
    pub effects: EffectDefaults,

    /// 没有匹配到原始行的语音行使用的音频偏好
    #[serde(default)]
    pub default_preference: AudioPreference,

    /// 日志级别（trace/debug/info/warn/error）
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// ember 上下文文件（媒体与已标记人物，JSON）
    #[serde(default)]
    pub ember_path: Option<PathBuf>,

    /// story cut 上下文文件（贡献者偏好与声音名，JSON）
    #[serde(default)]
    pub story_cut_path: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            effects: EffectDefaults::default(),
            default_preference: AudioPreference::default(),
            log_level: default_log_level(),
            ember_path: None,
            story_cut_path: None,
        }
    }
}

impl AppConfig {
    /// 加载配置文件
    ///
    /// 文件不存在时返回默认配置；读取或解析失败时返回默认配置和错误，
    /// 由调用方在日志初始化之后报告。
    pub fn load(path: impl AsRef<Path>) -> (Self, Option<ConfigError>) {
        let path = path.as_ref();
        if !path.exists() {
            return (Self::default(), None);
        }

        match read_json(path) {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        let e = &self.effects;
        let positives = [
            ("effects.fade_duration", e.fade_duration),
            ("effects.pan_duration", e.pan_duration),
            ("effects.zoom_duration", e.zoom_duration),
            ("effects.zoom_scale", e.zoom_scale),
        ];
        for (name, value) in positives {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::ValidationFailed(format!(
                    "{} 必须为正数，实际 {}",
                    name, value
                )));
            }
        }

        if !(e.pan_distance.is_finite() && e.pan_distance >= 0.0) {
            return Err(ConfigError::ValidationFailed(format!(
                "effects.pan_distance 不能为负，实际 {}",
                e.pan_distance
            )));
        }

        if self.log_level.parse::<tracing::Level>().is_err() {
            return Err(ConfigError::ValidationFailed(format!(
                "未知的日志级别: {}",
                self.log_level
            )));
        }

        for path in [&self.ember_path, &self.story_cut_path].into_iter().flatten() {
            if !path.exists() {
                return Err(ConfigError::ValidationFailed(format!(
                    "上下文文件不存在: {}",
                    path.display()
                )));
            }
        }

        Ok(())
    }

    /// 日志级别（无法解析时为 INFO）
    pub fn level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }

    /// 读取 ember 上下文（未配置时为空）
    pub fn load_ember(&self) -> Result<EmberContext, ConfigError> {
        match &self.ember_path {
            Some(path) => read_json(path),
            None => Ok(EmberContext::default()),
        }
    }

    /// 读取 story cut 上下文
    ///
    /// 未配置时使用 `default_preference` 构造。
    pub fn load_story_cut(&self) -> Result<StoryCutContext, ConfigError> {
        match &self.story_cut_path {
            Some(path) => read_json(path),
            None => Ok(StoryCutContext {
                default_preference: self.default_preference.clone(),
                ..StoryCutContext::default()
            }),
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("配置序列化失败: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("配置 IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("配置验证失败: {0}")]
    ValidationFailed(String),
}
