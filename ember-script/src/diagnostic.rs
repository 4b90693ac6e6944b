//! # 诊断模块
//!
//! 提供脚本静态检查和诊断 API，不依赖 IO。
//!
//! ## 设计原则
//!
//! - 纯函数 API，可在无 IO 环境下运行
//! - 诊断分级：Error（必须修复）、Warn（建议修复）、Info（信息提示）
//! - 复用解析结果，不重复解析逻辑

use std::collections::HashMap;

use crate::block::{AudioPreference, BlockKind};
use crate::context::{EmberContext, MediaLookup, MediaRecord, RenderedImage};
use crate::effect::{EffectSet, ZoomTarget};
use crate::script::ParsedScript;

/// 诊断级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticLevel {
    /// 信息提示
    Info,
    /// 警告（建议修复）
    Warn,
    /// 错误（必须修复）
    Error,
}

impl std::fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// 诊断条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    /// 脚本 ID / 文件路径
    pub script_id: String,
    /// 行号（如果可定位，从 1 开始）
    pub line: Option<usize>,
    pub message: String,
    pub detail: Option<String>,
}

impl Diagnostic {
    fn with_level(
        level: DiagnosticLevel,
        script_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            script_id: script_id.into(),
            line: None,
            message: message.into(),
            detail: None,
        }
    }

    pub fn error(script_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Error, script_id, message)
    }

    pub fn warn(script_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Warn, script_id, message)
    }

    pub fn info(script_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Info, script_id, message)
    }

    /// 设置行号
    pub fn with_line(mut self, line: Option<usize>) -> Self {
        self.line = line;
        self
    }

    /// 设置详情
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.level, self.script_id)?;
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, "\n  | {}", detail)?;
        }
        Ok(())
    }
}

/// 诊断结果
#[derive(Debug, Clone, Default)]
pub struct DiagnosticResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// 合并另一个结果
    pub fn merge(&mut self, other: DiagnosticResult) {
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn error_count(&self) -> usize {
        self.count(DiagnosticLevel::Error)
    }

    pub fn warn_count(&self) -> usize {
        self.count(DiagnosticLevel::Warn)
    }

    fn count(&self, level: DiagnosticLevel) -> usize {
        self.diagnostics.iter().filter(|d| d.level == level).count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// 按级别过滤（不低于 `min_level`）
    pub fn filter_by_level(&self, min_level: DiagnosticLevel) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.level >= min_level)
            .collect()
    }
}

/// 媒体引用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaReference {
    pub media_id: Option<String>,
    pub media_name: Option<String>,
    pub line: Option<usize>,
}

//=============================================================================
// 脚本分析 API
//=============================================================================

/// 分析脚本，返回诊断结果
///
/// 执行以下检查：
/// - 同一媒体 id 对应不同名称（Warn）
/// - 没有媒体 id 的媒体块（Info）
/// - 媒体 id 在 ember 中不存在（Warn，仅当 ember 提供了媒体列表）
/// - zoom 锚点引用未标记的人物（Warn）
/// - 自定义锚点坐标为负（Error），超出图片尺寸（Warn）
/// - 非正的时长或倍率（Error）
/// - 空的语音内容（Warn）
/// - recorded 偏好但没有贡献 id（Warn）
pub fn analyze_script(
    script_id: &str,
    script: &ParsedScript,
    ember: &EmberContext,
) -> DiagnosticResult {
    let mut result = DiagnosticResult::new();
    let mut names_by_id: HashMap<&str, &str> = HashMap::new();

    for (index, block) in script.blocks.iter().enumerate() {
        let line = script.line_of(index);

        match &block.kind {
            BlockKind::Media {
                media_id,
                media_name,
                ..
            } => {
                match media_id.as_deref() {
                    None => result.push(
                        Diagnostic::info(script_id, format!("媒体块 {} 没有媒体 id", block.id))
                            .with_line(line),
                    ),
                    Some(id) => {
                        if let Some(name) = media_name.as_deref() {
                            match names_by_id.get(id) {
                                Some(previous) if *previous != name => result.push(
                                    Diagnostic::warn(
                                        script_id,
                                        format!("媒体 id '{}' 对应了不同的名称", id),
                                    )
                                    .with_line(line)
                                    .with_detail(format!("'{}' 与 '{}'", previous, name)),
                                ),
                                Some(_) => {}
                                None => {
                                    names_by_id.insert(id, name);
                                }
                            }
                        }
                        if !ember.media.is_empty() && ember.media.media_by_id(id).is_none() {
                            result.push(
                                Diagnostic::warn(script_id, format!("媒体 '{}' 不存在", id))
                                    .with_line(line),
                            );
                        }
                    }
                }

                if let Some(effects) = script.effect_set(&block.id) {
                    let image = media_id
                        .as_deref()
                        .and_then(|id| ember.media.media_by_id(id));
                    check_effects(script_id, line, effects, image, ember, &mut result);
                }
            }
            BlockKind::Voice {
                content,
                audio_preference,
                contribution_id,
                ..
            } => {
                if content.trim().is_empty() {
                    result.push(
                        Diagnostic::warn(script_id, format!("语音块 {} 内容为空", block.id))
                            .with_line(line),
                    );
                }
                if *audio_preference == AudioPreference::Recorded && contribution_id.is_none() {
                    result.push(
                        Diagnostic::warn(script_id, "recorded 偏好缺少贡献 id，无法播放原声")
                            .with_line(line),
                    );
                }
            }
            BlockKind::LoadScreen { duration, .. } if *duration <= 0.0 => result.push(
                Diagnostic::warn(script_id, "加载屏时长为 0，不会显示").with_line(line),
            ),
            _ => {}
        }
    }

    result
}

fn check_effects(
    script_id: &str,
    line: Option<usize>,
    effects: &EffectSet,
    image: Option<&MediaRecord>,
    ember: &EmberContext,
    result: &mut DiagnosticResult,
) {
    let mut non_positive = |what: &str, value: f64| {
        if value.is_nan() || value <= 0.0 {
            result.push(
                Diagnostic::error(script_id, format!("{} 必须为正数", what))
                    .with_line(line)
                    .with_detail(format!("实际值 {}", value)),
            );
        }
    };

    if let Some(fade) = &effects.fade {
        non_positive("fade duration", fade.duration);
    }
    if let Some(pan) = &effects.pan {
        non_positive("pan duration", pan.duration);
    }
    let Some(zoom) = &effects.zoom else {
        return;
    };
    non_positive("zoom duration", zoom.duration);
    non_positive("zoom scale", zoom.scale);

    match &zoom.target {
        ZoomTarget::Center => {}
        ZoomTarget::Person { person_id } => {
            if ember.person(person_id).is_none() {
                result.push(
                    Diagnostic::warn(script_id, format!("zoom 锚点引用了未标记的人物 '{}'", person_id))
                        .with_line(line),
                );
            }
        }
        ZoomTarget::Custom { x, y } => {
            if *x < 0.0 || *y < 0.0 {
                result.push(
                    Diagnostic::error(script_id, format!("自定义锚点坐标为负: ({}, {})", x, y))
                        .with_line(line),
                );
            } else if let Some((width, height)) = image.and_then(|m| m.natural_size())
                && (*x > width || *y > height)
            {
                result.push(
                    Diagnostic::warn(script_id, format!("自定义锚点 ({}, {}) 超出图片范围", x, y))
                        .with_line(line)
                        .with_detail(format!("图片尺寸 {}x{}", width, height)),
                );
            }
        }
    }
}

/// 提取脚本中的所有媒体引用
pub fn extract_media_references(script: &ParsedScript) -> Vec<MediaReference> {
    script
        .blocks
        .iter()
        .enumerate()
        .filter_map(|(index, block)| match &block.kind {
            BlockKind::Media {
                media_id,
                media_name,
                ..
            } => Some(MediaReference {
                media_id: media_id.clone(),
                media_name: media_name.clone(),
                line: script.line_of(index),
            }),
            _ => None,
        })
        .collect()
}

/// 用媒体查询补全媒体块的 url（先按 id，再按名称）
///
/// 返回仍未解析的块数。
pub fn resolve_media_urls(script: &mut ParsedScript, media: &impl MediaLookup) -> usize {
    let mut unresolved = 0;
    for block in &mut script.blocks {
        let BlockKind::Media {
            media_id,
            media_name,
            media_url,
        } = &mut block.kind
        else {
            continue;
        };

        let record = media_id
            .as_deref()
            .and_then(|id| media.media_by_id(id))
            .or_else(|| media_name.as_deref().and_then(|name| media.media_by_name(name)));

        match record.and_then(|r| r.url()) {
            Some(url) => *media_url = Some(url.to_string()),
            None => {
                tracing::debug!(block = %block.id, "媒体 url 未解析");
                unresolved += 1;
            }
        }
    }
    unresolved
}
