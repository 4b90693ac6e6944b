//! # 子命令实现
//!
//! 每个子命令读取输入文本，调用 `ember-script`，返回要输出的文本。
//! 文件读写只发生在 `main` 中。

use anyhow::Context;
use serde::Serialize;

use ember_script::{
    AudioOverrides, BlockId, DiagnosticResult, EmberContext, MediaLookup, ParsedScript, Parser,
    ResolveContext, StoryCutContext, StyleDescriptor, analyze_script, format_for_display,
    generate_script, reconstruct, resolve_media_urls, resolve_transform,
};

use crate::config::AppConfig;

/// `check` 的结果
#[derive(Debug)]
pub struct CheckReport {
    pub warnings: Vec<String>,
    pub diagnostics: DiagnosticResult,
}

impl CheckReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }

    /// 输出文本，与 xtask script-check 相同的格式
    pub fn render(&self, script_id: &str) -> String {
        let mut lines: Vec<String> = self
            .warnings
            .iter()
            .map(|w| format!("[WARN] {}: {}", script_id, w))
            .collect();
        lines.extend(self.diagnostics.diagnostics.iter().map(|d| d.to_string()));

        let errors = self.diagnostics.error_count();
        let warns = self.diagnostics.warn_count() + self.warnings.len();
        lines.push(if errors > 0 {
            format!("❌ {} 个错误, {} 个警告", errors, warns)
        } else if warns > 0 {
            format!("⚠️  0 个错误, {} 个警告", warns)
        } else {
            "✅ 检查通过，无错误".to_string()
        });
        lines.join("\n")
    }
}

/// 解析脚本；结构错误带上脚本名
fn parse(
    config: &AppConfig,
    script_id: &str,
    text: &str,
) -> anyhow::Result<(ParsedScript, Vec<String>)> {
    let mut parser = Parser::with_defaults(config.effects);
    let script = parser
        .parse(text)
        .with_context(|| format!("{} 解析失败", script_id))?;
    Ok((script, parser.warnings().to_vec()))
}

/// 解析并运行诊断
pub fn check(
    config: &AppConfig,
    ember: &EmberContext,
    script_id: &str,
    text: &str,
) -> anyhow::Result<CheckReport> {
    let (script, warnings) = parse(config, script_id, text)?;
    let diagnostics = analyze_script(script_id, &script, ember);
    Ok(CheckReport {
        warnings,
        diagnostics,
    })
}

/// 展示文本
pub fn display(ember: &EmberContext, story_cut: &StoryCutContext, text: &str) -> String {
    format_for_display(text, ember, story_cut)
}

/// 由编辑文本与原始脚本重建
pub fn rebuild(story_cut: &StoryCutContext, edited: &str, original: &str) -> anyhow::Result<String> {
    Ok(reconstruct(edited, original, story_cut)?)
}

/// 一个媒体块的样式
#[derive(Debug, Serialize)]
pub struct BlockStyle {
    pub block: BlockId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub style: StyleDescriptor,
}

/// 解析每个媒体块的样式
///
/// 图片尺寸取自 ember 上下文中的媒体记录；没有记录时锚点回退到中心。
pub fn styles(
    config: &AppConfig,
    ember: &EmberContext,
    script_id: &str,
    text: &str,
) -> anyhow::Result<Vec<BlockStyle>> {
    let (mut script, _) = parse(config, script_id, text)?;
    resolve_media_urls(&mut script, &ember.media);

    let mut out = Vec::new();
    for (index, block) in script.blocks.iter().enumerate() {
        let ember_script::BlockKind::Media {
            media_id,
            media_url,
            ..
        } = &block.kind
        else {
            continue;
        };

        let record = media_id.as_deref().and_then(|id| ember.media.media_by_id(id));
        let mut ctx = ResolveContext::new(&ember.tagged_people).with_defaults(config.effects);
        if let Some(record) = record {
            ctx = ctx.with_image(record);
        }

        let effects = script.effect_set(&block.id).cloned().unwrap_or_default();
        out.push(BlockStyle {
            block: block.id.clone(),
            media_id: media_id.clone(),
            media_url: media_url.clone(),
            line: script.line_of(index),
            style: resolve_transform(&effects, &ctx),
        });
    }
    Ok(out)
}

/// 效果状态快照（JSON）
pub fn inspect(config: &AppConfig, script_id: &str, text: &str) -> anyhow::Result<String> {
    let (script, _) = parse(config, script_id, text)?;
    let store = script.to_store(config.effects);
    Ok(store.snapshot_json()?)
}

/// 解析后重新生成（规范形式）
pub fn normalize(config: &AppConfig, script_id: &str, text: &str) -> anyhow::Result<String> {
    let (script, _) = parse(config, script_id, text)?;
    let store = script.to_store(config.effects);
    Ok(generate_script(&script.blocks, &store, &AudioOverrides::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_script::{MediaRecord, Point, TaggedPerson};

    const SCRIPT: &str = "[MEDIA|beach.jpg|m1]   <zoom-in:scale=2:target=person:p1 , fade-out>\n\n\
[Sarah | personal | msg-42] <It was\n\
amazing!>";

    fn ember() -> EmberContext {
        EmberContext {
            media: vec![MediaRecord {
                id: "m1".to_string(),
                display_name: Some("Beach".to_string()),
                file_name: None,
                storage_url: Some("https://cdn.example/m1.jpg".to_string()),
                file_url: None,
                image_width: Some(400),
                image_height: Some(200),
            }],
            tagged_people: vec![TaggedPerson {
                id: "p1".to_string(),
                person_name: "Sarah".to_string(),
                face_coordinates: Some(Point { x: 100.0, y: 150.0 }),
            }],
        }
    }

    #[test]
    fn test_normalize_canonical_form() {
        let out = normalize(&AppConfig::default(), "cut", SCRIPT).unwrap();
        assert_eq!(
            out,
            "[MEDIA | beach.jpg | m1] <FADE-OUT:duration=3,ZOOM-IN:scale=2:duration=3.5:target=person:p1>\n\n\
[Sarah | personal | msg-42] <It was amazing!>"
        );
    }

    #[test]
    fn test_normalize_uses_configured_defaults() {
        let mut config = AppConfig::default();
        config.effects.fade_duration = 1.0;
        let out = normalize(&config, "cut", "[MEDIA | a | b] <FADE-IN>").unwrap();
        assert_eq!(out, "[MEDIA | a | b] <FADE-IN:duration=1>");
    }

    #[test]
    fn test_check_clean_and_failing() {
        let report = check(&AppConfig::default(), &ember(), "cut", SCRIPT).unwrap();
        assert!(!report.has_errors());
        assert!(report.render("cut").ends_with("✅ 检查通过，无错误"));

        let report = check(
            &AppConfig::default(),
            &ember(),
            "cut",
            "[MEDIA | a | m1] <ZOOM-IN:scale=0:target=custom:-1,2>\n\nnotes",
        )
        .unwrap();
        assert!(report.has_errors());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.render("cut").contains("❌ 2 个错误"));
    }

    #[test]
    fn test_check_reports_parse_error_with_context() {
        let err = check(&AppConfig::default(), &ember(), "cut.txt", "[A | b] <x>").unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("cut.txt 解析失败"));
        assert!(message.contains("第 1 行"));
    }

    #[test]
    fn test_styles_use_media_dimensions() {
        let styles = styles(&AppConfig::default(), &ember(), "cut", SCRIPT).unwrap();
        assert_eq!(styles.len(), 1);
        let style = &styles[0];
        assert_eq!(style.media_url.as_deref(), Some("https://cdn.example/m1.jpg"));
        assert_eq!(style.line, Some(1));
        assert_eq!(style.style.transform, "scale(2)");
        assert_eq!(style.style.transform_origin, "25% 75%");
        assert_eq!(style.style.opacity, 1.0);

        let json = serde_json::to_value(&styles).unwrap();
        assert_eq!(json[0]["block"], "block-1");
        assert_eq!(json[0]["style"]["transformOrigin"], "25% 75%");
    }

    #[test]
    fn test_inspect_snapshot_json() {
        let json = inspect(&AppConfig::default(), "cut", SCRIPT).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let block = &value["blocks"]["block-1"];
        assert_eq!(block["selection"]["zoom"], true);
        assert_eq!(block["selection"]["pan"], false);
        assert_eq!(block["zoom"]["scale"], 2.0);
    }

    #[test]
    fn test_display_then_rebuild() {
        let story_cut = StoryCutContext::default();
        let raw = normalize(&AppConfig::default(), "cut", SCRIPT).unwrap();
        let shown = display(&ember(), &story_cut, &raw);
        assert!(shown.starts_with("[MEDIA | beach.jpg] <"));
        assert!(shown.ends_with("[Sarah] <It was amazing!>"));
        assert_eq!(rebuild(&story_cut, &shown, &raw).unwrap(), raw);
    }
}
