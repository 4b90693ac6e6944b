//! # Parser 测试

use super::*;
use crate::block::{AudioPreference, BlockKind};
use crate::effect::{FadeDirection, PanDirection, ZoomDirection, ZoomTarget};

// -------------------------------------------------------------------------
// 辅助函数测试
// -------------------------------------------------------------------------

#[test]
fn test_starts_with_ignore_case() {
    assert!(starts_with_ignore_case("[[load screen]] ()", "[[LOAD SCREEN]]"));
    assert!(!starts_with_ignore_case("[[LOAD", "[[LOAD SCREEN]]"));
}

#[test]
fn test_split_header() {
    let (fields, rest) = split_header("[MEDIA |  beach.jpg|m1 ] <media>", 1).unwrap();
    assert_eq!(fields, vec!["MEDIA", "beach.jpg", "m1"]);
    assert_eq!(rest, " <media>");

    assert_eq!(
        split_header("[MEDIA | a | b <media>", 4),
        Err(ParseError::UnterminatedHeader { line: 4 })
    );
    assert!(matches!(
        split_header("MEDIA | a | b] <media>", 2),
        Err(ParseError::InvalidLine { line: 2, .. })
    ));
}

#[test]
fn test_extract_payload_keeps_inner_brackets() {
    assert_eq!(extract_payload(" <a <b> c>", 1).unwrap(), "a <b> c");
    assert_eq!(extract_payload("<>", 1).unwrap(), "");
    assert_eq!(
        extract_payload(" no payload", 3),
        Err(ParseError::MissingPayload { line: 3 })
    );
}

#[test]
fn test_parse_key_values() {
    let args = parse_key_values(r#"message="a, b = c",duration=2,icon='x'"#).unwrap();
    assert_eq!(args.len(), 3);
    assert_eq!(args[0], ("message".to_string(), ArgValue::String("a, b = c".into())));
    assert_eq!(args[1], ("duration".to_string(), ArgValue::Number(2.0)));
    assert_eq!(args[2], ("icon".to_string(), ArgValue::String("x".into())));

    assert!(parse_key_values("duration=1,duration=2").unwrap_err().contains("重复"));
    assert!(parse_key_values("justtext").is_err());
    assert!(parse_key_values("1x=2").is_err());
}

#[test]
fn test_parse_arg_value() {
    assert_eq!(parse_arg_value("true"), ArgValue::Bool(true));
    assert_eq!(parse_arg_value(" 1.5 "), ArgValue::Number(1.5));
    assert_eq!(parse_arg_value("'q'"), ArgValue::String("q".into()));
    assert_eq!(parse_arg_value("bare"), ArgValue::String("bare".into()));
}

// -------------------------------------------------------------------------
// 整体解析测试
// -------------------------------------------------------------------------

const SAMPLE: &str = r#"[[LOAD SCREEN]] (message="Preparing your story",duration=2,icon="sparkles")

[MEDIA | beach.jpg | m1] <FADE-IN:duration=3,ZOOM-IN:scale=1.5:duration=3.5:target=person:p1>

[Sarah | personal | msg-42] <It was amazing!>

[MEDIA | media | generated] <media>

[Narrator | text | no-audio] <The sun was setting.>
"#;

#[test]
fn test_parse_sample_script() {
    let mut parser = Parser::new();
    let script = parser.parse(SAMPLE).unwrap();
    assert!(parser.warnings().is_empty());

    assert_eq!(script.len(), 5);
    let types: Vec<_> = script.blocks.iter().map(|b| b.type_name()).collect();
    assert_eq!(types, vec!["loadscreen", "media", "voice", "media", "voice"]);
    assert_eq!(script.source_map, vec![1, 3, 5, 7, 9]);
    assert_eq!(script.blocks[1].id.as_str(), "block-2");

    match &script.blocks[0].kind {
        BlockKind::LoadScreen {
            message,
            duration,
            icon,
        } => {
            assert_eq!(message, "Preparing your story");
            assert_eq!(*duration, 2.0);
            assert_eq!(icon, "sparkles");
        }
        other => panic!("Expected LoadScreen, got {:?}", other),
    }

    match &script.blocks[1].kind {
        BlockKind::Media {
            media_id,
            media_name,
            media_url,
        } => {
            assert_eq!(media_id.as_deref(), Some("m1"));
            assert_eq!(media_name.as_deref(), Some("beach.jpg"));
            assert!(media_url.is_none());
        }
        other => panic!("Expected Media, got {:?}", other),
    }

    let effects = script.effect_set(&script.blocks[1].id).unwrap();
    assert_eq!(effects.fade.unwrap().direction, FadeDirection::In);
    assert_eq!(effects.fade.unwrap().duration, 3.0);
    let zoom = effects.zoom.as_ref().unwrap();
    assert_eq!(zoom.direction, ZoomDirection::In);
    assert_eq!(zoom.target, ZoomTarget::person("p1"));
    assert!(effects.pan.is_none());

    match &script.blocks[2].kind {
        BlockKind::Voice {
            contributor_name,
            content,
            audio_preference,
            contribution_id,
            ..
        } => {
            assert_eq!(contributor_name.as_deref(), Some("Sarah"));
            assert_eq!(content, "It was amazing!");
            assert_eq!(*audio_preference, AudioPreference::Personal);
            assert_eq!(contribution_id.as_deref(), Some("msg-42"));
        }
        other => panic!("Expected Voice, got {:?}", other),
    }

    // 占位符还原为 None
    match &script.blocks[3].kind {
        BlockKind::Media {
            media_id,
            media_name,
            ..
        } => {
            assert!(media_id.is_none());
            assert!(media_name.is_none());
        }
        other => panic!("Expected Media, got {:?}", other),
    }
    assert!(script.effect_set(&script.blocks[3].id).unwrap().is_empty());

    match &script.blocks[4].kind {
        BlockKind::Voice {
            contribution_id, ..
        } => assert!(contribution_id.is_none()),
        other => panic!("Expected Voice, got {:?}", other),
    }
}

#[test]
fn test_parse_empty_text() {
    let script = parse_script("\n\n   \n").unwrap();
    assert!(script.is_empty());
    assert!(script.effects.is_empty());
}

#[test]
fn test_unrecognized_line_is_warning() {
    let mut parser = Parser::new();
    let script = parser
        .parse("just some notes\n\n[Tom | text | no-audio] <Hi>")
        .unwrap();
    assert_eq!(script.len(), 1);
    assert_eq!(parser.warnings().len(), 1);
    assert!(parser.warnings()[0].contains("第 1 行"));
    assert_eq!(script.source_map, vec![3]);
}

#[test]
fn test_warnings_cleared_between_parses() {
    let mut parser = Parser::new();
    parser.parse("junk").unwrap();
    assert_eq!(parser.warnings().len(), 1);
    parser.parse("[Tom | text | no-audio] <Hi>").unwrap();
    assert!(parser.warnings().is_empty());
}

#[test]
fn test_unknown_preference_is_preserved() {
    let mut parser = Parser::new();
    let script = parser.parse("[Tom | synth | c1] <Hi>").unwrap();
    match &script.blocks[0].kind {
        BlockKind::Voice {
            audio_preference, ..
        } => assert_eq!(*audio_preference, AudioPreference::Other("synth".into())),
        other => panic!("Expected Voice, got {:?}", other),
    }
    assert_eq!(parser.warnings().len(), 1);
}

#[test]
fn test_structural_errors_carry_line_numbers() {
    let err = parse_script("[Tom | text | no-audio] <ok>\n\n[Ann | text] <short>").unwrap_err();
    assert_eq!(
        err,
        ParseError::HeaderFieldCount {
            line: 3,
            expected: 3,
            actual: 2
        }
    );

    let err = parse_script("[Tom | text | no-audio] missing").unwrap_err();
    assert_eq!(err, ParseError::MissingPayload { line: 1 });

    let err = parse_script("[MEDIA | a | b] <ZOOM-IN:scale=x>").unwrap_err();
    assert_eq!(err.line(), 1);

    let err = parse_script("[] <x>").unwrap_err();
    assert!(matches!(err, ParseError::HeaderFieldCount { actual: 1, .. }));
}

#[test]
fn test_empty_speaker_is_error() {
    let err = parse_script("[ | text | no-audio] <x>").unwrap_err();
    assert!(matches!(err, ParseError::InvalidLine { line: 1, .. }));
}

#[test]
fn test_load_screen_defaults_and_errors() {
    let script = parse_script("[[LOAD SCREEN]]").unwrap();
    match &script.blocks[0].kind {
        BlockKind::LoadScreen {
            message,
            duration,
            icon,
        } => {
            assert_eq!(message, "Loading...");
            assert_eq!(*duration, 2.0);
            assert_eq!(icon, "default");
        }
        other => panic!("Expected LoadScreen, got {:?}", other),
    }

    assert!(matches!(
        parse_script("[[LOAD SCREEN]] message=\"x\""),
        Err(ParseError::InvalidLoadScreen { .. })
    ));
    assert!(matches!(
        parse_script("[[LOAD SCREEN]] (duration=\"soon\")"),
        Err(ParseError::InvalidParameter { .. })
    ));

    let mut parser = Parser::new();
    parser.parse("[[LOAD SCREEN]] (color=\"red\")").unwrap();
    assert_eq!(parser.warnings().len(), 1);
}

#[test]
fn test_media_header_is_case_insensitive() {
    let script = parse_script("[media | a.png | m9] <PAN-RIGHT:distance=40%:duration=2>").unwrap();
    assert!(script.blocks[0].is_media());
    let pan = script.effect_set(&script.blocks[0].id).unwrap().pan.unwrap();
    assert_eq!(pan.direction, PanDirection::Right);
    assert_eq!(pan.distance, 40.0);
    assert_eq!(pan.duration, 2.0);
}

#[test]
fn test_custom_defaults_apply_to_missing_params() {
    let defaults = EffectDefaults {
        zoom_scale: 3.0,
        ..EffectDefaults::default()
    };
    let mut parser = Parser::with_defaults(defaults);
    let script = parser.parse("[MEDIA | a | b] <ZOOM-OUT>").unwrap();
    let zoom = script
        .effect_set(&script.blocks[0].id)
        .and_then(|s| s.zoom.clone())
        .unwrap();
    assert_eq!(zoom.scale, 3.0);
}

#[test]
fn test_parsed_script_to_store() {
    let script = parse_script(SAMPLE).unwrap();
    let store = script.to_store(EffectDefaults::default());
    let id = &script.blocks[1].id;
    let set = store.effect_object(id);
    assert_eq!(Some(&set), script.effect_set(id));
}
