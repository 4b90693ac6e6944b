//! # 往返集成测试
//!
//! 覆盖 store → generate → parse → store 的完整链路，以及展示/重建与样式解析。

use ember_script::{
    AudioOverrides, AudioPreference, Block, BlockId, BlockKind, EffectDefaults, EffectKind,
    EffectStateStore, EmberContext, ImageSize, MediaRecord, PanDirection, ResolveContext,
    StoryCutContext, TaggedPerson, ZoomDirection, ZoomTarget, format_for_display, generate_script,
    parse_script, reconstruct, resolve_transform,
};

fn story_blocks() -> Vec<Block> {
    vec![
        Block::new("start", BlockKind::Start),
        Block::new(
            "intro",
            BlockKind::LoadScreen {
                message: "Preparing your story".to_string(),
                duration: 2.0,
                icon: "sparkles".to_string(),
            },
        ),
        Block::media("b1", "m1", "beach.jpg"),
        Block::new(
            "v1",
            BlockKind::Voice {
                contributor_name: Some("Sarah".to_string()),
                voice_tag: None,
                content: "It was amazing!".to_string(),
                audio_preference: AudioPreference::Personal,
                contribution_id: Some("msg-42".to_string()),
            },
        ),
        Block::media("b2", "m2", "dog.png"),
        Block::media("b3", "m3", "sunset.jpg"),
        Block::voice("v2", "Narrator", "And the day ended."),
        Block::new("end", BlockKind::End),
    ]
}

fn story_store() -> EffectStateStore {
    let mut store = EffectStateStore::new(EffectDefaults::default());

    let b1 = BlockId::from("b1");
    store.set_selected(b1.clone(), EffectKind::Fade, true);
    store.set_selected(b1.clone(), EffectKind::Zoom, true);
    let state = store.entry(b1);
    state.zoom.scale = Some(2.0);
    state.zoom.target = Some(ZoomTarget::person("p1"));

    let b2 = BlockId::from("b2");
    store.set_selected(b2.clone(), EffectKind::Pan, true);
    store.set_selected(b2.clone(), EffectKind::Zoom, true);
    let state = store.entry(b2);
    state.pan.direction = Some(PanDirection::Right);
    state.pan.distance = Some(40.0);
    state.zoom.direction = Some(ZoomDirection::Out);
    state.zoom.target = Some(ZoomTarget::Custom { x: 120.0, y: 75.0 });

    store
}

#[test]
fn test_generate_parse_round_trip() {
    let blocks = story_blocks();
    let store = story_store();
    let script = generate_script(&blocks, &store, &AudioOverrides::new());

    let parsed = parse_script(&script).unwrap();
    let content: Vec<_> = blocks
        .iter()
        .filter(|b| !matches!(b.kind, BlockKind::Start | BlockKind::End))
        .collect();
    assert_eq!(parsed.len(), content.len());

    for (original, reparsed) in content.iter().zip(&parsed.blocks) {
        assert_eq!(original.type_name(), reparsed.type_name());
        if original.is_media() {
            assert_eq!(original.kind, reparsed.kind);
            let expected = store.effect_object(&original.id);
            assert_eq!(parsed.effect_set(&reparsed.id), Some(&expected));
        }
    }

    // 重新生成得到相同文本
    let restored = parsed.to_store(EffectDefaults::default());
    assert_eq!(
        generate_script(&parsed.blocks, &restored, &AudioOverrides::new()),
        script
    );
}

#[test]
fn test_generated_script_snapshot() {
    let script = generate_script(&story_blocks(), &story_store(), &AudioOverrides::new());
    insta::assert_snapshot!(script, @r#"
    [[LOAD SCREEN]] (message="Preparing your story",duration=2,icon="sparkles")

    [MEDIA | beach.jpg | m1] <FADE-IN:duration=3,ZOOM-IN:scale=2:duration=3.5:target=person:p1>

    [Sarah | personal | msg-42] <It was amazing!>

    [MEDIA | dog.png | m2] <PAN-RIGHT:distance=40%:duration=4,ZOOM-OUT:scale=1.5:duration=3.5:target=custom:120,75>

    [MEDIA | sunset.jpg | m3] <media>

    [Narrator | text | no-audio] <And the day ended.>
    "#);
}

#[test]
fn test_audio_override_applies_only_to_target_block() {
    let blocks = story_blocks();
    let mut overrides = AudioOverrides::new();
    overrides.insert(BlockId::from("v2"), AudioPreference::Recorded);
    let script = generate_script(&blocks, &story_store(), &overrides);
    assert!(script.contains("[Narrator | recorded | no-audio] <And the day ended.>"));
    assert!(script.contains("[Sarah | personal | msg-42]"));
}

#[test]
fn test_parsed_effects_resolve_to_styles() {
    let script = generate_script(&story_blocks(), &story_store(), &AudioOverrides::new());
    let parsed = parse_script(&script).unwrap();

    let people = vec![TaggedPerson {
        id: "p1".to_string(),
        person_name: "Sarah".to_string(),
        face_coordinates: Some(ember_script::Point { x: 300.0, y: 150.0 }),
    }];
    let image = ImageSize::new(600.0, 300.0);
    let ctx = ResolveContext::new(&people).with_image(&image);

    let styles: Vec<_> = parsed
        .effects
        .iter()
        .map(|(_, effects)| resolve_transform(effects, &ctx))
        .collect();
    assert_eq!(styles.len(), 3);

    assert_eq!(styles[0].transform, "scale(2)");
    assert_eq!(styles[0].transform_origin, "50% 50%");
    assert_eq!(styles[0].opacity, 0.0);
    assert_eq!(styles[0].transition, "transform 3.5s ease-out");

    assert_eq!(styles[1].transform, "translateX(40%) scale(0.6666666666666666)");
    assert_eq!(styles[1].transform_origin, "20% 25%");
    assert_eq!(styles[1].transition, "transform 4s ease-out");

    assert_eq!(styles[2].transform, "scale(1) translateX(0)");
    assert_eq!(styles[2].transform_origin, "center center");
}

#[test]
fn test_display_edit_reconstruct_cycle() {
    let raw = generate_script(&story_blocks(), &story_store(), &AudioOverrides::new());
    let ember = EmberContext {
        media: vec![MediaRecord {
            id: "m3".to_string(),
            display_name: Some("Sunset".to_string()),
            file_name: None,
            storage_url: None,
            file_url: None,
            image_width: None,
            image_height: None,
        }],
        tagged_people: Vec::new(),
    };
    let story_cut = StoryCutContext::default();

    let display = format_for_display(&raw, &ember, &story_cut);
    assert!(display.contains("[Sarah] <It was amazing!>"));
    assert!(display.contains("[MEDIA | sunset.jpg] <media>"));
    assert!(!display.contains("msg-42"));

    let edited = display.replace("It was amazing!", "It was unforgettable!");
    let rebuilt = reconstruct(&edited, &raw, &story_cut).unwrap();
    assert_eq!(
        rebuilt,
        raw.replace("It was amazing!", "It was unforgettable!")
    );
}

#[test]
fn test_voice_named_media_round_trip() {
    let blocks = vec![
        Block::media("b1", "m1", "beach.jpg"),
        Block::voice("v1", "Media", "We drove to the coast"),
        Block::voice("v2", "mEdIa", "and stayed until dark"),
    ];
    let store = EffectStateStore::default();
    let script = generate_script(&blocks, &store, &AudioOverrides::new());
    assert!(script.contains("[Media (voice) | text | no-audio] <We drove to the coast>"));

    let parsed = parse_script(&script).unwrap();
    assert_eq!(parsed.len(), 3);
    let kinds: Vec<_> = parsed.blocks.iter().map(|b| b.type_name()).collect();
    assert_eq!(kinds, ["media", "voice", "voice"]);
    let BlockKind::Voice { content, .. } = &parsed.blocks[1].kind else {
        panic!("expected a voice block");
    };
    assert_eq!(content, "We drove to the coast");

    // 再生成文本不变
    let restored = parsed.to_store(EffectDefaults::default());
    assert_eq!(
        generate_script(&parsed.blocks, &restored, &AudioOverrides::new()),
        script
    );

    // 展示文本同样不会被读成媒体行
    let story_cut = StoryCutContext::default();
    let display = format_for_display(&script, &EmberContext::default(), &story_cut);
    assert!(display.contains("[Media (voice)] <We drove to the coast>"));
    let edited = display.replace("until dark", "until sunrise");
    let rebuilt = reconstruct(&edited, &script, &story_cut).unwrap();
    assert_eq!(rebuilt, script.replace("until dark", "until sunrise"));
}
