//! # Store 模块
//!
//! 效果状态存储：按块保存"选中了哪些效果"以及各效果的参数。
//!
//! ## 设计说明
//!
//! - 以 [`BlockId`] 为键，每块一条 [`BlockEffectState`]，不再使用 `"pan-<id>"` 之类的字符串键
//! - 每个参数都是 `Option`：`None` 表示"没有这一项"，查询时回退到 [`EffectDefaults`]
//! - 同一结构既是状态也是补丁：[`EffectStateStore::merge`] 只覆盖补丁中为 `Some` 的字段
//! - 所有查询都不会失败

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::block::BlockId;
use crate::effect::{
    EffectDefaults, EffectKind, EffectSet, FadeDirection, FadeEffect, PanDirection, PanEffect,
    ZoomDirection, ZoomEffect, ZoomTarget,
};

/// 各效果是否选中
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EffectSelection {
    #[serde(default)]
    pub fade: bool,
    #[serde(default)]
    pub pan: bool,
    #[serde(default)]
    pub zoom: bool,
}

impl EffectSelection {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn only(kind: EffectKind) -> Self {
        let mut s = Self::default();
        s.set(kind, true);
        s
    }

    pub fn get(&self, kind: EffectKind) -> bool {
        match kind {
            EffectKind::Fade => self.fade,
            EffectKind::Pan => self.pan,
            EffectKind::Zoom => self.zoom,
        }
    }

    pub fn set(&mut self, kind: EffectKind, selected: bool) {
        match kind {
            EffectKind::Fade => self.fade = selected,
            EffectKind::Pan => self.pan = selected,
            EffectKind::Zoom => self.zoom = selected,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.fade || self.pan || self.zoom)
    }
}

/// fade 参数
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FadeParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<FadeDirection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// pan 参数
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PanParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<PanDirection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// zoom 参数
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ZoomParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<ZoomDirection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<ZoomTarget>,
}

/// 单个块的效果状态（也用作合并补丁）
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BlockEffectState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<EffectSelection>,
    #[serde(default)]
    pub fade: FadeParams,
    #[serde(default)]
    pub pan: PanParams,
    #[serde(default)]
    pub zoom: ZoomParams,
}

impl BlockEffectState {
    /// 新追加块的默认参数：所有参数取默认值，不选中任何效果
    pub fn with_defaults(defaults: &EffectDefaults) -> Self {
        Self {
            selection: Some(EffectSelection::none()),
            fade: FadeParams {
                direction: Some(defaults.fade_direction),
                duration: Some(defaults.fade_duration),
            },
            pan: PanParams {
                direction: Some(defaults.pan_direction),
                distance: Some(defaults.pan_distance),
                duration: Some(defaults.pan_duration),
            },
            zoom: ZoomParams {
                direction: Some(defaults.zoom_direction),
                scale: Some(defaults.zoom_scale),
                duration: Some(defaults.zoom_duration),
                target: Some(ZoomTarget::Center),
            },
        }
    }

    /// 由一组已生效的效果构造：选中集合中存在的效果，并记录其参数
    pub fn from_effect_set(set: &EffectSet) -> Self {
        let mut state = Self {
            selection: Some(EffectSelection {
                fade: set.fade.is_some(),
                pan: set.pan.is_some(),
                zoom: set.zoom.is_some(),
            }),
            ..Self::default()
        };
        if let Some(f) = set.fade {
            state.fade = FadeParams {
                direction: Some(f.direction),
                duration: Some(f.duration),
            };
        }
        if let Some(p) = set.pan {
            state.pan = PanParams {
                direction: Some(p.direction),
                distance: Some(p.distance),
                duration: Some(p.duration),
            };
        }
        if let Some(z) = &set.zoom {
            state.zoom = ZoomParams {
                direction: Some(z.direction),
                scale: Some(z.scale),
                duration: Some(z.duration),
                target: Some(z.target.clone()),
            };
        }
        state
    }

    /// 浅合并：补丁中为 `Some` 的字段覆盖当前值
    fn merge_from(&mut self, patch: BlockEffectState) {
        fn take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        take(&mut self.selection, patch.selection);
        take(&mut self.fade.direction, patch.fade.direction);
        take(&mut self.fade.duration, patch.fade.duration);
        take(&mut self.pan.direction, patch.pan.direction);
        take(&mut self.pan.distance, patch.pan.distance);
        take(&mut self.pan.duration, patch.pan.duration);
        take(&mut self.zoom.direction, patch.zoom.direction);
        take(&mut self.zoom.scale, patch.zoom.scale);
        take(&mut self.zoom.duration, patch.zoom.duration);
        take(&mut self.zoom.target, patch.zoom.target);
    }
}

/// 存储快照（调试/检查用）
///
/// 使用有序 map，输出稳定。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub defaults: EffectDefaults,
    pub blocks: BTreeMap<BlockId, BlockEffectState>,
}

/// 效果状态存储
#[derive(Debug, Clone, Default)]
pub struct EffectStateStore {
    defaults: EffectDefaults,
    blocks: HashMap<BlockId, BlockEffectState>,
}

impl EffectStateStore {
    pub fn new(defaults: EffectDefaults) -> Self {
        Self {
            defaults,
            blocks: HashMap::new(),
        }
    }

    pub fn defaults(&self) -> &EffectDefaults {
        &self.defaults
    }

    /// 整体替换全部状态（载入 story cut 进行编辑时使用）
    pub fn initialize(&mut self, states: impl IntoIterator<Item = (BlockId, BlockEffectState)>) {
        self.blocks = states.into_iter().collect();
        tracing::debug!(blocks = self.blocks.len(), "效果状态已初始化");
    }

    /// 浅合并（追加新块时补默认参数，不影响已有块）
    pub fn merge(&mut self, patch: impl IntoIterator<Item = (BlockId, BlockEffectState)>) {
        let mut merged = 0usize;
        for (id, state) in patch {
            self.blocks.entry(id).or_default().merge_from(state);
            merged += 1;
        }
        tracing::debug!(merged, total = self.blocks.len(), "效果状态已合并");
    }

    /// 为新追加的块合并默认参数
    pub fn append_block(&mut self, id: BlockId) {
        let patch = BlockEffectState::with_defaults(&self.defaults);
        self.merge([(id, patch)]);
    }

    pub fn state(&self, id: &BlockId) -> Option<&BlockEffectState> {
        self.blocks.get(id)
    }

    /// 可变访问（不存在时创建空记录）
    pub fn entry(&mut self, id: BlockId) -> &mut BlockEffectState {
        self.blocks.entry(id).or_default()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    // ---------------------------------------------------------------------
    // 选中状态
    // ---------------------------------------------------------------------

    pub fn selection(&self, id: &BlockId) -> EffectSelection {
        self.state(id).and_then(|s| s.selection).unwrap_or_default()
    }

    pub fn is_selected(&self, id: &BlockId, kind: EffectKind) -> bool {
        self.selection(id).get(kind)
    }

    pub fn set_selected(&mut self, id: BlockId, kind: EffectKind, selected: bool) {
        let state = self.entry(id);
        let mut selection = state.selection.unwrap_or_default();
        selection.set(kind, selected);
        state.selection = Some(selection);
    }

    // ---------------------------------------------------------------------
    // 参数查询（缺失时回退默认值）
    // ---------------------------------------------------------------------

    pub fn fade_direction(&self, id: &BlockId) -> FadeDirection {
        self.state(id)
            .and_then(|s| s.fade.direction)
            .unwrap_or(self.defaults.fade_direction)
    }

    pub fn fade_duration(&self, id: &BlockId) -> f64 {
        self.state(id)
            .and_then(|s| s.fade.duration)
            .unwrap_or(self.defaults.fade_duration)
    }

    pub fn pan_direction(&self, id: &BlockId) -> PanDirection {
        self.state(id)
            .and_then(|s| s.pan.direction)
            .unwrap_or(self.defaults.pan_direction)
    }

    pub fn pan_distance(&self, id: &BlockId) -> f64 {
        self.state(id)
            .and_then(|s| s.pan.distance)
            .unwrap_or(self.defaults.pan_distance)
    }

    pub fn pan_duration(&self, id: &BlockId) -> f64 {
        self.state(id)
            .and_then(|s| s.pan.duration)
            .unwrap_or(self.defaults.pan_duration)
    }

    pub fn zoom_direction(&self, id: &BlockId) -> ZoomDirection {
        self.state(id)
            .and_then(|s| s.zoom.direction)
            .unwrap_or(self.defaults.zoom_direction)
    }

    pub fn zoom_scale(&self, id: &BlockId) -> f64 {
        self.state(id)
            .and_then(|s| s.zoom.scale)
            .unwrap_or(self.defaults.zoom_scale)
    }

    pub fn zoom_duration(&self, id: &BlockId) -> f64 {
        self.state(id)
            .and_then(|s| s.zoom.duration)
            .unwrap_or(self.defaults.zoom_duration)
    }

    pub fn zoom_target(&self, id: &BlockId) -> ZoomTarget {
        self.state(id)
            .and_then(|s| s.zoom.target.clone())
            .unwrap_or_default()
    }

    /// 构造块上生效的效果对象
    ///
    /// 只包含已选中的效果；参数缺失或非法时使用默认值。
    pub fn effect_object(&self, id: &BlockId) -> EffectSet {
        let selection = self.selection(id);
        let set = EffectSet {
            fade: selection.fade.then(|| FadeEffect {
                direction: self.fade_direction(id),
                duration: self.fade_duration(id),
            }),
            pan: selection.pan.then(|| PanEffect {
                direction: self.pan_direction(id),
                distance: self.pan_distance(id),
                duration: self.pan_duration(id),
            }),
            zoom: selection.zoom.then(|| ZoomEffect {
                direction: self.zoom_direction(id),
                scale: self.zoom_scale(id),
                duration: self.zoom_duration(id),
                target: self.zoom_target(id),
            }),
        };
        set.sanitized(&self.defaults)
    }

    /// 由解析结果构造存储
    pub fn from_effect_sets<'a>(
        defaults: EffectDefaults,
        sets: impl IntoIterator<Item = (&'a BlockId, &'a EffectSet)>,
    ) -> Self {
        let mut store = Self::new(defaults);
        store.initialize(
            sets.into_iter()
                .map(|(id, set)| (id.clone(), BlockEffectState::from_effect_set(set))),
        );
        store
    }

    /// 导出快照
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            defaults: self.defaults,
            blocks: self
                .blocks
                .iter()
                .map(|(id, state)| (id.clone(), state.clone()))
                .collect(),
        }
    }

    /// 快照的 JSON 形式
    pub fn snapshot_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.snapshot())
    }
}
