//! # 解析结果
//!
//! 解析器的输出：按顺序的块列表、媒体块上的效果、以及块到源码行号的映射。

use serde::{Deserialize, Serialize};

use crate::block::{Block, BlockId};
use crate::effect::{EffectDefaults, EffectSet};
use crate::store::EffectStateStore;

/// 解析后的脚本
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParsedScript {
    /// 块列表（保持脚本顺序）
    pub blocks: Vec<Block>,
    /// 媒体块上的效果（无效果的媒体块对应空集合）
    pub effects: Vec<(BlockId, EffectSet)>,
    /// 每个块的起始行号，与 `blocks` 一一对应
    #[serde(default)]
    pub source_map: Vec<usize>,
}

impl ParsedScript {
    /// 块对应的源码行号
    pub fn line_of(&self, index: usize) -> Option<usize> {
        self.source_map.get(index).copied()
    }

    /// 查询某块的效果
    pub fn effect_set(&self, id: &BlockId) -> Option<&EffectSet> {
        self.effects
            .iter()
            .find(|(block_id, _)| block_id == id)
            .map(|(_, set)| set)
    }

    /// 构造效果状态存储（用于继续编辑）
    pub fn to_store(&self, defaults: EffectDefaults) -> EffectStateStore {
        EffectStateStore::from_effect_sets(
            defaults,
            self.effects.iter().map(|(id, set)| (id, set)),
        )
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
