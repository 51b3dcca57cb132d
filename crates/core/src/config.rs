use crate::Tag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Requested card count per atomic tag. Missing tags count as zero.
pub type CountMap = BTreeMap<Tag, u32>;

pub const NOVICE_TAG: &str = "Novice";
pub const VETERAN_TAG: &str = "Veteran";

/// Cards swapped out of the regular deck when Corrupter rules are on.
pub const CORRUPTER_SWAP_COUNT: usize = 5;

pub fn count_of(counts: &CountMap, tag: &str) -> u32 {
    counts.get(tag).copied().unwrap_or(0)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Difficulty {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub novice: u32,
    #[serde(default)]
    pub veteran: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DifficultyTable {
    #[serde(default)]
    pub difficulties: Vec<Difficulty>,
}

impl DifficultyTable {
    pub fn get(&self, index: usize) -> Option<&Difficulty> {
        self.difficulties.get(index)
    }

    pub fn len(&self) -> usize {
        self.difficulties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.difficulties.is_empty()
    }

    /// Writes the preset's Novice/Veteran counts into `counts`.
    pub fn apply(&self, index: usize, counts: &mut CountMap) -> Option<&Difficulty> {
        let difficulty = self.get(index)?;
        counts.insert(NOVICE_TAG.to_string(), difficulty.novice);
        counts.insert(VETERAN_TAG.to_string(), difficulty.veteran);
        Some(difficulty)
    }
}

/// Display preferences; the only thing a reset may carry over.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub dark_mode: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self { dark_mode: true }
    }
}
