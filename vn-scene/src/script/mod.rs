//! # Script 模块
//!
//! 脚本由若干 **beat** 组成，每个 beat 是一组按顺序执行的动作。
//! 脚本文件是 JSON：最外层数组是 beat 列表，每个 beat 是动作数组。
//!
//! ```text
//! [
//!   [["background", "Classroom"], ["enter", ["Kaiser", "neutral"]]],
//!   [["dialogue", ["Kaiser", "You're late."]]],
//!   [["end", ""]]
//! ]
//! ```

mod action;

pub use action::{Action, ChoiceEntry, EXIT_STORE_LABEL, ItemEffect, ItemEntry};

use serde::Deserialize;

use crate::error::{LoadError, LoadResult};
use crate::source::{AssetSource, normalize_logical_path};

/// 一次点击推进所执行的一组动作
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Beat {
    pub actions: Vec<Action>,
}

impl Beat {
    pub fn new(actions: Vec<Action>) -> Self {
        Self { actions }
    }
}

/// 已解析的脚本
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    /// 脚本标识（逻辑路径）
    pub id: String,
    beats: Vec<Beat>,
}

impl Script {
    pub fn new(id: impl Into<String>, beats: Vec<Beat>) -> Self {
        Self {
            id: id.into(),
            beats,
        }
    }

    /// 解析脚本 JSON
    ///
    /// JSON 语法错误是资源错误；单个动作的结构错误不会导致失败。
    pub fn parse(id: impl Into<String>, json: &str) -> LoadResult<Self> {
        let id = id.into();
        let beats: Vec<Beat> =
            serde_json::from_str(json).map_err(|e| LoadError::json(id.clone(), e))?;
        Ok(Self { id, beats })
    }

    /// 通过资源来源读取并解析
    pub fn load(source: &dyn AssetSource, path: &str) -> LoadResult<Self> {
        let path = normalize_logical_path(path);
        let json = source.read_text(&path)?;
        Self::parse(path, &json)
    }

    pub fn beat(&self, index: usize) -> Option<&Beat> {
        self.beats.get(index)
    }

    pub fn beats(&self) -> &[Beat] {
        &self.beats
    }

    pub fn len(&self) -> usize {
        self.beats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beats.is_empty()
    }

    /// 所有动作（按 beat 顺序展开），附带 beat 下标
    pub fn actions(&self) -> impl Iterator<Item = (usize, &Action)> {
        self.beats
            .iter()
            .enumerate()
            .flat_map(|(i, beat)| beat.actions.iter().map(move |a| (i, a)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script() {
        let json = r#"[
            [["background", "Classroom"], ["dialogue", ["Kaiser", "Hi."]]],
            [["end", ""]]
        ]"#;
        let script = Script::parse("data/01/start.json", json).unwrap();

        assert_eq!(script.len(), 2);
        assert_eq!(script.beat(0).unwrap().actions.len(), 2);
        assert_eq!(
            script.beat(1).unwrap().actions[0],
            Action::End { next: None }
        );
        assert!(script.beat(2).is_none());
        assert_eq!(script.actions().count(), 3);
    }

    #[test]
    fn test_parse_invalid_json() {
        let result = Script::parse("bad.json", "[[");
        assert!(matches!(result, Err(LoadError::InvalidJson { .. })));
    }

    #[test]
    fn test_beat_must_be_array() {
        let result = Script::parse("bad.json", r#"[{"kind": "end"}]"#);
        assert!(result.is_err());
    }
}
