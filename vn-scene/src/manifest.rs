//! # Manifest 模块
//!
//! 场景入口文件及其引用的资源表。
//!
//! ```text
//! data/01/scene.json
//! {
//!   "name": "Visual Novel",
//!   "prefix": "data/01/",
//!   "characters": "characters.json",
//!   "backgrounds": "backgrounds.json",
//!   "soundtrack": "soundtrack.json",
//!   "start": "start.json",
//!   "background": "Prologue"
//! }
//! ```
//!
//! manifest 中的文件引用相对 `prefix`；资源表内的图片和音频路径相对资源根目录。

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{LoadError, LoadResult};
use crate::source::{AssetSource, normalize_logical_path, resolve_prefixed};
use crate::state::PlayerState;
use crate::text::Rgb;

/// 场景入口
///
/// 存档文件使用同样的结构，只是 `start` 指向继续的脚本并附带 `player`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneManifest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub prefix: String,
    /// 角色表文件
    pub characters: String,
    /// 背景表文件
    pub backgrounds: String,
    /// 音轨表文件
    pub soundtrack: String,
    /// 第一个脚本
    pub start: String,
    /// 初始背景
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    /// 存档中的玩家状态
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<PlayerState>,
}

impl SceneManifest {
    /// 从 JSON 解析
    pub fn parse(path: &str, json: &str) -> LoadResult<Self> {
        serde_json::from_str(json).map_err(|e| LoadError::json(path, e))
    }

    /// 通过资源来源读取
    pub fn load(source: &dyn AssetSource, path: &str) -> LoadResult<Self> {
        let path = normalize_logical_path(path);
        let json = source.read_text(&path)?;
        Self::parse(&path, &json)
    }

    /// 将 manifest 中的文件引用解析为逻辑路径
    pub fn resolve(&self, file: &str) -> String {
        resolve_prefixed(&self.prefix, file)
    }
}

/// 角色表条目：`[显示名, {立绘名: 图片路径}, [r, g, b]]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterEntry(pub String, pub HashMap<String, String>, pub Rgb);

impl CharacterEntry {
    pub fn display_name(&self) -> &str {
        &self.0
    }

    pub fn sprites(&self) -> &HashMap<String, String> {
        &self.1
    }

    pub fn color(&self) -> Rgb {
        self.2
    }
}

/// manifest 引用的三张资源表
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceTables {
    /// 角色名 -> 角色条目
    pub characters: BTreeMap<String, CharacterEntry>,
    /// 背景名 -> 图片路径
    pub backgrounds: BTreeMap<String, String>,
    /// 音轨名 -> 音频路径
    pub soundtrack: BTreeMap<String, String>,
}

impl ResourceTables {
    /// 读取并解析资源表（不检查表内引用的图片）
    pub fn load(source: &dyn AssetSource, manifest: &SceneManifest) -> LoadResult<Self> {
        Ok(Self {
            characters: read_table(source, &manifest.resolve(&manifest.characters))?,
            backgrounds: read_table(source, &manifest.resolve(&manifest.backgrounds))?,
            soundtrack: read_table(source, &manifest.resolve(&manifest.soundtrack))?,
        })
    }

    pub fn has_sprite(&self, character: &str, sprite: &str) -> bool {
        self.characters
            .get(character)
            .is_some_and(|entry| entry.sprites().contains_key(sprite))
    }
}

fn read_table<T: serde::de::DeserializeOwned>(
    source: &dyn AssetSource,
    path: &str,
) -> LoadResult<BTreeMap<String, T>> {
    let json = source.read_text(path)?;
    serde_json::from_str(&json).map_err(|e| LoadError::json(path, e))
}
