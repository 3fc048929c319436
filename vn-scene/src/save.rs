//! # Save 模块
//!
//! 存档记录。
//!
//! 存档和场景入口文件结构相同：`start` 换成读档后继续的脚本，
//! 并附带当前玩家状态。读档时直接当作 manifest 构造场景。

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::manifest::SceneManifest;
use crate::state::PlayerState;

/// 存档格式版本
pub const SAVE_VERSION: u32 = 1;

/// 存档记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRecord {
    /// 存档格式版本，旧存档没有这个字段
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(flatten)]
    pub manifest: SceneManifest,
}

fn default_version() -> u32 {
    SAVE_VERSION
}

impl SaveRecord {
    /// 以当前场景的 manifest 为基础创建存档
    pub fn new(manifest: &SceneManifest, resume: &str, player: &PlayerState) -> Self {
        let mut manifest = manifest.clone();
        manifest.start = resume.to_string();
        manifest.player = Some(player.clone());
        Self {
            version: SAVE_VERSION,
            manifest,
        }
    }

    /// 读档后继续的脚本
    pub fn resume(&self) -> &str {
        &self.manifest.start
    }

    pub fn to_json(&self) -> Result<String, SaveError> {
        serde_json::to_string_pretty(self).map_err(|e| SaveError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, SaveError> {
        let record: SaveRecord =
            serde_json::from_str(json).map_err(|e| SaveError::Deserialization(e.to_string()))?;

        if record.version > SAVE_VERSION {
            return Err(SaveError::IncompatibleVersion {
                found: record.version,
                supported: SAVE_VERSION,
            });
        }

        Ok(record)
    }
}

/// 存档错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SaveError {
    #[error("序列化失败: {0}")]
    Serialization(String),

    #[error("反序列化失败: {0}")]
    Deserialization(String),

    #[error("存档版本不兼容: 存档版本 {found}，当前支持 {supported}")]
    IncompatibleVersion { found: u32, supported: u32 },

    #[error("文件操作失败: {0}")]
    Io(String),

    #[error("存档不存在: {0}")]
    NotFound(String),
}
