//! # Command 模块
//!
//! 场景向宿主发出的指令。
//!
//! 场景不播放音频、不绘制、不写文件；需要外部副作用时把 [`Command`]
//! 放入队列，由宿主每帧取出执行。文本框、选项和角色位置不走指令，
//! 宿主直接通过场景的访问器读取。

use serde::{Deserialize, Serialize};

use crate::save::SaveRecord;

/// 宿主指令
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// 显示背景图片
    ShowBackground { path: String },
    /// 停止当前音轨
    StopTrack,
    /// 播放音轨
    PlayTrack { path: String },
    /// 写入存档
    WriteSave { record: SaveRecord },
}
