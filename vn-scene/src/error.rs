//! # Error 模块
//!
//! 定义 vn-scene 中使用的错误类型。
//!
//! 错误分两类：
//!
//! - [`LoadError`]：资源错误（图片、脚本、manifest 缺失或损坏），在加载阶段直接失败
//! - [`ScriptError`]：脚本编写错误，只记录日志，对应动作降级为空操作

use thiserror::Error;

/// 资源加载错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    /// 资源不存在
    #[error("资源不存在: {path}")]
    NotFound { path: String },

    /// 读取失败
    #[error("读取资源失败: {path} - {message}")]
    Io { path: String, message: String },

    /// JSON 格式错误
    #[error("JSON 解析失败: {path} - {message}")]
    InvalidJson { path: String, message: String },

    /// 图片无法识别
    #[error("无效的图片: {path} - {message}")]
    InvalidImage { path: String, message: String },
}

impl LoadError {
    /// 从 serde_json 错误构造
    pub fn json(path: impl Into<String>, err: serde_json::Error) -> Self {
        Self::InvalidJson {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

/// 脚本编写错误
///
/// 由解释器在执行动作时产生，永远不会中断场景。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    /// 引用了未定义的角色
    #[error("未知角色 '{name}'")]
    UnknownCharacter { name: String },

    /// 引用了角色未定义的立绘
    #[error("角色 '{character}' 没有立绘 '{sprite}'")]
    UnknownSprite { character: String, sprite: String },

    /// 引用了未定义的背景
    #[error("未知背景 '{key}'")]
    UnknownBackground { key: String },

    /// 引用了未定义的音轨
    #[error("未知音轨 '{key}'")]
    UnknownTrack { key: String },

    /// 数值不是合法的十进制整数
    #[error("'{value}' 不是合法的数值")]
    InvalidNumber { value: String },

    /// 符号只能是 `+` 或 `-`
    #[error("'{value}' 不是合法的符号，应为 '+' 或 '-'")]
    InvalidSign { value: String },

    /// 增量超出 i64 范围，数值保持不变
    #[error("数值溢出: {counter} {delta}")]
    Overflow { counter: i64, delta: String },

    /// 动作参数结构不正确
    #[error("动作 '{kind}' 参数格式错误: {reason}")]
    MalformedAction { kind: String, reason: String },

    /// 脚本在没有 end 动作的情况下结束
    #[error("脚本已到末尾，但没有遇到 end 动作")]
    MissingEnd,
}

/// Result 类型别名
pub type LoadResult<T> = Result<T, LoadError>;
