//! # Config 模块
//!
//! 运行时配置管理，集中管理所有配置项。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件 (config.json)
//! 3. 默认值（最低）

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Level;
use vn_scene::{SceneSettings, Size};

/// 应用配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// 资源根目录，manifest 中的逻辑路径都相对于它
    #[serde(default = "default_assets_root")]
    pub assets_root: PathBuf,

    /// 入口场景 manifest（逻辑路径）
    #[serde(default = "default_entry_manifest")]
    pub entry_manifest: String,

    /// 存档文件路径，只有一个存档位
    #[serde(default = "default_save_path")]
    pub save_path: PathBuf,

    /// 窗口配置
    #[serde(default)]
    pub window: WindowConfig,

    /// 文本框配置
    #[serde(default)]
    pub text: TextConfig,

    /// 角色与选项布局
    #[serde(default)]
    pub layout: LayoutConfig,

    /// 选项按钮底图
    #[serde(default)]
    pub ui: UiConfig,

    /// 调试配置
    #[serde(default)]
    pub debug: DebugConfig,
}

/// 窗口配置
///
/// 宽高同时也是场景的逻辑屏幕尺寸。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_window_width")]
    pub width: u32,

    #[serde(default = "default_window_height")]
    pub height: u32,

    #[serde(default = "default_window_title")]
    pub title: String,
}

/// 文本框配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextConfig {
    /// 每个字符的显示间隔（毫秒）
    #[serde(default = "default_reveal_rate_ms")]
    pub reveal_rate_ms: f32,

    /// 换行宽度
    #[serde(default = "default_text_width")]
    pub text_width: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "default_character_baseline")]
    pub character_baseline: f32,

    #[serde(default = "default_character_spacing")]
    pub character_spacing: f32,

    #[serde(default = "default_choice_spacing")]
    pub choice_spacing: f32,

    #[serde(default = "default_store_columns")]
    pub store_columns: [f32; 2],

    #[serde(default = "default_store_top")]
    pub store_top: f32,

    #[serde(default = "default_store_row_step")]
    pub store_row_step: f32,
}

/// 选项按钮底图（逻辑路径）
///
/// 按钮图片的尺寸决定选项的点击区域。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_choice_button")]
    pub choice_button: String,

    #[serde(default = "default_store_button")]
    pub store_button: String,
}

/// 调试配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugConfig {
    /// 启动时是否运行脚本检查
    ///
    /// - debug build 默认开启（见 `default_script_check()`）
    /// - release build 默认关闭，可在 `config.json` 显式设置
    /// - 检查结果只输出诊断，不阻塞启动
    #[serde(default = "default_script_check")]
    pub script_check: bool,

    /// 日志级别：trace / debug / info / warn / error
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// 默认值函数
fn default_assets_root() -> PathBuf {
    PathBuf::from("assets")
}

fn default_entry_manifest() -> String {
    "data/01/scene.json".to_string()
}

fn default_save_path() -> PathBuf {
    PathBuf::from("saves/save.json")
}

fn default_window_width() -> u32 {
    1280
}

fn default_window_height() -> u32 {
    720
}

fn default_window_title() -> String {
    "Visual Novel".to_string()
}

fn default_reveal_rate_ms() -> f32 {
    30.0
}

fn default_text_width() -> f32 {
    1278.0
}

fn default_character_baseline() -> f32 {
    800.0
}

fn default_character_spacing() -> f32 {
    50.0
}

fn default_choice_spacing() -> f32 {
    10.0
}

fn default_store_columns() -> [f32; 2] {
    [100.0, 680.0]
}

fn default_store_top() -> f32 {
    100.0
}

fn default_store_row_step() -> f32 {
    100.0
}

fn default_choice_button() -> String {
    "data/images/button.png".to_string()
}

fn default_store_button() -> String {
    "data/images/bbutton.png".to_string()
}

fn default_script_check() -> bool {
    // 在 debug build 时默认开启脚本检查
    cfg!(debug_assertions)
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            assets_root: default_assets_root(),
            entry_manifest: default_entry_manifest(),
            save_path: default_save_path(),
            window: WindowConfig::default(),
            text: TextConfig::default(),
            layout: LayoutConfig::default(),
            ui: UiConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_window_width(),
            height: default_window_height(),
            title: default_window_title(),
        }
    }
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            reveal_rate_ms: default_reveal_rate_ms(),
            text_width: default_text_width(),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            character_baseline: default_character_baseline(),
            character_spacing: default_character_spacing(),
            choice_spacing: default_choice_spacing(),
            store_columns: default_store_columns(),
            store_top: default_store_top(),
            store_row_step: default_store_row_step(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            choice_button: default_choice_button(),
            store_button: default_store_button(),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            script_check: default_script_check(),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// 读取配置文件
    ///
    /// 文件不存在或解析失败时返回错误，由调用方决定是否回退到默认配置。
    pub fn read(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&content).map_err(|e| ConfigError::Serialization(e.to_string()))
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialization(e.to_string()))?;

        fs::write(path, json).map_err(|e| ConfigError::Io(e.to_string()))?;

        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entry_manifest.trim().is_empty() {
            return Err(ConfigError::Validation(
                "必须配置 entry_manifest（入口场景）".to_string(),
            ));
        }

        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Validation(format!(
                "窗口尺寸必须为正数: {}x{}",
                self.window.width, self.window.height
            )));
        }

        let positive = [
            ("text.reveal_rate_ms", self.text.reveal_rate_ms),
            ("text.text_width", self.text.text_width),
            ("layout.store_row_step", self.layout.store_row_step),
        ];
        for (name, value) in positive {
            if value.is_nan() || value <= 0.0 {
                return Err(ConfigError::Validation(format!(
                    "{} 必须为正数，当前为 {}",
                    name, value
                )));
            }
        }

        if self.layout.character_spacing < 0.0 || self.layout.choice_spacing < 0.0 {
            return Err(ConfigError::Validation("间距不能为负数".to_string()));
        }

        self.log_level()?;

        Ok(())
    }

    /// 解析日志级别
    pub fn log_level(&self) -> Result<Level, ConfigError> {
        Level::from_str(&self.debug.log_level).map_err(|_| {
            ConfigError::Validation(format!("无效的日志级别: {}", self.debug.log_level))
        })
    }

    /// 转换为场景布局参数
    pub fn scene_settings(&self) -> SceneSettings {
        SceneSettings {
            screen: Size::new(self.window.width as f32, self.window.height as f32),
            reveal_rate_ms: self.text.reveal_rate_ms,
            text_width: self.text.text_width,
            character_baseline: self.layout.character_baseline,
            character_spacing: self.layout.character_spacing,
            choice_spacing: self.layout.choice_spacing,
            store_columns: self.layout.store_columns,
            store_top: self.layout.store_top,
            store_row_step: self.layout.store_row_step,
            choice_button: self.ui.choice_button.clone(),
            store_button: self.ui.store_button.clone(),
        }
    }
}

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("配置序列化失败: {0}")]
    Serialization(String),

    #[error("配置 IO 错误: {0}")]
    Io(String),

    #[error("配置验证失败: {0}")]
    Validation(String),
}
