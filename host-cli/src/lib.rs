//! # Host 层
//!
//! 视觉小说引擎的终端宿主。
//!
//! ## 架构说明
//!
//! Host 层负责：
//! - 配置加载
//! - 文件系统资源读取（图片只读取尺寸）
//! - 存档读写
//! - 输入采集与模式切换
//! - 将场景的 Command 转换为实际效果
//!
//! Host 层不包含脚本逻辑，脚本解释全部由 `vn-scene` 完成。

pub mod app;
pub mod app_mode;
pub mod config;
pub mod presenter;
pub mod resources;
pub mod save_manager;

pub use app::{App, AppError, Input, check_scripts};
pub use app_mode::{GameMode, MenuItem};
pub use config::{
    AppConfig, ConfigError, DebugConfig, LayoutConfig, TextConfig, UiConfig, WindowConfig,
};
pub use presenter::TerminalPresenter;
pub use resources::FsSource;
pub use save_manager::SaveManager;
