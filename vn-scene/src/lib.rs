//! # VN Scene
//!
//! 2D 视觉小说的场景脚本引擎。
//!
//! ## 架构概述
//!
//! `vn-scene` 是纯逻辑核心，不直接读写文件、不播放音频、不绘制。
//! 外部能力通过 trait 注入，外部副作用通过指令队列交给宿主：
//!
//! ```text
//! Host                              Scene
//!   │                                 │
//!   │──── click(point) / choose(i) ──►│ 解释执行 beat
//!   │──── update(dt) ────────────────►│ 角色移动、逐字显示
//!   │◄─── drain_commands() ──────────│ 背景 / 音轨 / 存档
//!   │◄─── text_box() / options() ────│ 渲染读取
//! ```
//!
//! ## 核心类型
//!
//! - [`Scene`]：场景根对象，`step` / `click` / `choose` / `update`
//! - [`Action`]：脚本动作（封闭枚举，未知动作为空操作）
//! - [`PlayerState`]：跨场景保留的玩家数值
//! - [`TextBox`]：文本框与逐字显示状态机
//! - [`Command`]：场景向宿主发出的指令
//! - [`AssetSource`] / [`TextMeasure`]：宿主提供的资源读取与字宽测量
//!
//! ## 使用示例
//!
//! ```ignore
//! let backend = Backend::new(Rc::new(source));
//! let mut scene = Scene::load("data/01/scene.json", backend, None)?;
//! scene.step();
//!
//! loop {
//!     if let Some(point) = poll_click() {
//!         if let StepOutcome::Ended { next } = scene.click(point)? {
//!             // 加载下一个场景或回到主菜单
//!         }
//!     }
//!     scene.update(dt_ms);
//!     for cmd in scene.drain_commands() {
//!         host.execute(cmd);
//!     }
//!     render(&scene);
//! }
//! ```

pub mod character;
pub mod choice;
pub mod command;
pub mod diagnostic;
pub mod error;
pub mod geometry;
pub mod manifest;
pub mod save;
pub mod scene;
pub mod script;
pub mod source;
pub mod state;
pub mod store;
pub mod text;

// 重导出核心类型
pub use character::{Character, Sprite};
pub use choice::{ChoiceOption, ChoiceSkin, OptionAction};
pub use command::Command;
pub use diagnostic::{
    Diagnostic, DiagnosticLevel, DiagnosticResult, SceneReport, analyze_scene, analyze_script,
    next_scenes, reachable_scripts,
};
pub use error::{LoadError, LoadResult, ScriptError};
pub use geometry::{Point, Rect, Size};
pub use manifest::{CharacterEntry, ResourceTables, SceneManifest};
pub use save::{SaveError, SaveRecord};
pub use scene::{Backend, Scene, SceneSettings, StepOutcome};
pub use script::{Action, Beat, Script};
pub use source::{AssetSource, MemorySource, normalize_logical_path};
pub use state::{PlayerState, Sign, Stat};
pub use store::{PurchaseOrder, PurchaseOutcome, resolve_purchase};
pub use text::{EstimatedMeasure, RevealPhase, Speaker, TextBox, TextMeasure, TextStyle};
