//! # 应用模式
//!
//! 主菜单、游戏进行中、暂停三种模式，以及各模式下的菜单按钮。

/// 应用模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameMode {
    /// 主菜单
    #[default]
    MainMenu,
    /// 游戏进行中
    Running,
    /// 暂停菜单
    Paused,
}

impl GameMode {
    /// 当前模式下的菜单按钮，按显示顺序
    pub fn menu(self) -> &'static [MenuItem] {
        match self {
            GameMode::MainMenu => &[MenuItem::StartGame, MenuItem::LoadGame, MenuItem::ExitGame],
            GameMode::Running => &[],
            GameMode::Paused => &[MenuItem::Continue, MenuItem::MainMenu, MenuItem::ExitGame],
        }
    }
}

/// 菜单按钮
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuItem {
    StartGame,
    LoadGame,
    ExitGame,
    Continue,
    MainMenu,
}

impl MenuItem {
    pub fn label(self) -> &'static str {
        match self {
            MenuItem::StartGame => "Start Game",
            MenuItem::LoadGame => "Load Game",
            MenuItem::ExitGame => "Exit Game",
            MenuItem::Continue => "Continue",
            MenuItem::MainMenu => "Main Menu",
        }
    }
}
