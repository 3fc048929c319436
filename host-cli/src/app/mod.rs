//! # App 模块
//!
//! 宿主的主状态机：在主菜单、游戏、暂停三种模式间切换，驱动当前场景，
//! 并执行场景发出的 [`Command`]。
//!
//! ## 帧顺序
//!
//! ```text
//! frame(input, dt)
//!   1. 处理输入（菜单按钮 / 点击 / 选项 / Escape）
//!   2. 场景解释执行（由输入触发）
//!   3. scene.update(dt)
//!   4. 取出指令：存档直接写盘，其余交给调用方渲染
//! ```

use std::collections::{BTreeSet, VecDeque};

use thiserror::Error;
use tracing::{debug, error, info, warn};
use vn_scene::{
    AssetSource, Backend, Command, DiagnosticLevel, DiagnosticResult, LoadError, OptionAction,
    Point, SaveError, Scene, StepOutcome, analyze_scene, normalize_logical_path,
};

use crate::app_mode::{GameMode, MenuItem};
use crate::save_manager::SaveManager;

/// 一帧的输入
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Input {
    /// 鼠标左键点击（逻辑屏幕坐标）
    Click(Point),
    /// 键盘推进（Enter / 空格），等同于点击空白处
    Advance,
    /// 直接选择第 n 个选项
    Choose(usize),
    /// 按下菜单按钮
    Menu(MenuItem),
    Escape,
    /// 关闭窗口
    Quit,
}

/// 宿主错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error("场景加载失败: {0}")]
    Load(#[from] LoadError),

    #[error("存档失败: {0}")]
    Save(#[from] SaveError),
}

/// 宿主应用
pub struct App {
    backend: Backend,
    entry_manifest: String,
    saves: SaveManager,
    mode: GameMode,
    scene: Option<Scene>,
    /// 每换一次场景加一
    scene_serial: u64,
    /// 已取出但尚未执行的指令（场景切换前从旧场景取出）
    pending: Vec<Command>,
    background: Option<String>,
    track: Option<String>,
    running: bool,
}

impl App {
    pub fn new(backend: Backend, entry_manifest: &str, saves: SaveManager) -> Self {
        Self {
            backend,
            entry_manifest: normalize_logical_path(entry_manifest),
            saves,
            mode: GameMode::MainMenu,
            scene: None,
            scene_serial: 0,
            pending: Vec::new(),
            background: None,
            track: None,
            running: true,
        }
    }

    /// 推进一帧，返回本帧需要渲染的指令
    ///
    /// 场景资源缺失是致命错误，直接返回；存档写入失败只记录日志。
    pub fn frame(&mut self, input: Option<Input>, dt_ms: f32) -> Result<Vec<Command>, AppError> {
        if let Some(input) = input {
            self.handle_input(input)?;
        }

        if self.mode == GameMode::Running
            && let Some(scene) = self.scene.as_mut()
        {
            scene.update(dt_ms);
        }

        if let Some(scene) = self.scene.as_mut() {
            self.pending.extend(scene.drain_commands());
        }
        let commands = std::mem::take(&mut self.pending);
        for command in &commands {
            self.execute(command);
        }
        Ok(commands)
    }

    fn handle_input(&mut self, input: Input) -> Result<(), AppError> {
        match (self.mode, input) {
            (_, Input::Quit) => self.exit(),
            (_, Input::Menu(item)) => {
                if self.mode.menu().contains(&item) {
                    self.press(item)?;
                } else {
                    debug!(?item, mode = ?self.mode, "当前模式没有该按钮");
                }
            }
            (GameMode::Running, Input::Escape) => self.set_mode(GameMode::Paused),
            (GameMode::Paused, Input::Escape) => self.set_mode(GameMode::Running),
            (GameMode::Running, Input::Click(point)) => {
                if let Some(scene) = self.scene.as_mut() {
                    let outcome = scene.click(point)?;
                    self.advance(outcome)?;
                }
            }
            (GameMode::Running, Input::Advance) => {
                if let Some(scene) = self.scene.as_mut() {
                    let outcome = scene.click(Point::new(-1.0, -1.0))?;
                    self.advance(outcome)?;
                }
            }
            (GameMode::Running, Input::Choose(index)) => {
                if let Some(scene) = self.scene.as_mut() {
                    let outcome = scene.choose(index)?;
                    self.advance(outcome)?;
                }
            }
            (mode, input) => debug!(?mode, ?input, "输入已忽略"),
        }
        Ok(())
    }

    fn press(&mut self, item: MenuItem) -> Result<(), AppError> {
        info!(button = item.label(), "菜单按钮");
        match item {
            MenuItem::StartGame => self.start_game(),
            MenuItem::LoadGame => self.load_game(),
            MenuItem::Continue => {
                self.set_mode(GameMode::Running);
                Ok(())
            }
            MenuItem::MainMenu => {
                self.main_menu();
                Ok(())
            }
            MenuItem::ExitGame => {
                self.exit();
                Ok(())
            }
        }
    }

    /// 从入口场景开始新游戏
    pub fn start_game(&mut self) -> Result<(), AppError> {
        let scene = Scene::load(&self.entry_manifest, self.backend.clone(), None)?;
        self.enter(scene)
    }

    /// 从存档继续
    ///
    /// 没有存档时留在主菜单。
    pub fn load_game(&mut self) -> Result<(), AppError> {
        if !self.saves.exists() {
            warn!(path = %self.saves.path().display(), "没有可读取的存档");
            return Ok(());
        }
        let record = self.saves.load()?;
        let scene = Scene::from_manifest(
            record.manifest,
            &self.entry_manifest,
            self.backend.clone(),
            None,
        )?;
        self.enter(scene)
    }

    /// 进入新场景并立即执行第一个 beat
    fn enter(&mut self, mut scene: Scene) -> Result<(), AppError> {
        let outcome = scene.step();
        self.replace_scene(Some(scene));
        self.set_mode(GameMode::Running);
        self.advance(outcome)
    }

    fn advance(&mut self, outcome: StepOutcome) -> Result<(), AppError> {
        match outcome {
            StepOutcome::Continue => Ok(()),
            StepOutcome::Ended { next } => self.follow(next),
        }
    }

    /// 场景结束：有后续场景则带着玩家状态加载，否则回到主菜单
    fn follow(&mut self, next: Option<String>) -> Result<(), AppError> {
        let Some(next) = next else {
            info!("场景结束，回到主菜单");
            self.main_menu();
            return Ok(());
        };

        let carried = self.replace_scene(None).map(Scene::into_state);
        info!(next = %next, "进入下一个场景");
        let scene = Scene::load(&next, self.backend.clone(), carried)?;
        self.enter(scene)
    }

    /// 替换当前场景，旧场景未取出的指令保留到本帧执行
    fn replace_scene(&mut self, scene: Option<Scene>) -> Option<Scene> {
        if scene.is_some() {
            self.scene_serial += 1;
        }
        let mut old = std::mem::replace(&mut self.scene, scene);
        if let Some(old) = old.as_mut() {
            self.pending.extend(old.drain_commands());
        }
        old
    }

    fn main_menu(&mut self) {
        self.replace_scene(None);
        self.pending.push(Command::StopTrack);
        self.set_mode(GameMode::MainMenu);
    }

    fn exit(&mut self) {
        info!("退出游戏");
        self.running = false;
    }

    fn set_mode(&mut self, mode: GameMode) {
        if self.mode != mode {
            debug!(from = ?self.mode, to = ?mode, "切换模式");
            self.mode = mode;
        }
    }

    fn execute(&mut self, command: &Command) {
        match command {
            Command::ShowBackground { path } => self.background = Some(path.clone()),
            Command::StopTrack => self.track = None,
            Command::PlayTrack { path } => self.track = Some(path.clone()),
            Command::WriteSave { record } => {
                if let Err(e) = self.saves.save(record) {
                    error!(error = %e, "存档写入失败");
                }
            }
        }
    }

    /// 无人值守模式的下一个输入
    ///
    /// 文本显示完之后才推进；有选项时选第一个分支选项，商店因此总是经由退出项离开。
    pub fn auto_input(&self) -> Option<Input> {
        match self.mode {
            GameMode::MainMenu => Some(Input::Menu(MenuItem::StartGame)),
            GameMode::Paused => Some(Input::Escape),
            GameMode::Running => {
                let scene = self.scene.as_ref()?;
                if scene.choice_pending() {
                    let index = scene
                        .options()
                        .iter()
                        .position(|o| matches!(o.action, OptionAction::Branch { .. }))
                        .unwrap_or(0);
                    Some(Input::Choose(index))
                } else if scene.text_box().is_revealing() {
                    None
                } else {
                    Some(Input::Advance)
                }
            }
        }
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    /// 当前场景的序号，重新载入同一个 manifest 也会变化
    pub fn scene_serial(&self) -> u64 {
        self.scene_serial
    }

    /// 当前背景图片
    pub fn background(&self) -> Option<&str> {
        self.background.as_deref()
    }

    /// 正在播放的音轨
    pub fn track(&self) -> Option<&str> {
        self.track.as_deref()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn saves(&self) -> &SaveManager {
        &self.saves
    }
}

/// 从入口场景出发检查所有脚本，沿 `end` 跟随后续场景
pub fn check_scripts(source: &dyn AssetSource, entry_manifest: &str) -> DiagnosticResult {
    let mut result = DiagnosticResult::new();
    let mut seen = BTreeSet::new();
    let mut queue = VecDeque::from([normalize_logical_path(entry_manifest)]);

    while let Some(manifest) = queue.pop_front() {
        if !seen.insert(manifest.clone()) {
            continue;
        }
        let report = analyze_scene(source, &manifest);
        debug!(manifest = %manifest, scripts = report.scripts.len(), "场景检查完成");
        queue.extend(report.next_scenes.iter().map(|n| normalize_logical_path(n)));
        result.merge(report.diagnostics);
    }

    for diag in &result.diagnostics {
        match diag.level {
            DiagnosticLevel::Error => error!("{}", diag),
            DiagnosticLevel::Warn => warn!("{}", diag),
            DiagnosticLevel::Info => info!("{}", diag),
        }
    }
    info!(
        scenes = seen.len(),
        errors = result.error_count(),
        warnings = result.warn_count(),
        "脚本检查结束"
    );
    result
}
