//! # Scene 模块
//!
//! 场景是引擎的根对象：持有当前脚本、beat 游标、玩家状态、角色表、
//! 文本框和选项列表，对外提供 `step` / `click` / `choose` / `update` 四个入口。
//!
//! ## 执行模型
//!
//! ```text
//! click(point)
//!   ├─ 有待选选项 → 命中测试 → choose(index)
//!   ├─ 文本正在逐字显示 → skip
//!   └─ 否则 → step()
//!
//! step() -> StepOutcome
//!   执行当前 beat 的全部动作；遇到 end 立即返回 Ended，否则游标 +1
//! ```
//!
//! 每帧的顺序固定为：输入 → 解释执行 → `update(dt)` → 宿主渲染。

mod interpreter;

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use tracing::{debug, error, info, warn};

use crate::character::{Character, Sprite, layout_row};
use crate::choice::{ChoiceOption, ChoiceSkin, OptionAction};
use crate::command::Command;
use crate::error::{LoadError, LoadResult, ScriptError};
use crate::geometry::{Point, Rect, Size};
use crate::manifest::{ResourceTables, SceneManifest};
use crate::script::Script;
use crate::source::{AssetSource, normalize_logical_path};
use crate::state::PlayerState;
use crate::store::resolve_purchase;
use crate::text::{EFFECT_COLOR, EstimatedMeasure, Speaker, TextBox, TextMeasure, TextStyle};

/// 效果提示使用的角色名
pub const EFFECT_CHARACTER: &str = "effect";

/// 场景布局与显示参数
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSettings {
    /// 逻辑屏幕尺寸
    pub screen: Size,
    /// 每个字符的显示间隔（毫秒）
    pub reveal_rate_ms: f32,
    /// 文本区宽度，超出时换行
    pub text_width: f32,
    /// 角色底边所在的 y
    pub character_baseline: f32,
    pub character_spacing: f32,
    /// 单列选项的间隔
    pub choice_spacing: f32,
    /// 商店两列的 x
    pub store_columns: [f32; 2],
    pub store_top: f32,
    pub store_row_step: f32,
    /// 普通选项按钮底图
    pub choice_button: String,
    /// 粗体选项 / 商店按钮底图
    pub store_button: String,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            screen: Size::new(1280.0, 720.0),
            reveal_rate_ms: 30.0,
            text_width: 1278.0,
            character_baseline: 800.0,
            character_spacing: 50.0,
            choice_spacing: 10.0,
            store_columns: [100.0, 680.0],
            store_top: 100.0,
            store_row_step: 100.0,
            choice_button: "data/images/button.png".to_string(),
            store_button: "data/images/bbutton.png".to_string(),
        }
    }
}

/// 场景依赖的外部能力
///
/// 分支时需要重新读取脚本，所以场景持有一份克隆。
#[derive(Clone)]
pub struct Backend {
    pub source: Rc<dyn AssetSource>,
    pub measure: Rc<dyn TextMeasure>,
    pub settings: SceneSettings,
}

impl Backend {
    /// 使用估算字宽和默认布局
    pub fn new(source: Rc<dyn AssetSource>) -> Self {
        Self {
            source,
            measure: Rc::new(EstimatedMeasure),
            settings: SceneSettings::default(),
        }
    }

    pub fn with_measure(mut self, measure: Rc<dyn TextMeasure>) -> Self {
        self.measure = measure;
        self
    }

    pub fn with_settings(mut self, settings: SceneSettings) -> Self {
        self.settings = settings;
        self
    }
}

/// 一次推进的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// 仍在当前场景
    Continue,
    /// 场景结束；`next` 为下一个场景的 manifest，`None` 表示回到主菜单
    Ended { next: Option<String> },
}

impl StepOutcome {
    pub fn is_ended(&self) -> bool {
        matches!(self, StepOutcome::Ended { .. })
    }
}

/// 场景
pub struct Scene {
    backend: Backend,
    manifest: SceneManifest,
    manifest_path: String,
    backgrounds: BTreeMap<String, String>,
    soundtrack: BTreeMap<String, String>,
    characters: HashMap<String, Character>,
    /// 在屏幕上的角色，按登场顺序
    on_screen: Vec<String>,
    background: Option<String>,
    script: Rc<Script>,
    cursor: usize,
    state: PlayerState,
    text_box: TextBox,
    /// 每次替换文本框加一
    text_serial: u64,
    options: Vec<ChoiceOption>,
    /// 每次给出新的选项列表加一
    options_serial: u64,
    choice_pending: bool,
    effect_speaker: Speaker,
    choice_button: Size,
    store_button: Size,
    commands: Vec<Command>,
}

impl Scene {
    /// 读取 manifest 并构造场景
    ///
    /// `carried` 是上一个场景传下来的玩家状态，优先于 manifest 中保存的状态。
    pub fn load(path: &str, backend: Backend, carried: Option<PlayerState>) -> LoadResult<Self> {
        let path = normalize_logical_path(path);
        let manifest = SceneManifest::load(backend.source.as_ref(), &path)?;
        Self::from_manifest(manifest, &path, backend, carried)
    }

    /// 从已解析的 manifest（或存档）构造场景
    ///
    /// 所有引用的图片、音频和起始脚本在这里检查，缺失时返回 [`LoadError`]。
    pub fn from_manifest(
        manifest: SceneManifest,
        manifest_path: &str,
        backend: Backend,
        carried: Option<PlayerState>,
    ) -> LoadResult<Self> {
        let source = backend.source.as_ref();
        let settings = &backend.settings;
        let tables = ResourceTables::load(source, &manifest)?;

        for path in tables.backgrounds.values() {
            source.image_size(path)?;
        }
        for path in tables.soundtrack.values() {
            if !source.exists(path) {
                return Err(LoadError::NotFound { path: path.clone() });
            }
        }

        let mut characters = HashMap::with_capacity(tables.characters.len());
        for (name, entry) in &tables.characters {
            let mut sprites = HashMap::with_capacity(entry.sprites().len());
            for (key, path) in entry.sprites() {
                let size = source.image_size(path)?;
                sprites.insert(
                    key.clone(),
                    Sprite {
                        path: path.clone(),
                        size,
                    },
                );
            }
            characters.insert(
                name.clone(),
                Character::new(entry.display_name(), sprites, entry.color(), settings.screen),
            );
        }

        let choice_button = source.image_size(&settings.choice_button)?;
        let store_button = source.image_size(&settings.store_button)?;
        let script = Script::load(source, &manifest.resolve(&manifest.start))?;

        let effect_speaker = match characters.get(EFFECT_CHARACTER) {
            Some(c) => Speaker {
                name: c.name.clone(),
                color: c.color,
            },
            None => {
                debug!("角色表中没有 effect，使用默认提示样式");
                Speaker {
                    name: String::new(),
                    color: EFFECT_COLOR,
                }
            }
        };

        let state = carried
            .or_else(|| manifest.player.clone())
            .unwrap_or_default();

        let mut scene = Self {
            text_box: TextBox::new(TextStyle::Dialogue, settings.reveal_rate_ms),
            text_serial: 0,
            options_serial: 0,
            backend: backend.clone(),
            manifest_path: normalize_logical_path(manifest_path),
            backgrounds: tables.backgrounds,
            soundtrack: tables.soundtrack,
            characters,
            on_screen: Vec::new(),
            background: None,
            script: Rc::new(script),
            cursor: 0,
            state,
            options: Vec::new(),
            choice_pending: false,
            effect_speaker,
            choice_button,
            store_button,
            commands: Vec::new(),
            manifest,
        };

        if let Some(key) = scene.manifest.background.clone() {
            if let Err(e) = scene.show_background(&key) {
                scene.report(&e, "background");
            }
        }

        info!(
            manifest = %scene.manifest_path,
            script = %scene.script.id,
            beats = scene.script.len(),
            characters = scene.characters.len(),
            "场景已加载"
        );
        Ok(scene)
    }

    /// 执行当前 beat
    ///
    /// 超出脚本末尾时记录脚本错误并按空 beat 处理。
    pub fn step(&mut self) -> StepOutcome {
        let script = Rc::clone(&self.script);
        let actions = match script.beat(self.cursor) {
            Some(beat) => beat.actions.as_slice(),
            None => {
                self.report(&ScriptError::MissingEnd, "end");
                &[]
            }
        };

        for action in actions {
            debug!(script = %script.id, beat = self.cursor, action = action.kind(), "执行动作");
            match self.execute(action) {
                Ok(Some(next)) => {
                    info!(script = %script.id, beat = self.cursor, next = ?next, "场景结束");
                    return StepOutcome::Ended { next };
                }
                Ok(None) => {}
                Err(e) => self.report(&e, action.kind()),
            }
        }

        self.cursor += 1;
        StepOutcome::Continue
    }

    /// 处理一次点击
    pub fn click(&mut self, point: Point) -> LoadResult<StepOutcome> {
        if self.choice_pending {
            return match self.options.iter().position(|o| o.hit(point)) {
                Some(index) => self.choose(index),
                None => Ok(StepOutcome::Continue),
            };
        }
        if self.text_box.is_revealing() {
            self.text_box.skip();
            return Ok(StepOutcome::Continue);
        }
        Ok(self.step())
    }

    /// 选择第 `index` 个选项
    ///
    /// 分支选项加载目标脚本后立即执行其第一个 beat，返回该次执行的结果；
    /// 购买选项结算后商店保持打开。没有待选选项或下标越界时什么也不做。
    pub fn choose(&mut self, index: usize) -> LoadResult<StepOutcome> {
        if !self.choice_pending {
            return Ok(StepOutcome::Continue);
        }
        let Some(option) = self.options.get(index) else {
            return Ok(StepOutcome::Continue);
        };

        match option.action.clone() {
            OptionAction::Branch { target } => self.branch(&target),
            OptionAction::Purchase(order) => {
                match resolve_purchase(&order, &mut self.state) {
                    Ok(outcome) => {
                        info!(item = %order.label, money = self.state.money, "购买结算");
                        self.show_effect(&outcome.message());
                    }
                    Err(e) => self.report(&e, "item"),
                }
                Ok(StepOutcome::Continue)
            }
        }
    }

    fn branch(&mut self, target: &str) -> LoadResult<StepOutcome> {
        let path = self.manifest.resolve(target);
        let script = Script::load(self.backend.source.as_ref(), &path).inspect_err(|e| {
            error!(script = %path, error = %e, "分支脚本加载失败");
        })?;

        info!(from = %self.script.id, to = %script.id, "进入分支");
        self.script = Rc::new(script);
        self.cursor = 0;
        self.choice_pending = false;
        self.options.clear();
        Ok(self.step())
    }

    /// 推进动画
    pub fn update(&mut self, dt_ms: f32) {
        for name in &self.on_screen {
            if let Some(character) = self.characters.get_mut(name) {
                character.update(dt_ms);
            }
        }

        let screen = self.screen_rect();
        let gone: Vec<String> = self
            .on_screen
            .iter()
            .filter(|name| {
                self.characters
                    .get(name.as_str())
                    .is_some_and(|c| c.is_exiting() && !c.rect().intersects(&screen))
            })
            .cloned()
            .collect();
        if !gone.is_empty() {
            debug!(characters = ?gone, "角色已离开屏幕");
            self.on_screen.retain(|name| !gone.contains(name));
        }

        self.text_box.update(dt_ms);
    }

    /// 取出待执行的宿主指令
    pub fn drain_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn screen_rect(&self) -> Rect {
        Rect::from_size(Point::default(), self.backend.settings.screen)
    }

    pub fn text_box(&self) -> &TextBox {
        &self.text_box
    }

    /// 文本框序号，内容相同的两次发言也不同
    pub fn text_serial(&self) -> u64 {
        self.text_serial
    }

    pub fn options_serial(&self) -> u64 {
        self.options_serial
    }

    pub fn options(&self) -> &[ChoiceOption] {
        &self.options
    }

    pub fn choice_pending(&self) -> bool {
        self.choice_pending
    }

    /// 屏幕上的角色，按登场顺序
    pub fn on_screen(&self) -> impl Iterator<Item = &Character> {
        self.on_screen
            .iter()
            .filter_map(|name| self.characters.get(name))
    }

    pub fn on_screen_names(&self) -> &[String] {
        &self.on_screen
    }

    pub fn character(&self, name: &str) -> Option<&Character> {
        self.characters.get(name)
    }

    /// 当前背景图片路径
    pub fn background(&self) -> Option<&str> {
        self.background.as_deref()
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    /// 结束场景时取出玩家状态，交给下一个场景
    pub fn into_state(self) -> PlayerState {
        self.state
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    pub fn manifest(&self) -> &SceneManifest {
        &self.manifest
    }

    pub fn manifest_path(&self) -> &str {
        &self.manifest_path
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    fn report(&self, err: &ScriptError, action: &str) {
        match err {
            ScriptError::MissingEnd => error!(
                script = %self.script.id,
                beat = self.cursor,
                error = %err,
                "脚本错误"
            ),
            _ => warn!(
                script = %self.script.id,
                beat = self.cursor,
                action,
                error = %err,
                "脚本错误，动作已忽略"
            ),
        }
    }

    fn button_size(&self, skin: ChoiceSkin) -> Size {
        match skin {
            ChoiceSkin::Standard => self.choice_button,
            ChoiceSkin::Bold => self.store_button,
        }
    }

    /// 重新排布屏幕上未退场的角色
    fn relayout(&mut self) {
        let settings = &self.backend.settings;
        let staying: Vec<&String> = self
            .on_screen
            .iter()
            .filter(|name| self.characters.get(name.as_str()).is_some_and(|c| !c.is_exiting()))
            .collect();
        let sizes: Vec<Size> = staying
            .iter()
            .filter_map(|name| self.characters.get(name.as_str()))
            .map(|c| c.rect().size())
            .collect();
        let targets = layout_row(
            &sizes,
            settings.screen,
            settings.character_baseline,
            settings.character_spacing,
        );

        let placements: Vec<(String, Rect)> = staying
            .into_iter()
            .cloned()
            .zip(targets)
            .collect();
        for (name, target) in placements {
            if let Some(character) = self.characters.get_mut(&name) {
                character.place(target);
            }
        }
    }
}
