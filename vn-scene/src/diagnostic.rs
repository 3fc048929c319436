//! # 诊断模块
//!
//! 脚本静态检查，不执行脚本、不修改任何状态。
//!
//! ## 设计原则
//!
//! - 只依赖 [`AssetSource`]，可在无文件系统的环境下运行
//! - 诊断分级：Error（必须修复）、Warn（建议修复）、Info（信息提示）
//! - 检查规则与解释器的运行时行为一致：运行时记录为脚本错误的，这里报 Error

use std::collections::{BTreeSet, VecDeque};

use crate::error::ScriptError;
use crate::manifest::{ResourceTables, SceneManifest};
use crate::script::{Action, ItemEntry, Script};
use crate::source::AssetSource;
use crate::state::{Sign, Stat, parse_amount, parse_signed};
use crate::store::PurchaseEffect;

/// 诊断级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticLevel {
    /// 信息提示
    Info,
    /// 警告（建议修复）
    Warn,
    /// 错误（必须修复）
    Error,
}

impl std::fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// 诊断条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    /// 脚本逻辑路径
    pub script_id: String,
    /// beat 下标（从 0 开始）
    pub beat: Option<usize>,
    pub message: String,
}

impl Diagnostic {
    pub fn error(script_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Error, script_id, message)
    }

    pub fn warn(script_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Warn, script_id, message)
    }

    pub fn info(script_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Info, script_id, message)
    }

    fn new(level: DiagnosticLevel, script_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            script_id: script_id.into(),
            beat: None,
            message: message.into(),
        }
    }

    pub fn with_beat(mut self, beat: usize) -> Self {
        self.beat = Some(beat);
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.level, self.script_id)?;
        if let Some(beat) = self.beat {
            write!(f, "#{}", beat)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// 诊断结果
#[derive(Debug, Clone, Default)]
pub struct DiagnosticResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn merge(&mut self, other: DiagnosticResult) {
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn error_count(&self) -> usize {
        self.count(DiagnosticLevel::Error)
    }

    pub fn warn_count(&self) -> usize {
        self.count(DiagnosticLevel::Warn)
    }

    fn count(&self, level: DiagnosticLevel) -> usize {
        self.diagnostics.iter().filter(|d| d.level == level).count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

//=============================================================================
// 脚本分析 API
//=============================================================================

/// 分析单个脚本
///
/// 执行以下检查：
/// - 最后一个 beat 没有 `end`
/// - 同一 beat 中 `end` 之后的动作（永远不会执行）
/// - 引用了资源表中不存在的角色、立绘、背景、音轨
/// - 数值和符号格式错误、参数结构错误
/// - 商店没有离开选项、选择没有任何选项
/// - 未知动作（Info）
pub fn analyze_script(script: &Script, tables: &ResourceTables) -> DiagnosticResult {
    let mut result = DiagnosticResult::new();
    let id = script.id.as_str();

    for (index, beat) in script.beats().iter().enumerate() {
        let mut ended = false;
        for action in &beat.actions {
            if ended {
                result.push(
                    Diagnostic::warn(id, format!("'{}' 位于 end 之后，不会执行", action.kind()))
                        .with_beat(index),
                );
            }
            if matches!(action, Action::End { .. }) {
                ended = true;
            }
            check_action(action, tables, id, index, &mut result);
        }
    }

    let ends = script
        .beats()
        .last()
        .is_some_and(|beat| beat.actions.iter().any(|a| matches!(a, Action::End { .. })));
    if !ends {
        let diag = Diagnostic::error(id, ScriptError::MissingEnd.to_string());
        result.push(match script.len() {
            0 => diag,
            n => diag.with_beat(n - 1),
        });
    }

    result
}

fn check_action(
    action: &Action,
    tables: &ResourceTables,
    id: &str,
    beat: usize,
    result: &mut DiagnosticResult,
) {
    let mut errors: Vec<ScriptError> = Vec::new();

    match action {
        Action::Background { key } => {
            if !tables.backgrounds.contains_key(key) {
                errors.push(ScriptError::UnknownBackground { key: key.clone() });
            }
        }
        Action::Music { key } => {
            if !tables.soundtrack.contains_key(key) {
                errors.push(ScriptError::UnknownTrack { key: key.clone() });
            }
        }
        Action::Enter { character, sprite } | Action::Look { character, sprite } => {
            if !tables.characters.contains_key(character) {
                errors.push(ScriptError::UnknownCharacter {
                    name: character.clone(),
                });
            } else if !tables.has_sprite(character, sprite) {
                errors.push(ScriptError::UnknownSprite {
                    character: character.clone(),
                    sprite: sprite.clone(),
                });
            }
        }
        Action::Exit { character } | Action::Speak { character, .. } => {
            if !tables.characters.contains_key(character) {
                errors.push(ScriptError::UnknownCharacter {
                    name: character.clone(),
                });
            }
        }
        Action::Adjust { amount, sign, .. } => {
            errors.extend(parse_amount(amount).err());
            errors.extend(sign.parse::<Sign>().err());
        }
        Action::Money { amount } => {
            errors.extend(parse_signed(amount).err());
        }
        Action::Update { request } => {
            let known = Stat::ALL
                .into_iter()
                .find(|stat| request.iter().any(|r| r == stat.name()));
            match known {
                None => errors.push(ScriptError::MalformedAction {
                    kind: "update".to_string(),
                    reason: format!("没有可识别的数值名: {:?}", request),
                }),
                Some(Stat::Affinity) if request.len() < 2 => {
                    errors.push(ScriptError::MalformedAction {
                        kind: "update".to_string(),
                        reason: "affinity 需要角色名".to_string(),
                    })
                }
                Some(_) => {}
            }
        }
        Action::Store { items } => {
            for item in items {
                if let ItemEntry::Purchase { price, effect, .. } = item {
                    errors.extend(parse_amount(price).err());
                    errors.extend(PurchaseEffect::parse(effect).err());
                }
            }
            if !items.iter().any(|i| matches!(i, ItemEntry::Exit { .. })) {
                result.push(Diagnostic::warn(id, "商店没有离开选项").with_beat(beat));
            }
        }
        Action::Choice { options, .. } => {
            if options.is_empty() {
                result.push(Diagnostic::warn(id, "选择没有任何选项").with_beat(beat));
            }
        }
        Action::Unknown { kind } => {
            result.push(Diagnostic::info(id, format!("未知动作 '{}'，运行时忽略", kind)).with_beat(beat));
        }
        Action::Malformed { kind, reason } => errors.push(ScriptError::MalformedAction {
            kind: kind.clone(),
            reason: reason.clone(),
        }),
        Action::Save { .. } | Action::End { .. } => {}
    }

    for err in errors {
        result.push(Diagnostic::error(id, err.to_string()).with_beat(beat));
    }
}

/// 脚本引用的其他脚本（选择、商店离开、存档继续点），相对 manifest prefix
pub fn reachable_scripts(script: &Script) -> BTreeSet<String> {
    let mut targets = BTreeSet::new();
    for (_, action) in script.actions() {
        match action {
            Action::Choice { options, .. } => {
                targets.extend(options.iter().map(|o| o.target.clone()));
            }
            Action::Store { items } => {
                for item in items {
                    if let ItemEntry::Exit { target, .. } = item {
                        targets.insert(target.clone());
                    }
                }
            }
            Action::Save { resume } => {
                targets.insert(resume.clone());
            }
            _ => {}
        }
    }
    targets
}

/// 脚本中 `end` 指向的下一个场景 manifest
pub fn next_scenes(script: &Script) -> BTreeSet<String> {
    script
        .actions()
        .filter_map(|(_, action)| match action {
            Action::End { next: Some(next) } => Some(next.clone()),
            _ => None,
        })
        .collect()
}

/// 整个场景的检查结果
#[derive(Debug, Clone, Default)]
pub struct SceneReport {
    pub diagnostics: DiagnosticResult,
    /// 检查过的脚本（逻辑路径）
    pub scripts: Vec<String>,
    /// `end` 指向的下一个场景
    pub next_scenes: BTreeSet<String>,
}

/// 从 manifest 的起始脚本出发，检查所有可达脚本
///
/// 资源加载失败也作为 Error 诊断返回，不中断检查。
pub fn analyze_scene(source: &dyn AssetSource, manifest_path: &str) -> SceneReport {
    let mut report = SceneReport::default();

    let manifest = match SceneManifest::load(source, manifest_path) {
        Ok(m) => m,
        Err(e) => {
            report.diagnostics.push(Diagnostic::error(manifest_path, e.to_string()));
            return report;
        }
    };
    let tables = match ResourceTables::load(source, &manifest) {
        Ok(t) => t,
        Err(e) => {
            report.diagnostics.push(Diagnostic::error(manifest_path, e.to_string()));
            return report;
        }
    };

    let mut seen = BTreeSet::new();
    let mut queue = VecDeque::from([manifest.start.clone()]);
    while let Some(file) = queue.pop_front() {
        let path = manifest.resolve(&file);
        if !seen.insert(path.clone()) {
            continue;
        }
        let script = match Script::load(source, &path) {
            Ok(s) => s,
            Err(e) => {
                report.diagnostics.push(Diagnostic::error(manifest_path, e.to_string()));
                continue;
            }
        };

        report.diagnostics.merge(analyze_script(&script, &tables));
        report.next_scenes.extend(next_scenes(&script));
        queue.extend(reachable_scripts(&script));
        report.scripts.push(path);
    }

    report
}
