//! 动作解释执行
//!
//! 每个动作返回 `Ok(None)` 表示继续，`Ok(Some(next))` 表示场景结束，
//! `Err` 是脚本编写错误：由调用方记录日志，动作本身视为空操作。

use tracing::{debug, info, warn};

use super::Scene;
use crate::character::Character;
use crate::choice::{ChoiceOption, ChoiceSkin, OptionAction, layout_column, layout_two_columns};
use crate::command::Command;
use crate::error::ScriptError;
use crate::save::SaveRecord;
use crate::script::{Action, ChoiceEntry, ItemEntry};
use crate::state::{Sign, Stat, add_money, parse_amount, parse_signed};
use crate::store::PurchaseOrder;
use crate::text::{Speaker, TextBox, TextStyle};

/// `Some(next)` 表示场景结束
type Flow = Option<Option<String>>;

impl Scene {
    pub(super) fn execute(&mut self, action: &Action) -> Result<Flow, ScriptError> {
        match action {
            Action::Background { key } => self.show_background(key)?,
            Action::Music { key } => self.play_music(key)?,
            Action::Enter { character, sprite } => self.enter(character, sprite)?,
            Action::Exit { character } => {
                self.character_mut(character)?.exit();
            }
            Action::Look { character, sprite } => {
                self.character_mut(character)?.set_sprite(sprite)?;
            }
            Action::Speak {
                style,
                character,
                text,
            } => {
                let c = self
                    .characters
                    .get(character)
                    .ok_or_else(|| ScriptError::UnknownCharacter {
                        name: character.clone(),
                    })?;
                let speaker = Speaker {
                    name: c.name.clone(),
                    color: c.color,
                };
                self.show_text(*style, speaker, text);
            }
            Action::Adjust {
                stat,
                target,
                amount,
                sign,
            } => self.adjust(*stat, target.as_deref(), amount, sign)?,
            Action::Money { amount } => {
                let amount = parse_signed(amount)?;
                self.state.money = add_money(self.state.money, amount)?;
                self.show_effect(&format!(
                    "You earned {} yen for finishing this scene",
                    amount
                ));
            }
            Action::Update { request } => {
                let message = self.report_total(request)?;
                self.show_effect(&message);
            }
            Action::Store { items } => self.open_store(items),
            Action::Choice { skin, options } => self.offer_choices(*skin, options),
            Action::Save { resume } => {
                let record = SaveRecord::new(&self.manifest, resume, &self.state);
                info!(resume = %resume, "写入存档");
                self.commands.push(Command::WriteSave { record });
            }
            Action::End { next } => return Ok(Some(next.clone())),
            Action::Unknown { kind } => {
                debug!(kind = %kind, "未知动作，已忽略");
            }
            Action::Malformed { kind, reason } => {
                return Err(ScriptError::MalformedAction {
                    kind: kind.clone(),
                    reason: reason.clone(),
                });
            }
        }
        Ok(None)
    }

    pub(super) fn show_background(&mut self, key: &str) -> Result<(), ScriptError> {
        let path = self
            .backgrounds
            .get(key)
            .ok_or_else(|| ScriptError::UnknownBackground {
                key: key.to_string(),
            })?
            .clone();
        self.background = Some(path.clone());
        self.commands.push(Command::ShowBackground { path });
        Ok(())
    }

    fn play_music(&mut self, key: &str) -> Result<(), ScriptError> {
        let path = self
            .soundtrack
            .get(key)
            .ok_or_else(|| ScriptError::UnknownTrack {
                key: key.to_string(),
            })?
            .clone();
        self.commands.push(Command::StopTrack);
        self.commands.push(Command::PlayTrack { path });
        Ok(())
    }

    fn character_mut(&mut self, name: &str) -> Result<&mut Character, ScriptError> {
        self.characters
            .get_mut(name)
            .ok_or_else(|| ScriptError::UnknownCharacter {
                name: name.to_string(),
            })
    }

    fn enter(&mut self, name: &str, sprite: &str) -> Result<(), ScriptError> {
        let character = self.character_mut(name)?;
        character.set_sprite(sprite)?;
        character.cancel_exit();

        if !self.on_screen.iter().any(|n| n == name) {
            self.on_screen.push(name.to_string());
        }
        self.relayout();
        Ok(())
    }

    fn adjust(
        &mut self,
        stat: Stat,
        target: Option<&str>,
        amount: &str,
        sign: &str,
    ) -> Result<(), ScriptError> {
        let amount = parse_amount(amount)?;
        let sign: Sign = sign.parse()?;

        self.state.apply(stat, target, sign, amount)?;

        let message = match (stat, target) {
            (Stat::Affinity, Some(name)) => {
                format!("{}:{}{} {}", stat.label(), sign, amount, name)
            }
            _ => format!("{}:{}{}", stat.label(), sign, amount),
        };
        self.show_effect(&message);
        Ok(())
    }

    /// `update` 动作的提示文字
    ///
    /// 请求中同时出现多个数值名时，按 [`Stat::ALL`] 的顺序取第一个。
    fn report_total(&self, request: &[String]) -> Result<String, ScriptError> {
        let malformed = |reason: &str| ScriptError::MalformedAction {
            kind: "update".to_string(),
            reason: reason.to_string(),
        };
        let stat = Stat::ALL
            .into_iter()
            .find(|stat| request.iter().any(|r| r == stat.name()))
            .ok_or_else(|| malformed("没有可识别的数值名"))?;

        let target = match stat {
            Stat::Affinity => Some(
                request
                    .get(1)
                    .map(String::as_str)
                    .ok_or_else(|| malformed("affinity 需要角色名"))?,
            ),
            _ => None,
        };
        let total = self
            .state
            .total(stat, target)
            .ok_or_else(|| malformed("affinity 需要角色名"))?;
        let message = match (stat, target) {
            (Stat::Money, _) => format!("Total Money: {} Yen", total),
            (Stat::Infamy, _) => format!("Total Infamy: {}", total),
            (Stat::Reputation, _) => format!("Total Class Reputation: {}", total),
            (Stat::Ability, _) => format!("Total Ability Points: {}", total),
            (Stat::Trust, _) => format!("Total Kaiser's Trust: {}", total),
            (Stat::Affinity, name) => {
                format!("Total Affinity for {} is {}", name.unwrap_or_default(), total)
            }
        };
        Ok(message)
    }

    /// 打开商店
    ///
    /// 金钱快照在这里取一次，之后的每个商品都绑定这个值。
    fn open_store(&mut self, items: &[ItemEntry]) {
        let snapshot = self.state.money;
        let size = self.button_size(ChoiceSkin::Bold);

        let mut options = Vec::with_capacity(items.len());
        for item in items {
            let action = match item {
                ItemEntry::Exit { target, .. } => OptionAction::Branch {
                    target: target.clone(),
                },
                ItemEntry::Purchase {
                    label,
                    price,
                    effect,
                } => match PurchaseOrder::new(label.as_str(), price, effect, snapshot) {
                    Ok(order) => OptionAction::Purchase(order),
                    Err(e) => {
                        self.report(&e, "item");
                        continue;
                    }
                },
            };
            options.push(ChoiceOption::new(item.label(), ChoiceSkin::Bold, size, action));
        }

        let sizes: Vec<_> = options.iter().map(|o| o.rect.size()).collect();
        let settings = &self.backend.settings;
        let rects = layout_two_columns(
            &sizes,
            settings.store_columns,
            settings.store_top,
            settings.store_row_step,
        );
        for (option, rect) in options.iter_mut().zip(rects) {
            option.rect = rect;
        }

        debug!(items = options.len(), money = snapshot, "打开商店");
        self.present_options(options);
    }

    fn offer_choices(&mut self, skin: ChoiceSkin, entries: &[ChoiceEntry]) {
        let size = self.button_size(skin);
        let mut options: Vec<ChoiceOption> = entries
            .iter()
            .map(|entry| {
                ChoiceOption::new(
                    entry.label.as_str(),
                    skin,
                    size,
                    OptionAction::Branch {
                        target: entry.target.clone(),
                    },
                )
            })
            .collect();

        let sizes: Vec<_> = options.iter().map(|o| o.rect.size()).collect();
        let settings = &self.backend.settings;
        let rects = layout_column(&sizes, settings.screen, settings.choice_spacing);
        for (option, rect) in options.iter_mut().zip(rects) {
            option.rect = rect;
        }

        debug!(labels = ?entries.iter().map(|e| e.label.as_str()).collect::<Vec<_>>(), "等待选择");
        self.present_options(options);
    }

    fn present_options(&mut self, options: Vec<ChoiceOption>) {
        if options.is_empty() {
            warn!(script = %self.script.id, beat = self.cursor, "没有可用的选项，跳过");
            return;
        }
        self.options = options;
        self.options_serial += 1;
        self.choice_pending = true;
    }

    /// 替换文本框并开始逐字显示
    pub(super) fn show_text(&mut self, style: TextStyle, speaker: Speaker, text: &str) {
        let mut text_box = TextBox::new(style, self.backend.settings.reveal_rate_ms);
        text_box.set_speaker(Some(speaker));
        text_box.set_text(
            text,
            self.backend.settings.text_width,
            self.backend.measure.as_ref(),
        );
        self.text_box = text_box;
        self.text_serial += 1;
    }

    /// 以效果样式显示系统提示
    pub(super) fn show_effect(&mut self, text: &str) {
        let speaker = self.effect_speaker.clone();
        self.show_text(TextStyle::Effect, speaker, text);
    }
}
