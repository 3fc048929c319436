//! # Action 模块
//!
//! 脚本动作定义。脚本文件中每个动作写作 `[kind, payload]`：
//!
//! ```text
//! ["dialogue", ["Kaiser", "Good morning."]]
//! ["affinity", ["Kaiser", "5", "+"]]
//! ["choice",   [["Go left", "left.json"], ["Go right", "right.json"]]]
//! ["end",      ""]
//! ```
//!
//! 解析时按 `kind` 转换为封闭的 [`Action`] 枚举。未知的 `kind` 成为
//! [`Action::Unknown`]，执行时忽略；payload 结构不对的成为
//! [`Action::Malformed`]，执行时记录脚本错误后忽略。两者都不会让加载失败。
//!
//! 数值字段（增量、价格）保留原始字符串，在执行时才解析，
//! 这样非数字值只影响那一个动作。

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::choice::ChoiceSkin;
use crate::state::Stat;
use crate::text::TextStyle;

/// 商店中表示离开的选项文字
pub const EXIT_STORE_LABEL: &str = "Exit Store";

/// 分支选项（`choice` / `bchoice`）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceEntry {
    pub label: String,
    /// 目标脚本（相对 manifest prefix）
    pub target: String,
}

/// 商品效果描述 `[stat, points, character?]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemEffect {
    pub stat: String,
    pub points: String,
    pub character: Option<String>,
}

/// 商店条目（`item`）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemEntry {
    /// 可购买的商品
    Purchase {
        label: String,
        price: String,
        effect: ItemEffect,
    },
    /// 离开商店，跳转到目标脚本
    Exit { label: String, target: String },
}

impl ItemEntry {
    pub fn label(&self) -> &str {
        match self {
            ItemEntry::Purchase { label, .. } | ItemEntry::Exit { label, .. } => label,
        }
    }
}

/// 脚本动作
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// 切换背景
    Background { key: String },
    /// 切换 BGM
    Music { key: String },
    /// 角色登场
    Enter { character: String, sprite: String },
    /// 角色退场（滑出屏幕）
    Exit { character: String },
    /// 只切换立绘
    Look { character: String, sprite: String },
    /// 文本框：对话、心理活动、动作描写
    Speak {
        style: TextStyle,
        character: String,
        text: String,
    },
    /// 数值增减（affinity / infamy / ability / reputation / trust）
    Adjust {
        stat: Stat,
        /// 仅 affinity 有目标角色
        target: Option<String>,
        amount: String,
        sign: String,
    },
    /// 获得金钱
    Money { amount: String },
    /// 显示数值当前总量
    Update { request: Vec<String> },
    /// 打开商店
    Store { items: Vec<ItemEntry> },
    /// 分支选择
    Choice {
        skin: ChoiceSkin,
        options: Vec<ChoiceEntry>,
    },
    /// 存档，记录读档后从哪个脚本继续
    Save { resume: String },
    /// 结束场景；`None` 表示回到主菜单
    End { next: Option<String> },
    /// 未知动作，忽略
    Unknown { kind: String },
    /// 参数结构错误，忽略
    Malformed { kind: String, reason: String },
}

impl Action {
    /// 动作在脚本中的名字
    pub fn kind(&self) -> &str {
        match self {
            Action::Background { .. } => "background",
            Action::Music { .. } => "music",
            Action::Enter { .. } => "enter",
            Action::Exit { .. } => "exit",
            Action::Look { .. } => "look",
            Action::Speak { style, .. } => match style {
                TextStyle::Dialogue => "dialogue",
                TextStyle::Thought => "thought",
                TextStyle::Action => "action",
                TextStyle::Effect => "effect",
            },
            Action::Adjust { stat, .. } => stat.name(),
            Action::Money { .. } => "money",
            Action::Update { .. } => "update",
            Action::Store { .. } => "item",
            Action::Choice { skin, .. } => match skin {
                ChoiceSkin::Standard => "choice",
                ChoiceSkin::Bold => "bchoice",
            },
            Action::Save { .. } => "save",
            Action::End { .. } => "end",
            Action::Unknown { kind } | Action::Malformed { kind, .. } => kind,
        }
    }

    /// 从 JSON 值构造动作
    pub fn from_value(value: Value) -> Self {
        let Value::Array(mut parts) = value else {
            return Action::Malformed {
                kind: String::new(),
                reason: "动作必须是 [kind, payload] 数组".to_string(),
            };
        };
        if parts.is_empty() {
            return Action::Malformed {
                kind: String::new(),
                reason: "空动作".to_string(),
            };
        }
        let payload = if parts.len() > 1 {
            parts.swap_remove(1)
        } else {
            Value::Null
        };
        let Some(kind) = parts[0].as_str().map(str::to_string) else {
            return Action::Malformed {
                kind: String::new(),
                reason: "kind 必须是字符串".to_string(),
            };
        };

        match parse_payload(&kind, &payload) {
            Ok(action) => action,
            Err(reason) => Action::Malformed { kind, reason },
        }
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Action::from_value(value))
    }
}

fn parse_payload(kind: &str, payload: &Value) -> Result<Action, String> {
    let action = match kind {
        "background" => Action::Background {
            key: text(payload, "背景名")?,
        },
        "music" => Action::Music {
            key: text(payload, "音轨名")?,
        },
        "enter" => {
            let [character, sprite] = texts::<2>(payload)?;
            Action::Enter { character, sprite }
        }
        "exit" => Action::Exit {
            character: text(payload, "角色名")?,
        },
        "look" => {
            let [character, sprite] = texts::<2>(payload)?;
            Action::Look { character, sprite }
        }
        "dialogue" | "thought" | "action" => {
            let style = match kind {
                "dialogue" => TextStyle::Dialogue,
                "thought" => TextStyle::Thought,
                _ => TextStyle::Action,
            };
            let [character, text] = texts::<2>(payload)?;
            Action::Speak {
                style,
                character,
                text,
            }
        }
        "affinity" => {
            let [target, amount, sign] = texts::<3>(payload)?;
            Action::Adjust {
                stat: Stat::Affinity,
                target: Some(target),
                amount,
                sign,
            }
        }
        "infamy" | "ability" | "reputation" | "trust" => {
            let stat = kind
                .parse::<Stat>()
                .map_err(|_| format!("未知数值 '{}'", kind))?;
            let [amount, sign] = texts::<2>(payload)?;
            Action::Adjust {
                stat,
                target: None,
                amount,
                sign,
            }
        }
        "money" => Action::Money {
            amount: text(payload, "金额")?,
        },
        "update" => Action::Update {
            request: match payload {
                Value::Array(items) => items.iter().filter_map(scalar_text).collect(),
                other => vec![text(other, "数值名")?],
            },
        },
        "item" => Action::Store {
            items: list(payload)?
                .iter()
                .map(parse_item)
                .collect::<Result<_, _>>()?,
        },
        "choice" | "bchoice" => {
            let skin = if kind == "choice" {
                ChoiceSkin::Standard
            } else {
                ChoiceSkin::Bold
            };
            let options = list(payload)?
                .iter()
                .map(|entry| -> Result<ChoiceEntry, String> {
                    let [label, target] = texts::<2>(entry)?;
                    Ok(ChoiceEntry { label, target })
                })
                .collect::<Result<_, _>>()?;
            Action::Choice { skin, options }
        }
        "save" => Action::Save {
            resume: text(payload, "继续脚本")?,
        },
        "end" => Action::End {
            next: match payload {
                Value::Null => None,
                other => Some(text(other, "下一个场景")?).filter(|s| !s.is_empty()),
            },
        },
        other => Action::Unknown {
            kind: other.to_string(),
        },
    };
    Ok(action)
}

fn parse_item(entry: &Value) -> Result<ItemEntry, String> {
    let parts = list(entry)?;
    if parts.len() < 3 {
        return Err(format!("商品需要 3 个字段，实际 {} 个", parts.len()));
    }
    let label = text(&parts[0], "商品名")?;

    if label == EXIT_STORE_LABEL {
        return Ok(ItemEntry::Exit {
            label,
            target: text(&parts[2], "离开后的脚本")?,
        });
    }

    let price = text(&parts[1], "价格")?;
    let effect_parts = list(&parts[2])?;
    if effect_parts.len() < 2 {
        return Err(format!("商品 '{}' 的效果至少需要 [stat, points]", label));
    }
    let effect = ItemEffect {
        stat: text(&effect_parts[0], "效果数值")?,
        points: text(&effect_parts[1], "效果点数")?,
        character: effect_parts.get(2).and_then(scalar_text),
    };
    Ok(ItemEntry::Purchase {
        label,
        price,
        effect,
    })
}

/// 字符串或数字取为文本
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text(value: &Value, what: &str) -> Result<String, String> {
    scalar_text(value).ok_or_else(|| format!("{} 必须是字符串", what))
}

fn list(value: &Value) -> Result<&Vec<Value>, String> {
    value
        .as_array()
        .ok_or_else(|| "payload 必须是数组".to_string())
}

fn texts<const N: usize>(value: &Value) -> Result<[String; N], String> {
    let items = list(value)?;
    if items.len() < N {
        return Err(format!("需要 {} 个参数，实际 {} 个", N, items.len()));
    }
    let mut out: [String; N] = std::array::from_fn(|_| String::new());
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = text(item, "参数")?;
    }
    Ok(out)
}
