//! # State 模块
//!
//! 玩家的持久数值状态（金钱、好感度、声望等）。
//!
//! ## 设计原则
//!
//! - 每局游戏只创建一次，场景切换时随之传递
//! - 所有字段可序列化，写入存档
//! - 数值不做上下限裁剪，可以为负

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ScriptError;

/// 数值种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stat {
    /// 按角色区分的好感度
    Affinity,
    Infamy,
    Ability,
    /// 班级声望
    Reputation,
    /// Kaiser 的信任
    Trust,
    Money,
}

impl Stat {
    /// 所有数值种类，按 `update` 动作的查询优先级排序
    pub const ALL: [Stat; 6] = [
        Stat::Money,
        Stat::Infamy,
        Stat::Reputation,
        Stat::Ability,
        Stat::Trust,
        Stat::Affinity,
    ];

    /// 脚本中使用的名字
    pub fn name(&self) -> &'static str {
        match self {
            Stat::Affinity => "affinity",
            Stat::Infamy => "infamy",
            Stat::Ability => "ability",
            Stat::Reputation => "reputation",
            Stat::Trust => "trust",
            Stat::Money => "money",
        }
    }

    /// 展示给玩家的名字
    pub fn label(&self) -> &'static str {
        match self {
            Stat::Affinity => "Affinity Points",
            Stat::Infamy => "Infamy Points",
            Stat::Ability => "Ability Points",
            Stat::Reputation => "Class Reputation",
            Stat::Trust => "Kaiser's Trust",
            Stat::Money => "Money",
        }
    }
}

impl FromStr for Stat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stat::ALL
            .into_iter()
            .find(|stat| stat.name() == s)
            .ok_or(())
    }
}

/// 增减符号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sign {
    Plus,
    Minus,
}

impl FromStr for Sign {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "+" => Ok(Sign::Plus),
            "-" => Ok(Sign::Minus),
            other => Err(ScriptError::InvalidSign {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sign::Plus => write!(f, "+"),
            Sign::Minus => write!(f, "-"),
        }
    }
}

/// 对计数器应用增量，不做裁剪，超出 i64 范围时返回错误
pub fn apply_delta(counter: i64, sign: Sign, amount: i64) -> Result<i64, ScriptError> {
    let next = match sign {
        Sign::Plus => counter.checked_add(amount),
        Sign::Minus => counter.checked_sub(amount),
    };
    next.ok_or_else(|| ScriptError::Overflow {
        counter,
        delta: format!("{}{}", sign, amount),
    })
}

/// 金钱加上带符号的数额，溢出时不修改
pub fn add_money(money: i64, amount: i64) -> Result<i64, ScriptError> {
    money.checked_add(amount).ok_or_else(|| ScriptError::Overflow {
        counter: money,
        delta: format!("{:+}", amount),
    })
}

/// 解析非负十进制整数
pub fn parse_amount(value: &str) -> Result<i64, ScriptError> {
    value
        .trim()
        .parse::<u32>()
        .map(i64::from)
        .map_err(|_| ScriptError::InvalidNumber {
            value: value.to_string(),
        })
}

/// 解析带符号十进制整数（`money` 动作允许负数）
pub fn parse_signed(value: &str) -> Result<i64, ScriptError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| ScriptError::InvalidNumber {
            value: value.to_string(),
        })
}

/// 玩家状态
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    #[serde(default)]
    pub money: i64,
    #[serde(default)]
    pub infamy_points: i64,
    #[serde(default)]
    pub ability_points: i64,
    #[serde(default)]
    pub class_reputation: i64,
    #[serde(default)]
    pub kaiser_trust: i64,
    /// 角色名 -> 好感度
    #[serde(default)]
    pub affinity_points: BTreeMap<String, i64>,
}

impl PlayerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 读取角色好感度，未记录时为 0
    pub fn affinity(&self, character: &str) -> i64 {
        self.affinity_points.get(character).copied().unwrap_or(0)
    }

    /// 读取数值
    ///
    /// `Affinity` 需要 `target` 指明角色，否则返回 `None`。
    pub fn total(&self, stat: Stat, target: Option<&str>) -> Option<i64> {
        match stat {
            Stat::Affinity => target.map(|name| self.affinity(name)),
            Stat::Infamy => Some(self.infamy_points),
            Stat::Ability => Some(self.ability_points),
            Stat::Reputation => Some(self.class_reputation),
            Stat::Trust => Some(self.kaiser_trust),
            Stat::Money => Some(self.money),
        }
    }

    /// 对数值应用增量，返回新值
    ///
    /// 角色好感度第一次写入时插入记录。
    /// `Affinity` 缺少 `target` 或结果溢出时不修改数值。
    pub fn apply(
        &mut self,
        stat: Stat,
        target: Option<&str>,
        sign: Sign,
        amount: i64,
    ) -> Result<i64, ScriptError> {
        let counter = match stat {
            Stat::Affinity => {
                let name = target.ok_or_else(|| ScriptError::MalformedAction {
                    kind: stat.name().to_string(),
                    reason: "缺少目标角色".to_string(),
                })?;
                self.affinity_points.entry(name.to_string()).or_insert(0)
            }
            Stat::Infamy => &mut self.infamy_points,
            Stat::Ability => &mut self.ability_points,
            Stat::Reputation => &mut self.class_reputation,
            Stat::Trust => &mut self.kaiser_trust,
            Stat::Money => &mut self.money,
        };
        *counter = apply_delta(*counter, sign, amount)?;
        Ok(*counter)
    }
}
