//! # Store 模块
//!
//! 商店购买结算。
//!
//! 每个商品选项在商店打开时就固定了自己的价格、效果和当时的金钱快照，
//! 点击时不再重新读取脚本数据。快照在整个商店访问期间不刷新，
//! 同一次访问内多次购买可能让金钱变为负数。

use crate::error::ScriptError;
use crate::script::ItemEffect;
use crate::state::{PlayerState, Sign, Stat, apply_delta, parse_amount};

/// 购买效果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseEffect {
    pub stat: Stat,
    pub points: i64,
    /// 好感度类效果的目标角色
    pub character: Option<String>,
}

impl PurchaseEffect {
    /// 从脚本中的效果描述解析
    ///
    /// 数值名无法识别但带有角色时，按好感度处理。
    pub fn parse(effect: &ItemEffect) -> Result<Self, ScriptError> {
        let points = parse_amount(&effect.points)?;
        let stat = match (effect.stat.parse::<Stat>(), &effect.character) {
            (Ok(stat), _) => stat,
            (Err(()), Some(_)) => Stat::Affinity,
            (Err(()), None) => {
                return Err(ScriptError::MalformedAction {
                    kind: "item".to_string(),
                    reason: format!("未知效果 '{}'", effect.stat),
                });
            }
        };
        if stat == Stat::Affinity && effect.character.is_none() {
            return Err(ScriptError::MalformedAction {
                kind: "item".to_string(),
                reason: "好感度效果缺少目标角色".to_string(),
            });
        }
        Ok(Self {
            stat,
            points,
            character: effect.character.clone(),
        })
    }

    /// 效果描述，如 `5 ability points`
    fn describe(&self) -> String {
        match self.stat {
            Stat::Affinity => format!(
                "{} {} affinity points",
                self.points,
                self.character.as_deref().unwrap_or_default()
            ),
            Stat::Infamy => format!("{} infamy points", self.points),
            Stat::Ability => format!("{} ability points", self.points),
            Stat::Reputation => format!("{} class reputation", self.points),
            Stat::Trust => format!("{} Kaiser's trust", self.points),
            Stat::Money => format!("{} yen", self.points),
        }
    }
}

/// 一个商品选项绑定的购买指令
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseOrder {
    pub label: String,
    pub price: i64,
    pub effect: PurchaseEffect,
    /// 商店打开时的金钱
    pub funds_snapshot: i64,
}

impl PurchaseOrder {
    pub fn new(
        label: impl Into<String>,
        price: &str,
        effect: &ItemEffect,
        funds_snapshot: i64,
    ) -> Result<Self, ScriptError> {
        Ok(Self {
            label: label.into(),
            price: parse_amount(price)?,
            effect: PurchaseEffect::parse(effect)?,
            funds_snapshot,
        })
    }
}

/// 购买结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseOutcome {
    /// 钱不够，状态未改变
    InsufficientFunds,
    /// 购买成功
    Purchased {
        effect: PurchaseEffect,
        remaining: i64,
    },
}

impl PurchaseOutcome {
    /// 展示给玩家的提示
    pub fn message(&self) -> String {
        match self {
            PurchaseOutcome::InsufficientFunds => "You do not have enough money!".to_string(),
            PurchaseOutcome::Purchased { effect, remaining } => format!(
                "You have earned {}. You have {} yen left",
                effect.describe(),
                remaining
            ),
        }
    }
}

/// 结算一次购买
///
/// 只检查快照是否为负，不比较价格与余额。
/// 扣款或效果溢出时返回错误，状态保持不变。
pub fn resolve_purchase(
    order: &PurchaseOrder,
    state: &mut PlayerState,
) -> Result<PurchaseOutcome, ScriptError> {
    if order.funds_snapshot < 0 {
        return Ok(PurchaseOutcome::InsufficientFunds);
    }

    let mut next = state.clone();
    next.money = apply_delta(next.money, Sign::Minus, order.price)?;
    let effect = &order.effect;
    next.apply(
        effect.stat,
        effect.character.as_deref(),
        Sign::Plus,
        effect.points,
    )?;
    *state = next;

    Ok(PurchaseOutcome::Purchased {
        effect: effect.clone(),
        remaining: state.money,
    })
}
