//! # Character 模块
//!
//! 角色立绘的位置与移动。
//!
//! 角色在场景构造时全部创建，登场/退场只改变位置和是否在屏幕上，
//! 从不销毁记录。移动按帧时间推进，越接近目标越慢。

use std::collections::HashMap;

use crate::error::ScriptError;
use crate::geometry::{Point, Rect, Size};
use crate::text::Rgb;

/// 默认移动速度
pub const DEFAULT_SPEED: f32 = 5.0;

/// 退场时滑到的右边界位置
pub const EXIT_RIGHT_EDGE: f32 = -100.0;

/// 立绘
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    /// 图片逻辑路径
    pub path: String,
    pub size: Size,
}

/// 角色
#[derive(Debug, Clone)]
pub struct Character {
    /// 显示名
    pub name: String,
    /// 名字颜色
    pub color: Rgb,
    sprites: HashMap<String, Sprite>,
    sprite: Option<String>,
    rect: Rect,
    target: Rect,
    speed: f32,
    exiting: bool,
}

impl Character {
    /// 创建角色，初始位于屏幕右下角之外
    pub fn new(
        name: impl Into<String>,
        sprites: HashMap<String, Sprite>,
        color: Rgb,
        screen: Size,
    ) -> Self {
        let mut rect = Rect::default();
        rect.set_bottom_left(Point::new(screen.w, screen.h));
        Self {
            name: name.into(),
            color,
            sprites,
            sprite: None,
            rect,
            target: rect,
            speed: 0.0,
            exiting: false,
        }
    }

    /// 切换立绘，保持左上角不动
    pub fn set_sprite(&mut self, key: &str) -> Result<(), ScriptError> {
        let sprite = self
            .sprites
            .get(key)
            .ok_or_else(|| ScriptError::UnknownSprite {
                character: self.name.clone(),
                sprite: key.to_string(),
            })?;
        self.rect.w = sprite.size.w;
        self.rect.h = sprite.size.h;
        self.sprite = Some(key.to_string());
        Ok(())
    }

    /// 当前立绘
    pub fn sprite(&self) -> Option<&Sprite> {
        self.sprite.as_ref().and_then(|key| self.sprites.get(key))
    }

    pub fn sprite_key(&self) -> Option<&str> {
        self.sprite.as_deref()
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn target(&self) -> Rect {
        self.target
    }

    pub fn is_exiting(&self) -> bool {
        self.exiting
    }

    pub fn is_moving(&self) -> bool {
        self.rect.top_left() != self.target.top_left()
    }

    /// 开始向目标移动
    pub fn move_to(&mut self, target: Rect, speed: f32) {
        self.target = target;
        self.speed = speed;
    }

    /// 登场或重新排布：y 立即对齐，x 动画移动
    pub fn place(&mut self, target: Rect) {
        self.exiting = false;
        self.rect.y = target.y;
        self.move_to(target, DEFAULT_SPEED);
    }

    /// 取消退场（退场途中再次登场）
    pub fn cancel_exit(&mut self) {
        self.exiting = false;
    }

    /// 开始滑出屏幕左侧
    pub fn exit(&mut self) {
        let mut target = self.rect;
        target.set_right(EXIT_RIGHT_EDGE);
        self.move_to(target, DEFAULT_SPEED);
        self.exiting = true;
    }

    /// 推进移动动画
    pub fn update(&mut self, dt_ms: f32) {
        if !self.is_moving() {
            self.speed = 0.0;
            return;
        }
        self.rect.x = approach(self.rect.x, self.target.x, dt_ms, self.speed);
        self.rect.y = approach(self.rect.y, self.target.y, dt_ms, self.speed);
    }
}

/// 单轴移动一帧：距离越远越快，有速度上限，足够接近时直接到位
fn approach(current: f32, target: f32, dt_ms: f32, speed: f32) -> f32 {
    let dist = (current - target).abs() + 7.0;
    let change = ((dist / 2.5) * (dt_ms / 500.0) * speed).min(200.0 * (dt_ms / 1000.0) * speed);

    if (target - current).abs() < change + 2.0 {
        target
    } else if target < current {
        current - change
    } else {
        current + change
    }
}

/// 计算一排角色的目标位置
///
/// 角色从左到右排列，间隔 `spacing`，整排水平居中，底边对齐 `baseline`。
pub fn layout_row(sizes: &[Size], screen: Size, baseline: f32, spacing: f32) -> Vec<Rect> {
    if sizes.is_empty() {
        return Vec::new();
    }
    let total_width: f32 =
        sizes.iter().map(|s| s.w).sum::<f32>() + spacing * (sizes.len() - 1) as f32;
    let max_height = sizes.iter().map(|s| s.h).fold(0.0, f32::max);

    let mut row = Rect::new(0.0, 0.0, total_width, max_height);
    row.set_mid_bottom(Point::new(screen.w / 2.0, baseline));

    let mut offset = row.x;
    sizes
        .iter()
        .map(|size| {
            let mut rect = Rect::new(0.0, 0.0, size.w, size.h);
            rect.set_bottom_left(Point::new(offset, baseline));
            offset = rect.right() + spacing;
            rect
        })
        .collect()
}
