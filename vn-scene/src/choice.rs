//! # Choice 模块
//!
//! 分支选项与商店选项的数据结构和布局。
//!
//! 选项本身不持有场景引用，只记录点击后要做什么（[`OptionAction`]），
//! 由场景在点击时解释执行。

use crate::geometry::{Point, Rect, Size};
use crate::store::PurchaseOrder;

/// 选项按钮外观
///
/// 两种外观逻辑完全相同，只是按钮底图不同。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceSkin {
    Standard,
    Bold,
}

/// 选项被点击后的行为
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionAction {
    /// 加载目标脚本（相对 manifest prefix），从第一个 beat 开始
    Branch { target: String },
    /// 购买商品
    Purchase(PurchaseOrder),
}

/// 一个可点击的选项
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceOption {
    pub label: String,
    pub skin: ChoiceSkin,
    pub rect: Rect,
    pub action: OptionAction,
}

impl ChoiceOption {
    pub fn new(label: impl Into<String>, skin: ChoiceSkin, size: Size, action: OptionAction) -> Self {
        Self {
            label: label.into(),
            skin,
            rect: Rect::from_size(Point::default(), size),
            action,
        }
    }

    pub fn hit(&self, point: Point) -> bool {
        self.rect.contains(point)
    }
}

/// 单列居中布局
///
/// 所有选项左边对齐到最宽选项的左边，整列在屏幕中心，相邻选项间隔 `spacing`。
pub fn layout_column(sizes: &[Size], screen: Size, spacing: f32) -> Vec<Rect> {
    if sizes.is_empty() {
        return Vec::new();
    }
    let max_width = sizes.iter().map(|s| s.w).fold(0.0, f32::max);
    let total_height: f32 =
        sizes.iter().map(|s| s.h).sum::<f32>() + spacing * (sizes.len() - 1) as f32;

    let mut column = Rect::new(0.0, 0.0, max_width, total_height);
    column.set_center(Point::new(screen.w / 2.0, screen.h / 2.0));

    let mut offset = column.y;
    sizes
        .iter()
        .map(|size| {
            let rect = Rect::new(column.x, offset, size.w, size.h);
            offset = rect.bottom() + spacing;
            rect
        })
        .collect()
}

/// 商店双列布局
///
/// 选项按顺序交替放入左右两列，每列从 `top` 开始，行距 `row_step`。
pub fn layout_two_columns(sizes: &[Size], columns: [f32; 2], top: f32, row_step: f32) -> Vec<Rect> {
    sizes
        .iter()
        .enumerate()
        .map(|(i, size)| {
            let row = (i / 2) as f32;
            Rect::new(columns[i % 2], top + row * row_step, size.w, size.h)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN: Size = Size { w: 1280.0, h: 720.0 };

    #[test]
    fn test_layout_column() {
        let sizes = [Size::new(300.0, 60.0), Size::new(400.0, 60.0)];
        let rects = layout_column(&sizes, SCREEN, 10.0);

        // 总高 130，居中于 360 -> 从 295 开始；最宽 400，居中于 640 -> x = 440
        assert_eq!(rects[0], Rect::new(440.0, 295.0, 300.0, 60.0));
        assert_eq!(rects[1], Rect::new(440.0, 365.0, 400.0, 60.0));
        assert_eq!(rects[1].y - rects[0].bottom(), 10.0);
    }

    #[test]
    fn test_layout_column_uniform_spacing() {
        let sizes = vec![Size::new(200.0, 50.0); 4];
        let rects = layout_column(&sizes, SCREEN, 10.0);
        for pair in rects.windows(2) {
            assert_eq!(pair[0].x, pair[1].x);
            assert_eq!(pair[1].y - pair[0].bottom(), 10.0);
        }
        assert!(layout_column(&[], SCREEN, 10.0).is_empty());
    }

    #[test]
    fn test_layout_two_columns_split() {
        let sizes = vec![Size::new(200.0, 50.0); 5];
        let rects = layout_two_columns(&sizes, [100.0, 680.0], 100.0, 100.0);

        let left: Vec<f32> = rects.iter().filter(|r| r.x == 100.0).map(|r| r.y).collect();
        let right: Vec<f32> = rects.iter().filter(|r| r.x == 680.0).map(|r| r.y).collect();
        assert_eq!(left, vec![100.0, 200.0, 300.0]);
        assert_eq!(right, vec![100.0, 200.0]);
    }

    #[test]
    fn test_option_hit() {
        let mut option = ChoiceOption::new(
            "Go left",
            ChoiceSkin::Standard,
            Size::new(100.0, 40.0),
            OptionAction::Branch {
                target: "left.json".to_string(),
            },
        );
        option.rect.set_top_left(Point::new(10.0, 10.0));

        assert!(option.hit(Point::new(10.0, 10.0)));
        assert!(option.hit(Point::new(109.0, 49.0)));
        assert!(!option.hit(Point::new(110.0, 20.0)));
    }
}
