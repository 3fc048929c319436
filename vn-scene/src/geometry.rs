//! # Geometry 模块
//!
//! 屏幕坐标系下的点、尺寸和矩形。原点在左上角，y 轴向下。

use serde::{Deserialize, Serialize};

/// 屏幕上的点
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// 宽高
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub w: f32,
    pub h: f32,
}

impl Size {
    pub fn new(w: f32, h: f32) -> Self {
        Self { w, h }
    }
}

/// 轴对齐矩形
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// 以给定左上角和尺寸创建
    pub fn from_size(top_left: Point, size: Size) -> Self {
        Self::new(top_left.x, top_left.y, size.w, size.h)
    }

    pub fn size(&self) -> Size {
        Size::new(self.w, self.h)
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// 移动左上角
    pub fn set_top_left(&mut self, p: Point) {
        self.x = p.x;
        self.y = p.y;
    }

    /// 移动使左下角落在 `p`
    pub fn set_bottom_left(&mut self, p: Point) {
        self.x = p.x;
        self.y = p.y - self.h;
    }

    /// 移动使右边界落在 `right`
    pub fn set_right(&mut self, right: f32) {
        self.x = right - self.w;
    }

    /// 移动使底边中点落在 `p`
    pub fn set_mid_bottom(&mut self, p: Point) {
        self.x = p.x - self.w / 2.0;
        self.y = p.y - self.h;
    }

    /// 移动使中心落在 `p`
    pub fn set_center(&mut self, p: Point) {
        self.x = p.x - self.w / 2.0;
        self.y = p.y - self.h / 2.0;
    }

    /// 点是否落在矩形内（左上闭，右下开）
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// 两个矩形是否有重叠面积
    ///
    /// 只共享边的矩形不算相交，面积为零的矩形不与任何矩形相交。
    pub fn intersects(&self, other: &Rect) -> bool {
        if self.w <= 0.0 || self.h <= 0.0 || other.w <= 0.0 || other.h <= 0.0 {
            return false;
        }
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_is_half_open() {
        let r = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(r.contains(Point::new(10.0, 10.0)));
        assert!(r.contains(Point::new(29.9, 29.9)));
        assert!(!r.contains(Point::new(30.0, 15.0)));
        assert!(!r.contains(Point::new(15.0, 30.0)));
    }

    #[test]
    fn test_intersects() {
        let screen = Rect::new(0.0, 0.0, 1280.0, 720.0);
        assert!(Rect::new(-50.0, 100.0, 100.0, 100.0).intersects(&screen));
        // 只共享边
        assert!(!Rect::new(1280.0, 0.0, 100.0, 100.0).intersects(&screen));
        assert!(!Rect::new(-100.0, 0.0, 100.0, 100.0).intersects(&screen));
        // 零面积
        assert!(!Rect::new(100.0, 100.0, 0.0, 0.0).intersects(&screen));
    }

    #[test]
    fn test_anchors() {
        let mut r = Rect::new(0.0, 0.0, 200.0, 400.0);
        r.set_bottom_left(Point::new(1280.0, 720.0));
        assert_eq!(r.top_left(), Point::new(1280.0, 320.0));

        r.set_right(-100.0);
        assert_eq!(r.x, -300.0);

        r.set_mid_bottom(Point::new(640.0, 800.0));
        assert_eq!(r.top_left(), Point::new(540.0, 400.0));

        r.set_center(Point::new(640.0, 360.0));
        assert_eq!(r.center(), Point::new(640.0, 360.0));
    }
}
