//! # Text 模块
//!
//! 文本框内容与逐字显示（打字机效果）。
//!
//! ## 状态机
//!
//! ```text
//! Idle ──set_text──► Revealing ──(update 越过末尾 / skip)──► Complete
//!                        ▲                                      │
//!                        └──────────────set_text────────────────┘
//! ```
//!
//! 显示进度只由累计时间决定：`cursor = floor(elapsed / reveal_rate_ms)`，
//! 换行符不占用时间片。

use serde::{Deserialize, Serialize};

/// RGB 颜色
pub type Rgb = [u8; 3];

/// 效果提示使用的中性颜色
pub const EFFECT_COLOR: Rgb = [0, 0, 255];

/// 文本样式
///
/// 三种叙述样式共用同一个数据模型，只在字体上有区别；
/// `Effect` 用于数值变化等系统提示。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextStyle {
    Dialogue,
    Thought,
    Action,
    Effect,
}

impl TextStyle {
    /// 正文字号
    pub fn font_size(&self) -> f32 {
        match self {
            TextStyle::Effect => 25.0,
            _ => 18.0,
        }
    }
}

/// 文本宽度测量（由宿主的字体系统提供）
pub trait TextMeasure {
    fn text_width(&self, style: TextStyle, text: &str) -> f32;
}

/// 按字符数估算宽度
///
/// 没有真实字体时使用：每个字符占半个字号宽。
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimatedMeasure;

impl TextMeasure for EstimatedMeasure {
    fn text_width(&self, style: TextStyle, text: &str) -> f32 {
        text.chars().count() as f32 * style.font_size() * 0.5
    }
}

/// 贪心按词换行
///
/// 依次追加单词，追加后超出 `max_width` 时另起一行。
/// 单个超宽单词独占一行，不拆分。
pub fn wrap_text(
    text: &str,
    max_width: f32,
    measure: &dyn TextMeasure,
    style: TextStyle,
) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        if line.is_empty() {
            line.push_str(word);
            continue;
        }
        let candidate = format!("{} {}", line, word);
        if measure.text_width(style, &candidate) > max_width {
            lines.push(std::mem::replace(&mut line, word.to_string()));
        } else {
            line = candidate;
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }

    lines.join("\n")
}

/// 逐字显示阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevealPhase {
    /// 还没有设置过文本
    #[default]
    Idle,
    Revealing,
    Complete,
}

/// 说话者
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Speaker {
    pub name: String,
    pub color: Rgb,
}

/// 文本框
#[derive(Debug, Clone)]
pub struct TextBox {
    /// 换行后的完整文本
    text: String,
    /// `text` 的字符数
    len: usize,
    /// 已显示字符数，`0..=len`
    cursor: usize,
    /// 本段文本开始显示后的累计时间（毫秒）
    elapsed_ms: f32,
    reveal_rate_ms: f32,
    phase: RevealPhase,
    style: TextStyle,
    speaker: Option<Speaker>,
}

impl TextBox {
    pub fn new(style: TextStyle, reveal_rate_ms: f32) -> Self {
        Self {
            text: String::new(),
            len: 0,
            cursor: 0,
            elapsed_ms: 0.0,
            reveal_rate_ms,
            phase: RevealPhase::Idle,
            style,
            speaker: None,
        }
    }

    pub fn set_speaker(&mut self, speaker: Option<Speaker>) {
        self.speaker = speaker;
    }

    /// 设置新文本并从头开始逐字显示
    pub fn set_text(&mut self, text: &str, max_width: f32, measure: &dyn TextMeasure) {
        self.text = wrap_text(text, max_width, measure, self.style);
        self.len = self.text.chars().count();
        self.cursor = 0;
        self.elapsed_ms = 0.0;
        self.phase = RevealPhase::Revealing;
    }

    /// 推进显示进度
    pub fn update(&mut self, dt_ms: f32) {
        if self.phase != RevealPhase::Revealing {
            return;
        }

        self.elapsed_ms += dt_ms;
        let mut index = (self.elapsed_ms / self.reveal_rate_ms).floor() as usize;

        if index >= self.len {
            self.complete();
            return;
        }
        if self.text.chars().nth(index) == Some('\n') {
            index += 1;
        }
        self.cursor = self.cursor.max(index.min(self.len));
    }

    /// 立即显示全部文本
    pub fn skip(&mut self) {
        self.complete();
    }

    fn complete(&mut self) {
        self.cursor = self.len;
        self.phase = RevealPhase::Complete;
    }

    pub fn is_revealing(&self) -> bool {
        self.phase == RevealPhase::Revealing
    }

    pub fn phase(&self) -> RevealPhase {
        self.phase
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn style(&self) -> TextStyle {
        self.style
    }

    pub fn speaker(&self) -> Option<&Speaker> {
        self.speaker.as_ref()
    }

    /// 换行后的完整文本
    pub fn text(&self) -> &str {
        &self.text
    }

    /// 当前已显示的部分
    pub fn visible_text(&self) -> &str {
        match self.text.char_indices().nth(self.cursor) {
            Some((offset, _)) => &self.text[..offset],
            None => &self.text,
        }
    }
}
