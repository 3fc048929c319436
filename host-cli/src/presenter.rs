//! # Presenter 模块
//!
//! 终端渲染：把场景的可见状态打印成文本。
//!
//! 每帧调用一次 [`TerminalPresenter::present`]，只输出与上一帧相比发生变化的部分
//! （新的文本框、新的选项列表、模式切换和宿主指令）。

use std::io::{self, Write};

use vn_scene::{Command, Scene, TextStyle};

use crate::app::App;
use crate::app_mode::GameMode;

/// 场景序号加上场景内的文本框或选项序号
type DisplayKey = (u64, u64);

/// 终端渲染器
pub struct TerminalPresenter<W: Write> {
    out: W,
    mode: Option<GameMode>,
    text: Option<DisplayKey>,
    options: Option<DisplayKey>,
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            mode: None,
            text: None,
            options: None,
        }
    }

    /// 输出本帧的变化
    pub fn present(&mut self, app: &App, commands: &[Command]) -> io::Result<()> {
        for command in commands {
            self.command(command)?;
        }

        if self.mode != Some(app.mode()) {
            self.mode = Some(app.mode());
            self.menu(app.mode())?;
        }

        match app.scene() {
            Some(scene) if app.mode() == GameMode::Running => {
                self.scene(app.scene_serial(), scene)?
            }
            Some(_) => {}
            None => {
                self.text = None;
                self.options = None;
            }
        }
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn menu(&mut self, mode: GameMode) -> io::Result<()> {
        match mode {
            GameMode::Running => writeln!(self.out),
            GameMode::MainMenu | GameMode::Paused => {
                let title = if mode == GameMode::Paused {
                    "== Paused =="
                } else {
                    "== Main Menu =="
                };
                writeln!(self.out, "{}", title)?;
                for (i, item) in mode.menu().iter().enumerate() {
                    writeln!(self.out, "  [{}] {}", i + 1, item.label())?;
                }
                Ok(())
            }
        }
    }

    fn command(&mut self, command: &Command) -> io::Result<()> {
        match command {
            Command::ShowBackground { path } => writeln!(self.out, "~ background: {}", path),
            Command::StopTrack => Ok(()),
            Command::PlayTrack { path } => writeln!(self.out, "~ music: {}", path),
            Command::WriteSave { record } => {
                writeln!(self.out, "~ game saved (resume at {})", record.resume())
            }
        }
    }

    fn scene(&mut self, serial: u64, scene: &Scene) -> io::Result<()> {
        let text_box = scene.text_box();
        let key = (serial, scene.text_serial());
        if !text_box.text().is_empty() && self.text != Some(key) {
            let speaker = text_box.speaker().map(|s| s.name.as_str()).unwrap_or("");
            match (text_box.style(), speaker) {
                (TextStyle::Effect, _) | (_, "") => {
                    writeln!(self.out, "  * {}", indent(text_box.text()))?
                }
                (_, name) => writeln!(self.out, "{}: {}", name, indent(text_box.text()))?,
            }
            self.text = Some(key);
        }

        let key = (serial, scene.options_serial());
        if scene.choice_pending() && self.options != Some(key) {
            for (i, option) in scene.options().iter().enumerate() {
                writeln!(self.out, "  [{}] {}", i + 1, option.label)?;
            }
            self.options = Some(key);
        }
        Ok(())
    }
}

/// 换行后的续行缩进
fn indent(text: &str) -> String {
    text.replace('\n', "\n    ")
}
