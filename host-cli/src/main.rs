//! Visual Novel - 终端宿主
//!
//! 负责配置、资源读取、存档和输入，驱动 vn-scene 执行场景脚本。

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;
use std::time::Instant;

use clap::Parser;
use host_cli::{
    App, AppConfig, FsSource, GameMode, Input, SaveManager, TerminalPresenter, check_scripts,
};
use tracing::{Level, info, warn};
use vn_scene::Backend;

/// 无人值守模式的帧间隔
const AUTO_FRAME_MS: f32 = 1000.0 / 60.0;

#[derive(Parser, Debug)]
#[command(name = "host-cli", about = "视觉小说终端宿主")]
struct Cli {
    /// 配置文件路径
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// 覆盖入口场景 manifest
    #[arg(long)]
    manifest: Option<String>,

    /// 无人值守运行，自动推进并选择第一个分支选项
    #[arg(long)]
    auto: bool,

    /// 最多运行的帧数
    #[arg(long)]
    max_frames: Option<u64>,

    /// 输出 debug 日志
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("host-cli error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn real_main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (mut config, config_error) = match AppConfig::read(&cli.config) {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    if let Some(manifest) = cli.manifest {
        config.entry_manifest = manifest;
    }

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        config.log_level().unwrap_or(Level::INFO)
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .init();

    match config_error {
        Some(e) => warn!(path = %cli.config.display(), error = %e, "配置文件不可用，使用默认配置"),
        None => info!(path = %cli.config.display(), "配置文件加载成功"),
    }
    config.validate()?;

    info!(
        title = %config.window.title,
        assets = %config.assets_root.display(),
        entry = %config.entry_manifest,
        "启动"
    );

    let source = Rc::new(FsSource::new(&config.assets_root));
    if config.debug.script_check {
        check_scripts(source.as_ref(), &config.entry_manifest);
    }

    let backend = Backend::new(source).with_settings(config.scene_settings());
    let mut app = App::new(
        backend,
        &config.entry_manifest,
        SaveManager::new(&config.save_path),
    );
    let mut presenter = TerminalPresenter::new(io::stdout().lock());

    if cli.auto {
        run_auto(&mut app, &mut presenter, cli.max_frames)
    } else {
        run_interactive(&mut app, &mut presenter, cli.max_frames)
    }
}

/// 交互模式：每行输入推进一帧
///
/// - 空行：点击推进
/// - 数字：选择菜单按钮或选项
/// - `p` / `esc`：暂停 / 继续
/// - `q`：退出
fn run_interactive<W: Write>(
    app: &mut App,
    presenter: &mut TerminalPresenter<W>,
    max_frames: Option<u64>,
) -> anyhow::Result<()> {
    let commands = app.frame(None, 0.0)?;
    presenter.present(app, &commands)?;

    let mut last = Instant::now();
    let mut frames = 0u64;
    let mut lines = io::stdin().lock().lines();

    while app.is_running() && max_frames.is_none_or(|max| frames < max) {
        let Some(line) = lines.next() else {
            break;
        };
        let input = parse_input(app.mode(), line?.trim());
        if input.is_none() {
            warn!("无法识别的输入");
        }

        let dt_ms = last.elapsed().as_secs_f32() * 1000.0;
        last = Instant::now();

        let commands = app.frame(input, dt_ms)?;
        presenter.present(app, &commands)?;
        frames += 1;
    }
    Ok(())
}

/// 无人值守模式：固定帧间隔，回到主菜单即结束
fn run_auto<W: Write>(
    app: &mut App,
    presenter: &mut TerminalPresenter<W>,
    max_frames: Option<u64>,
) -> anyhow::Result<()> {
    let mut started = false;
    let mut frames = 0u64;

    while app.is_running() && max_frames.is_none_or(|max| frames < max) {
        if app.mode() == GameMode::MainMenu && started {
            break;
        }
        let input = app.auto_input();
        started |= matches!(input, Some(Input::Menu(_)));

        let commands = app.frame(input, AUTO_FRAME_MS)?;
        presenter.present(app, &commands)?;
        frames += 1;
    }

    info!(frames, "无人值守运行结束");
    Ok(())
}

fn parse_input(mode: GameMode, line: &str) -> Option<Input> {
    match line {
        "" => Some(Input::Advance),
        "q" | "quit" => Some(Input::Quit),
        "p" | "esc" => Some(Input::Escape),
        _ => {
            let n: usize = line.parse().ok()?;
            let index = n.checked_sub(1)?;
            match mode {
                GameMode::Running => Some(Input::Choose(index)),
                GameMode::MainMenu | GameMode::Paused => {
                    mode.menu().get(index).copied().map(Input::Menu)
                }
            }
        }
    }
}
