//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `cov-scene`: 运行 vn-scene 覆盖率
//! - `cov-workspace`: 运行 workspace 覆盖率
//! - `script-check`: 检查场景（manifest、脚本、资源引用）

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use host_cli::FsSource;
use vn_scene::{
    AssetSource, Diagnostic, DiagnosticResult, ResourceTables, SceneManifest, analyze_scene,
    normalize_logical_path,
};
use walkdir::WalkDir;
use xshell::{Shell, cmd};

/// 场景 manifest 的文件名
const MANIFEST_FILE: &str = "scene.json";

fn ensure_cargo_llvm_cov_available(sh: &Shell) -> anyhow::Result<()> {
    if cmd!(sh, "cargo llvm-cov --version").quiet().run().is_err() {
        anyhow::bail!(
            "cargo llvm-cov 不可用。\n\
请先安装：\n\
  - cargo install cargo-llvm-cov\n\
  - rustup component add llvm-tools-preview\n\
然后重试。"
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let sub = args.next().unwrap_or_else(|| "help".to_string());
    let sh = Shell::new()?;

    match sub.as_str() {
        "check-all" => {
            eprintln!("\n==> cargo fmt --all -- --check");
            cmd!(sh, "cargo fmt --all -- --check").run()?;

            eprintln!("\n==> cargo clippy --workspace --all-targets");
            cmd!(sh, "cargo clippy --workspace --all-targets").run()?;

            eprintln!("\n==> cargo test --workspace");
            cmd!(sh, "cargo test --workspace").run()?;
        }
        "cov-scene" => {
            ensure_cargo_llvm_cov_available(&sh)?;

            cmd!(sh, "cargo llvm-cov -p vn-scene --all-features --html").run()?;

            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "cov-workspace" => {
            ensure_cargo_llvm_cov_available(&sh)?;

            // 排除 xtask，以免稀释信号
            cmd!(
                sh,
                "cargo llvm-cov --workspace --exclude xtask --all-features --html"
            )
            .run()?;

            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "script-check" => {
            let path = args.next();
            script_check(path.as_deref())?;
        }
        "help" | "-h" | "--help" => {
            print_help();
        }
        other => anyhow::bail!("unknown xtask subcommand: {other}"),
    }

    Ok(())
}

fn print_help() {
    eprintln!(
        r#"xtask - 开发辅助工具

USAGE:
  cargo xtask <command>

COMMANDS:
  check-all       运行 fmt、clippy、test 门禁检查
  cov-scene       运行 vn-scene 覆盖率报告
  cov-workspace   运行 workspace 覆盖率报告
  script-check    检查场景脚本

SCRIPT-CHECK:
  cargo xtask script-check [assets_root]

  不带参数：检查 assets/ 下所有 scene.json
  带路径参数：把该目录当作资源根目录检查

  检查内容：
    - manifest 与脚本的 JSON 格式
    - 缺少 end、end 之后的动作、无法识别的动作
    - 未定义的角色 / 立绘 / 背景 / 音轨
    - 选项与存档引用的脚本是否存在
    - 资源文件是否存在（背景/立绘/音频）

ALIASES (in .cargo/config.toml):
  cargo check-all     -> cargo xtask check-all
  cargo cov-scene     -> cargo xtask cov-scene
  cargo cov-workspace -> cargo xtask cov-workspace
  cargo script-check  -> cargo xtask script-check
"#
    );
}

//=============================================================================
// script-check 命令实现
//=============================================================================

/// 脚本检查结果
struct ScriptCheckResult {
    /// 检查的场景数量
    scenes_checked: usize,
    /// 检查的脚本数量
    scripts_checked: usize,
    /// 诊断结果
    diagnostics: DiagnosticResult,
    /// 缺失的资源文件
    missing_resources: Vec<MissingResource>,
}

/// 缺失的资源信息
struct MissingResource {
    manifest: String,
    resource_type: &'static str,
    path: String,
}

/// 执行脚本检查
fn script_check(path: Option<&str>) -> anyhow::Result<()> {
    let assets_root = PathBuf::from(path.unwrap_or("assets"));
    if !assets_root.is_dir() {
        anyhow::bail!(
            "资源目录不存在: {}\n请在 workspace 根目录运行，或指定资源目录",
            assets_root.display()
        );
    }

    let manifests = collect_manifests(&assets_root)?;
    if manifests.is_empty() {
        eprintln!("未找到场景 manifest（{}）", MANIFEST_FILE);
        return Ok(());
    }

    eprintln!("==> 检查 {} 个场景...\n", manifests.len());

    let source = FsSource::new(&assets_root);
    let mut result = ScriptCheckResult {
        scenes_checked: 0,
        scripts_checked: 0,
        diagnostics: DiagnosticResult::new(),
        missing_resources: Vec::new(),
    };

    for manifest in &manifests {
        check_scene(&source, manifest, &mut result);
    }

    print_check_result(&result);

    if result.diagnostics.has_errors() {
        anyhow::bail!("脚本检查发现错误");
    }

    Ok(())
}

/// 收集资源根目录下的所有场景 manifest（逻辑路径）
fn collect_manifests(assets_root: &Path) -> anyhow::Result<Vec<String>> {
    let mut manifests = Vec::new();
    for entry in WalkDir::new(assets_root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() || entry.file_name() != MANIFEST_FILE {
            continue;
        }
        let relative = entry.path().strip_prefix(assets_root)?;
        manifests.push(normalize_logical_path(&relative.to_string_lossy()));
    }
    Ok(manifests)
}

/// 检查单个场景
fn check_scene(source: &FsSource, manifest_path: &str, result: &mut ScriptCheckResult) {
    result.scenes_checked += 1;

    let report = analyze_scene(source, manifest_path);
    result.scripts_checked += report.scripts.len();
    for next in &report.next_scenes {
        if !source.exists(next) {
            result.diagnostics.push(Diagnostic::error(
                manifest_path,
                format!("end 指向的场景不存在: {}", next),
            ));
        }
    }
    result.diagnostics.merge(report.diagnostics);

    // manifest 本身的错误已经由 analyze_scene 报告
    let Ok(manifest) = SceneManifest::load(source, manifest_path) else {
        return;
    };
    let Ok(tables) = ResourceTables::load(source, &manifest) else {
        return;
    };

    let mut check = |resource_type: &'static str, path: &str| {
        if !source.exists(path) {
            result.missing_resources.push(MissingResource {
                manifest: manifest_path.to_string(),
                resource_type,
                path: path.to_string(),
            });
        }
    };
    for path in tables.backgrounds.values() {
        check("背景", path);
    }
    for entry in tables.characters.values() {
        for path in entry.sprites().values() {
            check("立绘", path);
        }
    }
    for path in tables.soundtrack.values() {
        check("音频", path);
    }
}

/// 输出检查结果
fn print_check_result(result: &ScriptCheckResult) {
    eprintln!("─────────────────────────────────────────────────────");
    eprintln!(
        "检查完成: {} 个场景, {} 个脚本",
        result.scenes_checked, result.scripts_checked
    );
    eprintln!();

    for diag in &result.diagnostics.diagnostics {
        eprintln!("{}", diag);
    }

    for mr in &result.missing_resources {
        eprintln!(
            "[WARN] {}: 资源不存在 [{}] {}",
            mr.manifest, mr.resource_type, mr.path
        );
    }

    let error_count = result.diagnostics.error_count();
    let warn_count = result.diagnostics.warn_count() + result.missing_resources.len();

    eprintln!();
    if error_count > 0 {
        eprintln!("❌ {} 个错误, {} 个警告", error_count, warn_count);
    } else if warn_count > 0 {
        eprintln!("⚠️  0 个错误, {} 个警告", warn_count);
    } else {
        eprintln!("✅ 检查通过，无错误");
    }
}
