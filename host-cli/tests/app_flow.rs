//! # 宿主流程集成测试
//!
//! 在临时目录中搭建真实的资源树，驱动主菜单 → 游戏 → 暂停 → 场景切换 → 存档 / 读档。

use std::fs;
use std::path::Path;
use std::rc::Rc;

use host_cli::{App, AppConfig, AppError, FsSource, GameMode, Input, MenuItem, SaveManager};
use tempfile::TempDir;
use vn_scene::{Backend, Command, LoadError};

const CHARACTERS: &str = r#"{
    "Kaiser": ["Kaiser", {"neutral": "images/kaiser.png"}, [200, 30, 30]],
    "effect": ["", {}, [0, 0, 255]]
}"#;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    /// 创建资源树，`data/01/start.json` 由调用方提供
    fn new(start: &str) -> Self {
        let fixture = Self {
            dir: tempfile::tempdir().unwrap(),
        };
        fixture.scene_dir("data/01", Some("Hall"));
        fixture.write("data/01/start.json", start);
        fixture.image("images/kaiser.png", 30, 60);
        fixture.image("images/hall.png", 64, 36);
        fixture.image("data/images/button.png", 30, 6);
        fixture.image("data/images/bbutton.png", 40, 8);
        fixture.write("music/theme.ogg", "");
        fixture
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    /// 写入一个场景目录的 manifest 和资源表
    fn scene_dir(&self, prefix: &str, background: Option<&str>) {
        let background = background
            .map(|key| format!(r#", "background": "{}""#, key))
            .unwrap_or_default();
        self.write(
            &format!("{}/scene.json", prefix),
            &format!(
                r#"{{
                    "name": "Visual Novel",
                    "prefix": "{}/",
                    "characters": "characters.json",
                    "backgrounds": "backgrounds.json",
                    "soundtrack": "soundtrack.json",
                    "start": "start.json"{}
                }}"#,
                prefix, background
            ),
        );
        self.write(&format!("{}/characters.json", prefix), CHARACTERS);
        self.write(
            &format!("{}/backgrounds.json", prefix),
            r#"{"Hall": "images/hall.png"}"#,
        );
        self.write(
            &format!("{}/soundtrack.json", prefix),
            r#"{"Theme": "music/theme.ogg"}"#,
        );
    }

    fn write(&self, path: &str, content: &str) {
        let full = self.root().join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }

    fn image(&self, path: &str, w: u32, h: u32) {
        let full = self.root().join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        image::RgbaImage::new(w, h).save(full).unwrap();
    }

    fn save_path(&self) -> std::path::PathBuf {
        self.root().join("saves/save.json")
    }

    fn app(&self) -> App {
        let source = Rc::new(FsSource::new(self.root()));
        let backend = Backend::new(source).with_settings(AppConfig::default().scene_settings());
        App::new(backend, "data/01/scene.json", SaveManager::new(self.save_path()))
    }
}

/// 推进足够长的时间，让逐字显示完成
fn settle(app: &mut App) -> Vec<Command> {
    app.frame(None, 60_000.0).unwrap()
}

fn text(app: &App) -> String {
    app.scene().unwrap().text_box().text().to_string()
}

#[test]
fn test_start_game_runs_first_beat() {
    let fixture = Fixture::new(
        r#"[
            [["music", "Theme"], ["dialogue", ["Kaiser", "Welcome."]]],
            [["end", ""]]
        ]"#,
    );
    let mut app = fixture.app();
    assert_eq!(app.mode(), GameMode::MainMenu);
    assert!(app.scene().is_none());

    let commands = app.frame(Some(Input::Menu(MenuItem::StartGame)), 0.0).unwrap();
    assert_eq!(app.mode(), GameMode::Running);
    assert_eq!(
        commands,
        vec![
            Command::ShowBackground {
                path: "images/hall.png".to_string()
            },
            Command::StopTrack,
            Command::PlayTrack {
                path: "music/theme.ogg".to_string()
            },
        ]
    );
    assert_eq!(app.background(), Some("images/hall.png"));
    assert_eq!(app.track(), Some("music/theme.ogg"));
    assert_eq!(text(&app), "Welcome.");
    assert_eq!(app.scene().unwrap().cursor(), 1);
}

#[test]
fn test_menu_buttons_outside_their_mode_are_ignored() {
    let fixture = Fixture::new(r#"[[["dialogue", ["Kaiser", "Hi."]]], [["end", ""]]]"#);
    let mut app = fixture.app();

    app.frame(Some(Input::Menu(MenuItem::Continue)), 0.0).unwrap();
    assert_eq!(app.mode(), GameMode::MainMenu);

    app.frame(Some(Input::Menu(MenuItem::StartGame)), 0.0).unwrap();
    app.frame(Some(Input::Menu(MenuItem::LoadGame)), 0.0).unwrap();
    assert_eq!(app.mode(), GameMode::Running);
    assert_eq!(app.scene().unwrap().cursor(), 1);
}

#[test]
fn test_escape_pauses_and_blocks_input() {
    let fixture = Fixture::new(
        r#"[
            [["dialogue", ["Kaiser", "One."]]],
            [["dialogue", ["Kaiser", "Two."]]],
            [["end", ""]]
        ]"#,
    );
    let mut app = fixture.app();
    app.frame(Some(Input::Menu(MenuItem::StartGame)), 0.0).unwrap();
    settle(&mut app);

    app.frame(Some(Input::Escape), 0.0).unwrap();
    assert_eq!(app.mode(), GameMode::Paused);

    // 暂停时点击不推进
    app.frame(Some(Input::Advance), 0.0).unwrap();
    assert_eq!(app.scene().unwrap().cursor(), 1);

    app.frame(Some(Input::Escape), 0.0).unwrap();
    assert_eq!(app.mode(), GameMode::Running);
    app.frame(Some(Input::Advance), 0.0).unwrap();
    assert_eq!(text(&app), "Two.");

    app.frame(Some(Input::Escape), 0.0).unwrap();
    app.frame(Some(Input::Menu(MenuItem::Continue)), 0.0).unwrap();
    assert_eq!(app.mode(), GameMode::Running);
}

#[test]
fn test_scene_chain_carries_player_state() {
    let fixture = Fixture::new(
        r#"[
            [["money", "100"]],
            [["end", "data/02/scene.json"]]
        ]"#,
    );
    fixture.scene_dir("data/02", None);
    fixture.write(
        "data/02/start.json",
        r#"[[["update", "money"]], [["end", ""]]]"#,
    );

    let mut app = fixture.app();
    app.frame(Some(Input::Menu(MenuItem::StartGame)), 0.0).unwrap();
    assert_eq!(text(&app), "You earned 100 yen for finishing this scene");
    settle(&mut app);

    app.frame(Some(Input::Advance), 0.0).unwrap();
    let scene = app.scene().unwrap();
    assert_eq!(scene.manifest_path(), "data/02/scene.json");
    assert_eq!(scene.state().money, 100);
    assert_eq!(text(&app), "Total Money: 100 Yen");
    // 第二个场景没有初始背景，沿用上一个
    assert_eq!(app.background(), Some("images/hall.png"));

    settle(&mut app);
    let commands = app.frame(Some(Input::Advance), 0.0).unwrap();
    assert_eq!(app.mode(), GameMode::MainMenu);
    assert!(app.scene().is_none());
    assert!(commands.contains(&Command::StopTrack));
}

#[test]
fn test_save_then_load_game() {
    let fixture = Fixture::new(
        r#"[
            [["money", "40"], ["save", "resume.json"]],
            [["end", ""]]
        ]"#,
    );
    fixture.write(
        "data/01/resume.json",
        r#"[[["update", "money"]], [["end", ""]]]"#,
    );

    let mut app = fixture.app();
    app.frame(Some(Input::Menu(MenuItem::StartGame)), 0.0).unwrap();
    assert!(app.saves().exists());

    let record = SaveManager::new(fixture.save_path()).load().unwrap();
    assert_eq!(record.resume(), "resume.json");
    assert_eq!(record.manifest.player.as_ref().unwrap().money, 40);

    app.frame(Some(Input::Escape), 0.0).unwrap();
    app.frame(Some(Input::Menu(MenuItem::MainMenu)), 0.0).unwrap();
    assert_eq!(app.mode(), GameMode::MainMenu);
    assert!(app.scene().is_none());

    app.frame(Some(Input::Menu(MenuItem::LoadGame)), 0.0).unwrap();
    assert_eq!(app.mode(), GameMode::Running);
    let scene = app.scene().unwrap();
    assert_eq!(scene.script().id, "data/01/resume.json");
    assert_eq!(scene.state().money, 40);
    assert_eq!(text(&app), "Total Money: 40 Yen");
}

#[test]
fn test_load_game_without_save_stays_in_menu() {
    let fixture = Fixture::new(r#"[[["end", ""]]]"#);
    let mut app = fixture.app();

    app.frame(Some(Input::Menu(MenuItem::LoadGame)), 0.0).unwrap();
    assert_eq!(app.mode(), GameMode::MainMenu);
    assert!(app.scene().is_none());
}

#[test]
fn test_missing_sprite_is_fatal() {
    let fixture = Fixture::new(r#"[[["end", ""]]]"#);
    fs::remove_file(fixture.root().join("images/kaiser.png")).unwrap();
    let mut app = fixture.app();

    let err = app
        .frame(Some(Input::Menu(MenuItem::StartGame)), 0.0)
        .unwrap_err();
    assert_eq!(
        err,
        AppError::Load(LoadError::NotFound {
            path: "images/kaiser.png".to_string()
        })
    );
    assert_eq!(app.mode(), GameMode::MainMenu);
}

#[test]
fn test_auto_play_leaves_store_and_finishes() {
    let fixture = Fixture::new(
        r#"[
            [["dialogue", ["Kaiser", "Shopping time."]]],
            [["item", [
                ["Bag of Books", "30", ["ability", "2"]],
                ["Exit Store", "", "after.json"]
            ]]],
            [["end", ""]]
        ]"#,
    );
    fixture.write(
        "data/01/after.json",
        r#"[
            [["choice", [["Stay", "stay.json"], ["Leave", "leave.json"]]]],
            [["end", ""]]
        ]"#,
    );
    fixture.write(
        "data/01/stay.json",
        r#"[[["dialogue", ["Kaiser", "Good choice."]]], [["end", ""]]]"#,
    );

    let mut app = fixture.app();
    let mut started = false;
    let mut seen_texts = Vec::new();
    for _ in 0..10_000 {
        if started && app.mode() == GameMode::MainMenu {
            break;
        }
        let input = app.auto_input();
        started |= matches!(input, Some(Input::Menu(_)));
        app.frame(input, 16.0).unwrap();
        if let Some(scene) = app.scene() {
            let text = scene.text_box().text().to_string();
            if !text.is_empty() && seen_texts.last() != Some(&text) {
                seen_texts.push(text);
            }
        }
    }

    assert!(started);
    assert_eq!(app.mode(), GameMode::MainMenu);
    assert_eq!(seen_texts, ["Shopping time.", "Good choice."]);
}
