//! # 场景流程集成测试
//!
//! 在内存资源上驱动完整场景：逐 beat 推进、角色进退场、选择分支、
//! 商店购买、存档和场景切换。不依赖文件系统或渲染。

use std::rc::Rc;

use vn_scene::{
    Backend, Command, LoadError, MemorySource, OptionAction, PlayerState, Point, RevealPhase,
    Scene, StepOutcome, TextStyle,
};

const MANIFEST: &str = r#"{
    "name": "Visual Novel",
    "prefix": "data/01/",
    "characters": "characters.json",
    "backgrounds": "backgrounds.json",
    "soundtrack": "soundtrack.json",
    "start": "start.json",
    "background": "Prologue"
}"#;

const CHARACTERS: &str = r#"{
    "Kaiser": ["Kaiser", {"neutral": "images/kaiser/neutral.png", "angry": "images/kaiser/angry.png"}, [200, 30, 30]],
    "Mina": ["Mina", {"smile": "images/mina/smile.png"}, [30, 120, 200]],
    "effect": ["", {}, [0, 0, 255]]
}"#;

/// 创建测试资源，`start.json` 和其他脚本由调用方提供
fn fixture(scripts: &[(&str, &str)]) -> MemorySource {
    let mut source = MemorySource::new()
        .with_text("data/01/scene.json", MANIFEST)
        .with_text("data/01/characters.json", CHARACTERS)
        .with_text(
            "data/01/backgrounds.json",
            r#"{"Prologue": "images/bg/prologue.png", "Classroom": "images/bg/classroom.png"}"#,
        )
        .with_text("data/01/soundtrack.json", r#"{"Theme": "music/theme.ogg"}"#)
        .with_text("music/theme.ogg", "")
        .with_image("images/kaiser/neutral.png", 300.0, 600.0)
        .with_image("images/kaiser/angry.png", 300.0, 600.0)
        .with_image("images/mina/smile.png", 250.0, 550.0)
        .with_image("images/bg/prologue.png", 1280.0, 720.0)
        .with_image("images/bg/classroom.png", 1280.0, 720.0)
        .with_image("data/images/button.png", 300.0, 60.0)
        .with_image("data/images/bbutton.png", 400.0, 80.0);
    for (name, json) in scripts {
        source.insert_text(&format!("data/01/{}", name), *json);
    }
    source
}

fn load(scripts: &[(&str, &str)]) -> Scene {
    let backend = Backend::new(Rc::new(fixture(scripts)));
    Scene::load("data/01/scene.json", backend, None).unwrap()
}

/// 推进时间直到逐字显示完成
fn finish_reveal(scene: &mut Scene) {
    for _ in 0..1000 {
        if !scene.text_box().is_revealing() {
            return;
        }
        scene.update(16.0);
    }
}

#[test]
fn test_initial_background_command() {
    let mut scene = load(&[("start.json", r#"[[["end", ""]]]"#)]);
    assert_eq!(scene.background(), Some("images/bg/prologue.png"));
    assert_eq!(
        scene.drain_commands(),
        vec![Command::ShowBackground {
            path: "images/bg/prologue.png".to_string()
        }]
    );
    assert!(scene.drain_commands().is_empty());
}

#[test]
fn test_steps_until_end_equal_script_length() {
    let mut scene = load(&[(
        "start.json",
        r#"[
            [["background", "Classroom"], ["music", "Theme"]],
            [["enter", ["Kaiser", "neutral"]], ["dialogue", ["Kaiser", "You're late."]]],
            [["thought", ["Mina", "Not again..."]]],
            [["end", ""]]
        ]"#,
    )]);

    let mut steps = 0;
    let outcome = loop {
        steps += 1;
        let outcome = scene.step();
        if outcome.is_ended() {
            break outcome;
        }
        assert!(steps < 100);
    };

    assert_eq!(steps, scene.script().len());
    assert_eq!(outcome, StepOutcome::Ended { next: None });
    // end 不推进游标
    assert_eq!(scene.cursor(), 3);
}

#[test]
fn test_click_skips_reveal_then_advances() {
    let mut scene = load(&[(
        "start.json",
        r#"[
            [["dialogue", ["Kaiser", "A rather long line of dialogue."]]],
            [["action", ["Kaiser", "He sighs."]]],
            [["end", ""]]
        ]"#,
    )]);
    scene.step();
    assert_eq!(scene.text_box().phase(), RevealPhase::Revealing);
    assert_eq!(scene.text_box().speaker().unwrap().name, "Kaiser");

    // 第一次点击只跳过动画
    let outcome = scene.click(Point::new(10.0, 10.0)).unwrap();
    assert_eq!(outcome, StepOutcome::Continue);
    assert_eq!(scene.cursor(), 1);
    assert_eq!(scene.text_box().phase(), RevealPhase::Complete);

    // 第二次点击推进
    scene.click(Point::new(10.0, 10.0)).unwrap();
    assert_eq!(scene.cursor(), 2);
    assert_eq!(scene.text_box().style(), TextStyle::Action);

    finish_reveal(&mut scene);
    let outcome = scene.click(Point::new(10.0, 10.0)).unwrap();
    assert!(outcome.is_ended());
}

#[test]
fn test_music_commands() {
    let mut scene = load(&[("start.json", r#"[[["music", "Theme"]], [["end", ""]]]"#)]);
    scene.drain_commands();
    scene.step();
    assert_eq!(
        scene.drain_commands(),
        vec![
            Command::StopTrack,
            Command::PlayTrack {
                path: "music/theme.ogg".to_string()
            }
        ]
    );
}

#[test]
fn test_enter_then_exit_removes_character() {
    let mut scene = load(&[(
        "start.json",
        r#"[
            [["enter", ["Kaiser", "neutral"]], ["exit", "Kaiser"]],
            [["end", ""]]
        ]"#,
    )]);
    scene.step();
    assert_eq!(scene.on_screen_names(), ["Kaiser".to_string()]);

    let mut frames = 0;
    while !scene.on_screen_names().is_empty() {
        scene.update(16.0);
        frames += 1;
        assert!(frames < 2000, "角色没有离开屏幕");
    }

    let kaiser = scene.character("Kaiser").unwrap();
    assert!(kaiser.rect().right() <= 0.0);
    assert!(kaiser.is_exiting());
}

#[test]
fn test_characters_laid_out_in_row() {
    let mut scene = load(&[(
        "start.json",
        r#"[
            [["enter", ["Kaiser", "neutral"]], ["enter", ["Mina", "smile"]]],
            [["look", ["Kaiser", "angry"]]],
            [["end", ""]]
        ]"#,
    )]);
    scene.step();

    // 总宽 300 + 50 + 250 = 600，居中于 640 -> 从 340 开始，底边 800
    let targets: Vec<_> = scene.on_screen().map(|c| c.target()).collect();
    assert_eq!(targets[0].x, 340.0);
    assert_eq!(targets[0].bottom(), 800.0);
    assert_eq!(targets[1].x, 690.0);
    assert_eq!(targets[1].bottom(), 800.0);

    scene.step();
    assert_eq!(scene.character("Kaiser").unwrap().sprite_key(), Some("angry"));
    assert_eq!(scene.on_screen_names().len(), 2);
}

#[test]
fn test_reenter_during_exit() {
    let mut scene = load(&[(
        "start.json",
        r#"[
            [["enter", ["Kaiser", "neutral"]]],
            [["exit", "Kaiser"]],
            [["enter", ["Kaiser", "angry"]]],
            [["end", ""]]
        ]"#,
    )]);
    scene.step();
    scene.step();
    scene.update(16.0);
    scene.step();

    assert_eq!(scene.on_screen_names(), ["Kaiser".to_string()]);
    assert!(!scene.character("Kaiser").unwrap().is_exiting());
    for _ in 0..2000 {
        scene.update(16.0);
    }
    assert_eq!(scene.on_screen_names().len(), 1);
}

#[test]
fn test_stat_feedback_messages() {
    let mut scene = load(&[(
        "start.json",
        r#"[
            [["affinity", ["Kaiser", "5", "+"]]],
            [["infamy", ["2", "-"]]],
            [["money", "300"]],
            [["update", "money"]],
            [["update", ["affinity", "Kaiser"]]],
            [["update", ["affinity", "Mina"]]],
            [["end", ""]]
        ]"#,
    )]);

    let mut messages = Vec::new();
    for _ in 0..6 {
        scene.step();
        assert_eq!(scene.text_box().style(), TextStyle::Effect);
        messages.push(scene.text_box().text().to_string());
    }

    insta::assert_debug_snapshot!(messages, @r#"
    [
        "Affinity Points:+5 Kaiser",
        "Infamy Points:-2",
        "You earned 300 yen for finishing this scene",
        "Total Money: 300 Yen",
        "Total Affinity for Kaiser is 5",
        "Total Affinity for Mina is 0",
    ]
    "#);
    assert_eq!(scene.state().infamy_points, -2);
    assert_eq!(scene.state().money, 300);
}

#[test]
fn test_script_errors_do_not_stop_beat() {
    let mut scene = load(&[(
        "start.json",
        r#"[
            [
                ["enter", ["Nobody", "neutral"]],
                ["trust", ["lots", "+"]],
                ["shake", 3],
                ["enter", "Kaiser"],
                ["ability", ["4", "+"]]
            ],
            [["end", ""]]
        ]"#,
    )]);
    assert_eq!(scene.step(), StepOutcome::Continue);
    assert_eq!(scene.state().kaiser_trust, 0);
    assert_eq!(scene.state().ability_points, 4);
    assert!(scene.on_screen_names().is_empty());
}

#[test]
fn test_money_overflow_is_skipped() {
    let mut scene = load(&[(
        "start.json",
        r#"[
            [["money", "9223372036854775807"]],
            [["money", "1"], ["infamy", ["3", "+"]]],
            [["money", "-9223372036854775808"]],
            [["end", ""]]
        ]"#,
    )]);
    assert_eq!(scene.step(), StepOutcome::Continue);
    assert_eq!(scene.state().money, i64::MAX);

    // 溢出的动作被跳过，同一 beat 的后续动作照常执行
    assert_eq!(scene.step(), StepOutcome::Continue);
    assert_eq!(scene.state().money, i64::MAX);
    assert_eq!(scene.state().infamy_points, 3);

    assert_eq!(scene.step(), StepOutcome::Continue);
    assert_eq!(scene.state().money, -1);
    assert_eq!(scene.step(), StepOutcome::Ended { next: None });
}

#[test]
fn test_missing_end_runs_empty_beat() {
    let mut scene = load(&[("start.json", r#"[[["ability", ["1", "+"]]]]"#)]);
    assert_eq!(scene.step(), StepOutcome::Continue);
    assert_eq!(scene.step(), StepOutcome::Continue);
    assert_eq!(scene.step(), StepOutcome::Continue);
    assert_eq!(scene.cursor(), 3);
    assert_eq!(scene.state().ability_points, 1);
}

#[test]
fn test_choice_layout_and_branch() {
    let mut scene = load(&[
        (
            "start.json",
            r#"[
                [["choice", [["Go left", "left.json"], ["Go right", "right.json"]]]],
                [["end", ""]]
            ]"#,
        ),
        ("left.json", r#"[[["end", ""]]]"#),
        (
            "right.json",
            r#"[[["dialogue", ["Mina", "This way!"]]], [["end", "data/02/scene.json"]]]"#,
        ),
    ]);
    scene.step();
    assert!(scene.choice_pending());

    let options = scene.options().to_vec();
    assert_eq!(options.len(), 2);
    assert_eq!(options[0].rect.x, options[1].rect.x);
    assert_eq!(options[1].rect.y - options[0].rect.bottom(), 10.0);

    // 有选项时点击空白处什么也不做
    assert_eq!(
        scene.click(Point::new(0.0, 0.0)).unwrap(),
        StepOutcome::Continue
    );
    assert!(scene.choice_pending());

    let center = options[1].rect.center();
    let outcome = scene.click(center).unwrap();
    assert_eq!(outcome, StepOutcome::Continue);
    assert!(!scene.choice_pending());
    assert!(scene.options().is_empty());
    assert_eq!(scene.script().id, "data/01/right.json");
    // 分支后立即执行了第一个 beat
    assert_eq!(scene.cursor(), 1);
    assert_eq!(scene.text_box().speaker().unwrap().name, "Mina");

    finish_reveal(&mut scene);
    assert_eq!(
        scene.click(Point::new(0.0, 0.0)).unwrap(),
        StepOutcome::Ended {
            next: Some("data/02/scene.json".to_string())
        }
    );
}

#[test]
fn test_branch_into_end_ends_scene() {
    let mut scene = load(&[
        (
            "start.json",
            r#"[[["bchoice", [["Leave", "leave.json"]]]], [["end", ""]]]"#,
        ),
        ("leave.json", r#"[[["end", ""]]]"#),
    ]);
    scene.step();
    assert_eq!(scene.choose(0).unwrap(), StepOutcome::Ended { next: None });
}

#[test]
fn test_branch_to_missing_script_is_load_error() {
    let mut scene = load(&[(
        "start.json",
        r#"[[["choice", [["Nowhere", "missing.json"]]]], [["end", ""]]]"#,
    )]);
    scene.step();
    assert!(matches!(scene.choose(0), Err(LoadError::NotFound { .. })));
}

const STORE: &str = r#"[
    [["item", [
        ["Bag of Books", "30", ["ability", "2"]],
        ["Gelato", "15", ["affinity", "3", "Mina"]],
        ["Briefcase", "40", ["trust", "1"]],
        ["Surprise Gift", "20", ["reputation", "2"]],
        ["Exit Store", "", "after_store.json"]
    ]]],
    [["end", ""]]
]"#;

#[test]
fn test_store_layout_and_purchase() {
    let backend = Backend::new(Rc::new(fixture(&[
        ("start.json", STORE),
        ("after_store.json", r#"[[["update", "ability"]], [["end", ""]]]"#),
    ])));
    let mut carried = PlayerState::new();
    carried.money = 50;
    let mut scene = Scene::load("data/01/scene.json", backend, Some(carried)).unwrap();
    scene.step();

    let options = scene.options();
    assert_eq!(options.len(), 5);
    let left = options.iter().filter(|o| o.rect.x == 100.0).count();
    let right = options.iter().filter(|o| o.rect.x == 680.0).count();
    assert_eq!((left, right), (3, 2));
    assert!(matches!(options[4].action, OptionAction::Branch { .. }));

    let outcome = scene.choose(0).unwrap();
    assert_eq!(outcome, StepOutcome::Continue);
    assert_eq!(scene.state().money, 20);
    assert_eq!(scene.state().ability_points, 2);
    assert!(scene.text_box().text().contains("20"));
    // 购买后商店仍然打开
    assert!(scene.choice_pending());

    scene.choose(4).unwrap();
    assert!(!scene.choice_pending());
    assert_eq!(scene.text_box().text(), "Total Ability Points: 2");
}

#[test]
fn test_store_with_negative_money() {
    let backend = Backend::new(Rc::new(fixture(&[("start.json", STORE)])));
    let mut carried = PlayerState::new();
    carried.money = -5;
    let mut scene = Scene::load("data/01/scene.json", backend, Some(carried)).unwrap();
    scene.step();

    scene.choose(1).unwrap();
    assert_eq!(scene.text_box().text(), "You do not have enough money!");
    assert_eq!(scene.state().money, -5);
    assert_eq!(scene.state().affinity("Mina"), 0);
}

#[test]
fn test_save_command() {
    let mut scene = load(&[(
        "start.json",
        r#"[[["money", "120"], ["save", "chapter2.json"]], [["end", ""]]]"#,
    )]);
    scene.drain_commands();
    scene.step();

    let commands = scene.drain_commands();
    let [Command::WriteSave { record }] = commands.as_slice() else {
        panic!("expected one save command, got {:?}", commands);
    };
    assert_eq!(record.resume(), "chapter2.json");
    assert_eq!(record.manifest.prefix, "data/01/");
    assert_eq!(record.manifest.player.as_ref().unwrap().money, 120);
}

#[test]
fn test_load_from_save_record() {
    let mut scene = load(&[
        (
            "start.json",
            r#"[[["affinity", ["Kaiser", "7", "+"]], ["save", "chapter2.json"]], [["end", ""]]]"#,
        ),
        ("chapter2.json", r#"[[["update", ["affinity", "Kaiser"]]], [["end", ""]]]"#),
    ]);
    scene.step();
    let record = scene
        .drain_commands()
        .into_iter()
        .find_map(|cmd| match cmd {
            Command::WriteSave { record } => Some(record),
            _ => None,
        })
        .unwrap();
    let backend = scene.backend().clone();

    let mut restored =
        Scene::from_manifest(record.manifest, "data/01/save.json", backend, None).unwrap();
    assert_eq!(restored.script().id, "data/01/chapter2.json");
    restored.step();
    assert_eq!(restored.text_box().text(), "Total Affinity for Kaiser is 7");
}

#[test]
fn test_missing_sprite_image_is_load_error() {
    let source = MemorySource::new()
        .with_text("data/01/scene.json", MANIFEST)
        .with_text(
            "data/01/characters.json",
            r#"{"Kaiser": ["Kaiser", {"neutral": "images/kaiser/neutral.png"}, [1, 2, 3]]}"#,
        )
        .with_text("data/01/backgrounds.json", "{}")
        .with_text("data/01/soundtrack.json", "{}")
        .with_text("data/01/start.json", r#"[[["end", ""]]]"#);
    let backend = Backend::new(Rc::new(source));

    let result = Scene::load("data/01/scene.json", backend, None);
    assert!(matches!(
        result,
        Err(LoadError::NotFound { ref path }) if path == "images/kaiser/neutral.png"
    ));
}
