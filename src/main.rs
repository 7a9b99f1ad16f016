mod abilities;
mod camera;
mod character;
mod collision;
mod components;
mod entity;
mod events;
mod geometry;
mod input;
mod level;
mod particles;
mod render;
mod run;
mod runtime;
mod sim_runner;
mod tiles;
mod tuning;

use std::time::Duration;

use bevy::prelude::*;
use components::{GameConfig, HeadlessMode};

#[derive(serde::Deserialize, Default)]
struct StartupConfig {
    window_title: Option<String>,
    window_width: Option<f32>,
    window_height: Option<f32>,
    background_color: Option<[f32; 3]>,
    level: Option<String>,
    character: Option<String>,
    tuning: Option<tuning::Tuning>,
}

fn load_startup_config() -> StartupConfig {
    let path = std::env::var("RAVINE_GAME_CONFIG")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "game.json".to_string());
    match std::fs::read_to_string(&path) {
        Ok(contents) => match serde_json::from_str::<StartupConfig>(&contents) {
            Ok(cfg) => {
                println!("[Ravine] Loaded startup config from {}", path);
                cfg
            }
            Err(e) => {
                eprintln!("[Ravine] Failed to parse {}: {}", path, e);
                StartupConfig::default()
            }
        },
        Err(_) => StartupConfig::default(),
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let headless = args.iter().any(|a| a == "--headless");

    // --sim <request.json>: scripted run against the engine, no app loop;
    // the result JSON goes to stdout.
    if let Some(pos) = args.iter().position(|a| a == "--sim") {
        let Some(path) = args.get(pos + 1) else {
            eprintln!("[Ravine sim] --sim needs a request file path");
            std::process::exit(2);
        };
        match run_sim_file(path) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("[Ravine sim] {}", e);
                std::process::exit(2);
            }
        }
        return;
    }

    let startup_config = load_startup_config();
    let mut app = App::new();

    app.insert_resource(HeadlessMode(headless));

    if headless {
        // No window, no rendering: ECS plus scripted input only.
        app.add_plugins(MinimalPlugins);
        app.add_plugins(bevy::state::app::StatesPlugin);
        println!("[Ravine] Starting in HEADLESS mode");
    } else {
        let window_title = startup_config
            .window_title
            .clone()
            .unwrap_or_else(|| "Ravine".to_string());
        let window_width = startup_config.window_width.unwrap_or(960.0);
        let window_height = startup_config.window_height.unwrap_or(540.0);

        app.add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: window_title,
                resolution: (window_width, window_height).into(),
                present_mode: bevy::window::PresentMode::AutoVsync,
                ..default()
            }),
            ..default()
        }));
        let bg = startup_config.background_color.unwrap_or([0.08, 0.1, 0.16]);
        app.insert_resource(ClearColor(Color::srgb(bg[0], bg[1], bg[2])));
        app.add_plugins(render::RenderPlugin);
        println!("[Ravine] Starting in WINDOWED mode");
    }

    let config = GameConfig {
        character: startup_config
            .character
            .as_deref()
            .and_then(character::CharacterId::parse)
            .unwrap_or(character::CharacterId::Ember),
        level_path: startup_config.level,
        tuning: startup_config.tuning.unwrap_or_default(),
    };
    println!("[Ravine] Character: {}", config.character.label());

    app.insert_resource(config)
        .insert_resource(Time::<Fixed>::from_hz(60.0))
        // A stall never schedules more than a quarter second of catch-up
        // ticks in one frame.
        .insert_resource(Time::<Virtual>::from_max_delta(Duration::from_millis(250)))
        .add_plugins(input::InputPlugin)
        .add_plugins(events::EventFeedPlugin)
        .add_plugins(runtime::RunDriverPlugin)
        .add_plugins(camera::CameraPlugin)
        .add_plugins(particles::ParticlesPlugin);

    app.run();
}

fn run_sim_file(path: &str) -> Result<String, String> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| format!("failed to read {}: {}", path, e))?;
    let request: sim_runner::SimulationRequest =
        serde_json::from_str(&contents).map_err(|e| format!("failed to parse {}: {}", path, e))?;
    let result = sim_runner::run_simulation(&request);
    serde_json::to_string_pretty(&result).map_err(|e| format!("failed to encode result: {}", e))
}
