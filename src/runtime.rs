use bevy::prelude::*;

use crate::components::GameConfig;
use crate::events::{BusEvent, EventFeed};
use crate::input::VirtualInput;
use crate::level::LevelData;
use crate::run::{GameRun, RunStatus};

/// Bevy-side mirror of the run status, so presentation systems can use
/// state-scoped run conditions.
#[derive(States, Default, Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum FlowState {
    #[default]
    Playing,
    Won,
    Dead,
}

/// The live run plus the level data it restarts from. Removing this
/// resource stops the fixed-step driver entirely.
#[derive(Resource)]
pub struct ActiveRun {
    pub run: GameRun,
    pub level: LevelData,
}

impl ActiveRun {
    pub fn new(level: LevelData, config: &GameConfig) -> Self {
        let run = GameRun::new(&level, config.character, config.tuning.clone());
        Self { run, level }
    }

    pub fn restart(&mut self, config: &GameConfig) {
        self.run = GameRun::new(&self.level, config.character, config.tuning.clone());
    }
}

pub struct RunDriverPlugin;

impl Plugin for RunDriverPlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<FlowState>()
            .add_systems(Startup, start_run)
            .add_systems(
                FixedUpdate,
                drive_run.run_if(resource_exists::<ActiveRun>),
            )
            .add_systems(
                Update,
                (
                    sync_flow_state.run_if(resource_exists::<ActiveRun>),
                    handle_restart,
                    handle_exit,
                ),
            );
    }
}

fn start_run(mut commands: Commands, config: Res<GameConfig>, mut feed: ResMut<EventFeed>) {
    let mut level = load_level(config.level_path.as_deref());
    for note in level.sanitize() {
        warn!("[Ravine level] {}", note);
    }
    let run = GameRun::new(&level, config.character, config.tuning.clone());
    feed.publish(
        BusEvent::RunStarted {
            character: config.character,
            restart: false,
        },
        run.player().map(|p| p.id),
    );
    info!(
        "[Ravine] Run started as {} ({}x{} tiles)",
        config.character.label(),
        level.width,
        level.height
    );
    commands.insert_resource(ActiveRun { run, level });
}

/// Level files are advisory; anything unreadable falls back to the
/// built-in level so the app always boots into something playable.
pub(crate) fn load_level(path: Option<&str>) -> LevelData {
    let Some(path) = path else {
        return LevelData::demo();
    };
    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str::<LevelData>(&contents) {
            Ok(level) => {
                info!("[Ravine level] Loaded {}", path);
                level
            }
            Err(e) => {
                warn!(
                    "[Ravine level] Failed to parse {}: {}; using the built-in level",
                    path, e
                );
                LevelData::demo()
            }
        },
        Err(e) => {
            warn!(
                "[Ravine level] Failed to read {}: {}; using the built-in level",
                path, e
            );
            LevelData::demo()
        }
    }
}

/// One fixed tick: drain buffered input edges, step the run, publish its
/// events onto the feed.
fn drive_run(
    mut active: ResMut<ActiveRun>,
    mut input: ResMut<VirtualInput>,
    mut feed: ResMut<EventFeed>,
) {
    let frame = input.take_frame();
    let events = active.run.step(&frame);
    if events.is_empty() {
        return;
    }
    let player_id = active.run.player().map(|p| p.id);
    for event in events {
        feed.publish(BusEvent::Run(event), player_id);
    }
}

fn sync_flow_state(
    active: Res<ActiveRun>,
    state: Res<State<FlowState>>,
    mut next_state: ResMut<NextState<FlowState>>,
) {
    let desired = match active.run.status {
        RunStatus::Running => FlowState::Playing,
        RunStatus::Won => FlowState::Won,
        RunStatus::Dead => FlowState::Dead,
    };
    if state.get() != &desired {
        next_state.set(desired);
    }
}

fn handle_restart(
    keys: Option<Res<ButtonInput<KeyCode>>>,
    config: Res<GameConfig>,
    active: Option<ResMut<ActiveRun>>,
    mut feed: ResMut<EventFeed>,
) {
    let Some(keys) = keys else {
        return;
    };
    let Some(mut active) = active else {
        return;
    };
    if keys.just_pressed(KeyCode::KeyR) {
        active.restart(&config);
        feed.publish(
            BusEvent::RunStarted {
                character: config.character,
                restart: true,
            },
            None,
        );
        info!("[Ravine] Run restarted");
    }
}

/// Escape tears the run down: one `RunExit` entry on the feed, the driver
/// loses its resource, the app closes. In-flight timers are simply dropped.
fn handle_exit(
    mut commands: Commands,
    keys: Option<Res<ButtonInput<KeyCode>>>,
    mut feed: ResMut<EventFeed>,
    mut exit: EventWriter<AppExit>,
) {
    let Some(keys) = keys else {
        return;
    };
    if keys.just_pressed(KeyCode::Escape) {
        feed.publish(BusEvent::RunExit, None);
        commands.remove_resource::<ActiveRun>();
        exit.send(AppExit::Success);
    }
}
