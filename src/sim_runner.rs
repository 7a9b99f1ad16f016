use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::character::CharacterId;
use crate::entity::Form;
use crate::input::InputFrame;
use crate::level::LevelData;
use crate::run::{GameRun, RunEvent, RunStatus};
use crate::runtime;
use crate::tuning::Tuning;

/// Headless scripted runs against the real engine: decode a timeline of
/// held actions into per-tick input frames, step until the run resolves,
/// and report a trace plus every event the run emitted. Used by the
/// `--sim` CLI mode.
#[derive(Deserialize, Clone)]
pub struct SimulationRequest {
    /// Inline level; wins over `level_path` when both are set.
    #[serde(default)]
    pub level: Option<LevelData>,
    #[serde(default)]
    pub level_path: Option<String>,
    #[serde(default)]
    pub character: Option<String>,
    pub inputs: Vec<SimInput>,
    pub max_frames: u32,
    #[serde(default = "default_record_interval")]
    pub record_interval: u32,
}

fn default_record_interval() -> u32 {
    1
}

/// `action` is held from `frame` for `duration` ticks (0 means 1).
/// Jump and ability edges are derived from the hold timeline, so a long
/// "jump" hold still fires once.
#[derive(Deserialize, Clone)]
pub struct SimInput {
    pub frame: u32,
    pub action: String,
    #[serde(default)]
    pub duration: u32,
}

#[derive(Serialize, Clone)]
pub struct SimulationResult {
    pub outcome: String,
    pub frames_elapsed: u32,
    pub trace: Vec<TraceFrame>,
    pub events: Vec<SimEvent>,
}

#[derive(Serialize, Clone)]
pub struct TraceFrame {
    pub frame: u32,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub grounded: bool,
    pub form: String,
}

#[derive(Serialize, Clone)]
pub struct SimEvent {
    pub frame: u32,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: serde_json::Value,
}

#[derive(Clone, Copy, Default)]
struct Held {
    left: bool,
    right: bool,
    up: bool,
    down: bool,
    jump: bool,
    ability: bool,
}

pub fn run_simulation(request: &SimulationRequest) -> SimulationResult {
    let level = match &request.level {
        Some(level) => level.clone(),
        None => runtime::load_level(request.level_path.as_deref()),
    };
    let character = request
        .character
        .as_deref()
        .and_then(CharacterId::parse)
        .unwrap_or(CharacterId::Ember);
    let mut run = GameRun::new(&level, character, Tuning::default());

    let held_by_frame = expand_inputs(&request.inputs, request.max_frames);

    let mut prev = Held::default();
    let mut trace = Vec::new();
    let mut events = Vec::new();
    let mut positions: Vec<(f32, f32)> = Vec::with_capacity(request.max_frames as usize);
    let mut outcome = "timeout".to_string();
    let mut frames_elapsed = request.max_frames;

    for frame in 0..request.max_frames {
        let held = held_by_frame[frame as usize];
        let input = InputFrame {
            left: held.left,
            right: held.right,
            up: held.up,
            down: held.down,
            jump: held.jump && !prev.jump,
            ability: held.ability && !prev.ability,
        };
        prev = held;

        for event in run.step(&input) {
            events.push(SimEvent {
                frame,
                event_type: event_name(&event).to_string(),
                data: event_data(&event),
            });
        }

        let snap = snapshot(&run, frame);
        positions.push((snap.x, snap.y));
        if request.record_interval > 0 && frame % request.record_interval == 0 {
            trace.push(snap.clone());
        }

        match run.status {
            RunStatus::Won => {
                outcome = "won".to_string();
                frames_elapsed = frame + 1;
                push_terminal_frame(&mut trace, snap);
                break;
            }
            RunStatus::Dead => {
                outcome = "died".to_string();
                frames_elapsed = frame + 1;
                push_terminal_frame(&mut trace, snap);
                break;
            }
            RunStatus::Running => {}
        }

        // No measurable movement across a five second window means the
        // script has wedged the player; report it instead of burning the
        // rest of the frame budget.
        if frame >= 300 {
            let (ox, oy) = positions[(frame - 300) as usize];
            if (snap.x - ox).abs() < 1.0 && (snap.y - oy).abs() < 1.0 {
                outcome = "stuck".to_string();
                frames_elapsed = frame + 1;
                push_terminal_frame(&mut trace, snap);
                break;
            }
        }
    }

    SimulationResult {
        outcome,
        frames_elapsed,
        trace,
        events,
    }
}

fn expand_inputs(inputs: &[SimInput], max_frames: u32) -> Vec<Held> {
    let mut held = vec![Held::default(); max_frames as usize];
    for input in inputs {
        let duration = input.duration.max(1);
        let start = input.frame.min(max_frames);
        let end = input.frame.saturating_add(duration).min(max_frames);
        for f in start..end {
            let slot = &mut held[f as usize];
            match input.action.as_str() {
                "left" => slot.left = true,
                "right" => slot.right = true,
                "up" => slot.up = true,
                "down" => slot.down = true,
                "jump" => slot.jump = true,
                "ability" => slot.ability = true,
                // Unknown actions are ignored, same as unknown level data.
                _ => {}
            }
        }
    }
    held
}

fn snapshot(run: &GameRun, frame: u32) -> TraceFrame {
    let Some(player) = run.player() else {
        return TraceFrame {
            frame,
            x: 0.0,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
            grounded: false,
            form: "small".to_string(),
        };
    };
    let (vx, vy) = player.vel.map(|v| (v.x, v.y)).unwrap_or((0.0, 0.0));
    let (grounded, form) = player
        .player_state()
        .map(|s| {
            (
                s.on_ground,
                match s.form {
                    Form::Small => "small",
                    Form::Big => "big",
                },
            )
        })
        .unwrap_or((false, "small"));
    TraceFrame {
        frame,
        x: player.x,
        y: player.y,
        vx,
        vy,
        grounded,
        form: form.to_string(),
    }
}

fn push_terminal_frame(trace: &mut Vec<TraceFrame>, snap: TraceFrame) {
    if trace.last().map(|t| t.frame) != Some(snap.frame) {
        trace.push(snap);
    }
}

/// Wire name for a run event in the result stream.
fn event_name(event: &RunEvent) -> &'static str {
    match event {
        RunEvent::Jump { .. } => "jump",
        RunEvent::Coin { .. } => "coin",
        RunEvent::Powerup => "powerup",
        RunEvent::PlayerGrew => "player_grew",
        RunEvent::BlockBump { .. } => "block_bump",
        RunEvent::BrickBreak { .. } => "brick_break",
        RunEvent::CoinPop { .. } => "coin_pop",
        RunEvent::MushroomSpawn { .. } => "mushroom_spawn",
        RunEvent::Stomp { .. } => "stomp",
        RunEvent::EnemyBurned { .. } => "enemy_burned",
        RunEvent::PlayerDamaged => "player_damaged",
        RunEvent::AbilityUsed { .. } => "ability",
        RunEvent::VinesGrown { .. } => "vine_grown",
        RunEvent::Won => "run_won",
        RunEvent::Died => "run_died",
    }
}

/// Event payload with the serde tag stripped; the stream keys on the
/// `type` column instead.
fn event_data(event: &RunEvent) -> serde_json::Value {
    match serde_json::to_value(event) {
        Ok(serde_json::Value::Object(mut map)) => {
            map.remove("type");
            serde_json::Value::Object(map)
        }
        Ok(other) => other,
        Err(_) => json!({}),
    }
}
