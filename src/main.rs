//! Ledge Runner headless entry point
//!
//! Loads a stage (bundled, or a JSON path given as the first argument) and
//! plays it with a simple autopilot at a fixed 60 Hz frame time.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    if let Err(err) = native::run() {
        log::error!("{err}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is driven by the host page on the web
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::error::Error;

    use ledge_runner::Settings;
    use ledge_runner::consts::NOMINAL_FRAME_MS;
    use ledge_runner::sim::{Game, GameEvent, GamePhase, SimulationState, TickInput};

    const BUNDLED_STAGE: &str = include_str!("../assets/stages/stage1.json");
    /// Two minutes of frames; long past any sane time limit
    const MAX_FRAMES: u32 = 60 * 120;
    /// How far ahead the autopilot looks for ground
    const LOOKAHEAD: f32 = 40.0;

    pub fn run() -> Result<(), Box<dyn Error>> {
        let json = match std::env::args().nth(1) {
            Some(path) => std::fs::read_to_string(path)?,
            None => BUNDLED_STAGE.to_owned(),
        };

        let mut game = Game::from_json(&json, Settings::default())?;
        game.set_on_death(|event| {
            println!("{} (death #{})", event.message, event.death_count);
            Ok(())
        });
        game.set_on_goal(|event| {
            println!("Stage clear! score {}", event.score);
            Ok(())
        });

        log::info!(
            "Ledge Runner (native) playing '{}'",
            game.original_stage().name
        );

        let report = game.tick(
            &TickInput {
                start: true,
                ..Default::default()
            },
            NOMINAL_FRAME_MS,
        )?;
        log::debug!("frame 0: {:?}", report.events);

        for frame in 1..MAX_FRAMES {
            let input = autopilot(game.state());
            let report = game.tick(&input, NOMINAL_FRAME_MS)?;
            for event in &report.events {
                log::debug!("frame {frame}: {event:?}");
            }
            if report
                .events
                .iter()
                .any(|e| matches!(e, GameEvent::Died(_) | GameEvent::Cleared(_)))
            {
                break;
            }
        }

        let state = game.state();
        match state.phase {
            GamePhase::Over if state.final_score > 0 => {
                println!("Finished with {} s to spare", state.final_score)
            }
            GamePhase::Over => println!(
                "Run over at x = {:.0}, {} death mark(s)",
                state.player.pos.x,
                state.death_marks.len()
            ),
            phase => println!("Stopped after {MAX_FRAMES} frames in {phase:?}"),
        }
        Ok(())
    }

    /// Run right; jump when the ground ahead runs out or a spike is close
    fn autopilot(state: &SimulationState) -> TickInput {
        let player = &state.player;
        let probe = player.pos.x + LOOKAHEAD;

        let ground_ahead = state
            .stage
            .platforms
            .iter()
            .chain(state.stage.moving_platforms.iter().map(|m| &m.surface))
            .any(|p| probe >= p.x1 && probe <= p.x2 && p.y1 >= player.foot_y() - 1.0);
        let spike_ahead = state
            .stage
            .spikes
            .iter()
            .any(|s| s.left() > player.pos.x && s.left() - player.pos.x < LOOKAHEAD);

        TickInput {
            move_right: true,
            jump: player.grounded && (!ground_ahead || spike_ahead),
            ..Default::default()
        }
    }
}
