//! Slope Rush headless demo
//!
//! Stands in for a real frontend: drives the sim at a fixed timestep with a
//! small steering bot, reports sprite overlaps back as contact events, and
//! persists the high score between launches.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use slope_rush::consts::SIM_DT;
use slope_rush::highscores::{HighScoreStore, JsonFileStore};
use slope_rush::sim::{GameEvent, GamePhase, GameSession, Intent, detect_contacts};
use slope_rush::tuning::Tuning;

/// Sessions played per demo launch
const DEMO_RUNS: u32 = 3;
/// Cap per session so a lucky bot still lets the demo finish (2 sim minutes)
const MAX_STEPS_PER_RUN: u32 = 7_200;

fn main() {
    env_logger::init();
    log::info!("Slope Rush (headless demo) starting...");

    let tuning = match std::env::args().nth(1) {
        Some(path) => match Tuning::load(Path::new(&path)) {
            Ok(tuning) => tuning,
            Err(e) => {
                log::error!("{e}");
                std::process::exit(1);
            }
        },
        None => Tuning::default(),
    };

    let mut store = JsonFileStore::new("slope_rush_highscore.json");
    let high = match store.load() {
        Ok(high) => high,
        Err(e) => {
            log::warn!("ignoring unreadable high score: {e}");
            0
        }
    };

    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    let mut session = GameSession::new(tuning, seed);
    session.score.high = high;
    log::info!("Game initialized with seed: {}", seed);

    for run in 1..=DEMO_RUNS {
        session.start();

        let mut steps = 0u32;
        while session.phase == GamePhase::Playing && steps < MAX_STEPS_PER_RUN {
            session.set_intent(choose_intent(&session));
            session.step(SIM_DT);
            steps += 1;

            // Physics stand-in: overlaps become contact events for next step
            for pair in detect_contacts(&session) {
                session.report_contact(pair);
            }

            for event in session.drain_events() {
                if let GameEvent::SessionEnded {
                    score,
                    high_score,
                    new_record,
                } = event
                {
                    if new_record {
                        if let Err(e) = store.save(high_score) {
                            log::warn!("could not persist high score: {e}");
                        }
                    }
                    println!(
                        "Run {}: {} points in {:.1}s{}",
                        run,
                        score,
                        steps as f32 * SIM_DT,
                        if new_record { " - new record!" } else { "" }
                    );
                }
            }
        }

        if session.phase == GamePhase::Playing {
            println!(
                "Run {}: bot still alive at the demo cap with {} points",
                run, session.score.current
            );
            break;
        }
    }

    println!("Best on record: {}", session.score.high);
}

/// Steering bot: dodge the hazard soonest to cross the skier's row,
/// otherwise drift back toward mid-slope
fn choose_intent(session: &GameSession) -> Intent {
    let px = session.player.pos.x;
    let py = session.player.pos.y;
    let player_w = session.player.size.x;

    // (vertical gap, column) of the most pressing threat climbing toward us
    let mut threat: Option<(f32, f32)> = None;
    let mut consider = |pos: glam::Vec2, width: f32| {
        if pos.y > py {
            return; // already passed
        }
        let gap = py - pos.y;
        let lateral = (pos.x - px).abs();
        if gap < 260.0 && lateral < width + player_w && threat.is_none_or(|(g, _)| gap < g) {
            threat = Some((gap, pos.x));
        }
    };
    for obstacle in &session.obstacles {
        consider(obstacle.pos, obstacle.size().x);
    }
    if let Some(pursuer) = &session.pursuer {
        consider(pursuer.pos, pursuer.size().x);
    }

    match threat {
        Some((_, threat_x)) if threat_x <= px => Intent::Right,
        Some(_) => Intent::Left,
        None => {
            let center = session.tuning.playfield.x / 2.0;
            if (px - center).abs() < 10.0 {
                Intent::None
            } else if px < center {
                Intent::Right
            } else {
                Intent::Left
            }
        }
    }
}
