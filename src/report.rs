//! Plain-text summaries for the command line

use std::fmt::Write;

use crate::progress::{Achievements, PhaseStatus, ProgressMachine, ProgressStore};
use crate::sim::{EpisodeStats, MazeEnv, Position, Record};

/// Where the learner stands, one line per phase
pub fn status<S: ProgressStore>(
    machine: &ProgressMachine<S>,
    achievements: &Achievements,
) -> String {
    let snapshot = machine.snapshot();
    let gate = machine.gate();
    let mut out = String::new();

    for (index, phase) in machine.curriculum().phases.iter().enumerate() {
        let label = match gate.phase_status(index) {
            PhaseStatus::Locked => "locked",
            PhaseStatus::Open => "open",
            PhaseStatus::Current => "current",
            PhaseStatus::Completed => "completed",
        };
        let score = snapshot.score(phase.id).map(|s| format!("  best {s:.0}%")).unwrap_or_default();
        let _ = writeln!(out, "{:>2}. {:<32} {label}{score}", index + 1, phase.title);
    }

    let step = machine.current_step();
    let _ = writeln!(
        out,
        "\nNow at phase {}, step {}: {}",
        snapshot.current_phase_index + 1,
        snapshot.current_step_index + 1,
        step.title
    );
    if machine.is_curriculum_finished() {
        let _ = writeln!(out, "Curriculum complete!");
    }

    if !achievements.unlocked.is_empty() {
        let titles: Vec<String> = achievements.unlocked.iter().map(|b| b.title()).collect();
        let _ = writeln!(out, "Badges: {}", titles.join(", "));
    }
    out
}

/// Summary of a training run, in blocks of `window` episodes
pub fn training(history: &[EpisodeStats], window: usize) -> String {
    let mut out = String::new();
    for chunk in history.chunks(window.max(1)) {
        let (Some(first), Some(last)) = (chunk.first(), chunk.last()) else {
            continue;
        };
        let solved = chunk.iter().filter(|e| e.reached_goal).count();
        let avg_steps = chunk.iter().map(|e| e.steps).sum::<usize>() as f64 / chunk.len() as f64;
        let _ = writeln!(
            out,
            "episodes {:>4}-{:<4} solved {:>3}/{:<3} avg steps {:>6.1}  epsilon {:.3}",
            first.episode + 1,
            last.episode + 1,
            solved,
            chunk.len(),
            avg_steps,
            last.epsilon
        );
    }
    out
}

/// The maze with the greedy path drawn in, or a note that the agent got lost
pub fn rollout(env: &MazeEnv, path: Option<&[Position]>) -> String {
    match path {
        Some(path) => {
            let moves = path.len().saturating_sub(1);
            format!("{}\nReached the goal in {moves} moves.", env.render(path))
        }
        None => {
            let maze = env.render(&[]);
            format!("{maze}\nThe agent has not found its way out yet. Try more episodes.")
        }
    }
}

/// Self-play results, one line per window of games
pub fn self_play(records: &[Record]) -> String {
    let mut out = String::new();
    let mut played = 0;
    for record in records {
        let first = played + 1;
        played += record.games();
        let _ = writeln!(
            out,
            "games {first:>6}-{played:<6} X wins {:>5}  O wins {:>5}  draws {:>5} ({:>5.1}%)",
            record.x_wins,
            record.o_wins,
            record.draws,
            record.draw_rate() * 100.0
        );
    }
    out
}

/// How greedy play between the trained agents went
pub fn evaluation(record: &Record) -> String {
    format!(
        "Greedy games: {} X wins, {} O wins, {} draws out of {}",
        record.x_wins,
        record.o_wins,
        record.draws,
        record.games()
    )
}
