//! Training loop and greedy rollout

use std::collections::HashSet;

use super::agent::QAgent;
use super::env::{Direction, MazeEnv, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainConfig {
    pub episodes: usize,
    /// Episodes are cut off after this many steps
    pub max_steps: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self { episodes: 500, max_steps: 500 }
    }
}

/// How one episode went
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeStats {
    pub episode: usize,
    pub steps: usize,
    pub total_reward: f64,
    pub reached_goal: bool,
    /// Exploration rate the episode ran with
    pub epsilon: f64,
}

/// Train `agent` in `env` and report per-episode stats
pub fn train(
    env: &mut MazeEnv,
    agent: &mut QAgent<Position, Direction>,
    config: TrainConfig,
) -> Vec<EpisodeStats> {
    let actions = Direction::ALL;
    let mut history = Vec::with_capacity(config.episodes);

    for episode in 0..config.episodes {
        let mut state = env.reset();
        let epsilon = agent.epsilon();
        let mut total_reward = 0.0;
        let mut steps = 0;
        let mut reached_goal = false;

        while steps < config.max_steps {
            let Some(action) = agent.choose_action(&state, &actions) else {
                break;
            };
            let result = env.step(action);
            agent.update(&state, action, result.reward, &result.position, &actions, result.done);

            state = result.position;
            total_reward += result.reward;
            steps += 1;

            if result.done {
                reached_goal = true;
                break;
            }
        }

        agent.decay_epsilon();
        history.push(EpisodeStats { episode, steps, total_reward, reached_goal, epsilon });

        if (episode + 1) % 100 == 0 {
            tracing::debug!(
                episode = episode + 1,
                steps,
                reached_goal,
                epsilon,
                "Training progress"
            );
        }
    }

    history
}

/// Follow the learned policy from the start without exploring
///
/// Returns the visited positions when the goal is reached, `None` when the
/// policy walks in circles or runs out of steps.
pub fn greedy_path(
    env: &mut MazeEnv,
    agent: &mut QAgent<Position, Direction>,
    max_steps: usize,
) -> Option<Vec<Position>> {
    let mut state = env.reset();
    let mut path = vec![state];
    let mut seen = HashSet::from([state]);

    for _ in 0..max_steps {
        let action = agent.best_action(&state, &Direction::ALL)?;
        let result = env.step(action);
        state = result.position;
        path.push(state);

        if result.done {
            return Some(path);
        }
        if !seen.insert(state) {
            return None;
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::agent::QParams;
    use crate::sim::maze::generate_maze;

    fn small_env() -> MazeEnv {
        MazeEnv::corner_to_corner(generate_maze(3, 3, 9).unwrap()).unwrap()
    }

    #[test]
    fn records_every_episode() {
        let mut env = small_env();
        let mut agent = QAgent::new(QParams::default(), 1);
        let history = train(&mut env, &mut agent, TrainConfig { episodes: 20, max_steps: 50 });
        assert_eq!(history.len(), 20);
        assert!(history.iter().all(|e| e.steps <= 50));
        assert_eq!(history[0].epsilon, 1.0);
        assert!(history[19].epsilon < 1.0);
    }

    #[test]
    fn learns_to_reach_the_goal() {
        let mut env = small_env();
        let mut agent = QAgent::new(QParams::default(), 5);
        let history = train(&mut env, &mut agent, TrainConfig { episodes: 1500, max_steps: 300 });
        assert!(history.last().is_some_and(|e| e.reached_goal));

        let path = greedy_path(&mut env, &mut agent, 100).expect("trained agent finds the exit");
        assert_eq!(path.first(), Some(&env.start()));
        assert_eq!(path.last(), Some(&env.goal()));
    }

    #[test]
    fn untrained_agent_has_no_reliable_path_in_few_steps() {
        let mut env = MazeEnv::corner_to_corner(generate_maze(6, 6, 2).unwrap()).unwrap();
        let mut agent = QAgent::new(QParams::default(), 3);
        assert_eq!(greedy_path(&mut env, &mut agent, 3), None);
    }
}
