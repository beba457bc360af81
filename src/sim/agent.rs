//! Tabular Q-learning with epsilon-greedy exploration

use std::collections::HashMap;
use std::hash::Hash;
use std::path::Path;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Learning parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QParams {
    /// Learning rate
    pub alpha: f64,
    /// Discount factor
    pub gamma: f64,
    /// Initial exploration rate
    pub epsilon: f64,
    pub epsilon_min: f64,
    /// Multiplied into epsilon after each episode
    pub epsilon_decay: f64,
}

impl Default for QParams {
    fn default() -> Self {
        Self { alpha: 0.1, gamma: 0.9, epsilon: 1.0, epsilon_min: 0.01, epsilon_decay: 0.995 }
    }
}

/// An agent that learns the value of each (state, action) pair
#[derive(Debug, Clone)]
pub struct QAgent<S, A> {
    params: QParams,
    epsilon: f64,
    table: HashMap<S, HashMap<A, f64>>,
    rng: StdRng,
}

impl<S, A> QAgent<S, A>
where
    S: Eq + Hash + Clone,
    A: Eq + Hash + Copy,
{
    pub fn new(params: QParams, seed: u64) -> Self {
        Self {
            params,
            epsilon: params.epsilon,
            table: HashMap::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn params(&self) -> &QParams {
        &self.params
    }

    /// Number of states seen so far
    pub fn known_states(&self) -> usize {
        self.table.len()
    }

    /// Learned value, 0.0 for anything unseen
    pub fn q_value(&self, state: &S, action: &A) -> f64 {
        self.table.get(state).and_then(|row| row.get(action)).copied().unwrap_or(0.0)
    }

    fn max_q(&self, state: &S, actions: &[A]) -> f64 {
        actions.iter().map(|a| self.q_value(state, a)).fold(f64::NEG_INFINITY, f64::max)
    }

    /// Explore with probability epsilon, otherwise exploit
    pub fn choose_action(&mut self, state: &S, actions: &[A]) -> Option<A> {
        if self.rng.r#gen::<f64>() < self.epsilon {
            return actions.choose(&mut self.rng).copied();
        }
        self.best_action(state, actions)
    }

    /// Highest valued action, ties broken at random
    pub fn best_action(&mut self, state: &S, actions: &[A]) -> Option<A> {
        if actions.is_empty() {
            return None;
        }
        let best = self.max_q(state, actions);
        let candidates: Vec<A> =
            actions.iter().copied().filter(|a| self.q_value(state, a) == best).collect();
        candidates.choose(&mut self.rng).copied()
    }

    /// Bellman update: `Q += alpha * (reward + gamma * max Q(next) - Q)`
    ///
    /// A terminal transition has no future term.
    pub fn update(
        &mut self,
        state: &S,
        action: A,
        reward: f64,
        next_state: &S,
        next_actions: &[A],
        done: bool,
    ) {
        let future = if done || next_actions.is_empty() {
            0.0
        } else {
            self.max_q(next_state, next_actions)
        };
        let current = self.q_value(state, &action);
        let updated = current + self.params.alpha * (reward + self.params.gamma * future - current);
        self.table.entry(state.clone()).or_default().insert(action, updated);
    }

    /// Shrink epsilon, never below its floor
    pub fn decay_epsilon(&mut self) {
        if self.epsilon > self.params.epsilon_min {
            self.epsilon = (self.epsilon * self.params.epsilon_decay).max(self.params.epsilon_min);
        }
    }

    /// Learn from a finished episode once its outcome is known
    ///
    /// Moves are credited from last to first. The last move gets `final_reward`
    /// and each earlier one gets gamma times the reward of the move after it.
    pub fn learn_from_episode(&mut self, moves: &[(S, A)], final_reward: f64) {
        let mut reward = final_reward;
        for (state, action) in moves.iter().rev() {
            self.update(state, *action, reward, state, &[], true);
            reward *= self.params.gamma;
        }
        self.decay_epsilon();
    }
}

/// One state's row of the Q-table as written to disk
#[derive(Serialize, Deserialize)]
struct SavedRow<S, A> {
    state: S,
    values: Vec<(A, f64)>,
}

impl<S, A> QAgent<S, A>
where
    S: Eq + Hash + Clone + Serialize + DeserializeOwned,
    A: Eq + Hash + Copy + Serialize + DeserializeOwned,
{
    /// Write the Q-table as JSON, creating parent directories
    pub fn save_table(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }
        let rows: Vec<SavedRow<&S, A>> = self
            .table
            .iter()
            .map(|(state, row)| SavedRow {
                state,
                values: row.iter().map(|(a, q)| (*a, *q)).collect(),
            })
            .collect();
        let contents = serde_json::to_string(&rows).context("Failed to serialize Q-table")?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write Q-table to {:?}", path))?;
        tracing::debug!("Saved {} states to {:?}", rows.len(), path);
        Ok(())
    }

    /// Replace the Q-table with one saved earlier
    ///
    /// Returns false, leaving the agent untouched, when `path` does not exist.
    pub fn load_table(&mut self, path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read Q-table from {:?}", path))?;
        let rows: Vec<SavedRow<S, A>> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse Q-table in {:?}", path))?;
        self.table =
            rows.into_iter().map(|row| (row.state, row.values.into_iter().collect())).collect();
        tracing::debug!("Loaded {} states from {:?}", self.table.len(), path);
        Ok(true)
    }
}
