use std::collections::HashMap;

use log::{debug, info};

use crate::{
    env::{DiscreteActionSpace, DiscreteStateSpace, Model},
    error::{Error, Result},
    util::argmax,
};

use super::Hashable;

/// Configuration for the [`ValueIterationAgent`]
#[derive(Debug, Clone)]
pub struct ValueIterationAgentConfig {
    /// Discount factor, must be in `[0,1)`
    ///
    /// **Default**: `0.9`
    pub gamma: f64,
    /// A sweep whose largest value change falls below this ends the iteration
    ///
    /// **Default**: `1e-3`
    pub threshold: f64,
}

impl Default for ValueIterationAgentConfig {
    fn default() -> Self {
        Self {
            gamma: 0.9,
            threshold: 1e-3,
        }
    }
}

/// A value iteration agent
///
/// This is a dynamic programming approach and requires a full model of the environment's dynamics.
/// Each sweep applies the Bellman optimality backup to every non-terminal state in place, over
/// every action in the action space (illegal ones included), until the value function stops
/// moving. The greedy policy is then read off the converged values.
pub struct ValueIterationAgent<E>
where
    E: Model + DiscreteStateSpace + DiscreteActionSpace,
    E::State: Hashable,
    E::Action: Hashable,
{
    state_value: HashMap<E::State, f64>,
    policy: HashMap<E::State, E::Action>,
    deltas: Vec<f64>,
    gamma: f64,
    threshold: f64,
}

impl<E> ValueIterationAgent<E>
where
    E: Model + DiscreteStateSpace + DiscreteActionSpace,
    E::State: Hashable,
    E::Action: Hashable,
{
    /// Initialize a new `ValueIterationAgent`
    ///
    /// **Errors** if `gamma` is not in `[0,1)` or `threshold` is not positive
    pub fn new(config: ValueIterationAgentConfig) -> Result<Self> {
        let ValueIterationAgentConfig { gamma, threshold } = config;
        if !(0.0..1.0).contains(&gamma) {
            return Err(Error::Configuration(format!(
                "Invalid value for `gamma`: {gamma}. Must be in the interval [0, 1)."
            )));
        }
        if !(threshold > 0.0) {
            return Err(Error::Configuration(format!(
                "Invalid value for `threshold`: {threshold}. Must be positive."
            )));
        }

        Ok(Self {
            state_value: HashMap::new(),
            policy: HashMap::new(),
            deltas: Vec::new(),
            gamma,
            threshold,
        })
    }

    /// Expected return of `action` in `state` under the current value estimates
    fn action_value(&self, env: &E, state: &E::State, action: E::Action) -> Result<f64> {
        let mut expected_reward = 0.0;
        let mut expected_value = 0.0;
        for outcome in env.dynamics(state, action)? {
            let next_value = self
                .state_value
                .get(&outcome.next_state)
                .copied()
                .unwrap_or_default();
            expected_reward += outcome.prob * outcome.reward;
            expected_value += outcome.prob * next_value;
        }

        Ok(expected_reward + self.gamma * expected_value)
    }

    /// The best action and its value in `state`, ties going to the earliest action
    fn best_action_value(&self, env: &E, state: &E::State) -> Result<(E::Action, f64)> {
        let values = env
            .actions()
            .into_iter()
            .map(|a| Ok((a, self.action_value(env, state, a)?)))
            .collect::<Result<Vec<_>>>()?;

        argmax(values).ok_or_else(|| Error::Configuration("Action space is empty.".into()))
    }

    fn evaluate(&mut self, env: &E) -> Result<usize> {
        self.state_value = env.all_states().into_iter().map(|s| (s, 0.0)).collect();
        self.deltas.clear();

        loop {
            let mut delta: f64 = 0.0;
            for state in env.states() {
                let (_, new_value) = self.best_action_value(env, &state)?;
                let old_value = self
                    .state_value
                    .insert(state, new_value)
                    .unwrap_or_default();
                delta = delta.max((old_value - new_value).abs());
            }

            self.deltas.push(delta);
            debug!("Sweep {}: max change {delta:.6}", self.deltas.len());
            if delta < self.threshold {
                return Ok(self.deltas.len());
            }
        }
    }

    fn improve(&mut self, env: &E) -> Result<()> {
        self.policy.clear();
        for state in env.states() {
            let (action, _) = self.best_action_value(env, &state)?;
            self.policy.insert(state, action);
        }

        Ok(())
    }

    /// Run value iteration to convergence, then derive the greedy policy
    ///
    /// **Returns** the number of sweeps performed
    pub fn learn(&mut self, env: &E) -> Result<usize> {
        let sweeps = self.evaluate(env)?;
        info!("Value iteration converged after {sweeps} sweeps");
        self.improve(env)?;
        Ok(sweeps)
    }

    /// Get the agent's policy
    pub fn policy(&self) -> &HashMap<E::State, E::Action> {
        &self.policy
    }

    /// Get the agent's state value function
    pub fn state_value(&self) -> &HashMap<E::State, f64> {
        &self.state_value
    }

    /// Largest absolute value change in each sweep
    pub fn deltas(&self) -> &[f64] {
        &self.deltas
    }
}
