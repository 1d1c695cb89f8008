use std::collections::{HashMap, HashSet};

use log::{debug, info};
use rand::{seq::SliceRandom, Rng};

use crate::{
    decay::{self, Decay},
    ensure_interval,
    env::{DiscreteActionSpace, DiscreteStateSpace, Environment},
    error::{Error, Result},
    exploration::EpsilonGreedy,
    util::argmax,
};

use super::Hashable;

/// Configuration for the [`MonteCarloAgent`]
pub struct MonteCarloAgentConfig<D: Decay> {
    /// Exploration applied on top of the current greedy policy
    ///
    /// Epsilon must stay above `0`. Episodes have no step cap, so a purely greedy policy that
    /// cycles between non-terminal states never finishes an episode.
    ///
    /// **Default**: a [`Constant`](decay::Constant) epsilon of `0.2`
    pub exploration: EpsilonGreedy<D>,
    /// Discount factor, must be in `[0,1]`
    ///
    /// **Default**: `0.9`
    pub gamma: f64,
    /// Number of episodes run by [`MonteCarloAgent::learn`]
    ///
    /// **Default**: `8000`
    pub episodes: u32,
}

impl Default for MonteCarloAgentConfig<decay::Constant> {
    fn default() -> Self {
        Self {
            exploration: EpsilonGreedy::new(decay::Constant::new(0.2)),
            gamma: 0.9,
            episodes: 8000,
        }
    }
}

/// One step of an episode: the state reached, the action chosen there (`None` at the
/// terminal), and the reward received on arriving in the state
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<S, A> {
    pub state: S,
    pub action: Option<A>,
    pub reward: f64,
}

/// The discounted return observed after taking `action` in `state`
#[derive(Debug, Clone, PartialEq)]
pub struct SampleReturn<S, A> {
    pub state: S,
    pub action: A,
    pub value: f64,
}

/// Walk an episode backwards accumulating `G = r + gamma * G`
///
/// The return attached to a step is everything received after it, so the terminal step
/// contributes its reward but gets no entry of its own. Output is in chronological order.
pub fn discounted_returns<S: Copy, A: Copy>(
    trajectory: &[Transition<S, A>],
    gamma: f64,
) -> Vec<SampleReturn<S, A>> {
    let mut g = 0.0;
    let mut returns = Vec::with_capacity(trajectory.len());
    for step in trajectory.iter().rev() {
        if let Some(action) = step.action {
            returns.push(SampleReturn {
                state: step.state,
                action,
                value: g,
            });
        }
        g = step.reward + gamma * g;
    }

    returns.reverse();
    returns
}

/// On-policy first-visit Monte Carlo control
///
/// Plays whole episodes from the environment's start state under an epsilon-greedy version of
/// its policy, averages the first-visit return of every state-action pair into its Q value,
/// and makes the policy greedy with respect to Q after each episode. No model of the
/// environment's dynamics is needed.
///
/// Q covers every action of the action space in every non-terminal state, legal or not.
pub struct MonteCarloAgent<E, D>
where
    E: Environment + DiscreteStateSpace + DiscreteActionSpace,
    E::State: Hashable,
    E::Action: Hashable,
    D: Decay,
{
    q_table: HashMap<(E::State, E::Action), f64>,
    returns: HashMap<(E::State, E::Action), Vec<f64>>,
    policy: HashMap<E::State, E::Action>,
    states: Vec<E::State>,
    actions: Vec<E::Action>,
    deltas: Vec<f64>,
    exploration: EpsilonGreedy<D>,
    gamma: f64,
    episodes: u32,
    episode: u32,
}

impl<E, D> MonteCarloAgent<E, D>
where
    E: Environment + DiscreteStateSpace + DiscreteActionSpace,
    E::State: Hashable,
    E::Action: Hashable,
    D: Decay,
{
    /// Initialize a new `MonteCarloAgent` for `env` with a uniformly random policy
    ///
    /// **Errors** if `gamma` is not in `[0,1]` or the action space is empty
    pub fn new<R: Rng + ?Sized>(
        config: MonteCarloAgentConfig<D>,
        env: &E,
        rng: &mut R,
    ) -> Result<Self> {
        ensure_interval!(config.gamma, 0.0, 1.0);

        let states = env.states();
        let actions = env.actions();
        if actions.is_empty() {
            return Err(Error::Configuration("Action space is empty.".into()));
        }

        let mut policy = HashMap::with_capacity(states.len());
        let mut q_table = HashMap::with_capacity(states.len() * actions.len());
        let mut returns = HashMap::with_capacity(states.len() * actions.len());
        for &state in &states {
            if let Some(&action) = actions.choose(rng) {
                policy.insert(state, action);
            }
            for &action in &actions {
                q_table.insert((state, action), 0.0);
                returns.insert((state, action), Vec::new());
            }
        }

        Ok(Self {
            q_table,
            returns,
            policy,
            states,
            actions,
            deltas: Vec::new(),
            exploration: config.exploration,
            gamma: config.gamma,
            episodes: config.episodes,
            episode: 0,
        })
    }

    /// Choose an action in `state` based on the policy and exploration
    fn act<R: Rng + ?Sized>(&self, state: &E::State, rng: &mut R) -> Result<E::Action> {
        let greedy = *self.policy.get(state).ok_or_else(|| {
            Error::InvalidState("Non-terminal state is missing from the policy".into())
        })?;
        Ok(self
            .exploration
            .select(self.episode, greedy, &self.actions, rng))
    }

    /// Play one episode from the start state until a terminal state is reached
    pub fn play_episode<R: Rng + ?Sized>(
        &self,
        env: &mut E,
        rng: &mut R,
    ) -> Result<Vec<Transition<E::State, E::Action>>> {
        let mut state = env.reset();
        let mut action = self.act(&state, rng)?;
        let mut trajectory = vec![Transition {
            state,
            action: Some(action),
            reward: 0.0,
        }];

        loop {
            let (next, reward) = env.step(action, rng)?;
            state = next;
            if env.is_terminal(&state) {
                trajectory.push(Transition {
                    state,
                    action: None,
                    reward,
                });
                return Ok(trajectory);
            }

            action = self.act(&state, rng)?;
            trajectory.push(Transition {
                state,
                action: Some(action),
                reward,
            });
        }
    }

    /// Average each pair's first return in the episode into Q
    ///
    /// **Returns** the largest absolute change to Q
    pub fn update(&mut self, returns: &[SampleReturn<E::State, E::Action>]) -> f64 {
        let mut seen = HashSet::new();
        let mut biggest_change: f64 = 0.0;
        for &SampleReturn {
            state,
            action,
            value,
        } in returns
        {
            if !seen.insert((state, action)) {
                continue;
            }

            let history = self.returns.entry((state, action)).or_default();
            history.push(value);
            let mean = history.iter().sum::<f64>() / history.len() as f64;

            let q = self.q_table.entry((state, action)).or_default();
            let old_q = *q;
            *q = mean;
            biggest_change = biggest_change.max((*q - old_q).abs());
        }

        biggest_change
    }

    fn best_action(&self, state: &E::State) -> Option<(E::Action, f64)> {
        argmax(self.actions.iter().map(|&a| {
            let q = self.q_table.get(&(*state, a)).copied().unwrap_or_default();
            (a, q)
        }))
    }

    /// Make the policy greedy with respect to Q in every non-terminal state
    fn improve(&mut self) {
        for state in &self.states {
            if let Some((action, _)) = self.best_action(state) {
                self.policy.insert(*state, action);
            }
        }
    }

    /// Run a single episode and learn from it
    ///
    /// **Returns** the largest absolute change to Q during the episode
    pub fn go<R: Rng + ?Sized>(&mut self, env: &mut E, rng: &mut R) -> Result<f64> {
        let trajectory = self.play_episode(env, rng)?;
        let returns = discounted_returns(&trajectory, self.gamma);
        let delta = self.update(&returns);
        self.improve();

        debug!(
            "Episode {}: {} steps, max change {delta:.6}",
            self.episode,
            trajectory.len() - 1
        );
        self.deltas.push(delta);
        self.episode += 1;
        Ok(delta)
    }

    /// Run the configured number of episodes
    pub fn learn<R: Rng + ?Sized>(&mut self, env: &mut E, rng: &mut R) -> Result<()> {
        for _ in 0..self.episodes {
            if self.episode % 1000 == 0 {
                info!("Episode {}", self.episode);
            }
            self.go(env, rng)?;
        }

        Ok(())
    }

    /// The value of each non-terminal state, taken as its largest Q value
    pub fn state_value(&self) -> HashMap<E::State, f64> {
        self.states
            .iter()
            .filter_map(|s| self.best_action(s).map(|(_, v)| (*s, v)))
            .collect()
    }

    /// Get the agent's policy
    pub fn policy(&self) -> &HashMap<E::State, E::Action> {
        &self.policy
    }

    pub fn q_value(&self, state: E::State, action: E::Action) -> f64 {
        self.q_table
            .get(&(state, action))
            .copied()
            .unwrap_or_default()
    }

    /// Every first-visit return recorded for a state-action pair
    pub fn history(&self, state: E::State, action: E::Action) -> &[f64] {
        self.returns
            .get(&(state, action))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Largest absolute change to Q in each episode
    pub fn deltas(&self) -> &[f64] {
        &self.deltas
    }

    /// Number of episodes played so far
    pub fn episode(&self) -> u32 {
        self.episode
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::{
        algo::{ValueIterationAgent, ValueIterationAgentConfig},
        error::Error,
        gym::{standard_grid, Action, GridWorld, Pos},
    };

    type Agent = MonteCarloAgent<GridWorld, decay::Constant>;

    fn agent(env: &GridWorld, epsilon: f32, episodes: u32) -> Agent {
        let config = MonteCarloAgentConfig {
            exploration: EpsilonGreedy::new(decay::Constant::new(epsilon)),
            episodes,
            ..Default::default()
        };
        MonteCarloAgent::new(config, env, &mut StdRng::seed_from_u64(1)).unwrap()
    }

    #[test]
    fn initial_tables() {
        let env = standard_grid(1.0, None).unwrap();
        let agent = agent(&env, 0.2, 0);
        assert_eq!(agent.policy().len(), 9, "One policy entry per non-terminal state");
        assert_eq!(agent.q_table.len(), 36, "Every action in every non-terminal state");
        assert!(agent.q_table.values().all(|&q| q == 0.0));
        assert!(agent.returns.values().all(Vec::is_empty));
    }

    #[test]
    fn rejects_bad_gamma() {
        let env = standard_grid(1.0, None).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        for gamma in [1.5, -0.1] {
            let config = MonteCarloAgentConfig { gamma, ..Default::default() };
            assert!(
                matches!(Agent::new(config, &env, &mut rng), Err(Error::Configuration(_))),
                "gamma = {gamma} is rejected"
            );
        }

        let config = MonteCarloAgentConfig { gamma: 1.0, ..Default::default() };
        assert!(Agent::new(config, &env, &mut rng).is_ok(), "Undiscounted is allowed");
    }

    #[test]
    fn default_exploration_is_positive() {
        let config = MonteCarloAgentConfig::default();
        assert!(config.exploration.epsilon(0) > 0.0, "Default epsilon keeps exploring");
    }

    #[test]
    fn terminal_start_has_no_policy() {
        let mut env = GridWorld::new(1, 2, (0, 1));
        env.configure(
            HashMap::from([((0, 1), 1.0)]),
            HashMap::from([((0, 0), vec![Action::Right])]),
            1.0,
        )
        .unwrap();
        let agent = agent(&env, 0.2, 0);
        let mut rng = StdRng::seed_from_u64(5);

        assert!(
            matches!(agent.play_episode(&mut env, &mut rng), Err(Error::InvalidState(_))),
            "Cannot act from a terminal start"
        );
    }

    #[test]
    fn returns_are_discounted_backwards() {
        let trajectory = vec![
            Transition { state: 0, action: Some('a'), reward: 0.0 },
            Transition { state: 1, action: Some('b'), reward: -0.5 },
            Transition { state: 2, action: Some('c'), reward: 0.0 },
            Transition { state: 3, action: None, reward: 1.0 },
        ];
        let returns = discounted_returns(&trajectory, 0.5);

        assert_eq!(returns.len(), 3, "Terminal step has no return");
        assert_eq!(
            returns,
            vec![
                SampleReturn { state: 0, action: 'a', value: -0.5 + 0.5 * 0.5 },
                SampleReturn { state: 1, action: 'b', value: 0.5 },
                SampleReturn { state: 2, action: 'c', value: 1.0 },
            ]
        );
    }

    #[test]
    fn first_visit_only() {
        let env = standard_grid(1.0, None).unwrap();
        let mut agent = agent(&env, 0.2, 0);
        let sample = |state: Pos, action, value| SampleReturn { state, action, value };

        let delta = agent.update(&[
            sample((2, 0), Action::Up, 0.5),
            sample((1, 0), Action::Up, 0.75),
            sample((2, 0), Action::Up, 0.25),
        ]);
        assert_eq!(agent.history((2, 0), Action::Up), [0.5], "Repeat visit ignored");
        assert_eq!(agent.history((1, 0), Action::Up), [0.75]);
        assert_eq!(agent.q_value((2, 0), Action::Up), 0.5);
        assert_eq!(delta, 0.75, "Largest change reported");

        agent.update(&[sample((2, 0), Action::Up, 0.25)]);
        assert_eq!(agent.history((2, 0), Action::Up), [0.5, 0.25], "New episode counts again");
        assert_eq!(agent.q_value((2, 0), Action::Up), 0.375, "Q is the mean of the history");
    }

    #[test]
    fn q_is_exact_history_mean() {
        let env = standard_grid(1.0, None).unwrap();
        let mut agent = agent(&env, 0.2, 0);
        let mut rng = StdRng::seed_from_u64(6);

        for _ in 0..500 {
            let value = rng.gen_range(-1.0..1.0) / 3.0;
            agent.update(&[SampleReturn { state: (2, 0), action: Action::Up, value }]);

            let history = agent.history((2, 0), Action::Up);
            let mean = history.iter().sum::<f64>() / history.len() as f64;
            assert_eq!(agent.q_value((2, 0), Action::Up), mean, "Q matches the history mean");
        }
    }

    #[test]
    fn episode_shape() {
        let mut env = standard_grid(0.8, Some(-0.2)).unwrap();
        let agent = agent(&env, 0.2, 0);
        let mut rng = StdRng::seed_from_u64(2);
        let trajectory = agent.play_episode(&mut env, &mut rng).unwrap();

        let first = &trajectory[0];
        assert_eq!((first.state, first.reward), ((2, 0), 0.0), "Starts at the start");
        let last = trajectory.last().unwrap();
        assert!(env.is_terminal(last.state), "Ends in a terminal state");
        assert_eq!(last.action, None);
        assert!(trajectory[..trajectory.len() - 1]
            .iter()
            .all(|t| t.action.is_some() && !env.is_terminal(t.state)));
    }

    #[test]
    fn policy_becomes_greedy() {
        let mut env = standard_grid(1.0, None).unwrap();
        let mut agent = agent(&env, 0.2, 0);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            agent.go(&mut env, &mut rng).unwrap();
        }

        assert_eq!(agent.episode(), 50);
        assert_eq!(agent.deltas().len(), 50);
        for state in env.non_terminal_states() {
            let action = agent.policy()[&state];
            let best = agent.q_value(state, action);
            for other in env.actions() {
                assert!(agent.q_value(state, other) <= best, "Policy is greedy at {state:?}");
            }
        }
    }

    #[test]
    fn converges_towards_value_iteration() {
        let mut env = standard_grid(1.0, None).unwrap();
        let mut vi = ValueIterationAgent::new(ValueIterationAgentConfig::default()).unwrap();
        vi.learn(&env).unwrap();

        let mut mc = agent(&env, 0.1, 10_000);
        mc.learn(&mut env, &mut StdRng::seed_from_u64(4)).unwrap();
        let values = mc.state_value();

        for state in env.non_terminal_states() {
            assert!(
                values[&state] <= vi.state_value()[&state] + 1e-9,
                "Sampled returns never beat the optimum at {state:?}"
            );
        }

        // Follow the learned greedy policy from the start
        env.reset();
        let mut steps = 0;
        while env.is_active() && steps < 20 {
            let state = env.current_state();
            let (v_mc, v_vi) = (values[&state], vi.state_value()[&state]);
            assert!((v_mc - v_vi).abs() < 0.3, "V{state:?}: {v_mc} vs {v_vi}");

            let (next, _) = env.simulate_move(mc.policy()[&state]).unwrap();
            env.set_state(next).unwrap();
            steps += 1;
        }
        assert_eq!(env.current_state(), (0, 3), "Greedy policy reaches the goal");
    }
}
