use std::collections::{BTreeSet, HashMap};

use log::warn;
use rand::Rng;
use strum::{Display, VariantArray};

use crate::{
    ensure_interval,
    env::{DiscreteActionSpace, DiscreteStateSpace, Environment, Model, Outcome},
    error::{Error, Result},
};

/// Grid coordinates as `(row, col)`, with row 0 at the top
pub type Pos = (i32, i32);

/// The four compass moves, in the fixed enumeration order used by every solver
#[derive(VariantArray, Display, Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Action {
    #[strum(to_string = "U")]
    Up,
    #[strum(to_string = "D")]
    Down,
    #[strum(to_string = "L")]
    Left,
    #[strum(to_string = "R")]
    Right,
}

impl Action {
    /// The two actions perpendicular to this one
    pub fn orthogonal(self) -> [Action; 2] {
        match self {
            Action::Up | Action::Down => [Action::Left, Action::Right],
            Action::Left | Action::Right => [Action::Up, Action::Down],
        }
    }

    fn apply(self, (row, col): Pos) -> Pos {
        match self {
            Action::Up => (row - 1, col),
            Action::Down => (row + 1, col),
            Action::Left => (row, col - 1),
            Action::Right => (row, col + 1),
        }
    }
}

/// A rectangular grid world with a slippery floor
///
/// States with an entry in the legal-action map are non-terminal; every other state the
/// agent can reach ends the episode. Rewards are received on arrival and default to 0.
/// With probability `obey_prob` a commanded action is executed verbatim, otherwise one of
/// its two orthogonal actions is executed instead, chosen uniformly. An illegal executed
/// action leaves the agent where it is.
#[derive(Debug, Clone)]
pub struct GridWorld {
    rows: usize,
    cols: usize,
    start: Pos,
    pos: Pos,
    rewards: HashMap<Pos, f64>,
    actions: HashMap<Pos, Vec<Action>>,
    obey_prob: f64,
}

impl GridWorld {
    /// An unconfigured `rows` x `cols` grid with the agent at `start`
    pub fn new(rows: usize, cols: usize, start: Pos) -> Self {
        Self {
            rows,
            cols,
            start,
            pos: start,
            rewards: HashMap::new(),
            actions: HashMap::new(),
            obey_prob: 1.0,
        }
    }

    /// Replace the reward map, the legal-action map, and the obedience probability
    ///
    /// **Errors** if `obey_prob` is not in `[0,1]`, if a non-terminal state has no legal
    /// actions, or if a non-terminal state lies outside the grid
    pub fn configure(
        &mut self,
        rewards: HashMap<Pos, f64>,
        actions: HashMap<Pos, Vec<Action>>,
        obey_prob: f64,
    ) -> Result<()> {
        ensure_interval!(obey_prob, 0.0, 1.0);
        for (state, legal) in &actions {
            if !self.in_bounds(*state) {
                return Err(Error::Configuration(format!(
                    "Non-terminal state {state:?} is outside the {}x{} grid.",
                    self.rows, self.cols
                )));
            }
            if legal.is_empty() {
                return Err(Error::Configuration(format!(
                    "Non-terminal state {state:?} has no legal actions."
                )));
            }
        }
        if obey_prob == 0.0 {
            warn!("Obedience probability is 0, commanded actions are never executed");
        }

        self.rewards = rewards;
        self.actions = actions;
        self.obey_prob = obey_prob;
        Ok(())
    }

    /// Charge `cost` on arrival at every non-terminal cell that has no reward of its own
    pub fn apply_step_cost(&mut self, cost: f64) {
        for state in self.actions.keys() {
            self.rewards.entry(*state).or_insert(cost);
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn start(&self) -> Pos {
        self.start
    }

    pub fn obey_prob(&self) -> f64 {
        self.obey_prob
    }

    pub fn rewards(&self) -> &HashMap<Pos, f64> {
        &self.rewards
    }

    /// The reward for arriving at `state`
    pub fn reward(&self, state: Pos) -> f64 {
        self.rewards.get(&state).copied().unwrap_or_default()
    }

    /// Legal actions at `state`, or `None` if it is terminal
    pub fn legal_actions(&self, state: Pos) -> Option<&[Action]> {
        self.actions.get(&state).map(Vec::as_slice)
    }

    pub fn current_state(&self) -> Pos {
        self.pos
    }

    /// Place the agent at `state` without checking that it is reachable
    ///
    /// **Errors** if `state` is outside the grid
    pub fn set_state(&mut self, state: Pos) -> Result<()> {
        if !self.in_bounds(state) {
            return Err(Error::InvalidState(format!(
                "{state:?} is outside the {}x{} grid",
                self.rows, self.cols
            )));
        }
        self.pos = state;
        Ok(())
    }

    pub fn is_terminal(&self, state: Pos) -> bool {
        !self.actions.contains_key(&state)
    }

    pub fn is_game_over(&self) -> bool {
        self.is_terminal(self.pos)
    }

    /// States with legal actions, sorted by `(row, col)`
    pub fn non_terminal_states(&self) -> Vec<Pos> {
        let mut states: Vec<_> = self.actions.keys().copied().collect();
        states.sort_unstable();
        states
    }

    /// Union of non-terminal and reward-bearing states, sorted by `(row, col)`
    pub fn all_states(&self) -> Vec<Pos> {
        self.actions
            .keys()
            .chain(self.rewards.keys())
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Resolve which action the floor actually executes when `action` is commanded
    pub fn stochastic_action<R: Rng + ?Sized>(&self, action: Action, rng: &mut R) -> Action {
        if rng.gen_bool(self.obey_prob) {
            return action;
        }

        let [a, b] = action.orthogonal();
        if rng.gen_bool(0.5) {
            a
        } else {
            b
        }
    }

    /// Command `action`, moving the agent if the executed action is legal
    ///
    /// **Returns** the reward at the resulting position
    ///
    /// **Errors** if the agent is in a terminal state
    pub fn move_agent<R: Rng + ?Sized>(&mut self, action: Action, rng: &mut R) -> Result<f64> {
        let actual = self.stochastic_action(action, rng);
        let (next, reward) = self.simulate_from(self.pos, actual)?;
        self.pos = next;
        Ok(reward)
    }

    /// Where `action` would take the agent and what it would earn, ignoring slipperiness
    ///
    /// Does not move the agent or consume randomness.
    ///
    /// **Errors** if the agent is in a terminal state
    pub fn simulate_move(&self, action: Action) -> Result<(Pos, f64)> {
        self.simulate_from(self.pos, action)
    }

    /// Every outcome of commanding `action` from the current position, as
    /// `(prob, reward, next_state)`
    ///
    /// **Errors** if the agent is in a terminal state
    pub fn transition_probabilities(&self, action: Action) -> Result<Vec<Outcome<Pos>>> {
        self.transitions_from(self.pos, action)
    }

    fn simulate_from(&self, state: Pos, action: Action) -> Result<(Pos, f64)> {
        let legal = self.actions.get(&state).ok_or_else(|| {
            Error::InvalidState(format!("{state:?} is terminal, no action can be taken"))
        })?;

        let next = if legal.contains(&action) {
            action.apply(state)
        } else {
            state
        };
        Ok((next, self.reward(next)))
    }

    fn transitions_from(&self, state: Pos, action: Action) -> Result<Vec<Outcome<Pos>>> {
        let mut outcomes = Vec::with_capacity(3);

        let (next_state, reward) = self.simulate_from(state, action)?;
        outcomes.push(Outcome {
            prob: self.obey_prob,
            reward,
            next_state,
        });

        let disobey_prob = 1.0 - self.obey_prob;
        if disobey_prob > 0.0 {
            for slip in action.orthogonal() {
                let (next_state, reward) = self.simulate_from(state, slip)?;
                outcomes.push(Outcome {
                    prob: disobey_prob / 2.0,
                    reward,
                    next_state,
                });
            }
        }

        Ok(outcomes)
    }

    fn in_bounds(&self, (row, col): Pos) -> bool {
        row >= 0 && col >= 0 && (row as usize) < self.rows && (col as usize) < self.cols
    }
}

impl Environment for GridWorld {
    type State = Pos;
    type Action = Action;

    fn is_active(&self) -> bool {
        !self.is_game_over()
    }

    fn step<R: Rng + ?Sized>(
        &mut self,
        action: Self::Action,
        rng: &mut R,
    ) -> Result<(Self::State, f64)> {
        let reward = self.move_agent(action, rng)?;
        Ok((self.pos, reward))
    }

    fn reset(&mut self) -> Self::State {
        self.pos = self.start;
        self.pos
    }
}

impl DiscreteActionSpace for GridWorld {
    fn actions(&self) -> Vec<Self::Action> {
        Action::VARIANTS.to_vec()
    }
}

impl DiscreteStateSpace for GridWorld {
    fn states(&self) -> Vec<Self::State> {
        self.non_terminal_states()
    }

    fn all_states(&self) -> Vec<Self::State> {
        GridWorld::all_states(self)
    }

    fn is_terminal(&self, state: &Self::State) -> bool {
        GridWorld::is_terminal(self, *state)
    }
}

impl Model for GridWorld {
    fn dynamics(&self, state: &Self::State, action: Self::Action) -> Result<Vec<Outcome<Pos>>> {
        self.transitions_from(*state, action)
    }
}

/// The classic 3x4 layout
///
/// ```text
/// .  .  .  +1
/// .  x  .  -1
/// s  .  .  .
/// ```
///
/// `s` is the start, `x` is a wall, and the two rewarded cells are terminal.
/// If `step_cost` is given it is charged on arrival at every other open cell.
pub fn standard_grid(obey_prob: f64, step_cost: Option<f64>) -> Result<GridWorld> {
    use Action::*;

    let mut grid = GridWorld::new(3, 4, (2, 0));
    let rewards = HashMap::from([((0, 3), 1.0), ((1, 3), -1.0)]);
    let actions = HashMap::from([
        ((0, 0), vec![Down, Right]),
        ((0, 1), vec![Left, Right]),
        ((0, 2), vec![Left, Down, Right]),
        ((1, 0), vec![Up, Down]),
        ((1, 2), vec![Up, Down, Right]),
        ((2, 0), vec![Up, Right]),
        ((2, 1), vec![Left, Right]),
        ((2, 2), vec![Left, Right, Up]),
        ((2, 3), vec![Left, Up]),
    ]);
    grid.configure(rewards, actions, obey_prob)?;

    if let Some(cost) = step_cost {
        grid.apply_step_cost(cost);
    }

    Ok(grid)
}
