use rand::Rng;

use crate::error::Result;

/// Represents a Markov decision process, defining the dynamics of an environment
/// in which an agent can operate.
///
/// This base trait represents the common case of a discrete-time MDP with one agent
/// and a finite state space and action space. The environment owns the agent's position.
pub trait Environment {
    /// A representation of the state of the environment to be passed to an agent
    type State;

    /// A representation of an action that an agent can take to affect the environment
    type Action;

    /// Determine if the current state is active or terminal
    fn is_active(&self) -> bool;

    /// Update the environment in response to an action taken by an agent, producing a new state and associated reward
    ///
    /// **Returns** `(next_state, reward)`
    ///
    /// **Errors** if the environment is already in a terminal state
    fn step<R: Rng + ?Sized>(
        &mut self,
        action: Self::Action,
        rng: &mut R,
    ) -> Result<(Self::State, f64)>;

    /// Reset the environment to its designated start state
    ///
    /// **Returns** the state
    fn reset(&mut self) -> Self::State;
}

/// An environment with a finite, enumerable action space
pub trait DiscreteActionSpace: Environment {
    /// The fixed action enumeration, in a stable order
    ///
    /// This is the same for every state; legality is the environment's concern, not the agent's.
    fn actions(&self) -> Vec<Self::Action>;
}

/// An environment with a finite, enumerable state space
pub trait DiscreteStateSpace: Environment {
    /// All non-terminal states, in a deterministic order
    fn states(&self) -> Vec<Self::State>;

    /// Every state, terminal or not, in a deterministic order
    fn all_states(&self) -> Vec<Self::State>;

    fn is_terminal(&self, state: &Self::State) -> bool;
}

/// A single possible result of taking an action
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<S> {
    pub prob: f64,
    pub reward: f64,
    pub next_state: S,
}

/// An environment whose full transition distribution can be queried without side effects
pub trait Model: Environment {
    /// The distribution over outcomes for commanding `action` from `state`
    ///
    /// **Errors** if `state` is terminal
    fn dynamics(
        &self,
        state: &Self::State,
        action: Self::Action,
    ) -> Result<Vec<Outcome<Self::State>>>;
}
