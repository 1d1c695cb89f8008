pub mod monte_carlo;
pub mod value_iteration;

pub use monte_carlo::{MonteCarloAgent, MonteCarloAgentConfig};
pub use value_iteration::{ValueIterationAgent, ValueIterationAgentConfig};

/// A trait for state and action types that can be used as keys in a [`HashMap`](std::collections::HashMap)
pub trait Hashable: Copy + Eq + std::hash::Hash {}

impl<T> Hashable for T where T: Copy + Eq + std::hash::Hash {}
