use rand::{seq::SliceRandom, Rng};

use crate::decay::Decay;

use super::Choice;

/// Epsilon greedy exploration policy with time-decaying epsilon threshold
#[derive(Debug, Clone)]
pub struct EpsilonGreedy<D: Decay> {
    epsilon: D,
}

impl<D: Decay> EpsilonGreedy<D> {
    /// Initialize epsilon greedy policy with a decay strategy
    ///
    /// Values the schedule produces outside `[0,1]` are clamped into it.
    pub fn new(decay: D) -> Self {
        Self { epsilon: decay }
    }

    /// Epsilon for the given episode
    pub fn epsilon(&self, episode: u32) -> f64 {
        let epsilon = self.epsilon.evaluate(episode as f32);
        if epsilon.is_nan() {
            return 0.0;
        }
        epsilon.clamp(0.0, 1.0) as f64
    }

    /// Invoke epsilon greedy policy for current episode
    pub fn choose<R: Rng + ?Sized>(&self, episode: u32, rng: &mut R) -> Choice {
        if rng.gen_bool(self.epsilon(episode)) {
            Choice::Explore
        } else {
            Choice::Exploit
        }
    }

    /// Pick `greedy` with probability 1 - epsilon, otherwise a uniformly random member of `actions`
    pub fn select<A: Copy, R: Rng + ?Sized>(
        &self,
        episode: u32,
        greedy: A,
        actions: &[A],
        rng: &mut R,
    ) -> A {
        match self.choose(episode, rng) {
            Choice::Exploit => greedy,
            Choice::Explore => actions.choose(rng).copied().unwrap_or(greedy),
        }
    }
}
