use crate::{ensure_interval, error::Result};

/// An implementation of a time-decaying value
pub trait Decay {
    /// Calculate value at time `t`
    fn evaluate(&self, t: f32) -> f32;
}

/// A constant value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constant {
    value: f32,
}

impl Constant {
    pub fn new(value: f32) -> Self {
        Self { value }
    }
}

impl Decay for Constant {
    fn evaluate(&self, _t: f32) -> f32 {
        self.value
    }
}

/// v(t) = v<sub>f</sub> + (v<sub>i</sub> - v<sub>f</sub>) * e<sup>-rt</sup>
///
/// Used as an epsilon schedule this makes exploration fade over episodes, so the
/// Monte Carlo agent becomes greedy in the limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Exponential {
    rate: f32,
    vi: f32,
    vf: f32,
}

impl Exponential {
    /// **Errors** if `rate` is negative or `vf` is greater than `vi`
    pub fn new(rate: f32, vi: f32, vf: f32) -> Result<Self> {
        ensure_interval!(rate, 0.0, f32::INFINITY);
        ensure_interval!(vf, f32::NEG_INFINITY, vi);
        Ok(Self { rate, vi, vf })
    }
}

impl Decay for Exponential {
    fn evaluate(&self, t: f32) -> f32 {
        let &Self { rate, vi, vf } = self;
        vf + (vi - vf) * (-rate * t).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_decay() {
        let x = Constant::new(0.2);
        assert_eq!(x.evaluate(0.0), 0.2);
        assert_eq!(x.evaluate(8000.0), 0.2);
    }

    #[test]
    fn exponential_decay() {
        let x = Exponential::new(2.0, 1.0, 0.1).unwrap();
        assert_eq!(x.evaluate(0.0), 1.0);
        assert_eq!(x.evaluate(1.0), 0.1 + 0.9 * f32::exp(-2.0));
        assert!((x.evaluate(100.0) - 0.1).abs() < 1e-6, "Decays to the final value");
    }

    #[test]
    fn exponential_rejects_growth() {
        assert!(Exponential::new(-1.0, 1.0, 0.0).is_err());
        assert!(Exponential::new(1.0, 0.1, 0.5).is_err());
    }
}
