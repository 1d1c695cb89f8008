/// Checks that a numerical value is in the provided interval `[a,b]` and returns early
/// with an [`Error::Configuration`](crate::error::Error::Configuration) if not
///
/// ### Example
/// ```ignore
/// let value = 2.0;
/// ensure_interval!(value, 0.0, 1.0);
/// ```
/// This returns an error with the message "Invalid value for \`value\`: 2. Must be in the interval \[0, 1\]."
#[macro_export]
macro_rules! ensure_interval {
    ($var:expr, $a:expr, $b:expr) => {
        if !($var >= $a && $var <= $b) {
            return Err($crate::error::Error::Configuration(format!(
                "Invalid value for `{}`: {}. Must be in the interval [{}, {}].",
                stringify!($var),
                $var,
                $a,
                $b,
            )));
        }
    };
}

/// Index of the first maximum in an iterator of `(key, value)` pairs
///
/// Ties go to the earliest key, so the iteration order of the input decides between equal values.
pub fn argmax<K>(items: impl IntoIterator<Item = (K, f64)>) -> Option<(K, f64)> {
    items.into_iter().fold(None, |best, (k, v)| match best {
        Some((_, best_v)) if v <= best_v => best,
        Some(_) if v.is_nan() => best,
        _ => Some((k, v)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};

    fn check(value: f64) -> Result<()> {
        ensure_interval!(value, 0.0, 1.0);
        Ok(())
    }

    #[test]
    fn ensure_interval_functional() {
        assert!(check(0.0).is_ok(), "Lower bound is inclusive");
        assert!(check(1.0).is_ok(), "Upper bound is inclusive");
        assert!(matches!(check(1.5), Err(Error::Configuration(_))));
        assert!(check(-0.1).is_err(), "Below interval is rejected");
        assert!(check(f64::NAN).is_err(), "NaN is rejected");
    }

    #[test]
    fn argmax_prefers_first_on_ties() {
        let items = [("a", 1.0), ("b", 3.0), ("c", 3.0), ("d", 2.0)];
        assert_eq!(argmax(items), Some(("b", 3.0)));
        assert_eq!(argmax(Vec::<(u8, f64)>::new()), None, "Empty input has no max");
        assert_eq!(
            argmax([(0, 0.0), (1, 0.0)]),
            Some((0, 0.0)),
            "All equal picks the first key"
        );
    }
}
