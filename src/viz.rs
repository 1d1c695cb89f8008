use std::collections::HashMap;

use crate::gym::{Action, Pos};

const SEPARATOR: &str = "---------------------------";

/// Render a state value table as a fixed-width text grid
///
/// Cells without an entry show `0.00`.
pub fn render_values(values: &HashMap<Pos, f64>, rows: usize, cols: usize) -> String {
    render(rows, cols, |pos| {
        let v = values.get(&pos).copied().unwrap_or_default();
        if v >= 0.0 {
            format!(" {v:.2}|")
        } else {
            format!("{v:.2}|")
        }
    })
}

/// Render a policy as a fixed-width text grid of action symbols
///
/// Cells without an entry are left blank.
pub fn render_policy(policy: &HashMap<Pos, Action>, rows: usize, cols: usize) -> String {
    render(rows, cols, |pos| match policy.get(&pos) {
        Some(action) => format!("  {action}  |"),
        None => String::from("     |"),
    })
}

fn render(rows: usize, cols: usize, cell: impl Fn(Pos) -> String) -> String {
    let mut out = String::new();
    for row in 0..rows {
        out.push_str(SEPARATOR);
        out.push('\n');
        for col in 0..cols {
            out.push_str(&cell((row as i32, col as i32)));
        }
        out.push('\n');
    }

    out
}
