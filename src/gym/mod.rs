pub mod grid_world;

pub use grid_world::{standard_grid, Action, GridWorld, Pos};
