use std::error::Error;

use gridmdp::{
    algo::{ValueIterationAgent, ValueIterationAgentConfig},
    gym::standard_grid,
    viz,
};

const OBEY_PROB: f64 = 0.8;
const STEP_COST: f64 = -0.1;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let env = standard_grid(OBEY_PROB, Some(STEP_COST))?;
    let (rows, cols) = (env.rows(), env.cols());

    println!("Rewards:");
    print!("{}", viz::render_values(env.rewards(), rows, cols));

    let mut agent = ValueIterationAgent::new(ValueIterationAgentConfig::default())?;
    let sweeps = agent.learn(&env)?;

    println!("Values after {sweeps} sweeps:");
    print!("{}", viz::render_values(agent.state_value(), rows, cols));
    println!("Policy:");
    print!("{}", viz::render_policy(agent.policy(), rows, cols));

    Ok(())
}
