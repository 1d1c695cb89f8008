use std::{error::Error, fs, path::Path};

use gridmdp::{
    algo::{MonteCarloAgent, MonteCarloAgentConfig},
    gym::standard_grid,
    viz,
};
use rand::{rngs::StdRng, SeedableRng};

const OBEY_PROB: f64 = 0.8;
const STEP_COST: f64 = -0.2;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    // Optional seed for a reproducible run
    let mut rng = match std::env::args().nth(1) {
        Some(seed) => StdRng::seed_from_u64(seed.parse()?),
        None => StdRng::from_entropy(),
    };

    let mut env = standard_grid(OBEY_PROB, Some(STEP_COST))?;
    let (rows, cols) = (env.rows(), env.cols());

    println!("Rewards:");
    print!("{}", viz::render_values(env.rewards(), rows, cols));

    let mut agent = MonteCarloAgent::new(MonteCarloAgentConfig::default(), &env, &mut rng)?;
    agent.learn(&mut env, &mut rng)?;

    println!("Final values:");
    print!("{}", viz::render_values(&agent.state_value(), rows, cols));
    println!("Final policy:");
    print!("{}", viz::render_policy(agent.policy(), rows, cols));

    // Write per-episode Q deltas to CSV

    let path = Path::new("demos/monte_carlo_grid");
    fs::create_dir_all(path.join("out"))?;

    let mut wtr = csv::Writer::from_path(path.join("out/deltas.csv"))?;
    wtr.write_record(["episode", "delta"])?;
    for (i, delta) in agent.deltas().iter().enumerate() {
        wtr.write_record([i.to_string(), delta.to_string()])?;
    }
    wtr.flush()?;

    Ok(())
}
