extern crate gymnasium;
extern crate serde_json;

use gymnasium::*;
use serde_json::to_value;

fn main() -> GymResult<()> {
    let envs = Environment::envs("http://127.0.0.1:40004")?;
    println!("Open environments: {:?}", envs);
    let mut env = Environment::new(
        "http://127.0.0.1:40004",
        "FrozenLake-v1",
        Some(100),
        Some(false),
        Some(true),
        &[
            ("render_mode", to_value("ansi")?),
            ("map_name", to_value("8x8")?),
            ("is_slippery", to_value(true)?),
        ],
    )?;

    println!("observation space:\n{:?}\n", env.observation_space());
    println!("action space:\n{:?}\n", env.action_space());
    let transitions = env.transitions()?;
    println!("transtion:\n{:?}\n", &transitions[(14, 2)]);

    for ep in 0..10 {
        let _ = env.reset(Some(2718))?;
        let mut tot_reward = 0.;
        loop {
            let action = env.action_space_sample()?;
            let state = env.step(action)?;
            let render_frame = env.render()?;
            print!("{esc}[2J{esc}[1;1H", esc = 27 as char);
            println!("{}", render_frame.as_str().unwrap_or_default());
            tot_reward += state.reward;

            if state.truncated || state.terminated {
                break;
            }
        }
        println!("Finished episode {} with total reward {}", ep, tot_reward);
    }

    Ok(())
}
