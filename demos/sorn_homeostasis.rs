use clap::Parser;

use rusty_neurons::config::SimulationConfig;
use rusty_neurons::core::network::Network;
use rusty_neurons::error::SimError;
use rusty_neurons::rules::sorn::SornRule;
use rusty_neurons::rules::NeuronRule;

#[derive(Parser, Debug)]
struct Args {
    /// The seed used for wiring, initialization and noise
    #[arg(long, default_value = "0")]
    seed: u64,
    /// The number of units
    #[arg(short = 'L', long, default_value = "200")]
    num_units: usize,
    /// The number of incoming synapses per unit
    #[arg(short = 'K', long, default_value = "10")]
    num_inputs: usize,
    /// The homeostatic target rate
    #[arg(long, default_value = "0.1")]
    target_rate: f64,
    /// The learning rate of the thresholds
    #[arg(long, default_value = "0.01")]
    eta_ip: f64,
    /// The number of ticks
    #[arg(short = 'T', long, default_value = "5000")]
    num_ticks: u64,
    /// Optional path of a JSON simulation configuration, overriding the seed and the number of ticks
    #[arg(long)]
    config: Option<String>,
    /// Optional path to save the final network to
    #[arg(long)]
    output: Option<String>,
}

fn main() -> Result<(), SimError> {
    env_logger::init();
    let args = Args::parse();
    log::info!("{:?}", args);

    let config = match &args.config {
        Some(path) => SimulationConfig::load_from(path)?,
        None => SimulationConfig {
            time_step: 1.0,
            seed: args.seed,
            num_ticks: args.num_ticks,
            ..Default::default()
        },
    };
    let mut network = Network::from_config(&config)?;

    let mut rule = SornRule::default();
    rule.set_target_rate(args.target_rate)?;
    rule.set_eta_ip(args.eta_ip)?;
    rule.set_add_noise(true);
    let template = NeuronRule::Sorn(rule);
    for _ in 0..args.num_units {
        network.add_unit(&template);
    }

    // A deterministic sparse wiring: excitatory forward, inhibitory backward
    for target in 0..args.num_units {
        for k in 1..=args.num_inputs {
            let source = (target * 31 + k * 17) % args.num_units;
            let strength = if k % 5 == 0 { -0.5 } else { 0.2 };
            network.add_synapse(source, target, strength)?;
        }
    }
    network.randomize()?;
    log::info!("Network with {} synapses: done!", network.num_synapses());

    let window = (config.num_ticks / 10).max(1);
    let mut spikes = 0usize;
    for tick in 1..=config.num_ticks {
        network.update()?;
        spikes += network.units().iter().filter(|unit| unit.is_spike()).count();
        if tick % window == 0 {
            let rate = spikes as f64 / (window as usize * args.num_units.max(1)) as f64;
            println!("t={:>8.1}  rate={:.4}  (target {:.4})", network.clock().time(), rate, args.target_rate);
            spikes = 0;
        }
    }

    if let Some(path) = &args.output {
        network.save_to(path)?;
        log::info!("Network saving: done! Saved to {}", path);
    }
    Ok(())
}
