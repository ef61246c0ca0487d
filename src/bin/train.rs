//! Headless training run.
//!
//! Usage: `train [config.json] [frames]`
//!
//! Logs progress through `RUST_LOG` (default `info`) and prints the sampled
//! loss history as JSON once done.

use std::env;
use std::fs;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use log::info;

use playground::schedule::ThreadScheduler;
use playground::{Playground, PlaygroundConfig, TrainingLoop};

const DEFAULT_FRAMES: usize = 500;

/// Sleep between frames; the poller in `main` takes the same lock.
const FRAME_INTERVAL: Duration = Duration::from_millis(1);

fn load_config(path: Option<&str>) -> anyhow::Result<PlaygroundConfig> {
    let config: PlaygroundConfig = match path {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path))?
        }
        None => PlaygroundConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    let config = load_config(args.first().map(String::as_str))?;
    let frames = match args.get(1) {
        Some(n) => n.parse().with_context(|| format!("invalid frame count {:?}", n))?,
        None => DEFAULT_FRAMES,
    };
    info!(
        "{} dataset, hidden layers {:?}, {} activation, {} features",
        config.dataset,
        config.hidden_layers,
        config.activation,
        config.features.count()
    );

    let playground = Playground::new(config)?;
    if playground.dataset().train.is_empty() {
        anyhow::bail!("no training points to learn from");
    }
    let mut training = TrainingLoop::new(playground, ThreadScheduler::new(FRAME_INTERVAL));
    training.play();
    while training.playground().lock().epoch() < frames {
        thread::sleep(Duration::from_millis(10));
    }
    training.pause();

    let playground = training.playground().lock();
    let progress = playground.progress();
    let accuracy = playground.accuracy()?;
    info!(
        "epoch {}: train loss {:.4} test loss {:.4}",
        progress.epoch, progress.train_loss, progress.test_loss
    );
    info!(
        "accuracy: train {:.1}% test {:.1}%",
        accuracy.train * 100.0,
        accuracy.test * 100.0
    );
    println!("{}", serde_json::to_string_pretty(playground.loss_history())?);
    Ok(())
}
