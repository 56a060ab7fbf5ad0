//! Interactive console front-end.
//!
//! The menu owns all prompting, the save-directory bookkeeping, and the rule
//! that an open network is checkpointed on every exit path; the library never
//! persists anything on its own.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};

use magnetite_nn::{
    checkpoint,
    train::{evaluate_from_paths, train_from_paths},
    DatasetPaths, Network, NumericDecode, TrainConfig,
};

const NETS_DIR: &str = "nets";

fn main() -> Result<()> {
    loop {
        println!("Enter 'n' for a new net, 'l' to load an existing one, 'q' to quit");
        match prompt("> ")?.as_str() {
            "n" => {
                if let Err(e) = new_net() {
                    println!("{e:#}");
                }
            }
            "l" => {
                if let Err(e) = load_net() {
                    println!("{e:#}");
                }
            }
            "q" => return Ok(()),
            other => println!("Unrecognized option '{other}'"),
        }
    }
}

fn new_net() -> Result<()> {
    let hidden_height: usize = prompt_parse("Hidden layer height: ")?;
    let hidden_count: usize = prompt_parse("Hidden layer count: ")?;
    let output_size: usize = prompt_parse("Output size: ")?;
    let input_size: usize = prompt_parse("Input size: ")?;
    if hidden_count < 1 {
        bail!("at least one hidden layer is required");
    }

    let mut net = Network::new(hidden_height, hidden_count, input_size, output_size);
    net.set_paths(prompt_paths()?);

    let save_dir = next_save_dir()?;
    println!("This net will save to '{}'", save_dir.display());
    session(&mut net, save_dir)
}

fn load_net() -> Result<()> {
    let dir = PathBuf::from(prompt("Checkpoint directory (relative to working directory): ")?);
    let mut net = checkpoint::load(&dir)?;
    println!(
        "Loaded: {} hidden layers, learning rate {}",
        net.hidden_count(),
        net.learning_rate()
    );
    // The net keeps saving to the folder it was loaded from.
    session(&mut net, dir)
}

/// Runs the per-network menu, then checkpoints on the way out — including
/// when the menu itself failed.
fn session(net: &mut Network, save_dir: PathBuf) -> Result<()> {
    let outcome = menu_loop(net, &save_dir);
    match checkpoint::save(net, &save_dir) {
        Ok(()) => println!("Saved to '{}'", save_dir.display()),
        Err(e) => println!("{e}"),
    }
    outcome
}

fn menu_loop(net: &mut Network, save_dir: &Path) -> Result<()> {
    loop {
        println!("'t' train, 'o' test, 'c' change params, 'e' export snapshot, 's' save, 'q' save and close");
        match prompt("> ")?.as_str() {
            "t" => match prompt_parse::<usize>("Epochs to train for: ") {
                Ok(epochs) => {
                    let mut config = TrainConfig::new(epochs);
                    config.checkpoint_dir = Some(save_dir.to_path_buf());
                    if let Err(e) = train_from_paths(net, &config) {
                        println!("{e}");
                    }
                }
                Err(e) => println!("{e:#}"),
            },
            "o" => match evaluate_from_paths(net, NumericDecode::default()) {
                Ok(report) => println!(
                    "Correct: {} / {} ({:.1}%)",
                    report.correct,
                    report.total,
                    report.accuracy_pct()
                ),
                Err(e) => println!("{e}"),
            },
            "c" => change_params(net)?,
            "e" => {
                let path = save_dir.join("snapshot.json");
                match net.export_json(&path) {
                    Ok(()) => println!("Wrote '{}'", path.display()),
                    Err(e) => println!("{e}"),
                }
            }
            "s" => match checkpoint::save(net, save_dir) {
                Ok(()) => println!("Saved to '{}'", save_dir.display()),
                Err(e) => println!("{e}"),
            },
            "q" => return Ok(()),
            other => println!("Unrecognized option '{other}'"),
        }
    }
}

fn change_params(net: &mut Network) -> Result<()> {
    match prompt("'l' learning rate, 'f' dataset paths: ")?.as_str() {
        "l" => {
            println!("Current learning rate: {}", net.learning_rate());
            match prompt_parse::<f64>("New learning rate: ") {
                Ok(rate) => net.set_learning_rate(rate),
                Err(e) => println!("{e:#}"),
            }
        }
        "f" => {
            let p = net.paths();
            println!(
                "Current paths:\n  {}\n  {}\n  {}\n  {}",
                p.train_items, p.train_labels, p.test_items, p.test_labels
            );
            net.set_paths(prompt_paths()?);
        }
        other => println!("Unrecognized option '{other}'"),
    }
    Ok(())
}

fn prompt_paths() -> Result<DatasetPaths> {
    Ok(DatasetPaths {
        train_items: prompt("Training items path: ")?,
        train_labels: prompt("Training labels path: ")?,
        test_items: prompt("Testing items path: ")?,
        test_labels: prompt("Testing labels path: ")?,
    })
}

fn prompt(msg: &str) -> Result<String> {
    print!("{msg}");
    io::stdout().flush().context("cannot flush stdout")?;

    let mut line = String::new();
    let read = io::stdin().read_line(&mut line).context("cannot read stdin")?;
    if read == 0 {
        bail!("end of input");
    }
    Ok(line.trim().to_owned())
}

fn prompt_parse<T: std::str::FromStr>(msg: &str) -> Result<T> {
    let line = prompt(msg)?;
    line.parse()
        .map_err(|_| anyhow!("'{line}' is not a valid value here"))
}

/// Picks the next unused `nets/net_NN` directory by scanning what already
/// exists. The directory itself is created by the first checkpoint save.
fn next_save_dir() -> Result<PathBuf> {
    let base = Path::new(NETS_DIR);
    fs::create_dir_all(base).with_context(|| format!("cannot create '{NETS_DIR}'"))?;

    let mut max_seen = 0u32;
    for entry in fs::read_dir(base).with_context(|| format!("cannot scan '{NETS_DIR}'"))? {
        let name = entry?.file_name();
        if let Some(n) = name
            .to_str()
            .and_then(|s| s.strip_prefix("net_"))
            .and_then(|s| s.parse::<u32>().ok())
        {
            max_seen = max_seen.max(n);
        }
    }

    Ok(base.join(format!("net_{:02}", max_seen + 1)))
}
