use anyhow::{bail, Result};
use common::{ConfigStore, LogSink, RetargetConfig, Retargeter};
use log::{debug, error, info, trace};
use rigpuppet::replay::{load_frames, replay};
use rigpuppet::rig_file::RigFile;
use std::path::PathBuf;

const USAGE: &str = "usage: rigpuppet <rig.json> <frames.jsonl> [--config <config.json>]";

struct Args {
    rig: PathBuf,
    frames: PathBuf,
    config: PathBuf,
}

fn parse_args() -> Result<Args> {
    let mut positional = Vec::new();
    let mut config = PathBuf::from(common::CONFIG_FILENAME);

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => match args.next() {
                Some(path) => config = PathBuf::from(path),
                None => bail!("--config needs a path\n{}", USAGE),
            },
            "-h" | "--help" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            _ => positional.push(PathBuf::from(arg)),
        }
    }

    match <[PathBuf; 2]>::try_from(positional) {
        Ok([rig, frames]) => Ok(Args {
            rig,
            frames,
            config,
        }),
        Err(_) => bail!("{}", USAGE),
    }
}

fn main() -> Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }
    env_logger::init();

    info!("Starting...");
    debug!("Debug logging is active");
    trace!("Trace logging is active");

    let args = parse_args()?;

    let mut store = ConfigStore::new(args.config);
    let config = match store.load() {
        Ok(config) => config.clone(),
        Err(e) => {
            error!("Failed to load config: {:#}. Using defaults.", e);
            RetargetConfig::default()
        }
    };
    info!("Loaded Config: {:?}", config);

    let mut rig = RigFile::load(&args.rig)?.into_rig()?;
    let frames = load_frames(&args.frames)?;
    info!("Replaying {} frames", frames.len());

    let mut retargeter = Retargeter::new(config).with_sink(LogSink);
    let summary = replay(&mut retargeter, &mut rig, &frames);

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
