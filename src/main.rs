use log::info;
use prize_wheel::input::{spawn_serial_reader, spawn_stdin_reader};
use prize_wheel::{Wheel, WheelConfig};
use simplelog::{Config as LogConfig, LevelFilter, SimpleLogger};
use std::env;
use std::error::Error;
use std::path::PathBuf;

const USAGE: &str = "usage: prize-wheel [--labels a,b,..] [--weights w,..] [--duration s] \
[--turns min max] [--hold s] [--seed n] [--font path] [--title t] [--fullscreen] \
[--stdin | --serial [path]] [--verbose]";

enum Trigger {
    Keyboard,
    Stdin,
    Serial(Option<String>),
}

fn parse_list<T: std::str::FromStr>(value: &str) -> Result<Vec<T>, String> {
    value
        .split(',')
        .map(|item| {
            item.trim()
                .parse()
                .map_err(|_| format!("could not parse list item {item:?}"))
        })
        .collect()
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<String>) -> Result<T, String> {
    let value = value.ok_or_else(|| format!("{flag} needs a value\n{USAGE}"))?;
    value
        .parse()
        .map_err(|_| format!("invalid value {value:?} for {flag}"))
}

fn main() -> Result<(), Box<dyn Error>> {
    let mut config = WheelConfig::default();
    let mut trigger = Trigger::Keyboard;
    let mut verbose = false;

    let mut args = env::args().skip(1).peekable();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--labels" => {
                let labels = parse_value::<String>(&arg, args.next())?;
                config.segment_labels = labels.split(',').map(|l| l.trim().to_string()).collect();
            }
            "--weights" => {
                let weights = parse_value::<String>(&arg, args.next())?;
                config.weights = Some(parse_list(&weights)?);
            }
            "--duration" => config.spin_duration = parse_value(&arg, args.next())?,
            "--turns" => {
                config.min_turns = parse_value(&arg, args.next())?;
                config.max_turns = parse_value(&arg, args.next())?;
            }
            "--hold" => config.result_hold = parse_value(&arg, args.next())?,
            "--seed" => config.seed = Some(parse_value(&arg, args.next())?),
            "--font" => {
                let path = parse_value::<String>(&arg, args.next())?;
                config.font_path = Some(PathBuf::from(path));
            }
            "--title" => config.title = parse_value(&arg, args.next())?,
            "--fullscreen" => config.fullscreen = true,
            "--stdin" => trigger = Trigger::Stdin,
            "--serial" => {
                // optional explicit port, otherwise auto-detect
                let path = args.next_if(|next| !next.starts_with("--"));
                trigger = Trigger::Serial(path);
            }
            "--verbose" => verbose = true,
            "--help" | "-h" => {
                println!("{USAGE}");
                return Ok(());
            }
            other => return Err(format!("unknown argument {other:?}\n{USAGE}").into()),
        }
    }

    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    SimpleLogger::init(level, LogConfig::default())?;

    let mut wheel = Wheel::new(config)?;
    info!(
        "wheel ready with {} segments: {}",
        wheel.segment_count(),
        wheel.config().segment_labels.join(", ")
    );

    match trigger {
        Trigger::Keyboard => wheel.show(),
        Trigger::Stdin => wheel.show_with_commands(spawn_stdin_reader()),
        Trigger::Serial(path) => wheel.show_with_commands(spawn_serial_reader(path)),
    }
}
