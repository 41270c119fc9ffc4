use anyhow::Context;
use shelfpick::console::{Console, Flow, HELP};
use shelfpick::{
    init_logging, simulated_controller, Config, Connector, LoopbackConnector, PickerSession,
    SerialConnector, BUILD_DATE, VERSION,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

const USAGE: &str = "usage: shelfpick [--simulate] [config.toml|config.json]";

struct Args {
    simulate: bool,
    config: Option<PathBuf>,
}

fn parse_args() -> anyhow::Result<Option<Args>> {
    let mut args = Args {
        simulate: false,
        config: None,
    };
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--simulate" => args.simulate = true,
            "-h" | "--help" => {
                println!("{}", USAGE);
                return Ok(None);
            }
            "-V" | "--version" => {
                println!("shelfpick {} ({})", VERSION, BUILD_DATE);
                return Ok(None);
            }
            flag if flag.starts_with('-') => anyhow::bail!("unknown option '{}'\n{}", flag, USAGE),
            path => {
                if args.config.replace(PathBuf::from(path)).is_some() {
                    anyhow::bail!("more than one config file given\n{}", USAGE);
                }
            }
        }
    }
    Ok(Some(args))
}

fn main() -> anyhow::Result<()> {
    init_logging()?;

    let Some(args) = parse_args()? else {
        return Ok(());
    };

    let config_path = match args.config {
        Some(path) => path,
        None => Config::default_path()?,
    };
    let config = Config::load_or_default(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    let connector: Box<dyn Connector> = if args.simulate {
        Box::new(LoopbackConnector::with_responder(simulated_controller()))
    } else {
        Box::new(SerialConnector)
    };
    let default_port = match (&config.connection.port, args.simulate) {
        (Some(port), _) => Some(port.clone()),
        (None, true) => Some("simulated".to_string()),
        (None, false) => None,
    };

    let session = PickerSession::new(
        connector,
        config.catalog.to_catalog(),
        config.connection.session_options(),
    );
    let mut console = Console::new(session, default_port);
    let poll_interval = Duration::from_millis(config.connection.poll_interval_ms);

    let (tx, rx) = mpsc::channel::<String>();
    thread::Builder::new()
        .name("stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })
        .context("starting input thread")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "shelfpick {}{}", VERSION, if args.simulate { " (simulated)" } else { "" })?;
    writeln!(out, "{}", HELP)?;
    out.flush()?;

    loop {
        match rx.recv_timeout(poll_interval) {
            Ok(line) => {
                if console.handle_line(&line, &mut out)? == Flow::Quit {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => console.pump(&mut out)?,
            Err(RecvTimeoutError::Disconnected) => {
                console.handle_line("quit", &mut out)?;
                break;
            }
        }
        out.flush()?;
    }

    out.flush()?;
    Ok(())
}
