//! Line-oriented operator console
//!
//! Parses operator commands, runs them against a [`PickerSession`] and echoes
//! new session log events and motion state changes to an output stream.

use shelfpick_communication::{list_ports, PickerSession};
use shelfpick_core::MotionState;
use std::io::{self, Write};
use std::str::FromStr;
use thiserror::Error;

/// Help text listing every console command
pub const HELP: &str = "\
commands:
  ports              list serial ports
  connect [port]     open the link (default port from config)
  disconnect         close the link
  articles           list known articles
  pick <article>     move to the article's shelf and pick
  home               run the homing cycle
  stop               stop immediately
  send <raw>         send a raw command line
  state              show connection and motion state
  help               show this text
  quit               disconnect and exit";

/// Errors from parsing an operator line
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),

    #[error("'{command}' needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
}

/// One parsed operator command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Ports,
    Connect(Option<String>),
    Disconnect,
    Articles,
    Pick(String),
    Home,
    Stop,
    Send(String),
    State,
    Help,
    Quit,
}

impl FromStr for ConsoleCommand {
    type Err = ConsoleError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let arg = (!rest.is_empty()).then(|| rest.to_string());

        match word.to_lowercase().as_str() {
            "" => Err(ConsoleError::Empty),
            "ports" => Ok(Self::Ports),
            "connect" => Ok(Self::Connect(arg)),
            "disconnect" => Ok(Self::Disconnect),
            "articles" => Ok(Self::Articles),
            "pick" => arg.map(Self::Pick).ok_or(ConsoleError::MissingArgument {
                command: "pick",
                argument: "an article",
            }),
            "home" => Ok(Self::Home),
            "stop" => Ok(Self::Stop),
            "send" => arg.map(Self::Send).ok_or(ConsoleError::MissingArgument {
                command: "send",
                argument: "a command line",
            }),
            "state" => Ok(Self::State),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(ConsoleError::Unknown(other.to_string())),
        }
    }
}

/// Whether the console keeps running after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Console bound to one session
pub struct Console {
    session: PickerSession,
    default_port: Option<String>,
    cursor: u64,
    shown_state: MotionState,
}

impl Console {
    pub fn new(session: PickerSession, default_port: Option<String>) -> Self {
        let cursor = session.log().next_seq();
        let shown_state = session.motion_state();
        Self {
            session,
            default_port,
            cursor,
            shown_state,
        }
    }

    pub fn session(&self) -> &PickerSession {
        &self.session
    }

    /// Parse and run one operator line
    pub fn handle_line(&mut self, line: &str, out: &mut impl Write) -> io::Result<Flow> {
        match line.parse::<ConsoleCommand>() {
            Ok(command) => self.execute(command, out),
            Err(ConsoleError::Empty) => Ok(Flow::Continue),
            Err(e) => {
                writeln!(out, "{}", e)?;
                Ok(Flow::Continue)
            }
        }
    }

    /// Run one command
    pub fn execute(&mut self, command: ConsoleCommand, out: &mut impl Write) -> io::Result<Flow> {
        let result = match command {
            ConsoleCommand::Ports => {
                self.print_ports(out)?;
                Ok(())
            }
            ConsoleCommand::Connect(port) => match port.or_else(|| self.default_port.clone()) {
                Some(port) => self.session.connect(&port),
                None => {
                    writeln!(out, "no port given and none configured")?;
                    Ok(())
                }
            },
            ConsoleCommand::Disconnect => {
                self.session.disconnect();
                Ok(())
            }
            ConsoleCommand::Articles => {
                self.print_articles(out)?;
                Ok(())
            }
            ConsoleCommand::Pick(article) => self.session.pick(&article).map(|_| ()),
            ConsoleCommand::Home => self.session.home(),
            ConsoleCommand::Stop => self.session.stop(),
            ConsoleCommand::Send(raw) => self.session.send(&raw),
            ConsoleCommand::State => {
                self.print_state(out)?;
                Ok(())
            }
            ConsoleCommand::Help => {
                writeln!(out, "{}", HELP)?;
                Ok(())
            }
            ConsoleCommand::Quit => {
                self.session.disconnect();
                self.pump(out)?;
                return Ok(Flow::Quit);
            }
        };

        if let Err(e) = result {
            report(&e, out)?;
        }
        self.pump(out)?;
        Ok(Flow::Continue)
    }

    /// Poll the session and print anything new
    pub fn pump(&mut self, out: &mut impl Write) -> io::Result<()> {
        self.session.poll();

        for event in self.session.log().since(self.cursor) {
            writeln!(out, "{}", event.formatted_with_time())?;
        }
        self.cursor = self.session.log().next_seq();

        let state = self.session.motion_state();
        if state != self.shown_state {
            writeln!(out, "state: {} ({})", state, state.indicator())?;
            self.shown_state = state;
        }
        Ok(())
    }

    fn print_ports(&self, out: &mut impl Write) -> io::Result<()> {
        match list_ports() {
            Ok(ports) if ports.is_empty() => writeln!(out, "no serial ports found"),
            Ok(ports) => {
                for port in ports {
                    writeln!(out, "{:<16} {}", port.port_name, port.description)?;
                }
                Ok(())
            }
            Err(e) => writeln!(out, "{}", e),
        }
    }

    fn print_articles(&self, out: &mut impl Write) -> io::Result<()> {
        let catalog = self.session.catalog();
        if catalog.is_empty() {
            return writeln!(out, "no articles configured");
        }
        for name in catalog.article_names() {
            writeln!(out, "  {}", name)?;
        }
        Ok(())
    }

    fn print_state(&self, out: &mut impl Write) -> io::Result<()> {
        let link = match self.session.port() {
            Some(port) if self.session.is_link_stale() => format!("{} (link lost)", port),
            Some(port) => port.to_string(),
            None => "disconnected".to_string(),
        };
        let state = self.session.motion_state();
        writeln!(out, "link: {}", link)?;
        writeln!(out, "state: {} ({})", state, state.indicator())
    }
}

// Resolve failures and missing links are operator mistakes; everything else
// was already recorded in the session log.
fn report(error: &shelfpick_core::Error, out: &mut impl Write) -> io::Result<()> {
    if error.is_resolve_error() || error.is_not_connected() {
        writeln!(out, "{}", error)?;
    } else {
        tracing::debug!("Command failed: {}", error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelfpick_communication::{simulated_controller, LoopbackConnector, SessionOptions};
    use shelfpick_core::standard_catalog;
    use shelfpick_settings::Config;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    fn console(connector: &LoopbackConnector) -> Console {
        let options = SessionOptions {
            timeout_ms: 10,
            ..Default::default()
        };
        let session = PickerSession::new(Box::new(connector.clone()), standard_catalog(), options);
        Console::new(session, Some("loop0".to_string()))
    }

    fn run(console: &mut Console, line: &str) -> String {
        let mut out = Vec::new();
        console.handle_line(line, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!("ports".parse::<ConsoleCommand>(), Ok(ConsoleCommand::Ports));
        assert_eq!("connect".parse::<ConsoleCommand>(), Ok(ConsoleCommand::Connect(None)));
        assert_eq!(
            "CONNECT /dev/ttyUSB0".parse::<ConsoleCommand>(),
            Ok(ConsoleCommand::Connect(Some("/dev/ttyUSB0".to_string())))
        );
        assert_eq!(
            "pick  Schraube M4x20 ".parse::<ConsoleCommand>(),
            Ok(ConsoleCommand::Pick("Schraube M4x20".to_string()))
        );
        assert_eq!(
            "send PICK_X 10".parse::<ConsoleCommand>(),
            Ok(ConsoleCommand::Send("PICK_X 10".to_string()))
        );
        assert_eq!("Articles".parse::<ConsoleCommand>(), Ok(ConsoleCommand::Articles));
        assert_eq!("quit".parse::<ConsoleCommand>(), Ok(ConsoleCommand::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("   ".parse::<ConsoleCommand>(), Err(ConsoleError::Empty));
        assert!(matches!(
            "pick".parse::<ConsoleCommand>(),
            Err(ConsoleError::MissingArgument { command: "pick", .. })
        ));
        assert_eq!(
            "jog 5".parse::<ConsoleCommand>(),
            Err(ConsoleError::Unknown("jog".to_string()))
        );
    }

    #[test]
    fn test_connect_uses_default_port() {
        let connector = LoopbackConnector::new();
        let mut console = console(&connector);
        let out = run(&mut console, "connect");
        assert!(out.contains("[INFO] Connected: loop0"));
        assert_eq!(console.session().port(), Some("loop0"));
    }

    #[test]
    fn test_pick_prints_command_and_state() {
        let connector = LoopbackConnector::new();
        let mut console = console(&connector);
        run(&mut console, "connect");

        let out = run(&mut console, "pick m6x30");
        assert!(out.contains("'M6x30' -> shelf 3 (120 mm)"));
        assert!(out.contains(">> PICK_X 120.0"));
        assert!(out.contains("state: Picking (Moving...)"));
        assert_eq!(connector.written_lines(), vec!["PICK_X 120.0"]);
    }

    #[test]
    fn test_articles_lists_catalog() {
        let connector = LoopbackConnector::new();
        let mut console = console(&connector);
        let out = run(&mut console, "articles");
        let names: Vec<&str> = out.lines().map(str::trim).collect();
        assert_eq!(names, console.session().catalog().article_names());
        assert!(names.contains(&"M6x30"));
    }

    #[test]
    fn test_unknown_article_is_reported() {
        let connector = LoopbackConnector::new();
        let mut console = console(&connector);
        run(&mut console, "connect");

        let out = run(&mut console, "pick unknown-item");
        assert!(out.contains("unknown-item"));
        assert!(connector.written().is_empty());
    }

    #[test]
    fn test_not_connected_is_reported() {
        let connector = LoopbackConnector::new();
        let mut console = console(&connector);
        let out = run(&mut console, "home");
        assert!(out.to_lowercase().contains("not connected"));
    }

    #[test]
    fn test_quit_disconnects() {
        let connector = LoopbackConnector::new();
        let mut console = console(&connector);
        run(&mut console, "connect");

        let mut out = Vec::new();
        let flow = console.handle_line("quit", &mut out).unwrap();
        assert_eq!(flow, Flow::Quit);
        assert!(!console.session().is_connected());
        assert_eq!(connector.active_readers(), 0);
    }

    fn console_from(config: &Config, connector: &LoopbackConnector) -> Console {
        let mut options = config.connection.session_options();
        options.timeout_ms = 10;
        let session = PickerSession::new(
            Box::new(connector.clone()),
            config.catalog.to_catalog(),
            options,
        );
        Console::new(session, config.connection.port.clone())
    }

    #[test]
    fn test_configured_catalog_and_port() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shelfpick.toml");
        std::fs::write(
            &path,
            r#"
[connection]
port = "sim0"

[[catalog.shelves]]
id = 9
x_mm = 42.5

[[catalog.articles]]
name = "Dowel 8mm"
shelf = 9
"#,
        )
        .unwrap();
        let config = Config::load_from_file(&path).unwrap();

        let connector = LoopbackConnector::with_responder(simulated_controller());
        let mut console = console_from(&config, &connector);
        let mut out = Vec::new();

        console.handle_line("articles", &mut out).unwrap();
        console.handle_line("connect", &mut out).unwrap();
        console.handle_line("pick dowel 8MM", &mut out).unwrap();
        assert_eq!(connector.written_lines(), vec!["PICK_X 42.5"]);

        let deadline = Instant::now() + Duration::from_secs(2);
        while console.session().motion_state() != MotionState::Idle {
            assert!(Instant::now() < deadline, "pick cycle did not finish");
            console.pump(&mut out).unwrap();
            std::thread::sleep(Duration::from_millis(5));
        }

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("  Dowel 8mm\n"));
        assert!(text.contains("<< PICK: DONE"));
        assert!(text.contains("state: Idle (Stationary)"));
    }

    #[test]
    fn test_stop_and_quit() {
        let connector = LoopbackConnector::with_responder(simulated_controller());
        let mut console = console_from(&Config::default(), &connector);
        let mut out = Vec::new();

        console.handle_line("connect sim1", &mut out).unwrap();
        console.handle_line("stop", &mut out).unwrap();
        assert_eq!(console.session().motion_state(), MotionState::Stopped);

        assert_eq!(console.handle_line("quit", &mut out).unwrap(), Flow::Quit);
        assert_eq!(console.session().motion_state(), MotionState::Idle);
        assert_eq!(connector.max_active_readers(), 1);
    }
}
