//! # Calculator CLI
//!
//! Terminal front end for `calc_core`. One-shot subcommands for scripting,
//! plus an interactive prompt that mirrors the two-tab calculator page.
//!
//! ## Usage
//!
//! ```bash
//! calc_cli basic 5 + 3                 # 8
//! calc_cli sci sin 30 --angle deg      # 0.5
//! calc_cli sci pi                      # 3.1415926536
//! calc_cli history                     # list past calculations
//! calc_cli replay 1                    # show what row 1 loads into the panels
//! calc_cli clear-history --yes         # clear without asking
//! calc_cli interactive                 # prompt mode
//! ```
//!
//! Logging goes to stderr at `info` by default; set `RUST_LOG` or pass `-v`
//! for more.

mod config;
mod interactive;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use calc_core::replay::Replay;
use calc_core::storage::FileStore;
use calc_core::{
    AngleMode, CalcError, CalculationClient, HistoryStore, HttpTransport, Operator, ScientificFunction,
    Session, Tab,
};
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::{CliConfig, Overrides};

#[derive(Debug, Parser)]
#[command(name = "calc_cli", version, about = "Calculator client with persisted history")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Base URL of the compute service
    #[arg(long, env = "CALC_SERVICE_URL", global = true)]
    service_url: Option<String>,

    /// Directory holding the persisted history
    #[arg(long, env = "CALC_HISTORY_DIR", global = true)]
    history_dir: Option<PathBuf>,

    /// Request timeout in seconds (default: none)
    #[arg(long, env = "CALC_TIMEOUT_SECS", global = true)]
    timeout_secs: Option<u64>,

    /// Config file (default: <config_dir>/calc/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Two-operand arithmetic: <num1> <operator> <num2>
    #[command(allow_negative_numbers = true)]
    Basic {
        num1: String,
        /// One of + - * / ** % (or × ÷ ^)
        operator: String,
        num2: String,
    },
    /// Scientific function: <function> [num]
    #[command(allow_negative_numbers = true)]
    Sci {
        function: String,
        num: Option<String>,
        /// Angle unit for trigonometric functions
        #[arg(long, default_value = "deg")]
        angle: String,
    },
    /// List past calculations, newest first
    History,
    /// Show what a history row loads into the panels (1 = newest)
    Replay { row: usize },
    /// Clear the calculation history
    ClearHistory {
        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },
    /// Interactive prompt
    Interactive,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so results on stdout stay pipeable.
fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Filter used when `RUST_LOG` is unset
fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "calc_core=debug,calc_cli=debug",
        _ => "trace",
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let overrides = Overrides {
        config_path: cli.config.clone(),
        service_url: cli.service_url.clone(),
        history_dir: cli.history_dir.clone(),
        timeout_secs: cli.timeout_secs,
    };
    let config = CliConfig::load(&overrides)?;
    let mut session = open_session(&config)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    match cli.command {
        Command::Basic { num1, operator, num2 } => {
            let operator: Operator = operator.parse().map_err(user_error)?;
            session.set_num1(num1);
            session.set_operator(operator);
            session.set_num2(num2);
            let outcome = runtime.block_on(session.submit_basic());
            Ok(print_outcome(&session, outcome))
        }
        Command::Sci { function, num, angle } => {
            let function: ScientificFunction = function.parse().map_err(user_error)?;
            let angle: AngleMode = angle.parse().map_err(user_error)?;
            session.switch_tab(Tab::Scientific);
            session.set_angle_mode(angle);
            session.set_scientific_num(num.unwrap_or_default());
            let outcome = runtime.block_on(session.submit_scientific(function));
            Ok(print_outcome(&session, outcome))
        }
        Command::History => {
            interactive::print_history(&session);
            Ok(ExitCode::SUCCESS)
        }
        Command::Replay { row } => {
            let replay = row.checked_sub(1).and_then(|index| session.replay(index));
            match replay {
                Some(replay) => {
                    print_replay(&session, &replay);
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    eprintln!("No history row {}", row);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::ClearHistory { yes } => {
            let cleared = if yes {
                session.clear_history(|_| true)
            } else {
                session.clear_history(interactive::confirm_on_terminal)
            }
            .map_err(user_error)?;
            if cleared {
                interactive::print_history(&session);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Interactive => {
            runtime.block_on(interactive::run(&mut session))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn open_session(config: &CliConfig) -> Result<Session> {
    let transport = HttpTransport::new(&config.service_url, config.timeout).map_err(user_error)?;
    let storage = FileStore::open(&config.history_dir).map_err(user_error)?;
    Ok(Session::new(
        CalculationClient::new(transport),
        HistoryStore::load(storage),
    ))
}

fn user_error(e: CalcError) -> anyhow::Error {
    anyhow::anyhow!(e.user_message())
}

fn print_outcome<T>(session: &Session, outcome: calc_core::CalcResult<T>) -> ExitCode {
    match outcome {
        Ok(_) => {
            println!("{}", session.display());
            ExitCode::SUCCESS
        }
        Err(_) => {
            eprintln!("Error: {}", session.error().unwrap_or("calculation failed"));
            ExitCode::FAILURE
        }
    }
}

fn print_replay(session: &Session, replay: &Replay) {
    match replay {
        Replay::Basic(Some(_)) => {
            let basic = session.basic();
            println!("basic: num1={} operator={} num2={}", basic.num1, basic.operator, basic.num2);
        }
        Replay::Basic(None) => println!("basic: expression could not be parsed"),
        Replay::Scientific { function, .. } => {
            let name = (*function).map(|f| f.to_string()).unwrap_or_else(|| "?".to_string());
            println!("scientific: function={} num={}", name, session.scientific().num);
        }
    }
    println!("display: {}", session.display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_basic_accepts_negative_operands() {
        let cli = Cli::try_parse_from(["calc_cli", "basic", "-5", "-", "-3"]).unwrap();
        match cli.command {
            Command::Basic { num1, operator, num2 } => {
                assert_eq!(num1, "-5");
                assert_eq!(operator, "-");
                assert_eq!(num2, "-3");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_sci_defaults_to_degrees() {
        let cli = Cli::try_parse_from(["calc_cli", "sci", "pi"]).unwrap();
        match cli.command {
            Command::Sci { function, num, angle } => {
                assert_eq!(function, "pi");
                assert_eq!(num, None);
                assert_eq!(angle, "deg");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["calc_cli", "history", "--history-dir", "/tmp/h", "-vv"]).unwrap();
        assert_eq!(cli.history_dir, Some(PathBuf::from("/tmp/h")));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_default_log_levels() {
        assert_eq!(default_filter(0), "info");
        assert_eq!(default_filter(1), "calc_core=debug,calc_cli=debug");
        assert_eq!(default_filter(5), "trace");
    }

    #[test]
    fn test_open_session_with_temp_history() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig {
            service_url: "http://localhost:5000".to_string(),
            timeout: None,
            history_dir: dir.path().to_path_buf(),
        };
        let session = open_session(&config).unwrap();
        assert!(session.history().is_empty());
        assert_eq!(session.display(), "0");
    }
}
