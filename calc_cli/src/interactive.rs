//! Line-driven calculator prompt.
//!
//! Stands in for the browser page: each line is one user action (edit a
//! field, click a tab, press a function button, click a history row).

use std::io::{self, BufRead, Write};
use std::str::FromStr;

use anyhow::Result;
use calc_core::history::EMPTY_PLACEHOLDER;
use calc_core::{AngleMode, CalcError, CalcResult, Completion, Operator, ScientificFunction, Session, Tab};

pub const HELP: &str = "\
Commands:
  tab basic|scientific     show a panel
  angle [deg|rad]          select the angle unit (no argument flips it)
  num1 <x> | num2 <x>      set a basic operand
  op <+ - * / ** %>        set the basic operator (× ÷ ^ also accepted)
  num <x>                  set the scientific operand
  =                        calculate the basic panel
  <function>               run a scientific function (sin, sqrt, pi, ...)
  clear                    clear the active panel
  history                  list past calculations
  replay <n>               load history row n back into the panels
  clear-history            clear history (asks first)
  help | quit";

/// One parsed line of input
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SwitchTab(Tab),
    SetAngle(AngleMode),
    ToggleAngle,
    SetNum1(String),
    SetNum2(String),
    SetOperator(Operator),
    SetScientificNum(String),
    SubmitBasic,
    SubmitScientific(ScientificFunction),
    ClearInputs,
    ShowHistory,
    Replay(usize),
    ClearHistory,
    Help,
    Quit,
    Nothing,
}

/// Parse one line into an action
pub fn parse_line(line: &str) -> std::result::Result<Action, String> {
    let line = line.trim();
    let (command, arg) = match line.split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg.trim()),
        None => (line, ""),
    };

    let action = match command {
        "" => Action::Nothing,
        "tab" => Action::SwitchTab(parse_arg(arg)?),
        "angle" if arg.is_empty() => Action::ToggleAngle,
        "angle" => Action::SetAngle(parse_arg(arg)?),
        "num1" => Action::SetNum1(arg.to_string()),
        "num2" => Action::SetNum2(arg.to_string()),
        "num" => Action::SetScientificNum(arg.to_string()),
        "op" => Action::SetOperator(parse_arg(arg)?),
        "=" | "calc" => Action::SubmitBasic,
        "clear" => Action::ClearInputs,
        "history" => Action::ShowHistory,
        "replay" => {
            let row: usize = arg
                .parse()
                .map_err(|_| format!("replay needs a row number, got '{}'", arg))?;
            if row == 0 {
                return Err("history rows start at 1".to_string());
            }
            Action::Replay(row - 1)
        }
        "clear-history" => Action::ClearHistory,
        "help" | "?" => Action::Help,
        "quit" | "exit" => Action::Quit,
        other => match other.parse::<ScientificFunction>() {
            Ok(function) => Action::SubmitScientific(function),
            Err(_) => return Err(format!("unknown command '{}', try 'help'", other)),
        },
    };
    Ok(action)
}

fn parse_arg<T: FromStr<Err = CalcError>>(arg: &str) -> std::result::Result<T, String> {
    arg.parse().map_err(|e: CalcError| e.user_message())
}

/// Ask a yes/no question on the terminal. Anything but `y`/`yes` is a no.
pub fn confirm_on_terminal(prompt: &str) -> bool {
    print!("{} [y/N] ", prompt);
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Print the history list, or the placeholder when empty
pub fn print_history(session: &Session) {
    let mut items = session.render_history().peekable();
    if items.peek().is_none() {
        println!("{}", EMPTY_PLACEHOLDER);
        return;
    }
    for item in items {
        println!("{:>3}. {:<40} {}", item.index + 1, item.label(), item.entry.timestamp());
    }
}

fn print_status(session: &Session) {
    let ui = session.ui();
    println!("[{} | {}] {}", ui.active_tab(), ui.angle_mode(), session.display());
    if let Some(error) = session.error() {
        println!("Error: {}", error);
    } else if let Some(result) = session.result() {
        println!("Result: {}", result);
    }
}

/// Run the prompt until `quit` or end of input
pub async fn run(session: &mut Session) -> Result<()> {
    println!("Calculator - type 'help' for commands");
    print_status(session);

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let action = match parse_line(&line) {
            Ok(action) => action,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };

        match action {
            Action::Quit => break,
            Action::Nothing => continue,
            Action::Help => {
                println!("{}", HELP);
                continue;
            }
            Action::ShowHistory => {
                print_history(session);
                continue;
            }
            other => apply(session, other).await,
        }
        print_status(session);
    }
    Ok(())
}

async fn apply(session: &mut Session, action: Action) {
    match action {
        Action::SwitchTab(tab) => session.switch_tab(tab),
        Action::SetAngle(mode) => session.set_angle_mode(mode),
        Action::ToggleAngle => {
            session.toggle_angle_mode();
        }
        Action::SetNum1(text) => session.set_num1(text),
        Action::SetNum2(text) => session.set_num2(text),
        Action::SetOperator(op) => session.set_operator(op),
        Action::SetScientificNum(text) => session.set_scientific_num(text),
        Action::SubmitBasic => {
            if applied(session.submit_basic().await) {
                print_history(session);
            }
        }
        Action::SubmitScientific(function) => {
            if applied(session.submit_scientific(function).await) {
                print_history(session);
            }
        }
        Action::ClearInputs => match session.ui().active_tab() {
            Tab::Basic => session.clear_basic_inputs(),
            Tab::Scientific => session.clear_scientific_inputs(),
        },
        Action::Replay(index) => {
            if session.replay(index).is_none() {
                println!("No history row {}", index + 1);
            }
        }
        Action::ClearHistory => match session.clear_history(confirm_on_terminal) {
            Ok(true) => print_history(session),
            Ok(false) => {}
            Err(e) => println!("Error: {}", e),
        },
        Action::ShowHistory | Action::Help | Action::Quit | Action::Nothing => {}
    }
}

/// Whether the outcome reached the display and history. Errors are already
/// on the session's banner; stale results need no output.
fn applied(outcome: CalcResult<Completion>) -> bool {
    match outcome {
        Ok(Completion::Applied(_)) => true,
        Ok(Completion::Stale) => {
            tracing::debug!("ignored superseded response");
            false
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_field_edits() {
        assert_eq!(parse_line("num1 5").unwrap(), Action::SetNum1("5".to_string()));
        assert_eq!(parse_line("  num2   -3.5 ").unwrap(), Action::SetNum2("-3.5".to_string()));
        assert_eq!(parse_line("op ×").unwrap(), Action::SetOperator(Operator::Multiply));
        assert_eq!(parse_line("op **").unwrap(), Action::SetOperator(Operator::Power));
    }

    #[test]
    fn test_parse_tabs_and_angles() {
        assert_eq!(parse_line("tab scientific").unwrap(), Action::SwitchTab(Tab::Scientific));
        assert_eq!(parse_line("angle rad").unwrap(), Action::SetAngle(AngleMode::Rad));
        assert!(parse_line("angle grad").is_err());
        assert_eq!(parse_line("angle").unwrap(), Action::ToggleAngle);
    }

    #[test]
    fn test_parse_functions() {
        assert_eq!(
            parse_line("sqrt").unwrap(),
            Action::SubmitScientific(ScientificFunction::Sqrt)
        );
        assert_eq!(parse_line("pi").unwrap(), Action::SubmitScientific(ScientificFunction::Pi));
        assert!(parse_line("frobnicate").is_err());
    }

    #[test]
    fn test_replay_rows_are_one_based() {
        assert_eq!(parse_line("replay 1").unwrap(), Action::Replay(0));
        assert!(parse_line("replay 0").is_err());
        assert!(parse_line("replay x").is_err());
    }

    #[test]
    fn test_only_applied_results_refresh_history() {
        use calc_core::DisplayValue;

        assert!(applied(Ok(Completion::Applied(DisplayValue::Number(8.0)))));
        assert!(!applied(Ok(Completion::Stale)));
        assert!(!applied(Err(CalcError::computation("Cannot divide by zero"))));
    }

    #[test]
    fn test_blank_line_does_nothing() {
        assert_eq!(parse_line("   ").unwrap(), Action::Nothing);
        assert_eq!(parse_line("=").unwrap(), Action::SubmitBasic);
    }
}
