use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::rc::Rc;

use cellisp::{Environment, Interpreter, TokenKind, tokenize};
use clap::Parser;
use log::{LevelFilter, debug};
use rustyline::error::ReadlineError;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Cmd, Completer, Context, Editor, EventHandler, KeyCode, KeyEvent, Modifiers};
use rustyline::{Helper, Highlighter, Hinter, Validator};

/// Interactive cellisp read-eval-print loop.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Use vi key bindings instead of emacs.
    #[arg(long)]
    vi: bool,

    /// File used to load and save line history.
    #[arg(long, value_name = "PATH", default_value = "cellisp_history.txt")]
    history: PathBuf,
}

struct CellispCompleter {
    env: Rc<RefCell<Environment>>,
}

impl CellispCompleter {
    fn new(env: Rc<RefCell<Environment>>) -> Self {
        CellispCompleter { env }
    }
}

impl rustyline::completion::Completer for CellispCompleter {
    type Candidate = String;
    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        let prefix = match tokenize(&line[..pos]) {
            Ok(tokens) => match tokens.last() {
                Some(token) if token.span.end == pos => match &token.kind {
                    TokenKind::Symbol(prefix) => prefix.clone(),
                    _ => return Ok((pos, vec![])),
                },
                _ => return Ok((pos, vec![])),
            },
            Err(_) => return Ok((pos, vec![])),
        };
        let mut candidates: Vec<String> = self
            .env
            .borrow()
            .get_identifiers()
            .into_iter()
            .filter_map(|id| id.strip_prefix(prefix.as_str()).map(str::to_string))
            .filter(|suffix| !suffix.is_empty())
            .collect();
        candidates.sort();
        Ok((pos, candidates))
    }
}

#[derive(Completer, Helper, Highlighter, Hinter, Validator)]
struct InputValidator {
    #[rustyline(Validator)]
    validator: CellispValidator,
    #[rustyline(Highlighter)]
    highlighter: CellispHighlighter,
    #[rustyline(Completer)]
    completer: CellispCompleter,
}

/// Paren structure of a line, by byte offset. Comments are skipped.
#[derive(Default)]
struct ParenScan {
    partners: HashMap<usize, usize>,
    unmatched_close: Vec<usize>,
    unclosed_open: Vec<usize>,
}

fn scan_parens(input: &str) -> ParenScan {
    let mut scan = ParenScan::default();
    let mut in_comment = false;
    for (i, c) in input.char_indices() {
        if in_comment {
            in_comment = c != '\n';
            continue;
        }
        match c {
            ';' => in_comment = true,
            '(' => scan.unclosed_open.push(i),
            ')' => match scan.unclosed_open.pop() {
                Some(open) => {
                    scan.partners.insert(open, i);
                    scan.partners.insert(i, open);
                }
                None => scan.unmatched_close.push(i),
            },
            _ => {}
        }
    }
    scan
}

struct CellispValidator;

impl Validator for CellispValidator {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        let scan = scan_parens(ctx.input());
        if let Some(pos) = scan.unmatched_close.first() {
            Ok(ValidationResult::Invalid(Some(format!(
                "  - Unmatched ')' at position {}",
                pos
            ))))
        } else if !scan.unclosed_open.is_empty() {
            Ok(ValidationResult::Incomplete)
        } else {
            Ok(ValidationResult::Valid(None))
        }
    }
}

struct CellispHighlighter;

impl Highlighter for CellispHighlighter {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> Cow<'l, str> {
        let scan = scan_parens(line);
        let unmatched: HashSet<usize> = scan
            .unmatched_close
            .iter()
            .chain(scan.unclosed_open.iter())
            .copied()
            .collect();
        // The paren just before the cursor and its partner are highlighted.
        let cursor_pair = pos
            .checked_sub(1)
            .and_then(|at| scan.partners.get(&at).map(|&partner| (at, partner)));

        let mut highlighted = String::with_capacity(line.len());
        for (i, c) in line.char_indices() {
            if unmatched.contains(&i) {
                highlighted.push_str(&format!("\x1b[1;31m{}\x1b[0m", c)); // Red for unmatched
            } else if cursor_pair.is_some_and(|(at, partner)| i == at || i == partner) {
                highlighted.push_str(&format!("\x1b[1;34m{}\x1b[0m", c)); // Blue for matching
            } else {
                highlighted.push(c);
            }
        }
        Cow::Owned(highlighted)
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

fn main() -> rustyline::Result<()> {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Warn)
        .parse_default_env()
        .filter_module("rustyline", LevelFilter::Warn)
        .init();
    let args = Args::parse();

    println!("cellisp REPL v{}", env!("CARGO_PKG_VERSION"));
    println!("Type 'exit' or press Ctrl-D to quit.");

    let interpreter = Interpreter::new();
    let h = InputValidator {
        highlighter: CellispHighlighter,
        validator: CellispValidator,
        completer: CellispCompleter::new(interpreter.environment()),
    };
    let edit_mode = if args.vi {
        rustyline::EditMode::Vi
    } else {
        rustyline::EditMode::Emacs
    };
    let config = rustyline::config::Config::builder()
        .edit_mode(edit_mode)
        .build();
    let mut rl = Editor::with_config(config)?;
    rl.set_helper(Some(h));
    rl.bind_sequence(
        KeyEvent(KeyCode::Char('s'), Modifiers::CTRL),
        EventHandler::Simple(Cmd::Newline),
    );
    if rl.load_history(&args.history).is_err() {
        println!("No previous history.");
    }

    loop {
        match rl.readline("cellisp> ") {
            Ok(line) => {
                rl.add_history_entry(line.as_str())?;
                let trimmed_input = line.trim();
                if trimmed_input.is_empty() {
                    continue;
                }
                if trimmed_input.eq_ignore_ascii_case("exit") {
                    break;
                }

                debug!("read {} bytes", trimmed_input.len());
                if let Err(err) = interpreter.eval_each(trimmed_input, |node| println!("{}", node)) {
                    if err.pretty_print("repl", trimmed_input).is_err() {
                        eprintln!("Error: {}", err);
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Interrupted. Type 'exit' or Ctrl-D to quit.");
            }
            Err(ReadlineError::Eof) => {
                println!("\nExiting.");
                break;
            }
            Err(err) => {
                eprintln!("Readline Error: {:?}", err);
                break;
            }
        }
    }
    rl.save_history(&args.history)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_balanced() {
        let scan = scan_parens("(+ 1 (* 2 3))");
        assert!(scan.unmatched_close.is_empty());
        assert!(scan.unclosed_open.is_empty());
        assert_eq!(scan.partners.get(&0), Some(&12));
        assert_eq!(scan.partners.get(&5), Some(&11));
    }

    #[test]
    fn test_scan_incomplete_and_stray() {
        let scan = scan_parens("(+ 1 (* 2");
        assert_eq!(scan.unclosed_open, vec![0, 5]);

        let scan = scan_parens("1)");
        assert_eq!(scan.unmatched_close, vec![1]);
    }

    #[test]
    fn test_scan_skips_comments() {
        let scan = scan_parens("(+ 1 ; (\n 2)");
        assert!(scan.unclosed_open.is_empty());
        assert!(scan.unmatched_close.is_empty());
    }

    #[test]
    fn test_highlight_marks_unmatched() {
        let out = CellispHighlighter.highlight("1)", 0);
        assert_eq!(out, "1\x1b[1;31m)\x1b[0m");
        let out = CellispHighlighter.highlight("(a)", 3);
        assert_eq!(out, "\x1b[1;34m(\x1b[0ma\x1b[1;34m)\x1b[0m");
    }
}
