use std::{
    io::{self, Write},
    process::ExitCode,
};

use trash::{EvalError, ReplOutcome, ReplSession, StdPrint, run_script};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        // Script mode: the extension gate and any evaluation error are fatal.
        if let Err(err) = run_script(&args[1], &mut StdPrint) {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
        return ExitCode::SUCCESS;
    }

    interactive()
}

/// The interactive loop: accumulate lines until the parentheses balance,
/// evaluate, print the result, and keep going. Errors go to stderr and the
/// session stays alive; the exit sentinel ends the loop.
fn interactive() -> ExitCode {
    let mut session = ReplSession::new();
    let mut source = String::new();

    loop {
        let prompt = if source.is_empty() { "> " } else { ". " };
        let Some(line) = read_line(prompt) else {
            println!();
            break;
        };

        if source.is_empty() && line.trim().is_empty() {
            continue;
        }

        if !source.is_empty() {
            source.push('\n');
        }
        source.push_str(&line);

        if needs_more_input(&source) {
            continue;
        }

        match session.execute(&source, &mut StdPrint) {
            Ok(ReplOutcome::Exit) => break,
            Ok(ReplOutcome::Value(value)) => println!("{}", session.render(value)),
            Ok(ReplOutcome::Empty) => {}
            Err(err) => report_error(&mut session, &err),
        }
        source.clear();
    }

    ExitCode::SUCCESS
}

/// Prints an error's printed form to stderr, going through a first-class
/// error value so the output matches what user code would see.
fn report_error(session: &mut ReplSession, error: &EvalError) {
    let value = session.error_value(error);
    eprintln!("{}", session.render(value));
}

/// True while the accumulated input cannot be a complete batch of forms:
/// an unterminated string literal or more `(` than `)`.
fn needs_more_input(source: &str) -> bool {
    let mut balance = 0i64;
    let mut in_string = false;
    for ch in source.chars() {
        match ch {
            '"' => in_string = !in_string,
            '(' if !in_string => balance += 1,
            ')' if !in_string => balance -= 1,
            _ => {}
        }
    }
    in_string || balance > 0
}

/// Reads one line from stdin after printing a prompt.
///
/// Returns `None` on EOF (Ctrl+D).
fn read_line(prompt: &str) -> Option<String> {
    print!("{prompt}");
    if io::stdout().flush().is_err() {
        return None;
    }
    let mut input = String::new();
    let read = io::stdin().read_line(&mut input).ok()?;
    if read == 0 {
        return None;
    }
    Some(input.trim_end_matches(['\r', '\n']).to_owned())
}
