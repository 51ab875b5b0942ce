use std::fs;
use std::process;

use clap::{Arg, ArgMatches, Command};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use scream::{Config, Error, Interpreter, DEFAULT_MAX_DEPTH};

fn main() {
    env_logger::init();

    let default_depth = DEFAULT_MAX_DEPTH.to_string();
    let matches = Command::new("scream")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A small Lisp interpreter")
        .arg(Arg::new("file").help("Script to run instead of starting the REPL").index(1))
        .arg(
            Arg::new("eval")
                .short('e')
                .long("eval")
                .takes_value(true)
                .value_name("EXPR")
                .help("Evaluate EXPR, print the result and exit"),
        )
        .arg(
            Arg::new("max-depth")
                .long("max-depth")
                .takes_value(true)
                .value_name("N")
                .default_value(&default_depth)
                .help("Maximum evaluation depth"),
        )
        .arg(
            Arg::new("prompt")
                .long("prompt")
                .takes_value(true)
                .default_value("scream> ")
                .help("REPL prompt"),
        )
        .get_matches();

    let config = Config {
        max_depth: matches.value_of_t("max-depth").unwrap_or_else(|e| e.exit()),
    };
    let mut interpreter = Interpreter::with_config(config);

    if let Some(source) = matches.value_of("eval") {
        process::exit(run_source(&mut interpreter, source));
    }
    if let Some(path) = matches.value_of("file") {
        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) => {
                eprintln!("failed to read {}: {}", path, err);
                process::exit(1);
            },
        };
        process::exit(run_source(&mut interpreter, &source));
    }

    repl(&mut interpreter, &matches);
}

fn run_source(interpreter: &mut Interpreter, source: &str) -> i32 {
    match interpreter.run(source) {
        Ok(Some(value)) => {
            println!("{}", value);
            0
        },
        Ok(None) => 0,
        Err(err) => {
            report(&err);
            1
        },
    }
}

fn repl(interpreter: &mut Interpreter, matches: &ArgMatches) {
    let prompt = matches.value_of("prompt").unwrap_or("scream> ");
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(err) => {
            eprintln!("failed to start line editor: {}", err);
            process::exit(1);
        },
    };

    loop {
        match editor.readline(prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line);

                match line {
                    ":quit" | ":exit" => break,
                    ":env" => {
                        println!("{}", interpreter.environment().borrow().names().join(" "));
                        continue;
                    },
                    _ => (),
                }

                match interpreter.run(line) {
                    Ok(Some(value)) => println!("{}", value),
                    Ok(None) => (),
                    Err(err) => report(&err),
                }
            },
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("exit");
                break;
            },
            Err(err) => {
                println!("failed to read: {}", err);
                break;
            },
        }
    }
}

fn report(err: &Error) {
    match err {
        Error::Read(err) => eprintln!("failed to parse: {}", err),
        Error::Eval(err) => eprintln!("error: {}", err),
    }
}
