use std::io::{self, Read};

use bindexpr::cli::{self, CheckOptions, CheckResult, CliError};
use clap::{Parser as ClapParser, Subcommand};
use tracing::Level;

#[derive(ClapParser)]
#[command(name = "bindexpr")]
#[command(about = "bindexpr - Evaluate JavaScript-style binding expressions against JSON state")]
#[command(version)]
struct Cli {
    /// Log compilation details to stderr (repeat for more)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Parse the expression exactly as written, without rewriting `++`, `--` or commas
    #[arg(long, global = true)]
    no_preprocess: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an expression against a JSON scope
    Check {
        /// The expression to evaluate
        expression: String,

        /// JSON object used as the scope (reads from stdin if not provided)
        #[arg(short, long)]
        scope: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Also print the scope after evaluation
        #[arg(long)]
        show_scope: bool,

        /// Only validate syntax, don't evaluate
        #[arg(long)]
        syntax_only: bool,
    },

    /// List the names an expression reads from its scope
    Deps {
        /// The expression to inspect
        expression: String,
    },

    /// Print the token stream of an expression
    Tokens {
        /// The expression to tokenize
        expression: String,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let preprocess = !cli.no_preprocess;

    let result = match cli.command {
        Commands::Check {
            expression,
            scope,
            pretty,
            show_scope,
            syntax_only,
        } => run_check(
            CheckOptions {
                expression,
                scope,
                syntax_only,
                preprocess,
            },
            pretty,
            show_scope,
        ),
        Commands::Deps { expression } => {
            cli::list_dependencies(&expression, preprocess).map(|deps| {
                for dep in deps {
                    println!("{}", dep);
                }
            })
        }
        Commands::Tokens { expression } => cli::list_tokens(&expression).map(|tokens| {
            for token in tokens {
                println!("{:>4}  {:<10}  {}", token.position, format!("{:?}", token.kind), token);
            }
        }),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn to_json(value: &serde_json::Value, pretty: bool) -> Result<String, CliError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }?;
    Ok(json)
}

fn run_check(mut options: CheckOptions, pretty: bool, show_scope: bool) -> Result<(), CliError> {
    if options.scope.is_none() && !options.syntax_only && !atty::is(atty::Stream::Stdin) {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        if !buffer.trim().is_empty() {
            options.scope = Some(buffer);
        }
    }

    match cli::execute_check(&options)? {
        CheckResult::SyntaxValid => println!("Syntax is valid"),
        CheckResult::Success { result, scope } => {
            println!("{}", to_json(&result, pretty)?);
            if show_scope {
                println!("{}", to_json(&scope, pretty)?);
            }
        }
    }
    Ok(())
}
