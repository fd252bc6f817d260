use std::error::Error;
use std::io;
use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use log::{LevelFilter, info, warn};

use langgen::interactive::Session;
use langgen::{
    Generator, GeneratorConfig, Grammar, GrammarBuilder, GrammarError, Symbol, parse_max_length,
    parse_symbol_list, render_json, render_text, write_output,
};

/// Enumerate the words of a formal grammar up to a maximum length
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Terminal symbols (VT), comma or space separated
    #[arg(short, long, value_name = "SYMBOLS")]
    terminals: Option<String>,

    /// Non-terminal symbols (VN), comma or space separated
    #[arg(short, long, value_name = "SYMBOLS")]
    non_terminals: Option<String>,

    /// Start symbol (default: the first non-terminal)
    #[arg(short, long, value_name = "SYMBOL")]
    start: Option<String>,

    /// Production such as "X -> 1 | 1X"; repeat for more
    #[arg(short, long = "production", value_name = "RULE")]
    productions: Vec<String>,

    /// Maximum number of terminals per word [default: 10, asked for in
    /// interactive mode]
    #[arg(short = 'l', long, value_name = "N", value_parser = parse_max_length)]
    max_length: Option<usize>,

    /// Ask for the grammar on the terminal
    #[arg(short, long)]
    interactive: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Write the result to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// No logging at all
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    fn wants_interactive(&self) -> bool {
        self.interactive
            || (self.terminals.is_none() && self.non_terminals.is_none() && self.productions.is_empty())
    }

    /// Grammar flags that interactive mode asks for instead
    fn ignored_in_interactive(&self) -> Vec<&'static str> {
        let mut ignored = Vec::new();
        if self.terminals.is_some() {
            ignored.push("--terminals");
        }
        if self.non_terminals.is_some() {
            ignored.push("--non-terminals");
        }
        if self.start.is_some() {
            ignored.push("--start");
        }
        if !self.productions.is_empty() {
            ignored.push("--production");
        }
        ignored
    }

    fn grammar_from_flags(&self) -> langgen::Result<Grammar> {
        let required = |value: &Option<String>, flag: &str| {
            value
                .clone()
                .ok_or_else(|| GrammarError::InvalidGrammar(format!("{} is required", flag)))
        };

        let terminals = parse_symbol_list(&required(&self.terminals, "--terminals")?)?;
        let non_terminals = parse_symbol_list(&required(&self.non_terminals, "--non-terminals")?)?;
        let start = match &self.start {
            Some(start) => Symbol::from(start.as_str()),
            None => non_terminals[0].clone(),
        };

        let mut builder = GrammarBuilder::new()
            .terminals(terminals)
            .non_terminals(non_terminals)
            .start(start);
        for production in &self.productions {
            builder = builder.rule(production);
        }
        builder.build()
    }
}

fn init_logging(verbose: u8, quiet: bool) -> Result<(), log::SetLoggerError> {
    let level = if quiet {
        LevelFilter::Off
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet)?;

    let (grammar, max_length) = if cli.wants_interactive() {
        for flag in cli.ignored_in_interactive() {
            warn!("{} is ignored in interactive mode", flag);
        }
        let stdin = io::stdin();
        let mut session = Session::new(stdin.lock(), io::stdout()).with_max_length(cli.max_length);
        session.prompt_grammar()?
    } else {
        let max_length = cli
            .max_length
            .unwrap_or(GeneratorConfig::default().max_length);
        (cli.grammar_from_flags()?, max_length)
    };
    info!(
        "grammar has {} productions over {} terminals and {} non-terminals",
        grammar.production_count(),
        grammar.terminals().len(),
        grammar.non_terminals().len()
    );

    let language = Generator::new(&grammar, GeneratorConfig { max_length }).run();

    let rendered = match cli.format {
        OutputFormat::Text => render_text(&grammar, max_length, &language),
        OutputFormat::Json => render_json(&grammar, max_length, &language)? + "\n",
    };
    write_output(cli.output.as_deref(), &rendered)?;

    if let Some(path) = &cli.output {
        info!("wrote {} words to {}", language.len(), path.display());
    }

    Ok(())
}
