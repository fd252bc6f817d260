use std::error::Error;

use langgen::{Generator, GeneratorConfig, GrammarBuilder, format_language};

/// Enumerate { 1^n 0 | n >= 1 } up to ten symbols
fn main() -> Result<(), Box<dyn Error>> {
    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let grammar = GrammarBuilder::new()
        .terminals(["0", "1"])
        .non_terminals(["S", "X", "Y"])
        .start("S")
        .rule("S -> XY")
        .rule("X -> 1 | 1X")
        .rule("Y -> 0")
        .build()?;
    println!("{}\n", grammar);

    let language = Generator::new(&grammar, GeneratorConfig::default()).run();
    println!("Language L(G) generated:");
    println!("{}", format_language(&language));

    Ok(())
}
