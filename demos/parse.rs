//! Basic instance parsing example

use std::env;
use stitchrl::diagnostics::Diagnostics;
use stitchrl::instance::parse_instance;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <instance-file>", args[0]);
        std::process::exit(1);
    }

    let data = std::fs::read(&args[1])?;
    let mut diagnostics = Diagnostics::new();
    let instance = parse_instance(&data, &mut diagnostics)?;

    println!("Parsed {} successfully", args[1]);
    println!("  Facts: {}", instance.facts.len());
    println!("  Contexts: {}", instance.contexts.len());
    println!("  Units: {}", instance.units.len());
    println!("  Diagnostics: {}", diagnostics.len());

    // Show first 5 facts
    for fact in instance.facts.iter().take(5) {
        println!("  - {} [{}]: {}", fact.concept, fact.context_ref, fact.raw_value);
    }

    Ok(())
}
