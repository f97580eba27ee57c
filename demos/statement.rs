//! Assemble and stitch income statements from filing directories

use std::env;
use stitchrl::{stitch, FilingFiles, FilingParser, StatementType};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dirs: Vec<String> = env::args().skip(1).collect();
    if dirs.is_empty() {
        eprintln!("Usage: statement <filing-dir>...");
        std::process::exit(1);
    }

    let parser = FilingParser::new();
    let mut statements = Vec::new();
    for dir in &dirs {
        let files = FilingFiles::from_dir(dir)?;
        let filing = parser.parse(&files.sources())?;
        if let Some(statement) = filing.statement(StatementType::IncomeStatement) {
            statements.push(statement);
        }
    }

    let statement = stitch(&statements, StatementType::IncomeStatement, 4)?;
    println!("{} ({} filings)", statement.statement_type, dirs.len());
    for row in statement.rows.iter().filter(|row| !row.elidable) {
        let values: Vec<String> = statement
            .periods
            .iter()
            .map(|period| {
                row.value(period)
                    .map_or_else(|| "-".to_string(), |v| format!("{:.0}", v))
            })
            .collect();
        println!("{}{:<50} {}", "  ".repeat(row.depth), row.display_label(), values.join("  "));
    }

    Ok(())
}
