//! Terminal output for plans, unit progress and summaries

use colored::{ColoredString, Colorize};

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message to stderr
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Title followed by an underline of the same width
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Aligned `key: value` line under a header
pub fn field(key: &str, value: impl std::fmt::Display) {
    println!("  {:<12} {}", format!("{key}:").dimmed(), value);
}

/// One execution tier: `[2/3] cache, db`
pub fn tier(num: usize, total: usize, units: &[String]) {
    let names: Vec<String> = units.iter().map(|u| u.bold().to_string()).collect();
    println!(
        "{} {}",
        format!("[{num}/{total}]").blue().bold(),
        names.join(", ")
    );
}

/// A unit in a plan listing, with what it waits for and the command it runs
pub fn planned_unit(name: &str, after: &[String], command: Option<&str>) {
    if after.is_empty() {
        println!("  {} {}", "•".cyan(), name.bold());
    } else {
        let after = format!("after {}", after.join(", "));
        println!("  {} {} {}", "•".cyan(), name.bold(), after.dimmed());
    }
    match command {
        Some(command) => println!("      {}", format!("$ {command}").dimmed()),
        None => println!("      {}", "(no command)".dimmed()),
    }
}

/// Progress line for a finished unit, with an optional note
pub fn unit_result(symbol: ColoredString, name: &str, note: Option<ColoredString>) {
    match note {
        Some(note) => println!("    {symbol} {name} {note}"),
        None => println!("    {symbol} {name}"),
    }
}

/// Summary headline, green on success and yellow otherwise
pub fn outcome(ok: bool, msg: &str) {
    println!();
    if ok {
        println!("  {} {}", "✓".green().bold(), msg);
    } else {
        println!("  {} {}", "⚠".yellow().bold(), msg);
    }
}

/// Summary count line, skipped when the count is zero
pub fn count(n: usize, what: &str) {
    if n > 0 {
        println!("    • {n} {what}");
    }
}
