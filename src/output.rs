use crossterm::style::Stylize;

use crate::registry::PluginSummary;

pub fn success(message: &str) {
    println!("{}", message.green());
}

pub fn failure(message: &str) {
    eprintln!("{}", message.red());
}

pub fn step_ok(label: &str) {
    println!("{} {label}", "✔".green());
}

pub fn step_failed(label: &str) {
    eprintln!("{} {label}", "✖".red());
}

pub fn not_installed_terminal() {
    eprintln!("{}", "You don't have HyperTerm installed! :(".red());
    eprintln!(
        "{} {}{}",
        "You are missing".red(),
        "awesomeness".green(),
        ".".red()
    );
    eprintln!("{}", "Check it out: https://hyperterm.org/".green());
}

/// Prints plugins as two columns: highlighted name, then description.
pub fn plugin_table(entries: &[PluginSummary]) {
    for (name, description) in table_rows(entries) {
        println!("{}{description}", name.green());
    }
}

/// Pads every name to the widest one, plus a two-space gutter.
fn table_rows(entries: &[PluginSummary]) -> Vec<(String, &str)> {
    let width = entries
        .iter()
        .map(|entry| entry.name.chars().count())
        .max()
        .unwrap_or(0);

    entries
        .iter()
        .map(|entry| {
            let padding = width - entry.name.chars().count() + 2;
            let name = if entry.description.is_empty() {
                entry.name.clone()
            } else {
                format!("{}{}", entry.name, " ".repeat(padding))
            };
            (name, entry.description.as_str())
        })
        .collect()
}
