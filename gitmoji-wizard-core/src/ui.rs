use console::{Term, style};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// spinner shown while git talks to a remote
pub fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.yellow} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// a horizontal rule across the terminal, indented by `margin` on both sides
pub fn terminal_separator(margin: usize) -> String {
    let (_, columns) = Term::stdout().size();
    let width = (columns as usize).saturating_sub(2 * margin).max(10);
    format!("{0}{1}{0}", " ".repeat(margin), "─".repeat(width))
}

pub fn print_staged_files<'a>(files: impl IntoIterator<Item = &'a String>) {
    let files: Vec<&String> = files.into_iter().collect();
    let plural = if files.len() == 1 { "" } else { "s" };
    println!(
        "{}",
        style(format!("currently {} staged file{plural} for commit:", files.len())).green()
    );
    for file in files {
        println!("{}", style(format!("  - {file}")).dim());
    }
}

pub fn warn(message: &str) {
    println!("{}", style(message).yellow());
}

pub fn error(message: &str) {
    eprintln!("{} {}", style("❌ error:").red().bold(), style(message).red());
}
