use clap::Parser;
use gitmoji_wizard_core::{CoreCliArgs, TermPrompter, execute, style};

fn main() {
    let cli_args = CoreCliArgs::parse();

    // ctrl+c reaches the prompts as an interrupted read, which steps back
    let _ = ctrlc::set_handler(|| {});
    let mut prompter = TermPrompter::new();

    match execute(cli_args, &mut prompter) {
        Ok(exit) => std::process::exit(exit.code()),
        Err(e) => {
            eprintln!(
                "{} {} {}",
                style("❌"),
                style("gitmoji-wizard failed:").red().bold(),
                style(format!("{e:#}")).red()
            );
            std::process::exit(1);
        }
    }
}
