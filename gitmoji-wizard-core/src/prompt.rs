// prompt module - every question asked to the user goes through `Prompter`

use anyhow::{Context, Result};
use console::{Term, style};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Completion, Confirm, FuzzySelect, Input, MultiSelect, Select};
use std::io;

use crate::emojis::EmojiChoice;
use crate::history::{HistoryField, HistoryStore};

/// what to do after the wizard was cancelled at its first step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    Restart,
    Quit,
}

/// a free-text question, completed from the commit history
pub struct TextPrompt<'a> {
    pub message: &'a str,
    pub mandatory: bool,
    pub field: HistoryField,
    pub history: &'a HistoryStore,
}

/// asks the user things.
///
/// `Ok(None)` means the user interrupted the prompt (ctrl+c / esc).
pub trait Prompter {
    /// pick one emoji, returning the chosen [`EmojiChoice::value`]
    fn select_emoji(&mut self, message: &str, choices: &[EmojiChoice]) -> Result<Option<String>>;

    fn text(&mut self, prompt: &TextPrompt<'_>) -> Result<Option<String>>;

    fn confirm(&mut self, message: &str, default: bool) -> Result<Option<bool>>;

    /// pick one item, returning its index
    fn select(&mut self, message: &str, items: &[String]) -> Result<Option<usize>>;

    /// pick any number of items, returning their indices; `checked` holds
    /// the initial state of each item
    fn multi_select(
        &mut self,
        message: &str,
        items: &[String],
        checked: &[bool],
    ) -> Result<Option<Vec<usize>>>;

    /// free text pre-filled with `default`
    fn input(&mut self, message: &str, default: &str) -> Result<Option<String>>;

    /// offered when the wizard is cancelled at its first step
    fn restart_or_quit(&mut self) -> Result<Recovery>;
}

/// tab completion from past values of one commit field
struct HistoryCompletion<'a> {
    history: &'a HistoryStore,
    field: HistoryField,
}

impl Completion for HistoryCompletion<'_> {
    fn get(&self, input: &str) -> Option<String> {
        self.history
            .suggestions(self.field, input)
            .into_iter()
            .find(|suggestion| suggestion != input)
    }
}

/// interactive prompts on the terminal
pub struct TermPrompter {
    theme: ColorfulTheme,
    term: Term,
}

impl Default for TermPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl TermPrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
            term: Term::stderr(),
        }
    }

    /// turn a ctrl+c into `None`, keeping every other error
    fn interrupted<T>(&self, result: dialoguer::Result<T>) -> Result<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(dialoguer::Error::IO(e)) if e.kind() == io::ErrorKind::Interrupted => {
                // dialoguer leaves the cursor hidden when a read is interrupted
                let _ = self.term.show_cursor();
                let _ = self.term.write_line("");
                Ok(None)
            }
            Err(e) => Err(e).context("prompt failed"),
        }
    }
}

impl Prompter for TermPrompter {
    fn select_emoji(&mut self, message: &str, choices: &[EmojiChoice]) -> Result<Option<String>> {
        let labels: Vec<&str> = choices.iter().map(|c| c.label.as_str()).collect();
        let selection = FuzzySelect::with_theme(&self.theme)
            .with_prompt(message)
            .items(&labels)
            .default(0)
            .interact_opt();

        Ok(self
            .interrupted(selection)?
            .flatten()
            .and_then(|index| choices.get(index))
            .map(|choice| choice.value.trim().to_string()))
    }

    fn text(&mut self, prompt: &TextPrompt<'_>) -> Result<Option<String>> {
        let completion = HistoryCompletion {
            history: prompt.history,
            field: prompt.field,
        };

        let mut input = Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt.message)
            .allow_empty(!prompt.mandatory)
            .completion_with(&completion);
        if prompt.mandatory {
            input = input.validate_with(|text: &String| -> Result<(), &'static str> {
                if text.trim().is_empty() {
                    Err("a value is required")
                } else {
                    Ok(())
                }
            });
        }

        Ok(self
            .interrupted(input.interact_text())?
            .map(|text| text.trim().to_string()))
    }

    fn confirm(&mut self, message: &str, default: bool) -> Result<Option<bool>> {
        let answer = Confirm::with_theme(&self.theme)
            .with_prompt(message)
            .default(default)
            .show_default(true)
            .wait_for_newline(true)
            .interact_opt();
        Ok(self.interrupted(answer)?.flatten())
    }

    fn select(&mut self, message: &str, items: &[String]) -> Result<Option<usize>> {
        let selection = Select::with_theme(&self.theme)
            .with_prompt(message)
            .items(items)
            .default(0)
            .interact_opt();
        Ok(self.interrupted(selection)?.flatten())
    }

    fn multi_select(
        &mut self,
        message: &str,
        items: &[String],
        checked: &[bool],
    ) -> Result<Option<Vec<usize>>> {
        let selection = MultiSelect::with_theme(&self.theme)
            .with_prompt(format!("{message} (space to toggle, enter to validate)"))
            .items(items)
            .defaults(checked)
            .interact_opt();
        Ok(self.interrupted(selection)?.flatten())
    }

    fn input(&mut self, message: &str, default: &str) -> Result<Option<String>> {
        let input = Input::<String>::with_theme(&self.theme)
            .with_prompt(message)
            .default(default.to_string())
            .interact_text();
        Ok(self
            .interrupted(input)?
            .map(|text| text.trim().to_string()))
    }

    fn restart_or_quit(&mut self) -> Result<Recovery> {
        self.term.write_str(&format!(
            "\n{} ",
            style("press enter to restart the commit process, or q to quit:").yellow()
        ))?;
        match self.term.read_line() {
            Ok(answer) if answer.trim().eq_ignore_ascii_case("q") => Ok(Recovery::Quit),
            Ok(_) => {
                self.term.write_line("")?;
                Ok(Recovery::Restart)
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(Recovery::Quit),
            Err(e) => Err(e).context("failed to read from terminal"),
        }
    }
}
