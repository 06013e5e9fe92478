// commit wizard - collects emoji, scope, title and message one prompt at a time

use anyhow::Result;

use crate::config::Config;
use crate::emojis::EmojiChoice;
use crate::history::{HistoryField, HistoryStore};
use crate::message::{CommitDetails, safe_capitalize};
use crate::prompt::{Prompter, Recovery, TextPrompt};

/// the wizard's prompts, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Emoji,
    Scope,
    Title,
    Message,
}

impl Step {
    pub const ALL: [Step; 4] = [Step::Emoji, Step::Scope, Step::Title, Step::Message];

    fn is_required(&self) -> bool {
        matches!(self, Step::Emoji | Step::Title)
    }
}

/// which prompts are shown and how the title is post-processed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WizardSettings {
    pub skip_scope: bool,
    pub skip_message: bool,
    pub capitalize_title: bool,
    /// conventional commit types instead of gitmojis, never asks for a scope
    pub simple: bool,
}

impl WizardSettings {
    pub fn from_config(config: &Config, simple: bool) -> Self {
        Self {
            skip_scope: config.skip_scope,
            skip_message: config.skip_message,
            capitalize_title: config.capitalize_title,
            simple,
        }
    }

    fn shows(&self, step: Step) -> bool {
        match step {
            Step::Emoji | Step::Title => true,
            Step::Scope => !self.skip_scope && !self.simple,
            Step::Message => !self.skip_message,
        }
    }
}

/// fields collected so far; `None` means the prompt is still pending
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WizardState {
    pub emoji: Option<String>,
    pub scope: Option<String>,
    pub title: Option<String>,
    pub message: Option<String>,
}

impl WizardState {
    fn slot(&mut self, step: Step) -> &mut Option<String> {
        match step {
            Step::Emoji => &mut self.emoji,
            Step::Scope => &mut self.scope,
            Step::Title => &mut self.title,
            Step::Message => &mut self.message,
        }
    }

    fn is_set(&self, step: Step) -> bool {
        match step {
            Step::Emoji => self.emoji.is_some(),
            Step::Scope => self.scope.is_some(),
            Step::Title => self.title.is_some(),
            Step::Message => self.message.is_some(),
        }
    }

    /// turn a fully collected state into commit details
    fn finish(self, capitalize_title: bool) -> Option<CommitDetails> {
        let title = self.title.filter(|t| !t.is_empty())?;
        Some(CommitDetails {
            emoji: self.emoji?,
            scope: self.scope?,
            title: if capitalize_title {
                safe_capitalize(&title)
            } else {
                title
            },
            message: self.message?,
        })
    }
}

/// how a wizard run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardOutcome {
    Completed(CommitDetails),
    /// cancelled at the first prompt, the user asked to start over
    Restarted,
    /// cancelled at the first prompt, the user asked to quit
    Quit,
}

enum Collected {
    Finished(CommitDetails),
    Cancelled,
}

pub struct CommitWizard<'a> {
    settings: WizardSettings,
    emojis: &'a [EmojiChoice],
    history: &'a HistoryStore,
}

impl<'a> CommitWizard<'a> {
    pub fn new(settings: WizardSettings, emojis: &'a [EmojiChoice], history: &'a HistoryStore) -> Self {
        Self {
            settings,
            emojis,
            history,
        }
    }

    /// run the wizard once.
    ///
    /// ctrl+c on a prompt goes back one prompt; on the first prompt it asks
    /// whether to restart or quit.
    pub fn run(&self, prompter: &mut dyn Prompter) -> Result<WizardOutcome> {
        match self.collect(prompter, WizardState::default())? {
            Collected::Finished(details) => Ok(WizardOutcome::Completed(details)),
            Collected::Cancelled => match prompter.restart_or_quit()? {
                Recovery::Restart => Ok(WizardOutcome::Restarted),
                Recovery::Quit => Ok(WizardOutcome::Quit),
            },
        }
    }

    fn collect(&self, prompter: &mut dyn Prompter, mut state: WizardState) -> Result<Collected> {
        let steps: Vec<Step> = Step::ALL
            .into_iter()
            .filter(|step| self.settings.shows(*step))
            .collect();

        // skipped prompts count as answered with nothing
        for step in Step::ALL {
            if !steps.contains(&step) {
                *state.slot(step) = Some(String::new());
            }
        }

        while let Some(position) = steps.iter().position(|step| !state.is_set(*step)) {
            let step = steps[position];
            match self.ask(prompter, step)? {
                Some(value) if value.is_empty() && step.is_required() => continue,
                Some(value) => *state.slot(step) = Some(value),
                None if position == 0 => return Ok(Collected::Cancelled),
                None => *state.slot(steps[position - 1]) = None,
            }
        }

        Ok(match state.finish(self.settings.capitalize_title) {
            Some(details) => Collected::Finished(details),
            None => Collected::Cancelled,
        })
    }

    fn ask(&self, prompter: &mut dyn Prompter, step: Step) -> Result<Option<String>> {
        let (message, field) = match step {
            Step::Emoji => {
                let message = if self.settings.simple {
                    "select conventional type:"
                } else {
                    "select gitmoji:"
                };
                return prompter.select_emoji(message, self.emojis);
            }
            Step::Scope => ("scope (optional):", HistoryField::Scope),
            Step::Title => ("commit title (<= 50 characters ideally):", HistoryField::Title),
            Step::Message => ("commit details (optional):", HistoryField::Message),
        };

        prompter.text(&TextPrompt {
            message,
            mandatory: step.is_required(),
            field,
            history: self.history,
        })
    }
}
