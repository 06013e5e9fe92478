// scripted answers, for driving prompts and flows without a terminal

use anyhow::{Context, Result, bail};
use std::collections::VecDeque;

use crate::emojis::EmojiChoice;
use crate::prompt::{Prompter, Recovery, TextPrompt};

/// a canned answer for [`ScriptedPrompter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// answer to a text, input or emoji prompt
    Text(String),
    Confirm(bool),
    /// index answered to a single select
    Choice(usize),
    /// indices answered to a multi select
    Picks(Vec<usize>),
    Restart,
    Quit,
    /// simulate ctrl+c on the next prompt
    Interrupt,
}

impl Answer {
    pub fn text(value: &str) -> Self {
        Answer::Text(value.to_string())
    }
}

/// replays a fixed list of answers; used to drive flows without a terminal
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<Answer>,
    asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    /// messages of every prompt shown so far
    pub fn asked(&self) -> &[String] {
        &self.asked
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    fn next(&mut self, message: &str) -> Result<Answer> {
        self.asked.push(message.to_string());
        self.answers
            .pop_front()
            .with_context(|| format!("no scripted answer left for prompt `{message}`"))
    }
}

impl Prompter for ScriptedPrompter {
    fn select_emoji(&mut self, message: &str, _choices: &[EmojiChoice]) -> Result<Option<String>> {
        match self.next(message)? {
            Answer::Text(value) => Ok(Some(value)),
            Answer::Interrupt => Ok(None),
            other => bail!("unexpected answer {other:?} for prompt `{message}`"),
        }
    }

    fn text(&mut self, prompt: &TextPrompt<'_>) -> Result<Option<String>> {
        match self.next(prompt.message)? {
            Answer::Text(value) => Ok(Some(value.trim().to_string())),
            Answer::Interrupt => Ok(None),
            other => bail!("unexpected answer {other:?} for prompt `{}`", prompt.message),
        }
    }

    fn confirm(&mut self, message: &str, _default: bool) -> Result<Option<bool>> {
        match self.next(message)? {
            Answer::Confirm(value) => Ok(Some(value)),
            Answer::Interrupt => Ok(None),
            other => bail!("unexpected answer {other:?} for prompt `{message}`"),
        }
    }

    fn select(&mut self, message: &str, items: &[String]) -> Result<Option<usize>> {
        match self.next(message)? {
            Answer::Choice(index) if index < items.len() => Ok(Some(index)),
            Answer::Interrupt => Ok(None),
            other => bail!("unexpected answer {other:?} for prompt `{message}`"),
        }
    }

    fn multi_select(
        &mut self,
        message: &str,
        items: &[String],
        _checked: &[bool],
    ) -> Result<Option<Vec<usize>>> {
        match self.next(message)? {
            Answer::Picks(indices) if indices.iter().all(|i| *i < items.len()) => {
                Ok(Some(indices))
            }
            Answer::Interrupt => Ok(None),
            other => bail!("unexpected answer {other:?} for prompt `{message}`"),
        }
    }

    /// an empty [`Answer::Text`] keeps the default
    fn input(&mut self, message: &str, default: &str) -> Result<Option<String>> {
        match self.next(message)? {
            Answer::Text(value) if value.trim().is_empty() => Ok(Some(default.to_string())),
            Answer::Text(value) => Ok(Some(value.trim().to_string())),
            Answer::Interrupt => Ok(None),
            other => bail!("unexpected answer {other:?} for prompt `{message}`"),
        }
    }

    fn restart_or_quit(&mut self) -> Result<Recovery> {
        match self.next("restart or quit")? {
            Answer::Restart => Ok(Recovery::Restart),
            Answer::Quit | Answer::Interrupt => Ok(Recovery::Quit),
            other => bail!("unexpected answer {other:?} for the recovery prompt"),
        }
    }
}
