//! Non-interactive prompter
//!
//! Answers come from the script instead of a modal dialog. Notices are
//! logged and kept for the final report.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use taskboard_core::{Notice, PromptOutcome, Prompter, TextPrompt};

#[derive(Debug, Default)]
pub struct ScriptPrompter {
    answers: Mutex<VecDeque<PromptOutcome>>,
    notices: Mutex<Vec<Notice>>,
}

impl ScriptPrompter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer for the next prompt
    pub fn queue(&self, answer: PromptOutcome) {
        self.answers.lock().push_back(answer);
    }

    /// Notices posted so far
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }
}

#[async_trait]
impl Prompter for ScriptPrompter {
    async fn ask_text(&self, prompt: TextPrompt) -> PromptOutcome {
        let answer = self.answers.lock().pop_front();
        match answer {
            Some(answer) => {
                tracing::debug!("{} answered: {:?}", prompt.title, answer);
                answer
            }
            None => {
                tracing::warn!("No scripted answer for \"{}\", cancelling", prompt.title);
                PromptOutcome::Cancelled
            }
        }
    }

    async fn notify(&self, notice: Notice) {
        tracing::info!("{} {}", notice.title, notice.text);
        self.notices.lock().push(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn answers_in_order_then_cancels() {
        let prompter = ScriptPrompter::new();
        prompter.queue(PromptOutcome::Submitted("Ship".to_string()));

        let first = prompter.ask_text(TextPrompt::update_task("Plan")).await;
        let second = prompter.ask_text(TextPrompt::assign_task()).await;

        assert_eq!(first, PromptOutcome::Submitted("Ship".to_string()));
        assert_eq!(second, PromptOutcome::Cancelled);
    }

    #[tokio::test]
    async fn notices_are_recorded() {
        let prompter = ScriptPrompter::new();
        prompter.notify(Notice::task_deleted()).await;
        assert_eq!(prompter.notices(), vec![Notice::task_deleted()]);
    }
}
