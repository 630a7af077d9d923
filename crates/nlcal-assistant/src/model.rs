//! The [`LanguageModel`] trait and a scripted stand-in.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, PoisonError};

use chrono::NaiveDate;
use nlcal_core::{Command, ConversationHistory, LocalZone, RawEventDraft, ZonedTimestamp};

use crate::error::{AssistantError, AssistantResult};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What the user wants removed: part of its title and the day it is on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    /// Compared case-insensitively against event titles. May be empty.
    pub title_hint: String,
    /// Local date in the default zone.
    pub date: NaiveDate,
}

impl EventQuery {
    pub fn new(title_hint: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            title_hint: title_hint.into(),
            date,
        }
    }
}

/// The natural-language side of the assistant.
///
/// `now` and `zone` are passed explicitly so relative phrases such as
/// "tomorrow" resolve against the moment the user typed them.
pub trait LanguageModel: Send + Sync {
    /// Model name for logs.
    fn name(&self) -> &str;

    /// Decides what the user is asking for. `history` holds earlier turns,
    /// oldest first, and does not include `prompt`.
    fn classify<'a>(
        &'a self,
        prompt: &'a str,
        history: &'a ConversationHistory,
    ) -> BoxFuture<'a, AssistantResult<Command>>;

    /// Extracts the event to create.
    fn draft_event<'a>(
        &'a self,
        prompt: &'a str,
        now: ZonedTimestamp,
        zone: LocalZone,
    ) -> BoxFuture<'a, AssistantResult<RawEventDraft>>;

    /// Extracts which event to remove.
    fn locate_event<'a>(
        &'a self,
        prompt: &'a str,
        now: ZonedTimestamp,
        zone: LocalZone,
    ) -> BoxFuture<'a, AssistantResult<EventQuery>>;
}

/// Replays queued answers in order and records every prompt it was given.
///
/// An empty command queue classifies as
/// [`Command::ClarificationNeeded`]; empty draft or query queues fail with
/// [`AssistantError::NoFunctionCall`].
#[derive(Debug, Default)]
pub struct ScriptedModel {
    script: Mutex<Script>,
}

#[derive(Debug, Default)]
struct Script {
    commands: VecDeque<Command>,
    drafts: VecDeque<RawEventDraft>,
    queries: VecDeque<EventQuery>,
    prompts: Vec<String>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_command(mut self, command: Command) -> Self {
        self.script_mut().commands.push_back(command);
        self
    }

    #[must_use]
    pub fn with_draft(mut self, draft: RawEventDraft) -> Self {
        self.script_mut().drafts.push_back(draft);
        self
    }

    #[must_use]
    pub fn with_query(mut self, query: EventQuery) -> Self {
        self.script_mut().queries.push_back(query);
        self
    }

    /// Every prompt seen so far, across all three calls.
    pub fn prompts(&self) -> Vec<String> {
        self.lock().prompts.clone()
    }

    fn script_mut(&mut self) -> &mut Script {
        self.script.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LanguageModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    fn classify<'a>(
        &'a self,
        prompt: &'a str,
        _history: &'a ConversationHistory,
    ) -> BoxFuture<'a, AssistantResult<Command>> {
        let mut script = self.lock();
        script.prompts.push(prompt.to_string());
        let command = script
            .commands
            .pop_front()
            .unwrap_or(Command::ClarificationNeeded);
        Box::pin(async move { Ok(command) })
    }

    fn draft_event<'a>(
        &'a self,
        prompt: &'a str,
        _now: ZonedTimestamp,
        _zone: LocalZone,
    ) -> BoxFuture<'a, AssistantResult<RawEventDraft>> {
        let mut script = self.lock();
        script.prompts.push(prompt.to_string());
        let draft = script
            .drafts
            .pop_front()
            .ok_or(AssistantError::NoFunctionCall {
                function: "create_event",
            });
        Box::pin(async move { draft })
    }

    fn locate_event<'a>(
        &'a self,
        prompt: &'a str,
        _now: ZonedTimestamp,
        _zone: LocalZone,
    ) -> BoxFuture<'a, AssistantResult<EventQuery>> {
        let mut script = self.lock();
        script.prompts.push(prompt.to_string());
        let query = script
            .queries
            .pop_front()
            .ok_or(AssistantError::NoFunctionCall {
                function: "find_event",
            });
        Box::pin(async move { query })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> ZonedTimestamp {
        LocalZone::default().now()
    }

    #[tokio::test]
    async fn replays_in_order_then_falls_back() {
        let model = ScriptedModel::new()
            .with_command(Command::AddEvent)
            .with_command(Command::ListEvents);
        let history = ConversationHistory::default();

        assert_eq!(model.classify("a", &history).await.unwrap(), Command::AddEvent);
        assert_eq!(model.classify("b", &history).await.unwrap(), Command::ListEvents);
        assert_eq!(
            model.classify("c", &history).await.unwrap(),
            Command::ClarificationNeeded
        );
        assert_eq!(model.prompts(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn empty_draft_queue_is_no_function_call() {
        let model = ScriptedModel::new().with_draft(RawEventDraft::new("x", "2025-08-14"));
        let zone = LocalZone::default();

        assert_eq!(
            model.draft_event("p", now(), zone).await.unwrap().title,
            "x"
        );
        assert!(matches!(
            model.draft_event("p", now(), zone).await,
            Err(AssistantError::NoFunctionCall {
                function: "create_event"
            })
        ));
        assert!(matches!(
            model.locate_event("p", now(), zone).await,
            Err(AssistantError::NoFunctionCall {
                function: "find_event"
            })
        ));
    }
}
