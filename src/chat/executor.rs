//! Turn executor: the Idle → Sending → Succeeded/Failed → Idle cycle.
//!
//! A submit is split into three steps so an event loop never blocks on the
//! network: [`TurnExecutor::begin`] runs the guards and the optimistic append,
//! [`TurnExecutor::dispatch`] is the single awaited call (safe to spawn), and
//! [`TurnExecutor::finish`] applies the result. [`TurnExecutor::submit`] runs
//! all three inline.

use super::store::{ConversationState, Turn, TurnPhase};
use super::translator::to_history;
use crate::llm::{ChatRequest, ChatService, LlmError};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Why a turn could not be completed
#[derive(Debug, Clone, Error)]
pub enum ChatError {
    /// The service cannot be called at all; detected before any network attempt
    #[error("configuration error: {0}")]
    Configuration(String),
    /// The call itself failed
    #[error("transport error: {0}")]
    Transport(#[from] LlmError),
}

impl ChatError {
    /// The user-facing notification for this error
    pub fn notification(&self) -> Notification {
        match self {
            ChatError::Configuration(_) => Notification::error(
                "Configuration Error",
                "Gemini API key is missing. Set GEMINI_API_KEY or api_key in config.toml.",
            ),
            ChatError::Transport(_) => Notification::error(
                "Error",
                "Failed to get response from AI. Please try again.",
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

/// A non-fatal, user-visible message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

impl Notification {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: Severity::Info,
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: Severity::Error,
        }
    }
}

/// A request that passed the guards and is ready to send
#[derive(Debug, Clone)]
pub struct PendingTurn {
    pub request: ChatRequest,
}

/// Result of running the submit guards
#[derive(Debug)]
pub enum Submission {
    /// Blank input or a request already outstanding. Nothing changed.
    Ignored,
    /// The service is not usable. Only a notification is produced.
    Rejected(Notification),
    /// The user turn was appended and the state is now `Sending`.
    Accepted(PendingTurn),
}

/// How a submit ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Ignored,
    Succeeded { reply: String },
    Failed { notification: Notification },
}

/// Drives one turn at a time against an injected chat service
#[derive(Clone)]
pub struct TurnExecutor {
    service: Arc<dyn ChatService>,
    system_instruction: String,
}

impl TurnExecutor {
    pub fn new(service: Arc<dyn ChatService>, system_instruction: impl Into<String>) -> Self {
        Self {
            service,
            system_instruction: system_instruction.into(),
        }
    }

    pub fn model_id(&self) -> &str {
        self.service.model_id()
    }

    /// Run the guards and, if they pass, append the user turn optimistically.
    pub fn begin(&self, state: &mut ConversationState) -> Submission {
        if state.is_awaiting_response() {
            tracing::debug!("submit ignored: request already outstanding");
            return Submission::Ignored;
        }
        if state.current_text().trim().is_empty() {
            tracing::debug!("submit ignored: blank input");
            return Submission::Ignored;
        }
        if let Err(err) = self.service.check_configured() {
            let err = ChatError::Configuration(err.message);
            tracing::warn!(error = %err, "submit rejected");
            return Submission::Rejected(err.notification());
        }

        // History is taken before the new turn lands; the new text travels separately.
        let message = state.current_text().to_string();
        let history = to_history(state.turns());

        state.append(Turn::user(message.clone()));
        state.set_text(String::new());
        state.set_phase(TurnPhase::Sending {
            prompt: message.clone(),
        });
        tracing::info!(history_len = history.len(), "turn submitted");

        Submission::Accepted(PendingTurn {
            request: ChatRequest {
                system_instruction: self.system_instruction.clone(),
                history,
                message,
            },
        })
    }

    /// The one outbound call for an accepted turn. Owns everything it needs.
    pub fn dispatch(
        &self,
        pending: PendingTurn,
    ) -> impl Future<Output = Result<String, ChatError>> + Send + use<> {
        let service = Arc::clone(&self.service);
        async move {
            tracing::info!(
                model = service.model_id(),
                history_len = pending.request.history.len(),
                "dispatching turn"
            );
            let reply = service.send_message(&pending.request).await?;
            tracing::info!(bytes = reply.len(), "response received");
            Ok(reply)
        }
    }

    /// Apply the result of [`dispatch`](Self::dispatch) and return to `Idle`.
    ///
    /// On failure the optimistic user turn is kept.
    pub fn finish(
        &self,
        state: &mut ConversationState,
        result: Result<String, ChatError>,
    ) -> TurnOutcome {
        if !state.is_awaiting_response() {
            tracing::warn!("completion arrived with no request outstanding; dropped");
            return TurnOutcome::Ignored;
        }
        state.set_phase(TurnPhase::Idle);

        match result {
            Ok(reply) => {
                state.append(Turn::assistant(reply.clone()));
                TurnOutcome::Succeeded { reply }
            }
            Err(err) => {
                tracing::error!(error = %err, "Error generating AI response");
                TurnOutcome::Failed {
                    notification: err.notification(),
                }
            }
        }
    }

    /// Guards, optimistic append, call and completion in one awaited step.
    pub async fn submit(&self, state: &mut ConversationState) -> TurnOutcome {
        match self.begin(state) {
            Submission::Ignored => TurnOutcome::Ignored,
            Submission::Rejected(notification) => TurnOutcome::Failed { notification },
            Submission::Accepted(pending) => {
                let result = self.dispatch(pending).await;
                self.finish(state, result)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::chat::store::Role;
    use crate::llm::{ExternalRole, HistoryEntry, LlmErrorKind};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Answers from a script and records every request it sees
    pub(crate) struct ScriptedService {
        configured: bool,
        replies: Mutex<VecDeque<Result<String, LlmError>>>,
        pub(crate) requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedService {
        pub(crate) fn new(replies: Vec<Result<String, LlmError>>) -> Self {
            Self {
                configured: true,
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn unconfigured() -> Self {
            Self {
                configured: false,
                ..Self::new(Vec::new())
            }
        }

        pub(crate) fn call_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ChatService for ScriptedService {
        fn check_configured(&self) -> Result<(), LlmError> {
            if self.configured {
                Ok(())
            } else {
                Err(LlmError::auth("No API key configured"))
            }
        }

        async fn send_message(&self, request: &ChatRequest) -> Result<String, LlmError> {
            self.requests.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(LlmError::unknown("script exhausted")))
        }

        fn model_id(&self) -> &str {
            "scripted"
        }
    }

    const GREETING: &str = "Hello! I'm your ArcaneRigs assistant.";

    fn setup(service: ScriptedService) -> (TurnExecutor, Arc<ScriptedService>, ConversationState) {
        let service = Arc::new(service);
        let executor = TurnExecutor::new(service.clone(), "PC hardware only");
        (executor, service, ConversationState::new(GREETING))
    }

    #[tokio::test]
    async fn first_submit_sends_empty_history() {
        let (executor, service, mut state) = setup(ScriptedService::new(vec![Ok(
            "An RTX 4080 Super.".to_string()
        )]));
        state.set_text("What GPU pairs with a Ryzen 7800X3D?");

        let outcome = executor.submit(&mut state).await;

        assert_eq!(
            outcome,
            TurnOutcome::Succeeded {
                reply: "An RTX 4080 Super.".to_string()
            }
        );
        let requests = service.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].history.is_empty());
        assert_eq!(requests[0].message, "What GPU pairs with a Ryzen 7800X3D?");
        assert_eq!(requests[0].system_instruction, "PC hardware only");

        let roles: Vec<Role> = state.turns().iter().map(Turn::role).collect();
        assert_eq!(roles, vec![Role::Assistant, Role::User, Role::Assistant]);
        assert_eq!(state.turns()[2].content(), "An RTX 4080 Super.");
        assert!(!state.is_awaiting_response());
        assert_eq!(state.current_text(), "");
    }

    #[tokio::test]
    async fn begin_appends_user_turn_before_any_call() {
        let (executor, service, mut state) = setup(ScriptedService::new(vec![]));
        state.set_text("What GPU pairs with a Ryzen 7800X3D?");

        let submission = executor.begin(&mut state);

        assert!(matches!(submission, Submission::Accepted(_)));
        assert_eq!(service.call_count(), 0);
        assert_eq!(state.turns().len(), 2);
        assert_eq!(state.turns()[1].role(), Role::User);
        assert_eq!(state.turns()[1].content(), "What GPU pairs with a Ryzen 7800X3D?");
        assert_eq!(state.current_text(), "");
        assert!(state.is_awaiting_response());
    }

    #[tokio::test]
    async fn third_call_carries_both_prior_pairs() {
        let (executor, service, mut state) = setup(ScriptedService::new(vec![
            Ok("A1".to_string()),
            Ok("A2".to_string()),
            Ok("A3".to_string()),
        ]));

        for text in ["Q1", "Q2"] {
            state.set_text(text);
            executor.submit(&mut state).await;
        }
        assert_eq!(to_history(state.turns()).len(), 4);

        state.set_text("Q3");
        executor.submit(&mut state).await;

        let requests = service.requests.lock().unwrap();
        assert_eq!(requests.len(), 3);
        assert_eq!(
            requests[2].history,
            vec![
                HistoryEntry { role: ExternalRole::User, text: "Q1".to_string() },
                HistoryEntry { role: ExternalRole::Model, text: "A1".to_string() },
                HistoryEntry { role: ExternalRole::User, text: "Q2".to_string() },
                HistoryEntry { role: ExternalRole::Model, text: "A2".to_string() },
            ]
        );
        assert_eq!(requests[2].message, "Q3");
        assert_eq!(state.turns().len(), 7);
    }

    #[tokio::test]
    async fn blank_input_is_ignored() {
        let (executor, service, mut state) = setup(ScriptedService::new(vec![]));

        for text in ["", "   ", "\n\t"] {
            state.set_text(text);
            assert_eq!(executor.submit(&mut state).await, TurnOutcome::Ignored);
        }

        assert_eq!(service.call_count(), 0);
        assert_eq!(state.turns().len(), 1);
        assert!(!state.is_awaiting_response());
    }

    #[tokio::test]
    async fn submit_while_sending_is_ignored() {
        let (executor, service, mut state) = setup(ScriptedService::new(vec![Ok("A".to_string())]));
        state.set_text("first");
        let Submission::Accepted(pending) = executor.begin(&mut state) else {
            panic!("first submit should be accepted");
        };

        state.set_text("second");
        assert!(matches!(executor.begin(&mut state), Submission::Ignored));
        assert_eq!(state.turns().len(), 2);
        assert_eq!(state.current_text(), "second");

        let result = executor.dispatch(pending).await;
        executor.finish(&mut state, result);

        assert_eq!(service.call_count(), 1);
        assert_eq!(state.turns().len(), 3);
        assert!(!state.is_awaiting_response());
    }

    #[tokio::test]
    async fn failure_keeps_user_turn_and_raises_one_notification() {
        let (executor, service, mut state) = setup(ScriptedService::new(vec![Err(
            LlmError::from_status(429, "quota exhausted"),
        )]));
        state.set_text("Is my 550W PSU enough?");

        let outcome = executor.submit(&mut state).await;

        let TurnOutcome::Failed { notification } = outcome else {
            panic!("expected failure, got {:?}", outcome);
        };
        assert_eq!(notification.title, "Error");
        assert_eq!(notification.severity, Severity::Error);
        assert_eq!(service.call_count(), 1);
        assert_eq!(state.turns().len(), 2);
        assert_eq!(state.turns()[1].role(), Role::User);
        assert!(!state.is_awaiting_response());
    }

    #[tokio::test]
    async fn page_stays_usable_after_failure() {
        let (executor, _service, mut state) = setup(ScriptedService::new(vec![
            Err(LlmError::network("connection reset")),
            Ok("Yes.".to_string()),
        ]));

        state.set_text("first");
        executor.submit(&mut state).await;
        state.set_text("retry");
        let outcome = executor.submit(&mut state).await;

        assert_eq!(outcome, TurnOutcome::Succeeded { reply: "Yes.".to_string() });
        let contents: Vec<&str> = state.turns().iter().map(Turn::content).collect();
        assert_eq!(contents, vec![GREETING, "first", "retry", "Yes."]);
    }

    #[tokio::test]
    async fn missing_credential_only_notifies() {
        let (executor, service, mut state) = setup(ScriptedService::unconfigured());
        state.set_text("Hello?");

        let outcome = executor.submit(&mut state).await;

        let TurnOutcome::Failed { notification } = outcome else {
            panic!("expected configuration failure");
        };
        assert_eq!(notification.title, "Configuration Error");
        assert_eq!(service.call_count(), 0);
        assert_eq!(state.turns().len(), 1);
        assert_eq!(state.current_text(), "Hello?");
        assert!(!state.is_awaiting_response());
    }

    #[tokio::test]
    async fn multiline_reply_is_stored_verbatim() {
        let reply = "Build:\n- CPU: 7800X3D\n- GPU: 4070 Ti\n\n  Enjoy!";
        let (executor, _service, mut state) = setup(ScriptedService::new(vec![Ok(reply.to_string())]));
        state.set_text("Suggest a build");

        executor.submit(&mut state).await;

        assert_eq!(state.turns()[2].content(), reply);
    }

    #[test]
    fn stray_completion_is_dropped() {
        let (executor, _service, mut state) = setup(ScriptedService::new(vec![]));
        let outcome = executor.finish(&mut state, Ok("late".to_string()));
        assert_eq!(outcome, TurnOutcome::Ignored);
        assert_eq!(state.turns().len(), 1);
    }

    #[test]
    fn transport_errors_share_a_generic_notification() {
        let a = ChatError::from(LlmError::from_status(500, "boom")).notification();
        let b = ChatError::Transport(LlmError::new(LlmErrorKind::Blocked, "safety")).notification();
        assert_eq!(a, b);
        assert_eq!(a.description, "Failed to get response from AI. Please try again.");
    }
}
