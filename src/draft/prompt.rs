//! Interactive pick input and its cancellation
//!
//! `pick` solicits a field value from the player before setting it. The
//! solicitation is the only suspension point in the draft flow, so it is
//! the one place cancellation is checked: a kicked player or a state
//! switch trips the token and the in-flight prompt aborts without ever
//! calling `set`.

use super::DraftField;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag shared between the lobby and any
/// in-flight prompt. Cloning yields a handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    /// Trip the token. Every clone observes the change.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Result of soliciting a value from the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptOutcome {
    /// The player chose one of the offered values
    Picked(u32),
    /// The token fired before a choice was made
    Cancelled,
}

/// The interactive-input collaborator invoked by `pick`.
///
/// Implementations must return `Cancelled` once the token fires, without
/// blocking further.
pub trait DraftPrompt {
    fn choose(&mut self, field: DraftField, options: &[u32], cancel: &CancelToken) -> PromptOutcome;
}

/// Prompt that takes the first offered value. Useful as a default and in
/// tests.
#[derive(Debug, Default)]
pub struct AutoPrompt;

impl DraftPrompt for AutoPrompt {
    fn choose(
        &mut self,
        _field: DraftField,
        options: &[u32],
        cancel: &CancelToken,
    ) -> PromptOutcome {
        if cancel.is_cancelled() {
            return PromptOutcome::Cancelled;
        }
        match options.first() {
            Some(&value) => PromptOutcome::Picked(value),
            None => PromptOutcome::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_clones_share_state() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn auto_prompt_picks_first_option() {
        let mut prompt = AutoPrompt;
        let outcome = prompt.choose(DraftField::Champion, &[10, 11], &CancelToken::new());
        assert_eq!(outcome, PromptOutcome::Picked(10));
    }

    #[test]
    fn auto_prompt_honors_cancellation() {
        let token = CancelToken::new();
        token.cancel();
        let mut prompt = AutoPrompt;
        let outcome = prompt.choose(DraftField::Champion, &[10], &token);
        assert_eq!(outcome, PromptOutcome::Cancelled);
    }

    #[test]
    fn auto_prompt_with_no_options_cancels() {
        let mut prompt = AutoPrompt;
        let outcome = prompt.choose(DraftField::Spell1, &[], &CancelToken::new());
        assert_eq!(outcome, PromptOutcome::Cancelled);
    }
}
