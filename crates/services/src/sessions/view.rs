use vetquiz_core::access::DenialReason;
use vetquiz_core::timer::QuizWarning;

use super::service::TerminationCause;

/// One-shot messages for the presentation layer to surface as toasts/banners.
///
/// This is intentionally **not** a UI view-model: no pre-formatted strings, no
/// localization assumptions. The UI decides wording and styling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Whole-quiz countdown crossed a warning threshold.
    QuizTimeWarning(QuizWarning),
    /// Per-question countdown is almost out.
    QuestionTimeWarning,
    /// The access guard refused entry.
    AccessDenied {
        reason: DenialReason,
        subtitle: Option<String>,
    },
    /// An answer could not be persisted after bounded retries. Recoverable:
    /// the session stays in progress and the user may retry.
    AnswerSaveFailed { attempts: u32 },
    /// The attempt was submitted; `forced` when the quiz timer expired.
    Submitted { forced: bool },
    /// The attempt was terminated.
    Terminated(TerminationCause),
}
