//! Interpretation of operator answers at the confirmation gate.

use crate::core::types::ConfirmationDecision;

/// Map a raw answer line to a gate decision.
///
/// Only `y` or `yes` (any case, surrounding whitespace ignored) approve.
/// Everything else, including an empty line, rejects.
pub fn parse_answer(answer: &str) -> ConfirmationDecision {
    let normalized = answer.trim().to_ascii_lowercase();
    if matches!(normalized.as_str(), "y" | "yes") {
        ConfirmationDecision::Approved
    } else {
        ConfirmationDecision::Rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yes_variants_approve() {
        for answer in ["y", "Y", "yes", "YES", "Yes", " y\n", "yes\r\n"] {
            assert_eq!(
                parse_answer(answer),
                ConfirmationDecision::Approved,
                "answer {answer:?}"
            );
        }
    }

    #[test]
    fn everything_else_rejects() {
        for answer in ["", "\n", "n", "no", "yep", "ye", "y y", "sure", "1"] {
            assert_eq!(
                parse_answer(answer),
                ConfirmationDecision::Rejected,
                "answer {answer:?}"
            );
        }
    }
}
