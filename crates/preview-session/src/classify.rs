/// Failure classification
///
/// Maps raw backend error text to a user-facing message plus a flag telling
/// the session to open the credential prompt. Matching is order-sensitive
/// substring matching against free-text backend errors; the substrings and
/// their order are a compatibility contract with upstream wording, so the
/// table lives behind a trait and can change without touching the session.

/// Outcome of classifying one raw error message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// User-facing message for the error view.
    pub message: String,

    /// Whether the failure looks like a credential problem and the
    /// credential prompt should open.
    pub prompt_credential: bool,
}

/// Classifier seam between the session and the matching table.
pub trait ErrorClassifier: Send + Sync {
    fn classify(&self, raw: &str) -> Classification;
}

const MODEL_NOT_FOUND_MESSAGE: &str = "Model not found. The API key may be invalid or \
     missing permission for this model. Check the selected API key.";

const INVALID_KEY_MESSAGE: &str = "The API key is invalid or lacks permission. \
     Select an API key with billing enabled.";

/// Default matching table, first match wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultClassifier;

impl ErrorClassifier for DefaultClassifier {
    fn classify(&self, raw: &str) -> Classification {
        if raw.contains("Requested entity was not found.") {
            Classification {
                message: MODEL_NOT_FOUND_MESSAGE.to_string(),
                prompt_credential: true,
            }
        } else if raw.contains("API_KEY_INVALID")
            || raw.contains("API key not valid")
            || raw.to_lowercase().contains("permission denied")
        {
            Classification {
                message: INVALID_KEY_MESSAGE.to_string(),
                prompt_credential: true,
            }
        } else {
            Classification {
                message: format!("Video generation failed: {raw}"),
                prompt_credential: false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_not_found_wins_over_later_rules() {
        let classified = DefaultClassifier
            .classify("Requested entity was not found. Also: permission denied upstream");

        assert_eq!(classified.message, MODEL_NOT_FOUND_MESSAGE);
        assert!(classified.prompt_credential);
    }

    #[test]
    fn test_permission_denied_matches_case_insensitively() {
        let classified =
            DefaultClassifier.classify("backend said: PERMISSION DENIED while calling model");

        assert_eq!(classified.message, INVALID_KEY_MESSAGE);
        assert!(classified.prompt_credential);
    }

    #[test]
    fn test_invalid_key_tokens_match_as_substrings() {
        for raw in [
            "400 API_KEY_INVALID: expired",
            "generateVideos: API key not valid. Please pass a valid API key.",
        ] {
            let classified = DefaultClassifier.classify(raw);
            assert_eq!(classified.message, INVALID_KEY_MESSAGE, "input: {raw}");
            assert!(classified.prompt_credential);
        }
    }

    #[test]
    fn test_unknown_errors_fall_through_to_generic() {
        let classified = DefaultClassifier.classify("deadline exceeded");

        assert_eq!(
            classified.message,
            "Video generation failed: deadline exceeded"
        );
        assert!(!classified.prompt_credential);
    }
}
