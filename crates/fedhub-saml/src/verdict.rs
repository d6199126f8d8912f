//! Validation verdicts.
//!
//! Signature trust evaluation answers with a value, never an exception:
//! untrusted peers routinely send malformed or unsigned messages, and those
//! are ordinary inputs to a federation hub.

/// Why a message failed signature trust validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationReason {
    /// The message carries no issuer element.
    MissingIssuer,
    /// The message carries an issuer element with an empty value.
    EmptyIssuer,
    /// The message carries no signature element.
    MissingSignature,
    /// The signature element is present but holds no signature value.
    SignatureNotSigned,
    /// No trusted credential verifies the signature.
    InvalidSignature,
    /// An internal error prevented validation from completing.
    UnableToValidate,
}

impl ValidationReason {
    /// Returns the diagnostic message for this reason.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::MissingIssuer => "Message has no issuer.",
            Self::EmptyIssuer => "Message has an empty issuer.",
            Self::MissingSignature => "Message has no signature.",
            Self::SignatureNotSigned => "Message signature is not signed.",
            Self::InvalidSignature => "Message signature is not valid.",
            Self::UnableToValidate => "Unable to validate message signature.",
        }
    }
}

impl std::fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Outcome of signature trust validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationVerdict {
    /// The message is backed by a trusted credential (or exempted by
    /// explicit policy).
    Valid,
    /// The message is not trusted.
    Invalid {
        /// Why validation failed.
        reason: ValidationReason,
        /// Underlying cause for `UnableToValidate`, for logging.
        cause: Option<String>,
    },
}

impl ValidationVerdict {
    /// Creates an invalid verdict with the given reason.
    #[must_use]
    pub const fn invalid(reason: ValidationReason) -> Self {
        Self::Invalid {
            reason,
            cause: None,
        }
    }

    /// Creates an invalid verdict carrying an underlying cause.
    #[must_use]
    pub fn invalid_with_cause(reason: ValidationReason, cause: impl Into<String>) -> Self {
        Self::Invalid {
            reason,
            cause: Some(cause.into()),
        }
    }

    /// Returns true for [`ValidationVerdict::Valid`].
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Returns the failure reason, if any.
    #[must_use]
    pub const fn reason(&self) -> Option<ValidationReason> {
        match self {
            Self::Valid => None,
            Self::Invalid { reason, .. } => Some(*reason),
        }
    }
}
