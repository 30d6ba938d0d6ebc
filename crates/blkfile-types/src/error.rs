use thiserror::Error;

/// Errors produced by the binary decoders.
///
/// Offsets are relative to the slice the failing decoder was handed, not to
/// the start of the whole file; callers that track an absolute position add
/// their own base offset when reporting.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("truncated input at offset {offset}: need {needed} bytes, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("malformed varint at offset {offset}: empty input")]
    MalformedVarint { offset: usize },

    #[error("wrong header length: expected 80 bytes, got {actual}")]
    WrongHeaderLength { actual: usize },

    #[error("malformed script at offset {offset}: {reason}")]
    MalformedScript { offset: usize, reason: String },
}

impl DecodeError {
    /// Rebase a slice-relative offset by `base`.
    ///
    /// Decoders hand sub-slices to their children; the child reports
    /// offsets within its own slice, and the parent rebases them so the
    /// surfaced error points into the parent's slice.
    pub fn offset_by(self, base: usize) -> Self {
        match self {
            Self::Truncated {
                offset,
                needed,
                available,
            } => Self::Truncated {
                offset: offset + base,
                needed,
                available,
            },
            Self::MalformedVarint { offset } => Self::MalformedVarint {
                offset: offset + base,
            },
            Self::MalformedScript { offset, reason } => Self::MalformedScript {
                offset: offset + base,
                reason,
            },
            Self::WrongHeaderLength { .. } => self,
        }
    }
}

pub type DecodeResult<T> = Result<T, DecodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_by_rebases_positional_variants() {
        let err = DecodeError::Truncated {
            offset: 4,
            needed: 8,
            available: 2,
        };
        assert_eq!(
            err.offset_by(100),
            DecodeError::Truncated {
                offset: 104,
                needed: 8,
                available: 2,
            }
        );

        let err = DecodeError::MalformedVarint { offset: 0 };
        assert_eq!(err.offset_by(36), DecodeError::MalformedVarint { offset: 36 });
    }

    #[test]
    fn offset_by_leaves_header_length_alone() {
        let err = DecodeError::WrongHeaderLength { actual: 12 };
        assert_eq!(err.clone().offset_by(8), err);
    }

    #[test]
    fn display_carries_expected_vs_available() {
        let err = DecodeError::Truncated {
            offset: 10,
            needed: 4,
            available: 1,
        };
        assert_eq!(
            err.to_string(),
            "truncated input at offset 10: need 4 bytes, 1 available"
        );
    }
}
