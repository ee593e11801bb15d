//! Error types for the classification engine.
//!
//! Only the fatal cases live here. An indeterminate phase (FLAG) is recovered
//! by carry-forward and a rate-lookup miss by the -9999 sentinel, so neither
//! surfaces as an error.

/// Errors that abort a run.
#[derive(Debug, thiserror::Error)]
pub enum RetError {
    /// Carry-forward was needed but the previous year left no state for the key.
    #[error(
        "missing seed year: no prior {layer} condition for '{key}' when classifying {year}; \
         the year list must start at or before the earliest activation year"
    )]
    MissingSeedYear {
        /// Year being classified.
        year: i32,
        /// Layer whose state was read.
        layer: &'static str,
        /// Composite key `{businessKey}_{overlayForeignKey}`.
        key: String,
    },

    /// The disposition lookup table has no `default` entry.
    #[error("disposition lookup has no '{sentinel}' entry")]
    MissingDefaultDisposition {
        /// The required sentinel label.
        sentinel: &'static str,
    },

    /// Years were fed to the driver out of ascending order.
    #[error("year {year} processed after {previous}; years must be strictly ascending")]
    YearOutOfOrder {
        /// Year requested.
        year: i32,
        /// Last year already processed.
        previous: i32,
    },

    /// Run configuration is unusable.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// What is wrong.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_seed_message_names_key() {
        let err = RetError::MissingSeedYear {
            year: 1965,
            layer: "ehsit",
            key: "216-A-1_42".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("216-A-1_42"));
        assert!(msg.contains("1965"));
        assert!(msg.contains("ehsit"));
    }
}
