use std::fmt;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    InvalidQuotaBudget,
    InvalidDateWindow,
    QuotaExceeded,
    EvictionExhausted,
    MalformedStoredEntry,
    StoreIo,
    BulkStoreFailure,
    MalformedRawRecord,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::InvalidQuotaBudget => "E1003",
            Self::InvalidDateWindow => "E2001",
            Self::QuotaExceeded => "E3001",
            Self::EvictionExhausted => "E3002",
            Self::MalformedStoredEntry => "E3003",
            Self::StoreIo => "E5001",
            Self::BulkStoreFailure => "E5002",
            Self::MalformedRawRecord => "E6001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Store not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidQuotaBudget => "Invalid quota budget",
            Self::InvalidDateWindow => "Invalid date window",
            Self::QuotaExceeded => "Storage quota exceeded",
            Self::EvictionExhausted => "Data not saved, storage is full",
            Self::MalformedStoredEntry => "Stored entry is not valid JSON",
            Self::StoreIo => "Key-value store I/O failure",
            Self::BulkStoreFailure => "Record archive clear failed",
            Self::MalformedRawRecord => "Raw record could not be parsed",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `tm put` or `tm ingest` to create the store."),
            Self::ConfigParseError => Some("Fix syntax in .tidemark/config.toml and retry."),
            Self::InvalidQuotaBudget => {
                Some("Keep quota.safe_limit strictly below quota.report_limit.")
            }
            Self::InvalidDateWindow => Some("Use YYYY-MM-DD dates for --start and --end."),
            Self::QuotaExceeded | Self::EvictionExhausted => {
                Some("Run `tm purge` or `tm stats` to find large entries.")
            }
            Self::MalformedStoredEntry => None,
            Self::StoreIo => Some("Check disk space and write permissions."),
            Self::BulkStoreFailure => Some("Delete .tidemark/archive.sqlite3 and re-ingest."),
            Self::MalformedRawRecord => {
                Some("Provide a JSON array in the GitHub events or search API shape.")
            }
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorCode;
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::NotInitialized,
            ErrorCode::ConfigParseError,
            ErrorCode::InvalidQuotaBudget,
            ErrorCode::InvalidDateWindow,
            ErrorCode::QuotaExceeded,
            ErrorCode::EvictionExhausted,
            ErrorCode::MalformedStoredEntry,
            ErrorCode::StoreIo,
            ErrorCode::BulkStoreFailure,
            ErrorCode::MalformedRawRecord,
            ErrorCode::InternalUnexpected,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::EvictionExhausted.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn storage_full_message_matches_user_facing_text() {
        assert_eq!(
            ErrorCode::EvictionExhausted.message(),
            "Data not saved, storage is full"
        );
    }
}
