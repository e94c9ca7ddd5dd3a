use std::fmt;

use thiserror::Error;

/// Which extractor produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Rule/pattern extractor output.
    Structured,
    /// Language-model output.
    FreeForm,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structured => write!(f, "structured"),
            Self::FreeForm => write!(f, "free-form"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReconError {
    /// A date-like free-form value is not a string, a list, or a `{year, month, day}` mapping.
    #[error("{origin} {field}: unrecognized payload shape {value}")]
    UnrecognizedPayloadShape {
        field: String,
        origin: Origin,
        value: String,
    },

    /// A date string could not be turned into a calendar date.
    #[error("{origin} {field}: cannot parse date '{value}'")]
    DateParse {
        field: String,
        origin: Origin,
        value: String,
    },

    /// Structured dates and verbatim dates disagree in count.
    #[error("structured {field}: {dates} date(s) but {verbatims} verbatim date(s)")]
    MisalignedLists {
        field: String,
        dates: usize,
        verbatims: usize,
    },

    /// An input record is not a JSON object (or not JSON at all).
    #[error("{origin} record: {message}")]
    InvalidRecord { origin: Origin, message: String },

    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// Field table validation error (duplicate label, incomplete bundle, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),

    /// Unit term table could not be loaded.
    #[error("unit table error: {0}")]
    UnitTable(String),

    /// IO error (file read, etc.).
    #[error("IO error: {0}")]
    Io(String),
}

impl ReconError {
    /// Stable snake_case tag, used as a key in batch summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnrecognizedPayloadShape { .. } => "unrecognized_payload_shape",
            Self::DateParse { .. } => "date_parse",
            Self::MisalignedLists { .. } => "misaligned_lists",
            Self::InvalidRecord { .. } => "invalid_record",
            Self::ConfigParse(_) => "config_parse",
            Self::ConfigValidation(_) => "config_validation",
            Self::UnitTable(_) => "unit_table",
            Self::Io(_) => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_parse_names_field_and_origin() {
        let err = ReconError::DateParse {
            field: "dwc:eventDate".into(),
            origin: Origin::FreeForm,
            value: "sometime".into(),
        };
        assert_eq!(
            err.to_string(),
            "free-form dwc:eventDate: cannot parse date 'sometime'"
        );
        assert_eq!(err.kind(), "date_parse");
    }

    #[test]
    fn misaligned_lists_message() {
        let err = ReconError::MisalignedLists {
            field: "dwc:eventDate".into(),
            dates: 2,
            verbatims: 1,
        };
        assert!(err.to_string().contains("2 date(s) but 1 verbatim"));
    }
}
