//! Errors for bitmap and intensity values

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Value is well formed but out of range for the printer
    #[error("Invalid value: {0}")]
    Validation(String),

    /// Text could not be read as a value
    #[error("Parse failure: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Intensity;

    #[test]
    fn test_parse_error_names_input() {
        let err = "scorching".parse::<Intensity>().unwrap_err();

        assert!(matches!(err, Error::Parse(_)));
        assert!(err.to_string().starts_with("Parse failure: invalid intensity \"scorching\""));
    }
}
