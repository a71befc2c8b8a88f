//! Error chain formatting and analysis

use std::error::Error as StdError;

/// Boxed, thread-safe error used wherever an arbitrary cause has to be carried
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Format an error chain as a multi-line string
///
/// The first line is the error itself, every cause follows on its own line,
/// indented one step deeper than its parent.
pub fn format_error_chain(error: &(dyn StdError + 'static)) -> String {
    let mut result = format!("Error: {}", error);
    let mut current = error.source();
    let mut level = 1;

    while let Some(source) = current {
        result.push_str(&format!(
            "\n{:indent$}Caused by: {}",
            "",
            source,
            indent = level * 2
        ));
        current = source.source();
        level += 1;
    }

    result
}

/// Get the last error in a `source()` chain
pub fn root_cause<'a>(error: &'a (dyn StdError + 'static)) -> &'a (dyn StdError + 'static) {
    let mut current = error;
    while let Some(source) = current.source() {
        current = source;
    }
    current
}

/// Count the errors in a chain (minimum 1)
pub fn error_chain_length(error: &(dyn StdError + 'static)) -> usize {
    let mut length = 1;
    let mut current = error;
    while let Some(source) = current.source() {
        current = source;
        length += 1;
    }
    length
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Wrapped {
        message: &'static str,
        source: Option<BoxError>,
    }

    impl fmt::Display for Wrapped {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.message)
        }
    }

    impl StdError for Wrapped {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            self.source.as_deref().map(|e| e as &(dyn StdError + 'static))
        }
    }

    fn three_level_error() -> Wrapped {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset");
        let middle = Wrapped {
            message: "provider request failed",
            source: Some(Box::new(io)),
        };
        Wrapped {
            message: "task call failed",
            source: Some(Box::new(middle)),
        }
    }

    #[test]
    fn test_format_error_chain() {
        let formatted = format_error_chain(&three_level_error());

        assert_eq!(
            formatted,
            "Error: task call failed\n  \
             Caused by: provider request failed\n    \
             Caused by: connection reset"
        );
    }

    #[test]
    fn test_root_cause() {
        let error = three_level_error();
        assert_eq!(root_cause(&error).to_string(), "connection reset");
    }

    #[test]
    fn test_error_chain_length() {
        assert_eq!(error_chain_length(&three_level_error()), 3);
    }

    #[test]
    fn test_single_error_chain() {
        let error = Wrapped {
            message: "alone",
            source: None,
        };

        assert_eq!(format_error_chain(&error), "Error: alone");
        assert_eq!(error_chain_length(&error), 1);
        assert_eq!(root_cause(&error).to_string(), "alone");
    }
}
