pub type StrataResult<T> = Result<T, StrataError>;

#[derive(thiserror::Error, Debug)]
pub enum StrataError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("registration error: {0}")]
    Registration(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StrataError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn registration(msg: impl Into<String>) -> Self {
        Self::Registration(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            StrataError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            StrataError::registration("x")
                .to_string()
                .contains("registration error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = StrataError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
