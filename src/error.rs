/// Coarse classification of failures, used for exit codes and for deciding
/// whether a failure aborts the run or only a single fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad CLI value, unreadable file, invalid CSV schema.
    Input,
    /// Occurrence-graph collaborator unreachable or returned malformed data.
    Query,
    /// Catalog and extracted statistics disagree on their symbol sets.
    JoinMismatch,
    /// Regression has too little variation or a rank-deficient design.
    DegenerateFit,
    /// Log transform requested on a zero or negative value.
    UndefinedTransform,
    /// Writing an export failed.
    Output,
}

impl ErrorKind {
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Input => 2,
            ErrorKind::Output => 3,
            ErrorKind::Query => 5,
            ErrorKind::JoinMismatch => 6,
            ErrorKind::DegenerateFit => 7,
            ErrorKind::UndefinedTransform => 8,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Input, message)
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Query, message)
    }

    pub fn join_mismatch(symbol: &str, message: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::JoinMismatch,
            format!("Join mismatch for element '{symbol}': {}", message.into()),
        )
    }

    pub fn degenerate(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DegenerateFit, message)
    }

    pub fn undefined_transform(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UndefinedTransform, message)
    }

    pub fn output(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Output, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("exit_code", &self.exit_code())
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
