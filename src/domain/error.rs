//! Domain error types.

/// Errors raised while building a session or compiling clauses, before any
/// price data is touched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown indicator type: {0}")]
    UnknownIndicatorType(String),

    #[error("duplicate short name: {0}")]
    DuplicateShortName(String),

    #[error("unknown parameter '{param}' for {indicator}")]
    UnknownParam { indicator: String, param: String },

    #[error("invalid parameter '{param}' for {indicator}: {reason}")]
    InvalidParam {
        indicator: String,
        param: String,
        reason: String,
    },

    #[error("unresolved reference: no instance named '{0}'")]
    UnresolvedReference(String),

    #[error("operator '{operator}' is not supported by instance '{instance}'")]
    InvalidOperator { instance: String, operator: String },

    #[error("unknown property '{property}' on instance '{instance}'")]
    UnknownProperty { instance: String, property: String },

    #[error("condition list is empty")]
    EmptyExpression,

    #[error("malformed catalog entry for {indicator}: {reason}")]
    BadCatalogEntry { indicator: String, reason: String },
}

/// Errors raised while evaluating an expression against price data.
/// During a scan these are recorded per symbol and skipped; for a
/// single-symbol backtest they surface to the caller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("no price history for {symbol}")]
    EmptyHistory { symbol: String },

    #[error("insufficient history for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientHistory {
        symbol: String,
        bars: usize,
        minimum: usize,
    },
}

/// Top-level error type for tascan.
#[derive(Debug, thiserror::Error)]
pub enum TascanError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("definition error in {file}: {reason}")]
    Definition { file: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TascanError> for std::process::ExitCode {
    fn from(err: &TascanError) -> Self {
        let code: u8 = match err {
            TascanError::Io(_) => 1,
            TascanError::ConfigParse { .. }
            | TascanError::ConfigMissing { .. }
            | TascanError::ConfigInvalid { .. } => 2,
            TascanError::Database { .. } | TascanError::DatabaseQuery { .. } => 3,
            TascanError::Config(_) | TascanError::Definition { .. } => 4,
            TascanError::Eval(_) => 5,
        };
        std::process::ExitCode::from(code)
    }
}
