//! Tipos de erro do goldfile.

use thiserror::Error;

use super::array::Dtype;

/// Tipo de resultado padrão do goldfile.
pub type GoldfileResult<T> = Result<T, GoldfileError>;

/// Erros que podem ocorrer ao gravar, carregar ou verificar slots.
#[derive(Error, Debug)]
pub enum GoldfileError {
    #[error("Invalid slot name '{0}': slot paths must end in .npy")]
    InvalidSlotName(String),

    #[error("Shape mismatch: stored {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Dtype mismatch: stored {expected}, got {actual}")]
    DtypeMismatch { expected: Dtype, actual: Dtype },

    #[error(
        "Arrays are not almost equal to {decimal} decimals: \
         max abs diff {max_abs_diff} at index {index:?} ({mismatched} / {total} elements mismatched)"
    )]
    ToleranceExceeded {
        decimal: u32,
        max_abs_diff: f64,
        index: Vec<usize>,
        mismatched: usize,
        total: usize,
    },

    #[error("Invalid tolerance: {0} decimals is beyond f64 resolution")]
    InvalidTolerance(u32),

    #[error("Invalid array: {0}")]
    InvalidArray(String),

    #[error("Malformed .npy data: {0}")]
    Format(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl GoldfileError {
    /// Cria um erro genérico.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }

    /// Cria um erro de configuração.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Cria um erro de formato.
    pub fn format<S: Into<String>>(msg: S) -> Self {
        Self::Format(msg.into())
    }

    /// Retorna true para as falhas que uma verificação de regressão reporta
    /// (ao contrário de problemas de I/O ou de formato).
    pub fn is_regression(&self) -> bool {
        matches!(
            self,
            Self::ShapeMismatch { .. } | Self::DtypeMismatch { .. } | Self::ToleranceExceeded { .. }
        )
    }
}
