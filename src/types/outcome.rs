//! Resultados retornados pelas operações de slot.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::array::Dtype;

/// Resultado de um `check_or_store` bem-sucedido.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheOutcome {
    /// O slot não existia; o array foi gravado.
    Stored,
    /// O slot existia e o array concordou com ele.
    Match,
}

impl std::fmt::Display for CacheOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheOutcome::Stored => write!(f, "stored"),
            CacheOutcome::Match => write!(f, "match"),
        }
    }
}

/// Descrição de um slot em disco.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotInfo {
    /// Caminho do slot.
    pub path: PathBuf,

    /// Shape do array armazenado.
    pub shape: Vec<usize>,

    /// Dtype do array armazenado.
    pub dtype: Dtype,

    /// Número de elementos.
    pub elements: usize,

    /// Tamanho do arquivo em bytes.
    pub file_size: u64,

    /// SHA-256 do conteúdo do arquivo, em hex.
    pub sha256: String,

    /// Data da última modificação, se o sistema de arquivos informar.
    pub modified: Option<DateTime<Utc>>,
}
