//! Arquivos de array NumPy `.npy`.
//!
//! Um arquivo `.npy` é uma string mágica, uma versão, um literal de dict Python
//! com `descr`, `fortran_order` e `shape`, e depois os bytes dos elementos.
//! Os arquivos escritos aqui são versão 1.0, little-endian e em ordem C, então
//! o NumPy os lê diretamente. A leitura também aceita cabeçalhos 2.0/3.0, dados
//! big-endian e payloads em ordem Fortran.

mod codec;
mod header;

pub use codec::{from_bytes, load, read_npy, save, to_bytes, write_npy, MAGIC};
pub use header::{ByteOrder, Header};

/// Extensão que todo caminho de slot deve ter.
pub const EXTENSION: &str = "npy";
