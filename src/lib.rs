//! # goldfile
//!
//! Cache de regressão numérica baseado em arquivos golden.
//!
//! Na primeira vez que um array é verificado contra um slot (um caminho `.npy`)
//! ele é gravado ali. Cada verificação seguinte carrega o slot e exige que o novo
//! array concorde com ele até um número de casas decimais.
//!
//! ```no_run
//! use goldfile::{check_or_store, CacheOutcome, NdArray};
//!
//! let result = NdArray::new(vec![2, 2], vec![1.0f64, 2.0, 3.0, 4.0])?;
//! match check_or_store(&result, "golden/result.npy", 7)? {
//!     CacheOutcome::Stored => println!("golden file created"),
//!     CacheOutcome::Match => println!("unchanged"),
//! }
//! # Ok::<(), goldfile::GoldfileError>(())
//! ```
//!
//! ## Módulos
//!
//! - [`cache`] - Slots, comparação com tolerância e o `RegressionCache`
//! - [`npy`] - Leitura e escrita de arquivos NumPy `.npy`
//! - [`hooks`] - Hooks de instrumentação opcionais e um cronômetro de chamadas
//! - [`types`] - Arrays, configuração, erros e resultados
//! - `cli` - Interface de linha de comando (feature `cli`)

pub mod cache;
#[cfg(feature = "cli")]
pub mod cli;
pub mod hooks;
pub mod npy;
pub mod types;

pub use cache::{check_or_store, RegressionCache, Tolerance};
pub use types::array::{Dtype, NdArray};
pub use types::config::Config;
pub use types::errors::{GoldfileError, GoldfileResult};
pub use types::outcome::{CacheOutcome, SlotInfo};
