//! Cache de regressão com arquivos golden.
//!
//! Um slot é gravado na primeira vez que um array é verificado contra ele. Cada
//! verificação seguinte carrega o slot e compara elemento a elemento com uma
//! tolerância decimal, falhando em divergência de shape, dtype ou valor.

mod compare;
mod regression;

pub use compare::{
    assert_almost_equal, compare, ComparisonReport, Tolerance, DEFAULT_DECIMAL, MAX_DECIMAL,
};
pub use regression::{check_or_store, validate_slot, RegressionCache};
