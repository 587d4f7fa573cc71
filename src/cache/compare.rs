//! Comparação elemento a elemento com tolerância decimal.

use serde::Serialize;

use crate::types::array::{ArrayData, NdArray};
use crate::{GoldfileError, GoldfileResult};

/// Casas decimais usadas quando nenhuma tolerância é dada.
pub const DEFAULT_DECIMAL: u32 = 7;

/// Maior decimal aceito; acima disso o limiar sofre underflow.
pub const MAX_DECIMAL: u32 = 300;

/// Dois valores concordam quando `|a - b| < 1.5 * 10^-decimal`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    decimal: u32,
    threshold: f64,
}

impl Tolerance {
    /// Constrói a tolerância para um número de casas decimais.
    pub fn from_decimal(decimal: u32) -> GoldfileResult<Self> {
        if decimal > MAX_DECIMAL {
            return Err(GoldfileError::InvalidTolerance(decimal));
        }
        Ok(Self {
            decimal,
            threshold: threshold_for(decimal),
        })
    }

    pub fn decimal(&self) -> u32 {
        self.decimal
    }

    /// Limite superior exclusivo para uma diferença absoluta aceita.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Se uma diferença absoluta está dentro da tolerância.
    pub fn accepts(&self, diff: f64) -> bool {
        diff < self.threshold
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            decimal: DEFAULT_DECIMAL,
            threshold: threshold_for(DEFAULT_DECIMAL),
        }
    }
}

fn threshold_for(decimal: u32) -> f64 {
    1.5 * 10f64.powi(-(decimal as i32))
}

/// Resumo de uma comparação elemento a elemento.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    /// Casas decimais usadas na comparação.
    pub decimal: u32,

    /// Número de elementos comparados.
    pub total: usize,

    /// Elementos cuja diferença atingiu o limiar.
    pub mismatched: usize,

    /// Maior diferença absoluta vista (`inf` para divergências NaN/inf).
    pub max_abs_diff: f64,

    /// Multi-índice de `max_abs_diff`; `None` para arrays vazios.
    pub max_index: Option<Vec<usize>>,
}

impl ComparisonReport {
    /// True quando todo elemento está dentro da tolerância.
    pub fn passed(&self) -> bool {
        self.mismatched == 0
    }

    /// Converte um relatório com falha em `ToleranceExceeded`.
    pub fn into_result(self) -> GoldfileResult<Self> {
        if self.passed() {
            return Ok(self);
        }
        Err(GoldfileError::ToleranceExceeded {
            decimal: self.decimal,
            max_abs_diff: self.max_abs_diff,
            index: self.max_index.unwrap_or_default(),
            mismatched: self.mismatched,
            total: self.total,
        })
    }
}

/// Compara `actual` com `expected`.
///
/// Shape e dtype devem ser iguais; essas falhas são retornadas como erros.
/// Diferenças de valor apenas são contadas aqui, veja
/// [`ComparisonReport::into_result`] ou [`assert_almost_equal`].
pub fn compare(
    expected: &NdArray,
    actual: &NdArray,
    tolerance: Tolerance,
) -> GoldfileResult<ComparisonReport> {
    if expected.shape() != actual.shape() {
        return Err(GoldfileError::ShapeMismatch {
            expected: expected.shape().to_vec(),
            actual: actual.shape().to_vec(),
        });
    }
    if expected.dtype() != actual.dtype() {
        return Err(GoldfileError::DtypeMismatch {
            expected: expected.dtype(),
            actual: actual.dtype(),
        });
    }

    let mut scan = Scan::new(tolerance);
    match (expected.data(), actual.data()) {
        (ArrayData::Bool(a), ArrayData::Bool(b)) => {
            scan.run(a, b, |x, y| if x == y { 0.0 } else { 1.0 })
        }
        (ArrayData::I8(a), ArrayData::I8(b)) => scan.run(a, b, |x, y| int_diff(x, y)),
        (ArrayData::I16(a), ArrayData::I16(b)) => scan.run(a, b, |x, y| int_diff(x, y)),
        (ArrayData::I32(a), ArrayData::I32(b)) => scan.run(a, b, |x, y| int_diff(x, y)),
        (ArrayData::I64(a), ArrayData::I64(b)) => scan.run(a, b, |x, y| int_diff(x, y)),
        (ArrayData::U8(a), ArrayData::U8(b)) => scan.run(a, b, |x, y| int_diff(x, y)),
        (ArrayData::U16(a), ArrayData::U16(b)) => scan.run(a, b, |x, y| int_diff(x, y)),
        (ArrayData::U32(a), ArrayData::U32(b)) => scan.run(a, b, |x, y| int_diff(x, y)),
        (ArrayData::U64(a), ArrayData::U64(b)) => scan.run(a, b, |x, y| int_diff(x, y)),
        (ArrayData::F32(a), ArrayData::F32(b)) => {
            scan.run(a, b, |x, y| float_diff(f64::from(x), f64::from(y)))
        }
        (ArrayData::F64(a), ArrayData::F64(b)) => scan.run(a, b, float_diff),
        // igualdade de dtype já foi verificada acima
        _ => unreachable!("dtype mismatch slipped past the dtype check"),
    }

    Ok(ComparisonReport {
        decimal: tolerance.decimal(),
        total: expected.len(),
        mismatched: scan.mismatched,
        max_abs_diff: scan.max_diff,
        max_index: scan.max_at.map(|flat| expected.unravel(flat)),
    })
}

/// Como [`compare`], mas falha com `ToleranceExceeded` em qualquer divergência.
pub fn assert_almost_equal(
    expected: &NdArray,
    actual: &NdArray,
    tolerance: Tolerance,
) -> GoldfileResult<ComparisonReport> {
    compare(expected, actual, tolerance)?.into_result()
}

/// Máximo corrente e contagem de divergências.
struct Scan {
    tolerance: Tolerance,
    mismatched: usize,
    max_diff: f64,
    max_at: Option<usize>,
}

impl Scan {
    fn new(tolerance: Tolerance) -> Self {
        Self {
            tolerance,
            mismatched: 0,
            max_diff: 0.0,
            max_at: None,
        }
    }

    fn run<T: Copy>(&mut self, expected: &[T], actual: &[T], diff: impl Fn(T, T) -> f64) {
        for (i, (&a, &b)) in expected.iter().zip(actual).enumerate() {
            let d = diff(a, b);
            if !self.tolerance.accepts(d) {
                self.mismatched += 1;
            }
            if self.max_at.is_none() || d > self.max_diff {
                self.max_diff = d;
                self.max_at = Some(i);
            }
        }
    }
}

fn int_diff<T: Into<i128>>(a: T, b: T) -> f64 {
    let (a, b): (i128, i128) = (a.into(), b.into());
    (a - b).unsigned_abs() as f64
}

/// NaN é igual a NaN e infinitos iguais concordam; qualquer outro par não finito
/// é uma diferença infinita.
fn float_diff(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        return if a.is_nan() && b.is_nan() {
            0.0
        } else {
            f64::INFINITY
        };
    }
    if a.is_infinite() || b.is_infinite() {
        return if a == b { 0.0 } else { f64::INFINITY };
    }
    (a - b).abs()
}
