//! Hooks padrão do goldfile.
//!
//! - `LoggingHook`: Registra cada verificação via `tracing`
//! - `MetricsHook`: Conta verificações e seus resultados

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use super::{Hook, HookContext};

// ═══════════════════════════════════════════════════════════════════════════
// LoggingHook
// ═══════════════════════════════════════════════════════════════════════════

/// Hook que registra cada verificação no log.
///
/// Gravações e matches saem em `info`, falhas em `warn`, e o início de
/// uma verificação em `debug`.
#[derive(Debug, Default)]
pub struct LoggingHook;

impl LoggingHook {
    /// Cria um novo LoggingHook.
    pub fn new() -> Self {
        Self
    }
}

impl Hook for LoggingHook {
    fn name(&self) -> &str {
        "logging"
    }

    fn execute(&self, context: &HookContext<'_>) {
        match context {
            HookContext::BeforeCheck { slot, array } => {
                tracing::debug!(
                    slot = %slot.display(),
                    shape = ?array.shape(),
                    dtype = %array.dtype(),
                    "Checking array against slot"
                );
            }
            HookContext::Stored {
                slot,
                array,
                elapsed,
            } => {
                tracing::info!(
                    slot = %slot.display(),
                    shape = ?array.shape(),
                    dtype = %array.dtype(),
                    elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                    "Slot created"
                );
            }
            HookContext::Matched {
                slot,
                report,
                elapsed,
            } => {
                tracing::info!(
                    slot = %slot.display(),
                    elements = report.total,
                    max_abs_diff = report.max_abs_diff,
                    decimal = report.decimal,
                    elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                    "Array matches slot"
                );
            }
            HookContext::Failed {
                slot,
                error,
                elapsed,
            } => {
                tracing::warn!(
                    slot = %slot.display(),
                    error = %error,
                    elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                    "Regression check failed"
                );
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// MetricsHook
// ═══════════════════════════════════════════════════════════════════════════

/// Hook que conta verificações e resultados.
#[derive(Debug, Default)]
pub struct MetricsHook {
    /// Verificações iniciadas.
    checks: AtomicU64,

    /// Slots criados.
    stores: AtomicU64,

    /// Comparações bem-sucedidas.
    matches: AtomicU64,

    /// Verificações que falharam, de qualquer tipo.
    failures: AtomicU64,

    /// Tempo total das verificações concluídas, em microssegundos.
    elapsed_us: AtomicU64,
}

impl MetricsHook {
    /// Cria um novo MetricsHook.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_checks(&self) -> u64 {
        self.checks.load(Ordering::Relaxed)
    }

    pub fn total_stores(&self) -> u64 {
        self.stores.load(Ordering::Relaxed)
    }

    pub fn total_matches(&self) -> u64 {
        self.matches.load(Ordering::Relaxed)
    }

    pub fn total_failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Fração das verificações concluídas que não falharam.
    pub fn pass_rate(&self) -> f64 {
        let passed = self.total_stores() + self.total_matches();
        let total = passed + self.total_failures();
        if total == 0 {
            0.0
        } else {
            passed as f64 / total as f64
        }
    }

    /// Snapshot de todos os contadores.
    pub fn metrics(&self) -> Metrics {
        Metrics {
            checks: self.total_checks(),
            stores: self.total_stores(),
            matches: self.total_matches(),
            failures: self.total_failures(),
            pass_rate: self.pass_rate(),
            total_elapsed_ms: self.elapsed_us.load(Ordering::Relaxed) as f64 / 1000.0,
        }
    }

    fn add_elapsed(&self, elapsed: std::time::Duration) {
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.elapsed_us.fetch_add(micros, Ordering::Relaxed);
    }
}

/// Contadores coletados pelo MetricsHook.
#[derive(Debug, Clone, Serialize)]
pub struct Metrics {
    pub checks: u64,
    pub stores: u64,
    pub matches: u64,
    pub failures: u64,
    pub pass_rate: f64,
    pub total_elapsed_ms: f64,
}

impl Hook for MetricsHook {
    fn name(&self) -> &str {
        "metrics"
    }

    fn execute(&self, context: &HookContext<'_>) {
        match context {
            HookContext::BeforeCheck { .. } => {
                self.checks.fetch_add(1, Ordering::Relaxed);
            }
            HookContext::Stored { elapsed, .. } => {
                self.stores.fetch_add(1, Ordering::Relaxed);
                self.add_elapsed(*elapsed);
            }
            HookContext::Matched { elapsed, .. } => {
                self.matches.fetch_add(1, Ordering::Relaxed);
                self.add_elapsed(*elapsed);
            }
            HookContext::Failed { elapsed, .. } => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                self.add_elapsed(*elapsed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ComparisonReport;
    use crate::hooks::HookEvent;
    use crate::types::array::NdArray;
    use crate::GoldfileError;
    use std::path::Path;
    use std::time::Duration;

    fn sample_report() -> ComparisonReport {
        ComparisonReport {
            decimal: 7,
            total: 4,
            mismatched: 0,
            max_abs_diff: 0.0,
            max_index: Some(vec![0, 0]),
        }
    }

    #[test]
    fn test_logging_hook_name() {
        let hook = LoggingHook::new();
        assert_eq!(hook.name(), "logging");
        assert_eq!(hook.events(), &HookEvent::ALL);
    }

    #[test]
    fn test_logging_hook_execute() {
        let hook = LoggingHook::new();
        let array = NdArray::from_vec(vec![1u8]);
        let report = sample_report();
        let error = GoldfileError::other("boom");
        let slot = Path::new("x.npy");

        // não deve entrar em pânico para nenhum contexto
        hook.execute(&HookContext::BeforeCheck {
            slot,
            array: &array,
        });
        hook.execute(&HookContext::Stored {
            slot,
            array: &array,
            elapsed: Duration::from_millis(1),
        });
        hook.execute(&HookContext::Matched {
            slot,
            report: &report,
            elapsed: Duration::from_millis(1),
        });
        hook.execute(&HookContext::Failed {
            slot,
            error: &error,
            elapsed: Duration::from_millis(1),
        });
    }

    #[test]
    fn test_metrics_hook_counts_outcomes() {
        let hook = MetricsHook::new();
        let array = NdArray::from_vec(vec![1u8]);
        let report = sample_report();
        let error = GoldfileError::other("boom");
        let slot = Path::new("x.npy");

        for _ in 0..4 {
            hook.execute(&HookContext::BeforeCheck {
                slot,
                array: &array,
            });
        }
        hook.execute(&HookContext::Stored {
            slot,
            array: &array,
            elapsed: Duration::from_millis(2),
        });
        hook.execute(&HookContext::Matched {
            slot,
            report: &report,
            elapsed: Duration::from_millis(3),
        });
        hook.execute(&HookContext::Matched {
            slot,
            report: &report,
            elapsed: Duration::from_millis(3),
        });
        hook.execute(&HookContext::Failed {
            slot,
            error: &error,
            elapsed: Duration::from_millis(2),
        });

        assert_eq!(hook.total_checks(), 4);
        assert_eq!(hook.total_stores(), 1);
        assert_eq!(hook.total_matches(), 2);
        assert_eq!(hook.total_failures(), 1);
        assert!((hook.pass_rate() - 0.75).abs() < 1e-9);

        let metrics = hook.metrics();
        assert!((metrics.total_elapsed_ms - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_metrics_hook_empty() {
        let hook = MetricsHook::new();
        assert_eq!(hook.total_checks(), 0);
        assert_eq!(hook.pass_rate(), 0.0);
        assert_eq!(hook.metrics().total_elapsed_ms, 0.0);
    }
}
