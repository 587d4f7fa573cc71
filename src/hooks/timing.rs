//! Cronômetro simples de tempo de parede para uma chamada.

use std::time::{Duration, Instant};

/// Valor retornado por uma chamada cronometrada, com o tempo que levou.
#[derive(Debug, Clone)]
pub struct Timed<T> {
    pub value: T,
    pub elapsed: Duration,
}

impl<T> Timed<T> {
    /// Descarta o tempo e mantém o valor.
    pub fn into_inner(self) -> T {
        self.value
    }
}

/// Executa `f`, registrando início e tempo decorrido sob `label`.
pub fn timeit<T, F>(label: &str, f: F) -> Timed<T>
where
    F: FnOnce() -> T,
{
    tracing::info!(label, "Running {}() ...", label);
    let start = Instant::now();
    let value = f();
    let elapsed = start.elapsed();
    tracing::info!(
        label,
        elapsed_secs = elapsed.as_secs_f64(),
        "Elapsed time for {}(): {:.3} s",
        label,
        elapsed.as_secs_f64()
    );
    Timed { value, elapsed }
}
