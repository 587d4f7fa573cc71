//! Sistema de hooks do goldfile.
//!
//! Hooks observam verificações de regressão em pontos fixos:
//!
//! - `before_check`: Antes de a verificação tocar o slot
//! - `stored`: O slot não existia e o array foi gravado
//! - `matched`: O slot existia e o array concordou com ele
//! - `failed`: A verificação retornou um erro
//!
//! Cada cache carrega seu próprio `HookSystem`, vazio a menos que um seja passado.
//! Hooks apenas observam; nada que façam altera o resultado de uma verificação.

mod builtin;
mod timing;

pub use builtin::{LoggingHook, Metrics, MetricsHook};
pub use timing::{timeit, Timed};

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::ComparisonReport;
use crate::types::array::NdArray;
use crate::GoldfileError;

// ═══════════════════════════════════════════════════════════════════════════
// Tipos de eventos
// ═══════════════════════════════════════════════════════════════════════════

/// Ponto da verificação em que hooks rodam.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookEvent {
    /// Antes de o slot ser lido ou gravado.
    BeforeCheck,

    /// Após a gravação da primeira execução.
    Stored,

    /// Após uma comparação bem-sucedida.
    Matched,

    /// Após qualquer falha.
    Failed,
}

impl HookEvent {
    /// Todos os eventos, na ordem de disparo.
    pub const ALL: [HookEvent; 4] = [
        HookEvent::BeforeCheck,
        HookEvent::Stored,
        HookEvent::Matched,
        HookEvent::Failed,
    ];
}

impl std::fmt::Display for HookEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HookEvent::BeforeCheck => write!(f, "before_check"),
            HookEvent::Stored => write!(f, "stored"),
            HookEvent::Matched => write!(f, "matched"),
            HookEvent::Failed => write!(f, "failed"),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Contexto de hooks
// ═══════════════════════════════════════════════════════════════════════════

/// Dados passados aos hooks.
pub enum HookContext<'a> {
    /// Contexto para before_check.
    BeforeCheck {
        /// Caminho do slot.
        slot: &'a Path,
        /// Array sendo verificado.
        array: &'a NdArray,
    },

    /// Contexto para stored.
    Stored {
        slot: &'a Path,
        array: &'a NdArray,
        /// Tempo gasto gravando o slot.
        elapsed: Duration,
    },

    /// Contexto para matched.
    Matched {
        slot: &'a Path,
        report: &'a ComparisonReport,
        /// Tempo gasto carregando e comparando.
        elapsed: Duration,
    },

    /// Contexto para failed.
    Failed {
        slot: &'a Path,
        error: &'a GoldfileError,
        elapsed: Duration,
    },
}

impl<'a> HookContext<'a> {
    /// Evento correspondente a este contexto.
    pub fn event(&self) -> HookEvent {
        match self {
            HookContext::BeforeCheck { .. } => HookEvent::BeforeCheck,
            HookContext::Stored { .. } => HookEvent::Stored,
            HookContext::Matched { .. } => HookEvent::Matched,
            HookContext::Failed { .. } => HookEvent::Failed,
        }
    }

    /// Slot a que o evento se refere.
    pub fn slot(&self) -> &'a Path {
        match self {
            HookContext::BeforeCheck { slot, .. }
            | HookContext::Stored { slot, .. }
            | HookContext::Matched { slot, .. }
            | HookContext::Failed { slot, .. } => *slot,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Trait de hook
// ═══════════════════════════════════════════════════════════════════════════

/// Observador anexado a um cache de regressão.
pub trait Hook: Send + Sync {
    /// Nome do hook.
    fn name(&self) -> &str;

    /// Eventos que este hook escuta.
    fn events(&self) -> &[HookEvent] {
        &HookEvent::ALL
    }

    /// Executa o hook.
    fn execute(&self, context: &HookContext<'_>);
}

/// Permite manter um handle para um hook registrado, ex: para ler métricas.
impl<H: Hook + ?Sized> Hook for Arc<H> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn events(&self) -> &[HookEvent] {
        (**self).events()
    }

    fn execute(&self, context: &HookContext<'_>) {
        (**self).execute(context)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Sistema de hooks
// ═══════════════════════════════════════════════════════════════════════════

/// Conjunto ordenado de hooks.
#[derive(Default)]
pub struct HookSystem {
    hooks: Vec<Box<dyn Hook>>,
}

impl HookSystem {
    /// Cria um sistema de hooks vazio.
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Cria um sistema com os hooks padrão (logging).
    pub fn with_defaults() -> Self {
        let mut system = Self::new();
        system.register(Box::new(LoggingHook));
        system
    }

    /// Registra um hook.
    pub fn register(&mut self, hook: Box<dyn Hook>) {
        tracing::debug!(
            hook_name = hook.name(),
            events = ?hook.events(),
            "Registering hook"
        );
        self.hooks.push(hook);
    }

    /// Executa cada hook inscrito no evento do contexto, na ordem de registro.
    pub fn emit(&self, context: &HookContext<'_>) {
        let event = context.event();
        for hook in self.hooks.iter().filter(|h| h.events().contains(&event)) {
            hook.execute(context);
        }
    }

    /// Número total de hooks registrados.
    pub fn count(&self) -> usize {
        self.hooks.len()
    }

    /// Se nenhum hook está registrado.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Número de hooks inscritos em um evento.
    pub fn count_for_event(&self, event: HookEvent) -> usize {
        self.hooks
            .iter()
            .filter(|h| h.events().contains(&event))
            .count()
    }
}

impl std::fmt::Debug for HookSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.hooks.iter().map(|h| h.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // Conta execuções
    struct CountingHook {
        name: String,
        events: Vec<HookEvent>,
        count: Arc<AtomicUsize>,
    }

    impl CountingHook {
        fn new(name: &str, events: &[HookEvent], count: Arc<AtomicUsize>) -> Self {
            Self {
                name: name.to_string(),
                events: events.to_vec(),
                count,
            }
        }
    }

    impl Hook for CountingHook {
        fn name(&self) -> &str {
            &self.name
        }

        fn events(&self) -> &[HookEvent] {
            &self.events
        }

        fn execute(&self, _context: &HookContext<'_>) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn sample_array() -> NdArray {
        NdArray::from_vec(vec![1.0f64, 2.0])
    }

    #[test]
    fn test_hook_system_new() {
        let system = HookSystem::new();
        assert_eq!(system.count(), 0);
        assert!(system.is_empty());
    }

    #[test]
    fn test_hook_system_with_defaults() {
        let system = HookSystem::with_defaults();
        assert!(system.count() > 0);
    }

    #[test]
    fn test_hook_registration() {
        let mut system = HookSystem::new();
        let count = Arc::new(AtomicUsize::new(0));

        system.register(Box::new(CountingHook::new(
            "test",
            &[HookEvent::Stored],
            count,
        )));

        assert_eq!(system.count_for_event(HookEvent::Stored), 1);
        assert_eq!(system.count_for_event(HookEvent::Matched), 0);
    }

    #[test]
    fn test_emit_filters_by_event() {
        let mut system = HookSystem::new();
        let stored = Arc::new(AtomicUsize::new(0));
        let failed = Arc::new(AtomicUsize::new(0));

        system.register(Box::new(CountingHook::new(
            "stored",
            &[HookEvent::Stored],
            stored.clone(),
        )));
        system.register(Box::new(CountingHook::new(
            "failed",
            &[HookEvent::Failed],
            failed.clone(),
        )));

        let array = sample_array();
        system.emit(&HookContext::Stored {
            slot: Path::new("a.npy"),
            array: &array,
            elapsed: Duration::ZERO,
        });

        assert_eq!(stored.load(Ordering::SeqCst), 1);
        assert_eq!(failed.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_multiple_hooks_chain() {
        let mut system = HookSystem::new();
        let count1 = Arc::new(AtomicUsize::new(0));
        let count2 = Arc::new(AtomicUsize::new(0));

        system.register(Box::new(CountingHook::new(
            "first",
            &HookEvent::ALL,
            count1.clone(),
        )));
        system.register(Box::new(CountingHook::new(
            "second",
            &HookEvent::ALL,
            count2.clone(),
        )));

        let array = sample_array();
        system.emit(&HookContext::BeforeCheck {
            slot: Path::new("a.npy"),
            array: &array,
        });

        assert_eq!(count1.load(Ordering::SeqCst), 1);
        assert_eq!(count2.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_arc_hook_is_shared() {
        let count = Arc::new(AtomicUsize::new(0));
        let hook = Arc::new(CountingHook::new("shared", &HookEvent::ALL, count.clone()));

        let mut system = HookSystem::new();
        system.register(Box::new(hook.clone()));

        let error = GoldfileError::other("boom");
        system.emit(&HookContext::Failed {
            slot: Path::new("a.npy"),
            error: &error,
            elapsed: Duration::ZERO,
        });

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(Arc::strong_count(&hook), 2);
    }

    #[test]
    fn test_hook_event_display() {
        assert_eq!(format!("{}", HookEvent::BeforeCheck), "before_check");
        assert_eq!(format!("{}", HookEvent::Stored), "stored");
        assert_eq!(format!("{}", HookEvent::Matched), "matched");
        assert_eq!(format!("{}", HookEvent::Failed), "failed");
    }

    #[test]
    fn test_hook_context_event_and_slot() {
        let array = sample_array();
        let ctx = HookContext::BeforeCheck {
            slot: Path::new("golden/out.npy"),
            array: &array,
        };
        assert_eq!(ctx.event(), HookEvent::BeforeCheck);
        assert_eq!(ctx.slot(), Path::new("golden/out.npy"));
    }
}
