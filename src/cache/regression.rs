//! Slots golden persistidos em arquivo.

use std::io::BufWriter;
use std::path::Path;
use std::time::Instant;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::hooks::{HookContext, HookSystem};
use crate::npy;
use crate::types::array::NdArray;
use crate::types::config::CacheConfig;
use crate::types::outcome::{CacheOutcome, SlotInfo};
use crate::{GoldfileError, GoldfileResult};

use super::compare::{assert_almost_equal, ComparisonReport, Tolerance};

/// Verifica arrays contra slots golden, criando cada slot no primeiro uso.
///
/// Um slot é um arquivo `.npy` com um array. A primeira verificação contra um
/// slot ausente o grava; cada verificação seguinte apenas lê e compara.
/// Slots só são substituídos via [`RegressionCache::store`].
#[derive(Debug)]
pub struct RegressionCache {
    tolerance: Tolerance,
    sync: bool,
    hooks: HookSystem,
}

/// O que uma verificação fez, antes de ser reportado aos hooks.
enum Checked {
    Stored,
    Matched(ComparisonReport),
}

impl RegressionCache {
    /// Cache com tolerância de 7 decimais, fsync ao gravar e sem hooks.
    pub fn new() -> Self {
        Self {
            tolerance: Tolerance::default(),
            sync: true,
            hooks: HookSystem::new(),
        }
    }

    /// Cache construído a partir da seção `[cache]` da config.
    pub fn from_config(config: &CacheConfig) -> GoldfileResult<Self> {
        Ok(Self::new()
            .with_decimal(config.decimal)?
            .with_sync(config.sync))
    }

    /// Define o decimal usado por [`RegressionCache::check`].
    pub fn with_decimal(mut self, decimal: u32) -> GoldfileResult<Self> {
        self.tolerance = Tolerance::from_decimal(decimal)?;
        Ok(self)
    }

    /// Se os arquivos de slot recebem fsync antes de serem renomeados.
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Anexa hooks de instrumentação.
    pub fn with_hooks(mut self, hooks: HookSystem) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn tolerance(&self) -> Tolerance {
        self.tolerance
    }

    pub fn hooks(&self) -> &HookSystem {
        &self.hooks
    }

    /// [`RegressionCache::check_or_store`] com o decimal configurado.
    pub fn check<P: AsRef<Path>>(&self, array: &NdArray, path: P) -> GoldfileResult<CacheOutcome> {
        self.check_or_store(array, path, self.tolerance.decimal())
    }

    /// Grava `array` em `path` se o slot ainda não existe; caso contrário
    /// carrega o slot e exige que todo elemento de `array` esteja a menos de
    /// `1.5 * 10^-decimal` dele.
    ///
    /// # Erros
    ///
    /// - `InvalidSlotName` quando `path` não termina em `.npy` (nenhum I/O é feito)
    /// - `ShapeMismatch` / `DtypeMismatch` quando o slot contém outro tipo de array
    /// - `ToleranceExceeded` com a maior diferença e onde ela ocorreu
    /// - erros de I/O e de formato ao ler ou gravar o slot
    pub fn check_or_store<P: AsRef<Path>>(
        &self,
        array: &NdArray,
        path: P,
        decimal: u32,
    ) -> GoldfileResult<CacheOutcome> {
        let slot = path.as_ref();
        self.hooks.emit(&HookContext::BeforeCheck { slot, array });

        let started = Instant::now();
        let result = self.run_check(array, slot, decimal);
        let elapsed = started.elapsed();

        match result {
            Ok(Checked::Stored) => {
                self.hooks.emit(&HookContext::Stored {
                    slot,
                    array,
                    elapsed,
                });
                Ok(CacheOutcome::Stored)
            }
            Ok(Checked::Matched(report)) => {
                self.hooks.emit(&HookContext::Matched {
                    slot,
                    report: &report,
                    elapsed,
                });
                Ok(CacheOutcome::Match)
            }
            Err(error) => {
                self.hooks.emit(&HookContext::Failed {
                    slot,
                    error: &error,
                    elapsed,
                });
                Err(error)
            }
        }
    }

    fn run_check(&self, array: &NdArray, slot: &Path, decimal: u32) -> GoldfileResult<Checked> {
        validate_slot(slot)?;
        let tolerance = Tolerance::from_decimal(decimal)?;

        if !slot.is_file() {
            self.write_slot(array, slot, false)?;
            return Ok(Checked::Stored);
        }

        let stored = npy::load(slot)?;
        let report = assert_almost_equal(&stored, array, tolerance)?;
        Ok(Checked::Matched(report))
    }

    /// Grava `array` no slot, substituindo o que estiver lá.
    pub fn store<P: AsRef<Path>>(&self, array: &NdArray, path: P) -> GoldfileResult<()> {
        let slot = path.as_ref();
        validate_slot(slot)?;

        let started = Instant::now();
        self.write_slot(array, slot, true)?;
        self.hooks.emit(&HookContext::Stored {
            slot,
            array,
            elapsed: started.elapsed(),
        });
        Ok(())
    }

    /// Lê o array contido em um slot.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> GoldfileResult<NdArray> {
        let slot = path.as_ref();
        validate_slot(slot)?;
        npy::load(slot)
    }

    /// Descreve um slot sem comparar nada.
    pub fn inspect<P: AsRef<Path>>(&self, path: P) -> GoldfileResult<SlotInfo> {
        let slot = path.as_ref();
        validate_slot(slot)?;

        let bytes = std::fs::read(slot)?;
        let array = npy::from_bytes(&bytes)?;
        let modified = std::fs::metadata(slot)?
            .modified()
            .ok()
            .map(DateTime::<Utc>::from);

        Ok(SlotInfo {
            path: slot.to_path_buf(),
            shape: array.shape().to_vec(),
            dtype: array.dtype(),
            elements: array.len(),
            file_size: bytes.len() as u64,
            sha256: hex::encode(Sha256::digest(&bytes)),
            modified,
        })
    }

    /// Grava em um arquivo temporário ao lado do slot e depois o renomeia sobre
    /// o slot. Sem `overwrite` o rename falha se o slot apareceu
    /// nesse meio tempo.
    fn write_slot(&self, array: &NdArray, slot: &Path, overwrite: bool) -> GoldfileResult<()> {
        let dir = match slot.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = tempfile::Builder::new()
            .prefix(".goldfile-")
            .suffix(".tmp")
            .tempfile_in(dir)?;
        npy::write_npy(BufWriter::new(tmp.as_file_mut()), array)?;
        if self.sync {
            tmp.as_file().sync_all()?;
        }

        let persisted = if overwrite {
            tmp.persist(slot)
        } else {
            tmp.persist_noclobber(slot)
        };
        persisted.map_err(|e| GoldfileError::Io(e.error))?;

        tracing::debug!(
            slot = %slot.display(),
            shape = ?array.shape(),
            dtype = %array.dtype(),
            overwrite,
            "Slot written"
        );
        Ok(())
    }
}

impl Default for RegressionCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Falha com `InvalidSlotName` a menos que o caminho termine em `.npy`.
pub fn validate_slot(path: &Path) -> GoldfileResult<()> {
    let name = path.as_os_str().to_string_lossy();
    if name.ends_with(&format!(".{}", npy::EXTENSION)) {
        Ok(())
    } else {
        Err(GoldfileError::InvalidSlotName(name.into_owned()))
    }
}

/// Verifica `array` contra o slot em `path` com um cache padrão.
pub fn check_or_store<P: AsRef<Path>>(
    array: &NdArray,
    path: P,
    decimal: u32,
) -> GoldfileResult<CacheOutcome> {
    RegressionCache::new().check_or_store(array, path, decimal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::MetricsHook;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn sample() -> NdArray {
        NdArray::new(vec![2, 2], vec![1.0f64, 2.0, 3.0, 4.0]).unwrap()
    }

    #[test]
    fn test_validate_slot() {
        assert!(validate_slot(Path::new("a.npy")).is_ok());
        assert!(validate_slot(Path::new("dir/nested/a.npy")).is_ok());
        assert!(validate_slot(Path::new("a.npz")).is_err());
        assert!(validate_slot(Path::new("a.NPY")).is_err());
        assert!(validate_slot(Path::new("npy")).is_err());
    }

    #[test]
    fn test_invalid_slot_name_does_no_io() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("slot.txt");

        let err = check_or_store(&sample(), &path, 7).unwrap_err();
        assert!(matches!(err, GoldfileError::InvalidSlotName(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_store_then_match() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("slot.npy");
        let cache = RegressionCache::new();

        assert_eq!(cache.check(&sample(), &path).unwrap(), CacheOutcome::Stored);
        assert!(path.is_file());
        assert_eq!(cache.check(&sample(), &path).unwrap(), CacheOutcome::Match);
    }

    #[test]
    fn test_check_does_not_modify_slot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("slot.npy");
        let cache = RegressionCache::new();

        cache.check(&sample(), &path).unwrap();
        let before = std::fs::read(&path).unwrap();

        let other = NdArray::new(vec![2, 2], vec![1.0f64, 2.0, 3.0, 5.0]).unwrap();
        assert!(cache.check(&other, &path).is_err());
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_explicit_store_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("slot.npy");
        let cache = RegressionCache::new();

        cache.check(&sample(), &path).unwrap();
        let replacement = NdArray::from_vec(vec![9i32, 8, 7]);
        cache.store(&replacement, &path).unwrap();

        assert_eq!(cache.load(&path).unwrap(), replacement);
        assert_eq!(cache.check(&replacement, &path).unwrap(), CacheOutcome::Match);
    }

    #[test]
    fn test_no_temporary_files_left_behind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("slot.npy");
        let cache = RegressionCache::new().with_sync(false);

        cache.check(&sample(), &path).unwrap();
        cache.store(&sample(), &path).unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("slot.npy")]);
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("slot.npy");

        let err = check_or_store(&sample(), &path, 7).unwrap_err();
        assert!(matches!(err, GoldfileError::Io(_)));
    }

    #[test]
    fn test_inspect() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("slot.npy");
        let cache = RegressionCache::new();
        cache.check(&sample(), &path).unwrap();

        let info = cache.inspect(&path).unwrap();
        assert_eq!(info.shape, vec![2, 2]);
        assert_eq!(info.dtype, crate::types::array::Dtype::F64);
        assert_eq!(info.elements, 4);
        assert_eq!(info.file_size, std::fs::metadata(&path).unwrap().len());
        assert_eq!(info.sha256.len(), 64);
        assert!(info.modified.is_some());
    }

    #[test]
    fn test_from_config() {
        let config = CacheConfig {
            decimal: 2,
            sync: false,
        };
        let cache = RegressionCache::from_config(&config).unwrap();
        assert_eq!(cache.tolerance().decimal(), 2);

        let bad = CacheConfig {
            decimal: 1000,
            sync: true,
        };
        assert!(RegressionCache::from_config(&bad).is_err());
    }

    #[test]
    fn test_hooks_observe_without_changing_outcome() {
        let dir = TempDir::new().unwrap();
        let metrics = Arc::new(MetricsHook::new());
        let mut hooks = HookSystem::with_defaults();
        hooks.register(Box::new(metrics.clone()));

        let plain = RegressionCache::new();
        let hooked = RegressionCache::new().with_hooks(hooks);

        let a = dir.path().join("a.npy");
        let b = dir.path().join("b.npy");
        let off = NdArray::new(vec![2, 2], vec![1.0f64, 2.0, 3.0, 4.1]).unwrap();

        assert_eq!(plain.check(&sample(), &a).unwrap(), hooked.check(&sample(), &b).unwrap());
        assert_eq!(plain.check(&sample(), &a).unwrap(), hooked.check(&sample(), &b).unwrap());
        assert!(plain.check(&off, &a).is_err());
        assert!(hooked.check(&off, &b).is_err());

        assert_eq!(metrics.total_checks(), 3);
        assert_eq!(metrics.total_stores(), 1);
        assert_eq!(metrics.total_matches(), 1);
        assert_eq!(metrics.total_failures(), 1);
    }
}
