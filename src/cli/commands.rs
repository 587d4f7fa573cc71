//! Implementação dos comandos CLI do goldfile.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::{compare, validate_slot, RegressionCache, Tolerance};
use crate::hooks::{timeit, HookSystem, LoggingHook, MetricsHook};
use crate::npy;
use crate::types::config::{Config, CONFIG_FILE};
use crate::types::outcome::CacheOutcome;
use crate::{GoldfileError, GoldfileResult};

/// Initializes configuration in the specified directory.
pub fn init(path: Option<PathBuf>) -> GoldfileResult<()> {
    let target_dir = path.unwrap_or_else(|| PathBuf::from("."));

    if !target_dir.exists() {
        std::fs::create_dir_all(&target_dir)?;
        tracing::info!("Directory created: {}", target_dir.display());
    }

    let config_path = target_dir.join(CONFIG_FILE);

    if config_path.exists() {
        println!("Configuration already exists at: {}", config_path.display());
        return Ok(());
    }

    let config = Config::default_config();
    config.save(&config_path)?;

    println!("Configuration created at: {}", config_path.display());
    println!();
    println!("Next steps:");
    println!("  1. Save a computed array as .npy");
    println!("  2. goldfile check result.npy golden/result.npy");
    println!("     (the first run creates the golden file, later runs compare against it)");

    Ok(())
}

/// Hooks escolhidos pela seção `[hooks]` da config. O handle de métricas é
/// retornado para que os contadores possam ser reportados depois.
fn build_hooks(config: &Config) -> (HookSystem, Option<Arc<MetricsHook>>) {
    let mut hooks = HookSystem::new();
    if config.hooks.logging {
        hooks.register(Box::new(LoggingHook::new()));
    }

    let metrics = if config.hooks.metrics {
        let metrics = Arc::new(MetricsHook::new());
        hooks.register(Box::new(metrics.clone()));
        Some(metrics)
    } else {
        None
    };

    (hooks, metrics)
}

fn build_cache(config: &Config) -> GoldfileResult<(RegressionCache, Option<Arc<MetricsHook>>)> {
    let (hooks, metrics) = build_hooks(config);
    let cache = RegressionCache::from_config(&config.cache)?.with_hooks(hooks);
    Ok((cache, metrics))
}

fn report_metrics(metrics: Option<Arc<MetricsHook>>) -> GoldfileResult<()> {
    if let Some(metrics) = metrics {
        eprintln!("{}", serde_json::to_string_pretty(&metrics.metrics())?);
    }
    Ok(())
}

/// Verifica um array de entrada contra um slot.
pub fn check(
    input: &Path,
    slot: &Path,
    decimal: Option<u32>,
    config: &Config,
) -> GoldfileResult<CacheOutcome> {
    validate_slot(slot)?;
    let (cache, metrics) = build_cache(config)?;
    let decimal = decimal.unwrap_or(config.cache.decimal);

    let array = npy::load(input)?;
    let timed = timeit("check_or_store", || cache.check_or_store(&array, slot, decimal));
    report_metrics(metrics)?;

    let outcome = timed.value?;
    match outcome {
        CacheOutcome::Stored => println!("✓ stored {} (new golden file)", slot.display()),
        CacheOutcome::Match => println!(
            "✓ {} matches {} to {} decimals",
            input.display(),
            slot.display(),
            decimal
        ),
    }
    Ok(outcome)
}

/// Replaces a slot with an input array.
pub fn store(input: &Path, slot: &Path, config: &Config) -> GoldfileResult<()> {
    validate_slot(slot)?;
    let (cache, metrics) = build_cache(config)?;

    let array = npy::load(input)?;
    cache.store(&array, slot)?;
    report_metrics(metrics)?;

    println!(
        "✓ stored {} ({:?} {})",
        slot.display(),
        array.shape(),
        array.dtype()
    );
    Ok(())
}

/// Compara dois arrays e imprime o relatório.
pub fn compare_files(
    expected: &Path,
    actual: &Path,
    decimal: Option<u32>,
    config: &Config,
) -> GoldfileResult<()> {
    let tolerance = Tolerance::from_decimal(decimal.unwrap_or(config.cache.decimal))?;
    let expected_array = npy::load(expected)?;
    let actual_array = npy::load(actual)?;

    let report = compare(&expected_array, &actual_array, tolerance)?;
    println!("elements:     {}", report.total);
    println!("mismatched:   {}", report.mismatched);
    println!("max abs diff: {}", report.max_abs_diff);
    if let Some(index) = &report.max_index {
        println!("at index:     {:?}", index);
    }

    report.into_result()?;
    println!(
        "✓ {} matches {} to {} decimals",
        actual.display(),
        expected.display(),
        tolerance.decimal()
    );
    Ok(())
}

/// Mostra informações sobre um slot.
pub fn inspect(slot: &Path, json: bool) -> GoldfileResult<()> {
    let info = RegressionCache::new().inspect(slot)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("slot:     {}", info.path.display());
    println!("shape:    {:?}", info.shape);
    println!("dtype:    {}", info.dtype);
    println!("elements: {}", info.elements);
    println!("size:     {} bytes", info.file_size);
    println!("sha256:   {}", info.sha256);
    match info.modified {
        Some(modified) => println!("modified: {}", modified.to_rfc3339()),
        None => println!("modified: unknown"),
    }
    Ok(())
}

/// Mostra versão.
pub fn version() {
    println!("goldfile {}", env!("CARGO_PKG_VERSION"));
    println!("Golden-file regression checks for .npy arrays");
}

/// Exit code for a failed command: 1 for regressions, 2 for everything else.
pub fn exit_code(error: &GoldfileError) -> u8 {
    if error.is_regression() {
        1
    } else {
        2
    }
}
