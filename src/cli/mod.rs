//! Interface de linha de comando do goldfile.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::types::config::CONFIG_FILE;

/// goldfile - Verificações de regressão com arquivos golden para arrays .npy.
#[derive(Parser, Debug)]
#[command(name = "goldfile")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Arquivo de configuração.
    #[arg(short, long, default_value = CONFIG_FILE)]
    pub config: PathBuf,

    /// Modo verbose.
    #[arg(short, long)]
    pub verbose: bool,

    /// Modo silencioso (apenas erros).
    #[arg(short, long)]
    pub quiet: bool,

    /// Comando a executar.
    #[command(subcommand)]
    pub command: Commands,
}

/// Comandos disponíveis.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Cria um goldfile.toml padrão.
    Init {
        /// Diretório de destino (padrão: diretório atual).
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Verifica um array contra um slot, criando o slot no primeiro uso.
    Check {
        /// Array recém-calculado (.npy).
        input: PathBuf,

        /// Slot golden (.npy).
        slot: PathBuf,

        /// Casas decimais da comparação (padrão: config).
        #[arg(short, long)]
        decimal: Option<u32>,
    },

    /// Substitui um slot por um array.
    Store {
        /// Array a gravar (.npy).
        input: PathBuf,

        /// Slot golden (.npy).
        slot: PathBuf,
    },

    /// Compara dois arquivos .npy sem tocar em nenhum slot.
    Compare {
        /// Array de referência.
        expected: PathBuf,

        /// Array sob teste.
        actual: PathBuf,

        /// Casas decimais da comparação (padrão: config).
        #[arg(short, long)]
        decimal: Option<u32>,
    },

    /// Mostra shape, dtype e digest de um slot.
    Inspect {
        /// Slot golden (.npy).
        slot: PathBuf,

        /// Imprime JSON em vez de texto.
        #[arg(long)]
        json: bool,
    },

    /// Mostra versão.
    Version,
}
