// ==========================================
// FarmaINPER 医药库存系统 - CLI 主入口
// ==========================================
// 技术栈: clap + tokio + SQLite
// 系统定位: 库存台账 + 效期风险看板
// ==========================================

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use farma_inventory::app::commands::{self, parse_filter};
use farma_inventory::app::{get_default_db_path, AppState};
use farma_inventory::{i18n, logging};

#[derive(Parser)]
#[command(name = "farma-inventory")]
#[command(version)]
#[command(about = "FarmaINPER - control de inventario y caducidades", long_about = None)]
struct Cli {
    /// Ruta de la base de datos local
    #[arg(long, value_name = "FILE", env = "FARMA_INVENTORY_DB_PATH")]
    db: Option<PathBuf>,

    /// Idioma de los mensajes (es|en)
    #[arg(long, default_value = "es", env = "FARMA_LOCALE")]
    locale: String,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    /// Logs en formato JSON
    #[arg(long, action = ArgAction::SetTrue)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Importa hojas de cálculo (.xlsx/.xls/.ods/.csv)
    Import {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Descarga el inventario desde la nube
    Sync,

    /// Lista el inventario
    List {
        #[arg(short, long, default_value = "all")]
        filter: String,

        #[arg(short, long, default_value = "")]
        search: String,
    },

    /// Resumen: totales, top de existencias y estado de caducidad
    Dashboard,

    /// Genera el reporte PDF
    Report {
        #[arg(short, long, default_value = "all")]
        filter: String,

        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },

    /// Exporta el inventario a CSV
    Export {
        #[arg(short, long, default_value = "all")]
        filter: String,

        #[arg(short, long)]
        out: PathBuf,
    },

    /// Análisis con IA
    Analyze {
        /// Directorio donde guardar el PDF del análisis
        #[arg(long, value_name = "DIR")]
        pdf: Option<PathBuf>,
    },

    /// Elimina todo el inventario
    Clear {
        #[arg(long)]
        password: String,
    },

    /// Guía de configuración de la tabla remota
    Setup,

    /// Configuración
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    List,
    Get { key: String },
    Set { key: String, value: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    logging::init_with(level, cli.json_logs);
    i18n::set_locale(&cli.locale);

    tracing::info!("{} v{}", farma_inventory::APP_NAME, farma_inventory::VERSION);

    if let Commands::Setup = cli.command {
        return commands::cmd_setup();
    }

    let db_path = match cli.db {
        Some(path) => path.to_string_lossy().to_string(),
        None => get_default_db_path(),
    };
    tracing::info!("使用数据库: {}", db_path);

    let state = AppState::new(db_path)
        .await
        .map_err(anyhow::Error::msg)
        .context("no se pudo inicializar la aplicación")?;
    state.inventory_api.load_local().await?;

    match cli.command {
        Commands::Import { files } => commands::cmd_import(&state, &files).await,
        Commands::Sync => commands::cmd_sync(&state).await,
        Commands::List { filter, search } => {
            commands::cmd_list(&state, parse_filter(&filter)?, &search).await
        }
        Commands::Dashboard => commands::cmd_dashboard(&state).await,
        Commands::Report { filter, out } => {
            commands::cmd_report(&state, parse_filter(&filter)?, &out).await
        }
        Commands::Export { filter, out } => {
            commands::cmd_export(&state, parse_filter(&filter)?, &out).await
        }
        Commands::Analyze { pdf } => commands::cmd_analyze(&state, pdf.as_deref()).await,
        Commands::Clear { password } => commands::cmd_clear(&state, &password).await,
        Commands::Setup => commands::cmd_setup(),
        Commands::Config { action } => match action {
            ConfigAction::List => commands::cmd_config_list(&state),
            ConfigAction::Get { key } => commands::cmd_config_get(&state, &key),
            ConfigAction::Set { key, value } => commands::cmd_config_set(&state, &key, &value),
        },
    }
}
