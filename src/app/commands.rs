// ==========================================
// FarmaINPER 医药库存系统 - CLI 命令处理
// ==========================================
// 每个子命令一个 cmd_* 函数；stdout 输出结果，日志走 stderr
// ==========================================

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use crate::api::{ApiError, SyncOutcome};
use crate::app::render::{
    dashboard_tables, format_error, format_success, format_warning, mask_secret,
    medication_table, results_line, setup_guide,
};
use crate::app::state::AppState;
use crate::config::config_keys;
use crate::domain::types::StatusFilter;
use crate::i18n::{t, t_with_args};
use crate::importer::MedicationImporter;
use crate::services::report::ReportDocument;

/// 敏感配置项（展示时打码）
const SECRET_KEYS: [&str; 3] = [
    config_keys::REMOTE_KEY,
    config_keys::AI_API_KEY,
    config_keys::DELETE_PASSWORD,
];

/// 解析 --filter 参数
pub fn parse_filter(value: &str) -> Result<StatusFilter> {
    StatusFilter::from_str(value)
        .with_context(|| format!("filtro no válido: {} (all|upcoming|expired)", value))
}

fn print_api_error(err: &ApiError) {
    eprintln!("{}", format_error(&err.user_message()));
}

fn write_document(dir: &Path, document: &ReportDocument) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("no se pudo crear {}", dir.display()))?;
    let path = dir.join(&document.file_name);
    fs::write(&path, &document.bytes)
        .with_context(|| format!("no se pudo escribir {}", path.display()))?;
    Ok(path)
}

// ==========================================
// import / sync / clear
// ==========================================

pub async fn cmd_import(state: &AppState, files: &[PathBuf]) -> Result<()> {
    let results = state.importer.batch_import(files.to_vec()).await;

    let mut reports = Vec::new();
    for (file, result) in files.iter().zip(results) {
        let name = file.display().to_string();
        match result {
            Ok(report) => {
                println!(
                    "{}",
                    format_success(&t_with_args(
                        "import.done",
                        &[
                            ("count", report.imported().to_string().as_str()),
                            ("file", name.as_str()),
                            ("row", (report.header.header_row + 1).to_string().as_str()),
                        ],
                    ))
                );
                reports.push(report);
            }
            Err(err) => {
                let api_err = ApiError::from(err);
                warn!(file = %name, error = %api_err, "文件导入失败");
                eprintln!(
                    "{}",
                    format_error(&t_with_args(
                        "import.failed",
                        &[("file", name.as_str()), ("error", api_err.user_message().as_str())],
                    ))
                );
            }
        }
    }

    if reports.is_empty() {
        bail!(t("import.no_columns"));
    }

    let outcome = state.inventory_api.import_all(reports).await?;
    info!(imported = outcome.imported, total = outcome.total, "导入完成");
    if let Some(warning) = outcome.remote_warning {
        println!("{}", format_warning(&warning));
    }
    Ok(())
}

pub async fn cmd_sync(state: &AppState) -> Result<()> {
    match state.inventory_api.sync().await? {
        SyncOutcome::Offline => println!("{}", format_warning(&t("sync.offline"))),
        SyncOutcome::RemoteEmpty => println!("{}", format_warning(&t("sync.empty"))),
        SyncOutcome::Replaced(count) => println!(
            "{}",
            format_success(&t_with_args("sync.success", &[("count", count.to_string().as_str())]))
        ),
        SyncOutcome::Failed {
            message,
            needs_setup,
        } => {
            eprintln!(
                "{}",
                format_error(&t_with_args("sync.error", &[("error", message.as_str())]))
            );
            if needs_setup {
                println!("\n{}", setup_guide());
            }
        }
    }
    Ok(())
}

pub async fn cmd_clear(state: &AppState, password: &str) -> Result<()> {
    match state.inventory_api.clear(password).await {
        Ok(outcome) => {
            println!(
                "{}",
                format_success(&t_with_args(
                    "clear.done",
                    &[("count", outcome.local_deleted.to_string().as_str())],
                ))
            );
            Ok(())
        }
        Err(err) => {
            print_api_error(&err);
            Err(err.into())
        }
    }
}

// ==========================================
// list / dashboard
// ==========================================

pub async fn cmd_list(state: &AppState, filter: StatusFilter, search: &str) -> Result<()> {
    let rows = state.inventory_api.list(filter, search).await?;
    let classifier = state.inventory_api.expiry_classifier().await?;
    if !rows.is_empty() {
        println!("{}", medication_table(&rows, &classifier));
    }
    println!("{}", results_line(rows.len()));
    Ok(())
}

pub async fn cmd_dashboard(state: &AppState) -> Result<()> {
    let summary = state.inventory_api.dashboard().await?;
    let (cards, top, breakdown) = dashboard_tables(&summary);
    println!("{}", cards);
    println!("\n{}\n{}", t("dashboard.top_stock"), top);
    println!("\n{}\n{}", t("dashboard.breakdown"), breakdown);
    Ok(())
}

// ==========================================
// report / export / analyze
// ==========================================

pub async fn cmd_report(state: &AppState, filter: StatusFilter, out_dir: &Path) -> Result<()> {
    let document = state.inventory_api.report(filter).await?;
    let path = write_document(out_dir, &document)?;
    println!(
        "{}",
        format_success(&t_with_args("report.saved", &[("path", path.display().to_string().as_str())]))
    );
    Ok(())
}

pub async fn cmd_export(state: &AppState, filter: StatusFilter, out_file: &Path) -> Result<()> {
    if let Some(parent) = out_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = fs::File::create(out_file)
        .with_context(|| format!("no se pudo crear {}", out_file.display()))?;
    let count = state.inventory_api.export_csv(filter, file).await?;
    println!(
        "{}",
        format_success(&t_with_args(
            "report.export_saved",
            &[
                ("path", out_file.display().to_string().as_str()),
                ("count", count.to_string().as_str()),
            ],
        ))
    );
    Ok(())
}

pub async fn cmd_analyze(state: &AppState, pdf_dir: Option<&Path>) -> Result<()> {
    let analysis = match state.inventory_api.analyze().await {
        Ok(text) => text,
        Err(err) => {
            print_api_error(&err);
            return Err(err.into());
        }
    };
    println!("{}", analysis);

    if let Some(dir) = pdf_dir {
        let document = state.inventory_api.analyze_report(&analysis).await?;
        let path = write_document(dir, &document)?;
        println!(
            "\n{}",
            format_success(&t_with_args("report.saved", &[("path", path.display().to_string().as_str())]))
        );
    }
    Ok(())
}

// ==========================================
// setup / config
// ==========================================

pub fn cmd_setup() -> Result<()> {
    println!("{}", setup_guide());
    Ok(())
}

pub fn cmd_config_list(state: &AppState) -> Result<()> {
    let stored: std::collections::HashMap<String, String> = state
        .config
        .list_configs()
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .into_iter()
        .collect();

    for key in config_keys::ALL {
        let shown = match stored.get(key) {
            Some(value) if SECRET_KEYS.contains(&key) => mask_secret(value),
            Some(value) => value.clone(),
            None => t("config.not_set"),
        };
        println!("{:<28} {}", key, shown);
    }
    Ok(())
}

pub fn cmd_config_get(state: &AppState, key: &str) -> Result<()> {
    ensure_known_key(key)?;
    let value = state
        .config
        .get_global_config_value(key)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    match value {
        Some(v) if SECRET_KEYS.contains(&key) => println!("{}", mask_secret(&v)),
        Some(v) => println!("{}", v),
        None => println!("{}", t("config.not_set")),
    }
    Ok(())
}

pub fn cmd_config_set(state: &AppState, key: &str, value: &str) -> Result<()> {
    ensure_known_key(key)?;
    state
        .config
        .set_config_value(key, value)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    println!(
        "{}",
        format_success(&t_with_args("config.updated", &[("key", key)]))
    );
    Ok(())
}

fn ensure_known_key(key: &str) -> Result<()> {
    if config_keys::ALL.contains(&key) {
        Ok(())
    } else {
        bail!(t_with_args("config.unknown_key", &[("key", key)]))
    }
}
