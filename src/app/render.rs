// ==========================================
// FarmaINPER 医药库存系统 - 终端渲染
// ==========================================
// 表格: comfy-table；提示符/徽标: colored
// 文案: 全部经 i18n
// ==========================================

use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::domain::medication::Medication;
use crate::domain::types::ExpiryStatus;
use crate::engine::{DashboardSummary, ExpiryClassifier};
use crate::i18n::{t, t_with_args};
use crate::repository::SQL_SETUP_SCRIPT;

pub fn format_success(msg: &str) -> String {
    format!("{} {}", "✓".green().bold(), msg.green())
}

pub fn format_error(msg: &str) -> String {
    format!("{} {}", "✗".red().bold(), msg.red())
}

pub fn format_warning(msg: &str) -> String {
    format!("{} {}", "⚠".yellow().bold(), msg.yellow())
}

fn status_color(status: ExpiryStatus) -> Color {
    match status {
        ExpiryStatus::Safe => Color::Green,
        ExpiryStatus::Warning => Color::Yellow,
        ExpiryStatus::Expired => Color::Red,
    }
}

/// 状态徽标单元格
pub fn status_cell(status: ExpiryStatus) -> Cell {
    Cell::new(t(status.label_key())).fg(status_color(status))
}

/// 库存表格（六列）
pub fn medication_table(medications: &[Medication], classifier: &ExpiryClassifier) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new(t("list.col_code")),
            Cell::new(t("list.col_name")),
            Cell::new(t("list.col_lot")),
            Cell::new(t("list.col_expiry")),
            Cell::new(t("list.col_quantity")),
            Cell::new(t("list.col_status")),
        ]);

    for med in medications {
        table.add_row(vec![
            Cell::new(&med.clave),
            Cell::new(&med.nombre),
            Cell::new(&med.lote),
            Cell::new(med.fecha_caducidad.format("%Y-%m-%d")),
            Cell::new(med.cantidad).set_alignment(CellAlignment::Right),
            status_cell(classifier.classify(med.fecha_caducidad)),
        ]);
    }
    table
}

/// 看板：统计卡片 + 库存前五 + 效期分布
pub fn dashboard_tables(summary: &DashboardSummary) -> (Table, Table, Table) {
    let stats = &summary.stats;

    let mut cards = Table::new();
    cards.load_preset(UTF8_FULL).set_header(vec![
        Cell::new(t("dashboard.total_meds")),
        Cell::new(t("dashboard.stock")),
        Cell::new(t("dashboard.upcoming")),
        Cell::new(t("dashboard.expired")),
    ]);
    cards.add_row(vec![
        Cell::new(stats.total_medicamentos),
        Cell::new(stats.total_unidades),
        Cell::new(stats.por_vencer).fg(Color::Yellow),
        Cell::new(stats.vencidos).fg(Color::Red),
    ]);

    let mut top = Table::new();
    top.load_preset(UTF8_FULL).set_header(vec![
        Cell::new(t("list.col_name")),
        Cell::new(t("list.col_lot")),
        Cell::new(t("list.col_quantity")),
    ]);
    for entry in &summary.top_stock {
        top.add_row(vec![
            Cell::new(&entry.short_name),
            Cell::new(&entry.lote),
            Cell::new(entry.cantidad).set_alignment(CellAlignment::Right),
        ]);
    }

    let mut breakdown = Table::new();
    breakdown.load_preset(UTF8_FULL).set_header(vec![
        Cell::new(t("dashboard.breakdown")),
        Cell::new("#"),
        Cell::new("list --filter"),
    ]);
    for slice in &summary.breakdown {
        breakdown.add_row(vec![
            Cell::new(t(slice.label_key())).fg(status_color(slice.status)),
            Cell::new(slice.value).set_alignment(CellAlignment::Right),
            Cell::new(slice.drill_down),
        ]);
    }

    (cards, top, breakdown)
}

/// 远端缺表时的初始化指引
pub fn setup_guide() -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", t("setup.title").bold()));
    out.push_str(&format!("{}\n\n", t("setup.intro")));
    for key in ["setup.step_1", "setup.step_2", "setup.step_3"] {
        out.push_str(&format!("  {}\n", t(key)));
    }
    out.push('\n');
    out.push_str(SQL_SETUP_SCRIPT);
    out.push('\n');
    out
}

/// 列表结果计数
pub fn results_line(count: usize) -> String {
    if count == 0 {
        t("list.empty")
    } else {
        t_with_args("list.results", &[("count", count.to_string().as_str())])
    }
}

/// 敏感配置值打码
pub fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 4 {
        "****".to_string()
    } else {
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("****{}", tail)
    }
}
