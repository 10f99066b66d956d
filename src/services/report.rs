// ==========================================
// FarmaINPER 医药库存系统 - 报表生成
// ==========================================
// 输出: 库存 PDF（多页表格）/ AI 分析 PDF / CSV 导出
// 版式: A4 纵向，坐标单位 mm，原点在左下角
// ==========================================

use crate::domain::medication::{InventoryStats, Medication};
use crate::engine::expiry::ExpiryClassifier;
use crate::i18n::{t, t_with_args};
use chrono::{DateTime, Local};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Rect, Rgb,
};
use std::io::{BufWriter, Write};
use std::ops::Range;
use thiserror::Error;
use tracing::{debug, instrument};

// ===== 版式常量 =====
const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN_X: f32 = 15.0;
const HEADER_BAND_H: f32 = 40.0;
const ROW_H: f32 = 6.5;
const TABLE_BOTTOM: f32 = 20.0;
const FOOTER_Y: f32 = 12.0;
const CONTINUATION_TOP: f32 = PAGE_H - 20.0;

/// 表格列: (x 坐标, 最大字符数)
const COLUMNS: [(f32, usize); 5] = [(15.0, 16), (45.0, 38), (115.0, 12), (142.0, 12), (172.0, 10)];
const COLUMN_HEADERS: [&str; 5] = ["CLAVE", "MEDICAMENTO", "LOTE", "CADUCIDAD", "CANTIDAD"];

// AI 报告正文
const AI_LINE_H: f32 = 5.5;
const AI_WRAP_CHARS: usize = 95;
const AI_TEXT_BOTTOM: f32 = 55.0;

fn blue() -> Color {
    Color::Rgb(Rgb::new(37.0 / 255.0, 99.0 / 255.0, 235.0 / 255.0, None))
}

fn indigo() -> Color {
    Color::Rgb(Rgb::new(79.0 / 255.0, 70.0 / 255.0, 229.0 / 255.0, None))
}

fn white() -> Color {
    Color::Rgb(Rgb::new(1.0, 1.0, 1.0, None))
}

fn dark_gray() -> Color {
    Color::Rgb(Rgb::new(31.0 / 255.0, 41.0 / 255.0, 55.0 / 255.0, None))
}

fn light_gray() -> Color {
    Color::Rgb(Rgb::new(156.0 / 255.0, 163.0 / 255.0, 175.0 / 255.0, None))
}

/// 报表错误
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("PDF 生成失败: {0}")]
    Pdf(String),

    #[error("CSV 写入失败: {0}")]
    Csv(#[from] csv::Error),

    #[error("文件写入失败: {0}")]
    Io(#[from] std::io::Error),
}

impl From<printpdf::Error> for ReportError {
    fn from(err: printpdf::Error) -> Self {
        ReportError::Pdf(err.to_string())
    }
}

/// 生成结果（文件名 + 内容）
#[derive(Debug, Clone)]
pub struct ReportDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// 版式参数
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub brand: String,
    pub generated_at: DateTime<Local>,
    pub window_months: u32,
}

impl ReportOptions {
    pub fn now(brand: impl Into<String>, window_months: u32) -> Self {
        Self {
            brand: brand.into(),
            generated_at: Local::now(),
            window_months,
        }
    }

    fn millis(&self) -> i64 {
        self.generated_at.timestamp_millis()
    }
}

// ==========================================
// 纯函数（文件名 / 分页 / 换行）
// ==========================================

/// {brand}_Reporte_{标题空白→_}_{毫秒}.pdf
pub fn report_file_name(brand: &str, title: &str, millis: i64) -> String {
    let title = title.split_whitespace().collect::<Vec<_>>().join("_");
    format!("{}_Reporte_{}_{}.pdf", brand, title, millis)
}

/// {brand}_IA_Analisis_{毫秒}.pdf
pub fn ai_report_file_name(brand: &str, millis: i64) -> String {
    format!("{}_IA_Analisis_{}.pdf", brand, millis)
}

/// 表格区域可容纳的数据行数（扣除表头行）
fn rows_fit(table_top: f32) -> usize {
    (((table_top - TABLE_BOTTOM) / ROW_H).floor() as usize).saturating_sub(1).max(1)
}

/// 按首页/续页容量切分行区间；空列表也占一页
pub fn paginate(total: usize, first_page: usize, other_pages: usize) -> Vec<Range<usize>> {
    let first_page = first_page.max(1);
    let other_pages = other_pages.max(1);
    let mut pages = vec![0..total.min(first_page)];
    let mut start = first_page;
    while start < total {
        let end = (start + other_pages).min(total);
        pages.push(start..end);
        start = end;
    }
    pages
}

/// 按词换行（保留空行分段）
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        if paragraph.trim().is_empty() {
            lines.push(String::new());
            continue;
        }
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let needed = if current.is_empty() { 0 } else { 1 } + word.chars().count();
            if !current.is_empty() && current.chars().count() + needed > max_chars {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        lines.push(current);
    }
    lines
}

/// 单元格截断（超长追加 "..."）
fn fit(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

// ==========================================
// PDF 绘制辅助
// ==========================================

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

impl Fonts {
    fn load(doc: &PdfDocumentReference) -> Result<Self, ReportError> {
        Ok(Self {
            regular: doc.add_builtin_font(BuiltinFont::Helvetica)?,
            bold: doc.add_builtin_font(BuiltinFont::HelveticaBold)?,
            italic: doc.add_builtin_font(BuiltinFont::HelveticaOblique)?,
        })
    }
}

fn push_text(layer: &PdfLayerReference, font: &IndirectFontRef, text: &str, size: f32, x: f32, y: f32) {
    layer.use_text(text, size, Mm(x), Mm(y), font);
}

fn fill_rect(layer: &PdfLayerReference, color: Color, x1: f32, y1: f32, x2: f32, y2: f32) {
    layer.set_fill_color(color);
    layer.add_rect(Rect::new(Mm(x1), Mm(y1), Mm(x2), Mm(y2)));
}

fn h_line(layer: &PdfLayerReference, y: f32) {
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(MARGIN_X), Mm(y)), false),
            (Point::new(Mm(PAGE_W - MARGIN_X), Mm(y)), false),
        ],
        is_closed: false,
    });
}

fn save_to_bytes(doc: PdfDocumentReference) -> Result<Vec<u8>, ReportError> {
    let mut writer = BufWriter::new(Vec::<u8>::new());
    doc.save(&mut writer)?;
    writer
        .into_inner()
        .map_err(|e| ReportError::Pdf(e.to_string()))
}

fn draw_table_header(layer: &PdfLayerReference, fonts: &Fonts, top: f32) {
    fill_rect(layer, blue(), MARGIN_X, top - ROW_H, PAGE_W - MARGIN_X, top);
    layer.set_fill_color(white());
    for ((x, _), label) in COLUMNS.iter().zip(COLUMN_HEADERS) {
        push_text(layer, &fonts.bold, label, 9.0, *x + 1.0, top - ROW_H + 2.0);
    }
    layer.set_fill_color(dark_gray());
}

fn draw_table_rows(layer: &PdfLayerReference, fonts: &Fonts, top: f32, rows: &[&Medication]) {
    let mut y = top - ROW_H;
    for med in rows {
        y -= ROW_H;
        let cells = [
            med.clave.clone(),
            med.nombre.clone(),
            med.lote.clone(),
            med.fecha_caducidad.format("%Y-%m-%d").to_string(),
            med.cantidad.to_string(),
        ];
        for ((x, max_chars), value) in COLUMNS.iter().zip(cells.iter()) {
            push_text(layer, &fonts.regular, &fit(value, *max_chars), 9.0, *x + 1.0, y + 2.0);
        }
    }
}

fn draw_footer(layer: &PdfLayerReference, fonts: &Fonts, brand: &str, page: usize, total: usize) {
    layer.set_fill_color(light_gray());
    let footer = t_with_args(
        "report.footer",
        &[
            ("brand", brand),
            ("page", page.to_string().as_str()),
            ("total", total.to_string().as_str()),
        ],
    );
    push_text(layer, &fonts.regular, &footer, 8.0, MARGIN_X, FOOTER_Y);
    layer.set_fill_color(dark_gray());
}

// ==========================================
// 库存报告
// ==========================================

/// 生成库存 PDF
///
/// # 参数
/// - title: 报告标题（按筛选条件）
/// - medications: 已筛选的记录
/// - stats: 执行摘要（None 则不输出摘要）
#[instrument(skip_all, fields(title = %title, rows = medications.len()))]
pub fn medication_report(
    title: &str,
    medications: &[&Medication],
    stats: Option<&InventoryStats>,
    options: &ReportOptions,
) -> Result<ReportDocument, ReportError> {
    let (doc, page1, layer1) = PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
    let fonts = Fonts::load(&doc)?;
    let generated = options.generated_at.format("%d/%m/%Y %H:%M").to_string();

    // 首页页眉
    let layer = doc.get_page(page1).get_layer(layer1);
    fill_rect(&layer, blue(), 0.0, PAGE_H - HEADER_BAND_H, PAGE_W, PAGE_H);
    layer.set_fill_color(white());
    push_text(&layer, &fonts.bold, &options.brand, 24.0, MARGIN_X, PAGE_H - 20.0);
    push_text(&layer, &fonts.regular, &t("report.subtitle"), 10.0, MARGIN_X, PAGE_H - 28.0);
    push_text(
        &layer,
        &fonts.regular,
        &t_with_args("report.generated_at", &[("date", generated.as_str())]),
        10.0,
        140.0,
        PAGE_H - 28.0,
    );

    layer.set_fill_color(dark_gray());
    push_text(&layer, &fonts.bold, &title.to_uppercase(), 16.0, MARGIN_X, PAGE_H - 55.0);

    let first_top = match stats {
        Some(stats) => {
            push_text(&layer, &fonts.bold, &t("report.summary"), 10.0, MARGIN_X, PAGE_H - 65.0);
            let months = options.window_months.to_string();
            let lines = [
                (t_with_args("report.total_meds", &[("count", stats.total_medicamentos.to_string().as_str())]), MARGIN_X, 72.0),
                (t_with_args("report.total_units", &[("count", stats.total_unidades.to_string().as_str())]), MARGIN_X, 78.0),
                (
                    t_with_args(
                        "report.upcoming",
                        &[("months", months.as_str()), ("count", stats.por_vencer.to_string().as_str())],
                    ),
                    100.0,
                    72.0,
                ),
                (t_with_args("report.expired", &[("count", stats.vencidos.to_string().as_str())]), 100.0, 78.0),
            ];
            for (text, x, offset) in lines {
                push_text(&layer, &fonts.regular, &text, 10.0, x, PAGE_H - offset);
            }
            PAGE_H - 85.0
        }
        None => PAGE_H - 65.0,
    };

    let pages = paginate(medications.len(), rows_fit(first_top), rows_fit(CONTINUATION_TOP));
    let total_pages = pages.len();

    for (idx, range) in pages.into_iter().enumerate() {
        let (layer, top) = if idx == 0 {
            (doc.get_page(page1).get_layer(layer1), first_top)
        } else {
            let (page, layer) = doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
            (doc.get_page(page).get_layer(layer), CONTINUATION_TOP)
        };
        draw_table_header(&layer, &fonts, top);
        draw_table_rows(&layer, &fonts, top, &medications[range]);
        draw_footer(&layer, &fonts, &options.brand, idx + 1, total_pages);
    }

    debug!(pages = total_pages, "库存 PDF 生成完成");
    Ok(ReportDocument {
        file_name: report_file_name(&options.brand, title, options.millis()),
        bytes: save_to_bytes(doc)?,
    })
}

// ==========================================
// AI 分析报告
// ==========================================

#[instrument(skip_all, fields(chars = analysis.len()))]
pub fn ai_insight_report(analysis: &str, options: &ReportOptions) -> Result<ReportDocument, ReportError> {
    let title = t_with_args("report.ai_title", &[("brand", options.brand.as_str())]);
    let (doc, page1, layer1) = PdfDocument::new(&title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
    let fonts = Fonts::load(&doc)?;
    let date = options.generated_at.format("%d/%m/%Y").to_string();

    let lines = wrap_text(analysis, AI_WRAP_CHARS);
    let first_fit = ((PAGE_H - 65.0 - AI_TEXT_BOTTOM) / AI_LINE_H).floor() as usize;
    let other_fit = ((CONTINUATION_TOP - AI_TEXT_BOTTOM) / AI_LINE_H).floor() as usize;
    let pages = paginate(lines.len(), first_fit, other_fit);
    let total_pages = pages.len();

    for (idx, range) in pages.into_iter().enumerate() {
        let (layer, mut y) = if idx == 0 {
            let layer = doc.get_page(page1).get_layer(layer1);
            fill_rect(&layer, indigo(), 0.0, PAGE_H - HEADER_BAND_H, PAGE_W, PAGE_H);
            layer.set_fill_color(white());
            push_text(&layer, &fonts.bold, &title, 22.0, MARGIN_X, PAGE_H - 20.0);
            push_text(
                &layer,
                &fonts.regular,
                &t_with_args("report.ai_subtitle", &[("date", date.as_str())]),
                10.0,
                MARGIN_X,
                PAGE_H - 28.0,
            );
            layer.set_fill_color(dark_gray());
            push_text(&layer, &fonts.bold, &t("report.ai_heading"), 14.0, MARGIN_X, PAGE_H - 55.0);
            (layer, PAGE_H - 65.0)
        } else {
            let (page, layer) = doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
            let layer = doc.get_page(page).get_layer(layer);
            layer.set_fill_color(dark_gray());
            (layer, CONTINUATION_TOP)
        };

        for line in &lines[range] {
            push_text(&layer, &fonts.regular, line, 11.0, MARGIN_X, y);
            y -= AI_LINE_H;
        }

        if idx + 1 == total_pages {
            h_line(&layer, 47.0);
            layer.set_fill_color(light_gray());
            push_text(&layer, &fonts.italic, &t("report.disclaimer_1"), 8.0, MARGIN_X, 39.0);
            push_text(&layer, &fonts.italic, &t("report.disclaimer_2"), 8.0, MARGIN_X, 34.0);
        }
    }

    debug!(pages = total_pages, "AI 分析 PDF 生成完成");
    Ok(ReportDocument {
        file_name: ai_report_file_name(&options.brand, options.millis()),
        bytes: save_to_bytes(doc)?,
    })
}

// ==========================================
// CSV 导出
// ==========================================

/// 导出 CSV（五列 + 状态）
///
/// # 返回
/// - Ok(usize): 写出的数据行数
pub fn export_csv<W: Write>(
    writer: W,
    medications: &[&Medication],
    classifier: &ExpiryClassifier,
) -> Result<usize, ReportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(COLUMN_HEADERS.iter().copied().chain(["ESTADO"]))?;

    for med in medications {
        let fecha = med.fecha_caducidad.format("%Y-%m-%d").to_string();
        let cantidad = med.cantidad.to_string();
        let status = t(classifier.classify(med.fecha_caducidad).label_key());
        csv_writer.write_record([
            med.clave.as_str(),
            med.nombre.as_str(),
            med.lote.as_str(),
            fecha.as_str(),
            cantidad.as_str(),
            status.as_str(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(medications.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn options() -> ReportOptions {
        ReportOptions {
            brand: "FarmaINPER".to_string(),
            generated_at: Local.with_ymd_and_hms(2025, 6, 10, 9, 30, 0).unwrap(),
            window_months: 3,
        }
    }

    fn med(i: usize) -> Medication {
        Medication {
            id: format!("med-{}", i),
            clave: format!("010.{}", i),
            nombre: format!("Medicamento con nombre largo número {}", i),
            lote: format!("L{}", i),
            fecha_caducidad: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            cantidad: i as i64,
        }
    }

    #[test]
    fn test_report_file_name() {
        assert_eq!(
            report_file_name("FarmaINPER", "Reporte Próximos Vencimientos", 1700000000000),
            "FarmaINPER_Reporte_Reporte_Próximos_Vencimientos_1700000000000.pdf"
        );
        assert_eq!(ai_report_file_name("FarmaINPER", 5), "FarmaINPER_IA_Analisis_5.pdf");
    }

    #[test]
    fn test_file_name_millis_are_utc_epoch() {
        let instant = Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap();
        let options = ReportOptions {
            generated_at: instant.with_timezone(&Local),
            ..options()
        };
        assert_eq!(options.millis(), instant.timestamp_millis());

        let doc = ai_insight_report("Sin hallazgos.", &options).unwrap();
        assert_eq!(
            doc.file_name,
            format!("FarmaINPER_IA_Analisis_{}.pdf", instant.timestamp_millis())
        );
    }

    #[test]
    fn test_paginate() {
        assert_eq!(paginate(0, 10, 20), vec![0..0]);
        assert_eq!(paginate(10, 10, 20), vec![0..10]);
        assert_eq!(paginate(35, 10, 20), vec![0..10, 10..30, 30..35]);
    }

    #[test]
    fn test_wrap_text() {
        let lines = wrap_text("uno dos tres cuatro\n\ncinco", 9);
        assert_eq!(lines, vec!["uno dos", "tres", "cuatro", "", "cinco"]);
    }

    #[test]
    fn test_fit() {
        assert_eq!(fit("corto", 10), "corto");
        assert_eq!(fit("Paracetamol 500mg", 10), "Paracet...");
    }

    #[test]
    fn test_medication_report_multi_page() {
        let meds: Vec<Medication> = (0..120).map(med).collect();
        let refs: Vec<&Medication> = meds.iter().collect();
        let stats = InventoryStats {
            total_medicamentos: 120,
            total_unidades: 7140,
            por_vencer: 120,
            vencidos: 0,
        };

        let doc = medication_report("Inventario General", &refs, Some(&stats), &options()).unwrap();

        assert!(doc.bytes.starts_with(b"%PDF"));
        assert!(doc.file_name.starts_with("FarmaINPER_Reporte_Inventario_General_"));
        assert!(paginate(120, rows_fit(PAGE_H - 85.0), rows_fit(CONTINUATION_TOP)).len() > 1);
    }

    #[test]
    fn test_ai_report() {
        let text = "Recomendación. ".repeat(400);
        let doc = ai_insight_report(&text, &options()).unwrap();
        assert!(doc.bytes.starts_with(b"%PDF"));
        assert!(doc.file_name.starts_with("FarmaINPER_IA_Analisis_"));
    }

    #[test]
    fn test_export_csv() {
        let _guard = crate::i18n::tests::LOCALE_TEST_LOCK.lock().unwrap();
        crate::i18n::set_locale("es");

        let meds = vec![med(1)];
        let refs: Vec<&Medication> = meds.iter().collect();
        let classifier = ExpiryClassifier::new(NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(), 3);

        let mut buffer = Vec::new();
        let rows = export_csv(&mut buffer, &refs, &classifier).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert_eq!(rows, 1);
        assert!(text.starts_with("CLAVE,MEDICAMENTO,LOTE,CADUCIDAD,CANTIDAD,ESTADO\n"));
        assert!(text.contains("010.1,Medicamento con nombre largo número 1,L1,2025-07-01,1,Próximo"));
    }
}
