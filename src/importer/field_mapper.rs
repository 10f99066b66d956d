// ==========================================
// FarmaINPER 医药库存系统 - 字段映射器实现
// ==========================================
// 阶段 3: 数据行 → Medication
// 职责: 按列映射取值 + 缺失字段占位 + 丢弃无标识行
// ==========================================

use crate::domain::import::{CellValue, ColumnMap};
use crate::domain::medication::{Medication, MISSING_NAME, MISSING_TEXT};
use crate::domain::types::ColumnRole;
use crate::importer::medication_importer_trait::{
    DataCleaner, FieldMapper as FieldMapperTrait,
};

pub struct FieldMapper;

impl FieldMapperTrait for FieldMapper {
    fn map_row(
        &self,
        row: &[CellValue],
        row_index: usize,
        columns: &ColumnMap,
        cleaner: &dyn DataCleaner,
        millis: i64,
    ) -> Option<Medication> {
        if row.iter().all(CellValue::is_empty) {
            return None;
        }

        let clave = self.text(row, columns, ColumnRole::Clave, cleaner);
        let nombre = self.text(row, columns, ColumnRole::Nombre, cleaner);

        // 编码与品名同时缺失 → 丢弃
        if clave.is_none() && nombre.is_none() {
            return None;
        }

        let lote = self.text(row, columns, ColumnRole::Lote, cleaner);
        let fecha_caducidad = cleaner.parse_expiry(self.cell(row, columns, ColumnRole::Fecha));
        let cantidad = cleaner.parse_quantity(self.cell(row, columns, ColumnRole::Cantidad));

        Some(Medication {
            id: Medication::import_id(row_index, millis),
            clave: clave.unwrap_or_else(|| MISSING_TEXT.to_string()),
            nombre: nombre.unwrap_or_else(|| MISSING_NAME.to_string()),
            lote: lote.unwrap_or_else(|| MISSING_TEXT.to_string()),
            fecha_caducidad,
            cantidad,
        })
    }
}

impl FieldMapper {
    /// 取角色对应的单元格（列缺失或行过短 → Empty）
    fn cell<'a>(&self, row: &'a [CellValue], columns: &ColumnMap, role: ColumnRole) -> &'a CellValue {
        const EMPTY: &CellValue = &CellValue::Empty;
        columns
            .get(role)
            .and_then(|col| row.get(col))
            .unwrap_or(EMPTY)
    }

    fn text(
        &self,
        row: &[CellValue],
        columns: &ColumnMap,
        role: ColumnRole,
        cleaner: &dyn DataCleaner,
    ) -> Option<String> {
        cleaner.clean_text(self.cell(row, columns, role))
    }
}
