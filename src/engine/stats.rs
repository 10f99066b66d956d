// ==========================================
// FarmaINPER 医药库存系统 - 库存统计引擎
// ==========================================
// 职责: 一次遍历汇总品规数 / 总数量 / 临期数 / 过期数
// ==========================================

use crate::domain::medication::{InventoryStats, Medication};
use crate::domain::types::ExpiryStatus;
use crate::engine::expiry::ExpiryClassifier;
use tracing::instrument;

pub struct StatsEngine;

impl StatsEngine {
    #[instrument(skip_all, fields(count = medications.len()))]
    pub fn compute(medications: &[Medication], classifier: &ExpiryClassifier) -> InventoryStats {
        medications
            .iter()
            .fold(InventoryStats::default(), |mut acc, med| {
                acc.total_medicamentos += 1;
                acc.total_unidades += med.cantidad;
                match classifier.classify(med.fecha_caducidad) {
                    ExpiryStatus::Expired => acc.vencidos += 1,
                    ExpiryStatus::Warning => acc.por_vencer += 1,
                    ExpiryStatus::Safe => {}
                }
                acc
            })
    }
}
