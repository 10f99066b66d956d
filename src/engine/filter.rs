// ==========================================
// FarmaINPER 医药库存系统 - 库存列表筛选
// ==========================================
// 规则: 关键词（品名/编码/批号，不区分大小写）AND 有效期状态
// ==========================================

use crate::domain::medication::Medication;
use crate::domain::types::{ExpiryStatus, StatusFilter};
use crate::engine::expiry::ExpiryClassifier;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryFilter {
    pub status: StatusFilter,
    pub search: String,
}

impl InventoryFilter {
    pub fn new(status: StatusFilter, search: impl Into<String>) -> Self {
        Self {
            status,
            search: search.into(),
        }
    }

    pub fn status_only(status: StatusFilter) -> Self {
        Self::new(status, String::new())
    }

    fn matches_search(&self, med: &Medication, needle: &str) -> bool {
        needle.is_empty()
            || med.nombre.to_lowercase().contains(needle)
            || med.clave.to_lowercase().contains(needle)
            || med.lote.to_lowercase().contains(needle)
    }

    fn matches_status(&self, med: &Medication, classifier: &ExpiryClassifier) -> bool {
        match self.status {
            StatusFilter::All => true,
            StatusFilter::Upcoming => classifier.classify(med.fecha_caducidad) == ExpiryStatus::Warning,
            StatusFilter::Expired => classifier.classify(med.fecha_caducidad) == ExpiryStatus::Expired,
        }
    }

    pub fn matches(&self, med: &Medication, classifier: &ExpiryClassifier) -> bool {
        let needle = self.search.trim().to_lowercase();
        self.matches_search(med, &needle) && self.matches_status(med, classifier)
    }

    /// 筛选（保持原顺序）
    pub fn apply<'a>(
        &self,
        medications: &'a [Medication],
        classifier: &ExpiryClassifier,
    ) -> Vec<&'a Medication> {
        let needle = self.search.trim().to_lowercase();
        medications
            .iter()
            .filter(|m| self.matches_search(m, &needle) && self.matches_status(m, classifier))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn med(id: &str, nombre: &str, lote: &str, expiry: NaiveDate) -> Medication {
        Medication {
            id: id.to_string(),
            clave: format!("CL-{}", id),
            nombre: nombre.to_string(),
            lote: lote.to_string(),
            fecha_caducidad: expiry,
            cantidad: 1,
        }
    }

    fn sample() -> Vec<Medication> {
        vec![
            med("1", "Paracetamol", "AB12", ymd(2025, 1, 1)),
            med("2", "Amoxicilina", "ZX90", ymd(2025, 7, 1)),
            med("3", "Paracetamol Infantil", "QQ01", ymd(2030, 1, 1)),
        ]
    }

    #[test]
    fn test_search_is_case_insensitive_over_three_fields() {
        let classifier = ExpiryClassifier::new(ymd(2025, 6, 10), 3);
        let meds = sample();

        let by_name = InventoryFilter::new(StatusFilter::All, "PARACET").apply(&meds, &classifier);
        assert_eq!(by_name.len(), 2);

        let by_lot = InventoryFilter::new(StatusFilter::All, "zx9").apply(&meds, &classifier);
        assert_eq!(by_lot[0].id, "2");

        let by_code = InventoryFilter::new(StatusFilter::All, "cl-3").apply(&meds, &classifier);
        assert_eq!(by_code[0].id, "3");
    }

    #[test]
    fn test_status_and_search_combine() {
        let classifier = ExpiryClassifier::new(ymd(2025, 6, 10), 3);
        let meds = sample();

        let expired = InventoryFilter::status_only(StatusFilter::Expired).apply(&meds, &classifier);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, "1");

        let upcoming = InventoryFilter::status_only(StatusFilter::Upcoming).apply(&meds, &classifier);
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].id, "2");

        let none = InventoryFilter::new(StatusFilter::Expired, "amoxi").apply(&meds, &classifier);
        assert!(none.is_empty());
    }
}
