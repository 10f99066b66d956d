// ==========================================
// FarmaINPER 医药库存系统 - 有效期判定引擎
// ==========================================
// 职责: 按有效期将批次分为 已过期 / 临期 / 安全
// 口径: expiry < today → 过期; today <= expiry <= today + N 个自然月 → 临期
// ==========================================

use crate::domain::types::ExpiryStatus;
use chrono::{Months, NaiveDate};

/// 临期截止日：today 加 months 个自然月（日期超出月末时取月末）
pub fn upcoming_limit(today: NaiveDate, months: u32) -> NaiveDate {
    today
        .checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}

// ==========================================
// ExpiryClassifier - 有效期判定器
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryClassifier {
    today: NaiveDate,
    limit: NaiveDate,
}

impl ExpiryClassifier {
    pub fn new(today: NaiveDate, window_months: u32) -> Self {
        Self {
            today,
            limit: upcoming_limit(today, window_months),
        }
    }

    /// 以本地当天为基准
    pub fn for_today(window_months: u32) -> Self {
        Self::new(chrono::Local::now().date_naive(), window_months)
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn limit(&self) -> NaiveDate {
        self.limit
    }

    pub fn classify(&self, expiry: NaiveDate) -> ExpiryStatus {
        if expiry < self.today {
            ExpiryStatus::Expired
        } else if expiry <= self.limit {
            ExpiryStatus::Warning
        } else {
            ExpiryStatus::Safe
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::medication::missing_expiry;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_upcoming_limit_clamps_month_end() {
        assert_eq!(upcoming_limit(ymd(2025, 11, 30), 3), ymd(2026, 2, 28));
        assert_eq!(upcoming_limit(ymd(2025, 1, 15), 3), ymd(2025, 4, 15));
        assert_eq!(upcoming_limit(ymd(2025, 1, 15), 0), ymd(2025, 1, 15));
    }

    #[test]
    fn test_classify_boundaries() {
        let classifier = ExpiryClassifier::new(ymd(2025, 6, 10), 3);

        assert_eq!(classifier.classify(ymd(2025, 6, 9)), ExpiryStatus::Expired);
        assert_eq!(classifier.classify(ymd(2025, 6, 10)), ExpiryStatus::Warning);
        assert_eq!(classifier.classify(ymd(2025, 9, 10)), ExpiryStatus::Warning);
        assert_eq!(classifier.classify(ymd(2025, 9, 11)), ExpiryStatus::Safe);
        assert_eq!(classifier.classify(missing_expiry()), ExpiryStatus::Safe);
    }
}
