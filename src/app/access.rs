use crate::domain::model::AccessEntry;
use crate::domain::ports::AccessStore;
use crate::utils::error::Result;
use chrono::{Days, Months, NaiveDate};
use std::sync::Arc;

/// 永久授權使用的到期日 (2999-12-31)
pub fn lifetime_expiry() -> NaiveDate {
    NaiveDate::from_ymd_opt(2999, 12, 31).unwrap_or(NaiveDate::MAX)
}

pub const EXPIRY_HELP: &str =
    "1hari, 7hari, 1bulan, 3bulan, 6bulan, 1tahun, lifetime atau format tanggal YYYY-MM-DD";

/// Keeps digits only, e.g. `+62 812-34` becomes `6281234`.
pub fn normalize_number(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Parses an expiry keyword or a strict `YYYY-MM-DD` date relative to `today`.
pub fn parse_expiry(input: &str, today: NaiveDate) -> Option<NaiveDate> {
    match input.to_lowercase().as_str() {
        "1hari" => today.checked_add_days(Days::new(1)),
        "7hari" => today.checked_add_days(Days::new(7)),
        "1bulan" => today.checked_add_months(Months::new(1)),
        "3bulan" => today.checked_add_months(Months::new(3)),
        "6bulan" => today.checked_add_months(Months::new(6)),
        "1tahun" => today.checked_add_months(Months::new(12)),
        "lifetime" => Some(lifetime_expiry()),
        other => parse_strict_date(other),
    }
}

fn parse_strict_date(input: &str) -> Option<NaiveDate> {
    // chrono 接受不補零的月日，這裡要求完整的 YYYY-MM-DD
    let bytes = input.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !shape_ok {
        return None;
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d").ok()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed { admin: bool },
    Unknown,
    Expired(AccessEntry),
}

/// Allow-list lookups for incoming commands.
#[derive(Clone)]
pub struct AccessControl {
    store: Arc<dyn AccessStore>,
    admins: Vec<String>,
}

impl AccessControl {
    pub fn new(store: Arc<dyn AccessStore>, admins: Vec<String>) -> Self {
        Self { store, admins }
    }

    pub fn store(&self) -> &Arc<dyn AccessStore> {
        &self.store
    }

    pub async fn is_admin(&self, number: &str) -> Result<bool> {
        if self.admins.iter().any(|a| a == number) {
            return Ok(true);
        }
        self.store.is_admin(number).await
    }

    /// Admins are never subject to expiry.
    pub async fn check(&self, number: &str, today: NaiveDate) -> Result<AccessDecision> {
        if self.is_admin(number).await? {
            return Ok(AccessDecision::Allowed { admin: true });
        }

        Ok(match self.store.get(number).await? {
            None => AccessDecision::Unknown,
            Some(entry) if entry.is_expired(today) => AccessDecision::Expired(entry),
            Some(_) => AccessDecision::Allowed { admin: false },
        })
    }
}
