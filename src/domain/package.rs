use rust_decimal::Decimal;
use serde::Deserialize;
use std::fmt;

/// How long a package grants access for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDuration {
    Minutes(u32),
    Hours(u32),
    Days(u32),
}

impl fmt::Display for AccessDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessDuration::Minutes(n) => write!(f, "{n} minutes"),
            AccessDuration::Hours(n) => write!(f, "{n} hours"),
            AccessDuration::Days(n) => write!(f, "{n} days"),
        }
    }
}

/// A purchasable internet-access package as published by the plan catalog.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Package {
    pub id: u64,
    pub name: String,
    pub price: Decimal,
    /// Download speed in Mbps.
    pub download_bandwidth: Decimal,
    /// Upload speed in Mbps.
    pub upload_bandwidth: Decimal,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub duration_hours: Option<u32>,
    #[serde(default)]
    pub duration_days: Option<u32>,
}

impl Package {
    /// Resolves the access duration, preferring minutes, then hours, then days.
    ///
    /// A zero value is treated the same as a missing one, so a package carrying
    /// `duration_minutes: 0, duration_hours: 3` resolves to three hours.
    pub fn duration(&self) -> Option<AccessDuration> {
        let present = |value: Option<u32>| value.filter(|n| *n > 0);

        present(self.duration_minutes)
            .map(AccessDuration::Minutes)
            .or_else(|| present(self.duration_hours).map(AccessDuration::Hours))
            .or_else(|| present(self.duration_days).map(AccessDuration::Days))
    }

    pub fn duration_label(&self) -> String {
        self.duration()
            .map(|d| d.to_string())
            .unwrap_or_else(|| "n/a".to_string())
    }

    pub fn price_label(&self) -> String {
        format!("KSH {}", self.price)
    }

    pub fn speed_label(&self) -> String {
        format!(
            "{}Mbps down/{}Mbps up",
            self.download_bandwidth, self.upload_bandwidth
        )
    }
}
