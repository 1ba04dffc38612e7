//! Invoice settings and their default resolution.
//!
//! Settings for a new invoice are resolved field by field from three
//! layers, first match wins: the settings of the last invoice the user
//! created, the workspace defaults, and the hardcoded [`Default`].

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::money::Decimals;

/// Enable / disable switch as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Toggle {
    Enable,
    #[default]
    Disable,
}

impl Toggle {
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enable)
    }
}

impl From<bool> for Toggle {
    fn from(enabled: bool) -> Self {
        if enabled { Self::Enable } else { Self::Disable }
    }
}

/// A percentage applied to the subtotal (sales tax or VAT).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RateSetting {
    pub status: Toggle,
    /// Percentage in `0..=100`.
    pub rate: Decimal,
}

impl RateSetting {
    pub fn enabled(rate: Decimal) -> Self {
        Self {
            status: Toggle::Enable,
            rate,
        }
    }

    /// `base × rate / 100` when enabled, otherwise zero.
    pub fn apply(&self, base: Decimal) -> Decimal {
        if !self.status.is_enabled() {
            return Decimal::ZERO;
        }
        base.checked_mul(self.rate)
            .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
            .unwrap_or(Decimal::ZERO)
    }
}

/// A fixed discount in invoice currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiscountSetting {
    pub status: Toggle,
    pub amount: Decimal,
}

impl DiscountSetting {
    pub fn enabled(amount: Decimal) -> Self {
        Self {
            status: Toggle::Enable,
            amount,
        }
    }

    /// The discount to subtract, or zero when disabled.
    pub fn effective_amount(&self) -> Decimal {
        if self.status.is_enabled() {
            self.amount
        } else {
            Decimal::ZERO
        }
    }
}

/// Per-invoice presentation and pricing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSettings {
    /// ISO 4217 code or a symbol.
    pub currency: String,
    /// Date pattern using `YYYY`, `MM` and `DD` tokens.
    pub date_format: String,
    pub decimals: Decimals,
    pub sales_tax: RateSetting,
    pub vat: RateSetting,
    pub discount: DiscountSetting,
    /// Notes shown to the customer.
    pub notes: Option<String>,
    /// Internal notes. Never part of the customer view.
    pub team_notes: Option<String>,
    /// Logo URL or asset reference.
    pub logo: Option<String>,
}

impl Default for InvoiceSettings {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            date_format: "MM/DD/YYYY".to_string(),
            decimals: Decimals::Yes,
            sales_tax: RateSetting::default(),
            vat: RateSetting::default(),
            discount: DiscountSetting::default(),
            notes: None,
            team_notes: None,
            logo: None,
        }
    }
}

impl InvoiceSettings {
    /// Render `date` with this invoice's date format.
    pub fn format_date(&self, date: NaiveDate) -> String {
        format_date(date, &self.date_format)
    }
}

/// Render a date with a `YYYY` / `MM` / `DD` pattern, e.g. "DD.MM.YYYY".
pub fn format_date(date: NaiveDate, pattern: &str) -> String {
    let chrono_pattern = pattern
        .replace('%', "%%")
        .replace("YYYY", "%Y")
        .replace("MM", "%m")
        .replace("DD", "%d");
    date.format(&chrono_pattern).to_string()
}

/// A partial settings layer. Unset fields fall through to the next layer.
///
/// Keys are snake_case so the same struct reads from configuration files
/// and environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsOverlay {
    pub currency: Option<String>,
    pub date_format: Option<String>,
    pub decimals: Option<Decimals>,
    pub sales_tax: Option<RateSetting>,
    pub vat: Option<RateSetting>,
    pub discount: Option<DiscountSetting>,
    pub notes: Option<String>,
    pub team_notes: Option<String>,
    pub logo: Option<String>,
}

impl From<&InvoiceSettings> for SettingsOverlay {
    fn from(settings: &InvoiceSettings) -> Self {
        Self {
            currency: Some(settings.currency.clone()),
            date_format: Some(settings.date_format.clone()),
            decimals: Some(settings.decimals),
            sales_tax: Some(settings.sales_tax),
            vat: Some(settings.vat),
            discount: Some(settings.discount),
            notes: settings.notes.clone(),
            team_notes: settings.team_notes.clone(),
            logo: settings.logo.clone(),
        }
    }
}

impl SettingsOverlay {
    /// Fill unset fields of `self` from `fallback`.
    pub fn or(self, fallback: &SettingsOverlay) -> SettingsOverlay {
        SettingsOverlay {
            currency: self.currency.or_else(|| fallback.currency.clone()),
            date_format: self.date_format.or_else(|| fallback.date_format.clone()),
            decimals: self.decimals.or(fallback.decimals),
            sales_tax: self.sales_tax.or(fallback.sales_tax),
            vat: self.vat.or(fallback.vat),
            discount: self.discount.or(fallback.discount),
            notes: self.notes.or_else(|| fallback.notes.clone()),
            team_notes: self.team_notes.or_else(|| fallback.team_notes.clone()),
            logo: self.logo.or_else(|| fallback.logo.clone()),
        }
    }

    /// Resolve against the hardcoded defaults.
    pub fn resolve(self) -> InvoiceSettings {
        let defaults = InvoiceSettings::default();
        InvoiceSettings {
            currency: self.currency.unwrap_or(defaults.currency),
            date_format: self.date_format.unwrap_or(defaults.date_format),
            decimals: self.decimals.unwrap_or(defaults.decimals),
            sales_tax: self.sales_tax.unwrap_or(defaults.sales_tax),
            vat: self.vat.unwrap_or(defaults.vat),
            discount: self.discount.unwrap_or(defaults.discount),
            notes: self.notes.or(defaults.notes),
            team_notes: self.team_notes.or(defaults.team_notes),
            logo: self.logo.or(defaults.logo),
        }
    }

    /// Load workspace defaults from an optional file plus `BILLFOLD__*`
    /// environment variables (e.g. `BILLFOLD__SALES_TAX__RATE=13`).
    ///
    /// Nested settings may be given in part; a missing `status`, `rate` or
    /// `amount` takes its default.
    #[cfg(feature = "config")]
    pub fn load(path: &str) -> Result<Self, super::error::InvoiceError> {
        Self::load_with_env(path, config::Environment::with_prefix("BILLFOLD").separator("__"))
    }

    /// [`SettingsOverlay::load`] with an explicit environment source.
    #[cfg(feature = "config")]
    pub fn load_with_env(
        path: &str,
        env: config::Environment,
    ) -> Result<Self, super::error::InvoiceError> {
        use super::error::InvoiceError;

        let cfg = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(env)
            .build()
            .map_err(|e| InvoiceError::Config(e.to_string()))?;

        cfg.try_deserialize()
            .map_err(|e| InvoiceError::Config(e.to_string()))
    }
}

/// Resolve settings for a new invoice: last-used → workspace default →
/// hardcoded default, field by field.
pub fn resolve_settings(
    last_used: Option<&InvoiceSettings>,
    workspace_default: Option<&SettingsOverlay>,
) -> InvoiceSettings {
    let last = last_used.map(SettingsOverlay::from).unwrap_or_default();
    match workspace_default {
        Some(workspace) => last.or(workspace).resolve(),
        None => last.resolve(),
    }
}
