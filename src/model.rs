//! Invoice data model – the state aggregate, line items, field toggles, and
//! the canned sample document.
//!
//! The serde shape of [`InvoiceState`] is the persisted snapshot document:
//! camelCase keys, dates as ISO strings, every key optional with the same
//! fallback the loader has always applied. Numeric slots deserialize
//! leniently (absent or non-numeric coerces to 0) so a damaged document
//! degrades instead of failing.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

use crate::theme::ThemeSelector;

/// Currency codes the picker offers with their display symbols, in display
/// order.
pub const CURRENCIES: [(&str, &str); 7] = [
    ("USD", "$"),
    ("EUR", "€"),
    ("GBP", "£"),
    ("INR", "₹"),
    ("JPY", "¥"),
    ("AUD", "A$"),
    ("CAD", "C$"),
];

/// Display symbol for a currency code. Codes outside the table fall back to
/// the code itself.
pub fn currency_symbol(code: &str) -> &str {
    CURRENCIES
        .iter()
        .find(|(c, _)| *c == code)
        .map_or(code, |(_, symbol)| *symbol)
}

/// `<symbol><amount>` with two decimals and no digit grouping, e.g. `$1234.50`.
pub fn format_money(code: &str, amount: f64) -> String {
    format!("{}{:.2}", currency_symbol(code), amount)
}

/// Boilerplate terms the "use standard terms" action fills in.
pub const STANDARD_TERMS: &str = "Payment is due within 30 days of invoice date. \
Late payments may incur interest charges at 1.5% per month. \
All prices are in the specified currency and are non-refundable. \
Please include the invoice number with your payment. \
Thank you for your business.";

/// One billable row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub quantity: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub discount: f64,
}

impl Default for LineItem {
    /// The row the "add item" action inserts.
    fn default() -> Self {
        Self {
            description: String::new(),
            quantity: 1.0,
            price: 0.0,
            discount: 0.0,
        }
    }
}

impl LineItem {
    /// quantity × price × (1 − discount/100).
    pub fn line_total(&self) -> f64 {
        self.quantity * self.price * (1.0 - self.discount / 100.0)
    }

    /// quantity × price, before any discount.
    pub fn gross(&self) -> f64 {
        self.quantity * self.price
    }
}

/// Identifies one toggleable field group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    CompanyName,
    CompanyAddress,
    CompanyContact,
    ClientName,
    ClientAddress,
    InvoiceNumber,
    InvoiceTitle,
    Currency,
    Date,
    DueDate,
    Notes,
    Logo,
    Tax,
    Discount,
    Payment,
    Terms,
}

impl FieldKey {
    pub const ALL: [FieldKey; 16] = [
        FieldKey::CompanyName,
        FieldKey::CompanyAddress,
        FieldKey::CompanyContact,
        FieldKey::ClientName,
        FieldKey::ClientAddress,
        FieldKey::InvoiceNumber,
        FieldKey::InvoiceTitle,
        FieldKey::Currency,
        FieldKey::Date,
        FieldKey::DueDate,
        FieldKey::Notes,
        FieldKey::Logo,
        FieldKey::Tax,
        FieldKey::Discount,
        FieldKey::Payment,
        FieldKey::Terms,
    ];
}

/// Which optional field groups are rendered and included in exports.
///
/// A key missing from a persisted document deserializes to `false` (the
/// document replaces the set wholesale), while a document with no
/// `activeFields` at all keeps the all-true default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveFields {
    #[serde(default)]
    pub company_name: bool,
    #[serde(default)]
    pub company_address: bool,
    #[serde(default)]
    pub company_contact: bool,
    #[serde(default)]
    pub client_name: bool,
    #[serde(default)]
    pub client_address: bool,
    #[serde(default)]
    pub invoice_number: bool,
    #[serde(default)]
    pub invoice_title: bool,
    #[serde(default)]
    pub currency: bool,
    #[serde(default)]
    pub date: bool,
    #[serde(default)]
    pub due_date: bool,
    #[serde(default)]
    pub notes: bool,
    #[serde(default)]
    pub logo: bool,
    #[serde(default)]
    pub tax: bool,
    #[serde(default)]
    pub discount: bool,
    #[serde(default)]
    pub payment: bool,
    #[serde(default)]
    pub terms: bool,
}

impl Default for ActiveFields {
    fn default() -> Self {
        Self {
            company_name: true,
            company_address: true,
            company_contact: true,
            client_name: true,
            client_address: true,
            invoice_number: true,
            invoice_title: true,
            currency: true,
            date: true,
            due_date: true,
            notes: true,
            logo: true,
            tax: true,
            discount: true,
            payment: true,
            terms: true,
        }
    }
}

impl ActiveFields {
    pub fn get(&self, key: FieldKey) -> bool {
        match key {
            FieldKey::CompanyName => self.company_name,
            FieldKey::CompanyAddress => self.company_address,
            FieldKey::CompanyContact => self.company_contact,
            FieldKey::ClientName => self.client_name,
            FieldKey::ClientAddress => self.client_address,
            FieldKey::InvoiceNumber => self.invoice_number,
            FieldKey::InvoiceTitle => self.invoice_title,
            FieldKey::Currency => self.currency,
            FieldKey::Date => self.date,
            FieldKey::DueDate => self.due_date,
            FieldKey::Notes => self.notes,
            FieldKey::Logo => self.logo,
            FieldKey::Tax => self.tax,
            FieldKey::Discount => self.discount,
            FieldKey::Payment => self.payment,
            FieldKey::Terms => self.terms,
        }
    }

    pub fn set(&mut self, key: FieldKey, enabled: bool) {
        match key {
            FieldKey::CompanyName => self.company_name = enabled,
            FieldKey::CompanyAddress => self.company_address = enabled,
            FieldKey::CompanyContact => self.company_contact = enabled,
            FieldKey::ClientName => self.client_name = enabled,
            FieldKey::ClientAddress => self.client_address = enabled,
            FieldKey::InvoiceNumber => self.invoice_number = enabled,
            FieldKey::InvoiceTitle => self.invoice_title = enabled,
            FieldKey::Currency => self.currency = enabled,
            FieldKey::Date => self.date = enabled,
            FieldKey::DueDate => self.due_date = enabled,
            FieldKey::Notes => self.notes = enabled,
            FieldKey::Logo => self.logo = enabled,
            FieldKey::Tax => self.tax = enabled,
            FieldKey::Discount => self.discount = enabled,
            FieldKey::Payment => self.payment = enabled,
            FieldKey::Terms => self.terms = enabled,
        }
    }
}

/// The whole invoice document. This is exactly the persisted snapshot shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceState {
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub company_address: String,
    #[serde(default)]
    pub company_website: String,
    #[serde(default)]
    pub company_email: String,
    #[serde(default)]
    pub company_phone: String,

    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub client_address: String,

    #[serde(default)]
    pub invoice_number: String,
    #[serde(default)]
    pub invoice_title: String,
    #[serde(default, with = "iso_date")]
    pub date: Option<NaiveDate>,
    #[serde(default, with = "iso_date")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: String,
    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(default = "default_items")]
    pub items: Vec<LineItem>,

    /// Base64 data URI, or empty when no logo is set.
    #[serde(default)]
    pub logo: String,

    /// Percent, e.g. 10 for 10% GST.
    #[serde(default = "default_tax_rate", deserialize_with = "lenient_f64")]
    pub tax_rate: f64,
    /// Overall discount percent applied to the subtotal.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub discount: f64,

    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub bank_name: String,
    #[serde(default)]
    pub account_number: String,
    #[serde(default)]
    pub account_name: String,
    /// BSB / IFSC / routing number.
    #[serde(default)]
    pub routing_number: String,
    #[serde(default)]
    pub terms: String,

    #[serde(default)]
    pub active_fields: ActiveFields,
    #[serde(default)]
    pub pdf_theme: ThemeSelector,
}

impl Default for InvoiceState {
    fn default() -> Self {
        Self {
            company_name: String::new(),
            company_address: String::new(),
            company_website: String::new(),
            company_email: String::new(),
            company_phone: String::new(),
            client_name: String::new(),
            client_address: String::new(),
            invoice_number: String::new(),
            invoice_title: String::new(),
            date: None,
            due_date: None,
            notes: String::new(),
            currency: default_currency(),
            items: default_items(),
            logo: String::new(),
            tax_rate: default_tax_rate(),
            discount: 0.0,
            payment_method: String::new(),
            bank_name: String::new(),
            account_number: String::new(),
            account_name: String::new(),
            routing_number: String::new(),
            terms: String::new(),
            active_fields: ActiveFields::default(),
            pdf_theme: ThemeSelector::default(),
        }
    }
}

impl InvoiceState {
    /// Restore the at-least-one-row invariant after deserializing a document
    /// whose items array was emptied out of band.
    pub fn ensure_items(&mut self) {
        if self.items.is_empty() {
            self.items.push(LineItem::default());
        }
    }
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_tax_rate() -> f64 {
    10.0
}

fn default_items() -> Vec<LineItem> {
    vec![LineItem::default()]
}

/// Accepts a JSON number, a numeric string, or anything else (coerced to 0).
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient {
        Num(f64),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Option::<Lenient>::deserialize(deserializer)? {
        Some(Lenient::Num(n)) if n.is_finite() => n,
        Some(Lenient::Text(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

/// Dates persist as ISO strings. Serialization writes plain `YYYY-MM-DD`;
/// deserialization also accepts the full RFC 3339 timestamps older documents
/// carry, comparing by calendar value.
mod iso_date {
    use super::*;
    use serde::Serializer;

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => serializer.serialize_some(&d.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(parse_calendar_date))
    }
}

/// `YYYY-MM-DD` or a full RFC 3339 timestamp, reduced to the calendar date.
pub fn parse_calendar_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

/// A fully populated invoice used by the CLI `--sample` flag and the tests.
pub fn sample_invoice() -> InvoiceState {
    InvoiceState {
        company_name: "Northwind Design Co".to_string(),
        company_address: "12 Harbour Lane\nSuite 4\nPortsmouth PO1 2AB".to_string(),
        company_website: "northwind.design".to_string(),
        company_email: "billing@northwind.design".to_string(),
        company_phone: "+44 20 7946 0812".to_string(),
        client_name: "Meridian Outfitters".to_string(),
        client_address: "88 Collins Street\nMelbourne VIC 3000".to_string(),
        invoice_number: "INV-2024-018".to_string(),
        invoice_title: "Website redesign, phase two".to_string(),
        date: NaiveDate::from_ymd_opt(2024, 6, 3),
        due_date: NaiveDate::from_ymd_opt(2024, 7, 3),
        notes: "50% deposit received, balance due on completion.".to_string(),
        currency: "AUD".to_string(),
        items: vec![
            LineItem {
                description: "UI design".to_string(),
                quantity: 24.0,
                price: 95.0,
                discount: 0.0,
            },
            LineItem {
                description: "Front-end development".to_string(),
                quantity: 36.0,
                price: 110.0,
                discount: 5.0,
            },
            LineItem {
                description: "Hosting setup".to_string(),
                quantity: 1.0,
                price: 240.0,
                discount: 0.0,
            },
        ],
        tax_rate: 10.0,
        discount: 2.5,
        payment_method: "Direct bank transfer".to_string(),
        bank_name: "Commonwealth Bank".to_string(),
        account_number: "0634 1099 2281".to_string(),
        account_name: "Northwind Design Pty Ltd".to_string(),
        routing_number: "063-014".to_string(),
        terms: STANDARD_TERMS.to_string(),
        ..InvoiceState::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn snapshot_document_uses_camel_case_keys() {
        let json = serde_json::to_string(&InvoiceState::default()).unwrap();
        assert!(json.contains("\"companyName\""));
        assert!(json.contains("\"taxRate\""));
        assert!(json.contains("\"activeFields\""));
        assert!(json.contains("\"pdfTheme\":\"dark\""));
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let state: InvoiceState = serde_json::from_str("{}").unwrap();
        assert_eq!(state, InvoiceState::default());
        assert_eq!(state.tax_rate, 10.0);
        assert_eq!(state.currency, "USD");
        assert_eq!(state.items.len(), 1);
        assert!(state.active_fields.tax);
    }

    #[test]
    fn non_numeric_values_coerce_to_zero() {
        let state: InvoiceState =
            serde_json::from_str(r#"{"taxRate":"abc","discount":"7.5","items":[{"quantity":"x","price":true}]}"#)
                .unwrap();
        assert_eq!(state.tax_rate, 0.0);
        assert_eq!(state.discount, 7.5);
        assert_eq!(state.items[0].quantity, 0.0);
        assert_eq!(state.items[0].price, 0.0);
    }

    #[test]
    fn dates_accept_legacy_timestamps() {
        let state: InvoiceState =
            serde_json::from_str(r#"{"date":"2024-06-03T00:00:00.000Z","dueDate":"2024-07-03"}"#)
                .unwrap();
        assert_eq!(state.date, NaiveDate::from_ymd_opt(2024, 6, 3));
        assert_eq!(state.due_date, NaiveDate::from_ymd_opt(2024, 7, 3));
    }

    #[test]
    fn partial_active_fields_hide_missing_keys() {
        let state: InvoiceState =
            serde_json::from_str(r#"{"activeFields":{"companyName":true}}"#).unwrap();
        assert!(state.active_fields.company_name);
        assert!(!state.active_fields.tax);
        assert!(!state.active_fields.terms);
    }

    #[test]
    fn line_total_applies_row_discount() {
        let item = LineItem {
            description: String::new(),
            quantity: 2.0,
            price: 50.0,
            discount: 10.0,
        };
        assert_eq!(item.gross(), 100.0);
        assert_eq!(item.line_total(), 90.0);
    }

    #[test]
    fn currency_symbols_cover_the_table() {
        for (code, symbol) in CURRENCIES {
            assert_eq!(currency_symbol(code), symbol);
            assert_ne!(symbol, code);
        }
        assert_eq!(currency_symbol("XYZ"), "XYZ");
        assert_eq!(format_money("EUR", 12.5), "€12.50");
    }

    #[test]
    fn empty_items_restore_one_row() {
        let mut state: InvoiceState = serde_json::from_str(r#"{"items":[]}"#).unwrap();
        state.ensure_items();
        assert_eq!(state.items, vec![LineItem::default()]);
    }
}
