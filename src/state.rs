//! Pure document reducer.
//!
//! Every mutation of an [`InvoiceState`] goes through [`reduce`], which maps
//! an old state plus one [`Action`] to a new state and touches nothing else.
//! Persistence and export are the caller's business; the reducer stays
//! deterministic and side-effect free so any transition can be tested by
//! value.

use chrono::NaiveDate;

use crate::model::{FieldKey, InvoiceState, LineItem, STANDARD_TERMS};
use crate::theme::ThemeSelector;

/// Which column of a line item an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemField {
    Description,
    Quantity,
    Price,
    Discount,
}

/// Every state transition the document supports.
///
/// Numeric edits carry the raw input text; [`reduce`] applies the
/// parse-or-zero policy so a garbled value degrades to 0 instead of
/// poisoning the totals.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetCompanyName(String),
    SetCompanyAddress(String),
    SetCompanyWebsite(String),
    SetCompanyEmail(String),
    SetCompanyPhone(String),
    SetClientName(String),
    SetClientAddress(String),
    SetInvoiceNumber(String),
    SetInvoiceTitle(String),
    SetDate(Option<NaiveDate>),
    SetDueDate(Option<NaiveDate>),
    SetNotes(String),
    SetCurrency(String),
    SetLogo(String),
    SetTaxRate(String),
    SetOverallDiscount(String),
    SetPaymentMethod(String),
    SetBankName(String),
    SetAccountNumber(String),
    SetAccountName(String),
    SetRoutingNumber(String),
    SetTerms(String),
    /// Fill the terms field with the boilerplate template.
    UseStandardTerms,
    /// Append a fresh default row.
    AddItem,
    /// Remove the row at the index; no-op when it is the last row or the
    /// index is out of range.
    RemoveItem(usize),
    /// Edit one cell of the row at the index; no-op when out of range.
    EditItem {
        index: usize,
        field: ItemField,
        value: String,
    },
    /// Flip a field group's visibility, clearing its values on hide.
    ToggleField(FieldKey),
    /// Reset every value field, keeping visibility toggles and the theme.
    ClearInvoice,
    SetPdfTheme(ThemeSelector),
}

/// Parse-or-zero policy for numeric text inputs.
pub fn coerce_number(input: &str) -> f64 {
    input.trim().parse().unwrap_or(0.0)
}

/// One resettable value slot in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    CompanyName,
    CompanyAddress,
    CompanyWebsite,
    CompanyEmail,
    CompanyPhone,
    ClientName,
    ClientAddress,
    InvoiceNumber,
    InvoiceTitle,
    Date,
    DueDate,
    Notes,
    Currency,
    Logo,
    TaxRate,
    OverallDiscount,
    PaymentMethod,
    BankName,
    AccountNumber,
    AccountName,
    RoutingNumber,
    Terms,
}

/// Slots cleared when a field group is hidden. Reset values come from the
/// document defaults, so hiding a group can never leave stale input behind
/// and re-showing it starts clean.
const CLEAR_ON_HIDE: &[(FieldKey, &[Slot])] = &[
    (FieldKey::CompanyName, &[Slot::CompanyName]),
    (FieldKey::CompanyAddress, &[Slot::CompanyAddress]),
    (
        FieldKey::CompanyContact,
        &[Slot::CompanyWebsite, Slot::CompanyEmail, Slot::CompanyPhone],
    ),
    (FieldKey::ClientName, &[Slot::ClientName]),
    (FieldKey::ClientAddress, &[Slot::ClientAddress]),
    (FieldKey::InvoiceNumber, &[Slot::InvoiceNumber]),
    (FieldKey::InvoiceTitle, &[Slot::InvoiceTitle]),
    (FieldKey::Currency, &[Slot::Currency]),
    (FieldKey::Date, &[Slot::Date]),
    (FieldKey::DueDate, &[Slot::DueDate]),
    (FieldKey::Notes, &[Slot::Notes]),
    (FieldKey::Logo, &[Slot::Logo]),
    (FieldKey::Tax, &[Slot::TaxRate]),
    (FieldKey::Discount, &[Slot::OverallDiscount]),
    (
        FieldKey::Payment,
        &[
            Slot::PaymentMethod,
            Slot::BankName,
            Slot::AccountNumber,
            Slot::AccountName,
            Slot::RoutingNumber,
        ],
    ),
    (FieldKey::Terms, &[Slot::Terms]),
];

fn reset_slot(state: &mut InvoiceState, slot: Slot, defaults: &InvoiceState) {
    match slot {
        Slot::CompanyName => state.company_name = defaults.company_name.clone(),
        Slot::CompanyAddress => state.company_address = defaults.company_address.clone(),
        Slot::CompanyWebsite => state.company_website = defaults.company_website.clone(),
        Slot::CompanyEmail => state.company_email = defaults.company_email.clone(),
        Slot::CompanyPhone => state.company_phone = defaults.company_phone.clone(),
        Slot::ClientName => state.client_name = defaults.client_name.clone(),
        Slot::ClientAddress => state.client_address = defaults.client_address.clone(),
        Slot::InvoiceNumber => state.invoice_number = defaults.invoice_number.clone(),
        Slot::InvoiceTitle => state.invoice_title = defaults.invoice_title.clone(),
        Slot::Date => state.date = defaults.date,
        Slot::DueDate => state.due_date = defaults.due_date,
        Slot::Notes => state.notes = defaults.notes.clone(),
        Slot::Currency => state.currency = defaults.currency.clone(),
        Slot::Logo => state.logo = defaults.logo.clone(),
        Slot::TaxRate => state.tax_rate = defaults.tax_rate,
        Slot::OverallDiscount => state.discount = defaults.discount,
        Slot::PaymentMethod => state.payment_method = defaults.payment_method.clone(),
        Slot::BankName => state.bank_name = defaults.bank_name.clone(),
        Slot::AccountNumber => state.account_number = defaults.account_number.clone(),
        Slot::AccountName => state.account_name = defaults.account_name.clone(),
        Slot::RoutingNumber => state.routing_number = defaults.routing_number.clone(),
        Slot::Terms => state.terms = defaults.terms.clone(),
    }
}

fn clear_hidden_field(state: &mut InvoiceState, key: FieldKey) {
    let defaults = InvoiceState::default();
    for (field, slots) in CLEAR_ON_HIDE {
        if *field == key {
            for slot in *slots {
                reset_slot(state, *slot, &defaults);
            }
        }
    }
}

/// Apply one action to a state, producing the next state.
pub fn reduce(state: &InvoiceState, action: Action) -> InvoiceState {
    let mut next = state.clone();
    match action {
        Action::SetCompanyName(v) => next.company_name = v,
        Action::SetCompanyAddress(v) => next.company_address = v,
        Action::SetCompanyWebsite(v) => next.company_website = v,
        Action::SetCompanyEmail(v) => next.company_email = v,
        Action::SetCompanyPhone(v) => next.company_phone = v,
        Action::SetClientName(v) => next.client_name = v,
        Action::SetClientAddress(v) => next.client_address = v,
        Action::SetInvoiceNumber(v) => next.invoice_number = v,
        Action::SetInvoiceTitle(v) => next.invoice_title = v,
        Action::SetDate(v) => next.date = v,
        Action::SetDueDate(v) => next.due_date = v,
        Action::SetNotes(v) => next.notes = v,
        Action::SetCurrency(v) => next.currency = v,
        Action::SetLogo(v) => next.logo = v,
        Action::SetTaxRate(v) => next.tax_rate = coerce_number(&v),
        Action::SetOverallDiscount(v) => next.discount = coerce_number(&v),
        Action::SetPaymentMethod(v) => next.payment_method = v,
        Action::SetBankName(v) => next.bank_name = v,
        Action::SetAccountNumber(v) => next.account_number = v,
        Action::SetAccountName(v) => next.account_name = v,
        Action::SetRoutingNumber(v) => next.routing_number = v,
        Action::SetTerms(v) => next.terms = v,
        Action::UseStandardTerms => next.terms = STANDARD_TERMS.to_string(),
        Action::AddItem => next.items.push(LineItem::default()),
        Action::RemoveItem(index) => {
            if next.items.len() > 1 && index < next.items.len() {
                next.items.remove(index);
            }
        }
        Action::EditItem {
            index,
            field,
            value,
        } => {
            if let Some(item) = next.items.get_mut(index) {
                match field {
                    ItemField::Description => item.description = value,
                    ItemField::Quantity => item.quantity = coerce_number(&value),
                    ItemField::Price => item.price = coerce_number(&value),
                    ItemField::Discount => item.discount = coerce_number(&value),
                }
            }
        }
        Action::ToggleField(key) => {
            let was_visible = next.active_fields.get(key);
            next.active_fields.set(key, !was_visible);
            if was_visible {
                clear_hidden_field(&mut next, key);
            }
        }
        Action::ClearInvoice => {
            next = InvoiceState {
                active_fields: state.active_fields,
                pdf_theme: state.pdf_theme,
                ..InvoiceState::default()
            };
        }
        Action::SetPdfTheme(theme) => next.pdf_theme = theme,
    }
    next
}
