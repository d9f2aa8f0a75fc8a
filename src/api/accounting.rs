//! Division codes and the per-organization accounting/invoice controls.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::common::{RecordMeta, Status};
use super::{Resource, WritableResource};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DivisionCode {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub status: Status,
    #[validate(length(min = 1, max = 4))]
    pub code: String,
    #[validate(length(min = 1, max = 100))]
    pub description: String,
    #[serde(default)]
    pub cash_account_id: Option<String>,
    #[serde(default)]
    pub ap_account_id: Option<String>,
    #[serde(default)]
    pub expense_account_id: Option<String>,
}

impl Resource for DivisionCode {
    const PATH: &'static str = "/division-codes/";
    const NAME: &'static str = "division_code";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn label(&self) -> String {
        format!("{} - {}", self.code, self.description)
    }
}

impl WritableResource for DivisionCode {}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JournalEntryCriteria {
    #[default]
    OnShipmentBill,
    OnInvoicePost,
    OnPaymentReceived,
}

/// Accounting settings; one record per organization.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_journal_accounts"))]
pub struct AccountingControl {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(default)]
    pub auto_create_journal_entries: bool,
    #[serde(default)]
    pub journal_entry_criteria: JournalEntryCriteria,
    #[serde(default)]
    pub restrict_manual_journal_entries: bool,
    #[serde(default)]
    pub require_journal_entry_approval: bool,
    #[serde(default)]
    pub default_revenue_account_id: Option<String>,
    #[serde(default)]
    pub default_expense_account_id: Option<String>,
    #[validate(length(max = 1000))]
    #[serde(default)]
    pub critical_processes: Option<String>,
}

/// Automatic journal entries need somewhere to post.
fn validate_journal_accounts(c: &AccountingControl) -> Result<(), ValidationError> {
    if c.auto_create_journal_entries
        && (c.default_revenue_account_id.is_none() || c.default_expense_account_id.is_none())
    {
        return Err(ValidationError::new("default_accounts_required").with_message(
            "Default revenue and expense accounts are required when journal entries are automatic".into(),
        ));
    }
    Ok(())
}

impl Resource for AccountingControl {
    const PATH: &'static str = "/accounting-control/";
    const NAME: &'static str = "accounting_control";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn label(&self) -> String {
        "Accounting Control".to_owned()
    }
}

impl WritableResource for AccountingControl {}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceDateFormat {
    #[default]
    #[serde(rename = "InvoiceDateFormatMDY")]
    MonthDayYear,
    #[serde(rename = "InvoiceDateFormatDMY")]
    DayMonthYear,
    #[serde(rename = "InvoiceDateFormatYMD")]
    YearMonthDay,
}

/// Invoice numbering and presentation settings; one record per organization.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_distinct_prefixes"))]
pub struct InvoiceControl {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[validate(length(min = 1, max = 10))]
    pub invoice_number_prefix: String,
    #[validate(length(min = 1, max = 10))]
    pub credit_memo_number_prefix: String,
    #[validate(range(min = 0, max = 365))]
    #[serde(default)]
    pub invoice_due_after_days: u16,
    #[serde(default)]
    pub invoice_date_format: InvoiceDateFormat,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub invoice_terms: Option<String>,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub invoice_footer: Option<String>,
    #[validate(url)]
    #[serde(default)]
    pub invoice_logo_url: Option<String>,
    #[serde(default)]
    pub show_invoice_due_date: bool,
    #[serde(default)]
    pub attach_pdf: bool,
}

fn validate_distinct_prefixes(c: &InvoiceControl) -> Result<(), ValidationError> {
    if c.invoice_number_prefix.eq_ignore_ascii_case(&c.credit_memo_number_prefix) {
        return Err(ValidationError::new("prefixes_must_differ")
            .with_message("Invoice and credit memo prefixes must differ".into()));
    }
    Ok(())
}

impl Resource for InvoiceControl {
    const PATH: &'static str = "/invoice-control/";
    const NAME: &'static str = "invoice_control";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn label(&self) -> String {
        "Invoice Control".to_owned()
    }
}

impl WritableResource for InvoiceControl {}

#[cfg(test)]
#[path = "accounting_test.rs"]
mod tests;
