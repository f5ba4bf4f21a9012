//! Composition of the receipt view model shared by the JSON view and both
//! export pathways.

use serde::Serialize;
use utoipa::ToSchema;

use super::address::{
    address_blocks, chapter_contact_line, donor_display_name, pan_field, AddressBlock, PanField,
};
use super::clause::{select_clause, ExemptionClause};
use super::format::{format_amount, format_inr, format_long_date, format_receipt_date};
use super::models::ReceiptSnapshot;
use super::words::amount_to_words;

pub const HEAD_OFFICE_LINE: &str = "Head Office: Ekal Bhawan, 123/A, Harish Mukherjee Road, \
Kolkata-26. Web: www.ftsindia.com Ph: 033 - 2454 4510/11/12/13 PAN: AAAAF0290L";
pub const ISSUER_LINE: &str = "For Friends of Tribals Society";
pub const DEFAULT_DESIGNATION: &str = "Authorized Signatory";

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SignatoryLine {
    pub name: String,
    pub designation: String,
    pub signature_image: Option<String>,
}

/// Screen-only decorations around the receipt. Never part of a print or PDF export.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ViewChrome {
    pub heading: String,
    pub long_date: String,
    pub donation_type_badge: String,
    pub tally_verified: bool,
    pub amount_inr: String,
    pub footer: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReceiptDocument {
    pub receipt_ref_no: String,
    pub chapter_name: String,
    pub chapter_contact: String,
    pub head_office: String,
    pub donor_name: String,
    pub addresses: Vec<AddressBlock>,
    pub receipt_date: String,
    pub donation_type: String,
    pub pan: Option<PanField>,
    pub pay_mode: String,
    pub amount: String,
    pub amount_in_words: String,
    pub reference: String,
    pub clause: ExemptionClause,
    pub clause_text: Option<String>,
    pub issuer: String,
    pub signatories: Vec<SignatoryLine>,
    pub chrome: ViewChrome,
}

impl ReceiptDocument {
    pub fn compose(snapshot: &ReceiptSnapshot) -> Self {
        let receipt = &snapshot.data;
        let chapter = &receipt.chapter;

        let designation = chapter
            .auth_sign
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_DESIGNATION);

        let signatories = snapshot
            .auth_sign
            .iter()
            .map(|sig| SignatoryLine {
                name: sig.indicomp_full_name.clone(),
                designation: designation.to_string(),
                signature_image: sig
                    .signature_image
                    .clone()
                    .filter(|s| !s.trim().is_empty()),
            })
            .collect();

        let clause = select_clause(&receipt.receipt_exemption_type, receipt.receipt_date);

        Self {
            receipt_ref_no: receipt.receipt_ref_no.clone(),
            chapter_name: chapter.chapter_name.clone(),
            chapter_contact: chapter_contact_line(chapter),
            head_office: HEAD_OFFICE_LINE.to_string(),
            donor_name: donor_display_name(&receipt.donor),
            addresses: address_blocks(&receipt.donor),
            receipt_date: format_receipt_date(receipt.receipt_date),
            donation_type: receipt.receipt_donation_type.clone(),
            pan: pan_field(&receipt.donor, &snapshot.country),
            pay_mode: receipt.receipt_tran_pay_mode.clone(),
            amount: format_amount(receipt.receipt_total_amount),
            amount_in_words: format!("{} Only", amount_to_words(receipt.receipt_total_amount)),
            reference: receipt.receipt_tran_pay_details.clone(),
            clause,
            clause_text: clause.text().map(str::to_string),
            issuer: ISSUER_LINE.to_string(),
            signatories,
            chrome: ViewChrome {
                heading: format!("Receipt #{}", receipt.receipt_ref_no),
                long_date: format_long_date(receipt.receipt_date),
                donation_type_badge: receipt.receipt_donation_type.clone(),
                tally_verified: receipt.is_tally_verified(),
                amount_inr: format_inr(receipt.receipt_total_amount),
                footer: format!(
                    "This is an official receipt issued by {}. For any queries, please contact the chapter office.",
                    chapter.chapter_name
                ),
            },
        }
    }

    /// Base name shared by the print title and the download, e.g. `Receipt_R-1001`.
    pub fn export_stem(&self) -> String {
        format!("Receipt_{}", self.receipt_ref_no)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::receipt::models::{
        AuthorizedSignatory, Chapter, CountryReference, Donor, Receipt,
    };
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn snapshot(date: &str) -> ReceiptSnapshot {
        ReceiptSnapshot {
            data: Receipt {
                receipt_ref_no: "R-1001".to_string(),
                receipt_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
                receipt_total_amount: Some(Decimal::from(5000)),
                receipt_donation_type: "General".to_string(),
                receipt_exemption_type: "80G".to_string(),
                receipt_tran_pay_mode: "Cheque".to_string(),
                receipt_tran_pay_details: "CHQ 000123".to_string(),
                tally_status: Some("True".to_string()),
                donor: Donor {
                    indicomp_type: "Individual".to_string(),
                    title: Some("Mr".to_string()),
                    indicomp_full_name: "John Doe".to_string(),
                    indicomp_pan_no: Some("ABCDE1234F".to_string()),
                    ..Default::default()
                },
                chapter: Chapter {
                    chapter_name: "Kolkata Chapter".to_string(),
                    ..Default::default()
                },
            },
            auth_sign: vec![AuthorizedSignatory {
                indicomp_full_name: "Jane Roe".to_string(),
                signature_image: Some("  ".to_string()),
            }],
            country: vec![CountryReference {
                state_country: "India".to_string(),
            }],
        }
    }

    #[test]
    fn test_pre_2021_receipt_scenario() {
        let doc = ReceiptDocument::compose(&snapshot("2019-01-01"));

        assert_eq!(doc.amount, "5000");
        assert_eq!(doc.amount_in_words, "five thousand Only");
        assert_eq!(doc.clause, ExemptionClause::Legacy);
        assert!(doc.clause_text.unwrap().contains("DIT(E)/3260/8E/73/89-90"));
        assert_eq!(doc.receipt_date, "01-01-2019");
        assert_eq!(doc.donor_name, "Mr John Doe");
        assert!(doc.pan.is_some());
    }

    #[test]
    fn test_post_2021_receipt_scenario() {
        let doc = ReceiptDocument::compose(&snapshot("2022-01-01"));

        assert_eq!(doc.clause, ExemptionClause::Current);
        assert!(doc
            .clause_text
            .unwrap()
            .contains("Order No. AAAAF0290LF20214"));
    }

    #[test]
    fn test_signatory_designation_defaults_and_overrides() {
        let mut snap = snapshot("2022-01-01");
        let doc = ReceiptDocument::compose(&snap);
        assert_eq!(doc.signatories[0].designation, "Authorized Signatory");
        assert_eq!(doc.signatories[0].signature_image, None);

        snap.data.chapter.auth_sign = Some("Chapter Secretary".to_string());
        let doc = ReceiptDocument::compose(&snap);
        assert_eq!(doc.signatories[0].designation, "Chapter Secretary");
    }

    #[test]
    fn test_chrome_and_export_stem() {
        let doc = ReceiptDocument::compose(&snapshot("2019-01-01"));
        assert_eq!(doc.export_stem(), "Receipt_R-1001");
        assert_eq!(doc.chrome.heading, "Receipt #R-1001");
        assert_eq!(doc.chrome.long_date, "January 1st, 2019");
        assert_eq!(doc.chrome.amount_inr, "₹5,000");
        assert!(doc.chrome.tally_verified);
        assert!(doc.chrome.footer.contains("Kolkata Chapter"));
    }

    #[test]
    fn test_missing_amount_renders_as_zero() {
        let mut snap = snapshot("2019-01-01");
        snap.data.receipt_total_amount = None;
        let doc = ReceiptDocument::compose(&snap);
        assert_eq!(doc.amount, "0");
        assert_eq!(doc.amount_in_words, "zero Only");
    }

    #[test]
    fn test_negative_amount_renders_as_zero_everywhere() {
        let mut snap = snapshot("2019-01-01");
        snap.data.receipt_total_amount = Some(Decimal::from(-40));
        let doc = ReceiptDocument::compose(&snap);
        assert_eq!(doc.amount, "0");
        assert_eq!(doc.amount_in_words, "zero Only");
        assert_eq!(doc.chrome.amount_inr, "₹0");
    }
}
