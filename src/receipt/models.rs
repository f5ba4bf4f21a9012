use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

/// Donor type label used upstream for natural persons.
pub const INDIVIDUAL_DONOR_TYPE: &str = "Individual";

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct Donor {
    #[serde(default)]
    #[schema(example = "Individual")]
    pub indicomp_type: String,
    #[serde(default)]
    #[schema(example = "Mr")]
    pub title: Option<String>,
    #[serde(default)]
    #[schema(example = "John Doe")]
    pub indicomp_full_name: String,
    #[serde(default)]
    #[schema(example = "ABCDE1234F")]
    pub indicomp_pan_no: Option<String>,

    #[serde(default)]
    pub indicomp_off_branch_address: Option<String>,
    #[serde(default)]
    pub indicomp_off_branch_area: Option<String>,
    #[serde(default)]
    pub indicomp_off_branch_ladmark: Option<String>,
    #[serde(default)]
    pub indicomp_off_branch_city: Option<String>,
    #[serde(default)]
    pub indicomp_off_branch_state: Option<String>,
    #[serde(default)]
    pub indicomp_off_branch_pin_code: Option<String>,

    #[serde(default)]
    pub indicomp_res_reg_address: Option<String>,
    #[serde(default)]
    pub indicomp_res_reg_area: Option<String>,
    #[serde(default)]
    pub indicomp_res_reg_ladmark: Option<String>,
    #[serde(default)]
    pub indicomp_res_reg_city: Option<String>,
    #[serde(default)]
    pub indicomp_res_reg_state: Option<String>,
    #[serde(default)]
    pub indicomp_res_reg_pin_code: Option<String>,
}

impl Donor {
    pub fn is_individual(&self) -> bool {
        self.indicomp_type == INDIVIDUAL_DONOR_TYPE
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct Chapter {
    #[serde(default)]
    #[schema(example = "Kolkata Chapter")]
    pub chapter_name: String,
    #[serde(default)]
    pub chapter_address: Option<String>,
    #[serde(default)]
    pub chapter_city: Option<String>,
    #[serde(default)]
    pub chapter_pin: Option<String>,
    #[serde(default)]
    pub chapter_state: Option<String>,
    #[serde(default)]
    pub chapter_email: Option<String>,
    #[serde(default)]
    pub chapter_website: Option<String>,
    #[serde(default)]
    pub chapter_phone: Option<String>,
    #[serde(default)]
    pub chapter_whatsapp: Option<String>,
    /// Designation printed under every signatory; defaults to "Authorized Signatory".
    #[serde(default)]
    pub auth_sign: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Receipt {
    #[schema(example = "R-1001")]
    pub receipt_ref_no: String,
    /// Always zero-padded ISO `YYYY-MM-DD` upstream; anything else fails decoding.
    #[schema(value_type = String, example = "2019-01-01")]
    pub receipt_date: NaiveDate,
    /// Unparseable or missing amounts decode as `None` and render as zero.
    #[serde(default, deserialize_with = "lenient_amount")]
    #[schema(value_type = Option<String>, example = "5000")]
    pub receipt_total_amount: Option<Decimal>,
    #[serde(default)]
    #[schema(example = "General Donation")]
    pub receipt_donation_type: String,
    #[serde(default)]
    #[schema(example = "80G")]
    pub receipt_exemption_type: String,
    #[serde(default)]
    #[schema(example = "Cheque")]
    pub receipt_tran_pay_mode: String,
    #[serde(default)]
    pub receipt_tran_pay_details: String,
    #[serde(default)]
    #[schema(example = "True")]
    pub tally_status: Option<String>,
    #[serde(default)]
    pub donor: Donor,
    #[serde(default)]
    pub chapter: Chapter,
}

fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => Decimal::from_str(s.trim()).ok(),
        Some(serde_json::Value::Number(n)) => Decimal::from_str(&n.to_string()).ok(),
        _ => None,
    })
}

impl Receipt {
    pub fn is_tally_verified(&self) -> bool {
        self.tally_status.as_deref() == Some("True")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthorizedSignatory {
    #[serde(default)]
    #[schema(example = "Jane Roe")]
    pub indicomp_full_name: String,
    /// URL or `data:` URI of the signature image.
    #[serde(default)]
    pub signature_image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CountryReference {
    #[serde(default)]
    #[schema(example = "India")]
    pub state_country: String,
}

/// Body of `GET /fetch-donor-receipt-view`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReceiptSnapshot {
    pub data: Receipt,
    #[serde(default)]
    pub auth_sign: Vec<AuthorizedSignatory>,
    #[serde(default)]
    pub country: Vec<CountryReference>,
}
