//! Donor name, address blocks and the PAN field of the receipt.

use serde::Serialize;
use utoipa::ToSchema;

use super::models::{Chapter, CountryReference, Donor};

pub const PAN_LABEL: &str = "PAN No :";
const PAN_COUNTRY: &str = "India";

/// Four fixed lines of one donor address, blank fields kept as empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AddressBlock {
    pub kind: AddressKind,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AddressKind {
    Office,
    Residential,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PanField {
    pub label: String,
    pub value: String,
}

fn text(field: &Option<String>) -> &str {
    field.as_deref().unwrap_or("")
}

pub fn donor_display_name(donor: &Donor) -> String {
    if donor.is_individual() {
        format!("{} {}", text(&donor.title), donor.indicomp_full_name)
    } else {
        format!("M/s {}", donor.indicomp_full_name)
    }
}

fn address_block(
    kind: AddressKind,
    address: &Option<String>,
    area: &Option<String>,
    landmark: &Option<String>,
    city: &Option<String>,
    pin: &Option<String>,
    state: &Option<String>,
) -> Option<AddressBlock> {
    if text(address).trim().is_empty() {
        return None;
    }

    Some(AddressBlock {
        kind,
        lines: vec![
            text(address).to_string(),
            text(area).to_string(),
            text(landmark).to_string(),
            format!("{} - {},{}", text(city), text(pin), text(state)),
        ],
    })
}

/// Office block first, then residential; each only when its address line is set.
pub fn address_blocks(donor: &Donor) -> Vec<AddressBlock> {
    let office = address_block(
        AddressKind::Office,
        &donor.indicomp_off_branch_address,
        &donor.indicomp_off_branch_area,
        &donor.indicomp_off_branch_ladmark,
        &donor.indicomp_off_branch_city,
        &donor.indicomp_off_branch_pin_code,
        &donor.indicomp_off_branch_state,
    );
    let residential = address_block(
        AddressKind::Residential,
        &donor.indicomp_res_reg_address,
        &donor.indicomp_res_reg_area,
        &donor.indicomp_res_reg_ladmark,
        &donor.indicomp_res_reg_city,
        &donor.indicomp_res_reg_pin_code,
        &donor.indicomp_res_reg_state,
    );

    office.into_iter().chain(residential).collect()
}

pub fn pan_field(donor: &Donor, countries: &[CountryReference]) -> Option<PanField> {
    countries
        .iter()
        .any(|c| c.state_country == PAN_COUNTRY)
        .then(|| PanField {
            label: PAN_LABEL.to_string(),
            value: text(&donor.indicomp_pan_no).to_string(),
        })
}

/// Chapter postal address followed by whichever contact channels are set.
pub fn chapter_contact_line(chapter: &Chapter) -> String {
    let mut line = format!(
        "{}, {} - {}, {}",
        text(&chapter.chapter_address),
        text(&chapter.chapter_city),
        text(&chapter.chapter_pin),
        text(&chapter.chapter_state),
    );

    let channels = [
        (&chapter.chapter_email, "Email: ", " |"),
        (&chapter.chapter_website, "", " |"),
        (&chapter.chapter_phone, "Ph: ", " |"),
        (&chapter.chapter_whatsapp, "Mob: ", ""),
    ];
    for (value, prefix, suffix) in channels {
        let value = text(value).trim();
        if !value.is_empty() {
            line.push(' ');
            line.push_str(prefix);
            line.push_str(value);
            line.push_str(suffix);
        }
    }

    line
}
