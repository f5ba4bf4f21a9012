use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

/// Exemption category that carries a legal clause on the receipt.
pub const EXEMPTION_80G: &str = "80G";

pub const LEGACY_CLAUSE: &str = "This donation is eligible for deduction U/S 80(G) of the \
Income Tax Act 1961 vide order NO:DIT(E)/3260/8E/73/89-90 Dt. 13-12-2011.";

pub const CURRENT_CLAUSE: &str = "Donation is exempt U/Sec.80G of the \
Income Tax Act 1961 vide Order No. AAAAF0290LF20214 Dt. 28-05-2021.";

/// First issue date that carries the 2021 order number. A receipt dated on
/// the cutoff day itself gets the current clause.
pub fn clause_cutoff() -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 5, 27).expect("valid cutoff date")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExemptionClause {
    /// Not an 80G receipt; no clause is printed.
    NotApplicable,
    Legacy,
    Current,
}

impl ExemptionClause {
    pub fn text(&self) -> Option<&'static str> {
        match self {
            Self::NotApplicable => None,
            Self::Legacy => Some(LEGACY_CLAUSE),
            Self::Current => Some(CURRENT_CLAUSE),
        }
    }
}

pub fn select_clause(exemption_type: &str, issue_date: NaiveDate) -> ExemptionClause {
    if exemption_type != EXEMPTION_80G {
        return ExemptionClause::NotApplicable;
    }

    if issue_date >= clause_cutoff() {
        ExemptionClause::Current
    } else {
        ExemptionClause::Legacy
    }
}
