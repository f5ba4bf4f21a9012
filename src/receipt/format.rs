use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

/// Receipt body date, e.g. "01-01-2019".
pub fn format_receipt_date(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}

/// Long date for headings, e.g. "January 1st, 2019".
pub fn format_long_date(date: NaiveDate) -> String {
    let day = date.day();
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{} {}{}, {}", date.format("%B"), day, suffix, date.year())
}

/// The amount a receipt states. Missing and negative amounts are zero, so the
/// figure and the words always agree.
pub fn receipt_amount(amount: Option<Decimal>) -> Decimal {
    amount
        .filter(|a| a.is_sign_positive() && !a.is_zero())
        .unwrap_or(Decimal::ZERO)
}

/// Amount as printed next to "Rs.", without trailing zero paise.
pub fn format_amount(amount: Option<Decimal>) -> String {
    receipt_amount(amount).normalize().to_string()
}

/// Whole rupees with Indian digit grouping, e.g. "₹12,34,567".
pub fn format_inr(amount: Option<Decimal>) -> String {
    let digits = receipt_amount(amount).round().trunc().to_string();

    let grouped = if digits.len() <= 3 {
        digits
    } else {
        let (head, last_three) = digits.split_at(digits.len() - 3);
        let mut groups: Vec<&str> = Vec::new();
        let mut end = head.len();
        while end > 2 {
            groups.push(&head[end - 2..end]);
            end -= 2;
        }
        groups.push(&head[..end]);
        groups.reverse();
        format!("{},{}", groups.join(","), last_three)
    };

    format!("₹{grouped}")
}
