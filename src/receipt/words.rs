//! Spelling of rupee amounts in English words, grouped the Indian way
//! (crore, lakh, thousand, hundred).

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::format::receipt_amount;

const ONES: [&str; 20] = [
    "",
    "one",
    "two",
    "three",
    "four",
    "five",
    "six",
    "seven",
    "eight",
    "nine",
    "ten",
    "eleven",
    "twelve",
    "thirteen",
    "fourteen",
    "fifteen",
    "sixteen",
    "seventeen",
    "eighteen",
    "nineteen",
];

const TENS: [&str; 10] = [
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];

const CRORE: u128 = 10_000_000;
const LAKH: u128 = 100_000;
const THOUSAND: u128 = 1_000;
const HUNDRED: u128 = 100;

/// Spell the integer part of `amount` in lowercase words, e.g. 1500 →
/// "one thousand five hundred". Missing and negative amounts read as "zero";
/// paise are dropped. Callers append the " Only" suffix themselves.
pub fn amount_to_words(amount: Option<Decimal>) -> String {
    let rupees = receipt_amount(amount).trunc().to_u128().unwrap_or(0);

    if rupees == 0 {
        return "zero".to_string();
    }

    let mut words = Vec::new();
    push_words(rupees, &mut words);
    words.join(" ")
}

fn push_words(n: u128, words: &mut Vec<&'static str>) {
    let crores = n / CRORE;
    let rest = n % CRORE;

    // Anything beyond 99 crore keeps counting in crores.
    if crores > 0 {
        if crores >= HUNDRED {
            push_words(crores, words);
        } else {
            push_two_digits(crores as usize, words);
        }
        words.push("crore");
    }

    let lakhs = (rest / LAKH) as usize;
    let thousands = ((rest % LAKH) / THOUSAND) as usize;
    let hundreds = ((rest % THOUSAND) / HUNDRED) as usize;
    let units = (rest % HUNDRED) as usize;

    if lakhs > 0 {
        push_two_digits(lakhs, words);
        words.push("lakh");
    }
    if thousands > 0 {
        push_two_digits(thousands, words);
        words.push("thousand");
    }
    if hundreds > 0 {
        words.push(ONES[hundreds]);
        words.push("hundred");
    }
    if units > 0 {
        if !words.is_empty() {
            words.push("and");
        }
        push_two_digits(units, words);
    }
}

fn push_two_digits(n: usize, words: &mut Vec<&'static str>) {
    debug_assert!(n < 100);
    if n < 20 {
        words.push(ONES[n]);
        return;
    }
    words.push(TENS[n / 10]);
    if n % 10 > 0 {
        words.push(ONES[n % 10]);
    }
}
