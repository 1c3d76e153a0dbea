//! Aggregate formatting (en-AU conventions).

use rust_decimal::{Decimal, RoundingStrategy};

use crate::column::AggregateFormat;

/// Format an aggregate total.
///
/// Currency: `$1,234.56` / `-$1,234.56`, always two decimals.
/// Number: `1,234.5`, at most three decimals, trailing zeros dropped.
pub fn format_aggregate(value: Decimal, format: AggregateFormat) -> String {
    match format {
        AggregateFormat::Currency => format_currency(value),
        AggregateFormat::Number => format_number(value),
    }
}

pub fn format_currency(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let body = group(&format!("{:.2}", rounded.abs()));
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-${body}")
    } else {
        format!("${body}")
    }
}

pub fn format_number(value: Decimal) -> String {
    let rounded = value
        .round_dp_with_strategy(3, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let body = group(&rounded.abs().to_string());
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{body}")
    } else {
        body
    }
}

/// Insert thousands separators into the integer part of a plain decimal.
fn group(plain: &str) -> String {
    let (int, frac) = match plain.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (plain, None),
    };
    let mut out = String::with_capacity(plain.len() + int.len() / 3);
    for (i, ch) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if let Some(frac) = frac {
        out.push('.');
        out.push_str(frac);
    }
    out
}
