use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::transaction::parse_date;

/// Format a money amount with a currency symbol and thousands separators.
/// Negative amounts are rendered as `-$1,234.50`.
pub fn format_currency(amount: Decimal, symbol: &str) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (whole, frac) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    format!("{}{}{}.{}", if negative { "-" } else { "" }, symbol, grouped, frac)
}

/// Format a signed amount with an explicit sign, e.g. `+$10.00` or `-$10.00`
pub fn format_signed(amount: Decimal, symbol: &str) -> String {
    let sign = if amount.is_sign_negative() && !amount.is_zero() { '-' } else { '+' };
    format!("{}{}", sign, format_currency(amount.abs(), symbol))
}

/// Format a percentage with one decimal place
pub fn format_percent(value: f64) -> String {
    if value.is_finite() {
        format!("{:.1}%", value)
    } else {
        "0.0%".to_string()
    }
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format a server timestamp or date to a more readable format
pub fn format_date(date: &str) -> String {
    match parse_date(date) {
        Some(d) => d.format("%b %d, %Y").to_string(),
        None => date.chars().take(10).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(Decimal::new(0, 0), "$"), "$0.00");
        assert_eq!(format_currency(Decimal::new(5, 1), "$"), "$0.50");
        assert_eq!(format_currency(Decimal::new(123456789, 2), "$"), "$1,234,567.89");
        assert_eq!(format_currency(Decimal::new(100000, 2), "R$"), "R$1,000.00");
        assert_eq!(format_currency(Decimal::new(-4250, 2), "$"), "-$42.50");
        assert_eq!(format_currency(Decimal::new(12345, 3), "$"), "$12.35");
    }

    #[test]
    fn test_format_signed() {
        assert_eq!(format_signed(Decimal::new(1000, 2), "$"), "+$10.00");
        assert_eq!(format_signed(Decimal::new(-1000, 2), "$"), "-$10.00");
        assert_eq!(format_signed(Decimal::ZERO, "$"), "+$0.00");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(25.0), "25.0%");
        assert_eq!(format_percent(133.333), "133.3%");
        assert_eq!(format_percent(f64::NAN), "0.0%");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
        assert_eq!(truncate_string("Café com leite", 7), "Café...");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2024-03-05T10:00:00"), "Mar 05, 2024");
        assert_eq!(format_date("2024-03-05"), "Mar 05, 2024");
        assert_eq!(format_date("soon"), "soon");
    }
}
