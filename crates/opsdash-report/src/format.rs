/// Formats an amount with two decimals and thousands separators.
///
/// `1234567.891` becomes `"1,234,567.89"`.
pub fn format_with_commas(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::with_capacity(fixed.len() + whole.len() / 3 + 1);
    if value < 0.0 && fixed != "0.00" {
        grouped.push('-');
    }
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped.push('.');
    grouped.push_str(fraction);
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(format_with_commas(1_234_567.891), "1,234,567.89");
        assert_eq!(format_with_commas(999.5), "999.50");
        assert_eq!(format_with_commas(1000.0), "1,000.00");
        assert_eq!(format_with_commas(0.0), "0.00");
        assert_eq!(format_with_commas(-45_210.0), "-45,210.00");
        assert_eq!(format_with_commas(-0.001), "0.00");
    }
}
