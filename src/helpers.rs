pub fn round_to_decimals(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// `1234567.891` -> `1,234,567.89`
pub fn format_number(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((&formatted, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && formatted != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

/// Market cap and volume figures: trillions, billions and millions get a suffix.
pub fn format_large_number(value: f64) -> String {
    if value >= 1e12 {
        format!("{:.2}T", value / 1e12)
    } else if value >= 1e9 {
        format!("{:.2}B", value / 1e9)
    } else if value >= 1e6 {
        format!("{:.2}M", value / 1e6)
    } else {
        format_number(value)
    }
}

/// Shorter variant used by the analysis panel, which also abbreviates thousands.
pub fn format_compact(value: f64) -> String {
    if value >= 1e9 {
        format!("{:.2}B", value / 1e9)
    } else if value >= 1e6 {
        format!("{:.2}M", value / 1e6)
    } else if value >= 1e3 {
        format!("{:.2}K", value / 1e3)
    } else {
        format!("{value:.2}")
    }
}

pub fn format_percentage(value: f64) -> String {
    if value >= 0.0 {
        format!("+{value:.2}%")
    } else {
        format!("{value:.2}%")
    }
}

pub fn format_usd(value: f64) -> String {
    if value < 0.0 {
        format!("-${}", format_number(-value))
    } else {
        format!("${}", format_number(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rounding() {
        assert_relative_eq!(round_to_decimals(101.23456, 2), 101.23);
        assert_relative_eq!(round_to_decimals(99.995, 0), 100.0);
    }

    #[test]
    fn test_format_number_groups_thousands() {
        assert_eq!(format_number(0.0), "0.00");
        assert_eq!(format_number(999.999), "1,000.00");
        assert_eq!(format_number(1234567.891), "1,234,567.89");
        assert_eq!(format_number(-45000.5), "-45,000.50");
    }

    #[test]
    fn test_format_large_number_suffixes() {
        assert_eq!(format_large_number(2.5e12), "2.50T");
        assert_eq!(format_large_number(3.1e9), "3.10B");
        assert_eq!(format_large_number(7.25e6), "7.25M");
        assert_eq!(format_large_number(12345.0), "12,345.00");
    }

    #[test]
    fn test_format_compact_and_percentage() {
        assert_eq!(format_compact(1500.0), "1.50K");
        assert_eq!(format_compact(12.0), "12.00");
        assert_eq!(format_percentage(2.345), "+2.35%");
        assert_eq!(format_percentage(0.0), "+0.00%");
        assert_eq!(format_percentage(-1.0), "-1.00%");
        assert_eq!(format_usd(-12.5), "-$12.50");
    }
}
