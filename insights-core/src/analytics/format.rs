//! Display formatting: shortened addresses, bar labels, currency.

/// Shorten an address to `first 6 + "..." + last 4` characters.
///
/// Addresses shorter than 10 characters are returned unchanged. Works on
/// characters, not bytes.
pub fn shorten_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() < 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// Abbreviated bar label: `$X.XM` at or above one million, else `$XK`.
pub fn bar_label(balance: f64) -> String {
    if balance >= 1_000_000.0 {
        format!("${:.1}M", balance / 1_000_000.0)
    } else {
        format!("${:.0}K", balance / 1_000.0)
    }
}

/// Dollar amount with thousands separators, e.g. `$1,234.57` or `-$12.00`.
pub fn format_usd(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };
    let is_zero = formatted.chars().all(|c| c == '0' || c == '.');
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };
    let grouped = group_thousands(int_part);
    match frac_part {
        Some(frac) => format!("{sign}${grouped}.{frac}"),
        None => format!("{sign}${grouped}"),
    }
}

/// Plain number with thousands separators and fixed decimals, e.g. `12,500.00`.
pub fn format_number(value: f64, decimals: usize) -> String {
    format_usd(value, decimals).replacen('$', "", 1)
}

/// Count with thousands separators.
pub fn format_count(count: usize) -> String {
    group_thousands(&count.to_string())
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
