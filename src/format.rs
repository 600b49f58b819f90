//! Display formatting for money and ratings.

/// Formats a raw amount as rupees with Indian digit grouping.
///
/// Input that does not read as a finite number is returned unchanged.
///
/// ```
/// use neighborfit::format::format_rupees;
///
/// assert_eq!(format_rupees("150000"), "Rs. 1,50,000");
/// assert_eq!(format_rupees("n/a"), "n/a");
/// ```
pub fn format_rupees(input: &str) -> String {
    match parse_amount(input) {
        Some(amount) => format_rupee_amount(amount),
        None => input.to_string(),
    }
}

/// Formats an amount as `Rs. 1,23,45,678.5`.
///
/// Keeps at most three fraction digits and drops trailing zeros.
pub fn format_rupee_amount(amount: f64) -> String {
    if !amount.is_finite() {
        return amount.to_string();
    }

    let fixed = format!("{:.3}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let fraction = fraction.trim_end_matches('0');

    // -0.0001 rounds to zero and must not keep its sign
    let negative = amount < 0.0 && (whole != "0" || !fraction.is_empty());

    let mut out = String::from("Rs. ");
    if negative {
        out.push('-');
    }
    out.push_str(&group_indian(whole));
    if !fraction.is_empty() {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

/// Renders a 1-5 rating as `4 / 5`.
pub fn format_rating(value: f64) -> String {
    format!("{} / 5", value)
}

/// Last three digits, then groups of two: `12345678` -> `1,23,45,678`.
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (mut rest, last_three) = digits.split_at(digits.len() - 3);
    let mut groups = Vec::new();
    while rest.len() > 2 {
        let (head, pair) = rest.split_at(rest.len() - 2);
        groups.push(pair);
        rest = head;
    }
    groups.push(rest);
    groups.reverse();

    format!("{},{}", groups.join(","), last_three)
}

fn parse_amount(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}
