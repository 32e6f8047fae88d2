//! Asset code helpers.

/// Exchange-traded fund codes start with one of these prefixes.
const ETF_PREFIXES: [&str; 4] = ["15", "51", "52", "58"];

pub fn is_etf_code(code: &str) -> bool {
    ETF_PREFIXES.iter().any(|p| code.starts_with(p))
}

/// Trim, keep purely numeric codes, and drop repeats (first occurrence wins).
pub fn valid_codes<S: AsRef<str>>(codes: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for code in codes {
        let code = code.as_ref().trim();
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        if !out.iter().any(|c| c == code) {
            out.push(code.to_string());
        }
    }
    out
}
