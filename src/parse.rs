/**
 * Strips surrounding whitespace and quote characters. The exoplanet
 * archive quotes fields with '|', other tools use '"'.
 **/
pub fn clean_token(val: &str) -> &str {
    val.trim().trim_matches(|c| c == '|' || c == '"').trim()
}

fn is_null(val: &str) -> bool {
    val.is_empty() || val == "--" || val.eq_ignore_ascii_case("null") || val.eq_ignore_ascii_case("nan")
}

/**
 * Parses an optional numeric field. Missing, empty and null-marker
 * values give Ok(None). Anything else that is not a finite number
 * is an error holding the offending token.
 **/
pub fn parse_opt_f64(val_str: Option<&&str>) -> Result<Option<f64>, String> {
    let val = match val_str {
        Some(val) => clean_token(val),
        None => return Ok(None),
    };
    if is_null(val) {
        return Ok(None);
    }
    match fast_float::parse::<f64, _>(val) {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(val.to_string()),
    }
}

/**
 * Optional text field, None when missing or empty
 **/
pub fn parse_opt_str(val_str: Option<&&str>) -> Option<String> {
    match val_str {
        Some(val) => {
            let val = clean_token(val);
            if val.is_empty() {
                None
            } else {
                Some(val.to_string())
            }
        }
        None => None,
    }
}
