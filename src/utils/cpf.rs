//! CPF (Cadastro de Pessoas Físicas) validation and masking
//!
//! A CPF is an 11-digit Brazilian taxpayer number whose last two digits are
//! check digits computed from the first nine and ten digits respectively.
//! Validation accepts masked or bare input; malformed input yields `false`.

/// Number of digits in a CPF
pub const CPF_LENGTH: usize = 11;

/// Keep only ASCII digits
pub fn strip_non_digits(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Validate a CPF, accepting masked (`529.982.247-25`) or bare input
pub fn validate_cpf(input: &str) -> bool {
    let digits: Vec<u32> = input.chars().filter_map(|c| c.to_digit(10)).collect();

    if digits.len() != CPF_LENGTH {
        return false;
    }

    // Well-formed but never issued: 000.000.000-00, 111.111.111-11, ...
    if digits.iter().all(|&d| d == digits[0]) {
        return false;
    }

    check_digit(&digits[..9]) == digits[9] && check_digit(&digits[..10]) == digits[10]
}

/// Compute the check digit for a 9- or 10-digit prefix.
///
/// Weights start at `prefix.len() + 1` and decrease to 2.
fn check_digit(prefix: &[u32]) -> u32 {
    let top = prefix.len() as u32 + 1;
    let sum: u32 = prefix
        .iter()
        .enumerate()
        .map(|(i, &d)| d * (top - i as u32))
        .sum();

    let digit = 11 - (sum % 11);
    if digit > 9 {
        0
    } else {
        digit
    }
}

/// Apply the `DDD.DDD.DDD-DD` mask.
///
/// Input that does not strip down to exactly 11 digits is returned as its
/// bare digits.
pub fn format_cpf(input: &str) -> String {
    let digits = strip_non_digits(input);
    if digits.len() != CPF_LENGTH {
        return digits;
    }

    format!(
        "{}.{}.{}-{}",
        &digits[0..3],
        &digits[3..6],
        &digits[6..9],
        &digits[9..11]
    )
}

/// Normalize a CPF for storage (digits only), rejecting invalid numbers
pub fn normalize_cpf(input: &str) -> Option<String> {
    if validate_cpf(input) {
        Some(strip_non_digits(input))
    } else {
        None
    }
}
