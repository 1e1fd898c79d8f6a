//! Mod-10 (Luhn) check-digit validation for order numbers.

/// Return whether `number` is a non-empty string of ASCII digits whose
/// trailing check digit satisfies the Luhn algorithm.
///
/// # Examples
/// ```
/// use gophermart::domain::luhn;
///
/// assert!(luhn::validate("79927398713"));
/// assert!(!luhn::validate("79927398710"));
/// assert!(!luhn::validate("7992 7398 713"));
/// ```
pub fn validate(number: &str) -> bool {
    if number.is_empty() {
        return false;
    }

    let mut sum: u32 = 0;
    for (position, byte) in number.bytes().rev().enumerate() {
        if !byte.is_ascii_digit() {
            return false;
        }
        let digit = u32::from(byte - b'0');
        let contribution = if position % 2 == 1 {
            let doubled = digit * 2;
            if doubled > 9 { doubled - 9 } else { doubled }
        } else {
            digit
        };
        sum = (sum + contribution) % 10;
    }
    sum == 0
}
