//! ISBN and ISSN check digit validation.
//!
//! Both identifiers are validated from the leading token of the subfield value, so
//! qualifiers such as `0306406152 (pbk.)` are tolerated. Hyphens and inner spaces of
//! the number itself are ignored.

use super::{ContentValidator, Violation};

/// Strip qualifiers and separators, keeping the characters of the number itself.
fn significant_characters(value: &str) -> Vec<char> {
    value
        .trim()
        .split(|c: char| c == '(' || c == ':' || c == ';')
        .next()
        .unwrap_or_default()
        .split_whitespace()
        .take_while(|token| token.chars().all(|c| c.is_ascii_digit() || matches!(c, '-' | 'X' | 'x')))
        .flat_map(str::chars)
        .filter(|c| *c != '-')
        .collect()
}

fn digit_value(ch: char, position: usize, check_position: usize) -> Result<u32, Violation> {
    match ch {
        'X' | 'x' if position == check_position => Ok(10),
        _ => ch.to_digit(10).ok_or(Violation::BadCharacter(ch)),
    }
}

/// ISBN (International Standard Book Number) validator
///
/// # Examples
///
/// ```
/// use marcqa::content::{ContentValidator, IsbnValidator, Violation};
///
/// assert!(IsbnValidator.validate("978-3-16-148410-0").is_ok());
/// assert_eq!(IsbnValidator.validate("978-3-16-148410-1"), Err(Violation::BadChecksum));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct IsbnValidator;

impl IsbnValidator {
    /// Validate an ISBN-10 check digit (weights 10..1, mod 11).
    ///
    /// # Errors
    ///
    /// Returns the first [`Violation`] found.
    pub fn validate_isbn10(chars: &[char]) -> Result<(), Violation> {
        if chars.len() != 10 {
            return Err(Violation::BadLength(chars.len()));
        }
        let mut sum = 0;
        for (i, ch) in chars.iter().enumerate() {
            let weight = 10 - u32::try_from(i).unwrap_or(0);
            sum += digit_value(*ch, i, 9)? * weight;
        }
        if sum % 11 == 0 {
            Ok(())
        } else {
            Err(Violation::BadChecksum)
        }
    }

    /// Validate an ISBN-13 check digit (weights 1,3 alternating, mod 10).
    ///
    /// # Errors
    ///
    /// Returns the first [`Violation`] found; a prefix other than 978/979 is a
    /// [`Violation::BadFormat`].
    pub fn validate_isbn13(chars: &[char]) -> Result<(), Violation> {
        if chars.len() != 13 {
            return Err(Violation::BadLength(chars.len()));
        }
        let mut sum = 0;
        for (i, ch) in chars.iter().enumerate() {
            let digit = ch.to_digit(10).ok_or(Violation::BadCharacter(*ch))?;
            let weight = if i % 2 == 0 { 1 } else { 3 };
            sum += digit * weight;
        }
        let prefix: String = chars[..3].iter().collect();
        if prefix != "978" && prefix != "979" {
            return Err(Violation::BadFormat);
        }
        if sum % 10 == 0 {
            Ok(())
        } else {
            Err(Violation::BadChecksum)
        }
    }

    /// Extract the ISBN without qualifiers, dashes or spaces
    ///
    /// ```
    /// use marcqa::content::IsbnValidator;
    ///
    /// assert_eq!(IsbnValidator::normalize("978-0-306-40615-7 (pbk.)"), "9780306406157");
    /// ```
    #[must_use]
    pub fn normalize(isbn: &str) -> String {
        significant_characters(isbn).into_iter().collect()
    }
}

impl ContentValidator for IsbnValidator {
    fn validate(&self, value: &str) -> Result<(), Violation> {
        let chars = significant_characters(value);
        match chars.len() {
            0 => Err(Violation::BadFormat),
            10 => Self::validate_isbn10(&chars),
            13 => Self::validate_isbn13(&chars),
            other => Err(Violation::BadLength(other)),
        }
    }
}

/// ISSN (International Standard Serial Number) validator
///
/// Eight characters, weights 8..2 over the first seven digits, mod 11 check digit
/// where 10 is written `X`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IssnValidator;

impl ContentValidator for IssnValidator {
    fn validate(&self, value: &str) -> Result<(), Violation> {
        let chars = significant_characters(value);
        if chars.is_empty() {
            return Err(Violation::BadFormat);
        }
        if chars.len() != 8 {
            return Err(Violation::BadLength(chars.len()));
        }
        let mut sum = 0;
        for (i, ch) in chars[..7].iter().enumerate() {
            let digit = ch.to_digit(10).ok_or(Violation::BadCharacter(*ch))?;
            sum += digit * (8 - u32::try_from(i).unwrap_or(0));
        }
        let check = digit_value(chars[7], 7, 7)?;
        if (sum + check) % 11 == 0 {
            Ok(())
        } else {
            Err(Violation::BadChecksum)
        }
    }
}
