//! Entropy estimate for generated passwords

use serde::{Deserialize, Serialize};

const UPPERCASE: usize = 26;
const LOWERCASE: usize = 26;
const DIGITS: usize = 10;
/// `!@#$%^&*()_+-=[]{}|;:,.<>?`
const SPECIAL: usize = 26;

/// Character classes a password was generated from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Charset {
    pub uppercase: bool,
    pub lowercase: bool,
    pub digits: bool,
    pub special: bool,
}

impl Charset {
    /// Number of distinct symbols in the combined alphabet
    pub fn size(&self) -> usize {
        [
            (self.uppercase, UPPERCASE),
            (self.lowercase, LOWERCASE),
            (self.digits, DIGITS),
            (self.special, SPECIAL),
        ]
        .iter()
        .filter(|(enabled, _)| *enabled)
        .map(|(_, size)| size)
        .sum()
    }
}

/// `length * log2(charset size)` in bits, rounded to two decimals
pub fn calculate_entropy(length: u32, charset: Charset) -> f64 {
    let size = charset.size();
    if size == 0 {
        return 0.0;
    }
    let bits = f64::from(length) * (size as f64).log2();
    (bits * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntropyLevel {
    Weak,
    Medium,
    Strong,
    VeryStrong,
}

impl EntropyLevel {
    pub fn from_bits(entropy: f64) -> Self {
        if entropy < 28.0 {
            Self::Weak
        } else if entropy < 36.0 {
            Self::Medium
        } else if entropy < 60.0 {
            Self::Strong
        } else {
            Self::VeryStrong
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Weak => "Weak",
            Self::Medium => "Medium",
            Self::Strong => "Strong",
            Self::VeryStrong => "Very Strong",
        }
    }
}

impl std::fmt::Display for EntropyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
