use std::fmt;

/// Running trust in a resolved vote, in (0, 1].
///
/// Starts at [`Confidence::INITIAL`] and only ever shrinks: each resolved vote
/// multiplies it by the winning share of the round.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Confidence(f64);

impl Confidence {
    pub const INITIAL: Confidence = Confidence(0.95);

    #[cfg(test)]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Multiply by `count / total`. A share above one is clamped so the
    /// value never grows.
    pub fn decay(self, count: usize, total: usize) -> Confidence {
        if total == 0 {
            return self;
        }
        let share = (count as f64 / total as f64).clamp(0.0, 1.0);
        Confidence(self.0 * share)
    }

    /// Floor of 100 × confidence
    pub fn percent(self) -> u32 {
        (100.0 * self.0).floor().clamp(0.0, 100.0) as u32
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self::INITIAL
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

/// Read back a percentage written by [`Confidence`]'s `Display`, e.g. `"57%"`.
///
/// Mirrors integer prefix parsing: leading digits after optional whitespace
/// and sign are taken, anything after them is ignored.
pub fn parse_percent(text: &str) -> Option<i64> {
    let cleaned = text.replace('%', "");
    let trimmed = cleaned.trim_start();
    let (sign, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<i64>().ok().map(|n| sign * n)
}
