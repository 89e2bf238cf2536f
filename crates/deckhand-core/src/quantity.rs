//! Resource quantity parsing (`500m`, `2`, `4Gi`, `1e3`)

/// A parsed resource quantity, normalized to base units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantity {
    value: f64,
}

impl Quantity {
    /// Parse a quantity string.
    ///
    /// Grammar: optional sign, a decimal number, then an optional suffix that is
    /// either binary SI (`Ki`..`Ei`), decimal SI (`n u m k M G T P E`) or a decimal
    /// exponent (`e3`, `E-2`). Returns `None` for anything else, including the
    /// empty string.
    pub fn parse(input: &str) -> Option<Self> {
        let (number, suffix) = split_number(input)?;
        let mantissa: f64 = number.parse().ok()?;
        let multiplier = suffix_multiplier(suffix)?;
        Some(Self {
            value: mantissa * multiplier,
        })
    }

    /// Value in base units (cores or bytes)
    pub fn value(&self) -> f64 {
        self.value
    }
}

/// Split the input into the signed decimal number and the remaining suffix
fn split_number(input: &str) -> Option<(&str, &str)> {
    let bytes = input.as_bytes();
    let mut pos = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        pos += 1;
    }

    let int_start = pos;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    let int_digits = pos - int_start;

    let mut frac_digits = 0;
    if pos < bytes.len() && bytes[pos] == b'.' {
        pos += 1;
        let frac_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        frac_digits = pos - frac_start;
    }

    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    Some(input.split_at(pos))
}

fn suffix_multiplier(suffix: &str) -> Option<f64> {
    let multiplier = match suffix {
        "" => 1.0,
        "Ki" => 1024f64,
        "Mi" => 1024f64.powi(2),
        "Gi" => 1024f64.powi(3),
        "Ti" => 1024f64.powi(4),
        "Pi" => 1024f64.powi(5),
        "Ei" => 1024f64.powi(6),
        "n" => 1e-9,
        "u" => 1e-6,
        "m" => 1e-3,
        "k" => 1e3,
        "M" => 1e6,
        "G" => 1e9,
        "T" => 1e12,
        "P" => 1e15,
        "E" => 1e18,
        _ => {
            let exponent = suffix
                .strip_prefix('e')
                .or_else(|| suffix.strip_prefix('E'))?;
            let digits = exponent
                .strip_prefix('+')
                .or_else(|| exponent.strip_prefix('-'))
                .unwrap_or(exponent);
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let exponent: i32 = exponent.parse().ok()?;
            10f64.powi(exponent)
        }
    };
    Some(multiplier)
}
