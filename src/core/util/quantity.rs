//! Kubernetes resource quantity parsing.
//!
//! Node capacity/allocatable maps and container requests carry quantities as
//! strings (`"16288096Ki"`, `"4"`, `"500m"`). These are converted into one
//! canonical numeric amount: bytes for memory and storage, (fractional) cores
//! for CPU, plain counts for everything else.
//!
//! `Ki` is the IEC binary suffix (x1024), never x1000.

use std::fmt;
use std::ops::{AddAssign, SubAssign};

use serde::{Deserialize, Serialize};

const KIB: f64 = 1024.0;

/// A parsed quantity in its canonical base unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceQuantity(pub f64);

impl ResourceQuantity {
    pub const ZERO: ResourceQuantity = ResourceQuantity(0.0);

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl AddAssign for ResourceQuantity {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for ResourceQuantity {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl fmt::Display for ResourceQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_quantity(*self))
    }
}

enum Scale {
    Mul(f64),
    Div(f64),
}

// Two-letter binary suffixes first so "Mi" is never read as "M" + junk.
const SUFFIXES: &[(&str, Scale)] = &[
    ("Ki", Scale::Mul(KIB)),
    ("Mi", Scale::Mul(KIB * KIB)),
    ("Gi", Scale::Mul(KIB * KIB * KIB)),
    ("Ti", Scale::Mul(KIB * KIB * KIB * KIB)),
    ("Pi", Scale::Mul(KIB * KIB * KIB * KIB * KIB)),
    ("Ei", Scale::Mul(KIB * KIB * KIB * KIB * KIB * KIB)),
    ("k", Scale::Mul(1e3)),
    ("K", Scale::Mul(1e3)),
    ("M", Scale::Mul(1e6)),
    ("G", Scale::Mul(1e9)),
    ("T", Scale::Mul(1e12)),
    ("P", Scale::Mul(1e15)),
    ("E", Scale::Mul(1e18)),
    ("m", Scale::Div(1e3)),
    ("u", Scale::Div(1e6)),
    ("n", Scale::Div(1e9)),
];

/// Parse a Kubernetes quantity string into its canonical amount.
///
/// Returns `None` for anything that is not a number with an optional known
/// suffix. Callers skip `None` rather than failing the whole aggregation.
pub fn parse_quantity(raw: &str) -> Option<ResourceQuantity> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    for (suffix, scale) in SUFFIXES {
        if let Some(body) = s.strip_suffix(suffix) {
            let v = parse_body(body)?;
            let scaled = match scale {
                Scale::Mul(m) => v * m,
                Scale::Div(d) => v / d,
            };
            return Some(ResourceQuantity(scaled));
        }
    }

    parse_body(s).map(ResourceQuantity)
}

fn parse_body(body: &str) -> Option<f64> {
    if body.is_empty() {
        return None;
    }
    body.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Render a quantity back into a string that parses to the same amount.
///
/// Whole amounts are written as plain integers and exact milli amounts with
/// the `m` suffix. Anything finer falls back to a plain decimal body.
pub fn format_quantity(q: ResourceQuantity) -> String {
    let v = q.0;
    if v.fract() == 0.0 {
        return format!("{:.0}", v);
    }
    let millis = (v * 1000.0).round();
    if millis != 0.0 && millis / 1000.0 == v {
        format!("{:.0}m", millis)
    } else {
        format!("{}", v)
    }
}
