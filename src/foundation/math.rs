pub(crate) fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

/// Least common multiple; `None` on overflow or when either side is zero.
pub(crate) fn lcm(a: u64, b: u64) -> Option<u64> {
    if a == 0 || b == 0 {
        return None;
    }
    (a / gcd(a, b)).checked_mul(b)
}

/// Candidate with the smallest `lcm(base, candidate)`.
///
/// Zero candidates and overflowing products are skipped. Ties keep the earliest candidate.
/// Returns `(candidate, lcm)`.
pub(crate) fn min_lcm_candidate(
    base: u64,
    candidates: impl IntoIterator<Item = u64>,
) -> Option<(u64, u64)> {
    let mut best: Option<(u64, u64)> = None;
    for c in candidates {
        let Some(l) = lcm(base, c) else {
            continue;
        };
        match best {
            Some((_, best_l)) if best_l <= l => {}
            _ => best = Some((c, l)),
        }
    }
    best
}

/// Positive candidates in `[center - below, center + above]`.
pub(crate) fn window_around(center: u64, below: u64, above: u64) -> impl Iterator<Item = u64> {
    center.saturating_sub(below).max(1)..=center.saturating_add(above)
}

pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
