use super::*;

#[test]
fn gcd_and_lcm_basics() {
    assert_eq!(gcd(12, 18), 6);
    assert_eq!(gcd(7, 0), 7);
    assert_eq!(lcm(4, 6), Some(12));
    assert_eq!(lcm(5, 5), Some(5));
    assert_eq!(lcm(0, 3), None);
    assert_eq!(lcm(u64::MAX, u64::MAX - 1), None);
}

#[test]
fn min_lcm_candidate_scans_whole_window() {
    // lcm(4, 6..=11) = 12, 28, 8, 36, 20, 44
    assert_eq!(min_lcm_candidate(4, 6..=11), Some((8, 8)));
}

#[test]
fn min_lcm_candidate_keeps_first_on_ties() {
    // lcm(1, c) == c, so ties cannot occur there; use base 6 with 2 and 3 -> 6 and 6.
    assert_eq!(min_lcm_candidate(6, [2, 3]), Some((2, 6)));
}

#[test]
fn min_lcm_candidate_skips_zero() {
    assert_eq!(min_lcm_candidate(3, [0, 0]), None);
    assert_eq!(min_lcm_candidate(3, [0, 4]), Some((4, 12)));
}

#[test]
fn window_around_clamps_to_positive() {
    assert_eq!(window_around(16, 2, 1).collect::<Vec<_>>(), vec![14, 15, 16, 17]);
    assert_eq!(window_around(1, 2, 1).collect::<Vec<_>>(), vec![1, 2]);
}

#[test]
fn mul_div255_rounds() {
    assert_eq!(mul_div255_u8(255, 255), 255);
    assert_eq!(mul_div255_u8(128, 255), 128);
    assert_eq!(mul_div255_u8(0, 200), 0);
}
