/// Wholesale recompute of a driver's rating aggregate: the arithmetic mean
/// of all currently-visible passenger-to-driver ratings, rounded to one
/// decimal place. Recomputing from the full set (rather than keeping a
/// running average) stays correct under edits and deletions, and redundant
/// recomputes are harmless.
pub fn recompute(ratings: &[i32]) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }
    let sum: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
    let mean = sum as f64 / ratings.len() as f64;
    Some((mean * 10.0).round() / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_is_rounded_to_one_decimal() {
        assert_eq!(recompute(&[5, 4, 3]), Some(4.0));
        assert_eq!(recompute(&[5, 5, 4, 4, 4]), Some(4.4));
        assert_eq!(recompute(&[5]), Some(5.0));
        assert_eq!(recompute(&[1, 2]), Some(1.5));
        // 2/3 rounds up at the first decimal.
        assert_eq!(recompute(&[1, 2, 2]), Some(1.7));
    }

    #[test]
    fn empty_set_has_no_rating() {
        assert_eq!(recompute(&[]), None);
    }

    #[test]
    fn deletion_is_reflected_by_recomputing_the_remaining_set() {
        let before = recompute(&[5, 5, 4, 4, 4]).unwrap();
        assert_eq!(before, 4.4);
        // Drop one of the fives and recompute from what remains.
        let after = recompute(&[5, 4, 4, 4]).unwrap();
        assert_eq!(after, 4.3);
    }

    #[test]
    fn recompute_is_idempotent() {
        let ratings = [3, 4, 5, 5];
        assert_eq!(recompute(&ratings), recompute(&ratings));
    }
}
