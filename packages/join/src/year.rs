//! Nearest-year resolution for sparsely snapshotted tables.

/// Picks the available year closest to `requested`.
///
/// When two years are equally close, the lower one wins regardless of the
/// order of `available`. Returns `None` if `available` is empty.
#[must_use]
pub fn closest_year(requested: i32, available: &[i32]) -> Option<i32> {
    available
        .iter()
        .copied()
        .min_by_key(|year| ((i64::from(*year) - i64::from(requested)).abs(), *year))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_wins() {
        assert_eq!(closest_year(2018, &[2014, 2018, 2022]), Some(2018));
    }

    #[test]
    fn nearest_below_or_above() {
        assert_eq!(closest_year(2015, &[2014, 2018]), Some(2014));
        assert_eq!(closest_year(2017, &[2014, 2018]), Some(2018));
    }

    #[test]
    fn tie_picks_lower_year() {
        // 2015 and 2017 are both one year from 2016.
        assert_eq!(closest_year(2016, &[2014, 2015, 2017, 2019]), Some(2015));
    }

    #[test]
    fn tie_break_ignores_input_order() {
        assert_eq!(closest_year(2016, &[2019, 2017, 2015, 2014]), Some(2015));
    }

    #[test]
    fn out_of_range_requests_clamp_to_ends() {
        assert_eq!(closest_year(2030, &[2014, 2022]), Some(2022));
        assert_eq!(closest_year(2000, &[2022, 2014]), Some(2014));
    }

    #[test]
    fn empty_available_is_none() {
        assert_eq!(closest_year(2020, &[]), None);
    }
}
