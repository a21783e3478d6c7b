//! Picks the search result that best matches a track
//!
//! Without an expected duration the first result that reports a duration wins.
//! With one, the result closest in duration wins, as long as it is within the
//! tolerance; ties go to the earlier result.

use tracing::debug;

use super::source::SearchCandidate;

/// Allowed duration mismatch in seconds
pub const DEFAULT_TOLERANCE_SECS: u32 = 10;

/// Select the best candidate for `query`, or `None` if nothing fits
pub fn select_best_match<'a>(
    query: &str,
    expected_duration: Option<u32>,
    candidates: &'a [SearchCandidate],
    tolerance: u32,
) -> Option<&'a SearchCandidate> {
    let Some(expected) = expected_duration else {
        let first = candidates.iter().find(|c| c.duration_seconds.is_some());
        debug!("No expected duration for '{}', taking first timed result", query);
        return first;
    };

    let mut best: Option<(&SearchCandidate, u32)> = None;
    for candidate in candidates {
        let Some(duration) = candidate.duration_seconds else {
            continue;
        };

        let diff = duration.abs_diff(expected);
        if diff > tolerance {
            continue;
        }
        // Strict comparison keeps the earliest of equal matches
        if best.is_none_or(|(_, best_diff)| diff < best_diff) {
            best = Some((candidate, diff));
        }
    }

    match best {
        Some((candidate, diff)) => {
            debug!(
                "Matched '{}' to '{}' ({}s off)",
                query, candidate.title, diff
            );
            Some(candidate)
        }
        None => {
            debug!(
                "No result for '{}' within {}s of {}s",
                query, tolerance, expected
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(title: &str, duration: Option<u32>) -> SearchCandidate {
        SearchCandidate {
            title: title.to_string(),
            duration_seconds: duration,
            source_url: format!("https://example.com/{}", title),
        }
    }

    #[test]
    fn test_picks_closest_within_tolerance() {
        let candidates = vec![
            candidate("far", Some(260)),
            candidate("near", Some(203)),
            candidate("nearer", Some(201)),
        ];
        let best = select_best_match("X - Y", Some(200), &candidates, 10).unwrap();
        assert_eq!(best.title, "nearer");
    }

    #[test]
    fn test_tie_goes_to_first() {
        let candidates = vec![
            candidate("first", Some(195)),
            candidate("second", Some(205)),
            candidate("third", Some(195)),
        ];
        let best = select_best_match("q", Some(200), &candidates, 10).unwrap();
        assert_eq!(best.title, "first");
    }

    #[test]
    fn test_nothing_within_tolerance() {
        let candidates = vec![candidate("long", Some(500))];
        assert!(select_best_match("q", Some(200), &candidates, 10).is_none());
    }

    #[test]
    fn test_tolerance_is_inclusive() {
        let candidates = vec![candidate("edge", Some(210))];
        assert!(select_best_match("q", Some(200), &candidates, 10).is_some());
        assert!(select_best_match("q", Some(200), &candidates, 9).is_none());
    }

    #[test]
    fn test_untimed_candidates_skipped_when_duration_expected() {
        let candidates = vec![candidate("untimed", None), candidate("timed", Some(199))];
        let best = select_best_match("q", Some(200), &candidates, 10).unwrap();
        assert_eq!(best.title, "timed");

        let only_untimed = vec![candidate("untimed", None)];
        assert!(select_best_match("q", Some(200), &only_untimed, 10).is_none());
    }

    #[test]
    fn test_no_expected_duration_takes_first_timed() {
        let candidates = vec![
            candidate("untimed", None),
            candidate("way off", Some(9000)),
            candidate("exact", Some(200)),
        ];
        let best = select_best_match("q", None, &candidates, 10).unwrap();
        assert_eq!(best.title, "way off");
    }

    #[test]
    fn test_no_expected_duration_and_no_timed_results() {
        let candidates = vec![candidate("untimed", None)];
        assert!(select_best_match("q", None, &candidates, 10).is_none());
        assert!(select_best_match("q", None, &[], 10).is_none());
    }

    #[test]
    fn test_zero_durations_are_known() {
        let candidates = vec![candidate("zero", Some(0))];
        assert_eq!(
            select_best_match("q", Some(5), &candidates, 10).map(|c| c.title.as_str()),
            Some("zero")
        );
        assert_eq!(
            select_best_match("q", None, &candidates, 10).map(|c| c.title.as_str()),
            Some("zero")
        );
    }

    #[test]
    fn test_never_exceeds_tolerance() {
        let candidates: Vec<_> = (0..60)
            .map(|d| candidate(&format!("c{}", d), Some(170 + d)))
            .collect();
        for tolerance in [0, 3, 10, 25] {
            if let Some(best) = select_best_match("q", Some(200), &candidates, tolerance) {
                let diff = best.duration_seconds.unwrap().abs_diff(200);
                assert!(diff <= tolerance);
                assert_eq!(diff, 0);
            }
        }
    }
}
