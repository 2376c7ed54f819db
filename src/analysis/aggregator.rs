//! Hit aggregation and ranking.
//!
//! This module folds per-path daily hits into a date-indexed series and
//! ranks paths by their total count.

use crate::models::{Aggregate, DailyTotal, HitRecord, TopPage};
use std::collections::HashMap;

/// Number of pages shown in the top-pages chart.
pub const TOP_PAGES: usize = 10;

/// Aggregate hit records into daily totals and the top `top_n` pages.
///
/// Days are sorted lexicographically, which is chronological for
/// `YYYY-MM-DD`. Days without hits are not filled in. Pages with equal
/// counts keep their input order.
pub fn aggregate(hits: &[HitRecord], top_n: usize) -> Aggregate {
    Aggregate {
        daily: daily_totals(hits),
        top_pages: top_pages(hits, top_n),
    }
}

/// Sum the daily hits of every path per calendar day.
pub fn daily_totals(hits: &[HitRecord]) -> Vec<DailyTotal> {
    let mut totals: HashMap<&str, u64> = HashMap::new();

    for stat in hits.iter().flat_map(HitRecord::daily_stats) {
        let total = totals.entry(stat.day.as_str()).or_default();
        *total = total.saturating_add(stat.daily);
    }

    let mut days: Vec<DailyTotal> = totals
        .into_iter()
        .map(|(day, count)| DailyTotal {
            day: day.to_string(),
            count,
        })
        .collect();

    days.sort_unstable_by(|a, b| a.day.cmp(&b.day));
    days
}

/// Rank records by count (highest first) and keep the first `n`.
pub fn top_pages(hits: &[HitRecord], n: usize) -> Vec<TopPage> {
    let mut ranked: Vec<&HitRecord> = hits.iter().collect();
    // Stable sort so ties stay in response order.
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(n);

    ranked
        .into_iter()
        .map(|hit| TopPage {
            path: hit.path.clone(),
            count: hit.count,
        })
        .collect()
}

/// Total visits across the daily series.
pub fn total_visits(aggregate: &Aggregate) -> u64 {
    aggregate
        .daily
        .iter()
        .fold(0u64, |acc, d| acc.saturating_add(d.count))
}

/// The earliest day with the highest visit count.
pub fn busiest_day(aggregate: &Aggregate) -> Option<&DailyTotal> {
    aggregate
        .daily
        .iter()
        .fold(None, |best: Option<&DailyTotal>, day| match best {
            Some(b) if b.count >= day.count => Some(b),
            _ => Some(day),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DailyStat;

    fn hit(path: &str, count: u64, stats: &[(&str, u64)]) -> HitRecord {
        HitRecord {
            path: path.to_string(),
            count,
            stats: Some(
                stats
                    .iter()
                    .map(|(day, daily)| DailyStat {
                        day: day.to_string(),
                        daily: *daily,
                    })
                    .collect(),
            ),
        }
    }

    fn sample() -> Vec<HitRecord> {
        vec![
            hit("/a", 5, &[("2024-01-01", 3)]),
            hit("/b", 2, &[("2024-01-01", 2), ("2024-01-02", 1)]),
        ]
    }

    #[test]
    fn test_aggregate_example() {
        let result = aggregate(&sample(), TOP_PAGES);

        assert_eq!(
            result.daily,
            vec![
                DailyTotal {
                    day: "2024-01-01".to_string(),
                    count: 5
                },
                DailyTotal {
                    day: "2024-01-02".to_string(),
                    count: 1
                },
            ]
        );
        let top: Vec<_> = result
            .top_pages
            .iter()
            .map(|p| (p.path.as_str(), p.count))
            .collect();
        assert_eq!(top, vec![("/a", 5), ("/b", 2)]);
    }

    #[test]
    fn test_aggregate_empty() {
        let result = aggregate(&[], TOP_PAGES);
        assert!(result.daily.is_empty());
        assert!(result.top_pages.is_empty());
        assert!(result.is_empty());
    }

    #[test]
    fn test_days_sorted_and_unique() {
        let hits = vec![
            hit("/x", 1, &[("2024-03-10", 1), ("2024-02-28", 4)]),
            hit("/y", 1, &[("2024-03-01", 2), ("2024-03-10", 6)]),
            hit("/z", 1, &[("2023-12-31", 1)]),
        ];

        let days: Vec<_> = daily_totals(&hits).into_iter().map(|d| d.day).collect();
        assert_eq!(
            days,
            vec!["2023-12-31", "2024-02-28", "2024-03-01", "2024-03-10"]
        );
        assert!(days.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_no_zero_filling() {
        let hits = vec![hit("/a", 1, &[("2024-01-01", 1), ("2024-01-05", 1)])];
        assert_eq!(daily_totals(&hits).len(), 2);
    }

    #[test]
    fn test_conservation_of_daily_hits() {
        let hits = vec![
            hit("/a", 100, &[("2024-01-01", 7), ("2024-01-02", 11)]),
            hit("/b", 3, &[("2024-01-02", 5)]),
            HitRecord {
                path: "/c".to_string(),
                count: 9,
                stats: None,
            },
        ];

        let input_sum: u64 = hits
            .iter()
            .flat_map(HitRecord::daily_stats)
            .map(|s| s.daily)
            .sum();
        let result = aggregate(&hits, TOP_PAGES);
        assert_eq!(total_visits(&result), input_sum);
        assert_eq!(input_sum, 23);
    }

    #[test]
    fn test_top_pages_truncated_and_descending() {
        let hits: Vec<HitRecord> = (0..13)
            .map(|i| hit(&format!("/p{}", i), (i * 7 % 13) as u64, &[]))
            .collect();

        let top = top_pages(&hits, TOP_PAGES);
        assert_eq!(top.len(), TOP_PAGES);
        assert!(top.windows(2).all(|w| w[0].count >= w[1].count));
        assert_eq!(top[0].count, 12);
    }

    #[test]
    fn test_top_pages_fewer_than_limit() {
        let top = top_pages(&sample(), TOP_PAGES);
        assert_eq!(top.len(), 2);
    }

    #[test]
    fn test_top_pages_ties_keep_input_order() {
        let hits = vec![
            hit("/first", 4, &[]),
            hit("/big", 9, &[]),
            hit("/second", 4, &[]),
            hit("/third", 4, &[]),
        ];

        let paths: Vec<_> = top_pages(&hits, TOP_PAGES)
            .into_iter()
            .map(|p| p.path)
            .collect();
        assert_eq!(paths, vec!["/big", "/first", "/second", "/third"]);
    }

    #[test]
    fn test_count_need_not_match_daily_sum() {
        // Lifetime count of 1000 with only a handful of hits in the window.
        let hits = vec![hit("/old", 1000, &[("2024-01-01", 2)])];
        let result = aggregate(&hits, TOP_PAGES);
        assert_eq!(result.top_pages[0].count, 1000);
        assert_eq!(total_visits(&result), 2);
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let hits = sample();
        assert_eq!(aggregate(&hits, TOP_PAGES), aggregate(&hits, TOP_PAGES));
    }

    #[test]
    fn test_huge_counts_saturate() {
        let hits = vec![
            hit("/a", u64::MAX, &[("2024-01-01", u64::MAX)]),
            hit("/b", u64::MAX, &[("2024-01-01", u64::MAX), ("2024-01-02", 1)]),
        ];
        let result = aggregate(&hits, TOP_PAGES);

        assert_eq!(result.daily[0].count, u64::MAX);
        assert_eq!(result.daily[1].count, 1);
        assert_eq!(total_visits(&result), u64::MAX);
    }

    #[test]
    fn test_busiest_day() {
        let hits = vec![hit(
            "/a",
            1,
            &[("2024-01-01", 2), ("2024-01-02", 8), ("2024-01-03", 8)],
        )];
        let result = aggregate(&hits, TOP_PAGES);

        let busiest = busiest_day(&result).unwrap();
        assert_eq!(busiest.day, "2024-01-02");
        assert!(busiest_day(&Aggregate::default()).is_none());
    }
}
