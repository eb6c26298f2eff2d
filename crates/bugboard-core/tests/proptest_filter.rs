use bugboard_core::cache::ReportCache;
use bugboard_core::filter::{self, FilterQuery, StatusSelector};
use bugboard_core::model::{Report, Status};
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

fn arb_status() -> impl Strategy<Value = Status> {
    prop::sample::select(Status::ALL.to_vec())
}

fn arb_selector() -> impl Strategy<Value = StatusSelector> {
    prop_oneof![
        Just(StatusSelector::All),
        arb_status().prop_map(StatusSelector::Only),
    ]
}

// Small alphabet so searches actually hit.
fn arb_text() -> impl Strategy<Value = String> {
    "[abcAB ]{0,8}"
}

fn arb_reports() -> impl Strategy<Value = Vec<Report>> {
    prop::collection::vec(
        (
            arb_text(),
            prop::option::of(arb_text()),
            prop::option::of(arb_text()),
            arb_status(),
        ),
        0..24,
    )
    .prop_map(|rows| {
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        rows.into_iter()
            .enumerate()
            .map(|(i, (title, description, reporter, status))| Report {
                id: format!("r{i}"),
                title,
                description,
                reporter,
                created_at: base - Duration::minutes(i as i64),
                status,
                notes: vec![],
            })
            .collect()
    })
}

fn expected_match(report: &Report, query: &FilterQuery) -> bool {
    let needle = query.search.trim().to_lowercase();
    let contains = |field: &str| field.to_lowercase().contains(&needle);
    query.status.matches(report.status)
        && (needle.is_empty()
            || contains(&report.title)
            || report.description.as_deref().is_some_and(contains)
            || report.reporter.as_deref().is_some_and(contains))
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(512))]

    #[test]
    fn filter_keeps_exactly_the_matching_reports_in_order(
        reports in arb_reports(),
        search in arb_text(),
        status in arb_selector(),
    ) {
        let query = FilterQuery::new(search, status);
        let view = filter::apply(&reports, &query);

        let expected: Vec<&str> = reports
            .iter()
            .filter(|r| expected_match(r, &query))
            .map(|r| r.id.as_str())
            .collect();
        let got: Vec<&str> = view.reports.iter().map(|r| r.id.as_str()).collect();

        prop_assert_eq!(got, expected);
        prop_assert_eq!(view.matched, view.reports.len());
        prop_assert_eq!(view.total, reports.len());
    }

    #[test]
    fn filtering_twice_changes_nothing(
        reports in arb_reports(),
        search in arb_text(),
        status in arb_selector(),
    ) {
        let query = FilterQuery::new(search, status);
        let once: Vec<Report> = filter::apply(&reports, &query)
            .reports
            .into_iter()
            .cloned()
            .collect();
        let twice = filter::apply(&once, &query);
        prop_assert_eq!(twice.matched, once.len());
    }

    #[test]
    fn search_ignores_case(reports in arb_reports(), search in arb_text()) {
        let lower = filter::apply(&reports, &FilterQuery::new(search.to_lowercase(), StatusSelector::All));
        let upper = filter::apply(&reports, &FilterQuery::new(search.to_uppercase(), StatusSelector::All));
        prop_assert_eq!(lower.reports, upper.reports);
    }

    #[test]
    fn status_counts_partition_the_cache(reports in arb_reports()) {
        let mut cache = ReportCache::new();
        cache.replace_all(reports.clone());
        let stats = cache.stats();

        prop_assert_eq!(stats.total(), cache.len());
        for status in Status::ALL {
            let only = filter::apply(cache.reports(), &FilterQuery::new("", StatusSelector::Only(status)));
            prop_assert_eq!(stats.get(status), only.matched);
        }
    }
}
