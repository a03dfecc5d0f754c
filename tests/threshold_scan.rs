mod common;

use approx::assert_relative_eq;
use ordered_float::OrderedFloat;

use trackqc::analysis::dedup::deduplicate;
use trackqc::analysis::histogram::HistogramSink;
use trackqc::analysis::metrics::MetricTable;
use trackqc::analysis::params::ScanParams;
use trackqc::analysis::report::CsvCutFlowWriter;
use trackqc::analysis::scanner::ThresholdScanner;
use trackqc::tracks::track_store::{TrackFile, TrackSource, TrackStore};
use trackqc::tracks::Track;

use common::{scenario_store, scenario_table, track};

#[test]
fn test_two_event_scenario() {
    let store = scenario_store();
    let scanner = ThresholdScanner::new(scenario_table(), ScanParams::default()).unwrap();
    let mut sink = HistogramSink::new(scanner.table().clone());

    let outcome = scanner.run(&store, &mut sink).unwrap();

    assert_eq!(outcome.thresholds.len(), 1);
    let flows = &outcome.thresholds[&OrderedFloat(0.9)];
    assert_eq!(flows.len(), 2);
    assert_eq!(
        flows[&1].cut_flow.iter().collect::<Vec<_>>(),
        vec![("matchingDegree", 3), ("ndf", 3), ("chi2ndf", 2)]
    );
    assert_eq!(
        flows[&2].cut_flow.iter().collect::<Vec<_>>(),
        vec![("matchingDegree", 1), ("ndf", 0), ("chi2ndf", 0)]
    );

    let summary = sink.summary(0.9).unwrap();
    let means: Vec<f64> = summary.iter().map(|c| c.mean).collect();
    assert_eq!(means, vec![2.0, 1.5, 1.0]);

    let chi2ndf = summary.get("chi2ndf").unwrap();
    assert_eq!((chi2ndf.accept, chi2ndf.reject), (1, 1));
    assert_relative_eq!(chi2ndf.efficiency(), 0.5);
    assert!((chi2ndf.ci_low - chi2ndf.ci_high).abs() <= 1e-4);

    // Every event has a survivor at the first cut
    let matching = summary.get("matchingDegree").unwrap();
    assert_eq!((matching.accept, matching.reject), (2, 0));
    assert_eq!(matching.ci_high, 0.0);

    // Only the two accepted tracks of event 1 reach the histograms
    let histograms = sink.histograms(0.9).unwrap();
    assert_eq!(histograms.get("ndf_0.9").unwrap().entries(), 2);
    assert_eq!(histograms.get("chi2ndf_0.9").unwrap().bins()[1], 2);
    assert_eq!(histograms.get("chi2ndf_0.9").unwrap().bins()[2], 0);

    assert_eq!(outcome.report.accepted_tracks, 2);
    assert_eq!(outcome.report.events, 2);
    assert_relative_eq!(outcome.report.tracks_per_event(), 1.0);
}

#[test]
fn test_categorical_thresholds() {
    let mut store = TrackStore::new_from_vec(vec![
        track(1, 0, 0.5, 8.0, 8),
        track(1, 1, 1.0, 8.0, 8),
        track(2, 0, 1.0, 24.0, 8),
        track(3, 0, 0.5, 8.0, 8),
    ]);
    // A trackless event still counts in every denominator
    store.insert_empty_event(4);

    let scanner = ThresholdScanner::new(scenario_table(), ScanParams::default()).unwrap();
    assert_eq!(scanner.scan_values(&store).unwrap(), vec![0.5, 1.0]);

    let mut sink = CsvCutFlowWriter::new(Vec::new());
    let outcome = scanner.run(&store, &mut sink).unwrap();

    for flows in outcome.thresholds.values() {
        assert_eq!(flows.len(), 4);
        assert_eq!(flows[&4].count("matchingDegree"), 0);
    }

    let half = &outcome.summaries[&OrderedFloat(0.5)];
    assert_relative_eq!(half.get("chi2ndf").unwrap().mean, 0.5);
    assert_eq!(half.get("chi2ndf").unwrap().accept, 2);

    let one = &outcome.summaries[&OrderedFloat(1.0)];
    assert_relative_eq!(one.get("matchingDegree").unwrap().mean, 0.5);
    assert_relative_eq!(one.get("chi2ndf").unwrap().mean, 0.25);

    let csv = String::from_utf8(sink.into_inner().unwrap()).unwrap();
    let rows: Vec<&str> = csv.lines().collect();
    assert_eq!(rows[0], "threshold,cut,mean,ci_low,ci_high,accept,reject");
    assert_eq!(rows.len(), 1 + 2 * 3);
    assert!(rows[1].starts_with("0.5,matchingDegree,0.5,"));
    assert!(rows[4].starts_with("1.0,matchingDegree,0.5,"));
}

#[test]
fn test_scan_is_deterministic() {
    let store = scenario_store();
    let scanner = ThresholdScanner::new(MetricTable::default(), ScanParams::default()).unwrap();

    let run = || {
        let mut sink = (
            CsvCutFlowWriter::new(Vec::new()),
            HistogramSink::new(MetricTable::default()),
        );
        let outcome = scanner.run(&store, &mut sink).unwrap();
        (outcome, sink.0.into_inner().unwrap())
    };

    let (first, first_csv) = run();
    let (second, second_csv) = run();
    assert_eq!(first.thresholds, second.thresholds);
    assert_eq!(first_csv, second_csv);
}

/// Events with several ambiguous candidates, built without randomness.
fn crowded_events() -> Vec<Vec<Track>> {
    (0..20u32)
        .map(|event| {
            let n = 2 + (event % 5) as i32;
            (0..n)
                .map(|id| {
                    let chi2 = f64::from((event * 7 + id as u32 * 13) % 11) + 1.0;
                    let mut t = track(event, id, 1.0, chi2, 8);
                    // Every third track reuses the first hit of track 0
                    if id % 3 == 2 {
                        t.track_hits[0] = track(event, 0, 1.0, 1.0, 8).track_hits[0];
                    }
                    t
                })
                .collect()
        })
        .collect()
}

#[test]
fn test_deduplication_invariants() {
    for mut tracks in crowded_events() {
        let before: Vec<i32> = tracks.iter().map(|t| t.track_id).collect();
        deduplicate(&mut tracks);

        // Cardinality and order preserved
        assert_eq!(tracks.iter().map(|t| t.track_id).collect::<Vec<_>>(), before);

        // Exactly one best track, with the minimum ratio, first on ties
        let unflagged: Vec<&Track> = tracks.iter().filter(|t| !t.is_multiple).collect();
        assert_eq!(unflagged.len(), 1);
        let min = tracks
            .iter()
            .map(|t| t.chi2_ndf())
            .fold(f64::INFINITY, f64::min);
        let first_min = tracks.iter().find(|t| t.chi2_ndf() == min).unwrap();
        assert_eq!(unflagged[0].track_id, first_min.track_id);

        // Only tracks sharing a hit with track 0 can be overlap-flagged
        for t in tracks.iter().filter(|t| t.is_overlap) {
            assert!(t.track_id == 0 || t.track_id % 3 == 2);
        }
    }
}

#[test]
fn test_store_is_not_mutated_by_scan() {
    let store = TrackStore::new_from_vec(crowded_events().into_iter().flatten().collect());
    let before = store.clone();

    let scanner = ThresholdScanner::new(MetricTable::default(), ScanParams::default()).unwrap();
    let mut sink = HistogramSink::new(MetricTable::default());
    let outcome = scanner.run(&store, &mut sink).unwrap();

    assert_eq!(store, before);
    assert!(store.all_tracks().unwrap().iter().all(|t| !t.is_multiple));

    // One accepted track at most per event: the best fit, if no better overlap exists
    let flows = &outcome.thresholds[&OrderedFloat(1.0)];
    assert!(flows.values().all(|s| s.count("chi2ndf") <= 1));
    assert!(flows.values().all(|s| s.cut_flow.is_non_increasing()));
}
