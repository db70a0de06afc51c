//! Behavioural properties of the suitability ranker.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;

use agrisense_common::{Recommendation, SoilReading};
use agrisense_ranker::{
    FileModelStore, MemoryModelStore, ModelStore, RankerSettings, SuitabilityRanker, TrainOutcome,
};
use agrisense_test_utils::{
    example, four_crop_examples, repeated, single_crop_examples, soil, tomato_corn_examples, CORN_SOIL,
    TOMATO_SOIL,
};

fn memory_ranker() -> SuitabilityRanker {
    SuitabilityRanker::new(Arc::new(MemoryModelStore::new()), RankerSettings::default())
}

fn names(recs: &[Recommendation]) -> Vec<String> {
    recs.iter().map(|r| r.name.clone()).collect()
}

#[test]
fn untrained_returns_single_sentinel() {
    let ranker = memory_ranker();
    for reading in [TOMATO_SOIL, CORN_SOIL, soil(-5.0, 0.0, 100.0, 14.0)] {
        let recs = ranker.predict(&reading);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].name, "Model not trained");
        assert_eq!(recs[0].confidence, 0.0);
        assert_eq!(recs[0].justification, "Please train the model first");
    }
    assert!(!ranker.is_trained());
}

#[test]
fn two_labels_train_successfully() {
    let ranker = memory_ranker();
    let outcome = ranker.train(&tomato_corn_examples());
    assert!(outcome.succeeded());
    assert!(ranker.is_trained());
    match outcome {
        TrainOutcome::Trained { classes, persist_error, .. } => {
            assert_eq!(classes, vec!["Corn".to_string(), "Tomato".to_string()]);
            assert!(persist_error.is_none());
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[test]
fn single_label_fails_and_stays_untrained() {
    let ranker = memory_ranker();
    let outcome = ranker.train(&single_crop_examples());
    assert!(!outcome.succeeded());
    assert!(!ranker.is_trained());
    assert_eq!(ranker.predict(&TOMATO_SOIL)[0].name, "Model not trained");
}

#[test]
fn degenerate_feature_fails() {
    let ranker = memory_ranker();
    // pH identical everywhere
    let examples = vec![
        example(soil(20.0, 50.0, 40.0, 6.0), "Tomato"),
        example(soil(35.0, 30.0, 20.0, 6.0), "Corn"),
    ];
    assert!(!ranker.train(&examples).succeeded());
    assert!(!ranker.is_trained());
}

#[test]
fn failed_train_keeps_previous_pair() {
    let ranker = memory_ranker();
    assert!(ranker.train(&tomato_corn_examples()).succeeded());
    let before = ranker.predict(&TOMATO_SOIL);
    let run_before = ranker.status().run_id;

    assert!(!ranker.train(&single_crop_examples()).succeeded());
    assert!(!ranker.train(&[]).succeeded());

    assert_eq!(ranker.predict(&TOMATO_SOIL), before);
    assert_eq!(ranker.status().run_id, run_before);
}

#[test]
fn predict_is_idempotent() {
    let ranker = memory_ranker();
    assert!(ranker.train(&four_crop_examples(7)).succeeded());
    let reading = soil(24.0, 48.0, 35.0, 6.6);
    assert_eq!(ranker.predict(&reading), ranker.predict(&reading));
}

#[test]
fn output_is_sorted_bounded_and_thresholded() {
    let ranker = memory_ranker();
    assert!(ranker.train(&four_crop_examples(11)).succeeded());

    let readings = [
        TOMATO_SOIL,
        CORN_SOIL,
        soil(28.0, 85.0, 75.0, 5.5),
        soil(15.0, 45.0, 30.0, 7.0),
        soil(25.0, 55.0, 45.0, 6.5),
        soil(22.0, 65.0, 50.0, 6.3),
    ];
    for reading in readings {
        let recs = ranker.predict(&reading);
        assert!(recs.len() <= 3);
        assert!(recs.iter().all(|r| r.confidence > 0.10 && r.confidence <= 1.0));
        assert!(recs.windows(2).all(|w| w[0].confidence >= w[1].confidence));
        assert!(recs.iter().all(|r| !r.is_sentinel()));
    }
}

#[test]
fn all_low_confidences_give_empty_list_not_sentinel() {
    // Twelve crops on two hexagons around a common centre: one in the
    // temperature/humidity plane, one in the moisture/pH plane. At the
    // centre every crop is equally likely (1/12), below the 0.10 cut.
    let centre = soil(25.0, 60.0, 45.0, 6.5);
    let mut examples = Vec::new();
    for k in 0..6 {
        let angle = k as f64 * std::f64::consts::PI / 3.0;
        let (c, s) = (angle.cos(), angle.sin());
        let warm = soil(centre.temperature + 5.0 * c, centre.humidity + 10.0 * s, centre.soil_moisture, centre.soil_ph);
        let wet = soil(centre.temperature, centre.humidity, centre.soil_moisture + 10.0 * c, centre.soil_ph + 0.5 * s);
        examples.extend(repeated(warm, &format!("Crop{:02}", k), 5));
        examples.extend(repeated(wet, &format!("Crop{:02}", k + 6), 5));
    }

    let ranker = memory_ranker();
    assert!(ranker.train(&examples).succeeded());
    assert_eq!(ranker.status().classes.len(), 12);

    let recs = ranker.predict(&centre);
    assert!(recs.is_empty(), "expected no recommendations, got {:?}", names(&recs));
}

#[test]
fn tomato_scenario() {
    let ranker = memory_ranker();
    assert!(ranker.train(&tomato_corn_examples()).succeeded());

    let recs = ranker.predict(&TOMATO_SOIL);
    assert!(!recs.is_empty());
    assert_eq!(recs[0].name, "Tomato");
    assert!(recs[0].confidence > 0.5, "confidence was {}", recs[0].confidence);
    assert_eq!(
        recs[0].justification,
        "Current conditions (Temp: 20.0°C, Humidity: 50.0%, Moisture: 40.0%, pH: 6.0) are suitable for Tomato"
    );

    let recs = ranker.predict(&CORN_SOIL);
    assert_eq!(recs[0].name, "Corn");
}

#[test]
fn non_finite_reading_yields_error_sentinel() {
    let ranker = memory_ranker();
    assert!(ranker.train(&tomato_corn_examples()).succeeded());

    let recs = ranker.predict(&SoilReading::new(20.0, 50.0, f64::NAN, 6.0));
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].name, "Error");
    assert_eq!(recs[0].confidence, 0.0);
    assert!(recs[0].justification.starts_with("Error making prediction: "));
    assert!(recs[0].justification.contains("soil_moisture"));
}

#[test]
fn persisted_pair_reloads_trained() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileModelStore::new(
        dir.path().join("crop_recommendation_model.json"),
        dir.path().join("crop_scaler.json"),
    ));

    let first = SuitabilityRanker::load(store.clone(), RankerSettings::default());
    assert!(!first.is_trained());
    assert!(first.train(&four_crop_examples(3)).succeeded());

    let second = SuitabilityRanker::load(store, RankerSettings::default());
    assert!(second.is_trained());
    assert_eq!(second.status().run_id, first.status().run_id);

    let reading = soil(21.0, 52.0, 38.0, 6.2);
    let a = first.predict(&reading);
    let b = second.predict(&reading);
    assert_eq!(names(&a), names(&b));
    for (x, y) in a.iter().zip(&b) {
        assert!((x.confidence - y.confidence).abs() < 1e-9);
    }
}

#[test]
fn mismatched_artifacts_load_untrained() {
    let a = Arc::new(MemoryModelStore::new());
    let b = Arc::new(MemoryModelStore::new());
    assert!(SuitabilityRanker::new(a.clone(), RankerSettings::default()).train(&tomato_corn_examples()).succeeded());
    assert!(SuitabilityRanker::new(b.clone(), RankerSettings::default()).train(&tomato_corn_examples()).succeeded());

    let (scaler_a, _) = a.stored().unwrap();
    let (_, classifier_b) = b.stored().unwrap();
    let mixed = Arc::new(MemoryModelStore::with_pair(scaler_a, classifier_b));

    let ranker = SuitabilityRanker::load(mixed, RankerSettings::default());
    assert!(!ranker.is_trained());
}

#[test]
fn save_failure_is_reported_but_model_kept() {
    let ranker = SuitabilityRanker::new(Arc::new(MemoryModelStore::failing()), RankerSettings::default());
    let outcome = ranker.train(&tomato_corn_examples());
    assert!(outcome.succeeded());
    assert!(matches!(outcome, TrainOutcome::Trained { persist_error: Some(_), .. }));
    assert_eq!(ranker.predict(&TOMATO_SOIL)[0].name, "Tomato");
}

#[test]
fn successful_train_overwrites_store() {
    let store = Arc::new(MemoryModelStore::new());
    let ranker = SuitabilityRanker::new(store.clone(), RankerSettings::default());
    assert!(ranker.train(&tomato_corn_examples()).succeeded());
    let first = store.stored().unwrap().1.run_id;
    assert!(ranker.train(&four_crop_examples(5)).succeeded());
    let (scaler, classifier) = store.load().unwrap().unwrap();
    assert_ne!(classifier.run_id, first);
    assert_eq!(scaler.run_id, classifier.run_id);
}

#[test]
fn concurrent_readers_never_see_a_mixed_pair() {
    let ranker = Arc::new(memory_ranker());
    let set_a = tomato_corn_examples();
    let mut set_b = repeated(soil(28.0, 85.0, 75.0, 5.5), "Rice", 10);
    set_b.extend(repeated(soil(15.0, 45.0, 30.0, 7.0), "Wheat", 10));
    assert!(ranker.train(&set_a).succeeded());

    let classes_a: BTreeSet<String> = ["Corn", "Tomato"].iter().map(|s| s.to_string()).collect();
    let classes_b: BTreeSet<String> = ["Rice", "Wheat"].iter().map(|s| s.to_string()).collect();

    let writer = {
        let ranker = Arc::clone(&ranker);
        thread::spawn(move || {
            for i in 0..10 {
                let set = if i % 2 == 0 { &set_b } else { &set_a };
                assert!(ranker.train(set).succeeded());
                // failing trains interleaved with the good ones
                assert!(!ranker.train(&single_crop_examples()).succeeded());
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let ranker = Arc::clone(&ranker);
            let (classes_a, classes_b) = (classes_a.clone(), classes_b.clone());
            thread::spawn(move || {
                for _ in 0..200 {
                    let recs = ranker.predict(&soil(24.0, 55.0, 45.0, 6.4));
                    assert!(recs.iter().all(|r| !r.is_sentinel()));
                    let seen: BTreeSet<String> = recs.into_iter().map(|r| r.name).collect();
                    assert!(
                        seen.is_subset(&classes_a) || seen.is_subset(&classes_b),
                        "mixed classes {:?}",
                        seen
                    );
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for r in readers {
        r.join().unwrap();
    }
}
