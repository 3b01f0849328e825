//! Property-based tests for cleaning, reconstruction and anomaly detection.

use proptest::prelude::*;
use rounding_trace::data::analyzer::{
    detect_anomalies, gradient, reconstruct_derivatives, CheckedChannels, ExactDerivative,
};
use rounding_trace::data::loader::load_trace_from_reader;
use rounding_trace::Trace;

fn cell() -> impl Strategy<Value = String> {
    prop_oneof![
        8 => (-1.0e3..1.0e3f64).prop_map(|v| v.to_string()),
        1 => Just("nan".to_string()),
        1 => Just("inf".to_string()),
        1 => Just("x".to_string()),
        1 => Just(String::new()),
    ]
}

fn uniform_trace(u: Vec<f64>, h: f64) -> Trace {
    let t: Vec<f64> = (0..u.len()).map(|i| i as f64 * h).collect();
    Trace::new(vec![("t".to_string(), t), ("u_sr".to_string(), u)]).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_cleaned_trace_is_finite_and_rectangular(
        rows in prop::collection::vec(prop::collection::vec(cell(), 3), 0..40)
    ) {
        let mut text = String::from("t,u,v\n");
        for row in &rows {
            text.push_str(&row.join(","));
            text.push('\n');
        }
        let trace = load_trace_from_reader(text.as_bytes(), None).unwrap();

        prop_assert!(trace.len() <= rows.len());
        for name in trace.channel_names() {
            let samples = trace.channel(name).unwrap();
            prop_assert_eq!(samples.len(), trace.len());
            prop_assert!(samples.iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn prop_reconstruction_preserves_length(
        u in prop::collection::vec(-2.0..2.0f64, 2..200),
        h in 1.0e-3..1.0f64,
    ) {
        let trace = uniform_trace(u, h);
        let primaries = ["u_sr".to_string()];
        let out = reconstruct_derivatives(&trace, &primaries, ExactDerivative::Analytic).unwrap();
        prop_assert_eq!(out.len(), trace.len());
        prop_assert_eq!(out.channel("v_sr").unwrap().len(), trace.len());
        prop_assert_eq!(out.channel("u_sr"), trace.channel("u_sr"));
    }

    #[test]
    fn prop_gradient_of_line_is_its_slope(
        slope in -10.0..10.0f64,
        offset in -10.0..10.0f64,
        n in 2usize..50,
    ) {
        let t: Vec<f64> = (0..n).map(|i| i as f64 * 0.5).collect();
        let u: Vec<f64> = t.iter().map(|x| slope * x + offset).collect();
        for v in gradient(&t, &u).unwrap() {
            prop_assert!((v - slope).abs() < 1e-9);
        }
    }

    #[test]
    fn prop_threshold_monotone(
        v in prop::collection::vec(-20.0..20.0f64, 0..100),
        low in 0.0..10.0f64,
        delta in 0.0..10.0f64,
    ) {
        let trace = Trace::new(vec![("v_rne".to_string(), v)]).unwrap();
        let loose = detect_anomalies(&trace, low + delta, &CheckedChannels::Derivatives);
        let tight = detect_anomalies(&trace, low, &CheckedChannels::Derivatives);
        prop_assert!(loose.len() <= tight.len());
    }
}
