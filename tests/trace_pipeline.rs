//! End-to-end checks: CSV on disk → cleaned trace → analysis.

use std::io::Write;
use std::path::Path;

use rounding_trace::data::analyzer::{analyze, detect_anomalies, CheckedChannels};
use rounding_trace::data::loader::{detect_schema, load_any, load_trace};
use rounding_trace::{Schema, TraceError, ValidationConfig};
use tempfile::NamedTempFile;

fn csv_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}

/// A few forward-Euler steps of u' = v, v' = -u with h = 0.05.
fn oscillator_rows(header: bool) -> String {
    let mut out = String::new();
    if header {
        out.push_str("t,u_rne,v_rne,u_sr,v_sr,u_exact,v_exact\n");
    }
    let h = 0.05;
    let (mut u, mut v) = (1.0_f64, 0.0_f64);
    for k in 0..20 {
        let t = k as f64 * h;
        out.push_str(&format!(
            "{t},{u},{v},{u},{v},{},{}\n",
            t.cos(),
            -t.sin()
        ));
        let (du, dv) = (v, -u);
        u += h * du;
        v += h * dv;
    }
    out
}

#[test]
fn loading_twice_is_bit_identical() {
    let file = csv_file(&oscillator_rows(true));
    let a = load_trace(file.path(), None).unwrap();
    let b = load_trace(file.path(), None).unwrap();
    assert_eq!(a, b);
    for name in a.channel_names() {
        let bits_a: Vec<u64> = a.channel(name).unwrap().iter().map(|v| v.to_bits()).collect();
        let bits_b: Vec<u64> = b.channel(name).unwrap().iter().map(|v| v.to_bits()).collect();
        assert_eq!(bits_a, bits_b);
    }
}

#[test]
fn both_layouts_load_to_the_same_trace() {
    let headered = csv_file(&oscillator_rows(true));
    let headerless = csv_file(&oscillator_rows(false));

    assert_eq!(detect_schema(headered.path()).unwrap(), Schema::Headered);
    assert_eq!(detect_schema(headerless.path()).unwrap(), Schema::oscillator());

    let a = load_any(headered.path()).unwrap();
    let b = load_any(headerless.path()).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.len(), 20);
}

#[test]
fn corrupt_rows_never_survive() {
    let mut text = oscillator_rows(true);
    text.push_str("1.0,nan,0,0,0,0,0\n");
    text.push_str("1.05,0.1,garbage,0,0,0,0\n");
    text.push_str("1.1,0.1,0.2,inf,0,0,0\n");
    text.push_str("1.15,0.1,0.2\n");
    let file = csv_file(&text);

    let trace = load_trace(file.path(), None).unwrap();
    assert_eq!(trace.len(), 20);
    for name in trace.channel_names() {
        assert!(trace.channel(name).unwrap().iter().all(|v| v.is_finite()));
    }
}

#[test]
fn headerless_with_five_columns_is_schema_error() {
    let file = csv_file("0,1,0,1,0\n0.05,1,-0.05,1,-0.05\n");
    let err = load_trace(file.path(), Some(&Schema::oscillator())).unwrap_err();
    match err {
        TraceError::Schema { expected, actual } => {
            assert_eq!(expected, 7);
            assert_eq!(actual, 5);
        }
        other => panic!("expected schema error, got {other:?}"),
    }
}

#[test]
fn missing_file_is_io_error() {
    let err = load_trace(Path::new("/definitely/not/here.csv"), None).unwrap_err();
    assert!(matches!(err, TraceError::Io { .. }));
    assert!(err.to_string().contains("here.csv"));
}

#[test]
fn sr_only_file_reports_per_policy() {
    let file = csv_file("u_sr,v_sr\n0.9,0.1\n60,0.2\n0.8,-0.3\n");
    let trace = load_trace(file.path(), None).unwrap();

    let derivatives = detect_anomalies(&trace, 1.0, &CheckedChannels::Derivatives);
    assert!(derivatives.is_empty());

    let all = detect_anomalies(&trace, 1.0, &CheckedChannels::All);
    assert_eq!(all.len(), 1);
    assert_eq!(all.anomalies[0].index, 1);
    assert_eq!(all.anomalies[0].values, vec![60.0, 0.2]);
    assert_eq!(all.anomalies[0].exceeded, vec!["u_sr".to_string()]);
}

#[test]
fn position_only_file_gets_velocities() {
    // Original integrator dump without velocities.
    let mut text = String::from("t,u_rne,u_sr,u_exact\n");
    for k in 0..50 {
        let t = k as f64 * 0.01;
        text.push_str(&format!("{t},{},{},{}\n", t.cos(), t.cos(), t.cos()));
    }
    let file = csv_file(&text);
    let trace = load_trace(file.path(), None).unwrap();

    let analysis = analyze(&trace, &ValidationConfig::strict());
    let out = &analysis.trace;
    assert_eq!(out.len(), trace.len());
    for name in ["v_rne", "v_sr", "v_exact"] {
        assert_eq!(out.channel(name).map(<[f64]>::len), Some(trace.len()));
    }

    // closed form for the reference, finite difference for the rest
    let t = out.time().unwrap();
    let v_exact = out.channel("v_exact").unwrap();
    let v_rne = out.channel("v_rne").unwrap();
    for i in 0..t.len() {
        assert_eq!(v_exact[i], -t[i].sin());
        assert!((v_rne[i] + t[i].sin()).abs() < 1e-2);
    }

    assert!(analysis.report.is_empty());
    assert!(analysis.skipped.is_empty());
    assert_eq!(analysis.trace.phase_pairs().len(), 3);
    assert!(analysis.spacing.unwrap().uniform);
}

#[test]
fn untimed_file_reports_without_velocities() {
    // debug dump: no t column, one primary without its derivative
    let file = csv_file("u_rne,u_sr,v_sr\n0.9,0.9,0.1\n1.0,60,5.0\n");
    let trace = load_trace(file.path(), None).unwrap();

    let analysis = analyze(&trace, &ValidationConfig::strict());
    assert_eq!(analysis.trace, trace);
    assert_eq!(analysis.skipped.len(), 1);
    assert_eq!(analysis.skipped[0].channel, "u_rne");
    assert_eq!(analysis.report.len(), 1);
    assert_eq!(analysis.report.anomalies[0].index, 1);
    assert_eq!(analysis.report.anomalies[0].values, vec![1.0, 60.0, 5.0]);
}

#[test]
fn single_record_file_reports_without_velocities() {
    let file = csv_file("t,u_sr\n0,60\n");
    let trace = load_trace(file.path(), None).unwrap();

    let checked_all = ValidationConfig {
        checked: CheckedChannels::All,
        ..ValidationConfig::strict()
    };
    let analysis = analyze(&trace, &checked_all);
    assert_eq!(analysis.trace.len(), 1);
    assert_eq!(analysis.skipped[0].channel, "u_sr");
    assert!(analysis.skipped[0].reason.contains("at least 2 samples"));
    assert_eq!(analysis.report.len(), 1);
    assert_eq!(analysis.report.anomalies[0].exceeded, vec!["u_sr".to_string()]);
}

#[test]
fn headerless_file_with_corrupt_first_record_loads() {
    let mut text = String::from("0,garbage,0,1,0,1,0\n");
    text.push_str(&oscillator_rows(false).lines().skip(1).collect::<Vec<_>>().join("\n"));
    text.push('\n');
    let file = csv_file(&text);

    assert_eq!(detect_schema(file.path()).unwrap(), Schema::oscillator());
    let trace = load_any(file.path()).unwrap();
    assert_eq!(trace.len(), 19);
    assert_eq!(trace.time().unwrap()[0], 0.05);
}
