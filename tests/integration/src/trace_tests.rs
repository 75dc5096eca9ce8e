//! Every sample trace replayed end to end with the shipped rules

use pretty_assertions::assert_eq;
use rstest::rstest;
use shuffle_test_utils::TestShare;
use shuffle_test_utils::fixtures::{load_trace, trace_names};

#[rstest]
#[case::word_2003("word2003")]
#[case::word_2003_with_lock_file("word2003-lock-file")]
#[case::word_2007("word2007")]
#[case::word_2007_with_lock_file("word2007-lock-file")]
#[case::framemaker("framemaker")]
#[case::vi("vi")]
#[case::mac_lock_file("mac-lock-file")]
#[case::mac_word("mac-word")]
#[case::temp_folder("temp-folder")]
#[case::textedit("textedit")]
fn test_sample_trace_preserves_the_original(#[case] name: &str) {
    let trace = load_trace(name);
    let mut share = TestShare::new();
    let report = share.replay(&trace);

    let failed_steps: Vec<_> = report
        .steps
        .iter()
        .filter_map(|record| record.error.as_ref().map(|e| format!("{}: {e}", record.step)))
        .collect();
    assert_eq!(failed_steps, Vec::<String>::new(), "steps failed in {name}");
    assert_eq!(report.failures, Vec::<String>::new(), "expectations failed in {name}");
}

#[test]
fn test_every_sample_trace_is_covered() {
    assert_eq!(
        trace_names(),
        vec![
            "framemaker",
            "mac-lock-file",
            "mac-word",
            "temp-folder",
            "textedit",
            "vi",
            "word2003",
            "word2003-lock-file",
            "word2007",
            "word2007-lock-file",
        ]
    );
}

#[test]
fn test_sample_traces_leave_no_open_handles() {
    for name in trace_names() {
        let trace = load_trace(&name);
        let mut share = TestShare::new();
        share.replay(&trace);
        assert_eq!(
            share.replayer().repository().open_handles(),
            0,
            "handles left open by {name}"
        );
    }
}
