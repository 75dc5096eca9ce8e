//! Behaviour that spans folders and the shared session store

use pretty_assertions::assert_eq;
use shuffle_test_utils::TestShare;

const TEMP_DELETE_ONLY: &str = r#"
[session]
capacity = 1

[[scenario]]
kind = "temp-delete-shuffle"
pattern = '.*[\\/]\.TemporaryItems[\\/].*'
"#;

#[test]
fn test_folders_shuffle_independently() {
    let mut share = TestShare::new();
    let a = share.seed(r"\a\report.doc", "a1");
    let b = share.seed(r"\b\report.doc", "b1");

    share.write_new(r"\a\~WRD0001.TMP", "a2");
    share.write_new(r"\b\~WRD0001.TMP", "b2");
    let replayer = share.replayer();
    replayer.rename(r"\a\report.doc", r"\a\~WRL0001.TMP");
    replayer.rename(r"\b\report.doc", r"\b\~WRL0001.TMP");
    replayer.rename(r"\a\~WRD0001.TMP", r"\a\report.doc");
    replayer.rename(r"\b\~WRD0001.TMP", r"\b\report.doc");
    replayer.delete(r"\a\~WRL0001.TMP");
    replayer.delete(r"\b\~WRL0001.TMP");

    share.assert_node(r"\a\report.doc", &a);
    share.assert_node(r"\b\report.doc", &b);
    share.assert_content(r"\a\report.doc", "a2");
    share.assert_content(r"\b\report.doc", "b2");
    share.assert_absent(r"\a\~WRL0001.TMP");
    share.assert_absent(r"\b\~WRL0001.TMP");
}

#[test]
fn test_temp_file_links_across_folders() {
    let mut share = TestShare::with_rules(TEMP_DELETE_ONLY);
    assert!(share.has_custom_rules());
    let original = share.seed(r"\docs\a.docx", "a1");

    share.write_new(r"\.TemporaryItems\a.docx", "a2");
    let replayer = share.replayer();
    replayer.delete(r"\docs\a.docx");
    let moved = replayer.move_file(r"\.TemporaryItems\a.docx", r"\docs\a.docx");
    assert_eq!(moved.command.label(), "compound");

    share.assert_node(r"\docs\a.docx", &original);
    share.assert_content(r"\docs\a.docx", "a2");
    share.assert_absent(r"\.TemporaryItems\a.docx");
}

#[test]
fn test_evicted_temp_record_falls_back_to_literal_commands() {
    let mut share = TestShare::with_rules(TEMP_DELETE_ONLY);
    let a = share.seed(r"\docs\a.docx", "a1");
    let b = share.seed(r"\docs\b.docx", "b1");

    share.write_new(r"\.TemporaryItems\a.docx", "a2");
    share.write_new(r"\.TemporaryItems\b.docx", "b2");

    let replayer = share.replayer();
    replayer.delete(r"\docs\a.docx");
    replayer.move_file(r"\.TemporaryItems\a.docx", r"\docs\a.docx");
    replayer.delete(r"\docs\b.docx");
    replayer.move_file(r"\.TemporaryItems\b.docx", r"\docs\b.docx");

    let repo = share.replayer().repository();
    assert_ne!(repo.node_at(r"\docs\a.docx"), Some(a));
    share.assert_node(r"\docs\b.docx", &b);
    share.assert_content(r"\docs\a.docx", "a2");
    share.assert_content(r"\docs\b.docx", "b2");
}
