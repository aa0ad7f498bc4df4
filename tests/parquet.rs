use parl_discourse::data::{
    embedded::{
        read_embedding_table, read_vocab_table, write_embedded_speeches, write_vocab_table,
    },
    parties::Block,
    speeches::{read_parquet, write_parquet, SpeechRecord, SpeechTable},
};
use tempfile::tempdir;

fn sample() -> SpeechTable {
    let mut a = SpeechRecord::new("Text a", "Translated a", "PPE", "2019-07-02", 9);
    a.agenda = "Asylum 2019-07-02".into();
    a.speech_number = 3;
    a.written = true;
    a.year = Some(2019);
    a.block = Some(Block::ChristianConservative);
    a.migration_prob = Some(0.5);
    let mut b = SpeechRecord::new("Text b", "Translated b", "ENF/ID", "2020-01-15", 9);
    b.year = Some(2020);
    b.block = Some(Block::ExtremeRight);
    b.migration_prob = Some(0.75);
    SpeechTable::new(vec![a, b])
}

#[test]
fn speech_table_round_trips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("final/migration.parquet");
    let table = sample();
    write_parquet(&table, &path).unwrap();
    assert_eq!(read_parquet(&path).unwrap(), table);
}

#[test]
fn missing_column_is_reported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("vocab.parquet");
    write_vocab_table(&["asylum".into()], &[vec![0.1, 0.2]], "model", &path).unwrap();
    let err = read_parquet(&path).unwrap_err();
    assert!(err.to_string().contains("text"), "{err}");
}

#[test]
fn embedding_tables_round_trip() {
    let dir = tempdir().unwrap();
    let speeches = dir.path().join("embedded.parquet");
    let table = sample();
    let vectors = vec![vec![0.5_f32, -1.0, 2.0], vec![1.5, 0.0, -0.25]];
    write_embedded_speeches(&table, &vectors, "model", &speeches).unwrap();

    let loaded = read_embedding_table(&speeches, "model", "party").unwrap();
    assert_eq!(loaded.labels, vec!["PPE".to_string(), "ENF/ID".to_string()]);
    assert_eq!(loaded.dates[1], "2020-01-15");
    assert_eq!(loaded.weights, Some(vec![0.5, 0.75]));
    assert_eq!(loaded.matrix.dim(), (2, 3));
    assert_eq!(loaded.matrix[[1, 3 - 1]], -0.25);

    let by_block = read_embedding_table(&speeches, "model", "block").unwrap();
    assert_eq!(by_block.labels[1], "(extreme)_right");

    let vocab = dir.path().join("vocab.parquet");
    write_vocab_table(
        &["asylum".into(), "border".into()],
        &[vec![1.0, 0.0], vec![0.0, 1.0]],
        "model",
        &vocab,
    )
    .unwrap();
    let words = read_vocab_table(&vocab, "model").unwrap();
    assert_eq!(words.words, vec!["asylum".to_string(), "border".to_string()]);
    assert_eq!(words.matrix[[1, 1]], 1.0);
}

#[test]
fn row_count_mismatch_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.parquet");
    assert!(write_embedded_speeches(&sample(), &[vec![1.0]], "model", &path).is_err());
}
