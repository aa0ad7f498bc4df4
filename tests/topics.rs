use std::io::Cursor;

use parl_discourse::{
    data::speeches::{SpeechRecord, SpeechTable},
    error::PipelineError,
    topics::{
        assign_topics,
        corpus::parse_matrix_market,
        lda::{digamma, LdaArtifact},
        migration_subset, top_speeches, Dictionary, LdaModel, TopicModel, TopicSource,
    },
};

fn model() -> LdaModel {
    LdaModel::from_artifact(LdaArtifact {
        num_topics: 2,
        alpha: vec![0.5, 0.5],
        vocabulary: ["migration", "border", "budget", "tax"]
            .map(String::from)
            .to_vec(),
        lambda: vec![vec![40.0, 30.0, 0.5, 0.5], vec![0.5, 0.5, 35.0, 25.0]],
    })
    .unwrap()
}

fn table(n: usize) -> SpeechTable {
    (0..n)
        .map(|i| SpeechRecord::new(format!("t{i}"), format!("t{i}"), "PPE", "2019-01-01", 9))
        .collect()
}

#[test]
fn distributions_sum_to_one() {
    let corpus = vec![vec![(0, 3.0), (1, 2.0)], vec![(2, 4.0), (3, 1.0)], vec![]];
    let out = assign_topics(table(3), &model(), &corpus).unwrap();
    for record in out.iter() {
        let dist = record.topics.as_ref().unwrap();
        assert_eq!(dist.len(), 2);
        let total: f32 = dist.as_slice().iter().sum();
        assert!((total - 1.0).abs() < 1e-6, "sum {total}");
        assert!(dist.as_slice().iter().all(|p| (0.0..=1.0).contains(p)));
    }
    assert_eq!(out.records()[0].topics.as_ref().unwrap().dominant(), Some(0));
    assert_eq!(out.records()[1].topics.as_ref().unwrap().dominant(), Some(1));
}

#[test]
fn misaligned_corpus_is_rejected() {
    let corpus = vec![vec![(0, 1.0)]];
    match assign_topics(table(2), &model(), &corpus) {
        Err(PipelineError::CorpusMisaligned { rows, corpus }) => {
            assert_eq!((rows, corpus), (2, 1));
        }
        other => panic!("expected CorpusMisaligned, got {other:?}"),
    }
}

#[test]
fn pending_source_passes_table_through() {
    let input = table(4);
    let out = TopicSource::Pending.apply(input.clone()).unwrap();
    assert_eq!(out, input);
}

#[test]
fn migration_subset_keeps_probable_speeches() {
    let corpus = vec![vec![(0, 5.0), (1, 5.0)], vec![(2, 5.0), (3, 5.0)]];
    let scored = assign_topics(table(2), &model(), &corpus).unwrap();
    let subset = migration_subset(&scored, 0, 0.25).unwrap();
    assert_eq!(subset.len(), 1);
    assert_eq!(subset.records()[0].text, "t0");
    assert!(subset.records()[0].topics.is_none());
    assert!(subset.records()[0].migration_prob.unwrap() >= 0.25);

    assert!(matches!(
        migration_subset(&scored, 7, 0.25),
        Err(PipelineError::TopicOutOfRange { topic: 7, n_topics: 2 })
    ));
    assert_eq!(top_speeches(&scored, 1, 1), vec![1]);
}

#[test]
fn invalid_artifacts_are_rejected() {
    let err = LdaModel::from_artifact(LdaArtifact {
        num_topics: 2,
        alpha: vec![0.5],
        vocabulary: vec!["a".into()],
        lambda: vec![vec![1.0]],
    });
    assert!(matches!(err, Err(PipelineError::InvalidModel(_))));
}

#[test]
fn top_words_follow_lambda() {
    let model = model();
    assert_eq!(model.num_topics(), 2);
    let words: Vec<String> = model.top_words(0, 2).into_iter().map(|(w, _)| w).collect();
    assert_eq!(words, vec!["migration".to_string(), "border".to_string()]);
    assert!(model.top_words(5, 2).is_empty());
}

#[test]
fn matrix_market_corpus_is_parsed() {
    let raw = "%%MatrixMarket matrix coordinate real general\n\
               3 4 4\n\
               1 2 1\n\
               1 1 2\n\
               3 4 1\n\
               3 3 5\n";
    let corpus = parse_matrix_market(Cursor::new(raw)).unwrap();
    assert_eq!(corpus.len(), 3);
    assert_eq!(corpus[0], vec![(0, 2.0), (1, 1.0)]);
    assert!(corpus[1].is_empty());
    assert_eq!(corpus[2], vec![(2, 5.0), (3, 1.0)]);

    assert!(parse_matrix_market(Cursor::new("2 2 1\n3 1 1\n")).is_err());
    assert!(parse_matrix_market(Cursor::new("% only comments\n")).is_err());
}

#[test]
fn dictionary_builds_sorted_bags() {
    let dict = Dictionary::new(["border", "migration", "asylum"].map(String::from).to_vec());
    assert_eq!(dict.id("asylum"), Some(2));
    let bow = dict.doc2bow(&["asylum", "border", "asylum", "unknown"]);
    assert_eq!(bow, vec![(0, 1.0), (2, 2.0)]);
}

#[test]
fn digamma_matches_reference_values() {
    // psi(1) = -gamma
    assert!((digamma(1.0) + 0.577_215_664_901_532_9).abs() < 1e-10);
    assert!((digamma(0.5) + 1.963_510_026_021_423_5).abs() < 1e-10);
}
