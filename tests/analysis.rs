use ndarray::{array, Array2, Axis};
use parl_discourse::{
    analysis::{
        aggregate::aggregate_by_year,
        axes::{axis_poles, extreme_examples},
        clustering::{cluster_quality, cluster_scores},
        pcr::principal_component_regression,
        pls::{fit_split, fit_split_targets, one_hot, r2_score, train_test_split, Pls},
        predictive::{
            discretize_quantiles, macro_f1, predictive_power, predictive_power_continuous,
            stratified_folds,
        },
        similarity::{cohesiveness, cosine_matrix, group_similarities},
    },
    data::embedded::{EmbeddingTable, VocabTable},
    error::PipelineError,
};

/// Two classes separated along the first feature, with deterministic jitter
/// in the remaining features.
fn separable(n: usize) -> (Array2<f64>, Vec<String>) {
    let mut x = Array2::zeros((n, 5));
    let mut labels = Vec::with_capacity(n);
    for i in 0..n {
        let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
        x[[i, 0]] = sign * 2.0 + 0.05 * (i % 3) as f64;
        x[[i, 1]] = 0.1 * (i % 5) as f64;
        x[[i, 2]] = 0.1 * (i % 7) as f64;
        x[[i, 3]] = 0.1 * ((i * 3) % 4) as f64;
        x[[i, 4]] = 0.1 * ((i * 2) % 5) as f64;
        labels.push(if sign > 0.0 { "open" } else { "closed" }.to_string());
    }
    (x, labels)
}

#[test]
fn single_member_aggregate_equals_member() {
    let table = EmbeddingTable {
        labels: vec!["PPE".into(), "S&D".into(), "PPE".into()],
        dates: vec!["2019-01-10".into(), "2019-04-02".into(), "2020-06-30".into()],
        weights: Some(vec![0.3, 0.9, 0.6]),
        matrix: array![[0.1, 0.2, 0.3], [1.0, -1.0, 0.5], [0.7, 0.7, 0.7]],
    };
    for weighted in [false, true] {
        let groups = aggregate_by_year(&table, weighted).unwrap();
        assert_eq!(groups.len(), 3);
        for (idx, group) in groups.iter().enumerate() {
            assert_eq!(group.members, 1);
            assert_eq!(group.embedding, table.matrix.row(idx).to_owned());
        }
        assert_eq!((groups[2].category.as_str(), groups[2].year), ("PPE", 2020));
    }
}

#[test]
fn weighted_aggregate_normalises_weights() {
    let table = EmbeddingTable {
        labels: vec!["PPE".into(); 2],
        dates: vec!["2019-01-10".into(), "2019-04-02".into()],
        weights: Some(vec![1.0, 3.0]),
        matrix: array![[0.0, 4.0], [4.0, 0.0]],
    };
    let plain = aggregate_by_year(&table, false).unwrap();
    assert_eq!(plain[0].embedding, array![2.0, 2.0]);
    let weighted = aggregate_by_year(&table, true).unwrap();
    assert_eq!(weighted[0].embedding, array![3.0, 1.0]);

    let zero = EmbeddingTable {
        weights: Some(vec![0.0, 0.0]),
        ..table.clone()
    };
    assert!(matches!(
        aggregate_by_year(&zero, true),
        Err(PipelineError::ZeroWeight(_))
    ));
    let unweighted = EmbeddingTable {
        weights: None,
        ..table
    };
    assert!(matches!(
        aggregate_by_year(&unweighted, true),
        Err(PipelineError::MissingColumn(_))
    ));
}

#[test]
fn cohesiveness_is_zero_for_identical_vectors() {
    let x = Array2::from_shape_fn((6, 3), |(_, j)| (j + 1) as f64);
    let labels = ["a", "a", "b", "b", "c", "c"];
    let score = cohesiveness(&x, &labels, None).unwrap();
    assert!(score.abs() < 1e-12, "{score}");
}

#[test]
fn cohesiveness_is_positive_for_separated_groups() {
    let x = array![
        [1.0, 0.2],
        [0.9, 0.25],
        [1.1, 0.15],
        [0.2, 1.0],
        [0.25, 0.9],
        [0.15, 1.1]
    ];
    let labels = ["left", "left", "left", "right", "right", "right"];
    let groups = group_similarities(&x, &labels, None).unwrap();
    assert_eq!(groups.len(), 2);
    assert!(groups.iter().all(|g| g.intra > g.inter && g.size == 3));
    assert!(cohesiveness(&x, &labels, None).unwrap() > 0.0);

    let weights = [0.9, 0.8, 0.7, 0.9, 0.8, 0.7];
    assert!(cohesiveness(&x, &labels, Some(&weights[..])).unwrap() > 0.0);

    let sim = cosine_matrix(&x);
    assert!((sim[[0, 0]] - 1.0).abs() < 1e-12);
}

#[test]
fn cohesiveness_needs_two_groups() {
    let x = array![[1.0, 0.0], [0.0, 1.0]];
    assert!(matches!(
        cohesiveness(&x, &["a", "a"], None),
        Err(PipelineError::TooFewGroups { needed: 2, found: 1 })
    ));
}

#[test]
fn pls_recovers_separable_labels() {
    let (x, labels) = separable(40);
    let projection = fit_split(&x, &labels, 2, 0.25, 42).unwrap();
    assert_eq!(projection.classes, vec!["closed".to_string(), "open".to_string()]);
    assert!(projection.test_r2 > 0.8, "r2 {}", projection.test_r2);

    let scores = projection.pls.transform(&x).unwrap();
    assert_eq!(scores.dim(), (40, 2));
    let [min0, max0, _, _] = extreme_examples(&scores).unwrap();
    assert_ne!(labels[min0], labels[max0]);
}

#[test]
fn pls_in_sample_fit_is_good() {
    let (x, labels) = separable(30);
    let (_, y) = one_hot(&labels);
    let pls = Pls::fit(&x, &y, 1).unwrap();
    assert!(pls.score(&x, &y).unwrap() > 0.9);
    assert!(Pls::fit(&x, &y, 9).is_err());
    assert!(pls.transform(&array![[1.0, 2.0]]).is_err());
}

#[test]
fn axis_poles_name_both_ends() {
    let (x, labels) = separable(40);
    let projection = fit_split(&x, &labels, 2, 0.25, 7).unwrap();
    let vocab = VocabTable {
        words: vec!["welcome".into(), "neutral".into(), "deport".into()],
        matrix: array![
            [3.0, 0.2, 0.3, 0.1, 0.2],
            [0.0, 0.2, 0.3, 0.1, 0.2],
            [-3.0, 0.2, 0.3, 0.1, 0.2]
        ],
    };
    let poles = axis_poles(&projection.pls, &vocab, 0, 1).unwrap();
    let neg = &poles.negative[0].0;
    let pos = &poles.positive[0].0;
    assert_ne!(neg, pos);
    assert!(["welcome", "deport"].contains(&neg.as_str()));
    assert!(["welcome", "deport"].contains(&pos.as_str()));
    assert!(poles.negative[0].1 < poles.positive[0].1);
    assert!(axis_poles(&projection.pls, &vocab, 5, 1).is_err());
}

#[test]
fn r2_of_perfect_prediction_is_one() {
    let y = array![[1.0, 0.0], [0.0, 1.0], [1.0, 0.0]];
    assert_eq!(r2_score(&y, &y), 1.0);
}

#[test]
fn split_is_seeded_and_disjoint() {
    let (train, test) = train_test_split(10, 0.25, 1);
    assert_eq!(test.len(), 3);
    assert_eq!(train.len(), 7);
    assert!(test.iter().all(|i| !train.contains(i)));
    assert_eq!(train_test_split(10, 0.25, 1), (train, test));
}

#[test]
fn cluster_scores_ignore_label_names() {
    let truth = [0, 0, 1, 1, 2, 2];
    let perfect = cluster_scores(&truth, &[2, 2, 0, 0, 1, 1]);
    assert!((perfect.v_measure - 1.0).abs() < 1e-12);

    let merged = cluster_scores(&truth, &[0, 0, 0, 0, 0, 0]);
    assert_eq!(merged.completeness, 1.0);
    assert!(merged.homogeneity.abs() < 1e-12);
    assert_eq!(merged.v_measure, 0.0);
}

#[test]
fn kmeans_finds_separated_groups() {
    let x = array![
        [0.0, 0.0],
        [0.1, 0.0],
        [0.0, 0.1],
        [10.0, 10.0],
        [10.1, 10.0],
        [10.0, 10.1]
    ];
    let labels = ["a", "a", "a", "b", "b", "b"];
    let quality = cluster_quality(&x, &labels, None).unwrap();
    assert!(quality.v_measure > 0.99, "{quality:?}");
    let weighted = cluster_quality(&x, &labels, Some(&[1.0, 0.5, 0.5, 1.0, 0.5, 0.5][..])).unwrap();
    assert!(weighted.homogeneity > 0.99);
}

#[test]
fn stratified_folds_partition_rows() {
    let labels = [0, 0, 0, 0, 1, 1, 1, 1, 1, 1];
    let folds = stratified_folds(&labels, 2, 3);
    let mut all: Vec<usize> = folds.iter().flatten().copied().collect();
    all.sort_unstable();
    assert_eq!(all, (0..10).collect::<Vec<_>>());
    for fold in &folds {
        let ones = fold.iter().filter(|&&i| labels[i] == 1).count();
        assert_eq!(ones, 3);
    }
}

#[test]
fn macro_f1_averages_classes() {
    assert_eq!(macro_f1(&[0, 1, 1], &[0, 1, 1]), 1.0);
    // class 0: f1 = 2/3, class 1: f1 = 6/7
    let f1 = macro_f1(&[0, 0, 1, 1, 1], &[0, 1, 1, 1, 1]);
    assert!((f1 - (2.0 / 3.0 + 6.0 / 7.0) / 2.0).abs() < 1e-12);
}

#[test]
fn quantile_bins_are_balanced() {
    let values: Vec<f64> = (1..=10).map(f64::from).collect();
    assert_eq!(
        discretize_quantiles(&values, 5),
        vec![0, 0, 1, 1, 2, 2, 3, 3, 4, 4]
    );
}

#[test]
fn logistic_regression_predicts_separable_labels() {
    let (x, labels) = separable(40);
    let scores = predictive_power(&x, &labels, 5, 42).unwrap();
    assert_eq!(scores.len(), 5);
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    assert!(mean > 0.9, "{scores:?}");
}

#[test]
fn misaligned_dates_report_both_lengths() {
    let table = EmbeddingTable {
        labels: vec!["PPE".into(); 3],
        dates: vec!["2019-01-10".into(), "2019-04-02".into()],
        weights: None,
        matrix: array![[0.1, 0.2, 0.3, 0.4], [1.0, -1.0, 0.5, 0.0], [0.7, 0.7, 0.7, 0.7]],
    };
    match aggregate_by_year(&table, false) {
        Err(PipelineError::RowCountMismatch { rows, found }) => assert_eq!((rows, found), (3, 2)),
        other => panic!("expected RowCountMismatch, got {other:?}"),
    }
}

/// Continuous target that is a linear function of the first feature.
fn linear_target(n: usize) -> (Array2<f64>, Vec<f64>) {
    let mut x = Array2::zeros((n, 4));
    for i in 0..n {
        x[[i, 0]] = i as f64 / 6.0;
        x[[i, 1]] = 0.1 * (i % 5) as f64;
        x[[i, 2]] = 0.1 * (i % 7) as f64;
        x[[i, 3]] = 0.1 * ((i * 3) % 4) as f64;
    }
    let y = x.column(0).mapv(|v| 2.0 * v + 1.0).to_vec();
    (x, y)
}

#[test]
fn pls_scores_use_sample_standardisation() {
    let (x, labels) = separable(30);
    let (_, y) = one_hot(&labels);
    let pls = Pls::fit(&x, &y, 2).unwrap();
    let mean = x.mean_axis(Axis(0)).unwrap();
    let std = x.std_axis(Axis(0), 1.0);
    let expected = ((&x - &mean) / &std).dot(pls.rotations());
    let scores = pls.transform(&x).unwrap();
    assert_eq!(scores.dim(), expected.dim());
    for (a, b) in scores.iter().zip(expected.iter()) {
        assert!((a - b).abs() < 1e-8, "{a} vs {b}");
    }
}

#[test]
fn continuous_target_aligns_first_rotation() {
    let (x, values) = linear_target(60);
    let y = Array2::from_shape_vec((values.len(), 1), values).unwrap();
    let (pls, r2) = fit_split_targets(&x, &y, 1, 0.25, 42).unwrap();
    assert!(r2 > 0.95, "r2 {r2}");

    let rotation = pls.rotation(0).unwrap();
    let strongest = rotation
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
        .map(|(idx, _)| idx);
    assert_eq!(strongest, Some(0), "{rotation:?}");
}

#[test]
fn continuous_predictive_power_beats_chance() {
    let (x, values) = linear_target(60);
    let scores = predictive_power_continuous(&x, &values, 5, 42).unwrap();
    assert_eq!(scores.len(), 5);
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    // five balanced quantile bins
    assert!(mean > 0.4, "{scores:?}");
}

/// Walsh function `m` at row `i`: mutually orthogonal, zero-mean columns.
fn walsh(m: usize, i: usize) -> f64 {
    if (i & m).count_ones() % 2 == 0 {
        1.0
    } else {
        -1.0
    }
}

#[test]
fn one_component_pair_separates_classes() {
    // variances 25, 16, 9 on the leading features; only the third tracks the class
    let n = 32;
    let extra = [3, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20];
    let mut x = Array2::zeros((n, 3 + extra.len()));
    let mut labels = Vec::with_capacity(n);
    for i in 0..n {
        x[[i, 0]] = 5.0 * walsh(2, i);
        x[[i, 1]] = 4.0 * walsh(4, i);
        x[[i, 2]] = 3.0 * walsh(1, i);
        for (j, m) in extra.iter().enumerate() {
            x[[i, 3 + j]] = 0.3 * walsh(*m, i);
        }
        labels.push(if i % 2 == 0 { "pro" } else { "contra" });
    }

    let result = principal_component_regression(&x, &labels, 3).unwrap();
    assert_eq!(result.n_components, 3);
    assert_eq!(result.pairs.len(), 3);
    assert!(result.explained_variance > 0.9 && result.explained_variance <= 1.0 + 1e-9);
    assert!(result.best.accuracy > 0.99, "{:?}", result.pairs);

    let separating = result.pairs.iter().filter(|p| p.accuracy > 0.99).count();
    assert_eq!(separating, 2, "{:?}", result.pairs);
    let blind = result.pairs.iter().find(|p| p.accuracy <= 0.99).unwrap();
    assert!((blind.accuracy - 0.5).abs() < 1e-12, "{blind:?}");
    assert!(result.best.first < result.best.second);
}
