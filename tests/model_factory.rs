use rnnfactory::*;

fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn clustered_dictionary() -> Dictionary {
    Dictionary::new(vec![40, 30, 10, 8, 7, 5]).with_mapping(vec![
        (0, 0),
        (0, 1),
        (1, 0),
        (1, 1),
        (1, 2),
        (2, 0),
    ])
}

#[test]
fn test_srn_sm_bundle() {
    init_logging();
    let hp = Hyperparameters::new("ptb_srn_sm", 8).with_non_linearity("relu");
    let (model, layers) = make_model(&hp, &Dictionary::new(vec![1; 20]), None).unwrap();

    assert_eq!(model.encoder().family(), CellFamily::Srn);
    assert!(model.decoder().is_some());
    assert!(model.decoder_with_loss().is_none());
    assert_eq!(layers.names().collect::<Vec<_>>(), vec!["embed", "project"]);
    assert_eq!(model.internal_layers(), &layers);
}

#[test]
fn test_lstm_hsm_bundle() {
    init_logging();
    let hp = Hyperparameters::new("wiki_lstm_hsm", 4);
    let (model, layers) = make_model(&hp, &clustered_dictionary(), None).unwrap();

    assert_eq!(model.encoder().family(), CellFamily::Lstm);
    assert!(model.decoder().is_none());
    let head = model.decoder_with_loss().unwrap();
    assert_eq!(head.n_clusters(), 3);
    let mut names: Vec<_> = layers.names().collect();
    names.sort_unstable();
    assert_eq!(
        names,
        vec![
            "embed1", "embed2", "embed3", "embed4", "project1", "project2", "project3", "project4"
        ]
    );
}

#[test]
fn test_n_classes_defaults_to_dictionary_size() {
    let hp = Hyperparameters::new("lstm_sm", 4);
    let (model, _) = make_model(&hp, &Dictionary::new(vec![1; 37]), None).unwrap();
    assert_eq!(model.encoder().n_classes(), 37);
    assert_eq!(model.decoder().map(DenseHead::n_classes), Some(37));
}

#[test]
fn test_explicit_n_classes_overrides_dictionary() {
    let hp = Hyperparameters::new("srn_sm", 6).with_non_linearity("sigmoid");
    let dict = Dictionary::new(vec![1; 5000]);
    let (model, _) = make_model(&hp, &dict, Some(200)).unwrap();

    let graph = model.encoder().graph();
    let embed = graph.parameter_by_name("embed.weight").unwrap();
    assert_eq!(embed.shape(), vec![200, 6]);
    let decoder = model.decoder().unwrap().graph();
    assert_eq!(decoder.parameters()[0].shape(), vec![6, 200]);
}

#[test]
fn test_heads_are_mutually_exclusive() {
    let dict = clustered_dictionary();
    for name in ["srn_sm", "srn_hsm", "lstm_sm", "lstm_hsm"] {
        let hp = Hyperparameters::new(name, 3).with_non_linearity("relu");
        let (model, _) = make_model(&hp, &dict, None).unwrap();
        assert!(
            model.decoder().is_some() ^ model.decoder_with_loss().is_some(),
            "{name} must carry exactly one head"
        );
        assert_eq!(model.head().kind(), hp.spec().unwrap().head);
    }
}

#[test]
fn test_invalid_non_linearity_is_rejected() {
    let hp = Hyperparameters::new("srn_sm", 4).with_non_linearity("tanh_typo");
    let err = make_model(&hp, &Dictionary::new(vec![1; 10]), None).unwrap_err();
    assert_eq!(
        err,
        ConfigurationError::InvalidNonLinearity("tanh_typo".to_string())
    );
}

#[test]
fn test_name_without_head_token_is_rejected() {
    let hp = Hyperparameters::new("ptb_lstm", 4);
    let err = make_model(&hp, &Dictionary::new(vec![1; 10]), None).unwrap_err();
    assert_eq!(err, ConfigurationError::UnknownOutputHead("ptb_lstm".to_string()));
}

#[test]
fn test_name_without_cell_family_is_rejected() {
    let hp = Hyperparameters::new("gru_sm", 4);
    let err = make_model(&hp, &Dictionary::new(vec![1; 10]), None).unwrap_err();
    assert_eq!(err, ConfigurationError::UnknownCellFamily("gru_sm".to_string()));
}

#[test]
fn test_name_matching_is_case_sensitive() {
    let hp = Hyperparameters::new("LSTM_SM", 4);
    let err = make_model(&hp, &Dictionary::new(vec![1; 10]), None).unwrap_err();
    assert!(matches!(err, ConfigurationError::UnknownCellFamily(_)));
}

#[test]
fn test_malformed_mapping_is_rejected() {
    let hp = Hyperparameters::new("lstm_hsm", 4);
    let dict = Dictionary::new(vec![1; 3]).with_mapping(vec![(0, 0), (0, 0), (1, 0)]);
    let err = make_model(&hp, &dict, None).unwrap_err();
    assert!(matches!(err, ConfigurationError::MalformedClusterMapping(_)));
}

#[test]
fn test_out_of_range_cluster_id_from_json_is_rejected() {
    let hp = Hyperparameters::new("lstm_hsm", 4);
    let dict = Dictionary::from_json_str(
        r#"{ "index_to_freq": [3, 1], "mapping": [[0, 0], [18446744073709551615, 0]] }"#,
    )
    .unwrap();
    let err = make_model(&hp, &dict, None).unwrap_err();
    assert!(matches!(err, ConfigurationError::MalformedClusterMapping(_)));
}

#[test]
fn test_mapping_must_cover_overridden_class_count() {
    let hp = Hyperparameters::new("lstm_hsm", 4);
    let err = make_model(&hp, &clustered_dictionary(), Some(4)).unwrap_err();
    assert!(matches!(err, ConfigurationError::MalformedClusterMapping(_)));
}

#[test]
fn test_model_from_json_config() {
    let hp = Hyperparameters::from_json_str(
        r#"{ "name": "ptb_srn_hsm", "n_hidden": 5, "non_linearity": "sigmoid" }"#,
    )
    .unwrap();
    let dict = Dictionary::from_json_str(
        r#"{ "index_to_freq": [9, 7, 3, 1], "mapping": [[0, 0], [0, 1], [1, 0], [1, 1]] }"#,
    )
    .unwrap();
    let (model, layers) = make_model(&hp, &dict, None).unwrap();
    assert!(model.decoder_with_loss().is_some());
    assert_eq!(layers.len(), 2);
}

#[test]
fn test_seeded_construction_is_reproducible() {
    let hp = Hyperparameters::new("lstm_sm", 3);
    let dict = Dictionary::new(vec![1; 8]);
    manual_seed(11);
    let (a, _) = make_model(&hp, &dict, None).unwrap();
    manual_seed(11);
    let (b, _) = make_model(&hp, &dict, None).unwrap();
    for (pa, pb) in a.parameters().zip(b.parameters()) {
        assert_eq!(pa.name(), pb.name());
        assert_eq!(pa.snapshot(), pb.snapshot());
        assert!(!pa.shares_storage(pb));
    }
}
