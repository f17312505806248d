use super::*;

#[test]
fn empty_json_is_default() {
    assert_eq!(
        AccordionOpts::from_json_str("{}").unwrap(),
        AccordionOpts::default()
    );
}

#[test]
fn partial_json_overrides_only_given_keys() {
    let opts = AccordionOpts::from_json_str(
        r#"{ "cache_policy": "lazy", "filter": "nearest", "clear_rgba": [255, 255, 255, 255] }"#,
    )
    .unwrap();
    assert_eq!(opts.cache_policy, CachePolicy::Lazy);
    assert_eq!(opts.filter, SampleFilter::Nearest);
    assert_eq!(opts.min_fold_ratio, DEFAULT_MIN_FOLD_RATIO);
    assert_eq!(opts.raster_opts().clear.to_array(), [255, 255, 255, 255]);
}

#[test]
fn unknown_keys_and_bad_json_are_serde_errors() {
    assert!(matches!(
        AccordionOpts::from_json_str(r#"{ "folds": 3 }"#),
        Err(AccordionError::Serde(_))
    ));
    assert!(matches!(
        AccordionOpts::from_json_str("{"),
        Err(AccordionError::Serde(_))
    ));
}

#[test]
fn out_of_range_values_are_rejected() {
    for json in [
        r#"{ "min_fold_ratio": 0.0 }"#,
        r#"{ "min_fold_ratio": 1.5 }"#,
        r#"{ "shading": -0.1 }"#,
    ] {
        assert!(matches!(
            AccordionOpts::from_json_str(json),
            Err(AccordionError::InvalidParameter(_))
        ));
    }
}

#[test]
fn missing_file_is_wrapped_io_error() {
    let err = AccordionOpts::from_path("/definitely/not/here.json").unwrap_err();
    assert!(matches!(err, AccordionError::Other(_)));
    assert!(err.to_string().contains("not/here.json"));
}
