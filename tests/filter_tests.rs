use datacat::filter::{FilterError, FilterOptions, FilterSet, FilterValue, SearchFilterInput};
use serde_json::json;

#[test]
fn test_text_filter() {
    let input = SearchFilterInput::from_json(r#"{"categoryId": "schema", "value": "sales"}"#)
        .unwrap();
    assert_eq!(input.category_id(), "schema");
    assert_eq!(input.value(), &FilterValue::Text("sales".to_string()));
    assert!(input.is_applied());
}

#[test]
fn test_option_filter() {
    let input = SearchFilterInput::from_json(
        r#"{"categoryId": "tag", "value": {"pii": true, "deprecated": false}}"#,
    )
    .unwrap();

    let options = input.value().as_options().expect("option set");
    assert_eq!(options.len(), 2);
    assert!(options.is_selected("pii"));
    assert!(!options.is_selected("deprecated"));
    assert_eq!(options.selected().collect::<Vec<_>>(), vec!["pii"]);
}

#[test]
fn test_absent_filter() {
    for json in [
        r#"{"categoryId": "owner"}"#,
        r#"{"categoryId": "owner", "value": null}"#,
    ] {
        let input = SearchFilterInput::from_json(json).unwrap();
        assert_eq!(input, SearchFilterInput::absent("owner"));
        assert!(!input.is_applied());
    }
}

#[test]
fn test_variants_are_distinguishable() {
    let inputs = [
        SearchFilterInput::text("schema", "sales"),
        SearchFilterInput::options("tag", [("pii", true)].into_iter().collect()),
        SearchFilterInput::absent("owner"),
    ];

    let kinds: Vec<&str> = inputs
        .iter()
        .map(|input| match input.value() {
            FilterValue::Text(_) => "text",
            FilterValue::Options(_) => "options",
            FilterValue::Absent => "absent",
        })
        .collect();
    assert_eq!(kinds, vec!["text", "options", "absent"]);
}

#[test]
fn test_invalid_options_rejected() {
    for json in [
        r#"{"categoryId": "tag", "value": {"pii": "yes"}}"#,
        r#"{"categoryId": "tag", "value": {"pii": 1}}"#,
        r#"{"categoryId": "tag", "value": {"pii": {"nested": true}}}"#,
        r#"{"categoryId": "tag", "value": 42}"#,
        r#"{"categoryId": "tag", "value": ["pii"]}"#,
        r#"{"categoryId": "tag", "value": {"pii": true, "pii": false}}"#,
    ] {
        assert!(
            matches!(SearchFilterInput::from_json(json), Err(FilterError::Json(_))),
            "{json} should not parse"
        );
    }
}

#[test]
fn test_category_required() {
    assert!(matches!(
        SearchFilterInput::from_json(r#"{"value": "sales"}"#),
        Err(FilterError::Json(_))
    ));
    assert!(matches!(
        SearchFilterInput::from_json(r#"{"categoryId": "", "value": "sales"}"#),
        Err(FilterError::EmptyCategory)
    ));
    assert!(serde_json::from_value::<SearchFilterInput>(json!({"categoryId": ""})).is_err());
}

#[test]
fn test_serialize_wire_format() {
    let text = SearchFilterInput::text("schema", "sales");
    assert_eq!(
        serde_json::to_value(&text).unwrap(),
        json!({"categoryId": "schema", "value": "sales"})
    );

    let mut options = FilterOptions::new();
    options.select("pii");
    options.deselect("deprecated");
    let options = SearchFilterInput::options("tag", options);
    assert_eq!(
        serde_json::to_value(&options).unwrap(),
        json!({"categoryId": "tag", "value": {"pii": true, "deprecated": false}})
    );

    let absent = SearchFilterInput::absent("owner");
    assert_eq!(absent.to_json().unwrap(), r#"{"categoryId":"owner"}"#);
}

#[test]
fn test_empty_options_distinct_from_absent() {
    let empty = SearchFilterInput::from_json(r#"{"categoryId": "tag", "value": {}}"#).unwrap();
    assert_eq!(empty.value(), &FilterValue::Options(FilterOptions::new()));
    assert_ne!(empty, SearchFilterInput::absent("tag"));
    assert!(!empty.is_applied());
    assert_eq!(empty.to_json().unwrap(), r#"{"categoryId":"tag","value":{}}"#);
}

#[test]
fn test_filter_set_apply_replaces() {
    let mut set = FilterSet::new();
    assert_eq!(set.apply(SearchFilterInput::text("schema", "sales")).unwrap(), None);
    let replaced = set
        .apply(SearchFilterInput::text("schema", "finance"))
        .unwrap();
    assert_eq!(replaced, Some(FilterValue::Text("sales".to_string())));
    assert_eq!(set.len(), 1);
    assert_eq!(set.get("schema"), Some(&FilterValue::from("finance")));

    assert!(matches!(
        set.apply(SearchFilterInput::absent("  ")),
        Err(FilterError::EmptyCategory)
    ));
    assert_eq!(set.len(), 1);

    assert!(set.remove("schema").is_some());
    assert!(set.is_empty());
}

#[test]
fn test_filter_set_active() {
    let set: FilterSet = serde_json::from_value(json!([
        {"categoryId": "schema", "value": "sales"},
        {"categoryId": "tag", "value": {"pii": false}},
        {"categoryId": "owner"},
        {"categoryId": "badge", "value": {"gold": true}},
    ]))
    .unwrap();

    assert_eq!(set.len(), 4);
    let active: Vec<&str> = set.active().map(|(category, _)| category).collect();
    assert_eq!(active, vec!["badge", "schema"]);
}

#[test]
fn test_filter_set_rejects_duplicates() {
    let err = serde_json::from_value::<FilterSet>(json!([
        {"categoryId": "schema", "value": "sales"},
        {"categoryId": "schema", "value": "finance"},
    ]))
    .unwrap_err();
    assert!(err.to_string().contains("category 'schema' is filtered more than once"));

    assert!(
        serde_json::from_value::<FilterSet>(json!([{"categoryId": "", "value": "x"}])).is_err()
    );
}

#[test]
fn test_filter_set_serializes_as_list() {
    let mut set = FilterSet::new();
    set.apply(SearchFilterInput::absent("owner")).unwrap();
    set.apply(SearchFilterInput::text("schema", "sales")).unwrap();

    assert_eq!(
        serde_json::to_value(&set).unwrap(),
        json!([
            {"categoryId": "owner"},
            {"categoryId": "schema", "value": "sales"},
        ])
    );

    let inputs = set.into_inputs();
    assert_eq!(inputs[1], SearchFilterInput::text("schema", "sales"));
}
