use piper::{ErrorKind, FilterRegistry, PageType, PipeItem, Piper, Value};
use serde_json::json;

const LISTING: &str = r#"
<html>
<head><title> Storefront </title></head>
<body>
    <ul id="products">
        <li class="product" data-sku="A1">
            <a href="/p/1">Kettle</a>
            <span class="price">12</span>
            <span class="tag">kitchen</span><span class="tag">steel</span>
        </li>
        <li class="product" data-sku="B2">
            <a href="/p/2">Toaster</a>
            <span class="price">30</span>
        </li>
        <li class="product sold-out" data-sku="C3">
            <a>Blender</a>
            <span class="price">n/a</span>
        </li>
    </ul>
    <script id="state" type="application/json">{"cart": {"items": 2, "ids": ["A1", "B2"]}}</script>
</body>
</html>
"#;

fn schema(json: &str) -> PipeItem {
    PipeItem::from_json(json).unwrap()
}

fn html(item: &str) -> Value {
    Piper::new().pipe_html(LISTING, &schema(item)).unwrap()
}

#[test]
fn failing_filter_step_is_skipped() {
    let piper = Piper::new();
    let with_bad = schema(r#"{"type": "text", "filter": "trimspace|badfilter()"}"#);
    let without = schema(r#"{"type": "text", "filter": "trimspace"}"#);

    let a = piper.pipe_text("  X  ", &with_bad).unwrap();
    let b = piper.pipe_text("  X  ", &without).unwrap();
    assert_eq!(a, Value::from("X"));
    assert_eq!(a, b);
}

#[test]
fn split_then_join() {
    let item = schema(r#"{"type": "text", "filter": "split(|)|join(,)"}"#);
    assert_eq!(
        Piper::new().pipe_text("a|b||c", &item).unwrap(),
        Value::from("a,b,c")
    );
}

#[test]
fn intval_defaults_to_zero() {
    let item = schema(r#"{"type": "text", "filter": "intval"}"#);
    let piper = Piper::new();
    assert_eq!(piper.pipe_text("abc", &item).unwrap(), Value::Int(0));
    assert_eq!(piper.pipe_text("10", &item).unwrap(), Value::Int(10));
}

#[test]
fn trimspace_is_idempotent() {
    let registry = FilterRegistry::builtins();
    for s in ["", "  x ", "\t a b \n", "plain"] {
        let once = registry.apply("trimspace", Value::from(s), None).unwrap();
        let twice = registry.apply("trimspace", once.clone(), None).unwrap();
        assert_eq!(once, twice, "{s:?}");
    }
}

#[test]
fn json_path_indexes() {
    let body = br#"{"value": ["1", "2", {"data": ["3", "2", "1"]}]}"#;
    let item = schema(r#"{"selector": "this.value[2].data[1]", "type": "string"}"#);
    assert_eq!(
        item.pipe_bytes(body, PageType::Json).unwrap(),
        Value::from("2")
    );
}

#[test]
fn json_type_round_trips() {
    let doc = json!({
        "name": "x",
        "n": 3,
        "flags": [true, false, null],
        "nested": {"list": [{"k": "v"}, []], "empty": {}}
    });
    let body = serde_json::to_vec(&doc).unwrap();
    let item = schema(r#"{"type": "json"}"#);

    assert_eq!(
        item.pipe_bytes(&body, PageType::Json).unwrap(),
        Value::from_json(doc)
    );
}

#[test]
fn json_type_keeps_number_text() {
    let body = br#"{"n":18446744073709551615,"x":[2.718281828459045235360287,-7,0.5]}"#;
    let value = schema(r#"{"type": "json"}"#)
        .pipe_bytes(body, PageType::Json)
        .unwrap();

    assert_eq!(
        value.to_json_string(false).unwrap().as_bytes(),
        body.as_slice()
    );
}

#[test]
fn regexp_prefers_first_group() {
    let piper = Piper::new();
    let grouped = schema(r#"{"selector": "regexp:price: (\\d+) USD", "type": "int"}"#);
    let whole = schema(r#"{"selector": "regexp:\\d+ USD", "type": "text"}"#);

    assert_eq!(
        piper.pipe_text("total price: 42 USD", &grouped).unwrap(),
        Value::Int(42)
    );
    assert_eq!(
        piper.pipe_text("total price: 42 USD", &whole).unwrap(),
        Value::from("42 USD")
    );
}

#[test]
fn unnamed_map_members_are_dropped() {
    let value = html(
        r#"{"type": "map", "subitem": [
            {"name": "title", "selector": "title", "type": "text", "filter": "trimspace"},
            {"name": "", "selector": "title", "type": "text"},
            {"selector": "li", "type": "text"}
        ]}"#,
    );
    insta::assert_json_snapshot!(value, @r#"
    {
      "title": "Storefront"
    }
    "#);
}

#[test]
fn empty_array_selection_is_not_an_error() {
    let value = html(
        r#"{"selector": "table tr", "type": "array", "subitem": [{"type": "text"}]}"#,
    );
    assert_eq!(value, Value::List(Vec::new()));
}

#[test]
fn listing_to_records() {
    let value = html(
        r#"{"selector": "li.product", "type": "array", "subitem": [{
            "type": "map",
            "subitem": [
                {"name": "sku", "type": "attr[data-sku]"},
                {"name": "name", "selector": "a", "type": "text"},
                {"name": "link", "selector": "a", "type": "href", "filter": "preadd(https://shop.test)"},
                {"name": "price", "selector": ".price", "type": "int"},
                {"name": "tags", "selector": ".tag", "type": "text-array", "filter": "join(/)"}
            ]
        }]}"#,
    );

    insta::assert_json_snapshot!(value, @r#"
    [
      {
        "sku": "A1",
        "name": "Kettle",
        "link": "https://shop.test/p/1",
        "price": 12,
        "tags": "kitchen/steel"
      },
      {
        "sku": "B2",
        "name": "Toaster",
        "link": "https://shop.test/p/2",
        "price": 30,
        "tags": null
      },
      {
        "sku": "C3",
        "name": "Blender",
        "link": null,
        "price": null,
        "tags": null
      }
    ]
    "#);
}

#[test]
fn array_uses_only_its_first_subitem() {
    let value = html(
        r#"{"selector": "li.product", "type": "array", "subitem": [
            {"selector": "a", "type": "text"},
            {"selector": ".price", "type": "int"}
        ]}"#,
    );
    insta::assert_json_snapshot!(value, @r#"
    [
      "Kettle",
      "Toaster",
      "Blender"
    ]
    "#);
}

#[test]
fn failing_array_elements_become_null() {
    let value = html(r#"{"selector": ".price", "type": "array", "subitem": [{"type": "int"}]}"#);
    insta::assert_json_snapshot!(value, @r#"
    [
      12,
      30,
      null
    ]
    "#);
}

#[test]
fn json_array_of_records() {
    let body = br#"{"items": [
        {"id": 1, "name": "a", "tags": ["x", "y"]},
        {"id": "2", "name": null},
        {"name": "c", "tags": []}
    ]}"#;
    let item = schema(
        r#"{"selector": "items", "type": "array", "subitem": [{
            "type": "map",
            "subitem": [
                {"name": "id", "selector": "id", "type": "int"},
                {"name": "name", "selector": "name", "type": "string"},
                {"name": "tags", "selector": "tags", "type": "string-array", "filter": "join(+)"}
            ]
        }]}"#,
    );

    insta::assert_json_snapshot!(item.pipe_bytes(body, PageType::Json).unwrap(), @r#"
    [
      {
        "id": 1,
        "name": "a",
        "tags": "x+y"
      },
      {
        "id": 2,
        "name": "",
        "tags": null
      },
      {
        "id": null,
        "name": "c",
        "tags": ""
      }
    ]
    "#);
}

#[test]
fn navigation_and_attribute_arrays() {
    assert_eq!(
        html(r#"{"selector": "li.product|not(.sold-out)|last", "type": "attr[data-sku]"}"#),
        Value::from("B2")
    );
    assert_eq!(
        html(r#"{"selector": "li a", "type": "href-array"}"#),
        Value::from(vec!["/p/1".to_owned(), "/p/2".to_owned()])
    );
    assert_eq!(
        html(r#"{"selector": ".price//html", "type": "text-array"}"#),
        Value::from(vec!["12".to_owned(), "30".to_owned(), "n/a".to_owned()])
    );
}

#[test]
fn jsonparse_embedded_state() {
    let value = html(
        r##"{"selector": "#state", "type": "jsonparse", "subitem": [{
            "type": "map",
            "subitem": [
                {"name": "count", "selector": "cart.items", "type": "int"},
                {"name": "ids", "selector": "cart.ids", "type": "string-array"},
                {"name": "first", "selector": "cart.ids[0]", "type": "string"}
            ]
        }]}"##,
    );

    insta::assert_json_snapshot!(value, @r#"
    {
      "count": 2,
      "ids": [
        "A1",
        "B2"
      ],
      "first": "A1"
    }
    "#);
}

#[test]
fn removal_applies_to_later_selections() {
    let page = r#"<div id="post">Hello <em class="ad">BUY NOW</em>world</div>"#;
    let item = schema(
        r##"{"type": "map", "subitem": [
            {"name": "before", "selector": "#post", "type": "text"},
            {"name": "cleaned", "selector": "#post|rm(.ad)", "type": "text"},
            {"name": "after", "selector": "#post", "type": "text"}
        ]}"##,
    );

    insta::assert_json_snapshot!(Piper::new().pipe_html(page, &item).unwrap(), @r#"
    {
      "before": "Hello BUY NOWworld",
      "cleaned": "Hello world",
      "after": "Hello world"
    }
    "#);
}

#[test]
fn root_failures_propagate() {
    let piper = Piper::new();

    let err = piper
        .pipe_html(LISTING, &schema(r#"{"selector": "h1", "type": "text"}"#))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Selector);

    let err = piper
        .pipe_html(LISTING, &schema(r#"{"selector": ".price", "type": "int"}"#))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Coercion);

    let err = piper
        .pipe_html(LISTING, &schema(r#"{"selector": "li|sideways", "type": "text"}"#))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema);
}

#[test]
fn text_documents() {
    let piper = Piper::new();
    let lines = schema(
        r#"{"type": "array", "subitem": [{"type": "text", "filter": "trimspace"}]}"#,
    );
    assert_eq!(
        piper.pipe_text("one\n two \nthree", &lines).unwrap(),
        Value::from_json(json!(["one", "two", "three"]))
    );

    let groups = schema(
        r#"{"selector": "regexp:(\\w+)@(\\w+)", "type": "array", "subitem": [{"type": "text", "filter": "postadd(!)"}]}"#,
    );
    assert_eq!(
        piper.pipe_text("mail: ana@host", &groups).unwrap(),
        Value::from_json(json!(["ana!", "host!"]))
    );
}
