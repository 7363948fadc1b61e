//! Tests for the docblock grammar, through `phannot::docblock::parse`
//! and the resolved `Annotation` view.

use phannot::docblock::{EVAL_CODE, MAX_NESTING, parse};
use phannot::{Annotation, AnnotationsError, ArgumentKey, Collection, ParseNode, Value};

fn annotations(comment: &str) -> Collection {
    Collection::new(&parse(comment, "test.php", 1).expect("docblock should parse"))
}

// ─── Structure ──────────────────────────────────────────────────────

#[test]
fn free_text_is_skipped() {
    let collection = annotations(
        "/**\n * Persisted users, see admin@example.com.\n *\n * @Stored\n * Trailing prose {@inheritdoc}.\n */",
    );
    assert_eq!(collection.count(), 1);
    assert_eq!(collection.annotations()[0].name(), Some("Stored"));
}

#[test]
fn nodes_record_file_and_own_line() {
    let nodes = parse("/**\n * @First\n *\n * @Second(1)\n */", "src/Foo.php", 10).unwrap();
    let lines: Vec<_> = nodes.iter().map(|n| n.line).collect();
    assert_eq!(lines, vec![Some(11), Some(13)]);
    assert!(nodes.iter().all(|n| n.file.as_deref() == Some("src/Foo.php")));
}

#[test]
fn parenthesis_on_next_line_is_prose() {
    let collection = annotations("/**\n * @Deprecated\n * (since forever)\n */");
    let deprecated = collection.get("Deprecated").unwrap();
    assert_eq!(deprecated.number_arguments(), 0);
}

#[test]
fn empty_argument_list_and_trailing_commas() {
    let collection = annotations("/** @A() @B(1, 2,) @C({x, y,}) */");
    assert_eq!(collection.get("A").unwrap().number_arguments(), 0);
    assert_eq!(collection.get("B").unwrap().number_arguments(), 2);
    let c = collection.get("C").unwrap().argument(0).unwrap();
    assert_eq!(c.as_array().unwrap().len(), 2);
}

// ─── Literals ───────────────────────────────────────────────────────

#[test]
fn literals_keep_their_text() {
    let collection = annotations(
        r#"/** @Column(type="string", length=255, scale=-1.50, nullable=TRUE, default=null, enum=Status::ACTIVE, class=\App\Model) */"#,
    );
    let column = collection.get("Column").unwrap();

    assert_eq!(column.named_argument("type"), Some(&Value::String("string".into())));
    assert_eq!(column.named_argument("length"), Some(&Value::Integer("255".into())));
    assert_eq!(column.named_argument("scale"), Some(&Value::Double("-1.50".into())));
    assert_eq!(column.named_argument("nullable"), Some(&Value::Bool(true)));
    assert_eq!(column.named_argument("default"), Some(&Value::Null));
    assert_eq!(
        column.named_argument("enum"),
        Some(&Value::Identifier("Status::ACTIVE".into()))
    );
    assert_eq!(
        column.named_argument("class").and_then(Value::as_str),
        Some("\\App\\Model")
    );
    assert_eq!(column.named_argument("length").and_then(Value::as_i64), Some(255));
}

#[test]
fn string_escapes() {
    let collection = annotations(r#"/** @Text("say \"hi\"", 'it\'s', "back\\slash", "keep\n") */"#);
    let text = collection.get("Text").unwrap();
    let values: Vec<_> = text.arguments().values().filter_map(Value::as_str).collect();
    assert_eq!(values, vec![r#"say "hi""#, "it's", r"back\slash", r"keep\n"]);
}

// ─── Arrays and names ───────────────────────────────────────────────

#[test]
fn both_array_styles_with_both_separators() {
    let collection = annotations(
        r#"/** @Map(braces={"a": 1, b = 2, 3}, brackets=[x: "y", "z"]) */"#,
    );
    let map = collection.get("Map").unwrap();

    let braces = map.named_argument("braces").and_then(Value::as_array).unwrap();
    let keys: Vec<String> = braces.keys().map(ArgumentKey::to_string).collect();
    assert_eq!(keys, vec!["a", "b", "0"]);
    assert_eq!(braces.get("b"), Some(&Value::Integer("2".into())));
    assert_eq!(braces.get(0), Some(&Value::Integer("3".into())));

    let brackets = map.named_argument("brackets").and_then(Value::as_array).unwrap();
    assert_eq!(brackets.get("x").and_then(Value::as_str), Some("y"));
    assert_eq!(brackets.get(0).and_then(Value::as_str), Some("z"));
}

#[test]
fn positional_and_named_arguments_mix() {
    let collection = annotations(r#"/** @Route("/users", name="users", "GET") */"#);
    let route = collection.get("Route").unwrap();

    assert_eq!(route.argument(0).and_then(Value::as_str), Some("/users"));
    assert_eq!(route.argument(1).and_then(Value::as_str), Some("GET"));
    assert_eq!(route.named_parameter("name").and_then(Value::as_str), Some("users"));
    assert_eq!(route.number_arguments(), 3);
    assert_eq!(route.expr_arguments().len(), 3);
    assert_eq!(route.expr_arguments()[1].name.as_deref(), Some("name"));
}

#[test]
fn huge_numeric_names_do_not_take_positions() {
    let collection = annotations(r#"/** @Foo("18446744073709551615"=1) */"#);
    let foo = collection.get("Foo").unwrap();
    assert_eq!(foo.named_argument("18446744073709551615").and_then(Value::as_str), Some("1"));

    let collection = annotations(r#"/** @Foo("18446744073709551614"=1, 2, 3) */"#);
    let foo = collection.get("Foo").unwrap();
    let keys: Vec<_> = foo.arguments().keys().cloned().collect();
    assert_eq!(
        keys,
        vec![
            ArgumentKey::Named("18446744073709551614".into()),
            ArgumentKey::Index(0),
            ArgumentKey::Index(1),
        ]
    );
}

#[test]
fn nested_annotations_resolve_to_annotations() {
    let collection = annotations(
        "/**\n * @Table(\n *     name=\"users\",\n *     indexes={@Index(\"email\"), @Index({\"first\", \"last\"})}\n * )\n */",
    );
    let table = collection.get("Table").unwrap();
    let indexes = table.named_argument("indexes").and_then(Value::as_array).unwrap();
    assert_eq!(indexes.len(), 2);

    let first: &Annotation = indexes.get(0).and_then(Value::as_annotation).unwrap();
    assert_eq!(first.name(), Some("Index"));
    assert_eq!(first.argument(0).and_then(Value::as_str), Some("email"));

    let second = indexes.get(1).and_then(Value::as_annotation).unwrap();
    assert!(second.argument(0).and_then(Value::as_array).unwrap().is_list());
    assert!(matches!(
        table.expr_arguments()[1].expr,
        ParseNode::Array(ref items) if items.len() == 2
    ));
}

// ─── Errors ─────────────────────────────────────────────────────────

#[test]
fn unexpected_token_reports_its_line() {
    let err = parse("/**\n * @Valid\n * @Broken(a=)\n */", "Foo.php", 10).unwrap_err();
    match err {
        AnnotationsError::Syntax {
            message,
            file,
            line,
        } => {
            assert!(
                message.starts_with("Syntax error, unexpected token ')'"),
                "got: {message}"
            );
            assert_eq!(file, "Foo.php");
            assert_eq!(line, 12);
        }
        other => panic!("expected syntax error, got {other:?}"),
    }
}

#[test]
fn unterminated_argument_list_is_eof() {
    let err = parse("/** @Broken(1, 2", EVAL_CODE, 1).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Syntax error, unexpected EOF in eval code on line 1"
    );
}

#[test]
fn unknown_characters_are_scanning_errors() {
    let err = parse("/** @Foo(#bar) */", EVAL_CODE, 3).unwrap_err();
    assert!(matches!(err, AnnotationsError::Syntax { line: 3, ref message, .. }
        if message.starts_with("Scanning error before '#bar)")));
}

#[test]
fn runaway_nesting_is_a_syntax_error() {
    let comment = format!("/** @A({}) */", "[".repeat(200_000));
    let err = parse(&comment, EVAL_CODE, 4).unwrap_err();
    assert!(matches!(err, AnnotationsError::Syntax { line: 4, ref message, .. }
        if message.contains("nesting deeper than")));

    let comment = format!("/** {}", "@A(".repeat(200_000));
    assert!(matches!(
        parse(&comment, EVAL_CODE, 1),
        Err(AnnotationsError::Syntax { .. })
    ));
}

#[test]
fn nesting_up_to_the_limit_parses() {
    // The argument list itself is the first level.
    let depth = MAX_NESTING as usize - 1;
    let comment = format!(
        "/** @A({}1{}) */",
        "{".repeat(depth),
        "}".repeat(depth)
    );
    let collection = annotations(&comment);
    let mut value = collection.get("A").unwrap().argument(0).unwrap();
    for _ in 1..depth {
        value = value.as_array().and_then(|a| a.get(0)).unwrap();
    }
    assert_eq!(value.as_array().and_then(|a| a.get(0)).and_then(Value::as_str), Some("1"));

    let deeper = format!("/** @A({}1{}) */", "{".repeat(depth + 1), "}".repeat(depth + 1));
    assert!(parse(&deeper, EVAL_CODE, 1).is_err());
}
