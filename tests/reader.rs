//! End-to-end tests: PHP source → `SourceIndex` → `PhpReader` →
//! `Adapter`.

mod common;

use common::create_psr4_workspace;
use phannot::{
    Adapter, AnnotationsError, ClassLikeKind, ClassSource, PhpReader, Reader, SourceIndex, Value,
};

const COMPOSER: &str = r#"{"autoload": {"psr-4": {"App\\": "src/"}}}"#;

const FOO: &str = r#"<?php
namespace App\Model;

use App\Concerns\HasTimestamps as Timestamps;

/**
 * A stored user.
 *
 * @Stored(table="users")
 */
class Foo extends Base
{
    use Timestamps;

    /** @Enum({"active", "banned"}) */
    const STATUS = 'active';

    /**
     * @Identity
     */
    public int $id;

    public string $name;

    /**
     * @Route("/save", methods={"POST"})
     */
    public function barMethod(): void {}
}
"#;

const BASE: &str = r#"<?php
namespace App\Model;

abstract class Base
{
    /** @Column(type="integer") */
    protected $version;

    /** @Transactional */
    public function BARMETHOD() {}

    /** @Hook("delete") */
    public function delete() {}
}
"#;

const TIMESTAMPS: &str = r#"<?php
namespace App\Concerns;

trait HasTimestamps
{
    /** @Column(type="datetime") */
    public $createdAt;

    /** @Hook("touch") */
    public function touch() {}
}
"#;

fn workspace() -> tempfile::TempDir {
    create_psr4_workspace(
        COMPOSER,
        &[
            ("src/Model/Foo.php", FOO),
            ("src/Model/Base.php", BASE),
            ("src/Concerns/HasTimestamps.php", TIMESTAMPS),
        ],
    )
}

#[test]
fn classes_autoload_through_psr4() {
    let dir = workspace();
    let index = SourceIndex::for_workspace(dir.path());
    assert!(index.class_names().is_empty());

    let metadata = index.reflect("\\App\\Model\\Foo").unwrap();
    assert_eq!(metadata.kind, ClassLikeKind::Class);
    assert_eq!(metadata.name, "App\\Model\\Foo");
    assert_eq!(metadata.line, 11);
    assert!(metadata.file.ends_with("Foo.php"));

    // Parent and trait were pulled in on demand.
    let names = index.class_names();
    assert!(names.contains(&"App\\Model\\Base".to_string()));
    assert!(names.contains(&"App\\Concerns\\HasTimestamps".to_string()));
}

#[test]
fn members_merge_own_then_traits_then_parents() {
    let dir = workspace();
    let index = SourceIndex::for_workspace(dir.path());
    let metadata = index.reflect("App\\Model\\Foo").unwrap();

    let methods: Vec<_> = metadata.methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(methods, vec!["barMethod", "touch", "delete"]);

    let properties: Vec<_> = metadata.properties.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(properties, vec!["id", "name", "createdAt", "version"]);

    let created = &metadata.properties[2];
    assert!(created.file.ends_with("HasTimestamps.php"));
    assert_eq!(created.doc.as_ref().map(|d| d.line), Some(6));
}

#[test]
fn reader_builds_the_annotation_tree() {
    let dir = workspace();
    let reader = PhpReader::for_workspace(dir.path());
    let data = reader.parse("App\\Model\\Foo").unwrap();

    let class = data.class.as_ref().unwrap();
    assert_eq!(class[0].name.as_deref(), Some("Stored"));
    assert_eq!(class[0].line, Some(9));

    let properties: Vec<_> = data.properties.iter().map(|(n, _)| n.as_str()).collect();
    // `name` has no docblock and is left out.
    assert_eq!(properties, vec!["id", "createdAt", "version"]);
    assert_eq!(data.constants[0].0, "STATUS");
}

#[test]
fn adapter_serves_the_end_to_end_scenario() {
    let dir = workspace();
    let mut adapter = Adapter::memory();
    adapter.set_reader(PhpReader::for_workspace(dir.path()));

    let reflection = adapter.get("App\\Model\\Foo").unwrap();
    let stored = reflection.class_annotations().unwrap().get("Stored").unwrap();
    assert_eq!(stored.named_argument("table").and_then(Value::as_str), Some("users"));
    assert!(reflection.properties_annotations()["id"].has("Identity"));

    let route = adapter
        .get_method("App\\Model\\Foo", "BARMETHOD")
        .unwrap()
        .get("Route")
        .unwrap()
        .clone();
    let methods = route.named_argument("methods").and_then(Value::as_array).unwrap();
    assert_eq!(methods.get(0).and_then(Value::as_str), Some("POST"));

    // The child's own method shadows the parent's.
    assert!(!adapter.get_method("App\\Model\\Foo", "barMethod").unwrap().has("Transactional"));
    assert!(adapter.get_method("App\\Model\\Foo", "delete").unwrap().has("Hook"));

    let status = adapter.get_constant("App\\Model\\Foo", "STATUS").unwrap();
    let values = status.get("Enum").unwrap().argument(0).and_then(Value::as_array).unwrap();
    assert_eq!(values.len(), 2);
}

#[test]
fn reader_follows_php_visibility_and_interfaces() {
    let dir = create_psr4_workspace(
        COMPOSER,
        &[
            (
                "src/P.php",
                "<?php\nnamespace App;\n\nclass P\n{\n    /** @Secret */\n    private $token;\n\n    /** @Hidden */\n    private const K = 1;\n}\n",
            ),
            (
                "src/I.php",
                "<?php\nnamespace App;\n\ninterface I\n{\n    /** @Flag */\n    const F = 1;\n}\n",
            ),
            ("src/C.php", "<?php\nnamespace App;\n\nclass C extends P implements I {}\n"),
        ],
    );
    let reader = PhpReader::for_workspace(dir.path());
    let data = reader.parse("App\\C").unwrap();

    assert!(data.properties.is_empty());
    let constants: Vec<_> = data.constants.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(constants, vec!["F"]);
    assert_eq!(data.constants[0].1[0].name.as_deref(), Some("Flag"));
}

#[test]
fn syntax_errors_reach_the_adapter_caller() {
    let dir = create_psr4_workspace(
        COMPOSER,
        &[(
            "src/Broken.php",
            "<?php\nnamespace App;\n\nclass Broken\n{\n    /**\n     * @Column(type=)\n     */\n    public $x;\n}\n",
        )],
    );
    let mut adapter = Adapter::memory();
    adapter.set_reader(PhpReader::for_workspace(dir.path()));

    let err = adapter.get("App\\Broken").unwrap_err();
    match err {
        AnnotationsError::Syntax { file, line, .. } => {
            assert!(file.ends_with("Broken.php"));
            assert_eq!(line, 7);
        }
        other => panic!("expected syntax error, got {other:?}"),
    }
}

#[test]
fn unknown_classes_are_errors() {
    let dir = workspace();
    let reader = PhpReader::for_workspace(dir.path());
    let err = reader.parse("App\\Model\\Missing").unwrap_err();
    assert_eq!(err.to_string(), "Class 'App\\Model\\Missing' does not exist");
}

#[test]
fn scanning_indexes_every_declaration() {
    let dir = workspace();
    std::fs::write(
        dir.path().join("src/Model/Status.php"),
        "<?php\nnamespace App\\Model;\n\nenum Status\n{\n    /** @Label(\"On\") */\n    case Active;\n}\n\ninterface Stored {}\n",
    )
    .unwrap();

    let index = SourceIndex::new();
    assert_eq!(index.scan_directory(dir.path()).unwrap(), 5);

    let status = index.reflect("App\\Model\\Status").unwrap();
    assert_eq!(status.kind, ClassLikeKind::Enum);
    assert_eq!(status.constants[0].name, "Active");
    assert_eq!(index.reflect("app\\model\\stored").unwrap().kind, ClassLikeKind::Interface);
}
