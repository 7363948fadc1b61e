#![allow(dead_code)]

use std::cell::Cell;
use std::fs;
use std::rc::Rc;

use phannot::{AnnotationNode, LiteralKind, ParseNode, Reader, ReflectionData, Result};

/// Helper: create a temp workspace with a composer.json and PHP files.
pub fn create_psr4_workspace(composer_json: &str, files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    fs::write(dir.path().join("composer.json"), composer_json)
        .expect("failed to write composer.json");
    for (rel_path, content) in files {
        let full = dir.path().join(rel_path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).expect("failed to create dirs");
        }
        fs::write(&full, content).expect("failed to write PHP file");
    }
    dir
}

/// Reader stub returning fixed data and counting its invocations.
#[derive(Clone)]
pub struct CountingReader {
    pub calls: Rc<Cell<usize>>,
    data: ReflectionData,
}

impl CountingReader {
    pub fn new(data: ReflectionData) -> Self {
        CountingReader {
            calls: Rc::new(Cell::new(0)),
            data,
        }
    }
}

impl Reader for CountingReader {
    fn parse(&self, _class_name: &str) -> Result<ReflectionData> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.data.clone())
    }
}

pub fn string(value: &str) -> ParseNode {
    ParseNode::literal(LiteralKind::String, value)
}

/// `Foo`: `@Stored(table="users")` on the class, `@Identity` on the
/// `id` property and `@Route("/save")` on the `barMethod` method.
pub fn stored_users() -> ReflectionData {
    ReflectionData {
        class: Some(vec![
            AnnotationNode::new("Stored").with_argument(Some("table"), string("users")),
        ]),
        constants: Vec::new(),
        properties: vec![("id".to_string(), vec![AnnotationNode::new("Identity")])],
        methods: vec![(
            "barMethod".to_string(),
            vec![AnnotationNode::new("Route").with_argument(None, string("/save"))],
        )],
    }
}
