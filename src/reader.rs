//! Assembling a class's raw annotation tree.
//!
//! A [`Reader`] turns a class name into the [`ReflectionData`] the
//! reflection model is built from.  [`PhpReader`] does this by asking a
//! [`ClassSource`] for the class's docblocks and running each through
//! the docblock grammar.

use std::path::Path;

use crate::docblock::{self, EVAL_CODE};
use crate::error::Result;
use crate::node::AnnotationNode;
use crate::reflection::{MemberNodes, ReflectionData};
use crate::source::{ClassSource, MemberDoc, SourceIndex};

/// Produces the raw annotation tree of a class.
pub trait Reader {
    fn parse(&self, class_name: &str) -> Result<ReflectionData>;
}

impl<R: Reader + ?Sized> Reader for Box<R> {
    fn parse(&self, class_name: &str) -> Result<ReflectionData> {
        (**self).parse(class_name)
    }
}

/// Reader over PHP source code.
#[derive(Debug)]
pub struct PhpReader<S> {
    source: S,
}

impl<S: ClassSource> PhpReader<S> {
    pub fn new(source: S) -> Self {
        PhpReader { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl PhpReader<SourceIndex> {
    /// A reader autoloading classes through `<root>/composer.json`.
    pub fn for_workspace(root: &Path) -> Self {
        PhpReader::new(SourceIndex::for_workspace(root))
    }
}

impl<S: ClassSource> Reader for PhpReader<S> {
    fn parse(&self, class_name: &str) -> Result<ReflectionData> {
        let metadata = self.source.reflect(class_name)?;
        tracing::debug!("reading annotations of {}", metadata.name);

        let class = match &metadata.doc {
            Some(doc) => Some(docblock::parse(&doc.text, &metadata.file, doc.line)?),
            None => None,
        };

        Ok(ReflectionData {
            class,
            constants: parse_members(&metadata.constants)?,
            properties: parse_members(&metadata.properties)?,
            methods: parse_members(&metadata.methods)?,
        })
    }
}

/// Members without a docblock are left out entirely.
fn parse_members(members: &[MemberDoc]) -> Result<MemberNodes> {
    members
        .iter()
        .filter_map(|member| {
            let doc = member.doc.as_ref()?;
            Some(
                docblock::parse(&doc.text, &member.file, doc.line)
                    .map(|nodes| (member.name.clone(), nodes)),
            )
        })
        .collect()
}

/// Parse a free-standing docblock.
///
/// `file` defaults to `"eval code"` and `line` to 1.
pub fn parse_docblock(text: &str, file: Option<&str>, line: Option<u32>) -> Result<Vec<AnnotationNode>> {
    docblock::parse(text, file.unwrap_or(EVAL_CODE), line.unwrap_or(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnnotationsError;

    fn reader(php: &str) -> PhpReader<SourceIndex> {
        let index = SourceIndex::new();
        index.add_source("Foo.php", php);
        PhpReader::new(index)
    }

    #[test]
    fn members_without_docblocks_are_omitted() {
        let data = reader(
            "<?php\nclass Foo {\n    const A = 1;\n    /** @Column */\n    public $id;\n    public function save() {}\n}\n",
        )
        .parse("Foo")
        .unwrap();

        assert!(data.class.is_none());
        assert!(data.constants.is_empty());
        assert!(data.methods.is_empty());
        assert_eq!(data.properties.len(), 1);
        assert_eq!(data.properties[0].0, "id");
        assert_eq!(data.properties[0].1[0].name.as_deref(), Some("Column"));
    }

    #[test]
    fn nodes_carry_member_file_and_line() {
        let data = reader(
            "<?php\nclass Foo {\n\n    /**\n     * @Get(\"/\")\n     */\n    public function index() {}\n}\n",
        )
        .parse("Foo")
        .unwrap();

        let node = &data.methods[0].1[0];
        assert_eq!(node.file.as_deref(), Some("Foo.php"));
        assert_eq!(node.line, Some(5));
    }

    #[test]
    fn syntax_errors_propagate() {
        let err = reader("<?php\n/** @Broken( */\nclass Foo {}\n")
            .parse("Foo")
            .unwrap_err();
        assert!(matches!(err, AnnotationsError::Syntax { line: 2, .. }));
    }

    #[test]
    fn free_standing_docblock_defaults() {
        let err = parse_docblock("/** @Foo(", None, None).unwrap_err();
        assert_eq!(err.to_string(), "Syntax error, unexpected EOF in eval code on line 1");

        let nodes = parse_docblock("/** @Foo */", Some("x.php"), Some(9)).unwrap();
        assert_eq!(nodes[0].file.as_deref(), Some("x.php"));
        assert_eq!(nodes[0].line, Some(9));
    }
}
