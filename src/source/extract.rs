/// Class-like declaration extraction.
///
/// Parses one PHP file with `mago_syntax` and records, for every class,
/// interface, trait and enum, the docblocks the reader needs: the
/// declaration's own comment plus one per constant, enum case,
/// property and method.  `extends`, `implements` and `use Trait` names
/// are resolved to fully-qualified names through the file's namespace
/// and imports so the index can merge inherited members later.
use std::collections::HashMap;
use std::panic;

use mago_span::HasSpan;
use mago_syntax::ast::*;

use super::{ClassLikeKind, Docblock, MemberDoc, Visibility};

/// Everything known about one declaration before inheritance is merged.
#[derive(Debug, Clone)]
pub(crate) struct ClassDecl {
    pub kind: ClassLikeKind,
    /// Fully-qualified name without the leading `\`.
    pub name: String,
    pub file: String,
    pub line: u32,
    pub doc: Option<Docblock>,
    pub parent: Option<String>,
    /// `implements` of a class or enum; every `extends` of an interface.
    pub interfaces: Vec<String>,
    pub traits: Vec<String>,
    pub constants: Vec<MemberDoc>,
    pub properties: Vec<MemberDoc>,
    pub methods: Vec<MemberDoc>,
}

/// Source text, trivia and file label shared by the extraction helpers.
struct FileCtx<'a> {
    file: &'a str,
    content: &'a str,
    trivia: &'a [Trivia<'a>],
}

impl FileCtx<'_> {
    fn line_at(&self, offset: u32) -> u32 {
        let end = (offset as usize).min(self.content.len());
        memchr::memchr_iter(b'\n', &self.content.as_bytes()[..end]).count() as u32 + 1
    }

    /// The `/** */` comment directly above `node`, if any.
    ///
    /// Walks backwards through the trivia preceding the node; plain
    /// comments and whitespace are skipped, any code in between means
    /// the node has no docblock.
    fn docblock_for(&self, node: &impl HasSpan) -> Option<Docblock> {
        let node_start = node.span().start.offset;
        let candidates = self.trivia.partition_point(|t| t.span.start.offset < node_start);
        let bytes = self.content.as_bytes();
        let mut covered_from = node_start;

        for t in self.trivia[..candidates].iter().rev() {
            let gap = bytes
                .get(t.span.end.offset as usize..covered_from as usize)
                .unwrap_or(&[]);
            if !gap.iter().all(u8::is_ascii_whitespace) {
                return None;
            }

            match t.kind {
                TriviaKind::DocBlockComment => {
                    return Some(Docblock {
                        text: t.value.to_string(),
                        line: self.line_at(t.span.start.offset),
                    });
                }
                TriviaKind::WhiteSpace
                | TriviaKind::SingleLineComment
                | TriviaKind::MultiLineComment
                | TriviaKind::HashComment => covered_from = t.span.start.offset,
            }
        }

        None
    }

    fn member(
        &self,
        name: impl Into<String>,
        visibility: Visibility,
        node: &impl HasSpan,
        doc: Option<Docblock>,
    ) -> MemberDoc {
        MemberDoc {
            name: name.into(),
            visibility,
            file: self.file.to_string(),
            line: self.line_at(node.span().start.offset),
            doc,
        }
    }
}

/// Namespace and `use` imports in effect at a point of the file.
#[derive(Default)]
struct Scope {
    namespace: Option<String>,
    imports: HashMap<String, String>,
}

impl Scope {
    /// Resolve a class reference to its fully-qualified name.
    fn resolve(&self, name: &str) -> String {
        if let Some(absolute) = name.strip_prefix('\\') {
            return absolute.to_string();
        }

        let (first, rest) = match name.find('\\') {
            Some(pos) => (&name[..pos], &name[pos..]),
            None => (name, ""),
        };
        if let Some(imported) = self.imports.get(&first.to_ascii_lowercase()) {
            return format!("{}{}", imported, rest);
        }

        match &self.namespace {
            Some(ns) => format!("{}\\{}", ns, name),
            None => name.to_string(),
        }
    }

    fn qualify(&self, short: &str) -> String {
        match &self.namespace {
            Some(ns) => format!("{}\\{}", ns, short),
            None => short.to_string(),
        }
    }

    fn import_all(&mut self, items: &UseItems) {
        match items {
            UseItems::Sequence(seq) => {
                for item in seq.items.iter() {
                    self.import(item, None);
                }
            }
            UseItems::TypedSequence(seq) => {
                if seq.r#type.is_function() || seq.r#type.is_const() {
                    return;
                }
                for item in seq.items.iter() {
                    self.import(item, None);
                }
            }
            UseItems::TypedList(list) => {
                if list.r#type.is_function() || list.r#type.is_const() {
                    return;
                }
                let prefix = list.namespace.value();
                for item in list.items.iter() {
                    self.import(item, Some(prefix));
                }
            }
            UseItems::MixedList(list) => {
                let prefix = list.namespace.value();
                for maybe_typed in list.items.iter() {
                    if let Some(ref t) = maybe_typed.r#type
                        && (t.is_function() || t.is_const())
                    {
                        continue;
                    }
                    self.import(&maybe_typed.item, Some(prefix));
                }
            }
        }
    }

    fn import(&mut self, item: &UseItem, group_prefix: Option<&str>) {
        let name = item.name.value().trim_start_matches('\\');
        let fqn = match group_prefix {
            Some(prefix) => format!("{}\\{}", prefix.trim_start_matches('\\'), name),
            None => name.to_string(),
        };
        let alias = match &item.alias {
            Some(alias) => alias.identifier.value.to_string(),
            None => fqn.rsplit('\\').next().unwrap_or(&fqn).to_string(),
        };
        // Class names and their aliases are case-insensitive in PHP.
        self.imports.insert(alias.to_ascii_lowercase(), fqn);
    }
}

/// Parse `content` and return every class-like declaration in it.
///
/// The parser can panic on badly broken input; such a file is logged
/// and contributes nothing.
pub(crate) fn extract_classes(file: &str, content: &str) -> Vec<ClassDecl> {
    let result = panic::catch_unwind(panic::AssertUnwindSafe(|| {
        let arena = bumpalo::Bump::new();
        let file_id = mago_database::file::FileId::new(file);
        let program = mago_syntax::parser::parse_file_content(&arena, file_id, content);

        let ctx = FileCtx {
            file,
            content,
            trivia: program.trivia.as_slice(),
        };

        let mut classes = Vec::new();
        let mut scope = Scope::default();
        walk_statements(program.statements.iter(), &ctx, &mut scope, &mut classes);
        classes
    }));

    match result {
        Ok(classes) => classes,
        Err(_) => {
            tracing::error!("PHP parser panicked while reading {}; skipping file", file);
            Vec::new()
        }
    }
}

fn walk_statements<'a>(
    statements: impl Iterator<Item = &'a Statement<'a>>,
    ctx: &FileCtx<'_>,
    scope: &mut Scope,
    classes: &mut Vec<ClassDecl>,
) {
    for statement in statements {
        match statement {
            Statement::Use(use_stmt) => scope.import_all(&use_stmt.items),
            Statement::Namespace(namespace) => {
                let mut inner = Scope {
                    namespace: namespace
                        .name
                        .as_ref()
                        .map(|ident| ident.value().to_string())
                        .filter(|name| !name.is_empty()),
                    imports: HashMap::new(),
                };
                walk_statements(namespace.statements().iter(), ctx, &mut inner, classes);
            }
            Statement::Class(class) => {
                let parent = class
                    .extends
                    .as_ref()
                    .and_then(|ext| ext.types.first().map(|ident| scope.resolve(ident.value())));
                let mut decl = declaration(ClassLikeKind::Class, class.name.value, class, ctx, scope);
                decl.parent = parent;
                decl.interfaces = class
                    .implements
                    .as_ref()
                    .map(|imp| imp.types.iter().map(|ident| scope.resolve(ident.value())).collect())
                    .unwrap_or_default();
                collect_members(class.members.iter(), ctx, scope, &mut decl);
                classes.push(decl);
            }
            Statement::Interface(iface) => {
                let mut decl =
                    declaration(ClassLikeKind::Interface, iface.name.value, iface, ctx, scope);
                decl.interfaces = iface
                    .extends
                    .as_ref()
                    .map(|ext| ext.types.iter().map(|ident| scope.resolve(ident.value())).collect())
                    .unwrap_or_default();
                collect_members(iface.members.iter(), ctx, scope, &mut decl);
                classes.push(decl);
            }
            Statement::Trait(trait_def) => {
                let mut decl =
                    declaration(ClassLikeKind::Trait, trait_def.name.value, trait_def, ctx, scope);
                collect_members(trait_def.members.iter(), ctx, scope, &mut decl);
                classes.push(decl);
            }
            Statement::Enum(enum_def) => {
                let mut decl =
                    declaration(ClassLikeKind::Enum, enum_def.name.value, enum_def, ctx, scope);
                decl.interfaces = enum_def
                    .implements
                    .as_ref()
                    .map(|imp| imp.types.iter().map(|ident| scope.resolve(ident.value())).collect())
                    .unwrap_or_default();
                collect_members(enum_def.members.iter(), ctx, scope, &mut decl);
                classes.push(decl);
            }
            _ => {}
        }
    }
}

fn declaration(
    kind: ClassLikeKind,
    short_name: &str,
    node: &impl HasSpan,
    ctx: &FileCtx<'_>,
    scope: &Scope,
) -> ClassDecl {
    ClassDecl {
        kind,
        name: scope.qualify(short_name),
        file: ctx.file.to_string(),
        line: ctx.line_at(node.span().start.offset),
        doc: ctx.docblock_for(node),
        parent: None,
        interfaces: Vec::new(),
        traits: Vec::new(),
        constants: Vec::new(),
        properties: Vec::new(),
        methods: Vec::new(),
    }
}

fn collect_members<'a>(
    members: impl Iterator<Item = &'a ClassLikeMember<'a>>,
    ctx: &FileCtx<'_>,
    scope: &Scope,
    decl: &mut ClassDecl,
) {
    for member in members {
        match member {
            ClassLikeMember::Method(method) => {
                let doc = ctx.docblock_for(method);
                let visibility = visibility(method.modifiers.iter());
                decl.methods.push(ctx.member(method.name.value, visibility, method, doc));
            }
            ClassLikeMember::Property(property) => {
                let doc = ctx.docblock_for(member);
                let visibility = visibility(property.modifiers().iter());
                for var in property.variables().iter() {
                    let raw = var.name.to_string();
                    let name = raw.strip_prefix('$').unwrap_or(&raw);
                    decl.properties.push(ctx.member(name, visibility, member, doc.clone()));
                }
            }
            ClassLikeMember::Constant(constant) => {
                let doc = ctx.docblock_for(member);
                let visibility = visibility(constant.modifiers.iter());
                for item in constant.items.iter() {
                    decl.constants
                        .push(ctx.member(item.name.value, visibility, member, doc.clone()));
                }
            }
            ClassLikeMember::EnumCase(enum_case) => {
                let doc = ctx.docblock_for(member);
                decl.constants.push(ctx.member(
                    enum_case.item.name().value,
                    Visibility::Public,
                    member,
                    doc,
                ));
            }
            ClassLikeMember::TraitUse(trait_use) => {
                decl.traits.extend(
                    trait_use
                        .trait_names
                        .iter()
                        .map(|ident| scope.resolve(ident.value())),
                );
            }
        }
    }
}

/// The first visibility modifier; `Public` when there is none.
fn visibility<'a>(modifiers: impl Iterator<Item = &'a Modifier<'a>>) -> Visibility {
    for m in modifiers {
        if m.is_private() {
            return Visibility::Private;
        }
        if m.is_protected() {
            return Visibility::Protected;
        }
        if m.is_public() {
            return Visibility::Public;
        }
    }
    Visibility::Public
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_imports_and_namespace() {
        let php = concat!(
            "<?php\n",
            "namespace App\\Model;\n",
            "use Base\\Entity as BaseEntity;\n",
            "use Base\\Traits\\Timestamps;\n",
            "class User extends BaseEntity {\n",
            "    use Timestamps, Local;\n",
            "}\n",
        );
        let classes = extract_classes("User.php", php);
        assert_eq!(classes.len(), 1);
        let user = &classes[0];
        assert_eq!(user.name, "App\\Model\\User");
        assert_eq!(user.parent.as_deref(), Some("Base\\Entity"));
        assert_eq!(user.traits, vec!["Base\\Traits\\Timestamps", "App\\Model\\Local"]);
    }

    #[test]
    fn records_docblocks_and_lines() {
        let php = concat!(
            "<?php\n",
            "/**\n",
            " * @Stored\n",
            " */\n",
            "class Foo {\n",
            "    /** @Identity */\n",
            "    public int $id;\n",
            "    // not a docblock\n",
            "    public $plain;\n",
            "    /** @Max(3) */\n",
            "    const LIMIT = 3, OTHER = 4;\n",
            "    /** @Get */\n",
            "    public function bar() {}\n",
            "}\n",
        );
        let classes = extract_classes("Foo.php", php);
        let foo = &classes[0];

        let doc = foo.doc.as_ref().unwrap();
        assert_eq!(doc.line, 2);
        assert!(doc.text.contains("@Stored"));
        assert_eq!(foo.line, 5);

        let names: Vec<&str> = foo.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["id", "plain"]);
        assert!(foo.properties[0].doc.is_some());
        assert!(foo.properties[1].doc.is_none());

        assert_eq!(foo.constants.len(), 2);
        assert!(foo.constants.iter().all(|c| c.doc.is_some()));

        assert_eq!(foo.methods[0].name, "bar");
        assert_eq!(foo.methods[0].doc.as_ref().unwrap().line, 12);
    }

    #[test]
    fn records_interfaces_and_visibility() {
        let php = concat!(
            "<?php\n",
            "namespace App;\n",
            "use Contracts\\Named;\n",
            "interface Entity extends Named, \\Countable {}\n",
            "class User implements Entity, Named {\n",
            "    private const SALT = 'x';\n",
            "    protected $email;\n",
            "    private static $count;\n",
            "    var $legacy;\n",
            "    private function hash() {}\n",
            "}\n",
        );
        let classes = extract_classes("User.php", php);

        let entity = &classes[0];
        assert_eq!(entity.kind, ClassLikeKind::Interface);
        assert!(entity.parent.is_none());
        assert_eq!(entity.interfaces, vec!["Contracts\\Named", "Countable"]);

        let user = &classes[1];
        assert_eq!(user.interfaces, vec!["App\\Entity", "Contracts\\Named"]);
        assert_eq!(user.constants[0].visibility, Visibility::Private);
        let properties: Vec<_> = user.properties.iter().map(|p| p.visibility).collect();
        assert_eq!(
            properties,
            vec![Visibility::Protected, Visibility::Private, Visibility::Public]
        );
        assert_eq!(user.methods[0].visibility, Visibility::Private);
    }

    #[test]
    fn code_between_comment_and_declaration_breaks_the_link() {
        let php = "<?php\n/** @Orphan */\n$x = 1;\nclass Foo {}\n";
        let classes = extract_classes("Foo.php", php);
        assert!(classes[0].doc.is_none());
    }
}
