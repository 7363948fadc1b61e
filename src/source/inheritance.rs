/// Inherited member merging.
///
/// Reflection on a class also reports members it inherits.  Members are
/// gathered with PHP's precedence:
///
///   class own > traits > parent chain > interfaces
///
/// A member already present (methods compared case-insensitively) is
/// never replaced by an inherited one.  Each merged member keeps the
/// file and line of the declaration it came from.
///
/// Trait members are copied into the using class, private ones
/// included.  Private constants and properties of parents stay hidden,
/// as PHP reflection hides them; private parent methods are still
/// listed.
use super::extract::ClassDecl;
use super::{ClassMetadata, MemberDoc, Visibility};

/// Guards against circular `extends` / `use` chains.
const MAX_DEPTH: u32 = 20;

pub(crate) fn resolve_class_with_inheritance(
    decl: &ClassDecl,
    class_loader: &dyn Fn(&str) -> Option<ClassDecl>,
) -> ClassMetadata {
    let mut metadata = ClassMetadata {
        kind: decl.kind,
        name: decl.name.clone(),
        file: decl.file.clone(),
        line: decl.line,
        doc: decl.doc.clone(),
        constants: Vec::new(),
        properties: Vec::new(),
        methods: Vec::new(),
    };
    merge_declaration(&mut metadata, decl, class_loader, 0, false);
    metadata
}

/// `inherited` is set once the walk has left the class and its traits.
fn merge_declaration(
    metadata: &mut ClassMetadata,
    decl: &ClassDecl,
    class_loader: &dyn Fn(&str) -> Option<ClassDecl>,
    depth: u32,
    inherited: bool,
) {
    merge_members(&mut metadata.constants, &decl.constants, |a, b| a == b, inherited);
    merge_members(&mut metadata.properties, &decl.properties, |a, b| a == b, inherited);
    merge_members(&mut metadata.methods, &decl.methods, str::eq_ignore_ascii_case, false);

    if depth >= MAX_DEPTH {
        tracing::warn!(
            "inheritance of {} is deeper than {} levels; stopping",
            metadata.name,
            MAX_DEPTH
        );
        return;
    }

    let traits = decl.traits.iter().map(|name| (name, inherited));
    let ancestors = decl.parent.iter().chain(&decl.interfaces).map(|name| (name, true));
    for (ancestor, inherited) in traits.chain(ancestors) {
        match class_loader(ancestor) {
            Some(ancestor_decl) => {
                merge_declaration(metadata, &ancestor_decl, class_loader, depth + 1, inherited)
            }
            None => tracing::debug!("{} uses unknown class-like {}", decl.name, ancestor),
        }
    }
}

fn merge_members(
    target: &mut Vec<MemberDoc>,
    source: &[MemberDoc],
    same: fn(&str, &str) -> bool,
    skip_private: bool,
) {
    for member in source {
        if skip_private && member.visibility == Visibility::Private {
            continue;
        }
        if !target.iter().any(|m| same(&m.name, &member.name)) {
            target.push(member.clone());
        }
    }
}
