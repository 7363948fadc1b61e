//! Class introspection from PHP source.
//!
//! The reader needs, for one class, the docblocks of the class itself
//! and of each constant, property and method, each with the file and
//! line it comes from.  [`ClassSource`] is that contract;
//! [`SourceIndex`] fulfils it by parsing PHP files with `mago_syntax`.
//!
//! Classes are found three ways:
//! - sources registered explicitly ([`SourceIndex::add_source`],
//!   [`SourceIndex::add_file`]),
//! - a directory walk ([`SourceIndex::scan_directory`]),
//! - on demand through the project's composer PSR-4 mappings.
//!
//! # Submodules
//!
//! - [`extract`]: AST walk producing per-declaration records.
//! - [`inheritance`]: merging trait, parent and interface members.

mod extract;
mod inheritance;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::composer::Psr4Map;
use crate::error::{AnnotationsError, Result};

use extract::ClassDecl;

/// What kind of class-like a declaration is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassLikeKind {
    Class,
    Interface,
    Trait,
    Enum,
}

/// A `/** ... */` comment and the line it starts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Docblock {
    pub text: String,
    pub line: u32,
}

/// Visibility of a class member.
///
/// Members without an explicit modifier are `Public`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

/// A constant, property or method and its docblock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDoc {
    /// Member name; properties carry no `$`.
    pub name: String,
    pub visibility: Visibility,
    /// File declaring the member (a trait's or parent's file when
    /// inherited).
    pub file: String,
    /// Line of the declaration itself.
    pub line: u32,
    pub doc: Option<Docblock>,
}

/// Introspection result for one class, inherited members included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMetadata {
    pub kind: ClassLikeKind,
    /// Fully-qualified name without the leading `\`.
    pub name: String,
    pub file: String,
    pub line: u32,
    pub doc: Option<Docblock>,
    pub constants: Vec<MemberDoc>,
    pub properties: Vec<MemberDoc>,
    pub methods: Vec<MemberDoc>,
}

/// Supplies class metadata to the reader.
pub trait ClassSource {
    fn reflect(&self, class_name: &str) -> Result<ClassMetadata>;
}

impl<S: ClassSource + ?Sized> ClassSource for &S {
    fn reflect(&self, class_name: &str) -> Result<ClassMetadata> {
        (**self).reflect(class_name)
    }
}

impl<S: ClassSource + ?Sized> ClassSource for Arc<S> {
    fn reflect(&self, class_name: &str) -> Result<ClassMetadata> {
        (**self).reflect(class_name)
    }
}

/// Index of class-like declarations keyed by lower-cased
/// fully-qualified name.
#[derive(Debug, Default)]
pub struct SourceIndex {
    psr4: Psr4Map,
    classes: Mutex<HashMap<String, Arc<ClassDecl>>>,
    loaded_files: Mutex<HashSet<PathBuf>>,
}

fn index_key(class_name: &str) -> String {
    class_name.trim_start_matches('\\').to_ascii_lowercase()
}

impl SourceIndex {
    /// An index with no autoloading; classes must be added explicitly.
    pub fn new() -> Self {
        Self::default()
    }

    /// An index that autoloads through `<root>/composer.json`.
    pub fn for_workspace(root: &Path) -> Self {
        SourceIndex {
            psr4: Psr4Map::load(root),
            ..Self::default()
        }
    }

    /// Parse PHP source text and index its declarations under the
    /// `file` label.  Returns the number of declarations found.
    pub fn add_source(&self, file: &str, content: &str) -> usize {
        let declarations = extract::extract_classes(file, content);
        let count = declarations.len();

        let mut classes = self.classes.lock();
        for decl in declarations {
            tracing::debug!("indexed {} from {}", decl.name, file);
            classes.insert(index_key(&decl.name), Arc::new(decl));
        }
        count
    }

    /// Read and index a file; a file already indexed is skipped.
    pub fn add_file(&self, path: &Path) -> Result<usize> {
        if !self.loaded_files.lock().insert(path.to_path_buf()) {
            return Ok(0);
        }
        let content = std::fs::read_to_string(path).map_err(|source| AnnotationsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.add_source(&path.display().to_string(), &content))
    }

    /// Index every `.php` file below `dir`, honouring ignore files.
    pub fn scan_directory(&self, dir: &Path) -> Result<usize> {
        let mut count = 0;
        for entry in ignore::WalkBuilder::new(dir).build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("skipping unreadable entry under {}: {}", dir.display(), e);
                    continue;
                }
            };
            let is_php = entry.file_type().is_some_and(|t| t.is_file())
                && entry.path().extension().is_some_and(|ext| ext == "php");
            if is_php {
                count += self.add_file(entry.path())?;
            }
        }
        Ok(count)
    }

    /// Names of every indexed declaration, sorted.
    pub fn class_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .classes
            .lock()
            .values()
            .map(|decl| decl.name.clone())
            .collect();
        names.sort();
        names
    }

    /// Look a declaration up, autoloading it through PSR-4 on a miss.
    fn find(&self, class_name: &str) -> Option<Arc<ClassDecl>> {
        let key = index_key(class_name);
        if let Some(decl) = self.classes.lock().get(&key) {
            return Some(Arc::clone(decl));
        }

        let path = self.psr4.resolve(class_name)?;
        if let Err(e) = self.add_file(&path) {
            tracing::warn!("could not autoload {}: {}", class_name, e);
            return None;
        }
        self.classes.lock().get(&key).cloned()
    }
}

impl ClassSource for SourceIndex {
    fn reflect(&self, class_name: &str) -> Result<ClassMetadata> {
        let decl = self
            .find(class_name)
            .ok_or_else(|| AnnotationsError::ClassNotFound {
                class: class_name.to_string(),
            })?;

        let loader = |name: &str| self.find(name).map(|d| (*d).clone());
        Ok(inheritance::resolve_class_with_inheritance(&decl, &loader))
    }
}
