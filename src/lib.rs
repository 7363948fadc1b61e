//! PHP docblock annotations.
//!
//! Reads `@Name(arguments...)` annotations from the docblocks of PHP
//! classes, constants, properties and methods, and caches the result
//! per class.
//!
//! ```text
//! Adapter::get(class)
//!   ├─ adapter map / cache backend ──► Rc<Reflection>
//!   └─ Reader::parse(class)
//!        ├─ SourceIndex: class metadata from PHP source
//!        └─ docblock::parse: grammar → AnnotationNode tree
//! Reflection ──(lazily)──► Collection ──► Annotation
//! ```
//!
//! - [`node`]: the tagged parse tree produced by the grammar.
//! - [`annotation`]: resolution of one annotation node into values.
//! - [`collection`]: the annotations of one docblock.
//! - [`reflection`]: the per-class model with memoized views.
//! - [`docblock`]: the docblock grammar.
//! - [`source`]: class introspection over PHP files.
//! - [`composer`]: PSR-4 autoload mappings.
//! - [`reader`]: assembling a class's annotation tree.
//! - [`adapter`]: caching in front of the reader.
//! - [`factory`]: adapters from configuration.

pub mod adapter;
pub mod annotation;
pub mod collection;
pub mod composer;
pub mod docblock;
pub mod error;
pub mod factory;
pub mod node;
pub mod reader;
pub mod reflection;
pub mod source;

pub use adapter::{
    Adapter, AdapterOptions, Apcu, CacheBackend, ClassName, DEFAULT_LIFETIME, Memory, SharedCache,
};
pub use annotation::{Annotation, ArgumentKey, Arguments, Value};
pub use collection::Collection;
pub use error::{AnnotationsError, Result};
pub use factory::{AdapterConstructor, AnnotationsConfig, AnnotationsFactory};
pub use node::{AnnotationNode, ExprItem, LiteralKind, ParseNode};
pub use reader::{PhpReader, Reader, parse_docblock};
pub use reflection::{MemberCollections, Reflection, ReflectionData};
pub use source::{
    ClassLikeKind, ClassMetadata, ClassSource, Docblock, MemberDoc, SourceIndex, Visibility,
};
