//! Cached access to class annotations.
//!
//! An [`Adapter`] hands out one [`Reflection`] per class.  Lookups go
//! through three layers, stopping at the first hit:
//!
//! 1. the adapter's own map (exact class name),
//! 2. the [`CacheBackend`] (in-process [`Memory`] or shared [`Apcu`]),
//! 3. the [`Reader`], whose result is written back to both.
//!
//! Once a class is in the adapter's map the reader is never asked for
//! it again, whatever happens to the backend.
//!
//! # Submodules
//!
//! - [`memory`]: process-local backend.
//! - [`apcu`]: backend over a [`SharedCache`] with expiry.
//! - [`shared`]: the TTL key-value store itself.

mod apcu;
mod memory;
mod shared;

pub use apcu::Apcu;
pub use memory::Memory;
pub use shared::SharedCache;

use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use serde_json::Value as JsonValue;

use crate::collection::Collection;
use crate::error::Result;
use crate::reader::{PhpReader, Reader};
use crate::reflection::{MemberCollections, Reflection};

/// Lifetime of shared cache entries when none is configured: 48 hours.
pub const DEFAULT_LIFETIME: u64 = 172_800;

static EMPTY_COLLECTION: Collection = Collection::empty();

/// Storage consulted before the reader.
pub trait CacheBackend {
    /// `Ok(None)` is a miss.
    fn read(&mut self, key: &str) -> Result<Option<Rc<Reflection>>>;

    /// Failures are logged by the adapter, which still serves the
    /// result.
    fn write(&mut self, key: &str, reflection: &Rc<Reflection>) -> Result<bool>;
}

impl<B: CacheBackend + ?Sized> CacheBackend for Box<B> {
    fn read(&mut self, key: &str) -> Result<Option<Rc<Reflection>>> {
        (**self).read(key)
    }

    fn write(&mut self, key: &str, reflection: &Rc<Reflection>) -> Result<bool> {
        (**self).write(key, reflection)
    }
}

/// Anything that names a class: a class name, or a value standing for
/// an instance of one.
pub trait ClassName {
    fn class_name(&self) -> &str;
}

impl ClassName for str {
    fn class_name(&self) -> &str {
        self
    }
}

impl ClassName for String {
    fn class_name(&self) -> &str {
        self
    }
}

impl<T: ClassName + ?Sized> ClassName for &T {
    fn class_name(&self) -> &str {
        (**self).class_name()
    }
}

/// Backend options, as given to the factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterOptions {
    /// Extra key prefix for shared backends.
    pub prefix: String,
    /// Entry lifetime in seconds.
    pub lifetime: u64,
}

impl Default for AdapterOptions {
    fn default() -> Self {
        AdapterOptions {
            prefix: String::new(),
            lifetime: DEFAULT_LIFETIME,
        }
    }
}

impl AdapterOptions {
    /// Read options leniently: `prefix` is taken only when it is a
    /// non-empty string, `lifetime` only when it is a positive integer.
    /// Anything else keeps the default.
    pub fn from_value(value: &JsonValue) -> Self {
        let mut options = AdapterOptions::default();
        if let Some(prefix) = value.get("prefix").and_then(JsonValue::as_str)
            && !prefix.is_empty()
        {
            options.prefix = prefix.to_string();
        }
        if let Some(lifetime) = value.get("lifetime").and_then(JsonValue::as_u64)
            && lifetime > 0
        {
            options.lifetime = lifetime;
        }
        options
    }
}

/// Annotation cache in front of a [`Reader`].
pub struct Adapter {
    annotations: HashMap<String, Rc<Reflection>>,
    reader: Option<Box<dyn Reader>>,
    backend: Box<dyn CacheBackend>,
}

impl std::fmt::Debug for Adapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adapter")
            .field("classes", &self.annotations.keys().collect::<Vec<_>>())
            .field("has_reader", &self.reader.is_some())
            .finish()
    }
}

impl Adapter {
    pub fn new(backend: impl CacheBackend + 'static) -> Self {
        Adapter {
            annotations: HashMap::new(),
            reader: None,
            backend: Box::new(backend),
        }
    }

    /// An adapter whose backend lives only as long as the adapter.
    pub fn memory() -> Self {
        Adapter::new(Memory::new())
    }

    /// An adapter backed by the process-wide [`SharedCache`].
    pub fn apcu(options: &AdapterOptions) -> Self {
        Adapter::new(Apcu::new(options))
    }

    /// The [`Reflection`] of a class, parsing it at most once.
    pub fn get<C: ClassName + ?Sized>(&mut self, class: &C) -> Result<Rc<Reflection>> {
        self.load(class.class_name()).map(Rc::clone)
    }

    /// Annotations of one constant; empty when it has none.
    pub fn get_constant<C: ClassName + ?Sized>(
        &mut self,
        class: &C,
        constant: &str,
    ) -> Result<&Collection> {
        let reflection = self.load(class.class_name())?;
        Ok(reflection
            .constants_annotations()
            .get(constant)
            .unwrap_or(&EMPTY_COLLECTION))
    }

    pub fn get_constants<C: ClassName + ?Sized>(&mut self, class: &C) -> Result<&MemberCollections> {
        Ok(self.load(class.class_name())?.constants_annotations())
    }

    /// Annotations of one property; empty when it has none.
    pub fn get_property<C: ClassName + ?Sized>(
        &mut self,
        class: &C,
        property: &str,
    ) -> Result<&Collection> {
        let reflection = self.load(class.class_name())?;
        Ok(reflection
            .properties_annotations()
            .get(property)
            .unwrap_or(&EMPTY_COLLECTION))
    }

    pub fn get_properties<C: ClassName + ?Sized>(&mut self, class: &C) -> Result<&MemberCollections> {
        Ok(self.load(class.class_name())?.properties_annotations())
    }

    /// Annotations of one method, matched ignoring case; empty when it
    /// has none.
    pub fn get_method<C: ClassName + ?Sized>(&mut self, class: &C, method: &str) -> Result<&Collection> {
        let reflection = self.load(class.class_name())?;
        Ok(reflection
            .methods_annotations()
            .get_ignore_case(method)
            .unwrap_or(&EMPTY_COLLECTION))
    }

    pub fn get_methods<C: ClassName + ?Sized>(&mut self, class: &C) -> Result<&MemberCollections> {
        Ok(self.load(class.class_name())?.methods_annotations())
    }

    /// The reader, creating a [`PhpReader`] over the current directory
    /// when none was set.
    pub fn reader(&mut self) -> &dyn Reader {
        &**self.reader.get_or_insert_with(default_reader)
    }

    pub fn set_reader(&mut self, reader: impl Reader + 'static) {
        self.reader = Some(Box::new(reader));
    }

    fn load(&mut self, class_name: &str) -> Result<&Rc<Reflection>> {
        if !self.annotations.contains_key(class_name) {
            let reflection = self.fetch(class_name)?;
            self.annotations.insert(class_name.to_string(), reflection);
        }
        Ok(&self.annotations[class_name])
    }

    fn fetch(&mut self, class_name: &str) -> Result<Rc<Reflection>> {
        if let Some(reflection) = self.backend.read(class_name)? {
            tracing::debug!("annotations of {} served from cache", class_name);
            return Ok(reflection);
        }

        tracing::debug!("annotations of {} not cached; parsing", class_name);
        let data = self.reader().parse(class_name)?;
        let reflection = Rc::new(Reflection::new(data));
        // The parsed result is served even when the backend cannot keep it.
        match self.backend.write(class_name, &reflection) {
            Ok(true) => {}
            Ok(false) => tracing::warn!("cache backend refused annotations of {}", class_name),
            Err(e) => tracing::warn!("failed to cache annotations of {}: {}", class_name, e),
        }
        Ok(reflection)
    }
}

fn default_reader() -> Box<dyn Reader> {
    let root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    Box::new(PhpReader::for_workspace(&root))
}
