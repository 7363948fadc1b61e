use std::collections::HashMap;
use std::rc::Rc;

use crate::error::Result;
use crate::reflection::Reflection;

use super::CacheBackend;

/// Process-local backend.  Keys ignore case; entries never expire.
#[derive(Debug, Default)]
pub struct Memory {
    data: HashMap<String, Rc<Reflection>>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl CacheBackend for Memory {
    fn read(&mut self, key: &str) -> Result<Option<Rc<Reflection>>> {
        Ok(self.data.get(&key.to_lowercase()).cloned())
    }

    fn write(&mut self, key: &str, reflection: &Rc<Reflection>) -> Result<bool> {
        self.data.insert(key.to_lowercase(), Rc::clone(reflection));
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_ignore_case() {
        let mut memory = Memory::new();
        let reflection = Rc::new(Reflection::default());
        assert!(memory.write("App\\User", &reflection).unwrap());

        let found = memory.read("app\\USER").unwrap().unwrap();
        assert!(Rc::ptr_eq(&found, &reflection));
        assert!(memory.read("App\\Post").unwrap().is_none());
        assert_eq!(memory.len(), 1);
    }
}
