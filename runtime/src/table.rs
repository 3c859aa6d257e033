use crate::bytecode::CodeBlock;
use crate::compiler;
use crate::environment::Environment;
use crate::strings::FinchString;
use finch_syntax::ast;
use std::{cell::RefCell, collections::HashMap, rc::Rc};

/// An id assigned by the string table.
pub type StringId = u32;

/// An id assigned by the block table.
pub type BlockId = u32;

/// An intern table that assigns each unique string a stable id.
///
/// Ids are dense, starting from zero, and are never reused; the table is
/// append-only for the environment's lifetime. Instructions refer to names
/// and string literals by these ids.
#[derive(Default)]
pub struct StringTable {
    strings: RefCell<Vec<FinchString>>,
    ids: RefCell<HashMap<FinchString, StringId>>,
}

impl StringTable {
    /// Get the id for a string, assigning the next free id if it has not
    /// been seen before. Equal strings always receive equal ids.
    pub fn intern(&self, string: impl Into<FinchString>) -> StringId {
        let string = string.into();

        if let Some(&id) = self.ids.borrow().get(&string) {
            return id;
        }

        let mut strings = self.strings.borrow_mut();
        let id = strings.len() as StringId;
        strings.push(string.clone());
        self.ids.borrow_mut().insert(string, id);

        id
    }

    /// Get the string assigned to an id. An unknown id is a compiler bug.
    pub fn find(&self, id: StringId) -> Option<FinchString> {
        self.strings.borrow().get(id as usize).cloned()
    }
}

/// The table of compiled code blocks, shared by every fiber in an
/// environment.
///
/// Like the string table it is append-only: block ids are dense and code
/// blocks live as long as the environment does.
#[derive(Default)]
pub struct BlockTable {
    blocks: RefCell<Vec<Rc<CodeBlock>>>,
}

impl BlockTable {
    /// Compile a block body into a fresh code block holding the given
    /// parameters, store it, and return its id. Compilation happens exactly
    /// once per call; duplicates are not detected.
    pub fn add(
        &self,
        params: Vec<FinchString>,
        body: &[ast::Expr],
        environment: &Environment,
    ) -> BlockId {
        // Compile before taking the borrow; nested block literals re-enter
        // this table to register themselves.
        let code = compiler::compile(environment, params, body);

        let mut blocks = self.blocks.borrow_mut();
        let id = blocks.len() as BlockId;
        blocks.push(Rc::new(code));

        id
    }

    /// Get the code block assigned to an id.
    pub fn find(&self, id: BlockId) -> Option<Rc<CodeBlock>> {
        self.blocks.borrow().get(id as usize).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interned_strings_round_trip() {
        let table = StringTable::default();

        let id = table.intern("while:do:");
        assert_eq!(table.find(id).unwrap(), "while:do:");
    }

    #[test]
    fn equal_strings_share_an_id() {
        let table = StringTable::default();

        let a = table.intern("value");
        let b = table.intern(String::from("value"));
        let c = table.intern("other");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn ids_are_dense_from_zero() {
        let table = StringTable::default();

        assert_eq!(table.intern("a"), 0);
        assert_eq!(table.intern("b"), 1);
        assert_eq!(table.intern("a"), 0);
        assert_eq!(table.intern("c"), 2);
    }

    #[test]
    fn unknown_ids_are_absent() {
        let table = StringTable::default();

        assert!(table.find(42).is_none());
    }
}
