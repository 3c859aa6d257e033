//! Implementations of the primitive methods installed on the root
//! prototypes when an environment is built.
//!
//! A primitive registered on a prototype fires for every descendant that
//! does not shadow it, so the whole primitive library lives on the handful
//! of interned prototypes.

mod array;
mod block;
mod environment;
mod fiber;
mod number;
mod object;
mod string;

use crate::environment::Environment;
use crate::value::{DynamicObject, Value};

/// Install every primitive on the freshly built prototypes.
pub(crate) fn install(env: &Environment) {
    object::install(env);
    number::install(env);
    string::install(env);
    array::install(env);
    block::install(env);
    fiber::install(env);
    environment::install(env);
}

/// Get the primitive registry of a prototype object.
fn registry(prototype: &Value) -> &DynamicObject {
    prototype
        .as_dynamic()
        .expect("prototypes are dynamic objects")
}
