// src/shader_graph/uniform.rs

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// A named value shared between the shader graph (read every frame) and whatever
/// edits it between frames. Clones share the same cell.
pub struct Uniform<T: Copy> {
    name: Rc<str>,
    cell: Rc<Cell<T>>,
}

impl<T: Copy> Uniform<T> {
    pub fn new(name: &str, value: T) -> Self {
        Self {
            name: Rc::from(name),
            cell: Rc::new(Cell::new(value)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self) -> T {
        self.cell.get()
    }

    pub fn set(&self, value: T) {
        self.cell.set(value);
    }

    // Identity is the shared cell, not the name.
    pub fn same_as(&self, other: &Uniform<T>) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }
}

impl<T: Copy> Clone for Uniform<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            cell: self.cell.clone(),
        }
    }
}

impl<T: Copy + fmt::Debug> fmt::Debug for Uniform<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Uniform")
            .field("name", &self.name)
            .field("value", &self.cell.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_latest_write() {
        let freq = Uniform::new("frequency", 1.0_f32);
        let reader = freq.clone();
        freq.set(2.5);
        assert_eq!(reader.get(), 2.5);
        assert!(reader.same_as(&freq));
    }

    #[test]
    fn same_name_is_not_same_uniform() {
        let a = Uniform::new("speed", 1.0_f32);
        let b = Uniform::new("speed", 1.0_f32);
        assert!(!a.same_as(&b));
        assert_eq!(a.name(), b.name());
    }
}
