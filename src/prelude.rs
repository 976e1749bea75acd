use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

pub use crate::error::{Error, Result};
pub use crate::nullable::Nullable;

/// Shared, single-threaded mutable state handed to protocol listeners.
#[derive(Debug, Default)]
pub struct RcCell<T: ?Sized>(Rc<RefCell<T>>);

impl<T: ?Sized> Clone for RcCell<T> {
    fn clone(&self) -> Self {
        RcCell(self.0.clone())
    }
}

pub struct Weak<T: ?Sized>(std::rc::Weak<RefCell<T>>);

impl<T: ?Sized> Clone for Weak<T> {
    fn clone(&self) -> Self {
        Weak(self.0.clone())
    }
}

impl<T: ?Sized> Weak<T> {
    pub fn try_strong(&self) -> Option<RcCell<T>> {
        self.0.upgrade().map(RcCell)
    }
}

impl<T> RcCell<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }
}

impl<T: ?Sized> RcCell<T> {
    pub fn borrow(&self) -> Ref<'_, T> {
        (*self.0).borrow()
    }
    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        (*self.0).borrow_mut()
    }
    pub fn weak(&self) -> Weak<T> {
        Weak(Rc::downgrade(&self.0))
    }
}

impl<T> std::convert::From<T> for RcCell<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

pub fn null<T>() -> Nullable<T> {
    Default::default()
}

#[cfg(test)]
mod tests {
    use super::RcCell;

    #[test]
    fn weak_dies_with_last_strong() {
        let cell = RcCell::new(1);
        let weak = cell.weak();
        *weak.try_strong().unwrap().borrow_mut() += 1;
        assert_eq!(*cell.borrow(), 2);
        drop(cell);
        assert!(weak.try_strong().is_none());
    }
}
