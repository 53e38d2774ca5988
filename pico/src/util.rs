use core::cell::RefCell;

use cortex_m::interrupt::{free, CriticalSection, Mutex};

/// A global shared between `main` and interrupt handlers. Every access runs
/// inside a critical section.
pub struct GlobalCell<T> {
    cell: Mutex<RefCell<Option<T>>>,
}

impl<T> GlobalCell<T> {
    pub const fn empty() -> Self {
        GlobalCell {
            cell: Mutex::new(RefCell::new(None)),
        }
    }

    pub fn put(&self, value: T) {
        free(|cs| self.put_cs(cs, value));
    }

    pub fn put_cs(&self, cs: &CriticalSection, value: T) {
        self.cell.borrow(cs).replace(Some(value));
    }

    /// Run `f` on the value, if one has been put. Returns `None` when empty.
    pub fn with<F, A>(&self, f: F) -> Option<A>
    where
        F: FnOnce(&mut T) -> A,
    {
        free(|cs| self.with_cs(cs, f))
    }

    pub fn with_cs<F, A>(&self, cs: &CriticalSection, f: F) -> Option<A>
    where
        F: FnOnce(&mut T) -> A,
    {
        self.cell.borrow(cs).borrow_mut().as_mut().map(f)
    }
}
