/// A slot that starts out empty and is filled once the value becomes known.
#[derive(Debug)]
pub struct Nullable<T>(Option<T>);

impl<T> Nullable<T> {
    pub const fn null() -> Self {
        Self(None)
    }
}

impl<T> Nullable<T> {
    pub fn put(&mut self, val: T) {
        self.0 = Some(val);
    }
    pub fn get(&self) -> Option<&T> {
        self.0.as_ref()
    }
    /// Takes the value out, or hands back `err` when the slot was never filled.
    pub fn take_or<E>(&mut self, err: E) -> Result<T, E> {
        self.0.take().ok_or(err)
    }
}

impl<T> std::default::Default for Nullable<T> {
    fn default() -> Self {
        Self(None)
    }
}

#[cfg(test)]
mod tests {
    use super::Nullable;

    #[test]
    fn starts_null_and_takes_once() {
        let mut slot = Nullable::null();
        assert_eq!(slot.get(), None);
        slot.put(7u32);
        assert_eq!(slot.get(), Some(&7));
        assert_eq!(slot.take_or("missing"), Ok(7));
        assert_eq!(slot.take_or("missing"), Err("missing"));
    }
}
