use super::handle::{HandleIndex, HandleLike};

/// A versioned slot storage. Every value lives behind an opaque handle `H`;
/// freed slots are recycled with a bumped version so stale handles resolve to
/// nothing.
pub struct Arena<H: HandleLike, T> {
    entries: Vec<Option<T>>,
    versions: Vec<HandleIndex>,
    frees: Vec<HandleIndex>,
    _marker: ::std::marker::PhantomData<H>,
}

impl<H: HandleLike, T> Default for Arena<H, T> {
    fn default() -> Self {
        Arena::new()
    }
}

impl<H: HandleLike, T> Arena<H, T> {
    pub fn new() -> Self {
        Arena {
            entries: Vec::new(),
            versions: Vec::new(),
            frees: Vec::new(),
            _marker: ::std::marker::PhantomData,
        }
    }

    /// Stores `value` and names it with a fresh handle.
    pub fn create(&mut self, value: T) -> H {
        if let Some(index) = self.frees.pop() {
            let i = index as usize;
            self.versions[i] += 1;
            self.entries[i] = Some(value);
            H::new(index, self.versions[i])
        } else {
            self.entries.push(Some(value));
            self.versions.push(1);
            H::new(self.entries.len() as HandleIndex - 1, 1)
        }
    }

    #[inline]
    pub fn is_alive(&self, handle: H) -> bool {
        let i = handle.index() as usize;
        i < self.entries.len() && self.versions[i] == handle.version() && self.entries[i].is_some()
    }

    #[inline]
    pub fn get(&self, handle: H) -> Option<&T> {
        if self.is_alive(handle) {
            self.entries[handle.index() as usize].as_ref()
        } else {
            None
        }
    }

    #[inline]
    pub fn get_mut(&mut self, handle: H) -> Option<&mut T> {
        if self.is_alive(handle) {
            self.entries[handle.index() as usize].as_mut()
        } else {
            None
        }
    }

    /// Removes the value named by `handle`, the slot is recycled.
    pub fn free(&mut self, handle: H) -> Option<T> {
        if !self.is_alive(handle) {
            return None;
        }

        self.frees.push(handle.index());
        self.entries[handle.index() as usize].take()
    }

    /// Removes every value, yielding them with their handles.
    pub fn drain(&mut self) -> Vec<(H, T)> {
        let mut values = Vec::with_capacity(self.len());
        for (i, entry) in self.entries.iter_mut().enumerate() {
            if let Some(v) = entry.take() {
                values.push((H::new(i as HandleIndex, self.versions[i]), v));
                self.frees.push(i as HandleIndex);
            }
        }

        values
    }

    pub fn iter(&self) -> impl Iterator<Item = (H, &T)> {
        let versions = &self.versions;
        self.entries.iter().enumerate().filter_map(move |(i, v)| {
            v.as_ref()
                .map(|v| (H::new(i as HandleIndex, versions[i]), v))
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len() - self.frees.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod test {
    use super::super::handle::Handle;
    use super::*;

    #[test]
    fn basic() {
        let mut arena = Arena::<Handle, i32>::new();

        let e1 = arena.create(3);
        assert_eq!(arena.get(e1), Some(&3));
        assert_eq!(arena.len(), 1);
        assert_eq!(arena.free(e1), Some(3));
        assert_eq!(arena.len(), 0);
        assert_eq!(arena.get(e1), None);
        assert_eq!(arena.free(e1), None);
    }

    #[test]
    fn recycle() {
        let mut arena = Arena::<Handle, &'static str>::new();

        let e1 = arena.create("a");
        arena.free(e1);

        let e2 = arena.create("b");
        assert_eq!(e1.index(), e2.index());
        assert_ne!(e1, e2);
        assert_eq!(arena.get(e1), None);
        assert_eq!(arena.get(e2), Some(&"b"));
    }

    #[test]
    fn drain() {
        let mut arena = Arena::<Handle, i32>::new();
        let e1 = arena.create(1);
        let e2 = arena.create(2);
        arena.free(e1);

        let values = arena.drain();
        assert_eq!(values, vec![(e2, 2)]);
        assert!(arena.is_empty());
        assert_eq!(arena.iter().count(), 0);
    }
}
