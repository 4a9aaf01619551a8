use super::ObjectId;

/// Slab of driver objects named by `ObjectId`. Ids start at one and freed ids
/// are recycled.
#[derive(Debug)]
pub struct ObjectTable<T> {
    buf: Vec<Option<T>>,
    frees: Vec<ObjectId>,
}

impl<T> Default for ObjectTable<T> {
    fn default() -> Self {
        ObjectTable::new()
    }
}

impl<T> ObjectTable<T> {
    pub fn new() -> Self {
        ObjectTable {
            buf: Vec::new(),
            frees: Vec::new(),
        }
    }

    pub fn create(&mut self, value: T) -> ObjectId {
        if let Some(id) = self.frees.pop() {
            self.buf[id as usize - 1] = Some(value);
            id
        } else {
            self.buf.push(Some(value));
            self.buf.len() as ObjectId
        }
    }

    pub fn get(&self, id: ObjectId) -> Option<&T> {
        if id == 0 {
            return None;
        }

        self.buf.get(id as usize - 1).and_then(|v| v.as_ref())
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut T> {
        if id == 0 {
            return None;
        }

        self.buf.get_mut(id as usize - 1).and_then(|v| v.as_mut())
    }

    pub fn free(&mut self, id: ObjectId) -> Option<T> {
        if id == 0 || self.buf.len() < id as usize {
            return None;
        }

        let value = self.buf[id as usize - 1].take();
        if value.is_some() {
            self.frees.push(id);
        }

        value
    }

    /// The number of live objects.
    pub fn len(&self) -> usize {
        self.buf.len() - self.frees.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn basic() {
        let mut table = ObjectTable::new();
        let a = table.create("a");
        let b = table.create("b");
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(table.get(0), None);
        assert_eq!(table.get(b), Some(&"b"));

        assert_eq!(table.free(a), Some("a"));
        assert_eq!(table.free(a), None);
        assert_eq!(table.len(), 1);

        let c = table.create("c");
        assert_eq!(c, a);
        assert_eq!(table.len(), 2);
    }
}
