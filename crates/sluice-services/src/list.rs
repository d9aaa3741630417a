//! Doubly-linked list with stable node handles.
//!
//! Nodes live in an arena and are addressed by `NodeId`. A handle carries
//! the slot generation, so a handle to a removed node never aliases a
//! later node that reuses the slot. Head/tail insert and remove by handle
//! are O(1); search and positional index are O(n).

use std::fmt;

/// Handle to a node of one particular `List`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: usize,
    generation: u64,
}

/// Iteration direction for a [`Cursor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    FromHead,
    FromTail,
}

#[derive(Debug, Clone, Copy, Default)]
struct Link {
    prev: Option<usize>,
    next: Option<usize>,
    generation: u64,
}

pub struct List<T> {
    links: Vec<Link>,
    values: Vec<Option<T>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> List<T> {
    pub fn new() -> Self {
        Self {
            links: Vec::new(),
            values: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn front(&self) -> Option<NodeId> {
        self.head.map(|i| self.id_at(i))
    }

    pub fn back(&self) -> Option<NodeId> {
        self.tail.map(|i| self.id_at(i))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.slot(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.slot(id).and_then(|i| self.values[i].as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        let i = self.slot(id)?;
        self.values[i].as_mut()
    }

    pub fn next_of(&self, id: NodeId) -> Option<NodeId> {
        let i = self.slot(id)?;
        self.links[i].next.map(|n| self.id_at(n))
    }

    pub fn prev_of(&self, id: NodeId) -> Option<NodeId> {
        let i = self.slot(id)?;
        self.links[i].prev.map(|p| self.id_at(p))
    }

    pub fn push_front(&mut self, value: T) -> NodeId {
        let i = self.alloc(value);
        let head = self.head;
        self.link_between(i, None, head);
        self.id_at(i)
    }

    pub fn push_back(&mut self, value: T) -> NodeId {
        let i = self.alloc(value);
        let tail = self.tail;
        self.link_between(i, tail, None);
        self.id_at(i)
    }

    /// Insert before `at`. Returns `None` if `at` is not in the list.
    pub fn insert_before(&mut self, at: NodeId, value: T) -> Option<NodeId> {
        let at = self.slot(at)?;
        let prev = self.links[at].prev;
        let i = self.alloc(value);
        self.link_between(i, prev, Some(at));
        Some(self.id_at(i))
    }

    /// Insert after `at`. Returns `None` if `at` is not in the list.
    pub fn insert_after(&mut self, at: NodeId, value: T) -> Option<NodeId> {
        let at = self.slot(at)?;
        let next = self.links[at].next;
        let i = self.alloc(value);
        self.link_between(i, Some(at), next);
        Some(self.id_at(i))
    }

    /// Unlink a node and hand its value back.
    pub fn remove(&mut self, id: NodeId) -> Option<T> {
        let i = self.slot(id)?;
        self.unlink(i);
        let value = self.values[i].take();
        self.links[i] = Link {
            prev: None,
            next: None,
            generation: self.links[i].generation + 1,
        };
        self.free.push(i);
        value
    }

    pub fn pop_front(&mut self) -> Option<T> {
        let id = self.front()?;
        self.remove(id)
    }

    pub fn pop_back(&mut self) -> Option<T> {
        let id = self.back()?;
        self.remove(id)
    }

    pub fn clear(&mut self) {
        while self.pop_back().is_some() {}
    }

    /// Node at `index`: 0 is the head, -1 the tail. Out of range is `None`.
    pub fn index(&self, index: i64) -> Option<NodeId> {
        let (mut at, steps, forward) = if index < 0 {
            (self.tail, index.unsigned_abs() - 1, false)
        } else {
            (self.head, index as u64, true)
        };
        for _ in 0..steps {
            let i = at?;
            at = if forward {
                self.links[i].next
            } else {
                self.links[i].prev
            };
        }
        at.map(|i| self.id_at(i))
    }

    /// Move the tail node to the head.
    pub fn rotate(&mut self) {
        if self.len <= 1 {
            return;
        }
        let Some(tail) = self.tail else { return };
        self.unlink(tail);
        let head = self.head;
        self.link_between(tail, None, head);
    }

    /// First node equal to `key`.
    pub fn search_key(&self, key: &T) -> Option<NodeId>
    where
        T: PartialEq,
    {
        self.search_by(|v| v == key)
    }

    /// First node whose value satisfies `matches`.
    pub fn search_by(&self, mut matches: impl FnMut(&T) -> bool) -> Option<NodeId> {
        let mut cursor = self.cursor(Direction::FromHead);
        while let Some(id) = cursor.next(self) {
            if self.get(id).is_some_and(&mut matches) {
                return Some(id);
            }
        }
        None
    }

    /// Node holding exactly `value` (identity, not equality).
    pub fn search_ptr(&self, value: &T) -> Option<NodeId> {
        self.search_by(|v| std::ptr::eq(v, value))
    }

    /// Copy the list with a fallible per-value duplicator.
    ///
    /// On the first `None` the partial copy is dropped and `None` is
    /// returned. `self` is never modified.
    pub fn try_duplicate_with(&self, mut dup: impl FnMut(&T) -> Option<T>) -> Option<List<T>> {
        let mut copy = List::new();
        for value in self.iter() {
            copy.push_back(dup(value)?);
        }
        Some(copy)
    }

    /// Copy the list. For shared values (`Arc`, `Bytes`) this shares them.
    pub fn duplicate(&self) -> List<T>
    where
        T: Clone,
    {
        self.iter().cloned().collect()
    }

    /// Restartable cursor that does not borrow the list.
    pub fn cursor(&self, direction: Direction) -> Cursor {
        let mut cursor = Cursor {
            next: None,
            direction,
        };
        match direction {
            Direction::FromHead => cursor.rewind(self),
            Direction::FromTail => cursor.rewind_tail(self),
        }
        cursor
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            front: self.head,
            back: self.tail,
            remaining: self.len,
        }
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn id_at(&self, i: usize) -> NodeId {
        NodeId {
            index: i,
            generation: self.links[i].generation,
        }
    }

    fn slot(&self, id: NodeId) -> Option<usize> {
        let link = self.links.get(id.index)?;
        if link.generation != id.generation || self.values[id.index].is_none() {
            return None;
        }
        Some(id.index)
    }

    fn alloc(&mut self, value: T) -> usize {
        match self.free.pop() {
            Some(i) => {
                self.values[i] = Some(value);
                i
            }
            None => {
                self.links.push(Link::default());
                self.values.push(Some(value));
                self.links.len() - 1
            }
        }
    }

    fn link_between(&mut self, i: usize, prev: Option<usize>, next: Option<usize>) {
        self.links[i].prev = prev;
        self.links[i].next = next;
        match prev {
            Some(p) => self.links[p].next = Some(i),
            None => self.head = Some(i),
        }
        match next {
            Some(n) => self.links[n].prev = Some(i),
            None => self.tail = Some(i),
        }
        self.len += 1;
    }

    fn unlink(&mut self, i: usize) {
        let Link { prev, next, .. } = self.links[i];
        match prev {
            Some(p) => self.links[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.links[n].prev = prev,
            None => self.tail = prev,
        }
        self.links[i].prev = None;
        self.links[i].next = None;
        self.len -= 1;
    }
}

impl<T> FromIterator<T> for List<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = List::new();
        for value in iter {
            list.push_back(value);
        }
        list
    }
}

impl<'a, T> IntoIterator for &'a List<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<T: fmt::Debug> fmt::Debug for List<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Cursor over a list that survives removal of the node it just returned.
///
/// Removing any other node while a cursor is live ends the walk early.
#[derive(Debug, Clone, Copy)]
pub struct Cursor {
    next: Option<NodeId>,
    direction: Direction,
}

impl Cursor {
    pub fn next<T>(&mut self, list: &List<T>) -> Option<NodeId> {
        let current = self.next?;
        if !list.contains(current) {
            self.next = None;
            return None;
        }
        self.next = match self.direction {
            Direction::FromHead => list.next_of(current),
            Direction::FromTail => list.prev_of(current),
        };
        Some(current)
    }

    /// Restart from the head, walking forward.
    pub fn rewind<T>(&mut self, list: &List<T>) {
        self.direction = Direction::FromHead;
        self.next = list.front();
    }

    /// Restart from the tail, walking backward.
    pub fn rewind_tail<T>(&mut self, list: &List<T>) {
        self.direction = Direction::FromTail;
        self.next = list.back();
    }
}

pub struct Iter<'a, T> {
    list: &'a List<T>,
    front: Option<usize>,
    back: Option<usize>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let i = self.front?;
        self.front = self.list.links[i].next;
        self.remaining -= 1;
        self.list.values[i].as_ref()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let i = self.back?;
        self.back = self.list.links[i].prev;
        self.remaining -= 1;
        self.list.values[i].as_ref()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
