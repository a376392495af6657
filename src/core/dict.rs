use std::cmp::Ordering;
use std::collections::HashMap;
use parking_lot::RwLock;
use crate::core::error::{Error, Result};
use crate::core::types::NameId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DictKind {
    FirstName,
    Surname,
    Country,
    City,
    Interest,
}

impl DictKind {
    fn slot(self) -> usize {
        match self {
            DictKind::FirstName => 0,
            DictKind::Surname => 1,
            DictKind::Country => 2,
            DictKind::City => 3,
            DictKind::Interest => 4,
        }
    }

    /// Largest id the group hash can carry for this kind.
    pub fn capacity(self) -> NameId {
        match self {
            DictKind::City => 0xffff,
            DictKind::Country | DictKind::Interest => 0xff,
            DictKind::FirstName | DictKind::Surname => NameId::MAX,
        }
    }
}

/// String interning boundary. Ids are dense, first-seen ordered, starting at 1.
pub trait Dictionary: Send + Sync {
    /// Fails once the kind holds `capacity()` names.
    fn intern(&self, kind: DictKind, value: &str) -> Result<NameId>;

    /// Id of an already interned value, never inserts.
    fn lookup(&self, kind: DictKind, value: &str) -> Option<NameId>;

    fn resolve(&self, kind: DictKind, id: NameId) -> Option<String>;

    fn len(&self, kind: DictKind) -> usize;

    /// Order two ids by their strings; 0 (absent) sorts before any name.
    fn compare(&self, kind: DictKind, a: NameId, b: NameId) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        self.resolve(kind, a).cmp(&self.resolve(kind, b))
    }
}

#[derive(Debug, Default)]
struct Table {
    ids: HashMap<String, NameId>,
    names: Vec<String>,
}

impl Table {
    fn name(&self, id: NameId) -> Option<&str> {
        if id == 0 {
            return None;
        }
        self.names.get(id as usize - 1).map(String::as_str)
    }
}

/// In-memory dictionary, one lock per kind.
#[derive(Debug, Default)]
pub struct Dicts {
    tables: [RwLock<Table>; 5],
}

impl Dicts {
    pub fn new() -> Self {
        Dicts::default()
    }
}

impl Dictionary for Dicts {
    fn intern(&self, kind: DictKind, value: &str) -> Result<NameId> {
        let table = &self.tables[kind.slot()];
        if let Some(&id) = table.read().ids.get(value) {
            return Ok(id);
        }

        let mut table = table.write();
        if let Some(&id) = table.ids.get(value) {
            return Ok(id);
        }
        if table.names.len() >= kind.capacity() as usize {
            return Err(Error::validation(format!("too many distinct {:?} values", kind)));
        }
        table.names.push(value.to_string());
        let id = table.names.len() as NameId;
        table.ids.insert(value.to_string(), id);
        Ok(id)
    }

    fn lookup(&self, kind: DictKind, value: &str) -> Option<NameId> {
        self.tables[kind.slot()].read().ids.get(value).copied()
    }

    fn resolve(&self, kind: DictKind, id: NameId) -> Option<String> {
        self.tables[kind.slot()].read().name(id).map(str::to_string)
    }

    fn len(&self, kind: DictKind) -> usize {
        self.tables[kind.slot()].read().names.len()
    }

    fn compare(&self, kind: DictKind, a: NameId, b: NameId) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        let table = self.tables[kind.slot()].read();
        table.name(a).cmp(&table.name(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_dense_and_stable() {
        let dicts = Dicts::new();
        assert_eq!(dicts.intern(DictKind::City, "Москва").unwrap(), 1);
        assert_eq!(dicts.intern(DictKind::City, "Амстердам").unwrap(), 2);
        assert_eq!(dicts.intern(DictKind::City, "Москва").unwrap(), 1);
        assert_eq!(dicts.intern(DictKind::Country, "Россия").unwrap(), 1);

        assert_eq!(dicts.lookup(DictKind::City, "Амстердам"), Some(2));
        assert_eq!(dicts.lookup(DictKind::City, "Лондон"), None);
        assert_eq!(dicts.resolve(DictKind::City, 1).as_deref(), Some("Москва"));
        assert_eq!(dicts.resolve(DictKind::City, 0), None);
        assert_eq!(dicts.len(DictKind::City), 2);
    }

    #[test]
    fn compare_by_name() {
        let dicts = Dicts::new();
        let moscow = dicts.intern(DictKind::City, "Москва").unwrap();
        let amsterdam = dicts.intern(DictKind::City, "Амстердам").unwrap();

        assert_eq!(dicts.compare(DictKind::City, amsterdam, moscow), Ordering::Less);
        assert_eq!(dicts.compare(DictKind::City, 0, amsterdam), Ordering::Less);
        assert_eq!(dicts.compare(DictKind::City, moscow, moscow), Ordering::Equal);
    }

    #[test]
    fn capped_at_hash_width() {
        let dicts = Dicts::new();
        for n in 0..0xff {
            dicts.intern(DictKind::Interest, &format!("interest {}", n)).unwrap();
        }
        assert_eq!(dicts.intern(DictKind::Interest, "interest 7").unwrap(), 8);

        let err = dicts.intern(DictKind::Interest, "one too many").unwrap_err();
        assert_eq!(err.kind, crate::core::error::ErrorKind::Validation);
        assert_eq!(dicts.len(DictKind::Interest), 0xff);
        assert_eq!(dicts.lookup(DictKind::Interest, "one too many"), None);

        // other kinds are unaffected
        assert_eq!(dicts.intern(DictKind::City, "Москва").unwrap(), 1);
    }
}
