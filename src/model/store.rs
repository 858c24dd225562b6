use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::item::ListId;
use super::list::{Checklist, TreeError};

/// Every checklist known to the application
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListStore {
    #[serde(default)]
    lists: Vec<Checklist>,
    #[serde(default = "first_list_id")]
    next_list: u64,
}

fn first_list_id() -> u64 {
    1
}

impl ListStore {
    pub fn new() -> Self {
        ListStore {
            lists: Vec::new(),
            next_list: first_list_id(),
        }
    }

    pub fn lists(&self) -> &[Checklist] {
        &self.lists
    }

    pub fn get(&self, id: ListId) -> Option<&Checklist> {
        self.lists.iter().find(|l| l.id == id)
    }

    pub fn get_mut(&mut self, id: ListId) -> Option<&mut Checklist> {
        self.lists.iter_mut().find(|l| l.id == id)
    }

    /// Look up a list mutably, failing with `ListNotFound`
    pub fn list_mut(&mut self, id: ListId) -> Result<&mut Checklist, TreeError> {
        self.get_mut(id)
            .ok_or_else(|| TreeError::ListNotFound(id.to_string()))
    }

    /// Resolve a user-supplied key: a numeric list id, or a name (case-insensitive)
    pub fn find(&self, key: &str) -> Option<&Checklist> {
        if let Ok(n) = key.parse::<u64>()
            && let Some(list) = self.get(ListId(n))
        {
            return Some(list);
        }
        self.lists
            .iter()
            .find(|l| l.name.eq_ignore_ascii_case(key))
    }

    /// Create an empty list and return its id
    pub fn create_list(&mut self, name: String, template: bool, date: Option<NaiveDate>) -> ListId {
        let next = self
            .lists
            .iter()
            .map(|l| l.id.0 + 1)
            .max()
            .unwrap_or(1)
            .max(self.next_list);
        let id = ListId(next);
        self.next_list = next + 1;
        let mut list = Checklist::new(id, name);
        list.template = template;
        list.date = date;
        self.lists.push(list);
        id
    }

    /// Delete a list together with every item it owns
    pub fn delete_list(&mut self, id: ListId) -> Result<Checklist, TreeError> {
        let idx = self
            .lists
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| TreeError::ListNotFound(id.to_string()))?;
        Ok(self.lists.remove(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_find() {
        let mut store = ListStore::new();
        let a = store.create_list("Camping".into(), true, None);
        let b = store.create_list("Beach 2025".into(), false, NaiveDate::from_ymd_opt(2025, 7, 1));
        assert_eq!(a, ListId(1));
        assert_eq!(b, ListId(2));
        assert_eq!(store.find("camping").unwrap().id, a);
        assert_eq!(store.find("2").unwrap().id, b);
        assert!(store.find("mountains").is_none());
    }

    #[test]
    fn test_delete_list_does_not_reuse_id() {
        let mut store = ListStore::new();
        store.create_list("One".into(), false, None);
        let two = store.create_list("Two".into(), false, None);
        store.delete_list(two).unwrap();
        let three = store.create_list("Three".into(), false, None);
        assert_eq!(three, ListId(3));
        assert!(store.delete_list(two).is_err());
    }
}
