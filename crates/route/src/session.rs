use crate::LogicError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Backing storage for one session: loaded when the session opens,
/// persisted when it closes. The host decides where the data lives.
pub trait SessionStore {
    fn load(&mut self) -> BTreeMap<String, Value>;
    fn persist(&mut self, data: &BTreeMap<String, Value>);
}

/// A request-scoped key/value store with an explicit open/close lifecycle.
///
/// Opening loads the backing data; closing persists it and releases the
/// session. Closing twice is a logic error. A session still open when it
/// goes out of scope closes itself.
pub struct Session {
    store: Box<dyn SessionStore + Send>,
    data: Option<BTreeMap<String, Value>>,
}

impl Session {
    pub fn open(store: impl SessionStore + Send + 'static) -> Self {
        let mut store = Box::new(store);
        let data = store.load();
        Self { store, data: Some(data) }
    }

    pub fn is_open(&self) -> bool {
        self.data.is_some()
    }

    pub fn len(&self) -> usize {
        self.data.as_ref().map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.as_ref()?.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.as_ref().is_some_and(|data| data.contains_key(key))
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<(), LogicError> {
        self.data_mut()?.insert(key.into(), value.into());
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Result<Option<Value>, LogicError> {
        Ok(self.data_mut()?.remove(key))
    }

    /// Persists the data and releases the session.
    pub fn close(&mut self) -> Result<(), LogicError> {
        let data = self
            .data
            .take()
            .ok_or_else(|| LogicError::new("cannot close session: not open"))?;

        self.store.persist(&data);
        Ok(())
    }

    fn data_mut(&mut self) -> Result<&mut BTreeMap<String, Value>, LogicError> {
        self.data
            .as_mut()
            .ok_or_else(|| LogicError::new("session is not open"))
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("open", &self.is_open())
            .field("len", &self.len())
            .finish()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.is_open() {
            // close cannot fail while the session is still open
            let _ = self.close();
        }
    }
}

/// An in-process [`SessionStore`]; clones share the same backing map.
#[derive(Debug, Default, Clone)]
pub struct MemorySessionStore {
    data: Arc<Mutex<BTreeMap<String, Value>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&mut self) -> BTreeMap<String, Value> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn persist(&mut self, data: &BTreeMap<String, Value>) {
        *self.data.lock().unwrap_or_else(PoisonError::into_inner) = data.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn close_persists_to_the_store() {
        let store = MemorySessionStore::new();
        let mut session = Session::open(store.clone());

        session.set("user", json!("alice")).unwrap();
        session.close().unwrap();

        let reopened = Session::open(store);
        assert_eq!(reopened.get("user"), Some(&json!("alice")));
    }

    #[test]
    fn double_close_is_a_logic_error() {
        let mut session = Session::open(MemorySessionStore::new());

        session.close().unwrap();
        assert!(session.close().is_err());
        assert!(!session.is_open());
    }

    #[test]
    fn mutation_after_close_is_rejected() {
        let mut session = Session::open(MemorySessionStore::new());
        session.close().unwrap();

        assert!(session.set("k", json!(1)).is_err());
        assert!(session.remove("k").is_err());
        assert_eq!(session.get("k"), None);
    }

    #[test]
    fn drop_closes_an_open_session() {
        let store = MemorySessionStore::new();

        {
            let mut session = Session::open(store.clone());
            session.set("k", json!(2)).unwrap();
        }

        let reopened = Session::open(store);
        assert_eq!(reopened.get("k"), Some(&json!(2)));
    }
}
