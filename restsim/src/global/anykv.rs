//! Thread-local key/value store for observations a harness wants to read
//! after the run. Cleared when the simulation is dropped.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;

thread_local! {
    pub(crate) static ANY_KV: RefCell<HashMap<String, Box<dyn Any>>> = RefCell::new(HashMap::new());
}

pub fn set<T: 'static>(key: &str, value: T) {
    ANY_KV.with(|m| {
        m.borrow_mut().insert(key.to_string(), Box::new(value));
    });
}

pub fn get<T: 'static + Clone>(key: &str) -> T {
    ANY_KV.with(|m| {
        m.borrow()
            .get(key)
            .expect("No key")
            .downcast_ref::<T>()
            .cloned()
            .expect("Wrong type cast")
    })
}

pub fn try_get<T: 'static + Clone>(key: &str) -> Option<T> {
    ANY_KV.with(|m| m.borrow().get(key)?.downcast_ref::<T>().cloned())
}

pub fn modify<T: 'static>(key: &str, f: impl FnOnce(&mut T)) {
    ANY_KV.with(|m| {
        f(m.borrow_mut()
            .get_mut(key)
            .expect("No key")
            .downcast_mut::<T>()
            .expect("Wrong type cast"));
    });
}

/// Like [`modify`], inserting `T::default()` first when the key is absent.
pub fn modify_or_default<T: 'static + Default>(key: &str, f: impl FnOnce(&mut T)) {
    ANY_KV.with(|m| {
        let mut map = m.borrow_mut();
        let entry = map
            .entry(key.to_string())
            .or_insert_with(|| Box::new(T::default()));
        f(entry.downcast_mut::<T>().expect("Wrong type cast"));
    });
}

pub(crate) fn drop_anykv() {
    ANY_KV.take();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_modify() {
        set::<usize>("pings", 1);
        modify::<usize>("pings", |p| *p += 2);
        assert_eq!(get::<usize>("pings"), 3);
        assert_eq!(try_get::<String>("pings"), None);
        assert_eq!(try_get::<usize>("missing"), None);

        modify_or_default::<Vec<u8>>("log", |l| l.push(4));
        modify_or_default::<Vec<u8>>("log", |l| l.push(5));
        assert_eq!(get::<Vec<u8>>("log"), vec![4, 5]);
        drop_anykv();
        assert_eq!(try_get::<usize>("pings"), None);
    }
}
