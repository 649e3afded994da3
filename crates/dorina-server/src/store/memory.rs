//! Process-local store
//!
//! Expiry is evaluated lazily against [`tokio::time::Instant`], so tests can
//! pause and advance the clock instead of sleeping.

use async_trait::async_trait;
use std::{
    collections::{BTreeSet, HashMap, VecDeque},
    sync::{Mutex, MutexGuard},
    time::Duration,
};
use tokio::time::Instant;

use super::{ttl_secs, KeyValueStore, StoreError, StoreResult};

#[derive(Debug, Clone)]
enum Value {
    Str(String),
    List(VecDeque<String>),
    SortedSet(BTreeSet<String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// In-memory [`KeyValueStore`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Drop the key if it has expired, then hand back whatever is left
fn live<'a>(entries: &'a mut HashMap<String, Entry>, key: &str) -> Option<&'a mut Entry> {
    if entries.get(key).is_some_and(|e| e.is_expired(Instant::now())) {
        entries.remove(key);
    }
    entries.get_mut(key)
}

fn deadline(ttl: Duration) -> Option<Instant> {
    Some(Instant::now() + Duration::from_secs(ttl_secs(ttl)))
}

/// Clamp a Redis-style inclusive range onto a list of `len` items
fn resolve_range(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
    let len = len as isize;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if len == 0 || start > stop || start >= len || stop < 0 {
        return None;
    }
    Some((start as usize, stop as usize))
}

#[derive(Debug, PartialEq)]
enum LexBound {
    NegInf,
    PosInf,
    Inclusive(String),
    Exclusive(String),
}

impl LexBound {
    fn parse(raw: &str) -> StoreResult<Self> {
        match raw {
            "-" => Ok(Self::NegInf),
            "+" => Ok(Self::PosInf),
            _ => {
                if let Some(rest) = raw.strip_prefix('[') {
                    Ok(Self::Inclusive(rest.to_string()))
                } else if let Some(rest) = raw.strip_prefix('(') {
                    Ok(Self::Exclusive(rest.to_string()))
                } else {
                    Err(StoreError::InvalidArgument(format!(
                        "lex bound '{}' must start with '[' or '(' or be '-' or '+'",
                        raw
                    )))
                }
            },
        }
    }

    fn admits_from_below(&self, member: &str) -> bool {
        match self {
            Self::NegInf => true,
            Self::PosInf => false,
            Self::Inclusive(x) => member >= x.as_str(),
            Self::Exclusive(x) => member > x.as_str(),
        }
    }

    fn admits_from_above(&self, member: &str) -> bool {
        match self {
            Self::NegInf => false,
            Self::PosInf => true,
            Self::Inclusive(x) => member <= x.as_str(),
            Self::Exclusive(x) => member < x.as_str(),
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut entries = self.lock();
        match live(&mut entries, key) {
            None => Ok(None),
            Some(Entry {
                value: Value::Str(s),
                ..
            }) => Ok(Some(s.clone())),
            Some(_) => Err(StoreError::WrongType(key.to_string())),
        }
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        let entry = Entry {
            value: Value::Str(value.to_string()),
            expires_at: deadline(ttl),
        };
        self.lock().insert(key.to_string(), entry);
        Ok(())
    }

    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<bool> {
        let mut entries = self.lock();
        if live(&mut entries, key).is_some() {
            return Ok(false);
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: Value::Str(value.to_string()),
                expires_at: deadline(ttl),
            },
        );
        Ok(true)
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(live(&mut self.lock(), key).is_some())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<bool> {
        let mut entries = self.lock();
        match live(&mut entries, key) {
            Some(entry) => {
                entry.expires_at = deadline(ttl);
                Ok(true)
            },
            None => Ok(false),
        }
    }

    async fn ttl(&self, key: &str) -> StoreResult<Option<Duration>> {
        let mut entries = self.lock();
        Ok(live(&mut entries, key)
            .and_then(|entry| entry.expires_at)
            .map(|at| at.saturating_duration_since(Instant::now())))
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let mut entries = self.lock();
        let existed = live(&mut entries, key).is_some();
        entries.remove(key);
        Ok(existed)
    }

    async fn rpush(&self, key: &str, values: &[String]) -> StoreResult<usize> {
        let mut entries = self.lock();
        if live(&mut entries, key).is_none() {
            if values.is_empty() {
                return Ok(0);
            }
            entries.insert(key.to_string(), Entry::new(Value::List(VecDeque::new())));
        }
        match entries.get_mut(key).map(|entry| &mut entry.value) {
            Some(Value::List(list)) => {
                list.extend(values.iter().cloned());
                Ok(list.len())
            },
            _ => Err(StoreError::WrongType(key.to_string())),
        }
    }

    async fn lpop(&self, key: &str) -> StoreResult<Option<String>> {
        let mut entries = self.lock();
        let (popped, now_empty) = match live(&mut entries, key) {
            None => return Ok(None),
            Some(Entry {
                value: Value::List(list),
                ..
            }) => {
                let popped = list.pop_front();
                (popped, list.is_empty())
            },
            Some(_) => return Err(StoreError::WrongType(key.to_string())),
        };
        if now_empty {
            entries.remove(key);
        }
        Ok(popped)
    }

    async fn lrange(&self, key: &str, start: isize, stop: isize) -> StoreResult<Vec<String>> {
        let mut entries = self.lock();
        match live(&mut entries, key) {
            None => Ok(Vec::new()),
            Some(Entry {
                value: Value::List(list),
                ..
            }) => Ok(match resolve_range(list.len(), start, stop) {
                Some((from, to)) => list.range(from..=to).cloned().collect(),
                None => Vec::new(),
            }),
            Some(_) => Err(StoreError::WrongType(key.to_string())),
        }
    }

    async fn llen(&self, key: &str) -> StoreResult<usize> {
        let mut entries = self.lock();
        match live(&mut entries, key) {
            None => Ok(0),
            Some(Entry {
                value: Value::List(list),
                ..
            }) => Ok(list.len()),
            Some(_) => Err(StoreError::WrongType(key.to_string())),
        }
    }

    async fn zadd(&self, key: &str, members: &[String]) -> StoreResult<usize> {
        let mut entries = self.lock();
        if live(&mut entries, key).is_none() {
            if members.is_empty() {
                return Ok(0);
            }
            entries.insert(key.to_string(), Entry::new(Value::SortedSet(BTreeSet::new())));
        }
        match entries.get_mut(key).map(|entry| &mut entry.value) {
            Some(Value::SortedSet(set)) => Ok(members
                .iter()
                .filter(|member| set.insert((*member).clone()))
                .count()),
            _ => Err(StoreError::WrongType(key.to_string())),
        }
    }

    async fn zrangebylex(
        &self,
        key: &str,
        min: &str,
        max: &str,
        limit: Option<usize>,
    ) -> StoreResult<Vec<String>> {
        let min = LexBound::parse(min)?;
        let max = LexBound::parse(max)?;

        let mut entries = self.lock();
        match live(&mut entries, key) {
            None => Ok(Vec::new()),
            Some(Entry {
                value: Value::SortedSet(set),
                ..
            }) => Ok(set
                .iter()
                .filter(|member| min.admits_from_below(member) && max.admits_from_above(member))
                .take(limit.unwrap_or(usize::MAX))
                .cloned()
                .collect()),
            Some(_) => Err(StoreError::WrongType(key.to_string())),
        }
    }

    async fn keys_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let now = Instant::now();
        let mut entries = self.lock();
        entries.retain(|_, entry| !entry.is_expired(now));
        let mut keys: Vec<String> = entries
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }
}
