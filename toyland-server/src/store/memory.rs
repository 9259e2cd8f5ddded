//! In-memory backend
//!
//! Holds toys in insertion order and evaluates `ToyQuery` the way MongoDB
//! does for the filters the API builds: equality also matches array
//! elements, a null equality matches missing fields, name patterns are
//! case-insensitive regexes.
//!
//! Updates apply `$set` semantics to dotted paths, descending into embedded
//! documents and existing array positions. Writing past the end of an
//! array or through a scalar is rejected rather than padded. An update is
//! applied in full or not at all.

use std::cmp::Ordering;

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{Bson, Document};
use regex::{Regex, RegexBuilder};
use tokio::sync::RwLock;

use super::{
    DeleteAck, InsertAck, StoreError, StoreResult, ToyFilter, ToyQuery, ToyStore, UpdateAck,
    NAME_INDEX,
};

/// Toy collection held in process memory
#[derive(Default)]
pub struct MemoryToyStore {
    toys: RwLock<Vec<Document>>,
}

impl MemoryToyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A `ToyFilter` ready to test documents against.
enum Matcher {
    All,
    Equals(&'static str, Bson),
    Pattern(Regex),
}

impl Matcher {
    fn compile(filter: &ToyFilter) -> StoreResult<Self> {
        Ok(match filter {
            ToyFilter::All => Self::All,
            ToyFilter::Subcategory(text) => Self::Equals("subcategory", Bson::String(text.clone())),
            ToyFilter::SellerEmail(email) => Self::Equals(
                "sellerEmail",
                email.clone().map(Bson::String).unwrap_or(Bson::Null),
            ),
            ToyFilter::NameMatches(pattern) => {
                Self::Pattern(RegexBuilder::new(pattern).case_insensitive(true).build()?)
            }
        })
    }

    fn matches(&self, toy: &Document) -> bool {
        match self {
            Self::All => true,
            Self::Equals(field, Bson::Null) => {
                matches!(toy.get(*field), None | Some(Bson::Null) | Some(Bson::Undefined))
            }
            Self::Equals(field, wanted) => match toy.get(*field) {
                Some(Bson::Array(items)) => items.iter().any(|item| item == wanted),
                Some(value) => value == wanted,
                None => false,
            },
            Self::Pattern(regex) => match toy.get("name") {
                Some(Bson::String(name)) => regex.is_match(name),
                Some(Bson::Array(items)) => items
                    .iter()
                    .any(|item| matches!(item, Bson::String(name) if regex.is_match(name))),
                _ => false,
            },
        }
    }
}

/// Position of a value's type in MongoDB's cross-type sort order.
fn type_rank(value: Option<&Bson>) -> u8 {
    match value {
        None | Some(Bson::Null) | Some(Bson::Undefined) => 1,
        Some(Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_)) => 2,
        Some(Bson::String(_) | Bson::Symbol(_)) => 3,
        Some(Bson::Document(_)) => 4,
        Some(Bson::Array(_)) => 5,
        Some(Bson::Binary(_)) => 6,
        Some(Bson::ObjectId(_)) => 7,
        Some(Bson::Boolean(_)) => 8,
        Some(Bson::DateTime(_)) => 9,
        Some(Bson::Timestamp(_)) => 10,
        Some(Bson::RegularExpression(_)) => 11,
        Some(_) => 12,
    }
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        _ => None,
    }
}

/// Ascending comparison of two sort keys.
fn compare_keys(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    let by_type = type_rank(a).cmp(&type_rank(b));
    if by_type != Ordering::Equal {
        return by_type;
    }

    match (a, b) {
        (Some(Bson::DateTime(x)), Some(Bson::DateTime(y))) => x.cmp(y),
        (Some(Bson::String(x)), Some(Bson::String(y))) => x.cmp(y),
        (Some(Bson::ObjectId(x)), Some(Bson::ObjectId(y))) => x.cmp(y),
        (Some(Bson::Boolean(x)), Some(Bson::Boolean(y))) => x.cmp(y),
        (Some(x), Some(y)) => match (as_f64(x), as_f64(y)) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
        _ => Ordering::Equal,
    }
}

/// `$set` one field path on a document. Returns whether anything changed.
fn set_path(doc: &mut Document, path: &str, value: Bson) -> StoreResult<bool> {
    match path.split_once('.') {
        None => {
            if doc.get(path) == Some(&value) {
                return Ok(false);
            }
            doc.insert(path, value);
            Ok(true)
        }
        Some((head, rest)) => {
            if head.is_empty() {
                return Err(StoreError::InvalidPath(path.to_string()));
            }
            let child = doc
                .entry(head.to_string())
                .or_insert_with(|| Bson::Document(Document::new()));
            set_nested(child, rest, value)
        }
    }
}

fn set_nested(target: &mut Bson, path: &str, value: Bson) -> StoreResult<bool> {
    match target {
        Bson::Document(doc) => set_path(doc, path, value),
        Bson::Array(items) => {
            let (head, rest) = match path.split_once('.') {
                Some((head, rest)) => (head, Some(rest)),
                None => (path, None),
            };
            let slot = head
                .parse::<usize>()
                .ok()
                .and_then(|index| items.get_mut(index))
                .ok_or_else(|| StoreError::InvalidPath(path.to_string()))?;
            match rest {
                Some(rest) => set_nested(slot, rest, value),
                None if *slot == value => Ok(false),
                None => {
                    *slot = value;
                    Ok(true)
                }
            }
        }
        _ => Err(StoreError::InvalidPath(path.to_string())),
    }
}

fn has_id(toy: &Document, id: &ObjectId) -> bool {
    matches!(toy.get("_id"), Some(Bson::ObjectId(existing)) if existing == id)
}

#[async_trait]
impl ToyStore for MemoryToyStore {
    async fn ensure_name_index(&self) -> StoreResult<String> {
        Ok(NAME_INDEX.to_string())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn find(&self, query: ToyQuery) -> StoreResult<Vec<Document>> {
        let skip = usize::try_from(query.skip).map_err(|_| StoreError::NegativeSkip(query.skip))?;
        let matcher = Matcher::compile(&query.filter)?;

        let toys = self.toys.read().await;
        let mut selected: Vec<&Document> = toys.iter().filter(|toy| matcher.matches(toy)).collect();

        if query.newest_first {
            // Stable sort keeps insertion order among equal keys
            selected.sort_by(|a, b| compare_keys(b.get("createdAt"), a.get("createdAt")));
        }

        // A limit of 0 means no limit, negative limits return a single batch
        let limit = match query.limit {
            Some(0) | None => usize::MAX,
            Some(n) => usize::try_from(n.unsigned_abs()).unwrap_or(usize::MAX),
        };

        Ok(selected
            .into_iter()
            .skip(skip)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: ObjectId) -> StoreResult<Option<Document>> {
        let toys = self.toys.read().await;
        Ok(toys.iter().find(|toy| has_id(toy, &id)).cloned())
    }

    async fn insert_one(&self, toy: Document) -> StoreResult<InsertAck> {
        let mut toys = self.toys.write().await;

        let id = match toy.get("_id") {
            Some(id) => id.clone(),
            None => Bson::ObjectId(ObjectId::new()),
        };
        if toys.iter().any(|existing| existing.get("_id") == Some(&id)) {
            return Err(StoreError::DuplicateId(id));
        }

        // `_id` leads the stored document
        let mut stored = Document::new();
        stored.insert("_id", id.clone());
        for (key, value) in toy {
            if key != "_id" {
                stored.insert(key, value);
            }
        }
        toys.push(stored);

        Ok(InsertAck {
            acknowledged: true,
            inserted_id: id,
        })
    }

    async fn update_one(&self, id: ObjectId, fields: Document) -> StoreResult<UpdateAck> {
        let mut toys = self.toys.write().await;

        let Some(toy) = toys.iter_mut().find(|toy| has_id(toy, &id)) else {
            return Ok(UpdateAck {
                acknowledged: true,
                matched_count: 0,
                modified_count: 0,
                upserted_count: 0,
                upserted_id: Bson::Null,
            });
        };

        if let Some(new_id) = fields.get("_id") {
            if *new_id != Bson::ObjectId(id) {
                return Err(StoreError::ImmutableId);
            }
        }

        let mut updated = toy.clone();
        let mut modified = false;
        for (key, value) in fields {
            modified |= set_path(&mut updated, &key, value)?;
        }
        *toy = updated;

        Ok(UpdateAck {
            acknowledged: true,
            matched_count: 1,
            modified_count: u64::from(modified),
            upserted_count: 0,
            upserted_id: Bson::Null,
        })
    }

    async fn delete_one(&self, id: ObjectId) -> StoreResult<DeleteAck> {
        let mut toys = self.toys.write().await;

        let deleted_count = match toys.iter().position(|toy| has_id(toy, &id)) {
            Some(index) => {
                toys.remove(index);
                1
            }
            None => 0,
        };

        Ok(DeleteAck {
            acknowledged: true,
            deleted_count,
        })
    }

    async fn estimated_count(&self) -> StoreResult<u64> {
        Ok(self.toys.read().await.len() as u64)
    }
}
