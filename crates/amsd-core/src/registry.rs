//! Lookup and junction tables built while rows are normalized

use crate::ling_area::LinguisticArea;
use crate::schema::Category;
use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Surrogate key of a record or lookup value (dense, starting at 1)
pub type Key = u32;

/// Distinct values of one category, keyed in first-seen order
#[derive(Debug, Clone)]
pub struct LookupTable<T> {
    values: Vec<T>,
    index: HashMap<T, Key>,
}

impl<T> Default for LookupTable<T> {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Eq + Hash + Clone> LookupTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the key of `value`, assigning the next key if it is new
    pub fn intern(&mut self, value: T) -> Key {
        if let Some(&key) = self.index.get(&value) {
            return key;
        }
        self.values.push(value.clone());
        let key = self.values.len() as Key;
        self.index.insert(value, key);
        key
    }

    /// Key of an already registered value
    pub fn key_of<Q>(&self, value: &Q) -> Option<Key>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.get(value).copied()
    }

    /// Value registered under `key`
    pub fn value(&self, key: Key) -> Option<&T> {
        let idx = (key as usize).checked_sub(1)?;
        self.values.get(idx)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(key, value)` pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (Key, &T)> {
        self.values
            .iter()
            .enumerate()
            .map(|(i, v)| (i as Key + 1, v))
    }
}

/// Many-to-many links between records and one lookup category
#[derive(Debug, Clone)]
pub struct JunctionTable {
    category: Category,
    rows: Vec<(Key, Key)>,
    seen: HashSet<(Key, Key)>,
}

impl JunctionTable {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            rows: Vec::new(),
            seen: HashSet::new(),
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Link a record to a lookup value. Returns false if the pair already exists.
    pub fn link(&mut self, record: Key, value: Key) -> bool {
        if !self.seen.insert((record, value)) {
            return false;
        }
        self.rows.push((record, value));
        true
    }

    /// `(record_pk, lookup_pk)` pairs in insertion order
    pub fn rows(&self) -> &[(Key, Key)] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Every lookup table and junction table of a run
#[derive(Debug, Clone)]
pub struct Registry {
    keywords: LookupTable<String>,
    sem_domain: LookupTable<String>,
    linked_filenames: LookupTable<String>,
    item_type: LookupTable<String>,
    material: LookupTable<String>,
    technique: LookupTable<String>,
    source_citation: LookupTable<String>,
    source_type: LookupTable<String>,
    holder_file: LookupTable<String>,
    data_entry: LookupTable<String>,
    ling_area: LookupTable<LinguisticArea>,
    junctions: Vec<JunctionTable>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            keywords: LookupTable::new(),
            sem_domain: LookupTable::new(),
            linked_filenames: LookupTable::new(),
            item_type: LookupTable::new(),
            material: LookupTable::new(),
            technique: LookupTable::new(),
            source_citation: LookupTable::new(),
            source_type: LookupTable::new(),
            holder_file: LookupTable::new(),
            data_entry: LookupTable::new(),
            ling_area: LookupTable::new(),
            junctions: Category::ALL
                .into_iter()
                .filter(|c| c.has_junction())
                .map(JunctionTable::new)
                .collect(),
        }
    }

    /// Text-valued table of a category; `None` for `ling_area`
    pub fn text_table(&self, category: Category) -> Option<&LookupTable<String>> {
        match category {
            Category::Keywords => Some(&self.keywords),
            Category::SemDomain => Some(&self.sem_domain),
            Category::LinkedFilenames => Some(&self.linked_filenames),
            Category::ItemType => Some(&self.item_type),
            Category::Material => Some(&self.material),
            Category::Technique => Some(&self.technique),
            Category::SourceCitation => Some(&self.source_citation),
            Category::SourceType => Some(&self.source_type),
            Category::HolderFile => Some(&self.holder_file),
            Category::DataEntry => Some(&self.data_entry),
            Category::LingArea => None,
        }
    }

    /// Mutable text-valued table of a category; `None` for `ling_area`
    pub fn text_table_mut(&mut self, category: Category) -> Option<&mut LookupTable<String>> {
        match category {
            Category::Keywords => Some(&mut self.keywords),
            Category::SemDomain => Some(&mut self.sem_domain),
            Category::LinkedFilenames => Some(&mut self.linked_filenames),
            Category::ItemType => Some(&mut self.item_type),
            Category::Material => Some(&mut self.material),
            Category::Technique => Some(&mut self.technique),
            Category::SourceCitation => Some(&mut self.source_citation),
            Category::SourceType => Some(&mut self.source_type),
            Category::HolderFile => Some(&mut self.holder_file),
            Category::DataEntry => Some(&mut self.data_entry),
            Category::LingArea => None,
        }
    }

    pub fn ling_area(&self) -> &LookupTable<LinguisticArea> {
        &self.ling_area
    }

    pub fn ling_area_mut(&mut self) -> &mut LookupTable<LinguisticArea> {
        &mut self.ling_area
    }

    /// Junction tables in category order
    pub fn junctions(&self) -> &[JunctionTable] {
        &self.junctions
    }

    pub fn junction(&self, category: Category) -> Option<&JunctionTable> {
        self.junctions.iter().find(|j| j.category == category)
    }

    pub fn junction_mut(&mut self, category: Category) -> Option<&mut JunctionTable> {
        self.junctions.iter_mut().find(|j| j.category == category)
    }

    /// Number of distinct values in a category
    pub fn len(&self, category: Category) -> usize {
        match self.text_table(category) {
            Some(table) => table.len(),
            None => self.ling_area.len(),
        }
    }

    /// `(key, display text)` pairs of any category, in key order
    pub fn display_values(&self, category: Category) -> Vec<(Key, String)> {
        match self.text_table(category) {
            Some(table) => table.iter().map(|(k, v)| (k, v.clone())).collect(),
            None => self
                .ling_area
                .iter()
                .map(|(k, v)| (k, v.to_string()))
                .collect(),
        }
    }

    /// Display text of one key
    pub fn resolve(&self, category: Category, key: Key) -> Option<String> {
        match self.text_table(category) {
            Some(table) => table.value(key).cloned(),
            None => self.ling_area.value(key).map(|v| v.to_string()),
        }
    }
}
