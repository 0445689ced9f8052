//! Layered route index for one router.
//!
//! Two parallel structures:
//!
//! - resource routes: `prefix -> language -> route`
//! - everything else: `method -> path key -> language -> route`, where the
//!   path key is the literal path (equality lookup) or the expression signature
//!   (probed in order), plus a wildcard `*` method bucket
//!
//! Every route occupies exactly one (method, key, language) slot. The flat list
//! keeps registration order; bucket and variant order is always derived from
//! it, so the linear and the indexed resolver see candidates in the same order.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

use crate::error::RouteError;
use crate::ids::RouteId;
use crate::route::{PathKey, Route, RouteMethod};

/// Language variants sharing one path key, in registration order.
#[derive(Debug, Clone, Default)]
pub struct Variants {
    entries: Vec<(Option<String>, Arc<Route>)>,
}

impl Variants {
    pub fn get(&self, language: Option<&str>) -> Option<&Arc<Route>> {
        self.entries
            .iter()
            .find(|(l, _)| l.as_deref() == language)
            .map(|(_, r)| r)
    }

    /// First registered variant
    pub fn first(&self) -> Option<&Arc<Route>> {
        self.entries.first().map(|(_, r)| r)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Option<&str>, &Arc<Route>)> + Clone {
        self.entries.iter().map(|(l, r)| (l.as_deref(), r))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn occupant(&self, language: Option<&str>) -> Option<RouteId> {
        self.get(language).map(|r| r.id())
    }

    fn push(&mut self, route: &Arc<Route>) {
        self.entries
            .push((route.language().map(str::to_string), Arc::clone(route)));
    }

    fn remove(&mut self, id: RouteId) {
        self.entries.retain(|(_, r)| r.id() != id);
    }

    fn sort_by_position(&mut self, positions: &HashMap<RouteId, usize>) {
        self.entries
            .sort_by_key(|(_, r)| positions.get(&r.id()).copied().unwrap_or(usize::MAX));
    }

    fn first_position(&self, positions: &HashMap<RouteId, usize>) -> usize {
        self.entries
            .iter()
            .filter_map(|(_, r)| positions.get(&r.id()).copied())
            .min()
            .unwrap_or(usize::MAX)
    }
}

/// Routes of one method (or of the wildcard).
#[derive(Debug, Clone, Default)]
pub struct MethodBucket {
    literals: HashMap<String, Variants>,
    patterns: Vec<(String, Variants)>,
}

impl MethodBucket {
    /// Variants registered for exactly this (normalised) path
    pub fn literal(&self, path: &str) -> Option<&Variants> {
        self.literals.get(path)
    }

    /// Pattern keys in registration order
    pub fn patterns(&self) -> impl Iterator<Item = (&str, &Variants)> {
        self.patterns.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn literal_count(&self) -> usize {
        self.literals.len()
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    fn is_empty(&self) -> bool {
        self.literals.is_empty() && self.patterns.is_empty()
    }

    fn variants(&self, key: &PathKey) -> Option<&Variants> {
        match key {
            PathKey::Literal(path) => self.literals.get(path),
            PathKey::Pattern(sig) => self.patterns.iter().find(|(k, _)| k == sig).map(|(_, v)| v),
        }
    }

    fn variants_mut(&mut self, key: &PathKey) -> &mut Variants {
        match key {
            PathKey::Literal(path) => self.literals.entry(path.clone()).or_default(),
            PathKey::Pattern(sig) => {
                let pos = match self.patterns.iter().position(|(k, _)| k == sig) {
                    Some(pos) => pos,
                    None => {
                        self.patterns.push((sig.clone(), Variants::default()));
                        self.patterns.len() - 1
                    }
                };
                &mut self.patterns[pos].1
            }
        }
    }

    fn remove(&mut self, key: &PathKey, id: RouteId) {
        match key {
            PathKey::Literal(path) => {
                if let Some(variants) = self.literals.get_mut(path) {
                    variants.remove(id);
                    if variants.is_empty() {
                        self.literals.remove(path);
                    }
                }
            }
            PathKey::Pattern(sig) => {
                for (_, variants) in self.patterns.iter_mut().filter(|(k, _)| k == sig) {
                    variants.remove(id);
                }
                self.patterns.retain(|(_, v)| !v.is_empty());
            }
        }
    }

    fn reorder(&mut self, positions: &HashMap<RouteId, usize>) {
        for variants in self.literals.values_mut() {
            variants.sort_by_position(positions);
        }
        for (_, variants) in &mut self.patterns {
            variants.sort_by_position(positions);
        }
        self.patterns
            .sort_by_key(|(_, v)| v.first_position(positions));
    }
}

/// Where a route currently sits in the index
#[derive(Debug, Clone, PartialEq, Eq)]
enum IndexSlot {
    Resource {
        prefix: String,
        language: Option<String>,
    },
    Regular {
        method: RouteMethod,
        key: PathKey,
        language: Option<String>,
    },
}

impl IndexSlot {
    fn of(route: &Route) -> Self {
        let language = route.language().map(str::to_string);
        if route.is_resource() {
            IndexSlot::Resource {
                prefix: route.path_key().as_str().to_string(),
                language,
            }
        } else {
            IndexSlot::Regular {
                method: route.method().clone(),
                key: route.path_key(),
                language,
            }
        }
    }
}

/// Counters describing the current shape of the index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexStats {
    pub routes: usize,
    pub resource_prefixes: usize,
    pub method_buckets: usize,
    pub literal_keys: usize,
    pub pattern_keys: usize,
}

/// Route set of one router plus its layered index.
#[derive(Debug, Clone, Default)]
pub struct RouteStorage {
    routes: Vec<Arc<Route>>,
    by_id: HashMap<RouteId, Arc<Route>>,
    resources: BTreeMap<String, Variants>,
    methods: HashMap<RouteMethod, MethodBucket>,
    slots: HashMap<RouteId, IndexSlot>,
}

impl RouteStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route and index it.
    ///
    /// Adding a route whose id is already stored is a no-op.
    ///
    /// # Errors
    ///
    /// [`RouteError::Conflict`] if another route holds the same
    /// (method, path key, language) slot.
    pub fn add_route(&mut self, route: Arc<Route>) -> Result<(), RouteError> {
        if self.by_id.contains_key(&route.id()) {
            return Ok(());
        }
        self.insert_slot(&route)?;
        debug!(
            route_id = %route.id(),
            method = %route.method(),
            path = %route.display_path(),
            language = ?route.language(),
            "Route indexed"
        );
        self.by_id.insert(route.id(), Arc::clone(&route));
        self.routes.push(route);
        Ok(())
    }

    /// Remove a route and every index trace of it. Empty buckets are pruned.
    pub fn remove_route(&mut self, id: RouteId) -> Option<Arc<Route>> {
        let route = self.by_id.remove(&id)?;
        self.remove_slot(id);
        self.routes.retain(|r| r.id() != id);
        self.reorder();
        Some(route)
    }

    /// Index `route`, which must already be stored unless `insert_if_absent`.
    ///
    /// With `reindex` the stored entry is dropped from its old slot first and
    /// replaced by `route` (same id) in the slot its current state calls for.
    /// Without it, an already stored route is left as is.
    ///
    /// # Errors
    ///
    /// - [`RouteError::UnknownRoute`] if the id is not stored and `insert_if_absent` is false
    /// - [`RouteError::Conflict`] if the target slot is taken; the old entry is restored
    pub fn index_route(
        &mut self,
        route: Arc<Route>,
        reindex: bool,
        insert_if_absent: bool,
    ) -> Result<(), RouteError> {
        let id = route.id();
        let Some(old) = self.by_id.get(&id).cloned() else {
            if insert_if_absent {
                return self.add_route(route);
            }
            return Err(RouteError::UnknownRoute(id));
        };
        if !reindex {
            return Ok(());
        }
        self.replace(old, route)
    }

    /// Apply a mutation to a stored route and move it to the slot its new state
    /// calls for. On error (from `f` or a slot conflict) nothing changes.
    pub fn update_route<F>(&mut self, id: RouteId, f: F) -> Result<Arc<Route>, RouteError>
    where
        F: FnOnce(&mut Route) -> Result<(), RouteError>,
    {
        let old = self
            .by_id
            .get(&id)
            .cloned()
            .ok_or(RouteError::UnknownRoute(id))?;
        let mut updated = Route::clone(&old);
        f(&mut updated)?;
        let updated = Arc::new(updated);
        self.replace(old, Arc::clone(&updated))?;
        Ok(updated)
    }

    fn replace(&mut self, old: Arc<Route>, new: Arc<Route>) -> Result<(), RouteError> {
        let id = old.id();
        self.remove_slot(id);
        if let Err(err) = self.insert_slot(&new) {
            // slot was free a moment ago
            self.insert_slot(&old)?;
            self.reorder();
            return Err(err);
        }
        if let Some(pos) = self.routes.iter().position(|r| r.id() == id) {
            self.routes[pos] = Arc::clone(&new);
        }
        self.by_id.insert(id, new);
        self.reorder();
        Ok(())
    }

    /// Rebuild the whole index from the flat route list.
    pub fn update_index(&mut self) -> Result<(), RouteError> {
        self.resources.clear();
        self.methods.clear();
        self.slots.clear();
        for route in self.routes.clone() {
            self.insert_slot(&route)?;
        }
        Ok(())
    }

    pub fn get(&self, id: RouteId) -> Option<&Arc<Route>> {
        self.by_id.get(&id)
    }

    pub fn contains(&self, id: RouteId) -> bool {
        self.by_id.contains_key(&id)
    }

    /// All routes in registration order
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Arc<Route>> {
        self.routes.iter().find(|r| r.name() == Some(name))
    }

    pub fn bucket(&self, method: &RouteMethod) -> Option<&MethodBucket> {
        self.methods.get(method)
    }

    /// Methods (wildcard included) with at least one route.
    pub fn methods(&self) -> impl Iterator<Item = (&RouteMethod, &MethodBucket)> {
        self.methods.iter()
    }

    /// Resource prefixes covering `path`, longest first.
    ///
    /// Only prefixes ending on a segment boundary of `path` are considered:
    /// `/static` covers `/static/app.js` but not `/staticfoo`.
    pub fn resources_matching(&self, path: &str) -> Vec<(&str, &Variants)> {
        let mut found = Vec::new();
        let mut next = Some(path);
        while let Some(candidate) = next {
            next = match candidate.rfind('/') {
                Some(0) if candidate != "/" => Some("/"),
                Some(0) | None => None,
                Some(i) => Some(&candidate[..i]),
            };
            if let Some((prefix, variants)) = self.resources.get_key_value(candidate) {
                found.push((prefix.as_str(), variants));
            }
        }
        found
    }

    pub fn has_resources(&self) -> bool {
        !self.resources.is_empty()
    }

    pub fn index_stats(&self) -> IndexStats {
        IndexStats {
            routes: self.routes.len(),
            resource_prefixes: self.resources.len(),
            method_buckets: self.methods.len(),
            literal_keys: self.methods.values().map(MethodBucket::literal_count).sum(),
            pattern_keys: self.methods.values().map(MethodBucket::pattern_count).sum(),
        }
    }

    fn insert_slot(&mut self, route: &Arc<Route>) -> Result<(), RouteError> {
        let slot = IndexSlot::of(route);
        let occupant = match &slot {
            IndexSlot::Resource { prefix, language } => self
                .resources
                .get(prefix)
                .and_then(|v| v.occupant(language.as_deref())),
            IndexSlot::Regular {
                method,
                key,
                language,
            } => self
                .methods
                .get(method)
                .and_then(|b| b.variants(key))
                .and_then(|v| v.occupant(language.as_deref())),
        };
        if occupant.is_some_and(|other| other != route.id()) {
            return Err(RouteError::Conflict {
                method: route.method().to_string(),
                path: route.display_path(),
                language: route.language().map(str::to_string),
            });
        }
        if occupant.is_some() {
            return Ok(());
        }

        match &slot {
            IndexSlot::Resource { prefix, .. } => {
                self.resources.entry(prefix.clone()).or_default().push(route);
            }
            IndexSlot::Regular { method, key, .. } => {
                self.methods
                    .entry(method.clone())
                    .or_default()
                    .variants_mut(key)
                    .push(route);
            }
        }
        self.slots.insert(route.id(), slot);
        Ok(())
    }

    fn remove_slot(&mut self, id: RouteId) {
        let Some(slot) = self.slots.remove(&id) else {
            return;
        };
        match slot {
            IndexSlot::Resource { prefix, .. } => {
                if let Some(variants) = self.resources.get_mut(&prefix) {
                    variants.remove(id);
                    if variants.is_empty() {
                        self.resources.remove(&prefix);
                    }
                }
            }
            IndexSlot::Regular { method, key, .. } => {
                if let Some(bucket) = self.methods.get_mut(&method) {
                    bucket.remove(&key, id);
                    if bucket.is_empty() {
                        self.methods.remove(&method);
                    }
                }
            }
        }
    }

    fn reorder(&mut self) {
        let positions: HashMap<RouteId, usize> = self
            .routes
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id(), i))
            .collect();
        for variants in self.resources.values_mut() {
            variants.sort_by_position(&positions);
        }
        for bucket in self.methods.values_mut() {
            bucket.reorder(&positions);
        }
    }
}
