//! Category records, slug rules, statistics, and the in-memory forest view.
//!
//! Categories only store an optional `parent_id`. The children side of the
//! relation is never persisted; [`CategoryForest`] rebuilds it from a flat
//! list of records whenever a tree-shaped view is needed.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum allowed length for a category name.
pub const MAX_CATEGORY_NAME_LENGTH: usize = 255;

/// Maximum allowed length for a category slug.
pub const MAX_SLUG_LENGTH: usize = 255;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A node of the category forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub image: Option<String>,
    pub is_active: bool,
    pub position: i32,
    /// Derived on read from the products table; never written back.
    pub product_count: i64,
    pub parent_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Input for creating a category.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateCategory {
    pub name: String,
    /// Derived from `name` when omitted.
    pub slug: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub image: Option<String>,
    pub is_active: Option<bool>,
    pub position: Option<i32>,
    pub parent_id: Option<DbId>,
}

/// Partial update. `None` leaves the stored value untouched.
///
/// Changing `parent_id` here skips cycle detection; use the move operation
/// for safe re-parenting.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCategory {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub image: Option<String>,
    pub is_active: Option<bool>,
    pub position: Option<i32>,
    pub parent_id: Option<DbId>,
}

impl UpdateCategory {
    /// Copy every present field onto `category`.
    pub fn apply_to(self, category: &mut Category) {
        if let Some(name) = self.name {
            category.name = name;
        }
        if let Some(slug) = self.slug {
            category.slug = slug;
        }
        if let Some(description) = self.description {
            category.description = Some(description);
        }
        if let Some(icon) = self.icon {
            category.icon = Some(icon);
        }
        if let Some(color) = self.color {
            category.color = Some(color);
        }
        if let Some(image) = self.image {
            category.image = Some(image);
        }
        if let Some(is_active) = self.is_active {
            category.is_active = is_active;
        }
        if let Some(position) = self.position {
            category.position = position;
        }
        if let Some(parent_id) = self.parent_id {
            category.parent_id = Some(parent_id);
        }
    }
}

/// One entry of a reorder request.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ReorderItem {
    pub id: DbId,
    pub position: i32,
}

/// Aggregate counts over the whole forest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryStatistics {
    pub total_categories: i64,
    pub active_categories: i64,
    pub inactive_categories: i64,
    /// Categories without a parent.
    pub root_categories: i64,
}

impl CategoryStatistics {
    pub fn from_categories(categories: &[Category]) -> Self {
        let total = categories.len() as i64;
        let active = categories.iter().filter(|c| c.is_active).count() as i64;
        let roots = categories.iter().filter(|c| c.parent_id.is_none()).count() as i64;
        Self {
            total_categories: total,
            active_categories: active,
            inactive_categories: total - active,
            root_categories: roots,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a category name: non-blank and within [`MAX_CATEGORY_NAME_LENGTH`].
pub fn validate_category_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::BadRequest(
            "Category name must not be empty".to_string(),
        ));
    }
    if name.chars().count() > MAX_CATEGORY_NAME_LENGTH {
        return Err(CoreError::BadRequest(format!(
            "Category name must not exceed {MAX_CATEGORY_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate a slug: lowercase ASCII letters, digits, and single hyphens,
/// not starting or ending with a hyphen.
pub fn validate_slug(slug: &str) -> Result<(), CoreError> {
    let well_formed = !slug.is_empty()
        && slug.len() <= MAX_SLUG_LENGTH
        && slug
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--");

    if well_formed {
        Ok(())
    } else {
        Err(CoreError::BadRequest(format!(
            "Invalid slug '{slug}'. Use lowercase letters, digits, and single hyphens"
        )))
    }
}

/// Derive a URL-safe slug from a display name.
///
/// ASCII alphanumerics are lowercased; every other run of characters becomes
/// a single hyphen. Returns an empty string if nothing usable remains.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug.truncate(MAX_SLUG_LENGTH);
    slug.trim_end_matches('-').to_string()
}

// ---------------------------------------------------------------------------
// Forest view
// ---------------------------------------------------------------------------

/// A category with its children attached, for the tree endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<CategoryNode>,
}

/// Arena of categories addressed by id, with a children index rebuilt from
/// parent links.
#[derive(Debug, Default)]
pub struct CategoryForest {
    nodes: HashMap<DbId, Category>,
    children: HashMap<DbId, Vec<DbId>>,
    roots: Vec<DbId>,
}

impl CategoryForest {
    /// Build the arena. Sibling lists keep the order of `categories`.
    ///
    /// A category whose parent is not in the list is treated as a root.
    pub fn new(categories: Vec<Category>) -> Self {
        let ids: HashSet<DbId> = categories.iter().map(|c| c.id).collect();
        let mut forest = Self::default();

        for category in &categories {
            match category.parent_id {
                Some(parent_id) if ids.contains(&parent_id) => {
                    forest.children.entry(parent_id).or_default().push(category.id);
                }
                _ => forest.roots.push(category.id),
            }
        }
        forest.nodes = categories.into_iter().map(|c| (c.id, c)).collect();
        forest
    }

    pub fn get(&self, id: DbId) -> Option<&Category> {
        self.nodes.get(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[DbId] {
        &self.roots
    }

    pub fn children_of(&self, id: DbId) -> &[DbId] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ancestors of `id`, nearest first. Stops at the first repeated id, so a
    /// corrupted parent chain still terminates.
    pub fn ancestors(&self, id: DbId) -> Vec<DbId> {
        let mut chain = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut current = self.nodes.get(&id).and_then(|c| c.parent_id);

        while let Some(parent_id) = current {
            if !seen.insert(parent_id) {
                break;
            }
            chain.push(parent_id);
            current = self.nodes.get(&parent_id).and_then(|c| c.parent_id);
        }
        chain
    }

    /// Whether `ancestor` appears on the parent chain of `id`.
    pub fn is_ancestor(&self, ancestor: DbId, id: DbId) -> bool {
        self.ancestors(id).contains(&ancestor)
    }

    /// `id` followed by all of its descendants, breadth first.
    pub fn subtree(&self, id: DbId) -> Vec<DbId> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut queue = std::collections::VecDeque::from([id]);

        while let Some(next) = queue.pop_front() {
            if !seen.insert(next) {
                continue;
            }
            out.push(next);
            queue.extend(self.children_of(next).iter().copied());
        }
        out
    }

    /// Whether any category is its own ancestor.
    pub fn has_cycle(&self) -> bool {
        self.nodes.keys().any(|&id| {
            let mut seen = HashSet::new();
            let mut current = Some(id);
            while let Some(node) = current {
                if !seen.insert(node) {
                    return true;
                }
                current = self.nodes.get(&node).and_then(|c| c.parent_id);
            }
            false
        })
    }

    /// Nested view of the whole forest, siblings ordered by position then name.
    pub fn into_tree(self) -> Vec<CategoryNode> {
        let mut nodes = self.nodes;
        let children = self.children;
        let mut roots: Vec<Category> = self
            .roots
            .iter()
            .filter_map(|id| nodes.remove(id))
            .collect();
        sort_siblings(&mut roots);

        roots
            .into_iter()
            .map(|root| build_node(root, &mut nodes, &children))
            .collect()
    }
}

fn sort_siblings(categories: &mut [Category]) {
    categories.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.name.cmp(&b.name)));
}

fn build_node(
    category: Category,
    nodes: &mut HashMap<DbId, Category>,
    children: &HashMap<DbId, Vec<DbId>>,
) -> CategoryNode {
    // Removing from `nodes` as we descend means a node reachable twice
    // (only possible in a corrupted forest) is emitted once.
    let mut kids: Vec<Category> = children
        .get(&category.id)
        .into_iter()
        .flatten()
        .filter_map(|id| nodes.remove(id))
        .collect();
    sort_siblings(&mut kids);

    CategoryNode {
        children: kids
            .into_iter()
            .map(|kid| build_node(kid, nodes, children))
            .collect(),
        category,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
