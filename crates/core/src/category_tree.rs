//! Category tree operations: create, update, move, reorder, delete, and the
//! read views built on top of the forest arena.
//!
//! The forest invariant (no category is its own ancestor) is enforced by
//! [`move_category`]. [`update_category`] may change the parent without that
//! check; callers that re-parent should go through move.

use std::collections::{HashSet, VecDeque};

use crate::category::{
    slugify, validate_category_name, validate_slug, Category, CategoryForest, CategoryNode,
    CategoryStatistics, CreateCategory, ReorderItem, UpdateCategory,
};
use crate::error::{CoreError, CoreResult};
use crate::store::{CategoryStore, ProductStore};
use crate::types::{new_id, now, DbId};

async fn load_category<S>(store: &mut S, id: DbId) -> CoreResult<Category>
where
    S: CategoryStore + ?Sized,
{
    store
        .get_category(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Category", id))
}

async fn ensure_slug_free<S>(store: &mut S, slug: &str, excluding: Option<DbId>) -> CoreResult<()>
where
    S: CategoryStore + ?Sized,
{
    if store.slug_taken(slug, excluding).await? {
        return Err(CoreError::Conflict(format!(
            "Category slug '{slug}' already exists"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

pub async fn get_category<S>(store: &mut S, id: DbId) -> CoreResult<Category>
where
    S: CategoryStore + ?Sized,
{
    load_category(store, id).await
}

/// Every category, ordered by position then name.
pub async fn list_categories<S>(store: &mut S) -> CoreResult<Vec<Category>>
where
    S: CategoryStore + ?Sized,
{
    Ok(store.find_all_categories().await?)
}

/// Roots with their descendants attached recursively.
pub async fn category_tree<S>(store: &mut S) -> CoreResult<Vec<CategoryNode>>
where
    S: CategoryStore + ?Sized,
{
    let all = store.find_all_categories().await?;
    Ok(CategoryForest::new(all).into_tree())
}

/// Direct children of a category.
pub async fn list_children<S>(store: &mut S, parent_id: DbId) -> CoreResult<Vec<Category>>
where
    S: CategoryStore + ?Sized,
{
    if !store.category_exists(parent_id).await? {
        return Err(CoreError::not_found("Category", parent_id));
    }
    Ok(store.find_children(parent_id).await?)
}

pub async fn category_statistics<S>(store: &mut S) -> CoreResult<CategoryStatistics>
where
    S: CategoryStore + ?Sized,
{
    Ok(store.category_statistics().await?)
}

// ---------------------------------------------------------------------------
// Create / update
// ---------------------------------------------------------------------------

pub async fn create_category<S>(store: &mut S, input: CreateCategory) -> CoreResult<Category>
where
    S: CategoryStore + ?Sized,
{
    validate_category_name(&input.name)?;

    let slug = match input.slug {
        Some(slug) => slug,
        None => slugify(&input.name),
    };
    validate_slug(&slug)?;
    ensure_slug_free(store, &slug, None).await?;

    if let Some(parent_id) = input.parent_id {
        if !store.category_exists(parent_id).await? {
            return Err(CoreError::not_found("Category", parent_id));
        }
    }

    let timestamp = now();
    let category = Category {
        id: new_id(),
        name: input.name,
        slug,
        description: input.description,
        icon: input.icon,
        color: input.color,
        image: input.image,
        is_active: input.is_active.unwrap_or(true),
        position: input.position.unwrap_or(0),
        product_count: 0,
        parent_id: input.parent_id,
        created_at: timestamp,
        updated_at: timestamp,
    };

    let saved = store.save_category(&category).await?;
    tracing::info!(category_id = %saved.id, slug = %saved.slug, "Category created");
    Ok(saved)
}

/// Apply a partial update.
///
/// A changed `parent_id` must exist but is not checked for cycles.
pub async fn update_category<S>(store: &mut S, id: DbId, patch: UpdateCategory) -> CoreResult<Category>
where
    S: CategoryStore + ?Sized,
{
    let mut category = load_category(store, id).await?;
    let new_parent = patch.parent_id.filter(|p| Some(*p) != category.parent_id);
    let slug_changed = patch.slug.as_ref().is_some_and(|s| *s != category.slug);

    patch.apply_to(&mut category);
    validate_category_name(&category.name)?;

    if slug_changed {
        validate_slug(&category.slug)?;
        ensure_slug_free(store, &category.slug, Some(id)).await?;
    }
    if let Some(parent_id) = new_parent {
        if parent_id == id {
            return Err(CoreError::InvalidTarget(
                "A category cannot be its own parent".into(),
            ));
        }
        if !store.category_exists(parent_id).await? {
            return Err(CoreError::not_found("Category", parent_id));
        }
    }

    category.updated_at = now();
    let saved = store.save_category(&category).await?;
    tracing::info!(category_id = %id, "Category updated");
    Ok(saved)
}

// ---------------------------------------------------------------------------
// Move
// ---------------------------------------------------------------------------

/// Re-parent a category, or detach it to the root when `new_parent_id` is
/// absent or nil.
///
/// Fails with [`CoreError::CycleDetected`] when the new parent lies inside the
/// moved category's subtree. Nothing is written on failure.
pub async fn move_category<S>(
    store: &mut S,
    category_id: DbId,
    new_parent_id: Option<DbId>,
) -> CoreResult<Category>
where
    S: CategoryStore + ?Sized,
{
    let mut category = load_category(store, category_id).await?;

    let Some(new_parent_id) = new_parent_id.filter(|id| !id.is_nil()) else {
        category.parent_id = None;
        category.updated_at = now();
        let saved = store.save_category(&category).await?;
        tracing::info!(%category_id, "Category moved to root");
        return Ok(saved);
    };

    if new_parent_id == category_id {
        return Err(CoreError::InvalidTarget(
            "A category cannot be its own parent".into(),
        ));
    }

    let parent = load_category(store, new_parent_id).await?;

    // Walk upward from the new parent. Reaching the moved node means the
    // parent sits in its subtree. A repeat without reaching it means the
    // stored chain is already corrupt; refuse rather than extend it.
    let mut visited = HashSet::from([parent.id]);
    let mut current = parent.parent_id;
    while let Some(ancestor_id) = current {
        if ancestor_id == category_id {
            return Err(CoreError::CycleDetected {
                category_id,
                new_parent_id,
            });
        }
        if !visited.insert(ancestor_id) {
            tracing::warn!(
                %category_id,
                %new_parent_id,
                %ancestor_id,
                "Corrupted category ancestor chain",
            );
            return Err(CoreError::CycleDetected {
                category_id,
                new_parent_id,
            });
        }
        current = match store.get_category(ancestor_id).await? {
            Some(ancestor) => ancestor.parent_id,
            None => None,
        };
    }

    category.parent_id = Some(new_parent_id);
    category.updated_at = now();
    let saved = store.save_category(&category).await?;
    tracing::info!(%category_id, %new_parent_id, "Category moved");
    Ok(saved)
}

// ---------------------------------------------------------------------------
// Reorder
// ---------------------------------------------------------------------------

/// Assign sibling positions in one batch.
///
/// Every id must exist, otherwise nothing is written. Positions are taken as
/// given; duplicates are allowed.
pub async fn reorder_categories<S>(store: &mut S, items: &[ReorderItem]) -> CoreResult<Vec<Category>>
where
    S: CategoryStore + ?Sized,
{
    if items.is_empty() {
        return Err(CoreError::BadRequest("Reorder list must not be empty".into()));
    }

    let mut ids: Vec<DbId> = Vec::with_capacity(items.len());
    let mut seen = HashSet::new();
    for item in items {
        if seen.insert(item.id) {
            ids.push(item.id);
        }
    }

    let mut categories = store.get_categories(&ids).await?;
    if categories.len() != ids.len() {
        let found: HashSet<DbId> = categories.iter().map(|c| c.id).collect();
        let missing: Vec<String> = ids
            .iter()
            .filter(|id| !found.contains(id))
            .map(ToString::to_string)
            .collect();
        return Err(CoreError::BadRequest(format!(
            "Unknown category ids in reorder: {}",
            missing.join(", ")
        )));
    }

    let timestamp = now();
    for category in &mut categories {
        // Last entry wins when an id is listed twice.
        if let Some(item) = items.iter().rev().find(|item| item.id == category.id) {
            category.position = item.position;
            category.updated_at = timestamp;
        }
    }

    let saved = store.save_categories(&categories).await?;
    tracing::info!(count = saved.len(), "Categories reordered");
    Ok(saved)
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

/// Delete a category together with its whole subtree.
///
/// Refused with [`CoreError::Conflict`] while any product still belongs to a
/// category in that subtree.
pub async fn delete_category<S>(store: &mut S, id: DbId) -> CoreResult<u64>
where
    S: CategoryStore + ProductStore + ?Sized,
{
    if !store.category_exists(id).await? {
        return Err(CoreError::not_found("Category", id));
    }

    let mut subtree = Vec::new();
    let mut visited = HashSet::new();
    let mut queue = VecDeque::from([id]);
    while let Some(next) = queue.pop_front() {
        if !visited.insert(next) {
            continue;
        }
        subtree.push(next);
        for child in store.find_children(next).await? {
            queue.push_back(child.id);
        }
    }

    let referencing = store.count_products_in_categories(&subtree).await?;
    if referencing > 0 {
        return Err(CoreError::Conflict(format!(
            "{referencing} product(s) still belong to category {id} or its descendants"
        )));
    }

    let removed = store.delete_categories(&subtree).await?;
    tracing::info!(category_id = %id, removed, "Category subtree deleted");
    Ok(removed)
}
