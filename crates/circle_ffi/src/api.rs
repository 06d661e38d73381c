//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose category/contact operations to Dart via FRB.
//! - Own the one process-wide `AppState` and serialize access to it.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Keys and ids cross the boundary as strings and are parsed here.
//! - Failures are reported in envelopes, never thrown.

use circle_core::config::resolve_db_path;
use circle_core::db::open_db;
use circle_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    AppError, AppResult, AppState, CategoryDraft, CategoryEntry, CategoryPatch, CategoryTag,
    ColorKey, ContactDraft, ContactPatch, ContactRecord, Dimension, Presence, SnapshotRepoError,
    SqliteSnapshotRepository, ValidationError, DEFAULT_RELATIONSHIP,
};
use log::warn;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock, PoisonError};
use uuid::Uuid;

static APP_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static APP_STATE: OnceLock<Mutex<Option<AppState<SqliteSnapshotRepository>>>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory return error.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Created or affected id, when the operation has one.
    pub id: Option<String>,
    /// Machine-readable error code; empty on success.
    pub error_code: String,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, id: Option<String>) -> Self {
        Self {
            ok: true,
            id,
            error_code: String::new(),
            message: message.into(),
        }
    }

    fn failure(operation: &str, err: &AppError) -> Self {
        Self {
            ok: false,
            id: None,
            error_code: err.code().to_string(),
            message: format!("{operation} failed: {err}"),
        }
    }
}

/// Response of a cascading category delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDeleteResponse {
    pub ok: bool,
    /// Removed node followed by its descendants, pre-order.
    pub removed_ids: Vec<String>,
    /// Contacts that lost at least one tag.
    pub affected_contacts: u32,
    pub error_code: String,
    pub message: String,
}

/// One node of a flattened dimension tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTreeItem {
    pub id: String,
    pub name: String,
    pub color: String,
    /// `0` for roots.
    pub depth: u32,
    pub parent_id: Option<String>,
}

/// Pre-order flattened tree of one dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTreeResponse {
    pub ok: bool,
    pub items: Vec<CategoryTreeItem>,
    pub message: String,
}

/// Category reference supplied by the host when tagging a contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactTagInput {
    /// Dimension key (`work|personal`).
    pub dim: String,
    pub node_id: String,
}

/// Category tag as shown next to a contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactTagItem {
    pub dim: String,
    pub node_id: String,
    /// Display path, e.g. `Engineering / Backend`.
    pub path: String,
}

/// Contact projection for list screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactItem {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub location: String,
    pub status: String,
    /// `online|busy|offline`.
    pub presence: String,
    pub relationship: u8,
    pub is_favorite: bool,
    pub last_contact_epoch_ms: Option<i64>,
    pub categories: Vec<ContactTagItem>,
}

/// Contact list response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactListResponse {
    pub ok: bool,
    pub items: Vec<ContactItem>,
    /// Effective limit for bounded listings.
    pub applied_limit: Option<u32>,
    pub message: String,
}

impl ContactListResponse {
    fn failure(operation: &str, err: &AppError) -> Self {
        Self {
            ok: false,
            items: Vec::new(),
            applied_limit: None,
            message: format!("{operation} failed: {err}"),
        }
    }
}

/// Counter response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountResponse {
    pub ok: bool,
    pub count: u32,
    pub message: String,
}

/// Adds a category node; `parent_id=None` appends a root.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
/// - Returns created node id on success.
#[flutter_rust_bridge::frb(sync)]
pub fn category_add(
    dimension: String,
    parent_id: Option<String>,
    name: String,
    color: String,
) -> ActionResponse {
    let result = parse_dimension(&dimension).and_then(|dimension| {
        let parent_id = parent_id.as_deref().map(parse_id).transpose()?;
        let draft = CategoryDraft::new(name, parse_color(&color)?);
        with_app_state(|app| app.add_category(dimension, parent_id, &draft))
    });
    match result {
        Ok(id) => ActionResponse::success("Category added.", Some(id.to_string())),
        Err(err) => action_failure("category_add", &err),
    }
}

/// Renames and/or recolors a node. `None` leaves the field untouched.
#[flutter_rust_bridge::frb(sync)]
pub fn category_update(
    dimension: String,
    node_id: String,
    name: Option<String>,
    color: Option<String>,
) -> ActionResponse {
    let result = parse_dimension(&dimension).and_then(|dimension| {
        let id = parse_id(&node_id)?;
        let patch = CategoryPatch {
            name,
            color: color.as_deref().map(parse_color).transpose()?,
        };
        with_app_state(|app| app.update_category(dimension, id, &patch)).map(|()| id)
    });
    match result {
        Ok(id) => ActionResponse::success("Category updated.", Some(id.to_string())),
        Err(err) => action_failure("category_update", &err),
    }
}

/// Deletes a node with its whole subtree and strips contact tags into it.
///
/// # FFI contract
/// - Contacts are never deleted by this call.
#[flutter_rust_bridge::frb(sync)]
pub fn category_delete(dimension: String, node_id: String) -> CategoryDeleteResponse {
    let result = parse_dimension(&dimension).and_then(|dimension| {
        let id = parse_id(&node_id)?;
        with_app_state(|app| app.delete_category(dimension, id))
    });
    match result {
        Ok(deletion) => CategoryDeleteResponse {
            ok: true,
            message: format!("Removed {} node(s).", deletion.removed_ids.len()),
            removed_ids: deletion
                .removed_ids
                .iter()
                .map(ToString::to_string)
                .collect(),
            affected_contacts: saturating_u32(deletion.affected_contacts),
            error_code: String::new(),
        },
        Err(err) => {
            log_failure("category_delete", &err);
            CategoryDeleteResponse {
                ok: false,
                removed_ids: Vec::new(),
                affected_contacts: 0,
                error_code: err.code().to_string(),
                message: format!("category_delete failed: {err}"),
            }
        }
    }
}

/// Returns one dimension's tree flattened in pre-order.
#[flutter_rust_bridge::frb(sync)]
pub fn category_tree(dimension: String) -> CategoryTreeResponse {
    let result = parse_dimension(&dimension).and_then(|dimension| {
        with_app_state(|app| {
            Ok(app
                .categories()
                .entries(dimension)
                .iter()
                .map(to_tree_item)
                .collect::<Vec<_>>())
        })
    });
    match result {
        Ok(items) => CategoryTreeResponse {
            ok: true,
            message: format!("{} node(s).", items.len()),
            items,
        },
        Err(err) => {
            log_failure("category_tree", &err);
            CategoryTreeResponse {
                ok: false,
                items: Vec::new(),
                message: format!("category_tree failed: {err}"),
            }
        }
    }
}

/// Creates a contact tagged with existing category nodes.
///
/// Input semantics:
/// - `relationship`: `1..=5`; `None` uses the default rating.
/// - `status`: free text; `None` stores an empty status.
/// - `tags`: repeated `(dim, node_id)` pairs are collapsed.
#[flutter_rust_bridge::frb(sync)]
pub fn contact_add(
    name: String,
    phone: String,
    location: Option<String>,
    status: Option<String>,
    relationship: Option<u8>,
    is_favorite: bool,
    tags: Vec<ContactTagInput>,
) -> ActionResponse {
    let result = parse_tags(&tags).and_then(|categories| {
        let mut draft = ContactDraft::new(name, phone);
        draft.location = location.unwrap_or_default();
        draft.status = status.unwrap_or_default();
        draft.relationship = relationship.unwrap_or(DEFAULT_RELATIONSHIP);
        draft.is_favorite = is_favorite;
        draft.categories = categories;
        with_app_state(|app| app.add_contact(draft))
    });
    match result {
        Ok(id) => ActionResponse::success("Contact added.", Some(id.to_string())),
        Err(err) => action_failure("contact_add", &err),
    }
}

/// Partially updates profile fields; `None` leaves a field unchanged.
///
/// Tags, favorite flag and last interaction are not touched here.
#[flutter_rust_bridge::frb(sync)]
pub fn contact_update_profile(
    contact_id: String,
    name: Option<String>,
    phone: Option<String>,
    location: Option<String>,
    status: Option<String>,
    relationship: Option<u8>,
) -> ActionResponse {
    let patch = ContactPatch {
        name,
        phone,
        location,
        status,
        relationship,
    };
    let result = parse_id(&contact_id)
        .and_then(|id| with_app_state(|app| app.update_contact_profile(id, &patch)).map(|()| id));
    match result {
        Ok(id) => ActionResponse::success("Contact updated.", Some(id.to_string())),
        Err(err) => action_failure("contact_update_profile", &err),
    }
}

/// Sets the presence indicator. Unknown keys store `offline`.
#[flutter_rust_bridge::frb(sync)]
pub fn contact_set_presence(contact_id: String, presence: String) -> ActionResponse {
    let presence = Presence::parse_lossy(&presence);
    let result = parse_id(&contact_id)
        .and_then(|id| with_app_state(|app| app.set_presence(id, presence)).map(|()| id));
    match result {
        Ok(id) => ActionResponse::success(
            format!("Presence set to {}.", presence.as_str()),
            Some(id.to_string()),
        ),
        Err(err) => action_failure("contact_set_presence", &err),
    }
}

/// Replaces every tag of the contact; an empty list clears them.
#[flutter_rust_bridge::frb(sync)]
pub fn contact_set_categories(contact_id: String, tags: Vec<ContactTagInput>) -> ActionResponse {
    let result = parse_id(&contact_id).and_then(|id| {
        let categories = parse_tags(&tags)?;
        with_app_state(|app| app.set_contact_categories(id, categories)).map(|()| id)
    });
    match result {
        Ok(id) => ActionResponse::success("Contact categories updated.", Some(id.to_string())),
        Err(err) => action_failure("contact_set_categories", &err),
    }
}

/// Stamps the contact's last interaction with the current time.
#[flutter_rust_bridge::frb(sync)]
pub fn contact_touch(contact_id: String) -> ActionResponse {
    let result = parse_id(&contact_id).and_then(|id| {
        with_app_state(|app| app.update_contact_last_contact(id)).map(|()| id)
    });
    match result {
        Ok(id) => ActionResponse::success("Contact touched.", Some(id.to_string())),
        Err(err) => action_failure("contact_touch", &err),
    }
}

/// Flips the favorite flag; the message carries the new value.
#[flutter_rust_bridge::frb(sync)]
pub fn contact_toggle_favorite(contact_id: String) -> ActionResponse {
    let result = parse_id(&contact_id)
        .and_then(|id| with_app_state(|app| app.toggle_favorite(id)).map(|flag| (id, flag)));
    match result {
        Ok((id, true)) => ActionResponse::success("Marked as favorite.", Some(id.to_string())),
        Ok((id, false)) => ActionResponse::success("Removed from favorites.", Some(id.to_string())),
        Err(err) => action_failure("contact_toggle_favorite", &err),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn contact_delete(contact_id: String) -> ActionResponse {
    let result = parse_id(&contact_id)
        .and_then(|id| with_app_state(|app| app.delete_contact(id)).map(|()| id));
    match result {
        Ok(id) => ActionResponse::success("Contact deleted.", Some(id.to_string())),
        Err(err) => action_failure("contact_delete", &err),
    }
}

/// Contacts tagged with exactly `(dimension, node_id)`.
#[flutter_rust_bridge::frb(sync)]
pub fn contacts_by_category(dimension: String, node_id: String) -> ContactListResponse {
    let result = parse_dimension(&dimension).and_then(|dimension| {
        let id = parse_id(&node_id)?;
        with_app_state(|app| Ok(to_contact_items(app.list_by_category(dimension, id))))
    });
    contact_list_response("contacts_by_category", result, None)
}

#[flutter_rust_bridge::frb(sync)]
pub fn contacts_favorites() -> ContactListResponse {
    let result = with_app_state(|app| Ok(to_contact_items(app.list_favorites())));
    contact_list_response("contacts_favorites", result, None)
}

/// Most recently contacted first.
///
/// # FFI contract
/// - `limit=None|0` uses the default; larger values are capped.
#[flutter_rust_bridge::frb(sync)]
pub fn contacts_recent(limit: Option<u32>) -> ContactListResponse {
    let result = with_app_state(|app| {
        let recent = app.list_recent(limit);
        Ok((to_contact_items(recent.items), recent.applied_limit))
    });
    match result {
        Ok((items, applied_limit)) => {
            contact_list_response("contacts_recent", Ok(items), Some(applied_limit))
        }
        Err(err) => contact_list_response("contacts_recent", Err(err), None),
    }
}

/// Number of contacts holding at least one tag in `dimension`.
#[flutter_rust_bridge::frb(sync)]
pub fn contacts_count_by_dimension(dimension: String) -> CountResponse {
    let result = parse_dimension(&dimension)
        .and_then(|dimension| with_app_state(|app| Ok(app.count_by_dimension(dimension))));
    match result {
        Ok(count) => CountResponse {
            ok: true,
            count: saturating_u32(count),
            message: String::new(),
        },
        Err(err) => {
            log_failure("contacts_count_by_dimension", &err);
            CountResponse {
                ok: false,
                count: 0,
                message: format!("contacts_count_by_dimension failed: {err}"),
            }
        }
    }
}

fn with_app_state<T>(
    f: impl FnOnce(&mut AppState<SqliteSnapshotRepository>) -> AppResult<T>,
) -> AppResult<T> {
    let mut guard = APP_STATE
        .get_or_init(|| Mutex::new(None))
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if guard.is_none() {
        *guard = Some(open_app_state()?);
    }
    match guard.as_mut() {
        Some(app) => f(app),
        None => Err(AppError::Persistence(SnapshotRepoError::Unavailable(
            "state not initialized".to_string(),
        ))),
    }
}

fn open_app_state() -> AppResult<AppState<SqliteSnapshotRepository>> {
    let conn = open_db(resolve_app_db_path())
        .map_err(|err| AppError::Persistence(err.into()))?;
    let repo = SqliteSnapshotRepository::try_new(conn).map_err(AppError::Persistence)?;
    AppState::open(repo)
}

fn resolve_app_db_path() -> PathBuf {
    APP_DB_PATH.get_or_init(|| resolve_db_path(None)).clone()
}

fn parse_dimension(value: &str) -> AppResult<Dimension> {
    Dimension::parse(value).map_err(AppError::from)
}

fn parse_color(value: &str) -> AppResult<ColorKey> {
    ColorKey::parse(value).map_err(AppError::from)
}

fn parse_id(value: &str) -> AppResult<Uuid> {
    Uuid::parse_str(value.trim())
        .map_err(|_| AppError::Validation(ValidationError::InvalidId(value.trim().to_string())))
}

fn parse_tags(tags: &[ContactTagInput]) -> AppResult<Vec<CategoryTag>> {
    tags.iter()
        .map(|tag| -> AppResult<CategoryTag> {
            Ok(CategoryTag::bare(
                parse_dimension(&tag.dim)?,
                parse_id(&tag.node_id)?,
            ))
        })
        .collect()
}

fn action_failure(operation: &str, err: &AppError) -> ActionResponse {
    log_failure(operation, err);
    ActionResponse::failure(operation, err)
}

fn log_failure(operation: &str, err: &AppError) {
    warn!(
        "event=ffi_call module=ffi status=error op={operation} error_code={}",
        err.code()
    );
}

fn contact_list_response(
    operation: &str,
    result: AppResult<Vec<ContactItem>>,
    applied_limit: Option<u32>,
) -> ContactListResponse {
    match result {
        Ok(items) => ContactListResponse {
            ok: true,
            message: if items.is_empty() {
                "No contacts.".to_string()
            } else {
                format!("Found {} contact(s).", items.len())
            },
            items,
            applied_limit,
        },
        Err(err) => {
            log_failure(operation, &err);
            ContactListResponse::failure(operation, &err)
        }
    }
}

fn to_tree_item(entry: &CategoryEntry<'_>) -> CategoryTreeItem {
    CategoryTreeItem {
        id: entry.node.id.to_string(),
        name: entry.node.name.clone(),
        color: entry.node.color.as_str().to_string(),
        depth: saturating_u32(entry.depth),
        parent_id: entry.parent_id.map(|id| id.to_string()),
    }
}

fn to_contact_items(records: Vec<&ContactRecord>) -> Vec<ContactItem> {
    records.into_iter().map(to_contact_item).collect()
}

fn to_contact_item(record: &ContactRecord) -> ContactItem {
    ContactItem {
        id: record.id.to_string(),
        name: record.name.clone(),
        phone: record.phone.clone(),
        location: record.location.clone(),
        status: record.status.clone(),
        presence: record.presence.as_str().to_string(),
        relationship: record.relationship,
        is_favorite: record.is_favorite,
        last_contact_epoch_ms: record.last_contact,
        categories: record
            .categories
            .iter()
            .map(|tag| ContactTagItem {
                dim: tag.dim.as_str().to_string(),
                node_id: tag.node_id.to_string(),
                path: tag.display_path(),
            })
            .collect(),
    }
}

fn saturating_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::{
        category_add, category_delete, category_tree, category_update, contact_add,
        contact_delete, contact_set_categories, contact_set_presence, contact_toggle_favorite,
        contact_touch, contact_update_profile, contacts_by_category, contacts_count_by_dimension,
        contacts_favorites, contacts_recent, core_version, init_logging, ping, ContactItem,
        ContactTagInput,
    };
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn category_add_rejects_unknown_keys_without_touching_state() {
        let response = category_add(
            "hobby".to_string(),
            None,
            "Chess".to_string(),
            "blue".to_string(),
        );
        assert!(!response.ok);
        assert_eq!(response.error_code, "validation");

        let response = category_add(
            "work".to_string(),
            None,
            "Chess".to_string(),
            "magenta".to_string(),
        );
        assert!(!response.ok);
        assert_eq!(response.error_code, "validation");

        let response = category_add(
            "work".to_string(),
            Some("not-a-uuid".to_string()),
            "Chess".to_string(),
            "blue".to_string(),
        );
        assert!(!response.ok);
        assert_eq!(response.error_code, "validation");
    }

    #[test]
    fn category_lifecycle_strips_contact_tags() {
        let root_name = unique_token("Engineering");
        let root = category_add("work".to_string(), None, root_name.clone(), "blue".to_string());
        assert!(root.ok, "{}", root.message);
        let root_id = root.id.expect("root id");

        let child = category_add(
            "work".to_string(),
            Some(root_id.clone()),
            "Backend".to_string(),
            "green".to_string(),
        );
        assert!(child.ok, "{}", child.message);
        let child_id = child.id.expect("child id");

        let tree = category_tree("work".to_string());
        assert!(tree.ok, "{}", tree.message);
        let child_item = tree
            .items
            .iter()
            .find(|item| item.id == child_id)
            .expect("child listed");
        assert_eq!(child_item.depth, 1);
        assert_eq!(child_item.parent_id.as_deref(), Some(root_id.as_str()));

        let contact = contact_add(
            unique_token("Ann"),
            "123".to_string(),
            None,
            None,
            None,
            false,
            vec![ContactTagInput {
                dim: "work".to_string(),
                node_id: child_id.clone(),
            }],
        );
        assert!(contact.ok, "{}", contact.message);
        let contact_id = contact.id.expect("contact id");

        let tagged = contacts_by_category("work".to_string(), child_id.clone());
        let item = tagged
            .items
            .iter()
            .find(|item| item.id == contact_id)
            .expect("contact listed under child");
        assert_eq!(item.relationship, 3);
        assert_eq!(item.categories[0].path, format!("{root_name} / Backend"));

        let renamed = category_update(
            "work".to_string(),
            root_id.clone(),
            Some("Eng".to_string()),
            None,
        );
        assert!(renamed.ok, "{}", renamed.message);

        let deleted = category_delete("work".to_string(), root_id.clone());
        assert!(deleted.ok, "{}", deleted.message);
        assert_eq!(deleted.removed_ids, vec![root_id.clone(), child_id.clone()]);
        assert!(deleted.affected_contacts >= 1);

        let tagged = contacts_by_category("work".to_string(), child_id);
        assert!(tagged.items.iter().all(|item| item.id != contact_id));

        let again = category_delete("work".to_string(), root_id);
        assert!(!again.ok);
        assert_eq!(again.error_code, "category_not_found");

        assert!(contact_delete(contact_id).ok);
    }

    #[test]
    fn contact_flags_and_listings() {
        let contact = contact_add(
            unique_token("Bo"),
            "456".to_string(),
            Some("Berlin".to_string()),
            None,
            Some(5),
            false,
            Vec::new(),
        );
        assert!(contact.ok, "{}", contact.message);
        let contact_id = contact.id.expect("contact id");

        let toggled = contact_toggle_favorite(contact_id.clone());
        assert!(toggled.ok, "{}", toggled.message);
        assert!(contacts_favorites()
            .items
            .iter()
            .any(|item| item.id == contact_id && item.location == "Berlin"));

        let touched = contact_touch(contact_id.clone());
        assert!(touched.ok, "{}", touched.message);
        let recent = contacts_recent(Some(500));
        assert_eq!(recent.applied_limit, Some(50));
        assert!(!recent.items.is_empty());

        let count = contacts_count_by_dimension("personal".to_string());
        assert!(count.ok, "{}", count.message);

        assert!(contact_delete(contact_id.clone()).ok);
        let missing = contact_touch(contact_id);
        assert!(!missing.ok);
        assert_eq!(missing.error_code, "contact_not_found");
    }

    #[test]
    fn contact_add_rejects_invalid_input() {
        let blank = contact_add(
            String::new(),
            "1".to_string(),
            None,
            None,
            None,
            false,
            Vec::new(),
        );
        assert!(!blank.ok);
        assert_eq!(blank.error_code, "validation");

        let out_of_range = contact_add(
            "Cy".to_string(),
            "1".to_string(),
            None,
            None,
            Some(9),
            false,
            Vec::new(),
        );
        assert!(!out_of_range.ok);

        let unknown_tag = contact_add(
            "Cy".to_string(),
            "1".to_string(),
            None,
            None,
            None,
            false,
            vec![ContactTagInput {
                dim: "personal".to_string(),
                node_id: uuid::Uuid::new_v4().to_string(),
            }],
        );
        assert!(!unknown_tag.ok);
        assert_eq!(unknown_tag.error_code, "category_not_found");
    }

    #[test]
    fn contact_profile_presence_and_categories_round_trip() {
        let contact = contact_add(
            unique_token("Dee"),
            "789".to_string(),
            None,
            Some("on leave".to_string()),
            Some(2),
            true,
            Vec::new(),
        );
        assert!(contact.ok, "{}", contact.message);
        let contact_id = contact.id.expect("contact id");
        let item = favorite_item(&contact_id);
        assert_eq!(item.status, "on leave");
        assert_eq!(item.relationship, 2);

        let updated = contact_update_profile(
            contact_id.clone(),
            None,
            Some("000".to_string()),
            Some("Oslo".to_string()),
            None,
            Some(4),
        );
        assert!(updated.ok, "{}", updated.message);
        let item = favorite_item(&contact_id);
        assert_eq!(item.phone, "000");
        assert_eq!(item.location, "Oslo");
        assert_eq!(item.status, "on leave");
        assert_eq!(item.relationship, 4);

        let rejected = contact_update_profile(contact_id.clone(), None, None, None, None, Some(0));
        assert!(!rejected.ok);
        assert_eq!(rejected.error_code, "validation");

        let busy = contact_set_presence(contact_id.clone(), "Busy".to_string());
        assert!(busy.ok, "{}", busy.message);
        assert_eq!(favorite_item(&contact_id).presence, "busy");
        let unknown = contact_set_presence(contact_id.clone(), "away".to_string());
        assert!(unknown.ok, "{}", unknown.message);
        assert_eq!(favorite_item(&contact_id).presence, "offline");

        let node = category_add(
            "personal".to_string(),
            None,
            unique_token("Climbing"),
            "teal".to_string(),
        );
        assert!(node.ok, "{}", node.message);
        let node_id = node.id.expect("node id");
        let tag = ContactTagInput {
            dim: "personal".to_string(),
            node_id: node_id.clone(),
        };
        let tagged = contact_set_categories(contact_id.clone(), vec![tag.clone(), tag]);
        assert!(tagged.ok, "{}", tagged.message);
        assert_eq!(favorite_item(&contact_id).categories.len(), 1);
        assert!(contacts_by_category("personal".to_string(), node_id.clone())
            .items
            .iter()
            .any(|item| item.id == contact_id));

        let cleared = contact_set_categories(contact_id.clone(), Vec::new());
        assert!(cleared.ok, "{}", cleared.message);
        assert!(favorite_item(&contact_id).categories.is_empty());

        assert!(category_delete("personal".to_string(), node_id).ok);
        assert!(contact_delete(contact_id.clone()).ok);
        let missing = contact_set_presence(contact_id, "online".to_string());
        assert_eq!(missing.error_code, "contact_not_found");
    }

    #[test]
    fn contact_set_categories_rejects_bad_tags() {
        let response = contact_set_categories(
            uuid::Uuid::new_v4().to_string(),
            vec![ContactTagInput {
                dim: "hobby".to_string(),
                node_id: uuid::Uuid::new_v4().to_string(),
            }],
        );
        assert!(!response.ok);
        assert_eq!(response.error_code, "validation");

        let response = contact_set_categories("nope".to_string(), Vec::new());
        assert_eq!(response.error_code, "validation");
    }

    fn favorite_item(contact_id: &str) -> ContactItem {
        contacts_favorites()
            .items
            .into_iter()
            .find(|item| item.id == contact_id)
            .expect("favorite listed")
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
