use std::sync::Arc;

use super::*;
use crate::config::GateConfig;
use crate::store::{MemoryStorage, Storage};
use serde_json::json;

fn oracle_with(token: Option<&str>, user: Option<Value>) -> SessionOracle {
    let storage = Arc::new(MemoryStorage::new());
    if let Some(token) = token {
        storage.set_item("token", token).unwrap();
    }
    if let Some(user) = user {
        storage.set_item("user", &user.to_string()).unwrap();
    }
    let store = CredentialStore::new(storage, &GateConfig::default());
    SessionOracle::new(store, "ADMIN")
}

// =============================================================================
// is_valid
// =============================================================================

#[test]
fn valid_with_token_user_and_roles() {
    let oracle = oracle_with(Some("abc"), Some(json!({ "username": "p1", "roles": ["PARENT"] })));
    assert!(oracle.is_valid());
}

#[test]
fn invalid_without_token_regardless_of_user() {
    for user in [
        None,
        Some(json!({ "username": "p1", "roles": ["PARENT"] })),
        Some(json!({ "username": "a1", "roles": ["ADMIN", "COMPTABLE"], "nom": "Ba" })),
        Some(json!({ "username": "x", "roles": [] })),
    ] {
        assert!(!oracle_with(None, user.clone()).is_valid(), "user {user:?}");
    }
}

#[test]
fn invalid_with_empty_roles() {
    let oracle = oracle_with(Some("abc"), Some(json!({ "username": "p1", "roles": [] })));
    assert!(!oracle.is_valid());
}

#[test]
fn invalid_with_missing_roles() {
    let oracle = oracle_with(Some("abc"), Some(json!({ "username": "p1" })));
    assert!(!oracle.is_valid());
}

#[test]
fn legacy_scalar_role_is_normalized_to_list() {
    let oracle = oracle_with(Some("abc"), Some(json!({ "username": "c1", "role": "COMPTABLE" })));
    assert!(oracle.is_valid());
    assert_eq!(oracle.primary_role(), "COMPTABLE");
    assert_eq!(oracle.current_user().unwrap().roles, vec!["COMPTABLE".to_owned()]);
}

#[test]
fn stored_tags_are_canonical_after_load() {
    let oracle = oracle_with(Some("abc"), Some(json!({ "username": "a1", "roles": [" role_comptable", "admin", "ADMIN"] })));
    assert_eq!(oracle.current_user().unwrap().roles, vec!["COMPTABLE".to_owned(), "ADMIN".to_owned()]);
}

#[test]
fn legacy_lowercase_parent_reaches_own_dashboard() {
    use crate::gate::{AccessGate, AccessState};
    use crate::redirect::MemoryNavigator;

    let storage = Arc::new(MemoryStorage::new());
    storage.set_item("token", "abc").unwrap();
    storage.set_item("user", r#"{"username":"p1","role":"parent"}"#).unwrap();
    let nav = Arc::new(MemoryNavigator::at("/dashboard-parent.html"));
    let gate = AccessGate::new(GateConfig::default(), storage, nav.clone());

    assert_eq!(gate.check_current_page(), AccessState::Allowed);
    assert!(nav.history().is_empty());
    assert_eq!(gate.oracle().primary_role(), "PARENT");
}

#[test]
fn roles_list_wins_over_legacy_scalar() {
    let oracle = oracle_with(Some("abc"), Some(json!({ "username": "c1", "roles": ["PARENT"], "role": "ADMIN" })));
    assert_eq!(oracle.current_user().unwrap().roles, vec!["PARENT".to_owned()]);
}

// =============================================================================
// primary_role
// =============================================================================

#[test]
fn primary_role_is_first_entry() {
    let oracle = oracle_with(Some("abc"), Some(json!({ "username": "t1", "roles": ["ENSEIGNANT", "PARENT"] })));
    assert_eq!(oracle.primary_role(), "ENSEIGNANT");
}

#[test]
fn primary_role_falls_back_when_roles_empty() {
    let oracle = oracle_with(Some("abc"), Some(json!({ "username": "t1", "roles": [] })));
    assert_eq!(oracle.primary_role(), "ADMIN");
}

#[test]
fn primary_role_falls_back_without_session() {
    assert_eq!(oracle_with(None, None).primary_role(), "ADMIN");
}

// =============================================================================
// has_any_role
// =============================================================================

#[test]
fn has_any_role_matches_any_candidate() {
    let oracle = oracle_with(Some("abc"), Some(json!({ "username": "t1", "roles": ["ENSEIGNANT", "PARENT"] })));
    assert!(oracle.has_any_role(&["ADMIN", "PARENT"]));
    assert!(!oracle.has_any_role(&["ADMIN", "COMPTABLE"]));
}

#[test]
fn has_any_role_is_exact_match_on_canonical_tags() {
    let oracle = oracle_with(Some("abc"), Some(json!({ "username": "a1", "roles": ["ROLE_ADMIN"] })));
    assert!(oracle.has_any_role(&["ADMIN"]));
    assert!(!oracle.has_any_role(&["admin"]));
    assert!(!oracle.has_any_role(&["ROLE_ADMIN"]));
}

#[test]
fn has_any_role_false_without_session_or_candidates() {
    assert!(!oracle_with(None, None).has_any_role(&["ADMIN"]));
    let oracle = oracle_with(Some("abc"), Some(json!({ "username": "a1", "roles": ["ADMIN"] })));
    assert!(!oracle.has_any_role::<&str>(&[]));
}

// =============================================================================
// accessors
// =============================================================================

#[test]
fn token_and_user_only_for_valid_session() {
    let oracle = oracle_with(Some("abc"), Some(json!({ "username": "p1", "roles": [] })));
    assert_eq!(oracle.token(), None);
    assert_eq!(oracle.current_user(), None);

    let oracle = oracle_with(Some("abc"), Some(json!({ "username": "p1", "roles": ["PARENT"] })));
    assert_eq!(oracle.token().as_deref(), Some("abc"));
    assert_eq!(oracle.current_user().unwrap().username, "p1");
}

#[test]
fn oracle_sees_logout_from_another_tab() {
    let oracle = oracle_with(Some("abc"), Some(json!({ "username": "p1", "roles": ["PARENT"] })));
    assert!(oracle.is_valid());
    oracle.store().clear();
    assert!(!oracle.is_valid());
}

#[test]
fn display_name_prefers_profile_names() {
    let mut user = User::new("t1", vec!["ENSEIGNANT".to_owned()]);
    assert_eq!(user.display_name(), "t1");
    user.profile.insert("prenom".into(), json!("Awa"));
    user.profile.insert("nom".into(), json!("Ndiaye"));
    assert_eq!(user.display_name(), "Awa Ndiaye");
}

#[test]
fn reserved_profile_keys_are_reported() {
    let mut user = User::new("t1", vec!["ENSEIGNANT".to_owned()]);
    user.profile.insert("matiere".into(), json!("SVT"));
    assert_eq!(user.reserved_profile_key(), None);
    for key in ["username", "roles", "role"] {
        let mut shadowed = user.clone();
        shadowed.profile.insert(key.into(), json!("X"));
        assert_eq!(shadowed.reserved_profile_key(), Some(key));
    }
}

#[test]
fn user_new_normalizes_tags() {
    assert_eq!(User::new("c1", vec!["role_comptable".to_owned()]).roles, vec!["COMPTABLE".to_owned()]);
}

#[test]
fn user_serializes_profile_fields_flat() {
    let mut user = User::new("t1", vec!["ENSEIGNANT".to_owned()]);
    user.profile.insert("matiere".into(), json!("Mathematiques"));
    let value = serde_json::to_value(&user).unwrap();
    assert_eq!(value["username"], "t1");
    assert_eq!(value["roles"], json!(["ENSEIGNANT"]));
    assert_eq!(value["matiere"], "Mathematiques");
}
