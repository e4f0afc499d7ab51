use super::*;

#[test]
fn normalize_strips_spring_prefix() {
    assert_eq!(normalize("ROLE_ADMIN"), "ADMIN");
    assert_eq!(normalize("role_parent"), "PARENT");
}

#[test]
fn normalize_trims_and_uppercases() {
    assert_eq!(normalize("  enseignant "), "ENSEIGNANT");
    assert_eq!(normalize("COMPTABLE"), "COMPTABLE");
}

#[test]
fn normalize_keeps_bare_prefix_word() {
    assert_eq!(normalize("ROLE"), "ROLE");
    assert_eq!(normalize("ROLE_"), "");
}

#[test]
fn normalize_all_keeps_primary_role_first() {
    let roles = normalize_all(&["ROLE_PARENT", "ROLE_ADMIN", "parent", ""]);
    assert_eq!(roles, vec!["PARENT".to_owned(), "ADMIN".to_owned()]);
}

#[test]
fn parse_declaration_accepts_commas_and_spaces() {
    assert_eq!(parse_declaration("ENSEIGNANT, admin"), vec!["ENSEIGNANT".to_owned(), "ADMIN".to_owned()]);
    assert_eq!(parse_declaration("PARENT COMPTABLE"), vec!["PARENT".to_owned(), "COMPTABLE".to_owned()]);
    assert!(parse_declaration("  ,  ").is_empty());
}
