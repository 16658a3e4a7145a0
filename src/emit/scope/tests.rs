use super::*;

fn variable(name: &str, addr: Addr) -> Variable {
  Variable {
    name: name.into(),
    addr,
    ty: Type::builtin(INT),
  }
}

#[test]
fn variables_resolve_through_parents() {
  let mut arena = ScopeArena::new();
  let root = arena.root();
  let inner = arena.add_block(root);

  assert!(arena.add_variable(root, variable("x", 128)));
  assert!(arena.get_variable(inner, "x").is_some());
  assert!(arena.get_variable(inner, "y").is_none());
}

#[test]
fn redeclaration_in_the_same_scope_fails() {
  let mut arena = ScopeArena::new();
  let root = arena.root();

  assert!(arena.add_variable(root, variable("x", 128)));
  assert!(!arena.add_variable(root, variable("x", 129)));
}

#[test]
fn shadowing_in_a_child_scope_is_allowed() {
  let mut arena = ScopeArena::new();
  let root = arena.root();
  let inner = arena.add_block(root);

  assert!(arena.add_variable(root, variable("x", 128)));
  assert!(arena.add_variable(inner, variable("x", 129)));
  assert_eq!(arena.get_variable(inner, "x").unwrap().addr, 129);
}

#[test]
fn using_imports_resolve_in_import_order() {
  let mut arena = ScopeArena::new();
  let root = arena.root();
  let (first, _) = arena.add_scope(root, "first");
  let (second, _) = arena.add_scope(root, "second");
  arena.add_variable(first, variable("v", 1));
  arena.add_variable(second, variable("v", 2));

  arena.add_using(root, first);
  arena.add_using(root, second);
  assert_eq!(arena.get_variable(root, "v").unwrap().addr, 1);
}

#[test]
fn using_makes_bindings_visible_without_qualification() {
  let mut arena = ScopeArena::new();
  let root = arena.root();
  let (farm, _) = arena.add_scope(root, "farm");
  arena.add_variable(farm, variable("count", 130));

  assert!(arena.get_variable(root, "count").is_none());
  arena.add_using(root, farm);
  assert!(arena.get_variable(root, "count").is_some());
}

#[test]
fn scopes_resolve_through_children_imports_and_ancestors() {
  let mut arena = ScopeArena::new();
  let root = arena.root();
  let (farm, registered) = arena.add_scope(root, "farm");
  assert!(registered);
  let (barn, _) = arena.add_scope(farm, "barn");

  // Child by name.
  assert_eq!(arena.get_scope(root, "farm"), Some(farm));
  // Nested child is not visible from the root without qualification.
  assert_eq!(arena.get_scope(root, "barn"), None);
  // From inside, the parent chain exposes enclosing scope names.
  assert_eq!(arena.get_scope(barn, "farm"), Some(farm));

  // A used scope is visible by its own name, and lends its children.
  let (other, _) = arena.add_scope(farm, "other");
  arena.add_using(root, barn);
  assert_eq!(arena.get_scope(root, "barn"), Some(barn));
  arena.add_using(root, farm);
  assert_eq!(arena.get_scope(root, "other"), Some(other));
}

#[test]
fn duplicate_sibling_scope_is_rejected() {
  let mut arena = ScopeArena::new();
  let root = arena.root();
  let (_, first) = arena.add_scope(root, "farm");
  let (_, second) = arena.add_scope(root, "farm");
  assert!(first);
  assert!(!second);
}

#[test]
fn return_type_walks_up_to_the_function_scope() {
  let mut arena = ScopeArena::new();
  let root = arena.root();
  let body = arena.add_block(root);
  let branch = arena.add_block(body);

  assert_eq!(arena.get_return_type(branch), None);
  arena.set_return_type(body, Type::builtin(INT));
  assert_eq!(arena.get_return_type(branch), Some(Type::builtin(INT)));
  assert_eq!(arena.get_return_type(root), None);
}

#[test]
fn loop_labels_walk_up_to_the_nearest_loop() {
  let mut arena = ScopeArena::new();
  let root = arena.root();
  let outer = arena.add_block(root);
  arena.set_loop_labels(outer, "label2".into(), "label1".into());
  let branch = arena.add_block(outer);

  assert_eq!(
    arena.get_loop_labels(branch),
    Some(("label2".into(), "label1".into()))
  );
  assert_eq!(arena.get_loop_labels(root), None);
}

#[test]
fn type_equality_is_structural() {
  let mut arena = ScopeArena::new();
  let root = arena.root();
  let (colors, _) = arena.add_scope(root, "colors");

  assert_eq!(Type::builtin(INT), Type::builtin(INT));
  assert_ne!(Type::builtin(INT), Type::builtin(BOOL));
  assert_ne!(
    Type::builtin(INT),
    Type {
      scope: Some(colors),
      name: INT.into()
    }
  );
  assert!(Type::void().is_void());
}
