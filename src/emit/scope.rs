//! Lexical environments for lowering.
//!
//! Scopes live in an arena and address each other by index: the tree is
//! held together by parent links and a name-keyed child map, while `using`
//! is a separate, non-owning edge list that may cross the tree. Name
//! resolution searches local bindings, then each `using` scope's local
//! bindings in import order, then the parent chain.

use indexmap::IndexMap;

use super::instruction::Addr;

pub const INT: &str = "Int";
pub const BOOL: &str = "Bool";
pub const DIR: &str = "Dir";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScopeId(usize);

/// A `(scope, name)` pair. Built-in types carry no scope; a user-defined
/// type points at the scope its alias was declared in. Equality is
/// structural.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Type {
  pub scope: Option<ScopeId>,
  pub name: String,
}

impl Type {
  pub fn void() -> Type {
    Type {
      scope: None,
      name: String::new(),
    }
  }

  pub fn builtin(name: &str) -> Type {
    Type {
      scope: None,
      name: name.into(),
    }
  }

  pub fn is_void(&self) -> bool {
    self.scope.is_none() && self.name.is_empty()
  }
}

impl std::fmt::Display for Type {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    if self.is_void() {
      f.write_str("Void")
    } else {
      f.write_str(&self.name)
    }
  }
}

#[derive(Clone, Debug)]
pub struct Variable {
  pub name: String,
  pub addr: Addr,
  pub ty: Type,
}

#[derive(Clone, Debug)]
pub struct Function {
  pub name: String,
  pub label: String,
  pub ret: Type,
  pub params: Vec<Variable>,
  pub is_builtin: bool,
}

pub struct Scope {
  /// Empty for anonymous block scopes.
  pub name: String,
  /// Expected return type; set on function body scopes only.
  pub ret: Option<Type>,
  variables: IndexMap<String, Variable>,
  functions: IndexMap<String, Function>,
  types: IndexMap<String, Type>,
  using: Vec<ScopeId>,
  parent: Option<ScopeId>,
  children: IndexMap<String, ScopeId>,
  /// Label a `Continue` in this scope jumps to (the loop's end label).
  pub escape: Option<String>,
  /// Label a `Break` in this scope jumps to (the loop's start label).
  pub repeat: Option<String>,
}

impl Scope {
  fn new(name: impl Into<String>, parent: Option<ScopeId>) -> Self {
    Self {
      name: name.into(),
      ret: None,
      variables: IndexMap::new(),
      functions: IndexMap::new(),
      types: IndexMap::new(),
      using: Vec::new(),
      parent,
      children: IndexMap::new(),
      escape: None,
      repeat: None,
    }
  }
}

pub struct ScopeArena {
  scopes: Vec<Scope>,
}

impl ScopeArena {
  pub fn new() -> Self {
    Self {
      scopes: vec![Scope::new("", None)],
    }
  }

  pub fn root(&self) -> ScopeId {
    ScopeId(0)
  }

  fn get(&self, id: ScopeId) -> &Scope {
    &self.scopes[id.0]
  }

  fn get_mut(&mut self, id: ScopeId) -> &mut Scope {
    &mut self.scopes[id.0]
  }

  pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
    self.get(id).parent
  }

  pub fn name(&self, id: ScopeId) -> &str {
    &self.get(id).name
  }

  /// Allocate a named child and register it in the parent's child map.
  /// Fails if a sibling of the same name exists; the node is still
  /// allocated so the caller can keep lowering into it.
  pub fn add_scope(&mut self, parent: ScopeId, name: impl Into<String>) -> (ScopeId, bool) {
    let name = name.into();
    let id = ScopeId(self.scopes.len());
    let registered = !self.get(parent).children.contains_key(&name);
    self.scopes.push(Scope::new(name.clone(), Some(parent)));
    if registered {
      self.get_mut(parent).children.insert(name, id);
    }
    (id, registered)
  }

  /// Allocate an anonymous block scope (loop and branch bodies, function
  /// bodies). Never registered in the parent's child map.
  pub fn add_block(&mut self, parent: ScopeId) -> ScopeId {
    let id = ScopeId(self.scopes.len());
    self.scopes.push(Scope::new("", Some(parent)));
    id
  }

  pub fn set_loop_labels(&mut self, id: ScopeId, escape: String, repeat: String) {
    let scope = self.get_mut(id);
    scope.escape = Some(escape);
    scope.repeat = Some(repeat);
  }

  pub fn set_return_type(&mut self, id: ScopeId, ret: Type) {
    self.get_mut(id).ret = Some(ret);
  }

  pub fn add_variable(&mut self, id: ScopeId, variable: Variable) -> bool {
    let scope = self.get_mut(id);
    if scope.variables.contains_key(&variable.name) {
      return false;
    }
    scope.variables.insert(variable.name.clone(), variable);
    true
  }

  pub fn add_function(&mut self, id: ScopeId, function: Function) -> bool {
    let scope = self.get_mut(id);
    if scope.functions.contains_key(&function.name) {
      return false;
    }
    scope.functions.insert(function.name.clone(), function);
    true
  }

  pub fn add_type(&mut self, id: ScopeId, name: impl Into<String>, ty: Type) -> bool {
    let name = name.into();
    let scope = self.get_mut(id);
    if scope.types.contains_key(&name) {
      return false;
    }
    scope.types.insert(name, ty);
    true
  }

  pub fn add_using(&mut self, id: ScopeId, using: ScopeId) {
    self.get_mut(id).using.push(using);
  }

  /// Local, then each `using` scope's locals in import order, then up.
  pub fn get_variable(&self, from: ScopeId, name: &str) -> Option<&Variable> {
    let mut current = Some(from);
    while let Some(id) = current {
      let scope = self.get(id);
      if let Some(variable) = scope.variables.get(name) {
        return Some(variable);
      }
      for &using in &scope.using {
        if let Some(variable) = self.get(using).variables.get(name) {
          return Some(variable);
        }
      }
      current = scope.parent;
    }
    None
  }

  /// Same traversal as [`Self::get_variable`], over functions.
  pub fn get_function(&self, from: ScopeId, name: &str) -> Option<&Function> {
    let mut current = Some(from);
    while let Some(id) = current {
      let scope = self.get(id);
      if let Some(function) = scope.functions.get(name) {
        return Some(function);
      }
      for &using in &scope.using {
        if let Some(function) = self.get(using).functions.get(name) {
          return Some(function);
        }
      }
      current = scope.parent;
    }
    None
  }

  /// Same traversal, over alias-introduced type names.
  pub fn get_type(&self, from: ScopeId, name: &str) -> Option<&Type> {
    let mut current = Some(from);
    while let Some(id) = current {
      let scope = self.get(id);
      if let Some(ty) = scope.types.get(name) {
        return Some(ty);
      }
      for &using in &scope.using {
        if let Some(ty) = self.get(using).types.get(name) {
          return Some(ty);
        }
      }
      current = scope.parent;
    }
    None
  }

  /// Resolve a scope name: local children first, then each `using` scope
  /// (its own name or its local children), then up the parent chain, where
  /// enclosing scope names themselves are visible. `using` edges are never
  /// followed recursively, so the search terminates even when imports
  /// cross the tree.
  pub fn get_scope(&self, from: ScopeId, name: &str) -> Option<ScopeId> {
    let mut current = Some(from);
    while let Some(id) = current {
      let scope = self.get(id);
      if let Some(&child) = scope.children.get(name) {
        return Some(child);
      }
      for &using in &scope.using {
        if self.get(using).name == name {
          return Some(using);
        }
        if let Some(&child) = self.get(using).children.get(name) {
          return Some(child);
        }
      }
      if scope.name == name {
        return Some(id);
      }
      current = scope.parent;
    }
    None
  }

  /// A child of `id` by name, with no traversal.
  pub fn get_local_scope(&self, id: ScopeId, name: &str) -> Option<ScopeId> {
    self.get(id).children.get(name).copied()
  }

  /// A variable bound directly in `id`, with no traversal.
  pub fn get_local_variable(&self, id: ScopeId, name: &str) -> Option<&Variable> {
    self.get(id).variables.get(name)
  }

  /// A function bound directly in `id`, with no traversal.
  pub fn get_local_function(&self, id: ScopeId, name: &str) -> Option<&Function> {
    self.get(id).functions.get(name)
  }

  /// A type bound directly in `id`, with no traversal.
  pub fn get_local_type(&self, id: ScopeId, name: &str) -> Option<&Type> {
    self.get(id).types.get(name)
  }

  /// The expected return type of the nearest enclosing function body, or
  /// `None` outside any function.
  pub fn get_return_type(&self, from: ScopeId) -> Option<Type> {
    let mut current = Some(from);
    while let Some(id) = current {
      let scope = self.get(id);
      if let Some(ret) = &scope.ret {
        return Some(ret.clone());
      }
      current = scope.parent;
    }
    None
  }

  /// The `(escape, repeat)` labels of the nearest enclosing loop body.
  pub fn get_loop_labels(&self, from: ScopeId) -> Option<(String, String)> {
    let mut current = Some(from);
    while let Some(id) = current {
      let scope = self.get(id);
      if let (Some(escape), Some(repeat)) = (&scope.escape, &scope.repeat) {
        return Some((escape.clone(), repeat.clone()));
      }
      current = scope.parent;
    }
    None
  }
}

impl Default for ScopeArena {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests;
