//! Facts model: the bound-program snapshot that every query reads.
//!
//! This module provides the semantic program data model for symscope:
//! - [`ScopeInfo`]: Lexically nested regions (namespace, type, method, block, ...)
//! - [`Symbol`]: Named entities declared in a scope (locals, members, types, ...)
//! - [`TypeDecl`]: Type-lattice facts for type symbols (kind, base, interfaces)
//! - [`TypeParamInfo`]: Generic constraints for type parameters
//! - [`Signature`]: Parameter lists and return types of methods
//! - [`Interception`]: Interceptor methods bound to call-site locations
//!
//! The [`FactsStore`] provides in-memory storage with:
//! - Ordered maps for O(log n) ID lookups and deterministic iteration
//! - Postings lists for the queries lookup needs (scope → symbols, owner → scope)
//! - Structural validation of the invariants the binder host must uphold
//!
//! # Ownership Model
//!
//! Scopes form a strict tree through `parent` back-references that are only
//! used for traversal. Symbols belong to exactly one declaring scope. Members
//! of a type are the symbols declared in the scope *owned* by the type symbol,
//! so metadata types (no source span) still host their members in a
//! `from_metadata` scope.
//!
//! # Lifecycle
//!
//! A store is populated once by the binder host and then treated as immutable:
//! queries take `&FactsStore` and never mutate it. Re-analysis produces a new
//! store instead of updating the old one.

mod persist;
mod types;

pub use persist::FactsSnapshot;
pub use types::{Substitution, TypeRef};

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{SemanticError, SemanticResult};
use crate::text::Span;

// ============================================================================
// Schema Version
// ============================================================================

/// Schema version for [`FactsSnapshot`] serialization.
///
/// Increment this when:
/// - Adding/removing fields from serialized structs
/// - Changing field types or serialization format
/// - Breaking changes to enum variants
pub const FACTS_SCHEMA_VERSION: u32 = 1;

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for a symbol within a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

impl SymbolId {
    /// Create a new symbol ID.
    pub fn new(id: u32) -> Self {
        SymbolId(id)
    }
}

impl std::fmt::Display for SymbolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sym_{}", self.0)
    }
}

/// Unique identifier for a scope within a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

impl ScopeId {
    /// The synthetic empty root scope.
    ///
    /// Returned when no bound scope contains a location (malformed tree or a
    /// position outside every scope). It declares nothing.
    pub const SYNTHETIC_ROOT: ScopeId = ScopeId(u32::MAX);

    /// Create a new scope ID.
    pub fn new(id: u32) -> Self {
        ScopeId(id)
    }

    /// Check if this is the synthetic empty root scope.
    pub fn is_synthetic_root(&self) -> bool {
        *self == ScopeId::SYNTHETIC_ROOT
    }
}

impl std::fmt::Display for ScopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_synthetic_root() {
            write!(f, "scope_root")
        } else {
            write!(f, "scope_{}", self.0)
        }
    }
}

// ============================================================================
// Enums
// ============================================================================

/// Kind of lexical scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum ScopeKind {
    /// Namespace body (including the global namespace).
    #[default]
    Namespace,
    /// Type body (class, struct, interface, record, enum).
    Type,
    /// Implicit scope of top-level (script/file-scope) statements.
    TopLevel,
    /// Method body including its parameter list.
    Method,
    /// Local function body including its parameter list.
    LocalFunction,
    /// Lambda body including its parameter list.
    Lambda,
    /// Executable block.
    Block,
    /// Switch section or switch-expression arm (pattern variables).
    SwitchArm,
    /// Query expression clause (range variables).
    Query,
    /// `nameof(...)` argument.
    Nameof,
    /// Attribute argument list.
    AttributeArgument,
}

impl ScopeKind {
    /// Scopes that own a parameter list (method bodies in the broad sense).
    pub fn is_function_like(&self) -> bool {
        matches!(
            self,
            ScopeKind::Method | ScopeKind::LocalFunction | ScopeKind::Lambda | ScopeKind::TopLevel
        )
    }

    /// Scopes meaningful for local-name uniqueness: executable blocks,
    /// parameter lists and method bodies.
    pub fn is_local_declaration_space(&self) -> bool {
        self.is_function_like()
            || matches!(
                self,
                ScopeKind::Block | ScopeKind::SwitchArm | ScopeKind::Query
            )
    }
}

/// Kind of symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum SymbolKind {
    #[default]
    Local,
    Parameter,
    /// Query range variable.
    RangeVariable,
    /// Variable introduced by a declaration pattern.
    PatternVariable,
    Label,
    Field,
    Property,
    Event,
    Method,
    LocalFunction,
    /// Named type (class, struct, interface, record, enum, delegate).
    Type,
    TypeParameter,
    Namespace,
    /// `using Alias = Target;`
    Alias,
    EnumMember,
}

impl SymbolKind {
    /// Kinds visible only after their declaration (textual precedence).
    pub fn is_textually_scoped(&self) -> bool {
        matches!(
            self,
            SymbolKind::Local | SymbolKind::RangeVariable | SymbolKind::PatternVariable
        )
    }

    /// Kinds visible throughout their declaring scope regardless of
    /// declaration order.
    pub fn is_container_wide(&self) -> bool {
        matches!(self, SymbolKind::LocalFunction | SymbolKind::Label)
    }

    /// Kinds that are members of a type.
    pub fn is_member(&self) -> bool {
        matches!(
            self,
            SymbolKind::Field
                | SymbolKind::Property
                | SymbolKind::Event
                | SymbolKind::Method
                | SymbolKind::EnumMember
                | SymbolKind::Type
        )
    }

    /// Kinds that name a type or namespace.
    pub fn is_type_or_namespace(&self) -> bool {
        matches!(
            self,
            SymbolKind::Type | SymbolKind::TypeParameter | SymbolKind::Namespace
        )
    }

    /// Output kind string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Local => "local",
            SymbolKind::Parameter => "parameter",
            SymbolKind::RangeVariable => "range_variable",
            SymbolKind::PatternVariable => "pattern_variable",
            SymbolKind::Label => "label",
            SymbolKind::Field => "field",
            SymbolKind::Property => "property",
            SymbolKind::Event => "event",
            SymbolKind::Method => "method",
            SymbolKind::LocalFunction => "local_function",
            SymbolKind::Type => "type",
            SymbolKind::TypeParameter => "type_parameter",
            SymbolKind::Namespace => "namespace",
            SymbolKind::Alias => "alias",
            SymbolKind::EnumMember => "enum_member",
        }
    }
}

/// Declared accessibility of a symbol.
///
/// | Syntax | Accessibility |
/// |--------|---------------|
/// | `public` | [`Accessibility::Public`] |
/// | `internal` | [`Accessibility::Internal`] |
/// | `protected` | [`Accessibility::Protected`] |
/// | `protected internal` | [`Accessibility::ProtectedInternal`] |
/// | `private protected` | [`Accessibility::PrivateProtected`] |
/// | `private` | [`Accessibility::Private`] |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum Accessibility {
    #[default]
    Public,
    Internal,
    Protected,
    ProtectedInternal,
    PrivateProtected,
    Private,
}

/// Semantic modifier on a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    /// `static` member, static class, static lambda or static local function.
    Static,
    /// `sealed` class.
    Sealed,
    /// `abstract` member or type.
    Abstract,
    /// `virtual` member.
    Virtual,
    /// `override` member.
    Override,
    /// `const` field or local.
    Const,
    /// `readonly` field.
    Readonly,
    /// `extern` method.
    Extern,
    /// `async` method, lambda or local function.
    Async,
    /// `partial` method or type.
    Partial,
    /// Marked obsolete/deprecated.
    Obsolete,
    /// Extension method (first parameter is `this`).
    Extension,
}

/// Kind of type declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum TypeKind {
    #[default]
    Class,
    Struct,
    Interface,
    Record,
    RecordStruct,
    Enum,
    Delegate,
}

impl TypeKind {
    /// Check whether values of this kind are value types.
    pub fn is_value_type(&self) -> bool {
        matches!(self, TypeKind::Struct | TypeKind::RecordStruct | TypeKind::Enum)
    }
}

/// Kind of parameter in a method signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum ParamKind {
    /// Standard by-value parameter.
    #[default]
    Regular,
    Ref,
    Out,
    In,
    /// `params T[]`
    Params,
    /// Receiver parameter of an extension method.
    This,
}

/// Types the engine needs to recognize by identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum WellKnownType {
    Object,
    ValueType,
    Enum,
    /// Generic nullable value wrapper (`Nullable<T>`).
    Nullable,
    /// Nominal disposal interface (`IDisposable`).
    Disposable,
    /// Nominal async disposal interface (`IAsyncDisposable`).
    AsyncDisposable,
    Task,
    ValueTask,
}

// ============================================================================
// Facts Tables
// ============================================================================

/// A symbol declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    /// Unique identifier for this symbol.
    pub symbol_id: SymbolId,
    /// Kind of symbol.
    pub kind: SymbolKind,
    /// Symbol name as written (without `@` escaping).
    pub name: String,
    /// Scope this symbol is declared in.
    pub scope_id: ScopeId,
    /// Byte span of the declaring identifier (`None` for metadata symbols).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decl_span: Option<Span>,
    /// Containing type for members.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_symbol_id: Option<SymbolId>,
    /// Declared accessibility.
    #[serde(default)]
    pub accessibility: Accessibility,
    /// Semantic modifiers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<Modifier>,
    /// Generic arity (number of type parameters).
    #[serde(default)]
    pub arity: u32,
    /// Type of a variable/field/property/parameter, return type of a method,
    /// underlying enum type of an enum member, or target of an alias.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_ref: Option<TypeRef>,
    /// Symbol comes from referenced metadata rather than source.
    #[serde(default)]
    pub from_metadata: bool,
    /// Interface member this symbol explicitly implements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explicit_impl_of: Option<SymbolId>,
}

impl Symbol {
    /// Create a new public symbol with no modifiers.
    pub fn new(
        symbol_id: SymbolId,
        kind: SymbolKind,
        name: impl Into<String>,
        scope_id: ScopeId,
    ) -> Self {
        Symbol {
            symbol_id,
            kind,
            name: name.into(),
            scope_id,
            decl_span: None,
            container_symbol_id: None,
            accessibility: Accessibility::Public,
            modifiers: Vec::new(),
            arity: 0,
            type_ref: None,
            from_metadata: false,
            explicit_impl_of: None,
        }
    }

    /// Set the declaration span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.decl_span = Some(span);
        self
    }

    /// Set the containing type.
    pub fn with_container(mut self, container: SymbolId) -> Self {
        self.container_symbol_id = Some(container);
        self
    }

    /// Set the accessibility.
    pub fn with_accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self
    }

    /// Add a modifier.
    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        if !self.modifiers.contains(&modifier) {
            self.modifiers.push(modifier);
        }
        self
    }

    /// Add several modifiers.
    pub fn with_modifiers(self, modifiers: &[Modifier]) -> Self {
        modifiers.iter().fold(self, |s, m| s.with_modifier(*m))
    }

    /// Set the symbol's type.
    pub fn with_type(mut self, type_ref: TypeRef) -> Self {
        self.type_ref = Some(type_ref);
        self
    }

    /// Set the generic arity.
    pub fn with_arity(mut self, arity: u32) -> Self {
        self.arity = arity;
        self
    }

    /// Mark as coming from metadata.
    pub fn with_from_metadata(mut self) -> Self {
        self.from_metadata = true;
        self
    }

    /// Mark as an explicit implementation of an interface member.
    pub fn with_explicit_impl(mut self, interface_member: SymbolId) -> Self {
        self.explicit_impl_of = Some(interface_member);
        self
    }

    /// Check for a modifier.
    pub fn has_modifier(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }

    /// Check if the symbol is accessed without an instance.
    ///
    /// Constants, enum members and nested types are implicitly static.
    pub fn is_static(&self) -> bool {
        self.has_modifier(Modifier::Static)
            || self.has_modifier(Modifier::Const)
            || matches!(self.kind, SymbolKind::EnumMember | SymbolKind::Type)
    }

    /// Check if the symbol is a member that requires an instance.
    pub fn is_instance_member(&self) -> bool {
        self.kind.is_member() && !self.is_static()
    }

    /// Check if the symbol is a compile-time constant usable in patterns.
    pub fn is_constant(&self) -> bool {
        self.kind == SymbolKind::EnumMember || self.has_modifier(Modifier::Const)
    }

    /// Check if the symbol is marked obsolete.
    pub fn is_obsolete(&self) -> bool {
        self.has_modifier(Modifier::Obsolete)
    }

    /// Check if the symbol is declared before a byte position.
    ///
    /// Symbols without a span (metadata, synthesized) count as declared.
    pub fn is_declared_before(&self, position: usize) -> bool {
        match self.decl_span {
            Some(span) => span.start < position,
            None => true,
        }
    }
}

/// A lexical scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeInfo {
    /// Unique identifier for this scope.
    pub scope_id: ScopeId,
    /// Kind of scope.
    pub kind: ScopeKind,
    /// Byte span of the scope.
    pub span: Span,
    /// Parent scope (None for the root namespace).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ScopeId>,
    /// Symbol that owns this scope (type, method, local function, namespace).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<SymbolId>,
    /// Scope belongs to metadata and contains no source positions.
    #[serde(default)]
    pub from_metadata: bool,
    /// Namespaces imported into this scope with `using N;`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<SymbolId>,
    /// `static` lambda or local function: no access to `this` or captures.
    #[serde(default)]
    pub is_static: bool,
}

impl ScopeInfo {
    /// Create a new source scope.
    pub fn new(scope_id: ScopeId, kind: ScopeKind, span: Span) -> Self {
        ScopeInfo {
            scope_id,
            kind,
            span,
            parent: None,
            owner: None,
            from_metadata: false,
            imports: Vec::new(),
            is_static: false,
        }
    }

    /// Create a metadata scope (hosts members of a metadata type or namespace).
    pub fn metadata(scope_id: ScopeId, kind: ScopeKind) -> Self {
        ScopeInfo {
            from_metadata: true,
            ..ScopeInfo::new(scope_id, kind, Span::new(0, 0))
        }
    }

    /// Set the parent scope.
    pub fn with_parent(mut self, parent: ScopeId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Set the owning symbol.
    pub fn with_owner(mut self, owner: SymbolId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Add a `using` namespace import.
    pub fn with_import(mut self, namespace: SymbolId) -> Self {
        self.imports.push(namespace);
        self
    }

    /// Mark the scope as a `static` function body.
    pub fn with_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Check if a byte position is within this scope.
    pub fn contains_position(&self, position: usize) -> bool {
        !self.from_metadata && self.span.contains(position)
    }
}

/// Type-lattice facts for a type symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDecl {
    /// The type symbol.
    pub symbol_id: SymbolId,
    /// Kind of type.
    pub kind: TypeKind,
    /// Base class (None for interfaces and for the root object type).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<TypeRef>,
    /// Directly implemented interfaces.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<TypeRef>,
    /// `ref struct` (pattern-based dispose applies).
    #[serde(default)]
    pub is_ref_like: bool,
}

impl TypeDecl {
    /// Create a new type declaration with no bases.
    pub fn new(symbol_id: SymbolId, kind: TypeKind) -> Self {
        TypeDecl {
            symbol_id,
            kind,
            base: None,
            interfaces: Vec::new(),
            is_ref_like: false,
        }
    }

    /// Set the base class.
    pub fn with_base(mut self, base: TypeRef) -> Self {
        self.base = Some(base);
        self
    }

    /// Add an implemented interface.
    pub fn with_interface(mut self, interface: TypeRef) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// Mark as a `ref struct`.
    pub fn with_ref_like(mut self) -> Self {
        self.is_ref_like = true;
        self
    }
}

/// Generic constraints of a type parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeParamInfo {
    /// The `TypeParameter` symbol.
    pub symbol_id: SymbolId,
    /// Generic type or method declaring the parameter.
    pub owner: SymbolId,
    /// Position in the owner's type parameter list.
    pub ordinal: u32,
    /// Type constraints (`where T : Base, IFace<T>`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<TypeRef>,
    /// `where T : class`
    #[serde(default)]
    pub reference_type: bool,
    /// `where T : struct`
    #[serde(default)]
    pub value_type: bool,
}

impl TypeParamInfo {
    /// Create an unconstrained type parameter.
    pub fn new(symbol_id: SymbolId, owner: SymbolId, ordinal: u32) -> Self {
        TypeParamInfo {
            symbol_id,
            owner,
            ordinal,
            constraints: Vec::new(),
            reference_type: false,
            value_type: false,
        }
    }

    /// Add a type constraint.
    pub fn with_constraint(mut self, constraint: TypeRef) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Require a reference type argument.
    pub fn with_reference_type(mut self) -> Self {
        self.reference_type = true;
        self
    }

    /// Require a non-nullable value type argument.
    pub fn with_value_type(mut self) -> Self {
        self.value_type = true;
        self
    }
}

/// A parameter in a method signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Declared type.
    pub type_ref: TypeRef,
    /// Kind of parameter.
    #[serde(default)]
    pub kind: ParamKind,
    /// Parameter has a default value.
    #[serde(default)]
    pub has_default: bool,
}

impl Parameter {
    /// Create a regular parameter.
    pub fn new(name: impl Into<String>, type_ref: TypeRef) -> Self {
        Parameter {
            name: name.into(),
            type_ref,
            kind: ParamKind::Regular,
            has_default: false,
        }
    }

    /// Set the parameter kind.
    pub fn with_kind(mut self, kind: ParamKind) -> Self {
        self.kind = kind;
        self
    }

    /// Mark the parameter as optional.
    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }
}

/// A method signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// The method or local function symbol.
    pub symbol_id: SymbolId,
    /// Parameters in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Parameter>,
    /// Return type (None for `void`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<TypeRef>,
}

impl Signature {
    /// Create an empty `void` signature.
    pub fn new(symbol_id: SymbolId) -> Self {
        Signature {
            symbol_id,
            params: Vec::new(),
            returns: None,
        }
    }

    /// Set the parameters.
    pub fn with_params(mut self, params: Vec<Parameter>) -> Self {
        self.params = params;
        self
    }

    /// Set the return type.
    pub fn with_returns(mut self, returns: TypeRef) -> Self {
        self.returns = Some(returns);
        self
    }

    /// Receiver parameter of an extension method.
    pub fn this_param(&self) -> Option<&Parameter> {
        self.params.first().filter(|p| p.kind == ParamKind::This)
    }

    /// Number of parameters excluding an extension receiver.
    pub fn arity_without_receiver(&self) -> usize {
        if self.this_param().is_some() {
            self.params.len() - 1
        } else {
            self.params.len()
        }
    }
}

/// An interceptor method bound to a call-site location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interception {
    /// The intercepting method.
    pub interceptor: SymbolId,
    /// Span of the intercepted call's member name.
    pub target: Span,
}

// ============================================================================
// FactsStore
// ============================================================================

/// In-memory store for the facts of one bound program snapshot.
///
/// Provides:
/// - O(log n) lookup by ID for all entity types
/// - Postings lists for scope → symbols, scope → children, owner → scope
/// - Deterministic iteration order (sorted by ID)
#[derive(Debug, Clone)]
pub struct FactsStore {
    /// Schema version for serialization compatibility checks.
    pub schema_version: u32,

    // Primary storage (BTreeMap for deterministic iteration)
    symbols: BTreeMap<SymbolId, Symbol>,
    scopes: BTreeMap<ScopeId, ScopeInfo>,
    type_decls: BTreeMap<SymbolId, TypeDecl>,
    type_params: BTreeMap<SymbolId, TypeParamInfo>,
    signatures: BTreeMap<SymbolId, Signature>,
    interceptions: Vec<Interception>,
    well_known: BTreeMap<WellKnownType, SymbolId>,

    // Secondary indexes
    /// scope_id → symbol_ids[] (symbols declared directly in scope).
    symbols_by_scope: HashMap<ScopeId, Vec<SymbolId>>,
    /// name → symbol_ids[] (multiple symbols can share a name).
    symbols_by_name: HashMap<String, Vec<SymbolId>>,
    /// scope_id → child scope_ids[].
    child_scopes: HashMap<ScopeId, Vec<ScopeId>>,
    /// owner symbol_id → scope it owns.
    scope_by_owner: HashMap<SymbolId, ScopeId>,
    /// owner symbol_id → type parameter symbol_ids[].
    type_params_by_owner: HashMap<SymbolId, Vec<SymbolId>>,

    // ID generators
    next_symbol_id: u32,
    next_scope_id: u32,
}

impl Default for FactsStore {
    fn default() -> Self {
        FactsStore {
            schema_version: FACTS_SCHEMA_VERSION,
            symbols: BTreeMap::new(),
            scopes: BTreeMap::new(),
            type_decls: BTreeMap::new(),
            type_params: BTreeMap::new(),
            signatures: BTreeMap::new(),
            interceptions: Vec::new(),
            well_known: BTreeMap::new(),
            symbols_by_scope: HashMap::new(),
            symbols_by_name: HashMap::new(),
            child_scopes: HashMap::new(),
            scope_by_owner: HashMap::new(),
            type_params_by_owner: HashMap::new(),
            next_symbol_id: 0,
            next_scope_id: 0,
        }
    }
}

impl FactsStore {
    /// Create a new empty FactsStore.
    pub fn new() -> Self {
        FactsStore::default()
    }

    // ========================================================================
    // ID Generation
    // ========================================================================

    /// Generate the next SymbolId.
    pub fn next_symbol_id(&mut self) -> SymbolId {
        let id = SymbolId::new(self.next_symbol_id);
        self.next_symbol_id += 1;
        id
    }

    /// Generate the next ScopeId.
    pub fn next_scope_id(&mut self) -> ScopeId {
        let id = ScopeId::new(self.next_scope_id);
        self.next_scope_id += 1;
        id
    }

    // ========================================================================
    // Insertion
    // ========================================================================

    /// Insert a symbol, replacing any symbol with the same ID.
    pub fn insert_symbol(&mut self, symbol: Symbol) {
        if let Some(old) = self.symbols.remove(&symbol.symbol_id) {
            if let Some(ids) = self.symbols_by_scope.get_mut(&old.scope_id) {
                ids.retain(|id| *id != old.symbol_id);
            }
            if let Some(ids) = self.symbols_by_name.get_mut(&old.name) {
                ids.retain(|id| *id != old.symbol_id);
            }
        }
        self.symbols_by_scope
            .entry(symbol.scope_id)
            .or_default()
            .push(symbol.symbol_id);
        self.symbols_by_name
            .entry(symbol.name.clone())
            .or_default()
            .push(symbol.symbol_id);
        self.next_symbol_id = self.next_symbol_id.max(symbol.symbol_id.0 + 1);
        self.symbols.insert(symbol.symbol_id, symbol);
    }

    /// Insert a scope, replacing any scope with the same ID.
    pub fn insert_scope(&mut self, scope: ScopeInfo) {
        if let Some(old) = self.scopes.remove(&scope.scope_id) {
            if let Some(children) = old.parent.and_then(|p| self.child_scopes.get_mut(&p)) {
                children.retain(|id| *id != old.scope_id);
            }
            if let Some(owner) = old.owner {
                if self.scope_by_owner.get(&owner) == Some(&old.scope_id) {
                    self.scope_by_owner.remove(&owner);
                }
            }
        }
        if let Some(parent) = scope.parent {
            self.child_scopes
                .entry(parent)
                .or_default()
                .push(scope.scope_id);
        }
        if let Some(owner) = scope.owner {
            self.scope_by_owner.insert(owner, scope.scope_id);
        }
        self.next_scope_id = self.next_scope_id.max(scope.scope_id.0 + 1);
        self.scopes.insert(scope.scope_id, scope);
    }

    /// Insert type-lattice facts for a type symbol.
    pub fn insert_type_decl(&mut self, decl: TypeDecl) {
        self.type_decls.insert(decl.symbol_id, decl);
    }

    /// Insert constraints for a type parameter.
    pub fn insert_type_param(&mut self, info: TypeParamInfo) {
        let ids = self.type_params_by_owner.entry(info.owner).or_default();
        if !ids.contains(&info.symbol_id) {
            ids.push(info.symbol_id);
        }
        self.type_params.insert(info.symbol_id, info);

        // Keep the owner's list in declaration order.
        let type_params = &self.type_params;
        ids.sort_by_key(|id| type_params.get(id).map(|p| p.ordinal).unwrap_or(u32::MAX));
    }

    /// Insert a method signature.
    pub fn insert_signature(&mut self, signature: Signature) {
        self.signatures.insert(signature.symbol_id, signature);
    }

    /// Insert an interceptor binding.
    pub fn insert_interception(&mut self, interception: Interception) {
        self.interceptions.push(interception);
    }

    /// Register the symbol of a well-known type.
    pub fn register_well_known(&mut self, kind: WellKnownType, symbol_id: SymbolId) {
        self.well_known.insert(kind, symbol_id);
    }

    // ========================================================================
    // Lookup by ID
    // ========================================================================

    /// Get a symbol by ID.
    pub fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(&id)
    }

    /// Get a scope by ID.
    pub fn scope(&self, id: ScopeId) -> Option<&ScopeInfo> {
        self.scopes.get(&id)
    }

    /// Get the type-lattice facts for a type symbol.
    pub fn type_decl(&self, id: SymbolId) -> Option<&TypeDecl> {
        self.type_decls.get(&id)
    }

    /// Get the constraints of a type parameter.
    pub fn type_param(&self, id: SymbolId) -> Option<&TypeParamInfo> {
        self.type_params.get(&id)
    }

    /// Get the signature of a method or local function.
    pub fn signature(&self, id: SymbolId) -> Option<&Signature> {
        self.signatures.get(&id)
    }

    /// Get the symbol registered for a well-known type.
    pub fn well_known(&self, kind: WellKnownType) -> Option<SymbolId> {
        self.well_known.get(&kind).copied()
    }

    /// Check if a symbol is the registered well-known type.
    pub fn is_well_known(&self, id: SymbolId, kind: WellKnownType) -> bool {
        self.well_known(kind) == Some(id)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Get symbols declared directly in a scope, ordered by SymbolId.
    ///
    /// The synthetic root scope declares nothing.
    pub fn symbols_in_scope(&self, scope_id: ScopeId) -> Vec<&Symbol> {
        let mut symbols: Vec<&Symbol> = self
            .symbols_by_scope
            .get(&scope_id)
            .map(|ids| ids.iter().filter_map(|id| self.symbols.get(id)).collect())
            .unwrap_or_default();
        symbols.sort_by_key(|s| s.symbol_id);
        symbols
    }

    /// Get all symbols with a given name, ordered by SymbolId.
    pub fn symbols_named(&self, name: &str) -> Vec<&Symbol> {
        let mut symbols: Vec<&Symbol> = self
            .symbols_by_name
            .get(name)
            .map(|ids| ids.iter().filter_map(|id| self.symbols.get(id)).collect())
            .unwrap_or_default();
        symbols.sort_by_key(|s| s.symbol_id);
        symbols
    }

    /// Get the direct child scopes of a scope, ordered by ScopeId.
    pub fn child_scopes(&self, scope_id: ScopeId) -> Vec<&ScopeInfo> {
        let mut scopes: Vec<&ScopeInfo> = self
            .child_scopes
            .get(&scope_id)
            .map(|ids| ids.iter().filter_map(|id| self.scopes.get(id)).collect())
            .unwrap_or_default();
        scopes.sort_by_key(|s| s.scope_id);
        scopes
    }

    /// Get the scope owned by a symbol (type body, method body, namespace body).
    pub fn scope_owned_by(&self, owner: SymbolId) -> Option<&ScopeInfo> {
        self.scope_by_owner
            .get(&owner)
            .and_then(|id| self.scopes.get(id))
    }

    /// Get the type parameters declared by a generic type or method, in order.
    pub fn type_params_of(&self, owner: SymbolId) -> &[SymbolId] {
        self.type_params_by_owner
            .get(&owner)
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
    }

    /// Get the members declared by a type (not including inherited members).
    pub fn members_of(&self, type_symbol: SymbolId) -> Vec<&Symbol> {
        match self.scope_owned_by(type_symbol) {
            Some(scope) => self
                .symbols_in_scope(scope.scope_id)
                .into_iter()
                .filter(|s| s.kind.is_member())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Find the innermost source scope containing a byte position.
    ///
    /// Among scopes with equal spans the deepest one wins, so a method scope
    /// and its body block sharing a span resolve to the block.
    pub fn innermost_scope_at(&self, position: usize) -> Option<&ScopeInfo> {
        self.scopes
            .values()
            .filter(|s| s.contains_position(position))
            .min_by_key(|s| (s.span.len(), std::cmp::Reverse(self.depth_of(s.scope_id))))
    }

    /// Get the chain of scopes from `scope_id` up to the root (inclusive).
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` if the chain references a missing scope or
    /// contains a cycle.
    pub fn ancestors(&self, scope_id: ScopeId) -> SemanticResult<Vec<ScopeId>> {
        if scope_id.is_synthetic_root() {
            return Ok(Vec::new());
        }

        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Some(scope_id);

        while let Some(id) = current {
            if !visited.insert(id) {
                return Err(SemanticError::invariant(format!(
                    "scope cycle detected at {}",
                    id
                )));
            }
            let scope = self.scopes.get(&id).ok_or_else(|| {
                SemanticError::invariant(format!("scope chain references missing {}", id))
            })?;
            chain.push(id);
            current = scope.parent;
        }

        Ok(chain)
    }

    /// Get all scopes nested anywhere inside `scope_id` (exclusive), in
    /// depth-first order.
    pub fn descendants(&self, scope_id: ScopeId) -> Vec<ScopeId> {
        let mut result = Vec::new();
        let mut visited = HashSet::new();
        let mut stack: Vec<ScopeId> = self
            .child_scopes(scope_id)
            .iter()
            .rev()
            .map(|s| s.scope_id)
            .collect();

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            result.push(id);
            for child in self.child_scopes(id).iter().rev() {
                stack.push(child.scope_id);
            }
        }

        result
    }

    /// Find the interceptor bound to a call site containing `position`.
    pub fn interceptor_at(&self, position: usize) -> Option<SymbolId> {
        self.interceptions
            .iter()
            .find(|i| i.target.contains(position))
            .map(|i| i.interceptor)
    }

    /// Depth of a scope in the tree (root = 0). Cycles stop the count.
    fn depth_of(&self, scope_id: ScopeId) -> usize {
        let mut depth = 0;
        let mut current = self.scopes.get(&scope_id).and_then(|s| s.parent);
        while let Some(id) = current {
            depth += 1;
            if depth > self.scopes.len() {
                break;
            }
            current = self.scopes.get(&id).and_then(|s| s.parent);
        }
        depth
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Check the structural invariants the binder host must uphold.
    ///
    /// - every symbol's declaring scope exists
    /// - every scope's parent exists and the scope tree is acyclic
    /// - a source scope's span is contained in its parent's span
    /// - type declarations and type parameters refer to existing symbols
    pub fn validate(&self) -> SemanticResult<()> {
        for symbol in self.symbols.values() {
            if !self.scopes.contains_key(&symbol.scope_id) {
                return Err(SemanticError::invariant(format!(
                    "symbol '{}' ({}) declared in missing {}",
                    symbol.name, symbol.symbol_id, symbol.scope_id
                )));
            }
        }

        for scope in self.scopes.values() {
            self.ancestors(scope.scope_id)?;
            if let Some(parent_id) = scope.parent {
                let parent = self.scopes.get(&parent_id).ok_or_else(|| {
                    SemanticError::invariant(format!(
                        "{} has missing parent {}",
                        scope.scope_id, parent_id
                    ))
                })?;
                if !scope.from_metadata
                    && !parent.from_metadata
                    && !parent.span.contains_span(&scope.span)
                {
                    return Err(SemanticError::invariant(format!(
                        "{} span {} escapes parent {} span {}",
                        scope.scope_id, scope.span, parent_id, parent.span
                    )));
                }
            }
        }

        for decl in self.type_decls.values() {
            match self.symbols.get(&decl.symbol_id) {
                Some(symbol) if symbol.kind == SymbolKind::Type => {}
                _ => {
                    return Err(SemanticError::invariant(format!(
                        "type declaration for {} has no type symbol",
                        decl.symbol_id
                    )))
                }
            }
        }

        for param in self.type_params.values() {
            if !self.symbols.contains_key(&param.owner) {
                return Err(SemanticError::invariant(format!(
                    "type parameter {} owned by missing {}",
                    param.symbol_id, param.owner
                )));
            }
        }

        Ok(())
    }

    // ========================================================================
    // Iteration
    // ========================================================================

    /// Iterate over all symbols in deterministic order.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }

    /// Iterate over all scopes in deterministic order.
    pub fn scopes(&self) -> impl Iterator<Item = &ScopeInfo> {
        self.scopes.values()
    }

    /// Iterate over all type declarations in deterministic order.
    pub fn type_decls(&self) -> impl Iterator<Item = &TypeDecl> {
        self.type_decls.values()
    }

    /// Iterate over all type parameter facts in deterministic order.
    pub fn type_param_infos(&self) -> impl Iterator<Item = &TypeParamInfo> {
        self.type_params.values()
    }

    /// Iterate over all signatures in deterministic order.
    pub fn signatures(&self) -> impl Iterator<Item = &Signature> {
        self.signatures.values()
    }

    /// Iterate over all interceptor bindings.
    pub fn interceptions(&self) -> impl Iterator<Item = &Interception> {
        self.interceptions.iter()
    }

    /// Iterate over registered well-known types.
    pub fn well_known_types(&self) -> impl Iterator<Item = (WellKnownType, SymbolId)> + '_ {
        self.well_known.iter().map(|(k, v)| (*k, *v))
    }

    // ========================================================================
    // Counts
    // ========================================================================

    /// Number of symbols.
    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    /// Number of scopes.
    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }
}

// ============================================================================
// Tests
// ============================================================================
