//! Snapshot builder for tests and hosts without a binder.
//!
//! [`SnapshotBuilder`] binds facts against a source text by locating
//! declaration headers in it, so tests read like the code they describe:
//!
//! ```
//! use symscope_core::facts::{TypeKind, TypeRef};
//! use symscope_csharp::test_helpers::SnapshotBuilder;
//!
//! let mut b = SnapshotBuilder::new("class C { void M() { int x = 0; $$ } }");
//! let global = b.global();
//! let c = b.type_decl(global, "class C", TypeKind::Class);
//! let m = b.method(&c, "void M");
//! b.local(m.scope, "int x", "x", TypeRef::Unresolved);
//! let cursor = b.cursor();
//! let snapshot = b.build();
//! assert_eq!(&snapshot.text()[cursor - 2..cursor], "; ");
//! ```
//!
//! The first `$$` in the input marks the cursor and is removed. Every lookup
//! of a header or needle searches inside the span of the scope it is declared
//! into, so the same text may appear in several types.
//!
//! # Panics
//!
//! Builder methods panic when a needle is missing. They are meant for
//! fixtures, where a typo should fail the test loudly.

use symscope_core::facts::{
    Accessibility, FactsStore, Modifier, ParamKind, Parameter, ScopeId, ScopeInfo, ScopeKind,
    Signature, Symbol, SymbolId, SymbolKind, TypeDecl, TypeKind, TypeParamInfo, TypeRef,
    WellKnownType,
};
use symscope_core::snapshot::Snapshot;
use symscope_core::text::Span;

/// Cursor marker stripped from builder input.
pub const CURSOR_MARKER: &str = "$$";

/// A declared type or namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decl {
    pub symbol: SymbolId,
    /// Body scope.
    pub scope: ScopeId,
    pub type_params: Vec<SymbolId>,
}

/// A declared method or local function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    pub symbol: SymbolId,
    /// Parameter list and body scope.
    pub scope: ScopeId,
    pub type_params: Vec<SymbolId>,
}

/// Builds a validated [`Snapshot`] from source text and declarations.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    text: String,
    cursor: Option<usize>,
    store: FactsStore,
    global: ScopeId,
    corlib: Option<Corlib>,
}

impl SnapshotBuilder {
    /// Start a snapshot over `marked`, which may contain one `$$` cursor.
    pub fn new(marked: &str) -> Self {
        let cursor = marked.find(CURSOR_MARKER);
        let text = marked.replacen(CURSOR_MARKER, "", 1);

        let mut store = FactsStore::new();
        let global = store.next_scope_id();
        store.insert_scope(ScopeInfo::new(
            global,
            ScopeKind::Namespace,
            Span::new(0, text.len() + 1),
        ));

        SnapshotBuilder {
            text,
            cursor,
            store,
            global,
            corlib: None,
        }
    }

    /// Cursor position.
    ///
    /// # Panics
    ///
    /// If the input had no `$$` marker.
    pub fn cursor(&self) -> usize {
        match self.cursor {
            Some(cursor) => cursor,
            None => panic!("snapshot text has no {} cursor marker", CURSOR_MARKER),
        }
    }

    /// The global namespace scope.
    pub fn global(&self) -> ScopeId {
        self.global
    }

    /// Source text with the marker removed.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Direct access to the facts being built.
    pub fn store_mut(&mut self) -> &mut FactsStore {
        &mut self.store
    }

    /// Byte offset of the first occurrence of `needle`.
    pub fn offset_of(&self, needle: &str) -> usize {
        match self.text.find(needle) {
            Some(offset) => offset,
            None => panic!("{:?} not found in snapshot text", needle),
        }
    }

    /// Validate and freeze the snapshot.
    pub fn build(self) -> Snapshot {
        match Snapshot::validated(self.store, self.text, 1) {
            Ok(snapshot) => snapshot,
            Err(e) => panic!("snapshot builder produced invalid facts: {}", e),
        }
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    /// Declare a type whose header (`public sealed class Name<T>`) appears
    /// in `parent`. The body scope spans the braces after the header.
    ///
    /// Types nested in another type default to private, others to internal.
    /// A `ref` word in the header marks a ref struct.
    pub fn type_decl(&mut self, parent: ScopeId, header: &str, kind: TypeKind) -> Decl {
        let start = self.find_in(parent, header);
        let parsed = Header::parse(header);
        let container = self.owning_type(parent);
        let default_access = if container.is_some() {
            Accessibility::Private
        } else {
            Accessibility::Internal
        };

        let symbol_id = self.store.next_symbol_id();
        let mut symbol = Symbol::new(symbol_id, SymbolKind::Type, &parsed.name, parent)
            .with_span(parsed.name_span(start))
            .with_accessibility(parsed.accessibility.unwrap_or(default_access))
            .with_modifiers(&parsed.modifiers)
            .with_arity(parsed.type_params.len() as u32);
        if let Some(container) = container {
            symbol = symbol.with_container(container);
        }
        self.store.insert_symbol(symbol);

        let mut decl = TypeDecl::new(symbol_id, kind);
        if parsed.ref_like {
            decl = decl.with_ref_like();
        }
        self.store.insert_type_decl(decl);

        let scope = self.store.next_scope_id();
        let span = self.body_span(start + header.len());
        self.store.insert_scope(
            ScopeInfo::new(scope, ScopeKind::Type, span)
                .with_parent(parent)
                .with_owner(symbol_id),
        );
        let type_params = self.declare_type_params(symbol_id, scope, &parsed.type_params);

        Decl {
            symbol: symbol_id,
            scope,
            type_params,
        }
    }

    /// Declare an enum with public constant members.
    pub fn enum_decl(&mut self, parent: ScopeId, header: &str, members: &[&str]) -> Decl {
        let decl = self.type_decl(parent, header, TypeKind::Enum);
        for name in members {
            let offset = self.find_word_in(decl.scope, name);
            let id = self.store.next_symbol_id();
            self.store.insert_symbol(
                Symbol::new(id, SymbolKind::EnumMember, *name, decl.scope)
                    .with_span(Span::new(offset, offset + name.len()))
                    .with_container(decl.symbol)
                    .with_type(TypeRef::named(decl.symbol)),
            );
        }
        decl
    }

    /// Declare a namespace whose header (`namespace Name`) appears in
    /// `parent`.
    pub fn namespace(&mut self, parent: ScopeId, header: &str) -> Decl {
        let start = self.find_in(parent, header);
        let parsed = Header::parse(header);
        let symbol_id = self.store.next_symbol_id();
        self.store.insert_symbol(
            Symbol::new(symbol_id, SymbolKind::Namespace, &parsed.name, parent)
                .with_span(parsed.name_span(start)),
        );
        let scope = self.store.next_scope_id();
        let span = self.body_span(start + header.len());
        self.store.insert_scope(
            ScopeInfo::new(scope, ScopeKind::Namespace, span)
                .with_parent(parent)
                .with_owner(symbol_id),
        );
        Decl {
            symbol: symbol_id,
            scope,
            type_params: Vec::new(),
        }
    }

    /// Set a type's base class.
    pub fn set_base(&mut self, decl: &Decl, base: TypeRef) {
        if let Some(existing) = self.store.type_decl(decl.symbol).cloned() {
            self.store.insert_type_decl(existing.with_base(base));
        }
    }

    /// Add an implemented interface to a type.
    pub fn add_interface(&mut self, decl: &Decl, interface: TypeRef) {
        if let Some(existing) = self.store.type_decl(decl.symbol).cloned() {
            self.store.insert_type_decl(existing.with_interface(interface));
        }
    }

    /// Add a constraint to a type parameter.
    pub fn constrain(&mut self, type_param: SymbolId, constraint: TypeRef) {
        if let Some(info) = self.store.type_param(type_param).cloned() {
            self.store.insert_type_param(info.with_constraint(constraint));
        }
    }

    /// Declare a method whose header (`public static void Name<T>`) appears
    /// in the type's body. The method scope runs from `(` to the end of the
    /// body (or the `;` of a bodiless declaration).
    ///
    /// Methods default to private, interface members to public.
    pub fn method(&mut self, decl: &Decl, header: &str) -> MethodDecl {
        let in_interface = self
            .store
            .type_decl(decl.symbol)
            .is_some_and(|d| d.kind == TypeKind::Interface);
        let default_access = if in_interface {
            Accessibility::Public
        } else {
            Accessibility::Private
        };
        self.function(
            decl.scope,
            header,
            SymbolKind::Method,
            ScopeKind::Method,
            Some((decl.symbol, default_access)),
        )
    }

    /// Declare a local function in `parent`.
    pub fn local_function(&mut self, parent: ScopeId, header: &str) -> MethodDecl {
        self.function(
            parent,
            header,
            SymbolKind::LocalFunction,
            ScopeKind::LocalFunction,
            None,
        )
    }

    fn function(
        &mut self,
        parent: ScopeId,
        header: &str,
        kind: SymbolKind,
        scope_kind: ScopeKind,
        member_of: Option<(SymbolId, Accessibility)>,
    ) -> MethodDecl {
        let start = self.find_in(parent, header);
        let parsed = Header::parse(header);

        let symbol_id = self.store.next_symbol_id();
        let mut symbol = Symbol::new(symbol_id, kind, &parsed.name, parent)
            .with_span(parsed.name_span(start))
            .with_modifiers(&parsed.modifiers)
            .with_arity(parsed.type_params.len() as u32);
        if let Some((container, default_access)) = member_of {
            symbol = symbol
                .with_container(container)
                .with_accessibility(parsed.accessibility.unwrap_or(default_access));
        }
        self.store.insert_symbol(symbol);
        self.store.insert_signature(Signature::new(symbol_id));

        let name_end = parsed.name_span(start).end;
        let open = match self.text[name_end..].find('(') {
            Some(i) => name_end + i,
            None => panic!("no parameter list after {:?}", header),
        };
        let end = self.function_end(open);
        let scope = self.store.next_scope_id();
        let mut info = ScopeInfo::new(scope, scope_kind, Span::new(open, end))
            .with_parent(parent)
            .with_owner(symbol_id);
        if parsed.modifiers.contains(&Modifier::Static) {
            info = info.with_static();
        }
        self.store.insert_scope(info);
        let type_params = self.declare_type_params(symbol_id, scope, &parsed.type_params);

        MethodDecl {
            symbol: symbol_id,
            scope,
            type_params,
        }
    }

    /// Add a parameter to a method's signature and scope.
    pub fn parameter(&mut self, method: &MethodDecl, name: &str, ty: TypeRef) -> SymbolId {
        self.add_parameter(method, Parameter::new(name, ty))
    }

    /// Add an extension `this` parameter; marks the method as an extension.
    pub fn this_parameter(&mut self, method: &MethodDecl, name: &str, ty: TypeRef) -> SymbolId {
        let id = self.add_parameter(method, Parameter::new(name, ty).with_kind(ParamKind::This));
        self.add_modifier(method.symbol, Modifier::Extension);
        id
    }

    fn add_parameter(&mut self, method: &MethodDecl, parameter: Parameter) -> SymbolId {
        let offset = self.find_word_in(method.scope, &parameter.name);
        let id = self.store.next_symbol_id();
        self.store.insert_symbol(
            Symbol::new(id, SymbolKind::Parameter, &parameter.name, method.scope)
                .with_span(Span::new(offset, offset + parameter.name.len()))
                .with_type(parameter.type_ref.clone()),
        );

        let mut signature = self
            .store
            .signature(method.symbol)
            .cloned()
            .unwrap_or_else(|| Signature::new(method.symbol));
        signature.params.push(parameter);
        self.store.insert_signature(signature);
        id
    }

    /// Set a method's return type.
    pub fn returns(&mut self, method: &MethodDecl, ty: TypeRef) {
        if let Some(signature) = self.store.signature(method.symbol).cloned() {
            self.store.insert_signature(signature.with_returns(ty.clone()));
        }
        if let Some(symbol) = self.store.symbol(method.symbol).cloned() {
            self.store.insert_symbol(symbol.with_type(ty));
        }
    }

    /// Declare a local whose declaration `needle` (`int x = 1`) appears in
    /// `scope`; `name` is located inside the needle.
    pub fn local(&mut self, scope: ScopeId, needle: &str, name: &str, ty: TypeRef) -> SymbolId {
        let start = self.find_in(scope, needle);
        let offset = start + word_offset(needle, name);
        let id = self.store.next_symbol_id();
        let mut symbol = Symbol::new(id, SymbolKind::Local, name, scope)
            .with_span(Span::new(offset, offset + name.len()))
            .with_type(ty);
        if needle.split_whitespace().any(|w| w == "const") {
            symbol = symbol.with_modifier(Modifier::Const);
        }
        self.store.insert_symbol(symbol);
        id
    }

    /// Declare a field of a type.
    pub fn field(&mut self, decl: &Decl, needle: &str, name: &str, ty: TypeRef) -> SymbolId {
        self.member(decl, needle, name, ty, SymbolKind::Field)
    }

    /// Declare a property of a type.
    pub fn property(&mut self, decl: &Decl, needle: &str, name: &str, ty: TypeRef) -> SymbolId {
        self.member(decl, needle, name, ty, SymbolKind::Property)
    }

    fn member(
        &mut self,
        decl: &Decl,
        needle: &str,
        name: &str,
        ty: TypeRef,
        kind: SymbolKind,
    ) -> SymbolId {
        let start = self.find_in(decl.scope, needle);
        let name_at = word_offset(needle, name);
        let words = Header::parse(&format!("{} {}", &needle[..name_at], name));
        let id = self.store.next_symbol_id();
        self.store.insert_symbol(
            Symbol::new(id, kind, name, decl.scope)
                .with_span(Span::new(start + name_at, start + name_at + name.len()))
                .with_container(decl.symbol)
                .with_accessibility(words.accessibility.unwrap_or(Accessibility::Private))
                .with_modifiers(&words.modifiers)
                .with_type(ty),
        );
        id
    }

    /// Declare a label (`done:`) in `scope`.
    pub fn label(&mut self, scope: ScopeId, needle: &str, name: &str) -> SymbolId {
        let start = self.find_in(scope, needle);
        let offset = start + word_offset(needle, name);
        let id = self.store.next_symbol_id();
        self.store.insert_symbol(
            Symbol::new(id, SymbolKind::Label, name, scope)
                .with_span(Span::new(offset, offset + name.len())),
        );
        id
    }

    /// Declare `using name = target;` in `scope`.
    pub fn alias(&mut self, scope: ScopeId, name: &str, target: TypeRef) -> SymbolId {
        let id = self.store.next_symbol_id();
        self.store
            .insert_symbol(Symbol::new(id, SymbolKind::Alias, name, scope).with_type(target));
        id
    }

    /// Add `using namespace;` to `scope`.
    pub fn import(&mut self, scope: ScopeId, namespace: SymbolId) {
        if let Some(info) = self.store.scope(scope).cloned() {
            self.store.insert_scope(info.with_import(namespace));
        }
    }

    /// Add a modifier to a symbol.
    pub fn add_modifier(&mut self, symbol: SymbolId, modifier: Modifier) {
        if let Some(existing) = self.store.symbol(symbol).cloned() {
            if !existing.has_modifier(modifier) {
                self.store.insert_symbol(existing.with_modifier(modifier));
            }
        }
    }

    /// A lambda scope spanning exactly `needle`.
    pub fn lambda(&mut self, parent: ScopeId, needle: &str, is_static: bool) -> ScopeId {
        let start = self.find_in(parent, needle);
        let scope = self.store.next_scope_id();
        let mut info = ScopeInfo::new(
            scope,
            ScopeKind::Lambda,
            Span::new(start, start + needle.len()),
        )
        .with_parent(parent);
        if is_static {
            info = info.with_static();
        }
        self.store.insert_scope(info);
        scope
    }

    /// A scope of `kind` spanning exactly `needle`.
    pub fn scope(&mut self, parent: ScopeId, kind: ScopeKind, needle: &str) -> ScopeId {
        let start = self.find_in(parent, needle);
        let scope = self.store.next_scope_id();
        self.store.insert_scope(
            ScopeInfo::new(scope, kind, Span::new(start, start + needle.len())).with_parent(parent),
        );
        scope
    }

    /// A block scope over the braces starting at `needle`.
    pub fn block(&mut self, parent: ScopeId, needle: &str) -> ScopeId {
        let start = self.find_in(parent, needle);
        let scope = self.store.next_scope_id();
        let span = self.body_span(start);
        self.store
            .insert_scope(ScopeInfo::new(scope, ScopeKind::Block, span).with_parent(parent));
        scope
    }

    /// The implicit top-level statement scope with its `args` parameter.
    ///
    /// It starts at the first statement after the leading `using`
    /// directives. Without any such statement there is no top-level scope
    /// and `None` is returned.
    pub fn top_level(&mut self, args_type: TypeRef) -> Option<(ScopeId, SymbolId)> {
        let start = first_statement(&self.text)?;
        let scope = self.store.next_scope_id();
        self.store.insert_scope(
            ScopeInfo::new(
                scope,
                ScopeKind::TopLevel,
                Span::new(start, self.text.len() + 1),
            )
            .with_parent(self.global),
        );
        let args = self.store.next_symbol_id();
        self.store.insert_symbol(
            Symbol::new(args, SymbolKind::Parameter, "args", scope).with_type(args_type),
        );
        Some((scope, args))
    }

    // ========================================================================
    // Text Helpers
    // ========================================================================

    fn scope_range(&self, scope: ScopeId) -> (usize, usize) {
        match self.store.scope(scope) {
            Some(info) if !info.from_metadata => (
                info.span.start.min(self.text.len()),
                info.span.end.min(self.text.len()),
            ),
            _ => (0, self.text.len()),
        }
    }

    /// First occurrence of `needle` in `scope` that does not start or end
    /// inside a longer identifier.
    fn find_in(&self, scope: ScopeId, needle: &str) -> usize {
        let (start, end) = self.scope_range(scope);
        let haystack = &self.text[start..end];
        let is_ident = |c: char| c == '_' || c.is_alphanumeric();
        let checks_start = needle.chars().next().is_some_and(is_ident);
        let checks_end = needle.chars().next_back().is_some_and(is_ident);
        for (offset, _) in haystack.match_indices(needle) {
            let before = haystack[..offset].chars().next_back();
            let after = haystack[offset + needle.len()..].chars().next();
            if (checks_start && before.is_some_and(is_ident))
                || (checks_end && after.is_some_and(is_ident))
            {
                continue;
            }
            return start + offset;
        }
        panic!("{:?} not found in {}", needle, scope)
    }

    fn find_word_in(&self, scope: ScopeId, word: &str) -> usize {
        let (start, end) = self.scope_range(scope);
        start + word_offset(&self.text[start..end], word)
    }

    /// Span from the first `{` at or after `from` to its matching `}`.
    /// Unclosed bodies run to the end of the text.
    fn body_span(&self, from: usize) -> Span {
        let Some(open) = self.text[from..].find('{').map(|i| from + i) else {
            return Span::new(from, self.text.len() + 1);
        };
        match matching_brace(&self.text, open) {
            Some(close) => Span::new(open, close + 1),
            None => Span::new(open, self.text.len() + 1),
        }
    }

    /// End of a function whose parameter list opens at `open`.
    fn function_end(&self, open: usize) -> usize {
        let unclosed = self.text.len() + 1;
        let bytes = self.text.as_bytes();
        let mut depth = 0usize;
        let mut close = None;
        for (i, b) in bytes.iter().enumerate().skip(open) {
            match b {
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(i);
                        break;
                    }
                }
                _ => {}
            }
        }
        let Some(close) = close else {
            return unclosed;
        };
        for (i, b) in bytes.iter().enumerate().skip(close) {
            match b {
                b';' => return i + 1,
                b'{' => return matching_brace(&self.text, i).map_or(unclosed, |c| c + 1),
                _ => {}
            }
        }
        unclosed
    }

    fn owning_type(&self, scope: ScopeId) -> Option<SymbolId> {
        let info = self.store.scope(scope)?;
        if info.kind == ScopeKind::Type {
            info.owner
        } else {
            None
        }
    }

    fn declare_type_params(
        &mut self,
        owner: SymbolId,
        scope: ScopeId,
        names: &[String],
    ) -> Vec<SymbolId> {
        let mut ids = Vec::with_capacity(names.len());
        for (ordinal, name) in names.iter().enumerate() {
            let id = self.store.next_symbol_id();
            self.store
                .insert_symbol(Symbol::new(id, SymbolKind::TypeParameter, name, scope));
            self.store
                .insert_type_param(TypeParamInfo::new(id, owner, ordinal as u32));
            ids.push(id);
        }
        ids
    }

    // ========================================================================
    // Corlib
    // ========================================================================

    /// Declare a small `System` metadata namespace and import it into the
    /// global namespace. Repeated calls return the same fixture.
    pub fn corlib(&mut self) -> Corlib {
        if let Some(corlib) = self.corlib {
            return corlib;
        }
        let corlib = Corlib::declare(&mut self.store, self.global);
        self.import(self.global, corlib.system);
        self.corlib = Some(corlib);
        corlib
    }
}

/// Symbols of the `System` fixture namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Corlib {
    pub system: SymbolId,
    pub object: SymbolId,
    pub value_type: SymbolId,
    pub enum_type: SymbolId,
    pub nullable: SymbolId,
    pub nullable_t: SymbolId,
    pub boolean: SymbolId,
    pub int32: SymbolId,
    pub string: SymbolId,
    pub idisposable: SymbolId,
    pub iasync_disposable: SymbolId,
    pub task: SymbolId,
    pub value_task: SymbolId,
    pub console: SymbolId,
    pub list: SymbolId,
    pub list_t: SymbolId,
    pub hash_set: SymbolId,
    pub hash_set_t: SymbolId,

    pub object_to_string: SymbolId,
    pub object_equals: SymbolId,
    pub object_get_hash_code: SymbolId,
    pub object_reference_equals: SymbolId,
    pub nullable_value: SymbolId,
    pub nullable_has_value: SymbolId,
    pub nullable_get_value_or_default: SymbolId,
    pub int32_compare_to: SymbolId,
    pub int32_max_value: SymbolId,
    pub string_length: SymbolId,
    pub idisposable_dispose: SymbolId,
    pub iasync_disposable_dispose_async: SymbolId,
    pub console_write_line: SymbolId,
    pub list_add: SymbolId,
    pub list_count: SymbolId,
    pub hash_set_add: SymbolId,
}

/// Writes metadata declarations into a store.
struct Metadata<'a> {
    store: &'a mut FactsStore,
}

impl Metadata<'_> {
    fn namespace(&mut self, parent: ScopeId, name: &str) -> (SymbolId, ScopeId) {
        let id = self.store.next_symbol_id();
        self.store.insert_symbol(
            Symbol::new(id, SymbolKind::Namespace, name, parent).with_from_metadata(),
        );
        let scope = self.store.next_scope_id();
        self.store.insert_scope(
            ScopeInfo::metadata(scope, ScopeKind::Namespace)
                .with_parent(parent)
                .with_owner(id),
        );
        (id, scope)
    }

    fn type_decl(
        &mut self,
        ns: ScopeId,
        name: &str,
        kind: TypeKind,
        modifiers: &[Modifier],
        type_params: &[&str],
    ) -> (SymbolId, ScopeId, Vec<SymbolId>) {
        let id = self.store.next_symbol_id();
        self.store.insert_symbol(
            Symbol::new(id, SymbolKind::Type, name, ns)
                .with_modifiers(modifiers)
                .with_arity(type_params.len() as u32)
                .with_from_metadata(),
        );
        self.store.insert_type_decl(TypeDecl::new(id, kind));
        let scope = self.store.next_scope_id();
        self.store.insert_scope(
            ScopeInfo::metadata(scope, ScopeKind::Type)
                .with_parent(ns)
                .with_owner(id),
        );
        let mut params = Vec::new();
        for (ordinal, param) in type_params.iter().enumerate() {
            let tp = self.store.next_symbol_id();
            self.store.insert_symbol(
                Symbol::new(tp, SymbolKind::TypeParameter, *param, scope).with_from_metadata(),
            );
            self.store
                .insert_type_param(TypeParamInfo::new(tp, id, ordinal as u32));
            params.push(tp);
        }
        (id, scope, params)
    }

    fn member(
        &mut self,
        owner: (SymbolId, ScopeId),
        kind: SymbolKind,
        name: &str,
        ty: TypeRef,
        modifiers: &[Modifier],
    ) -> SymbolId {
        let id = self.store.next_symbol_id();
        self.store.insert_symbol(
            Symbol::new(id, kind, name, owner.1)
                .with_container(owner.0)
                .with_modifiers(modifiers)
                .with_type(ty)
                .with_from_metadata(),
        );
        id
    }

    fn method(
        &mut self,
        owner: (SymbolId, ScopeId),
        name: &str,
        params: Vec<Parameter>,
        returns: Option<TypeRef>,
        modifiers: &[Modifier],
    ) -> SymbolId {
        let id = self.store.next_symbol_id();
        let mut symbol = Symbol::new(id, SymbolKind::Method, name, owner.1)
            .with_container(owner.0)
            .with_modifiers(modifiers)
            .with_from_metadata();
        let mut signature = Signature::new(id).with_params(params);
        if let Some(returns) = returns {
            symbol = symbol.with_type(returns.clone());
            signature = signature.with_returns(returns);
        }
        self.store.insert_symbol(symbol);
        self.store.insert_signature(signature);
        id
    }

    fn set_base(&mut self, ty: SymbolId, base: SymbolId) {
        if let Some(decl) = self.store.type_decl(ty).cloned() {
            self.store.insert_type_decl(decl.with_base(TypeRef::named(base)));
        }
    }
}

impl Corlib {
    fn declare(store: &mut FactsStore, global: ScopeId) -> Corlib {
        use Modifier::{Abstract, Const, Sealed, Static, Virtual};

        let mut md = Metadata { store };
        let (system, ns) = md.namespace(global, "System");

        let (object, object_scope, _) = md.type_decl(ns, "Object", TypeKind::Class, &[], &[]);
        let (value_type, _, _) =
            md.type_decl(ns, "ValueType", TypeKind::Class, &[Abstract], &[]);
        let (enum_type, _, _) = md.type_decl(ns, "Enum", TypeKind::Class, &[Abstract], &[]);
        md.set_base(enum_type, value_type);
        let (boolean, _, _) = md.type_decl(ns, "Boolean", TypeKind::Struct, &[], &[]);
        let (int32, int32_scope, _) = md.type_decl(ns, "Int32", TypeKind::Struct, &[], &[]);
        let (string, string_scope, _) =
            md.type_decl(ns, "String", TypeKind::Class, &[Sealed], &[]);
        let (nullable, nullable_scope, nullable_params) =
            md.type_decl(ns, "Nullable", TypeKind::Struct, &[], &["T"]);
        let nullable_t = nullable_params[0];
        if let Some(info) = md.store.type_param(nullable_t).cloned() {
            md.store.insert_type_param(info.with_value_type());
        }
        let (task, _, _) = md.type_decl(ns, "Task", TypeKind::Class, &[], &[]);
        let (value_task, _, _) = md.type_decl(ns, "ValueTask", TypeKind::Struct, &[], &[]);
        let (idisposable, idisposable_scope, _) =
            md.type_decl(ns, "IDisposable", TypeKind::Interface, &[], &[]);
        let (iasync_disposable, iasync_scope, _) =
            md.type_decl(ns, "IAsyncDisposable", TypeKind::Interface, &[], &[]);
        let (console, console_scope, _) =
            md.type_decl(ns, "Console", TypeKind::Class, &[Static], &[]);
        let (list, list_scope, list_params) =
            md.type_decl(ns, "List", TypeKind::Class, &[], &["T"]);
        let list_t = list_params[0];
        let (hash_set, hash_set_scope, hash_set_params) =
            md.type_decl(ns, "HashSet", TypeKind::Class, &[], &["T"]);
        let hash_set_t = hash_set_params[0];

        let bool_ref = TypeRef::named(boolean);
        let int_ref = TypeRef::named(int32);
        let object_ref = TypeRef::named(object);

        let object_owner = (object, object_scope);
        let object_to_string = md.method(
            object_owner,
            "ToString",
            Vec::new(),
            Some(TypeRef::named(string)),
            &[Virtual],
        );
        let object_equals = md.method(
            object_owner,
            "Equals",
            vec![Parameter::new("obj", object_ref.clone())],
            Some(bool_ref.clone()),
            &[Virtual],
        );
        let object_get_hash_code = md.method(
            object_owner,
            "GetHashCode",
            Vec::new(),
            Some(int_ref.clone()),
            &[Virtual],
        );
        let object_reference_equals = md.method(
            object_owner,
            "ReferenceEquals",
            vec![
                Parameter::new("objA", object_ref.clone()),
                Parameter::new("objB", object_ref),
            ],
            Some(bool_ref.clone()),
            &[Static],
        );

        let nullable_owner = (nullable, nullable_scope);
        let nullable_value = md.member(
            nullable_owner,
            SymbolKind::Property,
            "Value",
            TypeRef::param(nullable_t),
            &[],
        );
        let nullable_has_value = md.member(
            nullable_owner,
            SymbolKind::Property,
            "HasValue",
            bool_ref.clone(),
            &[],
        );
        let nullable_get_value_or_default = md.method(
            nullable_owner,
            "GetValueOrDefault",
            Vec::new(),
            Some(TypeRef::param(nullable_t)),
            &[],
        );

        let int32_compare_to = md.method(
            (int32, int32_scope),
            "CompareTo",
            vec![Parameter::new("value", int_ref.clone())],
            Some(int_ref.clone()),
            &[],
        );
        let int32_max_value = md.member(
            (int32, int32_scope),
            SymbolKind::Field,
            "MaxValue",
            int_ref.clone(),
            &[Const],
        );
        let string_length = md.member(
            (string, string_scope),
            SymbolKind::Property,
            "Length",
            int_ref.clone(),
            &[],
        );
        let idisposable_dispose = md.method(
            (idisposable, idisposable_scope),
            "Dispose",
            Vec::new(),
            None,
            &[Abstract],
        );
        let iasync_disposable_dispose_async = md.method(
            (iasync_disposable, iasync_scope),
            "DisposeAsync",
            Vec::new(),
            Some(TypeRef::named(value_task)),
            &[Abstract],
        );
        let console_write_line = md.method(
            (console, console_scope),
            "WriteLine",
            vec![Parameter::new("value", TypeRef::named(string))],
            None,
            &[Static],
        );
        let list_add = md.method(
            (list, list_scope),
            "Add",
            vec![Parameter::new("item", TypeRef::param(list_t))],
            None,
            &[],
        );
        let list_count = md.member(
            (list, list_scope),
            SymbolKind::Property,
            "Count",
            int_ref,
            &[],
        );
        let hash_set_add = md.method(
            (hash_set, hash_set_scope),
            "Add",
            vec![Parameter::new("item", TypeRef::param(hash_set_t))],
            Some(bool_ref),
            &[],
        );

        for (kind, id) in [
            (WellKnownType::Object, object),
            (WellKnownType::ValueType, value_type),
            (WellKnownType::Enum, enum_type),
            (WellKnownType::Nullable, nullable),
            (WellKnownType::Disposable, idisposable),
            (WellKnownType::AsyncDisposable, iasync_disposable),
            (WellKnownType::Task, task),
            (WellKnownType::ValueTask, value_task),
        ] {
            md.store.register_well_known(kind, id);
        }

        Corlib {
            system,
            object,
            value_type,
            enum_type,
            nullable,
            nullable_t,
            boolean,
            int32,
            string,
            idisposable,
            iasync_disposable,
            task,
            value_task,
            console,
            list,
            list_t,
            hash_set,
            hash_set_t,
            object_to_string,
            object_equals,
            object_get_hash_code,
            object_reference_equals,
            nullable_value,
            nullable_has_value,
            nullable_get_value_or_default,
            int32_compare_to,
            int32_max_value,
            string_length,
            idisposable_dispose,
            iasync_disposable_dispose_async,
            console_write_line,
            list_add,
            list_count,
            hash_set_add,
        }
    }
}

// ============================================================================
// Header Parsing
// ============================================================================

/// Words of a declaration header.
#[derive(Debug, Default)]
struct Header {
    name: String,
    /// Byte offset of the name within the header.
    name_offset: usize,
    accessibility: Option<Accessibility>,
    modifiers: Vec<Modifier>,
    type_params: Vec<String>,
    ref_like: bool,
}

impl Header {
    fn parse(header: &str) -> Header {
        let head = header.split('(').next().unwrap_or(header).trim_end();
        let generic = head
            .strip_suffix('>')
            .and_then(|h| h.rfind('<').map(|lt| (h, lt)));
        let (base, type_params) = match generic {
            Some((h, lt)) => (
                &head[..lt],
                h[lt + 1..]
                    .split(',')
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .collect(),
            ),
            None => (head, Vec::new()),
        };
        let name = base.split_whitespace().last().unwrap_or_default();
        let name_offset = base.len() - name.len();

        let mut parsed = Header {
            name: name.to_string(),
            name_offset,
            type_params,
            ..Header::default()
        };
        let words: Vec<&str> = base[..name_offset].split_whitespace().collect();
        for (i, word) in words.iter().enumerate() {
            let next = words.get(i + 1).copied();
            // The first accessibility word wins; compound forms are decided
            // at their first word.
            let accessibility = match (*word, next) {
                ("public", _) => Some(Accessibility::Public),
                ("private", Some("protected")) => Some(Accessibility::PrivateProtected),
                ("private", _) => Some(Accessibility::Private),
                ("protected", Some("internal")) => Some(Accessibility::ProtectedInternal),
                ("protected", _) => Some(Accessibility::Protected),
                ("internal", _) => Some(Accessibility::Internal),
                _ => None,
            };
            if let Some(accessibility) = accessibility {
                parsed.accessibility.get_or_insert(accessibility);
                continue;
            }
            match *word {
                "ref" => parsed.ref_like = true,
                other => {
                    if let Some(modifier) = modifier_word(other) {
                        parsed.modifiers.push(modifier);
                    }
                }
            }
        }
        parsed
    }

    fn name_span(&self, header_start: usize) -> Span {
        let start = header_start + self.name_offset;
        Span::new(start, start + self.name.len())
    }
}

fn modifier_word(word: &str) -> Option<Modifier> {
    Some(match word {
        "static" => Modifier::Static,
        "sealed" => Modifier::Sealed,
        "abstract" => Modifier::Abstract,
        "virtual" => Modifier::Virtual,
        "override" => Modifier::Override,
        "const" => Modifier::Const,
        "readonly" => Modifier::Readonly,
        "extern" => Modifier::Extern,
        "async" => Modifier::Async,
        "partial" => Modifier::Partial,
        "[Obsolete]" => Modifier::Obsolete,
        _ => return None,
    })
}

/// Offset of `word` in `haystack` as a whole identifier.
fn word_offset(haystack: &str, word: &str) -> usize {
    let is_ident = |c: char| c == '_' || c.is_alphanumeric();
    for (offset, _) in haystack.match_indices(word) {
        let before = haystack[..offset].chars().next_back();
        let after = haystack[offset + word.len()..].chars().next();
        if !before.is_some_and(is_ident) && !after.is_some_and(is_ident) {
            return offset;
        }
    }
    panic!("word {:?} not found in {:?}", word, haystack)
}

fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in text.as_bytes().iter().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Offset of the first top-level statement after `using` directives.
fn first_statement(text: &str) -> Option<usize> {
    let mut offset = 0;
    loop {
        let rest = &text[offset..];
        let trimmed = rest.trim_start();
        offset += rest.len() - trimmed.len();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed.starts_with("using ") {
            offset += trimmed.find(';').map_or(trimmed.len(), |i| i + 1);
            continue;
        }
        return Some(offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_parsing() {
        let header = Header::parse("protected internal static void Shrink<T, U>");
        assert_eq!(header.name, "Shrink");
        assert_eq!(header.accessibility, Some(Accessibility::ProtectedInternal));
        assert_eq!(header.modifiers, vec![Modifier::Static]);
        assert_eq!(header.type_params, vec!["T", "U"]);

        let header = Header::parse("void M(int a)");
        assert_eq!(header.name, "M");
        assert_eq!(header.name_offset, 5);

        let header = Header::parse("ref struct Span");
        assert!(header.ref_like);
    }

    #[test]
    fn test_needles_search_inside_parent_scope() {
        let mut b = SnapshotBuilder::new("class A { int v; } class B { int v; }");
        let global = b.global();
        let a = b.type_decl(global, "class A", TypeKind::Class);
        let bb = b.type_decl(global, "class B", TypeKind::Class);
        let va = b.field(&a, "int v", "v", TypeRef::Unresolved);
        let vb = b.field(&bb, "int v", "v", TypeRef::Unresolved);
        let snapshot = b.build();
        let store = snapshot.store();

        let a_span = store.symbol(va).unwrap().decl_span.unwrap();
        let b_span = store.symbol(vb).unwrap().decl_span.unwrap();
        assert!(a_span.start < b_span.start);
    }

    #[test]
    fn test_top_level_requires_a_statement() {
        let mut b = SnapshotBuilder::new("using System;\n$$");
        assert_eq!(b.top_level(TypeRef::Unresolved), None);

        let mut b = SnapshotBuilder::new("using System;\nConsole.WriteLine();\n$$");
        let (scope, _) = b.top_level(TypeRef::Unresolved).unwrap();
        let cursor = b.cursor();
        let snapshot = b.build();
        assert!(snapshot.store().scope(scope).unwrap().contains_position(cursor));
    }

    #[test]
    #[should_panic(expected = "not found")]
    fn test_missing_needle_panics() {
        let mut b = SnapshotBuilder::new("class C { }");
        let global = b.global();
        b.type_decl(global, "class D", TypeKind::Class);
    }
}
