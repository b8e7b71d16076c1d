//! Applicability of symbols at a completion position.
//!
//! Lookup decides which symbols are in scope; this module decides which of
//! them are legal to offer at the cursor. Each rule can exclude a symbol and
//! records why through an [`Exclusion`]:
//!
//! - **Syntactic position**: type-only positions (`new |`, `static |`,
//!   `List<|`) offer types and namespaces; `goto |` offers labels only.
//! - **Constraint positions**: `where T : |` excludes static, sealed and
//!   value types unless they contain an accessible nested type.
//! - **Receiver kind**: members reached through a type name must be static,
//!   members reached through a value must not be. Through a type parameter
//!   only static abstract/virtual interface members are reachable.
//! - **Nullable receivers**: `x?.` on a nullable value type offers the
//!   underlying type's members; `x.` offers `Nullable<T>`'s own members.
//! - **Pattern operands**: after `is`, `not`, `and`, `or`, `==`, `!=` and
//!   `case`, only constants and nested types are offered.
//! - **Extension methods**: offered on values when the receiver satisfies the
//!   `this` parameter and every inferred type argument meets its constraints.
//!
//! An unbound receiver offers nothing.

use serde::Serialize;
use symscope_core::adapter::BinderHost;
use symscope_core::cancel::CancellationToken;
use symscope_core::error::SemanticResult;
use symscope_core::facts::{
    FactsStore, Modifier, ScopeId, Substitution, Symbol, SymbolId, SymbolKind, TypeKind, TypeRef,
};
use symscope_core::hierarchy;
use symscope_core::snapshot::Snapshot;

use crate::access::AccessSite;
use crate::completion::CompletionRequest;
use crate::context::{self, AccessOperator, PositionKind, SyntacticContext};
use crate::extension;
use crate::lookup::{self, Origin};
use crate::members::{self, Receiver};
use crate::options::AnalysisOptions;

// ============================================================================
// Verdicts
// ============================================================================

/// Whether a symbol may be offered at a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "verdict", content = "reason", rename_all = "snake_case")]
pub enum Verdict {
    Applicable,
    NotApplicable(Exclusion),
}

impl Verdict {
    /// Check if the symbol may be offered.
    pub fn is_applicable(&self) -> bool {
        matches!(self, Verdict::Applicable)
    }

    /// The reason a symbol is excluded.
    pub fn exclusion(&self) -> Option<Exclusion> {
        match self {
            Verdict::Applicable => None,
            Verdict::NotApplicable(reason) => Some(*reason),
        }
    }
}

/// Why a symbol is not applicable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Exclusion {
    /// Hidden by a symbol of the same name in an inner scope.
    Shadowed,
    /// Local used before its declaration.
    DeclaredLater,
    /// Declared accessibility forbids access from here.
    Inaccessible,
    /// Instance member without an instance (static method, outer type,
    /// access through a type name).
    InstanceInStaticContext,
    /// Outer local or parameter inside a `static` lambda or local function.
    CapturedInStaticFunction,
    /// Static member accessed through an instance.
    StaticViaInstance,
    /// Non-type in a type-only position.
    NotAType,
    /// Non-constant as a pattern operand.
    NotAConstant,
    /// Non-label after `goto`.
    NotALabel,
    /// Label outside a `goto` statement.
    LabelOutsideGoto,
    /// Extension method whose `this` parameter or constraints reject the
    /// receiver.
    ConstraintNotSatisfied,
    /// Static, sealed or value type as a generic constraint.
    InvalidConstraintType,
    /// Obsolete symbol with obsolete filtering enabled.
    Obsolete,
    /// Not reached by lookup at this position.
    NotInScope,
    /// Member other than a static abstract/virtual interface member
    /// accessed through a type parameter.
    NotAccessibleThroughTypeParameter,
}

impl Exclusion {
    /// Output string for this exclusion.
    pub fn as_str(&self) -> &'static str {
        match self {
            Exclusion::Shadowed => "shadowed",
            Exclusion::DeclaredLater => "declared_later",
            Exclusion::Inaccessible => "inaccessible",
            Exclusion::InstanceInStaticContext => "instance_in_static_context",
            Exclusion::CapturedInStaticFunction => "captured_in_static_function",
            Exclusion::StaticViaInstance => "static_via_instance",
            Exclusion::NotAType => "not_a_type",
            Exclusion::NotAConstant => "not_a_constant",
            Exclusion::NotALabel => "not_a_label",
            Exclusion::LabelOutsideGoto => "label_outside_goto",
            Exclusion::ConstraintNotSatisfied => "constraint_not_satisfied",
            Exclusion::InvalidConstraintType => "invalid_constraint_type",
            Exclusion::Obsolete => "obsolete",
            Exclusion::NotInScope => "not_in_scope",
            Exclusion::NotAccessibleThroughTypeParameter => {
                "not_accessible_through_type_parameter"
            }
        }
    }
}

impl std::fmt::Display for Exclusion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Evaluation
// ============================================================================

/// A symbol considered for a position, with its verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub symbol_id: SymbolId,
    /// Constructed type the symbol was found on, for members.
    pub via: Option<TypeRef>,
    pub verdict: Verdict,
    pub origin: Origin,
    /// Method type arguments inferred from the receiver (extension methods).
    pub inferred: Substitution,
}

impl Evaluation {
    fn new(symbol_id: SymbolId, via: Option<TypeRef>, verdict: Verdict, origin: Origin) -> Self {
        Evaluation {
            symbol_id,
            via,
            verdict,
            origin,
            inferred: Substitution::new(),
        }
    }
}

/// Everything considered for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationSet {
    pub context: SyntacticContext,
    /// Bound receiver for member access, `None` otherwise.
    pub receiver: Option<Receiver>,
    pub evaluations: Vec<Evaluation>,
}

impl EvaluationSet {
    /// Verdict for one symbol; symbols never considered are `NotInScope`.
    pub fn verdict_of(&self, symbol_id: SymbolId) -> Verdict {
        self.evaluations
            .iter()
            .find(|e| e.symbol_id == symbol_id)
            .map(|e| e.verdict)
            .unwrap_or(Verdict::NotApplicable(Exclusion::NotInScope))
    }
}

/// Evaluate every symbol reachable for a completion request.
///
/// Without a member-access operator this is a lexical lookup filtered by the
/// syntactic position. After `.` or `?.` the receiver is the one supplied in
/// the request or, failing that, the dotted name chain before the operator.
pub fn evaluate(
    snapshot: &Snapshot,
    request: &CompletionRequest,
    options: &AnalysisOptions,
    cancel: &CancellationToken,
) -> SemanticResult<EvaluationSet> {
    cancel.check()?;
    let store = snapshot.store();
    let position = request.position;
    let context = context::classify(snapshot.text_before(position));
    let scope = store.enclosing_scope(position);
    let site = AccessSite::at(store, scope)?;
    let rules = Rules {
        store,
        context: &context,
        site: &site,
        options,
    };

    if context.access.is_none() && request.receiver.is_none() {
        let outcome = lookup::lookup(store, position, options, cancel)?;
        let mut evaluations = Vec::with_capacity(outcome.entries.len());
        for entry in outcome.entries {
            let verdict = match (entry.verdict, store.symbol(entry.symbol_id)) {
                (Verdict::Applicable, Some(symbol)) => rules.position_verdict(symbol, cancel)?,
                (verdict, _) => verdict,
            };
            evaluations.push(Evaluation::new(entry.symbol_id, entry.via, verdict, entry.origin));
        }
        return Ok(EvaluationSet {
            context,
            receiver: None,
            evaluations,
        });
    }

    let receiver = match &request.receiver {
        Some(receiver) => receiver.clone(),
        None => members::resolve_receiver(
            snapshot,
            position,
            &context.receiver_path,
            options,
            cancel,
        )?,
    };
    let evaluations = rules.member_evaluations(&receiver, scope, cancel)?;
    tracing::debug!(
        position,
        ?receiver,
        considered = evaluations.len(),
        "evaluated member access"
    );

    Ok(EvaluationSet {
        context,
        receiver: Some(receiver),
        evaluations,
    })
}

/// Verdict for one symbol at a completion request.
///
/// Symbols that the request never reaches are `NotInScope`.
pub fn is_applicable(
    snapshot: &Snapshot,
    symbol_id: SymbolId,
    request: &CompletionRequest,
    options: &AnalysisOptions,
    cancel: &CancellationToken,
) -> SemanticResult<Verdict> {
    Ok(evaluate(snapshot, request, options, cancel)?.verdict_of(symbol_id))
}

// ============================================================================
// Rules
// ============================================================================

struct Rules<'a> {
    store: &'a FactsStore,
    context: &'a SyntacticContext,
    site: &'a AccessSite,
    options: &'a AnalysisOptions,
}

/// How a member is being reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Through {
    Value,
    TypeName,
    TypeParameter,
    Namespace,
}

impl Rules<'_> {
    /// Verdict for a lexically visible symbol at the syntactic position.
    fn position_verdict(
        &self,
        symbol: &Symbol,
        cancel: &CancellationToken,
    ) -> SemanticResult<Verdict> {
        let verdict = match self.context.position_kind {
            PositionKind::Label if symbol.kind == SymbolKind::Label => Verdict::Applicable,
            PositionKind::Label => Verdict::NotApplicable(Exclusion::NotALabel),
            _ if symbol.kind == SymbolKind::Label => {
                Verdict::NotApplicable(Exclusion::LabelOutsideGoto)
            }
            PositionKind::Expression => Verdict::Applicable,
            PositionKind::TypeOnly => self.type_position_verdict(symbol),
            PositionKind::TypeConstraint => match self.type_position_verdict(symbol) {
                Verdict::Applicable => self.constraint_verdict(symbol, cancel)?,
                excluded => excluded,
            },
        };
        Ok(self.obsolete_filter(symbol, verdict))
    }

    fn type_position_verdict(&self, symbol: &Symbol) -> Verdict {
        if names_type_or_namespace(symbol) {
            Verdict::Applicable
        } else {
            Verdict::NotApplicable(Exclusion::NotAType)
        }
    }

    /// Static, sealed and value types cannot be constraints, but their
    /// accessible nested types can.
    fn constraint_verdict(
        &self,
        symbol: &Symbol,
        cancel: &CancellationToken,
    ) -> SemanticResult<Verdict> {
        if symbol.kind != SymbolKind::Type {
            return Ok(Verdict::Applicable);
        }
        let is_value_type = self
            .store
            .type_decl(symbol.symbol_id)
            .is_some_and(|d| d.kind.is_value_type() || d.kind == TypeKind::Delegate);
        let unusable = symbol.has_modifier(Modifier::Static)
            || symbol.has_modifier(Modifier::Sealed)
            || is_value_type;
        if !unusable {
            return Ok(Verdict::Applicable);
        }

        for nested in self.store.members_of(symbol.symbol_id) {
            if nested.kind == SymbolKind::Type
                && self.site.can_access(self.store, nested, cancel)?
            {
                return Ok(Verdict::Applicable);
            }
        }
        Ok(Verdict::NotApplicable(Exclusion::InvalidConstraintType))
    }

    fn obsolete_filter(&self, symbol: &Symbol, verdict: Verdict) -> Verdict {
        if verdict.is_applicable() && self.options.hide_obsolete && symbol.is_obsolete() {
            Verdict::NotApplicable(Exclusion::Obsolete)
        } else {
            verdict
        }
    }

    fn member_evaluations(
        &self,
        receiver: &Receiver,
        scope: ScopeId,
        cancel: &CancellationToken,
    ) -> SemanticResult<Vec<Evaluation>> {
        let store = self.store;
        let mut result = Vec::new();

        match receiver {
            Receiver::Unbound => {
                tracing::debug!("receiver unbound; offering nothing");
            }
            Receiver::Namespace(ns) => {
                let Some(ns_scope) = store.scope_owned_by(*ns) else {
                    return Ok(result);
                };
                for symbol in store.symbols_in_scope(ns_scope.scope_id) {
                    if !matches!(symbol.kind, SymbolKind::Namespace | SymbolKind::Type) {
                        continue;
                    }
                    let verdict = self.member_verdict(symbol, Through::Namespace, cancel)?;
                    result.push(Evaluation::new(symbol.symbol_id, None, verdict, Origin::Declared));
                }
            }
            Receiver::Type(ty) => {
                let through = if matches!(ty, TypeRef::Param { .. }) {
                    Through::TypeParameter
                } else {
                    Through::TypeName
                };
                self.push_type_members(ty, through, &mut result, cancel)?;
            }
            Receiver::Value(ty) => {
                let ty = match self.context.access {
                    Some(AccessOperator::ConditionalDot) => {
                        hierarchy::nullable_underlying(store, ty).unwrap_or_else(|| ty.clone())
                    }
                    _ => hierarchy::normalize(store, ty),
                };
                if ty.is_unresolved() {
                    return Ok(result);
                }
                self.push_type_members(&ty, Through::Value, &mut result, cancel)?;
                if self.options.include_extension_methods {
                    self.push_extensions(&ty, scope, &mut result, cancel)?;
                }
            }
        }

        Ok(result)
    }

    fn push_type_members(
        &self,
        ty: &TypeRef,
        through: Through,
        result: &mut Vec<Evaluation>,
        cancel: &CancellationToken,
    ) -> SemanticResult<()> {
        for entry in members::type_members(self.store, ty, cancel)? {
            let Some(member) = self.store.symbol(entry.symbol_id) else {
                continue;
            };
            let verdict = self.member_verdict(member, through, cancel)?;
            let origin = if entry.inherited {
                Origin::Inherited
            } else {
                Origin::Declared
            };
            result.push(Evaluation::new(
                entry.symbol_id,
                Some(entry.declaring_type),
                verdict,
                origin,
            ));
        }
        Ok(())
    }

    fn push_extensions(
        &self,
        receiver: &TypeRef,
        scope: ScopeId,
        result: &mut Vec<Evaluation>,
        cancel: &CancellationToken,
    ) -> SemanticResult<()> {
        for method in extension::extension_methods_in_scope(self.store, scope, cancel)? {
            let Some(symbol) = self.store.symbol(method) else {
                continue;
            };
            let reduced = extension::reduce_extension(self.store, method, receiver, cancel)?;
            let verdict = if !self.site.can_access(self.store, symbol, cancel)? {
                Verdict::NotApplicable(Exclusion::Inaccessible)
            } else if self.context.in_pattern {
                Verdict::NotApplicable(Exclusion::NotAConstant)
            } else if reduced.is_none() {
                Verdict::NotApplicable(Exclusion::ConstraintNotSatisfied)
            } else {
                self.member_position_verdict(symbol)
            };
            let mut evaluation = Evaluation::new(
                method,
                Some(receiver.clone()),
                self.obsolete_filter(symbol, verdict),
                Origin::Extension,
            );
            evaluation.inferred = reduced.unwrap_or_default();
            result.push(evaluation);
        }
        Ok(())
    }

    fn member_verdict(
        &self,
        member: &Symbol,
        through: Through,
        cancel: &CancellationToken,
    ) -> SemanticResult<Verdict> {
        if !self.site.can_access(self.store, member, cancel)? {
            return Ok(Verdict::NotApplicable(Exclusion::Inaccessible));
        }

        let receiver_verdict = match through {
            Through::Value if member.is_static() => {
                Verdict::NotApplicable(Exclusion::StaticViaInstance)
            }
            Through::TypeName if member.is_instance_member() => {
                Verdict::NotApplicable(Exclusion::InstanceInStaticContext)
            }
            Through::TypeParameter if !self.is_static_interface_member(member) => {
                Verdict::NotApplicable(Exclusion::NotAccessibleThroughTypeParameter)
            }
            _ => Verdict::Applicable,
        };
        if !receiver_verdict.is_applicable() {
            return Ok(receiver_verdict);
        }

        if self.context.in_pattern && !(member.is_constant() || member.kind == SymbolKind::Type) {
            return Ok(Verdict::NotApplicable(Exclusion::NotAConstant));
        }

        let verdict = match self.context.position_kind {
            PositionKind::TypeConstraint if member.kind.is_type_or_namespace() => {
                self.constraint_verdict(member, cancel)?
            }
            _ => self.member_position_verdict(member),
        };
        Ok(self.obsolete_filter(member, verdict))
    }

    /// Qualified names in type positions (`new System.|`) must name types.
    fn member_position_verdict(&self, member: &Symbol) -> Verdict {
        match self.context.position_kind {
            PositionKind::TypeOnly | PositionKind::TypeConstraint
                if !member.kind.is_type_or_namespace() =>
            {
                Verdict::NotApplicable(Exclusion::NotAType)
            }
            _ => Verdict::Applicable,
        }
    }

    fn is_static_interface_member(&self, member: &Symbol) -> bool {
        let in_interface = member
            .container_symbol_id
            .and_then(|c| self.store.type_decl(c))
            .is_some_and(|d| d.kind == TypeKind::Interface);
        in_interface
            && member.is_static()
            && (member.has_modifier(Modifier::Abstract) || member.has_modifier(Modifier::Virtual))
    }
}

/// Type, type parameter, namespace, or an alias of one.
fn names_type_or_namespace(symbol: &Symbol) -> bool {
    match symbol.kind {
        SymbolKind::Alias => symbol
            .type_ref
            .as_ref()
            .is_some_and(|t| !t.is_unresolved()),
        kind => kind.is_type_or_namespace(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::SnapshotBuilder;

    fn at(snapshot_builder: &SnapshotBuilder) -> CompletionRequest {
        CompletionRequest::at(snapshot_builder.cursor())
    }

    mod position_tests {
        use super::*;

        #[test]
        fn test_type_only_position_excludes_locals() {
            let mut b = SnapshotBuilder::new("class C { void M() { int n = 0; var l = new $$ } }");
            let corlib = b.corlib();
            let global = b.global();
            let c = b.type_decl(global, "class C", TypeKind::Class);
            let m = b.method(&c, "void M");
            let n = b.local(m.scope, "int n", "n", TypeRef::named(corlib.int32));
            let request = at(&b);
            let snapshot = b.build();
            let cancel = CancellationToken::none();

            let set = evaluate(&snapshot, &request, &AnalysisOptions::default(), &cancel).unwrap();
            assert_eq!(set.context.position_kind, PositionKind::TypeOnly);
            assert_eq!(set.verdict_of(n), Verdict::NotApplicable(Exclusion::NotAType));
            assert!(set.verdict_of(corlib.list).is_applicable());
            assert!(set.verdict_of(c.symbol).is_applicable());
        }

        #[test]
        fn test_constraint_position_nested_type_exception() {
            let mut b = SnapshotBuilder::new(
                "static class Holder { public class Nested { } } sealed class Closed { } \
                 class Open { } class G<T> where T : $$ { }",
            );
            let global = b.global();
            let holder = b.type_decl(global, "static class Holder", TypeKind::Class);
            b.type_decl(holder.scope, "public class Nested", TypeKind::Class);
            let closed = b.type_decl(global, "sealed class Closed", TypeKind::Class);
            let open = b.type_decl(global, "class Open", TypeKind::Class);
            b.type_decl(global, "class G<T>", TypeKind::Class);
            let request = at(&b);
            let snapshot = b.build();
            let cancel = CancellationToken::none();

            let set = evaluate(&snapshot, &request, &AnalysisOptions::default(), &cancel).unwrap();
            assert_eq!(set.context.position_kind, PositionKind::TypeConstraint);
            assert!(set.verdict_of(holder.symbol).is_applicable());
            assert!(set.verdict_of(open.symbol).is_applicable());
            assert_eq!(
                set.verdict_of(closed.symbol),
                Verdict::NotApplicable(Exclusion::InvalidConstraintType)
            );
        }

        #[test]
        fn test_goto_offers_labels_only() {
            let mut b = SnapshotBuilder::new("class C { void M() { int n = 0; done: goto $$ } }");
            let global = b.global();
            let c = b.type_decl(global, "class C", TypeKind::Class);
            let m = b.method(&c, "void M");
            let n = b.local(m.scope, "int n", "n", TypeRef::Unresolved);
            let done = b.label(m.scope, "done:", "done");
            let request = at(&b);
            let snapshot = b.build();
            let cancel = CancellationToken::none();
            let options = AnalysisOptions::default();

            let set = evaluate(&snapshot, &request, &options, &cancel).unwrap();
            assert!(set.verdict_of(done).is_applicable());
            assert_eq!(set.verdict_of(n), Verdict::NotApplicable(Exclusion::NotALabel));
        }

        #[test]
        fn test_hide_obsolete() {
            let mut b = SnapshotBuilder::new("class C { [Obsolete] void Old() { } void M() { $$ } }");
            let global = b.global();
            let c = b.type_decl(global, "class C", TypeKind::Class);
            let old = b.method(&c, "[Obsolete] void Old");
            b.method(&c, "void M");
            let request = at(&b);
            let snapshot = b.build();
            let cancel = CancellationToken::none();

            let shown = evaluate(&snapshot, &request, &AnalysisOptions::default(), &cancel).unwrap();
            assert!(shown.verdict_of(old.symbol).is_applicable());

            let options = AnalysisOptions::default().with_hide_obsolete(true);
            let hidden = evaluate(&snapshot, &request, &options, &cancel).unwrap();
            assert_eq!(
                hidden.verdict_of(old.symbol),
                Verdict::NotApplicable(Exclusion::Obsolete)
            );
        }
    }

    mod receiver_tests {
        use super::*;

        #[test]
        fn test_static_members_through_type_name() {
            let mut b = SnapshotBuilder::new("class C { void M() { Int32.$$ } }");
            let corlib = b.corlib();
            let global = b.global();
            let c = b.type_decl(global, "class C", TypeKind::Class);
            b.method(&c, "void M");
            let request = at(&b);
            let snapshot = b.build();
            let cancel = CancellationToken::none();

            let set = evaluate(&snapshot, &request, &AnalysisOptions::default(), &cancel).unwrap();
            assert!(set.verdict_of(corlib.int32_max_value).is_applicable());
            assert_eq!(
                set.verdict_of(corlib.int32_compare_to),
                Verdict::NotApplicable(Exclusion::InstanceInStaticContext)
            );
        }

        #[test]
        fn test_static_member_via_instance_excluded() {
            let mut b = SnapshotBuilder::new("class C { void M(int i) { i.$$ } }");
            let corlib = b.corlib();
            let global = b.global();
            let c = b.type_decl(global, "class C", TypeKind::Class);
            let m = b.method(&c, "void M");
            b.parameter(&m, "i", TypeRef::named(corlib.int32));
            let request = at(&b);
            let snapshot = b.build();
            let cancel = CancellationToken::none();

            let set = evaluate(&snapshot, &request, &AnalysisOptions::default(), &cancel).unwrap();
            assert!(set.verdict_of(corlib.int32_compare_to).is_applicable());
            assert_eq!(
                set.verdict_of(corlib.int32_max_value),
                Verdict::NotApplicable(Exclusion::StaticViaInstance)
            );
        }

        #[test]
        fn test_unbound_receiver_offers_nothing() {
            let mut b = SnapshotBuilder::new("class C { void M() { missing.$$ } }");
            let global = b.global();
            let c = b.type_decl(global, "class C", TypeKind::Class);
            b.method(&c, "void M");
            let request = at(&b);
            let snapshot = b.build();
            let cancel = CancellationToken::none();

            let set = evaluate(&snapshot, &request, &AnalysisOptions::default(), &cancel).unwrap();
            assert_eq!(set.receiver, Some(Receiver::Unbound));
            assert!(set.evaluations.is_empty());
        }

        #[test]
        fn test_explicit_receiver_overrides_text() {
            let mut b = SnapshotBuilder::new("class C { void M() { Make().$$ } }");
            let corlib = b.corlib();
            let global = b.global();
            let c = b.type_decl(global, "class C", TypeKind::Class);
            b.method(&c, "void M");
            let cursor = b.cursor();
            let snapshot = b.build();
            let cancel = CancellationToken::none();

            let request = CompletionRequest::at(cursor)
                .with_receiver(Receiver::Value(TypeRef::named(corlib.string)));
            let verdict = is_applicable(
                &snapshot,
                corlib.string_length,
                &request,
                &AnalysisOptions::default(),
                &cancel,
            )
            .unwrap();
            assert!(verdict.is_applicable());
        }

        #[test]
        fn test_static_abstract_through_type_parameter() {
            let mut b = SnapshotBuilder::new(
                "interface IParse { static abstract IParse Parse(); void Run(); } \
                 class C { void M<T>() where T : IParse { T.$$ } }",
            );
            let global = b.global();
            let iparse = b.type_decl(global, "interface IParse", TypeKind::Interface);
            let parse = b.method(&iparse, "static abstract IParse Parse");
            let run = b.method(&iparse, "void Run");
            let c = b.type_decl(global, "class C", TypeKind::Class);
            let m = b.method(&c, "void M<T>");
            b.constrain(m.type_params[0], TypeRef::named(iparse.symbol));
            let request = at(&b);
            let snapshot = b.build();
            let cancel = CancellationToken::none();

            let set = evaluate(&snapshot, &request, &AnalysisOptions::default(), &cancel).unwrap();
            assert_eq!(
                set.receiver,
                Some(Receiver::Type(TypeRef::param(m.type_params[0])))
            );
            assert!(set.verdict_of(parse.symbol).is_applicable());
            assert_eq!(
                set.verdict_of(run.symbol),
                Verdict::NotApplicable(Exclusion::NotAccessibleThroughTypeParameter)
            );
        }
    }
}
