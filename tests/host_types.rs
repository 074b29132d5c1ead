mod cases;

use std::any::Any;
use std::sync::Arc;

use celeste::ast::{CheckedExpr, ExprBuilder};
use celeste::overloads::operators::*;
use celeste::types::{DefaultTypeAdapter, INT_TYPE, ObjectType, STRING_TYPE};
use celeste::values::Object;
use celeste::{
    Env, Error, ErrorKind, Type, TypeAdapter, TypeProvider, TypeRegistry, Val,
    render_error_to_string,
};
use pretty_assertions::assert_eq;

use cases::error_kind;

#[derive(Debug)]
struct Account {
    ty: Type,
    owner: String,
    balance: i64,
}

impl Object for Account {
    fn ty(&self) -> &Type {
        &self.ty
    }

    fn get(&self, field: &str) -> Option<Val> {
        match field {
            "owner" => Some(Val::from(self.owner.as_str())),
            "balance" => Some(Val::Int(self.balance)),
            _ => None,
        }
    }

    fn equal(&self, other: &dyn Object) -> bool {
        other
            .as_any()
            .downcast_ref::<Account>()
            .is_some_and(|o| o.owner == self.owner && o.balance == self.balance)
    }

    fn receive(&self, function: &str, args: &[Val]) -> Option<Val> {
        match (function, args) {
            ("isOverdrawn", []) => Some(Val::Bool(self.balance < 0)),
            _ => None,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Host-side value the adapter turns into an [`Account`] object.
struct AccountRow {
    owner: &'static str,
    balance: i64,
}

struct BankAdapter {
    account_type: Type,
}

impl TypeAdapter for BankAdapter {
    fn native_to_value(&self, value: &(dyn Any + Send + Sync)) -> Val {
        match value.downcast_ref::<AccountRow>() {
            Some(row) => Val::Object(Arc::new(Account {
                ty: self.account_type.clone(),
                owner: row.owner.to_string(),
                balance: row.balance,
            })),
            None => DefaultTypeAdapter.native_to_value(value),
        }
    }
}

fn bank_env() -> Env {
    let mut types = TypeRegistry::new();
    types.register(
        ObjectType::new("bank.Account")
            .field("owner", &STRING_TYPE)
            .field("balance", &INT_TYPE),
    );
    let account_type = types.find_type("bank.Account").expect("registered");
    Env::builder()
        .types(types)
        .adapter(BankAdapter { account_type })
        .container("bank")
        .build()
}

#[test]
fn native_bindings_go_through_the_adapter() {
    let env = bank_env();
    let b = ExprBuilder::new();
    let balance = b.select(b.ident("account"), "balance");
    let expr = b.binary(GREATER, balance, b.literal(100i64));
    let program = env.plan_unchecked(expr).expect("plans");

    let vars = env.activation().bind_native(
        "account",
        AccountRow {
            owner: "ada",
            balance: 250,
        },
    );
    assert_eq!(program.eval(&vars), Val::Bool(true));
}

#[test]
fn host_objects_answer_method_calls() {
    let env = bank_env();
    let b = ExprBuilder::new();
    let expr = b.member_call(b.ident("account"), "isOverdrawn", vec![]);
    let program = env.plan_unchecked(expr).expect("plans");

    let vars = env.activation().bind_native(
        "account",
        AccountRow {
            owner: "bob",
            balance: -5,
        },
    );
    assert_eq!(program.eval(&vars), Val::Bool(true));

    let b = ExprBuilder::new();
    let expr = b.member_call(b.ident("account"), "close", vec![]);
    let program = env.plan_unchecked(expr).expect("plans");
    assert_eq!(
        error_kind(&program.eval(&vars)),
        Some(ErrorKind::NoSuchOverload)
    );
}

#[test]
fn objects_are_built_from_registered_types() {
    let env = bank_env();
    let b = ExprBuilder::new();
    let account = b.object(
        "Account",
        vec![("owner", b.literal("cy")), ("balance", b.literal(3i64))],
    );
    let expr = b.and(
        b.has(account, "owner"),
        b.binary(
            EQUALS,
            b.select(b.object("Account", vec![("balance", b.literal(3i64))]), "balance"),
            b.literal(3i64),
        ),
    );
    let program = env.plan_unchecked(expr).expect("plans");
    assert_eq!(program.eval(&env.activation()), Val::Bool(true));
}

#[test]
fn type_names_resolve_to_types() {
    let env = bank_env();
    let b = ExprBuilder::new();
    let expr = b.binary(EQUALS, b.call(TO_TYPE, vec![b.literal(1i64)]), b.ident("int"));
    let program = env.plan_unchecked(expr).expect("plans");
    assert_eq!(program.eval(&env.activation()), Val::Bool(true));

    let b = ExprBuilder::new();
    let program = env.plan_unchecked(b.ident("Account")).expect("plans");
    assert!(matches!(program.eval(&env.activation()), Val::Type(t) if t.name() == "bank.Account"));
}

#[test]
fn planning_errors_render_as_diagnostics() {
    let env = bank_env();
    let b = ExprBuilder::new();
    let expr = b.object("Loan", vec![]);
    let err: Error = env.plan_unchecked(expr).unwrap_err().into();
    let rendered = render_error_to_string(&err);
    assert!(rendered.contains("unknown type 'Loan'"), "{rendered}");
    assert!(rendered.contains("celeste::plan::unknown_type"), "{rendered}");

    let checked = CheckedExpr::unchecked(b.call("audit", vec![]));
    let err: Error = env.plan(&checked).unwrap_err().into();
    assert!(matches!(err, Error::Plan(_)));
}
