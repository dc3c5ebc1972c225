//! Native functions and their registration into the top-level environment.
//!
//! Builtins are applied with evaluated arguments. Each carries a signature:
//! an argument-count range plus either one type expected at every position
//! (variadic) or a fixed per-position list, checked against the subtype
//! lattice in [`crate::value::Ty`] before dispatch.

mod io;
mod lists;
mod numeric;
mod predicates;

use strum::{Display, EnumIter, IntoEnumIterator, IntoStaticStr};

use crate::{
    env::EnvId,
    error::{EvalError, EvalResult},
    forms::SpecialForm,
    heap::Heap,
    io::PrintWriter,
    value::{Ty, Value},
};

/// Every native function the top-level environment starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
pub enum Builtin {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "/")]
    Div,
    #[strum(serialize = "=")]
    NumEq,
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = "<=")]
    Le,
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = ">=")]
    Ge,
    #[strum(serialize = "min")]
    Min,
    #[strum(serialize = "max")]
    Max,
    #[strum(serialize = "abs")]
    Abs,
    #[strum(serialize = "null?")]
    IsNull,
    #[strum(serialize = "pair?")]
    IsPair,
    #[strum(serialize = "number?")]
    IsNumber,
    #[strum(serialize = "symbol?")]
    IsSymbol,
    #[strum(serialize = "boolean?")]
    IsBoolean,
    #[strum(serialize = "list?")]
    IsList,
    #[strum(serialize = "eq?")]
    Eq,
    #[strum(serialize = "eql?")]
    Eql,
    #[strum(serialize = "not")]
    Not,
    #[strum(serialize = "cons")]
    Cons,
    #[strum(serialize = "car")]
    Car,
    #[strum(serialize = "cdr")]
    Cdr,
    #[strum(serialize = "set-car!")]
    SetCar,
    #[strum(serialize = "set-cdr!")]
    SetCdr,
    #[strum(serialize = "list")]
    List,
    #[strum(serialize = "list-ref")]
    ListRef,
    #[strum(serialize = "list-tail")]
    ListTail,
    #[strum(serialize = "map")]
    Map,
    #[strum(serialize = "print")]
    Print,
    #[strum(serialize = "read")]
    Read,
    #[strum(serialize = "load")]
    Load,
    #[strum(serialize = "exit")]
    Exit,
}

/// Argument types of a signature.
enum Params {
    /// One type expected at every position.
    Every(Ty),
    /// A fixed per-position list; the argument count must match its length.
    Fixed(&'static [Ty]),
}

/// A builtin's arity and argument types.
struct Signature {
    min: usize,
    max: Option<usize>,
    params: Params,
}

const ANY: &[Ty] = &[Ty::T];
const ANY_ANY: &[Ty] = &[Ty::T, Ty::T];
const PAIR: &[Ty] = &[Ty::Pair];
const PAIR_ANY: &[Ty] = &[Ty::Pair, Ty::T];
const PAIR_NUMBER: &[Ty] = &[Ty::Pair, Ty::Number];
const FUNCTION_PAIR: &[Ty] = &[Ty::Function, Ty::Pair];
const NUMBER: &[Ty] = &[Ty::Number];
const STR: &[Ty] = &[Ty::Str];
const NONE: &[Ty] = &[];

impl Builtin {
    fn signature(self) -> Signature {
        let every = |min: usize, ty: Ty| Signature {
            min,
            max: None,
            params: Params::Every(ty),
        };
        let fixed = |tys: &'static [Ty]| Signature {
            min: tys.len(),
            max: Some(tys.len()),
            params: Params::Fixed(tys),
        };
        match self {
            Self::Add | Self::Mul => every(0, Ty::Number),
            Self::Sub | Self::Div => every(1, Ty::Number),
            Self::NumEq | Self::Lt | Self::Le | Self::Gt | Self::Ge => every(2, Ty::Number),
            Self::Min | Self::Max => every(1, Ty::Number),
            Self::Abs => fixed(NUMBER),
            Self::IsNull
            | Self::IsPair
            | Self::IsNumber
            | Self::IsSymbol
            | Self::IsBoolean
            | Self::IsList
            | Self::Not
            | Self::Print => fixed(ANY),
            Self::Eq | Self::Eql => fixed(ANY_ANY),
            Self::Cons => fixed(ANY_ANY),
            Self::Car | Self::Cdr | Self::ListTail => fixed(PAIR),
            Self::SetCar | Self::SetCdr => fixed(PAIR_ANY),
            Self::List => every(0, Ty::T),
            Self::ListRef => fixed(PAIR_NUMBER),
            Self::Map => fixed(FUNCTION_PAIR),
            Self::Read | Self::Exit => fixed(NONE),
            Self::Load => fixed(STR),
        }
    }

    /// Checks argument count and types before dispatch.
    pub(crate) fn check_args(self, heap: &Heap, args: &[Value]) -> EvalResult<()> {
        let signature = self.signature();
        if args.len() < signature.min || signature.max.is_some_and(|max| args.len() > max) {
            return Err(EvalError::runtime(format!(
                "{self}: wrong number of arguments"
            )));
        }
        let mismatch = |ty: Ty, value: Value| {
            EvalError::runtime(format!(
                "{self}: expected {ty} argument, got {}",
                value.kind_name(heap)
            ))
        };
        match signature.params {
            Params::Every(ty) => {
                for &arg in args {
                    if !ty.admits(heap, arg) {
                        return Err(mismatch(ty, arg));
                    }
                }
            }
            Params::Fixed(tys) => {
                for (&ty, &arg) in tys.iter().zip(args) {
                    if !ty.admits(heap, arg) {
                        return Err(mismatch(ty, arg));
                    }
                }
            }
        }
        Ok(())
    }

    /// Invokes the native implementation.
    ///
    /// Arguments have already been evaluated and type-checked; they are held
    /// on the caller's guard scope for the duration of the call.
    pub(crate) fn call<P: PrintWriter>(
        self,
        heap: &mut Heap,
        env: EnvId,
        args: &[Value],
        print: &mut P,
    ) -> EvalResult<Value> {
        match self {
            Self::Add => numeric::add(args),
            Self::Sub => numeric::sub(args),
            Self::Mul => numeric::mul(args),
            Self::Div => numeric::div(args),
            Self::NumEq => Ok(numeric::compare(args, |a, b| a == b)),
            Self::Lt => Ok(numeric::compare(args, |a, b| a < b)),
            Self::Le => Ok(numeric::compare(args, |a, b| a <= b)),
            Self::Gt => Ok(numeric::compare(args, |a, b| a > b)),
            Self::Ge => Ok(numeric::compare(args, |a, b| a >= b)),
            Self::Min => Ok(numeric::extremum(args, i64::min)),
            Self::Max => Ok(numeric::extremum(args, i64::max)),
            Self::Abs => Ok(numeric::abs(args)),
            Self::IsNull => Ok(Value::Bool(args[0] == Value::Nil)),
            Self::IsPair => Ok(Value::Bool(heap.as_pair(args[0]).is_some())),
            Self::IsNumber => Ok(Value::Bool(matches!(args[0], Value::Int(_)))),
            Self::IsSymbol => Ok(Value::Bool(matches!(args[0], Value::Symbol(_)))),
            Self::IsBoolean => Ok(Value::Bool(matches!(args[0], Value::Bool(_)))),
            Self::IsList => Ok(predicates::is_list(heap, args[0])),
            Self::Eq => Ok(Value::Bool(args[0] == args[1])),
            Self::Eql => Ok(predicates::eql(heap, args[0], args[1])),
            Self::Not => Ok(Value::Bool(args[0].is_false())),
            Self::Cons => Ok(heap.alloc_pair(args[0], args[1])),
            Self::Car => lists::car(heap, args),
            Self::Cdr => lists::cdr(heap, args),
            Self::SetCar => lists::set_car(heap, args),
            Self::SetCdr => lists::set_cdr(heap, args),
            Self::List => Ok(lists::list(heap, args)),
            Self::ListRef => lists::list_ref(heap, args),
            Self::ListTail => lists::list_tail(heap, args),
            Self::Map => lists::map(heap, env, args, print),
            Self::Print => Ok(io::print(heap, args, print)),
            Self::Read => io::read(heap),
            Self::Load => io::load(heap, env, args, print),
            // The exit builtin's result is the sentinel the drivers compare
            // against to end their loops.
            Self::Exit => Ok(Value::Builtin(Self::Exit)),
        }
    }
}

/// Populates a fresh top-level frame with every special form and builtin,
/// each bound under its interned name.
pub(crate) fn install(heap: &mut Heap, env: EnvId) {
    for form in SpecialForm::iter() {
        let name: &'static str = form.into();
        let name = heap.intern(name);
        heap.env_define(env, name, Value::Form(form));
    }
    for builtin in Builtin::iter() {
        let name: &'static str = builtin.into();
        let name = heap.intern(name);
        heap.env_define(env, name, Value::Builtin(builtin));
    }
}
