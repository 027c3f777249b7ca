//! Built-in functions for embedded expression evaluation.

use super::value::{EvalError, Value};
use crate::model::Model;

/// Calls a built-in function by name with the given arguments.
///
/// # Arguments
///
/// * `name` - The builtin name as written at the call site
/// * `args` - The already-evaluated argument values
/// * `model` - The model, for builtins that inspect entity references
///
/// # Returns
///
/// The builtin's result value, or an `EvalError` for an unknown name, an
/// arity mismatch, or an argument of the wrong type.
pub fn call_builtin(name: &str, args: &[Value], model: &Model) -> Result<Value, EvalError> {
    match name {
        "len" => builtin_len(args),
        "type_name" => builtin_type_name(args, model),
        "str" => builtin_str(args, model),
        _ => Err(EvalError::new(format!("unknown builtin `{}`", name))),
    }
}

/// len(value) - Length of a list or string.
fn builtin_len(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_mismatch(1, args.len()));
    }

    match &args[0] {
        Value::List(items) => Ok(Value::Int(items.len() as i64)),
        Value::Str(s) | Value::Code(s) => Ok(Value::Int(s.len() as i64)),
        other => Err(EvalError::type_error("List or String", other.type_name())),
    }
}

/// type_name(value) - The entity kind for model references (`API`,
/// `Function`, `Argument`, `Type`), the value type name otherwise.
fn builtin_type_name(args: &[Value], model: &Model) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_mismatch(1, args.len()));
    }

    Ok(Value::Str(match &args[0] {
        Value::Node(id) => model.kind(*id).to_string(),
        other => other.type_name().to_string(),
    }))
}

/// str(value) - The printed form of a value; entity references render by
/// their model printed form.
fn builtin_str(args: &[Value], model: &Model) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_mismatch(1, args.len()));
    }

    Ok(Value::Str(model.render(&args[0])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Type;

    #[test]
    fn len_counts_lists_and_strings() {
        let model = Model::new();
        assert_eq!(
            call_builtin("len", &[Value::List(vec![Value::Int(1)])], &model),
            Ok(Value::Int(1))
        );
        assert_eq!(
            call_builtin("len", &[Value::Str("abc".into())], &model),
            Ok(Value::Int(3))
        );
        assert!(call_builtin("len", &[Value::Int(3)], &model).is_err());
        assert!(call_builtin("len", &[], &model).is_err());
    }

    #[test]
    fn type_name_reports_entity_kinds() {
        let mut model = Model::new();
        let api = model.add_api();
        let ty = model.add_type(Type::new("int"));
        assert_eq!(
            call_builtin("type_name", &[Value::Node(api)], &model),
            Ok(Value::Str("API".into()))
        );
        assert_eq!(
            call_builtin("type_name", &[Value::Node(ty)], &model),
            Ok(Value::Str("Type".into()))
        );
        assert_eq!(
            call_builtin("type_name", &[Value::Int(1)], &model),
            Ok(Value::Str("Int".into()))
        );
    }

    #[test]
    fn str_renders_through_the_model() {
        let mut model = Model::new();
        let ty = model.add_type(Type::new("const int *"));
        assert_eq!(
            call_builtin("str", &[Value::Node(ty)], &model),
            Ok(Value::Str("const int *".into()))
        );
    }

    #[test]
    fn unknown_builtin_is_an_error() {
        let model = Model::new();
        assert!(call_builtin("eval", &[], &model).is_err());
    }
}
