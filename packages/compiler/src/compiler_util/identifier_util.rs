use crate::aot::static_value::StaticValue;
use crate::compile_metadata::CompileTokenMetadata;
use crate::compile_reflector::CompileReflector;
use crate::error::Result;
use crate::identifiers::{resolve_enum_member, IdentifierSpec};
use crate::output::output_ast::{self as o, Expression};

/// `Enum.member` of a runtime enum.
pub fn create_enum_expression(
    reflector: &dyn CompileReflector,
    enum_type: &IdentifierSpec,
    member: &str,
) -> Result<Expression> {
    Ok(o::import_expr(resolve_enum_member(reflector, enum_type, member)?))
}

/// Expression of a DI token: its identifier, or the literal value.
pub fn create_di_token_expression(token: &CompileTokenMetadata) -> Expression {
    match token {
        CompileTokenMetadata::Identifier(symbol) => o::import_expr(symbol.clone()),
        CompileTokenMetadata::Value(value) => convert_value_to_output_ast(value),
    }
}

/// Output expression for a statically known value, such as a `useValue`.
pub fn convert_value_to_output_ast(value: &StaticValue) -> Expression {
    match value {
        StaticValue::Undefined | StaticValue::Ignore => o::literal(o::LiteralValue::Undefined),
        StaticValue::Null | StaticValue::Annotation(_) => o::null_expr(),
        StaticValue::Bool(b) => o::literal(*b),
        StaticValue::Number(n) => o::literal(*n),
        StaticValue::String(s) => o::literal(s.as_str()),
        StaticValue::Symbol(symbol) => o::import_expr(symbol.clone()),
        StaticValue::Array(items) => o::literal_arr(items.iter().map(convert_value_to_output_ast).collect()),
        StaticValue::Object(entries) => o::literal_map(
            entries
                .iter()
                .map(|(key, value)| o::LiteralMapEntry {
                    key: key.clone(),
                    value: convert_value_to_output_ast(value),
                    quoted: true,
                })
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{object, MockReflector};

    #[test]
    fn should_convert_nested_values() {
        let reflector = MockReflector::new();
        let symbol = reflector.symbol("/app/a.ts", "A");
        let value = object(&[
            ("list", StaticValue::Array(vec![StaticValue::Number(1.0), StaticValue::Null])),
            ("type", StaticValue::Symbol(symbol)),
        ]);
        match convert_value_to_output_ast(&value) {
            Expression::LiteralMap(entries) => {
                assert_eq!(entries.len(), 2);
                assert!(matches!(entries[0].value, Expression::LiteralArray(ref items) if items.len() == 2));
                assert!(matches!(entries[1].value, Expression::External(_)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn should_resolve_enum_members() {
        let reflector = MockReflector::new();
        let expr =
            create_enum_expression(&reflector, &crate::identifiers::Identifiers::ViewType, "HOST").unwrap();
        match expr {
            Expression::External(reference) => {
                let symbol = reference.symbol().unwrap();
                assert_eq!(symbol.name(), "ViewType");
                assert_eq!(symbol.members(), &["HOST".to_string()]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
