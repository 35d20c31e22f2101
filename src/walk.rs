//! Descriptor tree → signature IR.
//!
//! A single top-down pass: every node is visited once, nothing is memoized.
//! The context is a small `Copy` value re-made per recursive call; the only
//! thing shared across the whole walk is the [`Imports`] accumulator.
use std::cell::RefCell;
use std::collections::BTreeSet;

use crate::cardinality::{Cardinality, wrap};
use crate::descriptor::Descriptor;
use crate::error::DescriptorError;
use crate::ir::{Field, Sig};

/// External type names a signature needs in scope.
///
/// Insert-only set shared by reference between every branch of a walk (and
/// between the args and result walks of one analysis). Writes are idempotent,
/// so sibling branches may record the same name freely.
#[derive(Debug, Default)]
pub struct Imports(RefCell<BTreeSet<String>>);

impl Imports {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, name: &str) {
        let mut set = self.0.borrow_mut();
        if !set.contains(name) {
            set.insert(name.to_string());
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.borrow().contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn into_set(self) -> BTreeSet<String> {
        self.0.into_inner()
    }
}

/// Generation policy for one walk.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    pub depth: usize,
    /// `AT_MOST_ONE` fields become optional keys instead of `T | null` values.
    pub optional_nulls: bool,
    /// Records, arrays and tuples are emitted immutable.
    pub readonly: bool,
    pub imports: &'a Imports,
}

impl<'a> Context<'a> {
    /// Policy for query parameters.
    pub fn args(imports: &'a Imports) -> Self {
        Self { depth: 0, optional_nulls: true, readonly: true, imports }
    }

    /// Policy for result rows.
    pub fn result(imports: &'a Imports) -> Self {
        Self { depth: 0, optional_nulls: false, readonly: false, imports }
    }

    fn nested(self) -> Self {
        Self { depth: self.depth + 1, ..self }
    }
}

pub fn walk(descriptor: &Descriptor, ctx: Context<'_>) -> Result<Sig, DescriptorError> {
    tracing::trace!(kind = descriptor.kind(), depth = ctx.depth, "walk");
    match descriptor {
        Descriptor::Null => Ok(Sig::Null),

        Descriptor::Scalar(scalar) => match &scalar.values {
            Some(values) => Ok(Sig::Literals(values.clone())),
            None => {
                if scalar.imported {
                    ctx.imports.insert(&scalar.name);
                }
                Ok(Sig::Named(scalar.name.clone()))
            }
        },

        Descriptor::Object { fields } => {
            let fields = fields.iter().map(|f| (f.name.as_str(), f.cardinality, &f.ty));
            walk_record(fields, ctx)
        }

        // named tuple elements are always exactly one value
        Descriptor::NamedTuple { elements } => {
            let fields = elements.iter().map(|e| (e.name.as_str(), Cardinality::One, &e.ty));
            walk_record(fields, ctx)
        }

        Descriptor::Array { element } => Ok(Sig::Array {
            item: Box::new(walk(element, ctx)?),
            readonly: ctx.readonly,
        }),

        Descriptor::Tuple { elements } => {
            let items = elements
                .iter()
                .map(|e| walk(e, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Sig::Tuple { items, readonly: ctx.readonly })
        }

        Descriptor::Range { element } => walk_range("Range", element, ctx),
        Descriptor::MultiRange { element } => walk_range("MultiRange", element, ctx),

        Descriptor::Set { .. } | Descriptor::SparseObject { .. } => {
            Err(DescriptorError::UnexpectedKind(descriptor.kind()))
        }
    }
}

fn walk_record<'d, I>(fields: I, ctx: Context<'_>) -> Result<Sig, DescriptorError>
where
    I: Iterator<Item = (&'d str, Cardinality, &'d Descriptor)>,
{
    let mut out = Vec::new();
    for (name, cardinality, child) in fields {
        // a set is only the carrier of a multi-valued field; the field's
        // cardinality already says "many", so unwrap it exactly once
        let child = match child {
            Descriptor::Set { element } => {
                if !cardinality.is_multi() {
                    return Err(DescriptorError::SetUnderSingleField {
                        field: name.to_string(),
                        cardinality,
                    });
                }
                element.as_ref()
            }
            other => other,
        };
        let inner = walk(child, ctx.nested())?;

        let optional = ctx.optional_nulls && cardinality == Cardinality::AtMostOne;
        let ty = if optional { inner } else { wrap(inner, cardinality)? };

        out.push(Field { name: name.to_string(), ty, optional });
    }
    Ok(Sig::Object { fields: out, depth: ctx.depth, readonly: ctx.readonly })
}

fn walk_range(
    name: &'static str,
    element: &Descriptor,
    ctx: Context<'_>,
) -> Result<Sig, DescriptorError> {
    if !matches!(element, Descriptor::Scalar(_)) {
        return Err(DescriptorError::NonScalarRange { range: name, found: element.kind() });
    }
    ctx.imports.insert(name);
    let arg = walk(element, ctx)?;
    Ok(Sig::Generic { name: name.to_string(), args: vec![arg] })
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::render;
    use crate::descriptor::NamedElement;

    fn walk_str(d: &Descriptor, ctx: Context<'_>) -> String {
        render(&walk(d, ctx).unwrap())
    }

    #[test]
    fn null_and_plain_scalar() {
        let imports = Imports::new();
        assert_eq!(walk_str(&Descriptor::Null, Context::result(&imports)), "null");
        assert_eq!(walk_str(&Descriptor::scalar("number"), Context::result(&imports)), "number");
        assert!(imports.is_empty());
    }

    #[test]
    fn enum_keeps_declared_order_and_quotes() {
        let imports = Imports::new();
        let d = Descriptor::enumeration("Color", ["b", "a", "it's \"x\""]);
        assert_eq!(
            walk_str(&d, Context::result(&imports)),
            r#"("b" | "a" | "it's \"x\"")"#
        );
        // enums are inlined as literals, never imported
        assert!(imports.is_empty());
    }

    #[test]
    fn imported_scalar_is_recorded_once() {
        let imports = Imports::new();
        let d = Descriptor::Tuple {
            elements: vec![Descriptor::imported_scalar("Duration"), Descriptor::imported_scalar("Duration")],
        };
        assert_eq!(walk_str(&d, Context::result(&imports)), "[Duration, Duration]");
        assert_eq!(imports.len(), 1);
        assert!(imports.contains("Duration"));
    }

    #[test]
    fn multi_field_unwraps_set() {
        let imports = Imports::new();
        let d = Descriptor::object([("tags", Cardinality::Many, Descriptor::set(Descriptor::scalar("string")))]);
        let sig = walk(&d, Context::result(&imports)).unwrap();
        let Sig::Object { fields, readonly, .. } = &sig else { panic!("expected object") };
        assert!(!readonly);
        assert_eq!(fields[0].name, "tags");
        assert!(!fields[0].optional);
        assert_eq!(render(&fields[0].ty), "string[]");
        assert_eq!(render(&sig), "{\n  \"tags\": string[];\n}");
    }

    #[test]
    fn at_least_one_field() {
        let imports = Imports::new();
        let d = Descriptor::object([("xs", Cardinality::AtLeastOne, Descriptor::set(Descriptor::scalar("number")))]);
        let sig = walk(&d, Context::result(&imports)).unwrap();
        assert_eq!(render(&sig), "{\n  \"xs\": [(number), ...(number)[]];\n}");
    }

    #[test]
    fn optional_nulls_marks_key_optional() {
        let imports = Imports::new();
        let d = Descriptor::object([("nick", Cardinality::AtMostOne, Descriptor::scalar("string"))]);

        let args = walk(&d, Context::args(&imports)).unwrap();
        let Sig::Object { fields, readonly, .. } = &args else { panic!("expected object") };
        assert!(*readonly);
        assert!(fields[0].optional);
        assert_eq!(render(&fields[0].ty), "string");
        assert_eq!(render(&args), "Readonly<{\n  \"nick\"?: string;\n}>");

        let result = walk(&d, Context::result(&imports)).unwrap();
        assert_eq!(render(&result), "{\n  \"nick\": string | null;\n}");
    }

    #[test]
    fn set_under_single_field_is_fatal() {
        let imports = Imports::new();
        let d = Descriptor::object([("tags", Cardinality::One, Descriptor::set(Descriptor::scalar("string")))]);
        let err = walk(&d, Context::result(&imports)).unwrap_err();
        assert!(matches!(
            err,
            DescriptorError::SetUnderSingleField { ref field, cardinality: Cardinality::One } if field == "tags"
        ));
    }

    #[test]
    fn set_outside_a_field_is_unexpected() {
        let imports = Imports::new();
        let top = Descriptor::set(Descriptor::scalar("string"));
        assert!(matches!(
            walk(&top, Context::result(&imports)),
            Err(DescriptorError::UnexpectedKind("set"))
        ));

        // set directly inside a set is not unwrapped twice
        let nested = Descriptor::object([(
            "xs",
            Cardinality::Many,
            Descriptor::set(Descriptor::set(Descriptor::scalar("string"))),
        )]);
        assert!(matches!(
            walk(&nested, Context::result(&imports)),
            Err(DescriptorError::UnexpectedKind("set"))
        ));
    }

    #[test]
    fn sparse_object_is_unexpected() {
        let imports = Imports::new();
        let d = Descriptor::SparseObject { elements: vec![] };
        let err = walk(&d, Context::args(&imports)).unwrap_err();
        assert!(err.to_string().contains("sparse_object"));
    }

    #[test]
    fn named_tuple_fields_are_single() {
        let imports = Imports::new();
        let d = Descriptor::NamedTuple {
            elements: vec![
                NamedElement { name: "a".into(), ty: Descriptor::scalar("number") },
                NamedElement { name: "b".into(), ty: Descriptor::scalar("string") },
            ],
        };
        assert_eq!(
            walk_str(&d, Context::result(&imports)),
            "{\n  \"a\": number;\n  \"b\": string;\n}"
        );
    }

    #[test]
    fn named_tuple_args_are_readonly_without_optional_keys() {
        let imports = Imports::new();
        let d = Descriptor::NamedTuple {
            elements: vec![
                NamedElement { name: "a".into(), ty: Descriptor::scalar("number") },
                NamedElement { name: "b".into(), ty: Descriptor::scalar("string") },
            ],
        };
        let sig = walk(&d, Context::args(&imports)).unwrap();
        let Sig::Object { fields, readonly, .. } = &sig else { panic!("expected object") };
        assert!(*readonly);
        assert!(fields.iter().all(|f| !f.optional));
        let s = render(&sig);
        assert_eq!(s, "Readonly<{\n  \"a\": number;\n  \"b\": string;\n}>");
        assert!(!s.contains('?'));
    }

    #[test]
    fn readonly_array_and_tuple() {
        let imports = Imports::new();
        let arr = Descriptor::array(Descriptor::scalar("number"));
        assert_eq!(walk_str(&arr, Context::args(&imports)), "readonly number[]");
        assert_eq!(walk_str(&arr, Context::result(&imports)), "number[]");

        let tup = Descriptor::Tuple { elements: vec![Descriptor::scalar("number"), Descriptor::Null] };
        assert_eq!(walk_str(&tup, Context::args(&imports)), "readonly [number, null]");
    }

    #[test]
    fn readonly_containers_nested_in_arrays_are_parenthesized() {
        let imports = Imports::new();
        let pairs = Descriptor::object([(
            "pairs",
            Cardinality::One,
            Descriptor::array(Descriptor::Tuple {
                elements: vec![Descriptor::scalar("number"), Descriptor::scalar("string")],
            }),
        )]);
        let s = walk_str(&pairs, Context::args(&imports));
        assert!(!s.contains("readonly readonly"), "{s}");
        assert_eq!(s, "Readonly<{\n  \"pairs\": readonly (readonly [number, string])[];\n}>");

        let grid = Descriptor::array(Descriptor::array(Descriptor::scalar("number")));
        assert_eq!(walk_str(&grid, Context::args(&imports)), "readonly (readonly number[])[]");
        // mutable containers need no grouping
        assert_eq!(walk_str(&grid, Context::result(&imports)), "number[][]");
    }

    #[test]
    fn nested_records_indent_by_depth() {
        let imports = Imports::new();
        let d = Descriptor::object([(
            "owner",
            Cardinality::One,
            Descriptor::object([("name", Cardinality::One, Descriptor::scalar("string"))]),
        )]);
        assert_eq!(
            walk_str(&d, Context::result(&imports)),
            "{\n  \"owner\": {\n    \"name\": string;\n  };\n}"
        );
    }

    #[test]
    fn ranges_register_their_wrapper() {
        let imports = Imports::new();
        let d = Descriptor::Tuple {
            elements: vec![
                Descriptor::range(Descriptor::scalar("number")),
                Descriptor::multi_range(Descriptor::imported_scalar("LocalDate")),
            ],
        };
        assert_eq!(
            walk_str(&d, Context::result(&imports)),
            "[Range<number>, MultiRange<LocalDate>]"
        );
        let set = imports.into_set();
        assert_eq!(
            set.into_iter().collect::<Vec<_>>(),
            vec!["LocalDate".to_string(), "MultiRange".to_string(), "Range".to_string()]
        );
    }

    #[test]
    fn range_over_object_is_fatal() {
        let imports = Imports::new();
        let d = Descriptor::range(Descriptor::object([("x", Cardinality::One, Descriptor::scalar("number"))]));
        let err = walk(&d, Context::result(&imports)).unwrap_err();
        assert!(matches!(err, DescriptorError::NonScalarRange { range: "Range", found: "object" }));
        assert!(err.to_string().contains("expected range subtype to be scalar"));
        // nothing recorded on failure
        assert!(!imports.contains("Range"));
    }

    #[test]
    fn multi_range_over_non_scalar_is_fatal() {
        let imports = Imports::new();
        let over_object =
            Descriptor::multi_range(Descriptor::object([("x", Cardinality::One, Descriptor::scalar("number"))]));
        let err = walk(&over_object, Context::result(&imports)).unwrap_err();
        assert!(matches!(err, DescriptorError::NonScalarRange { range: "MultiRange", found: "object" }));
        assert!(err.to_string().contains("expected range subtype to be scalar"));

        let over_tuple = Descriptor::multi_range(Descriptor::Tuple { elements: vec![Descriptor::scalar("number")] });
        assert!(matches!(
            walk(&over_tuple, Context::args(&imports)),
            Err(DescriptorError::NonScalarRange { range: "MultiRange", found: "tuple" })
        ));
        assert!(!imports.contains("MultiRange"));
        assert!(imports.is_empty());
    }
}
