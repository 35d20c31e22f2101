// Strongly-typed signature IR. Walk produces it, codegen renders it.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sig {
    Null,                    // exactly null
    Named(String),           // scalar base type or an opaque, pre-rendered type
    Literals(Vec<String>),   // enum: union of string literals, declared order
    Object {
        fields: Vec<Field>,  // declared order
        depth: usize,        // nesting level of this record, for indentation
        readonly: bool,
    },
    Array {
        item: Box<Sig>,
        readonly: bool,
    },
    Tuple {
        items: Vec<Sig>,     // exact arity, position-significant
        readonly: bool,
    },
    Nullable(Box<Sig>),      // T | null
    NonEmpty(Box<Sig>),      // one or more T
    Generic {
        name: String,        // e.g. Range, MultiRange
        args: Vec<Sig>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: Sig,
    pub optional: bool,      // key may be absent
}

impl Sig {
    pub fn named(name: impl Into<String>) -> Self {
        Sig::Named(name.into())
    }

    /// True when a postfix `[]` needs parentheses around the rendered form:
    /// a top-level `|`, or a `readonly` prefix (which only binds to a bare
    /// array or tuple type).
    pub fn needs_parens_before_postfix(&self) -> bool {
        matches!(
            self,
            Sig::Nullable(_) | Sig::Array { readonly: true, .. } | Sig::Tuple { readonly: true, .. }
        )
    }
}
