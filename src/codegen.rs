//! Rendering of the signature IR as TypeScript, plus whole-module emission
//! for analyzed queries.
use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::analyze::QueryType;
use crate::error::Error;
use crate::ir::{Field, Sig};

const INDENT: &str = "  ";

// ————————————————————————————————————————————————————————————————————————————
// SIGNATURES
// ————————————————————————————————————————————————————————————————————————————

/// Render a signature as TypeScript type syntax.
pub fn render(sig: &Sig) -> String {
    let mut out = String::new();
    render_into(&mut out, sig);
    out
}

fn render_into(out: &mut String, sig: &Sig) {
    match sig {
        Sig::Null => out.push_str("null"),
        Sig::Named(name) => out.push_str(name),
        Sig::Literals(values) => {
            out.push('(');
            for (i, v) in values.iter().enumerate() {
                if i > 0 { out.push_str(" | "); }
                out.push_str(&quote(v));
            }
            out.push(')');
        }
        Sig::Object { fields, depth, readonly } => {
            if *readonly { out.push_str("Readonly<"); }
            render_record(out, fields, *depth);
            if *readonly { out.push('>'); }
        }
        Sig::Array { item, readonly } => {
            if *readonly { out.push_str("readonly "); }
            render_postfix_operand(out, item);
            out.push_str("[]");
        }
        Sig::Tuple { items, readonly } => {
            if *readonly { out.push_str("readonly "); }
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 { out.push_str(", "); }
                render_into(out, item);
            }
            out.push(']');
        }
        Sig::Nullable(inner) => {
            render_into(out, inner);
            out.push_str(" | null");
        }
        Sig::NonEmpty(inner) => {
            let inner = render(inner);
            out.push_str(&format!("[({inner}), ...({inner})[]]"));
        }
        Sig::Generic { name, args } => {
            out.push_str(name);
            out.push('<');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 { out.push_str(", "); }
                render_into(out, arg);
            }
            out.push('>');
        }
    }
}

fn render_record(out: &mut String, fields: &[Field], depth: usize) {
    if fields.is_empty() {
        out.push_str("{}");
        return;
    }
    let pad = INDENT.repeat(depth);
    out.push_str("{\n");
    for field in fields {
        out.push_str(&pad);
        out.push_str(INDENT);
        out.push_str(&quote(&field.name));
        if field.optional { out.push('?'); }
        out.push_str(": ");
        render_into(out, &field.ty);
        out.push_str(";\n");
    }
    out.push_str(&pad);
    out.push('}');
}

// `T | null` and `readonly T` bind looser than `[]`
fn render_postfix_operand(out: &mut String, sig: &Sig) {
    if sig.needs_parens_before_postfix() {
        out.push('(');
        render_into(out, sig);
        out.push(')');
    } else {
        render_into(out, sig);
    }
}

/// JSON string quoting, which is also a valid TypeScript string literal.
fn quote(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}

// ————————————————————————————————————————————————————————————————————————————
// MODULES
// ————————————————————————————————————————————————————————————————————————————

static IDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("static regex"));
static WORD_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9]+").expect("static regex"));

/// Emits a TypeScript module declaring the argument and result types of one
/// or more analyzed queries.
pub struct Codegen {
    import_source: String,
    imports: BTreeSet<String>,
    body: String,
}

impl Codegen {
    pub fn new() -> Self {
        Self::with_import_source("edgedb")
    }

    pub fn with_import_source(import_source: impl Into<String>) -> Self {
        Self {
            import_source: import_source.into(),
            imports: BTreeSet::new(),
            body: String::new(),
        }
    }

    /// Emit declarations for `query` under the base name derived from `name`
    /// (a file stem such as `get_user` or `get-user`).
    pub fn emit(&mut self, query: &QueryType, name: &str) -> Result<(), Error> {
        let type_name = pascal_case(name)?;
        let const_name = lower_first(&type_name);

        self.imports.extend(query.imports.iter().cloned());

        if !self.body.is_empty() { self.body.push('\n'); }
        self.body.push_str(&format!("// cardinality: {}\n", query.cardinality));
        self.body.push_str(&format!("export const {const_name}Query = {};\n\n", quote(&query.query)));
        self.body.push_str(&format!("export type {type_name}Args = {};\n\n", query.args_type));
        self.body.push_str(&format!("export type {type_name}Returns = {};\n", query.result_type));
        Ok(())
    }

    pub fn into_string(self) -> String {
        let mut out = String::from("// GENERATED by query-sig. Do not edit.\n\n");
        if !self.imports.is_empty() {
            let names = self.imports.into_iter().collect::<Vec<_>>().join(", ");
            out.push_str(&format!("import type {{ {names} }} from {};\n\n", quote(&self.import_source)));
        }
        out.push_str(&self.body);
        out
    }
}

impl Default for Codegen {
    fn default() -> Self {
        Self::new()
    }
}

fn pascal_case(name: &str) -> Result<String, Error> {
    let mut out = String::new();
    for word in WORD_SPLIT.split(name).filter(|w| !w.is_empty()) {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    if IDENT.is_match(&out) {
        Ok(out)
    } else {
        Err(Error::InvalidQueryName(name.to_string()))
    }
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ------------------------------- Tests ------------------------------------ //
