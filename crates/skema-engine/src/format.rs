//! Human-readable shape rendering.
//!
//! Used by error values and tests; never by the engine's own logic, which
//! only compares shapes through the equality oracle.

use crate::intern::ShapeInterner;
use crate::types::{LiteralValue, ShapeData, ShapeId};

/// Renders shapes against the interner that owns them.
pub struct ShapeFormatter<'a> {
    interner: &'a ShapeInterner,
}

impl<'a> ShapeFormatter<'a> {
    pub fn new(interner: &'a ShapeInterner) -> Self {
        Self { interner }
    }

    pub fn format(&self, shape: ShapeId) -> String {
        let mut out = String::new();
        self.write(shape, &mut out);
        out
    }

    fn write(&self, shape: ShapeId, out: &mut String) {
        let Some(data) = self.interner.lookup(shape) else {
            out.push_str("<unknown id>");
            return;
        };
        match data {
            ShapeData::Primitive(kind) => out.push_str(kind.name()),
            ShapeData::Literal(LiteralValue::String(atom)) => {
                out.push('"');
                out.push_str(&self.interner.resolve_atom(atom));
                out.push('"');
            }
            ShapeData::Literal(LiteralValue::Number(n)) => {
                out.push_str(&n.into_inner().to_string());
            }
            ShapeData::Literal(LiteralValue::Boolean(b)) => {
                out.push_str(if b { "true" } else { "false" });
            }
            ShapeData::Array(element) => {
                let needs_parens = matches!(
                    self.interner.lookup(element),
                    Some(ShapeData::Union(_) | ShapeData::Function(..))
                );
                if needs_parens {
                    out.push('(');
                }
                self.write(element, out);
                if needs_parens {
                    out.push(')');
                }
                out.push_str("[]");
            }
            ShapeData::Tuple(list, rest) => {
                out.push('[');
                let elements = self.interner.shape_list(list);
                for (i, &element) in elements.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write(element, out);
                }
                if let Some(rest) = rest {
                    if !elements.is_empty() {
                        out.push_str(", ");
                    }
                    out.push_str("...");
                    self.write(rest, out);
                }
                out.push(']');
            }
            ShapeData::Record(record) => {
                let record = self.interner.record_shape(record);
                if record.fields.is_empty() {
                    out.push_str("{}");
                    return;
                }
                out.push_str("{ ");
                for (i, field) in record.fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str("; ");
                    }
                    if field.is_readonly() {
                        out.push_str("readonly ");
                    }
                    out.push_str(&self.interner.resolve_atom(field.name));
                    if field.is_optional() {
                        out.push('?');
                    }
                    out.push_str(": ");
                    self.write(field.shape, out);
                }
                out.push_str(" }");
            }
            ShapeData::Union(list) => {
                for (i, &member) in self.interner.shape_list(list).iter().enumerate() {
                    if i > 0 {
                        out.push_str(" | ");
                    }
                    self.write(member, out);
                }
            }
            ShapeData::Function(params, result) => {
                out.push('(');
                for (i, &param) in self.interner.shape_list(params).iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write(param, out);
                }
                out.push_str(") => ");
                self.write(result, out);
            }
            ShapeData::Ref(name) => {
                out.push_str(&self.interner.resolve_atom(name));
            }
            ShapeData::Capture(name) => {
                out.push_str("infer ");
                out.push_str(&self.interner.resolve_atom(name));
            }
            ShapeData::Never => out.push_str("never"),
            ShapeData::Unknown => out.push_str("unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldFlags, FieldInfo};

    #[test]
    fn renders_nested_shapes() {
        let interner = ShapeInterner::new();
        let id = interner.intern_string("id");
        let tags = interner.intern_string("tags");
        let record = interner
            .record(vec![
                FieldInfo::with_flags(id, ShapeId::NUMBER, FieldFlags::READONLY),
                FieldInfo::with_flags(
                    tags,
                    interner.array(ShapeId::STRING),
                    FieldFlags::OPTIONAL,
                ),
            ])
            .unwrap();
        let formatter = ShapeFormatter::new(&interner);
        assert_eq!(
            formatter.format(record),
            "{ readonly id: number; tags?: string[] }"
        );
    }

    #[test]
    fn renders_unions_and_captures() {
        let interner = ShapeInterner::new();
        let union = interner.union2(interner.literal_string("on"), ShapeId::NULL);
        let formatter = ShapeFormatter::new(&interner);
        assert_eq!(formatter.format(union), "\"on\" | null");
        assert_eq!(formatter.format(interner.capture("E")), "infer E");
        let arr = interner.array(union);
        assert_eq!(formatter.format(arr), "(\"on\" | null)[]");
    }
}
