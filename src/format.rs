//! Pure text/formatting rules for class boxes and relationship links.
//!
//! Every function here is total: unrecognized tokens pass through or map to
//! a neutral value instead of failing, so malformed records degrade to a
//! plain rendering rather than an error.

use crate::model::{Member, Parameter};

/// Single leading glyph for a member's access level. Unknown tokens are
/// returned unchanged.
pub fn visibility_symbol(visibility: &str) -> &str {
    match visibility {
        "public" => "+",
        "private" => "-",
        "protected" => "#",
        "package" => "~",
        other => other,
    }
}

/// True iff the scope token starts with 'c' ("class", "classifier").
/// Absent or empty scope means an instance member.
pub fn is_static(scope: Option<&str>) -> bool {
    scope.is_some_and(|token| token.starts_with('c'))
}

/// `(a, b)` from the parameter names; types are intentionally omitted.
pub fn method_signature(parameters: &[Parameter]) -> String {
    let mut signature = String::from("(");
    for (index, parameter) in parameters.iter().enumerate() {
        if index > 0 {
            signature.push_str(", ");
        }
        signature.push_str(&parameter.name);
    }
    signature.push(')');
    signature
}

/// The `": "` separator shown before a type, or nothing when there is none.
pub fn type_annotation(member_type: Option<&str>) -> &'static str {
    match member_type {
        Some(t) if !t.is_empty() => ": ",
        _ => "",
    }
}

/// `" = 0"` for a property default, or nothing.
pub fn default_value(default: Option<&str>) -> String {
    match default {
        Some(value) if !value.is_empty() => format!(" = {value}"),
        _ => String::new(),
    }
}

/// Generalization links define the hierarchy the tree layout positions;
/// all other links are routed around whatever the layout produced.
pub fn is_tree_edge(relationship: &str) -> bool {
    relationship == "generalization"
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowHead {
    None,
    Triangle,
    StretchedDiamond,
}

/// Arrowhead at the `to` end of a link. The `from` end never carries one.
pub fn arrow_head_for(relationship: &str) -> ArrowHead {
    match relationship {
        "generalization" => ArrowHead::Triangle,
        "aggregation" => ArrowHead::StretchedDiamond,
        _ => ArrowHead::None,
    }
}

/// One rendered member row, split into the segments the renderer needs:
/// the glyph column, the (possibly underlined) name, and the trailing
/// signature/type/default text.
#[derive(Debug, Clone)]
pub struct MemberLabel {
    pub prefix: String,
    pub name: String,
    pub suffix: String,
    /// Static members are drawn with the name underlined.
    pub underline: bool,
}

impl MemberLabel {
    pub fn text(&self) -> String {
        format!("{}{}{}", self.prefix, self.name, self.suffix)
    }
}

/// `-count: int = 0`
pub fn property_label(member: &Member) -> MemberLabel {
    let member_type = member.member_type.as_deref();
    let mut suffix = String::new();
    suffix.push_str(type_annotation(member_type));
    suffix.push_str(member_type.unwrap_or(""));
    suffix.push_str(&default_value(member.default.as_deref()));
    MemberLabel {
        prefix: member.visibility.symbol().to_string(),
        name: member.name.clone(),
        suffix,
        underline: member.scope.is_static(),
    }
}

/// `+onUpdate(dt): float`
pub fn method_label(member: &Member) -> MemberLabel {
    let member_type = member.member_type.as_deref();
    let mut suffix = method_signature(&member.parameters);
    suffix.push_str(type_annotation(member_type));
    suffix.push_str(member_type.unwrap_or(""));
    MemberLabel {
        prefix: member.visibility.symbol().to_string(),
        name: member.name.clone(),
        suffix,
        underline: member.scope.is_static(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MemberScope, Visibility};

    fn parameter(name: &str) -> Parameter {
        Parameter {
            name: name.to_string(),
            param_type: None,
        }
    }

    #[test]
    fn visibility_glyphs() {
        assert_eq!(visibility_symbol("public"), "+");
        assert_eq!(visibility_symbol("private"), "-");
        assert_eq!(visibility_symbol("protected"), "#");
        assert_eq!(visibility_symbol("package"), "~");
        assert_eq!(visibility_symbol("x"), "x");
    }

    #[test]
    fn static_scope_first_char() {
        assert!(is_static(Some("class")));
        assert!(is_static(Some("classifier")));
        assert!(!is_static(Some("instance")));
        assert!(!is_static(Some("")));
        assert!(!is_static(None));
    }

    #[test]
    fn signatures_join_parameter_names() {
        assert_eq!(method_signature(&[]), "()");
        assert_eq!(method_signature(&[parameter("dt")]), "(dt)");
        assert_eq!(
            method_signature(&[parameter("a"), parameter("b")]),
            "(a, b)"
        );
    }

    #[test]
    fn signatures_ignore_parameter_types() {
        let typed = Parameter {
            name: "difficulty".to_string(),
            param_type: Some("float".to_string()),
        };
        assert_eq!(method_signature(&[typed]), "(difficulty)");
    }

    #[test]
    fn type_annotation_only_when_present() {
        assert_eq!(type_annotation(None), "");
        assert_eq!(type_annotation(Some("")), "");
        assert_eq!(type_annotation(Some("float")), ": ");
    }

    #[test]
    fn default_value_only_when_present() {
        assert_eq!(default_value(None), "");
        assert_eq!(default_value(Some("")), "");
        assert_eq!(default_value(Some("0")), " = 0");
    }

    #[test]
    fn tree_edges_are_generalization_only() {
        assert!(is_tree_edge("generalization"));
        assert!(!is_tree_edge("aggregation"));
        assert!(!is_tree_edge("other"));
    }

    #[test]
    fn arrow_heads_by_relationship() {
        assert_eq!(arrow_head_for("generalization"), ArrowHead::Triangle);
        assert_eq!(arrow_head_for("aggregation"), ArrowHead::StretchedDiamond);
        assert_eq!(arrow_head_for("foo"), ArrowHead::None);
    }

    #[test]
    fn property_label_concatenates_segments() {
        let mut member = Member::named("count");
        member.visibility = Visibility::Private;
        member.member_type = Some("int".to_string());
        member.default = Some("0".to_string());
        let label = property_label(&member);
        assert_eq!(label.text(), "-count: int = 0");
        assert!(!label.underline);
    }

    #[test]
    fn method_label_underlines_static_members() {
        let mut member = Member::named("instances");
        member.scope = MemberScope::Class;
        member.member_type = Some("int".to_string());
        let label = method_label(&member);
        assert_eq!(label.text(), "+instances(): int");
        assert!(label.underline);
    }
}
