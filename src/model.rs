use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::format;

/// Member access level, shown as a single leading glyph (`+ - # ~`).
/// Unrecognized tokens are carried through and rendered as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Visibility {
    Public,
    Private,
    Protected,
    Package,
    Other(String),
}

impl Visibility {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::Protected => "protected",
            Self::Package => "package",
            Self::Other(token) => token,
        }
    }

    pub fn symbol(&self) -> &str {
        format::visibility_symbol(self.as_str())
    }
}

impl Default for Visibility {
    // Records without an access level are treated as public.
    fn default() -> Self {
        Self::Public
    }
}

impl From<String> for Visibility {
    fn from(token: String) -> Self {
        match token.as_str() {
            "public" => Self::Public,
            "private" => Self::Private,
            "protected" => Self::Protected,
            "package" => Self::Package,
            _ => Self::Other(token),
        }
    }
}

impl From<Visibility> for String {
    fn from(visibility: Visibility) -> Self {
        visibility.as_str().to_string()
    }
}

/// Static ("class") vs. instance member. Static members render underlined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MemberScope {
    #[default]
    Instance,
    Class,
}

impl MemberScope {
    /// Any token starting with 'c' ("class", "classifier") means static.
    pub fn from_token(token: &str) -> Self {
        if format::is_static(Some(token)) {
            Self::Class
        } else {
            Self::Instance
        }
    }

    pub fn is_static(self) -> bool {
        matches!(self, Self::Class)
    }
}

impl From<String> for MemberScope {
    fn from(token: String) -> Self {
        Self::from_token(&token)
    }
}

impl From<MemberScope> for String {
    fn from(scope: MemberScope) -> Self {
        match scope {
            MemberScope::Instance => "instance".to_string(),
            MemberScope::Class => "class".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub param_type: Option<String>,
}

/// A property or method row inside a class box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub scope: MemberScope,
    /// Property type, or method return type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub member_type: Option<String>,
    /// Properties only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Methods only; parameter types are kept but never rendered.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
}

impl Member {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            visibility: Visibility::default(),
            scope: MemberScope::default(),
            member_type: None,
            default: None,
            parameters: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassNode {
    /// Stable identifier links refer to. Unique across the model.
    pub key: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Member>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<Member>,
}

impl ClassNode {
    pub fn new(key: i64, name: &str) -> Self {
        Self {
            key,
            name: name.to_string(),
            properties: Vec::new(),
            methods: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Relationship {
    Generalization,
    Aggregation,
    Other(String),
}

impl Relationship {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Generalization => "generalization",
            Self::Aggregation => "aggregation",
            Self::Other(token) => token,
        }
    }

    /// Generalization links define the hierarchy handed to the tree layout;
    /// everything else is positioned by the fallback arrangement.
    pub fn is_tree_edge(&self) -> bool {
        format::is_tree_edge(self.as_str())
    }

    pub fn arrow_head(&self) -> format::ArrowHead {
        format::arrow_head_for(self.as_str())
    }
}

impl From<String> for Relationship {
    fn from(token: String) -> Self {
        match token.as_str() {
            "generalization" => Self::Generalization,
            "aggregation" => Self::Aggregation,
            _ => Self::Other(token),
        }
    }
}

impl From<Relationship> for String {
    fn from(relationship: Relationship) -> Self {
        relationship.as_str().to_string()
    }
}

/// Directed link between two class keys. For generalization the direction is
/// child -> parent; the arrowhead sits at the `to` end only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipLink {
    pub from: i64,
    pub to: i64,
    pub relationship: Relationship,
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown class key {0}")]
    UnknownKey(i64),
    #[error("duplicate class key {0}")]
    DuplicateKey(i64),
    #[error("link {from} -> {to} references missing class key {missing}")]
    DanglingLink { from: i64, to: i64, missing: i64 },
    #[error("class {key} has no {section} at index {index}")]
    MemberIndex {
        key: i64,
        section: &'static str,
        index: usize,
    },
    #[error("model parse failed: {0}")]
    Parse(#[from] json5::Error),
}

/// Addresses the editable fields of a class record for [`ClassModel::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    ClassName,
    PropertyName(usize),
    PropertyType(usize),
    MethodName(usize),
    MethodType(usize),
}

/// The whole diagram model: built once, rendered as-is. The only mutation
/// path after construction is [`ClassModel::update`], which stands in for
/// the interactive write-back edits of the original diagram widget.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassModel {
    #[serde(rename = "nodeDataArray", default)]
    pub nodes: Vec<ClassNode>,
    #[serde(rename = "linkDataArray", default)]
    pub links: Vec<RelationshipLink>,
}

impl ClassModel {
    /// Parses a model file. json5 keeps hand-authored files close to the
    /// object-literal form the data originally shipped in (unquoted keys,
    /// trailing commas).
    pub fn from_json5(input: &str) -> Result<Self, ModelError> {
        Ok(json5::from_str(input)?)
    }

    pub fn node(&self, key: i64) -> Option<&ClassNode> {
        self.nodes.iter().find(|node| node.key == key)
    }

    pub fn node_mut(&mut self, key: i64) -> Option<&mut ClassNode> {
        self.nodes.iter_mut().find(|node| node.key == key)
    }

    /// Checks key uniqueness and that every link endpoint resolves. Layout
    /// and rendering never require this to pass; they skip what they cannot
    /// resolve. This is the strict check for the input boundary.
    pub fn validate(&self) -> Result<(), ModelError> {
        let mut keys = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if !keys.insert(node.key) {
                return Err(ModelError::DuplicateKey(node.key));
            }
        }
        for link in &self.links {
            for end in [link.from, link.to] {
                if !keys.contains(&end) {
                    return Err(ModelError::DanglingLink {
                        from: link.from,
                        to: link.to,
                        missing: end,
                    });
                }
            }
        }
        Ok(())
    }

    /// Writes an edited string back into the addressed record, mirroring
    /// what a rename or type edit in an interactive surface would do.
    /// An empty value clears optional type fields.
    pub fn update(&mut self, key: i64, field: Field, value: &str) -> Result<(), ModelError> {
        let node = self.node_mut(key).ok_or(ModelError::UnknownKey(key))?;
        match field {
            Field::ClassName => node.name = value.to_string(),
            Field::PropertyName(index) => {
                member_at(&mut node.properties, key, "property", index)?.name = value.to_string();
            }
            Field::PropertyType(index) => {
                member_at(&mut node.properties, key, "property", index)?.member_type =
                    non_empty(value);
            }
            Field::MethodName(index) => {
                member_at(&mut node.methods, key, "method", index)?.name = value.to_string();
            }
            Field::MethodType(index) => {
                member_at(&mut node.methods, key, "method", index)?.member_type = non_empty(value);
            }
        }
        Ok(())
    }

    /// The built-in demo model: a micro-game framework with three
    /// generalization hierarchies (game, factory, screen).
    pub fn sample() -> Self {
        let mut micro_game = ClassNode::new(1, "MicroGame");
        micro_game.methods = vec![
            method(
                "configureDifficultyParameters",
                Visibility::Protected,
                &[("difficulty", Some("float"))],
            ),
            method("onStart", Visibility::Protected, &[]),
            method("onEnd", Visibility::Protected, &[]),
            method("onGamePaused", Visibility::Protected, &[]),
            method("onHandlePlayingInput", Visibility::Public, &[]),
            method("onUpdate", Visibility::Public, &[("dt", Some("float"))]),
            method("onDrawGame", Visibility::Public, &[]),
        ];

        let mut factory = ClassNode::new(2, "MicroGameFactory");
        factory.methods = vec![
            method(
                "createMicroGame",
                Visibility::Public,
                &[
                    ("screen", None),
                    ("observer", None),
                    ("difficulty", Some("float")),
                ],
            ),
            method("getAssetsToPreload", Visibility::Public, &[]),
        ];

        let mut base_screen = ClassNode::new(3, "BaseScreen");
        base_screen.methods = vec![
            method("appear", Visibility::Public, &[]),
            method("assetsLoaded", Visibility::Protected, &[]),
            method("cleanUp", Visibility::Public, &[]),
            method("handleInput", Visibility::Public, &[]),
            method("update", Visibility::Public, &[("dt", None)]),
            method("draw", Visibility::Public, &[]),
        ];

        let nodes = vec![
            micro_game,
            ClassNode::new(11, "PrimeiroMicroGame"),
            ClassNode::new(12, "SegundoMicroGame"),
            factory,
            ClassNode::new(21, "PrimeiroMicroGameFactory"),
            ClassNode::new(22, "SegundoMicroGameFactory"),
            base_screen,
            ClassNode::new(31, "SplashScreen"),
            ClassNode::new(32, "MenuScreen"),
            ClassNode::new(33, "GameScreen"),
        ];

        let links = [(11, 1), (12, 1), (21, 2), (22, 2), (31, 3), (32, 3), (33, 3)]
            .into_iter()
            .map(|(from, to)| RelationshipLink {
                from,
                to,
                relationship: Relationship::Generalization,
            })
            .collect();

        Self { nodes, links }
    }
}

fn member_at<'a>(
    members: &'a mut [Member],
    key: i64,
    section: &'static str,
    index: usize,
) -> Result<&'a mut Member, ModelError> {
    members
        .get_mut(index)
        .ok_or(ModelError::MemberIndex { key, section, index })
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn method(name: &str, visibility: Visibility, parameters: &[(&str, Option<&str>)]) -> Member {
    let mut member = Member::named(name);
    member.visibility = visibility;
    member.parameters = parameters
        .iter()
        .map(|(param_name, param_type)| Parameter {
            name: param_name.to_string(),
            param_type: param_type.map(str::to_string),
        })
        .collect();
    member
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_model_is_consistent() {
        let model = ClassModel::sample();
        assert_eq!(model.nodes.len(), 10);
        assert_eq!(model.links.len(), 7);
        model.validate().expect("sample must validate");
        assert!(model.links.iter().all(|link| link.relationship.is_tree_edge()));
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let mut model = ClassModel::sample();
        model.nodes.push(ClassNode::new(1, "Impostor"));
        assert!(matches!(model.validate(), Err(ModelError::DuplicateKey(1))));
    }

    #[test]
    fn dangling_link_is_reported() {
        let mut model = ClassModel::sample();
        model.links.push(RelationshipLink {
            from: 11,
            to: 99,
            relationship: Relationship::Aggregation,
        });
        match model.validate() {
            Err(ModelError::DanglingLink { missing, .. }) => assert_eq!(missing, 99),
            other => panic!("expected dangling link error, got {other:?}"),
        }
    }

    #[test]
    fn parses_object_literal_style_input() {
        let model = ClassModel::from_json5(
            r#"{
              nodeDataArray: [
                { key: 1, name: "Base", methods: [{ name: "run", visibility: "public" }] },
                { key: 2, name: "Derived", properties: [{ name: "count", type: "int", default: "0" }] },
              ],
              linkDataArray: [
                { from: 2, to: 1, relationship: "generalization" },
              ],
            }"#,
        )
        .expect("json5 parse");
        assert_eq!(model.nodes.len(), 2);
        assert_eq!(model.links.len(), 1);
        assert_eq!(model.nodes[1].properties[0].default.as_deref(), Some("0"));
        model.validate().expect("valid");
    }

    #[test]
    fn omitted_visibility_and_scope_get_defaults() {
        let model = ClassModel::from_json5(
            r#"{ nodeDataArray: [{ key: 1, name: "A", properties: [{ name: "x" }] }] }"#,
        )
        .unwrap();
        let member = &model.nodes[0].properties[0];
        assert_eq!(member.visibility, Visibility::Public);
        assert_eq!(member.scope, MemberScope::Instance);
    }

    #[test]
    fn unknown_visibility_is_carried_through() {
        let visibility = Visibility::from("friend".to_string());
        assert_eq!(visibility, Visibility::Other("friend".to_string()));
        assert_eq!(visibility.symbol(), "friend");
    }

    #[test]
    fn scope_token_first_char_decides_static() {
        assert_eq!(MemberScope::from_token("class"), MemberScope::Class);
        assert_eq!(MemberScope::from_token("classifier"), MemberScope::Class);
        assert_eq!(MemberScope::from_token("instance"), MemberScope::Instance);
    }

    #[test]
    fn update_writes_back_into_records() {
        let mut model = ClassModel::sample();
        model.update(1, Field::ClassName, "MicroGameBase").unwrap();
        assert_eq!(model.node(1).unwrap().name, "MicroGameBase");

        model.update(1, Field::MethodName(0), "configure").unwrap();
        assert_eq!(model.node(1).unwrap().methods[0].name, "configure");

        model.update(1, Field::MethodType(1), "void").unwrap();
        assert_eq!(
            model.node(1).unwrap().methods[1].member_type.as_deref(),
            Some("void")
        );

        // Clearing a type writes None, not an empty string.
        model.update(1, Field::MethodType(1), "").unwrap();
        assert_eq!(model.node(1).unwrap().methods[1].member_type, None);
    }

    #[test]
    fn update_rejects_bad_addresses() {
        let mut model = ClassModel::sample();
        assert!(matches!(
            model.update(99, Field::ClassName, "X"),
            Err(ModelError::UnknownKey(99))
        ));
        assert!(matches!(
            model.update(11, Field::PropertyName(0), "X"),
            Err(ModelError::MemberIndex { key: 11, .. })
        ));
    }
}
