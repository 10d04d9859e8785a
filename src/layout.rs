use crate::config::LayoutConfig;
use crate::format::{self, ArrowHead, MemberLabel};
use crate::model::{ClassModel, ClassNode, RelationshipLink};
use crate::text_metrics::text_width;
use crate::theme::Theme;
use dagre_rust::{
    GraphConfig as DagreConfig, GraphEdge as DagreEdge, GraphNode as DagreNode,
    layout as dagre_layout,
};
use graphlib_rust::{Graph as DagreGraph, GraphOption};
use std::collections::{BTreeMap, HashSet};

const MIN_BOX_WIDTH: f32 = 60.0;

/// A sized and positioned class box. `x`/`y` is the top-left corner.
#[derive(Debug, Clone)]
pub struct NodeLayout {
    pub key: i64,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub header_height: f32,
    pub line_height: f32,
    pub property_lines: Vec<MemberLabel>,
    pub method_lines: Vec<MemberLabel>,
}

impl NodeLayout {
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

#[derive(Debug, Clone)]
pub struct EdgeLayout {
    pub from: i64,
    pub to: i64,
    /// Polyline ending at the `to` node's border, where the arrowhead sits.
    pub points: Vec<(f32, f32)>,
    pub arrow_head: ArrowHead,
    pub tree_edge: bool,
}

#[derive(Debug, Clone)]
pub struct Layout {
    pub nodes: BTreeMap<i64, NodeLayout>,
    pub edges: Vec<EdgeLayout>,
    pub width: f32,
    pub height: f32,
}

/// Sizes every class box, positions the generalization hierarchy with dagre
/// (child -> parent edges, parents on top), lines the remaining classes up
/// in a row below, then routes the links. Links referencing missing keys
/// are skipped.
pub fn compute_layout(model: &ClassModel, theme: &Theme, config: &LayoutConfig) -> Layout {
    let mut nodes: BTreeMap<i64, NodeLayout> = model
        .nodes
        .iter()
        .map(|node| (node.key, size_class_box(node, theme, config)))
        .collect();

    let keys: HashSet<i64> = nodes.keys().copied().collect();
    let tree_links: Vec<&RelationshipLink> = model
        .links
        .iter()
        .filter(|link| {
            link.relationship.is_tree_edge()
                && keys.contains(&link.from)
                && keys.contains(&link.to)
        })
        .collect();

    let mut attached_set: HashSet<i64> = HashSet::new();
    for link in &tree_links {
        attached_set.insert(link.from);
        attached_set.insert(link.to);
    }
    // Model order so the fallback row is stable.
    let attached: Vec<i64> = model
        .nodes
        .iter()
        .map(|node| node.key)
        .filter(|key| attached_set.contains(key))
        .collect();
    let detached: Vec<i64> = model
        .nodes
        .iter()
        .map(|node| node.key)
        .filter(|key| !attached_set.contains(key))
        .collect();

    let applied = assign_positions_dagre(&attached, &tree_links, &mut nodes, config);

    let row_keys: Vec<i64> = if applied {
        detached
    } else {
        model.nodes.iter().map(|node| node.key).collect()
    };
    if !row_keys.is_empty() {
        let row_top = if applied {
            bottom_of(&attached, &nodes) + config.detached_row_gap
        } else {
            config.margin
        };
        arrange_row(&row_keys, &mut nodes, row_top, config);
    }

    normalize_origin(&mut nodes, config.margin);

    let edges = route_edges(model, &nodes);
    let (width, height) = extents(&nodes, &edges, config.margin);

    Layout {
        nodes,
        edges,
        width,
        height,
    }
}

fn size_class_box(node: &ClassNode, theme: &Theme, config: &LayoutConfig) -> NodeLayout {
    let property_lines: Vec<MemberLabel> =
        node.properties.iter().map(format::property_label).collect();
    let method_lines: Vec<MemberLabel> = node.methods.iter().map(format::method_label).collect();

    let line_height = theme.font_size * config.label_line_height;
    let header_height = theme.header_font_size * config.label_line_height
        + 2.0 * config.node_padding_y;

    let mut content_width = text_width(&node.name, theme.header_font_size, &theme.font_family);
    for label in property_lines.iter().chain(method_lines.iter()) {
        let row_text = format!("{}{}", label.name, label.suffix);
        let row_width = config.visibility_column_width
            + text_width(&row_text, theme.font_size, &theme.font_family);
        content_width = content_width.max(row_width);
    }

    let width = (content_width + 2.0 * config.node_padding_x).max(MIN_BOX_WIDTH);
    let compartment = |lines: usize| lines as f32 * line_height + 2.0 * config.node_padding_y;
    let height = header_height + compartment(property_lines.len()) + compartment(method_lines.len());

    NodeLayout {
        key: node.key,
        name: node.name.clone(),
        x: 0.0,
        y: 0.0,
        width,
        height,
        header_height,
        line_height,
        property_lines,
        method_lines,
    }
}

fn assign_positions_dagre(
    node_keys: &[i64],
    links: &[&RelationshipLink],
    nodes: &mut BTreeMap<i64, NodeLayout>,
    config: &LayoutConfig,
) -> bool {
    if node_keys.is_empty() {
        return false;
    }

    let mut dagre_graph: DagreGraph<DagreConfig, DagreNode, DagreEdge> =
        DagreGraph::new(Some(GraphOption {
            directed: Some(true),
            multigraph: Some(false),
            compound: Some(false),
        }));

    let mut graph_config = DagreConfig::default();
    // Links run child -> parent; bottom-top ranking puts the parents at
    // the top. dagre matches the token lowercase.
    graph_config.rankdir = Some("bt".to_string());
    graph_config.nodesep = Some(config.node_spacing);
    graph_config.ranksep = Some(config.rank_spacing);
    graph_config.marginx = Some(config.margin);
    graph_config.marginy = Some(config.margin);
    dagre_graph.set_graph(graph_config);

    for key in node_keys {
        let Some(layout) = nodes.get(key) else {
            continue;
        };
        let mut node = DagreNode::default();
        node.width = layout.width;
        node.height = layout.height;
        dagre_graph.set_node(key.to_string(), Some(node));
    }

    let mut edge_set: HashSet<(i64, i64)> = HashSet::new();
    for link in links {
        if !edge_set.insert((link.from, link.to)) {
            continue;
        }
        let edge_label = DagreEdge::default();
        let _ = dagre_graph.set_edge(
            &link.from.to_string(),
            &link.to.to_string(),
            Some(edge_label),
            None,
        );
    }

    dagre_layout::run_layout(&mut dagre_graph);

    let mut applied = false;
    for key in node_keys {
        let Some(dagre_node) = dagre_graph.node(&key.to_string()) else {
            continue;
        };
        if let Some(node) = nodes.get_mut(key) {
            node.x = dagre_node.x - node.width / 2.0;
            node.y = dagre_node.y - node.height / 2.0;
            applied = true;
        }
    }

    applied
}

fn bottom_of(keys: &[i64], nodes: &BTreeMap<i64, NodeLayout>) -> f32 {
    keys.iter()
        .filter_map(|key| nodes.get(key))
        .map(|node| node.y + node.height)
        .fold(0.0f32, f32::max)
}

fn arrange_row(keys: &[i64], nodes: &mut BTreeMap<i64, NodeLayout>, top: f32, config: &LayoutConfig) {
    let mut x = config.margin;
    for key in keys {
        if let Some(node) = nodes.get_mut(key) {
            node.x = x;
            node.y = top;
            x += node.width + config.node_spacing;
        }
    }
}

fn normalize_origin(nodes: &mut BTreeMap<i64, NodeLayout>, margin: f32) {
    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    for node in nodes.values() {
        min_x = min_x.min(node.x);
        min_y = min_y.min(node.y);
    }
    if !min_x.is_finite() || !min_y.is_finite() {
        return;
    }
    let dx = margin - min_x;
    let dy = margin - min_y;
    for node in nodes.values_mut() {
        node.x += dx;
        node.y += dy;
    }
}

fn route_edges(model: &ClassModel, nodes: &BTreeMap<i64, NodeLayout>) -> Vec<EdgeLayout> {
    let mut edges = Vec::with_capacity(model.links.len());
    for link in &model.links {
        let (Some(from), Some(to)) = (nodes.get(&link.from), nodes.get(&link.to)) else {
            continue;
        };
        let tree_edge = link.relationship.is_tree_edge();
        let points = if tree_edge {
            route_orthogonal(from, to)
        } else {
            route_straight(from, to)
        };
        edges.push(EdgeLayout {
            from: link.from,
            to: link.to,
            points,
            arrow_head: link.relationship.arrow_head(),
            tree_edge,
        });
    }
    edges
}

/// Child top edge up to the parent's bottom edge, with one horizontal jog
/// halfway when the centers do not line up.
fn route_orthogonal(child: &NodeLayout, parent: &NodeLayout) -> Vec<(f32, f32)> {
    let parent_bottom = parent.y + parent.height;
    if parent_bottom > child.y {
        // Layout did not put the parent above; route like any other link.
        return route_straight(child, parent);
    }
    let (child_cx, _) = child.center();
    let (parent_cx, _) = parent.center();
    let start = (child_cx, child.y);
    let end = (parent_cx, parent_bottom);
    if (child_cx - parent_cx).abs() < 0.5 {
        return vec![start, end];
    }
    let mid_y = (child.y + parent_bottom) / 2.0;
    vec![start, (child_cx, mid_y), (parent_cx, mid_y), end]
}

fn route_straight(from: &NodeLayout, to: &NodeLayout) -> Vec<(f32, f32)> {
    let start = border_point(from, to.center());
    let end = border_point(to, from.center());
    vec![start, end]
}

/// Point where the segment from the box center toward `toward` crosses the
/// box border.
fn border_point(node: &NodeLayout, toward: (f32, f32)) -> (f32, f32) {
    let (cx, cy) = node.center();
    let dx = toward.0 - cx;
    let dy = toward.1 - cy;
    if dx == 0.0 && dy == 0.0 {
        return (cx, cy);
    }
    let tx = if dx != 0.0 {
        (node.width / 2.0) / dx.abs()
    } else {
        f32::INFINITY
    };
    let ty = if dy != 0.0 {
        (node.height / 2.0) / dy.abs()
    } else {
        f32::INFINITY
    };
    let t = tx.min(ty);
    (cx + dx * t, cy + dy * t)
}

fn extents(
    nodes: &BTreeMap<i64, NodeLayout>,
    edges: &[EdgeLayout],
    margin: f32,
) -> (f32, f32) {
    let mut max_x = 0.0f32;
    let mut max_y = 0.0f32;
    for node in nodes.values() {
        max_x = max_x.max(node.x + node.width);
        max_y = max_y.max(node.y + node.height);
    }
    for edge in edges {
        for (x, y) in &edge.points {
            max_x = max_x.max(*x);
            max_y = max_y.max(*y);
        }
    }
    (max_x + margin, max_y + margin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClassNode, Member, Relationship, RelationshipLink};

    fn layout_of(model: &ClassModel) -> Layout {
        compute_layout(model, &Theme::classic(), &LayoutConfig::default())
    }

    #[test]
    fn sample_hierarchy_positions_every_class() {
        let model = ClassModel::sample();
        let layout = layout_of(&model);
        assert_eq!(layout.nodes.len(), 10);
        assert_eq!(layout.edges.len(), 7);
        assert!(layout.edges.iter().all(|edge| edge.tree_edge));
        assert!(
            layout
                .edges
                .iter()
                .all(|edge| edge.arrow_head == ArrowHead::Triangle)
        );
        assert!(layout.width > 0.0 && layout.height > 0.0);
    }

    #[test]
    fn parents_sit_above_their_children() {
        let model = ClassModel::sample();
        let layout = layout_of(&model);
        for (child, parent) in [(11, 1), (12, 1), (21, 2), (33, 3)] {
            let child_box = &layout.nodes[&child];
            let parent_box = &layout.nodes[&parent];
            assert!(
                parent_box.y + parent_box.height <= child_box.y,
                "class {parent} should be above class {child}"
            );
        }
    }

    #[test]
    fn tree_edges_end_at_the_parent_border() {
        let model = ClassModel::sample();
        let layout = layout_of(&model);
        for edge in &layout.edges {
            let parent = &layout.nodes[&edge.to];
            let end = *edge.points.last().unwrap();
            assert!((end.1 - (parent.y + parent.height)).abs() < 0.5);
        }
    }

    #[test]
    fn classes_without_tree_links_form_a_row() {
        let mut model = ClassModel::sample();
        model.nodes.push(ClassNode::new(40, "Standalone"));
        model.nodes.push(ClassNode::new(41, "AlsoStandalone"));
        model.links.push(RelationshipLink {
            from: 40,
            to: 41,
            relationship: Relationship::Aggregation,
        });

        let layout = layout_of(&model);
        let a = &layout.nodes[&40];
        let b = &layout.nodes[&41];
        assert_eq!(a.y, b.y);
        assert!(b.x > a.x + a.width);

        let tree_bottom = layout
            .nodes
            .values()
            .filter(|node| node.key < 40)
            .map(|node| node.y + node.height)
            .fold(0.0f32, f32::max);
        assert!(a.y >= tree_bottom);

        let aggregation = layout
            .edges
            .iter()
            .find(|edge| edge.from == 40)
            .expect("aggregation edge routed");
        assert!(!aggregation.tree_edge);
        assert_eq!(aggregation.arrow_head, ArrowHead::StretchedDiamond);
        assert_eq!(aggregation.points.len(), 2);
    }

    #[test]
    fn dangling_links_are_skipped() {
        let mut model = ClassModel::sample();
        model.links.push(RelationshipLink {
            from: 11,
            to: 999,
            relationship: Relationship::Generalization,
        });
        let layout = layout_of(&model);
        assert_eq!(layout.edges.len(), 7);
    }

    #[test]
    fn unknown_relationship_renders_without_arrowhead() {
        let mut model = ClassModel::sample();
        model.links.push(RelationshipLink {
            from: 31,
            to: 32,
            relationship: Relationship::Other("association".to_string()),
        });
        let layout = layout_of(&model);
        let edge = layout.edges.last().unwrap();
        assert!(!edge.tree_edge);
        assert_eq!(edge.arrow_head, ArrowHead::None);
    }

    #[test]
    fn member_rows_widen_the_box() {
        let mut narrow = ClassNode::new(1, "A");
        narrow.methods = vec![Member::named("f")];
        let mut wide = ClassNode::new(2, "A");
        let mut long = Member::named("aVeryLongMethodNameIndeed");
        long.member_type = Some("SomeLongReturnType".to_string());
        wide.methods = vec![long];

        let theme = Theme::classic();
        let config = LayoutConfig::default();
        let narrow_box = size_class_box(&narrow, &theme, &config);
        let wide_box = size_class_box(&wide, &theme, &config);
        assert!(wide_box.width > narrow_box.width);
        assert_eq!(narrow_box.height, wide_box.height);
    }

    #[test]
    fn empty_model_yields_empty_layout() {
        let layout = layout_of(&ClassModel::default());
        assert!(layout.nodes.is_empty());
        assert!(layout.edges.is_empty());
    }
}
