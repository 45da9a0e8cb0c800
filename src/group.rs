//! The layer group tree (§9 "Group-tree construction", §4.7 `group_name`).
//!
//! An arena `Vec<GroupNode>` with node `0` as a synthetic root no real
//! layer occupies. Layers are processed in file order: a layer with no
//! `ITEM_PATH` becomes a new root-level child; a layer with one walks its
//! path's ancestor components (erroring if an ancestor hasn't been built
//! yet) and occupies the slot named by the path's last component, padding
//! sibling slots with placeholders as needed so indices don't have to
//! arrive contiguously.

use crate::error::{Error, Result, ValidationKind};
use crate::validate::{check_item_path, ParseOptions};

pub const ROOT: usize = 0;

#[derive(Debug, Clone)]
pub struct GroupNode {
    /// `None` for the synthetic root and for padding placeholders whose
    /// real layer hasn't been encountered yet.
    pub name: Option<String>,
    pub layer_index: Option<usize>,
    pub children: Vec<usize>,
}

impl GroupNode {
    fn placeholder() -> Self {
        Self { name: None, layer_index: None, children: Vec::new() }
    }
}

/// One entry per layer, in file order: its name and its `ITEM_PATH`
/// property payload, if it had one.
pub struct GroupInput<'a> {
    pub name: &'a str,
    pub item_path: Option<&'a [u32]>,
}

pub fn build_group_tree(layers: &[GroupInput<'_>], opts: &ParseOptions) -> Result<Vec<GroupNode>> {
    let mut nodes = vec![GroupNode::placeholder()];

    for (layer_index, layer) in layers.iter().enumerate() {
        match layer.item_path {
            None => {
                let node_idx = nodes.len();
                nodes.push(GroupNode { name: Some(layer.name.to_string()), layer_index: Some(layer_index), children: Vec::new() });
                nodes[ROOT].children.push(node_idx);
            }
            Some(path) => {
                check_item_path(path, opts)?;
                let parent = walk_ancestors(&nodes, path)?;
                let slot = *path.last().unwrap_or(&0) as usize;
                let node_idx = ensure_child(&mut nodes, parent, slot);
                nodes[node_idx].name = Some(layer.name.to_string());
                nodes[node_idx].layer_index = Some(layer_index);
            }
        }
    }

    Ok(nodes)
}

/// Walks every component of `path` except the last, returning the node
/// index of the immediate parent. Errors if any ancestor slot hasn't had
/// its real layer assigned yet (it references a group encountered later
/// in the file, per §5's ordering guarantee).
fn walk_ancestors(nodes: &[GroupNode], path: &[u32]) -> Result<usize> {
    let mut parent = ROOT;
    for &idx in &path[..path.len().saturating_sub(1)] {
        let child = nodes[parent].children.get(idx as usize).copied();
        match child {
            Some(node_idx) if nodes[node_idx].layer_index.is_some() => parent = node_idx,
            _ => {
                return Err(Error::validation(
                    ValidationKind::GroupPath,
                    format!("item path references ancestor slot {idx} that has no group yet"),
                ))
            }
        }
    }
    Ok(parent)
}

fn ensure_child(nodes: &mut Vec<GroupNode>, parent: usize, slot: usize) -> usize {
    while nodes[parent].children.len() <= slot {
        let placeholder_idx = nodes.len();
        nodes.push(GroupNode::placeholder());
        nodes[parent].children.push(placeholder_idx);
    }
    nodes[parent].children[slot]
}

/// The "/"-joined names of every ancestor `item_path` walks through,
/// excluding the layer itself — i.e. `Layer.group_name`.
pub fn ancestor_path(nodes: &[GroupNode], path: &[u32]) -> String {
    let mut names = Vec::new();
    let mut parent = ROOT;

    for &idx in &path[..path.len().saturating_sub(1)] {
        let Some(&node_idx) = nodes[parent].children.get(idx as usize) else { break };
        if let Some(name) = &nodes[node_idx].name {
            names.push(name.clone());
        }
        parent = node_idx;
    }

    names.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> ParseOptions {
        ParseOptions::default()
    }

    #[test]
    fn layers_without_path_become_root_children_in_order() {
        let layers =
            vec![GroupInput { name: "a", item_path: None }, GroupInput { name: "b", item_path: None }];
        let nodes = build_group_tree(&layers, &opts()).unwrap();
        let names: Vec<_> = nodes[ROOT].children.iter().map(|&i| nodes[i].name.clone().unwrap()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn nested_layer_resolves_through_its_group() {
        let layers = vec![
            GroupInput { name: "Group", item_path: Some(&[0]) },
            GroupInput { name: "Child", item_path: Some(&[0, 0]) },
        ];
        let nodes = build_group_tree(&layers, &opts()).unwrap();

        let group_idx = nodes[ROOT].children[0];
        assert_eq!(nodes[group_idx].name.as_deref(), Some("Group"));
        let child_idx = nodes[group_idx].children[0];
        assert_eq!(nodes[child_idx].name.as_deref(), Some("Child"));
    }

    #[test]
    fn forward_reference_to_a_group_is_an_error() {
        // "Child" claims to live inside group slot 0, but no group has
        // been placed there yet.
        let layers = vec![GroupInput { name: "Child", item_path: Some(&[0, 0]) }];
        let err = build_group_tree(&layers, &opts()).unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationKind::GroupPath, _)));
    }

    #[test]
    fn non_contiguous_sibling_indices_pad_with_placeholders() {
        let layers = vec![
            GroupInput { name: "Group", item_path: Some(&[0]) },
            GroupInput { name: "Third", item_path: Some(&[0, 2]) },
            GroupInput { name: "First", item_path: Some(&[0, 0]) },
        ];
        let nodes = build_group_tree(&layers, &opts()).unwrap();
        let group_idx = nodes[ROOT].children[0];
        assert_eq!(nodes[group_idx].children.len(), 3);
        assert_eq!(nodes[nodes[group_idx].children[2]].name.as_deref(), Some("Third"));
        assert_eq!(nodes[nodes[group_idx].children[0]].name.as_deref(), Some("First"));
        assert_eq!(nodes[nodes[group_idx].children[1]].name, None);
    }

    #[test]
    fn ancestor_path_joins_group_names() {
        let layers = vec![
            GroupInput { name: "Outer", item_path: Some(&[0]) },
            GroupInput { name: "Inner", item_path: Some(&[0, 0]) },
            GroupInput { name: "Leaf", item_path: Some(&[0, 0, 0]) },
        ];
        let nodes = build_group_tree(&layers, &opts()).unwrap();
        assert_eq!(ancestor_path(&nodes, &[0, 0, 0]), "Outer/Inner");
    }
}
