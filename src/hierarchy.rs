//! Parent/child structure of a sheet.
//!
//! Nodes stay in the sheet's vector and are addressed by index. Every index
//! lives in exactly one list: the root list, the detached list, or the child
//! list of its parent.

use crate::ir::{GoalNode, Sheet};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Hierarchy<'a> {
    nodes: &'a [GoalNode],
    by_id: HashMap<&'a str, usize>,
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
    detached: Vec<usize>,
}

impl<'a> Hierarchy<'a> {
    pub fn build(sheet: &'a Sheet) -> Self {
        Self::from_nodes(&sheet.nodes)
    }

    pub fn from_nodes(nodes: &'a [GoalNode]) -> Self {
        let mut by_id = HashMap::with_capacity(nodes.len());
        for (idx, node) in nodes.iter().enumerate() {
            if node.id.is_empty() {
                continue;
            }
            // Later rows overwrite earlier ones with the same id.
            by_id.insert(node.id.as_str(), idx);
        }

        let mut parents = vec![None; nodes.len()];
        let mut children = vec![Vec::new(); nodes.len()];
        let mut roots = Vec::new();
        for (idx, node) in nodes.iter().enumerate() {
            let parent = if node.has_parent() {
                by_id.get(node.parent_id.as_str()).copied()
            } else {
                None
            };
            match parent {
                Some(parent) => {
                    parents[idx] = Some(parent);
                    children[parent].push(idx);
                }
                None => {
                    if node.has_parent() {
                        log::debug!(
                            "goal '{}' references unknown parent '{}', treating it as a root",
                            node.id,
                            node.parent_id
                        );
                    }
                    roots.push(idx);
                }
            }
        }

        let mut hierarchy = Self {
            nodes,
            by_id,
            parents,
            children,
            roots,
            detached: Vec::new(),
        };
        hierarchy.detached = hierarchy.find_detached();
        hierarchy
    }

    /// Nodes only reachable through a parent cycle. The first such node in
    /// input order stands in as the entry point of its cycle.
    fn find_detached(&self) -> Vec<usize> {
        let mut seen = vec![false; self.nodes.len()];
        for &root in &self.roots {
            self.mark_subtree(root, &mut seen);
        }
        let mut detached = Vec::new();
        for idx in 0..self.nodes.len() {
            if !seen[idx] {
                log::debug!("goal '{}' sits on a parent cycle", self.nodes[idx].id);
                detached.push(idx);
                self.mark_subtree(idx, &mut seen);
            }
        }
        detached
    }

    fn mark_subtree(&self, start: usize, seen: &mut [bool]) {
        let mut stack = vec![start];
        while let Some(idx) = stack.pop() {
            if seen[idx] {
                continue;
            }
            seen[idx] = true;
            stack.extend(self.children[idx].iter().copied().filter(|&c| !seen[c]));
        }
    }

    pub fn nodes(&self) -> &'a [GoalNode] {
        self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub fn get(&self, id: &str) -> Option<&'a GoalNode> {
        let nodes = self.nodes;
        self.index_of(id).map(|idx| &nodes[idx])
    }

    /// Distinct ids in the index.
    pub fn id_count(&self) -> usize {
        self.by_id.len()
    }

    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub fn detached(&self) -> &[usize] {
        &self.detached
    }

    pub fn parent_of(&self, idx: usize) -> Option<usize> {
        self.parents.get(idx).copied().flatten()
    }

    pub fn children_of_index(&self, idx: usize) -> &[usize] {
        self.children.get(idx).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn children_of(&self, id: &str) -> impl Iterator<Item = &'a GoalNode> + '_ {
        let nodes = self.nodes;
        let children: &[usize] = match self.index_of(id) {
            Some(idx) => self.children_of_index(idx),
            None => &[],
        };
        children.iter().map(move |&idx| &nodes[idx])
    }

    /// Pre-order walk over roots, then detached entries. Each index is
    /// yielded once with its depth below the entry it was reached from.
    pub fn walk(&self) -> Vec<(usize, usize)> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut seen = vec![false; self.nodes.len()];
        for &entry in self.roots.iter().chain(&self.detached) {
            let mut stack = vec![(entry, 0usize)];
            while let Some((idx, depth)) = stack.pop() {
                if seen[idx] {
                    continue;
                }
                seen[idx] = true;
                order.push((idx, depth));
                for &child in self.children[idx].iter().rev() {
                    if !seen[child] {
                        stack.push((child, depth + 1));
                    }
                }
            }
        }
        order
    }
}
