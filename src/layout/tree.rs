use super::*;

/// Positions every node of `sheet` when at least one of them is unplaced.
/// Returns whether the sheet was laid out.
///
/// Explicit coordinates elsewhere in the sheet are overwritten too: the
/// sentinel applies to the whole sheet, never to single nodes.
pub fn auto_layout(sheet: &mut Sheet, config: &LayoutConfig) -> bool {
    if !sheet.needs_layout() {
        return false;
    }
    let positions = {
        let hierarchy = Hierarchy::build(sheet);
        tree_positions(&hierarchy, config)
    };
    for (node, (x, y)) in sheet.nodes.iter_mut().zip(positions) {
        node.x = x;
        node.y = y;
    }
    log::debug!("auto-placed {} goals in '{}'", sheet.nodes.len(), sheet.name);
    true
}

/// Depth-first placement. Roots (then cycle entries) get successive bands at
/// `root_x`; child `i` of a parent at `(x, y)` lands on
/// `(x + level_step, y + i * sibling_step)`.
///
/// Siblings are stacked from their parent's y without looking at subtree
/// sizes, so wide subtrees can overlap the next sibling's band.
pub fn tree_positions(hierarchy: &Hierarchy<'_>, config: &LayoutConfig) -> Vec<(i32, i32)> {
    let mut positions = vec![(0, 0); hierarchy.len()];
    let mut placed = vec![false; hierarchy.len()];
    let mut band_y = config.root_y;

    for &entry in hierarchy.roots().iter().chain(hierarchy.detached()) {
        if placed[entry] {
            continue;
        }
        let mut stack = vec![(entry, config.root_x, band_y)];
        band_y += config.root_gap;

        while let Some((idx, x, y)) = stack.pop() {
            if placed[idx] {
                continue;
            }
            placed[idx] = true;
            positions[idx] = (x, y);

            let children = hierarchy.children_of_index(idx);
            for (order, &child) in children.iter().enumerate().rev() {
                if placed[child] {
                    continue;
                }
                let child_y = y + order as i32 * config.sibling_step;
                stack.push((child, x + config.level_step, child_y));
            }
        }
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::GoalNode;

    fn positions(sheet: &Sheet) -> Vec<(i32, i32)> {
        sheet.nodes.iter().map(|n| (n.x, n.y)).collect()
    }

    #[test]
    fn sentinel_relayouts_explicit_positions() {
        let mut sheet = Sheet::new(
            "s",
            vec![
                GoalNode::new("1", "", "Root").at(100, 100),
                GoalNode::new("2", "1", "Child"),
            ],
        );
        assert!(auto_layout(&mut sheet, &LayoutConfig::default()));
        assert_eq!(positions(&sheet), vec![(100, 100), (350, 100)]);
    }

    #[test]
    fn sentinel_overrides_any_explicit_position() {
        let mut sheet = Sheet::new(
            "s",
            vec![
                GoalNode::new("1", "", "Root").at(640, 20),
                GoalNode::new("2", "1", "Child"),
            ],
        );
        auto_layout(&mut sheet, &LayoutConfig::default());
        assert_eq!(positions(&sheet), vec![(100, 100), (350, 100)]);
    }

    #[test]
    fn siblings_stack_downward() {
        let mut sheet = Sheet::new(
            "s",
            vec![
                GoalNode::new("r", "", "R"),
                GoalNode::new("a", "r", "A"),
                GoalNode::new("b", "r", "B"),
                GoalNode::new("c", "r", "C"),
            ],
        );
        auto_layout(&mut sheet, &LayoutConfig::default());
        assert_eq!(
            positions(&sheet),
            vec![(100, 100), (350, 100), (350, 250), (350, 400)]
        );
    }

    #[test]
    fn roots_get_separate_bands() {
        let mut sheet = Sheet::new(
            "s",
            vec![
                GoalNode::new("1", "", "A"),
                GoalNode::new("2", "", "B"),
                GoalNode::new("3", "nowhere", "Orphan"),
                GoalNode::new("4", "2", "Leaf"),
            ],
        );
        auto_layout(&mut sheet, &LayoutConfig::default());
        assert_eq!(
            positions(&sheet),
            vec![(100, 100), (100, 300), (100, 500), (350, 300)]
        );
    }

    #[test]
    fn grandchildren_follow_their_parent() {
        let mut sheet = Sheet::new(
            "s",
            vec![
                GoalNode::new("r", "", "R"),
                GoalNode::new("a", "r", "A"),
                GoalNode::new("b", "r", "B"),
                GoalNode::new("b1", "b", "B1"),
                GoalNode::new("b2", "b", "B2"),
            ],
        );
        auto_layout(&mut sheet, &LayoutConfig::default());
        assert_eq!(sheet.nodes[3].x, 600);
        assert_eq!(sheet.nodes[3].y, 250);
        assert_eq!(sheet.nodes[4].y, 400);
    }

    #[test]
    fn layout_is_repeatable_and_skips_placed_sheets() {
        let original = Sheet::new(
            "s",
            vec![
                GoalNode::new("1", "", "A"),
                GoalNode::new("2", "1", "B"),
                GoalNode::new("3", "1", "C"),
            ],
        );
        let mut first = original.clone();
        let mut second = original.clone();
        auto_layout(&mut first, &LayoutConfig::default());
        auto_layout(&mut second, &LayoutConfig::default());
        assert_eq!(first, second);

        let before = first.clone();
        assert!(!auto_layout(&mut first, &LayoutConfig::default()));
        assert_eq!(first, before);
    }

    #[test]
    fn parent_cycle_terminates() {
        let mut sheet = Sheet::new(
            "s",
            vec![GoalNode::new("a", "b", "A"), GoalNode::new("b", "a", "B")],
        );
        auto_layout(&mut sheet, &LayoutConfig::default());
        assert_eq!(positions(&sheet), vec![(100, 100), (350, 100)]);
    }

    #[test]
    fn deep_chain_does_not_overflow() {
        let mut nodes = vec![GoalNode::new("0", "", "n0")];
        for i in 1..50_000 {
            nodes.push(GoalNode::new(&i.to_string(), &(i - 1).to_string(), "n"));
        }
        let mut sheet = Sheet::new("deep", nodes);
        auto_layout(&mut sheet, &LayoutConfig::default());
        assert_eq!(sheet.nodes[2].x, 600);
    }
}
