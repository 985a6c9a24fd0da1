use super::*;

/// One connector per node whose parent resolves, in sheet order.
///
/// Both ends are pulled in from the box centers by the icon radius so the
/// line meets the icon outlines. Pairs with coincident centers have no
/// direction and produce no connector.
pub fn route_connectors(hierarchy: &Hierarchy<'_>, node_box: &NodeBox) -> Vec<Connector> {
    let nodes = hierarchy.nodes();
    let radius = node_box.icon_radius();
    let mut connectors = Vec::new();

    for (child_idx, child) in nodes.iter().enumerate() {
        let Some(parent_idx) = hierarchy.parent_of(child_idx) else {
            continue;
        };
        let parent = &nodes[parent_idx];
        let from = node_box.center(parent.x, parent.y);
        let to = node_box.center(child.x, child.y);
        let Some((start, end)) = trim_segment(from, to, radius) else {
            log::trace!(
                "skipping connector {} -> {}: centers coincide",
                parent.id,
                child.id
            );
            continue;
        };
        connectors.push(Connector {
            parent: parent_idx,
            child: child_idx,
            parent_id: parent.id.clone(),
            child_id: child.id.clone(),
            start,
            end,
        });
    }
    connectors
}

/// Moves both endpoints of `from -> to` inward by `inset`. `None` when the
/// points coincide.
pub fn trim_segment(
    from: (f32, f32),
    to: (f32, f32),
    inset: f32,
) -> Option<((f32, f32), (f32, f32))> {
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;
    let dist = dx.hypot(dy);
    if dist == 0.0 || !dist.is_finite() {
        return None;
    }
    let ox = dx / dist * inset;
    let oy = dy / dist * inset;
    Some(((from.0 + ox, from.1 + oy), (to.0 - ox, to.1 - oy)))
}
