use crate::node::{Node, NodeKind};
use crate::snapshot::Snapshot;

/// Visitor pattern for walking a snapshot in document order
///
/// Default implementations walk the entire tree. Override specific visit_*
/// methods and call the matching walk_* function to keep descending.
pub trait Visitor: Sized {
    fn visit_snapshot(&mut self, snapshot: &Snapshot) {
        walk_snapshot(self, snapshot);
    }

    fn visit_node(&mut self, snapshot: &Snapshot, node: &Node) {
        walk_node(self, snapshot, node);
    }

    /// Paragraphs, headings, quotes, callouts, details and generic elements
    fn visit_block(&mut self, snapshot: &Snapshot, node: &Node) {
        walk_children(self, snapshot, node);
    }

    fn visit_link(&mut self, snapshot: &Snapshot, node: &Node) {
        walk_children(self, snapshot, node);
    }

    fn visit_text(&mut self, _node: &Node) {
        // Leaf node, no children to walk
    }

    fn visit_image(&mut self, _node: &Node) {
        // Leaf node, no children to walk
    }
}

pub fn walk_snapshot<V: Visitor>(visitor: &mut V, snapshot: &Snapshot) {
    walk_children(visitor, snapshot, snapshot.root());
}

pub fn walk_node<V: Visitor>(visitor: &mut V, snapshot: &Snapshot, node: &Node) {
    match &node.kind {
        NodeKind::Root => walk_children(visitor, snapshot, node),
        NodeKind::Text { .. } => visitor.visit_text(node),
        NodeKind::Image { .. } => visitor.visit_image(node),
        NodeKind::Link { .. } => visitor.visit_link(snapshot, node),
        NodeKind::Paragraph
        | NodeKind::Heading { .. }
        | NodeKind::Quote
        | NodeKind::Callout { .. }
        | NodeKind::Details { .. }
        | NodeKind::Element { .. } => visitor.visit_block(snapshot, node),
    }
}

pub fn walk_children<V: Visitor>(visitor: &mut V, snapshot: &Snapshot, node: &Node) {
    for child in &node.children {
        if let Some(child) = snapshot.get_node(child) {
            visitor.visit_node(snapshot, child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyGenerator;
    use crate::node::NodeTemplate;

    #[derive(Default)]
    struct Counter {
        blocks: usize,
        links: usize,
        texts: Vec<String>,
    }

    impl Visitor for Counter {
        fn visit_block(&mut self, snapshot: &Snapshot, node: &Node) {
            self.blocks += 1;
            walk_children(self, snapshot, node);
        }

        fn visit_link(&mut self, snapshot: &Snapshot, node: &Node) {
            self.links += 1;
            walk_children(self, snapshot, node);
        }

        fn visit_text(&mut self, node: &Node) {
            self.texts.push(node.text().to_string());
        }
    }

    #[test]
    fn test_visitor_walks_whole_tree() {
        let mut keys = KeyGenerator::new("visitor");
        let snapshot = Snapshot::create(
            vec![
                NodeTemplate::paragraph(vec![
                    NodeTemplate::text("See "),
                    NodeTemplate::link("https://example.com", vec![NodeTemplate::text("here")]),
                ]),
                NodeTemplate::quote(vec![NodeTemplate::text("Quoted")]),
            ],
            &mut keys,
        )
        .unwrap();

        let mut counter = Counter::default();
        counter.visit_snapshot(&snapshot);

        assert_eq!(counter.blocks, 2);
        assert_eq!(counter.links, 1);
        assert_eq!(counter.texts, vec!["See ", "here", "Quoted"]);
    }
}
