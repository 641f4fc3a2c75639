use lazytask_core::{Document, Edge, GraphError, Node, Store};
use uuid::Uuid;

fn titles(document: &Document, parent: Uuid) -> Vec<String> {
    document
        .ordered_children(parent)
        .unwrap()
        .into_iter()
        .map(|node| node.title.clone())
        .collect()
}

fn add_child(document: &mut Document, parent: Uuid, title: &str, priority: f64) -> Uuid {
    let id = document.insert_node(Node::new(title)).unwrap();
    document.add_or_update_edge(parent, id, priority).unwrap();
    id
}

#[test]
fn children_are_listed_by_descending_priority() {
    let mut document = Document::new();
    let root = document.root_id();
    add_child(&mut document, root, "low", 10.0);
    add_child(&mut document, root, "high", 30.0);
    add_child(&mut document, root, "mid", 20.0);

    assert_eq!(titles(&document, root), vec!["high", "mid", "low"]);
}

#[test]
fn equal_priorities_break_ties_by_creation_order() {
    let mut document = Document::new();
    let root = document.root_id();
    add_child(&mut document, root, "first", 5.0);
    add_child(&mut document, root, "second", 5.0);
    add_child(&mut document, root, "third", 5.0);

    assert_eq!(titles(&document, root), vec!["first", "second", "third"]);
}

#[test]
fn re_adding_a_link_updates_priority_without_duplicating() {
    let mut document = Document::new();
    let root = document.root_id();
    let id = add_child(&mut document, root, "task", 1.0);
    let seq = document.find_edge(root, id).unwrap().seq;

    let updated = document.add_or_update_edge(root, id, 9.0).unwrap();

    assert_eq!(updated.priority, 9.0);
    assert_eq!(updated.seq, seq);
    assert_eq!(document.store().edge_count(), 1);
}

#[test]
fn one_task_can_live_under_several_parents() {
    let mut document = Document::new();
    let root = document.root_id();
    let work = add_child(&mut document, root, "work", 2.0);
    let today = add_child(&mut document, root, "today", 1.0);
    let report = add_child(&mut document, work, "report", 0.0);
    document.add_or_update_edge(today, report, 0.0).unwrap();

    let mut parents = document.store().parents_of(report);
    parents.sort();
    let mut expected = vec![work, today];
    expected.sort();
    assert_eq!(parents, expected);

    // Unlinking from one parent keeps the other.
    document.remove_edge(today, report).unwrap();
    assert_eq!(document.store().parents_of(report), vec![work]);
    assert!(document.node(report).is_some());
}

#[test]
fn deleting_a_node_cascades_to_every_referencing_edge() {
    let mut document = Document::new();
    let root = document.root_id();
    let a = add_child(&mut document, root, "a", 2.0);
    let b = add_child(&mut document, root, "b", 1.0);
    let shared = add_child(&mut document, a, "shared", 0.0);
    document.add_or_update_edge(b, shared, 0.0).unwrap();
    let grandchild = add_child(&mut document, shared, "grandchild", 0.0);

    document.delete_node(shared).unwrap();

    assert!(document.node(shared).is_none());
    assert!(document.ordered_child_ids(a).is_empty());
    assert!(document.ordered_child_ids(b).is_empty());
    assert!(document.store().parents_of(grandchild).is_empty());
    assert!(document.node(grandchild).is_some());
    assert!(document
        .store()
        .edges()
        .all(|edge| edge.parent != shared && edge.child != shared));
}

#[test]
fn root_cannot_be_deleted_or_linked_as_child() {
    let mut document = Document::new();
    let root = document.root_id();
    let task = add_child(&mut document, root, "task", 0.0);

    assert_eq!(
        document.delete_node(root).unwrap_err(),
        GraphError::RootProtected(root)
    );
    assert!(document.add_or_update_edge(task, root, 0.0).is_err());
}

#[test]
fn linking_missing_node_or_non_finite_priority_is_rejected() {
    let mut document = Document::new();
    let root = document.root_id();
    let missing = Uuid::new_v4();
    assert_eq!(
        document.add_or_update_edge(root, missing, 0.0).unwrap_err(),
        GraphError::NodeNotFound(missing)
    );

    let task = document.insert_node(Node::new("task")).unwrap();
    assert!(matches!(
        document.add_or_update_edge(root, task, f64::NAN),
        Err(GraphError::InvalidPriority(_))
    ));
    assert_eq!(document.store().edge_count(), 0);
}

#[test]
fn removing_absent_link_is_a_noop() {
    let mut document = Document::new();
    let root = document.root_id();
    let task = document.insert_node(Node::new("task")).unwrap();
    assert_eq!(document.remove_edge(root, task).unwrap(), None);
}

#[test]
fn store_from_parts_rejects_dangling_edges() {
    let root = Node::root();
    let ghost = Uuid::new_v4();
    let err = Store::from_parts(
        vec![root.clone()],
        vec![Edge {
            parent: root.id,
            child: ghost,
            priority: 0.0,
            seq: 1,
        }],
    )
    .unwrap_err();

    assert_eq!(
        err,
        GraphError::DanglingEdge {
            parent: root.id,
            child: ghost
        }
    );
}

#[test]
fn document_edits_mark_unsaved_changes() {
    let mut document = Document::new();
    assert!(!document.has_changes());

    let root = document.root_id();
    let task = add_child(&mut document, root, "task", 0.0);
    assert!(document.has_changes());

    document.set_title(task, "  renamed  ").unwrap();
    assert_eq!(document.node(task).unwrap().title, "renamed");
}
