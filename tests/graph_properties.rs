use mind_map_canvas::map::{MindMap, NodeId, NodePatch, Point, Viewport};
use proptest::prelude::*;
use std::collections::HashSet;

#[derive(Clone, Debug)]
enum Op {
	CreateRoot { x: i16, y: i16 },
	CreateChild { parent: u16, x: i16, y: i16 },
	AddChild { parent: u16 },
	Delete { idx: u16 },
	Reparent { idx: u16, parent: Option<u16> },
	Update { idx: u16, x: i16, y: i16 },
	ToggleCollapsed { idx: u16 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
	prop_oneof![
		(any::<i16>(), any::<i16>()).prop_map(|(x, y)| Op::CreateRoot { x, y }),
		(any::<u16>(), any::<i16>(), any::<i16>()).prop_map(|(parent, x, y)| Op::CreateChild {
			parent,
			x,
			y,
		}),
		any::<u16>().prop_map(|parent| Op::AddChild { parent }),
		any::<u16>().prop_map(|idx| Op::Delete { idx }),
		(any::<u16>(), proptest::option::of(any::<u16>()))
			.prop_map(|(idx, parent)| Op::Reparent { idx, parent }),
		(any::<u16>(), any::<i16>(), any::<i16>()).prop_map(|(idx, x, y)| Op::Update { idx, x, y }),
		any::<u16>().prop_map(|idx| Op::ToggleCollapsed { idx }),
	]
}

fn pick(ids: &[NodeId], idx: u16) -> Option<NodeId> {
	if ids.is_empty() {
		return None;
	}
	Some(ids[idx as usize % ids.len()].clone())
}

fn apply_op(map: &mut MindMap, op: Op) {
	let ids: Vec<NodeId> = map.nodes().map(|n| n.id.clone()).collect();
	match op {
		Op::CreateRoot { x, y } => {
			map.create_node(Point::new(x as f64 * 0.5, y as f64 * 0.5), "root", None);
		}
		Op::CreateChild { parent, x, y } => {
			let Some(parent) = pick(&ids, parent) else {
				return;
			};
			map.create_node(Point::new(x as f64, y as f64), "child", Some(&parent));
		}
		Op::AddChild { parent } => {
			if let Some(parent) = pick(&ids, parent) {
				map.add_child_node(&parent);
			}
		}
		Op::Delete { idx } => {
			if let Some(id) = pick(&ids, idx) {
				map.delete_node(&id);
			}
		}
		Op::Reparent { idx, parent } => {
			let Some(id) = pick(&ids, idx) else {
				return;
			};
			let parent = parent.and_then(|p| pick(&ids, p));
			// Cycles are rejected with an error and leave the map untouched.
			let _ = map.reparent_node(&id, parent.as_ref());
		}
		Op::Update { idx, x, y } => {
			if let Some(id) = pick(&ids, idx) {
				let patch = NodePatch {
					text: Some(format!("{x}/{y}")),
					position: Some(Point::new(x as f64, y as f64)),
					..NodePatch::default()
				};
				map.update_node(&id, patch);
			}
		}
		Op::ToggleCollapsed { idx } => {
			if let Some(id) = pick(&ids, idx) {
				map.toggle_collapsed(&id);
			}
		}
	}
}

fn assert_invariants(map: &MindMap) {
	let ids: HashSet<&NodeId> = map.nodes().map(|n| &n.id).collect();
	assert_eq!(ids.len(), map.len(), "duplicate node ids");

	let mut child_count = 0;
	for node in map.nodes() {
		for child in map.children_of(&node.id) {
			child_count += 1;
			assert!(ids.contains(child), "{} lists missing child {}", node.id, child);
			assert_eq!(map.parent_of(child), Some(&node.id), "parent of {child}");
		}
	}

	// Every non-root node is listed exactly once.
	let roots = map.roots().count();
	assert_eq!(child_count + roots, map.len());

	let connections = map.connections();
	assert_eq!(connections.len(), child_count);
	for c in &connections {
		assert!(map.children_of(&c.from).contains(&c.to));
	}

	for node in map.nodes() {
		let mut seen = HashSet::new();
		let mut cursor = Some(&node.id);
		while let Some(id) = cursor {
			assert!(seen.insert(id), "cycle through {id}");
			cursor = map.parent_of(id);
		}
	}
}

fn sequence_strategy() -> impl Strategy<Value = Vec<Op>> {
	prop::collection::vec(op_strategy(), 1..40)
}

proptest! {
	#![proptest_config(ProptestConfig { cases: 512, .. ProptestConfig::default() })]

	#[test]
	fn mutation_sequences_keep_the_tree_consistent(seq in sequence_strategy()) {
		let mut map = MindMap::new();
		for op in seq {
			apply_op(&mut map, op);
			assert_invariants(&map);
		}
	}

	#[test]
	fn deleting_twice_is_a_no_op(seq in sequence_strategy(), idx in any::<u16>()) {
		let mut map = MindMap::new();
		for op in seq {
			apply_op(&mut map, op);
		}
		let ids: Vec<NodeId> = map.nodes().map(|n| n.id.clone()).collect();
		if let Some(id) = pick(&ids, idx) {
			let removed = map.delete_node(&id);
			prop_assert!(removed.contains(&id));
			let after_first = map.clone();
			prop_assert!(map.delete_node(&id).is_empty());
			prop_assert_eq!(&map, &after_first);
			for gone in &removed {
				prop_assert!(!map.contains(gone));
			}
		}
	}

	#[test]
	fn json_round_trip_preserves_the_map(seq in sequence_strategy()) {
		let mut map = MindMap::new();
		for op in seq {
			apply_op(&mut map, op);
		}
		let json = map.to_json().unwrap();
		let back = MindMap::from_json(&json).unwrap();
		prop_assert_eq!(back, map);
	}

	#[test]
	fn screen_and_world_transforms_are_inverse(
		zoom in 0.2f64..=3.0,
		pan_x in -5_000.0f64..5_000.0,
		pan_y in -5_000.0f64..5_000.0,
		x in -10_000.0f64..10_000.0,
		y in -10_000.0f64..10_000.0,
	) {
		let mut vp = Viewport::default();
		vp.set_zoom(zoom);
		vp.pan = Point::new(pan_x, pan_y);
		let p = Point::new(x, y);
		let back = vp.world_to_screen(vp.screen_to_world(p));
		prop_assert!((back.x - p.x).abs() < 1e-6, "{:?} -> {:?}", p, back);
		prop_assert!((back.y - p.y).abs() < 1e-6, "{:?} -> {:?}", p, back);
	}
}
