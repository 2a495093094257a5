use crate::*;

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::cell::Cell;
use core::sync::atomic::{AtomicUsize, Ordering};

use list_virtualizer::{ItemKey, VirtualItem};

fn ids(range: core::ops::Range<u64>) -> Vec<u64> {
    range.collect()
}

fn key(id: i64) -> ItemKey {
    ItemKey::Int(id)
}

fn text(s: &str) -> PropValue {
    PropValue::Str(s.to_string())
}

fn feed(n: u64) -> VirtualizedList<u64> {
    VirtualizedList::new(ListOptions::new().with_id("feed"), ids(0..n))
}

/// An element whose extent the test can change after attaching it.
struct Resizable(Rc<Cell<f64>>);

impl MeasureElement for Resizable {
    fn extent(&self, _axis: list_virtualizer::Axis) -> f64 {
        self.0.get()
    }
}

fn resizable(extent: f64) -> (Rc<Cell<f64>>, Box<dyn MeasureElement>) {
    let cell = Rc::new(Cell::new(extent));
    (Rc::clone(&cell), Box::new(Resizable(cell)))
}

fn element(height: f64) -> Box<dyn MeasureElement> {
    Box::new(FixedElement {
        width: 300.0,
        height,
    })
}

#[test]
fn root_defaults_for_vertical_list() {
    let list = feed(100);
    let root = list.root();

    assert_eq!(root.style.get("overflow-y"), Some("auto"));
    assert_eq!(root.style.get("overflow-x"), Some("hidden"));
    assert_eq!(root.style.get("position"), Some("relative"));
    assert_eq!(root.style.get("height"), Some("400px"));
    assert_eq!(root.style.get("width"), Some("100%"));
    assert_eq!(root.get("id"), Some(&text("feed")));
    assert_eq!(root.get("data-list-id"), Some(&text("feed")));
    assert_eq!(root.get("data-horizontal"), None);

    // The default root size seeds the engine viewport.
    assert_eq!(list.virtualizer().viewport_extent(), 400);
}

#[test]
fn root_for_sized_horizontal_list() {
    let list = VirtualizedList::new(
        ListOptions::new()
            .with_width(800)
            .with_height(120)
            .with_virtualizer(|o| o.with_horizontal(true)),
        ids(0..100),
    );
    let root = list.root();

    assert_eq!(root.style.get("overflow-y"), Some("hidden"));
    assert_eq!(root.style.get("overflow-x"), Some("auto"));
    assert_eq!(root.style.get("height"), Some("120px"));
    assert_eq!(root.style.get("width"), Some("800px"));
    assert_eq!(root.get("data-horizontal"), Some(&text("")));
    assert_eq!(list.virtualizer().viewport_extent(), 800);
}

#[test]
fn user_props_are_merged_last() {
    let list = VirtualizedList::new(
        ListOptions::new()
            .with_id("feed")
            .with_root_props(
                Props::new()
                    .with("id", "custom")
                    .with("role", "list")
                    .with_style(Style::new().with("height", "50vh")),
            )
            .with_item_props(
                Props::new()
                    .with("class", "row")
                    .with_style(Style::new().with("height", "auto")),
            ),
        ids(0..10),
    );

    let root = list.root();
    assert_eq!(root.get("id"), Some(&text("custom")));
    assert_eq!(root.get("role"), Some(&text("list")));
    assert_eq!(root.get("data-list-id"), Some(&text("feed")));
    assert_eq!(root.style.get("height"), Some("50vh"));
    // Untouched declarations survive.
    assert_eq!(root.style.get("overflow-y"), Some("auto"));

    let item = list.virtual_items()[0].clone();
    let props = list.item_props(&item);
    assert_eq!(props.get("class"), Some(&text("row")));
    assert_eq!(props.style.get("height"), Some("auto"));
    assert_eq!(props.style.get("top"), Some("0px"));
}

#[test]
fn container_spans_total_extent() {
    let list = feed(100);
    let container = list.container();

    // 100 * 50 plus the default end padding.
    assert_eq!(list.virtualizer().total_extent(), 5010);
    assert_eq!(container.style.get("height"), Some("5010px"));
    assert_eq!(container.style.get("width"), Some("100%"));
    assert_eq!(container.style.get("position"), Some("relative"));
    assert_eq!(container.get("data-list-container"), Some(&text("feed-list")));

    let horizontal = VirtualizedList::new(
        ListOptions::new()
            .with_item_height(20)
            .with_virtualizer(|o| o.with_horizontal(true).with_padding(0, 0)),
        ids(0..10),
    );
    let container = horizontal.container();
    assert_eq!(container.style.get("width"), Some("200px"));
    assert_eq!(container.style.get("height"), Some("100%"));
}

#[test]
fn item_props_position_items_absolutely() {
    let list = feed(100);
    let items = list.virtual_items();
    // Nine items touch the 400px viewport (item 8 starts at its end), plus overscan 5.
    assert_eq!(items.len(), 14);

    let props = list.item_props(&items[3]);
    assert_eq!(props.style.get("position"), Some("absolute"));
    assert_eq!(props.style.get("top"), Some("150px"));
    assert_eq!(props.style.get("left"), Some("0"));
    assert_eq!(props.style.get("width"), Some("100%"));
    assert_eq!(props.style.get("height"), Some("50px"));
    assert_eq!(props.get("data-list-item"), Some(&text("true")));
    assert_eq!(props.get("data-index"), Some(&PropValue::Int(3)));
    assert_eq!(props.get("key"), Some(&PropValue::Int(3)));
    assert_eq!(
        props.style.to_string(),
        "position: absolute; top: 150px; left: 0; width: 100%; height: 50px"
    );
}

#[test]
fn rtl_horizontal_items_are_placed_from_the_right() {
    let list = VirtualizedList::new(
        ListOptions::new()
            .with_item_height(40)
            .with_virtualizer(|o| o.with_horizontal(true).with_rtl(true)),
        ids(0..10),
    );
    let item = list.virtual_items()[1].clone();
    let props = list.item_props(&item);

    assert_eq!(props.style.get("right"), Some("40px"));
    assert_eq!(props.style.get("left"), None);
    assert_eq!(props.style.get("top"), Some("0"));
    assert_eq!(props.style.get("width"), Some("40px"));
    assert_eq!(props.style.get("height"), Some("100%"));
}

#[test]
fn items_pass_data_props_and_item_to_the_renderer() {
    let list = VirtualizedList::new(
        ListOptions::new().with_virtualizer(|o| o.with_overscan(0)),
        ids(100..200),
    );
    let rendered: Vec<(usize, u64, Option<PropValue>, bool)> = list.items(|args| {
        (
            args.item.index,
            *args.data,
            args.props.get("key").cloned(),
            args.item.is_even,
        )
    });

    assert_eq!(rendered.len(), 9);
    assert_eq!(rendered[0], (0, 100, Some(PropValue::Int(100)), true));
    assert_eq!(rendered[8], (8, 108, Some(PropValue::Int(108)), true));
    assert!(!rendered[1].3);
}

#[test]
fn attach_item_records_rounded_extent() {
    let mut list = VirtualizedList::new(
        ListOptions::new().with_virtualizer(|o| o.with_padding(0, 0)),
        ids(0..100),
    );

    assert!(list.attach_item(key(0), element(80.4)));
    assert_eq!(list.attached_len(), 1);
    let v = list.virtualizer();
    assert_eq!(v.item_size(0), Some(80));
    assert_eq!(v.item_start(1), Some(80));
    assert_eq!(v.total_extent(), 80 + 99 * 50);

    // Same extent again: nothing changes.
    assert!(!list.measure_item(&key(0)));
}

#[test]
fn detach_keeps_the_measurement() {
    let mut list = feed(10);
    list.attach_item(key(2), element(75.0));

    assert!(list.detach_item(&key(2)).is_some());
    assert!(list.detach_item(&key(2)).is_none());
    assert_eq!(list.attached_len(), 0);
    assert!(list.virtualizer().is_measured(2));
    assert_eq!(list.virtualizer().item_size(2), Some(75));
    assert!(!list.measure_item(&key(2)));
}

#[test]
fn measure_item_picks_up_resizes() {
    let mut list = feed(10);
    let (cell, el) = resizable(60.0);
    list.attach_item(key(4), el);
    assert_eq!(list.virtualizer().item_size(4), Some(60));

    cell.set(90.0);
    assert!(list.measure_item(&key(4)));
    assert_eq!(list.virtualizer().item_size(4), Some(90));
    assert!(!list.measure_item(&key(4)));
}

#[test]
fn measure_all_notifies_once() {
    let mut list = feed(10);
    let (a, el_a) = resizable(60.0);
    let (b, el_b) = resizable(70.0);
    list.attach_item(key(0), el_a);
    list.attach_item(key(1), el_b);

    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    list.virtualizer_mut().subscribe(move |_, _| {
        seen.fetch_add(1, Ordering::SeqCst);
    });

    a.set(65.0);
    b.set(75.0);
    list.measure_all();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(list.virtualizer().item_size(0), Some(65));
    assert_eq!(list.virtualizer().item_size(1), Some(75));
}

#[test]
fn zero_extent_keeps_the_estimate() {
    let mut list = feed(10);
    assert!(!list.attach_item(key(1), element(0.0)));
    assert_eq!(list.virtualizer().item_size(1), Some(50));
    assert!(!list.virtualizer().is_measured(1));
}

#[test]
fn data_change_releases_vanished_elements() {
    let mut list = feed(10);
    for id in 0..3 {
        list.attach_item(key(id), element(60.0));
    }

    list.on_data_source_change(vec![0, 2, 5, 6]);
    assert_eq!(list.count(), 4);
    assert_eq!(list.attached_len(), 2);
    // Measurements follow keys to their new indexes.
    assert_eq!(list.virtualizer().item_size(1), Some(60));
    assert_eq!(list.virtualizer().item_size(2), Some(50));
}

#[test]
fn anchor_preserves_scroll_across_prepend() {
    let mut list = VirtualizedList::new(
        ListOptions::new()
            .with_height(100)
            .with_item_height(10)
            .with_virtualizer(|o| o.with_padding(0, 0)),
        ids(1000..1100),
    );
    list.virtualizer_mut().set_scroll_offset(505);

    let anchor = capture_first_visible_anchor(list.virtualizer()).unwrap();
    assert_eq!(anchor.key, key(1050));
    assert_eq!(anchor.offset_in_viewport, 5);

    let mut data = ids(0..10);
    data.extend(1000..1100);
    assert!(list.on_data_source_change_anchored(data));
    assert_eq!(list.virtualizer().scroll_offset(), 605);
}

#[test]
fn anchor_is_lost_when_its_key_leaves() {
    let mut list = VirtualizedList::new(
        ListOptions::new()
            .with_height(100)
            .with_item_height(10)
            .with_virtualizer(|o| o.with_padding(0, 0)),
        ids(0..100),
    );
    list.virtualizer_mut().set_scroll_offset(505);

    let anchor = ScrollAnchor {
        key: key(50),
        offset_in_viewport: 5,
    };
    list.on_data_source_change((0..50).chain(51..100).collect());
    assert!(!apply_anchor(list.virtualizer_mut(), &anchor));
}

#[test]
fn generated_ids_are_unique() {
    let a = VirtualizedList::new(ListOptions::<u64>::new(), ids(0..3));
    let b = VirtualizedList::new(ListOptions::<u64>::new(), ids(0..3));

    assert_ne!(a.id(), b.id());
    assert!(a.id().starts_with("vl-"));
    let expected: String = [a.id(), "-list"].concat();
    assert_eq!(
        a.container().get("data-list-container"),
        Some(&PropValue::Str(expected))
    );
    assert_eq!(scoped_id("vl-3", "list"), "vl-3-list");
}

#[test]
fn dispose_releases_elements_and_ignores_new_ones() {
    let mut list = feed(10);
    list.attach_item(key(0), element(60.0));

    list.dispose();
    assert!(list.virtualizer().is_disposed());
    assert_eq!(list.attached_len(), 0);
    assert!(!list.attach_item(key(1), element(70.0)));
    assert_eq!(list.attached_len(), 0);
}

#[test]
fn keyed_items_use_their_own_keys() {
    #[derive(Debug)]
    struct Row {
        id: &'static str,
    }

    impl list_virtualizer::Identify for Row {
        fn field_key(&self, field: &str) -> Option<ItemKey> {
            (field == "id").then(|| ItemKey::Str(self.id.to_string()))
        }
    }

    let list = VirtualizedList::new(
        ListOptions::new(),
        vec![Row { id: "a" }, Row { id: "b" }],
    );
    let items: Vec<VirtualItem> = list.virtual_items();
    assert_eq!(list.item_props(&items[1]).get("key"), Some(&text("b")));
}
