// Example: keep the viewport steady while older messages are prepended (chat/timeline).
use list_virtualizer_dom::{ListOptions, VirtualizedList, capture_first_visible_anchor};

fn main() {
    let mut list = VirtualizedList::new(
        ListOptions::new().with_height(300).with_item_height(40),
        (1000u64..1100).collect(),
    );
    list.virtualizer_mut().set_scroll_offset(2_020);

    let anchor = capture_first_visible_anchor(list.virtualizer());
    println!(
        "before prepend: offset={} anchor={anchor:?}",
        list.virtualizer().scroll_offset()
    );

    // Load 20 older messages above the current ones.
    let mut data: Vec<u64> = (980..1000).collect();
    data.extend(1000..1100);
    let ok = list.on_data_source_change_anchored(data);

    println!(
        "after prepend: restored={ok} offset={} anchor={:?}",
        list.virtualizer().scroll_offset(),
        capture_first_visible_anchor(list.virtualizer())
    );
}
