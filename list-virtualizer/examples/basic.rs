// Example: minimal usage and scroll-to helper.
use list_virtualizer::{Align, Virtualizer, VirtualizerOptions};

fn main() {
    let rows: Vec<u64> = (0..1_000_000).collect();
    let mut v = Virtualizer::new(VirtualizerOptions::new().with_item_size(24), rows);
    v.set_viewport_and_scroll(600, 123_456);

    let items = v.visible_items();
    println!("total_extent={}", v.total_extent());
    println!("visible_range={:?}", v.visible_range());
    println!("virtual_range={:?}", v.virtual_range());
    println!("first_rendered={:?}", items.first());

    let off = v.scroll_to_index_offset(999_999, Align::End);
    v.set_scroll_offset(off);
    println!("after scroll_to_index_offset: offset={}", v.scroll_offset());
}
