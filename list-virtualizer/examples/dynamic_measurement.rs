// Example: dynamic measurement and scroll jump prevention.
use list_virtualizer::{ItemKey, Virtualizer, VirtualizerOptions};

fn main() {
    let rows: Vec<u64> = (0..100).collect();
    let mut v = Virtualizer::new(VirtualizerOptions::new().with_item_size(10), rows);
    v.set_viewport_and_scroll(30, 200);

    println!(
        "before: off={} total={} range={:?}",
        v.scroll_offset(),
        v.total_extent(),
        v.virtual_range()
    );

    // Item 0 sits above the viewport: growing it shifts the offset by the same delta so the
    // rows on screen stay put.
    v.report_measurement(&ItemKey::Int(0), 30);
    println!(
        "grow row 0: off={} total={}",
        v.scroll_offset(),
        v.total_extent()
    );

    // Re-reporting the same extent is a no-op.
    let changed = v.report_measurement(&ItemKey::Int(0), 30);
    println!("repeat report changed layout: {changed}");

    // Rows inside the viewport grow downward without moving it.
    v.report_measurements([(ItemKey::Int(21), 18), (ItemKey::Int(22), 40)]);
    println!(
        "grow visible rows: off={} total={} items={}",
        v.scroll_offset(),
        v.total_extent(),
        v.visible_items().len()
    );
}
