// Example: pinned/sticky rows via range_extractor + IndexEmitter.
use std::sync::Arc;

use list_virtualizer::{IndexEmitter, Range, Virtualizer, VirtualizerOptions};

fn main() {
    let pinned: Arc<[usize]> = Arc::from([0usize, 10, 20, 30, 40, 999]);
    let options = VirtualizerOptions::new()
        .with_item_size(1)
        .with_overscan(2)
        .with_range_extractor(Some({
            let pinned = Arc::clone(&pinned);
            move |r: Range, emit: &mut dyn FnMut(usize)| {
                let mut e = IndexEmitter::new(r, emit);
                // Indexes must ascend: pinned rows before the window, the window, then pinned
                // rows after it.
                let overscanned_start = r.start_index.saturating_sub(r.overscan);
                let overscanned_end = r.end_index.saturating_add(r.overscan).min(r.count);

                for &idx in pinned.iter().filter(|&&i| i < overscanned_start) {
                    e.emit_pinned(idx);
                }
                e.emit_overscanned();
                for &idx in pinned.iter().filter(|&&i| i >= overscanned_end) {
                    e.emit_pinned(idx);
                }
            }
        }));

    let rows: Vec<u64> = (0..1_000).collect();
    let mut v = Virtualizer::new(options, rows);
    v.set_viewport_and_scroll(10, 500);

    let mut collected = Vec::new();
    v.for_each_virtual_index(|i| collected.push(i));

    println!("visible_range={:?}", v.visible_range());
    println!("virtual_range={:?}", v.virtual_range());
    println!(
        "indexes_len={} first_20={:?}",
        collected.len(),
        &collected[..20.min(collected.len())]
    );

    let mut headers = 0usize;
    v.for_each_visible_item(|it| {
        if pinned.binary_search(&it.index).is_ok() {
            headers += 1;
        }
    });
    println!("pinned_headers_in_output={headers}");
}
