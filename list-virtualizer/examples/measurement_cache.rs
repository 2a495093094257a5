// Example: export and import the measurement cache.
use list_virtualizer::{ItemKey, Virtualizer, VirtualizerOptions};

fn main() {
    // Persisting measurements across screens or sessions lets a new virtualizer start with
    // real extents instead of estimates.
    let rows: Vec<u64> = (0..10).collect();
    let mut v1 = Virtualizer::new(VirtualizerOptions::new().with_item_size(1), rows.clone());
    v1.report_measurements([(ItemKey::Int(2), 10), (ItemKey::Int(5), 42)]);

    let snapshot = v1.export_measurement_cache();
    println!("exported_cache_len={}", snapshot.len());

    let mut v2 = Virtualizer::new(VirtualizerOptions::new().with_item_size(1), rows);
    println!(
        "before import: size2={:?} size5={:?}",
        v2.item_size(2),
        v2.item_size(5)
    );
    v2.import_measurement_cache(snapshot);
    println!(
        "after import: size2={:?} size5={:?} total={}",
        v2.item_size(2),
        v2.item_size(5),
        v2.total_extent()
    );
}
