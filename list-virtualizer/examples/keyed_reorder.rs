// Example: measurements follow keys across reorders and insertions.
use list_virtualizer::{Identify, ItemKey, Virtualizer, VirtualizerOptions};

#[derive(Clone, Debug)]
struct Message {
    id: u32,
    body: &'static str,
}

impl Identify for Message {
    fn field_key(&self, field: &str) -> Option<ItemKey> {
        (field == "id").then(|| ItemKey::from(self.id))
    }
}

fn main() {
    let messages = vec![
        Message { id: 7, body: "hello" },
        Message { id: 8, body: "a much longer message that wraps" },
    ];
    let mut v = Virtualizer::new(VirtualizerOptions::new().with_item_size(20), messages);
    v.report_measurement(&ItemKey::Int(8), 64);
    println!(
        "before: size0={:?} size1={:?}",
        v.item_size(0),
        v.item_size(1)
    );

    // New message at the top; the measured one moves to index 2 and keeps its extent.
    v.on_data_source_change(vec![
        Message { id: 9, body: "newest" },
        Message { id: 7, body: "hello" },
        Message { id: 8, body: "a much longer message that wraps" },
    ]);
    for (i, m) in v.data().iter().enumerate() {
        println!(
            "index={i} id={} size={:?} measured={} body={:?}",
            m.id,
            v.item_size(i),
            v.is_measured(i),
            m.body
        );
    }
}
