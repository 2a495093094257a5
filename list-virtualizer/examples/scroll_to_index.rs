// Example: scroll_to_index keeps correcting while rows above the target get measured.
use std::cell::Cell;
use std::rc::Rc;

use list_virtualizer::{
    Align, Axis, ClientRect, ItemKey, ListenerHandle, ScrollBehavior, ScrollContainer,
    ScrollToOptions, Virtualizer, VirtualizerOptions,
};

/// A stand-in for a DOM scroll element.
struct Viewport {
    offset: Rc<Cell<f64>>,
}

impl ScrollContainer for Viewport {
    fn scroll_offset(&self, _axis: Axis) -> f64 {
        self.offset.get()
    }

    fn client_rect(&self) -> ClientRect {
        ClientRect {
            width: 320.0,
            height: 480.0,
        }
    }

    fn add_listeners(&mut self) -> ListenerHandle {
        ListenerHandle(1)
    }

    fn remove_listeners(&mut self, _handle: ListenerHandle) {}

    fn scroll_to(&mut self, offset: f64, _axis: Axis, behavior: ScrollBehavior) {
        println!("  container.scroll_to({offset}, {behavior:?})");
        self.offset.set(offset);
    }
}

fn main() {
    let rows: Vec<u64> = (0..10_000).collect();
    let mut v = Virtualizer::new(VirtualizerOptions::new().with_item_size(40), rows);
    let offset = Rc::new(Cell::new(0.0));
    let handle = v
        .attach(Box::new(Viewport {
            offset: Rc::clone(&offset),
        }))
        .expect("virtualizer is live");

    let target = v
        .scroll_to_index(500, ScrollToOptions::new(Align::Start, ScrollBehavior::Instant))
        .expect("virtualizer is live");
    println!("scroll_to_index(500) -> {target}");

    // The host renders the new window and reports real extents.
    let measured: Vec<(ItemKey, u32)> = v
        .visible_items()
        .iter()
        .map(|it| (it.key.clone(), 40 + (it.index % 3) as u32 * 10))
        .collect();
    v.report_measurements(measured);
    println!(
        "after measuring: offset={} pending={}",
        v.scroll_offset(),
        v.is_scroll_pending()
    );

    // The container echoes the scroll back as an event.
    v.on_scroll_event(handle, 16);
    v.on_animation_frame(16);
    println!(
        "after frame: offset={} start(500)={:?} scrolling={}",
        v.scroll_offset(),
        v.item_start(500),
        v.is_scrolling()
    );
}
