use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use list_virtualizer::{
    Axis, Identify, ItemKey, Rect, VirtualItem, Virtualizer, VirtualizerOptions, to_units,
};

use crate::{
    MeasureElement, Props, Style, apply_anchor, capture_first_visible_anchor, generate_id,
    scoped_id,
};

const DEFAULT_WIDTH: u32 = 600;
const DEFAULT_HEIGHT: u32 = 400;

fn px(n: impl core::fmt::Display) -> String {
    format!("{n}px")
}

/// Configuration for [`VirtualizedList`]: element sizing and extra props on top of the engine
/// options.
pub struct ListOptions<T> {
    /// Root element id. Generated when `None`.
    pub id: Option<String>,
    /// Root width in px; `None` renders `100%`.
    pub width: Option<u32>,
    /// Root height in px; `None` renders `400px`.
    pub height: Option<u32>,
    /// Shorthand for a fixed `estimate_size`.
    pub item_height: Option<u32>,
    /// Merged over the generated props; user values win.
    pub root_props: Props,
    pub container_props: Props,
    pub item_props: Props,
    pub virtualizer: VirtualizerOptions<T>,
}

impl<T: Identify + 'static> ListOptions<T> {
    pub fn new() -> Self {
        Self::from_virtualizer(VirtualizerOptions::new())
    }
}

impl<T: Identify + 'static> Default for ListOptions<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> ListOptions<T> {
    pub fn from_virtualizer(virtualizer: VirtualizerOptions<T>) -> Self {
        Self {
            id: None,
            width: None,
            height: None,
            item_height: None,
            root_props: Props::default(),
            container_props: Props::default(),
            item_props: Props::default(),
            virtualizer,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn with_item_height(mut self, item_height: u32) -> Self {
        self.item_height = Some(item_height);
        self
    }

    pub fn with_root_props(mut self, props: Props) -> Self {
        self.root_props = props;
        self
    }

    pub fn with_container_props(mut self, props: Props) -> Self {
        self.container_props = props;
        self
    }

    pub fn with_item_props(mut self, props: Props) -> Self {
        self.item_props = props;
        self
    }

    /// Adjusts the engine options in place.
    pub fn with_virtualizer(
        mut self,
        f: impl FnOnce(VirtualizerOptions<T>) -> VirtualizerOptions<T>,
    ) -> Self {
        self.virtualizer = f(self.virtualizer);
        self
    }

    /// Engine options with the list-level shorthands applied.
    fn resolve_virtualizer(&self) -> VirtualizerOptions<T> {
        let mut options = self.virtualizer.clone();
        if let Some(size) = self.item_height {
            options = options.with_item_size(size);
        }
        if options.initial_rect.is_none() {
            options.initial_rect = Some(Rect::from_size(
                self.width.unwrap_or(DEFAULT_WIDTH),
                self.height.unwrap_or(DEFAULT_HEIGHT),
                Axis::from_horizontal(options.horizontal),
            ));
        }
        options
    }
}

impl<T> Clone for ListOptions<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            width: self.width,
            height: self.height,
            item_height: self.item_height,
            root_props: self.root_props.clone(),
            container_props: self.container_props.clone(),
            item_props: self.item_props.clone(),
            virtualizer: self.virtualizer.clone(),
        }
    }
}

impl<T> core::fmt::Debug for ListOptions<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ListOptions")
            .field("id", &self.id)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("item_height", &self.item_height)
            .field("virtualizer", &self.virtualizer)
            .finish_non_exhaustive()
    }
}

/// What an item renderer receives.
#[derive(Debug)]
pub struct ItemArgs<'a, T> {
    pub data: &'a T,
    /// Absolute positioning, `data-*` attributes and `key`, merged with `item_props`.
    pub props: Props,
    pub item: VirtualItem,
}

/// A virtualized list bound to a root element (the scroll container), an inner container
/// sized to the total extent, and absolutely positioned items.
///
/// This type does not hold any UI objects except the measurable item elements the host
/// attaches. Hosts spread [`Self::root`], [`Self::container`] and [`Self::items`] onto their
/// element tree, attach the root element to [`Self::virtualizer_mut`] as the scroll container,
/// and report item nodes through [`Self::attach_item`].
pub struct VirtualizedList<T> {
    id: String,
    container_id: String,
    width: Option<u32>,
    height: Option<u32>,
    root_props: Props,
    container_props: Props,
    item_props: Props,
    v: Virtualizer<T>,
    elements: BTreeMap<ItemKey, Box<dyn MeasureElement>>,
}

impl<T: 'static> VirtualizedList<T> {
    pub fn new(options: ListOptions<T>, data: Vec<T>) -> Self {
        let virtualizer = options.resolve_virtualizer();
        let id = options.id.unwrap_or_else(|| generate_id("vl"));
        let container_id = scoped_id(&id, "list");
        ddebug!(id = %id, count = data.len(), "VirtualizedList::new");
        Self {
            v: Virtualizer::new(virtualizer, data),
            id,
            container_id,
            width: options.width,
            height: options.height,
            root_props: options.root_props,
            container_props: options.container_props,
            item_props: options.item_props,
            elements: BTreeMap::new(),
        }
    }
}

impl<T> VirtualizedList<T> {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn count(&self) -> usize {
        self.v.count()
    }

    pub fn virtualizer(&self) -> &Virtualizer<T> {
        &self.v
    }

    pub fn virtualizer_mut(&mut self) -> &mut Virtualizer<T> {
        &mut self.v
    }

    pub fn into_virtualizer(self) -> Virtualizer<T> {
        self.v
    }

    fn horizontal(&self) -> bool {
        self.v.options().horizontal
    }

    fn axis(&self) -> Axis {
        Axis::from_horizontal(self.horizontal())
    }

    /// Props for the scroll container element.
    pub fn root(&self) -> Props {
        let horizontal = self.horizontal();
        let style = Style::new()
            .with("overflow-y", if horizontal { "hidden" } else { "auto" })
            .with("overflow-x", if horizontal { "auto" } else { "hidden" })
            .with("position", "relative")
            .with(
                "height",
                self.height.map(px).unwrap_or_else(|| px(DEFAULT_HEIGHT)),
            )
            .with("width", self.width.map(px).unwrap_or_else(|| "100%".into()));
        let mut props = Props::new().with("id", self.id.as_str()).with_style(style);
        if horizontal {
            props.set("data-horizontal", "");
        }
        props
            .with("data-list-id", self.id.as_str())
            .merged(&self.root_props)
    }

    /// Props for the inner element spanning the total extent.
    pub fn container(&self) -> Props {
        let total = px(self.v.total_extent());
        let style = if self.horizontal() {
            Style::new()
                .with("position", "relative")
                .with("height", "100%")
                .with("width", total)
        } else {
            Style::new()
                .with("position", "relative")
                .with("height", total)
                .with("width", "100%")
        };
        Props::new()
            .with_style(style)
            .with("data-list-container", self.container_id.as_str())
            .merged(&self.container_props)
    }

    /// Props for one rendered item.
    pub fn item_props(&self, item: &VirtualItem) -> Props {
        let start = px(item.start);
        let size = px(item.size);
        let style = if self.horizontal() {
            let side = if self.v.options().is_rtl { "right" } else { "left" };
            Style::new()
                .with("position", "absolute")
                .with("top", "0")
                .with(side, start)
                .with("width", size)
                .with("height", "100%")
        } else {
            Style::new()
                .with("position", "absolute")
                .with("top", start)
                .with("left", "0")
                .with("width", "100%")
                .with("height", size)
        };
        Props::new()
            .with_style(style)
            .with("data-list-item", "true")
            .with("data-index", item.index)
            .with("key", item.key.clone())
            .merged(&self.item_props)
    }

    /// The items to render (visible plus overscan), in index order.
    pub fn virtual_items(&self) -> Vec<VirtualItem> {
        self.v.visible_items()
    }

    /// Calls `render` for each item to render and collects the results.
    pub fn items<R>(&self, mut render: impl FnMut(ItemArgs<'_, T>) -> R) -> Vec<R> {
        let mut out = Vec::new();
        self.v.for_each_visible_item(|item| {
            let Some(data) = self.v.item_data(item.index) else {
                return;
            };
            let props = self.item_props(&item);
            out.push(render(ItemArgs { data, props, item }));
        });
        out
    }

    /// Tracks a rendered item node and records its measured extent.
    ///
    /// Returns `true` when the layout changed.
    pub fn attach_item(&mut self, key: ItemKey, element: Box<dyn MeasureElement>) -> bool {
        if self.v.is_disposed() {
            return false;
        }
        self.elements.insert(key.clone(), element);
        self.measure_item(&key)
    }

    /// Re-reads the extent of an attached node, e.g. from a resize observer callback.
    pub fn measure_item(&mut self, key: &ItemKey) -> bool {
        let axis = self.axis();
        let Some(element) = self.elements.get(key) else {
            return false;
        };
        let extent = to_units(element.extent(axis));
        dtrace!(key = %key, extent, "measure_item");
        self.v.report_measurement(key, extent)
    }

    /// Re-reads every attached node with one notification.
    pub fn measure_all(&mut self) {
        let axis = self.axis();
        let measurements: Vec<(ItemKey, u32)> = self
            .elements
            .iter()
            .map(|(key, element)| (key.clone(), to_units(element.extent(axis))))
            .collect();
        self.v.report_measurements(measurements);
    }

    /// Stops tracking a node. Its measurement stays cached.
    pub fn detach_item(&mut self, key: &ItemKey) -> Option<Box<dyn MeasureElement>> {
        self.elements.remove(key)
    }

    pub fn attached_len(&self) -> usize {
        self.elements.len()
    }

    /// Replaces the data snapshot. Nodes of items that left the data source are released.
    pub fn on_data_source_change(&mut self, data: Vec<T>) {
        self.v.on_data_source_change(data);
        let v = &self.v;
        self.elements.retain(|key, _| v.index_of_key(key).is_some());
    }

    /// Like [`Self::on_data_source_change`], but keeps the first visible item at the same
    /// position on screen (e.g. when older messages are prepended to a chat).
    ///
    /// Returns `true` when the anchor could be restored.
    pub fn on_data_source_change_anchored(&mut self, data: Vec<T>) -> bool {
        let anchor = capture_first_visible_anchor(&self.v);
        self.on_data_source_change(data);
        match anchor {
            Some(anchor) => apply_anchor(&mut self.v, &anchor),
            None => false,
        }
    }

    /// Disposes the engine and releases all attached nodes.
    pub fn dispose(&mut self) {
        self.v.dispose();
        self.elements.clear();
    }
}

impl<T> core::fmt::Debug for VirtualizedList<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VirtualizedList")
            .field("id", &self.id)
            .field("virtualizer", &self.v)
            .field("attached", &self.elements.len())
            .finish_non_exhaustive()
    }
}
