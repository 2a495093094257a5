// Example: render a list into an HTML-ish string and feed measurements back.
use list_virtualizer_dom::{FixedElement, ListOptions, Props, Style, VirtualizedList};

fn open_tag(tag: &str, props: &Props) -> String {
    let mut out = format!("<{tag}");
    for (name, value) in props.attrs() {
        out.push_str(&format!(" {name}=\"{value}\""));
    }
    if !props.style.is_empty() {
        out.push_str(&format!(" style=\"{}\"", props.style));
    }
    out.push('>');
    out
}

fn render(list: &VirtualizedList<String>) -> String {
    let mut html = open_tag("div", &list.root());
    html.push_str(&open_tag("div", &list.container()));
    for row in list.items(|args| format!("{}{}</div>", open_tag("div", &args.props), args.data)) {
        html.push_str("\n  ");
        html.push_str(&row);
    }
    html.push_str("\n</div></div>");
    html
}

fn main() {
    let rows: Vec<String> = (0..1_000).map(|i| format!("row {i}")).collect();
    let mut list = VirtualizedList::new(
        ListOptions::new()
            .with_id("demo")
            .with_height(200)
            .with_item_height(32)
            .with_item_props(Props::new().with("class", "row"))
            .with_root_props(Props::new().with_style(Style::new().with("border", "1px solid"))),
        rows,
    );

    println!("{}", render(&list));

    // Pretend the host laid out the rendered rows: every third one wraps to two lines.
    for item in list.virtual_items() {
        let height = if item.index % 3 == 0 { 56.0 } else { 32.0 };
        list.attach_item(item.key, Box::new(FixedElement { width: 600.0, height }));
    }
    println!(
        "attached={} total_extent={}",
        list.attached_len(),
        list.virtualizer().total_extent()
    );
    println!("{}", render(&list));
}
