//! Pretty-printing of response envelopes

use pouch_core::{Envelope, Node};

/// Print the whole envelope as an indented tree.
pub fn render(envelope: &Envelope) {
    println!("Server response:");
    render_node(envelope.root(), 0);
}

fn render_node(node: &Node, indent: usize) {
    let pad = " ".repeat(indent);
    println!("{pad}{}", node.tag);

    let mut attributes = node.attributes.clone();
    attributes.sort();
    for (name, value) in attributes {
        println!("{pad}{name} --> {value}");
    }
    if let Some(text) = &node.text {
        println!("{pad}value: {text}");
    }
    for child in &node.children {
        render_node(child, indent + 2);
    }
}
