//! Animator file reader
//!
//! Only the controllers are read, the editor drives nothing else:
//!
//! ```xml
//! <animator>
//!   <controller>
//!     <name>playback</name>
//!     <limits minimum="0" maximum="2.5"/>
//!     <clamp>false</clamp>
//!   </controller>
//! </animator>
//! ```

use roxmltree::{Document, Node};

use crate::codec;
use crate::engine::{Animator, AnimatorController};
use crate::error::{IgdeError, Result};

pub(crate) fn parse_animator(path: &str, text: &str) -> Result<Animator> {
    let document = Document::parse(text).map_err(|e| IgdeError::animator_file(path, e.to_string()))?;
    let root = document.root_element();
    if root.tag_name().name() != "animator" {
        return Err(IgdeError::animator_file(
            path,
            format!("unexpected root element '{}'", root.tag_name().name()),
        ));
    }

    let controllers = root
        .children()
        .filter(|n| n.has_tag_name("controller"))
        .map(|n| parse_controller(path, n))
        .collect::<Result<Vec<_>>>()?;

    Ok(Animator {
        path: path.to_string(),
        animation: None,
        rig: None,
        move_name: String::new(),
        controllers,
        apply_count: 0,
    })
}

fn parse_controller(path: &str, node: Node<'_, '_>) -> Result<AnimatorController> {
    let mut controller = AnimatorController {
        name: String::new(),
        minimum: 0.0,
        maximum: 1.0,
        value: 0.0,
        clamp: true,
    };

    for child in node.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "name" => controller.name = child.text().unwrap_or("").trim().to_string(),
            "limits" => {
                controller.minimum = float_attribute(path, child, "minimum", controller.minimum)?;
                controller.maximum = float_attribute(path, child, "maximum", controller.maximum)?;
            }
            "clamp" => {
                let text = child.text().unwrap_or("");
                controller.clamp = codec::decode_bool(text).ok_or_else(|| {
                    IgdeError::animator_file(path, format!("invalid clamp value '{}'", text))
                })?;
            }
            other => log::debug!("Animator '{}': ignoring controller element '{}'", path, other),
        }
    }

    controller.value = controller.minimum;
    Ok(controller)
}

fn float_attribute(path: &str, node: Node<'_, '_>, name: &str, default: f32) -> Result<f32> {
    match node.attribute(name) {
        None => Ok(default),
        Some(value) => codec::decode_float(value).ok_or_else(|| {
            IgdeError::animator_file(path, format!("invalid {} value '{}'", name, value))
        }),
    }
}
