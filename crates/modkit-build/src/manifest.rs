//! Module manifest parsing (`*.gwt.xml`)
//!
//! Recognized elements under the `<module>` root:
//! `inherits`, `entry-point`, `servlet`, `source`, `super-source` and
//! `public`, plus the root `rename-to` attribute. Anything else is ignored.

use crate::descriptor::{BackingLocation, ModuleDescriptor};
use roxmltree::{Document, Node, ParsingOptions};
use thiserror::Error;

/// Reasons a manifest cannot be turned into a descriptor
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("expected <module> root element, found <{0}>")]
    UnexpectedRoot(String),

    #[error("<{element}> is missing required attribute '{attribute}'")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive read failed: {0}")]
    Archive(#[from] zip::result::ZipError),
}

/// Parse manifest text into a descriptor for `name`
pub fn parse_manifest(
    name: &str,
    content: &str,
    location: BackingLocation,
) -> Result<ModuleDescriptor, ManifestError> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(content, options)?;
    let root = doc.root_element();

    if root.tag_name().name() != "module" {
        return Err(ManifestError::UnexpectedRoot(
            root.tag_name().name().to_string(),
        ));
    }

    let mut module = ModuleDescriptor::new(name, location);
    if let Some(rename_to) = root.attribute("rename-to").filter(|r| !r.is_empty()) {
        module = module.with_rename_to(rename_to);
    }

    let mut source_paths = Vec::new();
    let mut super_source_paths = Vec::new();

    for child in root.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "inherits" => module = module.with_inherits(required(&child, "inherits", "name")?),
            "entry-point" => {
                module = module.with_entry_point(required(&child, "entry-point", "class")?)
            }
            "servlet" => {
                let path = required(&child, "servlet", "path")?;
                let class = required(&child, "servlet", "class")?;
                module = module.with_servlet(path, class);
            }
            "source" => source_paths.push(required(&child, "source", "path")?.to_string()),
            "super-source" => {
                super_source_paths.push(required(&child, "super-source", "path")?.to_string())
            }
            "public" => module = module.with_public_path(required(&child, "public", "path")?),
            _ => {}
        }
    }

    if !source_paths.is_empty() {
        module = module.with_source_paths(source_paths);
    }

    Ok(module.with_super_source_paths(super_source_paths))
}

fn required<'a>(
    node: &Node<'a, '_>,
    element: &'static str,
    attribute: &'static str,
) -> Result<&'a str, ManifestError> {
    node.attribute(attribute)
        .ok_or(ManifestError::MissingAttribute { element, attribute })
}
