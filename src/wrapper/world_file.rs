//! World files placed by world sub-objects
//!
//! ```xml
//! <world>
//!   <object>
//!     <classname>Tree</classname>
//!     <position x="1" y="0" z="2"/>
//!     <scaling x="1" y="1" z="1"/>
//!     <rotation x="0" y="90" z="0"/>
//!     <property key="color">1 0 0</property>
//!     <texture name="bark">
//!       <skin>/skins/bark.deskin</skin>
//!       <transform>
//!         <translation u="0" v="0"/>
//!         <scaling u="1" v="1"/>
//!         <rotation>0</rotation>
//!       </transform>
//!       <tint r="1" g="1" b="1"/>
//!     </texture>
//!   </object>
//! </world>
//! ```
//!
//! Unknown elements are skipped so newer world files still place their
//! objects.

use std::collections::BTreeMap;

use glam::{DVec3, Vec2, Vec3};
use roxmltree::{Document, Node};

use crate::codec::Color;
use crate::error::{IgdeError, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorldFile {
    pub objects: Vec<WorldFileObject>,
}

impl WorldFile {
    /// Skin paths of all texture replacements, sorted and unique
    pub fn texture_skin_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .objects
            .iter()
            .flat_map(|o| o.textures.iter())
            .map(|t| t.skin_path.clone())
            .filter(|p| !p.is_empty())
            .collect();
        paths.sort();
        paths.dedup();
        paths
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorldFileObject {
    pub class_name: String,
    pub position: DVec3,
    pub scaling: Vec3,
    /// Euler angles in degrees
    pub rotation: Vec3,
    pub properties: BTreeMap<String, String>,
    pub textures: Vec<WorldFileTexture>,
}

impl Default for WorldFileObject {
    fn default() -> Self {
        Self {
            class_name: String::new(),
            position: DVec3::ZERO,
            scaling: Vec3::ONE,
            rotation: Vec3::ZERO,
            properties: BTreeMap::new(),
            textures: Vec::new(),
        }
    }
}

/// Texture replacement of a placed object
#[derive(Debug, Clone, PartialEq)]
pub struct WorldFileTexture {
    pub name: String,
    pub skin_path: String,
    pub translation: Vec2,
    pub scaling: Vec2,
    /// Rotation in degrees
    pub rotation: f32,
    pub tint: Color,
}

impl WorldFileTexture {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            skin_path: String::new(),
            translation: Vec2::ZERO,
            scaling: Vec2::ONE,
            rotation: 0.0,
            tint: Color::WHITE,
        }
    }
}

/// Parse the world file `text` read from `path`
pub fn parse_world(path: &str, text: &str) -> Result<WorldFile> {
    let document = Document::parse(text).map_err(|e| IgdeError::world_file(path, e.to_string()))?;
    let root = document.root_element();
    if !root.has_tag_name("world") {
        return Err(IgdeError::world_file(
            path,
            format!("unexpected root element '{}'", root.tag_name().name()),
        ));
    }

    let mut world = WorldFile::default();
    for child in root.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "object" => world.objects.push(parse_object(path, child)?),
            other => log::debug!("World '{}': skipping element '{}'", path, other),
        }
    }
    Ok(world)
}

fn parse_object(path: &str, node: Node<'_, '_>) -> Result<WorldFileObject> {
    let mut object = WorldFileObject::default();

    for child in node.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "classname" => object.class_name = text(child).to_string(),
            "position" => {
                object.position = DVec3::new(
                    attribute(path, child, "x", 0.0)?,
                    attribute(path, child, "y", 0.0)?,
                    attribute(path, child, "z", 0.0)?,
                );
            }
            "scaling" => object.scaling = vector_attributes(path, child, Vec3::ONE)?,
            "rotation" => object.rotation = vector_attributes(path, child, Vec3::ZERO)?,
            "property" => {
                let key = child.attribute("key").ok_or_else(|| {
                    IgdeError::world_file(path, "property without key attribute")
                })?;
                object
                    .properties
                    .insert(key.to_string(), child.text().unwrap_or("").to_string());
            }
            "texture" => object.textures.push(parse_texture(path, child)?),
            other => log::debug!("World '{}': skipping object element '{}'", path, other),
        }
    }

    if object.class_name.is_empty() {
        return Err(IgdeError::world_file(path, "object without class name"));
    }
    Ok(object)
}

fn parse_texture(path: &str, node: Node<'_, '_>) -> Result<WorldFileTexture> {
    let name = node
        .attribute("name")
        .ok_or_else(|| IgdeError::world_file(path, "texture without name attribute"))?;
    let mut texture = WorldFileTexture::new(name);

    for child in node.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "skin" => texture.skin_path = text(child).to_string(),
            "transform" => {
                for element in child.children().filter(Node::is_element) {
                    match element.tag_name().name() {
                        "translation" => {
                            texture.translation = uv_attributes(path, element, Vec2::ZERO)?;
                        }
                        "scaling" => texture.scaling = uv_attributes(path, element, Vec2::ONE)?,
                        "rotation" => texture.rotation = parse_f32(path, text(element))?,
                        other => {
                            log::debug!("World '{}': skipping transform element '{}'", path, other)
                        }
                    }
                }
            }
            "tint" => {
                texture.tint = Color::rgb(
                    attribute(path, child, "r", 1.0)? as f32,
                    attribute(path, child, "g", 1.0)? as f32,
                    attribute(path, child, "b", 1.0)? as f32,
                );
            }
            other => log::debug!("World '{}': skipping texture element '{}'", path, other),
        }
    }
    Ok(texture)
}

fn text<'a>(node: Node<'a, '_>) -> &'a str {
    node.text().map_or("", str::trim)
}

fn attribute(path: &str, node: Node<'_, '_>, name: &str, default: f64) -> Result<f64> {
    match node.attribute(name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| {
            IgdeError::world_file(
                path,
                format!("invalid attribute {}='{}' of <{}>", name, value, node.tag_name().name()),
            )
        }),
    }
}

fn parse_f32(path: &str, value: &str) -> Result<f32> {
    value
        .parse()
        .map_err(|_| IgdeError::world_file(path, format!("invalid number '{}'", value)))
}

fn vector_attributes(path: &str, node: Node<'_, '_>, default: Vec3) -> Result<Vec3> {
    Ok(Vec3::new(
        attribute(path, node, "x", default.x as f64)? as f32,
        attribute(path, node, "y", default.y as f64)? as f32,
        attribute(path, node, "z", default.z as f64)? as f32,
    ))
}

fn uv_attributes(path: &str, node: Node<'_, '_>, default: Vec2) -> Result<Vec2> {
    Ok(Vec2::new(
        attribute(path, node, "u", default.x as f64)? as f32,
        attribute(path, node, "v", default.y as f64)? as f32,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORLD: &str = r#"
        <world>
            <object>
                <classname>Tree</classname>
                <position x="1" y="0" z="2.5"/>
                <scaling x="2" y="2" z="2"/>
                <rotation y="90"/>
                <property key="color">1 0 0</property>
                <property key="empty"/>
                <texture name="bark">
                    <skin>/skins/bark.deskin</skin>
                    <transform>
                        <translation u="0.5" v="0"/>
                        <scaling u="2"/>
                        <rotation>45</rotation>
                    </transform>
                    <tint r="0.5" g="1" b="1"/>
                </texture>
                <lights>ignored</lights>
            </object>
            <object><classname>Rock</classname></object>
        </world>"#;

    #[test]
    fn test_parse_objects() {
        let world = parse_world("/w.deworld", WORLD).unwrap();
        assert_eq!(world.objects.len(), 2);

        let tree = &world.objects[0];
        assert_eq!(tree.class_name, "Tree");
        assert_eq!(tree.position, DVec3::new(1.0, 0.0, 2.5));
        assert_eq!(tree.scaling, Vec3::splat(2.0));
        assert_eq!(tree.rotation, Vec3::new(0.0, 90.0, 0.0));
        assert_eq!(tree.properties["color"], "1 0 0");
        assert_eq!(tree.properties["empty"], "");

        let bark = &tree.textures[0];
        assert_eq!(bark.skin_path, "/skins/bark.deskin");
        assert_eq!(bark.translation, Vec2::new(0.5, 0.0));
        assert_eq!(bark.scaling, Vec2::new(2.0, 1.0));
        assert_eq!(bark.rotation, 45.0);
        assert_eq!(bark.tint, Color::rgb(0.5, 1.0, 1.0));

        let rock = &world.objects[1];
        assert_eq!(rock.scaling, Vec3::ONE);
        assert!(rock.textures.is_empty());
    }

    #[test]
    fn test_texture_skin_paths() {
        let world = parse_world(
            "/w",
            r#"<world>
                <object><classname>A</classname>
                    <texture name="x"><skin>/b.deskin</skin></texture>
                    <texture name="y"><skin>/a.deskin</skin></texture>
                </object>
                <object><classname>B</classname>
                    <texture name="x"><skin>/b.deskin</skin></texture>
                    <texture name="z"/>
                </object>
            </world>"#,
        )
        .unwrap();
        assert_eq!(world.texture_skin_paths(), vec!["/a.deskin", "/b.deskin"]);
    }

    #[test]
    fn test_reject_malformed() {
        assert!(parse_world("/w", "<world><object>").is_err());
        assert!(parse_world("/w", "<animator/>").is_err());
        assert!(parse_world("/w", "<world><object/></world>").is_err());
        let err = parse_world(
            "/w",
            r#"<world><object><classname>A</classname><position x="one"/></object></world>"#,
        )
        .unwrap_err();
        assert!(matches!(err, IgdeError::WorldFile { .. }));
    }
}
