//! Game definition classes

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{
    GdBillboard, GdComponent, GdEnvMapProbe, GdForceField, GdLight, GdNavigationBlocker,
    GdNavigationSpace, GdParticleEmitter, GdProperty, GdSpeaker, GdTexture, GdWorld,
};

/// Inheritance link to another class
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GdClassInherit {
    /// Name of the inherited class
    pub name: String,
    /// Prefix prepended to the inherited class' property names
    pub property_prefix: String,
    /// Resolved class, set when the game definition is built
    #[serde(skip)]
    pub class: Option<Arc<GdClass>>,
}

impl GdClassInherit {
    pub fn new(name: impl Into<String>, property_prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            property_prefix: property_prefix.into(),
            class: None,
        }
    }
}

/// Object class of a game definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GdClass {
    pub name: String,
    pub description: String,
    pub properties: Vec<GdProperty>,
    /// Class level overrides of property defaults, including inherited ones
    pub property_values: BTreeMap<String, String>,
    pub inherits: Vec<GdClassInherit>,
    /// Which sub-object kinds inherited classes contribute, see the `FILTER_*` masks
    pub inherit_sub_objects: u32,
    pub component_textures: Vec<GdTexture>,
    pub components: Vec<GdComponent>,
    pub billboards: Vec<GdBillboard>,
    pub lights: Vec<GdLight>,
    pub speakers: Vec<GdSpeaker>,
    pub particle_emitters: Vec<GdParticleEmitter>,
    pub force_fields: Vec<GdForceField>,
    pub env_map_probes: Vec<GdEnvMapProbe>,
    pub navigation_spaces: Vec<GdNavigationSpace>,
    pub navigation_blockers: Vec<GdNavigationBlocker>,
    pub worlds: Vec<GdWorld>,
}

impl Default for GdClass {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            properties: Vec::new(),
            property_values: BTreeMap::new(),
            inherits: Vec::new(),
            inherit_sub_objects: Self::FILTER_ALL,
            component_textures: Vec::new(),
            components: Vec::new(),
            billboards: Vec::new(),
            lights: Vec::new(),
            speakers: Vec::new(),
            particle_emitters: Vec::new(),
            force_fields: Vec::new(),
            env_map_probes: Vec::new(),
            navigation_spaces: Vec::new(),
            navigation_blockers: Vec::new(),
            worlds: Vec::new(),
        }
    }
}

impl GdClass {
    pub const FILTER_BILLBOARDS: u32 = 0x1;
    pub const FILTER_COMPONENTS: u32 = 0x2;
    pub const FILTER_LIGHTS: u32 = 0x4;
    pub const FILTER_SNAP_POINTS: u32 = 0x8;
    pub const FILTER_PARTICLE_EMITTERS: u32 = 0x10;
    pub const FILTER_FORCE_FIELDS: u32 = 0x20;
    pub const FILTER_ENV_MAP_PROBES: u32 = 0x40;
    pub const FILTER_SPEAKERS: u32 = 0x80;
    pub const FILTER_NAVIGATION_SPACES: u32 = 0x100;
    pub const FILTER_NAVIGATION_BLOCKERS: u32 = 0x200;
    pub const FILTER_WORLDS: u32 = 0x400;
    pub const FILTER_ALL: u32 = 0x7ff;

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Find a property declared by this class or an inherited one. Inherited
    /// properties are named with their inheritance prefix.
    pub fn property_named(&self, name: &str) -> Option<&GdProperty> {
        if let Some(property) = self.properties.iter().find(|p| p.name == name) {
            return Some(property);
        }

        self.inherits.iter().find_map(|inherit| {
            let class = inherit.class.as_ref()?;
            let stripped = name.strip_prefix(inherit.property_prefix.as_str())?;
            class.property_named(stripped)
        })
    }

    /// Default value of a property. Class level overrides win over declared
    /// defaults, which win over inherited classes whose prefix matches.
    pub fn default_property_value(&self, name: &str) -> Option<&str> {
        if let Some(value) = self.property_values.get(name) {
            return Some(value);
        }

        if let Some(property) = self.properties.iter().find(|p| p.name == name) {
            return Some(&property.default_value);
        }

        self.inherits.iter().find_map(|inherit| {
            let class = inherit.class.as_ref()?;
            let stripped = name.strip_prefix(inherit.property_prefix.as_str())?;
            class.default_property_value(stripped)
        })
    }

    pub fn has_default_property_value(&self, name: &str) -> bool {
        self.default_property_value(name).is_some()
    }

    /// Component textures of this class and all inherited classes. The first
    /// texture of a name wins.
    pub fn deep_component_textures(&self) -> Vec<GdTexture> {
        let mut textures = Vec::new();
        self.collect_component_textures(&mut textures);
        textures
    }

    fn collect_component_textures(&self, textures: &mut Vec<GdTexture>) {
        for texture in &self.component_textures {
            if !textures.iter().any(|t: &GdTexture| t.name == texture.name) {
                textures.push(texture.clone());
            }
        }

        for inherit in &self.inherits {
            if let Some(class) = &inherit.class {
                class.collect_component_textures(textures);
            }
        }
    }

    /// Total number of sub-object descriptors declared by this class alone
    pub fn sub_object_count(&self) -> usize {
        self.components.len()
            + self.billboards.len()
            + self.lights.len()
            + self.speakers.len()
            + self.particle_emitters.len()
            + self.force_fields.len()
            + self.env_map_probes.len()
            + self.navigation_spaces.len()
            + self.navigation_blockers.len()
            + self.worlds.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gamedef::PropertyType;

    fn base_class() -> Arc<GdClass> {
        let mut base = GdClass::new("Base");
        base.properties
            .push(GdProperty::new("color", PropertyType::Color).with_default("1 1 1"));
        base.component_textures
            .push(GdTexture::new("bark", "/skins/base_bark.deskin"));
        base.component_textures
            .push(GdTexture::new("leaf", "/skins/base_leaf.deskin"));
        Arc::new(base)
    }

    fn derived_class() -> GdClass {
        let mut derived = GdClass::new("Derived");
        derived.properties.push(GdProperty::new("size", PropertyType::Float).with_default("2"));
        derived
            .property_values
            .insert("lamp.color".to_string(), "1 0 0".to_string());
        derived.component_textures
            .push(GdTexture::new("bark", "/skins/derived_bark.deskin"));

        let mut inherit = GdClassInherit::new("Base", "lamp.");
        inherit.class = Some(base_class());
        derived.inherits.push(inherit);
        derived
    }

    #[test]
    fn test_default_property_lookup() {
        let derived = derived_class();
        assert_eq!(derived.default_property_value("size"), Some("2"));
        assert_eq!(derived.default_property_value("lamp.color"), Some("1 0 0"));
        assert_eq!(derived.default_property_value("color"), None);
        assert!(!derived.has_default_property_value("lamp.size"));
    }

    #[test]
    fn test_inherited_property_named() {
        let derived = derived_class();
        let property = derived.property_named("lamp.color").unwrap();
        assert_eq!(property.property_type, PropertyType::Color);
        assert!(derived.property_named("color").is_none());
    }

    #[test]
    fn test_deep_component_textures() {
        let textures = derived_class().deep_component_textures();
        assert_eq!(textures.len(), 2);
        assert_eq!(textures[0].skin_path, "/skins/derived_bark.deskin");
        assert_eq!(textures[1].name, "leaf");
    }
}
