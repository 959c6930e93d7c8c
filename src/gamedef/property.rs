//! Class property declarations

use serde::{Deserialize, Serialize};

/// Value type of a class property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    #[default]
    String,
    Integer,
    Point2,
    Point3,
    Float,
    Vector2,
    Vector,
    Color,
    Boolean,
    Path,
    Range,
    Selection,
    List,
    TriggerExpression,
    TriggerTarget,
    Shape,
    ShapeList,
    Identifier,
}

/// A named property of a class with its default value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GdProperty {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    /// Default value in property string encoding
    pub default_value: String,
}

impl GdProperty {
    pub fn new(name: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            name: name.into(),
            property_type,
            ..Self::default()
        }
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = value.into();
        self
    }
}
