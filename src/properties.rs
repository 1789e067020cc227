//! Per-solid annotations that follow the solid through transforms.
//!
//! Callers can hang named geometric values off a solid (connection points,
//! mounting planes, axes); every affine transform applied to the solid is
//! applied to these as well, and boolean operations merge the annotations
//! of both operands.

use crate::float_types::Real;
use crate::solid::plane::Plane;
use hashbrown::HashMap;
use nalgebra::{Matrix4, Point3, Vector3};

/// One annotation: a leaf value or a nested map.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Point(Point3<Real>),
    Vector(Vector3<Real>),
    Plane(Plane),
    Map(Properties),
}

impl PropertyValue {
    /// Apply an affine transform. Points transform homogeneously, vectors
    /// by the linear part, planes by the inverse transpose rule; maps
    /// recurse.
    #[must_use]
    pub fn transform(&self, matrix: &Matrix4<Real>) -> PropertyValue {
        match self {
            PropertyValue::Point(point) => PropertyValue::Point(matrix.transform_point(point)),
            PropertyValue::Vector(vector) => {
                PropertyValue::Vector(matrix.transform_vector(vector))
            }
            PropertyValue::Plane(plane) => PropertyValue::Plane(plane.transformed(matrix)),
            PropertyValue::Map(map) => PropertyValue::Map(map.transform(matrix)),
        }
    }
}

/// A string-keyed tree of [`PropertyValue`]s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    entries: HashMap<String, PropertyValue>,
}

impl Properties {
    pub fn new() -> Self {
        Properties {
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: PropertyValue) {
        self.entries.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.entries.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn transform(&self, matrix: &Matrix4<Real>) -> Properties {
        Properties {
            entries: self
                .entries
                .iter()
                .map(|(key, value)| (key.clone(), value.transform(matrix)))
                .collect(),
        }
    }

    /// Merge two property trees, preferring `self` on key collisions.
    /// When both sides hold a sub-map under the same key, the maps merge
    /// recursively.
    #[must_use]
    pub fn merge(&self, other: &Properties) -> Properties {
        let mut entries = self.entries.clone();
        for (key, value) in &other.entries {
            match entries.get_mut(key) {
                None => {
                    entries.insert(key.clone(), value.clone());
                }
                Some(PropertyValue::Map(mine)) => {
                    if let PropertyValue::Map(theirs) = value {
                        *mine = mine.merge(theirs);
                    }
                }
                Some(_) => {}
            }
        }
        Properties { entries }
    }
}
