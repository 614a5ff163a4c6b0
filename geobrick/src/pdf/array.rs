use std::ops::{Deref, DerefMut};

use super::Object;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Array(Vec<Object>);

impl Array {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Array of plain reals.
    pub fn reals(values: &[f64]) -> Self {
        Self(values.iter().map(|&v| Object::from(v)).collect())
    }

    /// Array of reals written in the numeric-as-string form.
    pub fn precise_reals(values: &[f64]) -> Self {
        Self(values.iter().map(|&v| Object::precise(v)).collect())
    }
}

impl Deref for Array {
    type Target = Vec<Object>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Array {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<Object>> for Array {
    fn from(objects: Vec<Object>) -> Self {
        Self(objects)
    }
}

impl<const N: usize> From<[Object; N]> for Array {
    fn from(objects: [Object; N]) -> Self {
        Self(objects.to_vec())
    }
}

impl std::fmt::Display for Array {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Array [")?;
        for obj in self.iter() {
            write!(f, "\n  {}", obj)?;
        }
        write!(f, "]")?;
        Ok(())
    }
}
