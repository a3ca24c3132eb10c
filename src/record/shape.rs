//! Record shapes: named, typed field lists with inheritance.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::schema::DataType;

/// One declared field of a shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub data_type: DataType,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Abstract record shape.
///
/// A shape lists its own fields and may extend parent shapes; the field set
/// of a synthesized record is the union of both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shape {
    name: String,
    fields: Vec<FieldSpec>,
    parents: Vec<Arc<Shape>>,
}

impl Shape {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add a field
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.fields.push(FieldSpec::new(name, data_type));
        self
    }

    /// Inherit the fields of `parent`
    #[must_use]
    pub fn extends(mut self, parent: Arc<Shape>) -> Self {
        self.parents.push(parent);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn own_fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn parents(&self) -> &[Arc<Shape>] {
        &self.parents
    }

    /// Inherited fields first, depth first, then own fields.
    ///
    /// A name declared more than once (case-insensitive) keeps its first
    /// position and takes the type of the most derived declaration.
    pub fn all_fields(&self) -> Vec<FieldSpec> {
        let mut all: Vec<FieldSpec> = Vec::new();
        for parent in &self.parents {
            merge_fields(&mut all, parent.all_fields());
        }
        merge_fields(&mut all, self.fields.clone());
        all
    }
}

fn merge_fields(into: &mut Vec<FieldSpec>, fields: Vec<FieldSpec>) {
    for field in fields {
        match into
            .iter_mut()
            .find(|f| f.name.eq_ignore_ascii_case(&field.name))
        {
            Some(existing) => existing.data_type = field.data_type,
            None => into.push(field),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_with_parents() {
        let base = Arc::new(
            Shape::new("Db")
                .field("Id", DataType::Int64)
                .field("Created", DataType::DateTime),
        );
        let user = Shape::new("User")
            .extends(base)
            .field("Name", DataType::String)
            .field("id", DataType::Int32);
        let fields = user.all_fields();
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Id", "Created", "Name"]);
        assert_eq!(user.all_fields()[0].data_type, DataType::Int32);
        assert_eq!(user.own_fields().len(), 2);
    }
}
