use tracing::instrument;

use crate::representation::node::{ObjectNode, RepresentationField, RepresentationNode};

fn find_field(fields: &[RepresentationField], field: &RepresentationField) -> Option<usize> {
    fields
        .iter()
        .position(|f| f.name == field.name && f.on_type_names == field.on_type_names)
}

fn merge_objects(left: &mut ObjectNode, right: ObjectNode) {
    for field in right.fields {
        match find_field(&left.fields, &field) {
            Some(index) => merge_fields(&mut left.fields[index], field),
            None => left.fields.push(field),
        }
    }
}

fn merge_fields(left: &mut RepresentationField, right: RepresentationField) {
    match (&mut left.value, right.value) {
        (RepresentationNode::Object(left_object), RepresentationNode::Object(right_object)) => {
            merge_objects(left_object, right_object)
        }
        (RepresentationNode::Array(left_array), RepresentationNode::Array(right_array)) => {
            if let (RepresentationNode::Object(left_item), RepresentationNode::Object(right_item)) =
                (left_array.item.as_mut(), *right_array.item)
            {
                merge_objects(left_item, right_item);
            }
        }
        _ => {}
    }
}

/// Unions the templates of several field sets into one object.
///
/// Fields are identified by name and type guard, first occurrence wins the position.
/// Nested objects, including array items, are merged field by field.
#[instrument(level = "trace", skip_all, fields(count = nodes.len()))]
pub fn merge_representation_nodes(nodes: Vec<ObjectNode>) -> ObjectNode {
    let capacity = nodes.iter().map(|node| node.fields.len()).sum();
    let mut merged = ObjectNode {
        path: vec![],
        nullable: true,
        fields: Vec::with_capacity(capacity),
    };

    for node in nodes {
        merge_objects(&mut merged, node);
    }

    merged
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use hive_router_composer_config::federation::FederationFieldConfig;

    use super::merge_representation_nodes;
    use crate::{
        federation::FederationMetadata,
        representation::{ObjectNode, RepresentationBuilder, RepresentationNode},
        schema::SchemaIndex,
        utils::{parsing::parse_schema, pretty_display::PrettyDisplay},
    };

    fn build(schema: &SchemaIndex, type_name: &str, field_set: &str) -> ObjectNode {
        let federation = FederationMetadata::default();
        RepresentationBuilder::new(schema, &federation)
            .build(&FederationFieldConfig {
                type_name: type_name.to_string(),
                selection_set: field_set.to_string(),
                ..Default::default()
            })
            .unwrap()
    }

    fn schema() -> SchemaIndex {
        SchemaIndex::new(
            &parse_schema(
                r#"
                type Query { user: User }
                type User { id: ID! info: Info history: [Info!]! }
                type Info { a: String b: String c: String }
                type Product { upc: String! }
                "#,
            )
            .unwrap(),
        )
    }

    fn field_set(node: &ObjectNode) -> BTreeSet<(String, Vec<String>)> {
        node.fields
            .iter()
            .map(|f| (f.name.clone(), f.on_type_names.clone()))
            .collect()
    }

    #[test]
    fn merges_nested_objects_and_array_items() {
        let schema = schema();
        let merged = merge_representation_nodes(vec![
            build(&schema, "User", "id info { a } history { a }"),
            build(&schema, "User", "info { b } history { c }"),
            build(&schema, "Product", "upc"),
        ]);

        insta::assert_snapshot!(format!("{}", RepresentationNode::Object(merged).pretty()), @r#"
        {
          __typename on [User]: String(__typename)
          id on [User]: Custom(id)
          info on [User]: Object(info)? {
            a: String(a)?
            b: String(b)?
          }
          history on [User]: Array(history) [{
            a: String(a)?
            c: String(c)?
          }]
          __typename on [Product]: String(__typename)
          upc on [Product]: String(upc)
        }
        "#);
    }

    #[test]
    fn merge_is_idempotent_and_commutative_in_fields() {
        let schema = schema();
        let a = build(&schema, "User", "id info { a }");
        let b = build(&schema, "Product", "upc");

        let once = merge_representation_nodes(vec![a.clone()]);
        let twice = merge_representation_nodes(vec![a.clone(), a.clone()]);
        assert_eq!(once, twice);

        let ab = merge_representation_nodes(vec![a.clone(), b.clone()]);
        let ba = merge_representation_nodes(vec![b, a]);
        assert_eq!(field_set(&ab), field_set(&ba));
    }
}
