use crate::{
    ast::{Directive, Selection, SelectionSetId, UpstreamDocument, Value},
    schema::OperationKind,
};

/// Prints the document in the compact form sent upstream:
/// no indentation, a single space between sibling selections.
pub fn print_document(document: &UpstreamDocument, out: &mut String) {
    let operation = &document.operation;
    let anonymous_query = operation.kind == OperationKind::Query
        && operation.variable_definitions.is_empty()
        && operation.directives.is_empty();

    if !anonymous_query {
        out.push_str(operation.kind.as_str());

        if !operation.variable_definitions.is_empty() {
            out.push('(');
            for (i, definition) in operation.variable_definitions.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push('$');
                out.push_str(&definition.name);
                out.push_str(": ");
                out.push_str(&definition.var_type.to_string());
                if let Some(default_value) = &definition.default_value {
                    out.push_str(" = ");
                    default_value.write_to(out);
                }
            }
            out.push(')');
        }

        print_directives(&operation.directives, out);

        if operation.variable_definitions.is_empty() || !operation.directives.is_empty() {
            out.push(' ');
        }
    }

    match operation.selection_set {
        Some(root) => print_selection_set(document, root, out),
        None => out.push_str("{}"),
    }
}

fn print_selection_set(document: &UpstreamDocument, id: SelectionSetId, out: &mut String) {
    out.push('{');
    for (i, item) in document.selection_set(id).items.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }

        match item {
            Selection::Field(field_id) => {
                let field = document.field(*field_id);
                if let Some(alias) = &field.alias {
                    out.push_str(alias);
                    out.push_str(": ");
                }
                out.push_str(&field.name);
                print_arguments(&field.arguments, out);
                print_directives(&field.directives, out);

                if let Some(selection_set) = field.selection_set {
                    if field.arguments.is_empty() || !field.directives.is_empty() {
                        out.push(' ');
                    }
                    print_selection_set(document, selection_set, out);
                }
            }
            Selection::InlineFragment(fragment_id) => {
                let fragment = document.inline_fragment(*fragment_id);
                out.push_str("...");
                if let Some(type_condition) = &fragment.type_condition {
                    out.push_str(" on ");
                    out.push_str(type_condition);
                }
                print_directives(&fragment.directives, out);
                out.push(' ');
                match fragment.selection_set {
                    Some(selection_set) => print_selection_set(document, selection_set, out),
                    None => out.push_str("{}"),
                }
            }
        }
    }
    out.push('}');
}

fn print_arguments(arguments: &[(String, Value)], out: &mut String) {
    if arguments.is_empty() {
        return;
    }

    out.push('(');
    for (i, (name, value)) in arguments.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(name);
        out.push_str(": ");
        value.write_to(out);
    }
    out.push(')');
}

fn print_directives(directives: &[Directive], out: &mut String) {
    for directive in directives {
        out.push_str(" @");
        out.push_str(&directive.name);
        print_arguments(&directive.arguments, out);
    }
}

#[cfg(test)]
mod tests {
    use super::print_document;
    use crate::{
        ast::{Directive, Field, InlineFragment, UpstreamDocument, Value, VariableDefinition},
        schema::{OperationKind, TypeNode},
    };

    #[test]
    fn prints_anonymous_query() {
        let mut document = UpstreamDocument::default();
        let root = document.new_selection_set();
        document.operation.selection_set = Some(root);
        let user = document.add_field(root, Field::new("user"));
        let user_set = document.field_selection_set(user);
        document.add_field(user_set, Field::new("id"));
        document.add_field(
            user_set,
            Field::new("username").with_alias(Some("name".to_string())),
        );

        let mut out = String::new();
        print_document(&document, &mut out);
        insta::assert_snapshot!(out, @"{user {id name: username}}");
    }

    #[test]
    fn prints_variables_arguments_and_fragments() {
        let mut document = UpstreamDocument::default();
        let root = document.new_selection_set();
        document.operation.selection_set = Some(root);
        document.add_variable_definition(VariableDefinition {
            name: "representations".to_string(),
            var_type: TypeNode::NonNull(Box::new(TypeNode::List(Box::new(TypeNode::NonNull(
                Box::new(TypeNode::named("_Any")),
            ))))),
            default_value: None,
        });
        document.add_variable_definition(VariableDefinition {
            name: "skip".to_string(),
            var_type: TypeNode::named("Boolean"),
            default_value: Some(Value::Boolean(false)),
        });

        let mut entities = Field::new("_entities");
        entities.arguments = vec![(
            "representations".to_string(),
            Value::Variable("representations".to_string()),
        )];
        let entities = document.add_field(root, entities);
        let entities_set = document.field_selection_set(entities);
        document.add_typename(entities_set);
        let fragment = document.add_inline_fragment(
            entities_set,
            InlineFragment {
                type_condition: Some("User".to_string()),
                directives: vec![Directive {
                    name: "skip".to_string(),
                    arguments: vec![("if".to_string(), Value::Variable("skip".to_string()))],
                }],
                selection_set: None,
            },
        );
        let fragment_set = document.inline_fragment_selection_set(fragment);
        document.add_field(fragment_set, Field::new("name"));

        let mut out = String::new();
        print_document(&document, &mut out);
        insta::assert_snapshot!(out, @"query($representations: [_Any!]!, $skip: Boolean = false){_entities(representations: $representations){__typename ... on User @skip(if: $skip) {name}}}");
    }

    #[test]
    fn prints_subscription_keyword() {
        let mut document = UpstreamDocument::default();
        document.operation.kind = OperationKind::Subscription;
        let root = document.new_selection_set();
        document.operation.selection_set = Some(root);
        document.add_field(root, Field::new("reviewAdded"));

        let mut out = String::new();
        print_document(&document, &mut out);
        insta::assert_snapshot!(out, @"subscription {reviewAdded}");
    }
}
