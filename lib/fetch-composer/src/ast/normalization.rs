use tracing::{instrument, trace};

use crate::ast::{Directive, Selection, SelectionSetId, UpstreamDocument};

/// Cleans up the synthesized operation before it is printed:
/// identical selections are merged, fragments and fields whose selections
/// were all skipped are dropped, and unused variable definitions removed.
#[instrument(level = "trace", skip_all)]
pub fn normalize(document: &mut UpstreamDocument) {
    if let Some(root) = document.operation.selection_set {
        normalize_selection_set(document, root);
    }

    remove_unused_variable_definitions(document);
}

fn normalize_selection_set(document: &mut UpstreamDocument, id: SelectionSetId) {
    let items = std::mem::take(&mut document.selection_set_mut(id).items);
    let mut kept: Vec<Selection> = Vec::with_capacity(items.len());

    for item in items {
        let mergeable = kept.iter().find_map(|existing| match (existing, &item) {
            (Selection::Field(a), Selection::Field(b)) => {
                let (a_field, b_field) = (document.field(*a), document.field(*b));
                (a_field.response_key() == b_field.response_key()
                    && a_field.name == b_field.name
                    && a_field.arguments == b_field.arguments
                    && a_field.directives == b_field.directives)
                    .then_some(*existing)
            }
            (Selection::InlineFragment(a), Selection::InlineFragment(b)) => {
                let (a_fragment, b_fragment) =
                    (document.inline_fragment(*a), document.inline_fragment(*b));
                (a_fragment.type_condition == b_fragment.type_condition
                    && a_fragment.directives == b_fragment.directives)
                    .then_some(*existing)
            }
            _ => None,
        });

        match mergeable {
            Some(target) => merge_into(document, target, item),
            None => kept.push(item),
        }
    }

    for item in &kept {
        let child = match item {
            Selection::Field(field) => document.field(*field).selection_set,
            Selection::InlineFragment(fragment) => {
                document.inline_fragment(*fragment).selection_set
            }
        };

        if let Some(child) = child {
            normalize_selection_set(document, child);
        }
    }

    kept.retain(|item| match item {
        Selection::InlineFragment(fragment) => {
            let keep = document
                .inline_fragment(*fragment)
                .selection_set
                .is_some_and(|set| !document.selection_set(set).items.is_empty());
            if !keep {
                trace!("removing empty inline fragment");
            }
            keep
        }
        // Leaf fields have no selection set; composite ones left empty are dropped.
        Selection::Field(field) => {
            let field = document.field(*field);
            let keep = field
                .selection_set
                .map_or(true, |set| !document.selection_set(set).items.is_empty());
            if !keep {
                trace!(field = %field.name, "removing field with an empty selection set");
            }
            keep
        }
    });

    document.selection_set_mut(id).items = kept;
}

fn merge_into(document: &mut UpstreamDocument, target: Selection, source: Selection) {
    let (target_set, source_set) = match (target, source) {
        (Selection::Field(target), Selection::Field(source)) => (
            document.field(target).selection_set,
            document.field(source).selection_set,
        ),
        (Selection::InlineFragment(target), Selection::InlineFragment(source)) => (
            document.inline_fragment(target).selection_set,
            document.inline_fragment(source).selection_set,
        ),
        _ => return,
    };

    match (target_set, source_set) {
        (Some(target_set), Some(source_set)) if target_set != source_set => {
            let moved = std::mem::take(&mut document.selection_set_mut(source_set).items);
            document.selection_set_mut(target_set).items.extend(moved);
        }
        (None, Some(source_set)) => match target {
            Selection::Field(field) => document.field_mut(field).selection_set = Some(source_set),
            Selection::InlineFragment(fragment) => {
                document.inline_fragment_mut(fragment).selection_set = Some(source_set)
            }
        },
        _ => {}
    }
}

fn collect_directive_variables<'a>(directives: &'a [Directive], out: &mut Vec<&'a str>) {
    for directive in directives {
        for (_, value) in &directive.arguments {
            value.collect_variables(out);
        }
    }
}

fn collect_used_variables<'a>(
    document: &'a UpstreamDocument,
    id: SelectionSetId,
    out: &mut Vec<&'a str>,
) {
    for item in &document.selection_set(id).items {
        let child = match item {
            Selection::Field(field) => {
                let field = document.field(*field);
                for (_, value) in &field.arguments {
                    value.collect_variables(out);
                }
                collect_directive_variables(&field.directives, out);
                field.selection_set
            }
            Selection::InlineFragment(fragment) => {
                let fragment = document.inline_fragment(*fragment);
                collect_directive_variables(&fragment.directives, out);
                fragment.selection_set
            }
        };

        if let Some(child) = child {
            collect_used_variables(document, child, out);
        }
    }
}

fn remove_unused_variable_definitions(document: &mut UpstreamDocument) {
    let used: Vec<String> = {
        let mut used = vec![];
        collect_directive_variables(&document.operation.directives, &mut used);
        if let Some(root) = document.operation.selection_set {
            collect_used_variables(document, root, &mut used);
        }
        used.into_iter().map(str::to_string).collect()
    };

    document.operation.variable_definitions.retain(|definition| {
        let keep = used.contains(&definition.name);
        if !keep {
            trace!("removing unused variable definition ${}", definition.name);
        }
        keep
    });
}

#[cfg(test)]
mod tests {
    use super::normalize;
    use crate::{
        ast::{
            printer::print_document, Field, InlineFragment, UpstreamDocument, Value,
            VariableDefinition,
        },
        schema::TypeNode,
    };

    fn print(document: &UpstreamDocument) -> String {
        let mut out = String::new();
        print_document(document, &mut out);
        out
    }

    #[test]
    fn merges_duplicates_and_drops_leftovers() {
        let mut document = UpstreamDocument::default();
        let root = document.new_selection_set();
        document.operation.selection_set = Some(root);
        for name in ["id", "unused"] {
            document.add_variable_definition(VariableDefinition {
                name: name.to_string(),
                var_type: TypeNode::named("ID"),
                default_value: None,
            });
        }

        for child in ["id", "name"] {
            let mut user = Field::new("user");
            user.arguments = vec![("id".to_string(), Value::Variable("id".to_string()))];
            let user = document.add_field(root, user);
            let user_set = document.field_selection_set(user);
            document.add_field(user_set, Field::new(child));
            document.add_field(user_set, Field::new("__typename"));

            let fragment = document.add_inline_fragment(
                user_set,
                InlineFragment {
                    type_condition: Some("Admin".to_string()),
                    directives: vec![],
                    selection_set: None,
                },
            );
            let fragment_set = document.inline_fragment_selection_set(fragment);
            document.add_field(fragment_set, Field::new("level"));
        }
        document.add_inline_fragment(
            root,
            InlineFragment {
                type_condition: Some("Query".to_string()),
                directives: vec![],
                selection_set: None,
            },
        );

        normalize(&mut document);

        insta::assert_snapshot!(print(&document), @"query($id: ID){user(id: $id){id __typename ... on Admin {level} name}}");
    }

    #[test]
    fn drops_fields_left_without_selections() {
        let mut document = UpstreamDocument::default();
        let root = document.new_selection_set();
        document.operation.selection_set = Some(root);
        document.add_variable_definition(VariableDefinition {
            name: "first".to_string(),
            var_type: TypeNode::named("Int"),
            default_value: None,
        });

        let me = document.add_field(root, Field::new("me"));
        let me_set = document.field_selection_set(me);
        document.add_field(me_set, Field::new("id"));

        let mut friends = Field::new("friends");
        friends.arguments = vec![("first".to_string(), Value::Variable("first".to_string()))];
        let friends = document.add_field(me_set, friends);
        let friends_set = document.field_selection_set(friends);
        let best = document.add_field(friends_set, Field::new("best"));
        document.field_selection_set(best);

        let settings = document.add_field(root, Field::new("settings"));
        document.field_selection_set(settings);

        normalize(&mut document);

        insta::assert_snapshot!(print(&document), @"{me {id}}");
    }
}
