use graphql_parser::{query, schema};
use graphql_tools::{parser as validation_parser, static_graphql};

pub type SchemaDocument = schema::Document<'static, String>;
pub type OperationDocument = query::Document<'static, String>;

/// Documents in the AST of the validation rules.
pub type ValidationSchemaDocument = static_graphql::schema::Document;
pub type ValidationOperationDocument = static_graphql::query::Document;

#[inline]
pub fn parse_schema(sdl: &str) -> Result<SchemaDocument, schema::ParseError> {
    graphql_parser::parse_schema::<String>(sdl).map(|doc| doc.into_static())
}

#[inline]
pub fn parse_operation(operation: &str) -> Result<OperationDocument, query::ParseError> {
    graphql_parser::parse_query::<String>(operation).map(|doc| doc.into_static())
}

/// Re-reads a schema document with the parser of the validation rules.
pub fn to_validation_schema(
    schema: &SchemaDocument,
) -> Result<ValidationSchemaDocument, validation_parser::schema::ParseError> {
    validation_parser::parse_schema::<String>(&schema.to_string()).map(|doc| doc.into_static())
}

pub fn parse_validation_operation(
    operation: &str,
) -> Result<ValidationOperationDocument, validation_parser::query::ParseError> {
    validation_parser::parse_query::<String>(operation).map(|doc| doc.into_static())
}
