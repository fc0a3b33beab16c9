use crate::{
    codec::{
        json::{BodyReader, ParseError, string_list_to_json},
        wire::{WireError, WireReader, WireWriter},
    },
    compile::{CompileContext, CompileError, NativeQuery, NativeQueryKind, NativeTerm},
    node::{QueryKind, QueryVariant},
    validate::{ValidationReport, ValidationRule},
};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeSet;

const TYPES: &str = "types";
const TYPE_ALIAS: &str = "type";
const VALUES: &str = "values";

/// Native field holding bare document ids.
pub const ID_FIELD: &str = "_id";

/// Native field holding `type#id` document keys.
pub const UID_FIELD: &str = "_uid";

///
/// IdsQuery
///
/// Matches documents by id. With no explicit types the ids are resolved
/// against every type in the compile scope.
///

#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct IdsQuery {
    pub types: Vec<String>,
    pub values: Vec<String>,
}

impl IdsQuery {
    #[must_use]
    pub fn new<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self {
            types: Vec::new(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn types<S: Into<String>>(mut self, types: impl IntoIterator<Item = S>) -> Self {
        self.types = types.into_iter().map(Into::into).collect();
        self
    }
}

impl QueryVariant for IdsQuery {
    const KIND: QueryKind = QueryKind::Ids;

    fn write_wire(&self, out: &mut WireWriter) {
        out.write_string_list(&self.types);
        out.write_string_list(&self.values);
    }

    fn read_wire(input: &mut WireReader<'_>) -> Result<Self, WireError> {
        Ok(Self {
            types: input.read_string_list()?,
            values: input.read_string_list()?,
        })
    }

    fn write_json(&self, body: &mut Map<String, JsonValue>) {
        if !self.types.is_empty() {
            body.insert(TYPES.to_string(), string_list_to_json(&self.types));
        }
        body.insert(VALUES.to_string(), string_list_to_json(&self.values));
    }

    fn read_json(body: &mut BodyReader) -> Result<Self, ParseError> {
        let mut types = body.string_list_or_empty(TYPES)?;
        if types.is_empty() {
            types = body.string_list_or_empty(TYPE_ALIAS)?;
        }

        Ok(Self {
            types,
            values: body.string_list_or_empty(VALUES)?,
        })
    }

    fn validate(&self, report: &mut ValidationReport) {
        if self.values.is_empty() {
            report.violation(VALUES, ValidationRule::IdsValuesEmpty, "ids query needs at least one id");
        }
        if self.types.iter().any(String::is_empty) {
            report.violation(
                TYPES,
                ValidationRule::IdsTypeNameEmpty,
                "type names must not be empty",
            );
        }
    }

    fn compile(&self, ctx: &mut CompileContext<'_>) -> Result<NativeQuery, CompileError> {
        if self.values.is_empty() {
            return Ok(NativeQuery::match_none());
        }

        let types = if self.types.is_empty() {
            ctx.active_type_names()
        } else {
            self.types.clone()
        };

        if types.is_empty() {
            let ids: BTreeSet<&str> = self.values.iter().map(String::as_str).collect();

            return Ok(NativeQuery::new(NativeQueryKind::Terms {
                field: ID_FIELD.to_string(),
                terms: ids
                    .into_iter()
                    .map(|id| NativeTerm::Text(id.to_string()))
                    .collect(),
            }));
        }

        let uids: BTreeSet<String> = types
            .iter()
            .flat_map(|ty| self.values.iter().map(move |id| format!("{ty}#{id}")))
            .collect();

        Ok(NativeQuery::new(NativeQueryKind::Terms {
            field: UID_FIELD.to_string(),
            terms: uids.into_iter().map(NativeTerm::Text).collect(),
        }))
    }
}
