use std::sync::Arc;

use schema::{ast, AbortController, AbortSignal, ContextValue, FieldValue, Resolver, Schema, TypeResolver, VariableValues};

/// Everything needed to run one operation.
pub struct ExecutionArgs {
    pub(crate) schema: Schema,
    pub(crate) document: Arc<ast::ExecutableDocument>,
    pub(crate) root_value: Arc<FieldValue>,
    pub(crate) context_value: Arc<ContextValue>,
    pub(crate) variable_values: VariableValues,
    pub(crate) operation_name: Option<String>,
    pub(crate) field_resolver: Option<Resolver>,
    pub(crate) type_resolver: Option<TypeResolver>,
    pub(crate) subscribe_field_resolver: Option<Resolver>,
    pub(crate) signal: Option<AbortSignal>,
    pub(crate) incremental: bool,
}

impl ExecutionArgs {
    pub fn new(schema: Schema, document: impl Into<Arc<ast::ExecutableDocument>>) -> Self {
        ExecutionArgs {
            schema,
            document: document.into(),
            root_value: Arc::new(FieldValue::null()),
            context_value: Arc::new(()),
            variable_values: VariableValues::new(),
            operation_name: None,
            field_resolver: None,
            type_resolver: None,
            subscribe_field_resolver: None,
            signal: None,
            incremental: true,
        }
    }

    /// Parses `query` and builds arguments from it.
    pub fn parse(schema: Schema, query: &str) -> Result<Self, crate::GraphqlError> {
        let document = schema::parse_query(query).map_err(|error| {
            let mut graphql_error = crate::GraphqlError::new(error.to_string());
            for pos in error.positions() {
                graphql_error = graphql_error.with_location(pos);
            }
            graphql_error
        })?;

        Ok(Self::new(schema, document))
    }

    #[must_use]
    pub fn root_value(mut self, root_value: FieldValue) -> Self {
        self.root_value = Arc::new(root_value);
        self
    }

    #[must_use]
    pub fn context_value<T: std::any::Any + Send + Sync>(mut self, context_value: T) -> Self {
        self.context_value = Arc::new(context_value);
        self
    }

    /// Raw variable values, coerced against the operation's variable definitions.
    #[must_use]
    pub fn variable_values(mut self, variable_values: VariableValues) -> Self {
        self.variable_values = variable_values;
        self
    }

    #[must_use]
    pub fn operation_name(mut self, operation_name: impl Into<String>) -> Self {
        self.operation_name = Some(operation_name.into());
        self
    }

    /// Resolver used for fields without their own resolver, instead of property lookup.
    #[must_use]
    pub fn field_resolver(mut self, resolver: Resolver) -> Self {
        self.field_resolver = Some(resolver);
        self
    }

    /// Type resolver used for abstract types without their own.
    #[must_use]
    pub fn type_resolver(mut self, resolver: TypeResolver) -> Self {
        self.type_resolver = Some(resolver);
        self
    }

    #[must_use]
    pub fn subscribe_field_resolver(mut self, resolver: Resolver) -> Self {
        self.subscribe_field_resolver = Some(resolver);
        self
    }

    /// External cancellation, combined with the one of the returned response stream.
    #[must_use]
    pub fn signal(mut self, signal: AbortSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Ignore `@defer` and `@stream`, always producing a single response.
    #[must_use]
    pub fn disable_incremental(mut self) -> Self {
        self.incremental = false;
        self
    }

    /// Controller of one request, aborted along with the external signal if there is one.
    pub(crate) fn abort_controller(&self) -> AbortController {
        match &self.signal {
            Some(external) => AbortController::child_of(external),
            None => AbortController::new(),
        }
    }
}
