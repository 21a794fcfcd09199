use crate::{Field, InputValue, NamedType, SchemaInner, TypeRef};

pub(crate) fn validate_schema(schema: &SchemaInner) -> Vec<String> {
    let mut ctx = Context { schema, errors: Vec::new() };

    validate_root_types(&mut ctx);

    for ty in schema.types.values() {
        match ty {
            NamedType::Object(object) => {
                validate_fields(&mut ctx, &object.name, &object.fields);
                validate_interfaces(&mut ctx, &object.name, &object.fields, &object.interfaces);
            }
            NamedType::Interface(interface) => {
                validate_fields(&mut ctx, &interface.name, &interface.fields);
                validate_interfaces(&mut ctx, &interface.name, &interface.fields, &interface.interfaces);
            }
            NamedType::Union(union) => {
                if union.members.is_empty() {
                    ctx.push(format!("Union type {} must define one or more member types.", union.name));
                }
                for member in &union.members {
                    if schema.object(member).is_none() {
                        ctx.push(format!(
                            "Union type {} can only include Object types, it cannot include {member}.",
                            union.name
                        ));
                    }
                }
            }
            NamedType::Enum(enum_type) => {
                if enum_type.values.is_empty() {
                    ctx.push(format!("Enum type {} must define one or more values.", enum_type.name));
                }
            }
            NamedType::InputObject(input) => {
                if input.fields.is_empty() {
                    ctx.push(format!("Input Object type {} must define one or more fields.", input.name));
                }
                for field in input.fields.values() {
                    validate_input_type(&mut ctx, &field.ty, || format!("{}.{}", input.name, field.name));
                }
            }
            NamedType::Scalar(_) => {}
        }
    }

    for directive in schema.directives.values() {
        for argument in directive.arguments.values() {
            validate_input_type(&mut ctx, &argument.ty, || format!("@{}({}:)", directive.name, argument.name));
        }
    }

    ctx.errors
}

struct Context<'a> {
    schema: &'a SchemaInner,
    errors: Vec<String>,
}

impl Context<'_> {
    fn push(&mut self, error: String) {
        self.errors.push(error);
    }
}

fn validate_root_types(ctx: &mut Context<'_>) {
    let schema = ctx.schema;

    let roots = [
        ("Query", &schema.query_type),
        ("Mutation", &schema.mutation_type),
        ("Subscription", &schema.subscription_type),
    ];

    for (operation, root) in roots {
        match root {
            None if operation == "Query" => ctx.push("Query root type must be provided.".to_string()),
            None => {}
            Some(name) => match schema.get_type(name) {
                Some(NamedType::Object(_)) => {}
                Some(_) => ctx.push(format!(
                    "{operation} root type must be Object type, it cannot be {name}."
                )),
                None => ctx.push(format!("{operation} root type \"{name}\" is not defined.")),
            },
        }
    }
}

fn validate_fields(ctx: &mut Context<'_>, type_name: &str, fields: &indexmap::IndexMap<async_graphql_value::Name, Field>) {
    if fields.is_empty() {
        ctx.push(format!("Type {type_name} must define one or more fields."));
    }

    for field in fields.values() {
        match ctx.schema.get_type(&field.ty.name) {
            None => ctx.push(format!(
                "Unknown type \"{}\" referenced by {type_name}.{}.",
                field.ty.name, field.name
            )),
            Some(ty) if !ty.is_output_type() => ctx.push(format!(
                "The type of {type_name}.{} must be Output Type but got: {}.",
                field.name, field.ty
            )),
            Some(_) => {}
        }

        for argument in field.arguments.values() {
            validate_input_type(ctx, &argument.ty, || {
                format!("{type_name}.{}({}:)", field.name, argument.name)
            });
        }
    }
}

fn validate_input_type(ctx: &mut Context<'_>, ty: &TypeRef, coordinate: impl FnOnce() -> String) {
    match ctx.schema.get_type(&ty.name) {
        None => ctx.push(format!("Unknown type \"{}\" referenced by {}.", ty.name, coordinate())),
        Some(named) if !named.is_input_type() => ctx.push(format!(
            "The type of {} must be Input Type but got: {ty}.",
            coordinate()
        )),
        Some(_) => {}
    }
}

fn validate_interfaces(
    ctx: &mut Context<'_>,
    type_name: &str,
    fields: &indexmap::IndexMap<async_graphql_value::Name, Field>,
    interfaces: &[async_graphql_value::Name],
) {
    let schema = ctx.schema;

    for interface_name in interfaces {
        let Some(interface) = schema.get_type(interface_name).and_then(NamedType::as_interface) else {
            ctx.push(format!(
                "Type {type_name} must only implement Interface types, it cannot implement {interface_name}."
            ));
            continue;
        };

        for interface_field in interface.fields.values() {
            let Some(field) = fields.get(&interface_field.name) else {
                ctx.push(format!(
                    "Interface field {interface_name}.{} expected but {type_name} does not provide it.",
                    interface_field.name
                ));
                continue;
            };

            if !schema.is_type_sub_type_of(&field.ty, &interface_field.ty) {
                ctx.push(format!(
                    "Interface field {interface_name}.{} expects type {} but {type_name}.{} is type {}.",
                    interface_field.name, interface_field.ty, field.name, field.ty
                ));
            }

            validate_interface_arguments(ctx, type_name, interface_name, field, interface_field);
        }
    }
}

fn validate_interface_arguments(
    ctx: &mut Context<'_>,
    type_name: &str,
    interface_name: &str,
    field: &Field,
    interface_field: &Field,
) {
    for interface_argument in interface_field.arguments.values() {
        let Some(argument) = field.arguments.get(&interface_argument.name) else {
            ctx.push(format!(
                "Interface field argument {interface_name}.{}({}:) expected but {type_name}.{} does not provide it.",
                interface_field.name, interface_argument.name, field.name
            ));
            continue;
        };

        if argument.ty != interface_argument.ty {
            ctx.push(format!(
                "Interface field argument {interface_name}.{}({}:) expects type {} but {type_name}.{}({}:) is type {}.",
                interface_field.name,
                interface_argument.name,
                interface_argument.ty,
                field.name,
                argument.name,
                argument.ty
            ));
        }
    }

    let required_extra = field
        .arguments
        .values()
        .filter(|argument| !interface_field.arguments.contains_key(&argument.name))
        .filter(|argument: &&InputValue| argument.ty.is_non_null() && argument.default_value.is_none());

    for argument in required_extra {
        ctx.errors.push(format!(
            "Object field {type_name}.{} includes required argument {} that is missing from the Interface field {interface_name}.{}.",
            field.name, argument.name, interface_field.name
        ));
    }
}
